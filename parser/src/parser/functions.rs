use super::*;

impl<'t> Parser<'t> {
    /// Parse a function definition with an optional attribute
    pub(super) fn parse_function(&mut self) -> ParseResult<()> {
        let start = self.location();
        let threads = self.parse_function_attribute()?;

        let return_type = self.parse_type()?;
        let name = self.expect_identifier("function name")?;
        self.check_root_name_free(&name)?;

        let kind = FunctionKind::from_name(&name.node);
        if threads.is_some() && kind != FunctionKind::MainCompute {
            return Err(ParseError::new(
                ParseErrorReason::ThreadsAttributeOnNonCompute(name.node),
                start,
            ));
        }

        let id = self.module.add_function(Function {
            id: FunctionId(0),
            name: name.node.clone(),
            return_type: return_type.node,
            param_first: self.module.variables.len() as u32,
            param_count: 0,
            kind,
            body: None,
            threads: threads.unwrap_or([1, 1, 1]),
            location: name.location,
        });

        self.scopes.push();
        self.scopes.current_function = Some(id);

        self.expect(Token::LeftParen, "'('")?;
        let mut param_count = 0;
        if !self.accept(Token::RightParen) {
            loop {
                self.parse_param(id)?;
                param_count += 1;
                if !self.accept(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RightParen, "')'")?;
        }
        self.module.get_function_mut(id).param_count = param_count;

        self.validate_signature(id, &name)?;

        let body = self.parse_block()?;

        self.scopes.pop();
        self.scopes.current_function = None;

        self.module.get_function_mut(id).body = Some(body);
        self.scopes.add_function(&name.node, id);

        let node = self.add_statement(Node::FunctionDeclaration(id), start);
        self.module.roots.push(node);
        Ok(())
    }

    /// Parse `[threads(x, y, z)]`
    fn parse_function_attribute(&mut self) -> ParseResult<Option<[u32; 3]>> {
        if !self.accept(Token::LeftSquareBracket) {
            return Ok(None);
        }
        let attribute = self.expect_identifier("function attribute")?;
        if attribute.node != "threads" {
            return Err(ParseError::new(
                ParseErrorReason::UnknownAttribute(attribute.node),
                attribute.location,
            ));
        }
        self.expect(Token::LeftParen, "'('")?;
        let mut threads = [1; 3];
        for (i, value) in threads.iter_mut().enumerate() {
            if i > 0 {
                self.expect(Token::Comma, "','")?;
            }
            let count = self.expect_integer("thread count")?;
            if count.node == 0 {
                return Err(ParseError::new(
                    ParseErrorReason::ArrayDimensionMustBeNonZero,
                    count.location,
                ));
            }
            *value = count.node;
        }
        self.expect(Token::RightParen, "')'")?;
        self.expect(Token::RightSquareBracket, "']'")?;
        Ok(Some(threads))
    }

    /// Parse a single function parameter
    fn parse_param(&mut self, function: FunctionId) -> ParseResult<VariableId> {
        let qualifiers = match self.peek() {
            Token::In => Qualifiers {
                is_in: true,
                ..Default::default()
            },
            Token::Out => Qualifiers {
                is_out: true,
                ..Default::default()
            },
            Token::InOut => Qualifiers {
                is_in: true,
                is_out: true,
                ..Default::default()
            },
            Token::Const => Qualifiers {
                is_in: true,
                is_const: true,
                ..Default::default()
            },
            _ => Qualifiers {
                is_in: true,
                ..Default::default()
            },
        };
        if matches!(self.peek(), Token::In | Token::Out | Token::InOut | Token::Const) {
            self.advance();
        }

        let ty = self.parse_type()?;
        if self.module.get_type(ty.node).is_void() {
            return Err(ParseError::new(
                ParseErrorReason::UnknownType("void".to_string()),
                ty.location,
            ));
        }

        let name = self.expect_identifier("parameter name")?;
        if self.scopes.is_local_defined(&name.node) {
            return Err(ParseError::new(
                ParseErrorReason::Redefinition(name.node),
                name.location,
            ));
        }
        let array = self.parse_array_dims()?;

        let id = self.module.add_variable(Variable {
            id: VariableId(0),
            name: name.node.clone(),
            type_id: ty.node,
            kind: VariableKind::Parameter(function),
            qualifiers,
            array,
            semantic: None,
            format: None,
            slot: None,
            texture_kind: None,
            location: name.location,
        });
        self.scopes.add_local(&name.node, id);
        Ok(id)
    }

    /// Check parameter and return types against the rules for the function kind
    fn validate_signature(&self, id: FunctionId, name: &Located<String>) -> ParseResult<()> {
        let function = self.module.get_function(id);
        let invalid = |reason: &'static str| {
            Err(ParseError::new(
                ParseErrorReason::InvalidEntryPoint(name.node.clone(), reason),
                name.location,
            ))
        };

        // Buffers are bound by the pipeline and are never written through a parameter
        for param in self.module.params(id) {
            if let Some(kind) = self.module.get_type(param.type_id).as_struct() {
                if kind.is_buffer() && (param.qualifiers.is_out || param.array.is_array()) {
                    return Err(ParseError::new(
                        ParseErrorReason::BufferNotAllowed(param.name.clone()),
                        param.location,
                    ));
                }
            }
        }

        let stage = match function.kind.stage() {
            Some(stage) => stage,
            None => {
                for param in self.module.params(id) {
                    let ty = self.module.get_type(param.type_id);
                    if ty.as_struct().map(StructKind::is_stage_io).unwrap_or(false) {
                        return Err(ParseError::new(
                            ParseErrorReason::StageStructNotAllowed(ty.name.clone()),
                            param.location,
                        ));
                    }
                }
                return Ok(());
            }
        };

        if !self.module.get_type(function.return_type).is_void() {
            return invalid("entry points must return void");
        }

        let mut counts = [0u32; StructKind::ALL.len()];
        for param in self.module.params(id) {
            let kind = match self.module.get_type(param.type_id).as_struct() {
                Some(kind) => kind,
                None => return invalid("entry point parameters must be structs or buffers"),
            };
            if param.array.is_array() {
                return invalid("entry point parameters can not be arrays");
            }
            let index = StructKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
            counts[index] += 1;

            let is_output = matches!(kind, StructKind::VertexOutput | StructKind::FragmentOutput)
                && stage_output(stage) == Some(kind);
            if kind.is_stage_io() && param.qualifiers.is_out != is_output {
                return invalid("only the stage output parameter may be declared out");
            }
        }

        let count = |kind: StructKind| -> u32 {
            let index = StructKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
            counts[index]
        };

        match stage {
            ShaderStage::Vertex => {
                if count(StructKind::VertexInput) > 1 {
                    return invalid("at most one vertex_input parameter is allowed");
                }
                if count(StructKind::InstanceInput) > 1 {
                    return invalid("at most one instance_input parameter is allowed");
                }
                if count(StructKind::InstanceInput) == 1 && count(StructKind::VertexInput) == 0 {
                    return invalid("instance_input requires a vertex_input parameter");
                }
                if count(StructKind::VertexOutput) != 1 {
                    return invalid("main_vertex requires exactly one out vertex_output parameter");
                }
                if count(StructKind::FragmentInput) + count(StructKind::FragmentOutput) > 0 {
                    return invalid("fragment structs can not be used in main_vertex");
                }
            }
            ShaderStage::Fragment => {
                if count(StructKind::VertexOutput) + count(StructKind::FragmentInput) > 1 {
                    return invalid("at most one vertex_output or fragment_input parameter is allowed");
                }
                if count(StructKind::FragmentOutput) != 1 {
                    return invalid("main_fragment requires exactly one out fragment_output parameter");
                }
                if count(StructKind::VertexInput) + count(StructKind::InstanceInput) > 0 {
                    return invalid("vertex inputs can not be used in main_fragment");
                }
            }
            ShaderStage::Compute => {
                let io = StructKind::ALL
                    .into_iter()
                    .filter(|k| k.is_stage_io())
                    .map(count)
                    .sum::<u32>();
                if io > 0 {
                    return invalid("main_compute only accepts buffer parameters");
                }
            }
        }

        for param in self.module.params(id) {
            let kind = self.module.get_type(param.type_id).as_struct();
            if matches!(kind, Some(StructKind::Struct | StructKind::SharedStruct)) {
                return invalid("entry point parameters must be stage structs or buffers");
            }
        }

        Ok(())
    }
}

/// The struct kind written by an entry point
fn stage_output(stage: ShaderStage) -> Option<StructKind> {
    match stage {
        ShaderStage::Vertex => Some(StructKind::VertexOutput),
        ShaderStage::Fragment => Some(StructKind::FragmentOutput),
        ShaderStage::Compute => None,
    }
}
