use super::*;

fn struct_kind_from_token(token: &Token) -> Option<StructKind> {
    Some(match token {
        Token::Struct => StructKind::Struct,
        Token::SharedStruct => StructKind::SharedStruct,
        Token::UniformBuffer => StructKind::UniformBuffer,
        Token::ConstantBuffer => StructKind::ConstantBuffer,
        Token::MutableBuffer => StructKind::MutableBuffer,
        Token::InstanceInput => StructKind::InstanceInput,
        Token::VertexInput => StructKind::VertexInput,
        Token::VertexOutput => StructKind::VertexOutput,
        Token::FragmentInput => StructKind::FragmentInput,
        Token::FragmentOutput => StructKind::FragmentOutput,
        _ => return None,
    })
}

/// Check if a struct kind may contain a member of a given type
fn is_valid_member_type(kind: StructKind, member: &Type) -> bool {
    match member.kind {
        TypeKind::Primitive(_) => true,
        TypeKind::Struct(member_kind) => match kind {
            StructKind::Struct => {
                matches!(member_kind, StructKind::Struct | StructKind::SharedStruct)
            }
            StructKind::SharedStruct
            | StructKind::UniformBuffer
            | StructKind::ConstantBuffer
            | StructKind::MutableBuffer => member_kind == StructKind::SharedStruct,
            _ => false,
        },
        TypeKind::Void | TypeKind::Texture(_) => false,
    }
}

/// Attributes written after a struct name
#[derive(Default)]
struct StructAttributes {
    slot: Option<u32>,
    alignment: Option<u32>,
}

impl<'t> Parser<'t> {
    /// Parse a struct declaration of any kind
    pub(super) fn parse_struct(&mut self) -> ParseResult<()> {
        let start = self.location();
        let kind = match struct_kind_from_token(self.peek()) {
            Some(kind) => kind,
            None => return Err(self.wrong_token("struct declaration")),
        };
        self.advance();

        let name = self.expect_identifier("struct name")?;
        self.check_root_name_free(&name)?;

        let attributes = self.parse_struct_attributes(kind)?;

        let type_id = self.module.add_type(Type {
            id: TypeId(0),
            name: name.node.clone(),
            kind: TypeKind::Struct(kind),
            member_first: self.module.variables.len() as u32,
            member_count: 0,
            size_packed: 0,
            size_padded: 0,
            alignment: 0,
            global_namespace: kind.members_are_global(),
            pipeline_intermediate: false,
        });

        let slot = if kind.has_slot() {
            let slot = match attributes.slot {
                Some(slot) if self.buffer_slots.contains(&slot) => {
                    return Err(ParseError::new(
                        ParseErrorReason::DuplicateSlot(name.node, slot),
                        name.location,
                    ))
                }
                Some(slot) => slot,
                None => self.first_free_slot(),
            };
            self.buffer_slots.push(slot);
            Some(slot)
        } else {
            None
        };

        let struct_id = self.module.add_struct(Struct {
            id: StructId(0),
            type_id,
            kind,
            slot,
            alignment: attributes.alignment,
            location: start,
        });

        self.expect(Token::LeftBrace, "'{'")?;
        let mut member_names: Vec<String> = Vec::new();
        while !self.accept(Token::RightBrace) {
            let member = self.parse_member(kind, type_id)?;
            let member_name = &self.module.get_variable(member).name;
            if member_names.contains(member_name) {
                return Err(ParseError::new(
                    ParseErrorReason::Redefinition(member_name.clone()),
                    self.module.get_variable(member).location,
                ));
            }
            member_names.push(member_name.clone());
        }
        self.accept(Token::Semicolon);

        if member_names.is_empty() {
            return Err(ParseError::new(
                ParseErrorReason::EmptyStruct(name.node),
                name.location,
            ));
        }

        let member_count = member_names.len() as u32;
        self.module.get_type_mut(type_id).member_count = member_count;

        let pipeline_intermediate = self
            .module
            .members(type_id)
            .iter()
            .any(|m| m.semantic.map(Semantic::is_pipeline_intermediate).unwrap_or(false));
        let layout = compute_struct_layout(&self.module, type_id, LayoutRules::Std140);

        let ty = self.module.get_type_mut(type_id);
        ty.size_packed = layout.size_packed;
        ty.size_padded = layout.size_padded;
        ty.alignment = layout.alignment;
        ty.pipeline_intermediate = pipeline_intermediate;

        let node = self.add_statement(Node::StructDeclaration(struct_id), start);
        self.module.roots.push(node);
        Ok(())
    }

    /// Lowest binding slot not taken by an earlier buffer
    fn first_free_slot(&self) -> u32 {
        let mut slot = 0;
        while self.buffer_slots.contains(&slot) {
            slot += 1;
        }
        slot
    }

    /// Parse `(slot = N, align = M)`
    fn parse_struct_attributes(&mut self, kind: StructKind) -> ParseResult<StructAttributes> {
        let mut attributes = StructAttributes::default();
        if !self.accept(Token::LeftParen) {
            return Ok(attributes);
        }
        loop {
            let attribute = self.expect_identifier("struct attribute")?;
            self.expect(Token::Equals, "'='")?;
            let value = self.expect_integer("attribute value")?;
            match attribute.node.as_str() {
                "slot" if kind.has_slot() => attributes.slot = Some(value.node),
                "align" if value.node.is_power_of_two() => attributes.alignment = Some(value.node),
                _ => {
                    return Err(ParseError::new(
                        ParseErrorReason::UnknownAttribute(attribute.node),
                        attribute.location,
                    ))
                }
            }
            if !self.accept(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightParen, "')'")?;
        Ok(attributes)
    }

    /// Parse a single struct member
    fn parse_member(&mut self, kind: StructKind, owner: TypeId) -> ParseResult<VariableId> {
        let member_type = self.parse_type()?;
        let name = self.expect_identifier("member name")?;

        let ty = self.module.get_type(member_type.node);
        if !is_valid_member_type(kind, ty) || member_type.node == owner {
            return Err(ParseError::new(
                ParseErrorReason::InvalidMemberType(ty.name.clone(), kind.keyword().to_string()),
                member_type.location,
            ));
        }

        let array = self.parse_array_dims()?;
        if array.is_array() && kind.is_stage_io() {
            return Err(ParseError::new(
                ParseErrorReason::MemberDoesNotAllowArray(name.node),
                name.location,
            ));
        }

        let mut semantic = None;
        let mut format = None;
        if self.accept(Token::Colon) {
            let semantic_name = self.expect_identifier("semantic")?;
            let parsed = match Semantic::from_name(&semantic_name.node) {
                Some(semantic) => semantic,
                None => {
                    return Err(ParseError::new(
                        ParseErrorReason::UnknownSemantic(semantic_name.node),
                        semantic_name.location,
                    ))
                }
            };
            if parsed.is_system_value() {
                return Err(ParseError::new(
                    ParseErrorReason::SystemValueSemanticOnMember(semantic_name.node),
                    semantic_name.location,
                ));
            }
            if !kind.requires_semantic() {
                return Err(ParseError::new(
                    ParseErrorReason::MemberDoesNotAllowSemantic(name.node),
                    semantic_name.location,
                ));
            }
            semantic = Some(parsed);

            if self.accept(Token::LeftParen) {
                let format_name = self.expect_identifier("input format")?;
                let parsed = match InputFormat::from_name(&format_name.node) {
                    Some(format) => format,
                    None => {
                        return Err(ParseError::new(
                            ParseErrorReason::UnknownFormat(format_name.node),
                            format_name.location,
                        ))
                    }
                };
                if !kind.requires_format() {
                    return Err(ParseError::new(
                        ParseErrorReason::MemberDoesNotAllowFormat(name.node),
                        format_name.location,
                    ));
                }
                format = Some(parsed);
                self.expect(Token::RightParen, "')'")?;
            }
        }
        self.expect(Token::Semicolon, "';'")?;

        if kind.requires_semantic() && semantic.is_none() {
            return Err(ParseError::new(
                ParseErrorReason::MemberRequiresSemantic(name.node),
                name.location,
            ));
        }
        if kind.requires_format() && format.is_none() {
            return Err(ParseError::new(
                ParseErrorReason::MemberRequiresFormat(name.node),
                name.location,
            ));
        }

        Ok(self.module.add_variable(Variable {
            id: VariableId(0),
            name: name.node,
            type_id: member_type.node,
            kind: VariableKind::Member(owner),
            qualifiers: Qualifiers::default(),
            array,
            semantic,
            format,
            slot: None,
            texture_kind: None,
            location: name.location,
        }))
    }
}
