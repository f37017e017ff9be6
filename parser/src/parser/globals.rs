use super::*;

impl<'t> Parser<'t> {
    /// Parse `texture2D name : slot;`
    pub(super) fn parse_texture(&mut self) -> ParseResult<()> {
        let start = self.location();
        let kind_name = self.expect_identifier("texture type")?;
        let kind = match TextureKind::from_name(&kind_name.node) {
            Some(kind) => kind,
            None => {
                return Err(ParseError::new(
                    ParseErrorReason::UnknownType(kind_name.node),
                    kind_name.location,
                ))
            }
        };

        let name = self.expect_identifier("texture name")?;
        self.check_root_name_free(&name)?;

        let slot = if self.accept(Token::Colon) {
            self.expect_integer("texture slot")?.node
        } else {
            self.module.textures.len() as u32
        };
        self.expect(Token::Semicolon, "';'")?;

        let id = self.module.add_texture(Texture {
            id: TextureId(0),
            name: name.node.clone(),
            kind,
            slot,
            location: name.location,
        });
        self.scopes.add_texture(&name.node, id);

        let node = self.add_statement(Node::TextureDeclaration(id), start);
        self.module.roots.push(node);
        Ok(())
    }

    /// Parse `const type name = value;` at file scope
    pub(super) fn parse_global_constant(&mut self) -> ParseResult<()> {
        let start = self.expect(Token::Const, "'const'")?;
        let ty = self.parse_type()?;
        self.check_variable_type(ty.node, ty.location)?;

        let name = self.expect_identifier("constant name")?;
        self.check_root_name_free(&name)?;
        let array = self.parse_array_dims()?;

        self.expect(Token::Equals, "'='")?;
        let init_location = self.location();
        let init = self.parse_assignment_expression()?;
        self.check_assignable(
            ValueType::with_array(ty.node, array),
            self.module.nodes.value_type(init),
            init_location,
        )?;
        self.expect(Token::Semicolon, "';'")?;

        let id = self.module.add_variable(Variable {
            id: VariableId(0),
            name: name.node.clone(),
            type_id: ty.node,
            kind: VariableKind::Global,
            qualifiers: Qualifiers {
                is_const: true,
                ..Default::default()
            },
            array,
            semantic: None,
            format: None,
            slot: None,
            texture_kind: None,
            location: name.location,
        });
        self.scopes.add_global(&name.node, id);

        let node = self.add_statement(Node::GlobalDeclaration(id, init), start);
        self.module.roots.push(node);
        Ok(())
    }

    /// Fail if a type can not be used for a local variable or constant
    pub(super) fn check_variable_type(&self, id: TypeId, location: SourceLocation) -> ParseResult<()> {
        let ty = self.module.get_type(id);
        match ty.kind {
            TypeKind::Void => Err(ParseError::new(
                ParseErrorReason::UnknownType(ty.name.clone()),
                location,
            )),
            TypeKind::Struct(kind) if kind.is_buffer() => Err(ParseError::new(
                ParseErrorReason::BufferNotAllowed(ty.name.clone()),
                location,
            )),
            TypeKind::Struct(kind) if kind.is_stage_io() => Err(ParseError::new(
                ParseErrorReason::StageStructNotAllowed(ty.name.clone()),
                location,
            )),
            _ => Ok(()),
        }
    }
}
