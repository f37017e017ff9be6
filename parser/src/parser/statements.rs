use super::*;

impl<'t> Parser<'t> {
    /// Parse `{ statements }` in a new scope
    pub(super) fn parse_block(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(Token::LeftBrace, "'{'")?;
        self.scopes.push();
        let mut statements = Vec::new();
        while !self.accept(Token::RightBrace) {
            if *self.peek() == Token::Eof {
                return Err(self.wrong_token("'}'"));
            }
            if let Some(statement) = self.parse_statement()? {
                statements.push(statement);
            }
        }
        self.scopes.pop();
        Ok(self.add_statement(Node::Block(statements), start))
    }

    /// Parse a statement which is the body of a control flow statement
    ///
    /// A lone `;` becomes an empty block.
    fn parse_sub_statement(&mut self) -> ParseResult<NodeId> {
        let start = self.location();
        self.scopes.push();
        let statement = self.parse_statement();
        self.scopes.pop();
        match statement? {
            Some(statement) => Ok(statement),
            None => Ok(self.add_statement(Node::Block(Vec::new()), start)),
        }
    }

    /// Parse a single statement
    ///
    /// Returns [None] for an empty statement.
    fn parse_statement(&mut self) -> ParseResult<Option<NodeId>> {
        let start = self.location();
        let node = match self.peek() {
            Token::Semicolon => {
                self.advance();
                return Ok(None);
            }
            Token::LeftBrace => self.parse_block()?,
            Token::If => self.parse_if()?,
            Token::While => self.parse_while()?,
            Token::Do => self.parse_do_while()?,
            Token::For => self.parse_for()?,
            Token::Switch => self.parse_switch()?,
            Token::Case | Token::Default => {
                return Err(ParseError::new(ParseErrorReason::CaseOutsideSwitch, start))
            }
            Token::Return => self.parse_return()?,
            Token::Break => {
                self.advance();
                self.expect(Token::Semicolon, "';'")?;
                if self.scopes.loop_depth + self.scopes.switch_depth == 0 {
                    return Err(ParseError::new(ParseErrorReason::BreakOutsideLoop, start));
                }
                self.add_statement(Node::Break, start)
            }
            Token::Continue => {
                self.advance();
                self.expect(Token::Semicolon, "';'")?;
                if self.scopes.loop_depth == 0 {
                    return Err(ParseError::new(ParseErrorReason::ContinueOutsideLoop, start));
                }
                self.add_statement(Node::Continue, start)
            }
            Token::Discard => {
                self.advance();
                self.expect(Token::Semicolon, "';'")?;
                self.add_statement(Node::Discard, start)
            }
            _ if self.is_declaration_start() => {
                let declaration = self.parse_local_declaration()?;
                self.expect(Token::Semicolon, "';'")?;
                declaration
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect(Token::Semicolon, "';'")?;
                self.add_statement(Node::Expression(expr), start)
            }
        };
        Ok(Some(node))
    }

    /// Check if the next tokens start a local variable declaration
    fn is_declaration_start(&self) -> bool {
        match self.peek() {
            Token::Const => true,
            token => self.is_type_name(token) && matches!(self.peek_at(1), Token::Id(_)),
        }
    }

    /// Parse `[const] type name [array] [= init]` without the trailing semicolon
    fn parse_local_declaration(&mut self) -> ParseResult<NodeId> {
        let start = self.location();
        let is_const = self.accept(Token::Const);
        let ty = self.parse_type()?;
        self.check_variable_type(ty.node, ty.location)?;

        let name = self.expect_identifier("variable name")?;
        if self.scopes.is_local_defined(&name.node) {
            return Err(ParseError::new(
                ParseErrorReason::Redefinition(name.node),
                name.location,
            ));
        }
        let array = self.parse_array_dims()?;
        let value_type = ValueType::with_array(ty.node, array);

        let init = if self.accept(Token::Equals) {
            let init_location = self.location();
            let init = self.parse_assignment_expression()?;
            self.check_assignable(value_type, self.module.nodes.value_type(init), init_location)?;
            Some(init)
        } else if is_const {
            return Err(self.wrong_token("'=' after const declaration"));
        } else {
            None
        };

        let id = self.module.add_variable(Variable {
            id: VariableId(0),
            name: name.node.clone(),
            type_id: ty.node,
            kind: VariableKind::Local,
            qualifiers: Qualifiers {
                is_const,
                ..Default::default()
            },
            array,
            semantic: None,
            format: None,
            slot: None,
            texture_kind: None,
            location: name.location,
        });
        self.scopes.add_local(&name.node, id);

        Ok(self.add_statement(Node::VariableDeclaration(id, init), start))
    }

    /// Parse `( condition )` and check it is a bool
    fn parse_condition(&mut self) -> ParseResult<NodeId> {
        self.expect(Token::LeftParen, "'('")?;
        let location = self.location();
        let condition = self.parse_expression()?;
        self.check_condition(self.module.nodes.value_type(condition), location)?;
        self.expect(Token::RightParen, "')'")?;
        Ok(condition)
    }

    fn parse_if(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(Token::If, "'if'")?;
        let condition = self.parse_condition()?;
        let then_branch = self.parse_sub_statement()?;
        let else_branch = if self.accept(Token::Else) {
            Some(self.parse_sub_statement()?)
        } else {
            None
        };
        Ok(self.add_statement(
            Node::If {
                condition,
                then_branch,
                else_branch,
            },
            start,
        ))
    }

    /// Parse a loop body with break and continue enabled
    fn parse_loop_body(&mut self) -> ParseResult<NodeId> {
        self.scopes.loop_depth += 1;
        let body = self.parse_sub_statement();
        self.scopes.loop_depth -= 1;
        body
    }

    fn parse_while(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(Token::While, "'while'")?;
        let condition = self.parse_condition()?;
        let body = self.parse_loop_body()?;
        Ok(self.add_statement(Node::While { condition, body }, start))
    }

    fn parse_do_while(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(Token::Do, "'do'")?;
        let body = self.parse_loop_body()?;
        self.expect(Token::While, "'while'")?;
        let condition = self.parse_condition()?;
        self.expect(Token::Semicolon, "';'")?;
        Ok(self.add_statement(Node::DoWhile { body, condition }, start))
    }

    fn parse_for(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(Token::For, "'for'")?;
        self.expect(Token::LeftParen, "'('")?;
        self.scopes.push();

        let init = match self.peek() {
            Token::Semicolon => None,
            _ if self.is_declaration_start() => Some(self.parse_local_declaration()?),
            _ => {
                let location = self.location();
                let expr = self.parse_expression()?;
                Some(self.add_statement(Node::Expression(expr), location))
            }
        };
        self.expect(Token::Semicolon, "';'")?;

        let condition = match self.peek() {
            Token::Semicolon => None,
            _ => {
                let location = self.location();
                let condition = self.parse_expression()?;
                self.check_condition(self.module.nodes.value_type(condition), location)?;
                Some(condition)
            }
        };
        self.expect(Token::Semicolon, "';'")?;

        let increment = match self.peek() {
            Token::RightParen => None,
            _ => Some(self.parse_expression()?),
        };
        self.expect(Token::RightParen, "')'")?;

        let body = self.parse_loop_body()?;
        self.scopes.pop();

        Ok(self.add_statement(
            Node::For {
                init,
                condition,
                increment,
                body,
            },
            start,
        ))
    }

    fn parse_switch(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(Token::Switch, "'switch'")?;
        self.expect(Token::LeftParen, "'('")?;
        let value_location = self.location();
        let value = self.parse_expression()?;
        let value_type = self.module.nodes.value_type(value);
        match self.primitive(value_type) {
            Some(p) if p.dimension == Dimension::Scalar && p.scalar.is_integer() => {}
            _ => {
                return Err(ParseError::new(
                    ParseErrorReason::IndexMustBeInteger(self.type_string(value_type)),
                    value_location,
                ))
            }
        }
        self.expect(Token::RightParen, "')'")?;
        self.expect(Token::LeftBrace, "'{'")?;

        self.scopes.push();
        self.scopes.switch_depth += 1;
        let mut body = Vec::new();
        let result = loop {
            let location = self.location();
            match self.peek() {
                Token::RightBrace => {
                    self.advance();
                    break Ok(());
                }
                Token::Eof => break Err(self.wrong_token("'}'")),
                Token::Case => {
                    self.advance();
                    let literal = match self.peek() {
                        Token::LiteralInt(v) => Literal::Int(*v),
                        Token::LiteralUInt(v) => Literal::UInt(*v),
                        _ => {
                            break Err(ParseError::new(
                                ParseErrorReason::InvalidCaseValue,
                                self.location(),
                            ))
                        }
                    };
                    let literal_location = self.location();
                    self.advance();
                    let ty = match literal {
                        Literal::UInt(_) => ScalarType::UInt,
                        _ => ScalarType::Int,
                    };
                    let ty = self.primitive_value(PrimitiveType::scalar(ty));
                    let value = self.add_node(Node::Literal(literal), literal_location, ty);
                    if let Err(err) = self.expect(Token::Colon, "':'") {
                        break Err(err);
                    }
                    body.push(self.add_statement(Node::Case(value), location));
                }
                Token::Default => {
                    self.advance();
                    if let Err(err) = self.expect(Token::Colon, "':'") {
                        break Err(err);
                    }
                    body.push(self.add_statement(Node::Default, location));
                }
                _ => match self.parse_statement() {
                    Ok(Some(statement)) => body.push(statement),
                    Ok(None) => {}
                    Err(err) => break Err(err),
                },
            }
        };
        self.scopes.switch_depth -= 1;
        self.scopes.pop();
        result?;

        Ok(self.add_statement(Node::Switch { value, body }, start))
    }

    fn parse_return(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(Token::Return, "'return'")?;
        let return_type = self
            .scopes
            .current_function
            .map(|id| self.module.get_function(id).return_type)
            .unwrap_or(self.module.void_type());
        let is_void = self.module.get_type(return_type).is_void();

        let value = if self.accept(Token::Semicolon) {
            if !is_void {
                return Err(ParseError::new(ParseErrorReason::MissingReturnValue, start));
            }
            None
        } else {
            let location = self.location();
            let value = self.parse_expression()?;
            if is_void {
                return Err(ParseError::new(ParseErrorReason::UnexpectedReturnValue, location));
            }
            self.check_assignable(
                ValueType::new(return_type),
                self.module.nodes.value_type(value),
                location,
            )?;
            self.expect(Token::Semicolon, "';'")?;
            Some(value)
        };

        Ok(self.add_statement(Node::Return(value), start))
    }
}
