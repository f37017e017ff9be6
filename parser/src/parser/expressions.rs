use super::scopes::Symbol;
use super::types::{binary_result, promote};
use super::*;

/// Get the binary operator and precedence level for a token
fn binary_operator(token: &Token) -> Option<(BinaryOp, u32)> {
    Some(match token {
        Token::VerticalBarVerticalBar => (BinaryOp::BooleanOr, 1),
        Token::AmpersandAmpersand => (BinaryOp::BooleanAnd, 2),
        Token::VerticalBar => (BinaryOp::BitwiseOr, 3),
        Token::Hat => (BinaryOp::BitwiseXor, 4),
        Token::Ampersand => (BinaryOp::BitwiseAnd, 5),
        Token::EqualsEquals => (BinaryOp::Equality, 6),
        Token::ExclamationPointEquals => (BinaryOp::Inequality, 6),
        Token::LeftAngleBracket => (BinaryOp::LessThan, 7),
        Token::RightAngleBracket => (BinaryOp::GreaterThan, 7),
        Token::LessEquals => (BinaryOp::LessEqual, 7),
        Token::GreaterEquals => (BinaryOp::GreaterEqual, 7),
        Token::LeftShift => (BinaryOp::LeftShift, 8),
        Token::RightShift => (BinaryOp::RightShift, 8),
        Token::Plus => (BinaryOp::Add, 9),
        Token::Minus => (BinaryOp::Subtract, 9),
        Token::Asterix => (BinaryOp::Multiply, 10),
        Token::ForwardSlash => (BinaryOp::Divide, 10),
        Token::Percent => (BinaryOp::Remainder, 10),
        _ => return None,
    })
}

/// Get the assignment operator for a token
fn assignment_operator(token: &Token) -> Option<BinaryOp> {
    Some(match token {
        Token::Equals => BinaryOp::Assignment,
        Token::PlusEquals => BinaryOp::SumAssignment,
        Token::MinusEquals => BinaryOp::DifferenceAssignment,
        Token::AsterixEquals => BinaryOp::ProductAssignment,
        Token::ForwardSlashEquals => BinaryOp::QuotientAssignment,
        Token::PercentEquals => BinaryOp::RemainderAssignment,
        Token::LeftShiftEquals => BinaryOp::LeftShiftAssignment,
        Token::RightShiftEquals => BinaryOp::RightShiftAssignment,
        Token::AmpersandEquals => BinaryOp::BitwiseAndAssignment,
        Token::VerticalBarEquals => BinaryOp::BitwiseOrAssignment,
        Token::HatEquals => BinaryOp::BitwiseXorAssignment,
        _ => return None,
    })
}

fn unary_op_text(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => "+",
        UnaryOp::Minus => "-",
        UnaryOp::LogicalNot => "!",
        UnaryOp::BitwiseNot => "~",
        UnaryOp::PrefixIncrement | UnaryOp::PostfixIncrement => "++",
        UnaryOp::PrefixDecrement | UnaryOp::PostfixDecrement => "--",
    }
}

/// Type of a predeclared system value
fn system_value_type(semantic: Semantic) -> PrimitiveType {
    match semantic {
        Semantic::FrontFacing => PrimitiveType::scalar(ScalarType::Bool),
        Semantic::DispatchThread | Semantic::GroupThread | Semantic::Group => {
            PrimitiveType::vector(ScalarType::UInt, 3)
        }
        _ => PrimitiveType::scalar(ScalarType::UInt),
    }
}

impl<'t> Parser<'t> {
    /// Parse a full expression including the comma operator
    pub(super) fn parse_expression(&mut self) -> ParseResult<NodeId> {
        let mut left = self.parse_assignment_expression()?;
        while *self.peek() == Token::Comma {
            let location = self.location();
            self.advance();
            let right = self.parse_assignment_expression()?;
            let ty = self.module.nodes.value_type(right);
            left = self.add_node(Node::Binary(BinaryOp::Sequence, left, right), location, ty);
        }
        Ok(left)
    }

    /// Parse an expression without the comma operator
    pub(super) fn parse_assignment_expression(&mut self) -> ParseResult<NodeId> {
        let left = self.parse_ternary()?;
        let op = match assignment_operator(self.peek()) {
            Some(op) => op,
            None => return Ok(left),
        };
        let location = self.location();
        self.advance();
        let right = self.parse_assignment_expression()?;

        self.check_lvalue(left)?;
        let left_type = self.module.nodes.value_type(left);
        let right_type = self.module.nodes.value_type(right);
        if op == BinaryOp::Assignment {
            self.check_assignable(left_type, right_type, location)?;
        } else {
            let result = match (self.primitive(left_type), self.primitive(right_type)) {
                (Some(l), Some(r)) => binary_result(op, l, r),
                _ => None,
            };
            let valid = result
                .map(|result| self.is_assignable(left_type, self.primitive_value(result)))
                .unwrap_or(false);
            if !valid {
                return Err(ParseError::new(
                    ParseErrorReason::BinaryOperationWrongTypes(
                        op,
                        self.type_string(left_type),
                        self.type_string(right_type),
                    ),
                    location,
                ));
            }
        }

        let start = self.module.nodes.location(left);
        Ok(self.add_node(Node::Binary(op, left, right), start, left_type))
    }

    fn parse_ternary(&mut self) -> ParseResult<NodeId> {
        let condition = self.parse_binary(1)?;
        if *self.peek() != Token::QuestionMark {
            return Ok(condition);
        }
        let location = self.location();
        self.advance();
        self.check_condition(
            self.module.nodes.value_type(condition),
            self.module.nodes.location(condition),
        )?;

        let left = self.parse_assignment_expression()?;
        self.expect(Token::Colon, "':'")?;
        let right = self.parse_assignment_expression()?;

        let left_type = self.module.nodes.value_type(left);
        let right_type = self.module.nodes.value_type(right);
        let ty = if left_type == right_type {
            left_type
        } else {
            match (self.primitive(left_type), self.primitive(right_type)) {
                (Some(l), Some(r)) if (l.scalar == ScalarType::Bool) == (r.scalar == ScalarType::Bool) => {
                    match promote(l, r) {
                        Some(p) => self.primitive_value(p),
                        None => {
                            return Err(ParseError::new(
                                ParseErrorReason::TypeMismatch(
                                    self.type_string(left_type),
                                    self.type_string(right_type),
                                ),
                                location,
                            ))
                        }
                    }
                }
                _ => {
                    return Err(ParseError::new(
                        ParseErrorReason::TypeMismatch(
                            self.type_string(left_type),
                            self.type_string(right_type),
                        ),
                        location,
                    ))
                }
            }
        };

        let start = self.module.nodes.location(condition);
        Ok(self.add_node(Node::Ternary(condition, left, right), start, ty))
    }

    /// Parse binary operators with precedence climbing
    fn parse_binary(&mut self, min_precedence: u32) -> ParseResult<NodeId> {
        let mut left = self.parse_unary()?;
        loop {
            let (op, precedence) = match binary_operator(self.peek()) {
                Some((op, precedence)) if precedence >= min_precedence => (op, precedence),
                _ => break,
            };
            let location = self.location();
            self.advance();
            let right = self.parse_binary(precedence + 1)?;
            left = self.make_binary(op, left, right, location)?;
        }
        Ok(left)
    }

    fn make_binary(
        &mut self,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
        location: SourceLocation,
    ) -> ParseResult<NodeId> {
        let left_type = self.module.nodes.value_type(left);
        let right_type = self.module.nodes.value_type(right);
        let result = match (self.primitive(left_type), self.primitive(right_type)) {
            (Some(l), Some(r)) => binary_result(op, l, r),
            _ => None,
        };
        match result {
            Some(result) => {
                let ty = self.primitive_value(result);
                let start = self.module.nodes.location(left);
                Ok(self.add_node(Node::Binary(op, left, right), start, ty))
            }
            None => Err(ParseError::new(
                ParseErrorReason::BinaryOperationWrongTypes(
                    op,
                    self.type_string(left_type),
                    self.type_string(right_type),
                ),
                location,
            )),
        }
    }

    fn parse_unary(&mut self) -> ParseResult<NodeId> {
        let op = match self.peek() {
            Token::Plus => UnaryOp::Plus,
            Token::Minus => UnaryOp::Minus,
            Token::ExclamationPoint => UnaryOp::LogicalNot,
            Token::Tilde => UnaryOp::BitwiseNot,
            Token::PlusPlus => UnaryOp::PrefixIncrement,
            Token::MinusMinus => UnaryOp::PrefixDecrement,
            _ => return self.parse_postfix(),
        };
        let location = self.location();
        self.advance();
        let operand = self.parse_unary()?;
        self.make_unary(op, operand, location)
    }

    fn make_unary(
        &mut self,
        op: UnaryOp,
        operand: NodeId,
        location: SourceLocation,
    ) -> ParseResult<NodeId> {
        let ty = self.module.nodes.value_type(operand);
        let valid = match self.primitive(ty) {
            Some(p) => match op {
                UnaryOp::LogicalNot => p == PrimitiveType::scalar(ScalarType::Bool),
                UnaryOp::BitwiseNot => {
                    p.scalar.is_integer() && !matches!(p.dimension, Dimension::Matrix(_))
                }
                UnaryOp::Plus | UnaryOp::Minus => p.scalar != ScalarType::Bool,
                _ => p.scalar != ScalarType::Bool && !matches!(p.dimension, Dimension::Matrix(_)),
            },
            None => false,
        };
        if !valid {
            return Err(ParseError::new(
                ParseErrorReason::UnaryOperationWrongType(unary_op_text(op), self.type_string(ty)),
                location,
            ));
        }
        if op.is_mutating() {
            self.check_lvalue(operand)?;
        }
        let start = if op.is_postfix() {
            self.module.nodes.location(operand)
        } else {
            location
        };
        Ok(self.add_node(Node::Unary(op, operand), start, ty))
    }

    fn parse_postfix(&mut self) -> ParseResult<NodeId> {
        let mut expr = self.parse_primary()?;
        loop {
            let location = self.location();
            expr = match self.peek() {
                Token::LeftSquareBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(Token::RightSquareBracket, "']'")?;
                    self.make_subscript(expr, index, location)?
                }
                Token::Period => {
                    self.advance();
                    let name = self.expect_identifier("member name")?;
                    self.make_member_access(expr, name)?
                }
                Token::PlusPlus => {
                    self.advance();
                    self.make_unary(UnaryOp::PostfixIncrement, expr, location)?
                }
                Token::MinusMinus => {
                    self.advance();
                    self.make_unary(UnaryOp::PostfixDecrement, expr, location)?
                }
                _ => break,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<NodeId> {
        let location = self.location();
        let (literal, scalar) = match self.peek() {
            Token::LiteralInt(v) => (Literal::Int(*v), ScalarType::Int),
            Token::LiteralUInt(v) => (Literal::UInt(*v), ScalarType::UInt),
            Token::LiteralFloat(v) => (Literal::Float(*v), ScalarType::Float),
            Token::LiteralFloat32(v) => (Literal::Float(*v as f64), ScalarType::Float),
            Token::True => (Literal::Bool(true), ScalarType::Bool),
            Token::False => (Literal::Bool(false), ScalarType::Bool),
            Token::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(Token::RightParen, "')'")?;
                let ty = self.module.nodes.value_type(inner);
                return Ok(self.add_node(Node::Group(inner), location, ty));
            }
            Token::Id(Identifier(name)) => {
                self.advance();
                let name = Located::new(name.clone(), location);
                return if *self.peek() == Token::LeftParen {
                    self.parse_call(name)
                } else {
                    self.make_identifier(name)
                };
            }
            _ => return Err(self.wrong_token("expression")),
        };
        self.advance();
        let ty = self.primitive_value(PrimitiveType::scalar(scalar));
        Ok(self.add_node(Node::Literal(literal), location, ty))
    }

    /// Resolve a name used as a value
    fn make_identifier(&mut self, name: Located<String>) -> ParseResult<NodeId> {
        match self.scopes.find(&name.node) {
            Some(Symbol::Variable(id)) => {
                let variable = self.module.get_variable(id);
                let ty = ValueType::with_array(variable.type_id, variable.array);
                Ok(self.add_node(Node::Variable(id), name.location, ty))
            }
            Some(Symbol::Texture(id)) => {
                let kind = self.module.get_texture(id).kind;
                let ty = ValueType::new(self.module.texture_type(kind));
                Ok(self.add_node(Node::Texture(id), name.location, ty))
            }
            Some(Symbol::Function(_)) | None => match Semantic::from_system_value_name(&name.node) {
                Some(semantic) => {
                    let id = self.get_or_add_system_value(semantic);
                    let ty = ValueType::new(self.module.get_variable(id).type_id);
                    Ok(self.add_node(Node::Variable(id), name.location, ty))
                }
                None => Err(ParseError::new(
                    ParseErrorReason::UnknownIdentifier(name.node),
                    name.location,
                )),
            },
        }
    }

    /// Get the variable for a system value, declaring it on first use
    fn get_or_add_system_value(&mut self, semantic: Semantic) -> VariableId {
        if let Some(id) = self.module.find_system_value(semantic) {
            return id;
        }
        let type_id = self.module.primitive_type(system_value_type(semantic));
        self.module.add_variable(Variable {
            id: VariableId(0),
            name: semantic.system_value_name().unwrap_or_default().to_string(),
            type_id,
            kind: VariableKind::SystemValue,
            qualifiers: Qualifiers {
                is_in: true,
                is_const: true,
                ..Default::default()
            },
            array: ArrayDims::None,
            semantic: Some(semantic),
            format: None,
            slot: None,
            texture_kind: None,
            location: SourceLocation::UNKNOWN,
        })
    }

    /// Parse `( args )`
    fn parse_call_arguments(&mut self) -> ParseResult<Vec<NodeId>> {
        self.expect(Token::LeftParen, "'('")?;
        let mut args = Vec::new();
        if self.accept(Token::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_assignment_expression()?);
            if !self.accept(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightParen, "')'")?;
        Ok(args)
    }

    /// Parse a call to a constructor, intrinsic or function
    fn parse_call(&mut self, name: Located<String>) -> ParseResult<NodeId> {
        let args = self.parse_call_arguments()?;

        if let Some(primitive) = PrimitiveType::from_name(&name.node) {
            return self.make_constructor(primitive, args, name);
        }
        if let Some(intrinsic) = Intrinsic::from_name(&name.node) {
            return self.make_intrinsic_call(intrinsic, args, name);
        }
        match self.scopes.find(&name.node) {
            Some(Symbol::Function(id)) => self.make_function_call(id, args, name),
            _ if self.module.find_type(&name.node).is_some() => Err(ParseError::new(
                ParseErrorReason::InvalidConstructor(name.node),
                name.location,
            )),
            _ => Err(ParseError::new(
                ParseErrorReason::UnknownIdentifier(name.node),
                name.location,
            )),
        }
    }

    fn make_constructor(
        &mut self,
        primitive: PrimitiveType,
        args: Vec<NodeId>,
        name: Located<String>,
    ) -> ParseResult<NodeId> {
        let mut components = 0;
        for arg in &args {
            match self.primitive(self.module.nodes.value_type(*arg)) {
                Some(p) => components += p.dimension.component_count(),
                None => {
                    return Err(ParseError::new(
                        ParseErrorReason::InvalidConstructor(name.node),
                        self.module.nodes.location(*arg),
                    ))
                }
            }
        }
        let target = primitive.dimension.component_count();
        let splat = args.len() == 1 && components == 1;
        if components != target && !splat {
            return Err(ParseError::new(
                ParseErrorReason::InvalidConstructor(name.node),
                name.location,
            ));
        }
        let type_id = self.module.primitive_type(primitive);
        Ok(self.add_node(Node::Cast(type_id, args), name.location, ValueType::new(type_id)))
    }

    fn make_function_call(
        &mut self,
        id: FunctionId,
        args: Vec<NodeId>,
        name: Located<String>,
    ) -> ParseResult<NodeId> {
        let function = self.module.get_function(id);
        if function.kind != FunctionKind::Ordinary {
            return Err(ParseError::new(
                ParseErrorReason::InvalidEntryPoint(name.node, "entry points can not be called"),
                name.location,
            ));
        }
        let return_type = function.return_type;
        let params = self.module.params(id).to_vec();
        if params.len() != args.len() {
            return Err(ParseError::new(
                ParseErrorReason::WrongArgumentCount(name.node, params.len(), args.len()),
                name.location,
            ));
        }
        for (index, (param, arg)) in params.iter().zip(&args).enumerate() {
            let param_type = ValueType::with_array(param.type_id, param.array);
            let arg_type = self.module.nodes.value_type(*arg);
            if !self.is_assignable(param_type, arg_type) {
                return Err(ParseError::new(
                    ParseErrorReason::ArgumentTypeMismatch(
                        name.node,
                        index,
                        self.type_string(param_type),
                        self.type_string(arg_type),
                    ),
                    self.module.nodes.location(*arg),
                ));
            }
            if param.qualifiers.is_out {
                self.check_lvalue(*arg)?;
            }
        }
        Ok(self.add_node(Node::FunctionCall(id, args), name.location, ValueType::new(return_type)))
    }

    fn make_intrinsic_call(
        &mut self,
        intrinsic: Intrinsic,
        args: Vec<NodeId>,
        name: Located<String>,
    ) -> ParseResult<NodeId> {
        let (min, max) = intrinsic.arity();
        if args.len() < min || args.len() > max {
            return Err(ParseError::new(
                ParseErrorReason::WrongArgumentCount(name.node, min, args.len()),
                name.location,
            ));
        }

        let texture_kind = if intrinsic.is_texture_operation() {
            let kind = match self.module.nodes.get(args[0]) {
                Node::Texture(id) => self.module.get_texture(*id).kind,
                _ => {
                    return Err(ParseError::new(
                        ParseErrorReason::ExpectedTexture(name.node),
                        self.module.nodes.location(args[0]),
                    ))
                }
            };
            let valid = match intrinsic {
                Intrinsic::TextureSampleArray | Intrinsic::TextureSampleArrayLevel => kind.is_array(),
                Intrinsic::TextureLoad => {
                    !matches!(kind, TextureKind::TextureCube | TextureKind::TextureCubeArray)
                }
                Intrinsic::TextureSize => true,
                _ => !kind.is_array(),
            };
            if !valid {
                return Err(ParseError::new(
                    ParseErrorReason::WrongTextureKind(name.node, kind.name()),
                    name.location,
                ));
            }
            Some(kind)
        } else {
            None
        };

        // Every value argument must be a primitive
        let first_value = if texture_kind.is_some() { 1 } else { 0 };
        let mut primitives = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate().skip(first_value) {
            let ty = self.module.nodes.value_type(*arg);
            match self.primitive(ty) {
                Some(p) => primitives.push(p),
                None => {
                    return Err(ParseError::new(
                        ParseErrorReason::ArgumentTypeMismatch(
                            name.node,
                            index,
                            "numeric".to_string(),
                            self.type_string(ty),
                        ),
                        self.module.nodes.location(*arg),
                    ))
                }
            }
        }

        let mismatch = |parser: &Self, index: usize| {
            let ty = parser.module.nodes.value_type(args[index]);
            ParseError::new(
                ParseErrorReason::ArgumentTypeMismatch(
                    name.node.clone(),
                    index,
                    "numeric".to_string(),
                    parser.type_string(ty),
                ),
                parser.module.nodes.location(args[index]),
            )
        };

        let result = match intrinsic.return_rule() {
            IntrinsicReturn::SameAsFirst => primitives[0],
            IntrinsicReturn::Promoted => {
                let mut result = primitives[0];
                for (index, p) in primitives.iter().enumerate().skip(1) {
                    result = match promote(result, *p) {
                        Some(result) => result,
                        None => return Err(mismatch(self, index)),
                    };
                }
                result
            }
            IntrinsicReturn::ScalarOfFirst => PrimitiveType::scalar(primitives[0].scalar),
            IntrinsicReturn::ShapeOfFirst(scalar) => primitives[0].with_scalar(scalar),
            IntrinsicReturn::Bool => PrimitiveType::scalar(ScalarType::Bool),
            IntrinsicReturn::Multiply => {
                let (a, b) = (primitives[0], primitives[1]);
                let scalar = if a.scalar.rank() >= b.scalar.rank() {
                    a.scalar
                } else {
                    b.scalar
                };
                let dimension = match (a.dimension, b.dimension) {
                    (Dimension::Scalar, d) | (d, Dimension::Scalar) => d,
                    (Dimension::Matrix(n), Dimension::Vector(m)) if n == m => Dimension::Vector(n),
                    (Dimension::Vector(n), Dimension::Matrix(m)) if n == m => Dimension::Vector(n),
                    (Dimension::Matrix(n), Dimension::Matrix(m)) if n == m => Dimension::Matrix(n),
                    (Dimension::Vector(n), Dimension::Vector(m)) if n == m => Dimension::Scalar,
                    _ => return Err(mismatch(self, 1)),
                };
                PrimitiveType::new(scalar, dimension)
            }
            IntrinsicReturn::Fixed(p) => p,
            IntrinsicReturn::TextureSize => match texture_kind {
                Some(TextureKind::Texture1D) => PrimitiveType::scalar(ScalarType::UInt),
                Some(TextureKind::Texture2D | TextureKind::TextureCube) => {
                    PrimitiveType::vector(ScalarType::UInt, 2)
                }
                _ => PrimitiveType::vector(ScalarType::UInt, 3),
            },
        };

        let ty = self.primitive_value(result);
        Ok(self.add_node(Node::IntrinsicCall(intrinsic, args), name.location, ty))
    }

    fn make_subscript(
        &mut self,
        object: NodeId,
        index: NodeId,
        location: SourceLocation,
    ) -> ParseResult<NodeId> {
        let index_type = self.module.nodes.value_type(index);
        match self.primitive(index_type) {
            Some(p) if p.dimension == Dimension::Scalar && p.scalar.is_integer() => {}
            _ => {
                return Err(ParseError::new(
                    ParseErrorReason::IndexMustBeInteger(self.type_string(index_type)),
                    self.module.nodes.location(index),
                ))
            }
        }

        let object_type = self.module.nodes.value_type(object);
        let ty = match object_type.array.subscripted() {
            Some(array) => ValueType::with_array(object_type.type_id, array),
            None => match self.primitive(object_type).and_then(|p| p.element()) {
                Some(element) => self.primitive_value(element),
                None => {
                    return Err(ParseError::new(
                        ParseErrorReason::SubscriptOnNonIndexable(self.type_string(object_type)),
                        location,
                    ))
                }
            },
        };
        let start = self.module.nodes.location(object);
        Ok(self.add_node(Node::Subscript(object, index), start, ty))
    }

    fn make_member_access(&mut self, object: NodeId, name: Located<String>) -> ParseResult<NodeId> {
        let object_type = self.module.nodes.value_type(object);
        let start = self.module.nodes.location(object);
        let non_struct = |parser: &Self, name: Located<String>| {
            Err(ParseError::new(
                ParseErrorReason::MemberAccessOnNonStruct(parser.type_string(object_type), name.node),
                name.location,
            ))
        };
        if object_type.array.is_array() {
            return non_struct(self, name);
        }

        match self.module.get_type(object_type.type_id).kind {
            TypeKind::Struct(_) => {
                let member = self
                    .module
                    .members(object_type.type_id)
                    .iter()
                    .find(|m| m.name == name.node)
                    .map(|m| (m.id, ValueType::with_array(m.type_id, m.array)));
                match member {
                    Some((id, ty)) => Ok(self.add_node(Node::Member(object, id), start, ty)),
                    None => Err(ParseError::new(
                        ParseErrorReason::UnknownMember(
                            self.module.type_name(object_type.type_id).to_string(),
                            name.node,
                        ),
                        name.location,
                    )),
                }
            }
            TypeKind::Primitive(p @ PrimitiveType {
                dimension: Dimension::Vector(n),
                ..
            }) => match Swizzle::parse(&name.node, n) {
                Some(swizzle) => {
                    let result = match swizzle.len() {
                        1 => PrimitiveType::scalar(p.scalar),
                        len => PrimitiveType::vector(p.scalar, len as u32),
                    };
                    let ty = self.primitive_value(result);
                    Ok(self.add_node(Node::Swizzle(object, swizzle), start, ty))
                }
                None => Err(ParseError::new(
                    ParseErrorReason::InvalidSwizzle(self.type_string(object_type), name.node),
                    name.location,
                )),
            },
            _ => non_struct(self, name),
        }
    }

    /// Fail if an expression can not be written to
    pub(super) fn check_lvalue(&self, node: NodeId) -> ParseResult<()> {
        let location = self.module.nodes.location(node);
        match self.module.nodes.get(node) {
            Node::Variable(id) => {
                let variable = self.module.get_variable(*id);
                let struct_kind = self.module.get_type(variable.type_id).as_struct();
                let read_only_struct = match struct_kind {
                    Some(StructKind::UniformBuffer | StructKind::ConstantBuffer) => true,
                    Some(kind) if kind.is_stage_io() => !variable.qualifiers.is_out,
                    _ => false,
                };
                let read_only = variable.qualifiers.is_const
                    || matches!(variable.kind, VariableKind::Global | VariableKind::SystemValue)
                    || read_only_struct;
                if read_only {
                    Err(ParseError::new(
                        ParseErrorReason::AssignmentToReadOnly(variable.name.clone()),
                        location,
                    ))
                } else {
                    Ok(())
                }
            }
            Node::Member(object, _) | Node::Subscript(object, _) | Node::Group(object) => {
                self.check_lvalue(*object)
            }
            Node::Swizzle(object, swizzle) if swizzle.is_writable() => self.check_lvalue(*object),
            _ => Err(ParseError::new(ParseErrorReason::LvalueRequired, location)),
        }
    }
}
