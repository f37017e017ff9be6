use super::*;

impl<'t> Parser<'t> {
    /// Parse a type name that can be used for a value
    pub(super) fn parse_type(&mut self) -> ParseResult<Located<TypeId>> {
        let name = self.expect_identifier("type name")?;
        match self.module.find_type(&name.node) {
            Some(id) => match self.module.get_type(id).kind {
                TypeKind::Texture(_) => Err(ParseError::new(
                    ParseErrorReason::TextureTypeNotAllowed(name.node),
                    name.location,
                )),
                _ => Ok(Located::new(id, name.location)),
            },
            None => Err(ParseError::new(
                ParseErrorReason::UnknownType(name.node),
                name.location,
            )),
        }
    }

    /// Check if a token names a value type
    pub(super) fn is_type_name(&self, token: &Token) -> bool {
        match token {
            Token::Id(Identifier(name)) => match self.module.find_type(name) {
                Some(id) => !matches!(self.module.get_type(id).kind, TypeKind::Texture(_)),
                None => false,
            },
            _ => false,
        }
    }

    /// Parse up to two array dimensions after a declaration name
    pub(super) fn parse_array_dims(&mut self) -> ParseResult<ArrayDims> {
        let mut dims = Vec::new();
        while dims.len() < 2 && self.accept(Token::LeftSquareBracket) {
            let size = self.expect_integer("array dimension")?;
            if size.node == 0 {
                return Err(ParseError::new(
                    ParseErrorReason::ArrayDimensionMustBeNonZero,
                    size.location,
                ));
            }
            self.expect(Token::RightSquareBracket, "']'")?;
            dims.push(size.node);
        }
        Ok(match dims.as_slice() {
            [] => ArrayDims::None,
            [n] => ArrayDims::One(*n),
            [n, m, ..] => ArrayDims::Two(*n, *m),
        })
    }

    /// Source language name of a value type for messages
    pub(super) fn type_string(&self, ty: ValueType) -> String {
        self.module.value_type_name(ty)
    }

    /// Get the primitive of a non-array value type
    pub(super) fn primitive(&self, ty: ValueType) -> Option<PrimitiveType> {
        if ty.array.is_array() {
            None
        } else {
            self.module.get_type(ty.type_id).as_primitive()
        }
    }

    /// Get the value type for a primitive
    pub(super) fn primitive_value(&self, primitive: PrimitiveType) -> ValueType {
        ValueType::new(self.module.primitive_type(primitive))
    }

    /// The bool value type
    pub(super) fn bool_value(&self) -> ValueType {
        self.primitive_value(PrimitiveType::scalar(ScalarType::Bool))
    }

    /// Check if a value of one type can be implicitly converted to another
    pub(super) fn is_assignable(&self, to: ValueType, from: ValueType) -> bool {
        if to == from {
            return true;
        }
        match (self.primitive(to), self.primitive(from)) {
            (Some(to), Some(from)) => is_implicitly_convertible(to, from),
            _ => false,
        }
    }

    /// Fail if a value can not be implicitly converted
    pub(super) fn check_assignable(
        &self,
        to: ValueType,
        from: ValueType,
        location: SourceLocation,
    ) -> ParseResult<()> {
        if self.is_assignable(to, from) {
            Ok(())
        } else {
            Err(ParseError::new(
                ParseErrorReason::TypeMismatch(self.type_string(to), self.type_string(from)),
                location,
            ))
        }
    }

    /// Fail if a value is not a single bool
    pub(super) fn check_condition(&self, ty: ValueType, location: SourceLocation) -> ParseResult<()> {
        if ty == self.bool_value() {
            Ok(())
        } else {
            Err(ParseError::new(
                ParseErrorReason::ConditionMustBeBool(self.type_string(ty)),
                location,
            ))
        }
    }
}

/// Check if a primitive converts to another without an explicit constructor
pub fn is_implicitly_convertible(to: PrimitiveType, from: PrimitiveType) -> bool {
    if to.dimension != from.dimension {
        return false;
    }
    match (to.scalar, from.scalar) {
        (ScalarType::Bool, ScalarType::Bool) => true,
        (ScalarType::Bool, _) | (_, ScalarType::Bool) => false,
        (to, from) => from.rank() <= to.rank(),
    }
}

/// Find the common type of two numeric operands
///
/// Scalars combine with any shape. Other shapes must match.
pub fn promote(a: PrimitiveType, b: PrimitiveType) -> Option<PrimitiveType> {
    let dimension = match (a.dimension, b.dimension) {
        (x, y) if x == y => x,
        (Dimension::Scalar, y) => y,
        (x, Dimension::Scalar) => x,
        _ => return None,
    };
    let scalar = if a.scalar.rank() >= b.scalar.rank() {
        a.scalar
    } else {
        b.scalar
    };
    Some(PrimitiveType::new(scalar, dimension))
}

/// Find the result of a binary operator on two primitives
pub fn binary_result(op: BinaryOp, a: PrimitiveType, b: PrimitiveType) -> Option<PrimitiveType> {
    let is_bool = a.scalar == ScalarType::Bool || b.scalar == ScalarType::Bool;
    match op {
        BinaryOp::BooleanAnd | BinaryOp::BooleanOr => {
            let bool_scalar = PrimitiveType::scalar(ScalarType::Bool);
            (a == bool_scalar && b == bool_scalar).then_some(bool_scalar)
        }
        BinaryOp::Equality | BinaryOp::Inequality => {
            let scalars = a.dimension == Dimension::Scalar && b.dimension == Dimension::Scalar;
            let comparable = (a.scalar == ScalarType::Bool) == (b.scalar == ScalarType::Bool);
            (scalars && comparable).then_some(PrimitiveType::scalar(ScalarType::Bool))
        }
        BinaryOp::LessThan
        | BinaryOp::LessEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterEqual => {
            let scalars = a.dimension == Dimension::Scalar && b.dimension == Dimension::Scalar;
            (scalars && !is_bool).then_some(PrimitiveType::scalar(ScalarType::Bool))
        }
        BinaryOp::LeftShift
        | BinaryOp::RightShift
        | BinaryOp::BitwiseAnd
        | BinaryOp::BitwiseOr
        | BinaryOp::BitwiseXor
        | BinaryOp::LeftShiftAssignment
        | BinaryOp::RightShiftAssignment
        | BinaryOp::BitwiseAndAssignment
        | BinaryOp::BitwiseOrAssignment
        | BinaryOp::BitwiseXorAssignment => {
            if !a.scalar.is_integer() || !b.scalar.is_integer() {
                return None;
            }
            if matches!(a.dimension, Dimension::Matrix(_)) || matches!(b.dimension, Dimension::Matrix(_)) {
                return None;
            }
            promote(a, b)
        }
        BinaryOp::Remainder | BinaryOp::RemainderAssignment => {
            if !a.scalar.is_integer() || !b.scalar.is_integer() {
                return None;
            }
            promote(a, b)
        }
        BinaryOp::Add
        | BinaryOp::Subtract
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::SumAssignment
        | BinaryOp::DifferenceAssignment
        | BinaryOp::ProductAssignment
        | BinaryOp::QuotientAssignment => {
            if is_bool {
                return None;
            }
            // Products of two non-scalar matrices differ between targets so require mul()
            let a_matrix = matches!(a.dimension, Dimension::Matrix(_));
            let b_matrix = matches!(b.dimension, Dimension::Matrix(_));
            let is_product = matches!(op, BinaryOp::Multiply | BinaryOp::ProductAssignment);
            if is_product
                && ((a_matrix && b.dimension != Dimension::Scalar)
                    || (b_matrix && a.dimension != Dimension::Scalar))
            {
                return None;
            }
            promote(a, b)
        }
        BinaryOp::Assignment | BinaryOp::Sequence => Some(a),
    }
}

#[test]
fn test_promote() {
    let float = PrimitiveType::scalar(ScalarType::Float);
    let int3 = PrimitiveType::vector(ScalarType::Int, 3);
    let float3 = PrimitiveType::vector(ScalarType::Float, 3);
    let float2 = PrimitiveType::vector(ScalarType::Float, 2);
    assert_eq!(promote(float, int3), Some(float3));
    assert_eq!(promote(float2, float3), None);

    let float4x4 = PrimitiveType::matrix(ScalarType::Float, 4);
    let float4 = PrimitiveType::vector(ScalarType::Float, 4);
    assert_eq!(binary_result(BinaryOp::Multiply, float4x4, float4), None);
    assert_eq!(binary_result(BinaryOp::Multiply, float4x4, float), Some(float4x4));
    assert_eq!(binary_result(BinaryOp::Remainder, float, float), None);
    assert_eq!(
        binary_result(BinaryOp::LessThan, float, PrimitiveType::scalar(ScalarType::Int)),
        Some(PrimitiveType::scalar(ScalarType::Bool))
    );
}

#[test]
fn test_implicit_conversions() {
    let int = PrimitiveType::scalar(ScalarType::Int);
    let uint = PrimitiveType::scalar(ScalarType::UInt);
    let float = PrimitiveType::scalar(ScalarType::Float);
    let boolean = PrimitiveType::scalar(ScalarType::Bool);
    assert!(is_implicitly_convertible(float, int));
    assert!(is_implicitly_convertible(uint, int));
    assert!(!is_implicitly_convertible(int, float));
    assert!(!is_implicitly_convertible(boolean, int));
    assert!(!is_implicitly_convertible(PrimitiveType::vector(ScalarType::Float, 2), float));
}
