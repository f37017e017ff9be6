/// Prefix and postfix operators
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum UnaryOp {
    Plus,
    Minus,
    LogicalNot,
    BitwiseNot,
    PrefixIncrement,
    PrefixDecrement,
    PostfixIncrement,
    PostfixDecrement,
}

/// Infix operators
///
/// Member access is represented by dedicated nodes so `.` is not part of this list.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    LeftShift,
    RightShift,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BooleanAnd,
    BooleanOr,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Equality,
    Inequality,
    Assignment,
    SumAssignment,
    DifferenceAssignment,
    ProductAssignment,
    QuotientAssignment,
    RemainderAssignment,
    LeftShiftAssignment,
    RightShiftAssignment,
    BitwiseAndAssignment,
    BitwiseOrAssignment,
    BitwiseXorAssignment,
    Sequence,
}

impl UnaryOp {
    pub const fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostfixIncrement | UnaryOp::PostfixDecrement)
    }

    /// If the operator writes to its operand
    pub const fn is_mutating(self) -> bool {
        matches!(
            self,
            UnaryOp::PrefixIncrement
                | UnaryOp::PrefixDecrement
                | UnaryOp::PostfixIncrement
                | UnaryOp::PostfixDecrement
        )
    }
}

impl BinaryOp {
    /// Number of binary operators
    pub const COUNT: usize = 30;

    /// Index into operator tables
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assignment
                | BinaryOp::SumAssignment
                | BinaryOp::DifferenceAssignment
                | BinaryOp::ProductAssignment
                | BinaryOp::QuotientAssignment
                | BinaryOp::RemainderAssignment
                | BinaryOp::LeftShiftAssignment
                | BinaryOp::RightShiftAssignment
                | BinaryOp::BitwiseAndAssignment
                | BinaryOp::BitwiseOrAssignment
                | BinaryOp::BitwiseXorAssignment
        )
    }

    /// If the operator produces a boolean result
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::LessThan
                | BinaryOp::LessEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterEqual
                | BinaryOp::Equality
                | BinaryOp::Inequality
        )
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::BooleanAnd | BinaryOp::BooleanOr)
    }

    /// If the operator requires integer operands
    pub const fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOp::LeftShift
                | BinaryOp::RightShift
                | BinaryOp::BitwiseAnd
                | BinaryOp::BitwiseOr
                | BinaryOp::BitwiseXor
                | BinaryOp::LeftShiftAssignment
                | BinaryOp::RightShiftAssignment
                | BinaryOp::BitwiseAndAssignment
                | BinaryOp::BitwiseOrAssignment
                | BinaryOp::BitwiseXorAssignment
        )
    }
}

#[test]
fn test_binary_op_index() {
    assert_eq!(BinaryOp::Add.index(), 0);
    assert_eq!(BinaryOp::Sequence.index(), BinaryOp::COUNT - 1);
}
