use gfxsl_ast::{BinaryOp, UnaryOp};

/// Target text of every binary operator, indexed by [BinaryOp::index]
const BINARY_OPERATORS: [&str; BinaryOp::COUNT] = [
    " + ", " - ", " * ", " / ", " % ", " << ", " >> ", " & ", " | ", " ^ ", " && ", " || ", " < ",
    " <= ", " > ", " >= ", " == ", " != ", " = ", " += ", " -= ", " *= ", " /= ", " %= ", " <<= ",
    " >>= ", " &= ", " |= ", " ^= ", ", ",
];

/// Target text of a binary operator including surrounding spaces
pub fn binary_operator_text(op: BinaryOp) -> &'static str {
    BINARY_OPERATORS[op.index()]
}

/// Target text of a unary operator
pub fn unary_operator_text(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => "+",
        UnaryOp::Minus => "-",
        UnaryOp::LogicalNot => "!",
        UnaryOp::BitwiseNot => "~",
        UnaryOp::PrefixIncrement | UnaryOp::PostfixIncrement => "++",
        UnaryOp::PrefixDecrement | UnaryOp::PostfixDecrement => "--",
    }
}

#[test]
fn test_operator_table() {
    assert_eq!(binary_operator_text(BinaryOp::Add), " + ");
    assert_eq!(binary_operator_text(BinaryOp::Remainder), " % ");
    assert_eq!(binary_operator_text(BinaryOp::BooleanOr), " || ");
    assert_eq!(binary_operator_text(BinaryOp::Inequality), " != ");
    assert_eq!(binary_operator_text(BinaryOp::Assignment), " = ");
    assert_eq!(binary_operator_text(BinaryOp::RightShiftAssignment), " >>= ");
    assert_eq!(binary_operator_text(BinaryOp::BitwiseXorAssignment), " ^= ");
    assert_eq!(binary_operator_text(BinaryOp::Sequence), ", ");
    assert_eq!(unary_operator_text(UnaryOp::PostfixDecrement), "--");
}
