use gfxsl_ast::BinaryOp;
use gfxsl_text::*;
use gfxsl_text::tokens::*;

/// An error that occurred while parsing or type checking a shader
#[derive(PartialEq, Debug, Clone)]
pub struct ParseError {
    pub reason: ParseErrorReason,
    pub location: SourceLocation,
}

/// The reason a parse failed
#[derive(PartialEq, Debug, Clone)]
pub enum ParseErrorReason {
    /// Token did not match the grammar
    WrongToken(Token, &'static str),

    UnknownType(String),
    UnknownIdentifier(String),
    UnknownMember(String, String),
    UnknownAttribute(String),
    UnknownSemantic(String),
    UnknownFormat(String),
    Redefinition(String),

    /// Two buffers in the same file bind the same slot
    DuplicateSlot(String, u32),

    /// A texture type was used where a value type is required
    TextureTypeNotAllowed(String),

    /// A struct member has a type which can not be placed in the struct kind
    InvalidMemberType(String, String),
    MemberRequiresSemantic(String),
    MemberDoesNotAllowSemantic(String),
    MemberRequiresFormat(String),
    MemberDoesNotAllowFormat(String),
    MemberDoesNotAllowArray(String),
    SystemValueSemanticOnMember(String),
    EmptyStruct(String),

    ArrayDimensionMustBeNonZero,

    /// A struct kind which may only be used as an entry point parameter was used elsewhere
    StageStructNotAllowed(String),

    /// A buffer kind can not be used as a local or constant
    BufferNotAllowed(String),

    InvalidEntryPoint(String, &'static str),
    ThreadsAttributeOnNonCompute(String),

    WrongArgumentCount(String, usize, usize),
    ArgumentTypeMismatch(String, usize, String, String),
    TypeMismatch(String, String),
    UnaryOperationWrongType(&'static str, String),
    BinaryOperationWrongTypes(BinaryOp, String, String),
    ConditionMustBeBool(String),
    IndexMustBeInteger(String),
    SubscriptOnNonIndexable(String),
    InvalidSwizzle(String, String),
    MemberAccessOnNonStruct(String, String),
    InvalidConstructor(String),
    ExpectedTexture(String),
    WrongTextureKind(String, &'static str),
    LvalueRequired,
    AssignmentToReadOnly(String),
    MissingReturnValue,
    UnexpectedReturnValue,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    CaseOutsideSwitch,
    InvalidCaseValue,
}

impl ParseError {
    pub fn new(reason: ParseErrorReason, location: SourceLocation) -> Self {
        ParseError { reason, location }
    }
}

/// Result type for parse functions
pub type ParseResult<T> = Result<T, ParseError>;

/// Name of a binary operator for messages
fn binary_op_text(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::Remainder => "%",
        BinaryOp::LeftShift => "<<",
        BinaryOp::RightShift => ">>",
        BinaryOp::BitwiseAnd => "&",
        BinaryOp::BitwiseOr => "|",
        BinaryOp::BitwiseXor => "^",
        BinaryOp::BooleanAnd => "&&",
        BinaryOp::BooleanOr => "||",
        BinaryOp::LessThan => "<",
        BinaryOp::LessEqual => "<=",
        BinaryOp::GreaterThan => ">",
        BinaryOp::GreaterEqual => ">=",
        BinaryOp::Equality => "==",
        BinaryOp::Inequality => "!=",
        BinaryOp::Assignment => "=",
        BinaryOp::SumAssignment => "+=",
        BinaryOp::DifferenceAssignment => "-=",
        BinaryOp::ProductAssignment => "*=",
        BinaryOp::QuotientAssignment => "/=",
        BinaryOp::RemainderAssignment => "%=",
        BinaryOp::LeftShiftAssignment => "<<=",
        BinaryOp::RightShiftAssignment => ">>=",
        BinaryOp::BitwiseAndAssignment => "&=",
        BinaryOp::BitwiseOrAssignment => "|=",
        BinaryOp::BitwiseXorAssignment => "^=",
        BinaryOp::Sequence => ",",
    }
}

impl CompileError for ParseError {
    fn print(&self, w: &mut MessagePrinter) -> std::fmt::Result {
        let loc = self.location;
        let mut error = |write: &dyn Fn(&mut std::fmt::Formatter) -> std::fmt::Result| {
            w.error(loc, write)
        };
        match &self.reason {
            ParseErrorReason::WrongToken(token, expected) => error(&|f| {
                if *token == Token::Eof {
                    write!(f, "expected {expected} but reached the end of the file")
                } else {
                    write!(f, "expected {expected} but found {token:?}")
                }
            }),
            ParseErrorReason::UnknownType(name) => error(&|f| write!(f, "unknown type '{name}'")),
            ParseErrorReason::UnknownIdentifier(name) => {
                error(&|f| write!(f, "'{name}' was not declared in this scope"))
            }
            ParseErrorReason::UnknownMember(ty, name) => {
                error(&|f| write!(f, "'{ty}' does not have a member named '{name}'"))
            }
            ParseErrorReason::UnknownAttribute(name) => {
                error(&|f| write!(f, "unknown attribute '{name}'"))
            }
            ParseErrorReason::UnknownSemantic(name) => {
                error(&|f| write!(f, "unknown semantic '{name}'"))
            }
            ParseErrorReason::UnknownFormat(name) => {
                error(&|f| write!(f, "unknown input format '{name}'"))
            }
            ParseErrorReason::Redefinition(name) => {
                error(&|f| write!(f, "redefinition of '{name}'"))
            }
            ParseErrorReason::DuplicateSlot(name, slot) => {
                error(&|f| write!(f, "'{name}' binds slot {slot} which is already used by another buffer"))
            }
            ParseErrorReason::TextureTypeNotAllowed(name) => {
                error(&|f| write!(f, "texture type '{name}' can only be used in a texture declaration"))
            }
            ParseErrorReason::InvalidMemberType(ty, kind) => {
                error(&|f| write!(f, "type '{ty}' can not be a member of a {kind}"))
            }
            ParseErrorReason::MemberRequiresSemantic(name) => {
                error(&|f| write!(f, "member '{name}' requires a semantic"))
            }
            ParseErrorReason::MemberDoesNotAllowSemantic(name) => {
                error(&|f| write!(f, "member '{name}' can not have a semantic"))
            }
            ParseErrorReason::MemberRequiresFormat(name) => {
                error(&|f| write!(f, "member '{name}' requires an input format"))
            }
            ParseErrorReason::MemberDoesNotAllowFormat(name) => {
                error(&|f| write!(f, "member '{name}' can not have an input format"))
            }
            ParseErrorReason::MemberDoesNotAllowArray(name) => {
                error(&|f| write!(f, "stage input and output member '{name}' can not be an array"))
            }
            ParseErrorReason::SystemValueSemanticOnMember(name) => {
                error(&|f| write!(f, "system value semantic '{name}' can not be used on a member"))
            }
            ParseErrorReason::EmptyStruct(name) => {
                error(&|f| write!(f, "'{name}' must have at least one member"))
            }
            ParseErrorReason::ArrayDimensionMustBeNonZero => {
                error(&|f| write!(f, "array dimensions must be greater than zero"))
            }
            ParseErrorReason::StageStructNotAllowed(name) => error(&|f| {
                write!(f, "'{name}' can only be used as an entry point parameter")
            }),
            ParseErrorReason::BufferNotAllowed(name) => {
                error(&|f| write!(f, "buffer '{name}' can only be used as a parameter"))
            }
            ParseErrorReason::InvalidEntryPoint(name, reason) => {
                error(&|f| write!(f, "invalid entry point '{name}': {reason}"))
            }
            ParseErrorReason::ThreadsAttributeOnNonCompute(name) => {
                error(&|f| write!(f, "threads attribute is only valid on main_compute, not '{name}'"))
            }
            ParseErrorReason::WrongArgumentCount(name, expected, got) => error(&|f| {
                write!(f, "'{name}' expects {expected} arguments but {got} were given")
            }),
            ParseErrorReason::ArgumentTypeMismatch(name, index, expected, got) => error(&|f| {
                write!(
                    f,
                    "argument {} of '{name}' expects '{expected}' but received '{got}'",
                    index + 1
                )
            }),
            ParseErrorReason::TypeMismatch(expected, got) => {
                error(&|f| write!(f, "can not convert '{got}' to '{expected}'"))
            }
            ParseErrorReason::UnaryOperationWrongType(op, ty) => {
                error(&|f| write!(f, "operator '{op}' can not be applied to '{ty}'"))
            }
            ParseErrorReason::BinaryOperationWrongTypes(op, left, right) => error(&|f| {
                write!(
                    f,
                    "operator '{}' can not be applied to '{left}' and '{right}'",
                    binary_op_text(*op)
                )
            }),
            ParseErrorReason::ConditionMustBeBool(ty) => {
                error(&|f| write!(f, "condition must be 'bool' but is '{ty}'"))
            }
            ParseErrorReason::IndexMustBeInteger(ty) => {
                error(&|f| write!(f, "index must be an integer but is '{ty}'"))
            }
            ParseErrorReason::SubscriptOnNonIndexable(ty) => {
                error(&|f| write!(f, "'{ty}' can not be indexed"))
            }
            ParseErrorReason::InvalidSwizzle(ty, swizzle) => {
                error(&|f| write!(f, "invalid swizzle '{swizzle}' on '{ty}'"))
            }
            ParseErrorReason::MemberAccessOnNonStruct(ty, name) => {
                error(&|f| write!(f, "can not access member '{name}' of '{ty}'"))
            }
            ParseErrorReason::InvalidConstructor(ty) => {
                error(&|f| write!(f, "invalid arguments to constructor of '{ty}'"))
            }
            ParseErrorReason::ExpectedTexture(name) => {
                error(&|f| write!(f, "first argument of '{name}' must be a texture"))
            }
            ParseErrorReason::WrongTextureKind(name, kind) => {
                error(&|f| write!(f, "'{name}' can not be used with a {kind}"))
            }
            ParseErrorReason::LvalueRequired => {
                error(&|f| write!(f, "expression is not assignable"))
            }
            ParseErrorReason::AssignmentToReadOnly(name) => {
                error(&|f| write!(f, "'{name}' is read only"))
            }
            ParseErrorReason::MissingReturnValue => {
                error(&|f| write!(f, "non-void function must return a value"))
            }
            ParseErrorReason::UnexpectedReturnValue => {
                error(&|f| write!(f, "void function can not return a value"))
            }
            ParseErrorReason::BreakOutsideLoop => {
                error(&|f| write!(f, "break statement not within a loop or switch"))
            }
            ParseErrorReason::ContinueOutsideLoop => {
                error(&|f| write!(f, "continue statement not within a loop"))
            }
            ParseErrorReason::CaseOutsideSwitch => {
                error(&|f| write!(f, "case label not within a switch statement"))
            }
            ParseErrorReason::InvalidCaseValue => {
                error(&|f| write!(f, "case value must be an integer literal"))
            }
        }
    }
}
