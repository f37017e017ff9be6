//! Tokens
//!
//! The tokens module contains all the definitions for tokens produced by the scanner.
//! The same token type is used by the preprocessor (with whitespace retained) and the parser (with whitespace removed).

use crate::*;

/// An arbitrary identifier token string
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone)]
pub struct Identifier(pub String);

impl std::fmt::Debug for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

/// Any token that may appear in a shader file
#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    Eof, // Marks the end of a stream

    Id(Identifier),

    /// Literal int without an explicit type
    /// These do not have sign. The - is an operator on the literal
    LiteralInt(u64),

    /// Literal int with an explicit unsigned suffix
    LiteralUInt(u64),

    /// Literal float without a suffix
    LiteralFloat(f64),

    /// Literal float with an explicit float suffix
    LiteralFloat32(f32),

    LiteralString(String),
    True,
    False,

    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftSquareBracket,
    RightSquareBracket,
    LeftAngleBracket,
    RightAngleBracket,
    LessEquals,
    GreaterEquals,
    LeftShift,
    LeftShiftEquals,
    RightShift,
    RightShiftEquals,
    Semicolon,
    Comma,
    QuestionMark,
    Colon,

    Plus,
    PlusPlus,
    PlusEquals,
    Minus,
    MinusMinus,
    MinusEquals,
    ForwardSlash,
    ForwardSlashEquals,
    Percent,
    PercentEquals,
    Asterix,
    AsterixEquals,
    VerticalBar,
    VerticalBarVerticalBar,
    VerticalBarEquals,
    Ampersand,
    AmpersandAmpersand,
    AmpersandEquals,
    Hat,
    HatEquals,
    Equals,
    EqualsEquals,
    Hash,
    HashHash,
    ExclamationPoint,
    ExclamationPointEquals,
    Tilde,
    Period,

    If,
    Else,
    For,
    While,
    Do,
    Switch,
    Return,
    Break,
    Continue,
    Discard,
    Case,
    Default,

    Struct,
    SharedStruct,
    UniformBuffer,
    ConstantBuffer,
    MutableBuffer,
    InstanceInput,
    VertexInput,
    VertexOutput,
    FragmentInput,
    FragmentOutput,

    In,
    Out,
    InOut,
    Const,

    /// Header name in <>
    HeaderName(String),

    /// Line ending
    Endline,

    /// Physical line ending which does not end the logical line
    PhysicalEndline,

    /// Non-line ending whitespace
    Whitespace,

    /// Line and block comments
    Comment,

    /// Temporary reference to macro argument used during define processing
    MacroArg(u32),
}

impl Token {
    /// Test if the token is for whitespace, endlines, or comments
    pub fn is_whitespace(&self) -> bool {
        matches!(
            self,
            Token::Endline | Token::PhysicalEndline | Token::Whitespace | Token::Comment
        )
    }

    /// Get the keyword token for a word - if the word is a keyword
    pub fn from_keyword(word: &str) -> Option<Token> {
        Some(match word {
            "if" => Token::If,
            "else" => Token::Else,
            "for" => Token::For,
            "while" => Token::While,
            "do" => Token::Do,
            "switch" => Token::Switch,
            "return" => Token::Return,
            "break" => Token::Break,
            "continue" => Token::Continue,
            "discard" => Token::Discard,
            "case" => Token::Case,
            "default" => Token::Default,
            "struct" => Token::Struct,
            "shared_struct" => Token::SharedStruct,
            "uniform_buffer" => Token::UniformBuffer,
            "constant_buffer" => Token::ConstantBuffer,
            "mutable_buffer" => Token::MutableBuffer,
            "instance_input" => Token::InstanceInput,
            "vertex_input" => Token::VertexInput,
            "vertex_output" => Token::VertexOutput,
            "fragment_input" => Token::FragmentInput,
            "fragment_output" => Token::FragmentOutput,
            "in" => Token::In,
            "out" => Token::Out,
            "inout" => Token::InOut,
            "const" => Token::Const,
            "true" => Token::True,
            "false" => Token::False,
            _ => return None,
        })
    }

    /// Get the source spelling of a keyword token
    ///
    /// The preprocessor uses this to read directive names that collide with keywords such as `if` and `else`
    pub fn keyword_text(&self) -> Option<&'static str> {
        Some(match self {
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::While => "while",
            Token::Do => "do",
            Token::Switch => "switch",
            Token::Return => "return",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Discard => "discard",
            Token::Case => "case",
            Token::Default => "default",
            Token::Struct => "struct",
            Token::SharedStruct => "shared_struct",
            Token::UniformBuffer => "uniform_buffer",
            Token::ConstantBuffer => "constant_buffer",
            Token::MutableBuffer => "mutable_buffer",
            Token::InstanceInput => "instance_input",
            Token::VertexInput => "vertex_input",
            Token::VertexOutput => "vertex_output",
            Token::FragmentInput => "fragment_input",
            Token::FragmentOutput => "fragment_output",
            Token::In => "in",
            Token::Out => "out",
            Token::InOut => "inout",
            Token::Const => "const",
            Token::True => "true",
            Token::False => "false",
            _ => return None,
        })
    }
}

/// A [Token] for use during preprocessing
#[derive(PartialEq, Clone)]
pub struct PreprocessToken(
    /// The base token
    pub Token,
    /// Additional metadata for the token
    pub PreprocessTokenData,
);

/// Additional data associated with a token for the preprocessing phase
#[derive(PartialEq, Eq, Clone)]
pub struct PreprocessTokenData {
    /// The location the token is sourced from
    start_location: SourceLocation,

    /// The location after the token
    /// Must be from the same file and after start_location
    end_location: SourceLocation,
}

/// A [Token] with source location information attached
#[derive(PartialEq, Clone)]
pub struct LexToken(pub Token, pub SourceLocation);

impl PreprocessToken {
    /// Construct a new token with the given source range
    pub fn new(
        tok: Token,
        base_location: SourceLocation,
        start_offset: u32,
        end_offset: u32,
    ) -> Self {
        if base_location == SourceLocation::UNKNOWN {
            Self::without_location(tok)
        } else {
            assert!(start_offset <= end_offset);
            PreprocessToken(
                tok,
                PreprocessTokenData {
                    start_location: base_location.offset(start_offset),
                    end_location: base_location.offset(end_offset),
                },
            )
        }
    }

    /// Construct a new token with the unknown source range
    pub fn without_location(tok: Token) -> Self {
        PreprocessToken(
            tok,
            PreprocessTokenData {
                start_location: SourceLocation::UNKNOWN,
                end_location: SourceLocation::UNKNOWN,
            },
        )
    }
}

impl Locate for PreprocessToken {
    fn get_location(&self) -> SourceLocation {
        self.1.start_location
    }
}

impl LocateEnd for PreprocessToken {
    fn get_end_location(&self) -> SourceLocation {
        self.1.end_location
    }
}

impl Locate for Option<&PreprocessToken> {
    fn get_location(&self) -> SourceLocation {
        match self {
            Some(tok) => tok.1.start_location,
            None => SourceLocation::UNKNOWN,
        }
    }
}

impl LexToken {
    /// Extract the file location from a lex token
    pub fn to_loc(self) -> SourceLocation {
        self.1
    }

    /// Create a token with no file location
    pub fn with_no_loc(token: Token) -> LexToken {
        LexToken(token, SourceLocation::UNKNOWN)
    }
}

impl std::fmt::Debug for PreprocessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{:?} @ {}-{}",
            self.0,
            self.1.start_location.get_raw(),
            self.1.end_location.get_raw()
        )
    }
}

impl std::fmt::Debug for LexToken {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?} @ {}", self.0, self.1.get_raw())
    }
}
