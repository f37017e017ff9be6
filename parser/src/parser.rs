use gfxsl_ast::*;
use gfxsl_text::*;
use gfxsl_text::tokens::*;

/// Failure cases
mod errors;
pub use errors::{ParseError, ParseErrorReason};
use errors::ParseResult;

/// Symbol tables for the module being built
mod scopes;
use scopes::Scopes;

// Implement parsing and checking of type names
mod types;

// Implement parsing for struct declarations
mod structs;

// Implement parsing for textures and file scope constants
mod globals;

// Implement parsing for functions and entry point validation
mod functions;

// Implement parsing for statements
mod statements;

// Implement parsing for expressions
mod expressions;

#[cfg(test)]
mod tests;

/// Returned when reading past the end of the token stream
static EOF: Token = Token::Eof;

/// Recursive descent parser state
///
/// Holds the module under construction so declarations and nodes are resolved while parsing.
struct Parser<'t> {
    tokens: &'t [LexToken],
    position: usize,
    module: Module,
    scopes: Scopes,

    /// Binding slots taken by the buffers declared so far
    buffer_slots: Vec<u32>,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [LexToken], name: &str) -> Self {
        Parser {
            tokens,
            position: 0,
            module: Module::new(name),
            scopes: Scopes::default(),
            buffer_slots: Vec::new(),
        }
    }

    /// Get the current token
    fn peek(&self) -> &'t Token {
        self.peek_at(0)
    }

    /// Get a token ahead of the current token
    fn peek_at(&self, offset: usize) -> &'t Token {
        match self.tokens.get(self.position + offset) {
            Some(LexToken(token, _)) => token,
            None => &EOF,
        }
    }

    /// Get the location of the current token
    fn location(&self) -> SourceLocation {
        match self.tokens.get(self.position) {
            Some(LexToken(_, loc)) => *loc,
            None => self
                .tokens
                .last()
                .map(|LexToken(_, loc)| *loc)
                .unwrap_or(SourceLocation::UNKNOWN),
        }
    }

    /// Move past the current token
    fn advance(&mut self) -> &'t Token {
        let token = self.peek();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    /// Consume the current token if it matches
    fn accept(&mut self, token: Token) -> bool {
        if *self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token or fail if it does not match
    fn expect(&mut self, token: Token, expected: &'static str) -> ParseResult<SourceLocation> {
        let loc = self.location();
        if *self.peek() == token {
            self.advance();
            Ok(loc)
        } else {
            Err(self.wrong_token(expected))
        }
    }

    /// Consume an identifier
    fn expect_identifier(&mut self, expected: &'static str) -> ParseResult<Located<String>> {
        let loc = self.location();
        match self.peek() {
            Token::Id(Identifier(name)) => {
                self.advance();
                Ok(Located::new(name.clone(), loc))
            }
            _ => Err(self.wrong_token(expected)),
        }
    }

    /// Consume an integer literal
    fn expect_integer(&mut self, expected: &'static str) -> ParseResult<Located<u32>> {
        let loc = self.location();
        match self.peek() {
            Token::LiteralInt(value) | Token::LiteralUInt(value) if *value <= u32::MAX as u64 => {
                self.advance();
                Ok(Located::new(*value as u32, loc))
            }
            _ => Err(self.wrong_token(expected)),
        }
    }

    /// Build an error for an unexpected token at the current position
    fn wrong_token(&self, expected: &'static str) -> ParseError {
        ParseError::new(
            ParseErrorReason::WrongToken(self.peek().clone(), expected),
            self.location(),
        )
    }

    /// Add a node to the module
    fn add_node(&mut self, node: Node, location: SourceLocation, ty: ValueType) -> NodeId {
        self.module.nodes.add(node, location, ty)
    }

    /// Add a statement node to the module
    fn add_statement(&mut self, node: Node, location: SourceLocation) -> NodeId {
        let void = ValueType::new(self.module.void_type());
        self.add_node(node, location, void)
    }

    /// Fail if a name is already used by a file scope declaration
    fn check_root_name_free(&self, name: &Located<String>) -> ParseResult<()> {
        if self.scopes.is_root_name_used(&name.node)
            || self.module.find_type(&name.node).is_some()
            || Intrinsic::from_name(&name.node).is_some()
            || Semantic::from_system_value_name(&name.node).is_some()
        {
            Err(ParseError::new(
                ParseErrorReason::Redefinition(name.node.clone()),
                name.location,
            ))
        } else {
            Ok(())
        }
    }

    /// Parse a single top level declaration
    fn parse_root(&mut self) -> ParseResult<()> {
        match self.peek() {
            Token::Semicolon => {
                self.advance();
                Ok(())
            }
            Token::Struct
            | Token::SharedStruct
            | Token::UniformBuffer
            | Token::ConstantBuffer
            | Token::MutableBuffer
            | Token::InstanceInput
            | Token::VertexInput
            | Token::VertexOutput
            | Token::FragmentInput
            | Token::FragmentOutput => self.parse_struct(),
            Token::Const => self.parse_global_constant(),
            Token::Id(Identifier(name)) if TextureKind::from_name(name).is_some() => {
                self.parse_texture()
            }
            _ => self.parse_function(),
        }
    }
}

/// Parse a stream of lex tokens into a typed abstract syntax tree
///
/// The token stream must end with [Token::Eof].
pub fn parse(tokens: &[LexToken], shader_name: &str) -> Result<Module, ParseError> {
    let mut parser = Parser::new(tokens, shader_name);
    while *parser.peek() != Token::Eof {
        parser.parse_root()?;
    }

    log::debug!(
        "parsed shader '{}': {} nodes, {} functions, {} structs",
        shader_name,
        parser.module.nodes.len(),
        parser.module.functions.len(),
        parser.module.structs.len()
    );

    Ok(parser.module)
}
