use gfxsl_text::tokens::*;
use gfxsl_text::*;

/// Scans raw file bytes into preprocessor tokens
pub struct TokenStream<'bytes> {
    input_bytes: &'bytes [u8],
    base_location: SourceLocation,
    current_offset: usize,
    add_trailing_endline: bool,
    last_was_endline: bool,
}

impl<'bytes> TokenStream<'bytes> {
    /// Create a new token stream
    pub fn new(input: &'bytes str, base_location: SourceLocation) -> Self {
        TokenStream {
            input_bytes: input.as_bytes(),
            base_location,
            current_offset: 0,
            add_trailing_endline: true,
            last_was_endline: true,
        }
    }

    /// Suppress automated insertion of endline at end of file
    #[cfg(test)]
    pub fn suppress_trailing_endline(mut self) -> Self {
        self.add_trailing_endline = false;
        self
    }

    /// Check if there are remaining bytes to be consumed
    pub fn end_of_stream(&self) -> bool {
        self.current_offset >= self.input_bytes.len()
            && (self.last_was_endline || !self.add_trailing_endline)
    }

    /// Read the next token from the stream
    pub fn next(&mut self, inside_include: bool) -> Result<PreprocessToken, LexerError> {
        if self.add_trailing_endline && self.current_offset == self.input_bytes.len() {
            // Files which do not end in a new line get one so included files always end on a fresh line
            self.last_was_endline = true;
            let offset = self.current_offset as u32;
            return Ok(PreprocessToken::new(
                Token::Endline,
                self.base_location,
                offset,
                offset,
            ));
        }

        match token_intermediate(&self.input_bytes[self.current_offset..], inside_include) {
            Ok((remaining, next_token)) => {
                let next_location = self.input_bytes.len() - remaining.len();
                debug_assert!(self.current_offset < next_location);
                self.last_was_endline = next_token == Token::Endline;
                let tok = PreprocessToken::new(
                    next_token,
                    self.base_location,
                    self.current_offset as u32,
                    next_location as u32,
                );
                self.current_offset = next_location;
                Ok(tok)
            }
            Err(LexErrorContext(rest, reason)) => {
                let error_offset = self.input_bytes.len() - rest.len();
                debug_assert!(self.current_offset <= error_offset);
                Err(LexerError::new(
                    reason,
                    self.base_location.offset(error_offset as u32),
                ))
            }
        }
    }

    /// Read every token from the stream
    ///
    /// Header names are only scanned directly after `#include` at the start of a line
    pub fn read_to_end(&mut self) -> Result<Vec<PreprocessToken>, LexerError> {
        #[derive(PartialEq, Eq, Copy, Clone)]
        enum LineState {
            Start,
            AfterHash,
            AfterInclude,
            Other,
        }

        let mut tokens = Vec::new();
        let mut state = LineState::Start;
        while !self.end_of_stream() {
            let token = self.next(state == LineState::AfterInclude)?;
            state = match (&token.0, state) {
                (Token::Endline, _) => LineState::Start,
                (tok, s) if tok.is_whitespace() => s,
                (Token::Hash, LineState::Start) => LineState::AfterHash,
                (Token::Id(id), LineState::AfterHash) if id.0 == "include" => {
                    LineState::AfterInclude
                }
                _ => LineState::Other,
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Run the lexer on the contents of a file
pub fn lex(input: &str, base_location: SourceLocation) -> Result<Vec<PreprocessToken>, LexerError> {
    TokenStream::new(input, base_location).read_to_end()
}

/// Provides details on why a lex operation failed
#[derive(PartialEq, Clone, Debug)]
pub struct LexerError {
    pub reason: LexerErrorReason,
    pub location: SourceLocation,
}

/// The reason for a lex failure
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum LexerErrorReason {
    /// Generic wrong characters expected for a certain token
    UnexpectedBytes,

    /// Internal error code for failing to select a token type
    OtherTokenBytes,

    /// Reached end of the input stream
    EndOfStream,

    /// The suffix for a numeric literal is not a valid suffix
    InvalidSuffix,

    /// A block comment is never closed
    CommentWrapsFile,

    /// A string literal wraps the end of a line (but does end before end of stream)
    StringWrapsLine,

    /// A string literal never ends in the stream
    StringWrapsFile,

    /// A header name wraps the end of a line (but does end before end of stream)
    HeaderNameWrapsLine,

    /// A header name never ends in the stream
    HeaderNameWrapsFile,

    /// A string or header name contains invalid characters
    ContainsInvalidCharacters,
}

impl LexerError {
    /// Create a new lexer error
    pub fn new(reason: LexerErrorReason, location: SourceLocation) -> Self {
        LexerError { reason, location }
    }
}

impl std::fmt::Display for LexerErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let text = match self {
            LexerErrorReason::UnexpectedBytes => "unexpected characters",
            LexerErrorReason::OtherTokenBytes => "internal lexer error",
            LexerErrorReason::EndOfStream => "unexpected end of stream",
            LexerErrorReason::InvalidSuffix => "invalid suffix on numeric literal",
            LexerErrorReason::CommentWrapsFile => "block comment never terminates",
            LexerErrorReason::StringWrapsLine => "string literal not terminated at end of line",
            LexerErrorReason::StringWrapsFile => "string literal never terminates",
            LexerErrorReason::HeaderNameWrapsLine => "header name not terminated at end of line",
            LexerErrorReason::HeaderNameWrapsFile => "header name never terminates",
            LexerErrorReason::ContainsInvalidCharacters => "literal contains invalid characters",
        };
        write!(f, "{}", text)
    }
}

impl CompileError for LexerError {
    fn print(&self, w: &mut MessagePrinter) -> std::fmt::Result {
        w.error(self.location, &|f| write!(f, "{}", self.reason))
    }
}

/// Internal error data when a lexer fails to lex
#[derive(PartialEq, Debug, Clone)]
struct LexErrorContext<'b>(&'b [u8], LexerErrorReason);

/// Internal error result type
type LexResult<'b, O> = Result<(&'b [u8], O), LexErrorContext<'b>>;

/// Make an error for when the wrong characters were encountered to parse a certain token
fn wrong_chars<T>(input: &[u8]) -> LexResult<T> {
    Err(LexErrorContext(input, LexerErrorReason::UnexpectedBytes))
}

/// Make an error for when the characters are encountered which indicate we are another token
fn other_token_chars<T>(input: &[u8]) -> LexResult<T> {
    Err(LexErrorContext(input, LexerErrorReason::OtherTokenBytes))
}

type DynLexFn<'f> = &'f dyn Fn(&[u8]) -> LexResult<Token>;

/// Lex a token from a set of lexers
fn choose<'b>(lex_fns: &[DynLexFn], input: &'b [u8]) -> LexResult<'b, Token> {
    for lex_fn in lex_fns {
        match lex_fn(input) {
            Ok(ok) => return Ok(ok),
            // Lex function did not recognise the token type
            Err(LexErrorContext(rest, LexerErrorReason::OtherTokenBytes)) => {
                debug_assert_eq!(input.len(), rest.len())
            }
            // Lex function accepted the token type then failed
            err => return err,
        }
    }
    wrong_chars(input)
}

/// Count the leading bytes that match a predicate
fn count_while(input: &[u8], pred: impl Fn(u8) -> bool) -> usize {
    input.iter().position(|c| !pred(*c)).unwrap_or(input.len())
}

fn is_identifier_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Parse an integer literal in decimal, hexadecimal or octal
fn literal_int(input: &[u8]) -> LexResult<Token> {
    let (radix, digits_start) = if input.starts_with(b"0x") || input.starts_with(b"0X") {
        (16, 2)
    } else if input.len() > 1 && input[0] == b'0' && input[1].is_ascii_digit() {
        (8, 1)
    } else {
        (10, 0)
    };

    let body = &input[digits_start..];
    let len = count_while(body, |c| (c as char).is_digit(radix));
    if len == 0 {
        return wrong_chars(input);
    }

    // Digits were validated above so only overflow can fail
    let text = std::str::from_utf8(&body[..len]).map_err(|_| LexErrorContext(input, LexerErrorReason::UnexpectedBytes))?;
    let value = u64::from_str_radix(text, radix)
        .map_err(|_| LexErrorContext(input, LexerErrorReason::UnexpectedBytes))?;

    let rest = &body[len..];
    let (rest, token) = match rest.first() {
        Some(b'u') | Some(b'U') => (&rest[1..], Token::LiteralUInt(value)),
        _ => (rest, Token::LiteralInt(value)),
    };

    if rest.first().map(|c| is_identifier_char(*c)).unwrap_or(false) {
        return Err(LexErrorContext(rest, LexerErrorReason::InvalidSuffix));
    }

    Ok((rest, token))
}

#[test]
fn test_literal_int() {
    let p = literal_int;
    assert_eq!(p(b"0u"), Ok((&b""[..], Token::LiteralUInt(0))));
    assert_eq!(p(b"0 "), Ok((&b" "[..], Token::LiteralInt(0))));
    assert_eq!(p(b"12 "), Ok((&b" "[..], Token::LiteralInt(12))));
    assert_eq!(p(b"12U"), Ok((&b""[..], Token::LiteralUInt(12))));
    assert_eq!(p(b"0x3 "), Ok((&b" "[..], Token::LiteralInt(3))));
    assert_eq!(p(b"0xA1u"), Ok((&b""[..], Token::LiteralUInt(161))));
    assert_eq!(p(b"0123u"), Ok((&b""[..], Token::LiteralUInt(83))));
    assert_eq!(
        p(b"12x"),
        Err(LexErrorContext(b"x", LexerErrorReason::InvalidSuffix))
    );
}

/// Parse a float literal
///
/// Requires either a fractional part or an exponent so integers are not consumed
fn literal_float(input: &[u8]) -> LexResult<Token> {
    let whole = count_while(input, |c| c.is_ascii_digit());
    let mut len = whole;
    let mut has_fraction = false;
    if input.get(len) == Some(&b'.') {
        let fraction = count_while(&input[len + 1..], |c| c.is_ascii_digit());
        if whole == 0 && fraction == 0 {
            return other_token_chars(input);
        }
        has_fraction = true;
        len += 1 + fraction;
    } else if whole == 0 {
        return other_token_chars(input);
    }

    let mut has_exponent = false;
    if let Some(b'e') | Some(b'E') = input.get(len) {
        let mut exp_len = 1;
        if let Some(b'+') | Some(b'-') = input.get(len + exp_len) {
            exp_len += 1;
        }
        let exp_digits = count_while(&input[len + exp_len..], |c| c.is_ascii_digit());
        if exp_digits > 0 {
            has_exponent = true;
            len += exp_len + exp_digits;
        }
    }

    if !has_fraction && !has_exponent {
        return other_token_chars(input);
    }

    let text = std::str::from_utf8(&input[..len])
        .map_err(|_| LexErrorContext(input, LexerErrorReason::UnexpectedBytes))?;
    let value = text
        .parse::<f64>()
        .map_err(|_| LexErrorContext(input, LexerErrorReason::UnexpectedBytes))?;

    let suffix = &input[len..];
    let (rest, token) = match suffix.first() {
        Some(b'f') | Some(b'F') => (&suffix[1..], Token::LiteralFloat32(value as f32)),
        _ => (suffix, Token::LiteralFloat(value)),
    };

    // The error points at the whole suffix including any `f`
    if rest.first().map(|c| is_identifier_char(*c)).unwrap_or(false) {
        return Err(LexErrorContext(suffix, LexerErrorReason::InvalidSuffix));
    }

    Ok((rest, token))
}

#[test]
fn test_literal_float() {
    let p = literal_float;
    assert_eq!(p(b"0.0f"), Ok((&b""[..], Token::LiteralFloat32(0.0))));
    assert_eq!(p(b"2.5"), Ok((&b""[..], Token::LiteralFloat(2.5))));
    assert_eq!(p(b"0.;"), Ok((&b";"[..], Token::LiteralFloat(0.0))));
    assert_eq!(p(b".5"), Ok((&b""[..], Token::LiteralFloat(0.5))));
    assert_eq!(p(b"7E-7"), Ok((&b""[..], Token::LiteralFloat(7e-7))));
    assert_eq!(p(b"1e+11f"), Ok((&b""[..], Token::LiteralFloat32(1e+11))));
    assert!(p(b"0").is_err());
    assert!(p(b".").is_err());
    assert_eq!(
        p(b"0.0p"),
        Err(LexErrorContext(b"p", LexerErrorReason::InvalidSuffix))
    );
    assert_eq!(
        p(b"0.0f0"),
        Err(LexErrorContext(b"f0", LexerErrorReason::InvalidSuffix))
    );
    assert_eq!(
        p(b"1.5fx;"),
        Err(LexErrorContext(b"fx;", LexerErrorReason::InvalidSuffix))
    );
}

/// Parse a quoted range - used for both string literals and header names
fn delimited<'b>(
    input: &'b [u8],
    open: u8,
    close: u8,
    wraps_line: LexerErrorReason,
    wraps_file: LexerErrorReason,
) -> LexResult<'b, &'b str> {
    match input.split_first() {
        Some((c, rest)) if *c == open => match rest.iter().position(|c| *c == close) {
            Some(pos) => {
                let inner = &rest[..pos];
                if inner.contains(&b'\n') {
                    return Err(LexErrorContext(input, wraps_line));
                }
                match std::str::from_utf8(inner) {
                    Ok(text) => Ok((&rest[pos + 1..], text)),
                    Err(_) => Err(LexErrorContext(
                        input,
                        LexerErrorReason::ContainsInvalidCharacters,
                    )),
                }
            }
            None => Err(LexErrorContext(input, wraps_file)),
        },
        _ => other_token_chars(input),
    }
}

/// Parse a literal string
fn literal_string(input: &[u8]) -> LexResult<Token> {
    let (rest, text) = delimited(
        input,
        b'"',
        b'"',
        LexerErrorReason::StringWrapsLine,
        LexerErrorReason::StringWrapsFile,
    )?;
    Ok((rest, Token::LiteralString(text.to_string())))
}

/// Parse a header name inside <>
fn header_name(input: &[u8]) -> LexResult<Token> {
    let (rest, text) = delimited(
        input,
        b'<',
        b'>',
        LexerErrorReason::HeaderNameWrapsLine,
        LexerErrorReason::HeaderNameWrapsFile,
    )?;
    Ok((rest, Token::HeaderName(text.to_string())))
}

#[test]
fn test_literal_string() {
    let p = literal_string;
    assert_eq!(
        p(b"\"abc\""),
        Ok((&b""[..], Token::LiteralString("abc".to_string())))
    );
    assert_eq!(
        p(b"\"a\nb\""),
        Err(LexErrorContext(b"\"a\nb\"", LexerErrorReason::StringWrapsLine))
    );
    assert_eq!(
        p(b"\""),
        Err(LexErrorContext(b"\"", LexerErrorReason::StringWrapsFile))
    );
    assert_eq!(
        header_name(b"<a/b.gfx> "),
        Ok((&b" "[..], Token::HeaderName("a/b.gfx".to_string())))
    );
}

/// Parse an identifier or keyword
fn any_word(input: &[u8]) -> LexResult<Token> {
    let len = count_while(input, is_identifier_char);
    if len == 0 || input[0].is_ascii_digit() {
        return other_token_chars(input);
    }
    let (word, rest) = input.split_at(len);
    let word = std::str::from_utf8(word)
        .map_err(|_| LexErrorContext(input, LexerErrorReason::UnexpectedBytes))?;
    let token = Token::from_keyword(word).unwrap_or_else(|| Token::Id(Identifier(word.to_string())));
    Ok((rest, token))
}

/// Parse trivial whitespace
fn whitespace_simple(input: &[u8]) -> LexResult<Token> {
    let len = count_while(input, |c| c == b' ' || c == b'\t');
    if len == 0 {
        other_token_chars(input)
    } else {
        Ok((&input[len..], Token::Whitespace))
    }
}

/// Parse a line ending
fn whitespace_endline(input: &[u8]) -> LexResult<Token> {
    match input {
        // Escaped line endings continue the logical line
        [b'\\', b'\r', b'\n', rest @ ..] | [b'\\', b'\n', rest @ ..] => {
            Ok((rest, Token::PhysicalEndline))
        }
        [b'\r', b'\n', rest @ ..] | [b'\n', rest @ ..] => Ok((rest, Token::Endline)),
        _ => other_token_chars(input),
    }
}

/// Parse a line comment
fn line_comment(input: &[u8]) -> LexResult<Token> {
    if !input.starts_with(b"//") {
        return other_token_chars(input);
    }
    let mut pos = 2;
    while pos < input.len() {
        match whitespace_endline(&input[pos..]) {
            Ok((_, Token::Endline)) => return Ok((&input[pos..], Token::Comment)),
            Ok((rest, _)) => pos = input.len() - rest.len(),
            Err(_) => pos += 1,
        }
    }
    Ok((&[], Token::Comment))
}

/// Parse a block comment
fn block_comment(input: &[u8]) -> LexResult<Token> {
    if !input.starts_with(b"/*") {
        return other_token_chars(input);
    }
    match input[2..].windows(2).position(|w| w == b"*/") {
        Some(pos) => Ok((&input[pos + 4..], Token::Comment)),
        None => Err(LexErrorContext(input, LexerErrorReason::CommentWrapsFile)),
    }
}

#[test]
fn test_whitespace() {
    let end = |t: Token| Ok((&[][..], t));
    assert!(whitespace_simple(b"").is_err());
    assert_eq!(whitespace_simple(b" \t "), end(Token::Whitespace));
    assert_eq!(line_comment(b"// comment\n"), Ok((&b"\n"[..], Token::Comment)));
    assert_eq!(line_comment(b"// a \\\n b\n"), Ok((&b"\n"[..], Token::Comment)));
    assert_eq!(block_comment(b"/* a\n * b */"), end(Token::Comment));
    assert_eq!(
        block_comment(b"/* a"),
        Err(LexErrorContext(b"/* a", LexerErrorReason::CommentWrapsFile))
    );
}

/// Parse a single character symbol into a token
fn symbol_single(op_char: u8, op_token: Token) -> impl Fn(&[u8]) -> LexResult<Token> {
    move |input: &[u8]| match input {
        [c, ..] if *c == op_char => Ok((&input[1..], op_token.clone())),
        _ => other_token_chars(input),
    }
}

/// Parse an operator that may be doubled or combined into an assignment operation
///
/// `Token::Eof` marks a combination that does not exist
fn symbol_op_or_op_equals(
    op_char: u8,
    op_token: Token,
    op_equals_token: Token,
    op_op_token: Token,
) -> impl Fn(&[u8]) -> LexResult<Token> {
    move |input: &[u8]| match input {
        [c, b'=', ..] if *c == op_char && op_equals_token != Token::Eof => {
            Ok((&input[2..], op_equals_token.clone()))
        }
        [c1, c2, ..] if *c1 == op_char && *c2 == op_char && op_op_token != Token::Eof => {
            Ok((&input[2..], op_op_token.clone()))
        }
        [c, ..] if *c == op_char => Ok((&input[1..], op_token.clone())),
        _ => other_token_chars(input),
    }
}

/// Parse < <= << <<= and the > equivalents
fn symbol_angle_bracket(
    op_char: u8,
    op_token: Token,
    op_equals_token: Token,
    shift_token: Token,
    shift_equals_token: Token,
) -> impl Fn(&[u8]) -> LexResult<Token> {
    move |input: &[u8]| match input {
        [c1, c2, b'=', ..] if *c1 == op_char && *c2 == op_char => {
            Ok((&input[3..], shift_equals_token.clone()))
        }
        [c1, c2, ..] if *c1 == op_char && *c2 == op_char => Ok((&input[2..], shift_token.clone())),
        [c, b'=', ..] if *c == op_char => Ok((&input[2..], op_equals_token.clone())),
        [c, ..] if *c == op_char => Ok((&input[1..], op_token.clone())),
        _ => other_token_chars(input),
    }
}

/// Parse symbol into a token
fn token_symbols(input: &[u8]) -> LexResult<Token> {
    choose(
        &[
            &symbol_single(b'{', Token::LeftBrace),
            &symbol_single(b'}', Token::RightBrace),
            &symbol_single(b'(', Token::LeftParen),
            &symbol_single(b')', Token::RightParen),
            &symbol_single(b'[', Token::LeftSquareBracket),
            &symbol_single(b']', Token::RightSquareBracket),
            &symbol_angle_bracket(
                b'<',
                Token::LeftAngleBracket,
                Token::LessEquals,
                Token::LeftShift,
                Token::LeftShiftEquals,
            ),
            &symbol_angle_bracket(
                b'>',
                Token::RightAngleBracket,
                Token::GreaterEquals,
                Token::RightShift,
                Token::RightShiftEquals,
            ),
            &symbol_single(b';', Token::Semicolon),
            &symbol_single(b',', Token::Comma),
            &symbol_op_or_op_equals(b'+', Token::Plus, Token::PlusEquals, Token::PlusPlus),
            &symbol_op_or_op_equals(b'-', Token::Minus, Token::MinusEquals, Token::MinusMinus),
            &symbol_op_or_op_equals(
                b'/',
                Token::ForwardSlash,
                Token::ForwardSlashEquals,
                Token::Eof,
            ),
            &symbol_op_or_op_equals(b'%', Token::Percent, Token::PercentEquals, Token::Eof),
            &symbol_op_or_op_equals(b'*', Token::Asterix, Token::AsterixEquals, Token::Eof),
            &symbol_op_or_op_equals(
                b'&',
                Token::Ampersand,
                Token::AmpersandEquals,
                Token::AmpersandAmpersand,
            ),
            &symbol_op_or_op_equals(
                b'|',
                Token::VerticalBar,
                Token::VerticalBarEquals,
                Token::VerticalBarVerticalBar,
            ),
            &symbol_op_or_op_equals(b'^', Token::Hat, Token::HatEquals, Token::Eof),
            &symbol_op_or_op_equals(
                b'!',
                Token::ExclamationPoint,
                Token::ExclamationPointEquals,
                Token::Eof,
            ),
            &symbol_op_or_op_equals(b'=', Token::Equals, Token::EqualsEquals, Token::Eof),
            &symbol_op_or_op_equals(b'#', Token::Hash, Token::Eof, Token::HashHash),
            &symbol_single(b'~', Token::Tilde),
            &symbol_single(b'.', Token::Period),
            &symbol_single(b':', Token::Colon),
            &symbol_single(b'?', Token::QuestionMark),
        ],
        input,
    )
}

/// Parse a single token - without a location
fn token_intermediate(input: &[u8], inside_include: bool) -> LexResult<Token> {
    match input.first() {
        Some(b'0'..=b'9') | Some(b'.') => match literal_float(input) {
            Ok(ok) => Ok(ok),
            Err(LexErrorContext(_, LexerErrorReason::OtherTokenBytes)) => {
                if input[0] == b'.' {
                    token_symbols(input)
                } else {
                    literal_int(input)
                }
            }
            err => err,
        },
        Some(b'A'..=b'Z' | b'a'..=b'z' | b'_') => any_word(input),
        Some(_) => {
            if inside_include {
                match header_name(input) {
                    Err(LexErrorContext(_, LexerErrorReason::OtherTokenBytes)) => {}
                    res => return res,
                }
            }
            choose(
                &[
                    &whitespace_simple,
                    &whitespace_endline,
                    &line_comment,
                    &block_comment,
                    &literal_string,
                    &token_symbols,
                ],
                input,
            )
        }
        None => Err(LexErrorContext(input, LexerErrorReason::EndOfStream)),
    }
}

/// Run the lexer on input text fragment to turn it into a token stream
#[cfg(test)]
pub fn lex_fragment(
    file_id: FileId,
    source_manager: &SourceManager,
) -> Result<Vec<PreprocessToken>, LexerError> {
    let contents = source_manager.get_contents(file_id);
    let offset = source_manager.get_source_location_from_file_offset(file_id, StreamLocation(0));
    TokenStream::new(contents, offset)
        .suppress_trailing_endline()
        .read_to_end()
}

#[test]
fn test_token() {
    macro_rules! assert_token {
        ($input:expr, $token:expr) => {
            assert_token!($input, $token, $input.as_bytes().len())
        };

        ($input:expr, $token:expr, $used:expr) => {
            let input_bytes = $input.as_bytes();
            let result = token_intermediate(input_bytes, false);
            let rest = &input_bytes[$used..];
            assert_eq!(result, Ok((rest, $token)));
        };
    }

    assert_eq!(
        token_intermediate(b"", false),
        Err(LexErrorContext(b"", LexerErrorReason::EndOfStream))
    );
    assert_eq!(
        token_intermediate("£".as_bytes(), false),
        Err(LexErrorContext("£".as_bytes(), LexerErrorReason::UnexpectedBytes))
    );

    assert_token!("name", Token::Id(Identifier("name".to_string())));
    assert_token!("uniform_buffer", Token::UniformBuffer);
    assert_token!("vertex_inputs", Token::Id(Identifier("vertex_inputs".to_string())));
    assert_token!("12 ", Token::LiteralInt(12), 2);
    assert_token!("1.0f", Token::LiteralFloat32(1.0));
    assert_token!(".5;", Token::LiteralFloat(0.5), 2);
    assert_token!(".x", Token::Period, 1);
    assert_token!("true", Token::True);
    assert_token!("truea", Token::Id(Identifier("truea".to_string())));

    assert_token!("<", Token::LeftAngleBracket);
    assert_token!("<=", Token::LessEquals);
    assert_token!("<<", Token::LeftShift);
    assert_token!("<<=", Token::LeftShiftEquals);
    assert_token!(">", Token::RightAngleBracket);
    assert_token!(">=", Token::GreaterEquals);
    assert_token!(">>", Token::RightShift);
    assert_token!(">>=", Token::RightShiftEquals);

    assert_token!("+=", Token::PlusEquals);
    assert_token!("++", Token::PlusPlus);
    assert_token!("--", Token::MinusMinus);
    assert_token!("&&", Token::AmpersandAmpersand);
    assert_token!("||", Token::VerticalBarVerticalBar);
    assert_token!("!=", Token::ExclamationPointEquals);
    assert_token!("==", Token::EqualsEquals);
    assert_token!("##", Token::HashHash);
    assert_token!(":", Token::Colon);
    assert_token!("// x", Token::Comment);
}

#[test]
fn test_token_stream() {
    let mut source_manager = SourceManager::new();
    let (file_id, loc) = source_manager.add_fragment("#include <a.gfx>\nx < y");
    let tokens = lex_fragment(file_id, &source_manager).unwrap();
    let kinds = tokens.into_iter().map(|t| t.0).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            Token::Hash,
            Token::Id(Identifier("include".to_string())),
            Token::Whitespace,
            Token::HeaderName("a.gfx".to_string()),
            Token::Endline,
            Token::Id(Identifier("x".to_string())),
            Token::Whitespace,
            Token::LeftAngleBracket,
            Token::Whitespace,
            Token::Id(Identifier("y".to_string())),
        ]
    );

    // A trailing endline is inserted when the file does not end with one
    let tokens = lex("a", loc).unwrap();
    assert_eq!(tokens.last().map(|t| t.0.clone()), Some(Token::Endline));
}
