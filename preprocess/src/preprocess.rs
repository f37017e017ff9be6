use crate::lexer::LexerError;
use gfxsl_text::tokens::*;
use gfxsl_text::*;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// An error which occurred when attempting to preprocess a file
#[derive(PartialEq, Debug, Clone)]
pub enum PreprocessError {
    LexerError(LexerError),
    UnknownCommand(SourceLocation),
    InvalidInclude(SourceLocation),
    InvalidDefine(SourceLocation),
    InvalidUndef(SourceLocation),
    DirectiveInMacroBody(SourceLocation),
    MacroAlreadyDefined(SourceLocation, String),
    MacroArgumentsNeverEnd(SourceLocation, String),
    MacroExpectsDifferentNumberOfArguments(SourceLocation, String, u32, u32),
    InvalidDefined(SourceLocation),
    FailedToFindFile(SourceLocation, String, IncludeError),
    IncludeCycle(SourceLocation, String),
    FailedToParseIfCondition(SourceLocation),
    ConditionDivisionByZero(SourceLocation),
    ConditionBitwiseOnFloat(SourceLocation),
    InvalidIfdef(SourceLocation),
    InvalidIfndef(SourceLocation),
    InvalidElse(SourceLocation),
    InvalidEndIf(SourceLocation),
    ConditionChainNotFinished,
    ElseNotMatched(SourceLocation),
    ElseAfterElse(SourceLocation),
    EndIfNotMatched(SourceLocation),
}

impl CompileError for PreprocessError {
    fn print(&self, w: &mut MessagePrinter) -> std::fmt::Result {
        let mut error = |loc: SourceLocation, write: &dyn Fn(&mut std::fmt::Formatter) -> std::fmt::Result| {
            w.error(loc, write)
        };
        match self {
            PreprocessError::LexerError(err) => err.print(w),
            PreprocessError::UnknownCommand(loc) => {
                error(*loc, &|f| write!(f, "unknown preprocessing directive"))
            }
            PreprocessError::InvalidInclude(loc) => {
                error(*loc, &|f| write!(f, "invalid #include command"))
            }
            PreprocessError::InvalidDefine(loc) => {
                error(*loc, &|f| write!(f, "invalid #define command"))
            }
            PreprocessError::InvalidUndef(loc) => {
                error(*loc, &|f| write!(f, "invalid #undef command"))
            }
            PreprocessError::DirectiveInMacroBody(loc) => error(*loc, &|f| {
                write!(f, "preprocessor directives are not allowed inside a macro body")
            }),
            PreprocessError::MacroAlreadyDefined(loc, s) => {
                error(*loc, &|f| write!(f, "macro '{}' already defined", s))
            }
            PreprocessError::MacroArgumentsNeverEnd(loc, s) => error(*loc, &|f| {
                write!(f, "expected end of arguments for macro '{}'", s)
            }),
            PreprocessError::MacroExpectsDifferentNumberOfArguments(loc, s, expected, got) => {
                error(*loc, &|f| {
                    write!(
                        f,
                        "macro '{}' requires {} arguments but {} were provided",
                        s, expected, got
                    )
                })
            }
            PreprocessError::InvalidDefined(loc) => {
                error(*loc, &|f| write!(f, "expected macro name for defined()"))
            }
            PreprocessError::FailedToFindFile(loc, name, err) => error(*loc, &|f| {
                write!(f, "failed to load file: '{}': {}", name, err)
            }),
            PreprocessError::IncludeCycle(loc, name) => {
                error(*loc, &|f| write!(f, "file '{}' includes itself", name))
            }
            PreprocessError::FailedToParseIfCondition(loc) => {
                error(*loc, &|f| write!(f, "#if condition parser failed"))
            }
            PreprocessError::ConditionDivisionByZero(loc) => {
                error(*loc, &|f| write!(f, "division by zero in #if condition"))
            }
            PreprocessError::ConditionBitwiseOnFloat(loc) => error(*loc, &|f| {
                write!(f, "bitwise operator requires integer operands in #if condition")
            }),
            PreprocessError::InvalidIfdef(loc) => error(*loc, &|f| write!(f, "invalid #ifdef")),
            PreprocessError::InvalidIfndef(loc) => error(*loc, &|f| write!(f, "invalid #ifndef")),
            PreprocessError::InvalidElse(loc) => error(*loc, &|f| write!(f, "invalid #else")),
            PreprocessError::InvalidEndIf(loc) => error(*loc, &|f| write!(f, "invalid #endif")),
            PreprocessError::ConditionChainNotFinished => error(SourceLocation::UNKNOWN, &|f| {
                write!(f, "not enough #endif's encountered")
            }),
            PreprocessError::ElseNotMatched(loc) => error(*loc, &|f| {
                write!(f, "encountered #else or #elif but with no matching #if")
            }),
            PreprocessError::ElseAfterElse(loc) => {
                error(*loc, &|f| write!(f, "encountered #else or #elif after #else"))
            }
            PreprocessError::EndIfNotMatched(loc) => {
                error(*loc, &|f| write!(f, "encountered #endif but with no matching #if"))
            }
        }
    }
}

/// Cache of files loaded through an [IncludeHandler]
///
/// The cache is expected to persist for a whole build along with the [SourceManager] that owns the file contents.
#[derive(Default)]
pub struct IncludeCache {
    /// Resolved file for each (including file, requested name) pair
    requests: HashMap<(Option<FileId>, String), FileId>,

    /// Loaded file for each resolved name
    files: HashMap<String, FileId>,

    /// Generated file holding the `#define` lines of each distinct pipeline macro set
    pipeline_files: HashMap<String, FileId>,
}

impl IncludeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct files loaded
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no files have been loaded
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Manage files that are returned from the external include handler
///
/// Pragma once marks and the active include stack only live for a single top level shader
struct FileLoader<'a> {
    source_manager: &'a mut SourceManager,
    include_cache: &'a mut IncludeCache,
    include_handler: &'a mut dyn IncludeHandler,
    pragma_once_files: HashSet<FileId>,
    include_stack: Vec<FileId>,
}

/// Loaded file that will be processed
struct InputFile {
    file_id: FileId,
    contents: String,
}

impl<'a> FileLoader<'a> {
    fn load(&mut self, file_name: &str, parent: Option<FileId>) -> Result<InputFile, IncludeError> {
        let key = (parent, file_name.to_string());
        let id = match self.include_cache.requests.get(&key) {
            Some(id) => *id,
            None => {
                let parent_name = parent.map(|id| self.source_manager.get_file_name(id).0.clone());
                let file_data = self.include_handler.load(file_name, parent_name.as_deref())?;

                // Different requests may resolve to the same file
                let id = match self.include_cache.files.get(&file_data.real_name) {
                    Some(id) => *id,
                    None => {
                        debug!("loaded '{}'", file_data.real_name);
                        let id = self.source_manager.add_file(
                            FileName(file_data.real_name.clone()),
                            file_data.contents,
                        );
                        self.include_cache.files.insert(file_data.real_name, id);
                        id
                    }
                };

                self.include_cache.requests.insert(key, id);
                id
            }
        };

        let contents = if self.pragma_once_files.contains(&id) {
            String::new()
        } else {
            self.source_manager.get_contents(id).to_string()
        };

        Ok(InputFile {
            file_id: id,
            contents,
        })
    }

    fn get_source_location_from_file_offset(
        &self,
        file_id: FileId,
        stream_location: StreamLocation,
    ) -> SourceLocation {
        self.source_manager
            .get_source_location_from_file_offset(file_id, stream_location)
    }

    fn mark_as_pragma_once(&mut self, file_id: FileId) {
        self.pragma_once_files.insert(file_id);
    }
}

#[derive(PartialEq, Debug, Clone)]
struct Macro {
    name: String,
    is_function: bool,
    num_params: u32,
    tokens: Vec<PreprocessToken>,
    location: SourceLocation,
}

type MacroTable = HashMap<String, Macro>;

impl Macro {
    /// Check if a redefinition is token identical, whitespace is ignored
    fn same_definition(&self, other: &Macro) -> bool {
        self.is_function == other.is_function
            && self.num_params == other.num_params
            && self.body().eq(other.body())
    }

    fn body(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().map(|t| &t.0).filter(|t| !t.is_whitespace())
    }

    fn parse(command: &[PreprocessToken], location: SourceLocation) -> Result<Macro, PreprocessError> {
        let command = trim_whitespace_start(command);

        // Consume define name
        let (name, location, signature_and_body) =
            if let Some((tok @ PreprocessToken(Token::Id(id), _), rest)) = command.split_first() {
                (id.0.clone(), tok.get_location(), rest)
            } else {
                return Err(PreprocessError::InvalidDefine(location));
            };

        // A parameter list must immediately follow the name without whitespace
        let (param_tokens, is_function, body) =
            if let Some((PreprocessToken(Token::LeftParen, _), rest)) =
                signature_and_body.split_first()
            {
                if let Some(pos) = rest.iter().position(|t| t.0 == Token::RightParen) {
                    (&rest[..pos], true, &rest[pos + 1..])
                } else {
                    return Err(PreprocessError::InvalidDefine(location));
                }
            } else {
                (&[][..], false, signature_and_body)
            };

        // Find macro parameter names
        let mut params = Vec::new();
        let param_tokens = trim_whitespace(param_tokens);
        if !param_tokens.is_empty() {
            for param in param_tokens.split(|t| t.0 == Token::Comma) {
                match trim_whitespace(param) {
                    [PreprocessToken(Token::Id(id), _)] => params.push(id.0.clone()),
                    _ => return Err(PreprocessError::InvalidDefine(location)),
                }
            }
        }

        let body = trim_whitespace(body);
        if let Some(tok) = body
            .iter()
            .find(|t| matches!(t.0, Token::Hash | Token::HashHash))
        {
            return Err(PreprocessError::DirectiveInMacroBody(tok.get_location()));
        }

        // Replace identifiers to parameters with argument reference tokens
        let tokens = body
            .iter()
            .map(|t| {
                if let Token::Id(id) = &t.0 {
                    if let Some(i) = params.iter().position(|p| *p == id.0) {
                        return PreprocessToken(Token::MacroArg(i as u32), t.1.clone());
                    }
                }
                t.clone()
            })
            .collect::<Vec<_>>();

        Ok(Macro {
            name,
            is_function,
            num_params: params.len() as u32,
            tokens,
            location,
        })
    }
}

/// Remove whitespace and comments from the start of a token stream - but not endlines
fn trim_whitespace_start(mut tokens: &[PreprocessToken]) -> &[PreprocessToken] {
    while let Some((PreprocessToken(tok, _), rest)) = tokens.split_first() {
        if tok.is_whitespace() && *tok != Token::Endline {
            tokens = rest;
        } else {
            break;
        }
    }
    tokens
}

/// Remove whitespace and comments from the end of a token stream - but not endlines
fn trim_whitespace_end(mut tokens: &[PreprocessToken]) -> &[PreprocessToken] {
    while let Some((PreprocessToken(tok, _), rest)) = tokens.split_last() {
        if tok.is_whitespace() && *tok != Token::Endline {
            tokens = rest;
        } else {
            break;
        }
    }
    tokens
}

/// Remove whitespace and comments from the start and end of a token stream - but not endlines
fn trim_whitespace(tokens: &[PreprocessToken]) -> &[PreprocessToken] {
    trim_whitespace_end(trim_whitespace_start(tokens))
}

/// Split the parenthesised argument list of a function macro invocation
///
/// Commas inside nested parenthesis do not split arguments.
/// Returns the tokens after the closing parenthesis and the argument token ranges.
fn split_macro_args<'stream>(
    macro_name: &str,
    location: SourceLocation,
    remaining: &'stream [PreprocessToken],
) -> Result<(&'stream [PreprocessToken], Vec<&'stream [PreprocessToken]>), PreprocessError> {
    let never_end = || PreprocessError::MacroArgumentsNeverEnd(location, macro_name.to_string());

    let remaining = match trim_whitespace_start(remaining) {
        [PreprocessToken(Token::LeftParen, _), rest @ ..] => rest,
        _ => return Err(never_end()),
    };

    let mut args = Vec::new();
    let mut depth = 0u32;
    let mut arg_start = 0;
    for (pos, token) in remaining.iter().enumerate() {
        match token.0 {
            Token::LeftParen => depth += 1,
            Token::RightParen if depth > 0 => depth -= 1,
            Token::RightParen => {
                args.push(trim_whitespace(&remaining[arg_start..pos]));
                return Ok((&remaining[pos + 1..], args));
            }
            Token::Comma if depth == 0 => {
                args.push(trim_whitespace(&remaining[arg_start..pos]));
                arg_start = pos + 1;
            }
            _ => {}
        }
    }

    Err(never_end())
}

/// Where macro expansion is happening
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
enum ExpansionContext {
    /// Normal source text
    Text,

    /// Inside an #if or #elif condition
    ///
    /// Enables `defined` / `undefined` and turns empty macros into `1`
    Condition,
}

/// Read the argument to a defined() or undefined() expression
fn read_defined_argument<'stream>(
    location: SourceLocation,
    remaining: &'stream [PreprocessToken],
) -> Result<(&'stream [PreprocessToken], &'stream str), PreprocessError> {
    match trim_whitespace_start(remaining) {
        // Allow "defined A" instead of traditional defined(A)
        [PreprocessToken(Token::Id(id), _), rest @ ..] => Ok((rest, id.0.as_str())),
        _ => {
            let (rest, args) = split_macro_args("defined", location, remaining)?;
            match args.as_slice() {
                [arg] => match *arg {
                    [PreprocessToken(Token::Id(id), _)] => Ok((rest, id.0.as_str())),
                    _ => Err(PreprocessError::InvalidDefined(location)),
                },
                _ => Err(PreprocessError::InvalidDefined(location)),
            }
        }
    }
}

/// Expand all macros in a token stream
///
/// Macro bodies are rescanned after substitution with the macro being expanded disabled, so a macro
/// that refers to itself leaves its own name in the output instead of recursing forever.
fn apply_macros(
    tokens: &[PreprocessToken],
    macros: &MacroTable,
    context: ExpansionContext,
    disabled: &mut Vec<String>,
    output: &mut Vec<PreprocessToken>,
) -> Result<(), PreprocessError> {
    let mut remaining = tokens;
    while let Some((token, rest)) = remaining.split_first() {
        remaining = rest;

        let id = match &token.0 {
            Token::Id(id) => id.0.as_str(),
            _ => {
                output.push(token.clone());
                continue;
            }
        };

        let location = token.get_location();

        if context == ExpansionContext::Condition && (id == "defined" || id == "undefined") {
            let (rest, name) = read_defined_argument(location, remaining)?;
            let exists = macros.contains_key(name);
            let result = if id == "defined" { exists } else { !exists };

            // The generated token covers the whole expression as all tokens are on a single directive line
            let end_location = tokens[tokens.len() - rest.len() - 1].get_end_location();
            let size = end_location.get_raw().saturating_sub(location.get_raw());
            output.push(PreprocessToken::new(
                Token::LiteralInt(u64::from(result)),
                location,
                0,
                size,
            ));
            remaining = rest;
            continue;
        }

        let macro_def = match macros.get(id) {
            Some(macro_def) if !disabled.iter().any(|d| d == id) => macro_def,
            _ => {
                output.push(token.clone());
                continue;
            }
        };

        if !macro_def.is_function {
            if macro_def.tokens.is_empty() && context == ExpansionContext::Condition {
                output.push(PreprocessToken::new(
                    Token::LiteralInt(1),
                    location,
                    0,
                    token.get_end_location().get_raw() - location.get_raw(),
                ));
            } else {
                disabled.push(macro_def.name.clone());
                apply_macros(&macro_def.tokens, macros, context, disabled, output)?;
                disabled.pop();
            }
            continue;
        }

        // Function macros without an argument list are not invocations
        if !matches!(
            trim_whitespace_start(remaining).first(),
            Some(PreprocessToken(Token::LeftParen, _))
        ) {
            output.push(token.clone());
            continue;
        }

        let (rest, args) = split_macro_args(&macro_def.name, location, remaining)?;
        remaining = rest;

        let arg_count = if macro_def.num_params == 0 && args.len() == 1 && args[0].is_empty() {
            0
        } else {
            args.len() as u32
        };
        if arg_count != macro_def.num_params {
            return Err(PreprocessError::MacroExpectsDifferentNumberOfArguments(
                location,
                macro_def.name.clone(),
                macro_def.num_params,
                arg_count,
            ));
        }

        // Arguments are fully expanded before substitution
        let mut expanded_args = Vec::with_capacity(args.len());
        for arg in args {
            let mut expanded = Vec::with_capacity(arg.len());
            apply_macros(arg, macros, context, disabled, &mut expanded)?;
            expanded_args.push(expanded);
        }

        let mut substituted = Vec::with_capacity(macro_def.tokens.len());
        for body_token in &macro_def.tokens {
            if let Token::MacroArg(i) = body_token.0 {
                substituted.extend_from_slice(&expanded_args[i as usize]);
            } else {
                substituted.push(body_token.clone());
            }
        }

        disabled.push(macro_def.name.clone());
        apply_macros(&substituted, macros, context, disabled, output)?;
        disabled.pop();
    }
    Ok(())
}

/// Expand macros in a token stream into a new vector
fn expand(
    tokens: &[PreprocessToken],
    macros: &MacroTable,
    context: ExpansionContext,
) -> Result<Vec<PreprocessToken>, PreprocessError> {
    let mut output = Vec::with_capacity(tokens.len());
    apply_macros(tokens, macros, context, &mut Vec::new(), &mut output)?;
    Ok(output)
}

#[test]
fn macro_from_definition() {
    let ll = |s: &str| {
        let mut source_manager = SourceManager::new();
        let (file_id, source_location) = source_manager.add_fragment(s);
        assert_eq!(source_location, SourceLocation::first());
        crate::lexer::lex_fragment(file_id, &source_manager).unwrap()
    };
    let loc = SourceLocation::first();
    assert_eq!(
        Macro::parse(&ll("B 0"), loc).unwrap(),
        Macro {
            name: "B".to_string(),
            is_function: false,
            num_params: 0,
            tokens: Vec::from([PreprocessToken::new(Token::LiteralInt(0), loc, 2, 3)]),
            location: loc,
        }
    );
    assert_eq!(
        Macro::parse(&ll("B(x,y) y"), loc).unwrap(),
        Macro {
            name: "B".to_string(),
            is_function: true,
            num_params: 2,
            tokens: Vec::from([PreprocessToken::new(Token::MacroArg(1), loc, 7, 8)]),
            location: loc,
        }
    );
    assert_eq!(
        Macro::parse(&ll("B() 1"), loc).unwrap().num_params,
        0
    );
    assert_eq!(
        Macro::parse(&ll("B(x,) x"), loc),
        Err(PreprocessError::InvalidDefine(loc))
    );
    assert_eq!(
        Macro::parse(&ll("B #x"), loc),
        Err(PreprocessError::DirectiveInMacroBody(loc.offset(2)))
    );
}

#[test]
fn macro_resolve() {
    use crate::lexer::lex_fragment;
    use crate::unlexer::unlex;

    let mut source_manager = SourceManager::new();
    let (m1, _) = source_manager.add_fragment("ADD(a, b) a+b");
    let (m2, _) = source_manager.add_fragment("ONE 1");
    let (m3, _) = source_manager.add_fragment("SELF SELF + 1");
    let (main, _) = source_manager.add_fragment("ADD((1+2), ONE) SELF ADD");

    let mut macros = MacroTable::new();
    for id in [m1, m2, m3] {
        let tokens = lex_fragment(id, &source_manager).unwrap();
        let m = Macro::parse(&tokens, SourceLocation::UNKNOWN).unwrap();
        macros.insert(m.name.clone(), m);
    }

    let main_tokens = lex_fragment(main, &source_manager).unwrap();
    let resolved = expand(&main_tokens, &macros, ExpansionContext::Text).unwrap();
    assert_eq!(unlex(&resolved, &source_manager), "(1+2)+1 SELF + 1 ADD");
}

/// State of a single #if block
#[derive(PartialEq, Eq, Copy, Clone)]
enum ConditionState {
    /// We are currently parsing code
    Enabled,

    /// We are not parsing code but a later branch may still be taken
    DisabledInner,

    /// We are not parsing code and no later branch can be taken
    DisabledOuter,
}

struct Condition {
    state: ConditionState,
    seen_else: bool,
}

/// Stores the active #if blocks
struct ConditionChain(Vec<Condition>);

impl ConditionChain {
    fn new() -> ConditionChain {
        ConditionChain(Vec::new())
    }

    /// Start a new block - the condition is ignored if the enclosing block is disabled
    fn push(&mut self, active: bool) {
        let state = if !self.is_active() {
            ConditionState::DisabledOuter
        } else if active {
            ConditionState::Enabled
        } else {
            ConditionState::DisabledInner
        };
        self.0.push(Condition {
            state,
            seen_else: false,
        });
    }

    /// Check if an #elif needs its condition evaluated
    fn needs_elif_condition(&self) -> bool {
        matches!(
            self.0.last(),
            Some(Condition {
                state: ConditionState::DisabledInner,
                seen_else: false
            })
        )
    }

    /// Move to the next branch in the current block
    fn switch(
        &mut self,
        active: bool,
        is_else: bool,
        location: SourceLocation,
    ) -> Result<(), PreprocessError> {
        match self.0.last_mut() {
            Some(condition) => {
                if condition.seen_else {
                    return Err(PreprocessError::ElseAfterElse(location));
                }
                condition.seen_else = is_else;
                condition.state = match condition.state {
                    ConditionState::Enabled => ConditionState::DisabledOuter,
                    ConditionState::DisabledInner if active => ConditionState::Enabled,
                    ConditionState::DisabledInner => ConditionState::DisabledInner,
                    ConditionState::DisabledOuter => ConditionState::DisabledOuter,
                };
                Ok(())
            }
            None => Err(PreprocessError::ElseNotMatched(location)),
        }
    }

    fn pop(&mut self, location: SourceLocation) -> Result<(), PreprocessError> {
        match self.0.pop() {
            Some(_) => Ok(()),
            None => Err(PreprocessError::EndIfNotMatched(location)),
        }
    }

    fn is_active(&self) -> bool {
        self.0.iter().all(|c| c.state == ConditionState::Enabled)
    }
}

/// Shared state while preprocessing one top level shader
struct PreprocessState<'a> {
    file_loader: FileLoader<'a>,
    macros: MacroTable,
    condition_chain: ConditionChain,
}

fn preprocess_command(
    buffer: &mut Vec<PreprocessToken>,
    state: &mut PreprocessState,
    command: &[PreprocessToken],
    file_id: FileId,
) -> Result<(), PreprocessError> {
    let command_location = command.first().get_location();

    // Directive names may lex as keywords
    let (command_name, command) = match command {
        [PreprocessToken(Token::Id(id), _), rest @ ..] => (id.0.as_str(), rest),
        [PreprocessToken(tok, _), rest @ ..] => match tok.keyword_text() {
            Some(name) => (name, rest),
            None => return Err(PreprocessError::UnknownCommand(command_location)),
        },
        [] => return Err(PreprocessError::UnknownCommand(command_location)),
    };

    let skip = !state.condition_chain.is_active();

    match command_name {
        "include" => {
            if skip {
                return Ok(());
            }
            let file_name = match trim_whitespace(command) {
                [PreprocessToken(Token::LiteralString(s), _)] => s.clone(),
                [PreprocessToken(Token::HeaderName(s), _)] => s.clone(),
                _ => return Err(PreprocessError::InvalidInclude(command_location)),
            };

            let file = state
                .file_loader
                .load(&file_name, Some(file_id))
                .map_err(|err| {
                    PreprocessError::FailedToFindFile(command_location, file_name.clone(), err)
                })?;

            if state.file_loader.include_stack.contains(&file.file_id) && !file.contents.is_empty()
            {
                return Err(PreprocessError::IncludeCycle(command_location, file_name));
            }

            debug!("including '{}'", file_name);
            preprocess_included_file(buffer, state, file)
        }
        "ifdef" | "ifndef" => {
            if skip {
                state.condition_chain.push(false);
                return Ok(());
            }
            let not = command_name == "ifndef";
            if let [PreprocessToken(Token::Id(id), _)] = trim_whitespace(command) {
                let exists = state.macros.contains_key(&id.0);
                state.condition_chain.push(exists != not);
                Ok(())
            } else if not {
                Err(PreprocessError::InvalidIfndef(command_location))
            } else {
                Err(PreprocessError::InvalidIfdef(command_location))
            }
        }
        "if" => {
            if skip {
                state.condition_chain.push(false);
                return Ok(());
            }
            let resolved = expand(
                trim_whitespace(command),
                &state.macros,
                ExpansionContext::Condition,
            )?;
            let active = crate::condition_parser::parse(&resolved, command_location)?;
            state.condition_chain.push(active);
            Ok(())
        }
        "elif" => {
            // Only evaluate the condition if no earlier branch was taken
            let active = if state.condition_chain.needs_elif_condition() {
                let resolved = expand(
                    trim_whitespace(command),
                    &state.macros,
                    ExpansionContext::Condition,
                )?;
                crate::condition_parser::parse(&resolved, command_location)?
            } else {
                false
            };
            state
                .condition_chain
                .switch(active, false, command_location)
        }
        "else" => {
            if !trim_whitespace(command).is_empty() {
                return Err(PreprocessError::InvalidElse(command_location));
            }
            state.condition_chain.switch(true, true, command_location)
        }
        "endif" => {
            if !trim_whitespace(command).is_empty() {
                return Err(PreprocessError::InvalidEndIf(command_location));
            }
            state.condition_chain.pop(command_location)
        }
        "define" => {
            if skip {
                return Ok(());
            }
            let macro_def = Macro::parse(command, command_location)?;
            match state.macros.get(&macro_def.name) {
                Some(existing) if existing.same_definition(&macro_def) => return Ok(()),
                Some(_) => {
                    return Err(PreprocessError::MacroAlreadyDefined(
                        macro_def.location,
                        macro_def.name,
                    ))
                }
                None => {}
            }
            state.macros.insert(macro_def.name.clone(), macro_def);
            Ok(())
        }
        "undef" => {
            if skip {
                return Ok(());
            }
            if let [PreprocessToken(Token::Id(id), _)] = trim_whitespace(command) {
                state.macros.remove(&id.0);
                Ok(())
            } else {
                Err(PreprocessError::InvalidUndef(command_location))
            }
        }
        "pragma" => {
            if skip {
                return Ok(());
            }
            match trim_whitespace(command) {
                [PreprocessToken(Token::Id(Identifier(s)), _), ..] if s == "once" => {
                    state.file_loader.mark_as_pragma_once(file_id);
                }
                [PreprocessToken(Token::Id(Identifier(s)), _), ..] => {
                    warn!("ignoring unknown pragma '{}'", s);
                }
                _ => warn!("ignoring empty pragma"),
            }
            Ok(())
        }
        _ if skip => Ok(()),
        _ => Err(PreprocessError::UnknownCommand(command_location)),
    }
}

/// Internal process a single file during preprocessing
fn preprocess_included_file(
    buffer: &mut Vec<PreprocessToken>,
    state: &mut PreprocessState,
    input_file: InputFile,
) -> Result<(), PreprocessError> {
    let base_location = state
        .file_loader
        .get_source_location_from_file_offset(input_file.file_id, StreamLocation(0));

    let input_tokens = crate::lexer::lex(&input_file.contents, base_location)
        .map_err(PreprocessError::LexerError)?;

    state.file_loader.include_stack.push(input_file.file_id);

    // Split into logical lines - the lexer ensures the last line is terminated
    let mut text_start = 0;
    let mut line_start = 0;
    while line_start < input_tokens.len() {
        let line_end = match input_tokens[line_start..]
            .iter()
            .position(|t| t.0 == Token::Endline)
        {
            Some(pos) => line_start + pos + 1,
            None => input_tokens.len(),
        };
        let line = &input_tokens[line_start..line_end];

        if let [PreprocessToken(Token::Hash, _), command @ ..] = trim_whitespace_start(line) {
            // Flush normal text before the command
            if state.condition_chain.is_active() {
                let text = &input_tokens[text_start..line_start];
                apply_macros(
                    text,
                    &state.macros,
                    ExpansionContext::Text,
                    &mut Vec::new(),
                    buffer,
                )?;
            }

            let command = match command.split_last() {
                Some((PreprocessToken(Token::Endline, _), rest)) => rest,
                _ => command,
            };
            let command = trim_whitespace_start(command);
            if command.is_empty() {
                // A lone # is a null directive
            } else {
                preprocess_command(buffer, state, command, input_file.file_id)?;
            }

            text_start = line_end;
        }

        line_start = line_end;
    }

    if state.condition_chain.is_active() {
        apply_macros(
            &input_tokens[text_start..],
            &state.macros,
            ExpansionContext::Text,
            &mut Vec::new(),
            buffer,
        )?;
    }

    state.file_loader.include_stack.pop();
    Ok(())
}

/// Preprocess a top level shader file
///
/// `pipeline_macros` are injected as `#define` lines before the shader is processed. They are in the form
/// `NAME` or `NAME=VALUE`.
///
/// The macro table starts empty for every shader. Files are loaded through the include cache so shared files
/// are only requested from the include handler once per build.
pub fn preprocess_shader(
    entry_file_name: &str,
    pipeline_macros: &[String],
    source_manager: &mut SourceManager,
    include_cache: &mut IncludeCache,
    include_handler: &mut dyn IncludeHandler,
) -> Result<Vec<PreprocessToken>, PreprocessError> {
    let mut pipeline_text = String::new();
    for pipeline_macro in pipeline_macros {
        match pipeline_macro.split_once('=') {
            Some((name, value)) => pipeline_text.push_str(&format!("#define {} {}\n", name, value)),
            None => pipeline_text.push_str(&format!("#define {}\n", pipeline_macro)),
        }
    }
    let pipeline_file = if pipeline_text.is_empty() {
        None
    } else if let Some(id) = include_cache.pipeline_files.get(&pipeline_text) {
        Some(*id)
    } else {
        let id = source_manager.add_file(FileName(String::from("<pipeline>")), pipeline_text.clone());
        include_cache.pipeline_files.insert(pipeline_text.clone(), id);
        Some(id)
    };

    let mut state = PreprocessState {
        file_loader: FileLoader {
            source_manager,
            include_cache,
            include_handler,
            pragma_once_files: HashSet::new(),
            include_stack: Vec::new(),
        },
        macros: MacroTable::new(),
        condition_chain: ConditionChain::new(),
    };

    let mut tokens = Vec::new();

    if let Some(file_id) = pipeline_file {
        let input = InputFile {
            file_id,
            contents: pipeline_text,
        };
        preprocess_included_file(&mut tokens, &mut state, input)?;
        // Only defines are allowed so the only output is line endings
        tokens.clear();
    }

    let entry_file = state.file_loader.load(entry_file_name, None).map_err(|err| {
        PreprocessError::FailedToFindFile(SourceLocation::UNKNOWN, entry_file_name.to_string(), err)
    })?;

    preprocess_included_file(&mut tokens, &mut state, entry_file)?;

    if !state.condition_chain.0.is_empty() {
        return Err(PreprocessError::ConditionChainNotFinished);
    }

    Ok(tokens)
}

/// Preprocess a single block of text without any support for includes
pub fn preprocess_fragment(
    input: &str,
    file_name: FileName,
    source_manager: &mut SourceManager,
) -> Result<Vec<PreprocessToken>, PreprocessError> {
    let mut files = [(file_name.0.as_str(), input)];
    preprocess_shader(
        &file_name.0,
        &[],
        source_manager,
        &mut IncludeCache::new(),
        &mut files,
    )
}

/// Convert a stream of preprocessor tokens for parsing
pub fn prepare_tokens(source: &[PreprocessToken]) -> Vec<LexToken> {
    let mut source = source
        .iter()
        .filter(|t| !t.0.is_whitespace())
        .map(|t| {
            debug_assert!(!matches!(t.0, Token::MacroArg(_)));
            LexToken(t.0.clone(), t.get_location())
        })
        .collect::<Vec<_>>();
    source.push(LexToken(Token::Eof, SourceLocation::UNKNOWN));
    source
}
