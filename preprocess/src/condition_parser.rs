use crate::preprocess::PreprocessError;
use gfxsl_text::tokens::*;
use gfxsl_text::*;

/// Evaluate the condition for an #if or #elif and return if it passes
///
/// The tokens must already have had macros and `defined` expressions substituted
pub fn parse(condition: &[PreprocessToken], location: SourceLocation) -> Result<bool, PreprocessError> {
    let tokens = condition
        .iter()
        .filter(|t| !t.0.is_whitespace())
        .map(|t| t.0.clone())
        .collect::<Vec<_>>();

    let map_err = |err: ConditionParseError| match err {
        ConditionParseError::Syntax => PreprocessError::FailedToParseIfCondition(location),
        ConditionParseError::DivisionByZero => PreprocessError::ConditionDivisionByZero(location),
        ConditionParseError::BitwiseOnFloat => PreprocessError::ConditionBitwiseOnFloat(location),
    };

    match parse_ternary(&tokens, true) {
        Ok(([], value)) => Ok(value.is_true()),
        Ok(_) => Err(PreprocessError::FailedToParseIfCondition(location)),
        Err(err) => Err(map_err(err)),
    }
}

/// Value produced while evaluating a condition
///
/// Integer arithmetic is exact and switches to double precision as soon as one operand is a float
#[derive(PartialEq, Debug, Copy, Clone)]
enum ConditionValue {
    Int(i64),
    Float(f64),
}

impl ConditionValue {
    fn from_bool(value: bool) -> Self {
        ConditionValue::Int(i64::from(value))
    }

    fn is_true(self) -> bool {
        match self {
            ConditionValue::Int(v) => v != 0,
            ConditionValue::Float(v) => v != 0.0,
        }
    }

    fn as_float(self) -> f64 {
        match self {
            ConditionValue::Int(v) => v as f64,
            ConditionValue::Float(v) => v,
        }
    }

    fn as_int(self) -> Result<i64, ConditionParseError> {
        match self {
            ConditionValue::Int(v) => Ok(v),
            ConditionValue::Float(_) => Err(ConditionParseError::BitwiseOnFloat),
        }
    }
}

/// Error type for internal condition parsing errors
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
enum ConditionParseError {
    Syntax,
    DivisionByZero,
    BitwiseOnFloat,
}

type ConditionResult<'t> = Result<(&'t [Token], ConditionValue), ConditionParseError>;

// Every parse function takes `live`, false inside an operand which is skipped by `&&`, `||` or `?:`.
// Skipped operands are still parsed but can not fail to evaluate.

fn parse_ternary(stream: &[Token], live: bool) -> ConditionResult {
    let (stream, condition) = parse_binary(stream, 0, live)?;
    if let Some((Token::QuestionMark, rest)) = stream.split_first() {
        let (rest, left) = parse_ternary(rest, live && condition.is_true())?;
        let rest = match rest.split_first() {
            Some((Token::Colon, rest)) => rest,
            _ => return Err(ConditionParseError::Syntax),
        };
        let (rest, right) = parse_ternary(rest, live && !condition.is_true())?;
        let value = if condition.is_true() { left } else { right };
        return Ok((rest, value));
    }
    Ok((stream, condition))
}

/// Get the precedence level of a binary operator - higher binds tighter
fn binary_precedence(tok: &Token) -> Option<u32> {
    Some(match tok {
        Token::VerticalBarVerticalBar => 0,
        Token::AmpersandAmpersand => 1,
        Token::VerticalBar => 2,
        Token::Hat => 3,
        Token::Ampersand => 4,
        Token::EqualsEquals | Token::ExclamationPointEquals => 5,
        Token::LeftAngleBracket
        | Token::RightAngleBracket
        | Token::LessEquals
        | Token::GreaterEquals => 6,
        Token::LeftShift | Token::RightShift => 7,
        Token::Plus | Token::Minus => 8,
        Token::Asterix | Token::ForwardSlash | Token::Percent => 9,
        _ => return None,
    })
}

/// Parse a left associative chain of binary operators which bind at least as tightly as `min_precedence`
fn parse_binary(stream: &[Token], min_precedence: u32, live: bool) -> ConditionResult {
    let (mut stream, mut left) = parse_unary(stream, live)?;
    while let Some((tok, rest)) = stream.split_first() {
        let precedence = match binary_precedence(tok) {
            Some(p) if p >= min_precedence => p,
            _ => break,
        };
        let right_live = match tok {
            Token::AmpersandAmpersand => live && left.is_true(),
            Token::VerticalBarVerticalBar => live && !left.is_true(),
            _ => live,
        };
        let (rest, right) = parse_binary(rest, precedence + 1, right_live)?;
        if live {
            left = apply_binary(tok, left, right)?;
        }
        stream = rest;
    }
    Ok((stream, left))
}

fn apply_binary(
    tok: &Token,
    l: ConditionValue,
    r: ConditionValue,
) -> Result<ConditionValue, ConditionParseError> {
    use std::cmp::Ordering;
    use ConditionValue::{Float, Int};

    // Comparisons are exact when both sides are integers
    let ordering = match (l, r) {
        (Int(l), Int(r)) => Some(l.cmp(&r)),
        _ => l.as_float().partial_cmp(&r.as_float()),
    };
    type EvalResult = Result<ConditionValue, ConditionParseError>;

    let compare = |f: fn(Ordering) -> bool| -> EvalResult {
        Ok(ConditionValue::from_bool(ordering.map_or(false, f)))
    };

    let arithmetic = |int_op: fn(i64, i64) -> i64, float_op: fn(f64, f64) -> f64| -> EvalResult {
        Ok(match (l, r) {
            (Int(l), Int(r)) => Int(int_op(l, r)),
            _ => Float(float_op(l.as_float(), r.as_float())),
        })
    };

    let bitwise = |op: fn(i64, i64) -> i64| -> EvalResult { Ok(Int(op(l.as_int()?, r.as_int()?))) };

    match tok {
        Token::VerticalBarVerticalBar => Ok(ConditionValue::from_bool(l.is_true() || r.is_true())),
        Token::AmpersandAmpersand => Ok(ConditionValue::from_bool(l.is_true() && r.is_true())),
        Token::VerticalBar => bitwise(|l, r| l | r),
        Token::Hat => bitwise(|l, r| l ^ r),
        Token::Ampersand => bitwise(|l, r| l & r),
        Token::EqualsEquals => compare(Ordering::is_eq),
        Token::ExclamationPointEquals => Ok(ConditionValue::from_bool(ordering != Some(Ordering::Equal))),
        Token::LeftAngleBracket => compare(Ordering::is_lt),
        Token::RightAngleBracket => compare(Ordering::is_gt),
        Token::LessEquals => compare(Ordering::is_le),
        Token::GreaterEquals => compare(Ordering::is_ge),
        Token::LeftShift => bitwise(|l, r| l.wrapping_shl(r as u32)),
        Token::RightShift => bitwise(|l, r| l.wrapping_shr(r as u32)),
        Token::Plus => arithmetic(i64::wrapping_add, |l, r| l + r),
        Token::Minus => arithmetic(i64::wrapping_sub, |l, r| l - r),
        Token::Asterix => arithmetic(i64::wrapping_mul, |l, r| l * r),
        Token::ForwardSlash | Token::Percent if r == Int(0) => {
            Err(ConditionParseError::DivisionByZero)
        }
        Token::ForwardSlash => arithmetic(i64::wrapping_div, |l, r| l / r),
        Token::Percent => arithmetic(i64::wrapping_rem, |l, r| l % r),
        _ => Err(ConditionParseError::Syntax),
    }
}

fn parse_unary(stream: &[Token], live: bool) -> ConditionResult {
    match stream.split_first() {
        Some((Token::ExclamationPoint, rest)) => {
            let (rest, value) = parse_unary(rest, live)?;
            Ok((rest, ConditionValue::from_bool(!value.is_true())))
        }
        Some((Token::Minus, rest)) => {
            let (rest, value) = parse_unary(rest, live)?;
            let value = match value {
                ConditionValue::Int(v) => ConditionValue::Int(v.wrapping_neg()),
                ConditionValue::Float(v) => ConditionValue::Float(-v),
            };
            Ok((rest, value))
        }
        Some((Token::Plus, rest)) => parse_unary(rest, live),
        Some((Token::Tilde, rest)) => {
            let (rest, value) = parse_unary(rest, live)?;
            match value.as_int() {
                Ok(value) => Ok((rest, ConditionValue::Int(!value))),
                Err(_) if !live => Ok((rest, value)),
                Err(err) => Err(err),
            }
        }
        _ => parse_leaf(stream, live),
    }
}

fn parse_leaf(stream: &[Token], live: bool) -> ConditionResult {
    if let Some((tok, rest)) = stream.split_first() {
        match tok {
            Token::False => return Ok((rest, ConditionValue::Int(0))),
            Token::True => return Ok((rest, ConditionValue::Int(1))),
            Token::LiteralInt(v) | Token::LiteralUInt(v) => {
                return Ok((rest, ConditionValue::Int(*v as i64)))
            }
            Token::LiteralFloat(v) => return Ok((rest, ConditionValue::Float(*v))),
            Token::LiteralFloat32(v) => return Ok((rest, ConditionValue::Float(*v as f64))),
            Token::LeftParen => {
                let (rest, inner) = parse_ternary(rest, live)?;
                if let Some((Token::RightParen, rest)) = rest.split_first() {
                    return Ok((rest, inner));
                }
            }
            // Identifiers which are not macros evaluate to zero
            Token::Id(_) => return Ok((rest, ConditionValue::Int(0))),
            _ => {}
        }
    }

    Err(ConditionParseError::Syntax)
}

#[cfg(test)]
fn eval(condition: &str) -> Result<bool, PreprocessError> {
    let mut source_manager = SourceManager::new();
    let (file_id, loc) = source_manager.add_fragment(condition);
    let tokens = crate::lexer::lex_fragment(file_id, &source_manager).unwrap();
    parse(&tokens, loc)
}

#[test]
#[allow(clippy::bool_assert_comparison)]
fn test_condition_parser() {
    assert_eq!(eval("0").unwrap(), false);
    assert_eq!(eval("1").unwrap(), true);
    assert_eq!(eval("!1").unwrap(), false);
    assert_eq!(eval("1 && 0 || 1").unwrap(), true);
    assert_eq!(eval("0 || 1 && 0").unwrap(), false);
    assert_eq!(eval("1 && (0 || 0)").unwrap(), false);
    assert_eq!(eval("2 > 1").unwrap(), true);
    assert_eq!(eval("2 >= 3").unwrap(), false);
    assert_eq!(eval("1 + 2 * 3 == 7").unwrap(), true);
    assert_eq!(eval("(1 + 2) * 3 == 9").unwrap(), true);
    assert_eq!(eval("10 - 2 - 3 == 5").unwrap(), true);
    assert_eq!(eval("7 / 2 == 3").unwrap(), true);
    assert_eq!(eval("7 % 4 == 3").unwrap(), true);
    assert_eq!(eval("1 << 4 == 16").unwrap(), true);
    assert_eq!(eval("(6 & 3) == 2 && (6 | 1) == 7 && (6 ^ 2) == 4").unwrap(), true);
    assert_eq!(eval("~0 == -1").unwrap(), true);
    assert_eq!(eval("1 ? 0 : 1").unwrap(), false);
    assert_eq!(eval("0 ? 0 : 1 ? 1 : 0").unwrap(), true);
    assert_eq!(eval("0.5 > 0.25").unwrap(), true);
    assert_eq!(eval("7.0 / 2 == 3.5").unwrap(), true);
    assert_eq!(eval("UNKNOWN").unwrap(), false);
}

#[test]
#[allow(clippy::bool_assert_comparison)]
fn test_condition_short_circuit() {
    // Operands which are not evaluated can not fail
    assert_eq!(eval("0 && 10 / 0 > 1").unwrap(), false);
    assert_eq!(eval("1 || 10 % 0").unwrap(), true);
    assert_eq!(eval("1 ? 1 : 1 / 0").unwrap(), true);
    assert_eq!(eval("0 ? 1.0 & 1 : 2").unwrap(), true);
    assert_eq!(eval("0 && ~1.5").unwrap(), false);
    assert_eq!(eval("0 && (1 || 1 / 0) || 1").unwrap(), true);

    let loc = SourceLocation::first();
    assert_eq!(eval("1 && 10 / 0"), Err(PreprocessError::ConditionDivisionByZero(loc)));
    assert_eq!(eval("0 ? 1 : 1 / 0"), Err(PreprocessError::ConditionDivisionByZero(loc)));
    assert_eq!(eval("0 && )"), Err(PreprocessError::FailedToParseIfCondition(loc)));
}

#[test]
fn test_condition_parser_errors() {
    let loc = SourceLocation::first();
    assert_eq!(eval("1 / 0"), Err(PreprocessError::ConditionDivisionByZero(loc)));
    assert_eq!(eval("1 % 0"), Err(PreprocessError::ConditionDivisionByZero(loc)));
    assert_eq!(eval("1.0 & 1"), Err(PreprocessError::ConditionBitwiseOnFloat(loc)));
    assert_eq!(eval("1 ? 2"), Err(PreprocessError::FailedToParseIfCondition(loc)));
    assert_eq!(eval("(1"), Err(PreprocessError::FailedToParseIfCondition(loc)));
    assert_eq!(eval("1 1"), Err(PreprocessError::FailedToParseIfCondition(loc)));
}
