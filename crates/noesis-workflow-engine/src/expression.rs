//! Condition evaluator for `branch` nodes.
//!
//! Conditions are boolean expressions evaluated against a JSON scope built
//! from the run's `variables` and `results`. Kept deliberately small:
//!
//! - Field access: dot notation (`check.branch`, `count`)
//! - Comparisons: `==`, `!=`, `>`, `<`, `>=`, `<=`
//! - Logical: `&&`, `||`, `!`, parentheses for grouping
//! - Literals: string (single or double quoted), number, bool, null
//! - Numeric comparison uses f64 coercion — `1` and `1.0` are equal
//!
//! Not supported: array indexing, string functions, regex, arithmetic,
//! ternary. A condition that fails to parse is a node execution error, never
//! a silent `false`.

use std::cmp::Ordering;

use serde_json::Value;
use thiserror::Error;

/// Errors from condition evaluation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExpressionError {
    #[error("parse error: {message}")]
    Parse { message: String },
}

/// Evaluate a condition against a scope document.
///
/// Bare identifiers resolve as dotted paths into the scope; missing fields
/// resolve to null (so comparisons against them are `false`, not errors).
/// A non-boolean final value coerces by JSON truthiness.
pub fn evaluate(condition: &str, scope: &Value) -> Result<bool, ExpressionError> {
    let tokens = tokenize(condition)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Parse {
            message: "empty condition".into(),
        });
    }
    let (value, rest) = parse_or(&tokens, scope)?;
    if !rest.is_empty() {
        return Err(ExpressionError::Parse {
            message: format!("unexpected token: {:?}", rest[0]),
        });
    }
    Ok(value.truthy())
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Path(String),
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut chars = input.chars().peekable();
    let mut tokens = Vec::new();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '=' if take(&mut chars, '=') => Token::Eq,
            '!' if take(&mut chars, '=') => Token::Ne,
            '!' => Token::Not,
            '>' if take(&mut chars, '=') => Token::Ge,
            '>' => Token::Gt,
            '<' if take(&mut chars, '=') => Token::Le,
            '<' => Token::Lt,
            '&' if take(&mut chars, '&') => Token::And,
            '|' if take(&mut chars, '|') => Token::Or,
            '"' | '\'' => lex_string(&mut chars, c)?,
            _ if c.is_ascii_digit()
                || (c == '-' && chars.peek().is_some_and(|n| n.is_ascii_digit())) =>
            {
                lex_number(&mut chars, c)?
            }
            _ if c.is_ascii_alphabetic() || c == '_' => lex_word(&mut chars, c),
            other => {
                return Err(ExpressionError::Parse {
                    message: format!("unexpected character: {other}"),
                });
            }
        };
        tokens.push(token);
    }
    Ok(tokens)
}

type Lexer<'a> = std::iter::Peekable<std::str::Chars<'a>>;

/// Consume the next character iff it equals `expected`.
fn take(chars: &mut Lexer<'_>, expected: char) -> bool {
    chars.next_if_eq(&expected).is_some()
}

fn lex_string(chars: &mut Lexer<'_>, quote: char) -> Result<Token, ExpressionError> {
    let mut text = String::new();
    loop {
        match chars.next() {
            Some(c) if c == quote => return Ok(Token::Str(text)),
            Some(c) => text.push(c),
            None => {
                return Err(ExpressionError::Parse {
                    message: "unterminated string literal".into(),
                });
            }
        }
    }
}

fn lex_number(chars: &mut Lexer<'_>, first: char) -> Result<Token, ExpressionError> {
    let mut text = String::from(first);
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() && c != '.' {
            break;
        }
        text.push(c);
        chars.next();
    }
    match text.parse() {
        Ok(num) => Ok(Token::Num(num)),
        Err(_) => Err(ExpressionError::Parse {
            message: format!("invalid number: {text}"),
        }),
    }
}

fn lex_word(chars: &mut Lexer<'_>, first: char) -> Token {
    let mut word = String::from(first);
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '.' {
            break;
        }
        word.push(c);
        chars.next();
    }
    match word.as_str() {
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        "null" => Token::Null,
        _ => Token::Path(word),
    }
}

// ---------------------------------------------------------------------------
// Operands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Operand {
    Bool(bool),
    Num(f64),
    Str(String),
    Null,
    Json(Value),
}

impl Operand {
    fn truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Num(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Null => false,
            Self::Json(Value::Bool(b)) => *b,
            Self::Json(Value::Null) => false,
            Self::Json(_) => true,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Json(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    fn text(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Json(Value::Null))
    }
}

// ---------------------------------------------------------------------------
// Parser — precedence: ( ) > ! > comparison > && > ||
// ---------------------------------------------------------------------------

type Parsed<'a> = Result<(Operand, &'a [Token]), ExpressionError>;

fn parse_or<'a>(tokens: &'a [Token], scope: &Value) -> Parsed<'a> {
    let (mut left, mut rest) = parse_and(tokens, scope)?;
    while rest.first() == Some(&Token::Or) {
        let (right, r) = parse_and(&rest[1..], scope)?;
        left = Operand::Bool(left.truthy() || right.truthy());
        rest = r;
    }
    Ok((left, rest))
}

fn parse_and<'a>(tokens: &'a [Token], scope: &Value) -> Parsed<'a> {
    let (mut left, mut rest) = parse_not(tokens, scope)?;
    while rest.first() == Some(&Token::And) {
        let (right, r) = parse_not(&rest[1..], scope)?;
        left = Operand::Bool(left.truthy() && right.truthy());
        rest = r;
    }
    Ok((left, rest))
}

fn parse_not<'a>(tokens: &'a [Token], scope: &Value) -> Parsed<'a> {
    if tokens.first() == Some(&Token::Not) {
        let (value, rest) = parse_not(&tokens[1..], scope)?;
        return Ok((Operand::Bool(!value.truthy()), rest));
    }
    parse_comparison(tokens, scope)
}

fn parse_comparison<'a>(tokens: &'a [Token], scope: &Value) -> Parsed<'a> {
    let (left, rest) = parse_primary(tokens, scope)?;
    let op = match rest.first() {
        Some(Token::Eq) => CmpOp::Eq,
        Some(Token::Ne) => CmpOp::Ne,
        Some(Token::Gt) => CmpOp::Gt,
        Some(Token::Lt) => CmpOp::Lt,
        Some(Token::Ge) => CmpOp::Ge,
        Some(Token::Le) => CmpOp::Le,
        _ => return Ok((left, rest)),
    };
    let (right, rest) = parse_primary(&rest[1..], scope)?;
    Ok((Operand::Bool(compare(&left, &right, op)), rest))
}

#[derive(Clone, Copy)]
enum CmpOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CmpOp {
    fn accepts(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Ge => ord != Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
        }
    }

    fn is_equality(self) -> bool {
        matches!(self, CmpOp::Eq | CmpOp::Ne)
    }
}

/// Order two non-null operands of the same type; `None` for a type
/// mismatch.
fn ordering_of(left: &Operand, right: &Operand, op: CmpOp) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (left.number(), right.number()) {
        // epsilon equality so 1 and 1.0 compare equal across json/f64
        let ord = if (l - r).abs() < f64::EPSILON {
            Ordering::Equal
        } else if l < r {
            Ordering::Less
        } else {
            Ordering::Greater
        };
        return Some(ord);
    }
    if let (Some(l), Some(r)) = (left.text(), right.text()) {
        return Some(l.cmp(r));
    }
    if let (Operand::Bool(l), Operand::Bool(r)) = (left, right) {
        if op.is_equality() {
            return Some(l.cmp(r));
        }
    }
    None
}

fn compare(left: &Operand, right: &Operand, op: CmpOp) -> bool {
    // Null never orders; it only admits equality against another null.
    if left.is_null() || right.is_null() {
        let both_null = left.is_null() && right.is_null();
        return match op {
            CmpOp::Eq => both_null,
            CmpOp::Ne => !both_null,
            _ => false,
        };
    }
    match ordering_of(left, right, op) {
        Some(ord) => op.accepts(ord),
        // operands of different types compare false under every operator
        None => false,
    }
}

fn parse_primary<'a>(tokens: &'a [Token], scope: &Value) -> Parsed<'a> {
    match tokens.first() {
        None => Err(ExpressionError::Parse {
            message: "unexpected end of condition".into(),
        }),
        Some(Token::LParen) => {
            let (value, rest) = parse_or(&tokens[1..], scope)?;
            match rest.first() {
                Some(Token::RParen) => Ok((value, &rest[1..])),
                _ => Err(ExpressionError::Parse {
                    message: "expected closing parenthesis".into(),
                }),
            }
        }
        Some(Token::Str(s)) => Ok((Operand::Str(s.clone()), &tokens[1..])),
        Some(Token::Num(n)) => Ok((Operand::Num(*n), &tokens[1..])),
        Some(Token::Bool(b)) => Ok((Operand::Bool(*b), &tokens[1..])),
        Some(Token::Null) => Ok((Operand::Null, &tokens[1..])),
        Some(Token::Path(path)) => Ok((resolve_path(scope, path), &tokens[1..])),
        Some(other) => Err(ExpressionError::Parse {
            message: format!("expected value, got {other:?}"),
        }),
    }
}

/// Resolve a dotted field path against the scope. Any missing segment yields
/// null rather than an error.
fn resolve_path(scope: &Value, path: &str) -> Operand {
    let mut current = scope;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(v) => current = v,
            None => return Operand::Null,
        }
    }
    match current {
        Value::Null => Operand::Null,
        Value::Bool(b) => Operand::Bool(*b),
        Value::Number(n) => Operand::Num(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => Operand::Str(s.clone()),
        other => Operand::Json(other.clone()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
