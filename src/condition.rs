//! Conditional-edge expression language.
//!
//! Edge conditions are small boolean expressions over the top-level keys of
//! the workflow state, compiled once at graph-build time and evaluated on
//! every edge decision. The grammar is deliberately minimal:
//!
//! - comparisons: `<  <=  >  >=  ==  !=`
//! - boolean connectives: `and  or  not`
//! - arithmetic: `+  -  *  /` and unary minus
//! - literals: numbers, quoted strings, `true` / `false` / `null`
//!   (Python-style `True` / `False` / `None` are accepted as aliases)
//! - bare identifiers, which resolve to top-level state keys
//!
//! Nothing else is reachable from an expression: no functions, no method
//! calls, no environment beyond the state map. This is a hard sandboxing
//! requirement.
//!
//! # Fail-closed evaluation
//!
//! Any evaluation error (a missing key, a type mismatch, division by
//! zero) makes the condition `false`. Evaluation never panics and never
//! returns an error to the caller; [`Condition::evaluate`] is infallible
//! by construction. Malformed expression *text*, on the other hand, is a
//! compile-time error surfaced by [`Condition::compile`] so graph builds
//! fail fast instead of shipping edges that can never fire.
//!
//! # Truthiness
//!
//! The final value of an expression is coerced to a boolean: booleans
//! as-is, numbers are true when non-zero, strings/arrays/objects when
//! non-empty, `null` is false.
//!
//! # Examples
//!
//! ```rust
//! use stepweave::condition::Condition;
//! use serde_json::json;
//!
//! let cond = Condition::compile("quality_score >= 70 or iteration >= 3").unwrap();
//!
//! let mut state = rustc_hash::FxHashMap::default();
//! state.insert("quality_score".to_string(), json!(85));
//! state.insert("iteration".to_string(), json!(1));
//! assert!(cond.evaluate(&state));
//!
//! // Referencing an undefined key is not an error: the condition is false.
//! let empty = rustc_hash::FxHashMap::default();
//! assert!(!cond.evaluate(&empty));
//! ```

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::{Number, Value};
use thiserror::Error;

/// Errors produced while compiling condition text into an expression tree.
///
/// These surface at graph-build time; once a [`Condition`] exists its
/// evaluation can no longer fail.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
pub enum ConditionError {
    /// A character with no meaning in the grammar.
    #[error("unexpected character {ch:?} at offset {offset}")]
    #[diagnostic(
        code(stepweave::condition::unexpected_char),
        help("Conditions support comparisons, and/or/not, + - * /, literals, and state keys.")
    )]
    UnexpectedChar { ch: char, offset: usize },

    /// A string literal missing its closing quote.
    #[error("unterminated string literal starting at offset {offset}")]
    #[diagnostic(code(stepweave::condition::unterminated_string))]
    UnterminatedString { offset: usize },

    /// A numeric literal that could not be parsed.
    #[error("invalid number {text:?} at offset {offset}")]
    #[diagnostic(code(stepweave::condition::invalid_number))]
    InvalidNumber { text: String, offset: usize },

    /// A token that does not fit the grammar at this position.
    #[error("unexpected token {found:?} at offset {offset}")]
    #[diagnostic(code(stepweave::condition::unexpected_token))]
    UnexpectedToken { found: String, offset: usize },

    /// The expression ended where more input was required.
    #[error("expression ended unexpectedly")]
    #[diagnostic(code(stepweave::condition::unexpected_end))]
    UnexpectedEnd,

    /// Leftover tokens after a complete expression was parsed.
    #[error("trailing input starting at offset {offset}")]
    #[diagnostic(code(stepweave::condition::trailing_input))]
    TrailingInput { offset: usize },
}

/// Evaluation failures. Internal only: every variant collapses to `false`
/// at the [`Condition::evaluate`] boundary.
#[derive(Debug, Clone, PartialEq)]
enum EvalError {
    MissingKey(String),
    TypeMismatch,
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Or,
    And,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Key(String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// A compiled, reusable edge condition.
///
/// Compile once with [`Condition::compile`], evaluate many times against
/// different state maps. A `Condition` is immutable and cheap to clone, so
/// a built graph can be shared read-only across concurrent runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    /// Compiles expression text into a reusable predicate.
    ///
    /// # Errors
    ///
    /// Returns a [`ConditionError`] describing the first lexical or
    /// syntactic problem in the text.
    pub fn compile(text: &str) -> Result<Self, ConditionError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expr()?;
        parser.expect_end()?;
        Ok(Self {
            source: text.to_string(),
            expr,
        })
    }

    /// Evaluates the condition against the given state map.
    ///
    /// Fail-closed: any evaluation problem (missing key, type mismatch,
    /// division by zero) yields `false`.
    #[must_use]
    pub fn evaluate(&self, state: &FxHashMap<String, Value>) -> bool {
        match eval(&self.expr, state) {
            Ok(value) => truthy(&value),
            Err(err) => {
                tracing::trace!(condition = %self.source, ?err, "condition evaluation failed; treating as false");
                false
            }
        }
    }

    /// The original expression text this condition was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Boolean coercion for the final expression value.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn eval(expr: &Expr, state: &FxHashMap<String, Value>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Key(name) => state
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::MissingKey(name.clone())),
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval(inner, state)?))),
        Expr::Neg(inner) => {
            let v = eval(inner, state)?;
            let n = v.as_f64().ok_or(EvalError::TypeMismatch)?;
            Ok(number(-n))
        }
        Expr::Binary { op, lhs, rhs } => match op {
            // `and`/`or` short-circuit and yield an operand, not a bool.
            BinaryOp::And => {
                let left = eval(lhs, state)?;
                if !truthy(&left) {
                    Ok(left)
                } else {
                    eval(rhs, state)
                }
            }
            BinaryOp::Or => {
                let left = eval(lhs, state)?;
                if truthy(&left) {
                    Ok(left)
                } else {
                    eval(rhs, state)
                }
            }
            _ => {
                let left = eval(lhs, state)?;
                let right = eval(rhs, state)?;
                apply_binary(*op, &left, &right)
            }
        },
    }
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(left, right))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(left, right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(left, right)?;
            let result = match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                BinaryOp::Ge => ordering.is_ge(),
                _ => unreachable!(),
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add => match (left, right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            _ => arithmetic(left, right, |a, b| Ok(a + b)),
        },
        BinaryOp::Sub => arithmetic(left, right, |a, b| Ok(a - b)),
        BinaryOp::Mul => arithmetic(left, right, |a, b| Ok(a * b)),
        BinaryOp::Div => arithmetic(left, right, |a, b| {
            if b == 0.0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(a / b)
            }
        }),
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit ops handled in eval"),
    }
}

fn arithmetic(
    left: &Value,
    right: &Value,
    f: impl Fn(f64, f64) -> Result<f64, EvalError>,
) -> Result<Value, EvalError> {
    let (a, b) = match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(EvalError::TypeMismatch),
    };
    Ok(number(f(a, b)?))
}

/// Equality: numbers compare numerically regardless of representation,
/// everything else by structural equality.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) if left.is_number() && right.is_number() => a == b,
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Result<std::cmp::Ordering, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (
                a.as_f64().ok_or(EvalError::TypeMismatch)?,
                b.as_f64().ok_or(EvalError::TypeMismatch)?,
            );
            a.partial_cmp(&b).ok_or(EvalError::TypeMismatch)
        }
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(EvalError::TypeMismatch),
    }
}

/// Builds a JSON number, preferring integer representation when exact.
fn number(f: f64) -> Value {
    if f.fract() == 0.0 && f.is_finite() && f.abs() < (i64::MAX as f64) {
        Value::Number(Number::from(f as i64))
    } else {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(Value),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn tokenize(text: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let offset = i;
        match ch {
            c if c.is_whitespace() => {
                i += 1;
            }
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, offset });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, offset });
                i += 1;
            }
            '+' => {
                tokens.push(Token { kind: TokenKind::Plus, offset });
                i += 1;
            }
            '-' => {
                tokens.push(Token { kind: TokenKind::Minus, offset });
                i += 1;
            }
            '*' => {
                tokens.push(Token { kind: TokenKind::Star, offset });
                i += 1;
            }
            '/' => {
                tokens.push(Token { kind: TokenKind::Slash, offset });
                i += 1;
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token { kind: TokenKind::Le, offset });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Lt, offset });
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token { kind: TokenKind::Ge, offset });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Gt, offset });
                    i += 1;
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token { kind: TokenKind::EqEq, offset });
                    i += 2;
                } else {
                    return Err(ConditionError::UnexpectedChar { ch: '=', offset });
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token { kind: TokenKind::Ne, offset });
                    i += 2;
                } else {
                    return Err(ConditionError::UnexpectedChar { ch: '!', offset });
                }
            }
            '\'' | '"' => {
                let quote = ch;
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(ConditionError::UnterminatedString { offset }),
                        Some(&c) if c == quote => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            let escaped = chars
                                .get(i + 1)
                                .ok_or(ConditionError::UnterminatedString { offset })?;
                            value.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                other => *other,
                            });
                            i += 2;
                        }
                        Some(&c) => {
                            value.push(c);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    offset,
                });
            }
            c if c.is_ascii_digit() => {
                let start = i;
                let mut is_float = false;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    if chars[i] == '.' {
                        is_float = true;
                    }
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = if is_float {
                    text.parse::<f64>()
                        .ok()
                        .and_then(Number::from_f64)
                        .map(Value::Number)
                } else {
                    text.parse::<i64>().ok().map(|n| Value::Number(n.into()))
                };
                let value = value.ok_or(ConditionError::InvalidNumber {
                    text,
                    offset: start,
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    offset: start,
                });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let kind = match word.as_str() {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "not" => TokenKind::Not,
                    "true" | "True" => TokenKind::True,
                    "false" | "False" => TokenKind::False,
                    "null" | "None" => TokenKind::Null,
                    _ => TokenKind::Ident(word),
                };
                tokens.push(Token {
                    kind,
                    offset: start,
                });
            }
            other => return Err(ConditionError::UnexpectedChar { ch: other, offset }),
        }
    }

    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

/// Recursive-descent parser over the token stream.
///
/// Precedence, loosest first: `or`, `and`, `not`, comparison, additive,
/// multiplicative, unary minus. Comparisons do not chain.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_end(&self) -> Result<(), ConditionError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(ConditionError::TrailingInput {
                offset: token.offset,
            }),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ConditionError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ConditionError> {
        let mut expr = self.parse_and()?;
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Or)) {
            self.advance();
            let rhs = self.parse_and()?;
            expr = Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, ConditionError> {
        let mut expr = self.parse_not()?;
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::And)) {
            self.advance();
            let rhs = self.parse_not()?;
            expr = Expr::Binary {
                op: BinaryOp::And,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_not(&mut self) -> Result<Expr, ConditionError> {
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Not)) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ConditionError> {
        let lhs = self.parse_sum()?;
        let op = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Lt) => BinaryOp::Lt,
            Some(TokenKind::Le) => BinaryOp::Le,
            Some(TokenKind::Gt) => BinaryOp::Gt,
            Some(TokenKind::Ge) => BinaryOp::Ge,
            Some(TokenKind::EqEq) => BinaryOp::Eq,
            Some(TokenKind::Ne) => BinaryOp::Ne,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_sum()?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_sum(&mut self) -> Result<Expr, ConditionError> {
        let mut expr = self.parse_term()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr, ConditionError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ConditionError> {
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Minus)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ConditionError> {
        let token = self.advance().ok_or(ConditionError::UnexpectedEnd)?;
        match token.kind {
            TokenKind::Number(value) => Ok(Expr::Literal(value)),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::String(s))),
            TokenKind::True => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::Null => Ok(Expr::Literal(Value::Null)),
            TokenKind::Ident(name) => Ok(Expr::Key(name)),
            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(expr),
                    Some(other) => Err(ConditionError::UnexpectedToken {
                        found: format!("{:?}", other.kind),
                        offset: other.offset,
                    }),
                    None => Err(ConditionError::UnexpectedEnd),
                }
            }
            other => Err(ConditionError::UnexpectedToken {
                found: format!("{other:?}"),
                offset: token.offset,
            }),
        }
    }
}
