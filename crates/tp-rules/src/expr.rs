//! A small boolean expression language for rule conditions.
//!
//! Expressions read fields of the bound tracks and combine them with
//! comparisons and logical operators:
//!
//! ```text
//! sub.codec == 'ass' and not matches(lower(sub.title), 'sign')
//! audio.channels >= 6 || audio.default
//! secondary_sub ~= nil && secondary_sub.lang != sub.lang
//! ```
//!
//! Precedence, lowest first: `or`/`||`, `and`/`&&`, `not`/`!`, comparisons
//! (`==`, `!=`/`~=`, `<`, `<=`, `>`, `>=`), then field access and calls.
//! `and`/`or` short-circuit and yield one of their operands; `nil` and
//! `false` are the only falsy values.

use tp_core::Track;

use crate::condition::Bindings;
use crate::pattern;

/// Errors raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },
    #[error("evaluation error: {0}")]
    Eval(String),
}

fn parse_error(offset: usize, message: impl Into<String>) -> ExprError {
    ExprError::Parse {
        offset,
        message: message.into(),
    }
}

fn eval_error(message: impl Into<String>) -> ExprError {
    ExprError::Eval(message.into())
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Track(&'a Track),
}

impl Value<'_> {
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Track(_) => "track",
        }
    }

    fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Nil, Value::Number),
            serde_json::Value::String(s) => Value::Str(s.clone()),
            _ => Value::Nil,
        }
    }
}

fn track_field<'a>(track: &'a Track, name: &str) -> Value<'a> {
    match name {
        "id" => Value::Number(f64::from(track.id)),
        "type" => Value::Str(track.kind.as_str().to_string()),
        "lang" => Value::Str(track.lang.clone()),
        "title" => track.title.clone().map_or(Value::Nil, Value::Str),
        "default" => Value::Bool(track.default),
        "forced" => Value::Bool(track.forced),
        "codec" => track.codec.clone().map_or(Value::Nil, Value::Str),
        other => track.extra.get(other).map_or(Value::Nil, Value::from_json),
    }
}

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    /// A bound name such as `audio` or `sub`.
    Binding(String),
    /// `base.field`
    Field(Box<Expr>, String),
    /// `name(args...)`
    Call(String, Vec<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(f64),
    LParen,
    RParen,
    Dot,
    Comma,
    Op(&'static str),
}

fn tokenize(src: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let two = next.map(|n| [c, n]);
        let op = match two {
            Some(['=', '=']) => Some("=="),
            Some(['!', '=']) | Some(['~', '=']) => Some("!="),
            Some(['<', '=']) => Some("<="),
            Some(['>', '=']) => Some(">="),
            Some(['&', '&']) => Some("&&"),
            Some(['|', '|']) => Some("||"),
            _ => None,
        };
        if let Some(op) = op {
            tokens.push((offset, Token::Op(op)));
            i += 2;
            continue;
        }

        match c {
            '(' => tokens.push((offset, Token::LParen)),
            ')' => tokens.push((offset, Token::RParen)),
            '.' if !next.is_some_and(|n| n.is_ascii_digit()) => {
                tokens.push((offset, Token::Dot))
            }
            ',' => tokens.push((offset, Token::Comma)),
            '<' => tokens.push((offset, Token::Op("<"))),
            '>' => tokens.push((offset, Token::Op(">"))),
            '!' => tokens.push((offset, Token::Op("!"))),
            '\'' | '"' => {
                let quote = c;
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(parse_error(offset, "unterminated string")),
                        Some(&(_, '\\')) => {
                            let escaped = chars
                                .get(i + 1)
                                .ok_or_else(|| parse_error(offset, "unterminated string"))?
                                .1;
                            value.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                other => other,
                            });
                            i += 2;
                        }
                        Some(&(_, ch)) if ch == quote => break,
                        Some(&(_, ch)) => {
                            value.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push((offset, Token::Str(value)));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while chars
                    .get(i)
                    .is_some_and(|&(_, ch)| ch.is_ascii_digit() || ch == '.')
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().map(|&(_, ch)| ch).collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| parse_error(offset, format!("invalid number '{text}'")))?;
                tokens.push((offset, Token::Number(number)));
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while chars
                    .get(i)
                    .is_some_and(|&(_, ch)| ch.is_alphanumeric() || ch == '_')
                {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().map(|&(_, ch)| ch).collect();
                tokens.push((offset, Token::Ident(ident)));
                continue;
            }
            other => {
                return Err(parse_error(offset, format!("unexpected character '{other}'")));
            }
        }
        i += 1;
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Deepest expression tree the parser will build.
const MAX_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(o, _)| *o)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        self.pos += 1;
        token
    }

    /// Enter one more level of the expression tree.
    fn descend(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(parse_error(
                self.offset(),
                format!("expression nested deeper than {MAX_DEPTH} levels"),
            ));
        }
        Ok(())
    }

    fn eat_keyword(&mut self, keyword: &str, symbol: &str) -> bool {
        let hit = match self.peek() {
            Some(Token::Ident(name)) => name == keyword,
            Some(Token::Op(op)) => *op == symbol,
            _ => false,
        };
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ExprError> {
        let offset = self.offset();
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            _ => Err(parse_error(offset, format!("expected {what}"))),
        }
    }

    fn or_expr(&mut self) -> Result<Expr, ExprError> {
        let depth = self.depth;
        let mut lhs = self.and_expr()?;
        while self.eat_keyword("or", "||") {
            self.descend()?;
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ExprError> {
        let depth = self.depth;
        let mut lhs = self.not_expr()?;
        while self.eat_keyword("and", "&&") {
            self.descend()?;
            let rhs = self.not_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, ExprError> {
        if self.eat_keyword("not", "!") {
            self.descend()?;
            let inner = self.not_expr()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.compare_expr()
    }

    fn compare_expr(&mut self) -> Result<Expr, ExprError> {
        let lhs = self.postfix_expr()?;
        let op = match self.peek() {
            Some(Token::Op("==")) => CompareOp::Eq,
            Some(Token::Op("!=")) => CompareOp::Ne,
            Some(Token::Op("<")) => CompareOp::Lt,
            Some(Token::Op("<=")) => CompareOp::Le,
            Some(Token::Op(">")) => CompareOp::Gt,
            Some(Token::Op(">=")) => CompareOp::Ge,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        self.descend()?;
        let rhs = self.postfix_expr()?;
        self.depth -= 1;
        Ok(Expr::Compare(op, Box::new(lhs), Box::new(rhs)))
    }

    fn postfix_expr(&mut self) -> Result<Expr, ExprError> {
        let depth = self.depth;
        let mut expr = self.primary()?;
        while self.peek() == Some(&Token::Dot) {
            self.pos += 1;
            self.descend()?;
            let offset = self.offset();
            match self.advance() {
                Some(Token::Ident(field)) => expr = Expr::Field(Box::new(expr), field),
                _ => return Err(parse_error(offset, "expected field name after '.'")),
            }
        }
        self.depth = depth;
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.or_expr()?;
                self.expect(Token::RParen, "')'")?;
                self.depth -= 1;
                Ok(inner)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "nil" | "null" => Ok(Expr::Nil),
                "and" | "or" | "not" => {
                    Err(parse_error(offset, format!("unexpected keyword '{name}'")))
                }
                _ if self.peek() == Some(&Token::LParen) => {
                    self.pos += 1;
                    self.descend()?;
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.or_expr()?);
                            if self.peek() == Some(&Token::Comma) {
                                self.pos += 1;
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen, "')' after arguments")?;
                    self.depth -= 1;
                    Ok(Expr::Call(name, args))
                }
                _ => Ok(Expr::Binding(name)),
            },
            Some(_) => Err(parse_error(offset, "unexpected token")),
            None => Err(parse_error(offset, "unexpected end of expression")),
        }
    }
}

/// Parse an expression from source text.
pub fn parse(src: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(parse_error(0, "empty expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: src.len(),
        depth: 0,
    };
    let expr = parser.or_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parse_error(parser.offset(), "unexpected trailing input"));
    }
    Ok(expr)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn values_equal(a: &Value<'_>, b: &Value<'_>) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Track(x), Value::Track(y)) => x.kind == y.kind && x.id == y.id,
        _ => false,
    }
}

fn compare(op: CompareOp, a: &Value<'_>, b: &Value<'_>) -> Result<bool, ExprError> {
    use std::cmp::Ordering;

    match op {
        CompareOp::Eq => return Ok(values_equal(a, b)),
        CompareOp::Ne => return Ok(!values_equal(a, b)),
        _ => {}
    }

    let ordering = match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => {
            return Err(eval_error(format!(
                "attempt to compare {} with {}",
                a.type_name(),
                b.type_name()
            )))
        }
    };

    Ok(match (op, ordering) {
        (_, None) => false,
        (CompareOp::Lt, Some(o)) => o == Ordering::Less,
        (CompareOp::Le, Some(o)) => o != Ordering::Greater,
        (CompareOp::Gt, Some(o)) => o == Ordering::Greater,
        (CompareOp::Ge, Some(o)) => o != Ordering::Less,
        _ => false,
    })
}

fn string_arg<'v>(func: &str, value: &'v Value<'_>) -> Result<Option<&'v str>, ExprError> {
    match value {
        Value::Str(s) => Ok(Some(s.as_str())),
        Value::Nil => Ok(None),
        other => Err(eval_error(format!(
            "bad argument to '{func}' (string expected, got {})",
            other.type_name()
        ))),
    }
}

fn check_arity(name: &str, args: &[Value<'_>], arity: usize) -> Result<(), ExprError> {
    if args.len() == arity {
        Ok(())
    } else {
        Err(eval_error(format!(
            "'{name}' expects {arity} argument(s), got {}",
            args.len()
        )))
    }
}

fn call<'a>(name: &str, args: Vec<Value<'a>>) -> Result<Value<'a>, ExprError> {
    match name {
        "lower" => {
            check_arity(name, &args, 1)?;
            Ok(string_arg(name, &args[0])?
                .map_or(Value::Nil, |s| Value::Str(s.to_lowercase())))
        }
        "matches" | "contains" => {
            check_arity(name, &args, 2)?;
            let needle = string_arg(name, &args[1])?
                .ok_or_else(|| eval_error(format!("'{name}' needs a pattern")))?;
            let Some(text) = string_arg(name, &args[0])? else {
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(if name == "matches" {
                pattern::matches(text, needle)
            } else {
                text.contains(needle)
            }))
        }
        _ => Err(eval_error(format!("unknown function '{name}'"))),
    }
}

/// Evaluate `expr` against a read-only binding table.
pub fn evaluate<'a>(expr: &Expr, bindings: &Bindings<'a>) -> Result<Value<'a>, ExprError> {
    match expr {
        Expr::Nil => Ok(Value::Nil),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Binding(name) => match bindings.lookup(name) {
            Some(Some(track)) => Ok(Value::Track(track)),
            Some(None) => Ok(Value::Nil),
            None => Err(eval_error(format!("unknown name '{name}'"))),
        },
        Expr::Field(base, field) => match evaluate(base, bindings)? {
            Value::Track(track) => Ok(track_field(track, field)),
            other => Err(eval_error(format!(
                "attempt to index a {} value (field '{field}')",
                other.type_name()
            ))),
        },
        Expr::Call(name, args) => {
            let values = args
                .iter()
                .map(|a| evaluate(a, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, values)
        }
        Expr::Not(inner) => Ok(Value::Bool(!evaluate(inner, bindings)?.is_truthy())),
        Expr::And(lhs, rhs) => {
            let left = evaluate(lhs, bindings)?;
            if left.is_truthy() {
                evaluate(rhs, bindings)
            } else {
                Ok(left)
            }
        }
        Expr::Or(lhs, rhs) => {
            let left = evaluate(lhs, bindings)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                evaluate(rhs, bindings)
            }
        }
        Expr::Compare(op, lhs, rhs) => {
            let left = evaluate(lhs, bindings)?;
            let right = evaluate(rhs, bindings)?;
            compare(*op, &left, &right).map(Value::Bool)
        }
    }
}
