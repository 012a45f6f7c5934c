// src/core/expression.rs
//
// A small arithmetic/relational sub-language for the expression value
// resolver and the validator. Property references are substituted by
// template expansion before the formula reaches this module, so the grammar
// only knows literals and operators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExprError {
    #[error("Expression parse error: {0}")]
    Parse(String),
    #[error("Expression evaluation error: {0}")]
    Eval(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    fn as_number(&self) -> Result<f64, ExprError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Self::Text(t) => Err(ExprError::Eval(format!("'{}' is not a number", t))),
        }
    }

    fn truthy(&self) -> Result<bool, ExprError> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Number(n) => Ok(*n != 0.0),
            Self::Text(t) => Err(ExprError::Eval(format!("'{}' is not a boolean", t))),
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", *n as i64),
            Self::Number(n) => format!("{}", n),
            // Booleans render as 1/0 so results compose with arithmetic.
            Self::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Self::Text(t) => t.clone(),
        }
    }
}

/// Evaluates a formula and renders the result as a string.
pub fn evaluate(input: &str) -> Result<String, ExprError> {
    Ok(eval_value(input)?.render())
}

/// Evaluates a formula as a condition (numbers are truthy when non-zero).
pub fn evaluate_truthy(input: &str) -> Result<bool, ExprError> {
    eval_value(input)?.truthy()
}

fn eval_value(input: &str) -> Result<Value, ExprError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ExprError::Parse(format!(
            "unexpected trailing input near '{:?}'",
            parser.tokens[parser.pos]
        )));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Op(&'static str),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => text.push(c),
                        None => {
                            return Err(ExprError::Parse("unterminated string literal".into()));
                        }
                    }
                }
                tokens.push(Token::Text(text));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut num = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        num.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let parsed = num
                    .parse::<f64>()
                    .map_err(|_| ExprError::Parse(format!("invalid number '{}'", num)))?;
                tokens.push(Token::Number(parsed));
            }
            '+' | '-' | '*' | '/' | '%' => {
                chars.next();
                tokens.push(Token::Op(match ch {
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    _ => "%",
                }));
            }
            '=' | '!' | '<' | '>' | '&' | '|' => {
                chars.next();
                let two = chars.peek().copied();
                let op = match (ch, two) {
                    ('=', Some('=')) => {
                        chars.next();
                        "=="
                    }
                    ('!', Some('=')) => {
                        chars.next();
                        "!="
                    }
                    ('<', Some('=')) => {
                        chars.next();
                        "<="
                    }
                    ('>', Some('=')) => {
                        chars.next();
                        ">="
                    }
                    ('&', Some('&')) => {
                        chars.next();
                        "&&"
                    }
                    ('|', Some('|')) => {
                        chars.next();
                        "||"
                    }
                    ('<', _) => "<",
                    ('>', _) => ">",
                    ('!', _) => "!",
                    _ => {
                        return Err(ExprError::Parse(format!("unexpected character '{}'", ch)));
                    }
                };
                tokens.push(Token::Op(op));
            }
            c => return Err(ExprError::Parse(format!("unexpected character '{}'", c))),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek_op(&self) -> Option<&'static str> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(op)) => Some(op),
            _ => None,
        }
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn parse_or(&mut self) -> Result<Value, ExprError> {
        let mut left = self.parse_and()?;
        while self.peek_op() == Some("||") {
            self.bump();
            let right = self.parse_and()?;
            left = Value::Bool(left.truthy()? || right.truthy()?);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Value, ExprError> {
        let mut left = self.parse_equality()?;
        while self.peek_op() == Some("&&") {
            self.bump();
            let right = self.parse_equality()?;
            left = Value::Bool(left.truthy()? && right.truthy()?);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Value, ExprError> {
        let mut left = self.parse_comparison()?;
        while let Some(op @ ("==" | "!=")) = self.peek_op() {
            self.bump();
            let right = self.parse_comparison()?;
            let equal = match (&left, &right) {
                (Value::Text(a), Value::Text(b)) => a == b,
                _ => left.as_number()? == right.as_number()?,
            };
            left = Value::Bool(if op == "==" { equal } else { !equal });
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Value, ExprError> {
        let mut left = self.parse_additive()?;
        while let Some(op @ ("<" | "<=" | ">" | ">=")) = self.peek_op() {
            self.bump();
            let right = self.parse_additive()?;
            let (a, b) = (left.as_number()?, right.as_number()?);
            left = Value::Bool(match op {
                "<" => a < b,
                "<=" => a <= b,
                ">" => a > b,
                _ => a >= b,
            });
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Value, ExprError> {
        let mut left = self.parse_multiplicative()?;
        while let Some(op @ ("+" | "-")) = self.peek_op() {
            self.bump();
            let right = self.parse_multiplicative()?;
            let (a, b) = (left.as_number()?, right.as_number()?);
            left = Value::Number(if op == "+" { a + b } else { a - b });
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Value, ExprError> {
        let mut left = self.parse_unary()?;
        while let Some(op @ ("*" | "/" | "%")) = self.peek_op() {
            self.bump();
            let right = self.parse_unary()?;
            let (a, b) = (left.as_number()?, right.as_number()?);
            if b == 0.0 && op != "*" {
                return Err(ExprError::Eval("division by zero".into()));
            }
            left = Value::Number(match op {
                "*" => a * b,
                "/" => a / b,
                _ => a % b,
            });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Value, ExprError> {
        match self.peek_op() {
            Some("-") => {
                self.bump();
                Ok(Value::Number(-self.parse_unary()?.as_number()?))
            }
            Some("!") => {
                self.bump();
                Ok(Value::Bool(!self.parse_unary()?.truthy()?))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Value, ExprError> {
        match self.tokens.get(self.pos).cloned() {
            Some(Token::Number(n)) => {
                self.bump();
                Ok(Value::Number(n))
            }
            Some(Token::Text(t)) => {
                self.bump();
                Ok(Value::Text(t))
            }
            Some(Token::LParen) => {
                self.bump();
                let inner = self.parse_or()?;
                match self.tokens.get(self.pos) {
                    Some(Token::RParen) => {
                        self.bump();
                        Ok(inner)
                    }
                    _ => Err(ExprError::Parse("expected ')'".into())),
                }
            }
            other => Err(ExprError::Parse(format!(
                "expected a value, found {:?}",
                other
            ))),
        }
    }
}

// MARK: --- UNIT TESTS ---
