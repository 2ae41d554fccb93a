// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! A small real-valued expression language.
//!
//! Used by `plot-function` traces (`"fn": "x^2 - 2x"`) and by JesseCode function graphs
//! (`function(x){ return Math.sin(x); }`). Supported:
//! - numbers (`2`, `0.5`, `1e-3`), the constants `pi` and `e`
//! - named parameters (usually `x`)
//! - `+ - * / ^` and `**`, unary minus, parentheses
//! - implicit multiplication (`2x`, `3(x + 1)`, `(x - 1)(x + 1)`)
//! - calls to the usual elementary functions; a `Math.` prefix is accepted and ignored
//!
//! Evaluation never fails: domain errors produce `NaN`, which plotters skip.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    UnexpectedChar { offset: usize, ch: char },
    UnexpectedEnd,
    UnexpectedToken { offset: usize, found: String },
    UnknownIdentifier { offset: usize, name: String },
    UnknownFunction { offset: usize, name: String },
    WrongArity { offset: usize, name: String, expected: usize, found: usize },
    NestingTooDeep { offset: usize },
    TooLong { tokens: usize },
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedChar { offset, ch } => {
                write!(f, "unexpected character '{ch}' at offset {offset}")
            }
            Self::UnexpectedEnd => f.write_str("unexpected end of expression"),
            Self::UnexpectedToken { offset, found } => {
                write!(f, "unexpected '{found}' at offset {offset}")
            }
            Self::UnknownIdentifier { offset, name } => {
                write!(f, "unknown identifier '{name}' at offset {offset}")
            }
            Self::UnknownFunction { offset, name } => {
                write!(f, "unknown function '{name}' at offset {offset}")
            }
            Self::WrongArity { offset, name, expected, found } => write!(
                f,
                "function '{name}' at offset {offset} takes {expected} argument(s), got {found}"
            ),
            Self::NestingTooDeep { offset } => {
                write!(f, "expression nests deeper than {MAX_DEPTH} levels at offset {offset}")
            }
            Self::TooLong { tokens } => {
                write!(f, "expression has {tokens} tokens, more than {MAX_TOKENS}")
            }
        }
    }
}

impl std::error::Error for ExprError {}

/// Nesting limit for parentheses, calls, exponents and sign chains.
pub const MAX_DEPTH: usize = 64;
/// Token limit; it also bounds the depth of left-nested operator chains.
pub const MAX_TOKENS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Sqrt,
    Cbrt,
    Abs,
    Exp,
    Ln,
    Log10,
    Log2,
    Floor,
    Ceil,
    Round,
    Sign,
    Pow,
    Atan2,
    Min,
    Max,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        let name = name.strip_prefix("Math.").unwrap_or(name);
        let func = match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" | "arcsin" => Self::Asin,
            "acos" | "arccos" => Self::Acos,
            "atan" | "arctan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "sqrt" => Self::Sqrt,
            "cbrt" => Self::Cbrt,
            "abs" => Self::Abs,
            "exp" => Self::Exp,
            "ln" | "log" => Self::Ln,
            "log10" => Self::Log10,
            "log2" => Self::Log2,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            "sign" => Self::Sign,
            "pow" => Self::Pow,
            "atan2" => Self::Atan2,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return None,
        };
        Some(func)
    }

    fn arity(self) -> usize {
        match self {
            Self::Pow | Self::Atan2 | Self::Min | Self::Max => 2,
            _ => 1,
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        let a = args.first().copied().unwrap_or(f64::NAN);
        let b = args.get(1).copied().unwrap_or(f64::NAN);
        match self {
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Tan => a.tan(),
            Self::Asin => a.asin(),
            Self::Acos => a.acos(),
            Self::Atan => a.atan(),
            Self::Sinh => a.sinh(),
            Self::Cosh => a.cosh(),
            Self::Tanh => a.tanh(),
            Self::Sqrt => a.sqrt(),
            Self::Cbrt => a.cbrt(),
            Self::Abs => a.abs(),
            Self::Exp => a.exp(),
            Self::Ln => a.ln(),
            Self::Log10 => a.log10(),
            Self::Log2 => a.log2(),
            Self::Floor => a.floor(),
            Self::Ceil => a.ceil(),
            Self::Round => a.round(),
            Self::Sign => {
                if a == 0.0 || a.is_nan() {
                    a
                } else {
                    a.signum()
                }
            }
            Self::Pow => a.powf(b),
            Self::Atan2 => a.atan2(b),
            Self::Min => a.min(b),
            Self::Max => a.max(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Parsed expression. Parameters are resolved to their index at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Param(usize),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

impl Expr {
    /// Evaluates with `args[i]` bound to the `i`-th parameter name given to the parser.
    pub fn eval(&self, args: &[f64]) -> f64 {
        match self {
            Self::Number(value) => *value,
            Self::Param(idx) => args.get(*idx).copied().unwrap_or(f64::NAN),
            Self::Neg(inner) => -inner.eval(args),
            Self::Binary(op, lhs, rhs) => {
                let (a, b) = (lhs.eval(args), rhs.eval(args));
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Self::Call(func, args_exprs) => {
                let values: Vec<f64> = args_exprs.iter().map(|arg| arg.eval(args)).collect();
                func.apply(&values)
            }
        }
    }

    /// Constant expressions (no parameters) evaluate without arguments.
    pub fn is_constant(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Param(_) => false,
            Self::Neg(inner) => inner.is_constant(),
            Self::Binary(_, lhs, rhs) => lhs.is_constant() && rhs.is_constant(),
            Self::Call(_, args) => args.iter().all(Self::is_constant),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    Pow,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Ident(name) => name.clone(),
            Self::Op(ch) => ch.to_string(),
            Self::Pow => "**".to_owned(),
            Self::LParen => "(".to_owned(),
            Self::RParen => ")".to_owned(),
            Self::Comma => ",".to_owned(),
        }
    }

    /// Tokens that can start an operand; used for implicit multiplication.
    fn starts_operand(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Ident(_) | Self::LParen)
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut idx = 0usize;

    while idx < bytes.len() {
        let ch = bytes[idx];
        if ch.is_ascii_whitespace() {
            idx += 1;
            continue;
        }

        let start = idx;
        if ch.is_ascii_digit() || (ch == b'.' && bytes.get(idx + 1).is_some_and(u8::is_ascii_digit))
        {
            while idx < bytes.len() && (bytes[idx].is_ascii_digit() || bytes[idx] == b'.') {
                idx += 1;
            }
            // Exponent only when digits follow, so `2e` stays `2 * e`.
            if idx < bytes.len() && matches!(bytes[idx], b'e' | b'E') {
                let mut peek = idx + 1;
                if peek < bytes.len() && matches!(bytes[peek], b'+' | b'-') {
                    peek += 1;
                }
                if peek < bytes.len() && bytes[peek].is_ascii_digit() {
                    idx = peek;
                    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
                        idx += 1;
                    }
                }
            }
            let text = &input[start..idx];
            let value = text.parse::<f64>().map_err(|_| ExprError::UnexpectedToken {
                offset: start,
                found: text.to_owned(),
            })?;
            tokens.push((start, Token::Number(value)));
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == b'_' {
            while idx < bytes.len()
                && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_' || bytes[idx] == b'.')
            {
                idx += 1;
            }
            tokens.push((start, Token::Ident(input[start..idx].to_owned())));
            continue;
        }

        let token = match ch {
            b'*' if bytes.get(idx + 1) == Some(&b'*') => {
                idx += 1;
                Token::Pow
            }
            b'^' => Token::Pow,
            b'+' | b'-' | b'*' | b'/' => Token::Op(ch as char),
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b',' => Token::Comma,
            _ => {
                let ch = input[start..].chars().next().unwrap_or('?');
                return Err(ExprError::UnexpectedChar { offset: start, ch });
            }
        };
        idx += 1;
        tokens.push((start, token));
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    params: &'a [&'a str],
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, token)| token)
    }

    fn bump(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ExprError> {
        match self.bump() {
            Some((_, token)) if &token == expected => Ok(()),
            Some((offset, token)) => {
                Err(ExprError::UnexpectedToken { offset, found: token.describe() })
            }
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    // sum := term (('+' | '-') term)*
    fn sum(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = if *op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // term := unary (('*' | '/' | <implicit>) unary)*
    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op('*')) => BinaryOp::Mul,
                Some(Token::Op('/')) => BinaryOp::Div,
                Some(token) if token.starts_operand() => {
                    let rhs = self.power()?;
                    lhs = Expr::Binary(BinaryOp::Mul, Box::new(lhs), Box::new(rhs));
                    continue;
                }
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    // unary := ('-' | '+') unary | power
    fn unary(&mut self) -> Result<Expr, ExprError> {
        // Every nesting path (parentheses, call arguments, exponents, sign chains) passes here.
        if self.depth >= MAX_DEPTH {
            let offset = self.tokens.get(self.pos).map_or(0, |(offset, _)| *offset);
            return Err(ExprError::NestingTooDeep { offset });
        }
        self.depth += 1;
        let result = self.unary_inner();
        self.depth -= 1;
        result
    }

    fn unary_inner(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := primary ('^' unary)?
    // Right associative; binds tighter than a unary minus on its left.
    fn power(&mut self) -> Result<Expr, ExprError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let Some((offset, token)) = self.bump() else {
            return Err(ExprError::UnexpectedEnd);
        };

        match token {
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::LParen => {
                let inner = self.sum()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if self.peek() == Some(&Token::LParen) {
                    return self.call(offset, name);
                }
                if let Some(idx) = self.params.iter().position(|param| *param == name) {
                    return Ok(Expr::Param(idx));
                }
                match name.strip_prefix("Math.").unwrap_or(&name) {
                    "pi" | "PI" => Ok(Expr::Number(std::f64::consts::PI)),
                    "e" | "E" => Ok(Expr::Number(std::f64::consts::E)),
                    _ => Err(ExprError::UnknownIdentifier { offset, name }),
                }
            }
            other => Err(ExprError::UnexpectedToken { offset, found: other.describe() }),
        }
    }

    fn call(&mut self, offset: usize, name: String) -> Result<Expr, ExprError> {
        let func = Func::lookup(&name)
            .ok_or_else(|| ExprError::UnknownFunction { offset, name: name.clone() })?;
        self.expect(&Token::LParen)?;

        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.sum()?);
                if self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }
        self.expect(&Token::RParen)?;

        if args.len() != func.arity() {
            return Err(ExprError::WrongArity {
                offset,
                name,
                expected: func.arity(),
                found: args.len(),
            });
        }
        Ok(Expr::Call(func, args))
    }
}

/// Parses `input` with the given parameter names in scope.
pub fn parse_expr(input: &str, params: &[&str]) -> Result<Expr, ExprError> {
    let tokens = tokenize(input)?;
    if tokens.len() > MAX_TOKENS {
        return Err(ExprError::TooLong { tokens: tokens.len() });
    }
    let mut parser = Parser { tokens, pos: 0, params, depth: 0 };
    let expr = parser.sum()?;
    if let Some((offset, token)) = parser.bump() {
        return Err(ExprError::UnexpectedToken { offset, found: token.describe() });
    }
    Ok(expr)
}
