//! Restricted integer arithmetic for computed fields.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! shift   := additive (("<<" | ">>") additive)*
//! additive:= product (("+" | "-") product)*
//! product := unary ("*" unary)*
//! unary   := "-" unary | primary
//! primary := integer | name | "(" shift ")"
//! ```
//!
//! Names refer to sibling fields that are already bound when the expression is
//! evaluated. All arithmetic is checked.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

/// Expression parse or evaluation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// Input ended where an operand was expected.
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    /// Character that is not part of the grammar.
    #[error("unexpected `{0}`")]
    UnexpectedChar(char),
    /// Integer literal does not fit in 64 bits.
    #[error("integer literal `{0}` is too large")]
    LiteralOverflow(String),
    /// Closing parenthesis missing.
    #[error("missing `)`")]
    UnclosedParen,
    /// Name is not bound at evaluation time.
    #[error("`{0}` has no value")]
    Unbound(String),
    /// Arithmetic overflowed or shift amount out of range.
    #[error("arithmetic overflow")]
    Overflow,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `<<`
    Shl,
    /// `>>` (arithmetic)
    Shr,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Integer constant.
    Literal(i64),
    /// Reference to a sibling field.
    Variable(String),
    /// Unary negation.
    Neg(Box<Expr>),
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Parses expression text.
    ///
    /// # Errors
    ///
    /// Returns `ExprError` on any syntax error or trailing input.
    pub fn parse(text: &str) -> Result<Self, ExprError> {
        let mut parser = Parser {
            chars: text.chars().peekable(),
        };
        let expr = parser.shift()?;
        parser.skip_space();
        match parser.chars.next() {
            None => Ok(expr),
            Some(c) => Err(ExprError::UnexpectedChar(c)),
        }
    }

    /// Names referenced by the expression, in order of appearance.
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Literal(_) => {}
            Self::Variable(name) => names.push(name),
            Self::Neg(inner) => inner.collect_variables(names),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(names);
                rhs.collect_variables(names);
            }
        }
    }

    /// Evaluates against resolved field values.
    ///
    /// # Errors
    ///
    /// Returns `ExprError::Unbound` for a missing name and
    /// `ExprError::Overflow` for overflow or a shift outside `0..64`.
    pub fn evaluate(&self, env: &HashMap<String, i64>) -> Result<i64, ExprError> {
        match self {
            Self::Literal(value) => Ok(*value),
            Self::Variable(name) => env
                .get(name)
                .copied()
                .ok_or_else(|| ExprError::Unbound(name.clone())),
            Self::Neg(inner) => inner.evaluate(env)?.checked_neg().ok_or(ExprError::Overflow),
            Self::Binary { op, lhs, rhs } => {
                let lhs = lhs.evaluate(env)?;
                let rhs = rhs.evaluate(env)?;
                let result = match op {
                    BinaryOp::Add => lhs.checked_add(rhs),
                    BinaryOp::Sub => lhs.checked_sub(rhs),
                    BinaryOp::Mul => lhs.checked_mul(rhs),
                    BinaryOp::Shl => shift_amount(rhs)
                        .and_then(|s| lhs.checked_shl(s).filter(|shifted| shifted >> s == lhs)),
                    BinaryOp::Shr => shift_amount(rhs).and_then(|s| lhs.checked_shr(s)),
                };
                result.ok_or(ExprError::Overflow)
            }
        }
    }
}

fn shift_amount(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|s| *s < 64)
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl Parser<'_> {
    fn skip_space(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_space();
        self.chars.peek().copied()
    }

    fn shift(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.additive()?;
        while let Some(c @ ('<' | '>')) = self.peek() {
            self.chars.next();
            if self.chars.next_if_eq(&c).is_none() {
                return Err(ExprError::UnexpectedChar(c));
            }
            let op = if c == '<' { BinaryOp::Shl } else { BinaryOp::Shr };
            let rhs = self.additive()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.product()?;
        while let Some(c @ ('+' | '-')) = self.peek() {
            self.chars.next();
            let op = if c == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            let rhs = self.product()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn product(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        while self.peek() == Some('*') {
            self.chars.next();
            let rhs = self.unary()?;
            lhs = binary(BinaryOp::Mul, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if self.peek() == Some('-') {
            self.chars.next();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            None => Err(ExprError::UnexpectedEnd),
            Some('(') => {
                self.chars.next();
                let inner = self.shift()?;
                if self.peek() == Some(')') {
                    self.chars.next();
                    Ok(inner)
                } else {
                    Err(ExprError::UnclosedParen)
                }
            }
            Some(c) if c.is_ascii_digit() => {
                let digits = self.take_while(|c| c.is_ascii_digit());
                digits
                    .parse()
                    .map(Expr::Literal)
                    .map_err(|_| ExprError::LiteralOverflow(digits))
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => Ok(Expr::Variable(
                self.take_while(|c| c.is_ascii_alphanumeric() || c == '_'),
            )),
            Some(c) => Err(ExprError::UnexpectedChar(c)),
        }
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.chars.next_if(|c| accept(*c)) {
            text.push(c);
        }
        text
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
