//! Narrow arithmetic: exactly two integers and one operator.
//!
//! Nothing here evaluates arbitrary text. Anything outside the grammar is
//! simply not an expression. Operands must stand on their own: digits glued to
//! letters are ignored, and an unspaced hyphen between numbers inside a longer
//! message (phone numbers, dates, ranges) is not a subtraction.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

// NOTE: expect() is acceptable here: patterns are compile-time constants.
static EXPRESSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w.])(-?\d+)(\s*)([+\-*/])(\s*)(-?\d+)")
        .expect("Invalid regex: arithmetic expression")
});

/// A further operator and operand, or a fractional part, right after the match.
static CONTINUATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\s*[+\-*/]\s*-?\d|\.\d)").expect("Invalid regex: expression continuation")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Subtract),
            "*" => Some(Operator::Multiply),
            "/" => Some(Operator::Divide),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("operand '{0}' is out of range")]
    OperandOutOfRange(String),
    #[error("result overflows")]
    Overflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("only two operands and one operator are supported")]
    TooManyTerms,
}

/// `<int> <op> <int>` as found in user text. Operands are kept as text until evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    lhs: String,
    op: Operator,
    rhs: String,
    /// More terms follow the first two operands.
    continued: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Decimal(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{}", n),
            Number::Decimal(x) => {
                let text = format!("{:.4}", x);
                let text = text.trim_end_matches('0').trim_end_matches('.');
                // a tiny negative quotient rounds to "-0"
                write!(f, "{}", if text == "-0" { "0" } else { text })
            }
        }
    }
}

impl Expression {
    /// Finds the first `<int> <op> <int>` in `text`.
    ///
    /// Longer chains such as `2 + 2 + 2` are still found, but marked so that
    /// [`Expression::evaluate`] refuses them.
    pub fn find(text: &str) -> Option<Self> {
        let caps = EXPRESSION_PATTERN.captures(text)?;
        let lhs = caps.get(1)?;
        let rhs = caps.get(5)?;
        let rest = &text[rhs.end()..];

        if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
            return None;
        }

        let op = Operator::parse(&caps[3])?;
        let unspaced = caps[2].is_empty() && caps[4].is_empty();
        if op == Operator::Subtract && unspaced {
            let before = text[..lhs.start()].trim();
            let after = rest.trim().trim_end_matches(['?', '!', '.']);
            if !before.is_empty() || !after.is_empty() {
                return None;
            }
        }

        Some(Self {
            lhs: lhs.as_str().to_string(),
            op,
            rhs: rhs.as_str().to_string(),
            continued: CONTINUATION_PATTERN.is_match(rest),
        })
    }

    pub fn evaluate(&self) -> Result<Number, ArithmeticError> {
        if self.continued {
            return Err(ArithmeticError::TooManyTerms);
        }
        let lhs: i64 = self
            .lhs
            .parse()
            .map_err(|_| ArithmeticError::OperandOutOfRange(self.lhs.clone()))?;
        let rhs: i64 = self
            .rhs
            .parse()
            .map_err(|_| ArithmeticError::OperandOutOfRange(self.rhs.clone()))?;

        match self.op {
            Operator::Add => lhs.checked_add(rhs).map(Number::Integer).ok_or(ArithmeticError::Overflow),
            Operator::Subtract => lhs.checked_sub(rhs).map(Number::Integer).ok_or(ArithmeticError::Overflow),
            Operator::Multiply => lhs.checked_mul(rhs).map(Number::Integer).ok_or(ArithmeticError::Overflow),
            Operator::Divide => {
                if rhs == 0 {
                    return Err(ArithmeticError::DivisionByZero);
                }
                match lhs.checked_rem(rhs) {
                    Some(0) => lhs.checked_div(rhs).map(Number::Integer).ok_or(ArithmeticError::Overflow),
                    Some(_) => Ok(Number::Decimal(lhs as f64 / rhs as f64)),
                    None => Err(ArithmeticError::Overflow),
                }
            }
        }
    }
}
