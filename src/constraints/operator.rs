//! Closed operator sets used by constraints.
//!
//! Operators are parsed once, when a constraint is built, and never
//! re-interpreted afterwards.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{multispace0, one_of},
    combinator::opt,
    number::complete::double,
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ConstraintError;

/// Comparison gating a candidate against a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// Less than (<)
    LessThan,

    /// Less than or equal to (<=)
    LessThanOrEqual,

    /// Greater than (>)
    GreaterThan,

    /// Greater than or equal to (>=)
    GreaterThanOrEqual,

    /// Equal to (==)
    Equal,

    /// Not equal to (!=)
    NotEqual,
}

impl Comparison {
    /// Parse one of `<`, `<=`, `>`, `>=`, `==`, `!=`.
    pub fn parse(text: &str) -> Result<Self, ConstraintError> {
        match comparison(text.trim()) {
            Ok(("", op)) => Ok(op),
            _ => Err(ConstraintError::InvalidOperator {
                text: text.to_string(),
            }),
        }
    }

    /// Convert the comparison to its operator string
    pub fn as_operator(&self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }

    /// Whether `lhs op rhs` holds.
    pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::LessThan => lhs < rhs,
            Self::LessThanOrEqual => lhs <= rhs,
            Self::GreaterThan => lhs > rhs,
            Self::GreaterThanOrEqual => lhs >= rhs,
            Self::Equal => lhs == rhs,
            Self::NotEqual => lhs != rhs,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_operator())
    }
}

/// Affine transform applied to a source value by object constraints.
///
/// The textual forms are `""` (identity), `"-"` (negation) and a number
/// followed by one of `*`, `+`, `-`, `/`, read as `k op x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    /// `x`
    Identity,
    /// `-x`
    Negate,
    /// `k * x`
    Scale(f64),
    /// `k + x`
    Offset(f64),
    /// `k - x`
    SubtractFrom(f64),
    /// `k / x`
    DivideInto(f64),
}

impl Transform {
    /// Parse a transform prefix such as `"2*"` or `"1-"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::constraints::Transform;
    ///
    /// assert_eq!(Transform::parse("2*").unwrap(), Transform::Scale(2.0));
    /// assert_eq!(Transform::parse("").unwrap(), Transform::Identity);
    /// assert!(Transform::parse("2").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, ConstraintError> {
        let invalid = || ConstraintError::InvalidOperator {
            text: text.to_string(),
        };
        let (rest, (factor, op)) = transform(text).map_err(|_| invalid())?;
        if !rest.is_empty() {
            return Err(invalid());
        }
        match (factor, op) {
            (None, None) => Ok(Self::Identity),
            (None, Some('-')) => Ok(Self::Negate),
            (Some(k), Some('*')) => Ok(Self::Scale(k)),
            (Some(k), Some('+')) => Ok(Self::Offset(k)),
            (Some(k), Some('-')) => Ok(Self::SubtractFrom(k)),
            (Some(k), Some('/')) => Ok(Self::DivideInto(k)),
            _ => Err(invalid()),
        }
    }

    /// Apply the transform. `None` signals a division by zero.
    pub fn apply(&self, x: f64) -> Option<f64> {
        match *self {
            Self::Identity => Some(x),
            Self::Negate => Some(-x),
            Self::Scale(k) => Some(k * x),
            Self::Offset(k) => Some(k + x),
            Self::SubtractFrom(k) => Some(k - x),
            Self::DivideInto(k) => {
                if x == 0.0 {
                    None
                } else {
                    Some(k / x)
                }
            }
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => Ok(()),
            Self::Negate => f.write_str("-"),
            Self::Scale(k) => write!(f, "{k}*"),
            Self::Offset(k) => write!(f, "{k}+"),
            Self::SubtractFrom(k) => write!(f, "{k}-"),
            Self::DivideInto(k) => write!(f, "{k}/"),
        }
    }
}

// Parser functions using nom

fn ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

fn comparison(input: &str) -> IResult<&str, Comparison> {
    let (input, op) = alt((
        tag("<="),
        tag(">="),
        tag("=="),
        tag("!="),
        tag("<"),
        tag(">"),
    ))
    .parse(input)?;
    let op = match op {
        "<=" => Comparison::LessThanOrEqual,
        ">=" => Comparison::GreaterThanOrEqual,
        "==" => Comparison::Equal,
        "!=" => Comparison::NotEqual,
        "<" => Comparison::LessThan,
        _ => Comparison::GreaterThan,
    };
    Ok((input, op))
}

fn factor(input: &str) -> IResult<&str, f64> {
    double(input)
}

fn arithmetic(input: &str) -> IResult<&str, char> {
    one_of("*+-/").parse(input)
}

fn transform(input: &str) -> IResult<&str, (Option<f64>, Option<char>)> {
    let (input, _) = ws(input)?;
    let (input, k) = opt(factor).parse(input)?;
    let (input, _) = ws(input)?;
    let (input, op) = opt(arithmetic).parse(input)?;
    let (input, _) = ws(input)?;
    Ok((input, (k, op)))
}
