//! Physical units for value cells
//!
//! Units are parsed from short expressions such as `"m"`, `"m/s"`,
//! `"angstrom^-1"` or `"eV*s"` into a dimension vector and a scale factor
//! relative to SI. Two units are compatible when their dimensions agree.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::opt,
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while parsing or converting units
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Cannot parse unit expression '{text}'")]
    Parse { text: String },

    #[error("Unknown unit '{symbol}'")]
    UnknownUnit { symbol: String },

    #[error("Cannot convert from '{from}' to '{to}': incompatible dimensions")]
    Incompatible { from: String, to: String },
}

/// Exponents of length, time, mass, temperature and plane angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension([i8; 5]);

impl Dimension {
    /// The dimension of a pure number.
    pub const NONE: Dimension = Dimension([0; 5]);

    /// Add `power` times `other`. `None` if an exponent leaves the `i8` range.
    fn add_scaled(&mut self, other: &Dimension, power: i32) -> Option<()> {
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            let scaled = i8::try_from(i32::from(*theirs).checked_mul(power)?).ok()?;
            *mine = mine.checked_add(scaled)?;
        }
        Some(())
    }

    /// Whether every exponent is zero.
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

const LENGTH: Dimension = Dimension([1, 0, 0, 0, 0]);
const AREA: Dimension = Dimension([2, 0, 0, 0, 0]);
const TIME: Dimension = Dimension([0, 1, 0, 0, 0]);
const FREQUENCY: Dimension = Dimension([0, -1, 0, 0, 0]);
const MASS: Dimension = Dimension([0, 0, 1, 0, 0]);
const TEMPERATURE: Dimension = Dimension([0, 0, 0, 1, 0]);
const ANGLE: Dimension = Dimension([0, 0, 0, 0, 1]);
const ENERGY: Dimension = Dimension([2, -2, 1, 0, 0]);

const ELECTRON_VOLT: f64 = 1.602_176_634e-19;

/// Known unit symbols with their SI scale and dimension.
static UNIT_TABLE: &[(&str, f64, Dimension)] = &[
    ("1", 1.0, Dimension::NONE),
    ("dimensionless", 1.0, Dimension::NONE),
    ("percent", 1e-2, Dimension::NONE),
    ("%", 1e-2, Dimension::NONE),
    ("m", 1.0, LENGTH),
    ("km", 1e3, LENGTH),
    ("cm", 1e-2, LENGTH),
    ("mm", 1e-3, LENGTH),
    ("um", 1e-6, LENGTH),
    ("micrometer", 1e-6, LENGTH),
    ("nm", 1e-9, LENGTH),
    ("pm", 1e-12, LENGTH),
    ("angstrom", 1e-10, LENGTH),
    ("ang", 1e-10, LENGTH),
    ("Å", 1e-10, LENGTH),
    ("barn", 1e-28, AREA),
    ("s", 1.0, TIME),
    ("ms", 1e-3, TIME),
    ("us", 1e-6, TIME),
    ("ns", 1e-9, TIME),
    ("ps", 1e-12, TIME),
    ("min", 60.0, TIME),
    ("h", 3600.0, TIME),
    ("Hz", 1.0, FREQUENCY),
    ("kHz", 1e3, FREQUENCY),
    ("MHz", 1e6, FREQUENCY),
    ("kg", 1.0, MASS),
    ("g", 1e-3, MASS),
    ("mg", 1e-6, MASS),
    ("K", 1.0, TEMPERATURE),
    ("mK", 1e-3, TEMPERATURE),
    ("rad", 1.0, ANGLE),
    ("mrad", 1e-3, ANGLE),
    ("deg", std::f64::consts::PI / 180.0, ANGLE),
    ("degree", std::f64::consts::PI / 180.0, ANGLE),
    ("J", 1.0, ENERGY),
    ("eV", ELECTRON_VOLT, ENERGY),
    ("meV", ELECTRON_VOLT * 1e-3, ENERGY),
    ("keV", ELECTRON_VOLT * 1e3, ENERGY),
];

fn lookup(symbol: &str) -> Option<(f64, Dimension)> {
    UNIT_TABLE
        .iter()
        .find(|(s, _, _)| *s == symbol)
        .map(|(_, scale, dim)| (*scale, *dim))
}

/// A parsed unit expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Unit {
    symbol: String,
    scale: f64,
    dimension: Dimension,
}

impl Default for Unit {
    fn default() -> Self {
        Self::dimensionless()
    }
}

impl Unit {
    /// The unit of a pure number.
    pub fn dimensionless() -> Self {
        Self {
            symbol: "dimensionless".to_string(),
            scale: 1.0,
            dimension: Dimension::NONE,
        }
    }

    /// Parse a unit expression
    ///
    /// # Arguments
    ///
    /// * `text` - Expression of known symbols joined by `*` and `/`, each
    ///   optionally raised to an integer power with `^` or `**`
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::variables::units::Unit;
    ///
    /// let speed = Unit::parse("km/h").unwrap();
    /// let si = Unit::parse("m/s").unwrap();
    /// assert!((speed.factor_to(&si).unwrap() - 1.0 / 3.6).abs() < 1e-12);
    /// assert!(Unit::parse("").unwrap().is_dimensionless());
    /// ```
    pub fn parse(text: &str) -> Result<Self, UnitError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::dimensionless());
        }

        let invalid = || UnitError::Parse {
            text: text.to_string(),
        };
        let factors = match expression(trimmed) {
            Ok((rest, factors)) if rest.trim().is_empty() => factors,
            _ => return Err(invalid()),
        };

        let mut scale = 1.0;
        let mut dimension = Dimension::NONE;
        for (symbol, power) in factors {
            let (factor, dim) = lookup(symbol).ok_or_else(|| UnitError::UnknownUnit {
                symbol: symbol.to_string(),
            })?;
            scale *= factor.powi(power);
            dimension.add_scaled(&dim, power).ok_or_else(invalid)?;
        }

        Ok(Self {
            symbol: trimmed.to_string(),
            scale,
            dimension,
        })
    }

    /// The expression this unit was parsed from.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Scale factor relative to SI.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Whether the unit carries no physical dimension.
    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_none()
    }

    /// Whether a magnitude in `self` can be expressed in `other`.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    /// Factor converting a magnitude in `self` into a magnitude in `other`.
    pub fn factor_to(&self, other: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible(other) {
            return Err(UnitError::Incompatible {
                from: self.symbol.clone(),
                to: other.symbol.clone(),
            });
        }
        Ok(self.scale / other.scale)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

impl TryFrom<String> for Unit {
    type Error = UnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Unit::parse(&value)
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.symbol
    }
}

/// A magnitude paired with its unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub magnitude: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Express the quantity in another unit.
    pub fn to(&self, unit: &Unit) -> Result<Quantity, UnitError> {
        let factor = self.unit.factor_to(unit)?;
        Ok(Quantity::new(self.magnitude * factor, unit.clone()))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_dimensionless() && self.unit.scale() == 1.0 {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit)
        }
    }
}

// Parser functions using nom

fn is_unit_char(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '%'
}

fn ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

fn atom(input: &str) -> IResult<&str, &str> {
    alt((tag("1"), take_while1(is_unit_char))).parse(input)
}

fn power_marker(input: &str) -> IResult<&str, &str> {
    alt((tag("**"), tag("^"))).parse(input)
}

/// Exponents are bounded by the `i8` dimension storage.
fn signed_power(input: &str) -> IResult<&str, i32> {
    nom::combinator::map(nom::character::complete::i8, i32::from).parse(input)
}

fn product_op(input: &str) -> IResult<&str, char> {
    alt((char('*'), char('/'))).parse(input)
}

/// Parse `^n` / `**n` after a symbol
fn exponent(input: &str) -> IResult<&str, i32> {
    let (input, _) = ws(input)?;
    let (input, _) = power_marker(input)?;
    let (input, _) = ws(input)?;
    signed_power(input)
}

/// Parse one symbol with its optional power
fn term(input: &str) -> IResult<&str, (&str, i32)> {
    let (input, _) = ws(input)?;
    let (input, symbol) = atom(input)?;
    let (input, power) = opt(exponent).parse(input)?;
    Ok((input, (symbol, power.unwrap_or(1))))
}

/// Parse a product/quotient of terms, left to right
fn expression(input: &str) -> IResult<&str, Vec<(&str, i32)>> {
    let (mut input, first) = term(input)?;
    let mut factors = vec![first];
    loop {
        let (rest, _) = ws(input)?;
        match product_op(rest) {
            Ok((rest, op)) => {
                let (rest, (symbol, power)) = term(rest)?;
                factors.push((symbol, if op == '/' { -power } else { power }));
                input = rest;
            }
            Err(_) => return Ok((rest, factors)),
        }
    }
}
