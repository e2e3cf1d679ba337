//! Lengths as they appear in gradient geometry attributes.

use std::fmt;

use cssparser::{Parser, Token};
use float_cmp::approx_eq;

use crate::error::*;
use crate::parsers::Parse;

/// Units for a [`Length`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LengthUnit {
    /// A plain number; user units in most contexts.
    Number,
    /// Stored as a fraction, so `50%` is `0.5`.
    Percent,
    Px,
    Em,
    Ex,
    In,
    Cm,
    Mm,
    Pt,
    Pc,
}

#[derive(Debug, Copy, Clone)]
pub struct Length {
    pub length: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub fn new(length: f64, unit: LengthUnit) -> Length {
        Length { length, unit }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            LengthUnit::Number => "",
            LengthUnit::Percent => return write!(f, "{}%", self.length * 100.0),
            LengthUnit::Px => "px",
            LengthUnit::Em => "em",
            LengthUnit::Ex => "ex",
            LengthUnit::In => "in",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
            LengthUnit::Pt => "pt",
            LengthUnit::Pc => "pc",
        };

        write!(f, "{}{}", self.length, unit)
    }
}

impl PartialEq for Length {
    fn eq(&self, other: &Length) -> bool {
        self.unit == other.unit && approx_eq!(f64, self.length, other.length, ulps = 4)
    }
}

impl Parse for Length {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Length, ParseError<'i>> {
        let loc = parser.current_source_location();
        let token = parser.next()?.clone();

        let length = match token {
            Token::Number { value, .. } => Length::new(f64::from(value), LengthUnit::Number),

            Token::Percentage { unit_value, .. } => {
                Length::new(f64::from(unit_value), LengthUnit::Percent)
            }

            Token::Dimension {
                value, ref unit, ..
            } => {
                let value = f64::from(value);

                let unit = match unit.to_ascii_lowercase().as_str() {
                    "px" => LengthUnit::Px,
                    "em" => LengthUnit::Em,
                    "ex" => LengthUnit::Ex,
                    "in" => LengthUnit::In,
                    "cm" => LengthUnit::Cm,
                    "mm" => LengthUnit::Mm,
                    "pt" => LengthUnit::Pt,
                    "pc" => LengthUnit::Pc,
                    _ => return Err(loc.new_unexpected_token_error(token.clone())),
                };

                Length::new(value, unit)
            }

            _ => return Err(loc.new_unexpected_token_error(token)),
        };

        if length.length.is_finite() {
            Ok(length)
        } else {
            Err(loc.new_custom_error(ValueErrorKind::value_error("expected finite length")))
        }
    }
}
