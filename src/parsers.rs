//! The `Parse` trait for attribute values, and utilities for parsers.

use cssparser::{Parser, ParserInput};

use crate::error::*;

/// Trait to parse values using `cssparser::Parser`.
pub trait Parse: Sized {
    /// Parses a value out of the `parser`.
    ///
    /// All value types should implement this for composability.
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>>;

    /// Convenience function to parse a value out of a `&str`.
    ///
    /// The whole string must be consumed by the value.
    fn parse_str(s: &str) -> Result<Self, ParseError<'_>> {
        let mut input = ParserInput::new(s);
        let mut parser = Parser::new(&mut input);

        let res = Self::parse(&mut parser)?;
        parser.expect_exhausted()?;

        Ok(res)
    }
}

/// Parses an attribute value entirely, turning errors into a long-lived value.
pub fn parse_attribute<T: Parse>(value: &str) -> Result<T, ValueErrorKind> {
    T::parse_str(value).map_err(ValueErrorKind::from)
}

impl Parse for f64 {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        let loc = parser.current_source_location();
        let n = parser.expect_number()?;
        if n.is_finite() {
            Ok(f64::from(n))
        } else {
            Err(loc.new_custom_error(ValueErrorKind::value_error("expected finite number")))
        }
    }
}

/// A number or percentage clamped to `[0.0, 1.0]`, as used by stop offsets.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct UnitInterval(pub f64);

impl Parse for UnitInterval {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        let value = parser
            .try_parse(|p| p.expect_percentage())
            .map(f64::from)
            .or_else(|_| Parse::parse(parser))?;

        Ok(UnitInterval(value.clamp(0.0, 1.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_number() {
        assert_eq!(f64::parse_str("1.5").unwrap(), 1.5);
        assert!(f64::parse_str("").is_err());
        assert!(f64::parse_str("1.5 2").is_err());
    }

    #[test]
    fn parses_unit_interval() {
        assert_eq!(UnitInterval::parse_str("0.25").unwrap(), UnitInterval(0.25));
        assert_eq!(UnitInterval::parse_str("50%").unwrap(), UnitInterval(0.5));
        assert_eq!(UnitInterval::parse_str("-3").unwrap(), UnitInterval(0.0));
        assert_eq!(UnitInterval::parse_str("130%").unwrap(), UnitInterval(1.0));
        assert!(UnitInterval::parse_str("foo").is_err());
    }

    #[test]
    fn attribute_errors_outlive_input() {
        let err = {
            let s = String::from("bogus");
            parse_attribute::<f64>(&s).unwrap_err()
        };
        assert!(matches!(err, ValueErrorKind::Parse(_)));
    }
}
