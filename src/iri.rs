//! CSS funciri values.

use cssparser::{Parser, ParserInput};

use crate::error::*;
use crate::parsers::Parse;

/// Used where style properties take a funciri or "none"
///
/// Only references into the same document are understood; `url(other.svg#id)` fails
/// to parse and is treated by callers as "no such reference".
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Iri {
    #[default]
    None,
    Resource(String),
}

impl Iri {
    /// Returns the fragment id of an `Iri::Resource`, or `None`
    pub fn get(&self) -> Option<&str> {
        match *self {
            Iri::None => None,
            Iri::Resource(ref id) => Some(id),
        }
    }
}

impl Parse for Iri {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Iri, ParseError<'i>> {
        if parser
            .try_parse(|i| i.expect_ident_matching("none"))
            .is_ok()
        {
            Ok(Iri::None)
        } else {
            let loc = parser.current_source_location();
            let url = parser.expect_url()?;

            match url.strip_prefix('#') {
                Some(id) if !id.is_empty() => Ok(Iri::Resource(id.to_string())),
                _ => Err(loc.new_custom_error(ValueErrorKind::value_error(
                    "only fragment references are supported",
                ))),
            }
        }
    }
}

/// Extracts the id from a value that starts with `url(#id)`.
///
/// Anything after the url is ignored, so paint values with a fallback color like
/// `url(#grad) red` still yield `grad`.
pub fn url_fragment(value: &str) -> Option<String> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);

    match Iri::parse(&mut parser) {
        Ok(Iri::Resource(id)) => Some(id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_none() {
        assert_eq!(Iri::parse_str("none").unwrap(), Iri::None);
    }

    #[test]
    fn parses_url() {
        assert_eq!(
            Iri::parse_str("url(#bar)").unwrap(),
            Iri::Resource("bar".to_string())
        );

        // be permissive if the closing ) is missing
        assert_eq!(
            Iri::parse_str("url(#bar").unwrap(),
            Iri::Resource("bar".to_string())
        );

        assert!(Iri::parse_str("").is_err());
        assert!(Iri::parse_str("foo").is_err());
        assert!(Iri::parse_str("url(foo#bar)").is_err());
        assert!(Iri::parse_str("url(#foo)bar").is_err());
    }

    #[test]
    fn extracts_fragment_with_fallback() {
        assert_eq!(url_fragment("url(#grad) red"), Some("grad".to_string()));
        assert_eq!(url_fragment("  url( '#grad' )"), Some("grad".to_string()));
        assert_eq!(url_fragment("red"), None);
        assert_eq!(url_fragment("none"), None);
    }
}
