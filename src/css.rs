//! Parsing and writing the declarations of a `style` attribute.
//!
//! Objects keep their declarations as strings; only the handful of properties that
//! the object model cares about (paint servers, markers, filters, stop colors) are
//! looked at more closely, elsewhere.

use cssparser::{
    parse_important, AtRuleParser, CowRcStr, DeclarationParser, Delimiter, Parser, ParserInput,
    ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
};
use itertools::Itertools;

use crate::error::*;

/// A parsed CSS declaration
///
/// For example, in the declaration `fill: green !important`, the `name` would be
/// `fill`, the `value` would be `green`, and `important` would be `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(name: &str, value: &str) -> Declaration {
        Declaration {
            name: name.to_string(),
            value: value.to_string(),
            important: false,
        }
    }
}

/// Dummy struct required to use `cssparser::RuleBodyParser`
///
/// It implements `cssparser::DeclarationParser`, which knows how to parse
/// the property/value pairs from a CSS declaration.
pub struct DeclParser;

impl<'i> DeclarationParser<'i> for DeclParser {
    type Declaration = Declaration;
    type Error = ValueErrorKind;

    /// Parses a CSS declaration like `name: input_value [!important]`
    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _declaration_start: &ParserState,
    ) -> Result<Declaration, cssparser::ParseError<'i, Self::Error>> {
        let value = input.parse_until_before(Delimiter::Bang, |i| {
            let start = i.position();
            while i.next().is_ok() {}
            Ok::<_, ParseError<'i>>(i.slice_from(start).trim().to_string())
        })?;

        if value.is_empty() {
            return Err(input.new_custom_error(ValueErrorKind::parse_error("empty value")));
        }

        let important = input.try_parse(parse_important).is_ok();

        Ok(Declaration {
            name: name.to_ascii_lowercase(),
            value,
            important,
        })
    }
}

// cssparser's RuleBodyParser requires this; we just use the dummy
// implementations from cssparser itself.
impl<'i> AtRuleParser<'i> for DeclParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ValueErrorKind;
}

/// We need this dummy implementation as well.
impl<'i> QualifiedRuleParser<'i> for DeclParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ValueErrorKind;
}

impl<'i> RuleBodyItemParser<'i, Declaration, ValueErrorKind> for DeclParser {
    /// We want to parse declarations.
    fn parse_declarations(&self) -> bool {
        true
    }

    /// We don't want to parse qualified rules though.
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Parses the contents of a `style` attribute, skipping invalid declarations.
pub fn parse_declarations(declarations: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(declarations);
    let mut parser = Parser::new(&mut input);

    RuleBodyParser::new(&mut parser, &mut DeclParser)
        .filter_map(|r| match r {
            Ok(decl) => Some(decl),
            Err((e, text)) => {
                tracing::debug!("invalid declaration {:?}; ignoring: {:?}", text, e);
                None
            }
        })
        .collect()
}

/// Finds the declaration that wins for `name`: the last one, unless an earlier one
/// is `!important` and the later one is not.
pub fn find_declaration<'a>(declarations: &'a [Declaration], name: &str) -> Option<&'a Declaration> {
    winning_index(declarations, name).map(|i| &declarations[i])
}

fn winning_index(declarations: &[Declaration], name: &str) -> Option<usize> {
    let mut winner: Option<usize> = None;

    for (i, d) in declarations.iter().enumerate().filter(|(_, d)| d.name == name) {
        match winner {
            Some(w) if declarations[w].important && !d.important => (),
            _ => winner = Some(i),
        }
    }

    winner
}

/// Serializes declarations the way Inkscape writes them, `name:value;name:value`.
pub fn write_declarations(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(|d| {
            if d.important {
                format!("{}:{} !important", d.name, d.value)
            } else {
                format!("{}:{}", d.name, d.value)
            }
        })
        .join(";")
}

/// Sets `name` to `value`, replacing the winning declaration or appending a new one.
pub fn set_declaration(declarations: &mut Vec<Declaration>, name: &str, value: &str) {
    match winning_index(declarations, name) {
        Some(i) => declarations[i].value = value.to_string(),
        None => declarations.push(Declaration::new(name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declarations() {
        let decls = parse_declarations("fill: url(#g) red; Stroke:blue !important;;opacity:0.5");

        assert_eq!(
            decls,
            vec![
                Declaration::new("fill", "url(#g) red"),
                Declaration {
                    name: "stroke".to_string(),
                    value: "blue".to_string(),
                    important: true,
                },
                Declaration::new("opacity", "0.5"),
            ]
        );
    }

    #[test]
    fn skips_invalid_declarations() {
        let decls = parse_declarations("fill:; :red; stroke: green");
        assert_eq!(decls, vec![Declaration::new("stroke", "green")]);
    }

    #[test]
    fn important_wins() {
        let decls = parse_declarations("fill: red !important; fill: blue; stroke: red; stroke: blue");
        assert_eq!(find_declaration(&decls, "fill").unwrap().value, "red");
        assert_eq!(find_declaration(&decls, "stroke").unwrap().value, "blue");
        assert!(find_declaration(&decls, "filter").is_none());
    }

    #[test]
    fn writes_declarations() {
        let mut decls = parse_declarations("fill: red; stroke: blue !important");
        set_declaration(&mut decls, "fill", "url(#g)");
        set_declaration(&mut decls, "filter", "url(#f)");

        assert_eq!(
            write_declarations(&decls),
            "fill:url(#g);stroke:blue !important;filter:url(#f)"
        );
    }
}
