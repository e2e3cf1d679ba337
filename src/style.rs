//! The cascading style record carried by every object.
//!
//! A [`Style`] is built from two sources on the object's repr: the declarations of the
//! `style` attribute and presentation attributes named like known properties (a
//! `fill="red"` attribute, say).  A declaration in `style` wins over a presentation
//! attribute.  Computed values are produced by [`Style::merge_from_parent`], which the
//! update pass runs when a parent's style changes.

use std::collections::HashMap;

use crate::css::{self, Declaration};
use crate::iri;
use crate::xml::{self, ReprNode};

/// Properties the object model knows about, and whether they are inherited.
static PROPERTIES: &[(&str, bool)] = &[
    ("clip-path", false),
    ("color", true),
    ("display", false),
    ("fill", true),
    ("fill-opacity", true),
    ("filter", false),
    ("font-family", true),
    ("font-size", true),
    ("marker-end", true),
    ("marker-mid", true),
    ("marker-start", true),
    ("mask", false),
    ("opacity", false),
    ("stop-color", false),
    ("stop-opacity", false),
    ("stroke", true),
    ("stroke-opacity", true),
    ("stroke-width", true),
    ("visibility", true),
];

/// Whether `name` is a property that may also be given as a presentation attribute.
pub fn is_property(name: &str) -> bool {
    PROPERTIES.iter().any(|(n, _)| *n == name)
}

/// Whether a property's value passes to children that don't specify it.
pub fn is_inherited(name: &str) -> bool {
    PROPERTIES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, inherited)| *inherited)
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    declarations: Vec<Declaration>,
    presentation: Vec<(String, String)>,
    computed: HashMap<String, String>,
}

impl Style {
    /// Reads the specified values from `repr`.  Computed values start out as the
    /// object's own values until the style is merged with its parent's.
    pub fn from_repr(repr: &ReprNode) -> Style {
        let attributes = xml::attributes(repr);

        let declarations = attributes
            .get("style")
            .map(css::parse_declarations)
            .unwrap_or_default();

        let presentation = attributes
            .iter()
            .filter(|(name, _)| is_property(name))
            .map(|(name, value)| (name.to_string(), value.trim().to_string()))
            .collect();

        let mut style = Style {
            declarations,
            presentation,
            computed: HashMap::new(),
        };
        style.merge_from_parent(None);
        style
    }

    /// Declarations from the `style` attribute, in document order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// The object's own value for `name`, `inherit` included.
    fn own_value(&self, name: &str) -> Option<&str> {
        css::find_declaration(&self.declarations, name)
            .map(|d| d.value.as_str())
            .or_else(|| {
                self.presentation
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| v.as_str())
            })
    }

    /// The object's own value for `name`, unless it is `inherit`.
    pub fn specified(&self, name: &str) -> Option<&str> {
        self.own_value(name).filter(|v| *v != "inherit")
    }

    pub fn computed(&self, name: &str) -> Option<&str> {
        self.computed.get(name).map(String::as_str)
    }

    /// Recomputes values from the object's own values and its parent's computed ones.
    pub fn merge_from_parent(&mut self, parent: Option<&Style>) {
        let mut computed = HashMap::new();

        for (name, inherited) in PROPERTIES.iter().copied() {
            let value = match self.own_value(name) {
                Some(v) if v != "inherit" => Some(v),
                Some(_) => parent.and_then(|p| p.computed(name)),
                None if inherited => parent.and_then(|p| p.computed(name)),
                None => None,
            };

            if let Some(v) = value {
                computed.insert(name.to_string(), v.to_string());
            }
        }

        // properties we don't know about are never inherited
        for d in &self.declarations {
            if !is_property(&d.name) && d.value != "inherit" {
                computed.insert(d.name.clone(), d.value.clone());
            }
        }

        self.computed = computed;
    }

    /// The id that property `name` references with `url(#id)`, if any.
    pub fn url_reference(&self, name: &str) -> Option<String> {
        self.specified(name).and_then(iri::url_fragment)
    }

    /// Serializes the `style` attribute declarations.
    pub fn to_style_string(&self) -> String {
        css::write_declarations(&self.declarations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_of(attrs: &[(&str, &str)]) -> Style {
        Style::from_repr(&xml::element("svg:rect", attrs))
    }

    #[test]
    fn style_attribute_beats_presentation_attribute() {
        let s = style_of(&[("fill", "blue"), ("style", "fill: red")]);
        assert_eq!(s.specified("fill"), Some("red"));

        let s = style_of(&[("fill", "blue"), ("style", "stroke: red")]);
        assert_eq!(s.specified("fill"), Some("blue"));
        assert_eq!(s.specified("opacity"), None);
    }

    #[test]
    fn inherit_is_not_a_specified_value() {
        let s = style_of(&[("style", "fill: inherit")]);
        assert_eq!(s.specified("fill"), None);
    }

    #[test]
    fn merges_inherited_properties() {
        let parent = style_of(&[("style", "fill: red; opacity: 0.5; stroke: blue")]);
        let mut child = style_of(&[("stroke", "green"), ("style", "opacity: inherit")]);
        child.merge_from_parent(Some(&parent));

        assert_eq!(child.computed("fill"), Some("red"));
        assert_eq!(child.computed("stroke"), Some("green"));
        // not inherited, but explicitly asked for
        assert_eq!(child.computed("opacity"), Some("0.5"));

        let mut other = style_of(&[]);
        other.merge_from_parent(Some(&parent));
        assert_eq!(other.computed("opacity"), None);
        assert!(is_inherited("fill"));
        assert!(!is_inherited("filter"));
    }

    #[test]
    fn finds_url_references() {
        let s = style_of(&[("style", "fill: url(#g) red"), ("marker-start", "url(#m)")]);
        assert_eq!(s.url_reference("fill"), Some("g".to_string()));
        assert_eq!(s.url_reference("marker-start"), Some("m".to_string()));
        assert_eq!(s.url_reference("stroke"), None);
    }
}
