//! Store XML element attributes and their values.

use std::slice;

/// Ordered attribute list of an element.
///
/// Attributes are kept in insertion order, which is also the order in which a
/// serializer would write them out.  Elements rarely have more than a dozen
/// attributes, so lookups are linear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    attrs: Vec<(String, String)>,
}

/// Iterator from `Attributes.iter`.
pub struct AttributesIter<'a>(slice::Iter<'a, (String, String)>);

impl Attributes {
    pub fn new() -> Attributes {
        Attributes::default()
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets or removes an attribute, returning the previous value.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> Option<String> {
        let pos = self.attrs.iter().position(|(n, _)| n == name);

        match (pos, value) {
            (Some(i), Some(v)) => Some(std::mem::replace(&mut self.attrs[i].1, v.to_string())),
            (Some(i), None) => Some(self.attrs.remove(i).1),
            (None, Some(v)) => {
                self.attrs.push((name.to_string(), v.to_string()));
                None
            }
            (None, None) => None,
        }
    }

    /// Creates an iterator that yields `(&str, &str)` tuples.
    pub fn iter(&self) -> AttributesIter<'_> {
        AttributesIter(self.attrs.iter())
    }
}

impl<'a> Iterator for AttributesIter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (n, v) in iter {
            attrs.set(n, Some(v));
        }
        attrs
    }
}
