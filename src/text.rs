//! Text nodes, `<title>` and `<desc>`.

use crate::document::Document;
use crate::element::{borrow_data_as, borrow_data_as_mut, ObjectClass, ObjectKind};
use crate::flags::WriteFlags;
use crate::object::ObjectId;
use crate::xml::{self, ReprNode};

/// Content of a text node.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StringData {
    pub text: String,
}

/// Object for a text repr node.
pub struct StringNode;

impl ObjectClass for StringNode {
    fn build(&self, doc: &mut Document, obj: ObjectId) {
        read_string(doc, obj);
    }

    fn read_content(&self, doc: &mut Document, obj: ObjectId) {
        read_string(doc, obj);
    }

    fn write(&self, doc: &mut Document, obj: ObjectId, repr: &ReprNode, _flags: WriteFlags) {
        let text = borrow_data_as!(doc, obj, String).text.clone();
        if xml::content(repr).as_deref() != Some(text.as_str()) {
            xml::set_content(repr, &text, doc);
        }
    }
}

fn read_string(doc: &mut Document, obj: ObjectId) {
    let text = doc
        .object(obj)
        .repr()
        .and_then(xml::content)
        .unwrap_or_default();

    borrow_data_as_mut!(doc, obj, String).text = text;
}

pub struct Title;

impl ObjectClass for Title {}

pub struct Desc;

impl ObjectClass for Desc {}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| matches!(c, '\r' | '\n' | ' ' | '\t'))
}

impl Document {
    /// Text of the first `<title>` child of `obj`.
    pub fn title(&self, obj: ObjectId) -> Option<String> {
        self.title_or_desc(obj, ObjectKind::Title)
    }

    /// Text of the first `<desc>` child of `obj`.
    pub fn desc(&self, obj: ObjectId) -> Option<String> {
        self.title_or_desc(obj, ObjectKind::Desc)
    }

    /// Sets the title of `obj`, creating a `<title>` child if needed, or removes all
    /// of them if `value` is `None`.  Returns whether anything changed.
    ///
    /// Unless `verbatim` is set, a value made only of whitespace counts as `None`
    /// and setting the current value again does nothing.
    pub fn set_title(&mut self, obj: ObjectId, value: Option<&str>, verbatim: bool) -> bool {
        self.set_title_or_desc(obj, value, ObjectKind::Title, "svg:title", verbatim)
    }

    /// Like [`Document::set_title`], for `<desc>`.
    pub fn set_desc(&mut self, obj: ObjectId, value: Option<&str>, verbatim: bool) -> bool {
        self.set_title_or_desc(obj, value, ObjectKind::Desc, "svg:desc", verbatim)
    }

    /// Concatenated text of all the text nodes below `obj`, in document order.
    pub fn textual_content(&self, obj: ObjectId) -> String {
        let mut text = String::new();
        self.collect_text(obj, &mut text);
        text
    }

    fn collect_text(&self, obj: ObjectId, text: &mut String) {
        if self.object(obj).kind() == ObjectKind::String {
            text.push_str(&borrow_data_as!(self, obj, String).text);
        }

        for &child in self.object(obj).children() {
            self.collect_text(child, text);
        }
    }

    fn find_first_child(&self, obj: ObjectId, kind: ObjectKind) -> Option<ObjectId> {
        self.object(obj)
            .children()
            .iter()
            .copied()
            .find(|&c| self.object(c).kind() == kind)
    }

    fn title_or_desc(&self, obj: ObjectId, kind: ObjectKind) -> Option<String> {
        self.find_first_child(obj, kind)
            .map(|elem| self.textual_content(elem))
    }

    fn set_title_or_desc(
        &mut self,
        obj: ObjectId,
        value: Option<&str>,
        kind: ObjectKind,
        element_name: &str,
        verbatim: bool,
    ) -> bool {
        let mut value = value;

        if !verbatim {
            value = value.filter(|v| !is_blank(v));

            if let Some(v) = value {
                if self.title_or_desc(obj, kind).as_deref() == Some(v) {
                    return false;
                }
            }
        }

        let value = match value {
            Some(v) => v,
            None => {
                let mut found = false;
                while let Some(elem) = self.find_first_child(obj, kind) {
                    self.delete_object(elem, true, true);
                    found = true;
                }
                return found;
            }
        };

        let repr = match self.object(obj).repr().cloned() {
            Some(r) => r,
            None => return false,
        };

        let elem = match self.find_first_child(obj, kind) {
            Some(elem) => {
                while let Some(child) = self.object(elem).first_child() {
                    self.delete_object(child, true, true);
                }
                Some(elem)
            }

            None => {
                let new_repr = xml::new_element(element_name);
                xml::add_child(&repr, &new_repr, None, self);
                self.object_by_repr(&new_repr)
            }
        };

        match elem {
            Some(elem) => {
                self.append_child_repr(elem, xml::new_text(value));
                true
            }

            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::xml::NullObserver;

    fn doc() -> (Document, ObjectId) {
        let root = xml::new_element("svg:svg");
        xml::append_child(&root, &xml::element("svg:rect", &[("id", "r")]), &mut NullObserver);
        let doc = Document::with_session(root, Session::with_seed(9));
        let r = doc.object_by_id("r").unwrap();
        (doc, r)
    }

    #[test]
    fn sets_and_replaces_title() {
        let (mut doc, r) = doc();

        assert_eq!(doc.title(r), None);
        assert!(doc.set_title(r, Some("Hello"), false));
        assert_eq!(doc.title(r).as_deref(), Some("Hello"));

        assert!(!doc.set_title(r, Some("Hello"), false));
        assert!(doc.set_title(r, Some("Bye"), false));
        assert_eq!(doc.title(r).as_deref(), Some("Bye"));

        let titles = doc
            .object(r)
            .children()
            .iter()
            .filter(|&&c| doc.object(c).kind() == ObjectKind::Title)
            .count();
        assert_eq!(titles, 1);
    }

    #[test]
    fn title_goes_first() {
        let (mut doc, r) = doc();
        assert!(doc.set_desc(r, Some("below"), false));
        assert!(doc.set_title(r, Some("above"), false));

        let first = doc.object(r).first_child().unwrap();
        assert_eq!(doc.object(first).kind(), ObjectKind::Title);
        assert_eq!(doc.desc(r).as_deref(), Some("below"));
    }

    #[test]
    fn blank_title_removes() {
        let (mut doc, r) = doc();
        assert!(!doc.set_title(r, Some("  \n\t "), false));
        assert!(doc.object(r).children().is_empty());

        assert!(doc.set_title(r, Some("x"), false));
        assert!(doc.set_title(r, Some(" "), false));
        assert_eq!(doc.title(r), None);
        assert!(!doc.set_title(r, None, false));
    }

    #[test]
    fn verbatim_keeps_whitespace() {
        let (mut doc, r) = doc();
        assert!(doc.set_title(r, Some("  "), true));
        assert_eq!(doc.title(r).as_deref(), Some("  "));
    }

    #[test]
    fn text_follows_content_changes() {
        let (mut doc, r) = doc();
        doc.set_desc(r, Some("one"), false);

        let desc = doc.object(r).first_child().unwrap();
        let text = doc.object(desc).first_child().unwrap();
        let text_repr = doc.object(text).repr().cloned().unwrap();

        xml::set_content(&text_repr, "two", &mut doc);
        assert_eq!(doc.desc(r).as_deref(), Some("two"));
    }
}
