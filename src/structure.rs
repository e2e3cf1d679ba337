//! Structural elements: the root, containers, shapes and `<use>`.

use crate::document::Document;
use crate::element::{borrow_data_as_mut, ObjectClass};
use crate::flags::ObjectFlags;
use crate::href::RefSlot;
use crate::object::ObjectId;
use crate::xml::ReprNode;

/// Container hooks for the kinds that redraw when their children change.
macro_rules! display_container_hooks {
    () => {
        fn child_added(
            &self,
            doc: &mut Document,
            obj: ObjectId,
            child: &ReprNode,
            prev: Option<&ReprNode>,
        ) {
            doc.build_child(obj, child, prev);
            doc.request_display_update(obj, ObjectFlags::MODIFIED);
        }

        fn remove_child(&self, doc: &mut Document, obj: ObjectId, child: &ReprNode) {
            doc.remove_child_object(obj, child);
            doc.request_display_update(obj, ObjectFlags::MODIFIED);
        }

        fn order_changed(
            &self,
            doc: &mut Document,
            obj: ObjectId,
            child: &ReprNode,
            _old_prev: Option<&ReprNode>,
            new_prev: Option<&ReprNode>,
        ) {
            doc.reorder_child_object(obj, child, new_prev);
            doc.request_display_update(obj, ObjectFlags::MODIFIED);
        }
    };
}

/// Container hooks for the kinds whose children are resources.
macro_rules! resource_container_hooks {
    () => {
        fn child_added(
            &self,
            doc: &mut Document,
            obj: ObjectId,
            child: &ReprNode,
            prev: Option<&ReprNode>,
        ) {
            doc.build_child(obj, child, prev);
            doc.request_modified(obj, ObjectFlags::MODIFIED);
        }

        fn remove_child(&self, doc: &mut Document, obj: ObjectId, child: &ReprNode) {
            doc.remove_child_object(obj, child);
            doc.request_modified(obj, ObjectFlags::MODIFIED);
        }

        fn order_changed(
            &self,
            doc: &mut Document,
            obj: ObjectId,
            child: &ReprNode,
            _old_prev: Option<&ReprNode>,
            new_prev: Option<&ReprNode>,
        ) {
            doc.reorder_child_object(obj, child, new_prev);
            doc.request_modified(obj, ObjectFlags::MODIFIED);
        }
    };
}

pub(crate) use resource_container_hooks;

/// The `<svg>` element at the top of the document.
pub struct Root;

impl ObjectClass for Root {
    display_container_hooks!();
}

pub struct Defs;

impl ObjectClass for Defs {
    resource_container_hooks!();
}

/// `<g>` and the other elements that just group their children.
pub struct Group;

impl ObjectClass for Group {
    display_container_hooks!();
}

pub struct Shape;

impl ObjectClass for Shape {}

pub struct Pattern;

impl ObjectClass for Pattern {
    fn build(&self, doc: &mut Document, obj: ObjectId) {
        doc.read_attr(obj, "xlink:href");
    }

    fn set(&self, doc: &mut Document, obj: ObjectId, key: &str, _value: Option<&str>) {
        if is_href(key) {
            let id = doc.href_id(obj);
            doc.set_reference(obj, RefSlot::Href, id.as_deref());
            doc.request_modified(obj, ObjectFlags::MODIFIED);
        }
    }

    resource_container_hooks!();
}

pub struct Filter;

impl ObjectClass for Filter {
    resource_container_hooks!();
}

/// `<style>`; never collected as an orphan.
pub struct StyleElem;

impl ObjectClass for StyleElem {}

/// `<script>`; never collected as an orphan.
pub struct Script;

impl ObjectClass for Script {}

/// `<color-profile>`; never collected as an orphan.
pub struct ColorProfile;

impl ObjectClass for ColorProfile {}

/// `<inkscape:clipboard>`, which carries the style of copied objects.
pub struct Clipboard;

impl ObjectClass for Clipboard {}

pub struct Generic;

impl ObjectClass for Generic {}

pub(crate) fn is_href(key: &str) -> bool {
    key == "xlink:href" || key == "href"
}

/// State of a `<use>` element.
#[derive(Debug, Default)]
pub struct UseData {
    child: Option<ObjectId>,
}

impl UseData {
    /// The clone of the referenced object, if the reference resolved.
    pub fn clone_child(&self) -> Option<ObjectId> {
        self.child
    }
}

/// `<use>`: shows a clone of the object it references.
///
/// The clone is a child object built from the referenced object's repr, marked as
/// cloned so that it never touches the id index or the repr index.
pub struct Use;

impl ObjectClass for Use {
    fn build(&self, doc: &mut Document, obj: ObjectId) {
        doc.read_attr(obj, "xlink:href");
    }

    fn release(&self, doc: &mut Document, obj: ObjectId) {
        drop_clone(doc, obj);
    }

    fn set(&self, doc: &mut Document, obj: ObjectId, key: &str, _value: Option<&str>) {
        if is_href(key) {
            let id = doc.href_id(obj);
            doc.set_reference(obj, RefSlot::Href, id.as_deref());
        }
    }

    fn reference_changed(&self, doc: &mut Document, obj: ObjectId, slot: RefSlot) {
        if slot != RefSlot::Href {
            return;
        }

        drop_clone(doc, obj);

        let target_repr = doc
            .reference_target(obj, RefSlot::Href)
            .and_then(|t| doc.object(t).repr().cloned());

        if let Some(repr) = target_repr {
            if let Some(clone) = doc.new_object_for_repr(&repr) {
                let last = doc.object(obj).last_child();
                doc.attach(obj, clone, last);
                doc.unref_object(clone);
                borrow_data_as_mut!(doc, obj, Use).child = Some(clone);
                doc.invoke_build(clone, &repr, true);
            }
        }

        doc.request_display_update(obj, ObjectFlags::MODIFIED);
    }
}

fn drop_clone(doc: &mut Document, obj: ObjectId) {
    if let Some(child) = borrow_data_as_mut!(doc, obj, Use).child.take() {
        if doc.try_object(child).and_then(|c| c.parent()) == Some(obj) {
            doc.detach(obj, child);
        }
    }
}
