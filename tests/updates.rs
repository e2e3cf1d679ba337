//! Dirty flags and the update and modified passes.

use std::cell::RefCell;
use std::rc::Rc;

use spobject::xml::{self, NullObserver};
use spobject::{Document, ObjectFlags, Session, WriteFlags};

fn doc() -> Document {
    let root = xml::new_element("svg:svg");
    let g = xml::element("svg:g", &[("id", "g")]);
    xml::append_child(&g, &xml::element("svg:rect", &[("id", "r")]), &mut NullObserver);
    xml::append_child(&root, &g, &mut NullObserver);

    let mut doc = Document::with_session(root, Session::with_seed(4));
    assert!(doc.ensure_up_to_date().is_clean());
    doc
}

#[test]
fn propagation_happens_once_per_transition() {
    let mut doc = doc();
    let g = doc.object_by_id("g").unwrap();
    let r = doc.object_by_id("r").unwrap();
    let before = doc.modified_request_count();

    doc.request_display_update(r, ObjectFlags::MODIFIED);
    doc.request_display_update(r, ObjectFlags::MODIFIED);

    assert_eq!(doc.object(g).uflags(), ObjectFlags::CHILD_MODIFIED);
    assert_eq!(doc.modified_request_count(), before + 1);

    // a sibling change does not reach the root again either
    doc.request_display_update(g, ObjectFlags::MODIFIED);
    assert_eq!(doc.modified_request_count(), before + 1);

    doc.ensure_up_to_date();
    doc.request_display_update(r, ObjectFlags::MODIFIED);
    assert_eq!(doc.modified_request_count(), before + 2);
}

#[test]
fn attribute_changes_notify_observers() {
    let mut doc = doc();
    let r = doc.object_by_id("r").unwrap();
    let root = doc.root();

    let seen = Rc::new(RefCell::new(Vec::new()));
    for obj in [r, root] {
        let s = seen.clone();
        doc.connect_modified(obj, move |_, o, _| s.borrow_mut().push(o));
    }

    doc.set_attribute(r, "fill", Some("red"));
    assert!(doc.update_requested());
    assert!(seen.borrow().is_empty());

    doc.ensure_up_to_date();
    assert_eq!(*seen.borrow(), vec![r, root]);
    assert_eq!(doc.object(r).style().unwrap().computed("fill"), Some("red"));
}

#[test]
fn disconnected_handlers_stay_quiet() {
    let mut doc = doc();
    let r = doc.object_by_id("r").unwrap();

    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    let handler = doc.connect_modified(r, move |_, _, _| *c.borrow_mut() += 1);

    doc.request_modified(r, ObjectFlags::MODIFIED);
    doc.ensure_up_to_date();
    assert_eq!(*count.borrow(), 1);

    assert!(doc.disconnect(r, handler));
    doc.request_modified(r, ObjectFlags::MODIFIED);
    doc.ensure_up_to_date();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn writes_state_back() {
    let mut doc = doc();
    let r = doc.object_by_id("r").unwrap();

    doc.set_label(r, Some("Box"));
    doc.set_attribute(r, "xml:space", Some("preserve"));

    let repr = doc.update_repr(r, WriteFlags::EXT).unwrap();
    assert_eq!(xml::attribute(&repr, "id").as_deref(), Some("r"));
    assert_eq!(xml::attribute(&repr, "inkscape:label").as_deref(), Some("Box"));
    assert_eq!(xml::attribute(&repr, "xml:space").as_deref(), Some("preserve"));
    assert_eq!(xml::attribute(&repr, "inkscape:collect"), None);
}
