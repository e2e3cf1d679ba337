//! Importing one document into another without id clashes.

use spobject::id_clash::{find_references, prevent_id_clashes, RefMap};
use spobject::xml::{self, NullObserver, ReprNode};
use spobject::{Document, ObjectId, ObjectKind, Session};

fn doc_with(children: Vec<ReprNode>, seed: u64) -> Document {
    let root = xml::new_element("svg:svg");
    for c in children {
        xml::append_child(&root, &c, &mut NullObserver);
    }
    Document::with_session(root, Session::with_seed(seed))
}

fn gradient(id: &str, color: &str) -> ReprNode {
    let g = xml::element("svg:linearGradient", &[("id", id)]);
    let style = format!("stop-color:{color}");
    xml::append_child(
        &g,
        &xml::element("svg:stop", &[("offset", "0"), ("style", &style)]),
        &mut NullObserver,
    );
    g
}

fn first_of_kind(doc: &Document, kind: ObjectKind) -> ObjectId {
    doc.objects()
        .find(|&o| doc.object(o).kind() == kind)
        .unwrap()
}

#[test]
fn imported_gradient_is_renamed_and_referenced() {
    let current = doc_with(vec![xml::element("svg:rect", &[("id", "rect1")])], 1);
    let mut imported = doc_with(
        vec![
            gradient("rect1", "blue"),
            xml::element("svg:rect", &[("fill", "url(#rect1)")]),
        ],
        2,
    );

    prevent_id_clashes(&mut imported, &current);

    let grad = first_of_kind(&imported, ObjectKind::LinearGradient);
    let new_id = imported.object(grad).id().unwrap().to_string();
    assert_ne!(new_id, "rect1");
    assert!(new_id.starts_with("rect1-"));
    assert!(new_id["rect1-".len()..].chars().all(|c| c.is_ascii_digit()));

    let rect = imported.object(imported.root()).children()[1];
    assert_eq!(imported.get_attribute(rect, "fill"), Some(format!("url(#{new_id})")));
    assert_eq!(imported.object(grad).hrefcount(), 1);
}

#[test]
fn no_id_is_left_clashing() {
    let current = doc_with(
        vec![
            gradient("a", "red"),
            xml::element("svg:rect", &[("id", "b")]),
            xml::element("svg:rect", &[("id", "c")]),
        ],
        1,
    );

    let g = xml::element("svg:g", &[("id", "b")]);
    xml::append_child(
        &g,
        &xml::element("svg:use", &[("id", "c"), ("xlink:href", "#a")]),
        &mut NullObserver,
    );
    let mut imported = doc_with(
        vec![
            gradient("a", "green"),
            g,
            xml::element("svg:path", &[("id", "p"), ("style", "stroke:url(#a)"), ("mask", "url(#b)")]),
        ],
        2,
    );

    let mut before = RefMap::new();
    find_references(&imported, imported.root(), &mut before);
    let referenced: usize = before.values().map(Vec::len).sum();

    prevent_id_clashes(&mut imported, &current);

    for obj in imported.objects().collect::<Vec<_>>() {
        let o = imported.object(obj);
        if o.is_cloned() || o.is_released() {
            continue;
        }
        if let Some(id) = o.id() {
            assert!(current.object_by_id(id).is_none(), "{id} still clashes");
        }
    }

    let mut after = RefMap::new();
    find_references(&imported, imported.root(), &mut after);
    assert_eq!(after.values().map(Vec::len).sum::<usize>(), referenced);

    for (id, references) in &after {
        assert!(current.object_by_id(id).is_none(), "reference to {id} was not fixed");
        assert!(imported.object_by_id(id).is_some());
        assert!(!references.is_empty());
    }
}

#[test]
fn clipboard_style_is_rewritten() {
    let current = doc_with(vec![gradient("g", "red")], 1);
    let mut imported = doc_with(
        vec![
            gradient("g", "blue"),
            xml::element("inkscape:clipboard", &[("style", "fill:url(#g);stroke:black")]),
        ],
        2,
    );

    prevent_id_clashes(&mut imported, &current);

    let grad = first_of_kind(&imported, ObjectKind::LinearGradient);
    let new_id = imported.object(grad).id().unwrap().to_string();
    let clipboard = first_of_kind(&imported, ObjectKind::Clipboard);

    assert_eq!(
        imported.get_attribute(clipboard, "style"),
        Some(format!("fill:url(#{new_id});stroke:black"))
    );
}

#[test]
fn seeded_sessions_pick_the_same_suffixes() {
    let run = || {
        let current = doc_with(vec![xml::element("svg:rect", &[("id", "x")])], 1);
        let mut imported = doc_with(vec![xml::element("svg:rect", &[("id", "x")])], 99);
        prevent_id_clashes(&mut imported, &current);
        let rect = imported.object(imported.root()).children()[0];
        imported.object(rect).id().unwrap().to_string()
    };

    assert_eq!(run(), run());
}
