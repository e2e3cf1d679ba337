//! Building, referencing and deleting objects through the public API.

use std::cell::Cell;
use std::rc::Rc;

use spobject::xml::{self, NullObserver, ReprNode};
use spobject::{CollectionPolicy, Document, ObjectId, ObjectKind, Session};

fn doc_with(children: Vec<ReprNode>) -> Document {
    let root = xml::new_element("svg:svg");
    let defs = xml::element("svg:defs", &[("id", "defs")]);
    for c in children {
        xml::append_child(&defs, &c, &mut NullObserver);
    }
    xml::append_child(&root, &defs, &mut NullObserver);
    Document::with_session(root, Session::with_seed(11))
}

fn collectable(name: &str, id: &str) -> ReprNode {
    xml::element(name, &[("id", id), ("inkscape:collect", "always")])
}

fn check_hrefcounts(doc: &Document) {
    for obj in doc.objects() {
        let o = doc.object(obj);
        if o.is_released() {
            continue;
        }

        let children: u32 = o
            .children()
            .iter()
            .map(|&c| doc.object(c).total_hrefcount())
            .sum();

        assert!(o.total_hrefcount() >= o.hrefcount());
        assert_eq!(o.total_hrefcount(), o.hrefcount() + children, "totals of {obj}");
    }
}

fn check_ids(doc: &Document) {
    let mut seen = std::collections::HashSet::new();

    for obj in doc.objects() {
        let o = doc.object(obj);
        if o.is_released() || o.is_cloned() {
            continue;
        }

        if let Some(id) = o.id() {
            assert!(seen.insert(id.to_string()), "id {id} is used twice");
            assert_eq!(doc.object_by_id(id), Some(obj));
        }
    }
}

#[test]
fn last_hunref_queues_an_orphan() {
    let mut doc = doc_with(vec![
        collectable("svg:linearGradient", "a"),
        xml::element("svg:rect", &[("id", "r1")]),
        xml::element("svg:rect", &[("id", "r2")]),
    ]);

    let a = doc.object_by_id("a").unwrap();
    let r1 = doc.object_by_id("r1").unwrap();
    let r2 = doc.object_by_id("r2").unwrap();
    let defs = doc.object_by_id("defs").unwrap();

    doc.href(a, Some(r1));
    doc.href(a, Some(r2));
    assert_eq!(doc.object(a).hrefcount(), 2);
    assert_eq!(doc.object(defs).total_hrefcount(), 2);
    check_hrefcounts(&doc);

    doc.hunref(a, Some(r1));
    assert!(doc.pending_orphans().is_empty());

    doc.hunref(a, Some(r2));
    assert_eq!(doc.object(a).hrefcount(), 0);
    assert_eq!(doc.object(a).total_hrefcount(), 0);
    assert_eq!(doc.object(defs).total_hrefcount(), 0);
    assert_eq!(doc.object(doc.root()).total_hrefcount(), 0);
    check_hrefcounts(&doc);

    // queued, not deleted yet
    assert_eq!(doc.pending_orphans(), &[a]);
    assert_eq!(doc.object_by_id("a"), Some(a));

    doc.ensure_up_to_date();
    assert_eq!(doc.object_by_id("a"), None);
    assert!(!doc.is_alive(a));
    assert!(doc.pending_orphans().is_empty());
    check_ids(&doc);
}

#[test]
fn style_references_keep_gradients_alive() {
    let mut doc = doc_with(vec![
        collectable("svg:linearGradient", "a"),
        xml::element("svg:rect", &[("id", "r"), ("style", "fill:url(#a);stroke:url(#a)")]),
    ]);

    let a = doc.object_by_id("a").unwrap();
    let r = doc.object_by_id("r").unwrap();
    assert_eq!(doc.object(a).hrefcount(), 2);

    doc.set_attribute(r, "style", Some("stroke:url(#a)"));
    doc.ensure_up_to_date();
    assert_eq!(doc.object_by_id("a"), Some(a));

    doc.set_attribute(r, "style", Some("stroke:none"));
    doc.ensure_up_to_date();
    assert_eq!(doc.object_by_id("a"), None);
    check_hrefcounts(&doc);
}

#[test]
fn orphan_collection_deletes_once() {
    let mut doc = doc_with(vec![collectable("svg:linearGradient", "a")]);
    let a = doc.object_by_id("a").unwrap();

    let releases = Rc::new(Cell::new(0));
    let r = releases.clone();
    doc.connect_release(a, move |_, _| r.set(r.get() + 1));

    doc.request_orphan_collection(a);
    doc.request_orphan_collection(a);
    assert_eq!(doc.pending_orphans().len(), 2);

    doc.collect_orphans();

    assert_eq!(releases.get(), 1);
    assert!(!doc.is_alive(a));
    assert!(doc.pending_orphans().is_empty());
}

#[test]
fn referenced_orphans_survive_collection() {
    let mut doc = doc_with(vec![collectable("svg:linearGradient", "a")]);
    let a = doc.object_by_id("a").unwrap();

    doc.request_orphan_collection(a);
    doc.href(a, None);
    doc.collect_orphans();

    assert_eq!(doc.object_by_id("a"), Some(a));
    assert_eq!(doc.refcount(a), Some(1));
}

#[test]
fn some_kinds_are_never_collected() {
    let swatch = xml::element(
        "svg:linearGradient",
        &[("id", "swatch"), ("inkscape:collect", "always"), ("osb:paint", "solid")],
    );

    let mut doc = doc_with(vec![
        collectable("svg:style", "style"),
        collectable("svg:script", "script"),
        collectable("svg:color-profile", "profile"),
        swatch,
    ]);

    for id in ["style", "script", "profile", "swatch"] {
        let obj = doc.object_by_id(id).unwrap();
        doc.href(obj, None);
        doc.hunref(obj, None);
        doc.request_orphan_collection(obj);
    }

    assert!(doc.pending_orphans().is_empty());
    doc.ensure_up_to_date();

    for id in ["style", "script", "profile", "swatch"] {
        assert!(doc.object_by_id(id).is_some(), "{id} was collected");
    }
}

#[test]
fn collection_policy_decides_the_collected_subtree() {
    let g = collectable("svg:g", "outer");
    xml::append_child(&g, &collectable("svg:rect", "inner"), &mut NullObserver);
    let mut doc = doc_with(vec![g]);

    let inner = doc.object_by_id("inner").unwrap();
    let outer = doc.object_by_id("outer").unwrap();
    assert_eq!(doc.object(outer).collection_policy(), CollectionPolicy::AlwaysCollect);

    doc.href(inner, None);
    doc.hunref(inner, None);

    // the topmost collectable object goes
    assert_eq!(doc.pending_orphans(), &[outer]);
    doc.ensure_up_to_date();
    assert_eq!(doc.object_by_id("outer"), None);
    assert_eq!(doc.object_by_id("inner"), None);
}

#[test]
#[should_panic]
fn second_successor_panics() {
    let mut doc = doc_with(vec![
        xml::element("svg:rect", &[("id", "o")]),
        xml::element("svg:rect", &[("id", "s1")]),
        xml::element("svg:rect", &[("id", "s2")]),
    ]);

    let o = doc.object_by_id("o").unwrap();
    let s1 = doc.object_by_id("s1").unwrap();
    let s2 = doc.object_by_id("s2").unwrap();

    doc.set_successor(o, s1);
    doc.set_successor(o, s2);
}

#[test]
#[should_panic]
fn detaching_a_non_child_panics() {
    let mut doc = doc_with(vec![xml::element("svg:rect", &[("id", "r")])]);
    let r = doc.object_by_id("r").unwrap();
    let root = doc.root();
    doc.detach(root, r);
}

#[test]
fn delete_signals_reach_descendants() {
    let g = xml::element("svg:g", &[("id", "g")]);
    xml::append_child(&g, &xml::element("svg:rect", &[("id", "r")]), &mut NullObserver);
    let mut doc = doc_with(vec![g]);

    let deleted: Rc<Cell<Vec<&str>>> = Rc::new(Cell::new(Vec::new()));
    for id in ["g", "r"] {
        let obj = doc.object_by_id(id).unwrap();
        let d = deleted.clone();
        doc.connect_delete(obj, move |_, _| {
            let mut v = d.take();
            v.push(id);
            d.set(v);
        });
    }

    let g = doc.object_by_id("g").unwrap();
    doc.delete_object(g, true, true);

    assert_eq!(deleted.take(), vec!["g", "r"]);
    assert_eq!(doc.object_by_id("r"), None);
    check_hrefcounts(&doc);
    check_ids(&doc);
}

#[test]
fn repr_edits_keep_objects_in_order() {
    let mut doc = doc_with(vec![
        xml::element("svg:rect", &[("id", "a")]),
        xml::new_comment("between"),
        xml::element("svg:rect", &[("id", "b")]),
    ]);

    let defs = doc.object_by_id("defs").unwrap();
    let defs_repr = doc.object(defs).repr().cloned().unwrap();
    let kids = |doc: &Document| -> Vec<String> {
        doc.object(defs)
            .children()
            .iter()
            .map(|&c| doc.object(c).id().unwrap_or_default().to_string())
            .collect()
    };

    // after the comment, which has no object: lands after "a"
    let comment = defs_repr.children().nth(1).unwrap();
    xml::add_child(&defs_repr, &xml::element("svg:rect", &[("id", "c")]), Some(&comment), &mut doc);
    assert_eq!(kids(&doc), vec!["a", "c", "b"]);

    let b_repr = doc.object(doc.object_by_id("b").unwrap()).repr().cloned().unwrap();
    xml::change_order(&defs_repr, &b_repr, None, &mut doc);
    assert_eq!(kids(&doc), vec!["b", "a", "c"]);

    let a: ObjectId = doc.object_by_id("a").unwrap();
    let c = doc.object_by_id("c").unwrap();
    assert_eq!(doc.next_sibling(a), Some(c));
    check_ids(&doc);
}

#[test]
fn text_nodes_and_titles() {
    let mut doc = doc_with(vec![xml::element("svg:g", &[("id", "g")])]);
    let g = doc.object_by_id("g").unwrap();

    // whitespace only is the same as no title
    assert!(!doc.set_title(g, Some("  \n\t "), false));
    assert!(doc.object(g).children().is_empty());
    assert!(!doc.set_title(g, None, false));

    assert!(doc.set_title(g, Some("Layer"), false));
    let title = doc.object(g).first_child().unwrap();
    assert_eq!(doc.object(title).kind(), ObjectKind::Title);

    let text = doc.object(title).first_child().unwrap();
    assert_eq!(doc.object(text).kind(), ObjectKind::String);
    assert_eq!(doc.object(text).id(), None);
    assert_eq!(doc.title(g).as_deref(), Some("Layer"));
}

#[test]
fn close_releases_the_tree() {
    let doc = doc_with(vec![
        xml::element("svg:linearGradient", &[("id", "a")]),
        xml::element("svg:use", &[("id", "u"), ("xlink:href", "#a")]),
    ]);

    check_hrefcounts(&doc);
    check_ids(&doc);
    doc.close();
}

#[test]
fn removing_the_target_inside_a_use_removes_the_real_child() {
    let u = xml::element("svg:use", &[("id", "u"), ("xlink:href", "#t")]);
    let t = xml::element("svg:g", &[("id", "t")]);
    xml::append_child(&u, &t, &mut NullObserver);
    let mut doc = doc_with(vec![u.clone()]);

    let uobj = doc.object_by_id("u").unwrap();
    let tobj = doc.object_by_id("t").unwrap();
    assert_eq!(doc.object(uobj).children().len(), 2);
    assert_eq!(doc.object(uobj).first_child(), Some(tobj));

    xml::remove_child(&u, &t, &mut doc);

    assert_eq!(doc.object_by_id("t"), None);
    assert!(doc.try_object(tobj).map_or(true, |o| o.is_released()));
    assert!(doc.object(uobj).children().is_empty());
    check_hrefcounts(&doc);
    check_ids(&doc);
}
