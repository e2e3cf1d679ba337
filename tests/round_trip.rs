//! Randomized checks of the tree bookkeeping.

use proptest::prelude::*;

use spobject::xml::{self, NullObserver, ReprNode};
use spobject::{Document, ObjectId, Session};

type Snapshot = Vec<(ObjectId, Option<ObjectId>, Vec<ObjectId>, u32, u32)>;

/// Builds a document with a gradient and nested groups.  Each entry of `shape` picks
/// the parent of one group among the ones before it, and whether it paints with the
/// gradient.
fn build(shape: &[(usize, bool)]) -> Document {
    let root = xml::new_element("svg:svg");
    let defs = xml::new_element("svg:defs");
    xml::append_child(&defs, &xml::element("svg:linearGradient", &[("id", "grad")]), &mut NullObserver);
    xml::append_child(&root, &defs, &mut NullObserver);

    let mut groups: Vec<ReprNode> = vec![root.clone()];
    for &(parent, painted) in shape {
        let g = if painted {
            xml::element("svg:g", &[("style", "fill:url(#grad)")])
        } else {
            xml::new_element("svg:g")
        };

        xml::append_child(&groups[parent % groups.len()], &g, &mut NullObserver);
        groups.push(g);
    }

    Document::with_session(root, Session::with_seed(17))
}

fn snapshot(doc: &Document) -> Snapshot {
    doc.objects()
        .map(|obj| {
            let o = doc.object(obj);
            (
                obj,
                o.parent(),
                o.children().to_vec(),
                o.hrefcount(),
                o.total_hrefcount(),
            )
        })
        .collect()
}

fn totals_add_up(doc: &Document) -> bool {
    doc.objects().all(|obj| {
        let o = doc.object(obj);
        let children: u32 = o
            .children()
            .iter()
            .map(|&c| doc.object(c).total_hrefcount())
            .sum();
        o.total_hrefcount() == o.hrefcount() + children
    })
}

proptest! {
    #[test]
    fn attach_then_detach_restores_the_tree(
        shape in prop::collection::vec((0usize..32, any::<bool>()), 0..12),
        parent in 0usize..64,
        prev in 0usize..8,
        painted in any::<bool>(),
    ) {
        let mut doc = build(&shape);
        prop_assert!(totals_add_up(&doc));

        let objects: Vec<ObjectId> = doc.objects().collect();
        let parent = objects[parent % objects.len()];
        let siblings = doc.object(parent).children().to_vec();
        let prev = if prev < siblings.len() { Some(siblings[prev]) } else { None };

        let before = snapshot(&doc);

        let repr = if painted {
            xml::element("svg:rect", &[("style", "fill:url(#grad)")])
        } else {
            xml::new_element("svg:rect")
        };
        let child = doc.new_object_for_repr(&repr).unwrap();

        doc.attach(parent, child, prev);
        doc.invoke_build(child, &repr, false);
        prop_assert!(totals_add_up(&doc));

        doc.detach(parent, child);
        doc.unref_object(child);

        prop_assert!(!doc.is_alive(child));
        prop_assert_eq!(snapshot(&doc), before);
    }

    #[test]
    fn deleting_keeps_totals_and_ids_consistent(
        shape in prop::collection::vec((0usize..32, any::<bool>()), 1..12),
        victims in prop::collection::vec(0usize..64, 1..4),
    ) {
        let mut doc = build(&shape);

        for v in victims {
            let objects: Vec<ObjectId> = doc
                .objects()
                .filter(|&o| o != doc.root() && !doc.object(o).is_released())
                .collect();
            if objects.is_empty() {
                break;
            }
            let victim = objects[v % objects.len()];
            doc.delete_object(victim, true, true);
            doc.ensure_up_to_date();

            prop_assert!(totals_add_up(&doc));
        }

        for obj in doc.objects() {
            if let Some(id) = doc.object(obj).id() {
                prop_assert_eq!(doc.object_by_id(id), Some(obj));
            }
        }
    }
}
