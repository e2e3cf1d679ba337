//! The attributed XML tree that objects mirror.
//!
//! This is deliberately small: elements with ordered attributes, text and comment
//! nodes, and a handful of mutators.  Every mutator reports what it did to a
//! [`NodeObserver`] right after the tree has been changed; the
//! [`Document`](crate::document::Document) is the observer that keeps the object tree
//! in sync.  Callers that build detached fragments can pass [`NullObserver`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

mod attributes;

pub use self::attributes::{Attributes, AttributesIter};

/// Process-unique serial of a repr node, usable as a map key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReprId(u64);

impl ReprId {
    fn next() -> ReprId {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ReprId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ReprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repr{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReprKind {
    /// A qualified element name like `svg:rect`.
    Element(String),
    Text(String),
    Comment(String),
}

#[derive(Debug)]
pub struct ReprData {
    id: ReprId,
    kind: ReprKind,
    attributes: Attributes,
}

pub type ReprNode = rctree::Node<ReprData>;

/// Receives change notifications from the mutators in this module.
pub trait NodeObserver {
    fn notify_child_added(&mut self, _parent: &ReprNode, _child: &ReprNode, _prev: Option<&ReprNode>) {}

    fn notify_child_removed(
        &mut self,
        _parent: &ReprNode,
        _child: &ReprNode,
        _prev: Option<&ReprNode>,
    ) {
    }

    fn notify_child_order_changed(
        &mut self,
        _parent: &ReprNode,
        _child: &ReprNode,
        _old_prev: Option<&ReprNode>,
        _new_prev: Option<&ReprNode>,
    ) {
    }

    fn notify_attribute_changed(
        &mut self,
        _node: &ReprNode,
        _key: &str,
        _old_value: Option<&str>,
        _new_value: Option<&str>,
    ) {
    }

    fn notify_content_changed(&mut self, _node: &ReprNode, _old_content: &str, _new_content: &str) {}
}

/// Observer for nodes that no document is watching.
pub struct NullObserver;

impl NodeObserver for NullObserver {}

fn new_node(kind: ReprKind) -> ReprNode {
    ReprNode::new(ReprData {
        id: ReprId::next(),
        kind,
        attributes: Attributes::new(),
    })
}

pub fn new_element(name: &str) -> ReprNode {
    new_node(ReprKind::Element(name.to_string()))
}

pub fn new_text(content: &str) -> ReprNode {
    new_node(ReprKind::Text(content.to_string()))
}

pub fn new_comment(content: &str) -> ReprNode {
    new_node(ReprKind::Comment(content.to_string()))
}

/// Creates a detached element with the given attributes.
pub fn element(name: &str, attributes: &[(&str, &str)]) -> ReprNode {
    let node = new_element(name);
    node.clone().borrow_mut().attributes = attributes.iter().copied().collect();
    node
}

pub fn repr_id(node: &ReprNode) -> ReprId {
    node.borrow().id
}

pub fn kind(node: &ReprNode) -> ReprKind {
    node.borrow().kind.clone()
}

pub fn is_element(node: &ReprNode) -> bool {
    matches!(node.borrow().kind, ReprKind::Element(_))
}

pub fn is_text(node: &ReprNode) -> bool {
    matches!(node.borrow().kind, ReprKind::Text(_))
}

/// Returns the qualified element name, or `string`/`comment` for other nodes.
pub fn name(node: &ReprNode) -> String {
    match node.borrow().kind {
        ReprKind::Element(ref name) => name.clone(),
        ReprKind::Text(_) => "string".to_string(),
        ReprKind::Comment(_) => "comment".to_string(),
    }
}

/// Returns the element name without its namespace prefix.
pub fn local_name(node: &ReprNode) -> String {
    let name = name(node);
    match name.split_once(':') {
        Some((_, local)) => local.to_string(),
        None => name,
    }
}

pub fn content(node: &ReprNode) -> Option<String> {
    match node.borrow().kind {
        ReprKind::Element(_) => None,
        ReprKind::Text(ref s) | ReprKind::Comment(ref s) => Some(s.clone()),
    }
}

pub fn attribute(node: &ReprNode, key: &str) -> Option<String> {
    node.borrow().attributes.get(key).map(str::to_string)
}

/// Returns a snapshot of all the attributes of `node`.
pub fn attributes(node: &ReprNode) -> Attributes {
    node.borrow().attributes.clone()
}

/// Sets or removes an attribute.  Observers are only told about actual changes.
pub fn set_attribute(
    node: &ReprNode,
    key: &str,
    value: Option<&str>,
    observer: &mut dyn NodeObserver,
) {
    assert!(is_element(node), "attributes can only be set on elements");

    let old = node.clone().borrow_mut().attributes.set(key, value);

    if old.as_deref() != value {
        observer.notify_attribute_changed(node, key, old.as_deref(), value);
    }
}

pub fn set_content(node: &ReprNode, new_content: &str, observer: &mut dyn NodeObserver) {
    let old = {
        let mut n = node.clone();
        let mut data = n.borrow_mut();
        match data.kind {
            ReprKind::Text(ref mut s) | ReprKind::Comment(ref mut s) => {
                std::mem::replace(s, new_content.to_string())
            }
            ReprKind::Element(_) => panic!("elements have no content"),
        }
    };

    if old != new_content {
        observer.notify_content_changed(node, &old, new_content);
    }
}

/// Inserts `child` into `parent` right after `prev`, or as the first child.
pub fn add_child(
    parent: &ReprNode,
    child: &ReprNode,
    prev: Option<&ReprNode>,
    observer: &mut dyn NodeObserver,
) {
    assert!(child.parent().is_none(), "node is already in a tree");
    assert!(is_element(parent), "only elements can have children");

    match prev {
        Some(prev) => {
            assert!(
                prev.parent().as_ref() == Some(parent),
                "previous sibling is not a child of the parent"
            );
            prev.insert_after(child.clone());
        }
        None => parent.prepend(child.clone()),
    }

    observer.notify_child_added(parent, child, prev);
}

pub fn append_child(parent: &ReprNode, child: &ReprNode, observer: &mut dyn NodeObserver) {
    let last = parent.last_child();
    add_child(parent, child, last.as_ref(), observer);
}

pub fn remove_child(parent: &ReprNode, child: &ReprNode, observer: &mut dyn NodeObserver) {
    assert!(
        child.parent().as_ref() == Some(parent),
        "node is not a child of the parent"
    );

    let prev = child.previous_sibling();
    child.detach();

    observer.notify_child_removed(parent, child, prev.as_ref());
}

/// Removes `node` from its parent, if it has one.
pub fn unparent(node: &ReprNode, observer: &mut dyn NodeObserver) {
    if let Some(parent) = node.parent() {
        remove_child(&parent, node, observer);
    }
}

/// Moves `child` so that it comes right after `new_prev`, or first.
pub fn change_order(
    parent: &ReprNode,
    child: &ReprNode,
    new_prev: Option<&ReprNode>,
    observer: &mut dyn NodeObserver,
) {
    assert!(
        child.parent().as_ref() == Some(parent),
        "node is not a child of the parent"
    );
    assert!(new_prev != Some(child), "a node cannot follow itself");

    let old_prev = child.previous_sibling();
    if old_prev.as_ref() == new_prev {
        return;
    }

    child.detach();
    match new_prev {
        Some(prev) => {
            assert!(
                prev.parent().as_ref() == Some(parent),
                "previous sibling is not a child of the parent"
            );
            prev.insert_after(child.clone());
        }
        None => parent.prepend(child.clone()),
    }

    observer.notify_child_order_changed(parent, child, old_prev.as_ref(), new_prev);
}

/// Deep-copies `node` into a detached subtree with fresh serials.
pub fn duplicate(node: &ReprNode) -> ReprNode {
    let copy = {
        let data = node.borrow();
        ReprNode::new(ReprData {
            id: ReprId::next(),
            kind: data.kind.clone(),
            attributes: data.attributes.clone(),
        })
    };

    for child in node.children() {
        copy.append(duplicate(&child));
    }

    copy
}

/// Concatenated content of all the text nodes under `node`.
pub fn text_content(node: &ReprNode) -> String {
    node.descendants()
        .filter(is_text)
        .filter_map(|n| content(&n))
        .collect()
}
