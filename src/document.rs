//! Main SVG document structure.
//!
//! A [`Document`] owns the repr tree's root, the arena of objects that mirror it, and
//! the indexes that map ids and reprs to objects.  It is also the
//! [`NodeObserver`] that the XML mutators report to: every change to a repr is
//! forwarded to the objects listening on it.

use std::collections::HashMap;

use crate::element::{self, ObjectKind};
use crate::href::RefSlot;
use crate::object::{Arena, Object, ObjectId};
use crate::session::Session;
use crate::xml::{self, NodeObserver, ReprId, ReprNode};

/// An object tree bound to a repr tree.
pub struct Document {
    pub(crate) session: Session,
    pub(crate) objects: Arena,
    pub(crate) repr_root: ReprNode,
    pub(crate) root: ObjectId,

    ids: HashMap<String, ObjectId>,
    reprs: HashMap<ReprId, ObjectId>,
    listeners: HashMap<ReprId, Vec<ObjectId>>,
    pub(crate) watchers: HashMap<String, Vec<(ObjectId, RefSlot)>>,

    pub(crate) collection_queue: Vec<ObjectId>,
    pub(crate) seeking: bool,

    /// Set while `update_display` runs from `ensure_up_to_date`.
    pub(crate) updating: bool,
    pub(crate) ensuring: bool,
    pub(crate) update_requested: bool,
    pub(crate) modified_requests: u32,

    pub(crate) id_counter: u64,
    pub(crate) handler_serial: u64,
}

impl Document {
    /// Builds the object tree for `repr_root` with a default [`Session`].
    pub fn new(repr_root: ReprNode) -> Document {
        Document::with_session(repr_root, Session::new())
    }

    /// Builds the object tree for `repr_root`.
    ///
    /// Panics if `repr_root` is not an element.
    pub fn with_session(repr_root: ReprNode, session: Session) -> Document {
        assert!(
            xml::is_element(&repr_root),
            "the root of a document must be an element"
        );

        let (kind, data) = element::create_element_data(&xml::name(&repr_root));

        let mut objects = Arena::default();
        let root = objects.insert(Object::new(kind, data));

        let mut doc = Document {
            session,
            objects,
            repr_root: repr_root.clone(),
            root,
            ids: HashMap::new(),
            reprs: HashMap::new(),
            listeners: HashMap::new(),
            watchers: HashMap::new(),
            collection_queue: Vec::new(),
            seeking: false,
            updating: false,
            ensuring: false,
            update_requested: false,
            modified_requests: 0,
            id_counter: 0,
            handler_serial: 0,
        };

        doc.invoke_build(root, &repr_root, false);

        if kind != ObjectKind::Root {
            tracing::warn!("document root is a {}, not an svg element", xml::name(&repr_root));
        }

        doc
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn root(&self) -> ObjectId {
        self.root
    }

    pub fn repr_root(&self) -> &ReprNode {
        &self.repr_root
    }

    /// Panics if `obj` is a stale handle.
    pub fn object(&self, obj: ObjectId) -> &Object {
        match self.objects.get(obj) {
            Some(o) => o,
            None => panic!("stale object handle {obj}"),
        }
    }

    pub(crate) fn object_mut(&mut self, obj: ObjectId) -> &mut Object {
        match self.objects.get_mut(obj) {
            Some(o) => o,
            None => panic!("stale object handle {obj}"),
        }
    }

    pub fn try_object(&self, obj: ObjectId) -> Option<&Object> {
        self.objects.get(obj)
    }

    /// Whether `obj` still refers to an object in memory, released or not.
    pub fn is_alive(&self, obj: ObjectId) -> bool {
        self.objects.contains(obj)
    }

    /// Handles of all the objects in memory.
    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.ids()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Memory reference count of `obj`, or `None` for a stale handle.
    pub fn refcount(&self, obj: ObjectId) -> Option<u32> {
        self.objects.refcount(obj)
    }

    pub fn object_by_id(&self, id: &str) -> Option<ObjectId> {
        self.ids
            .get(id)
            .copied()
            .filter(|&o| self.try_object(o).map_or(false, |o| !o.is_released()))
    }

    pub fn object_by_repr(&self, repr: &ReprNode) -> Option<ObjectId> {
        self.reprs
            .get(&xml::repr_id(repr))
            .copied()
            .filter(|&o| self.try_object(o).map_or(false, |o| !o.is_released()))
    }

    pub(crate) fn is_id_bound(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub(crate) fn id_owner(&self, id: &str) -> Option<ObjectId> {
        self.ids.get(id).copied()
    }

    /// Binds `id` to `obj`, or unbinds it if `obj` is `None`, and retargets the
    /// references waiting on the id.
    pub(crate) fn bind_object_to_id(&mut self, id: &str, obj: Option<ObjectId>) {
        match obj {
            Some(o) => {
                assert!(!self.ids.contains_key(id), "id \"{id}\" is already bound");
                self.ids.insert(id.to_string(), o);
            }

            None => {
                assert!(self.ids.remove(id).is_some(), "id \"{id}\" is not bound");
            }
        }

        self.retarget_watchers(id, obj);
    }

    pub(crate) fn bind_object_to_repr(&mut self, repr: &ReprNode, obj: Option<ObjectId>) {
        let key = xml::repr_id(repr);

        match obj {
            Some(o) => {
                assert!(!self.reprs.contains_key(&key), "{key} already has an object");
                self.reprs.insert(key, o);
            }

            None => {
                assert!(self.reprs.remove(&key).is_some(), "{key} has no object");
            }
        }
    }

    pub(crate) fn is_repr_bound_to(&self, repr: &ReprNode, obj: ObjectId) -> bool {
        self.reprs.get(&xml::repr_id(repr)) == Some(&obj)
    }

    pub(crate) fn listen(&mut self, obj: ObjectId, repr: &ReprNode) {
        self.listeners
            .entry(xml::repr_id(repr))
            .or_default()
            .push(obj);
    }

    pub(crate) fn unlisten(&mut self, obj: ObjectId, repr: &ReprNode) {
        let key = xml::repr_id(repr);

        if let Some(list) = self.listeners.get_mut(&key) {
            list.retain(|&o| o != obj);
            if list.is_empty() {
                self.listeners.remove(&key);
            }
        }
    }

    fn listeners_of(&self, repr: &ReprNode) -> Vec<ObjectId> {
        self.listeners
            .get(&xml::repr_id(repr))
            .cloned()
            .unwrap_or_default()
    }

    fn is_listening(&self, obj: ObjectId, repr: &ReprNode) -> bool {
        self.listeners
            .get(&xml::repr_id(repr))
            .map_or(false, |list| list.contains(&obj))
    }

    /// While seeking (stepping through undo history), conflicting ids are left
    /// unbound instead of being renamed.
    pub fn set_seeking(&mut self, seeking: bool) {
        self.seeking = seeking;
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub(crate) fn request_document_update(&mut self) {
        self.update_requested = true;
        self.modified_requests += 1;
    }

    /// Whether something changed since the last `ensure_up_to_date`.
    pub fn update_requested(&self) -> bool {
        self.update_requested
    }

    /// How many times a change reached the top of the tree and asked the document
    /// for an update.
    pub fn modified_request_count(&self) -> u32 {
        self.modified_requests
    }

    /// Queues `obj` for deletion at the next orphan collection, holding a reference
    /// to it until then.
    pub(crate) fn queue_for_orphan_collection(&mut self, obj: ObjectId) {
        self.ref_object(obj);
        self.collection_queue.push(obj);
    }

    /// Objects waiting for the next orphan collection.
    pub fn pending_orphans(&self) -> &[ObjectId] {
        &self.collection_queue
    }

    /// Deletes queued objects that are still unreferenced.  Deleting them may queue
    /// more objects, which are collected too.
    pub fn collect_orphans(&mut self) {
        while !self.collection_queue.is_empty() {
            let queue = std::mem::take(&mut self.collection_queue);

            for obj in queue {
                self.collect_orphan(obj);
                self.unref_object(obj);
            }
        }
    }

    pub fn get_attribute(&self, obj: ObjectId, key: &str) -> Option<String> {
        self.object(obj)
            .repr()
            .filter(|r| xml::is_element(r))
            .and_then(|r| xml::attribute(r, key))
    }

    /// Sets an attribute on the repr of `obj`; the object hears about it like about
    /// any other change to its repr.
    pub fn set_attribute(&mut self, obj: ObjectId, key: &str, value: Option<&str>) {
        let repr = match self.object(obj).repr().cloned() {
            Some(r) if xml::is_element(&r) => r,
            _ => {
                tracing::error!("cannot set attribute \"{}\" on {}", key, obj);
                return;
            }
        };

        xml::set_attribute(&repr, key, value, self);
    }

    pub fn remove_attribute(&mut self, obj: ObjectId, key: &str) {
        self.set_attribute(obj, key, None);
    }

    /// Releases the whole tree.
    pub fn close(mut self) {
        self.collect_orphans();

        let root = self.root;
        if !self.object(root).is_released() {
            self.release_references(root);
        }
        self.unref_object(root);
    }
}

impl NodeObserver for Document {
    fn notify_child_added(&mut self, parent: &ReprNode, child: &ReprNode, prev: Option<&ReprNode>) {
        for obj in self.listeners_of(parent) {
            if self.is_listening(obj, parent) {
                let class = self.object(obj).kind().class();
                class.child_added(self, obj, child, prev);
            }
        }
    }

    fn notify_child_removed(&mut self, parent: &ReprNode, child: &ReprNode, _prev: Option<&ReprNode>) {
        for obj in self.listeners_of(parent) {
            if self.is_listening(obj, parent) {
                let class = self.object(obj).kind().class();
                class.remove_child(self, obj, child);
            }
        }
    }

    fn notify_child_order_changed(
        &mut self,
        parent: &ReprNode,
        child: &ReprNode,
        old_prev: Option<&ReprNode>,
        new_prev: Option<&ReprNode>,
    ) {
        for obj in self.listeners_of(parent) {
            if self.is_listening(obj, parent) {
                let class = self.object(obj).kind().class();
                class.order_changed(self, obj, child, old_prev, new_prev);
            }
        }
    }

    fn notify_attribute_changed(
        &mut self,
        node: &ReprNode,
        key: &str,
        _old_value: Option<&str>,
        _new_value: Option<&str>,
    ) {
        for obj in self.listeners_of(node) {
            if self.is_listening(obj, node) {
                self.read_attr(obj, key);
            }
        }
    }

    fn notify_content_changed(&mut self, node: &ReprNode, _old_content: &str, _new_content: &str) {
        for obj in self.listeners_of(node) {
            if self.is_listening(obj, node) {
                let class = self.object(obj).kind().class();
                class.read_content(self, obj);
            }
        }
    }
}
