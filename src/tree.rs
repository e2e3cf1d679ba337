//! Building, linking and tearing down objects.
//!
//! # Reference counts
//!
//! Every object has two unrelated counts.  The memory count in the arena keeps the
//! object alive: its parent holds one, the orphan queue holds one, and anybody can
//! hold more with [`Document::ref_object`].  The `hrefcount` counts how many things
//! refer to the object by id, and the total hrefcount adds up the hrefcounts of a whole
//! subtree.  An object with [`CollectionPolicy::AlwaysCollect`] whose total drops to
//! zero is queued for deletion as an orphan.
//!
//! # Lifecycle
//!
//! An object is created for a repr with [`Document::new_object_for_repr`], attached to
//! its parent, and built with [`Document::invoke_build`], which binds it to the repr
//! and its id and builds its children.  Detaching it releases it: it stops listening
//! to its repr, drops the references it holds and the ones held on it, detaches its
//! own children and unbinds its id and repr.  It is freed when its memory count
//! reaches zero.

use std::cmp::Ordering;

use crate::css;
use crate::document::Document;
use crate::element::{self, ObjectKind};
use crate::flags::{ObjectFlags, WriteFlags};
use crate::object::{CollectionPolicy, Object, ObjectId, XmlSpace};
use crate::signals::ObjectSignal;
use crate::spobject_log;
use crate::style::{self, Style};
use crate::xml::{self, ReprKind, ReprNode};

/// Elements in these namespaces carry metadata and never get an id assigned.
const NO_ID_PREFIXES: &[&str] = &["rdf:", "cc:", "dc:"];

fn id_permitted(repr: &ReprNode) -> bool {
    if !xml::is_element(repr) {
        return false;
    }

    let name = xml::name(repr);
    !NO_ID_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

impl Document {
    pub fn ref_object(&mut self, obj: ObjectId) {
        self.objects.ref_(obj);
    }

    /// Drops a memory reference.  A freed object lets go of its successor.
    pub fn unref_object(&mut self, obj: ObjectId) {
        if let Some(freed) = self.objects.unref(obj) {
            if let Some(successor) = freed.successor {
                self.unref_object(successor);
            }
        }
    }

    /// Records that `owner` (if known) refers to `obj`.
    pub fn href(&mut self, obj: ObjectId, _owner: Option<ObjectId>) {
        self.object_mut(obj).hrefcount += 1;
        self.update_total_hrefcount(obj, 1);
    }

    /// Undoes an [`href`](Document::href).  Panics if `obj` is not referenced.
    pub fn hunref(&mut self, obj: ObjectId, _owner: Option<ObjectId>) {
        let o = self.object_mut(obj);
        assert!(o.hrefcount > 0, "hunref of unreferenced object {obj}");
        o.hrefcount -= 1;
        self.update_total_hrefcount(obj, -1);
    }

    fn update_total_hrefcount(&mut self, obj: ObjectId, increment: i64) {
        let mut topmost_collectable = None;

        let mut cur = Some(obj);
        while let Some(id) = cur {
            let o = self.object_mut(id);

            let total = i64::from(o.total_hrefcount) + increment;
            assert!(
                total >= i64::from(o.hrefcount),
                "hrefs overcounted on object {id}"
            );
            o.total_hrefcount = total as u32;

            if increment < 0
                && total == 0
                && o.collection_policy != CollectionPolicy::CollectWithParent
            {
                topmost_collectable = Some(id);
            }

            cur = o.parent;
        }

        if let Some(id) = topmost_collectable {
            self.request_orphan_collection(id);
        }
    }

    fn is_never_collected(&self, obj: ObjectId) -> bool {
        matches!(
            self.object(obj).kind(),
            ObjectKind::StyleElem | ObjectKind::Script | ObjectKind::ColorProfile
        ) || self.is_swatch(obj)
    }

    /// Asks for `obj` to be deleted at the next orphan collection.
    pub fn request_orphan_collection(&mut self, obj: ObjectId) {
        if self.object(obj).is_released() {
            tracing::error!("orphan collection requested for released object {}", obj);
            return;
        }

        if !self.is_never_collected(obj) {
            self.queue_for_orphan_collection(obj);
        }

        self.request_modified(obj, ObjectFlags::CHILD_MODIFIED);
    }

    pub(crate) fn collect_orphan(&mut self, obj: ObjectId) {
        let o = self.object(obj);
        if !o.is_released() && o.total_hrefcount() == 0 {
            spobject_log!(self.session, "collecting orphan {}", self.default_label(obj));
            self.delete_object(obj, false, false);
        }
    }

    /// Creates an unbuilt object for `repr`, owned by the caller.  Comments get none.
    pub fn new_object_for_repr(&mut self, repr: &ReprNode) -> Option<ObjectId> {
        let (kind, data) = element::create_object_data(repr)?;
        Some(self.objects.insert(Object::new(kind, data)))
    }

    fn child_index(&self, parent: ObjectId, child: ObjectId) -> Option<usize> {
        self.object(parent).children.iter().position(|&c| c == child)
    }

    /// Makes `child` a child of `parent`, right after `prev` or first.
    ///
    /// Panics if `child` already has a parent or `prev` is not a child of `parent`.
    pub fn attach(&mut self, parent: ObjectId, child: ObjectId, prev: Option<ObjectId>) {
        assert!(
            self.object(child).parent.is_none(),
            "object {child} already has a parent"
        );

        let index = match prev {
            Some(p) => match self.child_index(parent, p) {
                Some(i) => i + 1,
                None => panic!("object {p} is not a child of {parent}"),
            },
            None => 0,
        };

        self.ref_object(child);
        self.object_mut(child).parent = Some(parent);

        let total = self.object(child).total_hrefcount;
        self.update_total_hrefcount(parent, i64::from(total));

        self.object_mut(parent).children.insert(index, child);

        let parent_space = self.object(parent).xml_space.value;
        let c = self.object_mut(child);
        if !c.xml_space.set {
            c.xml_space.value = parent_space;
        }
    }

    /// Moves `obj` among its siblings to right after `prev`, or first.
    pub fn reorder(&mut self, obj: ObjectId, prev: Option<ObjectId>) {
        let parent = match self.object(obj).parent {
            Some(p) => p,
            None => panic!("object {obj} has no parent"),
        };

        assert!(prev != Some(obj), "object {obj} cannot follow itself");
        if let Some(p) = prev {
            assert!(
                self.object(p).parent == Some(parent),
                "object {p} is not a sibling of {obj}"
            );
        }

        let children = &mut self.object_mut(parent).children;
        children.retain(|&c| c != obj);

        let index = match prev {
            Some(p) => children.iter().position(|&c| c == p).map_or(0, |i| i + 1),
            None => 0,
        };
        children.insert(index, obj);
    }

    /// Releases `child` and removes it from `parent`.
    pub fn detach(&mut self, parent: ObjectId, child: ObjectId) {
        assert!(
            self.object(child).parent == Some(parent),
            "object {child} is not a child of {parent}"
        );

        self.release_references(child);

        self.object_mut(parent).children.retain(|&c| c != child);
        self.object_mut(child).parent = None;

        let total = self.object(child).total_hrefcount;
        self.update_total_hrefcount(parent, -i64::from(total));

        self.unref_object(child);
    }

    /// Disconnects `obj` from its repr and from the rest of the document.
    ///
    /// Panics if `obj` was never built, or if something still holds an href on it
    /// after the document dropped its own references.
    pub fn release_references(&mut self, obj: ObjectId) {
        let repr = match self.object(obj).repr.clone() {
            Some(r) => r,
            None => panic!("object {obj} is not built"),
        };

        self.unlisten(obj, &repr);
        self.emit_object_signal(obj, ObjectSignal::Release);
        self.drop_references_to(obj);

        let class = self.object(obj).kind().class();
        class.release(self, obj);
        self.base_release(obj);

        assert_eq!(
            self.object(obj).hrefcount,
            0,
            "object {obj} is still referenced after release"
        );

        if !self.object(obj).cloned {
            if let Some(id) = self.object_mut(obj).id.take() {
                if self.id_owner(&id) == Some(obj) {
                    self.bind_object_to_id(&id, None);
                }
            }

            if self.is_repr_bound_to(&repr, obj) {
                self.bind_object_to_repr(&repr, None);
            }
        }

        let o = self.object_mut(obj);
        o.style = None;
        o.repr = None;
        o.released = true;
    }

    fn base_release(&mut self, obj: ObjectId) {
        self.clear_references(obj);

        while let Some(child) = self.object(obj).first_child() {
            self.detach(obj, child);
        }
    }

    /// Deletes `obj` by removing its repr from the repr tree.
    ///
    /// With `propagate` the delete signal is emitted on `obj`, and with
    /// `propagate_descendants` on all its descendants.  Cloned objects are detached
    /// from their parent instead, since their repr belongs to somebody else.  The
    /// successor, if any, is deleted in the same way.
    pub fn delete_object(&mut self, obj: ObjectId, propagate: bool, propagate_descendants: bool) {
        self.ref_object(obj);

        if propagate {
            self.emit_object_signal(obj, ObjectSignal::Delete);
        }

        if propagate_descendants {
            self.emit_delete_recursive(obj);
        }

        let (cloned, parent, repr) = {
            let o = self.object(obj);
            (o.cloned, o.parent, o.repr.clone())
        };

        if cloned {
            if let Some(parent) = parent {
                self.detach(parent, obj);
            }
        } else if let Some(repr) = repr {
            if repr.parent().is_some() {
                xml::unparent(&repr, self);
            }
        }

        if let Some(successor) = self.object(obj).successor {
            self.delete_object(successor, propagate, propagate_descendants);
        }

        self.unref_object(obj);
    }

    fn emit_delete_recursive(&mut self, obj: ObjectId) {
        for child in self.object(obj).children.clone() {
            if self.is_alive(child) {
                self.emit_object_signal(child, ObjectSignal::Delete);
                self.emit_delete_recursive(child);
            }
        }
    }

    /// Names the object that takes over from `obj` when `obj` is deleted.
    ///
    /// Panics if either of them already has a successor.
    pub fn set_successor(&mut self, obj: ObjectId, successor: ObjectId) {
        assert!(
            self.object(obj).successor.is_none(),
            "object {obj} already has a successor"
        );
        assert!(
            self.object(successor).successor.is_none(),
            "object {successor} cannot be a successor, it has one of its own"
        );

        self.ref_object(successor);
        self.object_mut(obj).successor = Some(successor);
    }

    fn unique_id(&mut self, repr: &ReprNode, id: Option<&str>) -> String {
        if let Some(id) = id {
            if !self.is_id_bound(id) {
                return id.to_string();
            }
        }

        let name = xml::local_name(repr);
        loop {
            self.id_counter += 1;
            let candidate = format!("{}{}", name, self.id_counter);
            if !self.is_id_bound(&candidate) {
                return candidate;
            }
        }
    }

    /// Binds `obj` to `repr` and builds it and its subtree.
    ///
    /// A cloned object mirrors a repr that belongs to another object; it does not
    /// take the repr's id or appear in the repr index.
    pub fn invoke_build(&mut self, obj: ObjectId, repr: &ReprNode, cloned: bool) {
        {
            let o = self.object(obj);
            assert!(
                o.repr.is_none() && !o.released,
                "object {obj} is already built"
            );
        }

        {
            let o = self.object_mut(obj);
            o.repr = Some(repr.clone());
            o.cloned = cloned;
        }

        if !cloned {
            self.bind_object_to_repr(repr, Some(obj));

            if id_permitted(repr) {
                let id = xml::attribute(repr, "id").filter(|s| !s.is_empty());

                if !self.seeking {
                    let real_id = self.unique_id(repr, id.as_deref());
                    self.bind_object_to_id(&real_id, Some(obj));
                    self.object_mut(obj).id = Some(real_id.clone());

                    if id.as_deref() != Some(real_id.as_str()) {
                        spobject_log!(
                            self.session,
                            "assigning id \"{}\" to {}",
                            real_id,
                            xml::name(repr)
                        );
                        xml::set_attribute(repr, "id", Some(&real_id), self);
                    }
                } else if let Some(id) = id {
                    // a conflicting id stays unbound; the repr will get a new one
                    if !self.is_id_bound(&id) {
                        self.bind_object_to_id(&id, Some(obj));
                        self.object_mut(obj).id = Some(id);
                    }
                }
            }
        }

        self.base_build(obj, repr);

        let class = self.object(obj).kind().class();
        class.build(self, obj);

        self.listen(obj, repr);
    }

    fn base_build(&mut self, obj: ObjectId, repr: &ReprNode) {
        self.read_attr(obj, "xml:space");
        self.read_attr(obj, "inkscape:label");
        self.read_attr(obj, "inkscape:collect");
        self.read_style(obj);

        let cloned = self.object(obj).cloned;
        let children: Vec<ReprNode> = repr.children().collect();

        for rchild in children {
            if let Some(child) = self.new_object_for_repr(&rchild) {
                let last = self.object(obj).last_child();
                self.attach(obj, child, last);
                self.unref_object(child);
                self.invoke_build(child, &rchild, cloned);
            }
        }
    }

    /// Reads attribute `key` from the repr of `obj` and applies it.
    pub fn read_attr(&mut self, obj: ObjectId, key: &str) {
        let value = match self.object(obj).repr {
            Some(ref r) if xml::is_element(r) => xml::attribute(r, key),
            Some(_) => None,
            None => panic!("object {obj} has no repr to read \"{key}\" from"),
        };

        self.base_set(obj, key, value.as_deref());

        let class = self.object(obj).kind().class();
        class.set(self, obj, key, value.as_deref());
    }

    fn base_set(&mut self, obj: ObjectId, key: &str, value: Option<&str>) {
        match key {
            "id" => self.set_id(obj, value),

            "inkscape:label" => {
                self.object_mut(obj).label = value.map(str::to_string);
            }

            "inkscape:collect" => {
                self.object_mut(obj).collection_policy = match value {
                    Some("always") => CollectionPolicy::AlwaysCollect,
                    _ => CollectionPolicy::CollectWithParent,
                };
            }

            "xml:space" => {
                let parent_space = self
                    .object(obj)
                    .parent
                    .map(|p| self.object(p).xml_space.value);

                let space = &mut self.object_mut(obj).xml_space;
                match value {
                    Some("preserve") => {
                        space.value = XmlSpace::Preserve;
                        space.set = true;
                    }
                    Some("default") => {
                        space.value = XmlSpace::Default;
                        space.set = true;
                    }
                    _ => {
                        space.set = false;
                        if let Some(v) = parent_space {
                            space.value = v;
                        }
                    }
                }

                self.request_display_update(obj, ObjectFlags::MODIFIED | ObjectFlags::STYLE_MODIFIED);
            }

            _ if key == "style" || style::is_property(key) => {
                self.read_style(obj);
                self.request_display_update(obj, ObjectFlags::MODIFIED | ObjectFlags::STYLE_MODIFIED);
            }

            _ => (),
        }
    }

    fn set_id(&mut self, obj: ObjectId, value: Option<&str>) {
        {
            let o = self.object(obj);
            if o.cloned || !o.repr.as_ref().map_or(false, xml::is_element) {
                return;
            }
            if o.id.as_deref() == value {
                return;
            }
        }

        let mut new_id = value.filter(|s| !s.is_empty()).map(str::to_string);

        if let Some(ref id) = new_id {
            if let Some(conflict) = self.object_by_id(id).filter(|&c| c != obj) {
                if !self.seeking {
                    self.ref_object(conflict);
                    if let Some(conflict_repr) = self.object(conflict).repr.clone() {
                        let fresh = self.unique_id(&conflict_repr, None);
                        spobject_log!(
                            self.session,
                            "id \"{}\" is taken over, renaming its owner to \"{}\"",
                            id,
                            fresh
                        );
                        xml::set_attribute(&conflict_repr, "id", Some(&fresh), self);
                    }
                    self.unref_object(conflict);
                }
            }
        }

        if let Some(ref id) = new_id {
            if self.id_owner(id).map_or(false, |o| o != obj) {
                if !self.seeking {
                    tracing::warn!("could not free id \"{}\" for {}", id, obj);
                }
                new_id = None;
            }
        }

        if let Some(old) = self.object_mut(obj).id.take() {
            if self.id_owner(&old) == Some(obj) {
                self.bind_object_to_id(&old, None);
            }
        }

        if let Some(id) = new_id {
            self.bind_object_to_id(&id, Some(obj));
            self.object_mut(obj).id = Some(id);
        }
    }

    /// Re-reads the style of `obj` from its repr and merges it with its parent's.
    pub(crate) fn read_style(&mut self, obj: ObjectId) {
        let repr = match self.object(obj).repr.clone() {
            Some(r) => r,
            None => return,
        };

        let mut style = if xml::is_element(&repr) {
            Style::from_repr(&repr)
        } else {
            Style::default()
        };

        if let Some(parent) = self.object(obj).parent {
            style.merge_from_parent(self.object(parent).style.as_ref());
        }

        self.object_mut(obj).style = Some(style);
        self.update_style_references(obj);
    }

    /// The id that the `xlink:href` or `href` attribute of `obj` points at.
    pub(crate) fn href_id(&self, obj: ObjectId) -> Option<String> {
        self.get_attribute(obj, "xlink:href")
            .or_else(|| self.get_attribute(obj, "href"))
            .and_then(|v| v.strip_prefix('#').map(str::to_string))
            .filter(|id| !id.is_empty())
    }

    /// Child of `obj` whose repr is `repr`.
    pub fn get_child_by_repr(&self, obj: ObjectId, repr: &ReprNode) -> Option<ObjectId> {
        let o = self.object(obj);

        // a <use> mirror shares its target's repr and may sit next to the target
        let has_repr = |c: &ObjectId| {
            let child = self.object(*c);
            child.cloned == o.cloned && child.repr.as_ref() == Some(repr)
        };

        match o.last_child() {
            Some(last) if has_repr(&last) => Some(last),
            _ => o.children.iter().copied().find(has_repr),
        }
    }

    /// The object of the nearest repr at or before `repr` that has one, among the
    /// children of `obj`.
    fn child_at_or_before(&self, obj: ObjectId, repr: Option<&ReprNode>) -> Option<ObjectId> {
        let mut cur = repr.cloned();

        while let Some(r) = cur {
            if let Some(child) = self.get_child_by_repr(obj, &r) {
                return Some(child);
            }
            cur = r.previous_sibling();
        }

        None
    }

    /// Creates and builds the object for a repr added under the repr of `obj`.
    pub(crate) fn build_child(&mut self, obj: ObjectId, child: &ReprNode, prev: Option<&ReprNode>) {
        let ochild = match self.new_object_for_repr(child) {
            Some(c) => c,
            None => return,
        };

        let prev = self.child_at_or_before(obj, prev);
        self.attach(obj, ochild, prev);
        self.unref_object(ochild);

        let cloned = self.object(obj).cloned;
        self.invoke_build(ochild, child, cloned);
    }

    pub(crate) fn remove_child_object(&mut self, obj: ObjectId, child: &ReprNode) {
        match self.get_child_by_repr(obj, child) {
            Some(ochild) => self.detach(obj, ochild),

            None => {
                if !matches!(xml::kind(child), ReprKind::Comment(_)) {
                    tracing::error!("removed {} has no object under {}", xml::name(child), obj);
                }
            }
        }
    }

    pub(crate) fn reorder_child_object(
        &mut self,
        obj: ObjectId,
        child: &ReprNode,
        new_prev: Option<&ReprNode>,
    ) {
        let ochild = match self.get_child_by_repr(obj, child) {
            Some(c) => c,
            None => return,
        };

        let prev = self.child_at_or_before(obj, new_prev);
        self.reorder(ochild, prev);
        self.emit_object_signal(ochild, ObjectSignal::PositionChanged);
    }

    /// Whether `ancestor` is a proper ancestor of `obj`.
    pub fn is_ancestor_of(&self, ancestor: ObjectId, obj: ObjectId) -> bool {
        let mut cur = self.object(obj).parent;

        while let Some(o) = cur {
            if o == ancestor {
                return true;
            }
            cur = self.object(o).parent;
        }

        false
    }

    fn ancestors_and_self(&self, obj: ObjectId) -> Vec<ObjectId> {
        let mut chain = vec![obj];
        let mut cur = self.object(obj).parent;

        while let Some(o) = cur {
            chain.push(o);
            cur = self.object(o).parent;
        }

        chain
    }

    /// The deepest object that is `a` or one of its ancestors and also `b` or one of
    /// its ancestors.
    pub fn nearest_common_ancestor(&self, a: ObjectId, b: ObjectId) -> Option<ObjectId> {
        let chain_a = self.ancestors_and_self(a);
        self.ancestors_and_self(b)
            .into_iter()
            .find(|o| chain_a.contains(o))
    }

    /// Document order of two objects.  An ancestor sorts after its descendants;
    /// objects without a common ancestor compare equal.
    pub fn compare_position(&self, first: ObjectId, second: ObjectId) -> Ordering {
        if first == second {
            return Ordering::Equal;
        }

        let ancestor = match self.nearest_common_ancestor(first, second) {
            Some(a) => a,
            None => return Ordering::Equal,
        };

        if ancestor == first {
            return Ordering::Greater;
        }
        if ancestor == second {
            return Ordering::Less;
        }

        let son_of = |obj: ObjectId| {
            self.ancestors_and_self(obj)
                .into_iter()
                .find(|&o| self.object(o).parent == Some(ancestor))
        };

        let index = |obj: Option<ObjectId>| obj.and_then(|o| self.child_index(ancestor, o));

        index(son_of(first)).cmp(&index(son_of(second)))
    }

    pub fn next_sibling(&self, obj: ObjectId) -> Option<ObjectId> {
        let parent = self.object(obj).parent?;
        let i = self.child_index(parent, obj)?;
        self.object(parent).children.get(i + 1).copied()
    }

    pub fn prev_sibling(&self, obj: ObjectId) -> Option<ObjectId> {
        let parent = self.object(obj).parent?;
        let i = self.child_index(parent, obj)?;
        i.checked_sub(1)
            .and_then(|i| self.object(parent).children.get(i).copied())
    }

    /// The children of `obj`, referenced for the caller, who must unref them.
    pub fn child_list(&mut self, obj: ObjectId) -> Vec<ObjectId> {
        let children = self.object(obj).children.clone();
        for &c in &children {
            self.ref_object(c);
        }
        children
    }

    /// Adds `repr` as the last child of the repr of `obj`, and returns the object
    /// built for it.
    pub fn append_child_repr(&mut self, obj: ObjectId, repr: ReprNode) -> Option<ObjectId> {
        let o = self.object(obj);
        if o.cloned {
            tracing::error!("cannot append a repr to cloned object {}", obj);
            return None;
        }

        let parent = o.repr.clone()?;
        xml::append_child(&parent, &repr, self);
        self.object_by_repr(&repr)
    }

    pub fn label(&self, obj: ObjectId) -> Option<&str> {
        self.object(obj).label()
    }

    /// Sets or removes the `inkscape:label` attribute.
    pub fn set_label(&mut self, obj: ObjectId, label: Option<&str>) {
        self.set_attribute(obj, "inkscape:label", label);
    }

    /// The label, or `#id`, or `<element name>`.
    pub fn default_label(&self, obj: ObjectId) -> String {
        let o = self.object(obj);

        if let Some(label) = o.label() {
            label.to_string()
        } else if let Some(id) = o.id() {
            format!("#{id}")
        } else {
            let name = o.repr().map(xml::name).unwrap_or_default();
            format!("<{name}>")
        }
    }

    /// Looks up a style property the way it is written on the reprs: the `style`
    /// attribute, then a presentation attribute, then the same on the parent.  An
    /// `inherit` value is skipped.
    pub fn get_style_property(&self, obj: ObjectId, key: &str, default: Option<&str>) -> Option<String> {
        let mut cur = Some(obj);

        while let Some(o) = cur {
            if let Some(style) = self.get_attribute(o, "style") {
                let declarations = css::parse_declarations(&style);
                if let Some(d) = css::find_declaration(&declarations, key) {
                    if d.value != "inherit" {
                        return Some(d.value.clone());
                    }
                }
            }

            if let Some(value) = self.get_attribute(o, key) {
                if value != "inherit" {
                    return Some(value);
                }
            }

            cur = self.object(o).parent;
        }

        default.map(str::to_string)
    }

    /// Writes the state of `obj` back to its repr, and returns the repr.
    ///
    /// With [`WriteFlags::BUILD`] the live repr is left alone: a copy of it is made,
    /// the kind writes into the copy, and the copy is returned.  Unless
    /// [`WriteFlags::EXT`] is also set the copy loses `inkscape:collect`.
    ///
    /// Cloned objects are never written.
    pub fn update_repr(&mut self, obj: ObjectId, flags: WriteFlags) -> Option<ReprNode> {
        let o = self.object(obj);
        if o.cloned {
            return None;
        }

        let live = match o.repr.clone() {
            Some(r) => r,
            None => {
                tracing::error!("cannot write unbuilt object {}", obj);
                return None;
            }
        };

        let repr = if flags.contains(WriteFlags::BUILD) {
            let copy = xml::duplicate(&live);
            if !flags.contains(WriteFlags::EXT) {
                xml::set_attribute(&copy, "inkscape:collect", None, &mut xml::NullObserver);
            }
            copy
        } else {
            self.write_base(obj, &live, flags);
            live
        };

        let class = self.object(obj).kind().class();
        class.write(self, obj, &repr, flags);

        Some(repr)
    }

    fn write_base(&mut self, obj: ObjectId, repr: &ReprNode, flags: WriteFlags) {
        if !xml::is_element(repr) {
            return;
        }

        let o = self.object(obj);
        let id = o.id.clone();
        let space = o.xml_space;
        let label = o.label.clone();
        let collect =
            flags.contains(WriteFlags::EXT) && o.collection_policy == CollectionPolicy::AlwaysCollect;
        let style = o.style.as_ref().map(Style::to_style_string);

        xml::set_attribute(repr, "id", id.as_deref(), self);

        if space.set {
            let value = match space.value {
                XmlSpace::Default => "default",
                XmlSpace::Preserve => "preserve",
            };
            xml::set_attribute(repr, "xml:space", Some(value), self);
        }

        xml::set_attribute(repr, "inkscape:label", label.as_deref(), self);
        xml::set_attribute(
            repr,
            "inkscape:collect",
            if collect { Some("always") } else { None },
            self,
        );

        match style {
            Some(s) => {
                let value = Some(s.as_str()).filter(|s| !s.is_empty());
                xml::set_attribute(repr, "style", value, self);
            }
            None => tracing::warn!("object {} has no style to write", obj),
        }
    }
}
