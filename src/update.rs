//! The two-phase update protocol.
//!
//! Changes mark objects dirty instead of being processed right away.  An object that
//! needs its computed state refreshed gets `MODIFIED` in its update flags, and each of
//! its ancestors gets `CHILD_MODIFIED`, up to the root, which asks the document for an
//! update.  An object that only needs to tell its observers gets the same marks in its
//! modified flags instead.
//!
//! [`Document::ensure_up_to_date`] then runs the update pass from the root, which
//! calls the per-kind `update` hooks top-down and moves the update flags into the
//! modified flags, and then the modified pass, which calls the `modified` hooks and
//! emits the modified signal.  Either may dirty the tree again, so both run until
//! the tree is clean, up to [`limits::MAX_UPDATE_ITERATIONS`] times.

use crate::document::Document;
use crate::error::UpdateError;
use crate::flags::ObjectFlags;
use crate::limits;
use crate::object::ObjectId;

/// State threaded through one update pass.
#[derive(Debug, Default)]
pub struct UpdateContext {
    depth: usize,
    failures: Vec<UpdateFailure>,
}

impl UpdateContext {
    pub fn new() -> UpdateContext {
        UpdateContext::default()
    }

    /// How deep in the tree the pass currently is; the root is at depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn enter(&mut self) {
        self.depth += 1;
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn record(&mut self, failure: UpdateFailure) {
        self.failures.push(failure);
    }
}

/// An `update` hook that returned an error.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFailure {
    pub object: ObjectId,
    pub id: Option<String>,
    pub error: UpdateError,
}

/// What went wrong while bringing a document up to date.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateReport {
    pub failures: Vec<UpdateFailure>,
}

impl UpdateReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Requests take exactly one of `MODIFIED` and `CHILD_MODIFIED`, and never
/// `PARENT_MODIFIED`.
fn is_valid_request(flags: ObjectFlags) -> bool {
    !flags.contains(ObjectFlags::PARENT_MODIFIED)
        && (flags.contains(ObjectFlags::MODIFIED) != flags.contains(ObjectFlags::CHILD_MODIFIED))
}

impl Document {
    /// Marks `obj` as needing an update pass, and its ancestors as having a
    /// descendant that needs one.
    pub fn request_display_update(&mut self, obj: ObjectId, flags: ObjectFlags) {
        if self.updating {
            tracing::warn!("update requested for {} during an update pass", obj);
        }

        if !is_valid_request(flags) {
            tracing::error!("invalid update request {:?} for {}", flags, obj);
            return;
        }

        let o = self.object_mut(obj);
        if o.released {
            tracing::error!("update requested for released object {}", obj);
            return;
        }

        let already_dirty = o.uflags.is_dirty();
        o.uflags |= flags;
        let parent = o.parent;

        if !already_dirty {
            match parent {
                Some(parent) => self.request_display_update(parent, ObjectFlags::CHILD_MODIFIED),
                None => self.request_document_update(),
            }
        }
    }

    /// Marks `obj` as needing a modified notification, and its ancestors as having a
    /// descendant that needs one.
    pub fn request_modified(&mut self, obj: ObjectId, flags: ObjectFlags) {
        if !is_valid_request(flags) {
            tracing::error!("invalid modified request {:?} for {}", flags, obj);
            return;
        }

        let o = self.object_mut(obj);
        if o.released {
            tracing::error!("modified requested for released object {}", obj);
            return;
        }

        let already_dirty = o.mflags.is_dirty();
        o.mflags |= flags;
        let parent = o.parent;

        if !already_dirty {
            match parent {
                Some(parent) => self.request_modified(parent, ObjectFlags::CHILD_MODIFIED),
                None => self.request_document_update(),
            }
        }
    }

    /// Runs the update pass on `obj` and the children that need it.
    ///
    /// `flags` are the ones cascaded from the parent.
    pub fn update_display(&mut self, obj: ObjectId, ctx: &mut UpdateContext, flags: ObjectFlags) {
        if !ObjectFlags::MODIFIED_CASCADE.contains(flags) {
            tracing::error!("cannot cascade {:?} into {}", flags, obj);
            return;
        }

        ctx.enter();

        let mut flags = flags;
        {
            let o = self.object_mut(obj);
            flags |= o.uflags;
            o.mflags |= o.uflags;
            o.uflags = ObjectFlags::empty();
        }

        if flags.contains(ObjectFlags::STYLE_MODIFIED | ObjectFlags::PARENT_MODIFIED) {
            let parent = self.object(obj).parent;
            if let Some(mut style) = self.object_mut(obj).style.take() {
                style.merge_from_parent(parent.and_then(|p| self.object(p).style.as_ref()));
                self.object_mut(obj).style = Some(style);
            }
        }

        let class = self.object(obj).kind().class();
        if let Err(error) = class.update(self, obj, ctx, flags) {
            let id = self.object(obj).id.clone();
            tracing::warn!("could not update {}: {}", self.default_label(obj), error);
            ctx.record(UpdateFailure {
                object: obj,
                id,
                error,
            });
        }

        let child_flags = flags.for_children();
        for child in self.object(obj).children.clone() {
            if !self.is_child_of(child, obj) {
                continue;
            }

            if !child_flags.is_empty() || self.object(child).uflags.is_dirty() {
                self.update_display(child, ctx, child_flags);
            }
        }

        ctx.leave();
    }

    /// Runs the modified pass on `obj` and the children that need it, emitting the
    /// modified signal on each of them after their children.
    pub fn emit_modified(&mut self, obj: ObjectId, flags: ObjectFlags) {
        let mut flags = flags;
        {
            let o = self.object_mut(obj);
            flags |= o.mflags;
            o.mflags = ObjectFlags::empty();
        }

        self.ref_object(obj);

        let class = self.object(obj).kind().class();
        class.modified(self, obj, flags);

        let child_flags = flags.for_children();
        for child in self.object(obj).children.clone() {
            if !self.is_child_of(child, obj) {
                continue;
            }

            if !child_flags.is_empty() || self.object(child).mflags.is_dirty() {
                self.emit_modified(child, child_flags);
            }
        }

        self.emit_modified_signal(obj, flags);
        self.unref_object(obj);
    }

    fn is_child_of(&self, child: ObjectId, parent: ObjectId) -> bool {
        self.try_object(child)
            .map_or(false, |c| !c.released && c.parent == Some(parent))
    }

    /// Runs update and modified passes until nothing is dirty, then collects orphans.
    ///
    /// Failing `update` hooks do not stop the passes; they are returned in the report.
    pub fn ensure_up_to_date(&mut self) -> UpdateReport {
        let mut report = UpdateReport::default();

        if self.ensuring {
            tracing::warn!("ensure_up_to_date called while already bringing the document up to date");
            return report;
        }
        self.ensuring = true;

        loop {
            let mut settled = false;

            for _ in 0..limits::MAX_UPDATE_ITERATIONS {
                let root = self.root;

                if self.object(root).uflags.is_dirty() {
                    let mut ctx = UpdateContext::new();
                    self.updating = true;
                    self.update_display(root, &mut ctx, ObjectFlags::empty());
                    self.updating = false;
                    report.failures.append(&mut ctx.failures);
                } else if !self.object(root).mflags.is_empty() {
                    self.emit_modified(root, ObjectFlags::empty());
                } else {
                    settled = true;
                    break;
                }
            }

            if !settled {
                tracing::warn!(
                    "document still dirty after {} update passes",
                    limits::MAX_UPDATE_ITERATIONS
                );
            }

            if self.collection_queue.is_empty() {
                break;
            }
            self.collect_orphans();

            if !settled {
                break;
            }
        }

        self.update_requested = false;
        self.ensuring = false;

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::xml::{self, NullObserver};

    use std::cell::RefCell;
    use std::rc::Rc;

    fn doc() -> Document {
        let root = xml::new_element("svg:svg");
        let g = xml::element("svg:g", &[("id", "g")]);
        xml::append_child(&g, &xml::element("svg:rect", &[("id", "r")]), &mut NullObserver);
        xml::append_child(&root, &g, &mut NullObserver);
        let mut doc = Document::with_session(root, Session::with_seed(5));
        doc.ensure_up_to_date();
        doc
    }

    #[test]
    fn request_marks_ancestors() {
        let mut doc = doc();
        let g = doc.object_by_id("g").unwrap();
        let r = doc.object_by_id("r").unwrap();
        let root = doc.root();
        assert!(!doc.update_requested());

        doc.request_display_update(r, ObjectFlags::MODIFIED);

        assert!(doc.object(r).uflags().contains(ObjectFlags::MODIFIED));
        assert_eq!(doc.object(g).uflags(), ObjectFlags::CHILD_MODIFIED);
        assert_eq!(doc.object(root).uflags(), ObjectFlags::CHILD_MODIFIED);
        assert!(doc.update_requested());

        // an already dirty object does not propagate again
        let count = doc.modified_request_count();
        doc.request_display_update(r, ObjectFlags::MODIFIED);
        assert_eq!(doc.modified_request_count(), count);
    }

    #[test]
    fn invalid_requests_are_ignored() {
        let mut doc = doc();
        let r = doc.object_by_id("r").unwrap();

        doc.request_display_update(r, ObjectFlags::MODIFIED | ObjectFlags::CHILD_MODIFIED);
        doc.request_modified(r, ObjectFlags::PARENT_MODIFIED | ObjectFlags::MODIFIED);
        doc.request_modified(r, ObjectFlags::STYLE_MODIFIED);

        assert!(doc.object(r).uflags().is_empty());
        assert!(doc.object(r).mflags().is_empty());
    }

    #[test]
    fn passes_clear_flags_and_emit_modified() {
        let mut doc = doc();
        let g = doc.object_by_id("g").unwrap();
        let r = doc.object_by_id("r").unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        for obj in [g, r] {
            let seen = seen.clone();
            doc.connect_modified(obj, move |_, o, flags| seen.borrow_mut().push((o, flags)));
        }

        doc.request_display_update(r, ObjectFlags::MODIFIED);
        let report = doc.ensure_up_to_date();
        assert!(report.is_clean());

        for obj in doc.objects().collect::<Vec<_>>() {
            assert!(doc.object(obj).uflags().is_empty());
            assert!(doc.object(obj).mflags().is_empty());
        }

        // children are notified before their parents
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, r);
        assert!(seen[0].1.contains(ObjectFlags::MODIFIED));
        assert_eq!(seen[1], (g, ObjectFlags::CHILD_MODIFIED));
        assert!(!doc.update_requested());
    }

    #[test]
    fn modified_cascades_parent_modified() {
        let mut doc = doc();
        let g = doc.object_by_id("g").unwrap();
        let r = doc.object_by_id("r").unwrap();

        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        doc.connect_modified(r, move |_, _, flags| *s.borrow_mut() = Some(flags));

        doc.request_modified(g, ObjectFlags::MODIFIED);
        doc.ensure_up_to_date();

        let flags = seen.borrow().unwrap();
        assert!(flags.contains(ObjectFlags::PARENT_MODIFIED));
        assert!(!flags.contains(ObjectFlags::MODIFIED));
    }

    #[test]
    fn style_change_reaches_children() {
        let mut doc = doc();
        let g = doc.object_by_id("g").unwrap();
        let r = doc.object_by_id("r").unwrap();

        doc.set_attribute(g, "style", Some("fill:blue"));
        doc.ensure_up_to_date();

        let style = doc.object(r).style().unwrap();
        assert_eq!(style.computed("fill"), Some("blue"));
    }

    #[test]
    fn failing_hooks_are_reported() {
        let root = xml::new_element("svg:svg");
        let a = xml::element("svg:linearGradient", &[("id", "a"), ("xlink:href", "#b")]);
        let b = xml::element("svg:linearGradient", &[("id", "b"), ("xlink:href", "#a")]);
        xml::append_child(&root, &a, &mut NullObserver);
        xml::append_child(&root, &b, &mut NullObserver);
        let mut doc = Document::with_session(root, Session::with_seed(5));

        let a = doc.object_by_id("a").unwrap();
        doc.request_display_update(a, ObjectFlags::MODIFIED);
        let report = doc.ensure_up_to_date();

        assert!(!report.is_clean());
        assert!(report
            .failures
            .iter()
            .any(|f| f.id.as_deref() == Some("a")
                && matches!(f.error, UpdateError::CircularReference(_))));

        // the pass went on and left the tree clean
        assert!(doc.object(doc.root()).uflags().is_empty());
    }
}
