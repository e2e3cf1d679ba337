//! References that objects hold on other objects by id.
//!
//! An object that points at another one (a `<use>` through `xlink:href`, a shape
//! through `fill:url(#grad)`) holds a [`HeldRef`] in one of its [`RefSlot`]s.  The
//! reference keeps the id it asked for even when nothing has that id, and the document
//! keeps a list of watchers per id, so that binding an object to the id later, or
//! unbinding it, retargets the reference.  A resolved reference counts as one
//! `hrefcount` on its target.

use crate::css;
use crate::document::Document;
use crate::object::ObjectId;
use crate::xml;

/// A place where an object can hold a reference.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RefSlot {
    /// `xlink:href` or `href`.
    Href,
    Fill,
    Stroke,
    Filter,
    MarkerStart,
    MarkerMid,
    MarkerEnd,
    ClipPath,
    Mask,
}

impl RefSlot {
    /// Slots fed from style properties.
    pub const STYLE: [RefSlot; 8] = [
        RefSlot::Fill,
        RefSlot::Stroke,
        RefSlot::Filter,
        RefSlot::MarkerStart,
        RefSlot::MarkerMid,
        RefSlot::MarkerEnd,
        RefSlot::ClipPath,
        RefSlot::Mask,
    ];

    /// Name of the style property that feeds this slot.
    pub fn property(self) -> Option<&'static str> {
        match self {
            RefSlot::Href => None,
            RefSlot::Fill => Some("fill"),
            RefSlot::Stroke => Some("stroke"),
            RefSlot::Filter => Some("filter"),
            RefSlot::MarkerStart => Some("marker-start"),
            RefSlot::MarkerMid => Some("marker-mid"),
            RefSlot::MarkerEnd => Some("marker-end"),
            RefSlot::ClipPath => Some("clip-path"),
            RefSlot::Mask => Some("mask"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeldRef {
    pub(crate) slot: RefSlot,
    pub(crate) id: String,
    pub(crate) target: Option<ObjectId>,
}

impl HeldRef {
    pub fn slot(&self) -> RefSlot {
        self.slot
    }

    /// The id that was asked for.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The object currently bound to the id, if it was accepted.
    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }
}

impl Document {
    /// Makes `obj` reference the object with `id` from `slot`, or drop the reference if
    /// `id` is `None`.
    ///
    /// The kind's `reference_changed` hook runs if the resolved target changes.
    pub fn set_reference(&mut self, obj: ObjectId, slot: RefSlot, id: Option<&str>) {
        let id = id.filter(|s| !s.is_empty());

        if self.object(obj).reference(slot).map(|r| r.id.as_str()) == id {
            return;
        }

        let old_target = self.take_reference(obj, slot);
        let new_target = match id {
            Some(id) => self.hold_reference(obj, slot, id),
            None => None,
        };

        if old_target != new_target {
            let class = self.object(obj).kind().class();
            class.reference_changed(self, obj, slot);
        }
    }

    /// The object that `obj` currently references from `slot`.
    pub fn reference_target(&self, obj: ObjectId, slot: RefSlot) -> Option<ObjectId> {
        self.object(obj).reference(slot).and_then(|r| r.target)
    }

    fn take_reference(&mut self, obj: ObjectId, slot: RefSlot) -> Option<ObjectId> {
        let o = self.object_mut(obj);
        let pos = o.references.iter().position(|r| r.slot == slot)?;
        let held = o.references.remove(pos);

        self.unwatch(&held.id, obj, slot);
        if let Some(target) = held.target {
            self.hunref(target, Some(obj));
        }

        held.target
    }

    fn hold_reference(&mut self, obj: ObjectId, slot: RefSlot, id: &str) -> Option<ObjectId> {
        self.watchers
            .entry(id.to_string())
            .or_default()
            .push((obj, slot));

        let target = self
            .object_by_id(id)
            .filter(|&t| self.accepts_reference(obj, slot, t));

        self.object_mut(obj).references.push(HeldRef {
            slot,
            id: id.to_string(),
            target,
        });

        if let Some(t) = target {
            self.href(t, Some(obj));
        }

        target
    }

    fn unwatch(&mut self, id: &str, obj: ObjectId, slot: RefSlot) {
        if let Some(list) = self.watchers.get_mut(id) {
            list.retain(|&(o, s)| !(o == obj && s == slot));
            if list.is_empty() {
                self.watchers.remove(id);
            }
        }
    }

    /// Whether `referrer` may point at `target` from `slot`.
    ///
    /// An href may not point at the referrer itself, at one of its ancestors, or at an
    /// object whose repr one of its ancestors mirrors: a `<use>` would end up cloning
    /// itself.
    pub(crate) fn accepts_reference(&self, referrer: ObjectId, slot: RefSlot, target: ObjectId) -> bool {
        if slot != RefSlot::Href {
            return true;
        }

        let target_repr = self.object(target).repr.clone();

        let mut cur = Some(referrer);
        while let Some(o) = cur {
            if o == target {
                return false;
            }

            let obj = self.object(o);
            if target_repr.is_some() && obj.repr == target_repr {
                return false;
            }

            cur = obj.parent;
        }

        true
    }

    /// Points the watchers of `id` at `new_target`.  Called when the id gets bound to
    /// an object or unbound.
    pub(crate) fn retarget_watchers(&mut self, id: &str, new_target: Option<ObjectId>) {
        let watchers = self.watchers.get(id).cloned().unwrap_or_default();

        for (referrer, slot) in watchers {
            if !self.is_alive(referrer) {
                continue;
            }

            let old_target = match self.object(referrer).reference(slot) {
                Some(r) if r.id == id => r.target,
                _ => continue,
            };

            let target = new_target.filter(|&t| self.accepts_reference(referrer, slot, t));
            if target == old_target {
                continue;
            }

            self.set_held_target(referrer, slot, target);

            if let Some(old) = old_target {
                self.hunref(old, Some(referrer));
            }
            if let Some(new) = target {
                self.href(new, Some(referrer));
            }

            let class = self.object(referrer).kind().class();
            class.reference_changed(self, referrer, slot);
        }
    }

    /// Makes everything that references `target` let go of it.
    pub(crate) fn drop_references_to(&mut self, target: ObjectId) {
        let id = match self.object(target).id.clone() {
            Some(id) => id,
            None => return,
        };

        let watchers = self.watchers.get(&id).cloned().unwrap_or_default();

        for (referrer, slot) in watchers {
            if self.reference_target_of(referrer, slot) != Some(target) {
                continue;
            }

            self.set_held_target(referrer, slot, None);
            self.hunref(target, Some(referrer));

            let class = self.object(referrer).kind().class();
            class.reference_changed(self, referrer, slot);
        }
    }

    fn reference_target_of(&self, referrer: ObjectId, slot: RefSlot) -> Option<ObjectId> {
        self.try_object(referrer)
            .and_then(|o| o.reference(slot))
            .and_then(|r| r.target)
    }

    fn set_held_target(&mut self, obj: ObjectId, slot: RefSlot, target: Option<ObjectId>) {
        if let Some(r) = self
            .object_mut(obj)
            .references
            .iter_mut()
            .find(|r| r.slot == slot)
        {
            r.target = target;
        }
    }

    /// Drops every reference `obj` holds, without telling its kind.
    pub(crate) fn clear_references(&mut self, obj: ObjectId) {
        let held = std::mem::take(&mut self.object_mut(obj).references);

        for r in held {
            self.unwatch(&r.id, obj, r.slot);
            if let Some(target) = r.target {
                self.hunref(target, Some(obj));
            }
        }
    }

    /// Re-reads the style references of `obj` from its current style.
    pub(crate) fn update_style_references(&mut self, obj: ObjectId) {
        for slot in RefSlot::STYLE {
            let id = slot.property().and_then(|prop| {
                self.object(obj)
                    .style()
                    .and_then(|s| s.url_reference(prop))
            });

            self.set_reference(obj, slot, id.as_deref());
        }
    }

    /// Points style property `prop` of `obj` at `url(#target)`.
    ///
    /// The declaration in the `style` attribute is rewritten if there is one, else the
    /// presentation attribute if there is one; otherwise a declaration is added.
    pub fn set_style_property_url(&mut self, obj: ObjectId, prop: &str, target: &str) {
        let repr = match self.object(obj).repr.clone() {
            Some(r) => r,
            None => return,
        };

        let value = format!("url(#{target})");

        let mut declarations = xml::attribute(&repr, "style")
            .map(|s| css::parse_declarations(&s))
            .unwrap_or_default();

        if css::find_declaration(&declarations, prop).is_none()
            && xml::attribute(&repr, prop).is_some()
        {
            xml::set_attribute(&repr, prop, Some(&value), self);
        } else {
            css::set_declaration(&mut declarations, prop, &value);
            let style = css::write_declarations(&declarations);
            xml::set_attribute(&repr, "style", Some(&style), self);
        }
    }
}
