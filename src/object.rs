//! The live object that mirrors one repr node, and the arena that owns objects.
//!
//! Objects never point at each other directly.  A parent knows its children as an
//! ordered vector of [`ObjectId`] handles and a child knows its parent the same way.
//! The arena keeps one memory reference count per slot: attaching to a parent takes
//! one, the orphan queue takes one, and callers of
//! [`Document::ref_object`](crate::document::Document::ref_object) take one.  When it
//! drops to zero the slot is emptied and its generation bumped, so stale handles stop
//! resolving instead of pointing at a recycled object.
//!
//! The semantic reference counts (`hrefcount` and the subtree total) are separate
//! fields on [`Object`] and have nothing to do with memory.

use std::fmt;

use crate::element::{ObjectData, ObjectKind};
use crate::flags::ObjectFlags;
use crate::href::{HeldRef, RefSlot};
use crate::signals::Signals;
use crate::style::Style;
use crate::xml::ReprNode;

/// Generation-checked handle to an object in a document.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// When an object may be deleted by the orphan collector.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CollectionPolicy {
    /// Only deleted together with its parent.
    #[default]
    CollectWithParent,

    /// Deleted as soon as nothing references it or its descendants
    /// (`inkscape:collect="always"`).
    AlwaysCollect,
}

/// Value of the `xml:space` attribute.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum XmlSpace {
    #[default]
    Default,
    Preserve,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct XmlSpaceAttr {
    pub set: bool,
    pub value: XmlSpace,
}

/// One node of the object tree.
///
/// All mutation goes through [`Document`](crate::document::Document); this type only
/// exposes read accessors.
pub struct Object {
    pub(crate) kind: ObjectKind,
    pub(crate) data: ObjectData,

    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,

    pub(crate) repr: Option<ReprNode>,
    pub(crate) id: Option<String>,
    pub(crate) cloned: bool,
    pub(crate) released: bool,

    pub(crate) hrefcount: u32,
    pub(crate) total_hrefcount: u32,
    pub(crate) collection_policy: CollectionPolicy,

    pub(crate) uflags: ObjectFlags,
    pub(crate) mflags: ObjectFlags,

    pub(crate) xml_space: XmlSpaceAttr,
    pub(crate) label: Option<String>,
    pub(crate) style: Option<Style>,
    pub(crate) successor: Option<ObjectId>,

    pub(crate) references: Vec<HeldRef>,
    pub(crate) signals: Signals,
}

impl Object {
    pub(crate) fn new(kind: ObjectKind, data: ObjectData) -> Object {
        Object {
            kind,
            data,
            parent: None,
            children: Vec::new(),
            repr: None,
            id: None,
            cloned: false,
            released: false,
            hrefcount: 0,
            total_hrefcount: 0,
            collection_policy: CollectionPolicy::default(),
            uflags: ObjectFlags::empty(),
            mflags: ObjectFlags::empty(),
            xml_space: XmlSpaceAttr::default(),
            label: None,
            style: Some(Style::default()),
            successor: None,
            references: Vec::new(),
            signals: Signals::default(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn first_child(&self) -> Option<ObjectId> {
        self.children.first().copied()
    }

    pub fn last_child(&self) -> Option<ObjectId> {
        self.children.last().copied()
    }

    /// The repr this object mirrors; `None` before build and after release.
    pub fn repr(&self) -> Option<&ReprNode> {
        self.repr.as_ref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_cloned(&self) -> bool {
        self.cloned
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn hrefcount(&self) -> u32 {
        self.hrefcount
    }

    pub fn total_hrefcount(&self) -> u32 {
        self.total_hrefcount
    }

    pub fn is_referenced(&self) -> bool {
        self.hrefcount > 0
    }

    pub fn collection_policy(&self) -> CollectionPolicy {
        self.collection_policy
    }

    pub fn uflags(&self) -> ObjectFlags {
        self.uflags
    }

    pub fn mflags(&self) -> ObjectFlags {
        self.mflags
    }

    pub fn xml_space(&self) -> XmlSpace {
        self.xml_space.value
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn style(&self) -> Option<&Style> {
        self.style.as_ref()
    }

    pub fn successor(&self) -> Option<ObjectId> {
        self.successor
    }

    /// The reference held in `slot`, resolved or still pending.
    pub fn reference(&self, slot: RefSlot) -> Option<&HeldRef> {
        self.references.iter().find(|r| r.slot == slot)
    }

    pub fn references(&self) -> &[HeldRef] {
        &self.references
    }
}

struct Entry {
    refcount: u32,
    object: Object,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Owner of all the objects of one document.
#[derive(Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Arena {
    /// Stores `object` with a reference count of one, owned by the caller.
    pub fn insert(&mut self, object: Object) -> ObjectId {
        let entry = Some(Entry {
            refcount: 1,
            object,
        });

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = entry;
            ObjectId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry,
            });
            ObjectId {
                index,
                generation: 0,
            }
        }
    }

    fn entry(&self, id: ObjectId) -> Option<&Entry> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entry.as_ref())
    }

    fn entry_mut(&mut self, id: ObjectId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entry.as_mut())
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.entry(id).map(|e| &e.object)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.entry_mut(id).map(|e| &mut e.object)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.entry(id).is_some()
    }

    pub fn refcount(&self, id: ObjectId) -> Option<u32> {
        self.entry(id).map(|e| e.refcount)
    }

    pub fn ref_(&mut self, id: ObjectId) {
        match self.entry_mut(id) {
            Some(e) => e.refcount += 1,
            None => panic!("tried to ref stale object handle {id}"),
        }
    }

    /// Drops one reference; returns the object if this freed its slot.
    pub fn unref(&mut self, id: ObjectId) -> Option<Object> {
        let slot = match self.slots.get_mut(id.index as usize) {
            Some(s) if s.generation == id.generation && s.entry.is_some() => s,
            _ => panic!("tried to unref stale object handle {id}"),
        };

        let entry = slot.entry.as_mut()?;
        assert!(entry.refcount > 0);
        entry.refcount -= 1;

        if entry.refcount == 0 {
            let freed = slot.entry.take().map(|e| e.object);
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
            freed
        } else {
            None
        }
    }

    /// Handles of all live objects, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry.as_ref().map(|_| ObjectId {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }
}
