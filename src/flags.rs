//! Dirty and write flags for objects.

use bitflags::bitflags;

bitflags! {
    /// Bits carried by `uflags` (update pending) and `mflags` (notification pending).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u8 {
        /// The object itself changed.
        const MODIFIED = 1 << 0;
        /// Some descendant changed.
        const CHILD_MODIFIED = 1 << 1;
        /// Set only while an update walks down the tree; never requested.
        const PARENT_MODIFIED = 1 << 2;
        const STYLE_MODIFIED = 1 << 3;
        const VIEWPORT_MODIFIED = 1 << 4;
        const USER_MODIFIED_A = 1 << 5;
        const USER_MODIFIED_B = 1 << 6;
        const USER_MODIFIED_C = 1 << 7;
    }
}

impl ObjectFlags {
    /// Everything that can be stored on an object.
    pub const MODIFIED_STATE: ObjectFlags = ObjectFlags::all().difference(ObjectFlags::PARENT_MODIFIED);

    /// Everything that may be passed down to children.
    pub const MODIFIED_CASCADE: ObjectFlags =
        ObjectFlags::all().difference(ObjectFlags::MODIFIED.union(ObjectFlags::CHILD_MODIFIED));

    /// Flags to pass to the children of an object updated with `self`.
    pub fn for_children(self) -> ObjectFlags {
        let mut flags = self;
        if flags.contains(ObjectFlags::MODIFIED) {
            flags |= ObjectFlags::PARENT_MODIFIED;
        }
        flags & ObjectFlags::MODIFIED_CASCADE
    }

    pub(crate) fn is_dirty(self) -> bool {
        self.intersects(ObjectFlags::MODIFIED | ObjectFlags::CHILD_MODIFIED)
    }
}

bitflags! {
    /// Controls what [`Document::update_repr`](crate::document::Document::update_repr)
    /// writes back.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WriteFlags: u8 {
        const BUILD = 1 << 0;
        /// Also write Inkscape extension attributes such as `inkscape:collect`.
        const EXT = 1 << 1;
        const ALL = 1 << 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_masks() {
        assert_eq!(ObjectFlags::all().bits(), 0xff);
        assert!(!ObjectFlags::MODIFIED_STATE.contains(ObjectFlags::PARENT_MODIFIED));
        assert!(!ObjectFlags::MODIFIED_CASCADE.intersects(ObjectFlags::MODIFIED));
        assert!(!ObjectFlags::MODIFIED_CASCADE.intersects(ObjectFlags::CHILD_MODIFIED));
        assert!(ObjectFlags::MODIFIED_CASCADE.contains(ObjectFlags::STYLE_MODIFIED));
    }

    #[test]
    fn modified_parent_turns_into_parent_modified() {
        let flags = (ObjectFlags::MODIFIED | ObjectFlags::STYLE_MODIFIED).for_children();
        assert_eq!(
            flags,
            ObjectFlags::PARENT_MODIFIED | ObjectFlags::STYLE_MODIFIED
        );

        assert_eq!(ObjectFlags::CHILD_MODIFIED.for_children(), ObjectFlags::empty());
    }
}
