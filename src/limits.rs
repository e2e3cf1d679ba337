//! Processing limits to keep pathological documents from running away.
//!
//! Documents can chain references (a gradient whose stops come from another gradient,
//! which takes them from a third one...) and update handlers can keep re-dirtying the
//! tree.  These limits bound that work.

/// Maximum number of `xlink:href` hops followed when resolving a gradient's stops.
pub const MAX_HREF_CHAIN: usize = 64;

/// Maximum number of update/modified passes run by a single
/// [`Document::ensure_up_to_date`](crate::document::Document::ensure_up_to_date).
pub const MAX_UPDATE_ITERATIONS: usize = 32;
