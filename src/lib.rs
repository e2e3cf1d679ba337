//! Live object tree for SVG documents.
//!
//! An SVG document is kept in two trees.  The *repr* tree in [`xml`] is the attributed
//! XML, which is what gets edited, serialized and recorded for undo.  The *object* tree
//! of a [`Document`] mirrors it node by node with typed objects that hold the parsed
//! state of each element, the references between elements, and the bookkeeping that
//! decides when they need updating or can be garbage-collected.
//!
//! The object tree never changes by itself: every change is made on the reprs, and the
//! document, being the [`xml::NodeObserver`] of the mutators, follows along.
//!
//! ```
//! use spobject::xml::{self, NullObserver};
//! use spobject::{Document, Session};
//!
//! let root = xml::new_element("svg:svg");
//! let grad = xml::element("svg:linearGradient", &[("id", "g")]);
//! xml::append_child(&root, &grad, &mut NullObserver);
//! let rect = xml::element("svg:rect", &[("id", "r"), ("style", "fill:url(#g)")]);
//! xml::append_child(&root, &rect, &mut NullObserver);
//!
//! let mut doc = Document::with_session(root, Session::with_seed(1));
//! let g = doc.object_by_id("g").unwrap();
//! assert_eq!(doc.object(g).hrefcount(), 1);
//!
//! let r = doc.object_by_id("r").unwrap();
//! doc.set_attribute(r, "style", Some("fill:red"));
//! assert_eq!(doc.object(g).hrefcount(), 0);
//!
//! doc.ensure_up_to_date();
//! ```
//!
//! # Ids
//!
//! Every element gets an id when it is built, and no two objects in a document share
//! one: a missing or taken id is replaced by the element name and a number.  When
//! content from one document goes into another, [`id_clash::prevent_id_clashes`]
//! renames what would collide and fixes up the references.
//!
//! # Updates
//!
//! Changes only mark objects dirty.  [`Document::ensure_up_to_date`] runs the update
//! and modified passes described in [`update`], and deletes orphans: objects marked
//! `inkscape:collect="always"` that nothing references anymore.

#![allow(rustdoc::private_intra_doc_links)]
#![allow(clippy::derive_partial_eq_without_eq)]
#![warn(nonstandard_style, rust_2018_idioms, unused)]
// Some lints no longer exist
#![warn(renamed_and_removed_lints)]
// Standalone lints
#![warn(trivial_casts, trivial_numeric_casts)]

pub use crate::document::Document;
pub use crate::element::{ObjectClass, ObjectData, ObjectKind};
pub use crate::error::{RenameError, UpdateError, ValueErrorKind};
pub use crate::flags::{ObjectFlags, WriteFlags};
pub use crate::gradient::{
    is_aligned, is_equivalent, normalize_color, Geometry, GradientData, LinearCoords, RadialCoords,
    StopColor, StopData,
};
pub use crate::href::{HeldRef, RefSlot};
pub use crate::length::{Length, LengthUnit};
pub use crate::object::{CollectionPolicy, Object, ObjectId, XmlSpace};
pub use crate::session::Session;
pub use crate::signals::SignalHandlerId;
pub use crate::structure::UseData;
pub use crate::style::Style;
pub use crate::text::StringData;
pub use crate::update::{UpdateContext, UpdateFailure, UpdateReport};

mod css;
mod document;
mod element;
mod error;
mod flags;
mod gradient;
mod href;
pub mod id_clash;
mod iri;
mod length;
mod limits;
mod log;
mod object;
mod parsers;
mod session;
mod signals;
mod structure;
mod style;
mod text;
mod tree;
pub mod update;
pub mod xml;
