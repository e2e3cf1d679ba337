//! Object kinds and the hooks each kind implements.
//!
//! Every object has an [`ObjectKind`], picked from the element name of its repr when
//! the object is created, and per-kind state in [`ObjectData`].  The behavior of a
//! kind lives in an implementation of [`ObjectClass`].  Hooks get the document and
//! the object's handle rather than `&mut self`, since most of them need to look at
//! other objects too.
//!
//! The document always runs the generic part of each operation itself (reading
//! `inkscape:label`, building children, detaching children on release...) and calls
//! the kind's hook for the rest.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::document::Document;
use crate::error::UpdateError;
use crate::flags::{ObjectFlags, WriteFlags};
use crate::gradient::{GradientData, LinearGradient, RadialGradient, Stop, StopData};
use crate::href::RefSlot;
use crate::object::ObjectId;
use crate::structure::{
    Clipboard, ColorProfile, Defs, Filter, Generic, Group, Pattern, Root, Script, Shape,
    StyleElem, Use, UseData,
};
use crate::text::{Desc, StringData, StringNode, Title};
use crate::update::UpdateContext;
use crate::xml::{self, ReprKind, ReprNode};

/// The closed set of object kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Root,
    Defs,
    Group,
    Shape,
    Use,
    LinearGradient,
    RadialGradient,
    Stop,
    Pattern,
    Filter,
    StyleElem,
    Script,
    ColorProfile,
    Title,
    Desc,
    Clipboard,
    /// A text node.
    String,
    /// Any element we don't have a more specific kind for.
    Generic,
}

impl ObjectKind {
    pub(crate) fn class(self) -> &'static dyn ObjectClass {
        match self {
            ObjectKind::Root => &Root,
            ObjectKind::Defs => &Defs,
            ObjectKind::Group => &Group,
            ObjectKind::Shape => &Shape,
            ObjectKind::Use => &Use,
            ObjectKind::LinearGradient => &LinearGradient,
            ObjectKind::RadialGradient => &RadialGradient,
            ObjectKind::Stop => &Stop,
            ObjectKind::Pattern => &Pattern,
            ObjectKind::Filter => &Filter,
            ObjectKind::StyleElem => &StyleElem,
            ObjectKind::Script => &Script,
            ObjectKind::ColorProfile => &ColorProfile,
            ObjectKind::Title => &Title,
            ObjectKind::Desc => &Desc,
            ObjectKind::Clipboard => &Clipboard,
            ObjectKind::String => &StringNode,
            ObjectKind::Generic => &Generic,
        }
    }

    pub fn is_gradient(self) -> bool {
        matches!(self, ObjectKind::LinearGradient | ObjectKind::RadialGradient)
    }
}

/// Per-kind state of an object.
#[derive(Debug)]
pub enum ObjectData {
    None,
    Gradient(Box<GradientData>),
    Stop(StopData),
    Use(UseData),
    String(StringData),
}

/// Borrows the `ObjectData` of an object as a specific variant.
///
/// Panics if the object has different data; callers check the kind first.
macro_rules! borrow_data_as {
    ($doc:expr, $obj:expr, $variant:ident) => {
        match $doc.object($obj).data {
            $crate::element::ObjectData::$variant(ref d) => d,
            _ => panic!("tried to borrow_data_as {}", stringify!($variant)),
        }
    };
}

macro_rules! borrow_data_as_mut {
    ($doc:expr, $obj:expr, $variant:ident) => {
        match $doc.object_mut($obj).data {
            $crate::element::ObjectData::$variant(ref mut d) => d,
            _ => panic!("tried to borrow_data_as_mut {}", stringify!($variant)),
        }
    };
}

pub(crate) use borrow_data_as;
pub(crate) use borrow_data_as_mut;

/// The hooks of an object kind.
///
/// All hooks have defaults; the child hooks default to keeping the object's children
/// in sync with its repr's children.
pub trait ObjectClass {
    /// Called once the object is bound to its repr and its children exist.
    fn build(&self, _doc: &mut Document, _obj: ObjectId) {}

    /// Drops whatever the kind holds on other objects.  Runs before the children are
    /// detached.
    fn release(&self, _doc: &mut Document, _obj: ObjectId) {}

    /// An attribute was read, at build time or because it changed.
    fn set(&self, _doc: &mut Document, _obj: ObjectId, _key: &str, _value: Option<&str>) {}

    fn update(
        &self,
        _doc: &mut Document,
        _obj: ObjectId,
        _ctx: &mut UpdateContext,
        _flags: ObjectFlags,
    ) -> Result<(), UpdateError> {
        Ok(())
    }

    fn modified(&self, _doc: &mut Document, _obj: ObjectId, _flags: ObjectFlags) {}

    /// Writes kind-specific state back to `repr`.
    fn write(&self, _doc: &mut Document, _obj: ObjectId, _repr: &ReprNode, _flags: WriteFlags) {}

    fn child_added(
        &self,
        doc: &mut Document,
        obj: ObjectId,
        child: &ReprNode,
        prev: Option<&ReprNode>,
    ) {
        doc.build_child(obj, child, prev);
    }

    fn remove_child(&self, doc: &mut Document, obj: ObjectId, child: &ReprNode) {
        doc.remove_child_object(obj, child);
    }

    fn order_changed(
        &self,
        doc: &mut Document,
        obj: ObjectId,
        child: &ReprNode,
        _old_prev: Option<&ReprNode>,
        new_prev: Option<&ReprNode>,
    ) {
        doc.reorder_child_object(obj, child, new_prev);
    }

    /// The content of the object's text repr changed.
    fn read_content(&self, _doc: &mut Document, _obj: ObjectId) {}

    /// A reference held by the object now points somewhere else, or nowhere.
    fn reference_changed(&self, _doc: &mut Document, _obj: ObjectId, _slot: RefSlot) {}
}

type ObjectCreateFn = fn() -> (ObjectKind, ObjectData);

macro_rules! c {
    ($name:ident, $kind:ident) => {
        pub fn $name() -> (ObjectKind, ObjectData) {
            (ObjectKind::$kind, ObjectData::None)
        }
    };

    ($name:ident, $kind:ident, $data:expr) => {
        pub fn $name() -> (ObjectKind, ObjectData) {
            (ObjectKind::$kind, $data)
        }
    };
}

mod creators {
    use super::*;

    c!(create_clipboard,        Clipboard);
    c!(create_color_profile,    ColorProfile);
    c!(create_defs,             Defs);
    c!(create_desc,             Desc);
    c!(create_filter,           Filter);
    c!(create_generic,          Generic);
    c!(create_group,            Group);
    c!(create_linear_gradient,  LinearGradient, ObjectData::Gradient(Box::new(GradientData::linear())));
    c!(create_pattern,          Pattern);
    c!(create_radial_gradient,  RadialGradient, ObjectData::Gradient(Box::new(GradientData::radial())));
    c!(create_root,             Root);
    c!(create_script,           Script);
    c!(create_shape,            Shape);
    c!(create_stop,             Stop, ObjectData::Stop(StopData::default()));
    c!(create_string,           String, ObjectData::String(StringData::default()));
    c!(create_style,            StyleElem);
    c!(create_title,            Title);
    c!(create_use,              Use, ObjectData::Use(UseData::default()));
}

use creators::*;

static OBJECT_CREATORS: Lazy<HashMap<&'static str, ObjectCreateFn>> = Lazy::new(|| {
    let creators_table: Vec<(&str, ObjectCreateFn)> = vec![
        // name,                    create_fn
        ("inkscape:clipboard",      create_clipboard),
        ("inkscape:color-profile",  create_color_profile),
        ("svg:a",                   create_group),
        ("svg:circle",              create_shape),
        ("svg:clipPath",            create_group),
        ("svg:color-profile",       create_color_profile),
        ("svg:defs",                create_defs),
        ("svg:desc",                create_desc),
        ("svg:ellipse",             create_shape),
        ("svg:filter",              create_filter),
        ("svg:g",                   create_group),
        ("svg:image",               create_shape),
        ("svg:line",                create_shape),
        ("svg:linearGradient",      create_linear_gradient),
        ("svg:marker",              create_group),
        ("svg:mask",                create_group),
        ("svg:path",                create_shape),
        ("svg:pattern",             create_pattern),
        ("svg:polygon",             create_shape),
        ("svg:polyline",            create_shape),
        ("svg:radialGradient",      create_radial_gradient),
        ("svg:rect",                create_shape),
        ("svg:script",              create_script),
        ("svg:stop",                create_stop),
        ("svg:style",               create_style),
        ("svg:svg",                 create_root),
        ("svg:switch",              create_group),
        ("svg:symbol",              create_group),
        ("svg:text",                create_shape),
        ("svg:title",               create_title),
        ("svg:use",                 create_use),
    ];

    creators_table.into_iter().collect()
});

/// Picks the kind and initial state for an object mirroring `repr`.
///
/// Comments get no object.
pub fn create_object_data(repr: &ReprNode) -> Option<(ObjectKind, ObjectData)> {
    match xml::kind(repr) {
        ReprKind::Element(name) => Some(create_element_data(&name)),
        ReprKind::Text(_) => Some(create_string()),
        ReprKind::Comment(_) => None,
    }
}

/// Picks the kind and initial state for an element with the qualified `name`.
pub fn create_element_data(name: &str) -> (ObjectKind, ObjectData) {
    match OBJECT_CREATORS.get(name) {
        Some(create_fn) => create_fn(),
        None => create_generic(),
    }
}
