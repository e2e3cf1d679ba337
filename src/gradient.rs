//! Gradient paint servers and their stops.
//!
//! A gradient may get its stops from another gradient through `xlink:href`; the
//! gradient that actually has the stops is its "vector".  Whether two gradients from
//! different documents are interchangeable is decided by [`is_equivalent`], which the
//! id clash resolver uses to avoid renaming imported gradients that are the same as
//! the ones already in the document.

use float_cmp::approx_eq;

use crate::document::Document;
use crate::element::{borrow_data_as, borrow_data_as_mut, ObjectClass, ObjectKind};
use crate::error::{UpdateError, ValueErrorKind};
use crate::flags::{ObjectFlags, WriteFlags};
use crate::href::RefSlot;
use crate::length::{Length, LengthUnit};
use crate::limits;
use crate::object::ObjectId;
use crate::parsers::{parse_attribute, UnitInterval};
use crate::structure::{is_href, resource_container_hooks};
use crate::update::UpdateContext;
use crate::xml::{self, ReprNode};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LinearCoords {
    pub x1: Option<Length>,
    pub y1: Option<Length>,
    pub x2: Option<Length>,
    pub y2: Option<Length>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RadialCoords {
    pub cx: Option<Length>,
    pub cy: Option<Length>,
    pub r: Option<Length>,
    pub fx: Option<Length>,
    pub fy: Option<Length>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Linear(LinearCoords),
    Radial(RadialCoords),
}

/// Attribute values that did not parse, kept until the attribute is set again.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct InvalidAttributes(Vec<(String, ValueErrorKind)>);

impl InvalidAttributes {
    fn record(&mut self, attr: &str, error: Option<ValueErrorKind>) {
        self.0.retain(|(a, _)| a != attr);
        if let Some(err) = error {
            self.0.push((attr.to_string(), err));
        }
    }

    fn check(&self) -> Result<(), UpdateError> {
        match self.0.first() {
            Some((attr, err)) => Err(UpdateError::InvalidValue {
                attr: attr.clone(),
                err: err.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// The attributes of a gradient, each `None` when not set on the element.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientData {
    pub transform: Option<String>,
    pub geometry: Geometry,
    invalid: InvalidAttributes,
}

impl GradientData {
    pub(crate) fn linear() -> GradientData {
        GradientData {
            transform: None,
            geometry: Geometry::Linear(LinearCoords::default()),
            invalid: InvalidAttributes::default(),
        }
    }

    pub(crate) fn radial() -> GradientData {
        GradientData {
            transform: None,
            geometry: Geometry::Radial(RadialCoords::default()),
            invalid: InvalidAttributes::default(),
        }
    }

    fn coord_mut(&mut self, attr: &str) -> Option<&mut Option<Length>> {
        match self.geometry {
            Geometry::Linear(ref mut l) => match attr {
                "x1" => Some(&mut l.x1),
                "y1" => Some(&mut l.y1),
                "x2" => Some(&mut l.x2),
                "y2" => Some(&mut l.y2),
                _ => None,
            },

            Geometry::Radial(ref mut r) => match attr {
                "cx" => Some(&mut r.cx),
                "cy" => Some(&mut r.cy),
                "r" => Some(&mut r.r),
                "fx" => Some(&mut r.fx),
                "fy" => Some(&mut r.fy),
                _ => None,
            },
        }
    }

    fn coords(&self) -> Vec<Option<Length>> {
        match self.geometry {
            Geometry::Linear(ref l) => vec![l.x1, l.y1, l.x2, l.y2],
            Geometry::Radial(ref r) => vec![r.cx, r.cy, r.r, r.fx, r.fy],
        }
    }

    /// Each geometry attribute with its value, or the value it takes when unset.
    fn coords_or_initial(&self) -> Vec<(&'static str, Option<Length>, Length)> {
        let percent = |v| Length::new(v, LengthUnit::Percent);

        match self.geometry {
            Geometry::Linear(ref l) => vec![
                ("x1", l.x1, percent(0.0)),
                ("y1", l.y1, percent(0.0)),
                ("x2", l.x2, percent(1.0)),
                ("y2", l.y2, percent(0.0)),
            ],

            Geometry::Radial(ref r) => {
                let cx = r.cx.unwrap_or(percent(0.5));
                let cy = r.cy.unwrap_or(percent(0.5));
                vec![
                    ("cx", r.cx, percent(0.5)),
                    ("cy", r.cy, percent(0.5)),
                    ("r", r.r, percent(0.5)),
                    ("fx", r.fx, cx),
                    ("fy", r.fy, cy),
                ]
            }
        }
    }
}

const LINEAR_ATTRS: &[&str] = &["x1", "y1", "x2", "y2"];
const RADIAL_ATTRS: &[&str] = &["cx", "cy", "r", "fx", "fy"];

fn build_gradient(doc: &mut Document, obj: ObjectId, attrs: &[&str]) {
    doc.read_attr(obj, "gradientTransform");
    for attr in attrs {
        doc.read_attr(obj, attr);
    }
    doc.read_attr(obj, "xlink:href");
}

fn set_gradient_attribute(doc: &mut Document, obj: ObjectId, key: &str, value: Option<&str>) {
    if is_href(key) {
        let id = doc.href_id(obj);
        doc.set_reference(obj, RefSlot::Href, id.as_deref());
    } else if key == "gradientTransform" {
        let transform = value.map(|v| v.split_whitespace().collect::<Vec<_>>().join(" "));
        borrow_data_as_mut!(doc, obj, Gradient).transform = transform;
    } else {
        let (parsed, error) = match value.map(parse_attribute::<Length>) {
            None => (None, None),
            Some(Ok(length)) => (Some(length), None),
            Some(Err(e)) => {
                warn_attribute(doc, obj, key, &e.to_string());
                (None, Some(e))
            }
        };

        let data = borrow_data_as_mut!(doc, obj, Gradient);
        match data.coord_mut(key) {
            Some(coord) => *coord = parsed,
            None => return,
        }
        data.invalid.record(key, error);
    }

    doc.request_display_update(obj, ObjectFlags::MODIFIED);
}

fn update_gradient(doc: &Document, obj: ObjectId) -> Result<(), UpdateError> {
    borrow_data_as!(doc, obj, Gradient).invalid.check()?;
    doc.gradient_vector(obj).map(|_| ())
}

fn write_gradient(doc: &mut Document, obj: ObjectId, repr: &ReprNode, flags: WriteFlags) {
    let data = borrow_data_as!(doc, obj, Gradient).clone();

    if let Some(ref transform) = data.transform {
        xml::set_attribute(repr, "gradientTransform", Some(transform.as_str()), doc);
    }

    for (attr, value, initial) in data.coords_or_initial() {
        let value = match value {
            Some(v) => Some(v),
            None if flags.contains(WriteFlags::ALL) => Some(initial),
            None => None,
        };

        if let Some(v) = value {
            xml::set_attribute(repr, attr, Some(&v.to_string()), doc);
        }
    }
}

fn warn_attribute(doc: &Document, obj: ObjectId, attr: &str, msg: &str) {
    tracing::warn!("ignoring attribute \"{}\" of {}: {}", attr, doc.default_label(obj), msg);
}

pub struct LinearGradient;

impl ObjectClass for LinearGradient {
    fn build(&self, doc: &mut Document, obj: ObjectId) {
        build_gradient(doc, obj, LINEAR_ATTRS);
    }

    fn set(&self, doc: &mut Document, obj: ObjectId, key: &str, value: Option<&str>) {
        set_gradient_attribute(doc, obj, key, value);
    }

    fn update(
        &self,
        doc: &mut Document,
        obj: ObjectId,
        _ctx: &mut UpdateContext,
        _flags: ObjectFlags,
    ) -> Result<(), UpdateError> {
        update_gradient(doc, obj)
    }

    fn write(&self, doc: &mut Document, obj: ObjectId, repr: &ReprNode, flags: WriteFlags) {
        write_gradient(doc, obj, repr, flags);
    }

    resource_container_hooks!();
}

pub struct RadialGradient;

impl ObjectClass for RadialGradient {
    fn build(&self, doc: &mut Document, obj: ObjectId) {
        build_gradient(doc, obj, RADIAL_ATTRS);
    }

    fn set(&self, doc: &mut Document, obj: ObjectId, key: &str, value: Option<&str>) {
        set_gradient_attribute(doc, obj, key, value);
    }

    fn update(
        &self,
        doc: &mut Document,
        obj: ObjectId,
        _ctx: &mut UpdateContext,
        _flags: ObjectFlags,
    ) -> Result<(), UpdateError> {
        update_gradient(doc, obj)
    }

    fn write(&self, doc: &mut Document, obj: ObjectId, repr: &ReprNode, flags: WriteFlags) {
        write_gradient(doc, obj, repr, flags);
    }

    resource_container_hooks!();
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct StopData {
    pub offset: f64,
    invalid: InvalidAttributes,
}

/// `<stop>`.  Its color and opacity come from the style.
pub struct Stop;

impl ObjectClass for Stop {
    fn build(&self, doc: &mut Document, obj: ObjectId) {
        doc.read_attr(obj, "offset");
    }

    fn set(&self, doc: &mut Document, obj: ObjectId, key: &str, value: Option<&str>) {
        if key != "offset" {
            return;
        }

        let (offset, error) = match value.map(parse_attribute::<UnitInterval>) {
            None => (0.0, None),
            Some(Ok(UnitInterval(o))) => (o, None),
            Some(Err(e)) => {
                warn_attribute(doc, obj, key, &e.to_string());
                (0.0, Some(e))
            }
        };

        let data = borrow_data_as_mut!(doc, obj, Stop);
        data.offset = offset;
        data.invalid.record(key, error);
        doc.request_display_update(obj, ObjectFlags::MODIFIED);
    }

    fn update(
        &self,
        doc: &mut Document,
        obj: ObjectId,
        _ctx: &mut UpdateContext,
        _flags: ObjectFlags,
    ) -> Result<(), UpdateError> {
        borrow_data_as!(doc, obj, Stop).invalid.check()
    }

    fn write(&self, doc: &mut Document, obj: ObjectId, repr: &ReprNode, _flags: WriteFlags) {
        let offset = borrow_data_as!(doc, obj, Stop).offset;
        xml::set_attribute(repr, "offset", Some(&offset.to_string()), doc);
    }
}

/// Color and opacity of a stop, after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct StopColor {
    pub color: String,
    pub opacity: f64,
}

static NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("blue", "#0000ff"),
    ("cyan", "#00ffff"),
    ("gray", "#808080"),
    ("green", "#008000"),
    ("grey", "#808080"),
    ("lime", "#00ff00"),
    ("magenta", "#ff00ff"),
    ("red", "#ff0000"),
    ("white", "#ffffff"),
    ("yellow", "#ffff00"),
];

/// Lowercases a color and expands `#abc` and a few color keywords to `#aabbcc`.
pub fn normalize_color(color: &str) -> String {
    let color = color.trim().to_ascii_lowercase();

    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() == 3 {
            return hex.chars().fold(String::from("#"), |mut s, c| {
                s.push(c);
                s.push(c);
                s
            });
        }
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == color)
        .map(|(_, hex)| hex.to_string())
        .unwrap_or(color)
}

impl Document {
    /// Whether `obj` is a gradient used as a swatch (`osb:paint` is set).
    pub fn is_swatch(&self, obj: ObjectId) -> bool {
        self.object(obj).kind().is_gradient() && self.get_attribute(obj, "osb:paint").is_some()
    }

    /// The stops that are direct children of `obj`.
    pub fn gradient_stops(&self, obj: ObjectId) -> Vec<ObjectId> {
        self.object(obj)
            .children()
            .iter()
            .copied()
            .filter(|&c| self.object(c).kind() == ObjectKind::Stop)
            .collect()
    }

    pub fn has_stops(&self, obj: ObjectId) -> bool {
        !self.gradient_stops(obj).is_empty()
    }

    /// Follows the href chain from `obj` to the gradient that has the stops.
    ///
    /// A gradient without stops anywhere in its chain is its own vector.
    pub fn gradient_vector(&self, obj: ObjectId) -> Result<ObjectId, UpdateError> {
        let mut chain = Vec::new();
        let mut current = obj;

        loop {
            if self.has_stops(current) {
                return Ok(current);
            }

            chain.push(current);

            let next = self
                .reference_target(current, RefSlot::Href)
                .filter(|&t| self.object(t).kind().is_gradient());

            match next {
                None => return Ok(obj),

                // an over-long chain is treated as a cycle
                Some(n) if chain.contains(&n) || chain.len() >= limits::MAX_HREF_CHAIN => {
                    return Err(UpdateError::CircularReference(self.default_label(obj)));
                }

                Some(n) => current = n,
            }
        }
    }

    pub fn stop_offset(&self, stop: ObjectId) -> f64 {
        borrow_data_as!(self, stop, Stop).offset
    }

    /// Effective color and opacity of a stop; black and opaque unless styled.
    pub fn stop_color(&self, stop: ObjectId) -> StopColor {
        let style = self.object(stop).style();

        let color = style
            .and_then(|s| s.specified("stop-color"))
            .map(normalize_color)
            .unwrap_or_else(|| String::from("#000000"));

        let opacity = style
            .and_then(|s| s.specified("stop-opacity"))
            .and_then(|v| parse_attribute::<UnitInterval>(v).ok())
            .map(|UnitInterval(o)| o)
            .unwrap_or(1.0);

        StopColor { color, opacity }
    }
}

/// Whether gradient `a` in `doc_a` can stand in for gradient `b` in `doc_b`.
///
/// Both must have the same number of their own stops, resolve to vectors whose stops
/// match, and either both be swatches or be aligned gradients of the same type.
pub fn is_equivalent(doc_a: &Document, a: ObjectId, doc_b: &Document, b: ObjectId) -> bool {
    let (kind_a, kind_b) = (doc_a.object(a).kind(), doc_b.object(b).kind());
    if !kind_a.is_gradient() || !kind_b.is_gradient() {
        return false;
    }

    if doc_a.gradient_stops(a).len() != doc_b.gradient_stops(b).len() {
        return false;
    }

    let (vector_a, vector_b) = match (doc_a.gradient_vector(a), doc_b.gradient_vector(b)) {
        (Ok(va), Ok(vb)) => (va, vb),
        _ => return false,
    };

    let swatch = doc_a.is_swatch(a);
    if swatch != doc_b.is_swatch(b) {
        return false;
    }

    if !swatch && (kind_a != kind_b || !is_aligned(doc_a, a, doc_b, b)) {
        return false;
    }

    let stops_a = doc_a.gradient_stops(vector_a);
    let stops_b = doc_b.gradient_stops(vector_b);

    stops_a.iter().zip(stops_b.iter()).all(|(&sa, &sb)| {
        let (ca, cb) = (doc_a.stop_color(sa), doc_b.stop_color(sb));

        approx_eq!(f64, doc_a.stop_offset(sa), doc_b.stop_offset(sb), ulps = 2)
            && ca.color == cb.color
            && (ca.opacity - cb.opacity).abs() < 0.001
    })
}

/// Whether two gradients have the same transform and geometry attributes.
///
/// An attribute must be set on both or on neither.  If only some of the geometry
/// attributes are set the gradients are not aligned, since the missing ones would be
/// taken from whatever they reference.
pub fn is_aligned(doc_a: &Document, a: ObjectId, doc_b: &Document, b: ObjectId) -> bool {
    if !doc_a.object(a).kind().is_gradient() || !doc_b.object(b).kind().is_gradient() {
        return false;
    }

    let (ga, gb) = (
        borrow_data_as!(doc_a, a, Gradient),
        borrow_data_as!(doc_b, b, Gradient),
    );

    if ga.transform != gb.transform {
        return false;
    }

    let same_type = matches!(
        (&ga.geometry, &gb.geometry),
        (Geometry::Linear(_), Geometry::Linear(_)) | (Geometry::Radial(_), Geometry::Radial(_))
    );
    if !same_type {
        return false;
    }

    let (ca, cb) = (ga.coords(), gb.coords());

    if ca.iter().zip(cb.iter()).any(|(x, y)| x.is_some() != y.is_some()) {
        return false;
    }

    if ca.iter().all(Option::is_some) {
        ca == cb
    } else {
        ca.iter().all(Option::is_none)
    }
}
