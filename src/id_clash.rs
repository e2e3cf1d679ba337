//! Resolving id clashes when one document is pasted or imported into another.
//!
//! [`prevent_id_clashes`] renames every element of the imported document whose id is
//! already taken in the current one, and rewrites the references inside the imported
//! document so that they follow the rename.  It works in three passes:
//!
//! 1. Collect every reference by id in the imported document: href-like attributes,
//!    style properties and attributes with `url(#id)` values, and the style of
//!    clipboard elements.
//!
//! 2. Rename clashing ids by appending `-` and random digits until the id is free in
//!    both documents.  Gradients equivalent to the ones they clash with keep their id,
//!    so that pasting an object does not duplicate its gradient.
//!
//! 3. Rewrite the references to the ids that were renamed.

use std::collections::HashMap;

use crate::css;
use crate::document::Document;
use crate::element::ObjectKind;
use crate::error::RenameError;
use crate::gradient::{is_aligned, is_equivalent};
use crate::iri;
use crate::object::ObjectId;
use crate::xml;

/// Attributes whose value is `#id`.
const HREF_LIKE_ATTRIBUTES: &[&str] = &[
    "inkscape:connection-end",
    "inkscape:connection-start",
    "inkscape:href",
    "inkscape:path-effect",
    "inkscape:perspectiveID",
    "inkscape:tiled-clone-of",
    "xlink:href",
];

/// Style properties that may hold `url(#id)`.
const URL_PROPERTIES: &[&str] = &[
    "color",
    "fill",
    "filter",
    "marker-end",
    "marker-mid",
    "marker-start",
    "stroke",
];

/// Attributes that may hold `url(#id)`.
const URL_ATTRIBUTES: &[&str] = &[
    "clip-path",
    "color-profile",
    "cursor",
    "marker-end",
    "marker-mid",
    "marker-start",
    "mask",
];

/// Style properties that a clipboard element may reference with `url(#id)`.
const CLIPBOARD_PROPERTIES: &[&str] = &["color", "fill", "filter", "stroke"];

/// How a reference is written, which decides how it is rewritten.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdReferenceKind {
    /// `attribute="#id"`
    Href,
    /// A style property, in the `style` attribute or as a presentation attribute.
    Style,
    /// `attribute="url(#id)"`
    Url,
    /// A property in the `style` attribute of a clipboard element.
    Clipboard,
}

/// A place in a document that references an id.
#[derive(Debug, Clone, PartialEq)]
pub struct IdReference {
    pub kind: IdReferenceKind,
    pub element: ObjectId,
    /// The attribute or style property that holds the reference.
    pub attribute: &'static str,
}

/// References found in a document, by the id they reference.
pub type RefMap = HashMap<String, Vec<IdReference>>;

fn record(refmap: &mut RefMap, id: String, kind: IdReferenceKind, element: ObjectId, attribute: &'static str) {
    refmap.entry(id).or_default().push(IdReference {
        kind,
        element,
        attribute,
    });
}

/// Adds the references held by `elem` and its descendants to `refmap`.
///
/// Cloned objects are skipped, since their reprs are scanned through the originals.
pub fn find_references(doc: &Document, elem: ObjectId, refmap: &mut RefMap) {
    let o = doc.object(elem);
    if o.is_cloned() {
        return;
    }

    let repr = match o.repr() {
        Some(r) if xml::is_element(r) => r,
        _ => return,
    };

    if o.kind() == ObjectKind::Clipboard {
        if let Some(style) = xml::attribute(repr, "style") {
            let declarations = css::parse_declarations(&style);

            for &prop in CLIPBOARD_PROPERTIES {
                if let Some(id) =
                    css::find_declaration(&declarations, prop).and_then(|d| iri::url_fragment(&d.value))
                {
                    record(refmap, id, IdReferenceKind::Clipboard, elem, prop);
                }
            }
        }

        return;
    }

    for &attr in HREF_LIKE_ATTRIBUTES {
        if let Some(value) = xml::attribute(repr, attr) {
            if let Some(id) = value.strip_prefix('#').filter(|id| !id.is_empty()) {
                record(refmap, id.to_string(), IdReferenceKind::Href, elem, attr);
            }
        }
    }

    if let Some(style) = o.style() {
        for &prop in URL_PROPERTIES {
            if let Some(id) = style.url_reference(prop) {
                record(refmap, id, IdReferenceKind::Style, elem, prop);
            }
        }
    }

    for &attr in URL_ATTRIBUTES {
        if let Some(id) = xml::attribute(repr, attr).and_then(|v| iri::url_fragment(&v)) {
            record(refmap, id, IdReferenceKind::Url, elem, attr);
        }
    }

    for &child in o.children() {
        find_references(doc, child, refmap);
    }
}

/// Whether the gradient `elem` of `imported` can reuse `existing` instead of being
/// renamed.
fn is_same_gradient(imported: &Document, elem: ObjectId, current: &Document, existing: ObjectId) -> bool {
    imported.object(elem).kind().is_gradient()
        && current.object(existing).kind().is_gradient()
        && is_equivalent(current, existing, imported, elem)
        && is_aligned(current, existing, imported, elem)
}

fn change_clashing_ids(
    imported: &mut Document,
    current: &Document,
    elem: ObjectId,
    refmap: &RefMap,
    changes: &mut Vec<(ObjectId, String)>,
) {
    let id = imported.object(elem).id().map(str::to_string);

    if let Some(old_id) = id {
        if let Some(existing) = current.object_by_id(&old_id) {
            if !is_same_gradient(imported, elem, current, existing) {
                let mut new_id = format!("{old_id}-");
                loop {
                    new_id.push(imported.session_mut().random_digit());
                    if current.object_by_id(&new_id).is_none()
                        && imported.object_by_id(&new_id).is_none()
                    {
                        break;
                    }
                }

                imported.set_attribute(elem, "id", Some(&new_id));

                if refmap.contains_key(&old_id) {
                    changes.push((elem, old_id));
                }
            }
        }
    }

    for child in imported.object(elem).children().to_vec() {
        if imported.is_alive(child) {
            change_clashing_ids(imported, current, child, refmap, changes);
        }
    }
}

/// Points the references in `refmap` to the old ids in `changes` at the new ids of
/// the renamed elements.
fn fix_up_refs(doc: &mut Document, refmap: &RefMap, changes: &[(ObjectId, String)]) {
    for (elem, old_id) in changes {
        let new_id = match doc.object(*elem).id() {
            Some(id) => id.to_string(),
            None => continue,
        };

        let references = match refmap.get(old_id) {
            Some(r) => r,
            None => continue,
        };

        for r in references {
            if !doc.is_alive(r.element) {
                continue;
            }

            match r.kind {
                IdReferenceKind::Href => {
                    doc.set_attribute(r.element, r.attribute, Some(&format!("#{new_id}")));
                }

                IdReferenceKind::Style => {
                    doc.set_style_property_url(r.element, r.attribute, &new_id);
                }

                IdReferenceKind::Url => {
                    doc.set_attribute(r.element, r.attribute, Some(&format!("url(#{new_id})")));
                }

                IdReferenceKind::Clipboard => {
                    let style = doc.get_attribute(r.element, "style").unwrap_or_default();
                    let mut declarations = css::parse_declarations(&style);
                    css::set_declaration(&mut declarations, r.attribute, &format!("url(#{new_id})"));
                    let style = css::write_declarations(&declarations);
                    doc.set_attribute(r.element, "style", Some(&style));
                }
            }
        }
    }
}

/// Renames the ids of `imported` that are taken in `current`, and updates the
/// references within `imported` to follow.
pub fn prevent_id_clashes(imported: &mut Document, current: &Document) {
    let root = imported.root();

    let mut refmap = RefMap::new();
    find_references(imported, root, &mut refmap);

    let mut changes = Vec::new();
    change_clashing_ids(imported, current, root, &refmap, &mut changes);

    fix_up_refs(imported, &refmap, &changes);
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

/// Gives `elem` a new id based on `new_name`, and updates the references to it.
///
/// Characters that cannot go in an id are replaced with `_`.  If the id is taken,
/// `-` and random digits are appended.  Returns the id that was set.
///
/// Cloned objects and text nodes are refused, since they have no `id` attribute of
/// their own.
pub fn rename_id(doc: &mut Document, elem: ObjectId, new_name: &str) -> Result<String, RenameError> {
    let o = doc.object(elem);
    if o.is_cloned() || !o.repr().map_or(false, xml::is_element) {
        tracing::warn!("{} cannot carry an id of its own", elem);
        return Err(RenameError::NoOwnId);
    }

    if new_name.is_empty() {
        tracing::warn!("refusing to give {} an empty id", elem);
        return Err(RenameError::Empty);
    }

    let name: String = new_name
        .chars()
        .map(|c| if is_id_char(c) { c } else { '_' })
        .collect();

    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        tracing::warn!("refusing to give {} the id \"{}\"", elem, name);
        return Err(RenameError::InvalidStart(name));
    }

    let old_id = doc.object(elem).id().map(str::to_string);
    if old_id.as_deref() == Some(name.as_str()) {
        return Ok(name);
    }

    let mut refmap = RefMap::new();
    let root = doc.root();
    find_references(doc, root, &mut refmap);

    let mut new_id = name;
    if doc.object_by_id(&new_id).map_or(false, |o| o != elem) {
        new_id.push('-');
        loop {
            new_id.push(doc.session_mut().random_digit());
            if doc.object_by_id(&new_id).is_none() {
                break;
            }
        }
    }

    doc.set_attribute(elem, "id", Some(&new_id));

    if let Some(old_id) = old_id {
        fix_up_refs(doc, &refmap, &[(elem, old_id)]);
    }

    Ok(new_id)
}

/// Points the style properties that reference `from` at `to` instead.  References
/// from other attributes are left alone.
pub fn change_def_references(doc: &mut Document, from: ObjectId, to: ObjectId) {
    let (old_id, new_id) = match (doc.object(from).id(), doc.object(to).id()) {
        (Some(f), Some(t)) => (f.to_string(), t.to_string()),
        _ => return,
    };

    let mut refmap = RefMap::new();
    let root = doc.root();
    find_references(doc, root, &mut refmap);

    if let Some(references) = refmap.get(&old_id) {
        for r in references {
            if r.kind == IdReferenceKind::Style && doc.is_alive(r.element) {
                doc.set_style_property_url(r.element, r.attribute, &new_id);
            }
        }
    }
}
