//! Archive integrity checks.
//!
//! Run on the assembled package before anything is written. Any failure
//! aborts the export with [`Error::ArchiveIntegrity`]: a package that
//! violates these rules is unreadable, and no package is better than a
//! broken one.

use std::collections::HashSet;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::sanitize::is_xml_char;

use super::package::ManifestItem;

/// Everything the checks look at.
pub(crate) struct PackageView<'a> {
    pub manifest: &'a [ManifestItem],
    pub spine: &'a [String],
    /// Generated `toc.ncx` document.
    pub ncx: &'a str,
    /// Generated `nav.xhtml` document.
    pub nav: &'a str,
    /// `(path, content)` of every XML document in the package.
    pub documents: Vec<(&'a str, &'a str)>,
}

pub(crate) fn check_package(view: &PackageView<'_>) -> Result<()> {
    check_manifest(view.manifest)?;
    let spine_hrefs = check_spine(view.manifest, view.spine)?;
    if spine_hrefs.is_empty() {
        return Err(violation("spine is empty".to_string()));
    }
    let ncx_targets = link_targets(view.ncx, b"content", b"src")
        .map_err(|reason| violation(format!("toc.ncx is not well-formed: {reason}")))?;
    check_nav_order("toc.ncx", &ncx_targets, &spine_hrefs)?;
    let nav_targets = link_targets(view.nav, b"a", b"href")
        .map_err(|reason| violation(format!("nav.xhtml is not well-formed: {reason}")))?;
    check_nav_order("nav.xhtml", &nav_targets, &spine_hrefs)?;
    for (path, content) in &view.documents {
        check_well_formed(content).map_err(|reason| violation(format!("{path} is not well-formed: {reason}")))?;
    }
    Ok(())
}

fn violation(message: String) -> Error {
    tracing::error!(%message, "EPUB integrity check failed");
    Error::ArchiveIntegrity(message)
}

fn check_manifest(manifest: &[ManifestItem]) -> Result<()> {
    let mut ids = HashSet::new();
    let mut hrefs = HashSet::new();
    for item in manifest {
        if item.id.is_empty() || item.href.is_empty() || item.media_type.is_empty() {
            return Err(violation(format!("incomplete manifest item {:?}", item.id)));
        }
        if !ids.insert(item.id.as_str()) {
            return Err(violation(format!("duplicate manifest id {}", item.id)));
        }
        if !hrefs.insert(item.href.as_str()) {
            return Err(violation(format!("duplicate manifest href {}", item.href)));
        }
    }
    Ok(())
}

/// Returns the spine's hrefs in reading order.
fn check_spine<'a>(manifest: &'a [ManifestItem], spine: &[String]) -> Result<Vec<&'a str>> {
    spine
        .iter()
        .map(|idref| {
            manifest
                .iter()
                .find(|item| &item.id == idref)
                .map(|item| item.href.as_str())
                .ok_or_else(|| violation(format!("spine item {idref} has no manifest entry")))
        })
        .collect()
}

fn check_nav_order(name: &str, listed: &[String], spine_hrefs: &[&str]) -> Result<()> {
    if listed.len() != spine_hrefs.len() || listed.iter().zip(spine_hrefs).any(|(l, s)| l != s) {
        return Err(violation(format!(
            "{name} lists {} entries out of spine order",
            listed.len()
        )));
    }
    Ok(())
}

/// Values of `attr` on every `element`, in document order.
fn link_targets(xml: &str, element: &[u8], attr: &[u8]) -> std::result::Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut targets = Vec::new();
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == element => {
                for a in e.attributes() {
                    let a = a.map_err(|e| e.to_string())?;
                    if a.key.local_name().as_ref() == attr {
                        targets.push(a.unescape_value().map_err(|e| e.to_string())?.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

/// Pull-parse a document, requiring one root element, balanced tags, and
/// only characters and references XML 1.0 allows.
pub(crate) fn check_well_formed(xml: &str) -> std::result::Result<(), String> {
    if let Some(c) = xml.chars().find(|&c| !is_xml_char(c)) {
        return Err(format!("illegal character U+{:04X}", c as u32));
    }

    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("{e} at byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if depth == 0 {
                    roots += 1;
                }
                check_attributes(e)?;
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(ref t) if depth == 0 => {
                if t.iter().any(|b| !b.is_ascii_whitespace()) {
                    return Err("text outside the root element".to_string());
                }
            }
            Event::GeneralRef(ref r) => {
                if r.is_char_ref() {
                    match r.resolve_char_ref() {
                        Ok(Some(c)) if is_xml_char(c) => {}
                        _ => {
                            return Err(format!("illegal character reference &{};", String::from_utf8_lossy(&**r)));
                        }
                    }
                } else if !matches!(&**r, b"amp" | b"lt" | b"gt" | b"quot" | b"apos") {
                    return Err(format!("undeclared entity &{};", String::from_utf8_lossy(&**r)));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match (roots, depth) {
        (1, 0) => Ok(()),
        (0, _) => Err("no root element".to_string()),
        (_, 0) => Err("more than one root element".to_string()),
        (_, open) => Err(format!("{open} unclosed element(s)")),
    }
}

/// Attribute values must unescape, and the characters they unescape to must
/// be legal.
fn check_attributes(e: &BytesStart<'_>) -> std::result::Result<(), String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        if let Some(c) = value.chars().find(|&c| !is_xml_char(c)) {
            return Err(format!("illegal character U+{:04X} in attribute", c as u32));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::package::{NavEntry, PackageMetadata, XHTML_MEDIA_TYPE, generate_nav, generate_ncx};
    use crate::model::Document;

    fn item(id: &str, href: &str) -> ManifestItem {
        ManifestItem::new(id, href, XHTML_MEDIA_TYPE)
    }

    fn entries(hrefs: &[&str]) -> Vec<NavEntry> {
        hrefs
            .iter()
            .map(|href| NavEntry {
                label: href.to_string(),
                href: href.to_string(),
            })
            .collect()
    }

    fn meta() -> PackageMetadata {
        PackageMetadata::from_document(&Document::new("Livre"))
    }

    #[test]
    fn test_valid_package_passes() {
        let manifest = vec![item("page_1", "page_1.xhtml"), item("page_2", "page_2.xhtml")];
        let spine = vec!["page_1".to_string(), "page_2".to_string()];
        let listed = entries(&["page_1.xhtml", "page_2.xhtml"]);
        let ncx = generate_ncx(&meta(), &listed);
        let nav = generate_nav(&meta(), &listed);
        let view = PackageView {
            manifest: &manifest,
            spine: &spine,
            ncx: &ncx,
            nav: &nav,
            documents: vec![("page_1.xhtml", "<html><body/></html>")],
        };
        assert!(check_package(&view).is_ok());
    }

    #[test]
    fn test_spine_without_manifest_entry_is_fatal() {
        let manifest = vec![item("page_1", "page_1.xhtml")];
        let spine = vec!["page_1".to_string(), "page_9".to_string()];
        let view = PackageView {
            manifest: &manifest,
            spine: &spine,
            ncx: "<ncx/>",
            nav: "<html/>",
            documents: Vec::new(),
        };
        let err = check_package(&view).unwrap_err();
        assert!(matches!(err, Error::ArchiveIntegrity(ref m) if m.contains("page_9")));
    }

    #[test]
    fn test_empty_spine_is_fatal() {
        let view = PackageView {
            manifest: &[],
            spine: &[],
            ncx: "<ncx/>",
            nav: "<html/>",
            documents: Vec::new(),
        };
        let err = check_package(&view).unwrap_err();
        assert!(matches!(err, Error::ArchiveIntegrity(ref m) if m.contains("spine is empty")));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let manifest = vec![item("a", "a.xhtml"), item("a", "b.xhtml")];
        assert!(check_manifest(&manifest).is_err());
        let manifest = vec![item("a", "a.xhtml"), item("b", "a.xhtml")];
        assert!(check_manifest(&manifest).is_err());
    }

    #[test]
    fn test_nav_document_out_of_spine_order_rejected() {
        let manifest = vec![item("p1", "p1.xhtml"), item("p2", "p2.xhtml")];
        let spine = vec!["p1".to_string(), "p2".to_string()];
        let ncx = generate_ncx(&meta(), &entries(&["p1.xhtml", "p2.xhtml"]));
        let nav = generate_nav(&meta(), &entries(&["p2.xhtml", "p1.xhtml"]));
        let view = PackageView {
            manifest: &manifest,
            spine: &spine,
            ncx: &ncx,
            nav: &nav,
            documents: Vec::new(),
        };
        let err = check_package(&view).unwrap_err();
        assert!(matches!(err, Error::ArchiveIntegrity(ref m) if m.contains("nav.xhtml")));
    }

    #[test]
    fn test_ncx_missing_entry_rejected() {
        let manifest = vec![item("p1", "p1.xhtml"), item("p2", "p2.xhtml")];
        let spine = vec!["p1".to_string(), "p2".to_string()];
        let ncx = generate_ncx(&meta(), &entries(&["p1.xhtml"]));
        let nav = generate_nav(&meta(), &entries(&["p1.xhtml", "p2.xhtml"]));
        let view = PackageView {
            manifest: &manifest,
            spine: &spine,
            ncx: &ncx,
            nav: &nav,
            documents: Vec::new(),
        };
        let err = check_package(&view).unwrap_err();
        assert!(matches!(err, Error::ArchiveIntegrity(ref m) if m.contains("toc.ncx")));
    }

    #[test]
    fn test_link_targets_read_in_document_order() {
        let nav = generate_nav(&meta(), &entries(&["b.xhtml", "a&b.xhtml"]));
        assert_eq!(link_targets(&nav, b"a", b"href").unwrap(), vec!["b.xhtml", "a&b.xhtml"]);
    }

    #[test]
    fn test_well_formedness() {
        assert!(check_well_formed("<?xml version=\"1.0\"?>\n<a><b/>text</a>\n").is_ok());
        assert!(check_well_formed("<a><b></a>").is_err());
        assert!(check_well_formed("<a><b>").is_err());
        assert!(check_well_formed("<a/><b/>").is_err());
        assert!(check_well_formed("<a x=\"1\" x=\"2\"/>").is_err());
        assert!(check_well_formed("").is_err());
    }

    #[test]
    fn test_illegal_characters_and_references_rejected() {
        assert!(check_well_formed("<a>&amp;&#160;&#x2014;&#9;</a>").is_ok());
        assert!(check_well_formed("<a>&#0;</a>").is_err());
        assert!(check_well_formed("<a>&#x1;</a>").is_err());
        assert!(check_well_formed("<a>&#xFFFE;</a>").is_err());
        assert!(check_well_formed("<a>\u{1}</a>").is_err());
        assert!(check_well_formed("<a>&nbsp;</a>").is_err());
        assert!(check_well_formed("<a>&foo;</a>").is_err());
        assert!(check_well_formed("<a t=\"&#0;\"/>").is_err());
    }
}
