//! Package documents: container pointer, OPF, NCX, navigation XHTML and
//! the per-page chapter shell.

use std::fmt::Write;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::model::Document;
use crate::sanitize::escape_text;

pub const MIMETYPE: &[u8] = b"application/epub+zip";

/// Path of the package document inside the archive.
pub const OPF_PATH: &str = "OEBPS/content.opf";

/// Directory holding every content file.
pub const CONTENT_DIR: &str = "OEBPS";

pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";
pub const CSS_MEDIA_TYPE: &str = "text/css";

/// Dublin Core metadata for the OPF.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageMetadata {
    pub identifier: String,
    pub title: String,
    pub author: String,
    pub language: String,
    /// Declared as a second `dc:language` when it differs.
    pub target_language: String,
    /// `YYYY-MM-DDThh:mm:ssZ`.
    pub modified: String,
    pub subjects: Vec<String>,
    pub description: Option<String>,
}

impl PackageMetadata {
    pub fn from_document(doc: &Document) -> Self {
        Self::from_document_at(doc, OffsetDateTime::now_utc())
    }

    /// Like [`from_document`](Self::from_document), with `now` used when
    /// the document carries no usable timestamp.
    pub fn from_document_at(doc: &Document, now: OffsetDateTime) -> Self {
        let modified = doc
            .updated_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now);

        Self {
            identifier: package_identifier(doc),
            title: doc.display_title().to_string(),
            author: doc.display_author().to_string(),
            language: doc.source_lang().to_string(),
            target_language: doc.target_lang().to_string(),
            modified: format_modified(modified),
            subjects: doc
                .settings
                .keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
            description: doc
                .settings
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        }
    }
}

/// Stable identifier for the package.
///
/// A UUID document id becomes `urn:uuid:`, any other id `urn:diglot:`.
/// Without an id, a name-based UUID is derived from the title, author and
/// languages so re-exports of the same book keep their identity.
pub fn package_identifier(doc: &Document) -> String {
    match doc.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) if is_uuid(id) => format!("urn:uuid:{}", id.to_ascii_lowercase()),
        Some(id) => format!("urn:diglot:{id}"),
        None => {
            let seed = format!(
                "{}\u{1f}{}\u{1f}{}\u{1f}{}",
                doc.display_title(),
                doc.display_author(),
                doc.source_lang(),
                doc.target_lang()
            );
            format!("urn:uuid:{}", name_based_uuid(seed.as_bytes()))
        }
    }
}

fn is_uuid(s: &str) -> bool {
    s.len() == 36
        && s.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

/// Version 5 style UUID from a SHA-1 digest.
fn name_based_uuid(name: &[u8]) -> String {
    let digest = sha1_smol::Sha1::from(name).digest().bytes();
    let mut b = [0u8; 16];
    b.copy_from_slice(&digest[..16]);
    b[6] = (b[6] & 0x0f) | 0x50;
    b[8] = (b[8] & 0x3f) | 0x80;

    let mut out = String::with_capacity(36);
    for (i, byte) in b.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Accepts RFC 3339, a bare date, or Unix epoch milliseconds.
fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }
    if let Ok(date) = Date::parse(s, format_description!("[year]-[month]-[day]")) {
        return Some(date.midnight().assume_utc());
    }
    let millis: i128 = s.parse().ok()?;
    OffsetDateTime::from_unix_timestamp_nanos(millis * 1_000_000).ok()
}

fn format_modified(dt: OffsetDateTime) -> String {
    let utc = dt.to_offset(UtcOffset::UTC);
    utc.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
    ))
    .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// One manifest entry. `href` is relative to the OPF.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Option<&'static str>,
}

impl ManifestItem {
    pub fn new(id: impl Into<String>, href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: &'static str) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// A navigation entry: one per spine item.
#[derive(Debug, Clone, PartialEq)]
pub struct NavEntry {
    pub label: String,
    pub href: String,
}

/// Generate content.opf.
pub fn generate_opf(meta: &PackageMetadata, manifest: &[ManifestItem], spine: &[String]) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
    );

    let _ = writeln!(
        opf,
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>",
        escape_text(&meta.identifier)
    );
    let _ = writeln!(opf, "    <dc:title id=\"title\">{}</dc:title>", escape_text(&meta.title));
    let _ = writeln!(
        opf,
        "    <dc:creator id=\"creator\">{}</dc:creator>",
        escape_text(&meta.author)
    );
    let _ = writeln!(opf, "    <dc:language>{}</dc:language>", escape_text(&meta.language));
    if meta.target_language != meta.language {
        let _ = writeln!(
            opf,
            "    <dc:language>{}</dc:language>",
            escape_text(&meta.target_language)
        );
    }
    if let Some(ref description) = meta.description {
        let _ = writeln!(opf, "    <dc:description>{}</dc:description>", escape_text(description));
    }
    for subject in &meta.subjects {
        let _ = writeln!(opf, "    <dc:subject>{}</dc:subject>", escape_text(subject));
    }
    let _ = writeln!(
        opf,
        "    <meta property=\"dcterms:modified\">{}</meta>",
        escape_text(&meta.modified)
    );
    if let Some(cover) = manifest.iter().find(|item| item.properties == Some("cover-image")) {
        // EPUB 2 readers look for this
        let _ = writeln!(opf, "    <meta name=\"cover\" content=\"{}\"/>", escape_text(&cover.id));
    }
    opf.push_str("  </metadata>\n");

    opf.push_str("  <manifest>\n");
    for item in manifest {
        let _ = write!(
            opf,
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"",
            escape_text(&item.id),
            escape_text(&item.href),
            escape_text(&item.media_type)
        );
        if let Some(properties) = item.properties {
            let _ = write!(opf, " properties=\"{properties}\"");
        }
        opf.push_str("/>\n");
    }
    opf.push_str("  </manifest>\n");

    opf.push_str("  <spine toc=\"ncx\">\n");
    for id in spine {
        let _ = writeln!(opf, "    <itemref idref=\"{}\"/>", escape_text(id));
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}

/// Generate toc.ncx.
pub fn generate_ncx(meta: &PackageMetadata, entries: &[NavEntry]) -> String {
    let mut ncx = String::new();
    let _ = write!(
        ncx,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{uid}"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{title}</text>
  </docTitle>
  <navMap>
"#,
        uid = escape_text(&meta.identifier),
        title = escape_text(&meta.title),
    );

    for (i, entry) in entries.iter().enumerate() {
        let order = i + 1;
        let _ = write!(
            ncx,
            "    <navPoint id=\"navPoint-{order}\" playOrder=\"{order}\">\n      <navLabel><text>{}</text></navLabel>\n      <content src=\"{}\"/>\n    </navPoint>\n",
            escape_text(&entry.label),
            escape_text(&entry.href)
        );
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

/// Generate the EPUB 3 navigation document.
pub fn generate_nav(meta: &PackageMetadata, entries: &[NavEntry]) -> String {
    let mut nav = String::new();
    let _ = write!(
        nav,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" xml:lang=\"{lang}\" lang=\"{lang}\">\n<head>\n<meta charset=\"UTF-8\"/>\n<title>{title}</title>\n</head>\n<body>\n<nav epub:type=\"toc\" id=\"toc\">\n<h1>{title}</h1>\n<ol>\n",
        lang = escape_text(&meta.language),
        title = escape_text(&meta.title),
    );
    for entry in entries {
        let _ = writeln!(
            nav,
            "<li><a href=\"{}\">{}</a></li>",
            escape_text(&entry.href),
            escape_text(&entry.label)
        );
    }
    nav.push_str("</ol>\n</nav>\n</body>\n</html>\n");
    nav
}

/// One page's content document.
pub struct ChapterShell<'a> {
    pub title: &'a str,
    pub lang: &'a str,
    pub page_number: u32,
    pub is_chapter_start: bool,
    pub chapter_title: Option<&'a str>,
}

impl ChapterShell<'_> {
    /// Wrap rendered block fragments in a complete XHTML document.
    pub fn wrap(&self, body: &str) -> String {
        let mut out = String::with_capacity(body.len() + 512);
        let _ = write!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" xml:lang=\"{lang}\" lang=\"{lang}\">\n<head>\n<meta charset=\"UTF-8\"/>\n<title>{title}</title>\n<link rel=\"stylesheet\" type=\"text/css\" href=\"style.css\"/>\n</head>\n<body>\n",
            lang = escape_text(self.lang),
            title = escape_text(self.title),
        );

        if self.is_chapter_start {
            let _ = writeln!(
                out,
                "<section epub:type=\"chapter\" class=\"page chapter-start\" id=\"page-{}\">",
                self.page_number
            );
            if let Some(title) = self.chapter_title {
                let _ = writeln!(out, "<h1 class=\"chapter-title\">{}</h1>", escape_text(title));
            }
        } else {
            let _ = writeln!(out, "<section class=\"page\" id=\"page-{}\">", self.page_number);
        }

        out.push_str(body);
        out.push_str("\n</section>\n</body>\n</html>\n");
        out
    }
}
