//! EPUB package assembler.
//!
//! Builds an EPUB 3 archive (with an EPUB 2 NCX for older readers) from a
//! document snapshot. The archive layout is fixed:
//!
//! ```text
//! mimetype                  stored, always first
//! META-INF/container.xml
//! OEBPS/content.opf
//! OEBPS/toc.ncx
//! OEBPS/nav.xhtml
//! OEBPS/style.css
//! OEBPS/chapter_N.xhtml     one per page, in page order
//! OEBPS/images/image_N.ext
//! ```
//!
//! Images that cannot be resolved are left out and their blocks render
//! empty. Anything that would make the package itself invalid aborts the
//! export instead.
//!
//! # Example
//!
//! ```
//! use diglot::config::EpubConfig;
//! use diglot::epub::EpubAssembler;
//! use diglot::model::{Block, Document, Page, TextBlock, Tier};
//! use diglot::render::BlockRenderer;
//!
//! let doc = Document::new("Livre").with_languages("fr", "en").with_page(
//!     Page::new(1).with_block(Block::Text(TextBlock::new("b1", "Bonjour", "Hello"))),
//! );
//! let renderer = BlockRenderer::default();
//! let config = EpubConfig::default();
//! let bytes = EpubAssembler::new(&renderer, &config).assemble(&doc, Tier::Paid)?;
//! assert_eq!(&bytes[30..38], b"mimetype");
//! # Ok::<(), diglot::Error>(())
//! ```

mod assets;
mod package;
mod validate;

pub use assets::{
    AssetResolver, ChainResolver, DataUrlResolver, HttpAssetResolver, ImageAsset, MAX_IMAGE_BYTES,
    load_image,
};
pub use package::{
    CONTAINER_XML, ChapterShell, ManifestItem, MIMETYPE, NavEntry, OPF_PATH, PackageMetadata,
    generate_nav, generate_ncx, generate_opf, package_identifier,
};

use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::{Cursor, Seek, Write};
use std::time::Duration;

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::config::EpubConfig;
use crate::error::Result;
use crate::layout::document_context;
use crate::model::{Block, Document, Tier};
use crate::preview::PLACEHOLDER_TEXT;
use crate::render::{BlockRenderer, Format, ImageMap, stylesheet, values};
use crate::util::MediaFormat;

use package::{CONTENT_DIR, CSS_MEDIA_TYPE, NCX_MEDIA_TYPE, XHTML_MEDIA_TYPE};
use validate::{PackageView, check_package};

const NCX_HREF: &str = "toc.ncx";
const NAV_HREF: &str = "nav.xhtml";
const CSS_HREF: &str = "style.css";

/// Builds EPUB packages.
pub struct EpubAssembler<'a> {
    renderer: &'a BlockRenderer,
    config: &'a EpubConfig,
    resolver: Box<dyn AssetResolver>,
}

impl<'a> EpubAssembler<'a> {
    /// An assembler resolving `data:` URLs, plus `http(s)` when the config
    /// enables remote images.
    pub fn new(renderer: &'a BlockRenderer, config: &'a EpubConfig) -> Self {
        let mut chain = ChainResolver::new().with(DataUrlResolver);
        if config.fetch_remote_images {
            chain = chain.with(HttpAssetResolver::new(Duration::from_secs(
                config.remote_image_timeout_secs.max(1),
            )));
        }
        Self {
            renderer,
            config,
            resolver: Box::new(chain),
        }
    }

    /// Replace the image resolver.
    pub fn with_resolver(mut self, resolver: impl AssetResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Assemble the package into memory.
    pub fn assemble(&self, doc: &Document, tier: Tier) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(doc, tier, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Assemble the package into `writer`.
    pub fn write_to<W: Write + Seek>(&self, doc: &Document, tier: Tier, writer: W) -> Result<()> {
        let package = self.build(doc, tier)?;
        package.write(writer, self.config.compression_level)
    }

    /// Build and validate the package contents without writing an archive.
    pub fn build(&self, doc: &Document, tier: Tier) -> Result<EpubPackage> {
        let metadata = PackageMetadata::from_document(doc);
        let images = self.collect_images(doc);
        let ctx = document_context(doc, Format::Epub, tier).with_images(&images.map);

        let mut chapters = Vec::with_capacity(doc.pages().len());
        for (index, page) in doc.pages().iter().enumerate() {
            let number = page.number_or(index);
            let mut body = String::new();
            for block in &page.blocks {
                let fragment = self.renderer.render_logged(block, &ctx, number);
                if !fragment.is_empty() {
                    body.push_str(&fragment);
                    body.push('\n');
                }
            }

            let shell = ChapterShell {
                title: &metadata.title,
                lang: &metadata.language,
                page_number: number,
                is_chapter_start: page.is_chapter_start,
                chapter_title: page.chapter_title(),
            };
            let n = index + 1;
            chapters.push(Chapter {
                id: format!("chapter_{n}"),
                href: format!("chapter_{n}.xhtml"),
                label: page
                    .chapter_title()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Page {number}")),
                xhtml: shell.wrap(body.trim_end()),
            });
        }

        if chapters.is_empty() {
            tracing::debug!("Document has no pages, adding a placeholder chapter");
            let shell = ChapterShell {
                title: &metadata.title,
                lang: &metadata.language,
                page_number: 1,
                is_chapter_start: true,
                chapter_title: Some(metadata.title.as_str()),
            };
            chapters.push(Chapter {
                id: "chapter_1".to_string(),
                href: "chapter_1.xhtml".to_string(),
                label: metadata.title.clone(),
                xhtml: shell.wrap(&format!("<p class=\"placeholder\">{PLACEHOLDER_TEXT}</p>")),
            });
        }

        let mut manifest = vec![
            ManifestItem::new("ncx", NCX_HREF, NCX_MEDIA_TYPE),
            ManifestItem::new("nav", NAV_HREF, XHTML_MEDIA_TYPE).with_properties("nav"),
            ManifestItem::new("css", CSS_HREF, CSS_MEDIA_TYPE),
        ];
        manifest.extend(
            chapters
                .iter()
                .map(|c| ManifestItem::new(&c.id, &c.href, XHTML_MEDIA_TYPE)),
        );
        manifest.extend(images.stored.iter().map(|img| {
            let item = ManifestItem::new(&img.id, &img.href, img.format.mime_type());
            if img.cover { item.with_properties("cover-image") } else { item }
        }));

        let spine: Vec<String> = chapters.iter().map(|c| c.id.clone()).collect();
        let nav_entries: Vec<NavEntry> = chapters
            .iter()
            .map(|c| NavEntry {
                label: c.label.clone(),
                href: c.href.clone(),
            })
            .collect();

        let opf = generate_opf(&metadata, &manifest, &spine);
        let ncx = generate_ncx(&metadata, &nav_entries);
        let nav = generate_nav(&metadata, &nav_entries);

        let mut documents = vec![
            ("META-INF/container.xml", CONTAINER_XML),
            ("content.opf", opf.as_str()),
            (NCX_HREF, ncx.as_str()),
            (NAV_HREF, nav.as_str()),
        ];
        documents.extend(chapters.iter().map(|c| (c.href.as_str(), c.xhtml.as_str())));
        check_package(&PackageView {
            manifest: &manifest,
            spine: &spine,
            ncx: &ncx,
            nav: &nav,
            documents,
        })?;

        tracing::debug!(
            chapters = chapters.len(),
            images = images.stored.len(),
            skipped_images = images.skipped,
            "Assembled EPUB package"
        );

        Ok(EpubPackage {
            metadata,
            manifest,
            spine,
            nav_entries,
            opf,
            ncx,
            nav,
            css: epub_stylesheet(doc),
            chapters,
            images: images.stored,
            skipped_images: images.skipped,
        })
    }

    /// Resolve every distinct image source once, in page order.
    fn collect_images(&self, doc: &Document) -> CollectedImages {
        let mut collected = CollectedImages::default();
        for page in doc.pages() {
            for block in &page.blocks {
                if let Block::Image(image) = block {
                    collected.store(self.resolver.as_ref(), image.src.trim());
                }
            }
        }

        if let Some(cover) = doc
            .settings
            .cover_image
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            && let Some(index) = collected.store(self.resolver.as_ref(), cover)
        {
            collected.stored[index].cover = true;
        }
        collected
    }
}

#[derive(Default)]
struct CollectedImages {
    map: ImageMap,
    stored: Vec<StoredImage>,
    failed: HashSet<String>,
    skipped: usize,
}

impl CollectedImages {
    /// Index of the stored image for `src`, resolving it on first sight.
    fn store(&mut self, resolver: &dyn AssetResolver, src: &str) -> Option<usize> {
        if src.is_empty() || self.failed.contains(src) {
            return None;
        }
        if let Some(index) = self.stored.iter().position(|img| img.src == src) {
            return Some(index);
        }

        match load_image(resolver, src) {
            Ok(asset) => {
                let n = self.stored.len() + 1;
                let href = format!("images/image_{n}.{}", asset.format.extension());
                self.map.insert(src, href.clone());
                self.stored.push(StoredImage {
                    src: src.to_string(),
                    id: format!("image_{n}"),
                    href,
                    format: asset.format,
                    bytes: asset.bytes,
                    cover: false,
                });
                Some(n - 1)
            }
            Err(e) => {
                tracing::warn!(src = %truncate_src(src), error = %e, "Skipping image asset");
                self.failed.insert(src.to_string());
                self.skipped += 1;
                None
            }
        }
    }
}

/// Data URLs can be megabytes long.
fn truncate_src(src: &str) -> &str {
    match src.char_indices().nth(80) {
        Some((i, _)) => &src[..i],
        None => src,
    }
}

struct Chapter {
    id: String,
    href: String,
    label: String,
    xhtml: String,
}

struct StoredImage {
    src: String,
    id: String,
    href: String,
    format: MediaFormat,
    bytes: Vec<u8>,
    cover: bool,
}

/// A validated package, ready to be written.
pub struct EpubPackage {
    pub metadata: PackageMetadata,
    pub manifest: Vec<ManifestItem>,
    /// Manifest ids in reading order.
    pub spine: Vec<String>,
    pub nav_entries: Vec<NavEntry>,
    opf: String,
    ncx: String,
    nav: String,
    css: String,
    chapters: Vec<Chapter>,
    images: Vec<StoredImage>,
    /// Images left out because they could not be resolved.
    pub skipped_images: usize,
}

impl EpubPackage {
    /// Content document of the page at `index`.
    pub fn chapter_xhtml(&self, index: usize) -> Option<&str> {
        self.chapters.get(index).map(|c| c.xhtml.as_str())
    }

    pub fn stylesheet(&self) -> &str {
        &self.css
    }

    /// Write the ZIP archive. `mimetype` goes first, uncompressed.
    pub fn write<W: Write + Seek>(&self, writer: W, compression_level: i64) -> Result<()> {
        let mut zip = ZipWriter::new(writer);

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level.clamp(0, 9)));

        zip.start_file("mimetype", stored)?;
        zip.write_all(MIMETYPE)?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML.as_bytes())?;

        let text_files = [
            ("content.opf", &self.opf),
            (NCX_HREF, &self.ncx),
            (NAV_HREF, &self.nav),
            (CSS_HREF, &self.css),
        ];
        for (href, content) in text_files {
            zip.start_file(format!("{CONTENT_DIR}/{href}"), deflated)?;
            zip.write_all(content.as_bytes())?;
        }

        for chapter in &self.chapters {
            zip.start_file(format!("{CONTENT_DIR}/{}", chapter.href), deflated)?;
            zip.write_all(chapter.xhtml.as_bytes())?;
        }

        for image in &self.images {
            // Raster formats are already compressed
            let options = if image.format == MediaFormat::Svg { deflated } else { stored };
            zip.start_file(format!("{CONTENT_DIR}/{}", image.href), options)?;
            zip.write_all(&image.bytes)?;
        }

        zip.finish()?;
        Ok(())
    }
}

/// Package stylesheet: typography from the document settings, then the
/// rules behind every class the block renderers emit.
fn epub_stylesheet(doc: &Document) -> String {
    let settings = &doc.settings;
    let body_font =
        values::font_family(Some(settings.fonts.body.as_str())).unwrap_or_else(|| "'Georgia'".to_string());
    let heading_font =
        values::font_family(Some(settings.fonts.heading.as_str())).unwrap_or_else(|| body_font.clone());
    let line_height = settings
        .typography
        .line_height
        .filter(|l| (0.8..=3.0).contains(l))
        .unwrap_or(1.5);
    let accent = values::color_or(Some(settings.colors.accent.as_str()), "#8b5cf6");

    let mut css = String::new();
    let _ = write!(
        css,
        "body {{ font-family: {body_font}, serif; line-height: {lh}; margin: 0 5%; }}\n\
         h1, h2, .chapter-title {{ font-family: {heading_font}, serif; }}\n\
         section.chapter-start {{ padding-top: 2em; }}\n\
         h1.chapter-title {{ text-align: center; font-size: 1.6em; margin: 0 0 1.2em 0; color: {accent}; }}\n\
         .stamp {{ background: {accent}; }}\n",
        lh = values::num(line_height),
    );
    css.push_str(&stylesheet::block_css());
    css.push_str(&stylesheet::script_css());
    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetError;
    use crate::model::{ImageBlock, Page, TextBlock};
    use std::io::Read;

    const PNG_1X1: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

    fn two_pages() -> Document {
        Document::new("Livre")
            .with_author("Auteur")
            .with_languages("fr", "en")
            .with_page(Page::new(1).with_block(Block::Text(TextBlock::new("b1", "Bonjour", "Hello"))))
            .with_page(Page::new(2).with_block(Block::Text(TextBlock::new("b2", "Bonjour", "Hello"))))
    }

    fn build(doc: &Document) -> EpubPackage {
        let renderer = BlockRenderer::default();
        let config = EpubConfig::default();
        EpubAssembler::new(&renderer, &config).build(doc, Tier::Paid).unwrap()
    }

    #[test]
    fn test_manifest_for_two_pages() {
        let package = build(&two_pages());
        assert_eq!(package.manifest.len(), 5);
        assert_eq!(package.spine, vec!["chapter_1", "chapter_2"]);
        assert_eq!(package.nav_entries[1].label, "Page 2");
        for i in 0..2 {
            let xhtml = package.chapter_xhtml(i).unwrap();
            assert!(xhtml.contains("Bonjour"));
            assert!(xhtml.contains("Hello"));
        }
    }

    #[test]
    fn test_chapter_start_marked() {
        let doc = Document::new("Livre").with_page(
            Page::new(1)
                .chapter_start(Some("Le début"))
                .with_block(Block::Text(TextBlock::new("b1", "un", "one"))),
        );
        let package = build(&doc);
        let xhtml = package.chapter_xhtml(0).unwrap();
        assert!(xhtml.contains("epub:type=\"chapter\""));
        assert!(xhtml.contains("<h1 class=\"chapter-title\">Le début</h1>"));
        assert_eq!(package.nav_entries[0].label, "Le début");
    }

    #[test]
    fn test_images_deduplicated_and_cover_marked() {
        let mut doc = Document::new("Livre")
            .with_page(Page::new(1).with_block(Block::Image(ImageBlock::new("i1", PNG_1X1))))
            .with_page(Page::new(2).with_block(Block::Image(ImageBlock::new("i2", PNG_1X1))));
        doc.settings.cover_image = Some(PNG_1X1.to_string());

        let package = build(&doc);
        let images: Vec<_> = package
            .manifest
            .iter()
            .filter(|item| item.media_type == "image/png")
            .collect();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].href, "images/image_1.png");
        assert_eq!(images[0].properties, Some("cover-image"));
        assert!(package.chapter_xhtml(1).unwrap().contains("src=\"images/image_1.png\""));
    }

    #[test]
    fn test_unresolvable_image_skipped() {
        let doc = Document::new("Livre").with_page(
            Page::new(1)
                .with_block(Block::Image(ImageBlock::new("i1", "data:text/plain,hello")))
                .with_block(Block::Image(ImageBlock::new("i2", "https://cdn.example.com/a.png"))),
        );
        let package = build(&doc);
        assert_eq!(package.skipped_images, 2);
        assert!(!package.chapter_xhtml(0).unwrap().contains("<img"));
        assert!(package.manifest.iter().all(|item| !item.href.starts_with("images/")));
    }

    struct FixedResolver(Vec<u8>);

    impl AssetResolver for FixedResolver {
        fn fetch(&self, _src: &str) -> std::result::Result<Vec<u8>, AssetError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_custom_resolver() {
        let doc = Document::new("Livre").with_page(
            Page::new(1).with_block(Block::Image(ImageBlock::new("i1", "https://cdn.example.com/a.gif"))),
        );
        let renderer = BlockRenderer::default();
        let config = EpubConfig::default();
        let package = EpubAssembler::new(&renderer, &config)
            .with_resolver(FixedResolver(b"GIF89a\x01\x00\x01\x00".to_vec()))
            .build(&doc, Tier::Paid)
            .unwrap();
        assert!(package.manifest.iter().any(|item| item.href == "images/image_1.gif"));
    }

    #[test]
    fn test_archive_layout() {
        let renderer = BlockRenderer::default();
        let config = EpubConfig::default();
        let bytes = EpubAssembler::new(&renderer, &config)
            .assemble(&two_pages(), Tier::Free)
            .unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        {
            let mut first = archive.by_index(0).unwrap();
            assert_eq!(first.name(), "mimetype");
            assert_eq!(first.compression(), CompressionMethod::Stored);
            let mut content = String::new();
            first.read_to_string(&mut content).unwrap();
            assert_eq!(content, "application/epub+zip");
        }
        for name in ["META-INF/container.xml", OPF_PATH, "OEBPS/chapter_1.xhtml", "OEBPS/chapter_2.xhtml"] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn test_empty_document_gets_placeholder_chapter() {
        let package = build(&Document::default());
        assert_eq!(package.spine, vec!["chapter_1"]);
        assert_eq!(package.nav_entries.len(), 1);
        assert_eq!(package.nav_entries[0].label, "Untitled");
        assert_eq!(package.metadata.title, "Untitled");
        assert_eq!(package.metadata.language, "en");
        let xhtml = package.chapter_xhtml(0).unwrap();
        assert!(xhtml.contains(PLACEHOLDER_TEXT));
        assert!(validate::check_well_formed(xhtml).is_ok());
        assert_eq!(package.nav.matches("<li>").count(), 1);
        assert_eq!(package.ncx.matches("<navPoint ").count(), 1);
    }

    #[test]
    fn test_illegal_characters_never_reach_the_archive() {
        let doc = Document::new("A&#0;B").with_author("\u{1}Auteur").with_page(
            Page::new(1)
                .chapter_start(Some("Titre&#x1;"))
                .with_block(Block::Text(TextBlock::new("b1", "a\u{1}b &#0;c", "d\u{b}e"))),
        );
        let package = build(&doc);
        assert_eq!(package.metadata.title, "A&#0;B");
        for doc in [&package.opf, &package.ncx, &package.nav] {
            assert!(validate::check_well_formed(doc).is_ok(), "{doc}");
        }
        let xhtml = package.chapter_xhtml(0).unwrap();
        assert!(validate::check_well_formed(xhtml).is_ok(), "{xhtml}");
        assert!(xhtml.contains("ab"));
        assert!(xhtml.contains("de"));
        assert!(!xhtml.contains("&#0;"));
    }

    #[test]
    fn test_stylesheet_has_no_page_rules() {
        let package = build(&two_pages());
        assert!(package.stylesheet().contains(".bt-interlinear"));
        assert!(!package.stylesheet().contains("@page"));
    }
}
