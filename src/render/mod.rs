//! Block renderer dispatch.
//!
//! [`BlockRenderer::render`] turns one [`Block`] into a markup fragment for
//! a target [`Format`]:
//!
//! - `Print` / `Preview`: HTML with inline styles.
//! - `Epub`: well-formed XHTML, self-closed void elements, classes only,
//!   image sources rewritten to in-package paths.
//!
//! Every author string goes through [`crate::sanitize`] before it is
//! concatenated. An unknown block renders to an empty string; callers use
//! [`BlockRenderer::render_logged`] so the skip is reported.
//!
//! # Example
//!
//! ```
//! use diglot::model::{Block, TextBlock, Tier};
//! use diglot::render::{BlockRenderer, Format, RenderContext};
//!
//! let renderer = BlockRenderer::default();
//! let ctx = RenderContext::new(Format::Print, "fr", "en", Tier::Paid);
//! let html = renderer.render(&Block::Text(TextBlock::new("b1", "Bonjour", "Hello")), &ctx);
//! assert!(html.contains("Bonjour"));
//! ```

mod callout;
mod image;
mod markup;
mod quiz;
mod separator;
mod stamp;
pub mod stylesheet;
mod table;
mod text;
pub(crate) mod values;

use std::collections::HashMap;

use crate::model::{Block, Formatting, TextLayout, Tier};
use crate::sanitize::{Sanitizer, escape_text, to_xhtml};
use crate::script::{ScriptInfo, ScriptTable};

pub(crate) use markup::{Element, element_id};

/// Output target of a rendered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Print,
    Epub,
    Preview,
}

impl Format {
    pub fn is_xhtml(self) -> bool {
        self == Format::Epub
    }
}

/// Package paths of resolved images, keyed by the block's source reference.
#[derive(Debug, Clone, Default)]
pub struct ImageMap {
    hrefs: HashMap<String, String>,
}

impl ImageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, src: impl Into<String>, href: impl Into<String>) {
        self.hrefs.insert(src.into(), href.into());
    }

    /// Href relative to the chapter documents.
    pub fn href(&self, src: &str) -> Option<&str> {
        self.hrefs.get(src).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.hrefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hrefs.is_empty()
    }
}

/// Per-call rendering parameters.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub format: Format,
    pub source_lang: &'a str,
    pub target_lang: &'a str,
    pub tier: Tier,
    /// Layout used by text blocks that do not pick one.
    pub default_layout: TextLayout,
    /// Required for `Format::Epub`; images missing from it render empty.
    pub images: Option<&'a ImageMap>,
}

impl<'a> RenderContext<'a> {
    pub fn new(format: Format, source_lang: &'a str, target_lang: &'a str, tier: Tier) -> Self {
        Self {
            format,
            source_lang,
            target_lang,
            tier,
            default_layout: TextLayout::default(),
            images: None,
        }
    }

    pub fn with_default_layout(mut self, layout: TextLayout) -> Self {
        self.default_layout = layout;
        self
    }

    pub fn with_images(mut self, images: &'a ImageMap) -> Self {
        self.images = Some(images);
        self
    }
}

/// Which half of a bilingual pair a pane holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lang {
    L1,
    L2,
}

impl Lang {
    fn class(self) -> &'static str {
        match self {
            Lang::L1 => "pane-l1",
            Lang::L2 => "pane-l2",
        }
    }
}

/// Renders blocks. Holds the sanitizer and script table; shareable
/// across threads.
pub struct BlockRenderer {
    sanitizer: Sanitizer,
    scripts: ScriptTable,
}

impl BlockRenderer {
    pub fn new(scripts: ScriptTable) -> Self {
        Self {
            sanitizer: Sanitizer::new(),
            scripts,
        }
    }

    pub fn scripts(&self) -> &ScriptTable {
        &self.scripts
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    /// Render one block. Unknown blocks produce an empty string.
    pub fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> String {
        match block {
            Block::Text(b) => text::render(self, b, ctx),
            Block::Image(b) => image::render(self, b, ctx),
            Block::Separator(b) => separator::render(b, ctx),
            Block::Callout(b) => callout::render(self, b, ctx),
            Block::Table(b) => table::render(self, b, ctx),
            Block::Quiz(b) => quiz::render(self, b, ctx),
            Block::Stamp(b) => stamp::render(b, ctx),
            Block::Unknown(_) => String::new(),
        }
    }

    /// [`render`](Self::render), logging skipped blocks.
    pub fn render_logged(&self, block: &Block, ctx: &RenderContext<'_>, page: u32) -> String {
        let out = self.render(block, ctx);
        if block.is_unknown() {
            tracing::warn!(
                page,
                block_id = %block.id(),
                kind = %block.kind(),
                "Skipping unrecognized block type"
            );
        } else if out.is_empty() {
            tracing::warn!(
                page,
                block_id = %block.id(),
                kind = %block.kind(),
                "Block rendered to nothing"
            );
        }
        out
    }

    /// Sanitized rich text, converted to XHTML for the EPUB target.
    pub(crate) fn rich(&self, html: &str, format: Format) -> String {
        let clean = self.sanitizer.sanitize_strict(html);
        if format.is_xhtml() { to_xhtml(&clean) } else { clean }
    }

    /// Language code and resolved script of one pane.
    fn pane_script<'c>(&self, lang: Lang, ctx: &RenderContext<'c>) -> (&'c str, ScriptInfo) {
        let code = match lang {
            Lang::L1 => ctx.source_lang,
            Lang::L2 => ctx.target_lang,
        };
        (code, self.scripts.resolve(code))
    }

    /// A language pane: script class, `lang` and `dir` set per language.
    pub(crate) fn pane(
        &self,
        tag: &'static str,
        lang: Lang,
        content_html: &str,
        formatting: Option<&Formatting>,
        ctx: &RenderContext<'_>,
    ) -> String {
        let (code, info) = self.pane_script(lang, ctx);
        let mut el = Element::new(tag)
            .class("pane")
            .class(lang.class())
            .class(info.script.css_class())
            .attr("lang", code)
            .attr("dir", info.dir());

        if let Some(fmt) = formatting {
            el = apply_formatting(el, fmt, ctx.format);
        }

        el.wrap(ctx.format, &self.rich(content_html, ctx.format))
    }

    /// A plain-text span in one language (captions, titles).
    pub(crate) fn plain_pane(&self, class: &'static str, lang: Lang, text: &str, ctx: &RenderContext<'_>) -> String {
        let (code, info) = self.pane_script(lang, ctx);
        Element::new("span")
            .class(class)
            .class(info.script.css_class())
            .attr("lang", code)
            .attr("dir", info.dir())
            .wrap(ctx.format, &escape_text(text))
    }
}

impl Default for BlockRenderer {
    fn default() -> Self {
        Self::new(ScriptTable::builtin())
    }
}

/// Formatting overrides: inline styles for HTML, classes for EPUB.
fn apply_formatting(mut el: Element, fmt: &Formatting, format: Format) -> Element {
    if let Some(align) = fmt.align {
        el = el.class_if(format.is_xhtml(), format!("align-{}", align.as_str()));
        el = el.style("text-align", align.as_str());
    }
    el = el
        .class_if(fmt.bold && format.is_xhtml(), "fmt-bold")
        .class_if(fmt.italic && format.is_xhtml(), "fmt-italic")
        .class_if(fmt.underline && format.is_xhtml(), "fmt-underline");

    if fmt.bold {
        el = el.style("font-weight", "bold");
    }
    if fmt.italic {
        el = el.style("font-style", "italic");
    }
    if fmt.underline {
        el = el.style("text-decoration", "underline");
    }
    el.style_opt(
        "font-size",
        values::font_size(fmt.font_size).map(|s| format!("{}pt", values::num(s))),
    )
    .style_opt("color", values::color(fmt.color.as_deref()))
    .style_opt("font-family", values::font_family(fmt.font_family.as_deref()))
}
