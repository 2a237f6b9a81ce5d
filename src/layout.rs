//! Print layout engine.
//!
//! Turns a document into one `<section class="page">` per page, in page
//! order, plus a stylesheet. The markup is handed to the rendering service
//! as an opaque string.
//!
//! Margins are mirrored for binding: the gutter sits on the inner side of
//! each page, which is the left edge of odd (recto) pages and the right
//! edge of even (verso) pages. Running heads alternate the same way: the
//! author on even pages, the title on odd pages.
//!
//! A free-tier export puts exactly one watermark element on every page. A
//! paid export emits none at all.

use std::fmt::Write;

use crate::config::PrintConfig;
use crate::geometry::{PageGeometry, TrimTable};
use crate::model::{Block, Document, Page, Tier};
use crate::render::{BlockRenderer, Element, Format, RenderContext, stylesheet, values};
use crate::sanitize::escape_text;

/// Which edge of the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageSide {
    Left,
    Right,
}

impl PageSide {
    pub fn as_str(self) -> &'static str {
        match self {
            PageSide::Left => "left",
            PageSide::Right => "right",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            PageSide::Left => PageSide::Right,
            PageSide::Right => PageSide::Left,
        }
    }
}

pub fn is_even(page_number: u32) -> bool {
    page_number % 2 == 0
}

/// The binding side of a page: left for odd pages, right for even pages.
pub fn inner_side(page_number: u32) -> PageSide {
    if is_even(page_number) {
        PageSide::Right
    } else {
        PageSide::Left
    }
}

/// Compiled print markup.
#[derive(Debug, Clone)]
pub struct PrintMarkup {
    /// Concatenated page sections.
    pub html: String,
    pub css: String,
    pub geometry: PageGeometry,
    pub page_count: usize,
}

impl PrintMarkup {
    /// A standalone HTML document with the stylesheet embedded.
    pub fn to_document(&self, title: &str, lang: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{css}</style>\n</head>\n<body>\n{html}\n</body>\n</html>\n",
            lang = escape_text(lang),
            title = escape_text(title),
            css = self.css,
            html = self.html,
        )
    }
}

/// Where a page sits in the document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageFrame<'p> {
    pub page: &'p Page,
    pub number: u32,
    /// 1-based chapter number when the page opens a chapter.
    pub chapter: Option<u32>,
}

/// The print layout engine.
pub struct PrintLayout<'a> {
    renderer: &'a BlockRenderer,
    config: &'a PrintConfig,
    trims: &'a TrimTable,
}

impl<'a> PrintLayout<'a> {
    pub fn new(renderer: &'a BlockRenderer, config: &'a PrintConfig, trims: &'a TrimTable) -> Self {
        Self {
            renderer,
            config,
            trims,
        }
    }

    pub(crate) fn renderer(&self) -> &BlockRenderer {
        self.renderer
    }

    /// Page geometry for a document: its own trim size, else the configured one.
    pub fn geometry(&self, doc: &Document) -> PageGeometry {
        let trim_name = doc
            .settings
            .trim_size
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.config.trim_size);
        PageGeometry {
            trim: self.trims.resolve(Some(trim_name)),
            margin_in: non_negative(self.config.margin_in, crate::config::DEFAULT_MARGIN_IN),
            gutter_in: non_negative(self.config.gutter_in, crate::config::DEFAULT_GUTTER_IN),
            bleed_in: self.config.bleed_in.filter(|b| *b > 0.0 && *b < 1.0),
        }
    }

    /// Lay out every page of the document.
    pub fn compile(&self, doc: &Document, tier: Tier) -> PrintMarkup {
        let geometry = self.geometry(doc);
        let ctx = document_context(doc, Format::Print, tier);

        let mut html = String::new();
        let mut chapters = 0;
        for (index, page) in doc.pages().iter().enumerate() {
            let chapter = page.is_chapter_start.then(|| {
                chapters += 1;
                chapters
            });
            let frame = PageFrame {
                page,
                number: page.number_or(index),
                chapter,
            };
            html.push_str(&self.render_page(doc, frame, &page.blocks, &ctx, &geometry));
        }

        PrintMarkup {
            html,
            css: self.stylesheet(doc, &geometry),
            geometry,
            page_count: doc.pages().len(),
        }
    }

    /// One page section.
    pub(crate) fn render_page(
        &self,
        doc: &Document,
        frame: PageFrame<'_>,
        blocks: &[Block],
        ctx: &RenderContext<'_>,
        geometry: &PageGeometry,
    ) -> String {
        let mut content = String::new();
        if let Some(chapter) = frame.chapter {
            content.push_str(&self.chapter_opener(chapter, frame.page.chapter_title(), ctx.format));
        }
        let mut first = true;
        for block in blocks {
            let fragment = self.renderer.render_logged(block, ctx, frame.number);
            if fragment.is_empty() {
                continue;
            }
            if first && frame.chapter.is_some() {
                content.push_str(&Element::new("div").class("drop-cap").wrap(ctx.format, &fragment));
            } else {
                content.push_str(&fragment);
            }
            first = false;
        }
        self.page_section(doc, frame, &content, ctx, geometry)
    }

    /// Page frame around already rendered content: margins, running head
    /// and foot, watermark.
    pub(crate) fn page_section(
        &self,
        doc: &Document,
        frame: PageFrame<'_>,
        content: &str,
        ctx: &RenderContext<'_>,
        geometry: &PageGeometry,
    ) -> String {
        let page = frame.page;
        let number = frame.number;
        let inner = inner_side(number);
        let bleed = geometry.bleed_in.unwrap_or(0.0);
        let edge = geometry.margin_in + bleed;
        let binding = geometry.inner_margin_in() + bleed;
        let (left, right) = match inner {
            PageSide::Left => (binding, edge),
            PageSide::Right => (edge, binding),
        };

        let mut body = String::new();
        if ctx.tier.is_free() {
            body.push_str(&self.watermark(ctx.format));
        }
        if page.show_header {
            body.push_str(&self.running_head(doc, page, number, edge, left, right, ctx.format));
        }

        body.push_str(&Element::new("div").class("page-body").wrap(ctx.format, content));

        if let Some(foot) = self.running_foot(page, number, edge, left, right, ctx.format) {
            body.push_str(&foot);
        }

        let background = page.background_color.as_deref().and_then(|c| values::color(Some(c)));
        Element::new("section")
            .class("page")
            .class(if is_even(number) { "page-even" } else { "page-odd" })
            .class(format!("inner-{}", inner.as_str()))
            .class_if(frame.chapter.is_some(), "chapter-start")
            .attr("data-page", number.to_string())
            .style("position", "relative")
            .style("box-sizing", "border-box")
            .style("width", format!("{}in", values::num(geometry.page_width_in())))
            .style("height", format!("{}in", values::num(geometry.page_height_in())))
            .style(
                "padding",
                format!(
                    "{top}in {right}in {edge}in {left}in",
                    top = values::num(edge),
                    right = values::num(right),
                    edge = values::num(edge),
                    left = values::num(left),
                ),
            )
            .style("overflow", "hidden")
            .style_opt("background", background)
            .wrap(ctx.format, &body)
    }

    /// The watermark element. Only called for free-tier pages.
    pub(crate) fn watermark(&self, format: Format) -> String {
        let opacity = Some(self.config.watermark_opacity)
            .filter(|o| (0.0..=1.0).contains(o))
            .unwrap_or(crate::config::DEFAULT_WATERMARK_OPACITY);
        let text = match self.config.watermark_text.trim() {
            "" => crate::config::DEFAULT_WATERMARK_TEXT,
            t => t,
        };
        Element::new("div")
            .class("watermark")
            .attr("aria-hidden", "true")
            .style("position", "absolute")
            .style("inset", "0")
            .style("display", "flex")
            .style("align-items", "center")
            .style("justify-content", "center")
            .style("font-size", "28pt")
            .style("font-weight", "bold")
            .style("color", "#000000")
            .style("opacity", values::num(opacity))
            .style("transform", "rotate(-30deg)")
            .style("pointer-events", "none")
            .style("user-select", "none")
            .style("z-index", "10")
            .wrap(format, &escape_text(text))
    }

    #[allow(clippy::too_many_arguments)]
    fn running_head(
        &self,
        doc: &Document,
        page: &Page,
        number: u32,
        edge: f64,
        left: f64,
        right: f64,
        format: Format,
    ) -> String {
        Element::new("header")
            .class("running-head")
            .style("position", "absolute")
            .style("top", format!("{}in", values::num(edge * 0.45)))
            .style("left", format!("{}in", values::num(left)))
            .style("right", format!("{}in", values::num(right)))
            .style("text-align", "center")
            .wrap(format, &escape_text(running_head_text(doc, page, number)))
    }

    fn running_foot(
        &self,
        page: &Page,
        number: u32,
        edge: f64,
        left: f64,
        right: f64,
        format: Format,
    ) -> Option<String> {
        let text = page
            .footer
            .as_deref()
            .map(str::trim)
            .filter(|t| page.show_footer && !t.is_empty());
        if text.is_none() && !page.show_page_number {
            return None;
        }

        let mut inner = String::new();
        if let Some(text) = text {
            inner.push_str(&Element::new("span").class("footer-text").wrap(format, &escape_text(text)));
        }
        if page.show_page_number {
            let outer = inner_side(number).opposite();
            inner.push_str(
                &Element::new("span")
                    .class("page-number")
                    .class(format!("page-number-{}", outer.as_str()))
                    .style("float", outer.as_str())
                    .wrap(format, &number.to_string()),
            );
        }

        Some(
            Element::new("footer")
                .class("running-foot")
                .style("position", "absolute")
                .style("bottom", format!("{}in", values::num(edge * 0.45)))
                .style("left", format!("{}in", values::num(left)))
                .style("right", format!("{}in", values::num(right)))
                .wrap(format, &inner),
        )
    }

    fn chapter_opener(&self, chapter: u32, title: Option<&str>, format: Format) -> String {
        let padding = non_negative(
            self.config.chapter_top_padding_in,
            crate::config::DEFAULT_CHAPTER_TOP_PADDING_IN,
        );
        let mut inner = Element::new("div")
            .class("chapter-number")
            .wrap(format, &format!("Chapter {chapter}"));
        if let Some(title) = title {
            inner.push_str(&Element::new("h2").class("chapter-title").wrap(format, &escape_text(title)));
        }
        Element::new("div")
            .class("chapter-opener")
            .style("padding-top", format!("{}in", values::num(padding)))
            .style("text-align", "center")
            .wrap(format, &inner)
    }

    /// Page and typography rules followed by the block and script rules.
    pub(crate) fn stylesheet(&self, doc: &Document, geometry: &PageGeometry) -> String {
        let settings = &doc.settings;
        let body_font = values::font_family(Some(settings.fonts.body.as_str())).unwrap_or_else(|| "'Georgia'".to_string());
        let heading_font = values::font_family(Some(settings.fonts.heading.as_str())).unwrap_or_else(|| body_font.clone());
        let base_size = values::font_size(settings.typography.base_size).unwrap_or(11.0);
        let line_height = settings
            .typography
            .line_height
            .filter(|l| (0.8..=3.0).contains(l))
            .unwrap_or(1.5);
        let primary = values::color_or(Some(settings.colors.primary.as_str()), "#1a1a1a");
        let secondary = values::color_or(Some(settings.colors.secondary.as_str()), "#555555");
        let accent = values::color_or(Some(settings.colors.accent.as_str()), "#8b5cf6");

        let mut css = String::new();
        let _ = write!(
            css,
            "@page {{ size: {w}in {h}in; margin: 0; }}\n\
             html, body {{ margin: 0; padding: 0; }}\n\
             body {{ font-family: {body_font}, serif; font-size: {size}pt; line-height: {lh}; color: {primary}; }}\n\
             h1, h2, .chapter-title {{ font-family: {heading_font}, serif; }}\n\
             .page {{ page-break-after: always; break-after: page; }}\n\
             .page:last-child {{ page-break-after: auto; break-after: auto; }}\n\
             .running-head, .running-foot {{ font-size: 0.75em; color: {secondary}; }}\n\
             .running-head {{ letter-spacing: 0.08em; text-transform: uppercase; }}\n\
             .chapter-number {{ font-size: 0.9em; letter-spacing: 0.2em; text-transform: uppercase; color: {accent}; }}\n\
             .chapter-title {{ font-size: 1.8em; margin: 0.3em 0 1.2em 0; }}\n\
             .drop-cap .bt .pane-l1::first-letter {{ float: left; font-size: 3.2em; line-height: 0.85; padding-right: 0.08em; color: {accent}; }}\n\
             .watermark {{ position: absolute; pointer-events: none; }}\n",
            w = values::num(geometry.page_width_in()),
            h = values::num(geometry.page_height_in()),
            size = values::num(base_size),
            lh = values::num(line_height),
        );
        css.push_str(&stylesheet::block_css());
        css.push_str(&stylesheet::script_css());
        css
    }
}

/// Rendering context for a whole document.
pub(crate) fn document_context(doc: &Document, format: Format, tier: Tier) -> RenderContext<'_> {
    RenderContext::new(format, doc.source_lang(), doc.target_lang(), tier)
        .with_default_layout(doc.settings.default_layout.unwrap_or_default())
}

/// Header text: the page override, else author on even pages and title on
/// odd pages.
pub fn running_head_text<'d>(doc: &'d Document, page: &'d Page, number: u32) -> &'d str {
    match page.header.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ if is_even(number) => doc.display_author(),
        _ => doc.display_title(),
    }
}

fn non_negative(value: f64, default: f64) -> f64 {
    if value.is_finite() && value >= 0.0 { value } else { default }
}
