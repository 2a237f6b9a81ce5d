//! Single-page preview.
//!
//! A cut-down print layout: only the first page, only its first few
//! blocks, and every text or callout payload truncated to a visible
//! character budget. A document with no pages gets a placeholder page.

use crate::config::PreviewConfig;
use crate::layout::{PageFrame, PrintLayout, PrintMarkup, document_context};
use crate::model::{Block, Document, Page, Tier};
use crate::render::{Element, Format};
use crate::sanitize::{Sanitizer, escape_text};
use crate::script::ScriptTable;

pub const ELLIPSIS: char = '\u{2026}';

/// Sentence shown on the placeholder page.
pub const PLACEHOLDER_TEXT: &str = "This document has no pages yet.";

pub struct PreviewRenderer<'a> {
    layout: &'a PrintLayout<'a>,
    config: &'a PreviewConfig,
}

impl<'a> PreviewRenderer<'a> {
    pub fn new(layout: &'a PrintLayout<'a>, config: &'a PreviewConfig) -> Self {
        Self { layout, config }
    }

    pub fn compile(&self, doc: &Document, tier: Tier) -> PrintMarkup {
        let geometry = self.layout.geometry(doc);
        let ctx = document_context(doc, Format::Preview, tier);

        let html = match doc.pages().first() {
            Some(page) => {
                let blocks = self.truncated_blocks(doc, page);
                let frame = PageFrame {
                    page,
                    number: page.number_or(0),
                    chapter: page.is_chapter_start.then_some(1),
                };
                self.layout.render_page(doc, frame, &blocks, &ctx, &geometry)
            }
            None => {
                tracing::debug!("Document has no pages, rendering placeholder preview");
                let page = Page::new(1);
                let frame = PageFrame {
                    page: &page,
                    number: 1,
                    chapter: None,
                };
                let mut content = Element::new("h1")
                    .class("preview-title")
                    .style("text-align", "center")
                    .style("margin-top", "2in")
                    .wrap(ctx.format, &escape_text(doc.display_title()));
                content.push_str(
                    &Element::new("p")
                        .class("preview-placeholder")
                        .style("text-align", "center")
                        .style("color", "#9ca3af")
                        .style("font-style", "italic")
                        .wrap(ctx.format, PLACEHOLDER_TEXT),
                );
                self.layout.page_section(doc, frame, &content, &ctx, &geometry)
            }
        };

        PrintMarkup {
            html,
            css: self.layout.stylesheet(doc, &geometry),
            geometry,
            page_count: 1,
        }
    }

    fn truncated_blocks(&self, doc: &Document, page: &Page) -> Vec<Block> {
        let renderer = self.layout.renderer();
        let truncate = Truncator {
            sanitizer: renderer.sanitizer(),
            scripts: renderer.scripts(),
            budget: self.config.max_chars,
        };
        page.blocks
            .iter()
            .take(self.config.max_blocks)
            .map(|block| match block {
                Block::Text(text) => {
                    let mut text = text.clone();
                    text.l1.content = truncate.apply(&text.l1.content, doc.source_lang());
                    text.l2.content = truncate.apply(&text.l2.content, doc.target_lang());
                    Block::Text(text)
                }
                Block::Callout(callout) => {
                    let mut callout = callout.clone();
                    callout.body.l1 = truncate.apply(&callout.body.l1, doc.source_lang());
                    callout.body.l2 = truncate.apply(&callout.body.l2, doc.target_lang());
                    Block::Callout(callout)
                }
                other => other.clone(),
            })
            .collect()
    }
}

struct Truncator<'a> {
    sanitizer: &'a Sanitizer,
    scripts: &'a ScriptTable,
    budget: usize,
}

impl Truncator<'_> {
    fn apply(&self, html: &str, lang: &str) -> String {
        if self.scripts.resolve(lang).script.is_space_delimited() {
            truncate_with(self.sanitizer, html, self.budget)
        } else {
            truncate_chars_with(self.sanitizer, html, self.budget)
        }
    }
}

/// Truncate rich text to `budget` visible characters at a word boundary.
///
/// Text that fits is returned unchanged, markup included. Otherwise the
/// result is escaped plain text cut at the last whitespace at or before
/// the budget, followed by an ellipsis. With no whitespace in range the
/// result is the ellipsis alone.
///
/// Only meaningful for space-delimited scripts.
pub fn truncate_visible(html: &str, budget: usize) -> String {
    truncate_with(&Sanitizer::new(), html, budget)
}

fn truncate_with(sanitizer: &Sanitizer, html: &str, budget: usize) -> String {
    let visible = sanitizer.visible_text(html);
    if visible.chars().count() <= budget {
        return html.to_string();
    }

    // One past the budget, so a space right after the last kept character counts.
    let window: String = visible.chars().take(budget + 1).collect();
    let cut = window
        .char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .map(|(i, _)| i)
        .next_back()
        .unwrap_or(0);

    let mut out = escape_text(window[..cut].trim_end());
    out.push(ELLIPSIS);
    out
}

/// Character-count truncation for scripts without word spacing.
fn truncate_chars_with(sanitizer: &Sanitizer, html: &str, budget: usize) -> String {
    let visible = sanitizer.visible_text(html);
    if visible.chars().count() <= budget {
        return html.to_string();
    }
    let kept: String = visible.chars().take(budget).collect();
    let mut out = escape_text(&kept);
    out.push(ELLIPSIS);
    out
}
