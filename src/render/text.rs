//! Bilingual text blocks.

use crate::model::{TextBlock, TextLayout};

use super::{BlockRenderer, Element, Format, Lang, RenderContext, element_id};

pub(super) fn render(r: &BlockRenderer, block: &TextBlock, ctx: &RenderContext<'_>) -> String {
    let layout = block.layout.unwrap_or(ctx.default_layout);
    let pane_tag = if block.is_title {
        "h1"
    } else if block.is_chapter_heading {
        "h2"
    } else {
        "div"
    };

    let inner = match layout {
        TextLayout::Alternating => alternating(r, block, ctx),
        _ => {
            let mut out = r.pane(pane_tag, Lang::L1, &block.l1.content, Some(&block.l1.formatting), ctx);
            out.push_str(&r.pane(pane_tag, Lang::L2, &block.l2.content, Some(&block.l2.formatting), ctx));
            out
        }
    };

    let mut el = Element::new("div")
        .class("bt")
        .class(format!("bt-{}", layout.as_str()))
        .class_if(block.is_title, "bt-title")
        .class_if(block.is_chapter_heading, "bt-chapter-heading")
        .attr_opt("id", element_id(&block.id));
    el = layout_styles(el, layout, ctx.format);
    el.wrap(ctx.format, &inner)
}

fn layout_styles(el: Element, layout: TextLayout, format: Format) -> Element {
    if format.is_xhtml() {
        return el;
    }
    match layout {
        TextLayout::SideBySide => el
            .style("display", "grid")
            .style("grid-template-columns", "1fr 1fr")
            .style("column-gap", "1.5em"),
        TextLayout::Interlinear => el.style("line-height", "1.3"),
        TextLayout::Stacked | TextLayout::Alternating => el,
    }
}

/// Interleave the two languages line by line.
///
/// Lines are split on `<br>` and newlines after sanitizing, so a stray tag
/// cannot merge two lines. A side with fewer lines simply runs out.
fn alternating(r: &BlockRenderer, block: &TextBlock, ctx: &RenderContext<'_>) -> String {
    let l1 = lines(r, &block.l1.content);
    let l2 = lines(r, &block.l2.content);
    let count = l1.len().max(l2.len()).max(1);

    let mut out = String::new();
    for i in 0..count {
        let mut pair = String::new();
        if let Some(line) = l1.get(i) {
            pair.push_str(&r.pane("p", Lang::L1, line, Some(&block.l1.formatting), ctx));
        }
        if let Some(line) = l2.get(i) {
            pair.push_str(&r.pane("p", Lang::L2, line, Some(&block.l2.formatting), ctx));
        }
        if pair.is_empty() {
            pair.push_str(&r.pane("p", Lang::L1, "", None, ctx));
        }
        out.push_str(&Element::new("div").class("bt-pair").wrap(ctx.format, &pair));
    }
    out
}

fn lines(r: &BlockRenderer, content: &str) -> Vec<String> {
    r.sanitizer()
        .sanitize_strict(content)
        .split("<br>")
        .flat_map(|s| s.split('\n'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
