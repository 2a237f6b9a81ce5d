//! Image blocks.
//!
//! HTML targets reference the original source when it is an `http(s)` URL
//! or an inline `data:image/...` URL. The EPUB target only references
//! images the assembler stored in the package; anything else renders empty.

use crate::model::{ImageBlock, WrapMode};

use super::{BlockRenderer, Element, Format, Lang, RenderContext, element_id, values};

pub(super) fn render(r: &BlockRenderer, block: &ImageBlock, ctx: &RenderContext<'_>) -> String {
    let Some(src) = resolve_src(block, ctx) else {
        tracing::debug!(block_id = %block.id, "Image has no usable source");
        return String::new();
    };

    let width = values::width_percent(block.width);
    let alignment = block.alignment.unwrap_or_default();
    let wrap = block.wrap.unwrap_or(WrapMode::None);

    let mut figure = Element::new("figure")
        .class("img-block")
        .class(format!("align-{}", alignment.as_str()))
        .class_if(ctx.format.is_xhtml(), format!("width-{}", values::width_step(width)))
        .attr_opt("id", element_id(&block.id))
        .style("width", format!("{}%", values::num(width)));

    figure = match wrap {
        WrapMode::Left => figure
            .class("wrap-left")
            .style("float", "left")
            .style("margin", "0 1em 0.5em 0"),
        WrapMode::Right => figure
            .class("wrap-right")
            .style("float", "right")
            .style("margin", "0 0 0.5em 1em"),
        WrapMode::None => figure.style("margin", match alignment.as_str() {
            "left" => "1em auto 1em 0",
            "right" => "1em 0 1em auto",
            _ => "1em auto",
        }),
    };

    let mut img = Element::new("img")
        .attr("src", &src)
        .attr("alt", &block.alt)
        .class_if(block.shadow, "img-shadow")
        .style("max-width", "100%")
        .style("display", "block");

    if let Some(border) = &block.border {
        img = img
            .class("img-bordered")
            .style(
                "border",
                format!(
                    "{}px solid {}",
                    values::num(values::thickness(border.width)),
                    values::color_or(border.color.as_deref(), "#cccccc")
                ),
            )
            .style_opt(
                "border-radius",
                border.radius.filter(|r| *r >= 0.0 && *r <= 200.0).map(|r| format!("{}px", values::num(r))),
            );
    }
    if block.shadow {
        img = img.style("box-shadow", "0 2px 8px rgba(0, 0, 0, 0.25)");
    }
    img = img.style_opt("opacity", values::opacity(block.opacity).map(values::num));

    let mut inner = img.void(ctx.format);
    if let Some(caption) = block.caption.as_ref().filter(|c| !c.is_empty()) {
        let mut spans = String::new();
        if !caption.l1.trim().is_empty() {
            spans.push_str(&r.plain_pane("caption-l1", Lang::L1, &caption.l1, ctx));
        }
        if !caption.l2.trim().is_empty() {
            spans.push_str(&r.plain_pane("caption-l2", Lang::L2, &caption.l2, ctx));
        }
        inner.push_str(
            &Element::new("figcaption")
                .style("font-size", "0.85em")
                .style("text-align", "center")
                .wrap(ctx.format, &spans),
        );
    }

    figure.wrap(ctx.format, &inner)
}

fn resolve_src(block: &ImageBlock, ctx: &RenderContext<'_>) -> Option<String> {
    let src = block.src.trim();
    if src.is_empty() {
        return None;
    }
    match ctx.format {
        Format::Epub => ctx.images?.href(src).map(str::to_string),
        Format::Print | Format::Preview => is_embeddable(src).then(|| src.to_string()),
    }
}

/// Sources an HTML target may reference directly.
fn is_embeddable(src: &str) -> bool {
    let lower = src.get(..11).unwrap_or(src).to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://") || lower.starts_with("data:image/")
}
