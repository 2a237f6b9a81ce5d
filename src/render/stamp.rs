//! Stamps: small labelled markers.

use crate::model::StampBlock;
use crate::sanitize::escape_text;

use super::{Element, RenderContext, element_id, values};

const MAX_ICON_CHARS: usize = 4;

pub(super) fn render(block: &StampBlock, ctx: &RenderContext<'_>) -> String {
    let label = block.label.trim();
    let icon = Some(block.icon.trim()).filter(|i| !i.is_empty() && i.chars().count() <= MAX_ICON_CHARS);
    if label.is_empty() && icon.is_none() {
        return String::new();
    }

    let mut inner = String::new();
    if let Some(icon) = icon {
        inner.push_str(
            &Element::new("span")
                .class("stamp-icon")
                .attr("aria-hidden", "true")
                .wrap(ctx.format, &escape_text(icon)),
        );
    }
    if !label.is_empty() {
        inner.push_str(&Element::new("span").class("stamp-label").wrap(ctx.format, &escape_text(label)));
    }

    let stamp = Element::new("span")
        .class("stamp")
        .style("display", "inline-flex")
        .style("gap", "0.3em")
        .style("align-items", "center")
        .style("padding", "0.15em 0.6em")
        .style("border-radius", "999px")
        .style("font-size", "0.8em")
        .style("font-weight", "bold")
        .style("color", values::color_or(block.color.as_deref(), "#ffffff"))
        .style("background", values::color_or(block.background_color.as_deref(), "#8b5cf6"))
        .wrap(ctx.format, &inner);

    Element::new("div")
        .class("stamp-block")
        .attr_opt("id", element_id(&block.id))
        .style("margin", "0.5em 0")
        .wrap(ctx.format, &stamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tier;
    use crate::render::Format;

    #[test]
    fn test_stamp_markup() {
        let ctx = RenderContext::new(Format::Epub, "fr", "en", Tier::Paid);
        let block = StampBlock {
            id: "s1".to_string(),
            label: "New & hot".to_string(),
            icon: "\u{2605}".to_string(),
            ..Default::default()
        };
        let html = render(&block, &ctx);
        assert_eq!(
            html,
            "<div class=\"stamp-block\" id=\"block-s1\"><span class=\"stamp\"><span class=\"stamp-icon\" aria-hidden=\"true\">\u{2605}</span><span class=\"stamp-label\">New &amp; hot</span></span></div>"
        );
    }

    #[test]
    fn test_colors_in_print() {
        let ctx = RenderContext::new(Format::Print, "fr", "en", Tier::Paid);
        let block = StampBlock {
            label: "B1".to_string(),
            color: Some("#000".to_string()),
            background_color: Some("not a color".to_string()),
            ..Default::default()
        };
        let html = render(&block, &ctx);
        assert!(html.contains("color: #000"));
        assert!(html.contains("background: #8b5cf6"));
    }

    #[test]
    fn test_oversized_icon_dropped() {
        let ctx = RenderContext::new(Format::Print, "fr", "en", Tier::Paid);
        let block = StampBlock {
            label: "x".to_string(),
            icon: "<svg onload=alert(1)>".to_string(),
            ..Default::default()
        };
        assert!(!render(&block, &ctx).contains("svg"));
        assert_eq!(render(&StampBlock::default(), &ctx), "");
    }
}
