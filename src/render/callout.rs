//! Callout boxes.

use crate::model::CalloutBlock;
use crate::sanitize::escape_text;

use super::{BlockRenderer, Element, Lang, RenderContext, element_id, values};

pub(super) fn render(r: &BlockRenderer, block: &CalloutBlock, ctx: &RenderContext<'_>) -> String {
    let category = block.category();
    let (default_header, default_background) = category.palette();
    let header_color = values::color_or(block.header_color.as_deref(), default_header);
    let background = values::color_or(block.background_color.as_deref(), default_background);

    let title = match block.title.trim() {
        "" => category.default_title(),
        t => t,
    };

    let mut inner = String::new();
    if !title.is_empty() {
        inner.push_str(
            &Element::new("div")
                .class("callout-title")
                .style("color", header_color.clone())
                .style("font-weight", "bold")
                .style("margin-bottom", "0.4em")
                .wrap(ctx.format, &escape_text(title)),
        );
    }
    inner.push_str(&r.pane("div", Lang::L1, &block.body.l1, None, ctx));
    if !block.body.l2.trim().is_empty() {
        inner.push_str(&r.pane("div", Lang::L2, &block.body.l2, None, ctx));
    }

    Element::new("aside")
        .class("callout")
        .class(format!("callout-{}", category.as_str()))
        .attr_opt("id", element_id(&block.id))
        .style("border-left", format!("4px solid {header_color}"))
        .style("background", background)
        .style("padding", "0.8em 1em")
        .style("margin", "1em 0")
        .style("border-radius", "4px")
        .wrap(ctx.format, &inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BilingualText, CalloutCategory, Tier};
    use crate::render::Format;

    #[test]
    fn test_category_palette_and_default_title() {
        let r = BlockRenderer::default();
        let ctx = RenderContext::new(Format::Print, "fr", "en", Tier::Paid);
        let block = CalloutBlock {
            id: "c1".to_string(),
            category: Some(CalloutCategory::FalseFriend),
            body: BilingualText::new("<b>librairie</b>", "bookshop, not library"),
            ..Default::default()
        };
        let html = render(&r, &block, &ctx);
        assert!(html.contains("callout-false-friend"));
        assert!(html.contains("False friend"));
        assert!(html.contains("#ef4444"));
        assert!(html.contains("<b>librairie</b>"));
        assert!(html.contains("bookshop, not library"));
    }

    #[test]
    fn test_title_is_escaped_and_colors_validated() {
        let r = BlockRenderer::default();
        let ctx = RenderContext::new(Format::Print, "fr", "en", Tier::Paid);
        let block = CalloutBlock {
            title: "<i>Tip</i> & trick".to_string(),
            header_color: Some("url(javascript:x)".to_string()),
            ..Default::default()
        };
        let html = render(&r, &block, &ctx);
        assert!(html.contains("&lt;i&gt;Tip&lt;/i&gt; &amp; trick"));
        assert!(!html.contains("javascript"));
        assert!(html.contains("#3b82f6"));
    }

    #[test]
    fn test_epub_uses_classes() {
        let r = BlockRenderer::default();
        let ctx = RenderContext::new(Format::Epub, "ar", "en", Tier::Paid);
        let block = CalloutBlock {
            category: Some(CalloutCategory::Grammar),
            body: BilingualText::new("مرحبا", "hello"),
            ..Default::default()
        };
        let html = render(&r, &block, &ctx);
        assert!(html.starts_with(r#"<aside class="callout callout-grammar">"#));
        assert!(html.contains(r#"dir="rtl""#));
        assert!(!html.contains("style="));
    }
}
