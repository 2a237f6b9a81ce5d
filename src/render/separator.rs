//! Separators: rules and ornaments.

use crate::model::SeparatorBlock;
use crate::sanitize::escape_text;

use super::{Element, RenderContext, element_id, values};

const LINE_STYLES: [&str; 4] = ["solid", "dashed", "dotted", "double"];

const ORNAMENTS: [(&str, &str); 7] = [
    ("fleuron", "\u{2766}"),
    ("asterism", "\u{2042}"),
    ("stars", "\u{2605} \u{2605} \u{2605}"),
    ("dinkus", "* * *"),
    ("diamond", "\u{25c6}"),
    ("floral", "\u{2767}"),
    ("dots", "\u{2022} \u{2022} \u{2022}"),
];

/// Longest accepted custom glyph, in characters.
const MAX_GLYPH_CHARS: usize = 16;

enum Kind<'a> {
    Line(&'static str),
    Ornament(&'static str, &'a str),
}

fn classify(block: &SeparatorBlock) -> Kind<'_> {
    let style = block.style.trim().to_ascii_lowercase();
    if let Some(line) = LINE_STYLES.into_iter().find(|s| *s == style) {
        return Kind::Line(line);
    }
    if let Some((name, glyph)) = ORNAMENTS.into_iter().find(|(name, _)| *name == style) {
        return Kind::Ornament(name, glyph);
    }
    if style == "custom" {
        if let Some(glyph) = block
            .custom_glyph
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty() && g.chars().count() <= MAX_GLYPH_CHARS)
        {
            return Kind::Ornament("custom", glyph);
        }
    }
    if !style.is_empty() {
        tracing::debug!(style = %style, "Unknown separator style, using solid line");
    }
    Kind::Line("solid")
}

pub(super) fn render(block: &SeparatorBlock, ctx: &RenderContext<'_>) -> String {
    let width = values::width_percent(block.width);
    let color = values::color_or(block.color.as_deref(), "#999999");
    let width_class = format!("width-{}", values::width_step(width));

    match classify(block) {
        Kind::Line(style) => {
            let thickness = values::thickness(block.thickness);
            Element::new("hr")
                .class("sep")
                .class(format!("sep-{style}"))
                .class_if(ctx.format.is_xhtml(), width_class)
                .attr_opt("id", element_id(&block.id))
                .style("border", "none")
                .style(
                    "border-top",
                    format!("{}px {style} {color}", values::num(thickness)),
                )
                .style("width", format!("{}%", values::num(width)))
                .style("margin", "1.2em auto")
                .void(ctx.format)
        }
        Kind::Ornament(name, glyph) => Element::new("div")
            .class("sep")
            .class("sep-ornament")
            .class(format!("sep-{name}"))
            .attr_opt("id", element_id(&block.id))
            .attr("role", "separator")
            .style("text-align", "center")
            .style("color", color)
            .style("margin", "1.2em auto")
            .style("letter-spacing", "0.3em")
            .wrap(ctx.format, &escape_text(glyph)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tier;
    use crate::render::Format;

    fn sep(style: &str) -> SeparatorBlock {
        SeparatorBlock {
            id: "s1".to_string(),
            style: style.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let ctx = RenderContext::new(Format::Print, "fr", "en", Tier::Paid);
        let html = render(&SeparatorBlock::default(), &ctx);
        assert!(html.contains("border-top: 1px solid #999999"));
        assert!(html.contains("width: 100%"));
    }

    #[test]
    fn test_invalid_thickness_and_color_fall_back() {
        let ctx = RenderContext::new(Format::Print, "fr", "en", Tier::Paid);
        let mut block = sep("dashed");
        block.thickness = Some(-3.0);
        block.color = Some("red;position:fixed".to_string());
        let html = render(&block, &ctx);
        assert!(html.contains("border-top: 1px dashed #999999"));
        assert!(!html.contains("position"));
    }

    #[test]
    fn test_ornaments() {
        let ctx = RenderContext::new(Format::Epub, "fr", "en", Tier::Paid);
        let html = render(&sep("fleuron"), &ctx);
        assert!(html.contains("sep-fleuron"));
        assert!(html.contains('\u{2766}'));

        let mut custom = sep("custom");
        custom.custom_glyph = Some("<~>".to_string());
        let html = render(&custom, &ctx);
        assert!(html.contains("&lt;~&gt;"));
    }

    #[test]
    fn test_epub_line_is_self_closed() {
        let ctx = RenderContext::new(Format::Epub, "fr", "en", Tier::Paid);
        let mut block = sep("solid");
        block.width = Some(60.0);
        let html = render(&block, &ctx);
        assert_eq!(html, r#"<hr class="sep sep-solid width-60" id="block-s1"/>"#);
    }

    #[test]
    fn test_unknown_style_is_solid() {
        let ctx = RenderContext::new(Format::Epub, "fr", "en", Tier::Paid);
        assert!(render(&sep("zigzag"), &ctx).contains("sep-solid"));
    }
}
