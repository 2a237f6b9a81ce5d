//! Cloze exercises.
//!
//! The answer never appears inline: the blank is sized to the answer and
//! the answer itself goes in an upside-down key line below the prompt.

use crate::model::QuizBlock;
use crate::sanitize::escape_text;

use super::{BlockRenderer, Element, RenderContext, element_id};

const MIN_BLANK: usize = 4;
const MAX_BLANK: usize = 24;

pub(super) fn render(r: &BlockRenderer, block: &QuizBlock, ctx: &RenderContext<'_>) -> String {
    let answer = r.sanitizer().visible_text(&block.answer);
    let blank_len = answer.trim().chars().count().clamp(MIN_BLANK, MAX_BLANK);

    let blank = Element::new("span")
        .class("quiz-blank")
        .style("letter-spacing", "0.05em")
        .wrap(ctx.format, &"_".repeat(blank_len));

    let mut prompt = r.rich(&block.pre_text, ctx.format);
    if !prompt.is_empty() {
        prompt.push(' ');
    }
    prompt.push_str(&blank);
    let post = r.rich(&block.post_text, ctx.format);
    if !post.is_empty() {
        if !post.starts_with(['.', ',', '!', '?', ';', ':']) {
            prompt.push(' ');
        }
        prompt.push_str(&post);
    }

    // Rich prompt text may carry its own paragraphs and lists
    let mut inner = Element::new("div")
        .class("quiz-prompt")
        .attr("lang", ctx.source_lang)
        .wrap(ctx.format, &prompt);

    if let Some(hint) = block.hint.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
        inner.push_str(
            &Element::new("p")
                .class("quiz-hint")
                .style("font-style", "italic")
                .style("color", "#6b7280")
                .wrap(ctx.format, &format!("Hint: {}", escape_text(hint))),
        );
    }
    if !answer.trim().is_empty() {
        inner.push_str(
            &Element::new("p")
                .class("quiz-answer")
                .style("font-size", "0.75em")
                .style("color", "#9ca3af")
                .style("transform", "rotate(180deg)")
                .style("text-align", "right")
                .wrap(ctx.format, &escape_text(answer.trim())),
        );
    }

    let mut el = Element::new("div")
        .class("quiz")
        .attr_opt("id", element_id(&block.id))
        .style("margin", "1em 0")
        .style("padding", "0.6em 0.8em")
        .style("border", "1px dashed #9ca3af");
    if let Some(difficulty) = block.difficulty {
        el = el
            .class(format!("quiz-{}", difficulty.as_str()))
            .attr("data-difficulty", difficulty.as_str());
    }
    el.wrap(ctx.format, &inner)
}
