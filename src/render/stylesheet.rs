//! CSS for the classes emitted by the block renderers.
//!
//! The EPUB target has no inline styles, so everything it relies on must
//! be here. The print stylesheet includes the same rules so class-only
//! output (and the preview) looks the same.

use std::fmt::Write;

use crate::model::CalloutCategory;
use crate::script::Script;

/// Font stack for a script.
pub fn font_stack(script: Script) -> &'static str {
    match script {
        Script::Arabic => "'Noto Naskh Arabic', 'Amiri', serif",
        Script::Hebrew => "'Noto Serif Hebrew', 'Frank Ruehl CLM', serif",
        Script::Syriac => "'Noto Sans Syriac', serif",
        Script::Thaana => "'Noto Sans Thaana', serif",
        Script::Devanagari => "'Noto Serif Devanagari', 'Mangal', serif",
        Script::Bengali => "'Noto Serif Bengali', serif",
        Script::Gurmukhi => "'Noto Sans Gurmukhi', serif",
        Script::Gujarati => "'Noto Serif Gujarati', serif",
        Script::Tamil => "'Noto Serif Tamil', serif",
        Script::Telugu => "'Noto Serif Telugu', serif",
        Script::Kannada => "'Noto Serif Kannada', serif",
        Script::Malayalam => "'Noto Serif Malayalam', serif",
        Script::Sinhala => "'Noto Serif Sinhala', serif",
        Script::Thai => "'Noto Serif Thai', serif",
        Script::Lao => "'Noto Serif Lao', serif",
        Script::Khmer => "'Noto Serif Khmer', serif",
        Script::Myanmar => "'Noto Serif Myanmar', serif",
        Script::Georgian => "'Noto Serif Georgian', serif",
        Script::Armenian => "'Noto Serif Armenian', serif",
        Script::Ethiopic => "'Noto Serif Ethiopic', serif",
        Script::Han => "'Noto Serif CJK SC', 'Songti SC', serif",
        Script::Japanese => "'Noto Serif CJK JP', 'Hiragino Mincho ProN', serif",
        Script::Korean => "'Noto Serif CJK KR', 'Batang', serif",
        Script::Latin | Script::Cyrillic | Script::Greek => "inherit",
    }
}

/// Per-script font and direction rules.
pub fn script_css() -> String {
    let mut css = String::new();
    for script in Script::ALL {
        let stack = font_stack(script);
        if stack == "inherit" && !script.is_rtl() {
            continue;
        }
        let _ = write!(css, ".{} {{ font-family: {stack};", script.css_class());
        if script.is_rtl() {
            css.push_str(" direction: rtl; text-align: right; unicode-bidi: isolate;");
        }
        if matches!(script, Script::Han | Script::Japanese | Script::Korean) {
            css.push_str(" line-break: strict; word-break: normal;");
        }
        css.push_str(" }\n");
    }
    css
}

const BLOCK_CSS: &str = r#".bt { margin: 0 0 1em 0; }
.bt-side-by-side { display: table; width: 100%; table-layout: fixed; }
.bt-side-by-side > .pane { display: table-cell; width: 50%; padding: 0 0.75em; vertical-align: top; }
.bt-interlinear > .pane-l2 { font-size: 0.85em; font-style: italic; color: #555555; margin-bottom: 0.3em; }
.bt-stacked > .pane-l2 { margin-top: 0.4em; color: #555555; }
.bt-alternating .bt-pair { margin-bottom: 0.5em; }
.bt-alternating .pane { margin: 0; }
.bt-alternating .pane-l2 { color: #555555; font-style: italic; }
.bt-title .pane { text-align: center; }
.bt-chapter-heading .pane { text-align: center; }
.fmt-bold { font-weight: bold; }
.fmt-italic { font-style: italic; }
.fmt-underline { text-decoration: underline; }
.align-left { text-align: left; }
.align-center { text-align: center; }
.align-right { text-align: right; }
.align-justify { text-align: justify; }
figure.img-block { margin: 1em auto; }
figure.img-block.align-left { margin-left: 0; }
figure.img-block.align-right { margin-right: 0; }
figure.img-block img { display: block; max-width: 100%; }
figure.wrap-left { float: left; margin: 0 1em 0.5em 0; }
figure.wrap-right { float: right; margin: 0 0 0.5em 1em; }
img.img-bordered { border: 1px solid #cccccc; }
img.img-shadow { box-shadow: 0 2px 8px rgba(0, 0, 0, 0.25); }
figcaption { font-size: 0.85em; text-align: center; }
figcaption span { display: block; }
hr.sep { border: none; border-top: 1px solid #999999; margin: 1.2em auto; }
hr.sep-dashed { border-top-style: dashed; }
hr.sep-dotted { border-top-style: dotted; }
hr.sep-double { border-top: 3px double #999999; }
.sep-ornament { text-align: center; color: #999999; margin: 1.2em auto; letter-spacing: 0.3em; }
aside.callout { margin: 1em 0; padding: 0.8em 1em; border-left: 4px solid #6b7280; border-radius: 4px; }
.callout-title { font-weight: bold; margin-bottom: 0.4em; }
table.tbl { border-collapse: collapse; width: 100%; margin: 1em 0; }
table.tbl th, table.tbl td { border: 1px solid #d1d5db; padding: 0.35em 0.6em; }
table.tbl th { background: #f3f4f6; }
.quiz { margin: 1em 0; padding: 0.6em 0.8em; border: 1px dashed #9ca3af; }
.quiz-prompt { margin: 0 0 0.5em 0; }
.quiz-hint { font-style: italic; color: #6b7280; }
.quiz-answer { font-size: 0.75em; color: #9ca3af; transform: rotate(180deg); text-align: right; }
.stamp-block { margin: 0.5em 0; }
.stamp { display: inline-block; padding: 0.15em 0.6em; border-radius: 999px; font-size: 0.8em; font-weight: bold; color: #ffffff; background: #8b5cf6; }
.stamp-icon { margin-right: 0.3em; }
"#;

/// Rules for every block class, including callout category colors and
/// `width-N` steps.
pub fn block_css() -> String {
    let mut css = String::from(BLOCK_CSS);
    for category in CalloutCategory::ALL {
        let (header, background) = category.palette();
        let _ = writeln!(
            css,
            "aside.callout-{name} {{ border-left-color: {header}; background: {background}; }}\n\
             aside.callout-{name} .callout-title {{ color: {header}; }}",
            name = category.as_str()
        );
    }
    for step in (5..=100).step_by(5) {
        let _ = writeln!(css, ".width-{step} {{ width: {step}%; }}");
    }
    css
}
