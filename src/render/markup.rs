//! Element builder shared by the block renderers.
//!
//! Attribute values are escaped on the way in. Inline `style` declarations
//! are collected for every format but only emitted for HTML targets; the
//! EPUB target relies on classes and the package stylesheet.

use std::fmt::Write;

use crate::sanitize::escape_text;

use super::Format;

pub(crate) struct Element {
    name: &'static str,
    classes: Vec<String>,
    attrs: Vec<(&'static str, String)>,
    styles: Vec<(&'static str, String)>,
}

impl Element {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            classes: Vec::new(),
            attrs: Vec::new(),
            styles: Vec::new(),
        }
    }

    pub(crate) fn class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !class.is_empty() {
            self.classes.push(class);
        }
        self
    }

    pub(crate) fn class_if(self, cond: bool, class: impl Into<String>) -> Self {
        if cond { self.class(class) } else { self }
    }

    pub(crate) fn attr(mut self, name: &'static str, value: impl AsRef<str>) -> Self {
        self.attrs.push((name, escape_text(value.as_ref())));
        self
    }

    pub(crate) fn attr_opt(self, name: &'static str, value: Option<impl AsRef<str>>) -> Self {
        match value {
            Some(v) => self.attr(name, v),
            None => self,
        }
    }

    /// Add a declaration. Values must already be validated.
    pub(crate) fn style(mut self, property: &'static str, value: impl Into<String>) -> Self {
        self.styles.push((property, value.into()));
        self
    }

    pub(crate) fn style_opt(self, property: &'static str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.style(property, v),
            None => self,
        }
    }

    fn write_open(&self, out: &mut String, format: Format) {
        out.push('<');
        out.push_str(self.name);
        if !self.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape_text(&self.classes.join(" ")));
        }
        for (name, value) in &self.attrs {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        if !format.is_xhtml() && !self.styles.is_empty() {
            out.push_str(" style=\"");
            for (i, (property, value)) in self.styles.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                let _ = write!(out, "{property}: {}", escape_text(value));
            }
            out.push('"');
        }
    }

    /// Render with the given (already safe) inner markup.
    pub(crate) fn wrap(&self, format: Format, inner: &str) -> String {
        let mut out = String::with_capacity(inner.len() + 64);
        self.write_open(&mut out, format);
        out.push('>');
        out.push_str(inner);
        let _ = write!(out, "</{}>", self.name);
        out
    }

    /// Render as a void element (`<img/>` in XHTML, `<img>` in HTML).
    pub(crate) fn void(&self, format: Format) -> String {
        let mut out = String::with_capacity(64);
        self.write_open(&mut out, format);
        out.push_str(if format.is_xhtml() { "/>" } else { ">" });
        out
    }
}

/// Turn an author-supplied block id into a valid XML id.
pub(crate) fn element_id(block_id: &str) -> Option<String> {
    let cleaned: String = block_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    (!cleaned.is_empty()).then(|| format!("block-{cleaned}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_only_in_html() {
        let el = Element::new("div").class("a").style("width", "50%");
        assert_eq!(el.wrap(Format::Print, "x"), r#"<div class="a" style="width: 50%">x</div>"#);
        assert_eq!(el.wrap(Format::Epub, "x"), r#"<div class="a">x</div>"#);
    }

    #[test]
    fn test_void_elements() {
        let el = Element::new("img").attr("src", "a.png").attr("alt", "\"q\"");
        assert_eq!(el.void(Format::Epub), r#"<img src="a.png" alt="&quot;q&quot;"/>"#);
        assert_eq!(el.void(Format::Print), r#"<img src="a.png" alt="&quot;q&quot;">"#);
    }

    #[test]
    fn test_element_id() {
        assert_eq!(element_id("b1"), Some("block-b1".to_string()));
        assert_eq!(element_id("a b\"c"), Some("block-abc".to_string()));
        assert_eq!(element_id("\u{e9}"), None);
    }
}
