//! Sanitization boundary between author input and generated markup.
//!
//! Every author-supplied string passes through one of two functions before
//! it is embedded anywhere:
//!
//! - [`sanitize_strict`] for rich text: drops scripts, styles, event
//!   handlers and any tag outside a small inline/structural allow-list,
//!   keeping allowed markup.
//! - [`escape_text`] for plain-text and attribute contexts: escapes the five
//!   markup metacharacters with no allow-list.
//!
//! Both are idempotent. [`escape_text`] leaves well-formed character
//! references alone, so `&amp;` stays `&amp;` on a second pass; the price is
//! that an author who types a literal `&lt;` sees `<`. Neither lets through a
//! character, or a reference to one, that XML 1.0 forbids.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use ammonia::Builder;

/// Tags kept by [`sanitize_strict`].
const ALLOWED_TAGS: [&str; 22] = [
    "b", "strong", "i", "em", "u", "s", "del", "ins", "mark", "small", "sub", "sup", "span",
    "br", "p", "ul", "ol", "li", "blockquote", "ruby", "rt", "rp",
];

/// Passes of the strict cleaner before markup that keeps reshaping itself
/// is reduced to its text.
const MAX_CLEAN_PASSES: usize = 4;

/// Tags removed together with their content.
const CLEAN_CONTENT_TAGS: [&str; 2] = ["script", "style"];

/// Configured sanitizers. Cheap to share; build once per process.
pub struct Sanitizer {
    strict: Builder<'static>,
    text_only: Builder<'static>,
}

impl Sanitizer {
    pub fn new() -> Self {
        Self {
            strict: build_strict(),
            text_only: build_text_only(),
        }
    }

    /// Clean rich text down to the allow-list.
    ///
    /// The HTML tree builder can re-nest misplaced elements differently on a
    /// second parse, so cleaning repeats until the output no longer changes.
    pub fn sanitize_strict(&self, html: &str) -> String {
        let mut current = self.clean_once(html);
        for _ in 0..MAX_CLEAN_PASSES {
            let next = self.clean_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
        tracing::debug!(len = html.len(), "Markup did not settle, keeping its text only");
        xml_chars_only(&self.text_only.clean(&current).to_string()).into_owned()
    }

    fn clean_once(&self, html: &str) -> String {
        xml_chars_only(&self.strict.clean(html).to_string()).into_owned()
    }

    /// Visible text content with markup removed and references decoded.
    pub fn visible_text(&self, html: &str) -> String {
        let stripped = self.text_only.clean(html).to_string();
        xml_chars_only(&decode_references(&stripped)).into_owned()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

fn build_strict() -> Builder<'static> {
    let mut builder = Builder::empty();
    builder.tags(HashSet::from(ALLOWED_TAGS));
    builder.clean_content_tags(HashSet::from(CLEAN_CONTENT_TAGS));
    builder.generic_attributes(HashSet::from(["lang", "dir"]));
    builder.strip_comments(true);
    builder
}

fn build_text_only() -> Builder<'static> {
    let mut builder = Builder::empty();
    builder.clean_content_tags(HashSet::from(CLEAN_CONTENT_TAGS));
    builder.strip_comments(true);
    builder
}

static SHARED: LazyLock<Sanitizer> = LazyLock::new(Sanitizer::new);

/// Clean rich text with the process-wide [`Sanitizer`].
pub fn sanitize_strict(html: &str) -> String {
    SHARED.sanitize_strict(html)
}

/// Visible text of rich text with the process-wide [`Sanitizer`].
pub fn visible_text(html: &str) -> String {
    SHARED.visible_text(html)
}

/// Escape `& < > " '` for text and attribute contexts.
///
/// Existing character references (`&amp;`, `&#160;`, `&#x2014;`, ...) are
/// kept as-is.
pub fn escape_text(s: &str) -> String {
    let s = xml_chars_only(s);
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    let mut rest: &str = &s;

    while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let consumed = match tail.as_bytes()[0] {
            b'&' => match reference_len(tail) {
                Some(len) => {
                    out.push_str(&tail[..len]);
                    len
                }
                None => {
                    out.push_str("&amp;");
                    1
                }
            },
            b'<' => {
                out.push_str("&lt;");
                1
            }
            b'>' => {
                out.push_str("&gt;");
                1
            }
            b'"' => {
                out.push_str("&quot;");
                1
            }
            _ => {
                out.push_str("&#39;");
                1
            }
        };
        rest = &tail[consumed..];
    }

    out.push_str(rest);
    out
}

/// Length of a well-formed XML reference at the start of `s`.
///
/// Numeric references count only when they name a character XML allows.
fn reference_len(s: &str) -> Option<usize> {
    let window = &s.as_bytes()[..s.len().min(12)];
    let end = memchr::memchr(b';', window)?;
    let body = &s[1..end];
    let valid = match body {
        "amp" | "lt" | "gt" | "quot" | "apos" => true,
        _ => match body.strip_prefix('#') {
            Some(hex) if hex.starts_with(['x', 'X']) => {
                let digits = &hex[1..];
                digits.len() <= 6
                    && digits.chars().all(|c| c.is_ascii_hexdigit())
                    && referenced_char_is_legal(digits, 16)
            }
            Some(dec) => {
                dec.len() <= 7 && dec.chars().all(|c| c.is_ascii_digit()) && referenced_char_is_legal(dec, 10)
            }
            None => false,
        },
    };
    valid.then_some(end + 1)
}

fn referenced_char_is_legal(digits: &str, radix: u32) -> bool {
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .is_some_and(is_xml_char)
}

/// Whether `c` may appear in an XML 1.0 document.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// `s` without the characters XML cannot carry.
fn xml_chars_only(s: &str) -> Cow<'_, str> {
    if s.chars().all(is_xml_char) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

/// Convert sanitized HTML to well-formed XHTML.
///
/// The allow-list holds a single void element (`br`) and the serializer only
/// emits one named reference outside the XML set (`&nbsp;`), so two
/// rewrites are enough.
pub fn to_xhtml(sanitized: &str) -> String {
    sanitized.replace("<br>", "<br/>").replace("&nbsp;", "&#160;")
}

fn decode_references(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let xml_safe = s.replace("&nbsp;", "&#160;");
    match quick_xml::escape::unescape(&xml_safe) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Owned(xml_safe),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_script_removed_text_kept() {
        let out = sanitize_strict("<script>alert(1)</script>Hi");
        assert_eq!(out, "Hi");
    }

    #[test]
    fn test_allowed_inline_markup_kept() {
        let out = sanitize_strict("<strong>bold</strong> and <em>it</em><br>");
        assert_eq!(out, "<strong>bold</strong> and <em>it</em><br>");
    }

    #[test]
    fn test_event_handlers_and_unknown_tags_dropped() {
        let out = sanitize_strict(r#"<b onclick="steal()">x</b><img src=x onerror=alert(1)><iframe>y</iframe>"#);
        assert!(out.contains("<b>x</b>"));
        assert!(!out.contains("onclick"));
        assert!(!out.contains("<img"));
        assert!(!out.contains("iframe"));
    }

    #[test]
    fn test_style_content_removed() {
        let out = sanitize_strict("<style>body{display:none}</style>Visible");
        assert_eq!(out, "Visible");
    }

    #[test]
    fn test_malformed_degrades_to_text() {
        let out = sanitize_strict("<b>unclosed <i>nest");
        assert!(out.contains("unclosed"));
        assert!(out.contains("nest"));
    }

    #[test]
    fn test_escape_text_basic() {
        assert_eq!(escape_text("Hello & World"), "Hello &amp; World");
        assert_eq!(escape_text("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_text(r#"Say "hi""#), "Say &quot;hi&quot;");
        assert_eq!(escape_text("it's"), "it&#39;s");
    }

    #[test]
    fn test_escape_text_keeps_references() {
        assert_eq!(escape_text("&amp; &#160; &#x2014;"), "&amp; &#160; &#x2014;");
        assert_eq!(escape_text("&nbsp;"), "&amp;nbsp;");
        assert_eq!(escape_text("AT&T;"), "AT&amp;T;");
    }

    #[test]
    fn test_escape_text_drops_illegal_characters() {
        assert_eq!(escape_text("A&#0;B"), "A&amp;#0;B");
        assert_eq!(escape_text("&#x1;&#xFFFE;&#9;"), "&amp;#x1;&amp;#xFFFE;&#9;");
        assert_eq!(escape_text("a\u{1}b\u{b}c\u{FFFF}\td"), "abc\td");
        assert_eq!(escape_text("&#99999999;"), "&amp;#99999999;");
    }

    #[test]
    fn test_strict_output_has_only_xml_characters() {
        let out = sanitize_strict("<b>a\u{1}b</b>&#0;\u{FFFE}c");
        assert!(out.chars().all(is_xml_char), "{out:?}");
        assert!(out.contains("<b>ab</b>"));
        assert!(!out.contains("&#0;"));
    }

    #[test]
    fn test_misnested_table_in_list_settles() {
        for input in ["<li><table><li>x", "<ul><li><table><td><li>y</td></table>", "<table><p><li>z"] {
            let once = sanitize_strict(input);
            assert_eq!(sanitize_strict(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn test_visible_text_strips_and_decodes() {
        assert_eq!(visible_text("<b>Fish</b> &amp; chips"), "Fish & chips");
        assert_eq!(visible_text("<script>x()</script>a&lt;b"), "a<b");
        assert_eq!(visible_text("plain"), "plain");
    }

    #[test]
    fn test_to_xhtml() {
        let html = sanitize_strict("one<br>two\u{a0}three");
        assert_eq!(to_xhtml(&html), "one<br/>two&#160;three");
    }

    fn markup() -> impl Strategy<Value = String> {
        let piece = prop_oneof![
            "[a-zA-Z0-9 ]{0,8}",
            Just("<script>alert(1)</script>".to_string()),
            Just("<b>".to_string()),
            Just("</b>".to_string()),
            Just("<p>".to_string()),
            Just("<img src=x onerror=y>".to_string()),
            Just("&amp;".to_string()),
            Just("&".to_string()),
            Just("<".to_string()),
            Just(">".to_string()),
            Just("\"'".to_string()),
            Just("<style>p{}</style>".to_string()),
            Just("<scr<script>ipt>".to_string()),
            Just("<li>".to_string()),
            Just("</li>".to_string()),
            Just("<ul>".to_string()),
            Just("<table>".to_string()),
            Just("<tr>".to_string()),
            Just("<td>".to_string()),
            Just("</td>".to_string()),
            Just("&#0;".to_string()),
            Just("\u{1}".to_string()),
        ];
        prop::collection::vec(piece, 0..12).prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn prop_sanitize_strict_is_idempotent(input in markup()) {
            let once = sanitize_strict(&input);
            prop_assert_eq!(sanitize_strict(&once), once.clone());
            prop_assert!(!once.contains("<script"));
            prop_assert!(once.chars().all(is_xml_char));
        }

        #[test]
        fn prop_escape_text_is_idempotent(input in "[a-z&<>\"';#0-9x\u{1}\u{b} ]{0,40}") {
            let once = escape_text(&input);
            prop_assert_eq!(escape_text(&once), once.clone());
            prop_assert!(!once.contains('<'));
            prop_assert!(!once.contains('>'));
        }
    }
}
