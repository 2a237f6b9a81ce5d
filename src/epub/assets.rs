//! Image asset resolution for the e-book package.
//!
//! An [`AssetResolver`] turns an image block's source reference into raw
//! bytes. Resolution failures are never fatal: the assembler logs them and
//! the image block renders empty.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use percent_encoding::percent_decode_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use ureq::Agent;

use crate::error::AssetError;
use crate::util::{MediaFormat, sniff_image};

/// Largest image accepted into a package.
pub const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

/// Fetches the bytes behind an image source reference.
pub trait AssetResolver: Send + Sync {
    /// Return the raw bytes, or [`AssetError::Unsupported`] when this
    /// resolver does not handle the source's scheme.
    fn fetch(&self, src: &str) -> Result<Vec<u8>, AssetError>;
}

/// A verified image payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub bytes: Vec<u8>,
    pub format: MediaFormat,
}

/// SVG elements removed together with everything inside them.
const SVG_DROPPED_ELEMENTS: [&str; 5] = ["script", "foreignObject", "iframe", "object", "embed"];

/// Fetch and verify an image by magic bytes. SVG payloads are rewritten
/// without scripting.
pub fn load_image(resolver: &dyn AssetResolver, src: &str) -> Result<ImageAsset, AssetError> {
    let bytes = resolver.fetch(src.trim())?;
    let format = sniff_image(&bytes).ok_or(AssetError::Undecodable)?;
    let bytes = if format == MediaFormat::Svg { sanitize_svg(&bytes)? } else { bytes };
    Ok(ImageAsset { bytes, format })
}

/// Re-serialize an SVG document without script-bearing elements, event
/// handler attributes, external links, or a DOCTYPE.
///
/// Anything quick-xml cannot parse is [`AssetError::Undecodable`].
pub fn sanitize_svg(bytes: &[u8]) -> Result<Vec<u8>, AssetError> {
    let text = std::str::from_utf8(bytes).map_err(|_| AssetError::Undecodable)?;
    let mut reader = Reader::from_str(text);
    let mut writer = Writer::new(Vec::with_capacity(bytes.len()));
    // Depth inside a dropped element
    let mut skipping = 0usize;

    loop {
        let event = reader.read_event().map_err(|_| AssetError::Undecodable)?;
        let kept = match event {
            Event::Eof => break,
            Event::Start(e) => {
                if skipping > 0 || is_dropped_svg_element(&e) {
                    skipping += 1;
                    continue;
                }
                Event::Start(clean_svg_element(&e)?)
            }
            Event::End(e) => {
                if skipping > 0 {
                    skipping -= 1;
                    continue;
                }
                Event::End(e)
            }
            Event::Empty(e) => {
                if skipping > 0 || is_dropped_svg_element(&e) {
                    continue;
                }
                Event::Empty(clean_svg_element(&e)?)
            }
            Event::DocType(_) | Event::PI(_) | Event::Comment(_) => continue,
            Event::GeneralRef(r) => {
                let predefined = matches!(&*r, b"amp" | b"lt" | b"gt" | b"quot" | b"apos");
                if skipping > 0 || !(predefined || r.is_char_ref()) {
                    continue;
                }
                Event::GeneralRef(r)
            }
            _ if skipping > 0 => continue,
            other => other,
        };
        writer.write_event(kept).map_err(|_| AssetError::Undecodable)?;
    }

    Ok(writer.into_inner())
}

fn is_dropped_svg_element(e: &BytesStart<'_>) -> bool {
    let name = e.local_name();
    SVG_DROPPED_ELEMENTS
        .iter()
        .any(|dropped| name.as_ref().eq_ignore_ascii_case(dropped.as_bytes()))
}

fn clean_svg_element(e: &BytesStart<'_>) -> Result<BytesStart<'static>, AssetError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut clean = BytesStart::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|_| AssetError::Undecodable)?;
        let key = attr.key.local_name();
        let key = key.as_ref();
        if key.len() > 2 && key[..2].eq_ignore_ascii_case(b"on") {
            continue;
        }
        if key.eq_ignore_ascii_case(b"href") {
            let value = attr.unescape_value().map_err(|_| AssetError::Undecodable)?;
            // Only same-document fragments
            if !value.trim_start().starts_with('#') {
                continue;
            }
        }
        clean.push_attribute(attr);
    }
    Ok(clean)
}

/// Decodes inline `data:` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlResolver;

impl AssetResolver for DataUrlResolver {
    fn fetch(&self, src: &str) -> Result<Vec<u8>, AssetError> {
        let Some(rest) = strip_prefix_ignore_case(src, "data:") else {
            return Err(AssetError::Unsupported(scheme_of(src)));
        };
        let (header, payload) = rest.split_once(',').ok_or(AssetError::MalformedDataUrl)?;

        if header.to_ascii_lowercase().ends_with(";base64") {
            let cleaned: String = percent_decode_str(payload)
                .decode_utf8_lossy()
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            STANDARD
                .decode(&cleaned)
                .or_else(|_| STANDARD_NO_PAD.decode(cleaned.trim_end_matches('=')))
                .map_err(|_| AssetError::MalformedDataUrl)
        } else {
            Ok(percent_decode_str(payload).collect())
        }
    }
}

/// Downloads `http(s)` images.
pub struct HttpAssetResolver {
    agent: Agent,
    max_bytes: u64,
}

impl HttpAssetResolver {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            max_bytes: MAX_IMAGE_BYTES,
        }
    }
}

impl AssetResolver for HttpAssetResolver {
    fn fetch(&self, src: &str) -> Result<Vec<u8>, AssetError> {
        let lower = src.get(..8).unwrap_or(src).to_ascii_lowercase();
        if !lower.starts_with("http://") && !lower.starts_with("https://") {
            return Err(AssetError::Unsupported(scheme_of(src)));
        }

        let fetch_error = |message: String| AssetError::Fetch {
            url: src.to_string(),
            message,
        };

        let response = self
            .agent
            .get(src)
            .header("Accept", "image/*")
            .call()
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(fetch_error(format!("HTTP {status}")));
        }

        response
            .into_body()
            .with_config()
            .limit(self.max_bytes)
            .read_to_vec()
            .map_err(|e| fetch_error(e.to_string()))
    }
}

/// Tries resolvers in order until one handles the source.
#[derive(Default)]
pub struct ChainResolver {
    resolvers: Vec<Box<dyn AssetResolver>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: impl AssetResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl AssetResolver for ChainResolver {
    fn fetch(&self, src: &str) -> Result<Vec<u8>, AssetError> {
        for resolver in &self.resolvers {
            match resolver.fetch(src) {
                Err(AssetError::Unsupported(_)) => continue,
                other => return other,
            }
        }
        Err(AssetError::Unsupported(scheme_of(src)))
    }
}

fn strip_prefix_ignore_case<'s>(s: &'s str, prefix: &str) -> Option<&'s str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Scheme of a URL for error messages, without the payload.
fn scheme_of(src: &str) -> String {
    match src.split_once(':') {
        Some((scheme, _)) if scheme.len() <= 16 && !scheme.contains('/') => format!("{scheme}:"),
        _ => "relative path".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

    #[test]
    fn test_data_url_base64() {
        let src = format!("data:image/png;base64,{PNG_1X1}");
        let asset = load_image(&DataUrlResolver, &src).unwrap();
        assert_eq!(asset.format, MediaFormat::Png);
        assert_eq!(&asset.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_data_url_percent_encoded_svg() {
        let src = "data:image/svg+xml,%3Csvg%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%2F%3E";
        let asset = load_image(&DataUrlResolver, src).unwrap();
        assert_eq!(asset.format, MediaFormat::Svg);
    }

    #[test]
    fn test_svg_scripting_removed() {
        let svg = concat!(
            r#"<?xml version="1.0"?><!DOCTYPE svg [<!ENTITY x "y">]>"#,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" onload="alert(1)">"#,
            r#"<script>alert(2)</script><foreignObject><div>html</div></foreignObject>"#,
            r#"<a xlink:href="javascript:alert(3)"><circle r="4" onclick="alert(4)"/></a>"#,
            r##"<use href="#dot"/><text>Tom &amp; &x; Jerry</text></svg>"##,
        );
        let clean = String::from_utf8(sanitize_svg(svg.as_bytes()).unwrap()).unwrap();
        for gone in ["alert", "script", "foreignObject", "html", "javascript", "DOCTYPE", "&x;"] {
            assert!(!clean.contains(gone), "{gone} survived in {clean}");
        }
        assert!(clean.contains(r#"<circle r="4"/>"#));
        assert!(clean.contains(r##"<use href="#dot"/>"##));
        assert!(clean.contains("Tom &amp;  Jerry"));
        assert_eq!(sniff_image(clean.as_bytes()), Some(MediaFormat::Svg));
    }

    #[test]
    fn test_svg_data_url_is_cleaned_on_load() {
        let src = "data:image/svg+xml,%3Csvg%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%3E%3Cscript%3Ex()%3C%2Fscript%3E%3C%2Fsvg%3E";
        let asset = load_image(&DataUrlResolver, src).unwrap();
        assert_eq!(asset.format, MediaFormat::Svg);
        assert!(!String::from_utf8_lossy(&asset.bytes).contains("script"));
    }

    #[test]
    fn test_broken_svg_is_undecodable() {
        assert!(matches!(sanitize_svg(b"<svg><g></svg>"), Err(AssetError::Undecodable)));
    }

    #[test]
    fn test_data_url_errors() {
        assert!(matches!(DataUrlResolver.fetch("data:image/png;base64"), Err(AssetError::MalformedDataUrl)));
        assert!(matches!(
            DataUrlResolver.fetch("data:image/png;base64,@@@"),
            Err(AssetError::MalformedDataUrl)
        ));
        assert!(matches!(
            load_image(&DataUrlResolver, "data:text/plain,hello"),
            Err(AssetError::Undecodable)
        ));
        assert!(matches!(DataUrlResolver.fetch("https://x/a.png"), Err(AssetError::Unsupported(_))));
    }

    #[test]
    fn test_chain_skips_unsupported() {
        let chain = ChainResolver::new().with(DataUrlResolver);
        assert!(matches!(chain.fetch("ftp://x/a.png"), Err(AssetError::Unsupported(s)) if s == "ftp:"));
        let src = format!("data:image/png;base64,{PNG_1X1}");
        assert!(chain.fetch(&src).is_ok());
    }

    #[test]
    fn test_http_resolver_rejects_other_schemes() {
        let http = HttpAssetResolver::new(Duration::from_secs(1));
        assert!(matches!(http.fetch("data:image/png;base64,AA=="), Err(AssetError::Unsupported(_))));
        assert!(matches!(http.fetch("images/a.png"), Err(AssetError::Unsupported(s)) if s == "relative path"));
    }
}
