//! Media format detection.

/// Image formats accepted into an e-book package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    /// SVG image (vector)
    Svg,
    WebP,
}

impl MediaFormat {
    /// Get the MIME type string for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Png => "image/png",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Svg => "image/svg+xml",
            MediaFormat::WebP => "image/webp",
        }
    }

    /// File extension used inside the package.
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "jpg",
            MediaFormat::Png => "png",
            MediaFormat::Gif => "gif",
            MediaFormat::Svg => "svg",
            MediaFormat::WebP => "webp",
        }
    }
}

/// How far into a text payload to look for an `<svg` root.
const SVG_SNIFF_LEN: usize = 1024;

/// Identify an image by its leading bytes.
///
/// Extensions and declared MIME types are not trusted; a payload that does
/// not start like a known image is `None`.
pub fn sniff_image(data: &[u8]) -> Option<MediaFormat> {
    if data.len() < 4 {
        return None;
    }
    // JPEG: FF D8 FF
    if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
        return Some(MediaFormat::Jpeg);
    }
    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(MediaFormat::Png);
    }
    // GIF: GIF87a / GIF89a
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some(MediaFormat::Gif);
    }
    // WebP: RIFF....WEBP
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some(MediaFormat::WebP);
    }
    if looks_like_svg(data) {
        return Some(MediaFormat::Svg);
    }
    None
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(SVG_SNIFF_LEN)];
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let head = &head[start..];
    let head = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
    (head.starts_with(b"<?xml") || head.starts_with(b"<svg") || head.starts_with(b"<!DOCTYPE svg"))
        && memchr::memmem::find(head, b"<svg").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_magic_bytes() {
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), Some(MediaFormat::Jpeg));
        assert_eq!(
            sniff_image(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            Some(MediaFormat::Png)
        );
        assert_eq!(sniff_image(b"GIF89a\x01\x00"), Some(MediaFormat::Gif));
        assert_eq!(sniff_image(b"RIFF\x10\x00\x00\x00WEBPVP8 "), Some(MediaFormat::WebP));
    }

    #[test]
    fn test_sniff_svg() {
        assert_eq!(
            sniff_image(br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"/>"#),
            Some(MediaFormat::Svg)
        );
        assert_eq!(sniff_image(b"  <svg width=\"1\"></svg>"), Some(MediaFormat::Svg));
        assert_eq!(sniff_image(b"<?xml version=\"1.0\"?><html/>"), None);
    }

    #[test]
    fn test_sniff_rejects_non_images() {
        assert_eq!(sniff_image(b"<html><body>"), None);
        assert_eq!(sniff_image(b"%PDF-1.7"), None);
        assert_eq!(sniff_image(b"ab"), None);
        assert_eq!(sniff_image(b"RIFF\x10\x00\x00\x00WAVE"), None);
    }

    #[test]
    fn test_media_format_mime_type() {
        assert_eq!(MediaFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(MediaFormat::Svg.mime_type(), "image/svg+xml");
        assert_eq!(MediaFormat::WebP.extension(), "webp");
    }
}
