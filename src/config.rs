//! Export configuration.
//!
//! Loaded from a TOML file with serde. Every section and field has a
//! default, so an empty file (or no file) is a valid configuration:
//!
//! ```toml
//! [service]
//! pdf_url = "http://renderer.internal/pdf"
//! image_url = "http://renderer.internal/image"
//! fallback_url = "http://renderer-lite.internal/render"
//! timeout_secs = 60
//!
//! [print]
//! trim_size = "6x9"
//! bleed_in = 0.125
//!
//! [scripts]
//! ks = "arabic"
//!
//! [trim_sizes.pocket]
//! width_in = 4.25
//! height_in = 6.87
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::geometry::{DEFAULT_TRIM, TrimSize, TrimTable};
use crate::script::ScriptTable;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_FALLBACK_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_ARTIFACT_BYTES: u64 = 64 * 1024 * 1024;
pub const DEFAULT_MARGIN_IN: f64 = 0.75;
pub const DEFAULT_GUTTER_IN: f64 = 0.375;
pub const DEFAULT_CHAPTER_TOP_PADDING_IN: f64 = 1.5;
pub const DEFAULT_WATERMARK_TEXT: &str = "Made with Diglot";
pub const DEFAULT_WATERMARK_OPACITY: f64 = 0.08;
pub const DEFAULT_PREVIEW_MAX_BLOCKS: usize = 3;
pub const DEFAULT_PREVIEW_MAX_CHARS: usize = 200;
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 6;
pub const DEFAULT_REMOTE_IMAGE_TIMEOUT_SECS: u64 = 10;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub service: ServiceConfig,
    pub print: PrintConfig,
    pub preview: PreviewConfig,
    pub epub: EpubConfig,
    /// Extra language code to script name entries.
    pub scripts: HashMap<String, String>,
    /// Extra named trim sizes.
    pub trim_sizes: HashMap<String, TrimSizeConfig>,
}

/// Rendering microservice endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Endpoint producing the print PDF.
    pub pdf_url: Option<String>,
    /// Endpoint producing the preview raster.
    pub image_url: Option<String>,
    /// Reduced-fidelity endpoint tried once after a primary failure.
    pub fallback_url: Option<String>,
    pub timeout_secs: u64,
    pub fallback_timeout_secs: u64,
    /// Responses larger than this are rejected.
    pub max_artifact_bytes: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            pdf_url: None,
            image_url: None,
            fallback_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            fallback_timeout_secs: DEFAULT_FALLBACK_TIMEOUT_SECS,
            max_artifact_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_secs(self.fallback_timeout_secs.max(1))
    }
}

/// Print layout parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Used when the document names no trim size.
    pub trim_size: String,
    pub margin_in: f64,
    pub gutter_in: f64,
    pub bleed_in: Option<f64>,
    pub chapter_top_padding_in: f64,
    pub watermark_text: String,
    pub watermark_opacity: f64,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            trim_size: DEFAULT_TRIM.to_string(),
            margin_in: DEFAULT_MARGIN_IN,
            gutter_in: DEFAULT_GUTTER_IN,
            bleed_in: None,
            chapter_top_padding_in: DEFAULT_CHAPTER_TOP_PADDING_IN,
            watermark_text: DEFAULT_WATERMARK_TEXT.to_string(),
            watermark_opacity: DEFAULT_WATERMARK_OPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub max_blocks: usize,
    /// Visible-character budget per text payload.
    pub max_chars: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_blocks: DEFAULT_PREVIEW_MAX_BLOCKS,
            max_chars: DEFAULT_PREVIEW_MAX_CHARS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EpubConfig {
    /// Deflate level for everything except `mimetype`.
    pub compression_level: i64,
    /// Download `http(s)` images into the package.
    pub fetch_remote_images: bool,
    pub remote_image_timeout_secs: u64,
}

impl Default for EpubConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            fetch_remote_images: false,
            remote_image_timeout_secs: DEFAULT_REMOTE_IMAGE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TrimSizeConfig {
    pub width_in: f64,
    pub height_in: f64,
}

impl ExportConfig {
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded export configuration");
        Ok(config)
    }

    /// Built-in script table with the configured overrides applied.
    pub fn script_table(&self) -> ScriptTable {
        ScriptTable::builtin().with_overrides(&self.scripts)
    }

    /// Built-in trim sizes plus the configured extras.
    pub fn trim_table(&self) -> TrimTable {
        self.trim_sizes
            .iter()
            .fold(TrimTable::builtin(), |table, (name, size)| {
                table.with_size(name, TrimSize::new(size.width_in, size.height_in))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ExportConfig::from_toml_str("").unwrap();
        assert_eq!(config.service.timeout_secs, 60);
        assert_eq!(config.service.fallback_timeout_secs, 30);
        assert_eq!(config.print.trim_size, "6x9");
        assert_eq!(config.print.watermark_text, "Made with Diglot");
        assert_eq!(config.preview.max_blocks, 3);
        assert_eq!(config.preview.max_chars, 200);
        assert_eq!(config.epub.compression_level, 6);
        assert!(!config.epub.fetch_remote_images);
    }

    #[test]
    fn test_partial_sections() {
        let config = ExportConfig::from_toml_str(
            r#"
            [service]
            pdf_url = "http://localhost:9000/pdf"
            timeout_secs = 5

            [print]
            bleed_in = 0.125

            [scripts]
            ks = "arabic"

            [trim_sizes.pocket]
            width_in = 4.25
            height_in = 6.87
            "#,
        )
        .unwrap();
        assert_eq!(config.service.pdf_url.as_deref(), Some("http://localhost:9000/pdf"));
        assert_eq!(config.service.timeout(), Duration::from_secs(5));
        assert_eq!(config.service.fallback_timeout_secs, 30);
        assert_eq!(config.print.bleed_in, Some(0.125));
        assert_eq!(config.print.margin_in, 0.75);
        assert!(config.script_table().resolve("ks").is_rtl);
        assert_eq!(config.trim_table().resolve(Some("pocket")), TrimSize::new(4.25, 6.87));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ExportConfig::from_toml_str("[service\ntimeout_secs = ").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diglot.toml");
        std::fs::write(&path, "[preview]\nmax_chars = 80\n").unwrap();
        let config = ExportConfig::load(&path).unwrap();
        assert_eq!(config.preview.max_chars, 80);
        assert!(ExportConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
