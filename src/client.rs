//! Rendering microservice client.
//!
//! The compiler never produces PDFs or rasters itself. Print and preview
//! markup is posted as JSON to an external service together with the page
//! geometry and document metadata; the response body is the artifact.
//!
//! A failed or timed-out primary request is retried exactly once against
//! the fallback endpoint, at reduced fidelity (lower resolution, first page
//! only, no metadata). When both attempts fail the export fails: with
//! [`RenderError::Timeout`] only if both attempts timed out, otherwise with
//! the service error.

use std::io;
use std::time::Duration;

use serde::Serialize;
use ureq::Agent;

use crate::config::ServiceConfig;
use crate::error::RenderError;
use crate::geometry::PageGeometry;
use crate::model::{Document, Tier};

/// How much of an error response body is kept for logs.
const ERROR_BODY_LIMIT: usize = 512;

/// What the service should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// Multi-page print PDF.
    Pdf,
    /// Single-page raster preview.
    Image,
}

impl RenderTarget {
    fn accept(self) -> &'static str {
        match self {
            RenderTarget::Pdf => "application/pdf",
            RenderTarget::Image => "image/png",
        }
    }

    /// Output resolution in DPI.
    pub fn resolution(self, tier: Tier) -> u32 {
        match (self, tier) {
            (RenderTarget::Pdf, Tier::Paid) => 300,
            (RenderTarget::Pdf, Tier::Free) => 150,
            (RenderTarget::Image, Tier::Paid) => 144,
            (RenderTarget::Image, Tier::Free) => 96,
        }
    }

    fn color_mode(self) -> ColorMode {
        match self {
            RenderTarget::Pdf => ColorMode::Cmyk,
            RenderTarget::Image => ColorMode::Rgb,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Rgb,
    Cmyk,
}

/// Document metadata embedded in the artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: Vec<String>,
}

impl RenderMetadata {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            title: doc.display_title().to_string(),
            author: doc.display_author().to_string(),
            subject: doc
                .settings
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} / {}", doc.source_lang(), doc.target_lang())),
            keywords: doc
                .settings
                .keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub resolution: u32,
    pub watermark: bool,
    pub color_mode: ColorMode,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub single_page: bool,
}

/// Wire body of a render request.
#[derive(Debug, Clone, Serialize)]
pub struct RenderPayload<'a> {
    pub html: &'a str,
    pub css: &'a str,
    /// Page width in CSS pixels, bleed included.
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bleed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a RenderMetadata>,
    pub options: RenderOptions,
}

/// Everything needed for one render call.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub target: RenderTarget,
    pub html: &'a str,
    pub css: &'a str,
    pub geometry: &'a PageGeometry,
    pub metadata: &'a RenderMetadata,
    pub tier: Tier,
}

impl<'a> RenderRequest<'a> {
    /// Full-fidelity payload for the primary endpoint.
    pub fn payload(&self) -> RenderPayload<'a> {
        RenderPayload {
            html: self.html,
            css: self.css,
            width: self.geometry.width_px(),
            height: self.geometry.height_px(),
            bleed: self.geometry.bleed_px(),
            metadata: Some(self.metadata),
            options: RenderOptions {
                resolution: self.target.resolution(self.tier),
                watermark: self.tier.is_free(),
                color_mode: self.target.color_mode(),
                single_page: self.target == RenderTarget::Image,
            },
        }
    }

    /// Reduced payload for the fallback endpoint: half resolution (never
    /// below 72 DPI), first page only, no bleed, no metadata.
    pub fn fallback_payload(&self) -> RenderPayload<'a> {
        let full = self.payload();
        RenderPayload {
            bleed: None,
            metadata: None,
            options: RenderOptions {
                resolution: (full.options.resolution / 2).max(72),
                single_page: true,
                ..full.options
            },
            ..full
        }
    }
}

/// A rendered artifact.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// Produced by the fallback endpoint.
    pub degraded: bool,
}

/// Client for the rendering microservice.
pub struct RenderClient {
    config: ServiceConfig,
    primary: Agent,
    fallback: Agent,
}

impl RenderClient {
    pub fn new(config: ServiceConfig) -> Self {
        let primary = create_agent(config.timeout());
        let fallback = create_agent(config.fallback_timeout());
        Self {
            config,
            primary,
            fallback,
        }
    }

    fn endpoint(&self, target: RenderTarget) -> Result<&str, RenderError> {
        let (url, name) = match target {
            RenderTarget::Pdf => (self.config.pdf_url.as_deref(), "pdf_url"),
            RenderTarget::Image => (self.config.image_url.as_deref(), "image_url"),
        };
        url.map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(RenderError::NotConfigured(name))
    }

    /// Render, falling back once on failure.
    pub fn render(&self, request: &RenderRequest<'_>) -> Result<RenderedArtifact, RenderError> {
        let url = self.endpoint(request.target)?;

        let primary_err = match self.post(&self.primary, url, request.target, &request.payload()) {
            Ok(artifact) => return Ok(artifact),
            Err(e) => e,
        };

        let Some(fallback_url) = self.config.fallback_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            tracing::warn!(error = %primary_err, "Rendering service failed, no fallback configured");
            return Err(primary_err);
        };

        tracing::warn!(
            error = %primary_err,
            fallback = %fallback_url,
            "Rendering service failed, retrying at reduced fidelity"
        );

        match self.post(&self.fallback, fallback_url, request.target, &request.fallback_payload()) {
            Ok(mut artifact) => {
                artifact.degraded = true;
                Ok(artifact)
            }
            Err(fallback_err) => {
                tracing::warn!(error = %fallback_err, "Fallback rendering failed");
                Err(combine_failures(primary_err, fallback_err))
            }
        }
    }

    fn post(
        &self,
        agent: &Agent,
        url: &str,
        target: RenderTarget,
        payload: &RenderPayload<'_>,
    ) -> Result<RenderedArtifact, RenderError> {
        let response = agent
            .post(url)
            .header("Accept", target.accept())
            .send_json(payload)
            .map_err(|e| classify(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let mut body = response.into_body();

        if !(200..300).contains(&status) {
            let text = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(RenderError::Status {
                endpoint: url.to_string(),
                status,
                body: truncate_body(text),
            });
        }

        let bytes = body
            .with_config()
            .limit(self.config.max_artifact_bytes)
            .read_to_vec()
            .map_err(|e| classify(url, e))?;

        if bytes.is_empty() {
            return Err(RenderError::Transport {
                endpoint: url.to_string(),
                message: "empty response body".to_string(),
            });
        }

        Ok(RenderedArtifact {
            bytes,
            content_type,
            degraded: false,
        })
    }
}

pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

fn classify(endpoint: &str, err: ureq::Error) -> RenderError {
    let timed_out = match &err {
        ureq::Error::Timeout(_) => true,
        ureq::Error::Io(e) => matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock),
        _ => false,
    };
    if timed_out {
        RenderError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else {
        RenderError::Transport {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }
}

/// Report a timeout only when both attempts timed out.
fn combine_failures(primary: RenderError, fallback: RenderError) -> RenderError {
    match (&primary, &fallback) {
        (RenderError::Timeout { .. }, RenderError::Timeout { .. }) => fallback,
        (_, RenderError::Timeout { .. }) => primary,
        _ => fallback,
    }
}

fn truncate_body(mut body: String) -> String {
    if let Some((i, _)) = body.char_indices().nth(ERROR_BODY_LIMIT) {
        body.truncate(i);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TrimSize;

    fn geometry() -> PageGeometry {
        PageGeometry {
            trim: TrimSize::new(6.0, 9.0),
            margin_in: 0.75,
            gutter_in: 0.375,
            bleed_in: Some(0.125),
        }
    }

    fn metadata() -> RenderMetadata {
        RenderMetadata::from_document(&Document::new("Livre").with_author("A").with_languages("fr", "en"))
    }

    #[test]
    fn test_payload_wire_shape() {
        let geometry = geometry();
        let metadata = metadata();
        let request = RenderRequest {
            target: RenderTarget::Pdf,
            html: "<section></section>",
            css: "body{}",
            geometry: &geometry,
            metadata: &metadata,
            tier: Tier::Free,
        };
        let json = serde_json::to_value(request.payload()).unwrap();
        assert_eq!(json["width"], 600);
        assert_eq!(json["height"], 888);
        assert_eq!(json["bleed"], 12);
        assert_eq!(json["metadata"]["title"], "Livre");
        assert_eq!(json["metadata"]["subject"], "fr / en");
        assert_eq!(json["options"]["resolution"], 150);
        assert_eq!(json["options"]["watermark"], true);
        assert_eq!(json["options"]["colorMode"], "cmyk");
        assert!(json["options"].get("singlePage").is_none());
    }

    #[test]
    fn test_fallback_payload_reduced() {
        let geometry = geometry();
        let metadata = metadata();
        let request = RenderRequest {
            target: RenderTarget::Pdf,
            html: "x",
            css: "",
            geometry: &geometry,
            metadata: &metadata,
            tier: Tier::Paid,
        };
        let json = serde_json::to_value(request.fallback_payload()).unwrap();
        assert_eq!(json["options"]["resolution"], 150);
        assert_eq!(json["options"]["singlePage"], true);
        assert_eq!(json["options"]["watermark"], false);
        assert!(json.get("metadata").is_none());
        assert!(json.get("bleed").is_none());
    }

    #[test]
    fn test_not_configured() {
        let client = RenderClient::new(ServiceConfig::default());
        let geometry = geometry();
        let metadata = metadata();
        let request = RenderRequest {
            target: RenderTarget::Image,
            html: "x",
            css: "",
            geometry: &geometry,
            metadata: &metadata,
            tier: Tier::Free,
        };
        assert!(matches!(client.render(&request), Err(RenderError::NotConfigured("image_url"))));
    }

    #[test]
    fn test_combine_failures() {
        let timeout = || RenderError::Timeout { endpoint: "a".to_string() };
        let status = || RenderError::Status {
            endpoint: "b".to_string(),
            status: 503,
            body: String::new(),
        };
        assert!(matches!(combine_failures(timeout(), timeout()), RenderError::Timeout { .. }));
        assert!(matches!(combine_failures(status(), timeout()), RenderError::Status { .. }));
        assert!(matches!(combine_failures(timeout(), status()), RenderError::Status { .. }));
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short".to_string()), "short");
        assert_eq!(truncate_body("é".repeat(600)).chars().count(), ERROR_BODY_LIMIT);
    }
}
