//! Export entry point.
//!
//! [`Compiler::export`] takes a document snapshot, an export kind and a
//! tier, and returns the finished artifact. Each call recompiles from the
//! snapshot; nothing is cached and no state is shared between calls, so a
//! single `Compiler` can serve concurrent requests from many threads.

use crate::client::{RenderClient, RenderMetadata, RenderRequest, RenderTarget};
use crate::config::ExportConfig;
use crate::epub::EpubAssembler;
use crate::error::Result;
use crate::geometry::TrimTable;
use crate::layout::{PrintLayout, PrintMarkup};
use crate::model::{Document, ExportKind, Tier};
use crate::preview::PreviewRenderer;
use crate::render::BlockRenderer;

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub kind: ExportKind,
    pub bytes: Vec<u8>,
    pub media_type: String,
    /// The rendering service fell back to reduced fidelity.
    pub degraded: bool,
}

impl ExportArtifact {
    /// Conventional file extension for the artifact.
    pub fn extension(&self) -> &'static str {
        match self.kind {
            ExportKind::Print => "pdf",
            ExportKind::Preview => "png",
            ExportKind::Epub => "epub",
        }
    }
}

pub struct Compiler {
    config: ExportConfig,
    renderer: BlockRenderer,
    trims: TrimTable,
    client: RenderClient,
}

impl Compiler {
    pub fn new(config: ExportConfig) -> Self {
        let renderer = BlockRenderer::new(config.script_table());
        let trims = config.trim_table();
        let client = RenderClient::new(config.service.clone());
        Self {
            config,
            renderer,
            trims,
            client,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn renderer(&self) -> &BlockRenderer {
        &self.renderer
    }

    fn layout(&self) -> PrintLayout<'_> {
        PrintLayout::new(&self.renderer, &self.config.print, &self.trims)
    }

    /// Print markup for every page.
    pub fn print_markup(&self, doc: &Document, tier: Tier) -> PrintMarkup {
        self.layout().compile(doc, tier)
    }

    /// Markup for the single preview page.
    pub fn preview_markup(&self, doc: &Document, tier: Tier) -> PrintMarkup {
        let layout = self.layout();
        PreviewRenderer::new(&layout, &self.config.preview).compile(doc, tier)
    }

    /// Markup sent to the rendering service, or `None` for e-books, which
    /// never go through it.
    pub fn markup(&self, doc: &Document, kind: ExportKind, tier: Tier) -> Option<PrintMarkup> {
        match kind {
            ExportKind::Print => Some(self.print_markup(doc, tier)),
            ExportKind::Preview => Some(self.preview_markup(doc, tier)),
            ExportKind::Epub => None,
        }
    }

    /// The EPUB archive bytes.
    pub fn epub(&self, doc: &Document, tier: Tier) -> Result<Vec<u8>> {
        EpubAssembler::new(&self.renderer, &self.config.epub).assemble(doc, tier)
    }

    /// Run one export.
    pub fn export(&self, doc: &Document, kind: ExportKind, tier: Tier) -> Result<ExportArtifact> {
        tracing::info!(%kind, %tier, pages = doc.pages().len(), "Starting export");

        let result = match kind {
            ExportKind::Epub => self.epub(doc, tier).map(|bytes| ExportArtifact {
                kind,
                bytes,
                media_type: "application/epub+zip".to_string(),
                degraded: false,
            }),
            ExportKind::Print => self.render_remote(doc, kind, RenderTarget::Pdf, &self.print_markup(doc, tier), tier),
            ExportKind::Preview => {
                self.render_remote(doc, kind, RenderTarget::Image, &self.preview_markup(doc, tier), tier)
            }
        };

        match &result {
            Ok(artifact) => tracing::info!(
                %kind,
                %tier,
                bytes = artifact.bytes.len(),
                degraded = artifact.degraded,
                "Export finished"
            ),
            Err(e) => tracing::error!(%kind, %tier, status = e.status_code(), error = %e, "Export failed"),
        }
        result
    }

    fn render_remote(
        &self,
        doc: &Document,
        kind: ExportKind,
        target: RenderTarget,
        markup: &PrintMarkup,
        tier: Tier,
    ) -> Result<ExportArtifact> {
        let metadata = RenderMetadata::from_document(doc);
        let request = RenderRequest {
            target,
            html: &markup.html,
            css: &markup.css,
            geometry: &markup.geometry,
            metadata: &metadata,
            tier,
        };
        let artifact = self.client.render(&request)?;
        let media_type = artifact.content_type.unwrap_or_else(|| match target {
            RenderTarget::Pdf => "application/pdf".to_string(),
            RenderTarget::Image => "image/png".to_string(),
        });
        Ok(ExportArtifact {
            kind,
            bytes: artifact.bytes,
            media_type,
            degraded: artifact.degraded,
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}
