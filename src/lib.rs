//! # diglot
//!
//! Export compiler for bilingual book manuscripts.
//!
//! A document is a sequence of pages, each holding typed content blocks
//! (bilingual text pairs, images, separators, callouts, tables, quizzes and
//! stamps). diglot compiles a document snapshot into:
//!
//! - print markup and a stylesheet, rendered to PDF by an external service
//! - a truncated single-page preview, rendered to a raster by the same service
//! - a self-contained EPUB package
//!
//! ## Quick Start
//!
//! ```
//! use diglot::{Compiler, ExportKind, Tier};
//! use diglot::model::{Block, Document, Page, TextBlock};
//!
//! let doc = Document::new("Le Petit Prince")
//!     .with_author("Antoine de Saint-Exupéry")
//!     .with_languages("fr", "en")
//!     .with_page(Page::new(1).with_block(Block::Text(TextBlock::new(
//!         "b1",
//!         "Bonjour",
//!         "Hello",
//!     ))));
//!
//! let compiler = Compiler::default();
//!
//! // E-books are assembled locally
//! let epub = compiler.export(&doc, ExportKind::Epub, Tier::Paid)?;
//! assert_eq!(epub.media_type, "application/epub+zip");
//!
//! // Print markup is what the rendering service receives
//! let markup = compiler.print_markup(&doc, Tier::Free);
//! assert!(markup.html.contains("Bonjour"));
//! # Ok::<(), diglot::Error>(())
//! ```
//!
//! ## Safety of author input
//!
//! Every author string passes through [`sanitize`] before it reaches any
//! output. Unknown block types, malformed colors and out-of-range numbers
//! fall back to defaults instead of failing the export.

pub mod client;
pub mod compiler;
pub mod config;
pub mod epub;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod preview;
pub mod render;
pub mod sanitize;
pub mod script;
pub(crate) mod util;

pub use compiler::{Compiler, ExportArtifact};
pub use config::ExportConfig;
pub use error::{AssetError, Error, RenderError, Result};
pub use model::{Document, ExportKind, Tier};
pub use util::MediaFormat;
