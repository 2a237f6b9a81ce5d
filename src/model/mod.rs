//! Document snapshot model.
//!
//! This module contains:
//! - The document, its settings and pages
//! - The closed [`Block`] union and one struct per block kind
//! - Export request enums ([`ExportKind`], [`Tier`])
//!
//! Everything deserializes from the editor's JSON snapshot. Fields are
//! lenient: a malformed optional value reads as absent instead of failing
//! the whole document.

mod block;
mod document;
mod lenient;

pub use block::{
    Alignment, BilingualText, Block, CalloutBlock, CalloutCategory, Difficulty, Formatting,
    ImageBlock, ImageBorder, LangPayload, QuizBlock, SeparatorBlock, StampBlock, TableBlock,
    TableCell, TextBlock, TextLayout, UnknownBlock, WrapMode,
};
pub use document::{Colors, Content, Document, Fonts, Page, Settings, Typography};

use std::fmt;
use std::str::FromStr;

/// Which artifact an export request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    Print,
    Preview,
    Epub,
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "print" | "pdf" => Ok(ExportKind::Print),
            "preview" | "png" => Ok(ExportKind::Preview),
            "epub" | "ebook" => Ok(ExportKind::Epub),
            other => Err(format!("unknown export kind: {other}")),
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportKind::Print => "print",
            ExportKind::Preview => "preview",
            ExportKind::Epub => "epub",
        })
    }
}

/// Subscription tier. Gates watermarking and output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tier {
    #[default]
    Free,
    Paid,
}

impl Tier {
    pub fn is_free(self) -> bool {
        self == Tier::Free
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "paid" | "pro" => Ok(Tier::Paid),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Free => "free",
            Tier::Paid => "paid",
        })
    }
}
