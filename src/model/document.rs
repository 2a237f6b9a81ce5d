//! Document, settings and pages.

use serde::Deserialize;

use super::block::{Block, TextLayout};
use super::lenient;

/// Immutable snapshot of a bilingual document, as handed over by the editor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Document {
    #[serde(deserialize_with = "lenient::opt_text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub author: String,
    #[serde(alias = "sourceLang", deserialize_with = "lenient::text")]
    pub source_language: String,
    #[serde(alias = "targetLang", deserialize_with = "lenient::text")]
    pub target_language: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub settings: Settings,
    #[serde(deserialize_with = "lenient::or_default")]
    pub content: Content,
    /// ISO 8601 timestamp of the last edit.
    #[serde(deserialize_with = "lenient::opt_text")]
    pub updated_at: Option<String>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_languages(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_language = source.into();
        self.target_language = target.into();
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.content.pages.push(page);
        self
    }

    /// Parse a snapshot from the editor's JSON representation.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn pages(&self) -> &[Page] {
        &self.content.pages
    }

    /// Title with the documented fallback for blank titles.
    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() { "Untitled" } else { title }
    }

    /// Author with the documented fallback for blank authors.
    pub fn display_author(&self) -> &str {
        let author = self.author.trim();
        if author.is_empty() { "Unknown Author" } else { author }
    }

    /// Source language code, defaulting to English.
    pub fn source_lang(&self) -> &str {
        let code = self.source_language.trim();
        if code.is_empty() { "en" } else { code }
    }

    /// Target language code, defaulting to English.
    pub fn target_lang(&self) -> &str {
        let code = self.target_language.trim();
        if code.is_empty() { "en" } else { code }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Fonts {
    #[serde(deserialize_with = "lenient::text")]
    pub body: String,
    #[serde(deserialize_with = "lenient::text")]
    pub heading: String,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            body: "Georgia".to_string(),
            heading: "Georgia".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Colors {
    #[serde(deserialize_with = "lenient::text")]
    pub primary: String,
    #[serde(deserialize_with = "lenient::text")]
    pub secondary: String,
    #[serde(deserialize_with = "lenient::text")]
    pub accent: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            primary: "#1a1a1a".to_string(),
            secondary: "#555555".to_string(),
            accent: "#8b5cf6".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Typography {
    /// Body size in points.
    #[serde(deserialize_with = "lenient::number")]
    pub base_size: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub line_height: Option<f64>,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            base_size: Some(11.0),
            line_height: Some(1.5),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    #[serde(deserialize_with = "lenient::or_default")]
    pub fonts: Fonts,
    #[serde(deserialize_with = "lenient::or_default")]
    pub colors: Colors,
    #[serde(deserialize_with = "lenient::or_default")]
    pub typography: Typography,
    #[serde(alias = "layout", deserialize_with = "lenient::parsed")]
    pub default_layout: Option<TextLayout>,
    /// Overrides the configured trim size (`"6x9"`, `"a5"`, ...).
    #[serde(deserialize_with = "lenient::opt_text")]
    pub trim_size: Option<String>,
    #[serde(deserialize_with = "lenient::items")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub cover_image: Option<String>,
}

/// Page list plus editor-only cross-reference collections.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Content {
    #[serde(deserialize_with = "lenient::items")]
    pub pages: Vec<Page>,
    /// Word-group links. Not rendered.
    #[serde(deserialize_with = "lenient::items")]
    pub word_groups: Vec<serde_json::Value>,
    /// Annotations. Not rendered.
    #[serde(deserialize_with = "lenient::items")]
    pub annotations: Vec<serde_json::Value>,
    /// Arrows between words. Not rendered.
    #[serde(deserialize_with = "lenient::items")]
    pub arrows: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Page {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    /// 1-based page number.
    #[serde(alias = "pageNumber", deserialize_with = "lenient::count")]
    pub number: Option<u32>,
    #[serde(deserialize_with = "lenient::items")]
    pub blocks: Vec<Block>,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_chapter_start: bool,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub chapter_title: Option<String>,
    #[serde(alias = "headerText", deserialize_with = "lenient::opt_text")]
    pub header: Option<String>,
    #[serde(alias = "footerText", deserialize_with = "lenient::opt_text")]
    pub footer: Option<String>,
    #[serde(deserialize_with = "lenient::flag_default_true")]
    pub show_header: bool,
    #[serde(deserialize_with = "lenient::flag_default_true")]
    pub show_footer: bool,
    #[serde(deserialize_with = "lenient::flag_default_true")]
    pub show_page_number: bool,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub background_color: Option<String>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            id: String::new(),
            number: None,
            blocks: Vec::new(),
            is_chapter_start: false,
            chapter_title: None,
            header: None,
            footer: None,
            show_header: lenient::yes(),
            show_footer: lenient::yes(),
            show_page_number: lenient::yes(),
            background_color: None,
        }
    }
}

impl Page {
    pub fn new(number: u32) -> Self {
        Self {
            id: format!("page-{number}"),
            number: Some(number),
            ..Default::default()
        }
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn chapter_start(mut self, title: Option<&str>) -> Self {
        self.is_chapter_start = true;
        self.chapter_title = title.map(str::to_string);
        self
    }

    /// Page number, falling back to the 1-based position in the document.
    pub fn number_or(&self, index: usize) -> u32 {
        self.number.unwrap_or(index as u32 + 1)
    }

    /// Chapter title, when present and non-blank.
    pub fn chapter_title(&self) -> Option<&str> {
        self.chapter_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
