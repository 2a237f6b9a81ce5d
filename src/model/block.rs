//! Content blocks.
//!
//! [`Block`] is a closed union: adding a kind means adding a variant here and
//! a render case in [`crate::render`], or the crate stops compiling. Tags the
//! compiler does not know (written by a newer editor) land in
//! [`Block::Unknown`] instead of failing the snapshot.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::lenient;

/// One atomic content unit on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(TextBlock),
    Image(ImageBlock),
    Separator(SeparatorBlock),
    Callout(CalloutBlock),
    Table(TableBlock),
    Quiz(QuizBlock),
    Stamp(StampBlock),
    Unknown(UnknownBlock),
}

impl Block {
    pub fn id(&self) -> &str {
        match self {
            Block::Text(b) => &b.id,
            Block::Image(b) => &b.id,
            Block::Separator(b) => &b.id,
            Block::Callout(b) => &b.id,
            Block::Table(b) => &b.id,
            Block::Quiz(b) => &b.id,
            Block::Stamp(b) => &b.id,
            Block::Unknown(b) => &b.id,
        }
    }

    /// The snapshot tag this block was read from.
    pub fn kind(&self) -> &str {
        match self {
            Block::Text(_) => "text",
            Block::Image(_) => "image",
            Block::Separator(_) => "separator",
            Block::Callout(_) => "callout",
            Block::Table(_) => "table",
            Block::Quiz(_) => "quiz",
            Block::Stamp(_) => "stamp",
            Block::Unknown(b) => &b.kind,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Block::Unknown(_))
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Block::from_value(&Value::deserialize(deserializer)?))
    }
}

impl Block {
    /// Dispatch on the `type` tag. Only an unrecognized tag makes a block
    /// [`Block::Unknown`]; malformed fields of a known kind read as defaults.
    fn from_value(value: &Value) -> Block {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .map(|t| t.trim().to_ascii_lowercase())
            .unwrap_or_default();

        let parsed = match tag.as_str() {
            "text" => TextBlock::deserialize(value).map(Block::Text),
            "image" => ImageBlock::deserialize(value).map(Block::Image),
            "separator" => SeparatorBlock::deserialize(value).map(Block::Separator),
            "callout" => CalloutBlock::deserialize(value).map(Block::Callout),
            "table" => TableBlock::deserialize(value).map(Block::Table),
            "quiz" => QuizBlock::deserialize(value).map(Block::Quiz),
            "stamp" => StampBlock::deserialize(value).map(Block::Stamp),
            _ => return Block::Unknown(UnknownBlock::deserialize(value).unwrap_or_default()),
        };

        parsed.unwrap_or_else(|e| {
            tracing::warn!(kind = %tag, error = %e, "Unreadable block payload");
            Block::Unknown(UnknownBlock::deserialize(value).unwrap_or_default())
        })
    }
}

/// A block whose tag this compiler does not recognize.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UnknownBlock {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: String,
}

// ============================================================================
// Text
// ============================================================================

/// Per-field formatting overrides set in the editor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Formatting {
    #[serde(deserialize_with = "lenient::number")]
    pub font_size: Option<f64>,
    #[serde(deserialize_with = "lenient::flag")]
    pub bold: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub italic: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub underline: bool,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub color: Option<String>,
    #[serde(deserialize_with = "lenient::parsed")]
    pub align: Option<Alignment>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub font_family: Option<String>,
}

/// One language half of a bilingual text block.
///
/// A missing translation is an empty `content`, never an absent payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LangPayload {
    #[serde(deserialize_with = "lenient::text")]
    pub content: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub formatting: Formatting,
}

impl LangPayload {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            formatting: Formatting::default(),
        }
    }

    /// A payload object, or a bare string taken as its content.
    fn lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(content) => LangPayload::new(content),
            other => LangPayload::deserialize(other).unwrap_or_default(),
        })
    }
}

/// How the two language panes of a text block are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextLayout {
    #[default]
    SideBySide,
    Interlinear,
    Stacked,
    Alternating,
}

impl TextLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            TextLayout::SideBySide => "side-by-side",
            TextLayout::Interlinear => "interlinear",
            TextLayout::Stacked => "stacked",
            TextLayout::Alternating => "alternating",
        }
    }
}

impl FromStr for TextLayout {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "side-by-side" | "sidebyside" | "columns" => Ok(TextLayout::SideBySide),
            "interlinear" => Ok(TextLayout::Interlinear),
            "stacked" => Ok(TextLayout::Stacked),
            "alternating" => Ok(TextLayout::Alternating),
            _ => Err(()),
        }
    }
}

/// A bilingual text pair.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(alias = "L1", deserialize_with = "LangPayload::lenient")]
    pub l1: LangPayload,
    #[serde(alias = "L2", deserialize_with = "LangPayload::lenient")]
    pub l2: LangPayload,
    /// `None` means the document's default layout.
    #[serde(deserialize_with = "lenient::parsed")]
    pub layout: Option<TextLayout>,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_title: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_chapter_heading: bool,
}

impl TextBlock {
    pub fn new(id: impl Into<String>, l1: impl Into<String>, l2: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            l1: LangPayload::new(l1),
            l2: LangPayload::new(l2),
            ..Default::default()
        }
    }

    pub fn with_layout(mut self, layout: TextLayout) -> Self {
        self.layout = Some(layout);
        self
    }
}

// ============================================================================
// Image
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

impl FromStr for Alignment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Ok(Alignment::Left),
            "center" | "centre" => Ok(Alignment::Center),
            "right" | "end" => Ok(Alignment::Right),
            "justify" => Ok(Alignment::Justify),
            _ => Err(()),
        }
    }
}

/// How body text flows around an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    None,
    Left,
    Right,
}

impl FromStr for WrapMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "inline" => Ok(WrapMode::None),
            "left" | "float-left" => Ok(WrapMode::Left),
            "right" | "float-right" => Ok(WrapMode::Right),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImageBorder {
    #[serde(deserialize_with = "lenient::number")]
    pub width: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub color: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub radius: Option<f64>,
}

/// Two language versions of a short string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BilingualText {
    #[serde(alias = "L1", deserialize_with = "lenient::text")]
    pub l1: String,
    #[serde(alias = "L2", deserialize_with = "lenient::text")]
    pub l2: String,
}

impl BilingualText {
    pub fn new(l1: impl Into<String>, l2: impl Into<String>) -> Self {
        Self {
            l1: l1.into(),
            l2: l2.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.l1.trim().is_empty() && self.l2.trim().is_empty()
    }

    /// A pair object, or a bare string taken as the source-language half.
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(l1) => Some(BilingualText::new(l1, "")),
            other => BilingualText::deserialize(other).ok(),
        }
    }

    fn lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    fn lenient_opt<'de, D>(deserializer: D) -> Result<Option<Self>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::from_value(Value::deserialize(deserializer)?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageBlock {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(alias = "url", deserialize_with = "lenient::text")]
    pub src: String,
    #[serde(deserialize_with = "lenient::text")]
    pub alt: String,
    /// Percentage of the text column.
    #[serde(deserialize_with = "lenient::number")]
    pub width: Option<f64>,
    #[serde(deserialize_with = "lenient::parsed")]
    pub alignment: Option<Alignment>,
    #[serde(deserialize_with = "lenient::parsed")]
    pub wrap: Option<WrapMode>,
    #[serde(deserialize_with = "lenient::optional")]
    pub border: Option<ImageBorder>,
    #[serde(deserialize_with = "lenient::flag")]
    pub shadow: bool,
    #[serde(deserialize_with = "lenient::number")]
    pub opacity: Option<f64>,
    #[serde(deserialize_with = "BilingualText::lenient_opt")]
    pub caption: Option<BilingualText>,
}

impl ImageBlock {
    pub fn new(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Separator
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeparatorBlock {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    /// A line style (`solid`, `dashed`, ...), a named ornament, or `custom`.
    #[serde(deserialize_with = "lenient::text")]
    pub style: String,
    /// Glyph used when `style` is `custom`.
    #[serde(deserialize_with = "lenient::opt_text")]
    pub custom_glyph: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub width: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub thickness: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub color: Option<String>,
}

// ============================================================================
// Callout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalloutCategory {
    #[default]
    Note,
    Tip,
    Warning,
    Grammar,
    Vocabulary,
    Culture,
    Pronunciation,
    FalseFriend,
    Custom,
}

impl CalloutCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            CalloutCategory::Note => "note",
            CalloutCategory::Tip => "tip",
            CalloutCategory::Warning => "warning",
            CalloutCategory::Grammar => "grammar",
            CalloutCategory::Vocabulary => "vocabulary",
            CalloutCategory::Culture => "culture",
            CalloutCategory::Pronunciation => "pronunciation",
            CalloutCategory::FalseFriend => "false-friend",
            CalloutCategory::Custom => "custom",
        }
    }

    /// Heading used when the callout has no title of its own.
    pub fn default_title(self) -> &'static str {
        match self {
            CalloutCategory::Note => "Note",
            CalloutCategory::Tip => "Tip",
            CalloutCategory::Warning => "Warning",
            CalloutCategory::Grammar => "Grammar",
            CalloutCategory::Vocabulary => "Vocabulary",
            CalloutCategory::Culture => "Culture",
            CalloutCategory::Pronunciation => "Pronunciation",
            CalloutCategory::FalseFriend => "False friend",
            CalloutCategory::Custom => "",
        }
    }

    /// Header and background colors for the category.
    pub fn palette(self) -> (&'static str, &'static str) {
        match self {
            CalloutCategory::Note => ("#3b82f6", "#eff6ff"),
            CalloutCategory::Tip => ("#10b981", "#ecfdf5"),
            CalloutCategory::Warning => ("#f59e0b", "#fffbeb"),
            CalloutCategory::Grammar => ("#8b5cf6", "#f5f3ff"),
            CalloutCategory::Vocabulary => ("#ec4899", "#fdf2f8"),
            CalloutCategory::Culture => ("#f97316", "#fff7ed"),
            CalloutCategory::Pronunciation => ("#06b6d4", "#ecfeff"),
            CalloutCategory::FalseFriend => ("#ef4444", "#fef2f2"),
            CalloutCategory::Custom => ("#6b7280", "#f9fafb"),
        }
    }

    pub const ALL: [CalloutCategory; 9] = [
        CalloutCategory::Note,
        CalloutCategory::Tip,
        CalloutCategory::Warning,
        CalloutCategory::Grammar,
        CalloutCategory::Vocabulary,
        CalloutCategory::Culture,
        CalloutCategory::Pronunciation,
        CalloutCategory::FalseFriend,
        CalloutCategory::Custom,
    ];
}

impl FromStr for CalloutCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized || (normalized == "falsefriend" && *c == CalloutCategory::FalseFriend))
            .ok_or(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalloutBlock {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(alias = "calloutType", deserialize_with = "lenient::parsed")]
    pub category: Option<CalloutCategory>,
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(alias = "content", deserialize_with = "BilingualText::lenient")]
    pub body: BilingualText,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub header_color: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub background_color: Option<String>,
}

impl CalloutBlock {
    pub fn category(&self) -> CalloutCategory {
        self.category.unwrap_or_default()
    }
}

// ============================================================================
// Table
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableCell {
    #[serde(deserialize_with = "lenient::text")]
    pub content: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_header: bool,
    #[serde(deserialize_with = "lenient::count")]
    pub colspan: Option<u32>,
    #[serde(deserialize_with = "lenient::count")]
    pub rowspan: Option<u32>,
    #[serde(deserialize_with = "lenient::parsed")]
    pub align: Option<Alignment>,
}

impl TableCell {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn header(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_header: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TableBlock {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(alias = "cells", deserialize_with = "table_rows")]
    pub rows: Vec<Vec<TableCell>>,
}

/// Rows that are not arrays are dropped; a bare string cell is its content.
fn table_rows<'de, D>(deserializer: D) -> Result<Vec<Vec<TableCell>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows: Vec<Value> = lenient::items(deserializer)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| match row {
            Value::Array(cells) => Some(
                cells
                    .into_iter()
                    .map(|cell| match cell {
                        Value::String(content) => TableCell::new(content),
                        other => TableCell::deserialize(other).unwrap_or_default(),
                    })
                    .collect(),
            ),
            _ => None,
        })
        .collect())
}

// ============================================================================
// Quiz
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "beginner" => Ok(Difficulty::Easy),
            "medium" | "intermediate" => Ok(Difficulty::Medium),
            "hard" | "advanced" => Ok(Difficulty::Hard),
            _ => Err(()),
        }
    }
}

/// A cloze exercise: `pre_text ____ post_text`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuizBlock {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(alias = "before", deserialize_with = "lenient::text")]
    pub pre_text: String,
    #[serde(deserialize_with = "lenient::text")]
    pub answer: String,
    #[serde(alias = "after", deserialize_with = "lenient::text")]
    pub post_text: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub hint: Option<String>,
    #[serde(deserialize_with = "lenient::parsed")]
    pub difficulty: Option<Difficulty>,
}

// ============================================================================
// Stamp
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StampBlock {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub icon: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub color: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub background_color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(json: &str) -> Block {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_block_from_json() {
        let b = block(
            r#"{"type":"text","id":"b1","L1":{"content":"Bonjour"},"L2":{"content":"Hello"},"layout":"interlinear","isTitle":true}"#,
        );
        let Block::Text(text) = b else {
            panic!("expected text block");
        };
        assert_eq!(text.l1.content, "Bonjour");
        assert_eq!(text.l2.content, "Hello");
        assert_eq!(text.layout, Some(TextLayout::Interlinear));
        assert!(text.is_title);
        assert!(!text.is_chapter_heading);
    }

    #[test]
    fn test_missing_translation_is_empty_not_absent() {
        let Block::Text(text) = block(r#"{"type":"text","id":"b1","l1":{"content":"Hola"}}"#) else {
            panic!("expected text block");
        };
        assert_eq!(text.l2.content, "");
    }

    #[test]
    fn test_unknown_tag_is_preserved() {
        let b = block(r#"{"type":"audio","id":"a1","src":"x.mp3"}"#);
        assert!(b.is_unknown());
        assert_eq!(b.kind(), "audio");
        assert_eq!(b.id(), "a1");
    }

    #[test]
    fn test_malformed_fields_fall_back() {
        let Block::Image(img) =
            block(r#"{"type":"image","id":"i1","src":"a.png","width":"huge","alignment":"diagonal"}"#)
        else {
            panic!("expected image block");
        };
        assert_eq!(img.width, None);
        assert_eq!(img.alignment, None);
    }

    #[test]
    fn test_callout_category_parsing() {
        assert_eq!("false_friend".parse(), Ok(CalloutCategory::FalseFriend));
        assert_eq!("falseFriend".parse(), Ok(CalloutCategory::FalseFriend));
        assert_eq!("Grammar".parse(), Ok(CalloutCategory::Grammar));
        assert!("recipe".parse::<CalloutCategory>().is_err());

        let Block::Callout(c) = block(r#"{"type":"callout","id":"c1","category":"recipe"}"#) else {
            panic!("expected callout block");
        };
        assert_eq!(c.category(), CalloutCategory::Note);
    }

    #[test]
    fn test_table_cells() {
        let Block::Table(t) = block(
            r#"{"type":"table","id":"t1","rows":[[{"content":"A","isHeader":true,"colspan":2}],[{"content":"x"},{"content":"y","align":"right"}]]}"#,
        ) else {
            panic!("expected table block");
        };
        assert_eq!(t.rows.len(), 2);
        assert!(t.rows[0][0].is_header);
        assert_eq!(t.rows[0][0].colspan, Some(2));
        assert_eq!(t.rows[1][1].align, Some(Alignment::Right));
    }

    #[test]
    fn test_malformed_style_fields_keep_known_kind() {
        let Block::Separator(sep) = block(r#"{"type":"separator","id":"s1","style":"dashed","color":123,"customGlyph":[1]}"#)
        else {
            panic!("expected separator block");
        };
        assert_eq!(sep.style, "dashed");
        assert_eq!(sep.color.as_deref(), Some("123"));
        assert_eq!(sep.custom_glyph, None);

        let Block::Callout(c) =
            block(r#"{"type":"callout","id":"c1","headerColor":5,"backgroundColor":{"r":1},"content":{"L1":"Digne"}}"#)
        else {
            panic!("expected callout block");
        };
        assert_eq!(c.background_color, None);
        assert_eq!(c.body.l1, "Digne");

        let Block::Image(img) =
            block(r#"{"type":"image","id":"i1","src":"a.png","caption":"just text","border":"thick"}"#)
        else {
            panic!("expected image block");
        };
        assert_eq!(img.caption, Some(BilingualText::new("just text", "")));
        assert_eq!(img.border, None);
    }

    #[test]
    fn test_lenient_payloads_and_cells() {
        let Block::Text(text) = block(r#"{"type":"Text","id":"b1","L1":"Bonjour","L2":{"content":"Hello","formatting":7}}"#)
        else {
            panic!("expected text block");
        };
        assert_eq!(text.l1.content, "Bonjour");
        assert_eq!(text.l2.content, "Hello");
        assert_eq!(text.l2.formatting, Formatting::default());

        let Block::Table(t) = block(r#"{"type":"table","id":"t1","rows":[["a",{"content":"b"},3],"junk"]}"#) else {
            panic!("expected table block");
        };
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0][0].content, "a");
        assert_eq!(t.rows[0][1].content, "b");
        assert_eq!(t.rows[0][2], TableCell::default());
    }

    #[test]
    fn test_untyped_block_is_unknown() {
        assert!(block(r#"{"id":"x"}"#).is_unknown());
        let b = block(r#""just a string""#);
        assert!(b.is_unknown());
        assert_eq!(b.id(), "");
    }
}
