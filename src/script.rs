//! Language code to writing script and reading direction.
//!
//! Direction belongs to a language pane, not to a block: a text block
//! routinely pairs an Arabic source with an English target. The lookup
//! table is built once and passed to the renderer, so tests can substitute
//! their own.

use std::collections::HashMap;
use std::str::FromStr;

/// Writing system of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Script {
    #[default]
    Latin,
    Cyrillic,
    Greek,
    Arabic,
    Hebrew,
    Syriac,
    Thaana,
    Devanagari,
    Bengali,
    Gurmukhi,
    Gujarati,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Sinhala,
    Thai,
    Lao,
    Khmer,
    Myanmar,
    Georgian,
    Armenian,
    Ethiopic,
    Han,
    Japanese,
    Korean,
}

impl Script {
    pub fn is_rtl(self) -> bool {
        matches!(
            self,
            Script::Arabic | Script::Hebrew | Script::Syriac | Script::Thaana
        )
    }

    /// Whether words are separated by spaces.
    ///
    /// Preview truncation cuts at whitespace, which only works for these.
    pub fn is_space_delimited(self) -> bool {
        !matches!(
            self,
            Script::Han
                | Script::Japanese
                | Script::Thai
                | Script::Lao
                | Script::Khmer
                | Script::Myanmar
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Script::Latin => "latin",
            Script::Cyrillic => "cyrillic",
            Script::Greek => "greek",
            Script::Arabic => "arabic",
            Script::Hebrew => "hebrew",
            Script::Syriac => "syriac",
            Script::Thaana => "thaana",
            Script::Devanagari => "devanagari",
            Script::Bengali => "bengali",
            Script::Gurmukhi => "gurmukhi",
            Script::Gujarati => "gujarati",
            Script::Tamil => "tamil",
            Script::Telugu => "telugu",
            Script::Kannada => "kannada",
            Script::Malayalam => "malayalam",
            Script::Sinhala => "sinhala",
            Script::Thai => "thai",
            Script::Lao => "lao",
            Script::Khmer => "khmer",
            Script::Myanmar => "myanmar",
            Script::Georgian => "georgian",
            Script::Armenian => "armenian",
            Script::Ethiopic => "ethiopic",
            Script::Han => "han",
            Script::Japanese => "japanese",
            Script::Korean => "korean",
        }
    }

    /// CSS/XHTML class for panes in this script.
    pub fn css_class(self) -> String {
        format!("script-{}", self.name())
    }

    pub const ALL: [Script; 26] = [
        Script::Latin,
        Script::Cyrillic,
        Script::Greek,
        Script::Arabic,
        Script::Hebrew,
        Script::Syriac,
        Script::Thaana,
        Script::Devanagari,
        Script::Bengali,
        Script::Gurmukhi,
        Script::Gujarati,
        Script::Tamil,
        Script::Telugu,
        Script::Kannada,
        Script::Malayalam,
        Script::Sinhala,
        Script::Thai,
        Script::Lao,
        Script::Khmer,
        Script::Myanmar,
        Script::Georgian,
        Script::Armenian,
        Script::Ethiopic,
        Script::Han,
        Script::Japanese,
        Script::Korean,
    ];
}

impl FromStr for Script {
    type Err = ();

    /// Accepts a script name (`arabic`) or an ISO 15924 code (`Arab`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let by_code = match lower.as_str() {
            "latn" => Some(Script::Latin),
            "cyrl" => Some(Script::Cyrillic),
            "grek" => Some(Script::Greek),
            "arab" => Some(Script::Arabic),
            "hebr" => Some(Script::Hebrew),
            "syrc" => Some(Script::Syriac),
            "thaa" => Some(Script::Thaana),
            "deva" => Some(Script::Devanagari),
            "beng" => Some(Script::Bengali),
            "guru" => Some(Script::Gurmukhi),
            "gujr" => Some(Script::Gujarati),
            "taml" => Some(Script::Tamil),
            "telu" => Some(Script::Telugu),
            "knda" => Some(Script::Kannada),
            "mlym" => Some(Script::Malayalam),
            "sinh" => Some(Script::Sinhala),
            "laoo" => Some(Script::Lao),
            "khmr" => Some(Script::Khmer),
            "mymr" => Some(Script::Myanmar),
            "geor" => Some(Script::Georgian),
            "armn" => Some(Script::Armenian),
            "ethi" => Some(Script::Ethiopic),
            "hani" | "hans" | "hant" => Some(Script::Han),
            "jpan" | "hira" | "kana" => Some(Script::Japanese),
            "kore" | "hang" => Some(Script::Korean),
            _ => None,
        };
        by_code
            .or_else(|| Script::ALL.into_iter().find(|s| s.name() == lower))
            .ok_or(())
    }
}

/// Resolved script and direction for one language pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptInfo {
    pub script: Script,
    pub is_rtl: bool,
}

impl ScriptInfo {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            is_rtl: script.is_rtl(),
        }
    }

    /// Value for a `dir` attribute.
    pub fn dir(&self) -> &'static str {
        if self.is_rtl { "rtl" } else { "ltr" }
    }
}

impl Default for ScriptInfo {
    fn default() -> Self {
        Self::new(Script::Latin)
    }
}

const BUILTIN: &[(&str, Script)] = &[
    ("ar", Script::Arabic),
    ("fa", Script::Arabic),
    ("ur", Script::Arabic),
    ("ps", Script::Arabic),
    ("sd", Script::Arabic),
    ("ug", Script::Arabic),
    ("ckb", Script::Arabic),
    ("he", Script::Hebrew),
    ("iw", Script::Hebrew),
    ("yi", Script::Hebrew),
    ("syr", Script::Syriac),
    ("dv", Script::Thaana),
    ("ru", Script::Cyrillic),
    ("uk", Script::Cyrillic),
    ("be", Script::Cyrillic),
    ("bg", Script::Cyrillic),
    ("sr", Script::Cyrillic),
    ("mk", Script::Cyrillic),
    ("kk", Script::Cyrillic),
    ("ky", Script::Cyrillic),
    ("mn", Script::Cyrillic),
    ("tg", Script::Cyrillic),
    ("el", Script::Greek),
    ("hi", Script::Devanagari),
    ("mr", Script::Devanagari),
    ("ne", Script::Devanagari),
    ("sa", Script::Devanagari),
    ("bn", Script::Bengali),
    ("as", Script::Bengali),
    ("pa", Script::Gurmukhi),
    ("gu", Script::Gujarati),
    ("ta", Script::Tamil),
    ("te", Script::Telugu),
    ("kn", Script::Kannada),
    ("ml", Script::Malayalam),
    ("si", Script::Sinhala),
    ("th", Script::Thai),
    ("lo", Script::Lao),
    ("km", Script::Khmer),
    ("my", Script::Myanmar),
    ("ka", Script::Georgian),
    ("hy", Script::Armenian),
    ("am", Script::Ethiopic),
    ("ti", Script::Ethiopic),
    ("zh", Script::Han),
    ("yue", Script::Han),
    ("ja", Script::Japanese),
    ("ko", Script::Korean),
];

/// Immutable language-to-script table.
///
/// Codes missing from the table resolve to Latin, left-to-right.
#[derive(Debug, Clone)]
pub struct ScriptTable {
    entries: HashMap<String, Script>,
}

impl ScriptTable {
    /// The built-in table of common languages.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(code, script)| ((*code).to_string(), *script))
                .collect(),
        }
    }

    /// A table with no entries; everything resolves to the default.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with_entry(mut self, code: &str, script: Script) -> Self {
        self.entries.insert(code.trim().to_ascii_lowercase(), script);
        self
    }

    /// Merge `code -> script name` overrides, skipping unknown script names.
    pub fn with_overrides<'a>(
        mut self,
        overrides: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Self {
        for (code, name) in overrides {
            match name.parse::<Script>() {
                Ok(script) => {
                    self.entries.insert(code.trim().to_ascii_lowercase(), script);
                }
                Err(()) => {
                    tracing::warn!(code = %code, script = %name, "Ignoring unknown script override");
                }
            }
        }
        self
    }

    /// Resolve a BCP 47-ish code (`ar`, `sr-Latn`, `zh_Hant_TW`).
    ///
    /// An explicit script subtag wins over the language entry.
    pub fn resolve(&self, code: &str) -> ScriptInfo {
        let normalized = code.trim().to_ascii_lowercase().replace('_', "-");
        let mut subtags = normalized.split('-');
        let primary = subtags.next().unwrap_or_default();

        let explicit = subtags
            .filter(|s| s.len() == 4 && s.chars().all(|c| c.is_ascii_alphabetic()))
            .find_map(|s| s.parse::<Script>().ok());

        let script = explicit
            .or_else(|| self.entries.get(primary).copied())
            .or_else(|| self.entries.get(normalized.as_str()).copied())
            .unwrap_or_default();

        ScriptInfo::new(script)
    }
}

impl Default for ScriptTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_common_languages() {
        let table = ScriptTable::builtin();
        assert_eq!(table.resolve("ar"), ScriptInfo { script: Script::Arabic, is_rtl: true });
        assert_eq!(table.resolve("he").dir(), "rtl");
        assert_eq!(table.resolve("fr").dir(), "ltr");
        assert_eq!(table.resolve("ja").script, Script::Japanese);
        assert_eq!(table.resolve("ru").script, Script::Cyrillic);
    }

    #[test]
    fn test_unknown_defaults_to_latin_ltr() {
        let table = ScriptTable::builtin();
        assert_eq!(table.resolve("xx"), ScriptInfo::default());
        assert_eq!(table.resolve(""), ScriptInfo::default());
        assert!(!table.resolve("qaa").is_rtl);
    }

    #[test]
    fn test_region_and_script_subtags() {
        let table = ScriptTable::builtin();
        assert_eq!(table.resolve("AR-eg").script, Script::Arabic);
        assert_eq!(table.resolve("sr-Latn").script, Script::Latin);
        assert_eq!(table.resolve("sr").script, Script::Cyrillic);
        assert_eq!(table.resolve("zh_Hant_TW").script, Script::Han);
        assert_eq!(table.resolve("az-Arab").dir(), "rtl");
    }

    #[test]
    fn test_substitute_table() {
        let table = ScriptTable::empty().with_entry("xx", Script::Hebrew);
        assert!(table.resolve("xx").is_rtl);
        assert!(!table.resolve("ar").is_rtl);
    }

    #[test]
    fn test_overrides() {
        let overrides = HashMap::from([
            ("tlh".to_string(), "Latn".to_string()),
            ("ks".to_string(), "arabic".to_string()),
            ("zz".to_string(), "klingon".to_string()),
        ]);
        let table = ScriptTable::builtin().with_overrides(&overrides);
        assert_eq!(table.resolve("ks").script, Script::Arabic);
        assert_eq!(table.resolve("tlh").script, Script::Latin);
        assert_eq!(table.resolve("zz").script, Script::Latin);
    }

    #[test]
    fn test_css_class_and_space_delimiting() {
        assert_eq!(Script::Arabic.css_class(), "script-arabic");
        assert!(Script::Latin.is_space_delimited());
        assert!(!Script::Japanese.is_space_delimited());
    }
}
