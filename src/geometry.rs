//! Trim sizes and page geometry.
//!
//! A [`TrimTable`] is built once from the built-in sizes plus any extras
//! from configuration and passed to the layout engine. [`PageGeometry`] is
//! what the rendering service receives as `width`/`height`/`bleed`.

use std::collections::HashMap;

/// CSS pixels per inch.
pub const CSS_DPI: f64 = 96.0;

/// Trim size used when a document names none, or an unknown one.
pub const DEFAULT_TRIM: &str = "6x9";

/// Finished page size in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl TrimSize {
    pub const fn new(width_in: f64, height_in: f64) -> Self {
        Self {
            width_in,
            height_in,
        }
    }

    fn is_plausible(&self) -> bool {
        (2.0..=20.0).contains(&self.width_in) && (2.0..=20.0).contains(&self.height_in)
    }
}

const BUILTIN: &[(&str, TrimSize)] = &[
    ("5x8", TrimSize::new(5.0, 8.0)),
    ("5.25x8", TrimSize::new(5.25, 8.0)),
    ("5.5x8.5", TrimSize::new(5.5, 8.5)),
    ("6x9", TrimSize::new(6.0, 9.0)),
    ("6.14x9.21", TrimSize::new(6.14, 9.21)),
    ("7x10", TrimSize::new(7.0, 10.0)),
    ("8x10", TrimSize::new(8.0, 10.0)),
    ("8.5x11", TrimSize::new(8.5, 11.0)),
    ("a5", TrimSize::new(5.83, 8.27)),
    ("a4", TrimSize::new(8.27, 11.69)),
];

/// Named trim sizes.
#[derive(Debug, Clone)]
pub struct TrimTable {
    sizes: HashMap<String, TrimSize>,
}

impl TrimTable {
    pub fn builtin() -> Self {
        Self {
            sizes: BUILTIN
                .iter()
                .map(|(name, size)| ((*name).to_string(), *size))
                .collect(),
        }
    }

    pub fn with_size(mut self, name: &str, size: TrimSize) -> Self {
        if size.is_plausible() {
            self.sizes.insert(normalize(name), size);
        } else {
            tracing::warn!(name = %name, "Ignoring implausible trim size");
        }
        self
    }

    /// Look up a trim size by name.
    ///
    /// Unlisted `WxH` names are parsed directly. Anything else falls back
    /// to [`DEFAULT_TRIM`].
    pub fn resolve(&self, name: Option<&str>) -> TrimSize {
        let fallback = TrimSize::new(6.0, 9.0);
        let Some(name) = name.map(normalize).filter(|n| !n.is_empty()) else {
            return self.sizes.get(DEFAULT_TRIM).copied().unwrap_or(fallback);
        };
        if let Some(size) = self.sizes.get(&name) {
            return *size;
        }
        if let Some(size) = parse_dimensions(&name) {
            return size;
        }
        tracing::warn!(trim_size = %name, "Unknown trim size, using {DEFAULT_TRIM}");
        self.sizes.get(DEFAULT_TRIM).copied().unwrap_or(fallback)
    }
}

impl Default for TrimTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize(name: &str) -> String {
    let compact = name
        .trim()
        .to_ascii_lowercase()
        .replace(['"', ' '], "")
        .replace('\u{d7}', "x");
    match compact.strip_suffix("in") {
        Some(stripped) => stripped.to_string(),
        None => compact,
    }
}

fn parse_dimensions(name: &str) -> Option<TrimSize> {
    let (w, h) = name.split_once('x')?;
    let size = TrimSize::new(w.parse().ok()?, h.parse().ok()?);
    size.is_plausible().then_some(size)
}

/// Everything the rendering service needs to size pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub trim: TrimSize,
    pub margin_in: f64,
    pub gutter_in: f64,
    pub bleed_in: Option<f64>,
}

impl PageGeometry {
    /// Full page width including bleed on both sides, in inches.
    pub fn page_width_in(&self) -> f64 {
        self.trim.width_in + 2.0 * self.bleed_in.unwrap_or(0.0)
    }

    pub fn page_height_in(&self) -> f64 {
        self.trim.height_in + 2.0 * self.bleed_in.unwrap_or(0.0)
    }

    pub fn width_px(&self) -> u32 {
        to_px(self.page_width_in())
    }

    pub fn height_px(&self) -> u32 {
        to_px(self.page_height_in())
    }

    pub fn bleed_px(&self) -> Option<u32> {
        self.bleed_in.filter(|b| *b > 0.0).map(to_px)
    }

    /// Margin on the binding side: outer margin plus gutter.
    pub fn inner_margin_in(&self) -> f64 {
        self.margin_in + self.gutter_in
    }
}

fn to_px(inches: f64) -> u32 {
    (inches * CSS_DPI).round().max(0.0) as u32
}
