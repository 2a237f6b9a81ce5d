//! Validation of numeric and style fields.
//!
//! Out-of-range or malformed values fall back to the documented default
//! instead of reaching the output.

pub(crate) const DEFAULT_WIDTH_PERCENT: f64 = 100.0;
pub(crate) const DEFAULT_THICKNESS: f64 = 1.0;
const MAX_THICKNESS: f64 = 20.0;

/// Width as a percentage of the text column, `1..=100`, default 100.
pub(crate) fn width_percent(value: Option<f64>) -> f64 {
    match value {
        Some(w) if w > 0.0 && w <= 100.0 => w,
        Some(w) => {
            tracing::debug!(width = w, "Width out of range, using default");
            DEFAULT_WIDTH_PERCENT
        }
        None => DEFAULT_WIDTH_PERCENT,
    }
}

/// Width rounded to a multiple of 5 for the `width-N` classes.
pub(crate) fn width_step(width: f64) -> u32 {
    (((width / 5.0).round() as u32) * 5).clamp(5, 100)
}

/// Line thickness in pixels, `(0, 20]`, default 1.
pub(crate) fn thickness(value: Option<f64>) -> f64 {
    match value {
        Some(t) if t > 0.0 && t <= MAX_THICKNESS => t,
        _ => DEFAULT_THICKNESS,
    }
}

/// Opacity in `0..=1`; values up to 100 are read as percentages.
pub(crate) fn opacity(value: Option<f64>) -> Option<f64> {
    match value {
        Some(o) if (0.0..=1.0).contains(&o) => Some(o),
        Some(o) if o > 1.0 && o <= 100.0 => Some(o / 100.0),
        _ => None,
    }
}

/// Font size in points, `6..=96`.
pub(crate) fn font_size(value: Option<f64>) -> Option<f64> {
    value.filter(|s| (6.0..=96.0).contains(s))
}

/// Format a float without trailing zeros (`50`, `1.5`).
pub(crate) fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

const NAMED_COLORS: [&str; 20] = [
    "black", "white", "gray", "grey", "silver", "red", "maroon", "orange", "yellow", "olive",
    "lime", "green", "teal", "aqua", "cyan", "blue", "navy", "purple", "fuchsia", "transparent",
];

/// Accept `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`/`rgba()`/`hsl()`/`hsla()`
/// with numeric arguments, or a basic named color.
pub(crate) fn color(value: Option<&str>) -> Option<String> {
    let raw = value?.trim().to_ascii_lowercase();
    if raw.is_empty() {
        return None;
    }

    let valid = if let Some(hex) = raw.strip_prefix('#') {
        matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
    } else if let Some(args) = ["rgb(", "rgba(", "hsl(", "hsla("]
        .iter()
        .find_map(|f| raw.strip_prefix(f))
    {
        args.strip_suffix(')').is_some_and(|inner| {
            !inner.is_empty()
                && inner
                    .chars()
                    .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | ' ' | '%' | '/' | '-'))
        })
    } else {
        NAMED_COLORS.contains(&raw.as_str())
    };

    if valid {
        Some(raw)
    } else {
        tracing::debug!(color = %raw, "Rejecting malformed color");
        None
    }
}

/// Color with a fallback.
pub(crate) fn color_or(value: Option<&str>, default: &str) -> String {
    color(value).unwrap_or_else(|| default.to_string())
}

/// A font family name limited to safe characters, quoted for CSS.
pub(crate) fn font_family(value: Option<&str>) -> Option<String> {
    let name = value?.trim();
    let safe = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'));
    safe.then(|| format!("'{name}'"))
}
