//! Resolved-color parsing and the luminance proxy
//!
//! Computed styles come back from the browser as `rgb(r, g, b)` or
//! `rgba(r, g, b, a)` strings; newer engines may serialize the
//! space-separated `rgb(r g b / a)` form. Every decision downstream only
//! needs the three channels and one brightness scalar.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Channel triple plus optional alpha of an `rgb()`/`rgba()` function
static RGB_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)rgba?\(\s*(\d+)\s*[,\s]\s*(\d+)\s*[,\s]\s*(\d+)\s*(?:[,/]\s*([\d.]+%?)\s*)?\)")
        .expect("rgb pattern compiles")
});

/// An 8-bit sRGB color with no alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Weighted brightness `0.299r + 0.587g + 0.114b`, range 0..=255
    pub fn luminance(self) -> f32 {
        0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32
    }

    /// Parse `#rrggbb` (leading `#` optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A color function match: channels and alpha (1.0 when absent)
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColorFn {
    rgb: Rgb,
    alpha: f32,
}

fn parse_alpha(raw: &str) -> Option<f32> {
    match raw.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok().map(|v| v / 100.0),
        None => raw.parse::<f32>().ok(),
    }
}

fn color_fn(caps: &regex::Captures<'_>) -> Option<ColorFn> {
    let r = caps.get(1)?.as_str().parse::<u8>().ok()?;
    let g = caps.get(2)?.as_str().parse::<u8>().ok()?;
    let b = caps.get(3)?.as_str().parse::<u8>().ok()?;
    let alpha = match caps.get(4) {
        Some(a) => parse_alpha(a.as_str())?,
        None => 1.0,
    };
    Some(ColorFn {
        rgb: Rgb::new(r, g, b),
        alpha,
    })
}

/// Parse the channels of the first color function in a resolved style value.
///
/// Returns `None` for keywords, channels above 255 and anything else that
/// is not an `rgb()`/`rgba()` value; callers treat that as "no color
/// information".
pub fn parse_rgb(value: &str) -> Option<Rgb> {
    RGB_FN.captures(value).and_then(|c| color_fn(&c)).map(|c| c.rgb)
}

/// True for the `transparent` keyword and any color function with alpha 0
pub fn is_transparent(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("transparent") {
        return true;
    }
    RGB_FN
        .captures(value)
        .and_then(|c| color_fn(&c))
        .is_some_and(|c| c.alpha <= 0.0)
}

/// True if `image` is a gradient with at least one visible color stop
/// brighter than `threshold`. Fully transparent stops are ignored.
pub fn gradient_has_light_stop(image: &str, threshold: f32) -> bool {
    if !image.to_ascii_lowercase().contains("gradient") {
        return false;
    }
    RGB_FN
        .captures_iter(image)
        .filter_map(|c| color_fn(&c))
        .any(|c| c.alpha > 0.0 && c.rgb.luminance() > threshold)
}

fn channels(value: &str) -> Option<Rgb> {
    Rgb::from_hex(value.trim()).or_else(|| parse_rgb(value))
}

/// Two style values that render the same color.
///
/// Browsers hand back inline colors normalized: `#0d0d0d` reads as
/// `rgb(13, 13, 13)`.
pub fn same_color(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a.eq_ignore_ascii_case(b) {
        return true;
    }
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if is_transparent(a) || is_transparent(b) {
        return is_transparent(a) && is_transparent(b);
    }
    matches!((channels(a), channels(b)), (Some(x), Some(y)) if x == y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_and_space_forms() {
        assert_eq!(parse_rgb("rgb(200, 20, 20)"), Some(Rgb::new(200, 20, 20)));
        assert_eq!(parse_rgb("rgba(1, 2, 3, 0.5)"), Some(Rgb::new(1, 2, 3)));
        assert_eq!(parse_rgb("rgb(10 20 30 / 40%)"), Some(Rgb::new(10, 20, 30)));
    }

    #[test]
    fn rejects_malformed_values() {
        assert_eq!(parse_rgb(""), None);
        assert_eq!(parse_rgb("transparent"), None);
        assert_eq!(parse_rgb("rgb(300, 0, 0)"), None);
        assert_eq!(parse_rgb("#ffffff"), None);
    }

    #[test]
    fn luminance_weights() {
        assert_eq!(Rgb::new(0, 0, 0).luminance(), 0.0);
        assert!((Rgb::new(255, 255, 255).luminance() - 255.0).abs() < 0.01);
        assert!((Rgb::new(230, 230, 230).luminance() - 230.0).abs() < 0.01);
        assert!(Rgb::new(0, 255, 0).luminance() > Rgb::new(255, 0, 0).luminance());
    }

    #[test]
    fn transparency() {
        assert!(is_transparent("transparent"));
        assert!(is_transparent("rgba(0, 0, 0, 0)"));
        assert!(is_transparent("rgb(0 0 0 / 0)"));
        assert!(!is_transparent("rgba(255, 255, 255, 0.4)"));
        assert!(!is_transparent("rgb(255, 255, 255)"));
    }

    #[test]
    fn hex_round_trip_of_palette_style_values() {
        let c = Rgb::from_hex("#1c1c1c").unwrap();
        assert_eq!(c, Rgb::new(0x1c, 0x1c, 0x1c));
        assert_eq!(c.to_hex(), "#1c1c1c");
        assert_eq!(Rgb::from_hex("#fff"), None);
    }

    #[test]
    fn gradient_light_stops() {
        let light = "linear-gradient(rgb(255, 255, 255), rgb(240, 240, 240))";
        let dark = "linear-gradient(rgb(10, 10, 10), rgb(40, 40, 40))";
        let faded = "linear-gradient(rgba(255, 255, 255, 0), rgb(20, 20, 20))";
        assert!(gradient_has_light_stop(light, 120.0));
        assert!(!gradient_has_light_stop(dark, 120.0));
        assert!(!gradient_has_light_stop(faded, 120.0));
        assert!(!gradient_has_light_stop("url(\"bg.png\")", 120.0));
        assert!(!gradient_has_light_stop("none", 120.0));
    }

    #[test]
    fn same_color_across_notations() {
        assert!(same_color("#0d0d0d", "rgb(13, 13, 13)"));
        assert!(same_color("transparent", "rgba(0, 0, 0, 0)"));
        assert!(same_color("none", "none"));
        assert!(!same_color("#0d0d0d", "rgb(21, 21, 21)"));
        assert!(!same_color("transparent", "rgb(0, 0, 0)"));
        assert!(!same_color("", "transparent"));
    }
}
