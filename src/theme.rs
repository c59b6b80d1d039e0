//! Dark palette shared by the baseline stylesheet and the scanner

use crate::core::Rgb;
use serde::{Deserialize, Serialize};

/// Named CSS colors, as written into inline overrides and `assets/baseline.css`
pub mod colors {
    // === Backgrounds (darkest to lightest) ===
    pub const BG_0: &str = "#0d0d0d"; // page background, even rows
    pub const BG_1: &str = "#151515"; // nav, cards, odd rows
    pub const BG_2: &str = "#1c1c1c"; // headers, ticker
    pub const BG_3: &str = "#242424"; // team rows
    pub const BG_4: &str = "#2e2e2e"; // row hover

    // === Lines & Borders ===
    pub const BORDER: &str = "#333333";
    pub const BORDER_LIGHT: &str = "#444444";

    // === Text ===
    pub const TEXT: &str = "#e0e0e0";
    pub const TEXT_BRIGHT: &str = "#f0f0f0";
    pub const TEXT_MUTED: &str = "#999999";
    pub const TEXT_DIM: &str = "#707070";

    // === Semantic ===
    pub const ACCENT: &str = "#d63a3a";
    pub const LINK: &str = "#6eaaff";
    pub const LINK_HOVER: &str = "#93c0ff";
    pub const POSITIVE: &str = "#4caf50";
    pub const NEGATIVE: &str = "#ef5350";

    // === Scrollbar ===
    pub const SCROLL_THUMB: &str = "#444444";
    pub const SCROLL_TRACK: &str = "#1a1a1a";

    /// Every named color, as `(name, value)`
    pub const PALETTE: &[(&str, &str)] = &[
        ("BG_0", BG_0),
        ("BG_1", BG_1),
        ("BG_2", BG_2),
        ("BG_3", BG_3),
        ("BG_4", BG_4),
        ("BORDER", BORDER),
        ("BORDER_LIGHT", BORDER_LIGHT),
        ("TEXT", TEXT),
        ("TEXT_BRIGHT", TEXT_BRIGHT),
        ("TEXT_MUTED", TEXT_MUTED),
        ("TEXT_DIM", TEXT_DIM),
        ("ACCENT", ACCENT),
        ("LINK", LINK),
        ("LINK_HOVER", LINK_HOVER),
        ("POSITIVE", POSITIVE),
        ("NEGATIVE", NEGATIVE),
        ("SCROLL_THUMB", SCROLL_THUMB),
        ("SCROLL_TRACK", SCROLL_TRACK),
    ];
}

/// Background shades the classifier can pick from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shade {
    /// Deepest shade: page background and even table rows
    Page,
    /// Navigation bars, cards, sidebars and odd table rows
    Surface,
    /// Column headers, totals, section titles, score ticker
    Header,
    /// Team-name rows
    Elevated,
    /// Lightest replacement, only reached by the luminance fallback
    Hover,
}

impl Shade {
    pub const ALL: &'static [Shade] = &[
        Shade::Page,
        Shade::Surface,
        Shade::Header,
        Shade::Elevated,
        Shade::Hover,
    ];

    /// CSS hex value written into the inline override
    pub const fn css(self) -> &'static str {
        match self {
            Shade::Page => colors::BG_0,
            Shade::Surface => colors::BG_1,
            Shade::Header => colors::BG_2,
            Shade::Elevated => colors::BG_3,
            Shade::Hover => colors::BG_4,
        }
    }

    pub const fn rgb(self) -> Rgb {
        match self {
            Shade::Page => Rgb::new(0x0d, 0x0d, 0x0d),
            Shade::Surface => Rgb::new(0x15, 0x15, 0x15),
            Shade::Header => Rgb::new(0x1c, 0x1c, 0x1c),
            Shade::Elevated => Rgb::new(0x24, 0x24, 0x24),
            Shade::Hover => Rgb::new(0x2e, 0x2e, 0x2e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shade_rgb_matches_css() {
        for &shade in Shade::ALL {
            assert_eq!(Rgb::from_hex(shade.css()), Some(shade.rgb()), "{:?}", shade);
        }
    }

    #[test]
    fn shades_get_lighter_in_order() {
        let lum: Vec<f32> = Shade::ALL.iter().map(|s| s.rgb().luminance()).collect();
        for pair in lum.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn text_and_border_replacements_are_stable() {
        // Re-scanning an overridden element must not re-trigger the rules
        let text = Rgb::from_hex(colors::TEXT).unwrap();
        let border = Rgb::from_hex(colors::BORDER).unwrap();
        assert!(text.luminance() >= 50.0);
        assert!(border.luminance() <= 170.0);
    }
}
