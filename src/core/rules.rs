//! Ordered background replacement rules
//!
//! [`BACKGROUND_RULES`] is evaluated top to bottom and the first rule whose
//! predicate holds picks the replacement. The last entry always matches.

use super::patterns;
use super::{ElementContext, Rgb};
use crate::theme::Shade;

/// Backgrounds at or above this luminance are still "light"
pub const BACKGROUND_THRESHOLD: f32 = 45.0;
/// Gradient stops above this luminance get the gradient suppressed
pub const GRADIENT_STOP_THRESHOLD: f32 = 120.0;
/// Text below this luminance is unreadable on a dark background
pub const DARK_TEXT_THRESHOLD: f32 = 50.0;
/// Borders above this luminance are too bright
pub const LIGHT_BORDER_THRESHOLD: f32 = 170.0;

pub const TRANSPARENT: &str = "transparent";

/// What a matching rule writes into `background-color`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Fixed(Shade),
    /// Zebra striping by position among siblings (0-indexed)
    RowParity { even: Shade, odd: Shade },
    /// Let the row's shade show through
    Transparent,
    /// Bucket the original luminance
    LuminanceBands,
}

impl Outcome {
    pub fn resolve(self, ctx: &ElementContext, bg: Rgb) -> &'static str {
        match self {
            Outcome::Fixed(shade) => shade.css(),
            Outcome::RowParity { even, odd } => {
                if ctx.sibling_index % 2 == 0 {
                    even.css()
                } else {
                    odd.css()
                }
            }
            Outcome::Transparent => TRANSPARENT,
            Outcome::LuminanceBands => luminance_band(bg.luminance()).css(),
        }
    }
}

pub struct BackgroundRule {
    pub name: &'static str,
    pub applies: fn(&ElementContext, Rgb) -> bool,
    pub outcome: Outcome,
}

/// Brighter originals land on deeper shades
pub fn luminance_band(lum: f32) -> Shade {
    if lum > 200.0 {
        Shade::Page
    } else if lum > 150.0 {
        Shade::Surface
    } else if lum > 100.0 {
        Shade::Header
    } else if lum > 60.0 {
        Shade::Elevated
    } else {
        Shade::Hover
    }
}

fn brand_red(_: &ElementContext, bg: Rgb) -> bool {
    bg.r > 100 && bg.g < 50 && bg.b < 50
}

fn team_row(ctx: &ElementContext, _: Rgb) -> bool {
    patterns::TEAM_ROW.is_match(&ctx.class_name)
}

fn column_header(ctx: &ElementContext, _: Rgb) -> bool {
    ctx.is_tag("THEAD") || ctx.is_tag("TH") || patterns::COLUMN_HEADER.is_match(&ctx.class_name)
}

fn totals(ctx: &ElementContext, _: Rgb) -> bool {
    patterns::TOTALS.is_match(&ctx.class_name) || ctx.is_tag("TFOOT")
}

fn body_row(ctx: &ElementContext, _: Rgb) -> bool {
    ctx.is_tag("TR") && ctx.parent_is("TBODY")
}

fn table_cell(ctx: &ElementContext, _: Rgb) -> bool {
    ctx.is_tag("TD")
}

fn navigation(ctx: &ElementContext, _: Rgb) -> bool {
    ctx.is_tag("NAV") || ctx.is_tag("HEADER") || patterns::NAVIGATION.is_match(&ctx.class_name)
}

fn ticker(ctx: &ElementContext, _: Rgb) -> bool {
    patterns::TICKER.is_match(&ctx.class_name)
        || ctx.closest(|_, class, id| patterns::is_scoreboard_container(class, id))
}

fn panel(ctx: &ElementContext, _: Rgb) -> bool {
    patterns::PANEL.is_match(&ctx.class_name)
}

fn section_title(ctx: &ElementContext, _: Rgb) -> bool {
    patterns::SECTION_TITLE.is_match(&ctx.class_name)
}

fn always(_: &ElementContext, _: Rgb) -> bool {
    true
}

pub static BACKGROUND_RULES: &[BackgroundRule] = &[
    BackgroundRule {
        name: "brand-red",
        applies: brand_red,
        outcome: Outcome::Fixed(Shade::Surface),
    },
    BackgroundRule {
        name: "team-row",
        applies: team_row,
        outcome: Outcome::Fixed(Shade::Elevated),
    },
    BackgroundRule {
        name: "column-header",
        applies: column_header,
        outcome: Outcome::Fixed(Shade::Header),
    },
    BackgroundRule {
        name: "totals",
        applies: totals,
        outcome: Outcome::Fixed(Shade::Header),
    },
    BackgroundRule {
        name: "body-row",
        applies: body_row,
        outcome: Outcome::RowParity {
            even: Shade::Page,
            odd: Shade::Surface,
        },
    },
    BackgroundRule {
        name: "table-cell",
        applies: table_cell,
        outcome: Outcome::Transparent,
    },
    BackgroundRule {
        name: "navigation",
        applies: navigation,
        outcome: Outcome::Fixed(Shade::Surface),
    },
    BackgroundRule {
        name: "ticker",
        applies: ticker,
        outcome: Outcome::Fixed(Shade::Header),
    },
    BackgroundRule {
        name: "panel",
        applies: panel,
        outcome: Outcome::Fixed(Shade::Surface),
    },
    BackgroundRule {
        name: "section-title",
        applies: section_title,
        outcome: Outcome::Fixed(Shade::Header),
    },
    BackgroundRule {
        name: "luminance-fallback",
        applies: always,
        outcome: Outcome::LuminanceBands,
    },
];

/// First matching rule and the value it writes
pub fn select_background(ctx: &ElementContext, bg: Rgb) -> (&'static str, &'static str) {
    for rule in BACKGROUND_RULES {
        if (rule.applies)(ctx, bg) {
            return (rule.name, rule.outcome.resolve(ctx, bg));
        }
    }
    // Unreachable while the table ends with `always`
    ("luminance-fallback", Outcome::LuminanceBands.resolve(ctx, bg))
}
