//! Class-name and tag signals tuned to ESPN's markup
//!
//! All site-specific naming lives here so the rule table and the scheduler
//! never need to change when the site renames a component.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("class pattern compiles")
}

/// Tags never touched: media, vector graphics and non-rendered elements
pub const SKIP_TAGS: &[&str] = &[
    "IMG", "VIDEO", "CANVAS", "IFRAME", "SVG", "PICTURE", "SOURCE",
    "PATH", "CIRCLE", "RECT", "POLYGON", "LINE", "POLYLINE", "ELLIPSE",
    "G", "USE", "DEFS", "CLIPPATH", "MASK", "SYMBOL",
    "LINEARGRADIENT", "RADIALGRADIENT", "STOP", "FILTER",
    "FEBLEND", "FECOLORMATRIX", "FEGAUSSIANBLUR",
    "SCRIPT", "STYLE", "LINK", "NOSCRIPT", "BR", "WBR",
];

/// Whole-word image-ish class names (`TeamLogo` does not match, `team-logo` does)
pub static MEDIA_CLASS: Lazy<Regex> = Lazy::new(|| {
    case_insensitive(r"\b(logo|icon|headshot|avatar|thumbnail|graphic|team-logo|image)\b")
});

/// "New York Knicks" style team header rows in box scores
pub static TEAM_ROW: Lazy<Regex> =
    Lazy::new(|| case_insensitive(r"TeamName|team-header|BoxscoreItem__Team"));

/// Column headers (MIN, PTS, FG) and section labels (STARTERS, BENCH)
pub static COLUMN_HEADER: Lazy<Regex> = Lazy::new(|| {
    case_insensitive(r"Table__TH|Table__Header|Table__Title|colhead|stathead|subhead|HeaderRow|header-row")
});

pub static TOTALS: Lazy<Regex> = Lazy::new(|| case_insensitive(r"total"));

pub static NAVIGATION: Lazy<Regex> =
    Lazy::new(|| case_insensitive(r"nav|global-nav|SiteNav"));

/// Scoreboard strip, score cells and carousels
pub static TICKER: Lazy<Regex> = Lazy::new(|| {
    case_insensitive(r"Scoreboard|ScoreCell|ScoreEvent|ScoresStrip|ScoreCollection|carousel")
});

/// Class substrings marking a scoreboard container (case-sensitive, like `[class*=...]`)
pub const SCOREBOARD_CONTAINER_CLASSES: &[&str] =
    &["Scoreboard", "scoreboard", "ScoresStrip", "scoresStrip"];

/// Id substring marking a scoreboard container
pub const SCOREBOARD_CONTAINER_ID: &str = "scoreboard";

/// Sidebars, rails, cards and feed modules
pub static PANEL: Lazy<Regex> = Lazy::new(|| {
    case_insensitive(r"sidebar|rightRail|VideoList|Matchup|module|Card|ContentItem|FeedItem|Story")
});

pub static SECTION_TITLE: Lazy<Regex> =
    Lazy::new(|| case_insensitive(r"SectionTitle|Card__Header"));

pub fn is_skip_tag(tag: &str) -> bool {
    SKIP_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// `[class*="Scoreboard"], ..., [id*="scoreboard"]` on a single element
pub fn is_scoreboard_container(class_name: &str, id: &str) -> bool {
    SCOREBOARD_CONTAINER_CLASSES
        .iter()
        .any(|c| class_name.contains(c))
        || id.contains(SCOREBOARD_CONTAINER_ID)
}
