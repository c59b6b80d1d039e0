//! Baseline stylesheet injection
//!
//! The stylesheet goes in before the page paints so there is no light
//! flash; the scanner then handles whatever it cannot reach.

use crate::config::STYLE_ELEMENT_ID;
use crate::host::Dom;
use tracing::debug;

pub const BASELINE_CSS: &str = include_str!("../assets/baseline.css");

/// Insert the stylesheet unless its marker element is already present.
///
/// Returns `true` if it was inserted.
pub fn inject<D: Dom>(dom: &mut D) -> bool {
    if dom.has_stylesheet(STYLE_ELEMENT_ID) {
        return false;
    }
    dom.insert_stylesheet(STYLE_ELEMENT_ID, BASELINE_CSS);
    debug!(id = STYLE_ELEMENT_ID, bytes = BASELINE_CSS.len(), "Baseline stylesheet injected");
    true
}

/// Returns `true` if a stylesheet was removed
pub fn remove<D: Dom>(dom: &mut D) -> bool {
    if !dom.has_stylesheet(STYLE_ELEMENT_ID) {
        return false;
    }
    dom.remove_stylesheet(STYLE_ELEMENT_ID);
    debug!(id = STYLE_ELEMENT_ID, "Baseline stylesheet removed");
    true
}
