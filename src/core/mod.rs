//! Platform-agnostic core - shared between the browser content script and the CLI
//!
//! Nothing in here touches the DOM directly: hosts describe each element
//! as an [`ElementContext`] and apply the returned [`Classification`].

pub mod classify;
pub mod color;
pub mod context;
pub mod patterns;
pub mod rules;

pub use classify::{classify, is_excluded, Classification, Override};
pub use color::{gradient_has_light_stop, is_transparent, parse_rgb, same_color, Rgb};
pub use context::{Ancestor, ElementContext, StyleProperty};
pub use rules::{luminance_band, select_background, BACKGROUND_RULES};
