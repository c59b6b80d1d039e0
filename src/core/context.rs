//! Per-element input to the classifier
//!
//! Hosts build an [`ElementContext`] from the live element each time it is
//! classified. Nothing here is cached between sweeps.

use serde::{Deserialize, Serialize};

/// Tag, class and id of one ancestor element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ancestor {
    pub tag: String,
    pub class_name: String,
    pub id: String,
}

/// Resolved colors and structural position of one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementContext {
    /// Upper-cased tag name (`DIV`, `TR`, `SVG`, ...)
    pub tag: String,
    pub class_name: String,
    pub id: String,
    pub background_color: String,
    pub background_image: String,
    pub color: String,
    pub border_color: String,
    pub parent_tag: Option<String>,
    /// Position among the parent's element children
    pub sibling_index: usize,
    /// Nearest ancestor first
    pub ancestors: Vec<Ancestor>,
}

impl Default for ElementContext {
    fn default() -> Self {
        Self {
            tag: "DIV".to_string(),
            class_name: String::new(),
            id: String::new(),
            background_color: "rgba(0, 0, 0, 0)".to_string(),
            background_image: "none".to_string(),
            color: "rgb(224, 224, 224)".to_string(),
            border_color: "rgb(51, 51, 51)".to_string(),
            parent_tag: None,
            sibling_index: 0,
            ancestors: Vec::new(),
        }
    }
}

impl ElementContext {
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn parent_is(&self, tag: &str) -> bool {
        self.parent_tag
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case(tag))
    }

    /// Any ancestor (not the element itself) has the given tag
    pub fn has_ancestor_tag(&self, tag: &str) -> bool {
        self.ancestors.iter().any(|a| a.tag.eq_ignore_ascii_case(tag))
    }

    /// The element itself or any ancestor satisfies `pred`, like `Element.closest`
    pub fn closest(&self, pred: impl Fn(&str, &str, &str) -> bool) -> bool {
        pred(&self.tag, &self.class_name, &self.id)
            || self
                .ancestors
                .iter()
                .any(|a| pred(&a.tag, &a.class_name, &a.id))
    }
}

/// The four inline properties the scanner ever writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StyleProperty {
    BackgroundColor,
    BackgroundImage,
    Color,
    BorderColor,
}

impl StyleProperty {
    pub const ALL: &'static [StyleProperty] = &[
        StyleProperty::BackgroundColor,
        StyleProperty::BackgroundImage,
        StyleProperty::Color,
        StyleProperty::BorderColor,
    ];

    pub const fn css_name(self) -> &'static str {
        match self {
            StyleProperty::BackgroundColor => "background-color",
            StyleProperty::BackgroundImage => "background-image",
            StyleProperty::Color => "color",
            StyleProperty::BorderColor => "border-color",
        }
    }

    /// Longhand read back from the computed style; the border shorthand
    /// serializes to several values when the sides differ
    pub const fn computed_name(self) -> &'static str {
        match self {
            StyleProperty::BorderColor => "border-top-color",
            other => other.css_name(),
        }
    }
}
