//! Heuristic recoloring: decide the inline overrides for one element
//!
//! Each property is judged independently from the element's resolved
//! style. Replacement values are always darker than the thresholds that
//! triggered them, so classifying an already-fixed element yields either
//! nothing or the same values again.

use super::color::{gradient_has_light_stop, is_transparent, parse_rgb};
use super::patterns;
use super::rules::{
    select_background, BACKGROUND_THRESHOLD, DARK_TEXT_THRESHOLD, GRADIENT_STOP_THRESHOLD,
    LIGHT_BORDER_THRESHOLD,
};
use super::{ElementContext, StyleProperty};
use crate::theme::colors;
use serde::Serialize;

/// One `property: value !important` write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Override {
    pub property: StyleProperty,
    pub value: &'static str,
}

/// Classifier output for one element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Name of the background rule that fired, if the background was light
    pub background_rule: Option<&'static str>,
    pub overrides: Vec<Override>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn get(&self, property: StyleProperty) -> Option<&'static str> {
        self.overrides
            .iter()
            .find(|o| o.property == property)
            .map(|o| o.value)
    }

    fn push(&mut self, property: StyleProperty, value: &'static str) {
        self.overrides.push(Override { property, value });
    }
}

/// Media, vector graphics and image-like classes are never recolored
pub fn is_excluded(ctx: &ElementContext) -> bool {
    patterns::is_skip_tag(&ctx.tag)
        || patterns::MEDIA_CLASS.is_match(&ctx.class_name)
        || ctx.has_ancestor_tag("SVG")
}

pub fn classify(ctx: &ElementContext) -> Classification {
    let mut out = Classification::default();
    if is_excluded(ctx) {
        return out;
    }

    if !is_transparent(&ctx.background_color) {
        if let Some(bg) = parse_rgb(&ctx.background_color) {
            if bg.luminance() >= BACKGROUND_THRESHOLD {
                let (rule, value) = select_background(ctx, bg);
                out.background_rule = Some(rule);
                out.push(StyleProperty::BackgroundColor, value);
            }
        }
    }

    if gradient_has_light_stop(&ctx.background_image, GRADIENT_STOP_THRESHOLD) {
        out.push(StyleProperty::BackgroundImage, "none");
    }

    if let Some(text) = parse_rgb(&ctx.color) {
        if text.luminance() < DARK_TEXT_THRESHOLD {
            out.push(StyleProperty::Color, colors::TEXT);
        }
    }

    if let Some(border) = parse_rgb(&ctx.border_color) {
        if border.luminance() > LIGHT_BORDER_THRESHOLD {
            out.push(StyleProperty::BorderColor, colors::BORDER);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Ancestor, Rgb};
    use crate::theme::Shade;
    use proptest::prelude::*;

    fn rgb(c: Rgb) -> String {
        format!("rgb({}, {}, {})", c.r, c.g, c.b)
    }

    fn with_background(tag: &str, class: &str, bg: &str) -> ElementContext {
        ElementContext {
            tag: tag.into(),
            class_name: class.into(),
            background_color: bg.into(),
            ..Default::default()
        }
    }

    /// Feed the overrides back in as the new resolved style
    fn reapply(ctx: &ElementContext, c: &Classification) -> ElementContext {
        let mut next = ctx.clone();
        for o in &c.overrides {
            let resolved = match o.value {
                "none" => "none".to_string(),
                "transparent" => "rgba(0, 0, 0, 0)".to_string(),
                hex => rgb(Rgb::from_hex(hex).unwrap()),
            };
            match o.property {
                StyleProperty::BackgroundColor => next.background_color = resolved,
                StyleProperty::BackgroundImage => next.background_image = resolved,
                StyleProperty::Color => next.color = resolved,
                StyleProperty::BorderColor => next.border_color = resolved,
            }
        }
        next
    }

    #[test]
    fn brand_red_header_gets_nav_shade() {
        let c = classify(&with_background("DIV", "Header", "rgb(200, 20, 20)"));
        assert_eq!(c.get(StyleProperty::BackgroundColor), Some(Shade::Surface.css()));
        assert_eq!(c.background_rule, Some("brand-red"));
    }

    #[test]
    fn very_light_background_gets_darkest_shade() {
        let c = classify(&with_background("DIV", "", "rgb(230, 230, 230)"));
        assert_eq!(c.get(StyleProperty::BackgroundColor), Some(Shade::Page.css()));
    }

    #[test]
    fn table_cell_is_transparent() {
        let mut cell = with_background("TD", "Table__TD", "rgb(250, 250, 250)");
        cell.parent_tag = Some("TR".into());
        let c = classify(&cell);
        assert_eq!(c.get(StyleProperty::BackgroundColor), Some("transparent"));
    }

    #[test]
    fn media_gets_nothing() {
        for tag in ["IMG", "svg", "VIDEO", "path"] {
            let mut ctx = with_background(tag, "", "rgb(255, 255, 255)");
            ctx.color = "rgb(0, 0, 0)".into();
            ctx.border_color = "rgb(255, 255, 255)".into();
            ctx.background_image = "linear-gradient(rgb(255, 255, 255), rgb(0, 0, 0))".into();
            assert!(classify(&ctx).is_empty(), "{tag}");
        }
    }

    #[test]
    fn logo_class_and_svg_descendants_get_nothing() {
        let logo = with_background("DIV", "TeamLink team-logo", "rgb(255, 255, 255)");
        assert!(classify(&logo).is_empty());

        let mut inside = with_background("DIV", "", "rgb(255, 255, 255)");
        inside.ancestors.push(Ancestor {
            tag: "svg".into(),
            ..Default::default()
        });
        assert!(classify(&inside).is_empty());
    }

    #[test]
    fn transparent_and_malformed_backgrounds_are_left_alone() {
        for bg in ["transparent", "rgba(0, 0, 0, 0)", "", "inherit", "rgb(999, 0, 0)"] {
            let c = classify(&with_background("DIV", "", bg));
            assert_eq!(c.get(StyleProperty::BackgroundColor), None, "{bg:?}");
        }
    }

    #[test]
    fn light_gradient_is_removed() {
        let mut ctx = ElementContext::default();
        ctx.background_image = "linear-gradient(180deg, rgb(255, 255, 255) 0%, rgb(245, 245, 245) 100%)".into();
        assert_eq!(classify(&ctx).get(StyleProperty::BackgroundImage), Some("none"));

        ctx.background_image = "linear-gradient(rgb(20, 20, 20), rgb(0, 0, 0))".into();
        assert_eq!(classify(&ctx).get(StyleProperty::BackgroundImage), None);
    }

    #[test]
    fn dark_text_and_light_borders() {
        let mut ctx = ElementContext::default();
        ctx.color = "rgb(48, 48, 48)".into();
        ctx.border_color = "rgb(220, 220, 220)".into();
        let c = classify(&ctx);
        assert_eq!(c.get(StyleProperty::Color), Some(colors::TEXT));
        assert_eq!(c.get(StyleProperty::BorderColor), Some(colors::BORDER));

        ctx.color = "rgb(120, 120, 120)".into();
        ctx.border_color = "rgb(170, 170, 170)".into();
        assert!(classify(&ctx).is_empty());
    }

    proptest! {
        #[test]
        fn background_threshold(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255) {
            let bg = Rgb::new(r, g, b);
            let c = classify(&with_background("DIV", "", &rgb(bg)));
            let replaced = c.get(StyleProperty::BackgroundColor);
            if bg.luminance() >= BACKGROUND_THRESHOLD {
                let shade = replaced.and_then(Rgb::from_hex);
                prop_assert!(shade.is_some());
                let shade = shade.unwrap();
                prop_assert!(Shade::ALL.iter().any(|s| s.rgb() == shade));
                prop_assert!(shade.luminance() <= Shade::Hover.rgb().luminance());
            } else {
                prop_assert_eq!(replaced, None);
            }
        }

        #[test]
        fn alternating_rows(n in 1usize..40) {
            for i in 0..n {
                let mut row = with_background("TR", "Table__TR", "rgb(255, 255, 255)");
                row.parent_tag = Some("TBODY".into());
                row.sibling_index = i;
                let expected = if i % 2 == 0 { Shade::Page } else { Shade::Surface };
                prop_assert_eq!(classify(&row).get(StyleProperty::BackgroundColor), Some(expected.css()));
            }
        }

        #[test]
        fn classification_is_a_fixed_point(
            bg in (0u8..=255, 0u8..=255, 0u8..=255),
            fg in (0u8..=255, 0u8..=255, 0u8..=255),
            border in (0u8..=255, 0u8..=255, 0u8..=255),
            class in prop::sample::select(vec!["", "Card", "Table__TH", "TeamName", "GlobalNav", "ScoreCell"]),
        ) {
            let ctx = ElementContext {
                class_name: class.to_string(),
                background_color: rgb(Rgb::new(bg.0, bg.1, bg.2)),
                color: rgb(Rgb::new(fg.0, fg.1, fg.2)),
                border_color: rgb(Rgb::new(border.0, border.1, border.2)),
                ..Default::default()
            };
            let first = reapply(&ctx, &classify(&ctx));
            let second = reapply(&first, &classify(&first));
            let third = reapply(&second, &classify(&second));
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&second, &third);
        }
    }
}
