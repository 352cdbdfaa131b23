use std::collections::{BTreeMap, HashMap};
use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Vec2, vec2};

const AUTO_RING_RADIUS: f32 = 0.3;

/// Normalized attraction point per category value.
///
/// Explicit anchors come from configuration. Other categories are placed
/// evenly on a ring around the canvas center in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct CategoryAnchors {
    explicit: BTreeMap<String, Vec2>,
    auto_order: Vec<String>,
}

impl CategoryAnchors {
    pub fn from_config(anchors: &BTreeMap<String, [f32; 2]>) -> Self {
        let explicit = anchors
            .iter()
            .map(|(category, [x, y])| (category.clone(), vec2(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0))))
            .collect();

        Self {
            explicit,
            auto_order: Vec::new(),
        }
    }

    /// Replaces explicit anchors, keeping the auto-assigned order.
    pub fn set_explicit(&mut self, anchors: &BTreeMap<String, [f32; 2]>) {
        let auto_order = std::mem::take(&mut self.auto_order);
        *self = Self::from_config(anchors);
        for category in auto_order {
            if !self.explicit.contains_key(&category) {
                self.auto_order.push(category);
            }
        }
    }

    /// Records categories; returns `true` when an unseen one appeared.
    pub fn observe<'a>(&mut self, categories: impl IntoIterator<Item = &'a str>) -> bool {
        let mut changed = false;
        for category in categories {
            if self.explicit.contains_key(category)
                || self.auto_order.iter().any(|known| known == category)
            {
                continue;
            }
            self.auto_order.push(category.to_owned());
            changed = true;
        }
        changed
    }

    pub fn normalized(&self, category: &str) -> Option<Vec2> {
        if let Some(anchor) = self.explicit.get(category) {
            return Some(*anchor);
        }

        let index = self.auto_order.iter().position(|known| known == category)?;
        let count = self.auto_order.len();
        if count == 1 {
            return Some(vec2(0.5, 0.5));
        }

        let angle = index as f32 * (TAU / count as f32) - FRAC_PI_2;
        Some(vec2(
            0.5 + AUTO_RING_RADIUS * angle.cos(),
            0.5 + AUTO_RING_RADIUS * angle.sin(),
        ))
    }

    /// Anchors scaled to a canvas of `size`.
    pub fn absolute(&self, size: Vec2) -> HashMap<String, Vec2> {
        self.explicit
            .keys()
            .chain(self.auto_order.iter())
            .filter_map(|category| {
                self.normalized(category)
                    .map(|anchor| (category.clone(), anchor * size))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.explicit.len() + self.auto_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_anchors_are_clamped_into_unit_square() {
        let anchors = CategoryAnchors::from_config(&BTreeMap::from([
            ("hot".to_owned(), [1.4, -0.2]),
            ("cold".to_owned(), [0.25, 0.75]),
        ]));

        assert_eq!(anchors.normalized("hot"), Some(vec2(1.0, 0.0)));
        assert_eq!(anchors.normalized("cold"), Some(vec2(0.25, 0.75)));
        assert_eq!(anchors.normalized("warm"), None);
    }

    #[test]
    fn single_auto_category_sits_in_the_center() {
        let mut anchors = CategoryAnchors::default();
        assert!(anchors.observe(["only"]));
        assert!(!anchors.observe(["only"]));
        assert_eq!(anchors.normalized("only"), Some(vec2(0.5, 0.5)));
    }

    #[test]
    fn auto_categories_spread_evenly_inside_unit_square() {
        let mut anchors = CategoryAnchors::default();
        anchors.observe(["a", "b", "c", "d"]);

        let first = anchors.normalized("a").expect("anchor a");
        let third = anchors.normalized("c").expect("anchor c");
        assert!((first.x - 0.5).abs() < 1e-5 && (first.y - 0.2).abs() < 1e-5);
        assert!((third.x - 0.5).abs() < 1e-5 && (third.y - 0.8).abs() < 1e-5);

        for category in ["a", "b", "c", "d"] {
            let anchor = anchors.normalized(category).expect("anchor");
            assert!((0.0..=1.0).contains(&anchor.x));
            assert!((0.0..=1.0).contains(&anchor.y));
        }
    }

    #[test]
    fn absolute_anchors_follow_canvas_size() {
        let mut anchors =
            CategoryAnchors::from_config(&BTreeMap::from([("fixed".to_owned(), [0.25, 0.5])]));
        anchors.observe(["fixed", "free"]);

        let small = anchors.absolute(vec2(400.0, 200.0));
        let large = anchors.absolute(vec2(800.0, 400.0));
        assert_eq!(small.get("fixed"), Some(&vec2(100.0, 100.0)));
        assert_eq!(large.get("fixed"), Some(&vec2(200.0, 200.0)));
        assert_eq!(large.get("free"), Some(&vec2(400.0, 200.0)));
        assert_eq!(anchors.len(), 2);
    }

    #[test]
    fn replacing_explicit_anchors_keeps_auto_categories() {
        let mut anchors = CategoryAnchors::default();
        anchors.observe(["a", "b"]);
        anchors.set_explicit(&BTreeMap::from([("a".to_owned(), [0.1, 0.1])]));

        assert_eq!(anchors.normalized("a"), Some(vec2(0.1, 0.1)));
        assert_eq!(anchors.normalized("b"), Some(vec2(0.5, 0.5)));
    }
}
