use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use bubble_motion::util::stable_pair;

const PALETTE: [Color32; 8] = [
    Color32::from_rgb(86, 156, 214),
    Color32::from_rgb(232, 132, 86),
    Color32::from_rgb(120, 196, 120),
    Color32::from_rgb(198, 120, 221),
    Color32::from_rgb(229, 192, 91),
    Color32::from_rgb(94, 196, 196),
    Color32::from_rgb(224, 108, 132),
    Color32::from_rgb(152, 160, 176),
];

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// Stable colour per category value; uncategorised bubbles are grey.
pub(super) fn category_color(category: Option<&str>) -> Color32 {
    let Some(category) = category else {
        return PALETTE[PALETTE.len() - 1];
    };

    let (x, _) = stable_pair(category);
    let slot = (((x + 1.0) * 0.5) * (PALETTE.len() - 1) as f32) as usize;
    PALETTE[slot.min(PALETTE.len() - 2)]
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = 56.0;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + step;
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + step;
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn category_colors_are_stable_and_distinct_from_fallback() {
        let fallback = category_color(None);
        for category in ["compute", "storage", "network", "analytics"] {
            let color = category_color(Some(category));
            assert_eq!(color, category_color(Some(category)));
            assert_ne!(color, fallback);
        }
    }

    #[test]
    fn circles_touching_the_rect_are_visible() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(-5.0, 50.0), 10.0));
        assert!(!circle_visible(rect, pos2(-20.0, 50.0), 10.0));
    }
}
