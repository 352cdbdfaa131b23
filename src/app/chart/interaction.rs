use eframe::egui::{Pos2, Rect, Ui, Vec2};

use super::super::ViewModel;
use super::super::render_utils::circle_visible;

impl ViewModel {
    /// Index of the bubble under the pointer, nearest center first.
    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        rect: Rect,
        positions: &[Vec2],
        radii: &[f32],
    ) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        if !rect.contains(pointer) {
            return None;
        }

        positions
            .iter()
            .zip(radii)
            .enumerate()
            .filter_map(|(index, (position, radius))| {
                let center = Self::screen_position(rect, *position);
                if !circle_visible(rect, center, *radius) {
                    return None;
                }
                let distance = center.distance(pointer);
                (distance <= *radius).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Click on a bubble (`Some`) or on the background (`None`).
    pub(in crate::app) fn apply_chart_selection(&mut self, key: Option<String>) {
        self.with_engine(|engine| engine.select_node(key.as_deref()));
        self.selected = key;
    }

    pub(in crate::app) fn screen_position(rect: Rect, position: Vec2) -> Pos2 {
        rect.min + position
    }
}
