use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use bubble_motion::motion::{SimulationNode, group_of};
use bubble_motion::util::{format_size, short_label};

use super::super::render_utils::{blend_color, category_color, dim_color, draw_background};
use super::super::{MotionTuning, SearchMatchCache, ViewModel};

const LABEL_MIN_RADIUS: f32 = 22.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    /// Keys of nodes whose label or key fuzzily matches the search box.
    fn search_matches(&mut self) -> Option<Arc<HashSet<String>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.records_revision == self.records_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let engine = self.engine.as_ref()?;
        let matcher = SkimMatcherV2::default();
        let matches = engine
            .nodes()
            .iter()
            .filter(|node| {
                fuzzy_match_score(&matcher, &node.record.label, query).is_some()
                    || fuzzy_match_score(&matcher, &node.key, query).is_some()
            })
            .map(|node| node.key.clone())
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            records_revision: self.records_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_chart(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        let now = Instant::now();
        self.viewport.set_size(rect.width(), rect.height());
        self.debouncer.observe(rect.size(), now);
        self.ensure_engine();
        let settled = self.debouncer.poll(now).is_some();
        let search_matches = self.search_matches();

        let Some(engine) = self.engine.as_mut() else {
            ui.label("Waiting for a drawable canvas...");
            return;
        };

        if settled {
            match engine.handle_resize() {
                Ok(_) => self.tuning = MotionTuning::from_config(engine.config()),
                Err(error) => self.engine_error = Some(error.to_string()),
            }
        }

        if self.live_motion {
            engine.frame(now);
        }
        if engine.is_running() || self.debouncer.is_pending() {
            ui.ctx().request_repaint();
        }

        let frame = self.frame.borrow();
        let nodes = engine
            .nodes()
            .iter()
            .map(|node| (node.key.as_str(), node))
            .collect::<HashMap<&str, &SimulationNode>>();
        let filter = engine.filter();
        let hovered = Self::hovered_index(ui, rect, &frame.positions, &frame.radii);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());
        let selected_color = Color32::from_rgb(245, 206, 93);

        for (index, (key, (position, radius))) in frame
            .keys
            .iter()
            .zip(frame.positions.iter().zip(&frame.radii))
            .enumerate()
        {
            let Some(node) = nodes.get(key.as_str()) else {
                continue;
            };
            let center = Self::screen_position(rect, *position);
            let is_hovered = hovered == Some(index);
            let is_selected = self.selected.as_deref() == Some(node.key.as_str());
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&node.key));
            let outside_group = match (filter.field(), filter.active_group()) {
                (Some(field), Some(active)) => group_of(&node.record, field) != active,
                _ => false,
            };

            let base_color = category_color(node.record.category.as_deref());
            let color = if is_hovered {
                blend_color(base_color, Color32::WHITE, 0.35)
            } else if is_match {
                blend_color(base_color, Color32::from_rgb(103, 196, 255), 0.6)
            } else if search_active {
                dim_color(base_color, 0.38)
            } else if outside_group {
                dim_color(base_color, 0.55)
            } else {
                base_color
            };

            painter.circle_filled(center, *radius, color);
            let stroke = if is_selected {
                Stroke::new(2.4, selected_color)
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(center, *radius, stroke);

            if *radius >= LABEL_MIN_RADIUS || is_hovered || is_selected {
                let max_chars = ((*radius / 4.5) as usize).max(4);
                painter.text(
                    center,
                    Align2::CENTER_CENTER,
                    short_label(&node.record.label, max_chars),
                    FontId::proportional(12.0),
                    Color32::from_gray(240),
                );
            }
        }

        for (group, anchor) in filter.anchors() {
            let count = filter.groups().get(group).map_or(0, Vec::len);
            painter.text(
                Self::screen_position(rect, *anchor),
                Align2::CENTER_CENTER,
                format!("{group} ({count})"),
                FontId::proportional(15.0),
                Color32::from_rgba_unmultiplied(240, 240, 240, 120),
            );
        }

        let hovered_key = hovered.and_then(|index| frame.keys.get(index));
        if let Some(node) = hovered_key.and_then(|key| nodes.get(key.as_str())) {
            let panel_text = format!(
                "{}  |  size {}  |  {}",
                node.record.label,
                format_size(node.record.size),
                node.record.category.as_deref().unwrap_or("uncategorised")
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        let pending_selection = response
            .clicked_by(egui::PointerButton::Primary)
            .then(|| hovered_key.cloned());
        drop(nodes);
        drop(frame);

        if let Some(selection) = pending_selection {
            self.apply_chart_selection(selection);
        }
    }
}
