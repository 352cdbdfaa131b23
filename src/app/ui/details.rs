use eframe::egui::{self, RichText, Ui};

use bubble_motion::motion::{FilterMode, ForceName, MIN_NODE_RADIUS};
use bubble_motion::util::format_size;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);
        self.draw_selection(ui);

        ui.separator();
        self.draw_filter_summary(ui);

        ui.separator();
        self.draw_simulation_stats(ui);
    }

    fn draw_selection(&mut self, ui: &mut Ui) {
        let Some(key) = self.selected.clone() else {
            ui.label("Click a bubble to inspect it.");
            return;
        };
        let Some(node) = self.engine.as_ref().and_then(|engine| engine.node(&key)) else {
            ui.label("The selected record is no longer in the chart.");
            return;
        };

        let record = node.record.clone();
        let mut radius = node.radius;
        let position = node.position();
        let radius_limit = self
            .engine
            .as_ref()
            .map_or(radius, |engine| engine.radius_range().max * 2.0);

        ui.label(RichText::new(record.label.as_str()).strong());
        ui.small(key.as_str());
        ui.add_space(6.0);
        ui.label(format!("Size: {}", format_size(record.size)));
        ui.label(format!("Position: ({:.0}, {:.0})", position.x, position.y));

        let slider = ui
            .add(
                egui::Slider::new(&mut radius, MIN_NODE_RADIUS..=radius_limit.max(MIN_NODE_RADIUS))
                    .text("Radius"),
            )
            .on_hover_text("Override this bubble's radius until the next size change.");
        if slider.changed() {
            self.with_engine(|engine| {
                engine.update_radius(&key, radius);
                Ok(())
            });
        }

        ui.add_space(6.0);
        egui::Grid::new("record_fields")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for name in record.field_names() {
                    if let Some(value) = record.field(&name) {
                        ui.label(name.as_str());
                        ui.label(value);
                        ui.end_row();
                    }
                }
            });
    }

    fn draw_filter_summary(&self, ui: &mut Ui) {
        ui.label(RichText::new("Clustering").strong());
        let Some(engine) = &self.engine else {
            return;
        };

        let filter = engine.filter();
        match filter.mode() {
            FilterMode::Unfiltered => {
                ui.label("Bubbles are placed by category.");
            }
            FilterMode::Filtered { field } => {
                ui.label(format!("Clustered by {field}"));
                if let Some(group) = filter.active_group() {
                    ui.label(format!("Focused group: {group}"));
                }
                for (group, members) in filter.groups() {
                    ui.label(format!("{group}: {}", members.len()));
                }
            }
        }
    }

    fn draw_simulation_stats(&self, ui: &mut Ui) {
        ui.label(RichText::new("Simulation").strong());
        let Some(engine) = &self.engine else {
            ui.label("Waiting for the chart canvas.");
            return;
        };

        let range = engine.radius_range();
        ui.label(format!("Nodes: {}", engine.nodes().len()));
        ui.label(format!("Density: {}", engine.density()));
        ui.label(format!("Alpha: {:.4}", engine.alpha()));
        ui.label(format!("Velocity decay: {:.2}", engine.velocity_decay()));
        ui.label(format!("Radius range: {:.0} to {:.0}", range.min, range.max));
        ui.label(format!("Size domain: {}", format_size(engine.size_domain())));
        ui.label(if engine.is_running() { "Running" } else { "Stopped" });

        let forces = engine
            .forces()
            .names()
            .into_iter()
            .map(ForceName::as_str)
            .collect::<Vec<_>>();
        ui.small(format!("Forces: {}", forces.join(", ")));

        if let Some(update) = self.last_update {
            ui.small(format!(
                "Last update: +{} ~{} -{}",
                update.added, update.updated, update.removed
            ));
        }
    }
}
