use eframe::egui::{self, Key, Response, RichText, Ui};

use bubble_motion::motion::{DensityPreset, MotionConfigPatch};

use super::super::{MotionTuning, ViewModel};

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

fn default_slider_key_step(min: f32, max: f32) -> f32 {
    ((max - min) / 200.0).max(0.0005)
}

/// Held arrow keys move a focused slider faster the longer they are held.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    min: f32,
    max: f32,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    let step = default_slider_key_step(min, max);

    let old_value = *value;
    *value = (*value + direction as f32 * step * speed * delta_time).clamp(min, max);
    ui.ctx().request_repaint();
    (*value - old_value).abs() > f32::EPSILON
}

fn tuning_slider(ui: &mut Ui, value: &mut f32, min: f32, max: f32, text: &str, hint: &str) -> bool {
    let response = ui
        .add(
            egui::Slider::new(value, min..=max)
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hint);
    if response.hovered() {
        response.request_focus();
    }
    let dragged = response.changed();
    dragged | apply_slider_arrow_acceleration(ui, &response, value, min, max)
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Chart Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (label or key)")
            .on_hover_text("Fuzzy-highlight matching bubbles without moving them.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        self.draw_density_controls(ui);

        ui.separator();
        self.draw_filter_controls(ui);

        ui.separator();
        self.draw_simulation_controls(ui);

        if let Some(error) = &self.engine_error {
            ui.separator();
            ui.colored_label(egui::Color32::from_rgb(230, 110, 110), error.as_str());
        }
    }

    fn draw_density_controls(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Density").strong());
        let mut density = self.tuning.density;
        ui.horizontal_wrapped(|ui| {
            for preset in DensityPreset::ALL {
                ui.selectable_value(&mut density, preset, preset.label())
                    .on_hover_text("Collision padding, repulsion and category pull bundle.");
            }
        });
        if density != self.tuning.density {
            self.with_engine(|engine| {
                engine.set_density(density);
                Ok(())
            });
            self.sync_tuning();
        }

        ui.collapsing("Motion tuning", |ui| {
            let mut tuning = self.tuning;
            let mut changed = false;
            changed |= tuning_slider(
                ui,
                &mut tuning.velocity_decay,
                0.05,
                0.9,
                "Velocity decay",
                "Fraction of velocity lost every tick; higher settles faster.",
            );
            changed |= tuning_slider(
                ui,
                &mut tuning.center_strength,
                0.0,
                0.3,
                "Category pull",
                "How strongly bubbles drift toward their category anchor.",
            );
            changed |= tuning_slider(
                ui,
                &mut tuning.collide_padding,
                0.0,
                20.0,
                "Collision padding",
                "Gap kept between neighbouring bubbles.",
            );
            changed |= tuning_slider(
                ui,
                &mut tuning.repulse_strength,
                0.0,
                1.0,
                "Collision strength",
                "How hard overlapping bubbles are pushed apart.",
            );
            changed |= tuning_slider(
                ui,
                &mut tuning.alpha_target,
                0.0,
                0.1,
                "Idle motion",
                "Energy floor the simulation cools toward.",
            );

            if changed {
                self.apply_patch(tuning_patch(&self.tuning, &tuning));
            }
        });
    }

    fn draw_filter_controls(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Grouping").strong());

        let (interactive, group_field, filtered_by) = match &self.engine {
            Some(engine) => (
                engine.config().interactive_filtering,
                engine.config().group_field.clone(),
                engine.filter().field().map(str::to_owned),
            ),
            None => (self.config.interactive_filtering, self.config.group_field.clone(), None),
        };

        let mut interactive_next = interactive;
        ui.checkbox(&mut interactive_next, "Click to cluster by group")
            .on_hover_text("Clicking a bubble gathers the chart around its group.");
        if interactive_next != interactive {
            self.apply_patch(MotionConfigPatch {
                interactive_filtering: Some(interactive_next),
                ..MotionConfigPatch::default()
            });
        }

        let mut group_field_next = group_field.clone();
        egui::ComboBox::from_label("Click grouping field")
            .selected_text(group_field_next.as_deref().unwrap_or("category"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut group_field_next, None, "category");
                for name in &self.field_names {
                    ui.selectable_value(&mut group_field_next, Some(name.clone()), name.as_str());
                }
            });
        if group_field_next != group_field {
            self.apply_patch(MotionConfigPatch {
                group_field: Some(group_field_next.unwrap_or_default()),
                ..MotionConfigPatch::default()
            });
        }

        ui.label("Cluster by");
        let mut requested = None;
        ui.horizontal_wrapped(|ui| {
            for name in &self.field_names {
                let active = filtered_by.as_deref() == Some(name.as_str());
                if ui.selectable_label(active, name.as_str()).clicked() {
                    requested = Some(Some(name.clone()));
                }
            }
        });
        let clear = ui.add_enabled(filtered_by.is_some(), egui::Button::new("Clear clustering"));
        if clear.clicked() {
            requested = Some(None);
        }

        if let Some(field) = requested {
            self.with_engine(|engine| engine.trigger_spatial_filter(field.as_deref()));
            if field.is_none() {
                self.selected = None;
            }
        }
    }

    fn draw_simulation_controls(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Simulation").strong());

        let live_before = self.live_motion;
        ui.checkbox(&mut self.live_motion, "Live motion")
            .on_hover_text("Advance the layout every frame.");
        if self.live_motion != live_before {
            let live = self.live_motion;
            self.with_engine(|engine| {
                if live {
                    engine.start();
                } else {
                    engine.stop();
                }
                Ok(())
            });
        }

        ui.horizontal(|ui| {
            if ui.button("Restart").clicked() {
                self.live_motion = true;
                self.with_engine(|engine| {
                    engine.start();
                    Ok(())
                });
            }
            if ui
                .button("Reset size scale")
                .on_hover_text("Forget the largest size seen so far and stop the simulation.")
                .clicked()
            {
                self.with_engine(|engine| {
                    engine.reset_size_domain();
                    Ok(())
                });
            }
        });

        ui.checkbox(&mut self.show_fps_bar, "FPS display");
    }
}

/// Patch carrying only the values that differ between `before` and `after`.
fn tuning_patch(before: &MotionTuning, after: &MotionTuning) -> MotionConfigPatch {
    let differs = |a: f32, b: f32| (a - b).abs() > f32::EPSILON;
    MotionConfigPatch {
        velocity_decay: differs(before.velocity_decay, after.velocity_decay)
            .then_some(after.velocity_decay),
        center_strength: differs(before.center_strength, after.center_strength)
            .then_some(after.center_strength),
        collide_padding: differs(before.collide_padding, after.collide_padding)
            .then_some(after.collide_padding),
        repulse_strength: differs(before.repulse_strength, after.repulse_strength)
            .then_some(after.repulse_strength),
        alpha_target: differs(before.alpha_target, after.alpha_target)
            .then_some(after.alpha_target),
        ..MotionConfigPatch::default()
    }
}
