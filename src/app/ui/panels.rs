use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use eframe::egui::{self, Align, Context, Layout};

use bubble_motion::motion::{MotionConfig, ResizeDebouncer, Viewport};
use bubble_motion::records::DataRecord;

use super::super::chart::field_names;
use super::super::{FrameBuffer, MotionTuning, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(
        source_label: String,
        records: Vec<DataRecord>,
        config: MotionConfig,
    ) -> Self {
        let tuning = MotionTuning::from_config(&config);

        Self {
            source_label,
            field_names: field_names(&records),
            records,
            config,
            viewport: Viewport::detached(),
            engine: None,
            frame: Rc::new(RefCell::new(FrameBuffer::default())),
            debouncer: ResizeDebouncer::default(),
            engine_error: None,
            records_revision: 0,
            last_update: None,
            search: String::new(),
            search_match_cache: None,
            selected: None,
            live_motion: true,
            tuning,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("bubble-motion");
                    ui.separator();
                    ui.label(format!("source: {}", self.source_label));
                    ui.label(format!("records: {}", self.records.len()));
                    ui.label(format!("density: {}", self.tuning.density));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload records"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                        if is_loading {
                            ui.spinner();
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_chart(ui));
    }
}
