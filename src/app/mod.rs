use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use tracing::{info, warn};

use bubble_motion::motion::{
    DensityPreset, MotionConfig, MotionEngine, ResizeDebouncer, SimulationNode, Viewport,
};
use bubble_motion::records::{DataRecord, RecordSource, load_records};

mod chart;
mod render_utils;
mod ui;

type LoadResult = Result<Vec<DataRecord>, String>;

pub struct BubbleChartApp {
    source: RecordSource,
    config: MotionConfig,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    source_label: String,
    records: Vec<DataRecord>,
    config: MotionConfig,
    viewport: Viewport,
    engine: Option<MotionEngine>,
    frame: Rc<RefCell<FrameBuffer>>,
    debouncer: ResizeDebouncer,
    engine_error: Option<String>,
    records_revision: u64,
    last_update: Option<UpdateCounts>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    selected: Option<String>,
    field_names: Vec<String>,
    live_motion: bool,
    tuning: MotionTuning,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

/// Keys, positions and radii from the engine's last commit. Entries at the
/// same index belong to the same node.
#[derive(Default)]
struct FrameBuffer {
    keys: Vec<String>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
}

impl FrameBuffer {
    fn store(&mut self, nodes: &[SimulationNode]) {
        self.keys.truncate(nodes.len());
        let kept = self.keys.len();
        for (slot, node) in self.keys.iter_mut().zip(nodes) {
            slot.clone_from(&node.key);
        }
        self.keys
            .extend(nodes[kept..].iter().map(|node| node.key.clone()));

        self.positions.clear();
        self.radii.clear();
        self.positions.extend(nodes.iter().map(SimulationNode::position));
        self.radii.extend(nodes.iter().map(|node| node.radius));
    }
}

struct SearchMatchCache {
    query: String,
    records_revision: u64,
    matches: Arc<HashSet<String>>,
}

#[derive(Clone, Copy)]
struct UpdateCounts {
    added: usize,
    updated: usize,
    removed: usize,
}

/// Slider-backed copy of the engine's tunable values.
#[derive(Clone, Copy, PartialEq)]
struct MotionTuning {
    density: DensityPreset,
    velocity_decay: f32,
    center_strength: f32,
    collide_padding: f32,
    repulse_strength: f32,
    alpha_target: f32,
}

impl MotionTuning {
    fn from_config(config: &MotionConfig) -> Self {
        Self {
            density: config.density,
            velocity_decay: config.velocity_decay,
            center_strength: config.center_strength,
            collide_padding: config.collide_padding,
            repulse_strength: config.repulse_strength,
            alpha_target: config.alpha_target,
        }
    }
}

impl BubbleChartApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: RecordSource,
        config: MotionConfig,
    ) -> Self {
        let state = Self::start_load(&source);
        Self {
            source,
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: &RecordSource) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();
        let source = source.clone();

        thread::spawn(move || {
            let result = load_records(&source).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: &RecordSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready_state(&self, records: Vec<DataRecord>) -> AppState {
        info!(source = %self.source, count = records.len(), "records loaded");
        AppState::Ready(Box::new(ViewModel::new(
            self.source.to_string(),
            records,
            self.config.clone(),
        )))
    }
}

enum Transition {
    Loaded(LoadResult),
    Retry,
}

impl eframe::App for BubbleChartApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(Transition::Loaded(result)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Transition::Loaded(Err(
                            "Background load worker disconnected".to_owned(),
                        )));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading records...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load records");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Transition::Retry);
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(&self.source));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(records)) => {
                            info!(count = records.len(), "records reloaded");
                            model.replace_records(records);
                        }
                        Ok(Err(error)) => {
                            warn!(%error, "reload failed");
                            model.engine_error = Some(error);
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            model.engine_error =
                                Some("Background load worker disconnected".to_owned());
                        }
                    }
                }
            }
        }

        if let Some(transition) = transition {
            self.reload_rx = None;
            self.state = match transition {
                Transition::Loaded(Ok(records)) => self.ready_state(records),
                Transition::Loaded(Err(error)) => AppState::Error(error),
                Transition::Retry => Self::start_load(&self.source),
            };
        }
    }
}
