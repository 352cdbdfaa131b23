//! Force-directed bubble layout engine.
//!
//! A [`MotionEngine`] owns the nodes, the active [`ForceSet`] and the
//! [`Driver`]. The host feeds records with [`MotionEngine::update_nodes`],
//! calls [`MotionEngine::frame`] once per rendered frame and draws whatever
//! the commit sink receives.

mod anchors;
mod compose;
mod config;
mod driver;
mod error;
mod filter;
mod forces;
mod nodes;
mod quadtree;
mod resize;
mod scale;
mod viewport;

use std::time::{Duration, Instant};

use eframe::egui::Vec2;
use tracing::{debug, warn};

pub use anchors::CategoryAnchors;
pub use config::{DensityParams, DensityPreset, MotionConfig, MotionConfigPatch};
pub use driver::{Driver, REHEAT_ALPHA};
pub use error::{MotionError, MotionResult};
pub use filter::{FilterMode, FilterState, OTHER_GROUP, group_of};
pub use forces::{Force, ForceName, ForceSet};
pub use nodes::{DefaultKey, FieldKey, KeyStrategy, SimulationNode};
pub use resize::{
    DeviceClass, RESIZE_DEBOUNCE, ResizeDebouncer, ResizeOutcome, clamp_for_viewport,
    density_tier, responsive_radius,
};
pub use scale::{RadiusRange, SizeScale, count_scale_factor, density_aware_radius};
pub use viewport::Viewport;

use crate::records::DataRecord;
use nodes::{Placement, reconcile};

/// Frame length assumed when no previous frame time is known.
const DEFAULT_FRAME: Duration = Duration::from_millis(16);
pub const MIN_NODE_RADIUS: f32 = 1.0;
const DENSITY_TRANSITION: Duration = Duration::from_millis(500);

/// Receives the full node list after every tick.
pub trait PositionSink {
    fn commit(&mut self, nodes: &[SimulationNode]);
}

impl<F> PositionSink for F
where
    F: FnMut(&[SimulationNode]),
{
    fn commit(&mut self, nodes: &[SimulationNode]) {
        self(nodes);
    }
}

/// Result of one [`MotionEngine::update_nodes`] batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateSummary {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    /// Last state of nodes dropped by this batch, sorted by key.
    pub removed: Vec<SimulationNode>,
}

impl UpdateSummary {
    pub fn membership_changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

pub struct MotionEngine {
    viewport: Viewport,
    config: MotionConfig,
    keys: Box<dyn KeyStrategy>,
    nodes: Vec<SimulationNode>,
    forces: ForceSet,
    driver: Driver,
    scale: SizeScale,
    anchors: CategoryAnchors,
    filter: FilterState,
    sink: Option<Box<dyn PositionSink>>,
    halted_by_empty: bool,
    last_frame: Option<Instant>,
}

impl MotionEngine {
    /// Builds an idle engine; call [`start`](Self::start) to begin ticking.
    pub fn new(viewport: Viewport, config: MotionConfig) -> MotionResult<Self> {
        config.validate()?;
        let size = viewport.size().ok_or(MotionError::UninitializedCanvas)?;

        let mut engine = Self {
            keys: Box::new(DefaultKey),
            nodes: Vec::new(),
            forces: ForceSet::default(),
            driver: Driver::new(&config),
            scale: SizeScale::new(
                density_aware_radius(size.x, size.y, 0),
                config.min_size_domain,
            ),
            anchors: CategoryAnchors::from_config(&config.category_anchors),
            filter: FilterState::default(),
            sink: None,
            halted_by_empty: false,
            last_frame: None,
            viewport,
            config,
        };
        engine.rebuild_forces();
        Ok(engine)
    }

    pub fn with_key_strategy(mut self, keys: impl KeyStrategy + 'static) -> Self {
        self.keys = Box::new(keys);
        self
    }

    pub fn set_commit_sink(&mut self, sink: impl PositionSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    pub fn start(&mut self) {
        self.halted_by_empty = false;
        self.driver.start();
    }

    pub fn stop(&mut self) {
        self.driver.stop();
    }

    /// Stops ticking and releases the commit sink.
    pub fn dispose(mut self) {
        self.driver.stop();
        self.sink = None;
    }

    /// Host frame callback. Ticks once if running and a canvas is present.
    pub fn frame(&mut self, now: Instant) -> bool {
        let elapsed = self
            .last_frame
            .replace(now)
            .map_or(DEFAULT_FRAME, |last| now.saturating_duration_since(last));
        self.tick(elapsed)
    }

    /// One tick at the default frame length.
    pub fn step(&mut self) -> bool {
        self.tick(DEFAULT_FRAME)
    }

    fn tick(&mut self, elapsed: Duration) -> bool {
        let Some(center) = self.viewport.center() else {
            return false;
        };
        if !self.driver.is_running() {
            return false;
        }

        self.driver
            .tick(&mut self.nodes, &self.forces, elapsed, center);
        self.commit();
        true
    }

    fn commit(&mut self) {
        if self.viewport.size().is_none() {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.commit(&self.nodes);
        }
    }

    /// Reconciles the node set with a full replacement batch.
    ///
    /// Survivors keep their position and velocity. An empty batch clears the
    /// chart and halts the driver until the next non-empty batch.
    pub fn update_nodes(&mut self, records: Vec<DataRecord>) -> MotionResult<UpdateSummary> {
        let size = self.viewport.size().ok_or(MotionError::UninitializedCanvas)?;

        if records.is_empty() {
            let mut removed = std::mem::take(&mut self.nodes);
            removed.sort_by(|a, b| a.key.cmp(&b.key));
            if self.driver.is_running() {
                self.halted_by_empty = true;
            }
            self.driver.stop();
            self.refresh_filter_layout();
            self.commit();
            debug!(removed = removed.len(), "empty batch halted the motion layout");
            return Ok(UpdateSummary {
                removed,
                ..UpdateSummary::default()
            });
        }

        self.scale.observe(records.iter().map(|record| record.size));
        let range = self.radius_range_for(size, records.len());
        self.scale.set_range(range);
        let new_category = self.anchors.observe(
            records
                .iter()
                .filter_map(|record| record.category.as_deref()),
        );

        let absolute = self.anchors.absolute(size);
        let scale = &self.scale;
        let reconciled = reconcile(
            std::mem::take(&mut self.nodes),
            records,
            self.keys.as_ref(),
            |value| scale.radius(value).max(MIN_NODE_RADIUS),
            &Placement {
                size,
                anchors: &absolute,
            },
        );
        self.nodes = reconciled.nodes;
        let summary = UpdateSummary {
            added: reconciled.added,
            updated: reconciled.updated,
            removed: reconciled.removed,
        };

        if self.filter.is_active() {
            self.refresh_filter_layout();
            self.rebuild_forces();
        } else if new_category {
            self.rebuild_forces();
        } else {
            self.install_collision();
        }

        if self.halted_by_empty {
            self.halted_by_empty = false;
            self.driver.start();
        } else if summary.membership_changed() {
            self.driver.reheat(REHEAT_ALPHA);
        }
        self.commit();

        debug!(
            added = summary.added.len(),
            updated = summary.updated.len(),
            removed = summary.removed.len(),
            "reconciled motion nodes"
        );
        Ok(summary)
    }

    /// Applies a density preset without resetting node positions.
    pub fn set_density(&mut self, preset: DensityPreset) {
        debug!(%preset, "applying density preset");
        self.config.apply_density(preset);
        self.rebuild_forces();
        self.driver.boost(DENSITY_TRANSITION);
        self.driver.resume();
    }

    /// Merges `patch` into the configuration and rebuilds what depends on it.
    ///
    /// While a spatial filter is active, a new velocity decay takes effect
    /// when the filter is cleared.
    pub fn set_motion_config(&mut self, patch: &MotionConfigPatch) -> MotionResult<()> {
        self.config.apply_patch(patch)?;

        self.driver.configure(&self.config);
        match self.filter.saved_decay_mut() {
            Some(saved) => *saved = self.config.velocity_decay,
            None => self.driver.set_velocity_decay(self.config.velocity_decay),
        }

        self.anchors.set_explicit(&self.config.category_anchors);
        self.scale.set_domain_floor(self.config.min_size_domain);
        self.refresh_radii();
        self.rebuild_forces();
        self.driver.reheat(REHEAT_ALPHA);
        debug!(config = ?self.config, "motion config updated");
        Ok(())
    }

    /// Overrides one node's radius. Unknown keys are ignored.
    pub fn update_radius(&mut self, key: &str, radius: f32) -> bool {
        if !radius.is_finite() {
            warn!(key, radius, "ignoring non-finite radius");
            return false;
        }
        let Some(node) = self.nodes.iter_mut().find(|node| node.key == key) else {
            warn!(key, "update_radius called for unknown node");
            return false;
        };

        node.radius = radius.max(MIN_NODE_RADIUS);
        self.install_collision();
        self.commit();
        true
    }

    /// Forgets the accumulated size domain and rescales every node.
    ///
    /// Stops the driver; call [`start`](Self::start) to resume.
    pub fn reset_size_domain(&mut self) {
        self.driver.stop();
        self.scale.reset_domain();
        self.scale
            .observe(self.nodes.iter().map(|node| node.record.size));
        self.refresh_radii();
        self.install_collision();
        self.commit();
        debug!(domain = self.scale.domain(), "size domain reset");
    }

    fn refresh_radii(&mut self) {
        for node in &mut self.nodes {
            node.radius = self.scale.radius(node.record.size).max(MIN_NODE_RADIUS);
        }
    }

    fn radius_range_for(&self, size: Vec2, count: usize) -> RadiusRange {
        let range = density_aware_radius(size.x, size.y, count);
        let limit = size.x.min(size.y) / 4.0;
        responsive_radius(range, DeviceClass::for_width(size.x), limit)
    }

    pub fn nodes(&self) -> &[SimulationNode] {
        &self.nodes
    }

    pub fn node(&self, key: &str) -> Option<&SimulationNode> {
        self.nodes.iter().find(|node| node.key == key)
    }

    pub fn forces(&self) -> &ForceSet {
        &self.forces
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn density(&self) -> DensityPreset {
        self.config.density
    }

    pub fn radius_range(&self) -> RadiusRange {
        self.scale.range()
    }

    pub fn size_domain(&self) -> f32 {
        self.scale.domain()
    }

    pub fn alpha(&self) -> f32 {
        self.driver.alpha()
    }

    pub fn velocity_decay(&self) -> f32 {
        self.driver.velocity_decay()
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
}
