use std::time::{Duration, Instant};

use eframe::egui::Vec2;
use tracing::debug;

use super::MotionEngine;
use super::config::DensityPreset;
use super::error::{MotionError, MotionResult};
use super::scale::RadiusRange;

pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);
const MOBILE_MAX_WIDTH: f32 = 768.0;
const TABLET_MAX_WIDTH: f32 = 1024.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    pub fn for_width(width: f32) -> Self {
        if width < MOBILE_MAX_WIDTH {
            Self::Mobile
        } else if width < TABLET_MAX_WIDTH {
            Self::Tablet
        } else {
            Self::Desktop
        }
    }

    pub fn transition(self) -> Duration {
        match self {
            Self::Mobile => Duration::from_millis(300),
            Self::Tablet | Self::Desktop => Duration::from_millis(500),
        }
    }

    /// Radius multiplier and minimum-radius floor.
    fn radius_boost(self) -> Option<(f32, f32)> {
        match self {
            Self::Mobile => Some((1.1, 12.0)),
            Self::Tablet => Some((1.05, 10.0)),
            Self::Desktop => None,
        }
    }
}

/// Preset for `count` nodes per million square pixels.
pub fn density_tier(count: usize, width: f32, height: f32) -> DensityPreset {
    let area = (width * height).max(1.0);
    let density = count as f32 / area * 1_000_000.0;
    if density < 0.5 {
        DensityPreset::Sparse
    } else if density < 1.5 {
        DensityPreset::Balanced
    } else if density < 3.0 {
        DensityPreset::Dense
    } else {
        DensityPreset::Compact
    }
}

/// Loosens `preset` on small viewports by at most one step.
pub fn clamp_for_viewport(preset: DensityPreset, size: Vec2) -> DensityPreset {
    match DeviceClass::for_width(size.x) {
        DeviceClass::Mobile => preset.relaxed(),
        DeviceClass::Tablet if size.y > size.x && preset == DensityPreset::Compact => {
            DensityPreset::Dense
        }
        DeviceClass::Tablet | DeviceClass::Desktop => preset,
    }
}

/// Enlarges radii for touch-sized screens without exceeding `limit`.
pub fn responsive_radius(range: RadiusRange, device: DeviceClass, limit: f32) -> RadiusRange {
    let Some((factor, floor)) = device.radius_boost() else {
        return range;
    };

    let min = (range.min * factor).max(floor);
    let max = (range.max * factor).max(min + 5.0);
    let max = max.round().min(limit.floor().max(1.0));
    let min = min.round().min(max);
    RadiusRange { min, max }
}

/// Coalesces a burst of canvas sizes into one recomputation.
#[derive(Clone, Debug)]
pub struct ResizeDebouncer {
    window: Duration,
    pending: Option<(Vec2, Instant)>,
    applied: Option<Vec2>,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE)
    }
}

impl ResizeDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            applied: None,
        }
    }

    /// Records the current size; unchanged sizes are ignored.
    pub fn observe(&mut self, size: Vec2, now: Instant) {
        let latest = self.pending.map(|(size, _)| size).or(self.applied);
        if latest == Some(size) {
            return;
        }
        if self.applied.is_none() && self.pending.is_none() {
            self.applied = Some(size);
            return;
        }
        self.pending = Some((size, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the settled size once no change arrived for a full window.
    pub fn poll(&mut self, now: Instant) -> Option<Vec2> {
        let (size, seen) = self.pending?;
        if now.saturating_duration_since(seen) < self.window {
            return None;
        }
        self.pending = None;
        self.applied = Some(size);
        Some(size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeOutcome {
    pub preset: DensityPreset,
    pub device: DeviceClass,
    pub range: RadiusRange,
}

impl MotionEngine {
    /// Re-tunes density, anchors, forces and radii for the current canvas.
    pub fn handle_resize(&mut self) -> MotionResult<ResizeOutcome> {
        let size = self.viewport.size().ok_or(MotionError::UninitializedCanvas)?;
        let device = DeviceClass::for_width(size.x);
        let tier = density_tier(self.nodes.len(), size.x, size.y);
        let preset = clamp_for_viewport(tier, size);

        self.config.apply_density(preset);

        let range = self.radius_range_for(size, self.nodes.len());
        self.scale.set_range(range);
        self.refresh_radii();
        self.refresh_filter_layout();
        self.rebuild_forces();

        self.driver.boost(device.transition());
        self.driver.resume();
        self.commit();

        debug!(
            width = size.x,
            height = size.y,
            ?device,
            %tier,
            %preset,
            min_radius = range.min,
            max_radius = range.max,
            "resized motion layout"
        );
        Ok(ResizeOutcome {
            preset,
            device,
            range,
        })
    }
}
