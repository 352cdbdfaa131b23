use std::f32::consts::PI;

/// Share of the canvas area the bubbles aim to cover.
const TARGET_COVERAGE: f32 = 0.8;
const MIN_RADIUS_FLOOR: f32 = 8.0;
const MIN_RADIUS_SHARE: f32 = 0.15;
const MIN_RADIUS_SPREAD: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusRange {
    pub min: f32,
    pub max: f32,
}

pub fn count_scale_factor(count: usize) -> f32 {
    match count {
        0..=3 => 1.8,
        4..=6 => 1.5,
        7..=12 => 1.2,
        13..=20 => 1.0,
        _ => 0.8,
    }
}

/// Radius bounds for `count` bubbles on a `width` x `height` canvas.
///
/// Results are whole pixels and `max` never exceeds a quarter of the short
/// side, even when that squeezes the usual `min + 5` spread.
pub fn density_aware_radius(width: f32, height: f32, count: usize) -> RadiusRange {
    let short_side = width.min(height).max(0.0);
    let quarter = short_side / 4.0;
    let target_area = TARGET_COVERAGE * width.max(0.0) * height.max(0.0);
    let average = (target_area / count.max(1) as f32 / PI).sqrt();

    let mut max = (average * count_scale_factor(count)).min(quarter);
    let min = (max * MIN_RADIUS_SHARE).max(MIN_RADIUS_FLOOR);
    if max < min + MIN_RADIUS_SPREAD {
        max = min + MIN_RADIUS_SPREAD;
    }

    let limit = quarter.floor().max(1.0);
    let max = max.round().min(limit);
    let min = min.round().min(max).max(1.0);
    RadiusRange { min, max }
}

/// Square-root size scale over an accumulated size domain.
#[derive(Clone, Debug)]
pub struct SizeScale {
    range: RadiusRange,
    domain_floor: f32,
    observed_max: f32,
}

impl SizeScale {
    pub fn new(range: RadiusRange, domain_floor: f32) -> Self {
        Self {
            range,
            domain_floor: domain_floor.max(0.0),
            observed_max: 0.0,
        }
    }

    pub fn range(&self) -> RadiusRange {
        self.range
    }

    pub fn set_range(&mut self, range: RadiusRange) {
        self.range = range;
    }

    pub fn set_domain_floor(&mut self, floor: f32) {
        self.domain_floor = floor.max(0.0);
    }

    /// Widens the domain to cover `sizes`; it never shrinks on its own.
    pub fn observe(&mut self, sizes: impl IntoIterator<Item = f32>) {
        for size in sizes {
            if size.is_finite() && size > self.observed_max {
                self.observed_max = size;
            }
        }
    }

    pub fn reset_domain(&mut self) {
        self.observed_max = 0.0;
    }

    pub fn domain(&self) -> f32 {
        self.observed_max.max(self.domain_floor)
    }

    pub fn radius(&self, size: f32) -> f32 {
        let domain = self.domain();
        let share = if domain > 0.0 {
            (size.max(0.0) / domain).sqrt()
        } else {
            0.0
        };
        let share = if share.is_finite() {
            share.clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.range.min + (self.range.max - self.range.min) * share
    }
}
