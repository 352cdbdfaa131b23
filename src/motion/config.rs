use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{MotionError, MotionResult};

/// Named tuning bundle for collision and category forces.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DensityPreset {
    Sparse,
    #[default]
    Balanced,
    Dense,
    Compact,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityParams {
    pub repulse_strength: f32,
    pub center_strength: f32,
    pub collide_padding: f32,
}

impl DensityPreset {
    pub const ALL: [Self; 4] = [Self::Sparse, Self::Balanced, Self::Dense, Self::Compact];

    pub fn label(self) -> &'static str {
        match self {
            Self::Sparse => "sparse",
            Self::Balanced => "balanced",
            Self::Dense => "dense",
            Self::Compact => "compact",
        }
    }

    pub fn params(self) -> DensityParams {
        let (repulse_strength, center_strength, collide_padding) = match self {
            Self::Sparse => (1.0, 0.02, 12.0),
            Self::Balanced => (0.8, 0.05, 8.0),
            Self::Dense => (0.6, 0.08, 4.0),
            Self::Compact => (0.4, 0.12, 2.0),
        };

        DensityParams {
            repulse_strength,
            center_strength,
            collide_padding,
        }
    }

    /// One step toward a looser layout, stopping at `balanced`.
    pub fn relaxed(self) -> Self {
        match self {
            Self::Compact => Self::Dense,
            Self::Dense => Self::Balanced,
            other => other,
        }
    }
}

impl fmt::Display for DensityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Full engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Preset the collision and category values were last taken from.
    pub density: DensityPreset,
    /// Collision strength, clamped to `[0, 1]` when the force is built.
    pub repulse_strength: f32,
    /// Fraction of velocity removed per tick; higher is calmer.
    pub velocity_decay: f32,
    pub collide_padding: f32,
    /// Strength of the pull toward each node's category anchor.
    pub center_strength: f32,
    pub alpha_min: f32,
    pub alpha_target: f32,
    /// Energy the driver starts with.
    pub initial_alpha: f32,
    /// Sizes below this never reach the maximum radius on their own.
    pub min_size_domain: f32,
    pub interactive_filtering: bool,
    pub group_field: Option<String>,
    /// Normalized `[x, y]` anchors per category value.
    pub category_anchors: BTreeMap<String, [f32; 2]>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        let balanced = DensityPreset::Balanced.params();
        Self {
            density: DensityPreset::Balanced,
            repulse_strength: balanced.repulse_strength,
            velocity_decay: 0.2,
            collide_padding: balanced.collide_padding,
            center_strength: balanced.center_strength,
            alpha_min: 0.001,
            alpha_target: 0.01,
            initial_alpha: 0.6,
            min_size_domain: 100.0,
            interactive_filtering: true,
            group_field: None,
            category_anchors: BTreeMap::new(),
        }
    }
}

/// Partial update for [`MotionConfig`]; `None` leaves a value untouched.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotionConfigPatch {
    pub density: Option<DensityPreset>,
    pub repulse_strength: Option<f32>,
    #[serde(alias = "decay")]
    pub velocity_decay: Option<f32>,
    pub collide_padding: Option<f32>,
    pub center_strength: Option<f32>,
    pub alpha_min: Option<f32>,
    pub alpha_target: Option<f32>,
    pub initial_alpha: Option<f32>,
    pub min_size_domain: Option<f32>,
    pub interactive_filtering: Option<bool>,
    pub group_field: Option<String>,
    pub category_anchors: Option<BTreeMap<String, [f32; 2]>>,
}

impl MotionConfig {
    pub fn apply_density(&mut self, preset: DensityPreset) {
        self.density = preset;
        let params = preset.params();
        self.repulse_strength = params.repulse_strength;
        self.center_strength = params.center_strength;
        self.collide_padding = params.collide_padding;
    }

    /// Applies `patch` atomically: on error `self` is unchanged.
    ///
    /// A density preset in the patch is applied first so explicit values in
    /// the same patch override it.
    pub fn apply_patch(&mut self, patch: &MotionConfigPatch) -> MotionResult<()> {
        let mut next = self.clone();

        if let Some(preset) = patch.density {
            next.apply_density(preset);
        }
        if let Some(value) = patch.repulse_strength {
            next.repulse_strength = value;
        }
        if let Some(value) = patch.velocity_decay {
            next.velocity_decay = value;
        }
        if let Some(value) = patch.collide_padding {
            next.collide_padding = value;
        }
        if let Some(value) = patch.center_strength {
            next.center_strength = value;
        }
        if let Some(value) = patch.alpha_min {
            next.alpha_min = value;
        }
        if let Some(value) = patch.alpha_target {
            next.alpha_target = value;
        }
        if let Some(value) = patch.initial_alpha {
            next.initial_alpha = value;
        }
        if let Some(value) = patch.min_size_domain {
            next.min_size_domain = value;
        }
        if let Some(value) = patch.interactive_filtering {
            next.interactive_filtering = value;
        }
        if let Some(field) = &patch.group_field {
            let field = field.trim();
            next.group_field = (!field.is_empty()).then(|| field.to_owned());
        }
        if let Some(anchors) = &patch.category_anchors {
            next.category_anchors = anchors.clone();
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn validate(&self) -> MotionResult<()> {
        let finite = [
            ("repulse_strength", self.repulse_strength),
            ("velocity_decay", self.velocity_decay),
            ("collide_padding", self.collide_padding),
            ("center_strength", self.center_strength),
            ("alpha_min", self.alpha_min),
            ("alpha_target", self.alpha_target),
            ("initial_alpha", self.initial_alpha),
            ("min_size_domain", self.min_size_domain),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(MotionError::InvalidConfig(format!("{name} must be finite")));
            }
            if value < 0.0 {
                return Err(MotionError::InvalidConfig(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }

        if self.velocity_decay > 1.0 {
            return Err(MotionError::InvalidConfig(format!(
                "velocity_decay must be within [0, 1], got {}",
                self.velocity_decay
            )));
        }

        for (category, [x, y]) in &self.category_anchors {
            if !x.is_finite() || !y.is_finite() {
                return Err(MotionError::InvalidConfig(format!(
                    "anchor for category {category:?} must be finite"
                )));
            }
        }

        Ok(())
    }
}
