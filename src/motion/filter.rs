use std::collections::{BTreeMap, HashMap};
use std::f32::consts::TAU;
use std::time::Duration;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use super::MotionEngine;
use super::error::{MotionError, MotionResult};
use super::nodes::SimulationNode;
use crate::records::DataRecord;

/// Group for records without a value in the filter field.
pub const OTHER_GROUP: &str = "Other";
/// Field interactive selection groups by when none is configured.
pub const DEFAULT_GROUP_FIELD: &str = "category";
/// Group ring radius as a share of the canvas short side.
pub const FILTER_RING: f32 = 0.45;
/// Velocity decay while clustered. A hand-tuned value, heavier than the
/// default decay so groups settle quickly.
pub const FILTER_DECAY: f32 = 0.4;
const FILTER_TRANSITION: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    Unfiltered,
    Filtered {
        field: String,
    },
}

/// Spatial filter state exposed to the renderer.
#[derive(Clone, Debug, Default)]
pub struct FilterState {
    mode: FilterMode,
    active_group: Option<String>,
    groups: BTreeMap<String, Vec<String>>,
    anchors: BTreeMap<String, Vec2>,
    node_targets: HashMap<String, Vec2>,
    saved_decay: Option<f32>,
}

impl FilterState {
    pub fn mode(&self) -> &FilterMode {
        &self.mode
    }

    pub fn is_active(&self) -> bool {
        matches!(self.mode, FilterMode::Filtered { .. })
    }

    pub fn field(&self) -> Option<&str> {
        match &self.mode {
            FilterMode::Filtered { field } => Some(field),
            FilterMode::Unfiltered => None,
        }
    }

    /// Group picked through node selection, if any.
    pub fn active_group(&self) -> Option<&str> {
        self.active_group.as_deref()
    }

    /// Node keys per group value.
    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    /// Absolute anchor per group value.
    pub fn anchors(&self) -> &BTreeMap<String, Vec2> {
        &self.anchors
    }

    /// Group anchor per node key.
    pub(super) fn node_targets(&self) -> &HashMap<String, Vec2> {
        &self.node_targets
    }

    /// Velocity decay to restore on leaving the filter.
    pub(super) fn saved_decay_mut(&mut self) -> Option<&mut f32> {
        self.saved_decay.as_mut()
    }
}

pub fn group_of(record: &DataRecord, field: &str) -> String {
    record
        .field(field)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| OTHER_GROUP.to_owned())
}

pub fn group_nodes(nodes: &[SimulationNode], field: &str) -> BTreeMap<String, Vec<String>> {
    let mut groups = BTreeMap::<String, Vec<String>>::new();
    for node in nodes {
        groups
            .entry(group_of(&node.record, field))
            .or_default()
            .push(node.key.clone());
    }
    groups
}

/// Anchors evenly spaced on a ring around the canvas center. A single group
/// sits on the center itself.
pub fn group_anchors<'a>(
    groups: impl ExactSizeIterator<Item = &'a String>,
    size: Vec2,
) -> BTreeMap<String, Vec2> {
    let center = size * 0.5;
    let count = groups.len();
    if count == 1 {
        return groups.map(|group| (group.clone(), center)).collect();
    }

    let ring = FILTER_RING * size.x.min(size.y);
    let step = TAU / count.max(1) as f32;
    groups
        .enumerate()
        .map(|(index, group)| {
            let angle = index as f32 * step;
            (group.clone(), center + vec2(angle.cos(), angle.sin()) * ring)
        })
        .collect()
}

impl MotionEngine {
    /// Clusters nodes by `field`, or returns to the category layout on `None`.
    pub fn trigger_spatial_filter(&mut self, field: Option<&str>) -> MotionResult<()> {
        match field.map(str::trim).filter(|field| !field.is_empty()) {
            Some(field) => self.enter_filter(field.to_owned(), None),
            None => {
                self.clear_filter();
                Ok(())
            }
        }
    }

    /// Interactive selection: clusters by the selected node's group, or
    /// clears the filter on `None` or when that group is already active.
    pub fn select_node(&mut self, key: Option<&str>) -> MotionResult<()> {
        if !self.config.interactive_filtering {
            return Ok(());
        }
        let Some(key) = key else {
            self.clear_filter();
            return Ok(());
        };

        let field = self
            .config
            .group_field
            .clone()
            .unwrap_or_else(|| DEFAULT_GROUP_FIELD.to_owned());
        let Some(node) = self.node(key) else {
            debug!(key, "selected node is not in the simulation");
            return Ok(());
        };
        let group = group_of(&node.record, &field);

        if self.filter.field() == Some(field.as_str())
            && self.filter.active_group() == Some(group.as_str())
        {
            self.clear_filter();
            return Ok(());
        }
        self.enter_filter(field, Some(group))
    }

    fn enter_filter(&mut self, field: String, active_group: Option<String>) -> MotionResult<()> {
        if self.viewport.size().is_none() {
            return Err(MotionError::UninitializedCanvas);
        }

        if !self.filter.is_active() {
            self.filter.saved_decay = Some(self.driver.velocity_decay());
        }
        debug!(
            field = field.as_str(),
            group = active_group.as_deref().unwrap_or("-"),
            reentrant = self.filter.is_active(),
            "entering spatial filter"
        );

        self.filter.mode = FilterMode::Filtered { field };
        self.filter.active_group = active_group;
        self.refresh_filter_layout();
        self.rebuild_forces();

        self.driver.set_velocity_decay(FILTER_DECAY);
        self.driver.boost(FILTER_TRANSITION);
        self.driver.resume();
        Ok(())
    }

    fn clear_filter(&mut self) {
        if !self.filter.is_active() {
            return;
        }
        debug!("leaving spatial filter");

        let saved_decay = self.filter.saved_decay.take();
        self.filter = FilterState::default();
        self.rebuild_forces();

        self.driver
            .set_velocity_decay(saved_decay.unwrap_or(self.config.velocity_decay));
        self.driver.boost(FILTER_TRANSITION);
        self.driver.resume();
    }

    /// Regroups current nodes and recomputes group anchors for the canvas.
    pub(super) fn refresh_filter_layout(&mut self) {
        let Some(field) = self.filter.field() else {
            return;
        };
        let groups = group_nodes(&self.nodes, field);
        let anchors = self
            .viewport
            .size()
            .map(|size| group_anchors(groups.keys(), size))
            .unwrap_or_default();
        let node_targets = groups
            .iter()
            .filter_map(|(group, keys)| anchors.get(group).map(|anchor| (keys, *anchor)))
            .flat_map(|(keys, anchor)| keys.iter().map(move |key| (key.clone(), anchor)))
            .collect();

        self.filter.groups = groups;
        self.filter.anchors = anchors;
        self.filter.node_targets = node_targets;
    }
}
