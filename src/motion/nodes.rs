use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::records::DataRecord;
use crate::util::stable_pair;

/// Simulation entity for one record.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationNode {
    pub key: String,
    pub record: DataRecord,
    pub radius: f32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl SimulationNode {
    pub fn position(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    pub fn velocity(&self) -> Vec2 {
        vec2(self.vx, self.vy)
    }
}

/// Derives the identity key of a record.
pub trait KeyStrategy {
    fn key_for(&self, record: &DataRecord) -> String;
}

/// `id`, then `label`, then the record's JSON serialization.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultKey;

impl KeyStrategy for DefaultKey {
    fn key_for(&self, record: &DataRecord) -> String {
        if let Some(id) = record.id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_owned();
        }
        if !record.label.is_empty() {
            return record.label.clone();
        }
        serde_json::to_string(record).unwrap_or_else(|_| format!("{record:?}"))
    }
}

/// Uses a named field as the key, falling back to [`DefaultKey`].
#[derive(Clone, Debug)]
pub struct FieldKey(pub String);

impl KeyStrategy for FieldKey {
    fn key_for(&self, record: &DataRecord) -> String {
        record
            .field(&self.0)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DefaultKey.key_for(record))
    }
}

/// Where new nodes are seeded.
pub(crate) struct Placement<'a> {
    pub(crate) size: Vec2,
    /// Absolute anchor per category value.
    pub(crate) anchors: &'a HashMap<String, Vec2>,
}

pub(crate) struct Reconciled {
    pub(crate) nodes: Vec<SimulationNode>,
    pub(crate) added: Vec<String>,
    pub(crate) updated: Vec<String>,
    pub(crate) removed: Vec<SimulationNode>,
}

/// Matches `records` against `previous` by key.
///
/// Survivors keep position and velocity and come first in batch order; new
/// nodes are appended. A key repeated within the batch keeps its first slot
/// and the last record's data.
pub(crate) fn reconcile(
    previous: Vec<SimulationNode>,
    records: Vec<DataRecord>,
    keys: &dyn KeyStrategy,
    radius_of: impl Fn(f32) -> f32,
    placement: &Placement<'_>,
) -> Reconciled {
    let mut batch: Vec<(String, DataRecord)> = Vec::with_capacity(records.len());
    let mut slot_by_key: HashMap<String, usize> = HashMap::with_capacity(records.len());
    for record in records {
        let key = keys.key_for(&record);
        if let Some(&slot) = slot_by_key.get(&key) {
            batch[slot].1 = record;
        } else {
            slot_by_key.insert(key.clone(), batch.len());
            batch.push((key, record));
        }
    }

    let mut prior_nodes = previous
        .into_iter()
        .map(|node| (node.key.clone(), node))
        .collect::<HashMap<_, _>>();

    let mut nodes = Vec::with_capacity(batch.len());
    let mut fresh = Vec::new();
    let mut updated = Vec::new();
    for (key, record) in batch {
        let radius = radius_of(record.size);
        if let Some(mut node) = prior_nodes.remove(&key) {
            node.record = record;
            node.radius = radius;
            updated.push(key);
            nodes.push(node);
        } else {
            fresh.push(seed_node(key, record, radius, placement));
        }
    }

    let added = fresh.iter().map(|node| node.key.clone()).collect();
    nodes.extend(fresh);

    let mut removed = prior_nodes.into_values().collect::<Vec<_>>();
    removed.sort_by(|a, b| a.key.cmp(&b.key));

    Reconciled {
        nodes,
        added,
        updated,
        removed,
    }
}

fn seed_node(
    key: String,
    record: DataRecord,
    radius: f32,
    placement: &Placement<'_>,
) -> SimulationNode {
    let anchor = record
        .category
        .as_ref()
        .and_then(|category| placement.anchors.get(category))
        .copied()
        .unwrap_or(placement.size * 0.5);

    // Nodes sharing an anchor must not start coincident.
    let (jx, jy) = stable_pair(&key);
    let spread = radius * 0.5;
    let x = clamp_into_canvas(anchor.x + jx * spread, radius, placement.size.x);
    let y = clamp_into_canvas(anchor.y + jy * spread, radius, placement.size.y);

    SimulationNode {
        key,
        record,
        radius,
        x,
        y,
        vx: 0.0,
        vy: 0.0,
    }
}

/// Clamps into `[r + pad, extent - r - pad]`, centering when that is empty.
pub(crate) fn clamp_into_canvas(value: f32, radius: f32, extent: f32) -> f32 {
    let padding = (radius * 0.1).max(5.0);
    let low = radius + padding;
    let high = extent - radius - padding;
    if low > high {
        extent * 0.5
    } else {
        value.clamp(low, high)
    }
}
