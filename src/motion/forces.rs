use std::collections::{BTreeMap, HashMap};
use std::f32::consts::TAU;
use std::fmt;
use std::rc::Rc;

use eframe::egui::{Vec2, vec2};

use super::nodes::SimulationNode;
use super::quadtree::QuadTree;
use super::viewport::Viewport;

pub const BOUNDARY_MARGIN: f32 = 20.0;
pub const BOUNDARY_CENTER_PULL: f32 = 0.02;
pub const BOUNDARY_STRENGTH: f32 = 1.0;
pub const FILTER_STRENGTH: f32 = 0.9;
pub const FILTER_COLLIDE_PADDING: f32 = 3.0;
pub const FILTER_COLLIDE_STRENGTH: f32 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ForceName {
    CategoryX,
    CategoryY,
    Collision,
    BoundaryX,
    BoundaryY,
    FilterX,
    FilterY,
}

impl ForceName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CategoryX => "category-x",
            Self::CategoryY => "category-y",
            Self::Collision => "collision",
            Self::BoundaryX => "boundary-x",
            Self::BoundaryY => "boundary-y",
            Self::FilterX => "filter-x",
            Self::FilterY => "filter-y",
        }
    }
}

impl fmt::Display for ForceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    fn of(self, point: Vec2) -> f32 {
        match self {
            Self::X => point.x,
            Self::Y => point.y,
        }
    }

    fn position(self, node: &SimulationNode) -> f32 {
        match self {
            Self::X => node.x,
            Self::Y => node.y,
        }
    }

    fn nudge(self, node: &mut SimulationNode, delta: f32) {
        match self {
            Self::X => node.vx += delta,
            Self::Y => node.vy += delta,
        }
    }

    fn pin(self, node: &mut SimulationNode, value: f32) {
        match self {
            Self::X => {
                node.x = value;
                node.vx = 0.0;
            }
            Self::Y => {
                node.y = value;
                node.vy = 0.0;
            }
        }
    }
}

/// Target coordinate for a node along one axis.
pub type TargetFn = Box<dyn Fn(&SimulationNode) -> f32>;

pub enum Force {
    /// Pulls each node's coordinate toward `target(node)`, scaled by alpha.
    Position {
        axis: Axis,
        strength: f32,
        target: TargetFn,
        /// Keeps nodes fully on the canvas after integration.
        contain: Option<Viewport>,
    },
    /// Separates circles closer than `radius + padding` each.
    Collide { padding: f32, strength: f32 },
}

impl fmt::Debug for Force {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position {
                axis,
                strength,
                contain,
                ..
            } => f
                .debug_struct("Position")
                .field("axis", axis)
                .field("strength", strength)
                .field("contain", &contain.is_some())
                .finish_non_exhaustive(),
            Self::Collide { padding, strength } => f
                .debug_struct("Collide")
                .field("padding", padding)
                .field("strength", strength)
                .finish(),
        }
    }
}

/// Reused buffers for per-tick force work.
#[derive(Debug, Default)]
pub(super) struct ForceScratch {
    predicted: Vec<Vec2>,
    tree: QuadTree,
}

impl Force {
    pub(super) fn apply(
        &self,
        nodes: &mut [SimulationNode],
        alpha: f32,
        scratch: &mut ForceScratch,
    ) {
        match self {
            Self::Position {
                axis,
                strength,
                target,
                ..
            } => {
                let gain = strength * alpha;
                for node in nodes.iter_mut() {
                    let delta = (target(node) - axis.position(node)) * gain;
                    axis.nudge(node, delta);
                }
            }
            Self::Collide { padding, strength } => {
                apply_collide(nodes, *padding, *strength, scratch);
            }
        }
    }

    /// Post-integration correction; only containing position forces act.
    pub(super) fn constrain(&self, nodes: &mut [SimulationNode]) {
        let Self::Position {
            axis,
            contain: Some(viewport),
            ..
        } = self
        else {
            return;
        };
        let Some(size) = viewport.size() else {
            return;
        };

        let extent = axis.of(size);
        for node in nodes.iter_mut() {
            let low = node.radius;
            let high = extent - node.radius;
            if low > high {
                continue;
            }
            let value = axis.position(node);
            if value < low {
                axis.pin(node, low);
            } else if value > high {
                axis.pin(node, high);
            }
        }
    }
}

fn apply_collide(
    nodes: &mut [SimulationNode],
    padding: f32,
    strength: f32,
    scratch: &mut ForceScratch,
) {
    if nodes.len() < 2 || strength <= 0.0 {
        return;
    }

    let ForceScratch { predicted, tree } = scratch;
    predicted.clear();
    predicted.extend(nodes.iter().map(|node| vec2(node.x + node.vx, node.y + node.vy)));
    let max_radius = nodes
        .iter()
        .map(|node| node.radius + padding)
        .fold(0.0_f32, f32::max);

    if !tree.rebuild(predicted) {
        return;
    }

    tree.visit_pairs(max_radius * 2.0, &mut |i, j| {
        let radius_i = nodes[i].radius + padding;
        let radius_j = nodes[j].radius + padding;
        let reach = radius_i + radius_j;

        let mut delta = predicted[i] - predicted[j];
        let mut distance_sq = delta.length_sq();
        if distance_sq >= reach * reach {
            return;
        }
        if distance_sq <= 1e-6 {
            let angle = ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * TAU;
            delta = vec2(angle.cos(), angle.sin()) * 1e-3;
            distance_sq = delta.length_sq();
        }

        let distance = distance_sq.sqrt();
        let push = delta * ((reach - distance) / distance * strength);
        let weight_i = radius_i * radius_i;
        let weight_j = radius_j * radius_j;
        let share = weight_j / (weight_i + weight_j);

        nodes[i].vx += push.x * share;
        nodes[i].vy += push.y * share;
        nodes[j].vx -= push.x * (1.0 - share);
        nodes[j].vy -= push.y * (1.0 - share);
    });
}

/// Ordered set of named forces. Forces are replaced, never edited.
#[derive(Debug, Default)]
pub struct ForceSet {
    forces: BTreeMap<ForceName, Force>,
}

impl ForceSet {
    pub fn install(&mut self, name: ForceName, force: Force) {
        self.forces.insert(name, force);
    }

    pub fn remove(&mut self, name: ForceName) -> Option<Force> {
        self.forces.remove(&name)
    }

    pub fn get(&self, name: ForceName) -> Option<&Force> {
        self.forces.get(&name)
    }

    pub fn contains(&self, name: ForceName) -> bool {
        self.forces.contains_key(&name)
    }

    pub fn names(&self) -> Vec<ForceName> {
        self.forces.keys().copied().collect()
    }

    pub fn clear(&mut self) {
        self.forces.clear();
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = &Force> {
        self.forces.values()
    }
}

/// Category pull toward canvas-scaled anchors, or the live center when a
/// node's category has none.
pub(super) fn category_force(
    axis: Axis,
    strength: f32,
    anchors: Rc<HashMap<String, Vec2>>,
    viewport: Viewport,
) -> Force {
    Force::Position {
        axis,
        strength,
        target: Box::new(move |node| {
            let anchor = node
                .record
                .category
                .as_ref()
                .and_then(|category| anchors.get(category))
                .copied()
                .or_else(|| viewport.center());
            anchor.map_or(axis.position(node), |anchor| axis.of(anchor))
        }),
        contain: None,
    }
}

/// Hard containment reading the live canvas size on every tick.
pub(super) fn boundary_force(axis: Axis, viewport: Viewport) -> Force {
    let live = viewport.clone();
    Force::Position {
        axis,
        strength: BOUNDARY_STRENGTH,
        target: Box::new(move |node| {
            let position = axis.position(node);
            let Some(size) = live.size() else {
                return position;
            };
            boundary_target(position, node.radius, axis.of(size))
        }),
        contain: Some(viewport),
    }
}

/// Nearest safe edge when outside `[r + margin, extent - r - margin]`,
/// otherwise a small step toward the center.
pub fn boundary_target(position: f32, radius: f32, extent: f32) -> f32 {
    let center = extent * 0.5;
    let low = radius + BOUNDARY_MARGIN;
    let high = extent - radius - BOUNDARY_MARGIN;
    if low > high {
        return center;
    }

    if position < low {
        low
    } else if position > high {
        high
    } else {
        position + (center - position) * BOUNDARY_CENTER_PULL
    }
}

pub(super) fn collision_force(padding: f32, strength: f32) -> Force {
    Force::Collide {
        padding: padding.max(0.0),
        strength: strength.clamp(0.0, 1.0),
    }
}

/// Pull toward each node's group anchor, resolved per node key when the
/// filter layout was refreshed. Unknown keys fall back to the live center.
pub(super) fn filter_force(
    axis: Axis,
    targets: Rc<HashMap<String, Vec2>>,
    viewport: Viewport,
) -> Force {
    Force::Position {
        axis,
        strength: FILTER_STRENGTH,
        target: Box::new(move |node| {
            targets
                .get(&node.key)
                .copied()
                .or_else(|| viewport.center())
                .map_or(axis.position(node), |anchor| axis.of(anchor))
        }),
        contain: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DataRecord;

    fn node(key: &str, x: f32, y: f32, radius: f32) -> SimulationNode {
        SimulationNode {
            key: key.to_owned(),
            record: DataRecord::new(key, 1.0),
            radius,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
        }
    }

    #[test]
    fn boundary_target_clamps_to_safe_edges() {
        assert_eq!(boundary_target(5.0, 10.0, 400.0), 30.0);
        assert_eq!(boundary_target(395.0, 10.0, 400.0), 370.0);
        assert_eq!(boundary_target(100.0, 10.0, 400.0), 102.0);
        assert_eq!(boundary_target(200.0, 10.0, 400.0), 200.0);
        assert_eq!(boundary_target(3.0, 90.0, 150.0), 75.0);
    }

    #[test]
    fn boundary_reads_live_canvas_size() {
        let viewport = Viewport::new(400.0, 300.0);
        let force = boundary_force(Axis::X, viewport.clone());
        let mut nodes = vec![node("a", 390.0, 150.0, 10.0)];
        let mut scratch = ForceScratch::default();

        force.apply(&mut nodes, 1.0, &mut scratch);
        assert_eq!(nodes[0].vx, 370.0 - 390.0);

        viewport.set_size(1000.0, 300.0);
        nodes[0].vx = 0.0;
        force.apply(&mut nodes, 1.0, &mut scratch);
        assert!(nodes[0].vx > 0.0, "now left of center, pulled right");
    }

    #[test]
    fn containment_pins_nodes_on_canvas() {
        let viewport = Viewport::new(200.0, 200.0);
        let force = boundary_force(Axis::Y, viewport);
        let mut nodes = vec![node("low", 50.0, -30.0, 12.0), node("high", 50.0, 199.0, 12.0)];
        nodes[0].vy = -4.0;

        force.constrain(&mut nodes);
        assert_eq!((nodes[0].y, nodes[0].vy), (12.0, 0.0));
        assert_eq!(nodes[1].y, 188.0);
    }

    #[test]
    fn category_pull_prefers_anchor_then_center() {
        let viewport = Viewport::new(400.0, 300.0);
        let anchors = Rc::new(HashMap::from([("hot".to_owned(), vec2(100.0, 50.0))]));
        let force = category_force(Axis::X, 0.5, anchors, viewport);
        let mut nodes = vec![node("a", 0.0, 0.0, 5.0), node("b", 0.0, 0.0, 5.0)];
        nodes[0].record.category = Some("hot".to_owned());
        let mut scratch = ForceScratch::default();

        force.apply(&mut nodes, 0.5, &mut scratch);
        assert_eq!(nodes[0].vx, 100.0 * 0.25);
        assert_eq!(nodes[1].vx, 200.0 * 0.25);
    }

    #[test]
    fn collision_pushes_overlapping_nodes_apart() {
        let mut nodes = vec![node("a", 100.0, 100.0, 10.0), node("b", 110.0, 100.0, 10.0)];
        let mut scratch = ForceScratch::default();

        collision_force(8.0, 0.8).apply(&mut nodes, 0.01, &mut scratch);
        assert!(nodes[0].vx < 0.0);
        assert!(nodes[1].vx > 0.0);
        assert!((nodes[0].vx + nodes[1].vx).abs() < 1e-4, "equal radii split evenly");
    }

    #[test]
    fn collision_separates_coincident_nodes() {
        let mut nodes = vec![node("a", 50.0, 50.0, 10.0), node("b", 50.0, 50.0, 10.0)];
        let mut scratch = ForceScratch::default();

        collision_force(0.0, 1.0).apply(&mut nodes, 1.0, &mut scratch);
        let separation = (nodes[0].velocity() - nodes[1].velocity()).length();
        assert!(separation > 1.0);
        assert!(nodes.iter().all(|node| node.vx.is_finite() && node.vy.is_finite()));
    }

    #[test]
    fn collision_strength_is_clamped() {
        let Force::Collide { strength, padding } = collision_force(-2.0, 3.0) else {
            panic!("expected collide force");
        };
        assert_eq!(strength, 1.0);
        assert_eq!(padding, 0.0);
    }

    #[test]
    fn force_set_replaces_by_name_in_stable_order() {
        let mut set = ForceSet::default();
        set.install(ForceName::Collision, collision_force(8.0, 0.8));
        set.install(ForceName::CategoryX, collision_force(1.0, 0.1));
        set.install(ForceName::Collision, collision_force(3.0, 0.9));

        assert_eq!(set.names(), vec![ForceName::CategoryX, ForceName::Collision]);
        assert!(matches!(
            set.get(ForceName::Collision),
            Some(Force::Collide { padding, .. }) if *padding == 3.0
        ));
        assert!(set.remove(ForceName::CategoryX).is_some());
        assert_eq!(set.len(), 1);
    }
}
