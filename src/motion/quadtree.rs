use eframe::egui::{Vec2, vec2};

const QUADTREE_LEAF_CAPACITY: usize = 8;
const QUADTREE_MAX_DEPTH: usize = 10;

#[derive(Clone, Copy, Debug)]
struct QuadBounds {
    center: Vec2,
    half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max - min).max(vec2(1.0, 1.0));
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: (span.x.max(span.y) * 0.5) + 1.0,
        })
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) + 2 * usize::from(point.y >= self.center.y)
    }

    /// Squared gap between two boxes, zero when they overlap.
    fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        (dx * dx) + (dy * dy)
    }
}

/// One tree cell. `start..end` indexes into [`QuadTree::order`]; only leaves
/// hand their points to the pair visitor.
#[derive(Clone, Copy, Debug)]
struct QuadCell {
    bounds: QuadBounds,
    start: usize,
    end: usize,
    children: [Option<usize>; 4],
}

impl QuadCell {
    fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Point quadtree used as the collision broad phase.
///
/// Cells live in a flat arena and points are partitioned in place, so
/// rebuilding every tick reuses the buffers of the previous tick.
#[derive(Debug, Default)]
pub(super) struct QuadTree {
    cells: Vec<QuadCell>,
    order: Vec<usize>,
}

impl QuadTree {
    /// Rebuilds the tree over `positions`. Returns `false` when there is
    /// nothing to index.
    pub(super) fn rebuild(&mut self, positions: &[Vec2]) -> bool {
        self.cells.clear();
        self.order.clear();
        let Some(bounds) = QuadBounds::from_points(positions) else {
            return false;
        };

        // Every split leaves at least two non-empty children, so a tree
        // over n points never needs more than 2n cells.
        self.cells.reserve(positions.len() * 2 + 1);
        self.order.extend(0..positions.len());
        self.cells.push(QuadCell {
            bounds,
            start: 0,
            end: positions.len(),
            children: [None; 4],
        });
        self.split(0, positions, 0);
        true
    }

    fn split(&mut self, cell: usize, positions: &[Vec2], depth: usize) {
        let QuadCell {
            bounds, start, end, ..
        } = self.cells[cell];
        if depth >= QUADTREE_MAX_DEPTH || end - start <= QUADTREE_LEAF_CAPACITY {
            return;
        }

        let points = &mut self.order[start..end];
        points.sort_unstable_by_key(|&index| bounds.quadrant_for(positions[index]));

        let mut counts = [0usize; 4];
        for &index in points.iter() {
            counts[bounds.quadrant_for(positions[index])] += 1;
        }
        if counts.iter().filter(|&&count| count > 0).count() <= 1 {
            return;
        }

        let mut child_start = start;
        for (quadrant, count) in counts.into_iter().enumerate() {
            if count == 0 {
                continue;
            }
            let child = self.cells.len();
            self.cells.push(QuadCell {
                bounds: bounds.child(quadrant),
                start: child_start,
                end: child_start + count,
                children: [None; 4],
            });
            self.cells[cell].children[quadrant] = Some(child);
            self.split(child, positions, depth + 1);
            child_start += count;
        }
    }

    /// Calls `visit(i, j)` once for every pair whose cells lie within
    /// `reach` of each other. Pairs farther apart than `reach` may be skipped.
    pub(super) fn visit_pairs(&self, reach: f32, visit: &mut impl FnMut(usize, usize)) {
        if self.cells.is_empty() {
            return;
        }
        self.visit_between(0, 0, reach * reach, visit);
    }

    fn points(&self, cell: &QuadCell) -> &[usize] {
        &self.order[cell.start..cell.end]
    }

    fn visit_between(
        &self,
        a: usize,
        b: usize,
        reach_sq: f32,
        visit: &mut impl FnMut(usize, usize),
    ) {
        let cell_a = &self.cells[a];
        let cell_b = &self.cells[b];
        let same_cell = a == b;
        if !same_cell && cell_a.bounds.gap_sq(cell_b.bounds) > reach_sq {
            return;
        }

        if cell_a.is_leaf() && cell_b.is_leaf() {
            let points_a = self.points(cell_a);
            if same_cell {
                for (offset, &first) in points_a.iter().enumerate() {
                    for &second in &points_a[offset + 1..] {
                        visit(first, second);
                    }
                }
            } else {
                for &first in points_a {
                    for &second in self.points(cell_b) {
                        visit(first, second);
                    }
                }
            }
            return;
        }

        if same_cell {
            let children = cell_a.children;
            for first in 0..4 {
                let Some(child_a) = children[first] else {
                    continue;
                };
                self.visit_between(child_a, child_a, reach_sq, visit);
                for child_b in children[first + 1..].iter().flatten() {
                    self.visit_between(child_a, *child_b, reach_sq, visit);
                }
            }
            return;
        }

        let split_a = if cell_a.is_leaf() {
            false
        } else if cell_b.is_leaf() {
            true
        } else {
            cell_a.bounds.half_extent >= cell_b.bounds.half_extent
        };

        if split_a {
            for child in cell_a.children.iter().flatten() {
                self.visit_between(*child, b, reach_sq, visit);
            }
        } else {
            for child in cell_b.children.iter().flatten() {
                self.visit_between(a, *child, reach_sq, visit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn close_pairs_brute(positions: &[Vec2], reach: f32) -> HashSet<(usize, usize)> {
        let mut pairs = HashSet::new();
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                if (positions[i] - positions[j]).length() <= reach {
                    pairs.insert((i, j));
                }
            }
        }
        pairs
    }

    #[test]
    fn empty_input_builds_nothing() {
        let mut tree = QuadTree::default();
        assert!(!tree.rebuild(&[]));

        let mut count = 0usize;
        tree.visit_pairs(10.0, &mut |_, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn visits_every_close_pair_exactly_once() {
        let positions = (0..120)
            .map(|index| {
                let angle = index as f32 * 0.618_034 * std::f32::consts::TAU;
                let radius = 4.0 * index as f32;
                vec2(angle.cos() * radius, angle.sin() * radius)
            })
            .collect::<Vec<_>>();
        let reach = 60.0;
        let mut tree = QuadTree::default();
        assert!(tree.rebuild(&positions));

        let mut seen = HashSet::new();
        let mut duplicates = 0usize;
        tree.visit_pairs(reach, &mut |a, b| {
            let pair = (a.min(b), a.max(b));
            if !seen.insert(pair) {
                duplicates += 1;
            }
        });

        assert_eq!(duplicates, 0);
        for pair in close_pairs_brute(&positions, reach) {
            assert!(seen.contains(&pair), "missing close pair {pair:?}");
        }
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 20];
        let mut tree = QuadTree::default();
        assert!(tree.rebuild(&positions));

        let mut count = 0usize;
        tree.visit_pairs(1.0, &mut |_, _| count += 1);
        assert_eq!(count, 20 * 19 / 2);
    }

    #[test]
    fn rebuilding_keeps_buffers_and_forgets_old_points() {
        let spread = (0..64)
            .map(|index| vec2((index % 8) as f32 * 30.0, (index / 8) as f32 * 30.0))
            .collect::<Vec<_>>();
        let mut tree = QuadTree::default();
        assert!(tree.rebuild(&spread));
        let cell_capacity = tree.cells.capacity();
        let order_capacity = tree.order.capacity();
        assert!(tree.cells.len() <= spread.len() * 2 + 1);

        let pair = vec![vec2(0.0, 0.0), vec2(1.0, 0.0)];
        assert!(tree.rebuild(&pair));
        assert_eq!(tree.cells.capacity(), cell_capacity);
        assert_eq!(tree.order.capacity(), order_capacity);

        let mut pairs = Vec::new();
        tree.visit_pairs(5.0, &mut |a, b| pairs.push((a.min(b), a.max(b))));
        assert_eq!(pairs, vec![(0, 1)]);
    }
}
