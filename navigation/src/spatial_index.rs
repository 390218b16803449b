//! Static k-d tree answering nearest-neighbour queries over 2D points.

use std::collections::BTreeSet;

use warden_core::Point;

/// Result of a nearest-neighbour query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
    /// Position of the matched point in the slice the index was built from.
    pub slot: usize,
    /// Coordinates of the matched point.
    pub point: Point,
    /// Squared distance between the query target and the matched point.
    pub distance_squared: f32,
}

impl Nearest {
    fn precedes(&self, other: &Self) -> bool {
        if self.distance_squared != other.distance_squared {
            return self.distance_squared < other.distance_squared;
        }

        self.slot < other.slot
    }
}

/// Immutable k-d tree built once over a point set.
///
/// Nodes alternate their splitting axis by depth, starting with `x` at the
/// root. Points in a left subtree never exceed the splitting coordinate and
/// points in a right subtree never fall below it. Queries may filter
/// candidates by slot without rebuilding the tree, which lets callers retry
/// against a shrinking candidate set within a single planning episode.
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    root: Option<Box<Node>>,
    len: usize,
}

impl SpatialIndex {
    /// Builds an index over the provided points in `O(n log n)`.
    ///
    /// Slots reported by queries are positions within `points`. Duplicate
    /// points are kept and remain individually reachable. An empty slice
    /// produces an empty index.
    #[must_use]
    pub fn build(points: &[Point]) -> Self {
        let mut entries: Vec<IndexedPoint> = points
            .iter()
            .copied()
            .enumerate()
            .map(|(slot, point)| IndexedPoint { slot, point })
            .collect();

        Self {
            root: build_node(&mut entries, 0),
            len: points.len(),
        }
    }

    /// Number of points stored in the index.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Reports whether the index contains no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Finds the point closest to `target`.
    ///
    /// Equidistant candidates resolve to the lowest slot.
    #[must_use]
    pub fn nearest(&self, target: Point) -> Option<Nearest> {
        self.nearest_where(target, |_| true)
    }

    /// Finds the point closest to `target` whose slot is not in `excluded`.
    #[must_use]
    pub fn nearest_excluding(&self, target: Point, excluded: &BTreeSet<usize>) -> Option<Nearest> {
        self.nearest_where(target, |slot| !excluded.contains(&slot))
    }

    /// Finds the point closest to `target` among the slots accepted by `accept`.
    #[must_use]
    pub fn nearest_where<F>(&self, target: Point, accept: F) -> Option<Nearest>
    where
        F: Fn(usize) -> bool,
    {
        let root = self.root.as_deref()?;
        let mut best = None;
        search(root, target, &accept, &mut best);
        best
    }
}

#[derive(Clone, Copy, Debug)]
struct IndexedPoint {
    slot: usize,
    point: Point,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn for_depth(depth: usize) -> Self {
        if depth % 2 == 0 {
            Self::X
        } else {
            Self::Y
        }
    }

    fn coordinate(self, point: Point) -> f32 {
        match self {
            Self::X => point.x(),
            Self::Y => point.y(),
        }
    }
}

#[derive(Clone, Debug)]
struct Node {
    point: Point,
    slot: usize,
    axis: Axis,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

fn build_node(entries: &mut [IndexedPoint], depth: usize) -> Option<Box<Node>> {
    if entries.is_empty() {
        return None;
    }

    let axis = Axis::for_depth(depth);
    entries.sort_by(|a, b| axis.coordinate(a.point).total_cmp(&axis.coordinate(b.point)));

    let median = entries.len() / 2;
    let pivot = entries[median];
    let (left, rest) = entries.split_at_mut(median);
    let right = &mut rest[1..];

    Some(Box::new(Node {
        point: pivot.point,
        slot: pivot.slot,
        axis,
        left: build_node(left, depth + 1),
        right: build_node(right, depth + 1),
    }))
}

fn search<F>(node: &Node, target: Point, accept: &F, best: &mut Option<Nearest>)
where
    F: Fn(usize) -> bool,
{
    if accept(node.slot) {
        let candidate = Nearest {
            slot: node.slot,
            point: node.point,
            distance_squared: node.point.distance_squared(target),
        };
        if best.map_or(true, |current| candidate.precedes(&current)) {
            *best = Some(candidate);
        }
    }

    let delta = node.axis.coordinate(target) - node.axis.coordinate(node.point);
    let (near, far) = if delta <= 0.0 {
        (&node.left, &node.right)
    } else {
        (&node.right, &node.left)
    };

    if let Some(near) = near.as_deref() {
        search(near, target, accept, best);
    }

    // Every point beyond the splitting line is at least `delta` away.
    // Equality still descends so ties resolve to the lowest slot.
    if let Some(far) = far.as_deref() {
        let plane_distance_squared = delta * delta;
        if best.map_or(true, |current| plane_distance_squared <= current.distance_squared) {
            search(far, target, accept, best);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(points: &[Point], target: Point, excluded: &BTreeSet<usize>) -> Option<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(slot, _)| !excluded.contains(slot))
            .min_by(|(a_slot, a), (b_slot, b)| {
                a.distance_squared(target)
                    .total_cmp(&b.distance_squared(target))
                    .then(a_slot.cmp(&b_slot))
            })
            .map(|(slot, _)| slot)
    }

    fn assert_split_invariant(node: &Node) {
        let pivot = node.axis.coordinate(node.point);
        if let Some(left) = node.left.as_deref() {
            for point in collect(left) {
                assert!(node.axis.coordinate(point) <= pivot);
            }
            assert_split_invariant(left);
        }
        if let Some(right) = node.right.as_deref() {
            for point in collect(right) {
                assert!(node.axis.coordinate(point) >= pivot);
            }
            assert_split_invariant(right);
        }
    }

    fn collect(node: &Node) -> Vec<Point> {
        let mut out = vec![node.point];
        if let Some(left) = node.left.as_deref() {
            out.extend(collect(left));
        }
        if let Some(right) = node.right.as_deref() {
            out.extend(collect(right));
        }
        out
    }

    fn grid() -> Vec<Point> {
        let mut points = Vec::new();
        for column in 0..6 {
            for row in 0..5 {
                points.push(Point::new(column as f32 * 1.5, row as f32 * 2.0 - 3.0));
            }
        }
        points
    }

    #[test]
    fn empty_index_answers_nothing() {
        let index = SpatialIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.nearest(Point::ORIGIN), None);
    }

    #[test]
    fn single_point_is_always_nearest() {
        let index = SpatialIndex::build(&[Point::new(4.0, -2.0)]);
        let nearest = index.nearest(Point::new(-100.0, 50.0)).expect("one point");
        assert_eq!(nearest.slot, 0);
        assert_eq!(nearest.point, Point::new(4.0, -2.0));
    }

    #[test]
    fn axes_alternate_and_split_invariant_holds() {
        let index = SpatialIndex::build(&grid());
        let root = index.root.as_deref().expect("root");
        assert_eq!(root.axis, Axis::X);
        if let Some(child) = root.left.as_deref() {
            assert_eq!(child.axis, Axis::Y);
        }
        assert_split_invariant(root);
        assert_eq!(collect(root).len(), index.len());
    }

    #[test]
    fn nearest_matches_brute_force_on_grid() {
        let points = grid();
        let index = SpatialIndex::build(&points);
        let none = BTreeSet::new();
        for target in [
            Point::new(0.1, 0.1),
            Point::new(3.7, -2.2),
            Point::new(20.0, 20.0),
            Point::new(-5.0, 1.0),
            Point::new(2.25, 1.0),
        ] {
            let nearest = index.nearest(target).expect("non-empty");
            assert_eq!(Some(nearest.slot), brute_force(&points, target, &none));
        }
    }

    #[test]
    fn duplicates_stay_reachable() {
        let points = vec![
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(5.0, 5.0),
        ];
        let index = SpatialIndex::build(&points);

        let first = index.nearest(Point::new(1.0, 1.2)).expect("point");
        assert_eq!(first.slot, 0);

        let excluded: BTreeSet<usize> = [0].into_iter().collect();
        let second = index
            .nearest_excluding(Point::new(1.0, 1.2), &excluded)
            .expect("duplicate");
        assert_eq!(second.slot, 1);
        assert_eq!(second.point, first.point);
    }

    #[test]
    fn exclusion_of_everything_yields_none() {
        let points = grid();
        let index = SpatialIndex::build(&points);
        let excluded: BTreeSet<usize> = (0..points.len()).collect();
        assert_eq!(index.nearest_excluding(Point::ORIGIN, &excluded), None);
    }

    #[test]
    fn filter_predicate_restricts_candidates() {
        let points = grid();
        let index = SpatialIndex::build(&points);
        let even = index
            .nearest_where(Point::new(1.4, -3.0), |slot| slot % 2 == 0)
            .expect("even slot");
        assert_eq!(even.slot % 2, 0);
    }
}
