use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Square cell anchored at its top-left corner.
#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
    pub(super) min: Vec2,
    pub(super) size: f32,
}

impl QuadBounds {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (min, max) = rest
            .iter()
            .fold((*first, *first), |(min, max), point| (min.min(*point), max.max(*point)));
        if !(min.is_finite() && max.is_finite()) {
            return None;
        }

        let size = (max - min).max_elem().max(1.0) + 2.0;
        Some(Self {
            min: min - vec2(1.0, 1.0),
            size,
        })
    }

    fn max(self) -> Vec2 {
        self.min + vec2(self.size, self.size)
    }

    fn mid(self) -> Vec2 {
        self.min + vec2(self.size, self.size) * 0.5
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.min.x && point.y >= self.min.y && point.x <= max.x && point.y <= max.y
    }

    pub(super) fn side_length(self) -> f32 {
        self.size
    }

    /// Squared gap between two cells, zero when they touch or overlap.
    pub(super) fn distance_sq_to(self, other: Self) -> f32 {
        let gap = (other.min - self.max()).max(self.min - other.max()).max(Vec2::ZERO);
        gap.length_sq()
    }

    // 0 = top-left, 1 = top-right, 2 = bottom-left, 3 = bottom-right.
    fn quadrant_of(self, point: Vec2) -> usize {
        let mid = self.mid();
        usize::from(point.x >= mid.x) | (usize::from(point.y >= mid.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let half = self.size * 0.5;
        let column = (quadrant & 1) as f32;
        let row = (quadrant >> 1) as f32;
        Self {
            min: self.min + vec2(column * half, row * half),
            size: half,
        }
    }
}

/// Region quadtree over node positions. Each cell carries the centroid and
/// count of the nodes below it plus the largest collision radius inside.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) max_radius: f32,
    /// Non-empty only on leaves.
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2], radii: &[f32]) -> Option<Self> {
        let bounds = QuadBounds::enclosing(positions)?;
        let mut indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::subdivide(bounds, &mut indices, positions, radii, 0))
    }

    fn subdivide(
        bounds: QuadBounds,
        indices: &mut [usize],
        positions: &[Vec2],
        radii: &[f32],
        depth: usize,
    ) -> Self {
        let mass = indices.len() as f32;
        let sum = indices
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index]);
        let max_radius = indices
            .iter()
            .filter_map(|&index| radii.get(index).copied())
            .fold(0.0_f32, f32::max);

        let mut node = Self {
            bounds,
            center_of_mass: if mass > 0.0 { sum / mass } else { Vec2::ZERO },
            mass,
            max_radius,
            indices: Vec::new(),
            children: Default::default(),
        };

        // Sorting by quadrant turns each child's members into one contiguous run.
        indices.sort_unstable_by_key(|&index| bounds.quadrant_of(positions[index]));
        let first = indices.first().map(|&index| bounds.quadrant_of(positions[index]));
        let last = indices.last().map(|&index| bounds.quadrant_of(positions[index]));
        let splittable = first != last;

        if depth >= MAX_DEPTH || indices.len() <= LEAF_CAPACITY || !splittable {
            node.indices = indices.to_vec();
            return node;
        }

        let mut rest = indices;
        for quadrant in 0..4 {
            let run = rest
                .iter()
                .take_while(|&&index| bounds.quadrant_of(positions[index]) == quadrant)
                .count();
            let (members, tail) = std::mem::take(&mut rest).split_at_mut(run);
            rest = tail;
            if members.is_empty() {
                continue;
            }
            node.children[quadrant] = Some(Box::new(Self::subdivide(
                bounds.quadrant(quadrant),
                members,
                positions,
                radii,
                depth + 1,
            )));
        }
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_aggregate_mass_and_largest_radius() {
        let positions = (0..40)
            .map(|index| vec2((index % 8) as f32 * 30.0, (index / 8) as f32 * 30.0))
            .collect::<Vec<_>>();
        let mut radii = vec![4.0; positions.len()];
        radii[17] = 11.0;

        let tree = QuadNode::build(&positions, &radii).unwrap();

        assert_eq!(tree.mass, 40.0);
        assert_eq!(tree.max_radius, 11.0);
        assert!(!tree.is_leaf());
        assert!(tree.indices.is_empty());
        let child_mass: f32 = tree.children.iter().flatten().map(|child| child.mass).sum();
        assert_eq!(child_mass, 40.0);
        for point in &positions {
            assert!(tree.bounds.contains(*point));
        }
    }

    #[test]
    fn stacked_nodes_share_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 20];
        let radii = vec![3.0; 20];

        let tree = QuadNode::build(&positions, &radii).unwrap();

        assert!(tree.is_leaf());
        assert_eq!(tree.indices.len(), 20);
    }

    #[test]
    fn touching_cells_have_no_gap() {
        let a = QuadBounds {
            min: vec2(0.0, 0.0),
            size: 10.0,
        };
        let b = QuadBounds {
            min: vec2(10.0, 0.0),
            size: 10.0,
        };
        let c = QuadBounds {
            min: vec2(13.0, 14.0),
            size: 2.0,
        };

        assert_eq!(a.distance_sq_to(b), 0.0);
        assert_eq!(a.distance_sq_to(c), 9.0 + 16.0);
    }
}
