use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

const MIN_SEPARATION: f32 = 0.0001;

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    /// Charge strength already scaled by the current alpha.
    pub(super) strength: f32,
    pub(super) min_distance_sq: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) padding: f32,
}

/// Deterministic unit direction for two coincident nodes.
pub(super) fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

// Negative strength repels. Magnitude falls off with the inverse of distance.
fn charge_between(point: Vec2, other: Vec2, mass: f32, params: ChargeParams) -> Vec2 {
    let delta = other - point;
    let distance_sq = delta.length_sq().max(params.min_distance_sq);
    delta * (params.strength * mass / distance_sq)
}

pub(super) fn accumulate_charge_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    delta: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            let other = positions[other_index];
            if (point - other).length_sq() < MIN_SEPARATION {
                *delta += jiggle(index, other_index) * params.strength.abs().sqrt() * 0.01;
                continue;
            }
            *delta += charge_between(point, other, 1.0, params);
        }
        return;
    }

    let distance = (point - node.center_of_mass).length().max(MIN_SEPARATION);
    let can_approximate = !node.bounds.contains(point)
        && (node.bounds.side_length() / distance) < params.theta
        && node.mass > 1.0;

    if can_approximate {
        *delta += charge_between(point, node.center_of_mass, node.mass, params);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge_for_node(child, index, positions, params, delta);
    }
}

fn collide_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let offset = positions[from] - positions[to];
    let distance = offset.length();
    let min_distance = radii[from] + radii[to] + params.padding;
    if distance >= min_distance {
        return;
    }

    let direction = if distance > MIN_SEPARATION {
        offset / distance
    } else {
        jiggle(from, to)
    };
    let push = direction * ((min_distance - distance) * params.strength * 0.5);
    deltas[from] += push;
    deltas[to] -= push;
}

pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let reach = node_a.max_radius + node_b.max_radius + params.padding;
    if node_a.bounds.distance_sq_to(node_b.bounds) > reach * reach {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    collide_pair(from, to, positions, radii, params, deltas);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    collide_pair(from, to, positions, radii, params, deltas);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_deref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, deltas);

            for child_b in node_a.children[first + 1..].iter().flatten() {
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, deltas,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.size >= node_b.bounds.size
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, deltas);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, deltas);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_nodes_are_pushed_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(4.0, 0.0)];
        let radii = vec![5.0, 5.0];
        let tree = QuadNode::build(&positions, &radii).unwrap();
        let mut deltas = vec![Vec2::ZERO; 2];

        accumulate_collision_pairs(
            &tree,
            &tree,
            true,
            &positions,
            &radii,
            CollisionParams {
                strength: 1.0,
                padding: 2.0,
            },
            &mut deltas,
        );

        assert!(deltas[0].x < 0.0);
        assert!(deltas[1].x > 0.0);
        assert!((deltas[0] + deltas[1]).length() < 1e-5);
    }

    #[test]
    fn negative_charge_repels() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let radii = vec![1.0, 1.0];
        let tree = QuadNode::build(&positions, &radii).unwrap();
        let params = ChargeParams {
            strength: -30.0,
            min_distance_sq: 1.0,
            theta: 0.9,
        };

        let mut delta = Vec2::ZERO;
        accumulate_charge_for_node(&tree, 0, &positions, params, &mut delta);

        assert!(delta.x < 0.0);
        assert!((delta.length() - 3.0).abs() < 1e-4);
    }
}
