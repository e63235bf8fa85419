mod forces;
mod quadtree;
mod schedule;

use eframe::egui::Vec2;

use forces::{
    ChargeParams, CollisionParams, accumulate_charge_for_node, accumulate_collision_pairs, jiggle,
};
use quadtree::QuadNode;
pub(in crate::app) use schedule::LayoutSession;

const BARNES_HUT_THETA: f32 = 0.9;
const ALPHA_MIN: f32 = 0.001;
const SETTLE_TICKS: f32 = 300.0;
pub(in crate::app) const DRAG_ALPHA_TARGET: f32 = 0.3;
pub(in crate::app) const REHEAT_ALPHA: f32 = 0.5;

/// User-facing layout tuning, edited from the controls panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct PhysicsConfig {
    pub(in crate::app) charge_scale: f32,
    pub(in crate::app) link_distance: f32,
    pub(in crate::app) collision_padding: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            charge_scale: 1.0,
            link_distance: 60.0,
            collision_padding: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct LayoutParams {
    pub(in crate::app) charge_strength: f32,
    pub(in crate::app) link_distance: f32,
    pub(in crate::app) center_strength: f32,
    pub(in crate::app) collision_strength: f32,
    pub(in crate::app) collision_padding: f32,
    pub(in crate::app) velocity_decay: f32,
    pub(in crate::app) alpha_min: f32,
    pub(in crate::app) alpha_decay: f32,
    pub(in crate::app) max_speed: f32,
}

impl LayoutParams {
    pub(in crate::app) fn for_graph(node_count: usize, link_count: usize, config: PhysicsConfig) -> Self {
        let density = link_count as f32 / node_count.max(1) as f32;
        let charge = (240.0 / (1.0 + density)).max(40.0);

        Self {
            charge_strength: -charge * config.charge_scale.clamp(0.1, 5.0),
            link_distance: config.link_distance.clamp(10.0, 400.0),
            center_strength: 0.05,
            collision_strength: 0.7,
            collision_padding: config.collision_padding.clamp(0.0, 40.0),
            velocity_decay: 0.4,
            alpha_min: ALPHA_MIN,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / SETTLE_TICKS),
            max_speed: 40.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct SimNode {
    pub(in crate::app) position: Vec2,
    pub(in crate::app) velocity: Vec2,
    pub(in crate::app) radius: f32,
    pin: Vec2,
    pinned: bool,
}

#[derive(Clone, Copy, Debug)]
struct SimLink {
    source: usize,
    target: usize,
    strength: f32,
    bias: f32,
}

#[derive(Default)]
struct PhysicsScratch {
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    deltas: Vec<Vec2>,
}

/// Force simulation over an index arena. Node `i` corresponds to node `i`
/// of the model it was built from.
pub(in crate::app) struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    params: LayoutParams,
    center: Vec2,
    alpha: f32,
    alpha_target: f32,
    scratch: PhysicsScratch,
}

impl Simulation {
    pub(in crate::app) fn new(
        bodies: impl IntoIterator<Item = (Vec2, f32)>,
        edges: &[(usize, usize)],
        params: LayoutParams,
        center: Vec2,
    ) -> Self {
        let nodes = bodies
            .into_iter()
            .map(|(position, radius)| SimNode {
                position,
                velocity: Vec2::ZERO,
                radius,
                pin: position,
                pinned: false,
            })
            .collect::<Vec<_>>();

        let mut degree = vec![0usize; nodes.len()];
        for &(source, target) in edges {
            if source < nodes.len() && target < nodes.len() && source != target {
                degree[source] += 1;
                degree[target] += 1;
            }
        }

        let links = edges
            .iter()
            .filter(|&&(source, target)| {
                source < nodes.len() && target < nodes.len() && source != target
            })
            .map(|&(source, target)| {
                let source_degree = degree[source] as f32;
                let target_degree = degree[target] as f32;
                SimLink {
                    source,
                    target,
                    strength: 1.0 / source_degree.min(target_degree),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect();

        Self {
            nodes,
            links,
            params,
            center,
            alpha: 1.0,
            alpha_target: 0.0,
            scratch: PhysicsScratch::default(),
        }
    }

    pub(in crate::app) fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub(in crate::app) fn position(&self, index: usize) -> Option<Vec2> {
        self.nodes.get(index).map(|node| node.position)
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn is_settled(&self) -> bool {
        self.alpha < self.params.alpha_min && self.alpha_target < self.params.alpha_min
    }

    pub(in crate::app) fn set_params(&mut self, params: LayoutParams) {
        self.params = params;
    }

    pub(in crate::app) fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }

    pub(in crate::app) fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    pub(in crate::app) fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
    }

    pub(in crate::app) fn is_pinned(&self, index: usize) -> bool {
        self.nodes.get(index).is_some_and(|node| node.pinned)
    }

    /// Holds `index` at its current position. Returns false for stale indices.
    pub(in crate::app) fn pin(&mut self, index: usize) -> bool {
        let Some(node) = self.nodes.get_mut(index) else {
            return false;
        };
        node.pin = node.position;
        node.pinned = true;
        node.velocity = Vec2::ZERO;
        true
    }

    pub(in crate::app) fn move_pin(&mut self, index: usize, position: Vec2) -> bool {
        let Some(node) = self.nodes.get_mut(index).filter(|node| node.pinned) else {
            return false;
        };
        node.pin = position;
        node.position = position;
        true
    }

    pub(in crate::app) fn unpin(&mut self, index: usize) -> bool {
        let Some(node) = self.nodes.get_mut(index) else {
            return false;
        };
        let was_pinned = node.pinned;
        node.pinned = false;
        was_pinned
    }

    /// Advances one tick. No-op once the simulation has cooled.
    pub(in crate::app) fn step(&mut self) -> bool {
        if self.nodes.is_empty() || self.is_settled() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
        let alpha = self.alpha;
        let params = self.params;
        let node_count = self.nodes.len();

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.radii.clear();
        scratch.deltas.clear();
        scratch.deltas.resize(node_count, Vec2::ZERO);
        for node in &self.nodes {
            scratch.positions.push(node.position);
            scratch.radii.push(node.radius);
        }

        let deltas = &mut scratch.deltas;
        let positions = &scratch.positions;
        let radii = &scratch.radii;

        for (link_index, link) in self.links.iter().enumerate() {
            let source = &self.nodes[link.source];
            let target = &self.nodes[link.target];
            let mut offset = (target.position + target.velocity)
                - (source.position + source.velocity);
            if offset.length_sq() < 1e-8 {
                offset = jiggle(link_index, link.target) * 1e-3;
            }
            let distance = offset.length();
            let stretch = (distance - params.link_distance) / distance * alpha * link.strength;
            let correction = offset * stretch;
            deltas[link.target] -= correction * link.bias;
            deltas[link.source] += correction * (1.0 - link.bias);
        }

        let tree = (node_count > 1)
            .then(|| QuadNode::build(positions, radii))
            .flatten();
        if let Some(tree) = tree {
            let charge = ChargeParams {
                strength: params.charge_strength * alpha,
                min_distance_sq: 1.0,
                theta: BARNES_HUT_THETA,
            };
            for (index, delta) in deltas.iter_mut().enumerate() {
                accumulate_charge_for_node(&tree, index, positions, charge, delta);
            }

            if params.collision_strength > 0.0 {
                accumulate_collision_pairs(
                    &tree,
                    &tree,
                    true,
                    positions,
                    radii,
                    CollisionParams {
                        strength: params.collision_strength,
                        padding: params.collision_padding,
                    },
                    deltas,
                );
            }
        }

        for (delta, position) in deltas.iter_mut().zip(positions) {
            *delta += (self.center - *position) * (params.center_strength * alpha);
        }

        let retention = 1.0 - params.velocity_decay;
        for (node, delta) in self.nodes.iter_mut().zip(deltas.iter()) {
            if node.pinned {
                node.position = node.pin;
                node.velocity = Vec2::ZERO;
                continue;
            }

            let mut velocity = (node.velocity + *delta) * retention;
            let speed = velocity.length();
            if speed > params.max_speed {
                velocity *= params.max_speed / speed;
            }
            if !velocity.x.is_finite() || !velocity.y.is_finite() {
                velocity = Vec2::ZERO;
            }
            node.velocity = velocity;
            node.position += velocity;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    fn triangle() -> Simulation {
        let bodies = [
            (vec2(100.0, 100.0), 6.0),
            (vec2(140.0, 110.0), 6.0),
            (vec2(120.0, 160.0), 6.0),
        ];
        let edges = [(0, 1), (1, 2)];
        let params = LayoutParams::for_graph(3, 2, PhysicsConfig::default());
        Simulation::new(bodies, &edges, params, vec2(200.0, 200.0))
    }

    #[test]
    fn alpha_decays_until_ticks_stop() {
        let mut simulation = triangle();
        let mut ticks = 0;
        while simulation.step() {
            ticks += 1;
            assert!(ticks < 1000);
        }

        assert!(simulation.is_settled());
        assert!((250..=350).contains(&ticks));
        let frozen = simulation.nodes().to_vec();
        assert!(!simulation.step());
        for (before, after) in frozen.iter().zip(simulation.nodes()) {
            assert_eq!(before.position, after.position);
        }
    }

    #[test]
    fn pinned_node_holds_until_released() {
        let mut simulation = triangle();
        assert!(simulation.pin(0));
        assert!(simulation.move_pin(0, vec2(10.0, 10.0)));

        for _ in 0..50 {
            simulation.step();
            assert_eq!(simulation.position(0), Some(vec2(10.0, 10.0)));
        }

        assert!(simulation.unpin(0));
        simulation.reheat(REHEAT_ALPHA);
        for _ in 0..5 {
            simulation.step();
        }
        assert_ne!(simulation.position(0), Some(vec2(10.0, 10.0)));
    }

    #[test]
    fn stale_indices_are_ignored() {
        let mut simulation = triangle();

        assert!(!simulation.pin(7));
        assert!(!simulation.move_pin(7, Vec2::ZERO));
        assert!(!simulation.unpin(7));
        assert!(!simulation.is_pinned(7));
        assert!(!simulation.move_pin(1, Vec2::ZERO));
    }

    #[test]
    fn drag_target_keeps_the_simulation_warm() {
        let mut simulation = triangle();
        while simulation.step() {}

        simulation.pin(1);
        simulation.set_alpha_target(DRAG_ALPHA_TARGET);
        for _ in 0..400 {
            assert!(simulation.step());
        }
        assert!((simulation.alpha() - DRAG_ALPHA_TARGET).abs() < 0.01);

        simulation.set_alpha_target(0.0);
        simulation.unpin(1);
        let mut ticks = 0;
        while simulation.step() {
            ticks += 1;
            assert!(ticks < 1000);
        }
    }

    #[test]
    fn linked_nodes_settle_near_link_distance() {
        let bodies = [(vec2(0.0, 0.0), 4.0), (vec2(300.0, 0.0), 4.0)];
        let config = PhysicsConfig {
            charge_scale: 0.1,
            ..PhysicsConfig::default()
        };
        let params = LayoutParams::for_graph(2, 1, config);
        let mut simulation = Simulation::new(bodies, &[(0, 1)], params, vec2(150.0, 0.0));
        while simulation.step() {}

        let gap = (simulation.nodes()[1].position - simulation.nodes()[0].position).length();
        assert!(gap < 150.0, "gap {gap}");
    }
}
