use std::collections::HashMap;

use eframe::egui::vec2;
use tracing::debug;

use crate::store::{FetchRequest, GraphModel};

use super::super::physics::{LayoutParams, LayoutSession, REHEAT_ALPHA, Simulation};
use super::super::{RenderEdge, Selection, ViewModel};
use super::DragState;

pub(in crate::app) fn collect_edges(
    graph: &GraphModel,
    index_by_id: &HashMap<String, usize>,
) -> Vec<RenderEdge> {
    graph
        .links()
        .iter()
        .enumerate()
        .filter_map(|(link, relation)| {
            Some(RenderEdge {
                link,
                source: *index_by_id.get(&relation.source)?,
                target: *index_by_id.get(&relation.target)?,
            })
        })
        .collect()
}

impl ViewModel {
    /// Swaps in a freshly fetched model. The previous layout session is
    /// released before the new one starts.
    pub(in crate::app) fn install_graph(&mut self, graph: GraphModel, request: FetchRequest) {
        if let Some(mut previous) = self.session.take() {
            previous.release();
        }

        self.drag = DragState::default();
        self.hovered = None;
        self.set_selection(Selection::Nothing);

        self.index_by_id = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        self.edges = collect_edges(&graph, &self.index_by_id);
        self.graph = graph;
        self.request = request;
        self.revision += 1;
        self.highlight = None;
        self.session = self.start_session();

        debug!(
            revision = self.revision,
            nodes = self.graph.total_nodes(),
            links = self.edges.len(),
            "installed graph model"
        );
    }

    fn start_session(&self) -> Option<LayoutSession> {
        if self.graph.is_empty() {
            return None;
        }

        let bodies = self.graph.nodes().iter().map(|node| {
            (
                vec2(node.x, node.y),
                self.styles.style_for(&node.label).radius,
            )
        });
        let pairs = self
            .edges
            .iter()
            .map(|edge| (edge.source, edge.target))
            .collect::<Vec<_>>();
        let params = LayoutParams::for_graph(self.graph.total_nodes(), pairs.len(), self.physics);
        let (center_x, center_y) = self.viewport.center();

        Some(LayoutSession::start(Simulation::new(
            bodies,
            &pairs,
            params,
            vec2(center_x, center_y),
        )))
    }

    /// Re-derives layout parameters after a tuning change and warms the layout.
    pub(in crate::app) fn apply_physics_config(&mut self) {
        let params =
            LayoutParams::for_graph(self.graph.total_nodes(), self.edges.len(), self.physics);
        if let Some(session) = self.session.as_mut() {
            session.simulation.set_params(params);
            session.simulation.reheat(REHEAT_ALPHA);
        }
    }

    pub(in crate::app) fn reheat_layout(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.resume();
            session.simulation.reheat(REHEAT_ALPHA);
        }
    }
}
