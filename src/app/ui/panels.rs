use std::collections::HashMap;

use eframe::egui::{self, Align, Color32, Context, Layout};
use tracing::{info, warn};

use crate::store::{FetchRequest, GraphModel, Viewport};

use super::super::graph::{DragState, ViewTransform};
use super::super::physics::PhysicsConfig;
use super::super::style::CategoryStyles;
use super::super::{FetchResult, Selection, SelectionCallback, ViewModel, ViewScratch};
use super::FetchForm;

impl ViewModel {
    pub(in crate::app) fn new(
        graph: GraphModel,
        request: FetchRequest,
        on_select: SelectionCallback,
    ) -> Self {
        let mut model = Self {
            graph: GraphModel::empty(),
            form: FetchForm::from_request(&request),
            request: request.clone(),
            revision: 0,
            form_error: None,
            search: String::new(),
            selection: Selection::Nothing,
            hovered: None,
            transform: ViewTransform::default(),
            drag: DragState::default(),
            physics: PhysicsConfig::default(),
            session: None,
            index_by_id: HashMap::new(),
            edges: Vec::new(),
            styles: CategoryStyles::default(),
            highlight: None,
            viewport: Viewport::default(),
            last_error: None,
            on_select,
            view_scratch: ViewScratch::default(),
        };
        model.install_graph(graph, request);
        model
    }

    /// Freezes the current layout while a replacement is being fetched.
    pub(in crate::app) fn begin_refetch(&mut self) {
        if let Some(session) = self.session.as_mut() {
            self.drag.end(Some(&mut session.simulation));
            session.release();
        }
        self.drag = DragState::default();
    }

    pub(in crate::app) fn finish_refetch(&mut self, request: FetchRequest, result: FetchResult) {
        match result {
            Ok(graph) => {
                info!(
                    request = %request.describe(),
                    nodes = graph.total_nodes(),
                    links = graph.total_links(),
                    "graph replaced"
                );
                self.last_error = None;
                self.install_graph(graph, request);
            }
            Err(message) => {
                warn!(request = %request.describe(), %message, "refetch failed");
                self.last_error = Some(message);
                if let Some(session) = self.session.as_mut() {
                    session.resume();
                }
            }
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, in_flight: bool) -> Option<FetchRequest> {
        let mut requested = None;

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("hacker-graph");
                    ui.separator();
                    ui.label(self.request.describe());
                    ui.label(format!("nodes: {}", self.graph.total_nodes()));
                    ui.label(format!("links: {}", self.graph.total_links()));
                    if in_flight {
                        ui.spinner();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let mut dismiss = false;
                        if let Some(error) = &self.last_error {
                            dismiss = ui.small_button("Dismiss").clicked();
                            ui.colored_label(
                                Color32::from_rgb(235, 110, 100),
                                format!("Fetch failed: {error}"),
                            );
                        }
                        if dismiss {
                            self.last_error = None;
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    requested = self.draw_controls(ui, in_flight);
                });
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));

        requested
    }
}

#[cfg(test)]
mod tests {
    use crate::store::{Entity, NodeFilter, Properties, Relation};

    use super::*;

    fn entity(id: &str, label: &str, x: f32) -> Entity {
        Entity {
            id: id.to_owned(),
            label: label.to_owned(),
            properties: Properties::new(),
            x,
            y: 40.0,
        }
    }

    fn pair_graph() -> GraphModel {
        GraphModel::from_parts(
            vec![entity("1", "Hacker", 10.0), entity("2", "Devpost", 90.0)],
            vec![Relation {
                source: "1".to_owned(),
                target: "2".to_owned(),
                rel_type: "CONTRIBUTED_TO".to_owned(),
                properties: Properties::new(),
            }],
        )
    }

    fn request(limit: usize) -> FetchRequest {
        FetchRequest::Filtered {
            filter: NodeFilter::All,
            limit,
        }
    }

    fn view_model() -> ViewModel {
        ViewModel::new(pair_graph(), request(20), Box::new(|_| {}))
    }

    fn running(model: &ViewModel) -> bool {
        model
            .session
            .as_ref()
            .is_some_and(|session| session.is_running())
    }

    #[test]
    fn refetch_pauses_the_layout_until_it_resolves() {
        let mut model = view_model();
        assert!(running(&model));

        model.begin_refetch();

        assert!(model.session.is_some());
        assert!(!running(&model));
    }

    #[test]
    fn failed_refetch_keeps_the_prior_graph_and_resumes() {
        let mut model = view_model();
        let revision = model.revision;

        model.begin_refetch();
        model.finish_refetch(request(50), Err("store unreachable".to_owned()));

        assert!(running(&model));
        assert_eq!(model.revision, revision);
        assert_eq!(model.graph, pair_graph());
        assert_eq!(model.request, request(20));
        assert_eq!(model.last_error.as_deref(), Some("store unreachable"));
    }

    #[test]
    fn successful_refetch_installs_a_new_running_session() {
        let mut model = view_model();
        let revision = model.revision;
        let replacement = GraphModel::from_parts(vec![entity("7", "Hackathon", 0.0)], Vec::new());

        model.begin_refetch();
        model.last_error = Some("earlier failure".to_owned());
        model.finish_refetch(request(50), Ok(replacement.clone()));

        assert_eq!(model.revision, revision + 1);
        assert_eq!(model.graph, replacement);
        assert_eq!(model.request, request(50));
        assert_eq!(model.edges.len(), 0);
        assert!(model.last_error.is_none());
        assert!(running(&model));
        assert_eq!(
            model
                .session
                .as_ref()
                .map(|session| session.simulation.nodes().len()),
            Some(1)
        );
    }

    #[test]
    fn empty_replacement_leaves_no_session_behind() {
        let mut model = view_model();

        model.begin_refetch();
        model.finish_refetch(request(50), Ok(GraphModel::empty()));

        assert!(model.session.is_none());
        assert!(model.graph.is_empty());
    }
}
