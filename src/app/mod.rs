use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use eframe::egui::{self, Context, Pos2};
use tracing::{error, info, warn};

use crate::store::{
    Entity, FetchRequest, GraphModel, GraphSource, Relation, Viewport, fetch_graph_model,
};

mod graph;
mod highlight;
mod physics;
mod render_utils;
mod style;
mod ui;

use graph::{DragState, ViewTransform};
use highlight::SearchHighlight;
use physics::{LayoutSession, PhysicsConfig};
use style::CategoryStyles;
use ui::FetchForm;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

type FetchResult = Result<GraphModel, String>;

pub struct GraphExplorerApp {
    source: Arc<dyn GraphSource>,
    state: AppState,
    reload: Option<PendingFetch>,
}

struct PendingFetch {
    request: FetchRequest,
    rx: Receiver<FetchResult>,
}

enum AppState {
    Loading(PendingFetch),
    Ready(Box<ViewModel>),
    Error {
        request: FetchRequest,
        message: String,
    },
}

/// Record passed to the selection callback.
#[derive(Clone, Copy, Debug)]
pub enum SelectedRecord<'a> {
    Entity(&'a Entity),
    Relation(&'a Relation),
}

pub type SelectionCallback = Box<dyn FnMut(Option<SelectedRecord<'_>>)>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Selection {
    #[default]
    Nothing,
    Node(usize),
    Link(usize),
}

/// Link `link` of the model, resolved to node indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RenderEdge {
    link: usize,
    source: usize,
    target: usize,
}

struct ViewModel {
    graph: GraphModel,
    request: FetchRequest,
    revision: u64,
    form: FetchForm,
    form_error: Option<String>,
    search: String,
    selection: Selection,
    hovered: Option<usize>,
    transform: ViewTransform,
    drag: DragState,
    physics: PhysicsConfig,
    session: Option<LayoutSession>,
    index_by_id: HashMap<String, usize>,
    edges: Vec<RenderEdge>,
    styles: CategoryStyles,
    highlight: Option<SearchHighlight>,
    viewport: Viewport,
    last_error: Option<String>,
    on_select: SelectionCallback,
    view_scratch: ViewScratch,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
}

fn log_selection() -> SelectionCallback {
    Box::new(|record| match record {
        Some(SelectedRecord::Entity(entity)) => {
            info!(id = %entity.id, category = %entity.label, "entity selected");
        }
        Some(SelectedRecord::Relation(relation)) => info!(
            source = %relation.source,
            target = %relation.target,
            rel_type = %relation.rel_type,
            "relation selected"
        ),
        None => info!("selection cleared"),
    })
}

impl GraphExplorerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: Arc<dyn GraphSource>,
        request: FetchRequest,
    ) -> Self {
        let pending = Self::spawn_load(Arc::clone(&source), request, Viewport::default());
        Self {
            source,
            state: AppState::Loading(pending),
            reload: None,
        }
    }

    fn spawn_load(
        source: Arc<dyn GraphSource>,
        request: FetchRequest,
        viewport: Viewport,
    ) -> PendingFetch {
        let (tx, rx) = mpsc::channel();
        let worker_request = request.clone();

        info!(request = %request.describe(), limit = request.limit(), "fetch started");
        thread::spawn(move || {
            let result = fetch_graph_model(
                source.as_ref(),
                &worker_request,
                viewport,
                &mut rand::thread_rng(),
            )
            .map_err(|error| {
                if error.is_input() {
                    warn!(%error, "fetch rejected");
                } else {
                    error!(%error, "fetch failed");
                }
                error.to_string()
            });
            let _ = tx.send(result);
        });

        PendingFetch { request, rx }
    }

    fn poll(pending: &PendingFetch) -> Option<FetchResult> {
        match pending.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err("Background fetch worker disconnected".to_owned()))
            }
        }
    }
}

impl eframe::App for GraphExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut requested = None;

        match &mut self.state {
            AppState::Loading(pending) => {
                if let Some(result) = Self::poll(pending) {
                    let request = pending.request.clone();
                    transition = Some(match result {
                        Ok(graph) => AppState::Ready(Box::new(ViewModel::new(
                            graph,
                            request,
                            log_selection(),
                        ))),
                        Err(message) => {
                            warn!(%message, "initial fetch failed");
                            AppState::Error { request, message }
                        }
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Fetching {}...", pending.request.describe()));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint_after(POLL_INTERVAL);
            }
            AppState::Error { request, message } => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to fetch the graph");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        requested = Some(request.clone());
                    }
                });
            }
            AppState::Ready(model) => {
                if let Some(result) = self.reload.as_ref().and_then(Self::poll)
                    && let Some(pending) = self.reload.take()
                {
                    model.finish_refetch(pending.request, result);
                }

                let in_flight = self.reload.is_some();
                if let Some(request) = model.show(ctx, in_flight)
                    && !in_flight
                {
                    model.begin_refetch();
                    self.reload = Some(Self::spawn_load(
                        Arc::clone(&self.source),
                        request,
                        model.viewport,
                    ));
                }

                if self.reload.is_some() {
                    ctx.request_repaint_after(POLL_INTERVAL);
                }
            }
        }

        if let Some(request) = requested {
            transition = Some(AppState::Loading(Self::spawn_load(
                Arc::clone(&self.source),
                request,
                Viewport::default(),
            )));
        }

        if let Some(next_state) = transition {
            self.reload = None;
            self.state = next_state;
        }
    }
}
