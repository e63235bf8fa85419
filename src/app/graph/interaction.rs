use eframe::egui::{self, CursorIcon, PointerButton, Pos2, Rect, Response, Ui, Vec2};

use super::super::physics::{DRAG_ALPHA_TARGET, Simulation};
use super::super::{RenderEdge, SelectedRecord, Selection, ViewModel};

pub(in crate::app) const MIN_SCALE: f32 = 0.1;
pub(in crate::app) const MAX_SCALE: f32 = 4.0;
const EDGE_HIT_TOLERANCE: f32 = 5.0;
const NODE_HIT_SLOP: f32 = 2.0;

/// Model-to-screen mapping: `screen = origin + translate + world * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct ViewTransform {
    pub(in crate::app) translate: Vec2,
    pub(in crate::app) scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub(in crate::app) fn world_to_screen(self, origin: Pos2, world: Vec2) -> Pos2 {
        origin + self.translate + world * self.scale
    }

    pub(in crate::app) fn screen_to_world(self, origin: Pos2, screen: Pos2) -> Vec2 {
        (screen - origin - self.translate) / self.scale
    }

    /// Scales around `anchor` so the model point under it stays put.
    pub(in crate::app) fn zoom_at(&mut self, origin: Pos2, anchor: Pos2, factor: f32) {
        let world_before = self.screen_to_world(origin, anchor);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.translate = anchor - origin - world_before * self.scale;
    }

    pub(in crate::app) fn pan_by(&mut self, delta: Vec2) {
        self.translate += delta;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct DragState {
    node: Option<usize>,
    panning: bool,
}

impl DragState {
    pub(in crate::app) fn node(&self) -> Option<usize> {
        self.node
    }

    pub(in crate::app) fn is_active(&self) -> bool {
        self.node.is_some() || self.panning
    }

    pub(in crate::app) fn begin_node(&mut self, simulation: &mut Simulation, index: usize) -> bool {
        if !simulation.pin(index) {
            return false;
        }
        simulation.set_alpha_target(DRAG_ALPHA_TARGET);
        self.node = Some(index);
        self.panning = false;
        true
    }

    pub(in crate::app) fn move_node(&mut self, simulation: &mut Simulation, world: Vec2) -> bool {
        self.node
            .is_some_and(|index| simulation.move_pin(index, world))
    }

    pub(in crate::app) fn begin_pan(&mut self) {
        self.node = None;
        self.panning = true;
    }

    pub(in crate::app) fn is_panning(&self) -> bool {
        self.panning
    }

    pub(in crate::app) fn end(&mut self, simulation: Option<&mut Simulation>) {
        self.panning = false;
        let Some(index) = self.node.take() else {
            return;
        };
        if let Some(simulation) = simulation {
            simulation.unpin(index);
            simulation.set_alpha_target(0.0);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum ClickTarget {
    Node(usize),
    Link(usize),
    Canvas,
}

pub(in crate::app) fn node_at(
    screen_positions: &[Pos2],
    screen_radii: &[f32],
    pointer: Pos2,
) -> Option<usize> {
    screen_positions
        .iter()
        .zip(screen_radii)
        .enumerate()
        .filter_map(|(index, (position, radius))| {
            let distance = position.distance(pointer);
            (distance <= radius + NODE_HIT_SLOP).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

pub(in crate::app) fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

pub(in crate::app) fn link_at(
    edges: &[RenderEdge],
    screen_positions: &[Pos2],
    pointer: Pos2,
    tolerance: f32,
) -> Option<usize> {
    edges
        .iter()
        .filter_map(|edge| {
            let start = *screen_positions.get(edge.source)?;
            let end = *screen_positions.get(edge.target)?;
            let distance = distance_to_segment(pointer, start, end);
            (distance <= tolerance).then_some((edge.link, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(link, _)| link)
}

/// Nodes win over edges, edges over the empty canvas.
pub(in crate::app) fn resolve_click(
    edges: &[RenderEdge],
    screen_positions: &[Pos2],
    screen_radii: &[f32],
    pointer: Pos2,
) -> ClickTarget {
    if let Some(index) = node_at(screen_positions, screen_radii, pointer) {
        return ClickTarget::Node(index);
    }
    match link_at(edges, screen_positions, pointer, EDGE_HIT_TOLERANCE) {
        Some(link) => ClickTarget::Link(link),
        None => ClickTarget::Canvas,
    }
}

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if !response.hovered() {
            return;
        }

        let (scroll, pinch) = ui.input(|input| (input.raw_scroll_delta.y, input.zoom_delta()));
        if scroll.abs() <= f32::EPSILON && (pinch - 1.0).abs() <= f32::EPSILON {
            return;
        }

        let pointer = response.hover_pos().unwrap_or_else(|| rect.center());
        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15) * pinch;
        self.transform.zoom_at(rect.min, pointer, factor);
    }

    pub(in crate::app) fn handle_pointer(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        let origin = rect.min;
        let positions = &self.view_scratch.screen_positions;
        let radii = &self.view_scratch.screen_radii;

        self.hovered = self.drag.node().or_else(|| {
            response
                .hover_pos()
                .and_then(|pointer| node_at(positions, radii, pointer))
        });

        // Pin on press so a hold below the drag threshold already holds the node.
        let (pressed, released, press_origin) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.press_origin(),
            )
        });
        if pressed
            && response.hovered()
            && let Some(pointer) = press_origin.or_else(|| response.hover_pos())
        {
            self.press_at(pointer);
        }

        if response.drag_started_by(PointerButton::Primary) {
            if self.drag.node().is_none() {
                self.drag.begin_pan();
            }
        } else if response.drag_started_by(PointerButton::Secondary)
            || response.drag_started_by(PointerButton::Middle)
        {
            self.drag.begin_pan();
        }

        if response.dragged() {
            if self.drag.node().is_some() {
                if let (Some(pointer), Some(session)) =
                    (response.interact_pointer_pos(), self.session.as_mut())
                {
                    let world = self.transform.screen_to_world(origin, pointer);
                    self.drag.move_node(&mut session.simulation, world);
                }
            } else if self.drag.is_panning() {
                self.transform.pan_by(response.drag_delta());
            }
        }

        if response.drag_stopped() || (released && self.drag.node().is_some()) {
            self.release_drag();
        }

        if self.drag.node().is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if self.hovered.is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let target = resolve_click(
                &self.edges,
                &self.view_scratch.screen_positions,
                &self.view_scratch.screen_radii,
                pointer,
            );
            self.set_selection(match target {
                ClickTarget::Node(index) => Selection::Node(index),
                ClickTarget::Link(link) => Selection::Link(link),
                ClickTarget::Canvas => Selection::Nothing,
            });
        }
    }

    /// Pins the node under `pointer` and warms the layout. Returns whether a
    /// node was grabbed.
    pub(in crate::app) fn press_at(&mut self, pointer: Pos2) -> bool {
        let hit = node_at(
            &self.view_scratch.screen_positions,
            &self.view_scratch.screen_radii,
            pointer,
        );
        match (hit, self.session.as_mut()) {
            (Some(index), Some(session)) => self.drag.begin_node(&mut session.simulation, index),
            _ => false,
        }
    }

    pub(in crate::app) fn release_drag(&mut self) {
        self.drag
            .end(self.session.as_mut().map(|session| &mut session.simulation));
    }

    pub(in crate::app) fn set_selection(&mut self, selection: Selection) {
        if self.selection == selection {
            return;
        }

        self.selection = selection;
        let record = match selection {
            Selection::Nothing => None,
            Selection::Node(index) => self.graph.nodes().get(index).map(SelectedRecord::Entity),
            Selection::Link(link) => self.graph.links().get(link).map(SelectedRecord::Relation),
        };
        (self.on_select)(record);
    }
}
