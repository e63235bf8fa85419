use eframe::egui::{Align2, Color32, FontId, Rect, Sense, Shape, Stroke, Ui, vec2};

use crate::store::Viewport;
use crate::util::truncate_label;

use super::super::highlight::SearchHighlight;
use super::super::render_utils::{
    HOVER_LABEL_PADDING, arrowhead, blend_color, circle_visible, draw_background, edge_visible,
    hover_label_rect, with_opacity,
};
use super::super::{Selection, ViewModel};

const LABEL_SCALE_THRESHOLD: f32 = 1.2;
const LABEL_MAX_CHARS: usize = 28;
const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const EDGE_COLOR: Color32 = Color32::from_rgba_premultiplied(96, 104, 116, 170);

impl ViewModel {
    fn sync_viewport(&mut self, rect: Rect) {
        let viewport = Viewport::new(rect.width(), rect.height());
        if viewport == self.viewport {
            return;
        }

        self.viewport = viewport;
        let (center_x, center_y) = viewport.center();
        if let Some(session) = self.session.as_mut() {
            session.simulation.set_center(vec2(center_x, center_y));
        }
    }

    fn update_screen_space(&mut self, rect: Rect) {
        let scratch = &mut self.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();

        let transform = self.transform;
        match self.session.as_ref() {
            Some(session) => {
                for node in session.simulation.nodes() {
                    scratch
                        .screen_positions
                        .push(transform.world_to_screen(rect.min, node.position));
                    scratch
                        .screen_radii
                        .push((node.radius * transform.scale).max(1.5));
                }
            }
            None => {
                for node in self.graph.nodes() {
                    scratch
                        .screen_positions
                        .push(transform.world_to_screen(rect.min, vec2(node.x, node.y)));
                    scratch.screen_radii.push(
                        (self.styles.style_for(&node.label).radius * transform.scale).max(1.5),
                    );
                }
            }
        }
    }

    pub(in crate::app) fn refresh_search_highlight(&mut self) {
        let stale = !self
            .highlight
            .as_ref()
            .is_some_and(|cached| cached.is_current(&self.search, self.revision));
        if stale {
            self.highlight = Some(SearchHighlight::compute(
                &self.graph,
                &self.styles,
                &self.search,
                self.revision,
            ));
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.sync_viewport(rect);
        draw_background(&painter, rect, self.transform);
        self.handle_graph_zoom(ui, rect, &response);

        let now = ui.input(|input| input.time);
        let warm = self
            .session
            .as_mut()
            .is_some_and(|session| session.advance(now));

        if self.graph.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes matched this fetch.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        self.update_screen_space(rect);
        self.handle_pointer(ui, rect, &response);
        self.update_screen_space(rect);

        if warm || self.drag.is_active() {
            ui.ctx().request_repaint();
        }

        self.refresh_search_highlight();
        let Some(highlight) = self.highlight.as_ref() else {
            return;
        };
        let positions = &self.view_scratch.screen_positions;
        let radii = &self.view_scratch.screen_radii;
        let scale = self.transform.scale;
        let pinned = |index: usize| {
            self.session
                .as_ref()
                .is_some_and(|session| session.simulation.is_pinned(index))
        };

        let edge_width = (1.2 * scale.sqrt()).clamp(0.6, 3.0);
        let arrow_size = (7.0 * scale.sqrt()).clamp(3.0, 12.0);
        for edge in &self.edges {
            let (Some(&start), Some(&end)) = (positions.get(edge.source), positions.get(edge.target))
            else {
                continue;
            };
            if !edge_visible(rect, start, end, 2.0) {
                continue;
            }

            let selected = self.selection == Selection::Link(edge.link);
            let opacity = highlight
                .opacity(edge.source)
                .min(highlight.opacity(edge.target));
            let (width, color) = if selected {
                (edge_width + 1.8, SELECTED_COLOR)
            } else {
                (edge_width, with_opacity(EDGE_COLOR, opacity))
            };

            painter.line_segment([start, end], Stroke::new(width, color));
            if scale >= 0.35
                && let Some(points) = arrowhead(start, end, radii[edge.target], arrow_size)
            {
                painter.add(Shape::convex_polygon(points.to_vec(), color, Stroke::NONE));
            }
        }

        for (index, node) in self.graph.nodes().iter().enumerate() {
            let (Some(&position), Some(&radius)) = (positions.get(index), radii.get(index)) else {
                continue;
            };
            if !circle_visible(rect, position, radius + 6.0) {
                continue;
            }

            let style = self.styles.style_for(&node.label);
            let opacity = highlight.opacity(index);
            let is_selected = self.selection == Selection::Node(index);
            let is_hovered = self.hovered == Some(index);
            let is_match = highlight.is_active() && highlight.is_match(index);

            let base = if is_hovered {
                blend_color(style.color, Color32::WHITE, 0.3)
            } else {
                style.color
            };
            painter.circle_filled(position, radius, with_opacity(base, opacity));

            let stroke = if is_match {
                Stroke::new(2.5, Color32::from_gray(245))
            } else {
                Stroke::new(1.0, with_opacity(Color32::from_rgb(15, 15, 15), opacity))
            };
            painter.circle_stroke(position, radius, stroke);

            if is_selected {
                painter.circle_stroke(position, radius + 4.0, Stroke::new(2.0, SELECTED_COLOR));
            } else if pinned(index) {
                painter.circle_stroke(position, radius + 2.5, Stroke::new(1.5, Color32::WHITE));
            }

            if is_selected || scale >= LABEL_SCALE_THRESHOLD {
                painter.text(
                    position + vec2(radius + 4.0, 0.0),
                    Align2::LEFT_CENTER,
                    truncate_label(self.styles.display_text(node), LABEL_MAX_CHARS),
                    FontId::proportional(11.0),
                    with_opacity(Color32::from_gray(225), opacity),
                );
            }
        }

        if let Some(index) = self.hovered
            && let Some(node) = self.graph.nodes().get(index)
            && let (Some(&position), Some(&radius)) = (positions.get(index), radii.get(index))
        {
            let galley = painter.layout_no_wrap(
                self.styles.display_text(node).to_owned(),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
            let label_rect = hover_label_rect(position, radius, galley.size());
            painter.rect_filled(label_rect, 4.0, Color32::from_rgba_unmultiplied(20, 24, 30, 235));
            painter.galley(label_rect.min + HOVER_LABEL_PADDING, galley, Color32::from_gray(240));
        }
    }
}
