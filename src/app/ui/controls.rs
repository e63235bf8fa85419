use eframe::egui::{self, Color32, RichText, Ui};

use crate::store::{FetchError, FetchParams, FetchRequest, NodeFilter};

use super::super::{Selection, ViewModel};

const NODE_TYPE_PRESETS: [&str; 4] = ["all", "hackers", "devposts", "hackathons"];
const MATCH_ROWS: usize = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum FetchMode {
    Filtered,
    Radius,
}

/// Editable copy of the fetch parameters. Fields stay raw strings until the
/// user submits, so a half-typed limit never blocks editing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) struct FetchForm {
    pub(in crate::app) mode: FetchMode,
    pub(in crate::app) node_type: String,
    pub(in crate::app) limit: String,
    pub(in crate::app) start_name: String,
    pub(in crate::app) hops: String,
}

impl FetchForm {
    pub(in crate::app) fn from_request(request: &FetchRequest) -> Self {
        let node_type = |filter: &NodeFilter| filter.category().unwrap_or("all").to_owned();
        match request {
            FetchRequest::Filtered { filter, limit } => Self {
                mode: FetchMode::Filtered,
                node_type: node_type(filter),
                limit: limit.to_string(),
                start_name: String::new(),
                hops: String::new(),
            },
            FetchRequest::Radius {
                filter,
                start_name,
                hops,
                limit,
            } => Self {
                mode: FetchMode::Radius,
                node_type: node_type(filter),
                limit: limit.to_string(),
                start_name: start_name.clone(),
                hops: hops.to_string(),
            },
        }
    }

    pub(in crate::app) fn to_request(&self) -> Result<FetchRequest, FetchError> {
        let radius = self.mode == FetchMode::Radius;
        if radius && self.start_name.trim().is_empty() {
            return Err(FetchError::input("a radius fetch needs a start name"));
        }

        let field = |value: &str| Some(value.to_owned()).filter(|value| !value.trim().is_empty());
        FetchRequest::from_params(&FetchParams {
            node_type: field(&self.node_type),
            limit: field(&self.limit),
            start_name: radius.then(|| self.start_name.clone()),
            hops: if radius { field(&self.hops) } else { None },
        })
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, in_flight: bool) -> Option<FetchRequest> {
        let mut submitted = None;

        ui.heading("Fetch");
        ui.separator();
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.form.mode, FetchMode::Filtered, "By category")
                .on_hover_text("Nodes of one category plus their direct neighbours.");
            ui.selectable_value(&mut self.form.mode, FetchMode::Radius, "Around a node")
                .on_hover_text("Everything within a hop radius of a named node.");
        });

        egui::Grid::new("fetch_form")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("Node type");
                ui.horizontal(|ui| {
                    egui::ComboBox::from_id_salt("node_type_presets")
                        .selected_text(self.form.node_type.as_str())
                        .show_ui(ui, |ui| {
                            for preset in NODE_TYPE_PRESETS {
                                ui.selectable_value(
                                    &mut self.form.node_type,
                                    preset.to_owned(),
                                    preset,
                                );
                            }
                        });
                    ui.add(egui::TextEdit::singleline(&mut self.form.node_type).desired_width(90.0));
                });
                ui.end_row();

                ui.label("Limit");
                ui.add(egui::TextEdit::singleline(&mut self.form.limit).desired_width(80.0));
                ui.end_row();

                if self.form.mode == FetchMode::Radius {
                    ui.label("Start name");
                    ui.text_edit_singleline(&mut self.form.start_name);
                    ui.end_row();

                    ui.label("Hops");
                    ui.add(egui::TextEdit::singleline(&mut self.form.hops).desired_width(80.0));
                    ui.end_row();
                }
            });

        ui.add_space(4.0);
        let fetch_button = ui.add_enabled(!in_flight, egui::Button::new("Fetch graph"));
        if fetch_button.clicked() {
            match self.form.to_request() {
                Ok(request) => {
                    self.form_error = None;
                    submitted = Some(request);
                }
                Err(error) => self.form_error = Some(error.to_string()),
            }
        }
        if in_flight {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Fetching...");
            });
        }
        if let Some(error) = &self.form_error {
            ui.colored_label(Color32::from_rgb(235, 110, 100), error.as_str());
        }

        ui.add_space(8.0);
        ui.heading("Search");
        ui.separator();
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Case-insensitive match on category or display name.");
        self.draw_match_list(ui);

        ui.add_space(8.0);
        ui.heading("Layout");
        ui.separator();
        let mut tuned = false;
        tuned |= ui
            .add(egui::Slider::new(&mut self.physics.charge_scale, 0.1..=3.0).text("Repulsion"))
            .changed();
        tuned |= ui
            .add(egui::Slider::new(&mut self.physics.link_distance, 20.0..=240.0).text("Link length"))
            .changed();
        tuned |= ui
            .add(
                egui::Slider::new(&mut self.physics.collision_padding, 0.0..=20.0)
                    .text("Spacing"),
            )
            .changed();
        if tuned {
            self.apply_physics_config();
        }

        ui.horizontal(|ui| {
            let can_reheat = self.session.is_some() && !in_flight;
            if ui
                .add_enabled(can_reheat, egui::Button::new("Reheat layout"))
                .clicked()
            {
                self.reheat_layout();
            }
            if let Some(session) = &self.session {
                if session.is_running() {
                    ui.small(format!("alpha {:.3}", session.simulation.alpha()));
                } else {
                    ui.small("paused");
                }
            }
        });

        submitted
    }

    fn draw_match_list(&mut self, ui: &mut Ui) {
        self.refresh_search_highlight();
        let Some(highlight) = self.highlight.as_ref() else {
            return;
        };
        if !highlight.is_active() {
            return;
        }

        ui.small(format!("{} matching nodes", highlight.match_count()));
        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("search_matches")
            .max_height(220.0)
            .show(ui, |ui| {
                for &index in highlight.ranked().iter().take(MATCH_ROWS) {
                    let Some(node) = self.graph.nodes().get(index) else {
                        continue;
                    };
                    let style = self.styles.style_for(&node.label);
                    let selected = self.selection == Selection::Node(index);
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("●").color(style.color));
                        if ui
                            .selectable_label(selected, self.styles.display_text(node))
                            .clicked()
                        {
                            picked = Some(index);
                        }
                    });
                }
            });

        if let Some(index) = picked {
            self.set_selection(Selection::Node(index));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(mode: FetchMode, start_name: &str, hops: &str) -> FetchForm {
        FetchForm {
            mode,
            node_type: "hackers".to_owned(),
            limit: "50".to_owned(),
            start_name: start_name.to_owned(),
            hops: hops.to_owned(),
        }
    }

    #[test]
    fn radius_form_requires_a_start_name() {
        let error = form(FetchMode::Radius, "  ", "3").to_request().unwrap_err();

        assert!(error.is_input());
    }

    #[test]
    fn filtered_form_ignores_radius_fields() {
        let request = form(FetchMode::Filtered, "ada", "3").to_request().unwrap();

        assert_eq!(
            request,
            FetchRequest::Filtered {
                filter: NodeFilter::Category("Hacker".to_owned()),
                limit: 50,
            }
        );
    }

    #[test]
    fn form_round_trips_a_radius_request() {
        let request = form(FetchMode::Radius, "ada", "250").to_request().unwrap();
        let restored = FetchForm::from_request(&request);

        assert_eq!(restored.mode, FetchMode::Radius);
        assert_eq!(restored.hops, "100");
        assert_eq!(restored.node_type, "Hacker");
        assert_eq!(restored.to_request().unwrap(), request);
    }
}
