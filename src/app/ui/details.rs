use eframe::egui::{self, RichText, Ui, vec2};

use crate::store::{Entity, Properties};
use crate::util::format_value;

use super::super::{Selection, ViewModel};

fn property_grid(ui: &mut Ui, id_salt: &str, properties: &Properties) {
    if properties.is_empty() {
        ui.small("No properties.");
        return;
    }

    let mut entries = properties.iter().collect::<Vec<_>>();
    entries.sort_by(|left, right| left.0.cmp(right.0));

    egui::Grid::new(id_salt)
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            for (key, value) in entries {
                ui.label(RichText::new(key).strong());
                ui.label(format_value(value));
                ui.end_row();
            }
        });
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let mut clear = false;
        let mut focus = None;

        match self.selection {
            Selection::Nothing => {
                ui.label("Click a node or an edge to inspect it.");
            }
            Selection::Node(index) => {
                let Some(entity) = self.graph.nodes().get(index) else {
                    ui.label("Selected node is no longer in the graph.");
                    return;
                };
                let style = self.styles.style_for(&entity.label);

                ui.label(RichText::new(self.styles.display_text(entity)).strong().size(16.0));
                ui.colored_label(style.color, entity.label.as_str());
                ui.small(format!("id {}", entity.id));
                ui.label(format!("Connections: {}", self.graph.degree(&entity.id)));
                ui.separator();
                property_grid(ui, "entity_properties", &entity.properties);
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Center view").clicked() {
                        focus = Some(index);
                    }
                    if ui.button("Clear selection").clicked() {
                        clear = true;
                    }
                });
            }
            Selection::Link(link) => {
                let Some(relation) = self.graph.links().get(link) else {
                    ui.label("Selected relationship is no longer in the graph.");
                    return;
                };

                ui.label(RichText::new(relation.rel_type.as_str()).strong().size(16.0));
                let endpoint = |id: &str| -> String {
                    self.graph
                        .node(id)
                        .map(|entity: &Entity| {
                            format!("{} ({})", self.styles.display_text(entity), entity.label)
                        })
                        .unwrap_or_else(|| id.to_owned())
                };
                ui.label(format!("From: {}", endpoint(&relation.source)));
                ui.label(format!("To: {}", endpoint(&relation.target)));
                ui.separator();
                property_grid(ui, "relation_properties", &relation.properties);
                ui.separator();
                if ui.button("Clear selection").clicked() {
                    clear = true;
                }
            }
        }

        if let Some(index) = focus {
            self.center_on(index);
        }
        if clear {
            self.set_selection(Selection::Nothing);
        }
    }

    fn center_on(&mut self, index: usize) {
        let Some(position) = self
            .session
            .as_ref()
            .and_then(|session| session.simulation.position(index))
        else {
            return;
        };
        let center = vec2(self.viewport.width, self.viewport.height) * 0.5;
        self.transform.translate = center - position * self.transform.scale;
    }
}
