use std::collections::HashMap;

use eframe::egui::Color32;

use crate::store::{Entity, UNDISCOVERED_CATEGORY, UNKNOWN_CATEGORY};
use crate::util::stable_hash;

const PALETTE: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

const NAME_FIELD: &str = "name";
// The ingestion scripts write this literal when a profile has no display name.
const MISSING_MARKER: &str = "undefined";

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct CategoryStyle {
    pub(in crate::app) radius: f32,
    pub(in crate::app) color: Color32,
    pub(in crate::app) display_field: &'static str,
    pub(in crate::app) placeholder: &'static str,
}

pub(in crate::app) struct CategoryStyles {
    table: HashMap<&'static str, CategoryStyle>,
}

impl Default for CategoryStyles {
    fn default() -> Self {
        let table = HashMap::from([
            (
                "Hacker",
                CategoryStyle {
                    radius: 7.0,
                    color: PALETTE[0],
                    display_field: "displayName",
                    placeholder: "Anonymous hacker",
                },
            ),
            (
                "Devpost",
                CategoryStyle {
                    radius: 10.0,
                    color: PALETTE[1],
                    display_field: NAME_FIELD,
                    placeholder: "Untitled project",
                },
            ),
            (
                "Hackathon",
                CategoryStyle {
                    radius: 14.0,
                    color: PALETTE[2],
                    display_field: "displayName",
                    placeholder: "Unnamed hackathon",
                },
            ),
            (
                UNKNOWN_CATEGORY,
                CategoryStyle {
                    radius: 6.0,
                    color: PALETTE[7],
                    display_field: NAME_FIELD,
                    placeholder: "Unknown node",
                },
            ),
            (
                UNDISCOVERED_CATEGORY,
                CategoryStyle {
                    radius: 5.0,
                    color: Color32::from_rgb(0x55, 0x5b, 0x66),
                    display_field: NAME_FIELD,
                    placeholder: "Undiscovered",
                },
            ),
        ]);

        Self { table }
    }
}

impl CategoryStyles {
    pub(in crate::app) fn style_for(&self, category: &str) -> CategoryStyle {
        if let Some(style) = self.table.get(category) {
            return *style;
        }

        CategoryStyle {
            radius: 8.0,
            color: PALETTE[(stable_hash(category) % PALETTE.len() as u64) as usize],
            display_field: NAME_FIELD,
            placeholder: "Unnamed node",
        }
    }

    pub(in crate::app) fn display_text<'a>(&self, entity: &'a Entity) -> &'a str {
        let style = self.style_for(&entity.label);
        let readable = |key: &str| {
            entity
                .property_str(key)
                .filter(|value| !value.eq_ignore_ascii_case(MISSING_MARKER))
        };

        readable(style.display_field)
            .or_else(|| readable(NAME_FIELD))
            .unwrap_or(style.placeholder)
    }
}
