use serde::Serialize;
use serde_json::{Map, Value};

pub type Properties = Map<String, Value>;

pub const UNKNOWN_CATEGORY: &str = "Unknown";
pub const UNDISCOVERED_CATEGORY: &str = "Undiscovered";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn center(self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entity {
    pub id: String,
    pub label: String,
    pub properties: Properties,
    pub x: f32,
    pub y: f32,
}

impl Entity {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Relation {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub properties: Properties,
}

/// Deduplicated node/link set handed to the renderer. Totals are derived
/// once at construction; the model has no mutators.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphModel {
    nodes: Vec<Entity>,
    links: Vec<Relation>,
    total_nodes: usize,
    total_links: usize,
}

impl GraphModel {
    pub(super) fn new(nodes: Vec<Entity>, links: Vec<Relation>) -> Self {
        let total_nodes = nodes.len();
        let total_links = links.len();
        Self {
            nodes,
            links,
            total_nodes,
            total_links,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(nodes: Vec<Entity>, links: Vec<Relation>) -> Self {
        Self::new(nodes, links)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Entity] {
        &self.nodes
    }

    pub fn links(&self) -> &[Relation] {
        &self.links
    }

    pub fn total_nodes(&self) -> usize {
        self.total_nodes
    }

    pub fn total_links(&self) -> usize {
        self.total_links
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Entity> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn degree(&self, id: &str) -> usize {
        self.links
            .iter()
            .filter(|link| link.source == id || link.target == id)
            .count()
    }
}
