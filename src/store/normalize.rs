use std::collections::HashSet;

use indexmap::IndexMap;
use rand::Rng;
use tracing::{debug, info};

use super::client::GraphSource;
use super::error::FetchError;
use super::graph::{Entity, GraphModel, Relation, UNKNOWN_CATEGORY, Viewport};
use super::parse::RawGraph;
use super::query::FetchRequest;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub duplicate_nodes: usize,
    pub dangling_links: usize,
    pub duplicate_links: usize,
}

pub fn normalize_with_stats<R: Rng>(
    raw: RawGraph,
    viewport: Viewport,
    rng: &mut R,
) -> (GraphModel, NormalizeStats) {
    let mut stats = NormalizeStats::default();
    let mut nodes: IndexMap<String, Entity> = IndexMap::with_capacity(raw.nodes.len());

    for raw_node in raw.nodes {
        if nodes.contains_key(&raw_node.id) {
            stats.duplicate_nodes += 1;
            continue;
        }

        let label = raw_node
            .labels
            .into_iter()
            .find(|label| !label.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_owned());
        let x = rng.gen_range(0.0..viewport.width.max(1.0));
        let y = rng.gen_range(0.0..viewport.height.max(1.0));

        nodes.insert(
            raw_node.id.clone(),
            Entity {
                id: raw_node.id,
                label,
                properties: raw_node.properties,
                x,
                y,
            },
        );
    }

    let mut seen_links = HashSet::with_capacity(raw.relationships.len());
    let mut links = Vec::with_capacity(raw.relationships.len());
    for relationship in raw.relationships {
        if !nodes.contains_key(&relationship.start_node)
            || !nodes.contains_key(&relationship.end_node)
        {
            stats.dangling_links += 1;
            continue;
        }

        let key = (
            relationship.start_node.clone(),
            relationship.end_node.clone(),
            relationship.rel_type.clone(),
        );
        if !seen_links.insert(key) {
            stats.duplicate_links += 1;
            continue;
        }

        links.push(Relation {
            source: relationship.start_node,
            target: relationship.end_node,
            rel_type: relationship.rel_type,
            properties: relationship.properties,
        });
    }

    let model = GraphModel::new(nodes.into_values().collect(), links);
    (model, stats)
}

pub fn fetch_graph_model<R: Rng>(
    source: &dyn GraphSource,
    request: &FetchRequest,
    viewport: Viewport,
    rng: &mut R,
) -> Result<GraphModel, FetchError> {
    let query = request.to_query();
    debug!(statement = %query.statement, "built traversal query");

    let raw = source.fetch_graph(&query)?;
    let (model, stats) = normalize_with_stats(raw, viewport, rng);

    info!(
        request = %request.describe(),
        nodes = model.total_nodes(),
        links = model.total_links(),
        duplicate_nodes = stats.duplicate_nodes,
        dangling_links = stats.dangling_links,
        duplicate_links = stats.duplicate_links,
        "normalized graph store result"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::Value;

    use super::super::graph::Properties;
    use super::super::parse::{RawNode, RawRelationship};
    use super::super::query::{FetchParams, TraversalQuery};
    use super::*;

    fn normalize(raw: RawGraph, viewport: Viewport, rng: &mut StdRng) -> GraphModel {
        normalize_with_stats(raw, viewport, rng).0
    }

    fn raw_node(id: &str, label: Option<&str>, name: &str) -> RawNode {
        let mut properties = Properties::new();
        properties.insert("name".to_owned(), Value::from(name));
        RawNode {
            id: id.to_owned(),
            labels: label.map(|label| vec![label.to_owned()]).unwrap_or_default(),
            properties,
        }
    }

    fn raw_link(start: &str, end: &str, rel_type: &str) -> RawRelationship {
        RawRelationship {
            rel_type: rel_type.to_owned(),
            start_node: start.to_owned(),
            end_node: end.to_owned(),
            properties: Properties::new(),
        }
    }

    fn overlapping_paths() -> RawGraph {
        RawGraph {
            nodes: vec![
                raw_node("1", Some("Hacker"), "ada"),
                raw_node("2", Some("Devpost"), "ml-tool"),
                raw_node("1", Some("Hacker"), "ada"),
                raw_node("3", None, "mystery"),
                raw_node("2", Some("Devpost"), "ml-tool"),
            ],
            relationships: vec![
                raw_link("1", "2", "CONTRIBUTED_TO"),
                raw_link("1", "2", "CONTRIBUTED_TO"),
                raw_link("1", "2", "LIKED"),
                raw_link("3", "2", "CONTRIBUTED_TO"),
                raw_link("1", "404", "CONTRIBUTED_TO"),
            ],
        }
    }

    fn ids(model: &GraphModel) -> Vec<&str> {
        model.nodes().iter().map(|node| node.id.as_str()).collect()
    }

    #[test]
    fn first_occurrence_wins_and_order_is_discovery_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let (model, stats) = normalize_with_stats(overlapping_paths(), Viewport::default(), &mut rng);

        assert_eq!(ids(&model), ["1", "2", "3"]);
        assert_eq!(stats.duplicate_nodes, 2);
        assert_eq!(model.nodes()[2].label, UNKNOWN_CATEGORY);
    }

    #[test]
    fn links_deduplicate_by_endpoints_and_type() {
        let mut rng = StdRng::seed_from_u64(2);
        let (model, stats) = normalize_with_stats(overlapping_paths(), Viewport::default(), &mut rng);

        let keys = model
            .links()
            .iter()
            .map(|link| (link.source.as_str(), link.target.as_str(), link.rel_type.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            [
                ("1", "2", "CONTRIBUTED_TO"),
                ("1", "2", "LIKED"),
                ("3", "2", "CONTRIBUTED_TO"),
            ]
        );
        assert_eq!(stats.duplicate_links, 1);
        assert_eq!(stats.dangling_links, 1);
    }

    #[test]
    fn no_link_references_a_missing_node() {
        let mut rng = StdRng::seed_from_u64(3);
        let model = normalize(overlapping_paths(), Viewport::default(), &mut rng);

        for link in model.links() {
            assert!(model.node(&link.source).is_some());
            assert!(model.node(&link.target).is_some());
        }
        let mut unique = ids(&model);
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), model.nodes().len());
        assert_eq!(model.total_nodes(), model.nodes().len());
        assert_eq!(model.total_links(), model.links().len());
    }

    #[test]
    fn normalizing_twice_yields_the_same_sets() {
        let first = normalize(overlapping_paths(), Viewport::default(), &mut StdRng::seed_from_u64(4));
        let second =
            normalize(overlapping_paths(), Viewport::default(), &mut StdRng::seed_from_u64(99));

        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.links(), second.links());
    }

    #[test]
    fn relationship_to_node_outside_window_is_dropped() {
        let raw = RawGraph {
            nodes: vec![raw_node("5", Some("Hacker"), "ada")],
            relationships: vec![raw_link("5", "9", "CONTRIBUTED_TO")],
        };
        let model = normalize(raw, Viewport::default(), &mut StdRng::seed_from_u64(5));

        assert_eq!(model.total_nodes(), 1);
        assert_eq!(model.total_links(), 0);
        assert!(model.node("9").is_none());
    }

    #[test]
    fn initial_positions_fall_inside_the_viewport() {
        let viewport = Viewport::new(320.0, 200.0);
        let model = normalize(overlapping_paths(), viewport, &mut StdRng::seed_from_u64(6));

        for node in model.nodes() {
            assert!((0.0..320.0).contains(&node.x));
            assert!((0.0..200.0).contains(&node.y));
        }
    }

    struct FakeSource {
        raw: RawGraph,
        seen: Mutex<Vec<TraversalQuery>>,
    }

    impl GraphSource for FakeSource {
        fn fetch_graph(&self, query: &TraversalQuery) -> Result<RawGraph, FetchError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(query.clone());
            }
            Ok(self.raw.clone())
        }
    }

    #[test]
    fn filtered_fetch_keeps_counts_consistent() {
        let mut nodes = (0..50)
            .map(|index| raw_node(&format!("h{index}"), Some("Hacker"), &format!("hacker-{index}")))
            .collect::<Vec<_>>();
        nodes.push(raw_node("p1", Some("Devpost"), "project"));
        let relationships = (0..50)
            .map(|index| raw_link(&format!("h{index}"), "p1", "CONTRIBUTED_TO"))
            .collect();
        let source = FakeSource {
            raw: RawGraph { nodes, relationships },
            seen: Mutex::new(Vec::new()),
        };
        let request = FetchRequest::from_params(&FetchParams {
            node_type: Some("hackers".to_owned()),
            limit: Some("50".to_owned()),
            ..FetchParams::default()
        })
        .unwrap();

        let model = fetch_graph_model(
            &source,
            &request,
            Viewport::default(),
            &mut StdRng::seed_from_u64(7),
        )
        .unwrap();

        let hackers = model
            .nodes()
            .iter()
            .filter(|node| node.label == "Hacker")
            .count();
        assert_eq!(hackers, 50);
        assert_eq!(model.total_nodes(), model.nodes().len());
        assert_eq!(model.total_links(), 50);
        let seen = source.seen.lock().unwrap();
        assert_eq!(seen[0].parameters["limit"], 50);
    }

    #[test]
    fn missing_start_entity_yields_an_empty_graph() {
        let source = FakeSource {
            raw: RawGraph::default(),
            seen: Mutex::new(Vec::new()),
        };
        let request = FetchRequest::from_params(&FetchParams {
            start_name: Some("nobody".to_owned()),
            ..FetchParams::default()
        })
        .unwrap();

        let model = fetch_graph_model(
            &source,
            &request,
            Viewport::default(),
            &mut StdRng::seed_from_u64(8),
        )
        .unwrap();

        assert!(model.is_empty());
        assert_eq!(model.total_nodes(), 0);
        assert_eq!(model.total_links(), 0);
    }
}
