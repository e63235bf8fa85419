use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::style::CategoryStyles;
use crate::store::GraphModel;

pub(in crate::app) const DIMMED_OPACITY: f32 = 0.25;
const MAX_RANKED_MATCHES: usize = 200;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Per-node search emphasis for one query against one graph revision.
#[derive(Clone, Debug, Default)]
pub(in crate::app) struct SearchHighlight {
    query: String,
    graph_revision: u64,
    matches: Vec<bool>,
    ranked: Vec<usize>,
}

impl SearchHighlight {
    pub(in crate::app) fn compute(
        graph: &GraphModel,
        styles: &CategoryStyles,
        query: &str,
        graph_revision: u64,
    ) -> Self {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Self {
                query: query.to_owned(),
                graph_revision,
                matches: Vec::new(),
                ranked: Vec::new(),
            };
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = Vec::new();
        let matches = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, entity)| {
                let text = styles.display_text(entity);
                let hit = entity.label.to_lowercase().contains(&needle)
                    || text.to_lowercase().contains(&needle);
                if hit {
                    let score = fuzzy_match_score(&matcher, text, &needle).unwrap_or(0);
                    scored.push((index, score));
                }
                hit
            })
            .collect();

        scored.sort_by(|left, right| right.1.cmp(&left.1).then(left.0.cmp(&right.0)));
        scored.truncate(MAX_RANKED_MATCHES);

        Self {
            query: query.to_owned(),
            graph_revision,
            matches,
            ranked: scored.into_iter().map(|(index, _)| index).collect(),
        }
    }

    pub(in crate::app) fn is_current(&self, query: &str, graph_revision: u64) -> bool {
        self.graph_revision == graph_revision && self.query == query
    }

    pub(in crate::app) fn is_active(&self) -> bool {
        !self.query.trim().is_empty()
    }

    pub(in crate::app) fn is_match(&self, index: usize) -> bool {
        self.matches.get(index).copied().unwrap_or(false)
    }

    pub(in crate::app) fn opacity(&self, index: usize) -> f32 {
        if !self.is_active() || self.is_match(index) {
            1.0
        } else {
            DIMMED_OPACITY
        }
    }

    pub(in crate::app) fn match_count(&self) -> usize {
        self.matches.iter().filter(|hit| **hit).count()
    }

    /// Matching node indices, best fuzzy score first.
    pub(in crate::app) fn ranked(&self) -> &[usize] {
        &self.ranked
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::{Entity, Properties};

    fn entity(id: &str, label: &str, name: &str) -> Entity {
        let mut properties = Properties::new();
        properties.insert("name".to_owned(), json!(name));
        Entity {
            id: id.to_owned(),
            label: label.to_owned(),
            properties,
            x: 0.0,
            y: 0.0,
        }
    }

    fn sample() -> GraphModel {
        GraphModel::from_parts(
            vec![
                entity("1", "Hacker", "ada"),
                entity("2", "Devpost", "ml-tool"),
                entity("3", "Hacker", "grace"),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn dims_everything_but_the_matches() {
        let graph = sample();
        let highlight = SearchHighlight::compute(&graph, &CategoryStyles::default(), "AD", 1);

        assert!(highlight.is_active());
        assert!(highlight.is_match(0));
        assert!(!highlight.is_match(1));
        assert_eq!(highlight.opacity(0), 1.0);
        assert_eq!(highlight.opacity(1), DIMMED_OPACITY);
        assert_eq!(highlight.opacity(2), DIMMED_OPACITY);
        assert_eq!(highlight.ranked(), [0]);
    }

    #[test]
    fn name_query_flags_only_the_matching_hacker() {
        let graph = GraphModel::from_parts(
            vec![
                entity("1", "Hacker", "ada"),
                entity("2", "Devpost", "ml-tool"),
            ],
            Vec::new(),
        );
        let styles = CategoryStyles::default();

        let highlight = SearchHighlight::compute(&graph, &styles, "ada", 1);
        assert!(highlight.is_match(0));
        assert!(!highlight.is_match(1));
        assert_eq!(highlight.match_count(), 1);
        assert_eq!(highlight.opacity(0), 1.0);
        assert_eq!(highlight.opacity(1), DIMMED_OPACITY);

        let cleared = SearchHighlight::compute(&graph, &styles, "", 1);
        assert_eq!(cleared.match_count(), 0);
        assert!(!cleared.is_match(0) && !cleared.is_match(1));
        assert_eq!(cleared.opacity(0), 1.0);
        assert_eq!(cleared.opacity(1), 1.0);
    }

    #[test]
    fn category_text_matches_too() {
        let graph = sample();
        let highlight = SearchHighlight::compute(&graph, &CategoryStyles::default(), "devpost", 1);

        assert_eq!(highlight.match_count(), 1);
        assert!(highlight.is_match(1));
    }

    #[test]
    fn empty_query_restores_full_opacity() {
        let graph = sample();
        let highlight = SearchHighlight::compute(&graph, &CategoryStyles::default(), "  ", 4);

        assert!(!highlight.is_active());
        for index in 0..3 {
            assert_eq!(highlight.opacity(index), 1.0);
        }
        assert!(highlight.is_current("  ", 4));
        assert!(!highlight.is_current("  ", 5));
    }

    #[test]
    fn leaves_the_model_untouched() {
        let graph = sample();
        let before = serde_json::to_value(&graph).unwrap();

        let _ = SearchHighlight::compute(&graph, &CategoryStyles::default(), "a", 1);

        assert_eq!(serde_json::to_value(&graph).unwrap(), before);
    }
}
