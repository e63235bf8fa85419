use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::FetchError;
use super::graph::Properties;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawNode {
    #[serde(deserialize_with = "store_id")]
    pub id: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawRelationship {
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(rename = "startNode", deserialize_with = "store_id")]
    pub start_node: String,
    #[serde(rename = "endNode", deserialize_with = "store_id")]
    pub end_node: String,
    #[serde(default)]
    pub properties: Properties,
}

/// Every node and relationship of every returned row, duplicates included.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
    pub relationships: Vec<RawRelationship>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQueryResponse {
    pub records: Vec<Map<String, Value>>,
    pub summary: QuerySummary,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QuerySummary {
    pub timings: QueryTimings,
    pub counters: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTimings {
    pub client_ms: u64,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
    #[serde(default)]
    stats: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    #[serde(default)]
    row: Vec<Value>,
    #[serde(default)]
    graph: Option<TxGraph>,
}

#[derive(Debug, Deserialize)]
struct TxGraph {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    relationships: Vec<RawRelationship>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

fn store_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or integer id, found {other}"
        ))),
    }
}

fn parse_tx_results(raw: &str) -> Result<Vec<TxResult>, FetchError> {
    let response: TxResponse = serde_json::from_str(raw)?;
    if let Some(error) = response.errors.into_iter().next() {
        return Err(FetchError::Query {
            code: error.code,
            message: error.message,
        });
    }
    Ok(response.results)
}

pub(super) fn parse_graph_response(raw: &str) -> Result<RawGraph, FetchError> {
    let mut graph = RawGraph::default();

    for result in parse_tx_results(raw)? {
        for row in result.data {
            let Some(row_graph) = row.graph else {
                continue;
            };
            graph.nodes.extend(row_graph.nodes);
            graph.relationships.extend(row_graph.relationships);
        }
    }

    Ok(graph)
}

pub(super) fn parse_records_response(
    raw: &str,
    client_ms: u64,
) -> Result<RawQueryResponse, FetchError> {
    let mut records = Vec::new();
    let mut counters = Map::new();

    for result in parse_tx_results(raw)? {
        for row in result.data {
            let record = result
                .columns
                .iter()
                .cloned()
                .zip(row.row)
                .collect::<Map<_, _>>();
            records.push(record);
        }
        if let Some(stats) = result.stats {
            counters.extend(stats);
        }
    }

    Ok(RawQueryResponse {
        records,
        summary: QuerySummary {
            timings: QueryTimings { client_ms },
            counters,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH_RESPONSE: &str = r#"{
        "results": [{
            "columns": ["n", "r", "m"],
            "data": [
                {"graph": {
                    "nodes": [
                        {"id": "5", "labels": ["Hacker"], "properties": {"name": "ada"}},
                        {"id": 7, "labels": ["Devpost"], "properties": {"name": "ml-tool"}}
                    ],
                    "relationships": [
                        {"id": "12", "type": "CONTRIBUTED_TO", "startNode": "5", "endNode": 7, "properties": {}}
                    ]
                }},
                {"graph": {
                    "nodes": [{"id": "5", "labels": ["Hacker"], "properties": {"name": "ada"}}],
                    "relationships": []
                }}
            ]
        }],
        "errors": []
    }"#;

    #[test]
    fn flattens_rows_and_keeps_duplicates() {
        let graph = parse_graph_response(GRAPH_RESPONSE).unwrap();

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.nodes[1].id, "7");
        assert_eq!(graph.relationships.len(), 1);
        assert_eq!(graph.relationships[0].end_node, "7");
    }

    #[test]
    fn store_errors_become_query_errors() {
        let raw = r#"{"results": [], "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "bad"}]}"#;

        match parse_graph_response(raw) {
            Err(FetchError::Query { code, message }) => {
                assert_eq!(code, "Neo.ClientError.Statement.SyntaxError");
                assert_eq!(message, "bad");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rows_zip_with_columns_and_stats_become_counters() {
        let raw = r#"{
            "results": [{
                "columns": ["name", "projects"],
                "data": [{"row": ["ada", 3]}, {"row": ["grace", 1]}],
                "stats": {"nodes_created": 0, "contains_updates": false}
            }],
            "errors": []
        }"#;

        let response = parse_records_response(raw, 42).unwrap();

        assert_eq!(response.records.len(), 2);
        assert_eq!(response.records[1]["name"], "grace");
        assert_eq!(response.summary.counters["nodes_created"], 0);
        assert_eq!(response.summary.timings.client_ms, 42);
    }

    #[test]
    fn object_ids_are_rejected() {
        let raw = r#"{"results": [{"data": [{"graph": {"nodes": [{"id": {}, "labels": []}]}}]}]}"#;

        assert!(matches!(
            parse_graph_response(raw),
            Err(FetchError::Decode(_))
        ));
    }
}
