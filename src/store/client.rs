use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::error::FetchError;
use super::parse::{RawGraph, RawQueryResponse, parse_graph_response, parse_records_response};
use super::query::TraversalQuery;

pub trait GraphSource: Send + Sync {
    fn fetch_graph(&self, query: &TraversalQuery) -> Result<RawGraph, FetchError>;
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub base_url: String,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    pub timeout: Duration,
}

pub struct StoreClient {
    http: Client,
    config: StoreConfig,
    commit_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Statement<'a> {
    statement: &'a str,
    parameters: &'a Map<String, Value>,
    result_data_contents: [&'static str; 1],
    include_stats: bool,
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: [Statement<'a>; 1],
}

impl<'a> TxRequest<'a> {
    /// One statement per transaction; stats are only requested for row results.
    fn single(
        statement: &'a str,
        parameters: &'a Map<String, Value>,
        contents: &'static str,
    ) -> Self {
        Self {
            statements: [Statement {
                statement,
                parameters,
                result_data_contents: [contents],
                include_stats: contents == "row",
            }],
        }
    }
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> Result<Self, FetchError> {
        let commit_url = format!(
            "{}/db/{}/tx/commit",
            config.base_url.trim_end_matches('/'),
            config.database
        );
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| FetchError::Unavailable {
                url: commit_url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            config,
            commit_url,
        })
    }

    pub fn commit_url(&self) -> &str {
        &self.commit_url
    }

    fn commit(
        &self,
        statement: &str,
        parameters: &Map<String, Value>,
        contents: &'static str,
    ) -> Result<String, FetchError> {
        let body = TxRequest::single(statement, parameters, contents);

        debug!(url = %self.commit_url, %statement, "sending statement to graph store");
        let unavailable = |source: reqwest::Error| FetchError::Unavailable {
            url: self.commit_url.clone(),
            source,
        };
        let response = self
            .http
            .post(&self.commit_url)
            .basic_auth(&self.config.user, self.config.password.as_deref())
            .json(&body)
            .send()
            .map_err(unavailable)?;

        let status = response.status();
        let text = response.text().map_err(unavailable)?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    pub fn run_raw(
        &self,
        query: &str,
        params: &Map<String, Value>,
    ) -> Result<RawQueryResponse, FetchError> {
        if query.trim().is_empty() {
            return Err(FetchError::input("query is required"));
        }

        let started = Instant::now();
        let text = self.commit(query, params, "row")?;
        let client_ms = started.elapsed().as_millis() as u64;
        parse_records_response(&text, client_ms)
    }
}

impl GraphSource for StoreClient {
    fn fetch_graph(&self, query: &TraversalQuery) -> Result<RawGraph, FetchError> {
        let text = self.commit(&query.statement, &query.parameters, "graph")?;
        parse_graph_response(&text)
    }
}
