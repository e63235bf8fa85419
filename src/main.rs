mod app;
mod store;
mod util;

use std::io::{self, Write as _};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result, anyhow};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use store::{FetchParams, FetchRequest, StoreClient, StoreConfig, Viewport, fetch_graph_model};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the graph store's HTTP endpoint.
    #[arg(long, env = "HACKER_GRAPH_STORE_URL", default_value = "http://localhost:7474")]
    store_url: String,

    #[arg(long, env = "HACKER_GRAPH_DATABASE", default_value = "neo4j")]
    database: String,

    #[arg(long, env = "NEO4J_USER", default_value = "neo4j")]
    user: String,

    #[arg(long, env = "NEO4J_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,

    #[command(flatten)]
    fetch: FetchArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, clap::Args)]
struct FetchArgs {
    /// all, hackers, devposts, hackathons, or a category name.
    #[arg(long, default_value = "all")]
    node_type: String,

    #[arg(long, allow_hyphen_values = true)]
    limit: Option<String>,

    /// Switches to a radius fetch around the node with this name.
    #[arg(long)]
    start_name: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    hops: Option<String>,
}

impl FetchArgs {
    fn params(&self) -> FetchParams {
        FetchParams {
            node_type: Some(self.node_type.clone()),
            limit: self.limit.clone(),
            start_name: self.start_name.clone(),
            hops: self.hops.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch once and print the normalized graph as JSON.
    Fetch,
    /// Run a raw statement and print its records.
    Query {
        statement: String,
        /// Statement parameter as key=value. Values are parsed as JSON when possible.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("parameter name is empty in {raw:?}"));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
    Ok((key.to_owned(), value))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("failed to write JSON output")?;
    writeln!(stdout)?;
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = StoreConfig {
        base_url: args.store_url.clone(),
        database: args.database.clone(),
        user: args.user.clone(),
        password: args.password.clone(),
        timeout: Duration::from_secs(args.timeout_secs.max(1)),
    };
    let client = StoreClient::new(config).context("failed to build graph store client")?;
    info!(url = %client.commit_url(), "graph store configured");

    match args.command {
        Some(Command::Query { statement, params }) => {
            let params = params.into_iter().collect::<Map<_, _>>();
            let response = client
                .run_raw(&statement, &params)
                .context("raw query failed")?;
            print_json(&response)
        }
        Some(Command::Fetch) => {
            let request = FetchRequest::from_params(&args.fetch.params())?;
            let model = fetch_graph_model(
                &client,
                &request,
                Viewport::default(),
                &mut rand::thread_rng(),
            )
            .with_context(|| format!("failed to fetch {}", request.describe()))?;
            print_json(&model)
        }
        None => {
            let request = FetchRequest::from_params(&args.fetch.params())?;
            let options = eframe::NativeOptions {
                viewport: eframe::egui::ViewportBuilder::default()
                    .with_inner_size([1440.0, 920.0]),
                ..Default::default()
            };
            let source = Arc::new(client);

            eframe::run_native(
                "hacker-graph",
                options,
                Box::new(move |cc| Ok(Box::new(app::GraphExplorerApp::new(cc, source, request)))),
            )
            .map_err(|error| anyhow!("viewer failed: {error}"))
        }
    }
}
