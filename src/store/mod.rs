mod client;
mod error;
mod graph;
mod normalize;
mod parse;
mod query;

pub use client::{GraphSource, StoreClient, StoreConfig};
pub use error::FetchError;
pub use graph::{
    Entity, GraphModel, Properties, Relation, UNDISCOVERED_CATEGORY, UNKNOWN_CATEGORY, Viewport,
};
pub use normalize::fetch_graph_model;
pub use query::{FetchParams, FetchRequest, NodeFilter};
