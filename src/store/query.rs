use std::fmt::Write as _;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::FetchError;

pub const MIN_HOPS: u32 = 1;
pub const MAX_HOPS: u32 = 100;
pub const DEFAULT_HOPS: u32 = 2;
pub const DEFAULT_FILTERED_LIMIT: usize = 500;
pub const DEFAULT_RADIUS_LIMIT: usize = 100;
pub const MAX_NODE_LIMIT: usize = 5000;

const CATEGORY_ALIASES: [(&str, &str); 3] = [
    ("hackers", "Hacker"),
    ("devposts", "Devpost"),
    ("hackathons", "Hackathon"),
];

/// Raw request parameters as they arrive from the CLI or the controls panel.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    pub node_type: Option<String>,
    pub limit: Option<String>,
    pub start_name: Option<String>,
    pub hops: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeFilter {
    All,
    Category(String),
}

impl NodeFilter {
    pub fn parse(raw: Option<&str>) -> Result<Self, FetchError> {
        let value = raw.map(str::trim).unwrap_or_default();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        if let Some((_, category)) = CATEGORY_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(value))
        {
            return Ok(Self::Category((*category).to_owned()));
        }

        if is_identifier(value) {
            Ok(Self::Category(value.to_owned()))
        } else {
            Err(FetchError::input(format!(
                "node type {value:?} is not a valid category name"
            )))
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Category(category) => Some(category),
        }
    }

    fn pattern(&self, variable: &str) -> String {
        match self {
            Self::All => format!("({variable})"),
            Self::Category(category) => format!("({variable}:`{category}`)"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchRequest {
    Filtered {
        filter: NodeFilter,
        limit: usize,
    },
    Radius {
        filter: NodeFilter,
        start_name: String,
        hops: u32,
        limit: usize,
    },
}

impl FetchRequest {
    pub fn from_params(params: &FetchParams) -> Result<Self, FetchError> {
        let filter = NodeFilter::parse(params.node_type.as_deref())?;
        let start_name = params
            .start_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        Ok(match start_name {
            Some(start_name) => Self::Radius {
                filter,
                start_name: start_name.to_owned(),
                hops: parse_hops(params.hops.as_deref()),
                limit: parse_limit(params.limit.as_deref(), DEFAULT_RADIUS_LIMIT),
            },
            None => Self::Filtered {
                filter,
                limit: parse_limit(params.limit.as_deref(), DEFAULT_FILTERED_LIMIT),
            },
        })
    }

    pub fn limit(&self) -> usize {
        match self {
            Self::Filtered { limit, .. } | Self::Radius { limit, .. } => *limit,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Filtered { filter, limit } => format!(
                "{} (limit {limit})",
                filter.category().unwrap_or("all nodes")
            ),
            Self::Radius {
                start_name,
                hops,
                limit,
                ..
            } => format!("{start_name} within {hops} hops (limit {limit})"),
        }
    }

    pub fn to_query(&self) -> TraversalQuery {
        let mut parameters = Map::new();
        let mut statement = String::new();

        match self {
            Self::Filtered { filter, limit } => {
                parameters.insert("limit".to_owned(), Value::from(*limit));
                let _ = writeln!(statement, "MATCH {}", filter.pattern("n"));
                statement.push_str("WITH n LIMIT $limit\n");
                statement.push_str("OPTIONAL MATCH (n)-[r]-(m)\n");
                statement.push_str("RETURN n, r, m");
            }
            Self::Radius {
                filter,
                start_name,
                hops,
                limit,
            } => {
                parameters.insert("limit".to_owned(), Value::from(*limit));
                parameters.insert("startName".to_owned(), Value::from(start_name.as_str()));
                let hops = (*hops).clamp(MIN_HOPS, MAX_HOPS);
                let start = match filter {
                    NodeFilter::All => "(start {name: $startName})".to_owned(),
                    NodeFilter::Category(category) => {
                        format!("(start:`{category}` {{name: $startName}})")
                    }
                };
                let _ = writeln!(statement, "MATCH {start}");
                let _ = writeln!(statement, "MATCH (start)-[*0..{hops}]-(n)");
                statement.push_str("WITH DISTINCT n LIMIT $limit\n");
                statement.push_str("WITH collect(n) AS selected\n");
                statement.push_str("UNWIND selected AS a\n");
                statement.push_str("OPTIONAL MATCH (a)-[r]-(b)\n");
                statement.push_str("WHERE b IN selected\n");
                statement.push_str("RETURN a, r, b");
            }
        }

        TraversalQuery {
            statement,
            parameters,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TraversalQuery {
    pub statement: String,
    pub parameters: Map<String, Value>,
}

pub fn clamp_hops(raw: i64) -> u32 {
    raw.clamp(i64::from(MIN_HOPS), i64::from(MAX_HOPS)) as u32
}

pub fn parse_hops(raw: Option<&str>) -> u32 {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return DEFAULT_HOPS;
    };

    match value.parse::<i64>() {
        Ok(hops) => clamp_hops(hops),
        // Digit strings too long for i64 still carry a sign worth honoring.
        Err(_) if is_signed_digits(value) => {
            if value.starts_with('-') {
                MIN_HOPS
            } else {
                MAX_HOPS
            }
        }
        Err(_) => DEFAULT_HOPS,
    }
}

pub fn parse_limit(raw: Option<&str>, default: usize) -> usize {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return default;
    };

    match value.parse::<i64>() {
        Ok(limit) if limit > 0 => (limit as u64).min(MAX_NODE_LIMIT as u64) as usize,
        Err(_) if is_signed_digits(value) && !value.starts_with('-') => MAX_NODE_LIMIT,
        _ => default,
    }
}

fn is_signed_digits(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|rest| rest.is_ascii_alphanumeric() || rest == '_')
}
