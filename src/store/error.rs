use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request: {0}")]
    Input(String),

    #[error("graph store unreachable at {url}: {source}")]
    Unavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("graph store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("graph store rejected the query ({code}): {message}")]
    Query { code: String, message: String },

    #[error("malformed graph store response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}
