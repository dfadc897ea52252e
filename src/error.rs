use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::metadata::MetadataKind;

#[derive(Error, Debug)]
pub enum PullpoError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP {status}: {message} ({url})")]
    ApiError {
        status: u16,
        url: String,
        message: String,
    },

    #[error("{0}")]
    GraphQL(GraphQLErrorResponse),

    #[error("Empty response from API")]
    EmptyResponse,

    #[error("Failed to read config file at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("No token found for {0}. Set GH_TOKEN or add token to the pullpo config.toml")]
    MissingToken(String),

    #[error("could not resolve {kind} '{name}'")]
    Unresolved { kind: MetadataKind, name: String },

    #[error("{0}")]
    InvalidRepo(String),

    #[error("invalid milestone state: {0}")]
    InvalidMilestoneState(String),

    #[error("invalid project resource path: {0}")]
    InvalidProjectPath(String),
}

impl PullpoError {
    pub(crate) fn unresolved(kind: MetadataKind, name: &str) -> Self {
        Self::Unresolved {
            kind,
            name: name.to_string(),
        }
    }

    /// True for a GraphQL error carrying `error_type` at a path starting with `path`.
    pub fn is_graphql(&self, error_type: &str, path: &[&str]) -> bool {
        match self {
            Self::GraphQL(response) => response.matches(error_type, path),
            _ => false,
        }
    }
}

/// The `errors` array of a GraphQL response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQLErrorResponse {
    pub errors: Vec<GraphQLErrorItem>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GraphQLErrorItem {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub path: Option<Vec<serde_json::Value>>,
}

impl GraphQLErrorItem {
    fn path_starts_with(&self, prefix: &[&str]) -> bool {
        let path = self.path.as_deref().unwrap_or_default();
        prefix.len() <= path.len()
            && prefix
                .iter()
                .zip(path)
                .all(|(want, got)| got.as_str() == Some(*want))
    }
}

impl GraphQLErrorResponse {
    /// Every error must match for the response to be tolerated.
    pub fn matches(&self, error_type: &str, path: &[&str]) -> bool {
        !self.errors.is_empty()
            && self
                .errors
                .iter()
                .all(|e| e.error_type == error_type && e.path_starts_with(path))
    }
}

impl fmt::Display for GraphQLErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "GraphQL: {}", messages.join(", "))
    }
}

pub type Result<T> = std::result::Result<T, PullpoError>;
