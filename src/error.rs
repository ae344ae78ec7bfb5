use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Originating concern of a failure, used for recovery bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    Upstream,
    UserData,
    MarketData,
    SectionGeneration,
    Deduplication,
    Cache,
    RetryExhausted,
    Other,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upstream => "upstream",
            Self::UserData => "user_data",
            Self::MarketData => "market_data",
            Self::SectionGeneration => "section_generation",
            Self::Deduplication => "deduplication",
            Self::Cache => "cache",
            Self::RetryExhausted => "retry_exhausted",
            Self::Other => "other",
        }
    }
}

/// Collaborator services the core depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Recommendation,
    MarketData,
    UserProfile,
    Catalog,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Recommendation => "recommendation",
            Self::MarketData => "market-data",
            Self::UserProfile => "user-profile",
            Self::Catalog => "catalog",
        })
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{service} service failed: {message}")]
    Upstream { service: Service, message: String },

    #[error("section {section} generation failed: {reason}")]
    Generation { section: String, reason: String },

    #[error("cache error: {0}")]
    Cache(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("fallback for {context} failed: {source}")]
    FallbackFailed {
        context: String,
        #[source]
        source: Box<Error>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an upstream service failure.
    pub fn upstream(service: Service, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }

    /// Classify the error by originating concern.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Upstream {
                service: Service::UserProfile,
                ..
            } => ErrorKind::UserData,
            Self::Upstream {
                service: Service::MarketData,
                ..
            } => ErrorKind::MarketData,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Generation { .. } => ErrorKind::SectionGeneration,
            Self::Cache(_) | Self::Json(_) => ErrorKind::Cache,
            Self::FallbackFailed { .. } => ErrorKind::RetryExhausted,
            Self::Config(_)
            | Self::Domain(_)
            | Self::NotFound { .. }
            | Self::Cancelled
            | Self::Io(_) => ErrorKind::Other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
