//! Error types for capability parsing, predicate construction and document loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while interpreting a remote service's filter capability advertisement.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("capability document does not advertise comparison operators")]
    MissingComparisonOperators,

    #[error("capability document does not advertise spatial operators")]
    MissingSpatialOperators,

    #[error("invalid capability document: {message}")]
    InvalidDocument { message: String },
}

impl CapabilityError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while building a predicate tree.
///
/// Every variant is a query rejection: it is raised before anything is
/// rendered or sent to the remote service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("operator {operator} is not supported by the source")]
    UnsupportedOperator { operator: String },

    #[error("geometry type {kind} is not supported by the source")]
    UnsupportedGeometry { kind: String },

    #[error("{operator} requires {expected} operand(s), got {count}")]
    InvalidArity {
        operator: String,
        expected: &'static str,
        count: usize,
    },

    #[error("logical operators are not supported by the source")]
    LogicalNotSupported,

    #[error("cannot convert \"{input}\" to a date: {message}")]
    LiteralCoercion { input: String, message: String },

    #[error("invalid WKT \"{wkt}\": {message}")]
    InvalidWkt { wkt: String, message: String },

    #[error("invalid distance {distance}: must be finite and non-negative")]
    InvalidDistance { distance: f64 },

    #[error("operator {operator} cannot be used here: {hint}")]
    MisplacedOperator {
        operator: String,
        hint: &'static str,
    },
}

/// Error returned when a query expression cannot be turned into a predicate.
pub type QueryBuildError = BuildError;

impl BuildError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Errors loading JSON documents (capabilities, configs, queries).
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// Errors reading a source configuration or query document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error("invalid {what}: {source}")]
    Invalid {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::Load(e) => e.exit_code(),
            ConfigError::Capability(e) => e.exit_code(),
            ConfigError::Invalid { .. } => 2,
        }
    }
}
