//! Reading the JSON inputs of a federated source.
//!
//! A source brings three documents: its capability document (which may be
//! served by the catalog itself), an optional source configuration and the
//! query to translate. All are plain JSON [`Value`]s until the owning module
//! deserializes them.

use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;

use crate::capabilities::CapabilitySet;
use crate::error::{ConfigError, LoadError};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Upper bound on fetching a remote capability document.
#[cfg(feature = "remote")]
const CAPABILITIES_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Read a capability, configuration or query document from disk.
///
/// # Errors
///
/// `FileNotFound` when nothing exists at `path`, `ReadError` for other I/O
/// failures and `InvalidJson` when the bytes are not JSON.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::ReadError {
            path: path.to_path_buf(),
            source,
        },
    })?;

    load_document_str(&content)
}

/// Parse document text that is already in memory.
pub fn load_document_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Fetch a document published by a catalog endpoint.
///
/// Non-2xx responses count as network failures. Only built with the
/// `remote` feature.
///
/// # Errors
///
/// `NetworkError` for connection, timeout and status failures; `InvalidJson`
/// when the body is not JSON.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, LoadError> {
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(CAPABILITIES_FETCH_TIMEOUT)
        .build()
        .map_err(network)?;

    let body = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network)?;

    load_document_str(&body)
}

/// Dispatch on the shape of `source`: endpoint URLs are fetched, anything
/// else is a path.
///
/// Without the `remote` feature a URL is reported as a missing file.
pub fn load_document_auto(source: &str) -> Result<Value, LoadError> {
    if !is_url(source) {
        return load_document(Path::new(source));
    }

    #[cfg(feature = "remote")]
    {
        load_document_url(source)
    }
    #[cfg(not(feature = "remote"))]
    {
        Err(LoadError::FileNotFound {
            path: source.into(),
        })
    }
}

/// Load the operators and geometry operands a source advertises.
pub fn load_capabilities(source: &str) -> Result<CapabilitySet, ConfigError> {
    let document = load_document_auto(source)?;
    tracing::debug!(source, "loaded capability document");
    Ok(CapabilitySet::from_value(&document)?)
}

/// Whether `source` names an http(s) endpoint rather than a path.
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn url_detection() {
        assert!(is_url("https://catalog.example.com/csw"));
        assert!(is_url("http://localhost:8080/caps.json"));
        assert!(!is_url("caps.json"));
        assert!(!is_url("/etc/caps.json"));
    }

    #[test]
    fn missing_file_is_not_a_read_error() {
        let err = load_document(&PathBuf::from("/nonexistent/caps.json")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_a_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_document(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::ReadError { .. }));
    }

    #[test]
    fn invalid_json_string() {
        let err = load_document_str("{ not json").unwrap_err();
        assert!(matches!(err, LoadError::InvalidJson { .. }));
    }

    #[test]
    fn missing_capabilities_surface_as_capability_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("caps.json");
        std::fs::write(&path, r#"{"spatialOperators": []}"#).unwrap();

        let err = load_capabilities(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Capability(crate::error::CapabilityError::MissingComparisonOperators)
        ));
    }
}
