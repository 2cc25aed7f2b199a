//! Error types for the harvester.
//!
//! A single `HarvesterError` covers every failure the library surfaces.
//! Recoverable anomalies (unverified downloads, unclassifiable file names)
//! are reported as values instead, see [`crate::fetch::Integrity`] and
//! [`crate::catalog::DocumentTypes`].

use thiserror::Error;

/// Boxed source error of a transport implementation.
pub type TransportSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// The listing service failed to connect, list, size or retrieve.
    #[error("Catalog {operation} failed for '{path}': {source}")]
    Transport {
        operation: &'static str,
        path: String,
        #[source]
        source: TransportSource,
    },

    /// Every download attempt disagreed with the size reported by the catalog.
    #[error("Download of '{path}' never matched its catalog size after {attempts} attempt(s): expected {expected} bytes, got {received}")]
    IntegrityExhausted {
        path: String,
        attempts: u32,
        expected: u64,
        received: u64,
    },

    /// Downloaded bytes could not be opened as a zip archive.
    #[error("Malformed archive '{path}': {source}")]
    MalformedArchive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Reading a member out of an opened archive failed.
    #[error("Archive read failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// XML parsing failed.
    #[error("XML parsing failed for {context}: {source}")]
    XmlParse {
        context: String,
        #[source]
        source: roxmltree::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML serialization failed: {0}")]
    YamlSerialization(#[from] serde_yaml_ng::Error),
}

impl HarvesterError {
    /// Wrap a transport-level failure with the operation and path involved.
    pub fn transport(
        operation: &'static str,
        path: &str,
        source: impl Into<TransportSource>,
    ) -> Self {
        Self::Transport {
            operation,
            path: path.to_string(),
            source: source.into(),
        }
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display() {
        let err = HarvesterError::transport(
            "list",
            "moskva/contracts",
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer"),
        );
        assert_eq!(
            err.to_string(),
            "Catalog list failed for 'moskva/contracts': reset by peer"
        );
    }

    #[test]
    fn test_transport_keeps_source() {
        use std::error::Error as _;

        let err = HarvesterError::transport("size", "a.zip", "550 No such file");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("550 No such file".to_string())
        );
    }

    #[test]
    fn test_integrity_exhausted_display() {
        let err = HarvesterError::IntegrityExhausted {
            path: "moskva/a.zip".to_string(),
            attempts: 3,
            expected: 100,
            received: 60,
        };
        let msg = err.to_string();
        assert!(msg.contains("moskva/a.zip"));
        assert!(msg.contains("3 attempt(s)"));
        assert!(msg.contains("expected 100 bytes, got 60"));
    }
}
