//! Error types for autoblog operations.
//!
//! Inside the core everything is an [`AutoblogError`]. At the surfaces the
//! CLI wraps errors with a command prefix and exits non-zero, while the web
//! viewer buckets them through [`classify`] for display.

use thiserror::Error;

/// Error type shared by all core operations
#[derive(Error, Debug)]
pub enum AutoblogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("automerge error: {0}")]
    Automerge(#[from] automerge::AutomergeError),

    #[error("document hydrate error: {0}")]
    Hydrate(#[from] autosurgeon::HydrateError),

    #[error("document reconcile error: {0}")]
    Reconcile(#[from] autosurgeon::ReconcileError),

    #[error("invalid document id: {0}")]
    InvalidDocumentId(String),

    #[error("document not found locally: {0}")]
    DocumentNotFound(String),

    #[error("post not found: {0}")]
    PostNotFound(String),

    #[error("invalid post: {0}")]
    InvalidPost(String),

    #[error("front matter error: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("config format error: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    #[error("sync error: {0}")]
    Sync(String),
}

pub type Result<T, E = AutoblogError> = std::result::Result<T, E>;

/// Coarse bucket for presenting an error to a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Storage,
    Document,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Storage => "storage",
            ErrorKind::Document => "document",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const NETWORK_HINTS: &[&str] = &[
    "connection",
    "network",
    "timed out",
    "timeout",
    "websocket",
    "unreachable",
];

const STORAGE_HINTS: &[&str] = &[
    "i/o",
    "file",
    "storage",
    "permission denied",
    "disk",
    "directory",
];

const DOCUMENT_HINTS: &[&str] = &[
    "document",
    "automerge",
    "hydrate",
    "reconcile",
    "front matter",
];

/// Bucket an error message into a coarse kind by substring matching.
///
/// Intentionally heuristic: the underlying CRDT library does not expose a
/// typed error channel across the sync boundary, so message text is all the
/// surfaces have to go on.
pub fn classify(message: &str) -> ErrorKind {
    let message = message.to_lowercase();
    if NETWORK_HINTS.iter().any(|hint| message.contains(hint)) {
        ErrorKind::Network
    } else if STORAGE_HINTS.iter().any(|hint| message.contains(hint)) {
        ErrorKind::Storage
    } else if DOCUMENT_HINTS.iter().any(|hint| message.contains(hint)) {
        ErrorKind::Document
    } else {
        ErrorKind::Unknown
    }
}

impl AutoblogError {
    /// Classify this error for display
    pub fn kind(&self) -> ErrorKind {
        classify(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_network() {
        assert_eq!(classify("WebSocket connection refused"), ErrorKind::Network);
        assert_eq!(classify("sync timed out after 30000ms"), ErrorKind::Network);
    }

    #[test]
    fn test_classify_storage() {
        assert_eq!(
            classify("I/O error: No such file or directory"),
            ErrorKind::Storage
        );
        assert_eq!(classify("permission denied"), ErrorKind::Storage);
    }

    #[test]
    fn test_classify_document() {
        assert_eq!(classify("document hydrate error: bad type"), ErrorKind::Document);
        assert_eq!(classify("automerge error: invalid change"), ErrorKind::Document);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("something else entirely"), ErrorKind::Unknown);
    }

    #[test]
    fn test_error_kind_comes_from_message() {
        let err = AutoblogError::Sync("connection reset by peer".into());
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_missing_document_buckets_as_document() {
        let err = AutoblogError::DocumentNotFound("4NMNnkMhL8".into());
        assert_eq!(err.kind(), ErrorKind::Document);
    }
}
