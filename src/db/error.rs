//! Storage error taxonomy.

/// Errors surfaced by repository operations.
///
/// Clone is required so a single shared open future can hand the same
/// failure to every caller awaiting it.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// The backend could not be opened or the storage engine failed.
    Unavailable(String),
    /// A nutrition payload failed to serialize or parse.
    MalformedPayload(String),
    /// A caller-supplied value violated a domain constraint.
    InvalidInput(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Unavailable(e) => write!(f, "Storage unavailable: {}", e),
            StorageError::MalformedPayload(e) => write!(f, "Malformed nutrition payload: {}", e),
            StorageError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::MalformedPayload(e.to_string())
    }
}
