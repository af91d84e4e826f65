use thiserror::Error;

/// Errors that can occur when talking to the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored document did not match the expected shape, or a document
    /// could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A document with the same identifier already exists.
    #[error("Duplicate key in {collection}: {id}")]
    DuplicateKey {
        collection: &'static str,
        id: String,
    },

    /// The aggregation pipeline has a shape the store cannot run.
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// An aggregated value does not fit in a 64-bit integer.
    #[error("Aggregate value out of range")]
    AggregateOverflow,

    /// The store refused or could not complete the call.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true if the failure came from decoding a stored document.
    pub fn is_decoding(&self) -> bool {
        matches!(self, StoreError::Serialization(_))
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
