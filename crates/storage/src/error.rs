use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The store as a whole cannot be reached or written.
    #[error("lead store unavailable: {0}")]
    Unavailable(String),

    /// A single record was rejected; other records may still succeed.
    #[error("record {id} rejected: {message}")]
    Record { id: String, message: String },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Systemic errors abort a batch; the rest are per-lead.
    pub fn is_systemic(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => Self::Record {
                id: String::new(),
                message: db.to_string(),
            },
            sqlx::Error::RowNotFound => Self::Record {
                id: String::new(),
                message: "row not found".to_string(),
            },
            other => Self::Unavailable(other.to_string()),
        }
    }
}
