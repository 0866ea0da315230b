use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Unknown column '{column}' for staging filter on {table}")]
    UnknownColumn { table: &'static str, column: String },

    #[error("Staging filter for {table} has no conditions")]
    EmptyFilter { table: &'static str },

    #[error("Archive mismatch: copied {copied} rows to history but deleted {deleted} from ledger")]
    ArchiveMismatch { copied: usize, deleted: usize },

    #[error("Invalid exception status '{0}'")]
    InvalidStatus(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
