//! Crate-wide error hierarchy.
//!
//! Mirrors the layering the teacher crate uses between `MapBlockError`,
//! `MapDataError` and `WorldError`: each layer wraps the one below it via
//! `#[from]`, and a single top-level error unifies everything a command can
//! fail with.

/// Failure to parse or serialize a single mapblock.
#[derive(thiserror::Error, Debug)]
pub enum MapblockError {
    /// The mapblock did not follow the expected binary structure.
    #[error("mapblock malformed: {0}")]
    Malformed(String),

    /// The underlying reader ran out of data or otherwise failed.
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),

    /// The mapblock's format version is not one this codec understands.
    #[error("unsupported mapblock version {0}")]
    UnsupportedVersion(u8),
}

/// Failure in the store backend.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("'{0}' does not contain a 'blocks' table with the expected schema")]
    MissingSchema(String),

    #[error("mapblock {0} does not exist")]
    BlockNotFound(i64),
}

/// Invalid arguments or incompatible flags, detected before any store
/// mutation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid node/item name '{0}': must match ^[a-zA-Z0-9_]+:[a-zA-Z0-9_]+$")]
    InvalidName(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("the operation was cancelled by the user")]
    Cancelled,
}

/// Top-level error returned by command execution.
#[derive(thiserror::Error, Debug)]
pub enum MapEditError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Mapblock(#[from] MapblockError),
}

pub type Result<T> = std::result::Result<T, MapEditError>;
