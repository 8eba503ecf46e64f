//! Error types for DishaGW

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DishaGW error types
///
/// Malformed device input is not an error: the decode path silently drops
/// frames that match no grammar. Errors are reserved for transport and
/// configuration faults that should terminate a connection or the startup
/// sequence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse error
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
