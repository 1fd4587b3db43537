use thiserror::Error;

/// Boxfile error types
#[derive(Error, Debug)]
pub enum BoxfileError {
    /// Malformed instruction or unterminated line continuation
    #[error("Parse error: {0}")]
    Parse(String),

    /// Command execution or file transfer failed on the target
    #[error("Runner error: {0}")]
    Runner(String),

    /// USER names an account unknown to the local user database
    #[error("User lookup error: {0}")]
    Lookup(String),

    /// Backend configuration problem detected before any command ran
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Boxfile operations
pub type Result<T> = std::result::Result<T, BoxfileError>;
