use thiserror::Error;

/// Bridge error types covering connection, configuration, and fieldbus faults.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HandError {
    /// Adapter open failure, or an empty bus discovered during `start()`.
    #[error("connection error: {0}")]
    Connection(String),

    /// Configuration document unreadable, unparseable, or missing a required field.
    #[error("configuration error: {0}")]
    Config(String),

    /// Cyclic exchange or wire-port failure.
    #[error("fieldbus error: {0}")]
    Fieldbus(String),

    /// I/O operation error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Invalid link state transition attempted.
    #[error("invalid link transition from {from} to {to}")]
    InvalidTransition {
        /// Source state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

/// Convenience type alias for bridge operations.
pub type HandResult<T> = Result<T, HandError>;
