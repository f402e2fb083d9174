use thiserror::Error;

/// Main error type for Galach operations
///
/// Tokenizing and parsing are infallible; errors only arise from the
/// generator layer, where they signal mis-assembled visitor sets rather
/// than bad input.
#[derive(Error, Debug)]
pub enum GalachError {
    #[error("no visitor registered for node kind '{0}'")]
    UnhandledNode(&'static str),

    #[error("visitor for node kind '{kind}' cannot render: {reason}")]
    RenderFailed { kind: &'static str, reason: String },
}

/// Result type alias for Galach operations
pub type Result<T> = std::result::Result<T, GalachError>;
