//! Error types for modal construction and configuration.

/// Result type alias for fallible modal operations.
pub type Result<T> = std::result::Result<T, MoviaError>;

#[derive(Debug, thiserror::Error)]
pub enum MoviaError {
    /// Neither inline content nor a template reference was supplied.
    #[error("a movia needs either `content` or `templateId`")]
    MissingContent,

    #[error("unknown close method '{0}' (expected button, overlay or escape)")]
    UnknownCloseMethod(String),

    /// A settings document could not be decoded.
    #[error("invalid movia settings: {0}")]
    InvalidSettings(String),
}
