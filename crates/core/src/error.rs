//! Domain-level error type shared across core utilities.

/// Errors raised by core utilities (crypto, payload validation).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The configured encryption key is missing or malformed.
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    /// Encryption or decryption failed.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// An input value failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}
