//! Error types for the OSC codec

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// OSC codec error types
#[derive(Error, Debug)]
pub enum Error {
    /// Address rejected at the encode boundary
    #[error("invalid address: {0:?} (must be non-empty and start with '/')")]
    InvalidAddress(String),

    /// Decode ran out of bytes mid-field
    #[error("buffer too small: need {needed} bytes, have {have}")]
    TruncatedBuffer { needed: usize, have: usize },

    /// Bundle element with an unusable size prefix or structure
    #[error("malformed bundle element: {0}")]
    MalformedBundleElement(String),

    /// Type tag character with no defined codec
    #[error("unsupported type tag: '{0}'")]
    UnsupportedTag(char),
}
