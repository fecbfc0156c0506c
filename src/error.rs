//! Defines [`GeoSeqError`], representing all errors returned by this crate.

use thiserror::Error;

use crate::wkb::WkbError;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GeoSeqError {
    /// An argument that does not describe a usable view, such as a buffer too short for the
    /// requested window or an Arrow array whose nesting does not match the target type.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A malformed WKB blob.
    #[error("WKB error: {0}")]
    Wkb(#[from] WkbError),
}

/// Crate-specific result type.
pub type GeoSeqResult<T> = std::result::Result<T, GeoSeqError>;
