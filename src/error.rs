//! Crate-wide error taxonomy.
//!
//! Hardware failures are not recovered anywhere: the physical output is the
//! product, so a failed write terminates the process (see `surface::present`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LightError {
    /// Malformed hex color string.
    #[error("the hex value is not in the correct format, expected RRGGBB or #RRGGBB, got {0:?}")]
    InvalidFormat(String),

    /// A required request field was absent.
    #[error("red, green and blue must be present and can't be empty")]
    MissingField,

    /// The display rejected a write or present.
    #[error("display hardware failure: {0}")]
    Hardware(String),
}
