//! Common Result Type
//!
//! Type alias for build-time results.

use super::error::ZephyrError;

/// Build-time result type
///
/// Runtime manifest failures never use this; they are reported to observers.
pub type ZephyrResult<T> = Result<T, ZephyrError>;
