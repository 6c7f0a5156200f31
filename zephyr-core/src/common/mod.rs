//! Common Utilities
//!
//! Errors, environment access, HTTP and path helpers shared by every module.

pub mod env;
pub mod error;
pub mod http;
pub mod paths;
pub mod result;

pub use env::Environment;
pub use error::{ErrorCode, ZephyrError};
pub use http::create_http_client_with_timeout;
pub use paths::find_upwards;
pub use result::ZephyrResult;
