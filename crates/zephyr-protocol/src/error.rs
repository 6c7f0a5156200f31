use thiserror::Error;

/// Errors raised while decoding or validating a manifest document.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest application_uid cannot be empty")]
    MissingApplicationUid,

    #[error("dependency '{name}' has a non-absolute remote_entry_url: {url}")]
    RelativeEntryUrl { name: String, url: String },

    #[error("dependency '{name}' has an empty application_uid")]
    MissingDependencyUid { name: String },
}
