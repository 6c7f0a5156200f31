//! Common Error Types
//!
//! Unified error handling with stable, machine-readable error codes.

use thiserror::Error;

/// Zephyr error codes
///
/// Grouped by failure class:
/// 100xx dependency contract, 200xx configuration, 300xx resolution,
/// 400xx manifest I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Dependency collection contract
    InvalidDependencyValue = 10001,
    PlatformRequired = 10002,

    // Configuration errors
    MissingOrgProject = 20001,
    MissingAuthToken = 20002,
    MissingUserEmail = 20003,
    TokenExchangeFailed = 20004,
    InvalidConfig = 20005,

    // Registry resolution
    ResolutionFailed = 30001,
    InvalidResolution = 30002,
    RegistryUnreachable = 30003,

    // Manifest persistence
    ManifestIo = 40001,
    ManifestInvalid = 40002,
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Printable form, e.g. `ZE30001`
    pub fn tag(&self) -> String {
        format!("ZE{}", self.code())
    }
}

/// Application error type carrying a stable code
#[derive(Debug, Clone, Error)]
#[error("[{}] {}", .code.tag(), .message)]
pub struct ZephyrError {
    pub code: ErrorCode,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl ZephyrError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// A dependency collection held something other than a string or a
    /// per-platform string map
    pub fn invalid_dependency_value(key: &str, found: &serde_json::Value) -> Self {
        Self::new(
            ErrorCode::InvalidDependencyValue,
            format!("Dependency '{}' must be a string or a platform map, got {}", key, found),
        )
        .with_data(serde_json::json!({ "key": key, "value": found }))
    }

    pub fn platform_required(key: &str) -> Self {
        Self::new(
            ErrorCode::PlatformRequired,
            format!("Dependency '{}' is declared per platform but no target platform was given", key),
        )
    }

    pub fn missing_org_project(app_uid: &str) -> Self {
        Self::new(
            ErrorCode::MissingOrgProject,
            format!(
                "Cannot qualify '{}': set ZE_APP_ORG and ZE_APP_PROJECT, add a git remote or a package.json repository field",
                app_uid
            ),
        )
    }

    pub fn missing_auth_token() -> Self {
        Self::new(
            ErrorCode::MissingAuthToken,
            "No auth token available: set ZE_SECRET_TOKEN, ZE_AUTH_TOKEN, ZE_TOKEN or ZE_SERVER_TOKEN",
        )
    }

    pub fn missing_user_email() -> Self {
        Self::new(
            ErrorCode::MissingUserEmail,
            "ZE_SERVER_TOKEN is set but ZE_USER_EMAIL is missing",
        )
    }

    pub fn token_exchange_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TokenExchangeFailed, message)
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, message)
    }

    pub fn resolution_failed(app_uid: &str, version: &str, detail: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResolutionFailed,
            format!("Failed to resolve {}@{}: {}", app_uid, version, detail.into()),
        )
        .with_data(serde_json::json!({ "application_uid": app_uid, "version": version }))
    }

    pub fn invalid_resolution(app_uid: &str, detail: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidResolution,
            format!("Registry returned an unusable resolution for {}: {}", app_uid, detail.into()),
        )
    }

    pub fn registry_unreachable(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::RegistryUnreachable, detail)
    }

    pub fn manifest_io(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ManifestIo, detail)
    }

    pub fn manifest_invalid(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ManifestInvalid, detail)
    }
}

impl From<zephyr_protocol::ProtocolError> for ZephyrError {
    fn from(err: zephyr_protocol::ProtocolError) -> Self {
        Self::manifest_invalid(err.to_string())
    }
}
