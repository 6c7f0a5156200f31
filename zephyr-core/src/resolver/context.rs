//! Application Context
//!
//! Org and project an unqualified application name is qualified with.

use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use crate::common::env::{self, Environment};
use crate::common::{ZephyrError, ZephyrResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    pub org: String,
    pub project: String,
}

impl AppContext {
    pub fn new(org: &str, project: &str) -> Self {
        Self {
            org: sanitize_uid_segment(org),
            project: sanitize_uid_segment(project),
        }
    }

    /// Environment, then the git `origin` remote, then the `package.json`
    /// repository field of `workdir`.
    pub async fn resolve(environment: &Environment, workdir: &Path) -> Option<Self> {
        if let (Some(org), Some(project)) = (
            environment.get(env::ZE_APP_ORG),
            environment.get(env::ZE_APP_PROJECT),
        ) {
            debug!("Using org/project from environment: {}/{}", org, project);
            return Some(Self::new(org, project));
        }

        if let Some(remote) = git_origin_url(workdir).await {
            if let Some(context) = parse_repository_url(&remote) {
                debug!("Using org/project from git remote: {}/{}", context.org, context.project);
                return Some(context);
            }
        }

        let context = package_repository(workdir).and_then(|repo| parse_repository_url(&repo));
        if let Some(ref context) = context {
            debug!("Using org/project from package.json: {}/{}", context.org, context.project);
        }
        context
    }
}

async fn git_origin_url(workdir: &Path) -> Option<String> {
    let output = tokio::process::Command::new("git")
        .args(["config", "--get", "remote.origin.url"])
        .current_dir(workdir)
        .output()
        .await
        .map_err(|e| debug!("git unavailable: {}", e))
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!url.is_empty()).then_some(url)
}

fn package_repository(workdir: &Path) -> Option<String> {
    let path = workdir.join("package.json");
    let content = std::fs::read_to_string(&path).ok()?;
    let package: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse {:?}: {}", path, e);
            return None;
        }
    };

    match package.get("repository")? {
        Value::String(url) => Some(url.clone()),
        Value::Object(repo) => repo.get("url").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

/// Org and project from a git remote or repository shorthand.
///
/// Accepts `git@host:org/project.git`, `https://host/org/project`,
/// `github:org/project` and `org/project`.
pub fn parse_repository_url(url: &str) -> Option<AppContext> {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let path = if let Some(idx) = trimmed.find("://") {
        trimmed[idx + 3..].split_once('/')?.1
    } else if let Some((_, path)) = trimmed.split_once(':') {
        path
    } else {
        trimmed
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., org, project] => Some(AppContext::new(org, project)),
        _ => None,
    }
}

/// Lowercase, with anything outside `[a-z0-9-]` folded into single dashes
pub fn sanitize_uid_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// At least three non-empty dot-separated segments (`name.project.org`)
pub fn is_fully_qualified(app_uid: &str) -> bool {
    let segments: Vec<&str> = app_uid.split('.').collect();
    segments.len() >= 3 && segments.iter().all(|s| !s.is_empty())
}

/// `name.project.org` for `app_uid`, using `context` when it is not already
/// qualified.
pub fn qualify_application_uid(
    app_uid: &str,
    context: Option<&AppContext>,
) -> ZephyrResult<String> {
    if is_fully_qualified(app_uid) {
        return Ok(app_uid.to_string());
    }

    let context = context.ok_or_else(|| ZephyrError::missing_org_project(app_uid))?;
    let name = sanitize_uid_segment(app_uid);
    if name.is_empty() {
        return Err(ZephyrError::missing_org_project(app_uid));
    }
    Ok(format!("{}.{}.{}", name, context.project, context.org))
}

/// Application uid of the package being built, e.g. `@acme/cart` under
/// `shop`/`acme` becomes `acme-cart.shop.acme`.
pub fn application_uid_for(package_name: &str, context: &AppContext) -> ZephyrResult<String> {
    let name = sanitize_uid_segment(package_name);
    if name.is_empty() {
        return Err(ZephyrError::invalid_config(format!(
            "Package name {:?} has no usable characters",
            package_name
        )));
    }
    Ok(format!("{}.{}.{}", name, context.project, context.org))
}
