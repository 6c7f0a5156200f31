//! Session Overrides
//!
//! Per-session preferred entry URLs, keyed by remote application uid.

use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SessionOverrides {
    entries: RwLock<HashMap<String, String>>,
}

impl SessionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(
        &self,
        application_uid: impl Into<String>,
        remote_entry_url: impl Into<String>,
    ) {
        let application_uid = application_uid.into();
        let remote_entry_url = remote_entry_url.into();
        debug!("Session override {} -> {}", application_uid, remote_entry_url);
        self.entries
            .write()
            .await
            .insert(application_uid, remote_entry_url);
    }

    pub async fn get(&self, application_uid: &str) -> Option<String> {
        self.entries.read().await.get(application_uid).cloned()
    }

    pub async fn remove(&self, application_uid: &str) -> Option<String> {
        self.entries.write().await.remove(application_uid)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
