//! Environment Snapshot
//!
//! Captures the variables resolution code reads so it never touches the
//! process environment directly.

use std::collections::HashMap;

pub const ZE_APP_ORG: &str = "ZE_APP_ORG";
pub const ZE_APP_PROJECT: &str = "ZE_APP_PROJECT";
pub const ZE_SECRET_TOKEN: &str = "ZE_SECRET_TOKEN";
pub const ZE_AUTH_TOKEN: &str = "ZE_AUTH_TOKEN";
pub const ZE_TOKEN: &str = "ZE_TOKEN";
pub const ZE_SERVER_TOKEN: &str = "ZE_SERVER_TOKEN";
pub const ZE_USER_EMAIL: &str = "ZE_USER_EMAIL";
pub const ZE_API: &str = "ZE_API";
pub const ZE_API_TIMEOUT_SECS: &str = "ZE_API_TIMEOUT_SECS";

/// Token variables, highest priority first
pub const TOKEN_VARS: [&str; 3] = [ZE_SECRET_TOKEN, ZE_AUTH_TOKEN, ZE_TOKEN];

#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Snapshot every `ZE_*` variable of the current process
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().filter(|(k, _)| k.starts_with("ZE_")).collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value of `name`, ignoring unset and blank variables
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First non-blank variable of `names`, with the name it came from
    pub fn first_of<'a>(&self, names: &[&'a str]) -> Option<(&'a str, &str)> {
        names.iter().find_map(|name| self.get(name).map(|v| (*name, v)))
    }
}
