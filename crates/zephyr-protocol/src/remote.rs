use serde::{Deserialize, Serialize};

/// A remote whose version has been pinned to one deployed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRemote {
    pub name: String,
    pub application_uid: String,
    pub remote_entry_url: String,
    pub public_path: String,
    pub version: String,
}

/// Directory part of an entry URL, with a trailing slash.
///
/// `https://cdn.example/app/remoteEntry.js` becomes `https://cdn.example/app/`.
pub fn public_path_of(remote_entry_url: &str) -> String {
    match url::Url::parse(remote_entry_url) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            let path = url.path().to_string();
            let dir = match path.rfind('/') {
                Some(idx) => &path[..=idx],
                None => "/",
            };
            url.set_path(dir);
            url.to_string()
        }
        Err(_) => match remote_entry_url.rfind('/') {
            Some(idx) => remote_entry_url[..=idx].to_string(),
            None => remote_entry_url.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_path_strips_file_name() {
        assert_eq!(
            public_path_of("https://cdn.example.com/apps/remote/remoteEntry.js?v=2"),
            "https://cdn.example.com/apps/remote/"
        );
    }

    #[test]
    fn test_public_path_of_directory_url() {
        assert_eq!(
            public_path_of("https://cdn.example.com/apps/"),
            "https://cdn.example.com/apps/"
        );
    }
}
