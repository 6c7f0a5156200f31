//! Manifest System
//!
//! Builds, writes and loads the per-build `zephyr-manifest.json`.

pub mod builder;
pub mod loader;
pub mod writer;

pub use builder::ManifestBuilder;
pub use loader::load_manifest_file;
pub use writer::{FileManifestWriter, ManifestWriter};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;
    use zephyr_protocol::ResolvedRemote;

    #[tokio::test]
    async fn test_write_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = ManifestBuilder::new("host.shop.acme")
            .remotes(vec![ResolvedRemote {
                name: "cart".to_string(),
                application_uid: "cart.shop.acme".to_string(),
                remote_entry_url: "https://cdn.acme.dev/cart/remoteEntry.js".to_string(),
                public_path: "https://cdn.acme.dev/cart/".to_string(),
                version: "1.0.0".to_string(),
            }])
            .build();

        let writer = FileManifestWriter::new(&tmp.path().join("dist"));
        writer.write(&manifest).await.unwrap();

        assert!(writer.path().ends_with("dist/zephyr-manifest.json"));
        assert!(!writer.path().with_extension("json.tmp").exists());
        assert_eq!(load_manifest_file(writer.path()).unwrap(), manifest);
    }

    #[test]
    fn test_load_rejects_invalid_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("zephyr-manifest.json");
        std::fs::write(&path, r#"{"version":"1.0.0","timestamp":"t","application_uid":""}"#).unwrap();

        let err = load_manifest_file(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::ManifestInvalid);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_manifest_file(std::path::Path::new("/nonexistent/zephyr-manifest.json")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ManifestIo);
    }
}
