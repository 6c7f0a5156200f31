//! Build-time resolution through to a runtime rewrite, against mocked
//! registry and CDN servers.

use httpmock::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use zephyr_core::manifest::load_manifest_file;
use zephyr_core::runtime::{BeforeRequestArgs, RemoteDeclaration, RequestOptions};
use zephyr_core::{
    collect_descriptors, AppContext, Environment, FederationRuntimePlugin, FileManifestWriter,
    ManifestBuilder, ManifestCache, ManifestClient, ManifestClientConfig, ManifestWriter,
    RemoteResolver, ResolveOptions, SessionOverrides, WorkspaceResolver, ZephyrConfig,
    ZephyrRuntimePlugin,
};

fn write_json(path: &Path, value: Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn monorepo(root: &Path) {
    fs::write(
        root.join("pnpm-workspace.yaml"),
        "packages:\n  - 'apps/*'\ncatalog:\n  cart: ^2.0.0\n",
    )
    .unwrap();

    write_json(
        &root.join("apps/checkout/package.json"),
        json!({ "name": "checkout", "version": "0.9.2" }),
    );
    write_json(
        &root.join("apps/host/package.json"),
        json!({
            "name": "@acme/host",
            "zephyr:dependencies": {
                "cart": "catalog:",
                "checkout": "workspace:*",
                "legacy": "https://legacy.acme.dev/remoteEntry.js",
                "analytics": "npm:@acme/analytics@1.0.0"
            }
        }),
    );
}

#[tokio::test]
async fn test_resolve_build_and_rewrite() {
    let tmp = tempfile::tempdir().unwrap();
    monorepo(tmp.path());
    let host_dir = tmp.path().join("apps/host");

    let registry = MockServer::start_async().await;
    let cart = registry
        .mock_async(|when, then| {
            when.method(GET)
                .path_contains("/resolve/cart.shop.acme/")
                .header("authorization", "Bearer build-token");
            then.status(200).json_body(json!({
                "value": {
                    "application_uid": "cart.shop.acme",
                    "remote_entry_url": "https://cdn.acme.dev/cart/2.1.0/remoteEntry.js",
                    "version": "2.1.0"
                }
            }));
        })
        .await;
    let checkout = registry
        .mock_async(|when, then| {
            when.method(GET).path("/resolve/checkout.shop.acme/0.9.2");
            then.status(200).json_body(json!({
                "value": {
                    "remote_entry_url": "//cdn.acme.dev/checkout/0.9.2/remoteEntry.js"
                }
            }));
        })
        .await;

    // Build time
    let package: Value =
        serde_json::from_str(&fs::read_to_string(host_dir.join("package.json")).unwrap()).unwrap();
    let workspace = WorkspaceResolver::discover(&host_dir);
    let descriptors =
        collect_descriptors(&package["zephyr:dependencies"], None, &workspace).unwrap();
    assert_eq!(descriptors.len(), 4);

    let config = ZephyrConfig {
        api_base_url: registry.base_url(),
        ..Default::default()
    };
    let resolver = RemoteResolver::new(
        &config,
        Environment::from_pairs([("ZE_SECRET_TOKEN", "build-token")]),
        &host_dir,
    )
    .unwrap()
    .with_context(AppContext::new("acme", "shop"));

    let remotes = resolver
        .resolve_remote_dependencies(&descriptors, &ResolveOptions::default())
        .await
        .unwrap();
    cart.assert_async().await;
    checkout.assert_async().await;
    assert_eq!(remotes.len(), 3);

    let manifest = ManifestBuilder::new("host.shop.acme").remotes(remotes).build();
    let out = tmp.path().join("apps/host/dist");
    let writer = FileManifestWriter::new(&out);
    writer.write(&manifest).await.unwrap();

    let written = load_manifest_file(writer.path()).unwrap();
    assert_eq!(written, manifest);
    assert_eq!(written.dependencies["cart"].version, "2.1.0");
    assert_eq!(
        written.dependencies["cart"].public_path,
        "https://cdn.acme.dev/cart/2.1.0/"
    );
    assert_eq!(
        written.dependencies["checkout"].remote_entry_url,
        "https://cdn.acme.dev/checkout/0.9.2/remoteEntry.js"
    );
    assert_eq!(written.dependencies["checkout"].application_uid, "checkout.shop.acme");
    assert_eq!(
        written.dependencies["legacy"].remote_entry_url,
        "https://legacy.acme.dev/remoteEntry.js"
    );
    assert!(!written.dependencies.contains_key("analytics"));

    // Run time
    let cdn = MockServer::start_async().await;
    let served = cdn
        .mock_async(|when, then| {
            when.method(GET).path("/zephyr-manifest.json");
            then.status(200)
                .header("content-type", "application/json")
                .body(fs::read_to_string(writer.path()).unwrap());
        })
        .await;

    let client = ManifestClient::http(
        ManifestClientConfig::new(cdn.url("/zephyr-manifest.json"), "host.shop.acme"),
        Arc::new(ManifestCache::new()),
    )
    .unwrap();
    let plugin = ZephyrRuntimePlugin::new(Arc::new(client), Arc::new(SessionOverrides::new()));

    let request = |id: &str| BeforeRequestArgs {
        id: id.to_string(),
        options: RequestOptions {
            remotes: vec![
                RemoteDeclaration {
                    name: "cart".to_string(),
                    alias: None,
                    entry: "http://localhost:3001/remoteEntry.js".to_string(),
                },
                RemoteDeclaration {
                    name: "search".to_string(),
                    alias: None,
                    entry: "http://localhost:3005/remoteEntry.js".to_string(),
                },
            ],
        },
    };

    let rewritten = plugin.before_request(request("cart/Button")).await;
    assert_eq!(
        rewritten.options.remotes[0].entry,
        "https://cdn.acme.dev/cart/2.1.0/remoteEntry.js"
    );

    let untouched = plugin.before_request(request("search/Box")).await;
    assert_eq!(untouched, request("search/Box"));

    // One fetch served both loads
    served.assert_hits_async(1).await;
}
