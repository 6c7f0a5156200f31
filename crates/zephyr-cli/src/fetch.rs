use anyhow::Context;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

use zephyr_core::runtime::FetchError;
use zephyr_core::{ManifestCache, ManifestClient, ManifestClientConfig, ManifestObserver};

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Absolute URL of the application's zephyr-manifest.json
    #[arg(long)]
    url: String,

    /// Application uid the manifest belongs to
    #[arg(long)]
    app_uid: String,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

struct LogErrors;

impl ManifestObserver for LogErrors {
    fn on_manifest_error(&self, err: &FetchError) {
        error!("{}", err);
    }
}

pub async fn run(args: FetchArgs) -> anyhow::Result<()> {
    let config = ManifestClientConfig::new(&args.url, &args.app_uid)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    let client = ManifestClient::http(config, Arc::new(ManifestCache::new()))?
        .with_observer(Arc::new(LogErrors));

    let manifest = client
        .get_current_manifest()
        .await
        .with_context(|| format!("Failed to fetch manifest from {}", args.url))?;

    println!("{}", manifest.to_json_pretty()?);
    Ok(())
}
