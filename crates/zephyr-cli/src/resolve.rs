use anyhow::Context;
use clap::Args;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use zephyr_core::manifest::{FileManifestWriter, ManifestBuilder, ManifestWriter};
use zephyr_core::{
    application_uid_for, collect_descriptors, Environment, RemoteResolver, ResolveOptions,
    WorkspaceResolver, ZephyrConfig,
};

/// package.json field holding remote dependencies
const DEPENDENCIES_FIELD: &str = "zephyr:dependencies";

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// package.json declaring `zephyr:dependencies`
    #[arg(long, default_value = "package.json")]
    package_json: PathBuf,

    /// Application uid of the manifest; derived from the package name if omitted
    #[arg(long)]
    app_uid: Option<String>,

    /// Target platform for per-platform dependency values
    #[arg(long)]
    platform: Option<String>,

    /// Drop remotes that fail to resolve instead of failing the build
    #[arg(long)]
    allow_partial: bool,

    /// Optional JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for the manifest
    #[arg(long, default_value = "dist")]
    out: PathBuf,
}

pub async fn run(args: ResolveArgs) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(&args.package_json)
        .await
        .with_context(|| format!("Failed to read {}", args.package_json.display()))?;
    let package: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", args.package_json.display()))?;

    let workdir = args
        .package_json
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let dependencies = package
        .get(DEPENDENCIES_FIELD)
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    let workspace = WorkspaceResolver::shared(workdir);
    let descriptors =
        collect_descriptors(&dependencies, args.platform.as_deref(), workspace.as_ref())?;
    info!("Found {} remote dependencies", descriptors.len());

    let environment = Environment::from_process();
    let config = match &args.config {
        Some(path) => ZephyrConfig::load(path, &environment)?,
        None => ZephyrConfig::from_env(&environment)?,
    };

    let resolver = RemoteResolver::new(&config, environment, workdir)?;
    let options = ResolveOptions {
        abort_on_error: !args.allow_partial,
        auth_token: None,
    };
    let remotes = resolver
        .resolve_remote_dependencies(&descriptors, &options)
        .await?;

    let application_uid = match args.app_uid {
        Some(uid) => uid,
        None => {
            let name = package
                .get("name")
                .and_then(Value::as_str)
                .context("package.json has no name; pass --app-uid")?;
            let context = resolver
                .context()
                .await
                .context("Unknown org/project; set ZE_APP_ORG and ZE_APP_PROJECT or pass --app-uid")?;
            application_uid_for(name, context)?
        }
    };

    let manifest = ManifestBuilder::new(application_uid).remotes(remotes).build();
    let writer = FileManifestWriter::with_file_name(&args.out, &config.manifest_filename);
    writer.write(&manifest).await?;

    println!("{}", writer.path().display());
    Ok(())
}
