// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context as _;
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use the_rigging::api::ApiResource;
use the_rigging::backends::register_builtin;
use the_rigging::config::consts::{DEFAULT_LOG_FILTER, DEFAULT_MANIFEST};
use the_rigging::config::{apply_manifest, load_manifest};
use the_rigging::engine::Manager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [manifest.yaml|.toml|.json]", args[0]);
        std::process::exit(2);
    }
    let path = args.get(1).map(String::as_str).unwrap_or(DEFAULT_MANIFEST);

    let manifest = load_manifest(path).with_context(|| format!("loading manifest {}", path))?;
    let manager = Arc::new(Manager::new(manifest.provider()));
    register_builtin(&manager)?;
    manager.register_resource(ApiResource::new(&manager))?;

    if let Err(e) = apply_manifest(&manager, &manifest).await {
        if let Err(close) = manager.close().await {
            tracing::error!(error = %close, "cleanup after failed startup");
        }
        return Err(e).with_context(|| format!("applying manifest {}", path));
    }

    for name in manager.instance_names() {
        if let Some(endpoint) = manager
            .instance(&name)
            .and_then(|i| i.as_server().and_then(|s| s.endpoint()))
        {
            println!("{} listening on {}", name, endpoint);
        }
    }

    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    tracing::info!("shutdown requested");
    manager.close().await.context("closing managed instances")?;
    Ok(())
}
