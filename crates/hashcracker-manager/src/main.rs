// Copyright (c) The Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use hashcracker_manager::{config::Config, server, ManagerService};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cmd {
    /// Path to the manager's YAML configuration file.
    #[clap(short, long, default_value = "configs/manager.yaml")]
    config: PathBuf,
}

fn init_logger(config: &hashcracker_manager::config::LoggerConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let config = Config::read(&cmd.config).with_context(|| format!("failed to read {}", cmd.config.display()))?;

    init_logger(&config.logger);
    config.validate().context("invalid configuration")?;

    let service = Arc::new(ManagerService::new(
        config.hash_cracker.alphabet.clone(),
        Duration::from_millis(config.healthcheck.period_ms),
        config.healthcheck.max_tries,
    ));

    let app = server::router(service);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.http.port))?;
    tracing::info!(port = config.http.port, "manager listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
