// Copyright (c) The Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use hashcracker_worker::{config::Config, server, Notifier, Registerer, TaskStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cmd {
    /// Path to the worker's YAML configuration file.
    #[clap(short, long, default_value = "configs/worker.yaml")]
    config: PathBuf,
}

fn init_logger(config: &hashcracker_worker::config::LoggerConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Task store TTL for abandoned entries (§4.5's cache policy note).
const TASK_STORE_TTL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let config = Config::read(&cmd.config).with_context(|| format!("failed to read {}", cmd.config.display()))?;

    init_logger(&config.logger);
    config.validate().context("invalid configuration")?;

    let registerer = Registerer::new(config.registerer.register_url.clone(), config.registerer.self_port);
    let worker_id = registerer
        .register()
        .await
        .context("failed to register with the manager")?;
    tracing::info!(worker_id = %worker_id, "registered with manager");

    let notifier = Arc::new(Notifier::new(
        config.notifier.notify_url.clone(),
        Duration::from_millis(config.worker.notify_period_ms),
    ));
    let task_store = TaskStore::new(worker_id, config.worker.max_parallel, TASK_STORE_TTL, notifier);

    let app = server::router(Arc::clone(&task_store));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.http.port))?;
    tracing::info!(port = config.http.port, "worker listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    task_store.cancel_all();
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
