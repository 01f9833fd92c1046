use std::{sync::Arc, time::Duration};

use hashcracker_common::TaskProgress;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::engine::Engine;

/// Periodic and terminal progress push to the manager (§4.7). A single
/// HTTP POST per push, each with a fixed 5-second deadline; failures are
/// logged and ignored, as the manager will be caught up by the next tick
/// or by the shard's final synchronous push.
pub struct Notifier {
    client: reqwest::Client,
    url: String,
    period: Duration,
}

impl Notifier {
    pub fn new(url: String, period: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("reqwest client builds with a fixed timeout"),
            url,
            period,
        }
    }

    pub async fn push(&self, progress: &TaskProgress) {
        let result = self.client.post(&self.url).json(progress).send().await;
        match result {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => warn!(status = %resp.status(), url = %self.url, "progress push rejected"),
            Err(err) => warn!(error = %err, url = %self.url, "progress push failed"),
        }
    }

    /// Ticks every `period`, snapshotting `engine` and pushing it, until
    /// `cancel` fires. Returns immediately without pushing on
    /// cancellation observed at a tick boundary (§4.7); the caller is
    /// responsible for the separate, synchronous terminal push once the
    /// engine itself has finished.
    pub async fn run_periodic(&self, engine: Arc<Engine>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.tick().await; // first tick fires immediately; skip it to avoid a push before any work happened
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.push(&engine.snapshot()).await;
                }
                _ = cancel.cancelled() => return,
            }
        }
    }
}
