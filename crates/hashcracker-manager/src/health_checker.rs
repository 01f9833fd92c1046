use std::time::Duration;

use tracing::debug;

/// Supervises one worker's liveness over HTTP. `notify_failure` is the
/// only entry point a caller needs: it blocks until the worker has
/// failed `max_tries` consecutive checks, each separated by `period`,
/// and never returns for a healthy worker.
#[derive(Clone, Debug)]
pub struct HealthChecker {
    client: reqwest::Client,
    url: String,
    period: Duration,
    max_tries: u32,
}

impl HealthChecker {
    pub fn new(address: &str, period: Duration, max_tries: u32) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("reqwest client builds with a fixed timeout"),
            url: format!("http://{address}/health"),
            period,
            max_tries,
        }
    }

    /// A single round trip with a 5-second deadline. Only a 2xx response
    /// counts as healthy.
    pub async fn check(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                debug!(url = %self.url, error = %err, "health check request failed");
                false
            }
        }
    }

    /// Blocks until the worker has failed `max_tries` consecutive checks.
    /// A single success resets the consecutive-failure counter.
    pub async fn notify_failure(&self) {
        let mut consecutive_failures = 0u32;
        loop {
            tokio::time::sleep(self.period).await;
            if self.check().await {
                consecutive_failures = 0;
            } else {
                consecutive_failures += 1;
                if consecutive_failures >= self.max_tries {
                    return;
                }
            }
        }
    }
}
