use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
struct RegisterResponse {
    id: Uuid,
}

/// Registers this worker with the manager at startup (§6): a single GET
/// to `register_url` carrying `X-Worker-Port`, with a 5-second deadline.
/// The manager derives this worker's dialable address from the request's
/// peer address plus this header, never from a `Host` header.
pub struct Registerer {
    client: reqwest::Client,
    register_url: String,
    self_port: u16,
}

impl Registerer {
    pub fn new(register_url: String, self_port: u16) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("reqwest client builds with a fixed timeout"),
            register_url,
            self_port,
        }
    }

    pub async fn register(&self) -> Result<Uuid> {
        let resp = self
            .client
            .get(&self.register_url)
            .header("X-Worker-Port", self.self_port.to_string())
            .send()
            .await
            .with_context(|| format!("failed to reach manager at {}", self.register_url))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("registration rejected: {body}");
        }

        let decoded: RegisterResponse = resp.json().await.context("failed to decode registration response")?;
        if decoded.id.is_nil() {
            bail!("manager returned a nil worker id");
        }
        Ok(decoded.id)
    }
}
