//! Diagnostics: the `tracing` subscriber and the optional remote sinks.

use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::RuntimeConfig;

pub const LOG_ENV: &str = "LINGO_LOG";
pub const DEFAULT_FILTER: &str = "lingo=info";

/// Install the global subscriber. Output goes to stderr so it never mixes
/// with tutor replies printed on stdout.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RemoteLogLine<'a> {
    /// Unix milliseconds
    pub t: i64,
    pub message: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TurnSample<'a> {
    pub t: i64,
    pub provider: &'a str,
    pub model: &'a str,
    pub elapsed_ms: u64,
    pub ok: bool,
}

/// Fire-and-forget POST sinks for log lines and turn timings.
///
/// Delivery failures are logged at debug level and otherwise ignored.
#[derive(Clone)]
pub struct RemoteLog {
    http: reqwest::Client,
    log_endpoint: Option<String>,
    metrics_endpoint: Option<String>,
}

impl RemoteLog {
    pub fn new(http: reqwest::Client, runtime: &RuntimeConfig) -> Self {
        Self {
            http,
            log_endpoint: runtime.log_endpoint.clone(),
            metrics_endpoint: runtime.metrics_endpoint.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.log_endpoint.is_some() || self.metrics_endpoint.is_some()
    }

    pub async fn log(&self, message: &str) {
        let Some(endpoint) = self.log_endpoint.as_deref() else {
            return;
        };
        let line = RemoteLogLine {
            t: Utc::now().timestamp_millis(),
            message,
        };
        self.post(endpoint, &line).await;
    }

    pub async fn turn(&self, provider: &str, model: &str, elapsed: Duration, ok: bool) {
        let Some(endpoint) = self.metrics_endpoint.as_deref() else {
            return;
        };
        let sample = TurnSample {
            t: Utc::now().timestamp_millis(),
            provider,
            model,
            elapsed_ms: elapsed.as_millis() as u64,
            ok,
        };
        self.post(endpoint, &sample).await;
    }

    async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) {
        match self.http.post(endpoint).json(body).send().await {
            Ok(response) if !response.status().is_success() => {
                debug!(endpoint, status = response.status().as_u16(), "remote sink rejected post");
            }
            Ok(_) => {}
            Err(err) => debug!(endpoint, error = %err, "remote sink unreachable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;

    #[test]
    fn log_line_serializes_as_t_and_message() {
        let line = RemoteLogLine {
            t: 1_700_000_000_000,
            message: "Message send failed",
        };
        assert_eq!(
            serde_json::to_value(&line).unwrap(),
            serde_json::json!({"t": 1_700_000_000_000i64, "message": "Message send failed"})
        );
    }

    #[tokio::test]
    async fn sinks_are_noops_without_endpoints() {
        let runtime = RuntimeConfig::resolve(&Config::default(), |_| None);
        let remote = RemoteLog::new(reqwest::Client::new(), &runtime);
        assert!(!remote.is_enabled());
        remote.log("ignored").await;
        remote.turn("openai", "gpt-4o", Duration::from_millis(10), true).await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_swallowed() {
        let runtime = RuntimeConfig::resolve(&Config::default(), |name| {
            (name == "LINGO_LOG_ENDPOINT").then(|| "http://127.0.0.1:9/log".to_string())
        });
        let remote = RemoteLog::new(reqwest::Client::new(), &runtime);
        assert!(remote.is_enabled());
        remote.log("still fine").await;
    }
}
