//! Single request execution and outcome classification.
use reqwest::Client;
use serde::de::IgnoredAny;
use serde::Deserialize;
use stampede_core::{Outcome, TargetTemplate};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Unable to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Anything able to turn a `limit` into an [`Outcome`].
///
/// Implementations must never panic on a failed request and must not touch shared counters;
/// the caller owns aggregation.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, limit: u32) -> impl Future<Output = Outcome> + Send;
}

/// Expected response body. Only the length of the array matters.
#[derive(Debug, Deserialize)]
struct AnimalsResponse {
    animals: Vec<IgnoredAny>,
}

/// Issues one GET per job against a [`TargetTemplate`]. Single attempt, no retries.
#[derive(Clone, Debug)]
pub struct RequestExecutor {
    client: Client,
    target: TargetTemplate,
}

impl RequestExecutor {
    pub fn new(target: TargetTemplate, timeout: Option<Duration>) -> Result<Self, ExecutorError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_client(builder.build()?, target))
    }

    pub fn with_client(client: Client, target: TargetTemplate) -> Self {
        Self { client, target }
    }

    pub fn target(&self) -> &TargetTemplate {
        &self.target
    }

    async fn send(&self, limit: u32) -> Outcome {
        let start = Instant::now();

        let url = match self.target.url_for(limit) {
            Ok(url) => url,
            Err(err) => {
                return Outcome::TransportError {
                    cause: format!("invalid url: {err}"),
                    latency: start.elapsed(),
                }
            }
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                return Outcome::TransportError {
                    cause: describe(&err),
                    latency: start.elapsed(),
                }
            }
        };

        let status = response.status();
        if status.as_u16() >= 300 {
            return Outcome::BadStatus {
                code: status.as_u16(),
                latency: start.elapsed(),
            };
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                return Outcome::TransportError {
                    cause: describe(&err),
                    latency: start.elapsed(),
                }
            }
        };

        let decoded = serde_json::from_slice::<AnimalsResponse>(&body);
        let latency = start.elapsed();
        match decoded {
            Ok(parsed) => Outcome::Success {
                item_count: parsed.animals.len(),
                latency,
            },
            Err(err) => Outcome::DecodeError {
                cause: err.to_string(),
                latency,
            },
        }
    }
}

impl Executor for RequestExecutor {
    fn execute(&self, limit: u32) -> impl Future<Output = Outcome> + Send {
        self.send(limit)
    }
}

fn describe(err: &reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() {
        "body read failed"
    } else {
        "request failed"
    };

    format!("{kind}: {err}")
}
