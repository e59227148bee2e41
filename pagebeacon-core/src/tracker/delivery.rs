//! HTTP delivery of beacon payloads
//!
//! Delivery is best-effort: every send runs under a deadline, and failures
//! come back as a [`DeliveryOutcome`] rather than an error. Nothing here
//! retries.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use crate::config::DeliveryConfig;
use crate::error::{Error, Result};

/// Default deadline for one delivery.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// What happened to one beacon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint answered 2xx
    Delivered,
    /// The endpoint answered with a non-success status
    Rejected { status: u16, body: String },
    /// No answer before the deadline
    TimedOut,
    /// The request never completed (connection refused, DNS, ...)
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Posts beacons to a collection endpoint.
#[derive(Debug, Clone)]
pub struct BeaconSender {
    http_client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl BeaconSender {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Delivery(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    /// Build a sender from configuration.
    ///
    /// Returns `None` when delivery is disabled or has no endpoint.
    pub fn from_config(config: &DeliveryConfig) -> Result<Option<Self>> {
        if !config.is_ready() {
            return Ok(None);
        }
        config.validate()?;

        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| Error::Config("delivery.endpoint is required".to_string()))?;
        Self::new(endpoint, Duration::from_secs(config.timeout_secs)).map(Some)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Post one payload and wait for the outcome, at most `timeout`.
    pub async fn send(&self, payload: &Map<String, Value>) -> DeliveryOutcome {
        let request = async {
            let response = self
                .http_client
                .post(&self.endpoint)
                .json(payload)
                .send()
                .await?;
            let status = response.status();
            if status.is_success() {
                Ok::<_, reqwest::Error>(DeliveryOutcome::Delivered)
            } else {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown".to_string());
                Ok(DeliveryOutcome::Rejected {
                    status: status.as_u16(),
                    body,
                })
            }
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => DeliveryOutcome::Failed(describe(&e)),
            Err(_) => DeliveryOutcome::TimedOut,
        }
    }

    /// Send in the background and log the outcome.
    ///
    /// Must be called inside a tokio runtime. Aborting the returned handle
    /// cancels the delivery.
    pub fn dispatch(&self, payload: Map<String, Value>) -> JoinHandle<DeliveryOutcome> {
        let sender = self.clone();
        tokio::spawn(async move {
            let action = payload
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            let outcome = sender.send(&payload).await;
            match &outcome {
                DeliveryOutcome::Delivered => {
                    tracing::debug!(action = %action, "Beacon delivered");
                }
                DeliveryOutcome::Rejected { status, body } => {
                    tracing::warn!(action = %action, status, body = %body, "Beacon rejected");
                }
                DeliveryOutcome::TimedOut => {
                    tracing::warn!(
                        action = %action,
                        timeout_ms = sender.timeout.as_millis() as u64,
                        "Beacon delivery timed out"
                    );
                }
                DeliveryOutcome::Failed(error) => {
                    tracing::warn!(action = %action, error = %error, "Beacon delivery failed");
                }
            }
            outcome
        })
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        format!("HTTP request failed: {}", error)
    }
}
