//! Concurrent submission to a set of calendar servers.
//!
//! Every endpoint is asked in parallel under its own timeout, so one slow
//! server never holds up the others.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use stampchain_core::Digest;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::client::CalendarClient;
use crate::error::{CalendarError, Result};

/// Default per-endpoint timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// An attestation and the endpoint that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    pub endpoint: String,
    pub payload: Bytes,
}

/// Outcome of asking every endpoint.
#[derive(Debug, Default, Serialize)]
pub struct CollectReport {
    /// Successful attestations, in pool order.
    #[serde(skip)]
    pub attestations: Vec<Attestation>,
    /// Endpoints that answered.
    pub succeeded: Vec<String>,
    /// Endpoints that failed, with the reason.
    pub failed: Vec<(String, String)>,
}

/// A set of calendar servers.
#[derive(Clone)]
pub struct CalendarPool {
    clients: Vec<Arc<dyn CalendarClient>>,
    timeout: Duration,
}

impl CalendarPool {
    /// Create a pool with the default timeout.
    pub fn new(clients: Vec<Arc<dyn CalendarClient>>) -> Self {
        Self {
            clients,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-endpoint timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn endpoints(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.endpoint()).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn spawn_all(&self, digest: &Digest) -> JoinSet<(usize, Result<Bytes>)> {
        let mut set = JoinSet::new();
        for (index, client) in self.clients.iter().enumerate() {
            let client = Arc::clone(client);
            let digest = *digest;
            let timeout = self.timeout;
            set.spawn(async move {
                debug!(endpoint = client.endpoint(), "submitting digest");
                let result = match tokio::time::timeout(timeout, client.submit(&digest)).await {
                    Ok(Ok(payload)) if payload.is_empty() => Err(CalendarError::InvalidResponse {
                        endpoint: client.endpoint().to_string(),
                        reason: "empty attestation".into(),
                    }),
                    Ok(result) => result,
                    Err(_) => Err(CalendarError::Timeout {
                        endpoint: client.endpoint().to_string(),
                        after_ms: timeout.as_millis() as u64,
                    }),
                };
                (index, result)
            });
        }
        set
    }

    fn endpoint_at(&self, index: usize) -> String {
        self.clients
            .get(index)
            .map(|c| c.endpoint().to_string())
            .unwrap_or_default()
    }

    /// Get one attestation for `digest`.
    ///
    /// The first endpoint to answer wins and the others are cancelled.
    pub async fn stamp(&self, digest: &Digest) -> Result<Attestation> {
        if self.clients.is_empty() {
            return Err(CalendarError::NoEndpoints);
        }

        let mut set = self.spawn_all(digest);
        let mut last: Option<String> = None;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(payload))) => {
                    let endpoint = self.endpoint_at(index);
                    info!(%endpoint, "stamp succeeded");
                    set.abort_all();
                    return Ok(Attestation { endpoint, payload });
                }
                Ok((index, Err(e))) => {
                    warn!(endpoint = %self.endpoint_at(index), error = %e, "calendar failed");
                    last = Some(e.to_string());
                }
                Err(e) => {
                    warn!(error = %e, "calendar task failed");
                    last = Some(e.to_string());
                }
            }
        }

        Err(CalendarError::AllEndpointsFailed {
            attempts: self.clients.len(),
            last: last.unwrap_or_else(|| "unknown error".into()),
        })
    }

    /// Ask every endpoint and keep every answer.
    ///
    /// Individual failures are reported, not returned as errors.
    pub async fn collect(&self, digest: &Digest) -> CollectReport {
        let mut set = self.spawn_all(digest);
        let mut answers: Vec<(usize, Bytes)> = Vec::new();
        let mut report = CollectReport::default();

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(payload))) => answers.push((index, payload)),
                Ok((index, Err(e))) => {
                    let endpoint = self.endpoint_at(index);
                    warn!(%endpoint, error = %e, "calendar failed");
                    report.failed.push((endpoint, e.to_string()));
                }
                Err(e) => {
                    warn!(error = %e, "calendar task failed");
                    report.failed.push((String::new(), e.to_string()));
                }
            }
        }

        answers.sort_by_key(|(index, _)| *index);
        for (index, payload) in answers {
            let endpoint = self.endpoint_at(index);
            report.succeeded.push(endpoint.clone());
            report.attestations.push(Attestation { endpoint, payload });
        }
        report.failed.sort();
        report
    }
}
