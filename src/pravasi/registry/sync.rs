//! Webhook sync: ships a JSON envelope of the registry to the configured
//! integration endpoint.
//!
//! A sync is split in three steps so the store is never borrowed while the
//! request is in flight: [`prepare`] snapshots the data, [`WebhookClient::deliver`]
//! performs the POST with timeout and bounded retry, and [`apply_outcome`]
//! records the result.

use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::pravasi::registry::error::{RegistryError, Result};
use crate::pravasi::registry::model::{
    AppState, EstablishmentMaster, FamilyMember, WorkYear, WorkerRegistration,
    YearlyEstablishment,
};
use crate::pravasi::registry::persistence::SnapshotStore;
use crate::pravasi::registry::store::RegistryStore;

/// How long a success or error status stays visible before reverting to idle.
pub const STATUS_DISPLAY: Duration = Duration::from_secs(3);

/// Body posted to the webhook.
#[derive(Debug, Clone, Serialize)]
pub struct SyncEnvelope {
    /// ISO-8601 UTC with millisecond precision.
    pub timestamp: String,
    pub data: SyncData,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncData {
    pub workers: Vec<WorkerRegistration>,
    pub establishments: Vec<EstablishmentMaster>,
    pub yearly_establishments: Vec<YearlyEstablishment>,
    pub family_members: Vec<FamilyMember>,
    pub years: Vec<WorkYear>,
}

impl SyncEnvelope {
    pub fn from_state(state: &AppState, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            data: SyncData {
                workers: state.workers.clone(),
                establishments: state.establishments.clone(),
                yearly_establishments: state.yearly_establishments.clone(),
                family_members: state.family_members.clone(),
                years: state.years.clone(),
            },
        }
    }
}

/// A ready-to-send sync request, detached from the store.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub endpoint: String,
    pub envelope: SyncEnvelope,
}

/// Result of a delivery, after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Delivered,
    Failed(String),
    TimedOut,
}

/// Per-attempt timeout and retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each further retry.
    pub initial_backoff: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl SyncPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Snapshots the registry into a [`SyncRequest`].
///
/// Fails with [`RegistryError::MissingEndpoint`] when no endpoint is set, in
/// which case nothing should be sent.
pub fn prepare(state: &AppState, at: DateTime<Utc>) -> Result<SyncRequest> {
    let endpoint = state
        .integration_endpoint
        .clone()
        .ok_or(RegistryError::MissingEndpoint)?;
    Ok(SyncRequest {
        endpoint,
        envelope: SyncEnvelope::from_state(state, at),
    })
}

/// Records a delivery result. Only `Delivered` touches the store, by setting
/// `lastSyncedAt`; every other outcome is returned as [`RegistryError::Sync`].
pub fn apply_outcome<P: SnapshotStore>(
    store: &mut RegistryStore<P>,
    outcome: &SyncOutcome,
    at: DateTime<Utc>,
) -> Result<()> {
    match outcome {
        SyncOutcome::Delivered => store.record_sync(at),
        SyncOutcome::Failed(reason) => Err(RegistryError::Sync(reason.clone())),
        SyncOutcome::TimedOut => Err(RegistryError::Sync("endpoint timed out".into())),
    }
}

/// HTTP client posting envelopes to the integration endpoint.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
    policy: SyncPolicy,
}

impl WebhookClient {
    pub fn new(policy: SyncPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(policy.timeout)
            .build()
            .map_err(|e| RegistryError::Sync(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, policy })
    }

    /// Posts the envelope, retrying failed and timed-out attempts with
    /// exponential backoff until the attempt budget is spent.
    #[instrument(level = "info", skip_all, fields(endpoint = %request.endpoint))]
    pub async fn deliver(&self, request: &SyncRequest) -> SyncOutcome {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let outcome = self.attempt(request).await;
            match &outcome {
                SyncOutcome::Delivered => {
                    info!(attempt, "sync delivered");
                    return outcome;
                }
                SyncOutcome::Failed(reason) => {
                    warn!(attempt, %reason, "sync attempt failed");
                }
                SyncOutcome::TimedOut => {
                    warn!(attempt, "sync attempt timed out");
                }
            }

            if attempt >= attempts {
                return outcome;
            }
            let delay = self.policy.backoff(attempt);
            debug!(?delay, "backing off before retry");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, request: &SyncRequest) -> SyncOutcome {
        let response = self
            .http
            .post(&request.endpoint)
            .json(&request.envelope)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => SyncOutcome::Delivered,
            Ok(response) => SyncOutcome::Failed(format!(
                "endpoint responded with status {}",
                response.status()
            )),
            Err(e) if e.is_timeout() => SyncOutcome::TimedOut,
            Err(e) => SyncOutcome::Failed(e.to_string()),
        }
    }
}

/// User-facing sync indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
    Success,
    Error,
}

/// Tracks the sync indicator; success and error revert to idle after
/// [`STATUS_DISPLAY`].
#[derive(Debug, Clone, Copy)]
pub struct SyncStatus {
    state: SyncState,
    since: Instant,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            state: SyncState::Idle,
            since: Instant::now(),
        }
    }
}

impl SyncStatus {
    pub fn begin(&mut self, now: Instant) {
        self.set(SyncState::Syncing, now);
    }

    pub fn finish(&mut self, outcome: &SyncOutcome, now: Instant) {
        let state = match outcome {
            SyncOutcome::Delivered => SyncState::Success,
            SyncOutcome::Failed(_) | SyncOutcome::TimedOut => SyncState::Error,
        };
        self.set(state, now);
    }

    pub fn state_at(&self, now: Instant) -> SyncState {
        match self.state {
            SyncState::Success | SyncState::Error
                if now.saturating_duration_since(self.since) >= STATUS_DISPLAY =>
            {
                SyncState::Idle
            }
            state => state,
        }
    }

    fn set(&mut self, state: SyncState, now: Instant) {
        self.state = state;
        self.since = now;
    }
}
