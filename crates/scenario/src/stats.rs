//! Request and session counters collected during a run, and the summary
//! report built from them.

use crate::error::ScenarioError;
use crate::profile::{ConversationScope, PersonaKind, Profile};
use chatload_registry::{CounterMode, UserRegistry, UsernameGenerator};
use chatload_sdk::{Endpoint, RequestObserver, RequestRecord};
use chrono::{DateTime, Utc};
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

const LATENCY_MIN_MS: u64 = 1;
const LATENCY_MAX_MS: u64 = 60_000;
const LATENCY_SIGFIGS: u8 = 3;

#[derive(Debug, Clone)]
struct EndpointStats {
    requests: u64,
    failures: u64,
    /// Requests that never got a response.
    transport_errors: u64,
    statuses: BTreeMap<u16, u64>,
    latency_ms: Histogram<u64>,
}

impl EndpointStats {
    fn new(latency_ms: Histogram<u64>) -> Self {
        Self {
            requests: 0,
            failures: 0,
            transport_errors: 0,
            statuses: BTreeMap::new(),
            latency_ms,
        }
    }

    fn record(&mut self, record: &RequestRecord) {
        self.requests += 1;
        if !record.success {
            self.failures += 1;
        }
        match record.status {
            Some(status) => *self.statuses.entry(status).or_insert(0) += 1,
            None => self.transport_errors += 1,
        }
        let millis = u64::try_from(record.latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.saturating_record(millis.max(LATENCY_MIN_MS));
    }

    fn report(&self, endpoint: Endpoint) -> EndpointReport {
        let hist = &self.latency_ms;
        let quantile = |q: f64| {
            if hist.is_empty() {
                0.0
            } else {
                hist.value_at_quantile(q) as f64
            }
        };
        EndpointReport {
            endpoint: endpoint.to_string(),
            requests: self.requests,
            failures: self.failures,
            transport_errors: self.transport_errors,
            statuses: self
                .statuses
                .iter()
                .map(|(status, count)| (status.to_string(), *count))
                .collect(),
            latency_ms_p50: quantile(0.50),
            latency_ms_p95: quantile(0.95),
            latency_ms_p99: quantile(0.99),
            latency_ms_max: if hist.is_empty() { 0.0 } else { hist.max() as f64 },
            latency_ms_mean: if hist.is_empty() { 0.0 } else { hist.mean() },
        }
    }
}

/// Per-endpoint request counters and latency histograms. Attached to the
/// chat client as its [`RequestObserver`].
#[derive(Debug)]
pub struct RequestStats {
    template: Histogram<u64>,
    endpoints: Mutex<BTreeMap<Endpoint, EndpointStats>>,
}

impl RequestStats {
    pub fn new() -> Result<Self, ScenarioError> {
        let template =
            Histogram::<u64>::new_with_bounds(LATENCY_MIN_MS, LATENCY_MAX_MS, LATENCY_SIGFIGS)
                .map_err(|err| ScenarioError::Stats(format!("latency histogram: {err}")))?;
        Ok(Self {
            template,
            endpoints: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn total_requests(&self) -> u64 {
        self.endpoints.lock().values().map(|s| s.requests).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.endpoints.lock().values().map(|s| s.failures).sum()
    }

    pub fn requests_for(&self, endpoint: Endpoint) -> u64 {
        self.endpoints
            .lock()
            .get(&endpoint)
            .map_or(0, |s| s.requests)
    }

    /// One row per endpoint that saw traffic, in [`Endpoint`] order.
    pub fn endpoint_reports(&self) -> Vec<EndpointReport> {
        self.endpoints
            .lock()
            .iter()
            .map(|(endpoint, stats)| stats.report(*endpoint))
            .collect()
    }
}

impl RequestObserver for RequestStats {
    fn observe(&self, record: &RequestRecord) {
        let mut endpoints = self.endpoints.lock();
        endpoints
            .entry(record.endpoint)
            .or_insert_with(|| EndpointStats::new(self.template.clone()))
            .record(record);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounts {
    pub spawned: u64,
    pub authenticated: u64,
    pub auth_failures: u64,
}

/// How many sessions of each persona started, and how their login went.
#[derive(Debug, Default)]
pub struct SessionStats {
    counts: Mutex<BTreeMap<PersonaKind, SessionCounts>>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawned(&self, kind: PersonaKind) {
        self.counts.lock().entry(kind).or_default().spawned += 1;
    }

    pub fn authenticated(&self, kind: PersonaKind) {
        self.counts.lock().entry(kind).or_default().authenticated += 1;
    }

    pub fn auth_failed(&self, kind: PersonaKind) {
        self.counts.lock().entry(kind).or_default().auth_failures += 1;
    }

    pub fn snapshot(&self) -> BTreeMap<PersonaKind, SessionCounts> {
        self.counts.lock().clone()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointReport {
    pub endpoint: String,
    pub requests: u64,
    pub failures: u64,
    pub transport_errors: u64,
    pub statuses: BTreeMap<String, u64>,
    pub latency_ms_p50: f64,
    pub latency_ms_p95: f64,
    pub latency_ms_p99: f64,
    pub latency_ms_max: f64,
    pub latency_ms_mean: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratorSummary {
    pub seed: u64,
    pub multiplier: u64,
    pub max_users: u64,
    pub mode: CounterMode,
    pub issued: u64,
}

impl GeneratorSummary {
    pub fn of(generator: &UsernameGenerator) -> Self {
        Self {
            seed: generator.seed(),
            multiplier: generator.multiplier(),
            max_users: generator.max_users(),
            mode: generator.mode(),
            issued: generator.issued(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RegistrySummary {
    pub users: usize,
    pub conversations: usize,
}

impl RegistrySummary {
    pub fn of(registry: &UserRegistry) -> Self {
        Self {
            users: registry.user_count(),
            conversations: registry.conversation_count(),
        }
    }
}

/// Summary of a finished run, written out as JSON by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub host: String,
    pub profile: Profile,
    pub conversation_scope: ConversationScope,
    pub users: usize,
    pub spawn_rate: f64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub total_requests: u64,
    pub total_failures: u64,
    pub requests_per_sec: f64,
    pub endpoints: Vec<EndpointReport>,
    pub sessions: BTreeMap<PersonaKind, SessionCounts>,
    pub generator: GeneratorSummary,
    pub registry: RegistrySummary,
}

pub(crate) fn per_second(count: u64, elapsed: Duration) -> f64 {
    count as f64 / elapsed.as_secs_f64().max(0.001)
}
