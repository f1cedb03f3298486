use std::collections::{BTreeMap, VecDeque};
use std::error::Error as StdError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::Request;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::CollectorConfig;
use crate::describe::{instance_from_error, DefaultDescriber, Describe};
use crate::error::Result;
use crate::report::ErrorReport;
use crate::snapshot::{AggregatedErrorView, SnapshotPayload};
use crate::stack::capture_stack;
use crate::types::{HttpContext, Occurrence, Severity};

/// Accumulated state for one aggregation key.
struct Group {
    created_at: OffsetDateTime,
    last_seen_at: OffsetDateTime,
    total_count: u64,
    latest: VecDeque<Occurrence>,
}

impl Group {
    fn new(now: OffsetDateTime) -> Self {
        Self {
            created_at: now,
            last_seen_at: now,
            total_count: 0,
            latest: VecDeque::new(),
        }
    }

    /// Count the occurrence and retain it, evicting the oldest beyond
    /// `capacity`. Keeps `latest.len() <= min(capacity, total_count)`.
    fn push(&mut self, occurrence: Occurrence, capacity: usize) {
        self.total_count = self.total_count.saturating_add(1);
        self.last_seen_at = occurrence.observed_at;
        self.latest.push_back(occurrence);
        while self.latest.len() > capacity {
            self.latest.pop_front();
        }
    }

    fn view(&self, key: &str) -> AggregatedErrorView {
        AggregatedErrorView {
            aggregation_key: key.to_string(),
            total_count: self.total_count,
            created_at: self.created_at,
            last_seen_at: self.last_seen_at,
            latest_errors: self.latest.iter().cloned().collect(),
        }
    }
}

/// Groups reported errors by aggregation key.
///
/// Share it as `Arc<Collector>`; every method takes `&self`. Reporting never
/// fails and never panics on behalf of the caller.
pub struct Collector {
    config: CollectorConfig,
    describer: Arc<dyn Describe>,
    target_uuid: Uuid,
    groups: Mutex<BTreeMap<String, Group>>,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        Self::build(CollectorConfig::default())
    }

    pub fn with_config(config: CollectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CollectorConfig) -> Self {
        Self {
            config,
            describer: Arc::new(DefaultDescriber),
            target_uuid: Uuid::new_v4(),
            groups: Mutex::new(BTreeMap::new()),
        }
    }

    /// Replace how error values are turned into message and class.
    pub fn with_describer(mut self, describer: impl Describe + 'static) -> Self {
        self.describer = Arc::new(describer);
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn target_uuid(&self) -> Uuid {
        self.target_uuid
    }

    // ── Report entry points ──

    pub fn report<E: StdError + 'static>(&self, err: &E) {
        self.submit(ErrorReport::new(err));
    }

    pub fn report_with_severity<E: StdError + 'static>(&self, err: &E, severity: Severity) {
        self.submit(ErrorReport::new(err).severity(severity));
    }

    pub fn report_with_http_context<E: StdError + 'static>(
        &self,
        err: &E,
        http_context: HttpContext,
    ) {
        self.submit(ErrorReport::new(err).http_context(http_context));
    }

    pub fn report_with_http_context_and_severity<E: StdError + 'static>(
        &self,
        err: &E,
        severity: Severity,
        http_context: HttpContext,
    ) {
        self.submit(
            ErrorReport::new(err)
                .severity(severity)
                .http_context(http_context),
        );
    }

    /// Report with context copied from a live request. The body is not read.
    pub fn report_with_http_request<E: StdError + 'static, B>(&self, err: &E, req: &Request<B>) {
        self.submit(ErrorReport::new(err).http_request(req));
    }

    pub fn report_with_http_request_and_severity<E: StdError + 'static, B>(
        &self,
        err: &E,
        severity: Severity,
        req: &Request<B>,
    ) {
        self.submit(ErrorReport::new(err).severity(severity).http_request(req));
    }

    /// Record a pre-assembled occurrence verbatim, for errors that are not
    /// Rust error values. `key` overrides the derived aggregation key.
    pub fn report_occurrence(&self, occurrence: Occurrence, key: Option<&str>) {
        self.record(occurrence, key);
    }

    pub fn submit(&self, report: ErrorReport<'_>) {
        // Captured here, while the reporting caller is still on the stack.
        let stacktrace = capture_stack(0, self.config.max_stack_frames);
        let instance = instance_from_error(
            self.describer.as_ref(),
            report.err,
            report.type_name,
            stacktrace,
        );
        let occurrence = Occurrence::new(instance, report.severity, report.http_context);
        self.record(occurrence, report.key.as_deref());
    }

    fn record(&self, occurrence: Occurrence, key: Option<&str>) {
        let key = self.config.key_strategy.key_for(&occurrence.error, key);
        tracing::trace!(key = %key, severity = %occurrence.severity, "error reported");

        let created = {
            let mut groups = self.lock();
            match groups.get_mut(&key) {
                Some(group) => {
                    group.push(occurrence, self.config.capacity);
                    false
                }
                None => {
                    let mut group = Group::new(occurrence.observed_at);
                    group.push(occurrence, self.config.capacity);
                    groups.insert(key.clone(), group);
                    true
                }
            }
        };
        if created {
            tracing::debug!(key = %key, "new error group");
        }
    }

    // ── Read side ──

    /// Copy every group out under the lock. Later reports do not affect the
    /// returned payload.
    pub fn snapshot(&self) -> SnapshotPayload {
        let groups = self.lock();
        SnapshotPayload {
            target_uuid: self.target_uuid,
            aggregated_errors: groups.iter().map(|(key, g)| g.view(key)).collect(),
        }
    }

    /// Number of distinct groups.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn total_count(&self, key: &str) -> Option<u64> {
        self.lock().get(key).map(|g| g.total_count)
    }

    /// A reporter that panicked while holding the lock cannot leave a group
    /// half-updated (`push` does not panic), so poisoned state is reused.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Group>> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
