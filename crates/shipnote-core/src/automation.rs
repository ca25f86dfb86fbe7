//! Automation orchestrator: the single entry point invoked by the event
//! CRUD code path after a status change is persisted.
//!
//! Flow per invocation: policy gate → debounce guard → template resolution
//! → render → subscriber fan-out → audit write. Every failure is folded
//! into the returned outcome; a newsletter glitch must never block saving
//! the status change itself, so `process_status_change` does not return
//! errors to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Branding;
use crate::dispatch::{fan_out, Mailer, SendFailure};
use crate::error::{Result, ShipnoteError};
use crate::history::EmailHistory;
use crate::render::render;
use crate::store::AutomationStore;
use crate::template::DefaultTemplateRegistry;
use crate::types::{EventRecord, StatusDefinition, Subscriber, TemplateKind};

/// Suppresses duplicate campaigns when racing UI actions write the same
/// logical transition twice in quick succession. A heuristic time window,
/// not an idempotency key: two transitions into a trigger status more than
/// 30 seconds apart legitimately send twice.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Collaborator ports
// ---------------------------------------------------------------------------

/// Read-only view over the board's event and status tables, owned by the
/// CRUD layer.
pub trait EventSource: Send + Sync {
    fn event(&self, id: u64) -> anyhow::Result<Option<EventRecord>>;
    fn status(&self, display_name: &str) -> anyhow::Result<Option<StatusDefinition>>;
}

/// Read-only view over the newsletter audience.
pub trait SubscriberDirectory: Send + Sync {
    fn active_subscribers(&self) -> anyhow::Result<Vec<Subscriber>>;
}

/// Writer for the send-history audit row. Production writes straight to the
/// store; split out so the orchestrator's handling of a failed audit write
/// can be exercised.
pub trait HistorySink: Send + Sync {
    fn record_send(&self, record: &EmailHistory) -> Result<()>;
}

impl HistorySink for AutomationStore {
    fn record_send(&self, record: &EmailHistory) -> Result<()> {
        AutomationStore::record_send(self, record)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Old and new status are identical; nothing transitioned.
    SameStatus,
    /// Automation is switched off.
    Disabled,
    /// The new status is not in the configured trigger set.
    NotTriggered,
    /// A campaign for this event fired within the debounce window.
    Debounced,
}

/// Result of one `process_status_change` invocation. Skips are expected
/// conditions, not failures.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AutomationOutcome {
    Skipped { reason: SkipReason },
    /// Trigger matched but there was nobody to mail. No audit row is
    /// written since no attempt was made.
    NoSubscribers,
    Sent {
        recipients: u32,
        failures: Vec<SendFailure>,
    },
    /// The pipeline could not run (unresolvable template, missing event).
    /// Aborts this transition's automation only; logged, never propagated.
    Aborted { reason: String },
}

// ---------------------------------------------------------------------------
// Automation
// ---------------------------------------------------------------------------

pub struct Automation {
    store: Arc<AutomationStore>,
    history: Arc<dyn HistorySink>,
    registry: DefaultTemplateRegistry,
    events: Arc<dyn EventSource>,
    subscribers: Arc<dyn SubscriberDirectory>,
    mailer: Arc<dyn Mailer>,
    branding: Branding,
}

impl Automation {
    pub fn new(
        store: Arc<AutomationStore>,
        registry: DefaultTemplateRegistry,
        events: Arc<dyn EventSource>,
        subscribers: Arc<dyn SubscriberDirectory>,
        mailer: Arc<dyn Mailer>,
        branding: Branding,
    ) -> Self {
        Self {
            history: store.clone(),
            store,
            registry,
            events,
            subscribers,
            mailer,
            branding,
        }
    }

    /// Replace the audit-row writer. `new` wires it to the store.
    pub fn with_history_sink(mut self, sink: Arc<dyn HistorySink>) -> Self {
        self.history = sink;
        self
    }

    /// Entry point called after the event's new status is durably
    /// committed. Never returns an error: automation is a best-effort side
    /// effect of the status update.
    pub async fn process_status_change(
        &self,
        event_id: u64,
        old_status: &str,
        new_status: &str,
    ) -> AutomationOutcome {
        match self.run(event_id, old_status, new_status).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(event_id, new_status, error = %e, "automation aborted");
                AutomationOutcome::Aborted {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn run(
        &self,
        event_id: u64,
        old_status: &str,
        new_status: &str,
    ) -> anyhow::Result<AutomationOutcome> {
        if old_status == new_status {
            debug!(event_id, status = new_status, "skip: status unchanged");
            return Ok(skip(SkipReason::SameStatus));
        }

        // redb write commits fsync; keep store access off the async runtime.
        let store = Arc::clone(&self.store);
        let policy = tokio::task::spawn_blocking(move || store.load_policy()).await??;
        if !policy.enabled {
            debug!(event_id, "skip: automation disabled");
            return Ok(skip(SkipReason::Disabled));
        }
        if !policy.should_trigger(new_status) {
            debug!(event_id, status = new_status, "skip: status not a trigger");
            return Ok(skip(SkipReason::NotTriggered));
        }

        let store = Arc::clone(&self.store);
        let debounced =
            tokio::task::spawn_blocking(move || store.recently_sent(event_id, DEBOUNCE_WINDOW))
                .await??;
        if debounced {
            debug!(event_id, "skip: campaign sent within debounce window");
            return Ok(skip(SkipReason::Debounced));
        }

        let event = self
            .events
            .event(event_id)?
            .ok_or(ShipnoteError::EventNotFound(event_id))?;
        let status = self
            .events
            .status(new_status)?
            .ok_or_else(|| ShipnoteError::StatusNotFound(new_status.to_string()))?;

        let store = Arc::clone(&self.store);
        let registry = self.registry.clone();
        let template = tokio::task::spawn_blocking(move || {
            store.resolve_template(TemplateKind::Event, &registry)
        })
        .await??;
        let rendered = render(&template, &event, &status, &self.branding);

        let recipients = self.subscribers.active_subscribers()?;
        if recipients.is_empty() {
            info!(event_id, "trigger matched but no active subscribers");
            return Ok(AutomationOutcome::NoSubscribers);
        }

        let report = fan_out(
            self.mailer.as_ref(),
            &rendered.subject,
            &rendered.body,
            &self.branding.base_url,
            &recipients,
        )
        .await;

        info!(
            event_id,
            status = new_status,
            sent = report.sent,
            failed = report.failures.len(),
            "campaign dispatched"
        );

        let record = EmailHistory::new(
            event_id,
            new_status,
            &rendered.subject,
            TemplateKind::Event,
            report.sent,
        );
        let sink = Arc::clone(&self.history);
        match tokio::task::spawn_blocking(move || sink.record_send(&record)).await {
            Ok(Ok(())) => {}
            // The emails are already out; an audit miss is logged, not fatal.
            Ok(Err(e)) => warn!(event_id, error = %e, "failed to write send history record"),
            Err(e) => warn!(event_id, error = %e, "history write task failed"),
        }

        Ok(AutomationOutcome::Sent {
            recipients: report.sent,
            failures: report.failures,
        })
    }
}

fn skip(reason: SkipReason) -> AutomationOutcome {
    AutomationOutcome::Skipped { reason }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
