//! Persistent automation state using redb.
//!
//! # Table design
//!
//! The `EMAIL_HISTORY` table uses a 32-byte composite key:
//! ```text
//! [ event_id: u64 big-endian (8) | sent_at_ms: u64 big-endian (8) | uuid (16) ]
//! ```
//!
//! Because the event id occupies the high bytes, all history for one event
//! is a contiguous key range, and within that range byte ordering equals
//! timestamp ordering. The 30-second debounce check is a single range scan
//! `[event_id | cutoff_ms | 0×16 ..= event_id | 0xff×24]` with no
//! post-filtering.
//!
//! `AUTOMATION_POLICY` holds the singleton policy under a fixed key, and
//! `EMAIL_TEMPLATES` holds admin overrides keyed by template kind. Built-in
//! defaults never live here; they come from the injected
//! `DefaultTemplateRegistry` at resolution time.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};

use crate::error::{Result, ShipnoteError};
use crate::history::EmailHistory;
use crate::policy::AutomationPolicy;
use crate::template::{DefaultTemplateRegistry, EmailTemplate};
use crate::types::TemplateKind;

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

/// Key: fixed `POLICY_KEY`. Value: JSON-encoded AutomationPolicy.
const AUTOMATION_POLICY: TableDefinition<&str, &[u8]> = TableDefinition::new("automation_policy");

/// Key: `TemplateKind::key()`. Value: JSON-encoded EmailTemplate override.
const EMAIL_TEMPLATES: TableDefinition<u8, &[u8]> = TableDefinition::new("email_templates");

/// Key: 32-byte composite (event_id ++ sent_at_ms ++ uuid).
/// Value: JSON-encoded EmailHistory.
const EMAIL_HISTORY: TableDefinition<&[u8], &[u8]> = TableDefinition::new("email_history");

const POLICY_KEY: &str = "automation";

/// Hard cap on page size for history listing.
const MAX_PAGE_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

fn history_key(event_id: u64, sent_at: DateTime<Utc>, id: uuid::Uuid) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&event_id.to_be_bytes());
    let ms = sent_at.timestamp_millis().max(0) as u64;
    key[8..16].copy_from_slice(&ms.to_be_bytes());
    key[16..].copy_from_slice(id.as_bytes());
    key
}

/// Smallest key for `event_id` with `sent_at_ms >= cutoff_ms`.
fn event_lower_bound(event_id: u64, cutoff: DateTime<Utc>) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&event_id.to_be_bytes());
    let ms = cutoff.timestamp_millis().max(0) as u64;
    key[8..16].copy_from_slice(&ms.to_be_bytes());
    key
}

/// Largest possible key for `event_id`.
fn event_upper_bound(event_id: u64) -> [u8; 32] {
    let mut key = [0xffu8; 32];
    key[..8].copy_from_slice(&event_id.to_be_bytes());
    key
}

// ---------------------------------------------------------------------------
// AutomationStore
// ---------------------------------------------------------------------------

/// Durable store for the automation policy, template overrides, and the
/// email send history.
pub struct AutomationStore {
    db: Database,
}

impl AutomationStore {
    /// Open or create the redb database at `path`, ensuring all tables
    /// exist before any reads. redb does not create missing parent
    /// directories itself.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            crate::io::ensure_dir(parent)?;
        }
        let db = Database::create(path).map_err(store_err)?;
        let wt = db.begin_write().map_err(store_err)?;
        wt.open_table(AUTOMATION_POLICY).map_err(store_err)?;
        wt.open_table(EMAIL_TEMPLATES).map_err(store_err)?;
        wt.open_table(EMAIL_HISTORY).map_err(store_err)?;
        wt.commit().map_err(store_err)?;
        Ok(Self { db })
    }

    // -----------------------------------------------------------------------
    // Policy
    // -----------------------------------------------------------------------

    /// The stored policy, or the disabled default when never configured.
    pub fn load_policy(&self) -> Result<AutomationPolicy> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(AUTOMATION_POLICY).map_err(store_err)?;
        match table.get(POLICY_KEY).map_err(store_err)? {
            Some(v) => Ok(serde_json::from_slice(v.value())?),
            None => Ok(AutomationPolicy::default()),
        }
    }

    /// Persist the policy, normalizing the trigger list at this write
    /// boundary so reads never see malformed entries.
    pub fn save_policy(&self, policy: AutomationPolicy) -> Result<AutomationPolicy> {
        let policy = policy.normalized();
        let value = serde_json::to_vec(&policy)?;
        let wt = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wt.open_table(AUTOMATION_POLICY).map_err(store_err)?;
            table
                .insert(POLICY_KEY, value.as_slice())
                .map_err(store_err)?;
        }
        wt.commit().map_err(store_err)?;
        Ok(policy)
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    /// The admin override for `kind`, if one was saved.
    pub fn custom_template(&self, kind: TemplateKind) -> Result<Option<EmailTemplate>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(EMAIL_TEMPLATES).map_err(store_err)?;
        match table.get(kind.key()).map_err(store_err)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    /// Save or replace the override for the template's kind. Overrides are
    /// never deleted, only replaced.
    pub fn set_template(&self, template: &EmailTemplate) -> Result<()> {
        let value = serde_json::to_vec(template)?;
        let wt = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wt.open_table(EMAIL_TEMPLATES).map_err(store_err)?;
            table
                .insert(template.kind.key(), value.as_slice())
                .map_err(store_err)?;
        }
        wt.commit().map_err(store_err)?;
        Ok(())
    }

    /// The effective template for `kind`: admin override if present, else
    /// the registry default. Neither existing is a configuration error that
    /// aborts the current send only.
    pub fn resolve_template(
        &self,
        kind: TemplateKind,
        registry: &DefaultTemplateRegistry,
    ) -> Result<EmailTemplate> {
        if let Some(custom) = self.custom_template(kind)? {
            return Ok(custom);
        }
        registry
            .get(kind)
            .cloned()
            .ok_or_else(|| ShipnoteError::TemplateUnresolved(kind.to_string()))
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Append a send record. The key is derived from the record's event id
    /// and timestamp.
    pub fn record_send(&self, record: &EmailHistory) -> Result<()> {
        let key = history_key(record.event_id, record.sent_at, record.id);
        let value = serde_json::to_vec(record)?;
        let wt = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wt.open_table(EMAIL_HISTORY).map_err(store_err)?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(store_err)?;
        }
        wt.commit().map_err(store_err)?;
        Ok(())
    }

    /// Whether any campaign for `event_id` was recorded within the last
    /// `window`. Best-effort read-then-write guard; the rare duplicate from
    /// a race is accepted rather than taking a lock.
    pub fn recently_sent(&self, event_id: u64, window: Duration) -> Result<bool> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::seconds(30));
        let lower = event_lower_bound(event_id, cutoff);
        let upper = event_upper_bound(event_id);

        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(EMAIL_HISTORY).map_err(store_err)?;
        let mut range = table
            .range(lower.as_slice()..=upper.as_slice())
            .map_err(store_err)?;
        Ok(range.next().transpose().map_err(store_err)?.is_some())
    }

    /// All send records for one event, newest first.
    pub fn history_for_event(&self, event_id: u64) -> Result<Vec<EmailHistory>> {
        let lower = event_lower_bound(event_id, DateTime::<Utc>::MIN_UTC);
        let upper = event_upper_bound(event_id);

        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(EMAIL_HISTORY).map_err(store_err)?;

        let mut result = Vec::new();
        for entry in table
            .range(lower.as_slice()..=upper.as_slice())
            .map_err(store_err)?
        {
            let (_, v) = entry.map_err(store_err)?;
            result.push(serde_json::from_slice::<EmailHistory>(v.value())?);
        }
        // Range order is timestamp ascending; the admin UI wants newest first.
        result.reverse();
        Ok(result)
    }

    /// Paged global history, newest first. `page` is 1-based; `limit` is
    /// clamped to 1..=100.
    pub fn list_history(&self, page: usize, limit: usize) -> Result<Vec<EmailHistory>> {
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        let page = page.max(1);

        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(EMAIL_HISTORY).map_err(store_err)?;

        let mut all = Vec::new();
        for entry in table.iter().map_err(store_err)? {
            let (_, v) = entry.map_err(store_err)?;
            all.push(serde_json::from_slice::<EmailHistory>(v.value())?);
        }
        all.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        Ok(all
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect())
    }
}

fn store_err(e: impl std::fmt::Display) -> ShipnoteError {
    ShipnoteError::Store(e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
