use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// AutomationPolicy
// ---------------------------------------------------------------------------

/// Singleton setting controlling whether status transitions fire campaigns.
///
/// Trigger statuses are keyed by *display name*, matching what the admin
/// configured in the status editor. Renaming a status does not rewrite
/// stored trigger lists; the orphaned trigger simply stops matching until
/// the admin re-selects the status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomationPolicy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub trigger_statuses: BTreeSet<String>,
}

impl AutomationPolicy {
    pub fn new(enabled: bool, trigger_statuses: impl IntoIterator<Item = String>) -> Self {
        Self {
            enabled,
            trigger_statuses: trigger_statuses.into_iter().collect(),
        }
        .normalized()
    }

    /// Applied at the write boundary: trim entries and drop empties so the
    /// pure trigger check never has to deal with malformed lists.
    pub fn normalized(mut self) -> Self {
        self.trigger_statuses = self
            .trigger_statuses
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    /// Whether a transition into `new_status` should fire a campaign.
    /// Pure membership test; a disabled policy never triggers regardless of
    /// the stored status set.
    pub fn should_trigger(&self, new_status: &str) -> bool {
        self.enabled && self.trigger_statuses.contains(new_status)
    }
}
