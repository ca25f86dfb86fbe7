use crate::types::TemplateKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit record proving an automated campaign was sent. Written exactly
/// once per dispatch pass that had at least one recipient, immutable once
/// written. Serves both the admin-visible send history and the debounce
/// guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailHistory {
    pub id: Uuid,
    pub event_id: u64,
    /// Status display name the event had entered when the campaign fired.
    pub event_status: String,
    pub subject: String,
    pub template_kind: TemplateKind,
    /// Successful sends only; per-recipient failures are not counted.
    pub recipient_count: u32,
    pub sent_at: DateTime<Utc>,
}

impl EmailHistory {
    pub fn new(
        event_id: u64,
        event_status: impl Into<String>,
        subject: impl Into<String>,
        template_kind: TemplateKind,
        recipient_count: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            event_status: event_status.into(),
            subject: subject.into(),
            template_kind,
            recipient_count,
            sent_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_carries_the_send_facts() {
        let rec = EmailHistory::new(7, "Release", "Dark Mode is live", TemplateKind::Event, 3);
        assert_eq!(rec.event_id, 7);
        assert_eq!(rec.event_status, "Release");
        assert_eq!(rec.recipient_count, 3);
        assert_eq!(rec.template_kind, TemplateKind::Event);
    }
}
