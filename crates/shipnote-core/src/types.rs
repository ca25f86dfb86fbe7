use crate::error::{Result, ShipnoteError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TemplateKind
// ---------------------------------------------------------------------------

/// Category of email content. Determines which default/override template
/// is resolved. Only `Event` is dispatched by the automation pipeline;
/// `Welcome` is sent by the subscription flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Event,
    Welcome,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Welcome => "welcome",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "event" => Ok(Self::Event),
            "welcome" => Ok(Self::Welcome),
            other => Err(ShipnoteError::UnknownTemplateKind(other.to_string())),
        }
    }

    /// Stable byte key used by the template store.
    pub fn key(&self) -> u8 {
        match self {
            Self::Event => 0,
            Self::Welcome => 1,
        }
    }

    pub fn all() -> [TemplateKind; 2] {
        [Self::Event, Self::Welcome]
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Event entities (owned by the board's CRUD layer, read-only here)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTag {
    pub name: String,
    /// Hex color (e.g. "#7c3aed") chosen in the tag editor.
    pub color: String,
}

/// A changelog entry as the board stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: u64,
    pub title: String,
    /// HTML body authored in the admin editor. May contain relative
    /// `/api/uploads/...` image sources.
    pub content: String,
    /// Current status display name.
    pub status: String,
    /// Stored date string (ISO date or RFC 3339). Kept as a string because
    /// legacy rows carry free-form values; the renderer falls back to the
    /// raw value when parsing fails.
    pub date: String,
    #[serde(default)]
    pub tags: Vec<EventTag>,
    pub slug: String,
}

/// A user-defined kanban column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDefinition {
    pub id: u64,
    pub display_name: String,
    /// Reserved statuses ("Upcoming", "Release") cannot be deleted in the UI.
    #[serde(default)]
    pub is_reserved: bool,
}

// ---------------------------------------------------------------------------
// Subscriber
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: String,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_kind_roundtrip() {
        for kind in TemplateKind::all() {
            assert_eq!(TemplateKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn template_kind_rejects_unknown() {
        assert!(matches!(
            TemplateKind::parse("digest"),
            Err(ShipnoteError::UnknownTemplateKind(_))
        ));
    }

    #[test]
    fn template_kind_keys_are_distinct() {
        assert_ne!(TemplateKind::Event.key(), TemplateKind::Welcome.key());
    }
}
