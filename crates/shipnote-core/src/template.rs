use crate::types::TemplateKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// EmailTemplate
// ---------------------------------------------------------------------------

/// A named email template: subject line + HTML body. Saved templates are
/// authored in the admin editor with the literal `{{...}}` tokens below;
/// the token vocabulary is a wire contract with saved templates and must
/// not change meaning between releases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub kind: TemplateKind,
    pub subject: String,
    pub body: String,
}

// ---------------------------------------------------------------------------
// DefaultTemplateRegistry
// ---------------------------------------------------------------------------

/// Built-in templates, one per kind, constructed once at startup and passed
/// into template resolution. Admin overrides shadow these; they are never
/// deleted, so resolution always has a fallback.
#[derive(Debug, Clone)]
pub struct DefaultTemplateRegistry {
    defaults: HashMap<TemplateKind, EmailTemplate>,
}

impl DefaultTemplateRegistry {
    /// The stock registry with the shipped Event and Welcome templates.
    pub fn standard() -> Self {
        let mut defaults = HashMap::new();
        defaults.insert(
            TemplateKind::Event,
            EmailTemplate {
                kind: TemplateKind::Event,
                subject: DEFAULT_EVENT_SUBJECT.to_string(),
                body: DEFAULT_EVENT_BODY.to_string(),
            },
        );
        defaults.insert(
            TemplateKind::Welcome,
            EmailTemplate {
                kind: TemplateKind::Welcome,
                subject: DEFAULT_WELCOME_SUBJECT.to_string(),
                body: DEFAULT_WELCOME_BODY.to_string(),
            },
        );
        Self { defaults }
    }

    /// An empty registry, useful for exercising resolution failure paths.
    pub fn empty() -> Self {
        Self {
            defaults: HashMap::new(),
        }
    }

    pub fn get(&self, kind: TemplateKind) -> Option<&EmailTemplate> {
        self.defaults.get(&kind)
    }
}

// ---------------------------------------------------------------------------
// Built-in defaults
// ---------------------------------------------------------------------------

const DEFAULT_EVENT_SUBJECT: &str = "{{project_name}}: {{event_name}}";

const DEFAULT_EVENT_BODY: &str = r#"<!DOCTYPE html>
<html>
<body style="margin:0;padding:0;background-color:#f4f4f7;font-family:Helvetica,Arial,sans-serif;">
  <table role="presentation" width="100%" cellpadding="0" cellspacing="0">
    <tr><td align="center" style="padding:32px 16px;">
      <table role="presentation" width="600" cellpadding="0" cellspacing="0" style="background:#ffffff;border-radius:8px;overflow:hidden;">
        <tr><td style="padding:24px 32px;border-bottom:1px solid #eaeaec;">
          <a href="{{project_url}}" style="font-size:18px;font-weight:bold;color:#1a1a2e;text-decoration:none;">{{project_name}}</a>
        </td></tr>
        <tr><td style="padding:32px;">
          <h1 style="margin:0 0 8px;font-size:22px;color:#1a1a2e;">{{event_name}}</h1>
          <p style="margin:0 0 4px;font-size:13px;color:#6b7280;">{{event_date}}</p>
          <p style="margin:0 0 16px;">{{event_tags}}</p>
          <div style="font-size:15px;line-height:1.6;color:#374151;">{{event_content}}</div>
          <table role="presentation" cellpadding="0" cellspacing="0" style="margin-top:24px;">
            <tr><td style="border-radius:6px;background-color:{{primary_color}};">
              <a href="{{event_url}}" style="display:inline-block;padding:10px 20px;font-size:14px;color:#ffffff;text-decoration:none;">Read more</a>
            </td></tr>
          </table>
        </td></tr>
        <tr><td style="padding:20px 32px;border-top:1px solid #eaeaec;font-size:12px;color:#9ca3af;">
          You are receiving this because you subscribed to {{project_name}} updates.
          <a href="{{unsubscribe_url}}" style="color:#9ca3af;">Unsubscribe</a>
        </td></tr>
      </table>
    </td></tr>
  </table>
</body>
</html>"#;

const DEFAULT_WELCOME_SUBJECT: &str = "Welcome to {{project_name}}";

const DEFAULT_WELCOME_BODY: &str = r#"<!DOCTYPE html>
<html>
<body style="margin:0;padding:0;background-color:#f4f4f7;font-family:Helvetica,Arial,sans-serif;">
  <table role="presentation" width="100%" cellpadding="0" cellspacing="0">
    <tr><td align="center" style="padding:32px 16px;">
      <table role="presentation" width="600" cellpadding="0" cellspacing="0" style="background:#ffffff;border-radius:8px;">
        <tr><td style="padding:32px;">
          <h1 style="margin:0 0 12px;font-size:22px;color:#1a1a2e;">Welcome aboard</h1>
          <p style="font-size:15px;line-height:1.6;color:#374151;">
            Thanks for subscribing to <a href="{{project_url}}" style="color:{{primary_color}};">{{project_name}}</a>.
            We will email you whenever something new ships.
          </p>
        </td></tr>
        <tr><td style="padding:20px 32px;border-top:1px solid #eaeaec;font-size:12px;color:#9ca3af;">
          <a href="{{unsubscribe_url}}" style="color:#9ca3af;">Unsubscribe</a>
        </td></tr>
      </table>
    </td></tr>
  </table>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_covers_all_kinds() {
        let registry = DefaultTemplateRegistry::standard();
        for kind in TemplateKind::all() {
            let t = registry.get(kind).expect("default missing");
            assert_eq!(t.kind, kind);
            assert!(!t.subject.is_empty());
            assert!(t.body.contains("{{unsubscribe_url}}"));
        }
    }

    #[test]
    fn event_default_uses_the_event_tokens() {
        let registry = DefaultTemplateRegistry::standard();
        let t = registry.get(TemplateKind::Event).unwrap();
        for token in [
            "{{event_name}}",
            "{{event_url}}",
            "{{event_content}}",
            "{{event_date}}",
            "{{event_tags}}",
            "{{primary_color}}",
        ] {
            assert!(t.body.contains(token), "missing {token}");
        }
    }

    #[test]
    fn empty_registry_has_no_defaults() {
        assert!(DefaultTemplateRegistry::empty()
            .get(TemplateKind::Event)
            .is_none());
    }
}
