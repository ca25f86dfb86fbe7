//! Variable renderer: deterministic substitution of the template token
//! vocabulary with event, branding, and status values.
//!
//! `{{unsubscribe_url}}` is deliberately left intact here; it is the only
//! per-subscriber-varying token and is substituted per recipient at
//! dispatch time, so the full HTML body is rendered exactly once per
//! campaign.

use crate::config::Branding;
use crate::template::EmailTemplate;
use crate::types::{EventRecord, EventTag, StatusDefinition};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Display name of the reserved status whose dates are estimates.
const UPCOMING_STATUS: &str = "Upcoming";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

/// Substitute the fixed token set in both subject and body. Unknown tokens
/// are left intact rather than erroring; admins paste these templates by
/// hand and a typo must not break the campaign.
pub fn render(
    template: &EmailTemplate,
    event: &EventRecord,
    status: &StatusDefinition,
    branding: &Branding,
) -> RenderedEmail {
    let event_url = join_url(&branding.base_url, &event.slug);
    let content = absolutize_upload_urls(&event.content, &branding.base_url);
    let date = render_event_date(&event.date, status.display_name == UPCOMING_STATUS);
    let tags = render_tag_badges(&event.tags);

    let substitute = |input: &str| -> String {
        input
            .replace("{{project_name}}", &branding.project_name)
            .replace("{{project_url}}", &branding.base_url)
            .replace("{{event_name}}", &event.title)
            .replace("{{event_url}}", &event_url)
            .replace("{{event_content}}", &content)
            .replace("{{event_date}}", &date)
            .replace("{{event_tags}}", &tags)
            .replace("{{primary_color}}", &branding.primary_color)
    };

    RenderedEmail {
        subject: substitute(&template.subject),
        body: substitute(&template.body),
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base, path.trim_start_matches('/'))
}

/// Rewrite relative `/api/uploads/...` image sources to absolute URLs.
/// Email clients have no page base URL, so relative sources render as
/// broken images without this.
fn absolutize_upload_urls(html: &str, base_url: &str) -> String {
    if base_url.is_empty() {
        return html.to_string();
    }
    static UPLOAD_SRC_RE: OnceLock<Regex> = OnceLock::new();
    let re = UPLOAD_SRC_RE
        .get_or_init(|| Regex::new(r#"src=(["'])(/api/uploads/[^"']*)(["'])"#).unwrap());
    re.replace_all(html, |caps: &regex::Captures<'_>| {
        format!("src={}{}{}{}", &caps[1], base_url, &caps[2], &caps[3])
    })
    .into_owned()
}

/// Reformat the stored date string to `D Mon YYYY` (e.g. "5 Mar 2026").
/// Upcoming events get an "Estimated" badge prefix since their dates are
/// targets, not release dates. Parse failures fall back to the raw stored
/// string unchanged.
fn render_event_date(stored: &str, upcoming: bool) -> String {
    let formatted = parse_stored_date(stored)
        .map(|d| d.format("%-d %b %Y").to_string())
        .unwrap_or_else(|| stored.to_string());
    if upcoming {
        format!(
            "<span style=\"display:inline-block;padding:1px 6px;border-radius:4px;\
             background-color:#f59e0b;color:#ffffff;font-size:11px;vertical-align:middle;\">\
             Estimated</span> {formatted}"
        )
    } else {
        formatted
    }
}

fn parse_stored_date(stored: &str) -> Option<NaiveDate> {
    let s = stored.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// One inline-styled `<span>` per tag, tinted with the tag's stored hex
/// color. Inline styles only; email clients strip stylesheets.
fn render_tag_badges(tags: &[EventTag]) -> String {
    tags.iter()
        .map(|tag| {
            format!(
                "<span style=\"display:inline-block;padding:2px 10px;margin-right:6px;\
                 border-radius:9999px;font-size:12px;border:1px solid {c};\
                 background-color:{c}1a;color:{c};\">{name}</span>",
                c = tag.color,
                name = tag.name
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TemplateKind;

    fn branding() -> Branding {
        Branding {
            project_name: "Acme Changelog".into(),
            base_url: "https://news.acme.dev".into(),
            primary_color: "#16a34a".into(),
        }
    }

    fn event() -> EventRecord {
        EventRecord {
            id: 7,
            title: "Dark Mode".into(),
            content: r#"<p>Now live.</p><img src="/api/uploads/dark.png">"#.into(),
            status: "Release".into(),
            date: "2026-03-05".into(),
            tags: vec![EventTag {
                name: "feature".into(),
                color: "#2563eb".into(),
            }],
            slug: "dark-mode".into(),
        }
    }

    fn status(name: &str) -> StatusDefinition {
        StatusDefinition {
            id: 1,
            display_name: name.into(),
            is_reserved: true,
        }
    }

    fn template(subject: &str, body: &str) -> EmailTemplate {
        EmailTemplate {
            kind: TemplateKind::Event,
            subject: subject.into(),
            body: body.into(),
        }
    }

    #[test]
    fn substitutes_subject_and_body() {
        let t = template("{{event_name}} is live", "<h1>{{event_name}}</h1>{{event_url}}");
        let out = render(&t, &event(), &status("Release"), &branding());
        assert_eq!(out.subject, "Dark Mode is live");
        assert!(out.body.contains("<h1>Dark Mode</h1>"));
        assert!(out.body.contains("https://news.acme.dev/dark-mode"));
    }

    #[test]
    fn render_is_deterministic() {
        let t = template("{{event_name}}", "{{event_content}}{{event_tags}}{{event_date}}");
        let a = render(&t, &event(), &status("Release"), &branding());
        let b = render(&t, &event(), &status("Release"), &branding());
        assert_eq!(a, b);
    }

    #[test]
    fn upload_urls_become_absolute() {
        let t = template("s", "{{event_content}}");
        let out = render(&t, &event(), &status("Release"), &branding());
        assert!(out
            .body
            .contains(r#"src="https://news.acme.dev/api/uploads/dark.png""#));
    }

    #[test]
    fn upload_urls_untouched_without_base_url() {
        let mut b = branding();
        b.base_url = String::new();
        let t = template("s", "{{event_content}}");
        let out = render(&t, &event(), &status("Release"), &b);
        assert!(out.body.contains(r#"src="/api/uploads/dark.png""#));
    }

    #[test]
    fn date_is_reformatted() {
        let t = template("s", "{{event_date}}");
        let out = render(&t, &event(), &status("Release"), &branding());
        assert_eq!(out.body, "5 Mar 2026");
    }

    #[test]
    fn upcoming_status_gets_estimated_badge() {
        let t = template("s", "{{event_date}}");
        let out = render(&t, &event(), &status("Upcoming"), &branding());
        assert!(out.body.contains("Estimated"));
        assert!(out.body.ends_with("5 Mar 2026"));
    }

    #[test]
    fn bad_date_falls_back_to_raw_string() {
        let mut ev = event();
        ev.date = "sometime next quarter".into();
        let t = template("s", "{{event_date}}");
        let out = render(&t, &ev, &status("Release"), &branding());
        assert_eq!(out.body, "sometime next quarter");
    }

    #[test]
    fn rfc3339_dates_parse_too() {
        let mut ev = event();
        ev.date = "2026-03-05T09:30:00Z".into();
        let t = template("s", "{{event_date}}");
        let out = render(&t, &ev, &status("Release"), &branding());
        assert_eq!(out.body, "5 Mar 2026");
    }

    #[test]
    fn tags_render_as_tinted_badges() {
        let t = template("s", "{{event_tags}}");
        let out = render(&t, &event(), &status("Release"), &branding());
        assert!(out.body.contains("feature"));
        assert!(out.body.contains("border:1px solid #2563eb"));
        assert!(out.body.contains("background-color:#2563eb1a"));
    }

    #[test]
    fn unknown_tokens_are_left_intact() {
        let t = template("{{mystery}}", "{{unsubscribe_url}}");
        let out = render(&t, &event(), &status("Release"), &branding());
        assert_eq!(out.subject, "{{mystery}}");
        // unsubscribe is resolved per recipient at dispatch, not here
        assert_eq!(out.body, "{{unsubscribe_url}}");
    }
}
