//! Dispatch engine: bounded-concurrency fan-out of one rendered campaign
//! to every active subscriber.
//!
//! Per-recipient failures are collected, not raised; a dead mailbox or a
//! hung SMTP connection must never abort the rest of the batch.

use crate::types::Subscriber;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on concurrent in-flight sends. Keeps latency acceptable for
/// subscriber lists in the thousands without flooding the SMTP relay.
pub const MAX_IN_FLIGHT: usize = 16;

/// Per-message timeout. A hung connection for one recipient must not stall
/// the batch.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Mailer port
// ---------------------------------------------------------------------------

/// Transport-level mail sender. The SMTP client (host, credentials,
/// encryption) lives behind this seam; tests inject fakes.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// DispatchReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SendFailure {
    pub recipient: String,
    pub reason: String,
}

/// Aggregate result of one fan-out pass. `sent` counts successes only.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub sent: u32,
    pub failures: Vec<SendFailure>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.sent as usize + self.failures.len()
    }
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

/// The per-recipient unsubscribe link. Falls back to a relative path when
/// the instance has no configured base URL.
pub fn unsubscribe_url(base_url: &str, email: &str) -> String {
    let encoded = utf8_percent_encode(email, NON_ALPHANUMERIC);
    format!("{base_url}/unsubscribe?email={encoded}")
}

/// Send `subject`/`body` to every active recipient, substituting the
/// per-recipient `{{unsubscribe_url}}` token in both fields just before
/// each send. This is the only per-subscriber-varying token, so the hot
/// path is a string replace per recipient rather than a full re-render.
pub async fn fan_out(
    mailer: &dyn Mailer,
    subject: &str,
    body: &str,
    base_url: &str,
    recipients: &[Subscriber],
) -> DispatchReport {
    if recipients.is_empty() {
        debug!("dispatch skipped: no subscribers");
        return DispatchReport::default();
    }

    let jobs: Vec<(String, String, String)> = recipients
        .iter()
        .filter(|s| s.is_active)
        .map(|subscriber| {
            let link = unsubscribe_url(base_url, &subscriber.email);
            let subject = subject.replace("{{unsubscribe_url}}", &link);
            let personalized = body.replace("{{unsubscribe_url}}", &link);
            (subscriber.email.clone(), subject, personalized)
        })
        .collect();
    let results: Vec<Result<(), SendFailure>> = stream::iter(jobs)
    .map(|(email, subject, personalized)| {
        async move {
            match tokio::time::timeout(SEND_TIMEOUT, mailer.send(&email, &subject, &personalized))
                .await
            {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(SendFailure {
                    recipient: email,
                    reason: e.to_string(),
                }),
                Err(_) => Err(SendFailure {
                    recipient: email,
                    reason: format!("send timed out after {}s", SEND_TIMEOUT.as_secs()),
                }),
            }
        }
    })
    .buffer_unordered(MAX_IN_FLIGHT)
    .collect()
    .await;

    let mut report = DispatchReport::default();
    for result in results {
        match result {
            Ok(()) => report.sent += 1,
            Err(failure) => {
                warn!(
                    recipient = %failure.recipient,
                    reason = %failure.reason,
                    "recipient send failed"
                );
                report.failures.push(failure);
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    struct FakeMailer {
        /// (to, subject, html) triples, in completion order.
        outbox: Mutex<Vec<(String, String, String)>>,
        /// Addresses that fail with a simulated SMTP error.
        reject: Vec<String>,
    }

    impl FakeMailer {
        fn new(reject: &[&str]) -> Self {
            Self {
                outbox: Mutex::new(Vec::new()),
                reject: reject.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl Mailer for FakeMailer {
        async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
            if self.reject.iter().any(|r| r == to) {
                anyhow::bail!("550 mailbox unavailable");
            }
            self.outbox
                .lock()
                .unwrap()
                .push((to.into(), subject.into(), html.into()));
            Ok(())
        }
    }

    fn subscribers(emails: &[&str]) -> Vec<Subscriber> {
        emails
            .iter()
            .map(|e| Subscriber {
                email: e.to_string(),
                is_active: true,
                subscribed_at: Utc::now(),
            })
            .collect()
    }

    #[tokio::test]
    async fn empty_recipient_list_is_a_noop() {
        let mailer = FakeMailer::new(&[]);
        let report = fan_out(&mailer, "s", "b", "https://a.dev", &[]).await;
        assert_eq!(report.sent, 0);
        assert!(report.failures.is_empty());
        assert!(mailer.outbox.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_successes_counted() {
        let mailer = FakeMailer::new(&[]);
        let subs = subscribers(&["a@x.dev", "b@x.dev", "c@x.dev"]);
        let report = fan_out(&mailer, "hi", "{{unsubscribe_url}}", "https://a.dev", &subs).await;
        assert_eq!(report.sent, 3);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let mailer = FakeMailer::new(&["b@x.dev"]);
        let subs = subscribers(&["a@x.dev", "b@x.dev", "c@x.dev"]);
        let report = fan_out(&mailer, "hi", "body", "https://a.dev", &subs).await;
        assert_eq!(report.sent, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].recipient, "b@x.dev");
        assert!(report.failures[0].reason.contains("550"));
        assert_eq!(mailer.outbox.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unsubscribe_token_is_personalized_per_recipient() {
        let mailer = FakeMailer::new(&[]);
        let subs = subscribers(&["jo+news@x.dev"]);
        let report = fan_out(
            &mailer,
            "hi",
            "bye: {{unsubscribe_url}}",
            "https://a.dev",
            &subs,
        )
        .await;
        assert_eq!(report.sent, 1);
        let outbox = mailer.outbox.lock().unwrap();
        // '+' and '@' survive as percent-escapes in the query string
        assert!(outbox[0]
            .2
            .contains("https://a.dev/unsubscribe?email=jo%2Bnews%40x%2Edev"));
    }

    #[tokio::test]
    async fn unsubscribe_token_in_subject_is_personalized() {
        let mailer = FakeMailer::new(&[]);
        let subs = subscribers(&["a@x.dev"]);
        let report = fan_out(
            &mailer,
            "opt out: {{unsubscribe_url}}",
            "body",
            "https://a.dev",
            &subs,
        )
        .await;
        assert_eq!(report.sent, 1);
        let outbox = mailer.outbox.lock().unwrap();
        assert_eq!(
            outbox[0].1,
            "opt out: https://a.dev/unsubscribe?email=a%40x%2Edev"
        );
    }

    #[tokio::test]
    async fn inactive_subscribers_are_skipped() {
        let mailer = FakeMailer::new(&[]);
        let mut subs = subscribers(&["a@x.dev", "b@x.dev"]);
        subs[1].is_active = false;
        let report = fan_out(&mailer, "hi", "body", "", &subs).await;
        assert_eq!(report.sent, 1);
        assert_eq!(report.attempted(), 1);
    }

    #[test]
    fn unsubscribe_url_is_relative_without_base() {
        assert_eq!(
            unsubscribe_url("", "a@x.dev"),
            "/unsubscribe?email=a%40x%2Edev"
        );
    }
}
