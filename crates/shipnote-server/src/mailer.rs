//! SMTP mail transport backed by lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use shipnote_core::config::{SmtpConfig, SmtpEncryption};
use shipnote_core::dispatch::Mailer;

/// Production `Mailer` implementation over an async SMTP connection pool.
#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid from address '{}': {e}", config.from_address))?;

        let mut builder = match config.encryption {
            SmtpEncryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
            SmtpEncryption::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            }
            // Plaintext, for local relays and test harnesses only.
            SmtpEncryption::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
        };
        builder = builder.port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid recipient '{to}': {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;
        self.transport.send(message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.dev".into(),
            port: 587,
            username: "mailer".into(),
            password: "secret".into(),
            from_address: "Shipnote <news@example.dev>".into(),
            encryption: SmtpEncryption::StartTls,
        }
    }

    #[test]
    fn builds_from_valid_config() {
        assert!(SmtpMailer::new(&config()).is_ok());
    }

    #[test]
    fn rejects_malformed_from_address() {
        let mut cfg = config();
        cfg.from_address = "not an address".into();
        let err = SmtpMailer::new(&cfg).unwrap_err();
        assert!(err.to_string().contains("invalid from address"));
    }
}
