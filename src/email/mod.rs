//! Outbound email transport
//!
//! Wraps a lettre SMTP transport behind a small mailer that knows how to
//! build verification messages. With the transport disabled (dev, tests)
//! the link is logged instead of sent.

use crate::core::config::EmailConfig;
use crate::core::error::{PhonebookError, Result};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

pub struct Mailer {
    transport: Option<SmtpTransport>,
    from: Mailbox,
    base_url: String,
}

impl Mailer {
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| PhonebookError::Email(format!("Invalid sender address: {}", e)))?;

        let transport = if config.enabled {
            let builder = SmtpTransport::relay(&config.smtp_host)
                .map_err(|e| PhonebookError::Email(format!("Invalid SMTP relay: {}", e)))?;
            Some(
                builder
                    .port(config.smtp_port)
                    .credentials(Credentials::new(
                        config.username.clone(),
                        config.password.clone(),
                    ))
                    .build(),
            )
        } else {
            None
        };

        Ok(Self {
            transport,
            from,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The link embedded in verification mails
    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/api/auth/verify/{}", self.base_url, token)
    }

    /// Send the verification mail for a freshly created account.
    ///
    /// SMTP submission is blocking, so it runs on the blocking pool.
    pub async fn send_verification(&self, to: &str, token: &str) -> Result<()> {
        let link = self.verification_link(token);

        let Some(transport) = self.transport.clone() else {
            tracing::debug!(%to, %link, "Email transport disabled, skipping verification mail");
            return Ok(());
        };

        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| PhonebookError::Email(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject("Verify your email")
            .header(ContentType::TEXT_HTML)
            .body(format!(
                "<p>Welcome! Please <a href=\"{}\">verify your email</a> to activate your account.</p>",
                link
            ))
            .map_err(|e| PhonebookError::Email(format!("Failed to build message: {}", e)))?;

        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| PhonebookError::Task(format!("Email task panicked: {}", e)))?
            .map_err(|e| PhonebookError::Email(format!("Failed to send message: {}", e)))?;

        tracing::info!(%to, "Verification mail sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> EmailConfig {
        EmailConfig {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from: "Phonebook <noreply@phonebook.local>".into(),
            base_url: "http://localhost:3000/".into(),
        }
    }

    #[test]
    fn test_verification_link_trims_trailing_slash() {
        let mailer = Mailer::from_config(&disabled_config()).unwrap();
        assert_eq!(
            mailer.verification_link("cafebabe"),
            "http://localhost:3000/api/auth/verify/cafebabe"
        );
    }

    #[tokio::test]
    async fn test_disabled_transport_does_not_fail() {
        let mailer = Mailer::from_config(&disabled_config()).unwrap();
        mailer
            .send_verification("hello@example.com", "cafebabe")
            .await
            .unwrap();
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        let mut config = disabled_config();
        config.from = "not a mailbox".into();
        assert!(matches!(
            Mailer::from_config(&config),
            Err(PhonebookError::Email(_))
        ));
    }
}
