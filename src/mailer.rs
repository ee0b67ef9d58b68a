// Report delivery by email

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::config::MailConfig;

/// Subject line of the daily mail
pub fn report_subject(date: NaiveDate) -> String {
    format!("Daily Portfolio Report - {}", date.format("%d.%m.%Y"))
}

/// Delivers a finished report
pub trait Mailer {
    fn send_report(&self, subject: &str, body: &str) -> Result<()>;
}

/// Mailer over implicit-TLS SMTP with password authentication
pub struct SmtpMailer {
    config: MailConfig,
    password: String,
}

impl SmtpMailer {
    /// Build from config, reading the password from `config.password_env`
    pub fn from_env(config: &MailConfig) -> Result<Self> {
        let password = std::env::var(&config.password_env).with_context(|| {
            format!(
                "SMTP password not set: export {} to enable mail delivery",
                config.password_env
            )
        })?;
        Ok(Self::new(config.clone(), password))
    }

    pub fn new(config: MailConfig, password: String) -> Self {
        Self { config, password }
    }

    fn username(&self) -> &str {
        self.config.username.as_deref().unwrap_or(&self.config.from)
    }
}

/// Assemble the plain-text UTF-8 message
pub fn build_message(config: &MailConfig, subject: &str, body: &str) -> Result<Message> {
    if body.trim().is_empty() {
        bail!("refusing to send an empty report");
    }

    let from: Mailbox = config
        .from
        .parse()
        .with_context(|| format!("Invalid sender address: {}", config.from))?;
    let to: Mailbox = config
        .to
        .parse()
        .with_context(|| format!("Invalid recipient address: {}", config.to))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| anyhow!("Failed to build report mail: {}", e))
}

impl Mailer for SmtpMailer {
    fn send_report(&self, subject: &str, body: &str) -> Result<()> {
        let message = build_message(&self.config, subject, body)?;

        let transport = SmtpTransport::relay(&self.config.smtp_host)
            .with_context(|| format!("Invalid SMTP host: {}", self.config.smtp_host))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.username().to_string(),
                self.password.clone(),
            ))
            .build();

        info!("Sending report mail to {}", self.config.to);
        transport
            .send(&message)
            .context("SMTP delivery failed")?;
        info!("Report mail sent to {}", self.config.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MailConfig {
        MailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 465,
            from: "Portfolio <me@example.com>".to_string(),
            to: "me@example.com".to_string(),
            username: None,
            password_env: "GOLDFOLIO_TEST_UNSET_PASSWORD".to_string(),
        }
    }

    #[test]
    fn test_subject_uses_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 8).unwrap();
        assert_eq!(report_subject(date), "Daily Portfolio Report - 08.10.2026");
    }

    #[test]
    fn test_build_message() {
        let message = build_message(&config(), "Daily Portfolio Report", "TOTAL 1,000 TL").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Daily Portfolio Report"));
        assert!(raw.contains("To: me@example.com"));
        assert!(raw.contains("text/plain"));
    }

    #[test]
    fn test_empty_body_is_rejected() {
        assert!(build_message(&config(), "s", "   \n").is_err());
    }

    #[test]
    fn test_bad_address_is_rejected() {
        let mut config = config();
        config.to = "not an address".to_string();
        let err = build_message(&config, "s", "body").unwrap_err();
        assert!(err.to_string().contains("Invalid recipient"));
    }

    #[test]
    fn test_missing_password_env_is_an_error() {
        let err = SmtpMailer::from_env(&config()).err().unwrap();
        assert!(err.to_string().contains("GOLDFOLIO_TEST_UNSET_PASSWORD"));
    }

    #[test]
    fn test_username_defaults_to_sender() {
        let mailer = SmtpMailer::new(config(), "secret".to_string());
        assert_eq!(mailer.username(), "Portfolio <me@example.com>");

        let mut with_login = config();
        with_login.username = Some("login@example.com".to_string());
        let mailer = SmtpMailer::new(with_login, "secret".to_string());
        assert_eq!(mailer.username(), "login@example.com");
    }
}
