use async_trait::async_trait;
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

use learnmart_config::EmailConfig;
use learnmart_core::AppError;

/// Outgoing account emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, to_email: &str, to_name: &str, otp: &str) -> Result<(), AppError>;

    async fn send_password_reset(
        &self,
        to_email: &str,
        to_name: &str,
        reset_token: &str,
    ) -> Result<(), AppError>;

    async fn send_password_reset_confirmation(
        &self,
        to_email: &str,
        to_name: &str,
    ) -> Result<(), AppError>;
}

struct Rendered {
    subject: &'static str,
    text: String,
    html: String,
}

fn render_otp(to_name: &str, otp: &str, ttl_minutes: u64) -> Rendered {
    Rendered {
        subject: "Verify your LearnMart account",
        text: format!(
            "Hi {to_name},\n\n\
             Your LearnMart verification code is: {otp}\n\n\
             The code expires in {ttl_minutes} minutes.\n\n\
             If you didn't create an account, please ignore this email.\n\n\
             LearnMart Team"
        ),
        html: format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333;">
  <h2>Verify your email</h2>
  <p>Hi {to_name},</p>
  <p>Your LearnMart verification code is:</p>
  <p style="font-size: 28px; letter-spacing: 6px; font-weight: bold;">{otp}</p>
  <p>The code expires in {ttl_minutes} minutes.</p>
  <p style="color: #888;">If you didn't create an account, please ignore this email.</p>
</body>
</html>"#
        ),
    }
}

fn render_password_reset(to_name: &str, reset_link: &str) -> Rendered {
    Rendered {
        subject: "Password Reset Request",
        text: format!(
            "Hi {to_name},\n\n\
             You requested to reset your password.\n\n\
             Open the link below to choose a new password:\n\
             {reset_link}\n\n\
             This link expires in 5 minutes.\n\n\
             If you didn't request this, please ignore this email.\n\n\
             LearnMart Team"
        ),
        html: format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333;">
  <h2>Password Reset Request</h2>
  <p>Hi {to_name},</p>
  <p>You requested to reset your password.</p>
  <p><a href="{reset_link}" style="background: #4f46e5; color: #fff; padding: 10px 18px; text-decoration: none; border-radius: 4px;">Reset password</a></p>
  <p>This link expires in 5 minutes.</p>
  <p style="color: #888;">If you didn't request this, please ignore this email.</p>
</body>
</html>"#
        ),
    }
}

fn render_password_reset_confirmation(to_name: &str) -> Rendered {
    Rendered {
        subject: "Password Reset Successful",
        text: format!(
            "Hi {to_name},\n\n\
             Your password has been successfully reset.\n\n\
             If you didn't make this change, please contact support immediately.\n\n\
             LearnMart Team"
        ),
        html: format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333;">
  <h2>Password Reset Successful</h2>
  <p>Hi {to_name},</p>
  <p>Your password has been successfully reset.</p>
  <p style="color: #888;">If you didn't make this change, please contact support immediately.</p>
</body>
</html>"#
        ),
    }
}

/// SMTP delivery through lettre.
///
/// Unless `SMTP_ENABLED=true`, messages are only logged.
pub struct SmtpMailer {
    config: EmailConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    otp_ttl_minutes: u64,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Result<Self, lettre::transport::smtp::Error> {
        let transport = if !config.enabled {
            None
        } else if config.smtp_username.is_empty() {
            Some(
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                    .port(config.smtp_port)
                    .build(),
            )
        } else {
            let creds = Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            );
            Some(
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
                    .port(config.smtp_port)
                    .credentials(creds)
                    .build(),
            )
        };

        Ok(Self {
            config,
            transport,
            otp_ttl_minutes: 10,
        })
    }

    pub fn with_otp_ttl(mut self, ttl_seconds: u64) -> Self {
        self.otp_ttl_minutes = (ttl_seconds / 60).max(1);
        self
    }

    #[instrument(skip(self, rendered), fields(subject = rendered.subject))]
    async fn deliver(&self, to_email: &str, rendered: Rendered) -> Result<(), AppError> {
        let Some(transport) = &self.transport else {
            info!(to = %to_email, "Email delivery disabled, message not sent");
            return Ok(());
        };

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?)
            .subject(rendered.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(rendered.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(rendered.html),
                    ),
            )
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        transport
            .send(email)
            .await
            .map_err(|e| AppError::internal_error(format!("Failed to send email: {}", e)))?;

        info!(to = %to_email, "Email sent");
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, otp))]
    async fn send_otp(&self, to_email: &str, to_name: &str, otp: &str) -> Result<(), AppError> {
        self.deliver(to_email, render_otp(to_name, otp, self.otp_ttl_minutes))
            .await
    }

    #[instrument(skip(self, reset_token))]
    async fn send_password_reset(
        &self,
        to_email: &str,
        to_name: &str,
        reset_token: &str,
    ) -> Result<(), AppError> {
        let reset_link = format!(
            "{}/reset-password?token={}&email={}",
            self.config.frontend_url, reset_token, to_email
        );
        self.deliver(to_email, render_password_reset(to_name, &reset_link))
            .await
    }

    #[instrument(skip(self))]
    async fn send_password_reset_confirmation(
        &self,
        to_email: &str,
        to_name: &str,
    ) -> Result<(), AppError> {
        self.deliver(to_email, render_password_reset_confirmation(to_name))
            .await
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use capture::{CapturingMailer, SentEmail, SentEmailKind};

#[cfg(any(test, feature = "test-utils"))]
mod capture {
    use std::sync::{Arc, Mutex, PoisonError};

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SentEmailKind {
        Otp,
        PasswordReset,
        PasswordResetConfirmation,
    }

    #[derive(Debug, Clone)]
    pub struct SentEmail {
        pub to: String,
        pub kind: SentEmailKind,
        /// OTP or reset token carried by the message
        pub secret: Option<String>,
    }

    /// Keeps every message in memory instead of sending it.
    #[derive(Clone, Default)]
    pub struct CapturingMailer {
        sent: Arc<Mutex<Vec<SentEmail>>>,
    }

    impl CapturingMailer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<SentEmail> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        fn last_secret(&self, to_email: &str, kind: SentEmailKind) -> Option<String> {
            self.sent()
                .into_iter()
                .rev()
                .find(|m| m.to == to_email && m.kind == kind)
                .and_then(|m| m.secret)
        }

        pub fn last_otp(&self, to_email: &str) -> Option<String> {
            self.last_secret(to_email, SentEmailKind::Otp)
        }

        pub fn last_reset_token(&self, to_email: &str) -> Option<String> {
            self.last_secret(to_email, SentEmailKind::PasswordReset)
        }

        fn record(&self, to: &str, kind: SentEmailKind, secret: Option<&str>) {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(SentEmail {
                    to: to.to_string(),
                    kind,
                    secret: secret.map(str::to_string),
                });
        }
    }

    #[async_trait]
    impl Mailer for CapturingMailer {
        async fn send_otp(&self, to_email: &str, _to_name: &str, otp: &str) -> Result<(), AppError> {
            self.record(to_email, SentEmailKind::Otp, Some(otp));
            Ok(())
        }

        async fn send_password_reset(
            &self,
            to_email: &str,
            _to_name: &str,
            reset_token: &str,
        ) -> Result<(), AppError> {
            self.record(to_email, SentEmailKind::PasswordReset, Some(reset_token));
            Ok(())
        }

        async fn send_password_reset_confirmation(
            &self,
            to_email: &str,
            _to_name: &str,
        ) -> Result<(), AppError> {
            self.record(to_email, SentEmailKind::PasswordResetConfirmation, None);
            Ok(())
        }
    }
}
