use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use pitchside_core::sinks::{Notification, NotificationSender};
use pitchside_core::{BookingError, BookingResult};

use crate::app_config::SmtpConfig;

#[derive(Clone)]
pub struct SmtpNotifier {
    host: String,
    port: u16,
    credentials: Credentials,
    from_email: String,
    from_name: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            credentials: Credentials::new(config.username.clone(), config.password.clone().into_inner()),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        }
    }

    /// A fresh transport per message; pooled SMTP connections go stale.
    fn build_transport(&self) -> BookingResult<SmtpTransport> {
        Ok(SmtpTransport::relay(&self.host)
            .map_err(|e| BookingError::Notification(format!("smtp relay: {e}")))?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}

#[async_trait]
impl NotificationSender for SmtpNotifier {
    async fn send(&self, notification: Notification) -> BookingResult<()> {
        let Notification {
            to,
            subject,
            body_text,
            attachment,
        } = notification;

        let builder = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| BookingError::Notification(format!("invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| BookingError::Notification(format!("invalid to address: {e}")))?)
            .subject(subject);

        let email = match attachment {
            Some(receipt) => {
                let content_type = ContentType::parse(&receipt.content_type)
                    .map_err(|e| BookingError::Notification(format!("invalid receipt content type: {e}")))?;
                builder
                    .multipart(
                        MultiPart::mixed()
                            .singlepart(SinglePart::plain(body_text))
                            .singlepart(Attachment::new(receipt.filename).body(receipt.bytes, content_type)),
                    )
                    .map_err(|e| BookingError::Notification(format!("failed to build email: {e}")))?
            }
            None => builder
                .body(body_text)
                .map_err(|e| BookingError::Notification(format!("failed to build email: {e}")))?,
        };

        let mailer = self.build_transport()?;
        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| BookingError::Notification(format!("failed to send email: {e}")))
        })
        .await
        .map_err(|e| BookingError::Notification(format!("email task failed: {e}")))?
        .map(|_| ())
    }
}

/// Stands in when no SMTP section is configured. Logs the subject line
/// only; recipient addresses stay out of the logs.
pub struct NoopNotifier;

#[async_trait]
impl NotificationSender for NoopNotifier {
    async fn send(&self, notification: Notification) -> BookingResult<()> {
        tracing::info!(subject = %notification.subject, "mail transport disabled, dropping notification");
        Ok(())
    }
}
