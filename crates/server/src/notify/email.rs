//! Email notifications over SMTP.
//!
//! Uses lettre's async STARTTLS transport with Askama templates rendered to
//! both plain text and HTML.

use std::sync::atomic::{AtomicBool, Ordering};

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use shiftdesk_core::{ContactInfo, Shift};
use thiserror::Error;
use tracing::{info, instrument};

use super::discord::format_date;
use super::{Channel, Notifier, NotifyError};
use crate::config::EmailConfig;

/// Fields shared by the booking and cancellation templates.
struct ShiftDetails<'a> {
    name: &'a str,
    title: &'a str,
    date: String,
    time: String,
    location: &'a str,
    notes: Option<&'a str>,
    base_url: &'a str,
}

impl<'a> ShiftDetails<'a> {
    fn new(shift: &'a Shift, contact: &'a ContactInfo, base_url: &'a str) -> Self {
        Self {
            name: &contact.name,
            title: &shift.title,
            date: format_date(shift.date),
            time: shift.time_label(),
            location: &shift.location,
            notes: contact.notes.as_deref(),
            base_url,
        }
    }
}

/// HTML template for the booking confirmation.
#[derive(Template)]
#[template(path = "email/booking_confirmation.html")]
struct BookingConfirmationHtml<'a> {
    shift: &'a ShiftDetails<'a>,
}

/// Plain text template for the booking confirmation.
#[derive(Template)]
#[template(path = "email/booking_confirmation.txt")]
struct BookingConfirmationText<'a> {
    shift: &'a ShiftDetails<'a>,
}

/// HTML template for the cancellation notice.
#[derive(Template)]
#[template(path = "email/cancellation.html")]
struct CancellationHtml<'a> {
    shift: &'a ShiftDetails<'a>,
}

/// Plain text template for the cancellation notice.
#[derive(Template)]
#[template(path = "email/cancellation.txt")]
struct CancellationText<'a> {
    shift: &'a ShiftDetails<'a>,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// The SMTP server did not accept the connection check.
    #[error("SMTP server {0} is not reachable")]
    Unreachable(String),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Live email channel.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    smtp_host: String,
    from_address: String,
    base_url: String,
    ready: AtomicBool,
}

impl std::fmt::Debug for EmailNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailNotifier")
            .field("smtp_host", &self.smtp_host)
            .field("from_address", &self.from_address)
            .finish_non_exhaustive()
    }
}

impl EmailNotifier {
    /// Create a notifier; it stays not ready until [`Self::initialize`] succeeds.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig, base_url: &str) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            smtp_host: config.smtp_host.clone(),
            from_address: config.from_address.clone(),
            base_url: base_url.to_string(),
            ready: AtomicBool::new(false),
        })
    }

    /// Check the SMTP connection and mark the channel ready.
    ///
    /// # Errors
    ///
    /// Returns error if the server cannot be reached or refuses the login.
    pub async fn initialize(&self) -> Result<(), EmailError> {
        if !self.mailer.test_connection().await? {
            return Err(EmailError::Unreachable(self.smtp_host.clone()));
        }
        self.ready.store(true, Ordering::Release);
        info!(smtp_host = %self.smtp_host, "SMTP connection verified");
        Ok(())
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        self.mailer.send(email).await?;

        info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

fn recipient(contact: &ContactInfo) -> Result<&str, NotifyError> {
    contact
        .email
        .as_ref()
        .map(|e| e.as_str())
        .ok_or(NotifyError::MissingAddress(Channel::Email))
}

/// Subject line of the booking confirmation.
fn booking_subject(shift: &Shift) -> String {
    format!("Shift confirmed: {}", shift.title)
}

/// Subject line of the cancellation notice.
fn cancellation_subject(shift: &Shift) -> String {
    format!("Shift cancelled: {}", shift.title)
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    #[instrument(skip(self, shift, contact), fields(shift_id = %shift.id))]
    async fn notify_booking(
        &self,
        shift: &Shift,
        contact: &ContactInfo,
    ) -> Result<String, NotifyError> {
        let to = recipient(contact)?;
        let details = ShiftDetails::new(shift, contact, &self.base_url);
        let html = BookingConfirmationHtml { shift: &details }
            .render()
            .map_err(EmailError::from)?;
        let text = BookingConfirmationText { shift: &details }
            .render()
            .map_err(EmailError::from)?;

        self.send_multipart_email(to, &booking_subject(shift), text, html)
            .await?;
        Ok(format!("Confirmation email sent to {to}"))
    }

    #[instrument(skip(self, shift, contact), fields(shift_id = %shift.id))]
    async fn notify_cancellation(
        &self,
        shift: &Shift,
        contact: &ContactInfo,
    ) -> Result<String, NotifyError> {
        let to = recipient(contact)?;
        let details = ShiftDetails::new(shift, contact, &self.base_url);
        let html = CancellationHtml { shift: &details }
            .render()
            .map_err(EmailError::from)?;
        let text = CancellationText { shift: &details }
            .render()
            .map_err(EmailError::from)?;

        self.send_multipart_email(to, &cancellation_subject(shift), text, html)
            .await?;
        Ok(format!("Cancellation email sent to {to}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use shiftdesk_core::{Email, ShiftId, ShiftStatus};

    use super::*;

    fn shift() -> Shift {
        let now = Utc::now();
        Shift {
            id: ShiftId::new("s1"),
            title: "Turno Serale Bar".to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            start_time: Shift::parse_time("18:00").unwrap(),
            end_time: Shift::parse_time("22:00").unwrap(),
            location: "Sala Principale".to_string(),
            status: ShiftStatus::Booked,
            occupant: None,
            created_time: now,
            last_edited_time: now,
        }
    }

    #[test]
    fn test_templates_render_shift_details() {
        let shift = shift();
        let mut contact = ContactInfo::named("Anna");
        contact.notes = Some("bringing a friend".to_string());
        let details = ShiftDetails::new(&shift, &contact, "https://turni.example.org");

        let text = BookingConfirmationText { shift: &details }.render().unwrap();
        assert!(text.contains("Anna"));
        assert!(text.contains("Friday 7 March 2025"));
        assert!(text.contains("18:00 - 22:00"));
        assert!(text.contains("bringing a friend"));

        let html = CancellationHtml { shift: &details }.render().unwrap();
        assert!(html.contains("Turno Serale Bar"));
        assert!(html.contains("turni.example.org"));
    }

    #[test]
    fn test_subjects() {
        assert_eq!(booking_subject(&shift()), "Shift confirmed: Turno Serale Bar");
        assert_eq!(cancellation_subject(&shift()), "Shift cancelled: Turno Serale Bar");
    }

    #[test]
    fn test_recipient_requires_email() {
        let mut contact = ContactInfo::named("Anna");
        assert!(matches!(
            recipient(&contact),
            Err(NotifyError::MissingAddress(Channel::Email))
        ));
        contact.email = Some(Email::parse("anna@example.org").unwrap());
        assert_eq!(recipient(&contact).unwrap(), "anna@example.org");
    }
}
