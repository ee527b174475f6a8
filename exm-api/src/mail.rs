//! Contact form mail delivery
//!
//! [`MailTransport`] is the seam between the contact handler and SMTP; the
//! production implementation is [`SmtpMailer`] over lettre's async
//! transport.

use async_trait::async_trait;
use exm_common::config::EmailConfig;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::debug;

use crate::validation::ContactInput;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Mail not configured: {0}")]
    NotConfigured(String),
}

/// A fully rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

// ========================================
// SMTP
// ========================================

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build a pooled SMTP transport
    ///
    /// `service = "gmail"` selects Gmail's relay; otherwise `smtp_host` is
    /// used with implicit TLS when `smtp_secure`, STARTTLS when not.
    pub fn from_config(config: &EmailConfig) -> Result<Self, MailError> {
        let (Some(user), Some(pass)) = (config.user.clone(), config.pass.clone()) else {
            return Err(MailError::NotConfigured("user and pass are required".into()));
        };
        let credentials = Credentials::new(user, pass);

        let builder = if config.service.as_deref() == Some("gmail") {
            AsyncSmtpTransport::<Tokio1Executor>::relay("smtp.gmail.com")?
        } else if config.smtp_secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?.port(config.smtp_port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port)
        };

        Ok(SmtpMailer {
            transport: builder.credentials(credentials).build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let mut builder = Message::builder()
            .from(mail.from.parse::<Mailbox>()?)
            .to(mail.to.parse::<Mailbox>()?)
            .subject(mail.subject.as_str());
        if let Some(reply_to) = &mail.reply_to {
            builder = builder.reply_to(reply_to.parse::<Mailbox>()?);
        }
        let message = builder.multipart(MultiPart::alternative_plain_html(mail.text, mail.html))?;

        self.transport.send(message).await?;
        debug!("Sent mail to {}", mail.to);
        Ok(())
    }
}

// ========================================
// Message rendering
// ========================================

/// Escape text for inclusion in HTML, turning newlines into `<br>`
pub fn html_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Notification to the label, replying to the submitter
pub fn notification_mail(contact: &ContactInput, from: &str, to: &str) -> OutgoingMail {
    let text = format!(
        "New Contact Form Submission\n\n\
         Name: {name}\n\
         Email: {email}\n\
         Type: {kind}\n\
         Subject: {subject}\n\n\
         Message:\n{message}\n\n\
         ---\n\
         This email was sent from the Excess Music contact form.\n",
        name = contact.name,
        email = contact.email,
        kind = contact.kind.as_str(),
        subject = contact.subject,
        message = contact.message,
    );

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background: linear-gradient(135deg, #000, #333); padding: 20px; text-align: center;">
    <h1 style="color: white; margin: 0;">Excess Music</h1>
    <p style="color: #ccc; margin: 10px 0 0 0;">New Contact Form Submission</p>
  </div>
  <div style="padding: 30px; background: #f9f9f9;">
    <h2 style="color: #333; margin-top: 0;">Contact Details</h2>
    <p><strong>Name:</strong> {name}</p>
    <p><strong>Email:</strong> <a href="mailto:{email}">{email}</a></p>
    <p><strong>Type:</strong> <span style="text-transform: capitalize;">{kind}</span></p>
    <p><strong>Subject:</strong> {subject}</p>
    <p><strong>Message:</strong></p>
    <div style="background: #f8f9fa; padding: 15px; border-left: 4px solid #007bff;">{message}</div>
  </div>
  <div style="background: #333; padding: 15px; text-align: center;">
    <p style="color: #ccc; margin: 0; font-size: 12px;">This email was sent from the Excess Music contact form.</p>
  </div>
</div>"#,
        name = html_text(&contact.name),
        email = html_text(&contact.email),
        kind = contact.kind.as_str(),
        subject = html_text(&contact.subject),
        message = html_text(&contact.message),
    );

    OutgoingMail {
        from: from.to_string(),
        to: to.to_string(),
        reply_to: Some(contact.email.clone()),
        subject: format!("[Excess Music] {}", contact.subject),
        text,
        html,
    }
}

/// Confirmation sent back to the submitter
pub fn auto_reply_mail(contact: &ContactInput, from: &str) -> OutgoingMail {
    let text = format!(
        "Hi {name},\n\n\
         Thank you for contacting Excess Music!\n\n\
         We've received your message and will get back to you as soon as possible.\n\n\
         Here's a copy of what you sent:\n\n\
         Subject: {subject}\n\n\
         Message:\n{message}\n\n\
         Best regards,\n\
         The Excess Music Team\n",
        name = contact.name,
        subject = contact.subject,
        message = contact.message,
    );

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background: linear-gradient(135deg, #000, #333); padding: 20px; text-align: center;">
    <h1 style="color: white; margin: 0;">Excess Music</h1>
  </div>
  <div style="padding: 30px; background: #f9f9f9;">
    <h2 style="color: #333;">Thank you for your message!</h2>
    <p>Hi {name},</p>
    <p>We've received your message and will get back to you as soon as possible. Here's a copy of what you sent:</p>
    <div style="background: #f8f9fa; padding: 15px; border-left: 4px solid #007bff; margin: 20px 0;">
      <strong>Subject:</strong> {subject}<br><br>
      <strong>Message:</strong><br>
      {message}
    </div>
    <p>Best regards,<br>The Excess Music Team</p>
  </div>
</div>"#,
        name = html_text(&contact.name),
        subject = html_text(&contact.subject),
        message = html_text(&contact.message),
    );

    OutgoingMail {
        from: from.to_string(),
        to: contact.email.clone(),
        reply_to: None,
        subject: "Thank you for contacting Excess Music".to_string(),
        text,
        html,
    }
}
