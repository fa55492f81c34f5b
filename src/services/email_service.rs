use crate::config::mail::{MailConfig, SmtpEncryption};
use crate::models::{Contact, Post, PostWithAuthor};
use async_trait::async_trait;
use lettre::{
    message::{
        header::{ContentType, HeaderName, HeaderValue},
        Mailbox, MessageBuilder,
    },
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::{sync::Arc, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Failed to build email message: {0}")]
    MessageBuild(String),
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("Email send timed out after {0:?}")]
    Timeout(Duration),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Subject and plain-text body of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

pub fn unsubscribe_url(base_url: &str, email: &str) -> String {
    format!("{}/unsubscribe/{}", base_url, urlencoding::encode(email))
}

pub fn welcome_email(base_url: &str, to_email: &str) -> EmailContent {
    EmailContent {
        subject: "Welcome to Keep Alley Trash Updates".to_string(),
        body: format!(
            "Welcome to Keep Alley Trash Updates!\n\
             \n\
             Thank you for subscribing to receive updates about alley collection services in Dallas.\n\
             \n\
             You will receive:\n\
             - Important updates about alley collection services\n\
             - Community event notifications\n\
             - Maintenance reminders\n\
             - Ways to get involved\n\
             \n\
             To unsubscribe at any time, visit: {}\n\
             \n\
             Best regards,\n\
             Keep Alley Trash Team\n",
            unsubscribe_url(base_url, to_email)
        ),
    }
}

/// One message for every subscriber, so the unsubscribe reference is the
/// route pattern rather than a personal link.
pub fn post_broadcast_email(base_url: &str, post: &Post) -> EmailContent {
    let mut body = format!(
        "New Update from Keep Alley Trash:\n\n{}\n\n{}\n",
        post.title, post.content
    );
    if let Some(ref event_date) = post.event_date {
        body.push_str(&format!("\nWhen: {}\n", event_date));
    }
    if let Some(ref location) = post.location {
        body.push_str(&format!("Where: {}\n", location));
    }
    body.push_str(&format!(
        "\nRead it online: {}/community\n\
         To unsubscribe, visit: {}/unsubscribe/<your email address>\n",
        base_url, base_url
    ));

    EmailContent {
        subject: format!("New Update: {}", post.title),
        body,
    }
}

pub const NEWSLETTER_SUBJECT: &str = "Keep Alley Trash - Community Update";

const NEWSLETTER_EXCERPT_CHARS: usize = 280;

/// One edition of the community newsletter: the latest posts and an
/// optional note from the team.
#[derive(Debug, Clone)]
pub struct Newsletter {
    pub edition: String,
    pub personal_note: Option<String>,
    pub posts: Vec<PostWithAuthor>,
}

impl Newsletter {
    pub fn new(personal_note: Option<String>, posts: Vec<PostWithAuthor>) -> Self {
        Self {
            edition: chrono::Utc::now().format("%B %Y").to_string(),
            personal_note,
            posts,
        }
    }

    /// The part of the message every recipient shares.
    pub fn body(&self) -> String {
        let mut body = format!("Keep Alley Trash Community Update - {}\n\n", self.edition);

        if let Some(ref note) = self.personal_note {
            body.push_str(&format!(
                "A note from the Keep Alley Trash team:\n{}\n\n",
                note
            ));
        }

        if self.posts.is_empty() {
            body.push_str("No new posts this time.\n");
        } else {
            body.push_str("Recent updates:\n");
            for entry in &self.posts {
                body.push_str(&format!(
                    "\n- {} ({}, by {})\n  {}\n",
                    entry.post.title,
                    entry.post.category.label(),
                    entry.author,
                    excerpt(&entry.post.content, NEWSLETTER_EXCERPT_CHARS)
                ));
            }
        }

        body
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

pub fn newsletter_email(base_url: &str, newsletter: &Newsletter, to_email: &str) -> EmailContent {
    EmailContent {
        subject: NEWSLETTER_SUBJECT.to_string(),
        body: format!(
            "{}\n\
             Visit {}/community for the latest updates and to take action.\n\
             \n\
             To unsubscribe, visit: {}\n",
            newsletter.body(),
            base_url,
            unsubscribe_url(base_url, to_email)
        ),
    }
}

pub fn contact_email(contact: &Contact) -> EmailContent {
    EmailContent {
        subject: format!("New Contact Form Submission: {}", contact.subject),
        body: format!(
            "Name: {}\nEmail: {}\nSubject: {}\n\nMessage:\n{}\n",
            contact.name, contact.email, contact.subject, contact.message
        ),
    }
}

/// Subscriber addresses that can go on a message. Anything the transport
/// rejects is logged and left out.
pub fn addressable_recipients(recipients: &[String]) -> Vec<Mailbox> {
    recipients
        .iter()
        .filter_map(|recipient| match recipient.trim().parse::<Address>() {
            Ok(address) => Some(Mailbox::new(None, address)),
            Err(e) => {
                tracing::warn!("Skipping invalid subscriber address {}: {}", recipient, e);
                None
            }
        })
        .collect()
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_welcome(&self, to_email: &str) -> Result<(), EmailError>;
    /// Sends a single message to every usable recipient and returns how
    /// many were addressed. Nothing is sent when none are usable.
    async fn send_post_broadcast(
        &self,
        recipients: &[String],
        post: &Post,
    ) -> Result<usize, EmailError>;
    /// Sends one personal copy of `newsletter` to `to_email`.
    async fn send_newsletter(&self, to_email: &str, newsletter: &Newsletter)
        -> Result<(), EmailError>;
    async fn send_contact_notification(&self, contact: &Contact) -> Result<(), EmailError>;
}

pub struct MockEmailService {
    base_url: String,
}

impl MockEmailService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for MockEmailService {
    fn default() -> Self {
        Self::new(MailConfig::default().base_url)
    }
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send_welcome(&self, to_email: &str) -> Result<(), EmailError> {
        let content = welcome_email(&self.base_url, to_email);
        tracing::info!("📧 [MOCK EMAIL] Welcome email to: {}", to_email);
        tracing::info!("   Subject: {}", content.subject);
        tracing::info!("   ---");
        Ok(())
    }

    async fn send_post_broadcast(
        &self,
        recipients: &[String],
        post: &Post,
    ) -> Result<usize, EmailError> {
        let content = post_broadcast_email(&self.base_url, post);
        let addressed = addressable_recipients(recipients).len();
        tracing::info!("📧 [MOCK EMAIL] Post broadcast to {} subscriber(s)", addressed);
        tracing::info!("   Subject: {}", content.subject);
        tracing::info!("   ---");
        Ok(addressed)
    }

    async fn send_newsletter(
        &self,
        to_email: &str,
        newsletter: &Newsletter,
    ) -> Result<(), EmailError> {
        let content = newsletter_email(&self.base_url, newsletter, to_email);
        tracing::info!("📧 [MOCK EMAIL] Newsletter to: {}", to_email);
        tracing::info!("   Subject: {}", content.subject);
        tracing::info!("   Posts: {}", newsletter.posts.len());
        tracing::info!("   ---");
        Ok(())
    }

    async fn send_contact_notification(&self, contact: &Contact) -> Result<(), EmailError> {
        let content = contact_email(contact);
        tracing::info!("📧 [MOCK EMAIL] Contact form submission");
        tracing::info!("   From: {} <{}>", contact.name, contact.email);
        tracing::info!("   Subject: {}", content.subject);
        tracing::info!("   ---");
        Ok(())
    }
}

pub struct SmtpEmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    contact: Mailbox,
    base_url: String,
    send_timeout: Duration,
}

impl SmtpEmailService {
    pub fn new(config: &MailConfig) -> Result<Self, EmailError> {
        let smtp_host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| EmailError::ConfigError("SMTP_HOST not set".to_string()))?;

        let mut builder = match config.encryption {
            SmtpEncryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP relay error: {}", e)))?,
            SmtpEncryption::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                    .map_err(|e| EmailError::ConfigError(format!("SMTP starttls error: {}", e)))?
            }
            SmtpEncryption::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host),
        }
        .port(config.smtp_port)
        .timeout(Some(config.send_timeout));

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| EmailError::ConfigError(format!("Invalid from address: {}", e)))?;
        let contact = config
            .contact_email
            .parse::<Mailbox>()
            .map_err(|e| EmailError::ConfigError(format!("Invalid contact address: {}", e)))?;

        Ok(Self {
            mailer: builder.build(),
            from,
            contact,
            base_url: config.base_url.clone(),
            send_timeout: config.send_timeout,
        })
    }

    async fn deliver(&self, email: Message) -> Result<(), EmailError> {
        match tokio::time::timeout(self.send_timeout, self.mailer.send(email)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(EmailError::SendFailed(e.to_string())),
            Err(_) => Err(EmailError::Timeout(self.send_timeout)),
        }
    }

    fn mailto_unsubscribe(&self) -> String {
        format!("<mailto:{}?subject=UNSUBSCRIBE>", self.contact.email)
    }

    /// The broadcast message and how many subscribers it addresses. The
    /// visible `To` is the sender; subscribers only appear in the envelope.
    pub(crate) fn broadcast_message(
        &self,
        recipients: &[String],
        post: &Post,
    ) -> Result<(Message, usize), EmailError> {
        let content = post_broadcast_email(&self.base_url, post);
        let mailboxes = addressable_recipients(recipients);
        let addressed = mailboxes.len();

        let mut builder = bulk_headers(
            Message::builder()
                .from(self.from.clone())
                .to(self.from.clone())
                .subject(content.subject)
                .header(ContentType::TEXT_PLAIN),
            self.mailto_unsubscribe(),
        );
        for mailbox in mailboxes {
            builder = builder.bcc(mailbox);
        }

        let email = builder
            .body(content.body)
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        Ok((email, addressed))
    }

    pub(crate) fn newsletter_message(
        &self,
        to_email: &str,
        newsletter: &Newsletter,
    ) -> Result<Message, EmailError> {
        let content = newsletter_email(&self.base_url, newsletter, to_email);
        let list_unsubscribe = format!(
            "<{}>, {}",
            unsubscribe_url(&self.base_url, to_email),
            self.mailto_unsubscribe()
        );

        bulk_headers(
            Message::builder()
                .from(self.from.clone())
                .reply_to(self.from.clone())
                .to(parse_mailbox(to_email)?)
                .subject(content.subject)
                .header(ContentType::TEXT_PLAIN),
            list_unsubscribe,
        )
        .body(content.body)
        .map_err(|e| EmailError::MessageBuild(e.to_string()))
    }
}

fn raw_header(name: &'static str, value: String) -> HeaderValue {
    HeaderValue::new(HeaderName::new_from_ascii_str(name), value)
}

/// Headers mail providers expect on list traffic.
fn bulk_headers(builder: MessageBuilder, list_unsubscribe: String) -> MessageBuilder {
    builder
        .raw_header(raw_header("List-Unsubscribe", list_unsubscribe))
        .raw_header(raw_header("Precedence", "bulk".to_string()))
        .raw_header(raw_header("X-Auto-Response-Suppress", "OOF, AutoReply".to_string()))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| EmailError::MessageBuild(format!("Invalid address {}: {}", address, e)))
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_welcome(&self, to_email: &str) -> Result<(), EmailError> {
        let content = welcome_email(&self.base_url, to_email);

        let email = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(to_email)?)
            .subject(content.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(content.body)
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.deliver(email).await
    }

    async fn send_post_broadcast(
        &self,
        recipients: &[String],
        post: &Post,
    ) -> Result<usize, EmailError> {
        let (email, addressed) = self.broadcast_message(recipients, post)?;
        if addressed == 0 {
            return Ok(0);
        }

        self.deliver(email).await?;
        Ok(addressed)
    }

    async fn send_newsletter(
        &self,
        to_email: &str,
        newsletter: &Newsletter,
    ) -> Result<(), EmailError> {
        let email = self.newsletter_message(to_email, newsletter)?;
        self.deliver(email).await
    }

    async fn send_contact_notification(&self, contact: &Contact) -> Result<(), EmailError> {
        let content = contact_email(contact);

        let email = Message::builder()
            .from(self.from.clone())
            .reply_to(parse_mailbox(&contact.email)?)
            .to(self.contact.clone())
            .subject(content.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(content.body)
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.deliver(email).await
    }
}

pub fn create_email_service(config: &MailConfig) -> Arc<dyn EmailService> {
    if config.smtp_host.is_some() {
        match SmtpEmailService::new(config) {
            Ok(service) => {
                tracing::info!("Using SMTP email service");
                Arc::new(service)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize SMTP email service: {}. Falling back to mock service",
                    e
                );
                Arc::new(MockEmailService::new(config.base_url.clone()))
            }
        }
    } else {
        tracing::info!(
            "SMTP not configured. Using mock email service (emails will be logged to console)"
        );
        Arc::new(MockEmailService::new(config.base_url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostCategory;

    fn post() -> Post {
        Post {
            id: 3,
            title: "Cleanup Day".to_string(),
            content: "Meet at the corner of Elm and Main.".to_string(),
            category: PostCategory::Event,
            user_id: 1,
            is_published: true,
            is_featured: false,
            event_date: Some("2026-11-07".to_string()),
            location: Some("Elm & Main".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn test_broadcast_email_references_post() {
        let content = post_broadcast_email("https://keepalleytrash.com", &post());
        assert_eq!(content.subject, "New Update: Cleanup Day");
        assert!(content.body.contains("Meet at the corner of Elm and Main."));
        assert!(content.body.contains("When: 2026-11-07"));
        assert!(content.body.contains("Where: Elm & Main"));
        assert!(content
            .body
            .contains("https://keepalleytrash.com/unsubscribe/"));
    }

    #[test]
    fn test_welcome_email_links_personal_unsubscribe() {
        let content = welcome_email("http://localhost:8080", "a+b@example.com");
        assert!(content
            .body
            .contains("http://localhost:8080/unsubscribe/a%2Bb%40example.com"));
    }

    fn smtp_service() -> SmtpEmailService {
        let config = MailConfig {
            smtp_host: Some("localhost".to_string()),
            encryption: SmtpEncryption::None,
            contact_email: "hello@keepalleytrash.com".to_string(),
            base_url: "https://keepalleytrash.com".to_string(),
            ..MailConfig::default()
        };
        SmtpEmailService::new(&config).unwrap()
    }

    fn subscribers(emails: &[&str]) -> Vec<String> {
        emails.iter().map(|e| e.to_string()).collect()
    }

    fn newsletter(note: Option<&str>) -> Newsletter {
        Newsletter {
            edition: "November 2026".to_string(),
            personal_note: note.map(str::to_string),
            posts: vec![PostWithAuthor {
                post: post(),
                author: "organizer".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_mock_service_accepts_everything() {
        let service = MockEmailService::default();
        assert!(service.send_welcome("new@example.com").await.is_ok());
        assert_eq!(
            service
                .send_post_broadcast(&subscribers(&["a@example.com"]), &post())
                .await
                .unwrap(),
            1
        );
        assert!(service
            .send_newsletter("a@example.com", &newsletter(None))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_hides_subscribers_from_each_other() {
        let service = smtp_service();
        let recipients = subscribers(&["a@example.com", "b@example.com", "c@example.com"]);

        let (message, addressed) = service.broadcast_message(&recipients, &post()).unwrap();
        assert_eq!(addressed, 3);

        let envelope: Vec<String> = message
            .envelope()
            .to()
            .iter()
            .map(|address| address.to_string())
            .collect();
        for recipient in &recipients {
            assert!(envelope.contains(recipient), "{} missing from envelope", recipient);
        }

        let to = message.headers().get_raw("To").unwrap_or_default();
        assert!(to.contains("updates@keepalleytrash.com"));

        let formatted = String::from_utf8_lossy(&message.formatted()).into_owned();
        for recipient in &recipients {
            assert!(!formatted.contains(recipient.as_str()), "{} visible in headers", recipient);
        }
        assert!(!formatted.contains("Bcc:"));
    }

    #[tokio::test]
    async fn test_broadcast_counts_only_addressable_subscribers() {
        let service = smtp_service();
        let recipients = subscribers(&["a,b@example.com", "c@example.com"]);

        let (message, addressed) = service.broadcast_message(&recipients, &post()).unwrap();
        assert_eq!(addressed, 1);
        assert!(message
            .envelope()
            .to()
            .iter()
            .any(|address| address.to_string() == "c@example.com"));
    }

    #[tokio::test]
    async fn test_broadcast_without_usable_address_sends_nothing() {
        let service = smtp_service();
        let addressed = service
            .send_post_broadcast(&subscribers(&["not an address"]), &post())
            .await
            .unwrap();
        assert_eq!(addressed, 0);
    }

    #[tokio::test]
    async fn test_broadcast_carries_list_headers() {
        let service = smtp_service();
        let (message, _) = service
            .broadcast_message(&subscribers(&["a@example.com"]), &post())
            .unwrap();

        assert_eq!(
            message.headers().get_raw("List-Unsubscribe"),
            Some("<mailto:hello@keepalleytrash.com?subject=UNSUBSCRIBE>")
        );
        assert_eq!(message.headers().get_raw("Precedence"), Some("bulk"));
    }

    #[tokio::test]
    async fn test_newsletter_message_is_personal() {
        let service = smtp_service();
        let message = service
            .newsletter_message("b@example.com", &newsletter(Some("See you Saturday!")))
            .unwrap();

        assert_eq!(message.envelope().to().len(), 1);
        assert_eq!(
            message.headers().get_raw("List-Unsubscribe"),
            Some(
                "<https://keepalleytrash.com/unsubscribe/b%40example.com>, \
                 <mailto:hello@keepalleytrash.com?subject=UNSUBSCRIBE>"
            )
        );
        assert_eq!(message.headers().get_raw("Precedence"), Some("bulk"));
        assert_eq!(
            message.headers().get_raw("Subject"),
            Some(NEWSLETTER_SUBJECT)
        );
    }

    #[test]
    fn test_newsletter_body_includes_note_and_posts() {
        let content = newsletter_email(
            "https://keepalleytrash.com",
            &newsletter(Some("See you Saturday!")),
            "b@example.com",
        );

        assert!(content.body.contains("Community Update - November 2026"));
        assert!(content.body.contains("See you Saturday!"));
        assert!(content.body.contains("- Cleanup Day (Event, by organizer)"));
        assert!(content
            .body
            .contains("To unsubscribe, visit: https://keepalleytrash.com/unsubscribe/b%40example.com"));
    }

    #[test]
    fn test_newsletter_excerpts_long_posts() {
        let long = "word ".repeat(200);
        let short = excerpt(&long, NEWSLETTER_EXCERPT_CHARS);
        assert!(short.ends_with("..."));
        assert!(short.chars().count() <= NEWSLETTER_EXCERPT_CHARS + 3);
        assert_eq!(excerpt(" brief ", NEWSLETTER_EXCERPT_CHARS), "brief");
    }

    #[test]
    fn test_smtp_service_requires_host() {
        let result = SmtpEmailService::new(&MailConfig::default());
        assert!(matches!(result, Err(EmailError::ConfigError(_))));
    }
}
