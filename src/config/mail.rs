use std::{env, time::Duration};

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpEncryption {
    Tls,
    StartTls,
    None,
}

/// Mail transport settings read from `SMTP_*`, `BASE_URL` and
/// `CONTACT_EMAIL`. `smtp_host` is `None` when SMTP is not configured, in
/// which case outgoing mail is only logged.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub encryption: SmtpEncryption,
    pub from_email: String,
    pub from_name: String,
    pub contact_email: String,
    pub base_url: String,
    pub send_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum MailConfigError {
    #[error("Invalid {0}")]
    Invalid(&'static str),
    #[error("Unknown SMTP_ENCRYPTION value: {0}")]
    UnknownEncryption(String),
}

impl MailConfig {
    pub fn from_env() -> Result<Self, MailConfigError> {
        let smtp_host = env::var("SMTP_HOST").ok().filter(|h| !h.is_empty());
        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|_| MailConfigError::Invalid("SMTP_PORT"))?;
        let encryption = match env::var("SMTP_ENCRYPTION")
            .unwrap_or_else(|_| "starttls".to_string())
            .to_lowercase()
            .as_str()
        {
            "tls" => SmtpEncryption::Tls,
            "starttls" => SmtpEncryption::StartTls,
            "none" => SmtpEncryption::None,
            other => return Err(MailConfigError::UnknownEncryption(other.to_string())),
        };
        let send_timeout = parse_send_timeout(env::var("SMTP_TIMEOUT_SECS").ok().as_deref())?;
        let from_email = env::var("SMTP_FROM_EMAIL")
            .unwrap_or_else(|_| "updates@keepalleytrash.com".to_string());
        let contact_email = env::var("CONTACT_EMAIL").unwrap_or_else(|_| from_email.clone());

        Ok(Self {
            smtp_host,
            smtp_port,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            encryption,
            from_name: env::var("SMTP_FROM_NAME")
                .unwrap_or_else(|_| "Keep Alley Trash".to_string()),
            from_email,
            contact_email,
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            send_timeout,
        })
    }
}

/// Whole seconds, at least one. Unset means the default.
fn parse_send_timeout(value: Option<&str>) -> Result<Duration, MailConfigError> {
    match value.map(str::trim) {
        None | Some("") => Ok(DEFAULT_SEND_TIMEOUT),
        Some(secs) => match secs.parse::<u64>() {
            Ok(0) | Err(_) => Err(MailConfigError::Invalid("SMTP_TIMEOUT_SECS")),
            Ok(secs) => Ok(Duration::from_secs(secs)),
        },
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            encryption: SmtpEncryption::StartTls,
            from_email: "updates@keepalleytrash.com".to_string(),
            from_name: "Keep Alley Trash".to_string(),
            contact_email: "updates@keepalleytrash.com".to_string(),
            base_url: "http://localhost:8080".to_string(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}
