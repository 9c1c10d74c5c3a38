use async_trait::async_trait;
use std::sync::{Arc, Mutex};

// 1. Mailer Contract
/// Mailer
///
/// The abstract contract for outbound mail. Best-effort: callers persist
/// their state before sending, and a send failure must never roll a request
/// back. The trait allows swapping the concrete implementation from
/// the real HTTP client (HttpMailer) in production to the in-memory Mock
/// (MockMailer) during testing without affecting the calling handlers.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message. No delivery confirmation is expected or awaited
    /// beyond the API call itself.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// MailerState
///
/// The concrete type used to share the mail service across the application
/// state.
pub type MailerState = Arc<dyn Mailer>;

// 2. The Real Implementation (HTTP mail API)
/// HttpMailer
///
/// Delivers mail through a transactional mail HTTP API (or a local catcher
/// like mailpit, which exposes the same POST shape). Authentication is a
/// static API key header.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: &str, api_key: &str, from: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "text": body,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("mail API returned {}", response.status()));
        }

        Ok(())
    }
}

// 3. The Mock Implementation (For Unit Tests)
/// SentMail
///
/// One recorded message in the mock outbox.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// MockMailer
///
/// Records every message in an in-memory outbox so tests can assert on what
/// was (or wasn't) sent, with a switch to simulate delivery failures.
#[derive(Default)]
pub struct MockMailer {
    /// When true, all sends return a simulated failure.
    pub should_fail: bool,
    pub outbox: Mutex<Vec<SentMail>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything sent so far.
    pub fn sent(&self) -> Vec<SentMail> {
        self.outbox.lock().expect("outbox poisoned").clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        if self.should_fail {
            return Err("Mock Mailer Error: simulation requested".to_string());
        }

        self.outbox.lock().expect("outbox poisoned").push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });

        Ok(())
    }
}
