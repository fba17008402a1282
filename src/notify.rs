use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::error::AppError;

const RELAY_SECRET_HEADER: &str = "x-relay-secret";

#[derive(Debug)]
pub enum NotifyError {
    Transport(reqwest::Error),
    Rejected { status: u16, body: String },
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "relay request failed: {e}"),
            Self::Rejected { status, body } => write!(f, "relay responded {status}: {body}"),
        }
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub message: String,
}

impl Email {
    pub fn invitation(to: &str, name: Option<&str>, link: &str, signature: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Please leave a review".to_string(),
            message: format!(
                "Hi {},\n\nWe would appreciate your feedback!\n\nPlease leave your review here:\n{link}\n\nThank you,\n{signature}",
                name.unwrap_or("there")
            ),
        }
    }

    pub fn thank_you(to: &str, name: Option<&str>, signature: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Thank you for your review".to_string(),
            message: format!(
                "Hi {},\n\nThank you for taking the time to leave a review. We really appreciate it!\n\nBest regards,\n{signature}",
                name.unwrap_or("there")
            ),
        }
    }
}

/// Posts emails to an HTTP relay at `{base_url}/send-relay`.
#[derive(Clone)]
pub struct RelayNotifier {
    client: reqwest::Client,
    endpoint: String,
    secret: Option<String>,
}

impl RelayNotifier {
    pub fn new(base_url: &str, secret: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build relay client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/send-relay", base_url.trim_end_matches('/')),
            secret,
        })
    }

    pub async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let mut request = self.client.post(&self.endpoint).json(email);
        if let Some(secret) = &self.secret {
            request = request.header(RELAY_SECRET_HEADER, secret);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Outbound email channel. `Log` stands in when no relay is configured.
#[derive(Clone)]
pub enum Notifier {
    Relay(RelayNotifier),
    Log,
}

impl Notifier {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        match &config.email_relay_url {
            Some(url) => Ok(Self::Relay(RelayNotifier::new(
                url,
                config.email_relay_secret.clone(),
                Duration::from_secs(config.relay_timeout_secs),
            )?)),
            None => {
                tracing::warn!("EMAIL_RELAY_URL not set; outgoing emails will only be logged");
                Ok(Self::Log)
            }
        }
    }

    /// Deliver one email, reporting failure to the caller.
    pub async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        match self {
            Self::Relay(relay) => relay.send(email).await,
            Self::Log => {
                tracing::info!(to = %email.to, subject = %email.subject, "email not sent (no relay configured)");
                Ok(())
            }
        }
    }

    /// Best-effort delivery: a blank recipient is a no-op and failures are
    /// only logged.
    pub async fn notify(&self, email: &Email) {
        if email.to.trim().is_empty() {
            return;
        }

        match self.send(email).await {
            Ok(()) => tracing::info!(to = %email.to, subject = %email.subject, "email sent"),
            Err(e) => tracing::warn!(to = %email.to, subject = %email.subject, "email delivery failed: {e}"),
        }
    }

    /// Run [`Notifier::notify`] on a detached task. The caller never waits on it.
    pub fn dispatch(&self, email: Email) -> tokio::task::JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move { notifier.notify(&email).await })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// Mock relay answering every `POST /send-relay` with `status`.
    pub async fn relay_server(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send-relay"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        server
    }

    pub fn relay_notifier(server: &MockServer) -> Notifier {
        Notifier::Relay(RelayNotifier::new(&server.uri(), None, Duration::from_secs(5)).unwrap())
    }

    /// Wait until the relay has seen `count` requests and return their JSON bodies.
    pub async fn relayed_emails(server: &MockServer, count: usize) -> Vec<serde_json::Value> {
        for _ in 0..100 {
            let requests = server.received_requests().await.unwrap_or_default();
            if requests.len() >= count {
                return requests
                    .iter()
                    .map(|r| r.body_json::<serde_json::Value>().unwrap())
                    .collect();
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("relay did not receive {count} request(s)");
    }

    /// A relay address nothing listens on.
    pub fn unreachable_relay() -> Notifier {
        Notifier::Relay(
            RelayNotifier::new("http://127.0.0.1:1", None, Duration::from_secs(2)).unwrap(),
        )
    }

    #[test]
    fn invitation_falls_back_to_generic_greeting() {
        let email = Email::invitation("a@x.com", None, "https://h/reviews/?token=t", "Team");
        assert_eq!(email.subject, "Please leave a review");
        assert!(email.message.starts_with("Hi there,"));
        assert!(email.message.contains("https://h/reviews/?token=t"));
        assert!(email.message.ends_with("Team"));
    }

    #[tokio::test]
    async fn relay_receives_payload_and_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send-relay"))
            .and(header(RELAY_SECRET_HEADER, "s3cret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let relay = RelayNotifier::new(
            &format!("{}/", server.uri()),
            Some("s3cret".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        relay
            .send(&Email::thank_you("a@x.com", Some("Ann"), "Team"))
            .await
            .unwrap();

        let body = &relayed_emails(&server, 1).await[0];
        assert_eq!(body["to"], "a@x.com");
        assert_eq!(body["subject"], "Thank you for your review");
        assert!(body["message"].as_str().unwrap().starts_with("Hi Ann,"));
    }

    #[tokio::test]
    async fn relay_error_status_is_reported() {
        let server = relay_server(502).await;

        let err = relay_notifier(&server)
            .send(&Email::thank_you("a@x.com", None, "Team"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { status: 502, .. }));
    }

    #[tokio::test]
    async fn notify_swallows_transport_failures() {
        let notifier = unreachable_relay();
        // Must return normally even though nothing is listening.
        notifier.notify(&Email::thank_you("a@x.com", None, "Team")).await;
    }

    #[tokio::test]
    async fn notify_swallows_relay_rejections() {
        let server = relay_server(500).await;
        relay_notifier(&server)
            .notify(&Email::thank_you("a@x.com", None, "Team"))
            .await;
        assert_eq!(relayed_emails(&server, 1).await.len(), 1);
    }

    #[tokio::test]
    async fn notify_skips_blank_recipient() {
        let server = relay_server(200).await;
        let notifier = relay_notifier(&server);

        notifier.notify(&Email::thank_you("  ", None, "Team")).await;
        notifier.notify(&Email::thank_you("b@x.com", None, "Team")).await;

        let bodies = relayed_emails(&server, 1).await;
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["to"], "b@x.com");
    }
}
