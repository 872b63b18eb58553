use axum::async_trait;
use serde_json::json;
use tracing::{error, info, warn};

/// Outbound mail collaborator. Best-effort: callers log and swallow
/// failures rather than surfacing them to the requester.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_email(&self, to: &str, token: &str) -> anyhow::Result<()>;
}

pub fn reset_link(frontend_url: &str, token: &str) -> String {
    format!("{}/reset-password?token={}", frontend_url, token)
}

/// Sends password-reset mail through the Resend HTTP API.
pub struct ResendMailer {
    http: reqwest::Client,
    api_key: String,
    from: String,
    frontend_url: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String, frontend_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            from,
            frontend_url,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send_reset_email(&self, to: &str, token: &str) -> anyhow::Result<()> {
        let link = reset_link(&self.frontend_url, token);
        let body = json!({
            "from": self.from,
            "to": [to],
            "subject": "Reset your password - Disability Pride Connect",
            "html": format!(
                "<p>You requested to reset your password for your \
                 <strong>Disability Pride Connect</strong> account.</p>\
                 <p><a href=\"{link}\">Reset Password</a></p>\
                 <p>If you didn't request this, you can safely ignore this \
                 email. This link will expire in 1 hour.</p>"
            ),
        });

        let response = self
            .http
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            error!(%status, detail, "resend rejected reset email");
            anyhow::bail!("resend responded with {status}");
        }

        info!(to, "reset email sent");
        Ok(())
    }
}

/// Fallback when no mail API key is configured: logs the reset link so the
/// flow stays usable in development.
pub struct LogMailer {
    frontend_url: String,
}

impl LogMailer {
    pub fn new(frontend_url: String) -> Self {
        Self { frontend_url }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_reset_email(&self, to: &str, token: &str) -> anyhow::Result<()> {
        warn!(to, link = %reset_link(&self.frontend_url, token), "mail delivery not configured, logging reset link");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_link_carries_token() {
        let link = reset_link("https://app.example.com", "abc123");
        assert_eq!(link, "https://app.example.com/reset-password?token=abc123");
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = LogMailer::new("http://localhost:3000".into());
        mailer
            .send_reset_email("user@example.com", "tok")
            .await
            .expect("log mailer should not fail");
    }
}
