use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use tracing::{debug, warn};

/// Message as returned by `GET /admin/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: String,
}

#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct MessagesResp {
    messages: Vec<MessageInfo>,
}

#[derive(Deserialize)]
struct SendResp {
    id: String,
}

/// HTTP client for a contact-inbox server. Holds the session cookie between calls.
pub struct InboxClient {
    http: reqwest::Client,
    base_url: String,
}

impl InboxClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn login(&self, secret: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.endpoint("/admin/login"))
            .json(&json!({ "secret": secret }))
            .send()
            .await
            .context("Login request failed")?;
        parse_envelope::<serde_json::Value>(resp).await?;
        debug!("Logged in to {}", self.base_url);
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        let resp = self
            .http
            .post(self.endpoint("/admin/logout"))
            .send()
            .await
            .context("Logout request failed")?;
        parse_envelope::<serde_json::Value>(resp).await?;
        Ok(())
    }

    /// Run `op` inside an admin session. The session is logged out
    /// afterwards whether or not `op` succeeded; an error from `op` wins
    /// over a logout failure.
    pub async fn with_session<T>(
        &self,
        secret: &str,
        op: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        self.login(secret).await?;
        let result = op.await;
        match (self.logout().await, &result) {
            (Err(e), Ok(_)) => return Err(e),
            (Err(e), Err(_)) => warn!("Logout after failed request also failed: {e:#}"),
            (Ok(()), _) => {}
        }
        result
    }

    pub async fn list_messages(&self) -> Result<Vec<MessageInfo>> {
        let resp = self
            .http
            .get(self.endpoint("/admin/messages"))
            .send()
            .await
            .context("List request failed")?;
        let body: MessagesResp = parse_envelope(resp).await?;
        Ok(body.messages)
    }

    pub async fn delete_message(&self, id: &str) -> Result<()> {
        let resp = self
            .http
            .delete(self.endpoint(&format!("/admin/messages/{id}")))
            .send()
            .await
            .context("Delete request failed")?;
        parse_envelope::<serde_json::Value>(resp).await?;
        Ok(())
    }

    /// Submit a message the way the public contact form does
    pub async fn send_message(&self, name: &str, email: &str, message: &str) -> Result<String> {
        let resp = self
            .http
            .post(self.endpoint("/send"))
            .json(&json!({ "name": name, "email": email, "message": message }))
            .send()
            .await
            .context("Send request failed")?;
        let body: SendResp = parse_envelope(resp).await?;
        Ok(body.id)
    }
}

/// Check the `{success, error}` envelope and decode the rest of the body.
async fn parse_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let text = resp.text().await.context("Failed to read response body")?;
    decode_envelope(status.as_u16(), &text)
}

fn decode_envelope<T: DeserializeOwned>(status: u16, text: &str) -> Result<T> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| anyhow!("Unexpected response ({status}): {e}"))?;
    if !envelope.success {
        bail!(
            "Server returned {status}: {}",
            envelope.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    serde_json::from_str(text).with_context(|| format!("Malformed response body ({status})"))
}
