use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seconds Telegram holds a `getUpdates` request open when there is nothing new.
pub const LONG_POLL_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

pub struct TelegramService {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramService {
    pub fn new(api_url: &str, token: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_SECS + 10))
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url, token),
        })
    }

    /// Long-poll for updates with an id of at least `offset`.
    pub async fn get_updates(&self, offset: i64) -> anyhow::Result<Vec<Update>> {
        let body = GetUpdatesRequest {
            offset,
            timeout: LONG_POLL_SECS,
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &body).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        let body = SendMessageRequest { chat_id, text };
        let _sent: Message = self.call("sendMessage", &body).await?;
        Ok(())
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> anyhow::Result<T>
    where
        B: Serialize,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.base_url, method);
        // Strip the url from transport errors: it contains the bot token.
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| anyhow!(e.without_url()))
            .with_context(|| format!("telegram {} request failed", method))?;

        let parsed = resp
            .json::<ApiResponse<T>>()
            .await
            .map_err(|e| anyhow!(e.without_url()))
            .with_context(|| format!("telegram {} returned an unreadable body", method))?;

        into_result(method, parsed)
    }
}

fn into_result<T>(method: &str, resp: ApiResponse<T>) -> anyhow::Result<T> {
    if !resp.ok {
        bail!(
            "telegram {} failed: {}",
            method,
            resp.description.unwrap_or_else(|| "no description".to_string())
        );
    }
    resp.result
        .ok_or_else(|| anyhow!("telegram {} returned no result", method))
}
