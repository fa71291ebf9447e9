// src/bot/telegram.rs

//! Minimal Telegram Bot API client: `getUpdates` long polling and
//! `sendMessage`.

use async_trait::async_trait;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{SubscriberId, TelegramConfig};
use crate::services::Messenger;
use crate::utils::http::create_long_poll_client;

/// Envelope every Bot API method replies with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

impl Update {
    /// Chat and text of a text message; other update kinds yield `None`.
    pub fn text_message(&self) -> Option<(SubscriberId, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((SubscriberId(message.chat.id), text))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

pub struct TelegramClient {
    http: reqwest::Client,
    /// `{api_base}/bot{token}`; never logged.
    endpoint: String,
    long_poll_secs: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, token: &str) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(AppError::config("Telegram token is empty"));
        }
        Ok(Self {
            http: create_long_poll_client(config.long_poll_secs)?,
            endpoint: format!("{}/bot{}", config.api_base.trim_end_matches('/'), token),
            long_poll_secs: config.long_poll_secs,
        })
    }

    /// Wait up to the long-poll timeout for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: self.long_poll_secs,
                allowed_updates: &["message"],
            },
        )
        .await
    }

    pub async fn send_message(&self, chat: SubscriberId, text: &str) -> Result<()> {
        let _: IgnoredAny = self
            .call("sendMessage", &SendMessage { chat_id: chat.0, text })
            .await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &impl Serialize) -> Result<T> {
        let url = format!("{}/{}", self.endpoint, method);
        // The URL carries the token, so it is stripped from transport errors.
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;
        let status = response.status();
        let reply: ApiResponse<T> = response.json().await.map_err(|e| {
            AppError::transport(format!(
                "{method}: unreadable response ({status}): {}",
                e.without_url()
            ))
        })?;

        match (reply.ok, reply.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(AppError::transport(format!("{method}: missing result"))),
            (false, _) => Err(AppError::transport(format!(
                "{method} failed ({status}): {}",
                reply.description.unwrap_or_default()
            ))),
        }
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send(&self, to: SubscriberId, text: &str) -> Result<()> {
        self.send_message(to, text)
            .await
            .map_err(|e| AppError::delivery(to, e))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> TelegramClient {
        let config = TelegramConfig {
            api_base: server.uri(),
            long_poll_secs: 1,
            ..TelegramConfig::default()
        };
        TelegramClient::new(&config, "123:abc").unwrap()
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(TelegramClient::new(&TelegramConfig::default(), " ").is_err());
    }

    #[tokio::test]
    async fn test_get_updates_parses_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .and(body_partial_json(json!({ "offset": 10, "timeout": 1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    { "update_id": 10, "message": { "chat": { "id": 42 }, "text": "/status" } },
                    { "update_id": 11, "message": { "chat": { "id": 43 } } },
                    { "update_id": 12, "edited_message": {} }
                ]
            })))
            .mount(&server)
            .await;

        let updates = client(&server).get_updates(Some(10)).await.unwrap();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].text_message(), Some((SubscriberId(42), "/status")));
        assert_eq!(updates[1].text_message(), None);
        assert_eq!(updates[2].text_message(), None);
    }

    #[tokio::test]
    async fn test_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(json!({ "chat_id": 7, "text": "hi" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": { "message_id": 1 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).send(SubscriberId(7), "hi").await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_is_delivery_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            })))
            .mount(&server)
            .await;

        let err = client(&server).send(SubscriberId(7), "hi").await.unwrap_err();
        assert!(matches!(err, AppError::Delivery { .. }));
        assert!(err.to_string().contains("blocked"));
    }

    #[tokio::test]
    async fn test_non_json_reply_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client(&server).get_updates(None).await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
        assert!(!err.to_string().contains("123:abc"));
    }
}
