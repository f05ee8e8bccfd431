//! Telegram Bot API sender

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TelegramConfig;

use super::{MessageSender, SendError};

pub struct TelegramSender {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct SendPhotoRequest<'a> {
    chat_id: i64,
    photo: &'a str,
    caption: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramSender {
    pub fn new(config: &TelegramConfig) -> Result<Self, SendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SendError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendPhoto",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
        })
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send_photo(
        &self,
        chat_id: i64,
        reference: &str,
        caption: &str,
    ) -> Result<(), SendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SendPhotoRequest {
                chat_id,
                photo: reference,
                caption,
            })
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        if body.ok {
            Ok(())
        } else {
            Err(SendError::Rejected {
                chat_id,
                description: body.description.unwrap_or_default(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let sender = TelegramSender::new(&TelegramConfig {
            bot_token: "123:abc".to_string(),
            api_base: "https://api.telegram.org/".to_string(),
        })
        .unwrap();
        assert_eq!(sender.endpoint, "https://api.telegram.org/bot123:abc/sendPhoto");
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(SendPhotoRequest {
            chat_id: 5,
            photo: "https://img.example/1.png",
            caption: "hi",
        })
        .unwrap();
        assert_eq!(json["chat_id"], 5);
        assert_eq!(json["photo"], "https://img.example/1.png");
    }
}
