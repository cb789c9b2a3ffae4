//! Telegram Bot API publisher.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use quotecast_core::{ChannelId, Error, Result};
use quotecast_rotation::Publisher;

use crate::types::{TelegramResponse, TelegramUser};

pub const TELEGRAM_API: &str = "https://api.telegram.org";

const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Posts rendered quote cards to a channel.
pub struct TelegramPublisher {
    client: Client,
    /// `https://api.telegram.org/bot<token>`
    endpoint: String,
}

impl TelegramPublisher {
    pub fn new(token: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/bot{}", TELEGRAM_API, token),
        }
    }

    /// Create a publisher and verify the token with `getMe`.
    pub async fn connect(token: &str) -> Result<Self> {
        let publisher = Self::new(token);
        let me = publisher.get_me().await?;
        info!(
            "Authorized on account {}",
            me.username.as_deref().unwrap_or(&me.first_name)
        );
        Ok(publisher)
    }

    pub async fn get_me(&self) -> Result<TelegramUser> {
        let response = self
            .client
            .get(format!("{}/getMe", self.endpoint))
            .send()
            .await
            .map_err(|e| Error::Http(format!("getMe failed: {}", redact(&e.to_string()))))?;
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("getMe failed: {}", redact(&e.to_string()))))?;
        parse_response(&body).map_err(|e| Error::Config(format!("Bot token rejected: {}", e)))
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    async fn publish(&self, channel: &ChannelId, artifact: &Path, tags: &[String]) -> Result<()> {
        let bytes = tokio::fs::read(artifact).await?;
        let file_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "quote".to_string());
        let (method, field) = upload_method(artifact);

        let form = Form::new()
            .text("chat_id", channel.to_string())
            .text("caption", format_tags(tags))
            .part(field, Part::bytes(bytes).file_name(file_name));

        debug!("Uploading {} via {}", artifact.display(), method);
        let response = self
            .client
            .post(format!("{}/{}", self.endpoint, method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Publish(format!("Request failed: {}", redact(&e.to_string()))))?;
        let body = response
            .text()
            .await
            .map_err(|e| Error::Publish(format!("Read failed: {}", redact(&e.to_string()))))?;

        parse_response::<serde_json::Value>(&body)?;
        Ok(())
    }
}

/// `#tag` words joined by spaces. Whitespace inside a tag becomes `_`.
pub fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{}", t.split_whitespace().collect::<Vec<_>>().join("_")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `sendPhoto` for rendered cards and other raster images, `sendDocument` otherwise.
fn upload_method(path: &Path) -> (&'static str, &'static str) {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if RASTER_EXTENSIONS.contains(&ext.as_str()) {
        ("sendPhoto", "photo")
    } else {
        ("sendDocument", "document")
    }
}

fn parse_response<T: DeserializeOwned>(body: &str) -> Result<T> {
    let parsed: TelegramResponse<T> = serde_json::from_str(body)
        .map_err(|e| Error::Publish(format!("Invalid API response: {}", e)))?;
    if !parsed.ok {
        return Err(Error::Publish(format!(
            "API error {}: {}",
            parsed.error_code.unwrap_or_default(),
            parsed.description.unwrap_or_default()
        )));
    }
    parsed
        .result
        .ok_or_else(|| Error::Publish("API response without result".into()))
}

/// Strip the bot token from request URLs echoed in reqwest errors.
fn redact(message: &str) -> String {
    let Some(pos) = message.find("/bot") else {
        return message.to_string();
    };
    let start = pos + 4;
    let end = message[start..]
        .find('/')
        .map(|i| start + i)
        .unwrap_or(message.len());
    format!("{}<redacted>{}", &message[..start], &message[end..])
}
