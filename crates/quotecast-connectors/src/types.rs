//! Wire types for the Unsplash and Telegram Bot APIs.

use serde::Deserialize;

/// `GET /photos/random` response (fields we use).
#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashPhoto {
    pub id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub urls: UnsplashUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashUrls {
    pub regular: String,
}

/// Envelope around every Bot API response.
#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

/// `getMe` result.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub first_name: String,
}
