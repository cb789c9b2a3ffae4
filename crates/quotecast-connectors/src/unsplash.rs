//! Photo-card renderer backed by the Unsplash random-photo API.
//!
//! A random photo is cropped to a square card, the quote is drawn over it as
//! wrapped, centered text with the author line in the lower-left corner, and
//! the card is written as PNG.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{Font, FontVec, PxScale};
use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use reqwest::Client;
use tracing::debug;

use quotecast_core::{Error, Result};
use quotecast_rotation::Renderer;
use quotecast_store::Quote;

use crate::types::UnsplashPhoto;

pub const UNSPLASH_API: &str = "https://api.unsplash.com";

const CARD_SIZE: u32 = 1024;
const QUOTE_FONT_SIZE: f32 = 48.0;
const AUTHOR_FONT_SIZE: f32 = 36.0;
const LINE_HEIGHT: f32 = 1.5;
const MARGIN: u32 = 50;
const QUOTE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const AUTHOR_COLOR: Rgba<u8> = Rgba([204, 204, 204, 255]);

pub struct UnsplashRenderer {
    client: Client,
    access_key: String,
    output_dir: PathBuf,
    api_base: String,
    font: Arc<FontVec>,
}

impl UnsplashRenderer {
    pub fn new(access_key: impl Into<String>, output_dir: impl AsRef<Path>, font: FontVec) -> Self {
        Self {
            client: Client::new(),
            access_key: access_key.into(),
            output_dir: output_dir.as_ref().to_path_buf(),
            api_base: UNSPLASH_API.to_string(),
            font: Arc::new(font),
        }
    }

    async fn random_photo(&self) -> Result<UnsplashPhoto> {
        let url = format!("{}/photos/random", self.api_base);
        let response = self
            .client
            .get(&url)
            .query(&[("client_id", self.access_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::Render(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Render(format!("Photo request failed: {}", response.status())));
        }

        response
            .json::<UnsplashPhoto>()
            .await
            .map_err(|e| Error::Render(format!("Invalid photo response: {}", e)))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Render(format!("Download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Render(format!("Download failed: {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Render(format!("Download failed: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Renderer for UnsplashRenderer {
    async fn render(&self, quote: &Quote) -> Result<PathBuf> {
        let photo = self.random_photo().await?;
        debug!("Using photo {} ({}x{})", photo.id, photo.width, photo.height);
        let bytes = self.download(&photo.urls.regular).await?;

        let font = Arc::clone(&self.font);
        let card_quote = quote.clone();
        let png = tokio::task::spawn_blocking(move || {
            let background = decode_photo(&bytes)?;
            encode_png(&compose_card(&background, &card_quote, font.as_ref()))
        })
        .await
        .map_err(|e| Error::Render(format!("Render task failed: {}", e)))??;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(artifact_name(&quote.author));
        tokio::fs::write(&path, png).await?;
        Ok(path)
    }
}

/// Read a TrueType/OpenType font from disk.
pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::Config(format!("Failed to read font {}: {}", path.display(), e)))?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| Error::Config(format!("Invalid font {}: {}", path.display(), e)))
}

/// `output_image_<author>.png` with filesystem-unsafe characters replaced.
pub fn artifact_name(author: &str) -> String {
    let safe: String = author
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("output_image_{}.png", safe)
}

/// Greedy word wrap by rendered width; a word wider than `max_width` gets a line of its own.
pub fn wrap_to_width(text: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && measure(&format!("{} {}", current, word)) > max_width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn decode_photo(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::Render(format!("Invalid photo: {}", e)))
}

/// Scale and center-crop the photo to the card size.
fn fit_background(photo: &DynamicImage) -> RgbaImage {
    photo
        .resize_to_fill(CARD_SIZE, CARD_SIZE, FilterType::Triangle)
        .to_rgba8()
}

/// Draw `quote` over the photo.
pub fn compose_card(photo: &DynamicImage, quote: &Quote, font: &impl Font) -> RgbaImage {
    let mut card = fit_background(photo);

    let scale = PxScale::from(QUOTE_FONT_SIZE);
    let lines = wrap_to_width(&quote.text, CARD_SIZE - MARGIN, |s| {
        text_size(scale, font, s).0
    });
    let step = QUOTE_FONT_SIZE * LINE_HEIGHT;
    let block = step * lines.len().saturating_sub(1) as f32 + QUOTE_FONT_SIZE;
    let mut y = (CARD_SIZE as f32 - block) / 2.0;
    for line in &lines {
        let (width, _) = text_size(scale, font, line);
        let x = (CARD_SIZE as i32 - width as i32) / 2;
        draw_text_mut(&mut card, QUOTE_COLOR, x, y.round() as i32, scale, font, line);
        y += step;
    }

    let author_y = (CARD_SIZE - MARGIN) as f32 - AUTHOR_FONT_SIZE;
    draw_text_mut(
        &mut card,
        AUTHOR_COLOR,
        MARGIN as i32,
        author_y as i32,
        PxScale::from(AUTHOR_FONT_SIZE),
        font,
        &format!("- {}", quote.author),
    );
    card
}

fn encode_png(card: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    card.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::Render(format!("PNG encoding failed: {}", e)))?;
    Ok(out.into_inner())
}
