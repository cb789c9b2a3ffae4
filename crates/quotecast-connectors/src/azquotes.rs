//! AZQuotes scraper: one-time corpus ingestion.
//!
//! Walks the topic index, visits every topic page (tag pages excluded) and
//! collects each quote block's text, author and tags in page order.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use quotecast_core::{Error, Result};
use quotecast_rotation::Ingestor;
use quotecast_store::{CorpusStore, Quote};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; quotecast/0.1)";

/// Scrapes quotes from an AZQuotes-style topic index.
pub struct AzQuotesIngestor {
    client: Client,
    index_url: Url,
}

impl AzQuotesIngestor {
    pub fn new(index_url: &str) -> Result<Self> {
        let index_url = Url::parse(index_url)
            .map_err(|e| Error::Ingest(format!("invalid index URL {}: {}", index_url, e)))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, index_url })
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("HTTP {} when fetching {}", status.as_u16(), url)));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Http(format!("Failed to read body from {}: {}", url, e)))
    }
}

#[async_trait]
impl Ingestor for AzQuotesIngestor {
    async fn ingest(&self, store: &CorpusStore) -> Result<usize> {
        let index = self
            .fetch_html(self.index_url.as_str())
            .await
            .map_err(|e| Error::Ingest(format!("failed to fetch index page: {}", e)))?;
        let links = parse_topic_links(&index, &self.index_url)?;
        info!("Found {} topic pages", links.len());

        let mut all_quotes = Vec::new();
        for url in &links {
            info!("Fetching topic page: {}", url);
            let page = match self.fetch_html(url.as_str()).await {
                Ok(p) => p,
                Err(e) => {
                    warn!("Failed to fetch topic page: {}", e);
                    continue;
                }
            };
            all_quotes.extend(parse_quotes(&page)?);
        }

        if all_quotes.is_empty() {
            return Err(Error::Ingest("no quotes found".into()));
        }

        store.save(&all_quotes)?;
        Ok(all_quotes.len())
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Ingest(format!("invalid selector {}: {:?}", css, e)))
}

/// Topic-page URLs from the index page, resolved against `base`. Tag pages are skipped.
pub fn parse_topic_links(html: &str, base: &Url) -> Result<Vec<Url>> {
    let document = Html::parse_document(html);
    let links = selector("section.authors-page a")?;

    let mut urls = Vec::new();
    for anchor in document.select(&links) {
        let Some(href) = anchor.value().attr("href") else {
            debug!("Topic URL not found");
            continue;
        };
        let url = match base.join(href) {
            Ok(url) => url,
            Err(e) => {
                debug!("Ignoring unresolvable link {}: {}", href, e);
                continue;
            }
        };
        if url.path().contains("/tags/") {
            debug!("Ignoring tag page: {}", url);
            continue;
        }
        if !matches!(url.scheme(), "http" | "https") {
            debug!("Ignoring non-HTTP link: {}", url);
            continue;
        }
        urls.push(url);
    }
    Ok(urls)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Quotes found in the `.wrap-block` elements of a topic page.
pub fn parse_quotes(html: &str) -> Result<Vec<Quote>> {
    let document = Html::parse_document(html);
    let blocks = selector(".wrap-block")?;
    let paragraph = selector("p")?;
    let author_link = selector(".author a")?;
    let tag_link = selector(".mytags a")?;

    let mut quotes = Vec::new();
    for block in document.select(&blocks) {
        let text = block
            .select(&paragraph)
            .map(element_text)
            .collect::<Vec<_>>()
            .join("");
        let text = text.trim();
        if text.is_empty() {
            debug!("Quote text not found");
            continue;
        }

        let author = block
            .select(&author_link)
            .map(element_text)
            .collect::<Vec<_>>()
            .join("");
        if author.is_empty() {
            debug!("Author not found");
            continue;
        }

        let tags = block
            .select(&tag_link)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();

        quotes.push(Quote::new(author, text, tags));
    }
    Ok(quotes)
}
