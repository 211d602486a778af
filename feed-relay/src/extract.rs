use std::sync::Arc;

use async_trait::async_trait;
use interfaces::{ContentExtractor, ExtractedPage};
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::fetcher::Fetcher;
use crate::text::collapse_whitespace;
use crate::types::{FetchConfig, Result};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Paragraphs with this many words or fewer are navigation, captions and
/// the like.
const MIN_PARAGRAPH_WORDS: usize = 5;

/// Pulls the readable body out of an article page.
pub struct PageExtractor {
    fetcher: Arc<Fetcher>,
}

impl PageExtractor {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    /// An extractor with its own fetcher posing as a desktop browser.
    pub fn with_browser_agent(config: &FetchConfig) -> Result<Self> {
        let config = FetchConfig {
            user_agent: BROWSER_USER_AGENT.to_string(),
            ..config.clone()
        };
        Ok(Self::new(Arc::new(Fetcher::new(config)?)))
    }
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("bad selector {css}: {e:?}"))
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Title, meta description and body paragraphs of an HTML page. Header and
/// footer content is ignored; paragraphs repeating the title are dropped.
pub fn extract_page(html: &str) -> anyhow::Result<ExtractedPage> {
    let document = Html::parse_document(html);
    let title_selector = selector("title")?;
    let meta_selector = selector(r#"meta[name="description"], meta[property="og:description"]"#)?;
    let paragraph_selector = selector("p")?;

    let title = document
        .select(&title_selector)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let meta_description = document
        .select(&meta_selector)
        .find_map(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    let paragraphs: Vec<String> = document
        .select(&paragraph_selector)
        .filter(|p| !inside_page_chrome(*p))
        .map(element_text)
        .filter(|text| text.split_whitespace().count() > MIN_PARAGRAPH_WORDS)
        .filter(|text| title.is_empty() || !text.contains(title.as_str()))
        .collect();

    Ok(ExtractedPage {
        text: paragraphs.join("\n"),
        title,
        meta_description,
    })
}

fn inside_page_chrome(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| matches!(ancestor.value().name(), "header" | "footer"))
}

#[async_trait]
impl ContentExtractor for PageExtractor {
    async fn extract(&self, url: &str) -> anyhow::Result<ExtractedPage> {
        info!("Extracting article content from {}", url);
        let html = self.fetcher.fetch_full_content(url).await?;
        let page = extract_page(&html)?;
        if page.title.is_empty() {
            warn!("No title found for {}", url);
        }
        if page.text.is_empty() {
            warn!("No body paragraphs found for {}", url);
        }
        Ok(page)
    }
}
