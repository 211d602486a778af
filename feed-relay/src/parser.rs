use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use tracing::{debug, info, warn};

use crate::dates;
use crate::types::{RelayError, Result};

/// One feed entry with everything ingestion needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub title: String,
    pub link: String,
    /// Normalized comparison date of the entry.
    pub published: DateTime<Utc>,
    /// Raw description, usually HTML.
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
    /// Entries dropped for lacking a link or a usable date.
    pub skipped: usize,
}

pub struct FeedParser;

impl FeedParser {
    /// Parse RSS 0.9x/1.0/2.0, Atom or JSON Feed bytes. Every timestamp goes
    /// through [`dates::normalize_entry_date`] so all dialects compare alike.
    pub fn parse_feed(url: &str, content: &[u8]) -> Result<ParsedFeed> {
        debug!("Parsing feed {} ({} bytes)", url, content.len());

        let feed = parser::Builder::new()
            .timestamp_parser(|raw: &str| dates::normalize_entry_date(raw).ok())
            .build()
            .parse(content)
            .map_err(|e| RelayError::FeedParse {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let title = feed.title.map(|t| t.content);
        let mut entries = Vec::with_capacity(feed.entries.len());
        let mut skipped = 0;

        for entry in feed.entries {
            match Self::parse_entry(entry) {
                Some(parsed) => entries.push(parsed),
                None => skipped += 1,
            }
        }

        info!("Parsed feed {} with {} entries ({} skipped)", url, entries.len(), skipped);
        Ok(ParsedFeed { title, entries, skipped })
    }

    fn parse_entry(entry: Entry) -> Option<ParsedEntry> {
        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        // Prefer the alternate link when an entry carries several.
        let link = entry
            .links
            .iter()
            .find(|link| link.rel.as_deref().map_or(true, |rel| rel == "alternate"))
            .or_else(|| entry.links.first())
            .map(|link| link.href.trim().to_string())
            .filter(|href| !href.is_empty());
        let Some(link) = link else {
            warn!("Skipping entry {:?} without a link", title);
            return None;
        };

        let Some(published) = entry.published.or(entry.updated) else {
            warn!("Skipping entry {} without a usable date", link);
            return None;
        };

        let description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .filter(|d| !d.trim().is_empty());

        Some(ParsedEntry {
            title,
            link,
            published,
            description,
        })
    }
}
