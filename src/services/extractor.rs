// src/services/extractor.rs

//! Entry extraction from the watched page.

use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Entry, WatcherConfig};

/// Turns raw page content into candidate entries using CSS selectors.
#[derive(Debug, Clone)]
pub struct EntryExtractor {
    selector: Selector,
    link_selector: Selector,
}

impl EntryExtractor {
    /// Create an extractor from the configured selectors.
    pub fn new(config: &WatcherConfig) -> Result<Self> {
        Self::from_selectors(&config.selector, &config.link_selector)
    }

    pub fn from_selectors(selector: &str, link_selector: &str) -> Result<Self> {
        Ok(Self {
            selector: Self::parse_selector(selector)?,
            link_selector: Self::parse_selector(link_selector)?,
        })
    }

    /// Extract one entry per matching fragment, in page order.
    ///
    /// The title is the fragment's visible text, trimmed; the link is the
    /// `href` of its first link element, or empty.
    pub fn extract(&self, raw: &str) -> Vec<Entry> {
        let document = Html::parse_document(raw);

        document
            .select(&self.selector)
            .map(|fragment| {
                let title: String = fragment.text().collect();
                let link = fragment
                    .select(&self.link_selector)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .unwrap_or("");
                Entry::new(title.trim(), link)
            })
            .collect()
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}
