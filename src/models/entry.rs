//! Entry data structure.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::render;
use crate::utils::resolve_url;

/// Leading day-first date token, e.g. `01/02/2024` or `1.2.2024`.
static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\b").expect("valid date regex")
});

/// A publication found on the watched page.
///
/// Two entries are the same publication iff both `title` and `link` match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Visible text of the page fragment, trimmed
    pub title: String,

    /// First link reference inside the fragment (may be relative or empty)
    #[serde(default)]
    pub link: String,
}

impl Entry {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }

    /// Publication date parsed from the leading token of the title.
    pub fn date(&self) -> Option<NaiveDate> {
        let caps = DATE_TOKEN.captures(&self.title)?;
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Link resolved against the page it was found on.
    pub fn absolute_link(&self, base: Option<&Url>) -> String {
        match base {
            Some(base) if !self.link.is_empty() => resolve_url(base, &self.link),
            _ => self.link.clone(),
        }
    }

    /// Format the entry for display using a template.
    ///
    /// Supported placeholders: `{title}`, `{link}`, `{date}`.
    pub fn format(&self, template: &str, base: Option<&Url>) -> String {
        let date = self
            .date()
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default();
        render(
            template,
            &[
                ("title", &self.title),
                ("link", &self.absolute_link(base)),
                ("date", &date),
            ],
        )
    }
}

/// The single most recently seen entry, as exposed by the status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestEntry {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub link: String,
}

impl From<&Entry> for LatestEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            title: entry.title.clone(),
            date: entry.date(),
            link: entry.link.clone(),
        }
    }
}
