use anyhow::Result;
use chrono::{DateTime, Utc};

use super::types::{NewsCategory, NewsDraft, NewsItem};
use crate::institutions;
use crate::storage::{get_json, set_json, Storage};

pub const PUBLISHED_NEWS_KEY: &str = "campusai_published_news";
pub const LIVE_NEWS_KEY: &str = "campusai_live_news";
pub const LAST_SYNC_KEY: &str = "campusai_last_sync_time";

pub const JAMB_PORTAL_URL: &str = "https://www.jamb.gov.ng";

fn sample_news() -> Vec<NewsItem> {
    let item = |id: &str, title: &str, category, date: &str, excerpt: &str| NewsItem {
        id: id.to_string(),
        title: title.to_string(),
        category,
        date: date.to_string(),
        excerpt: excerpt.to_string(),
        source_url: None,
        is_live: false,
    };
    vec![
        item(
            "sample-1",
            "JAMB announces UTME registration window",
            NewsCategory::Jamb,
            "2026-01-05",
            "Registration for the Unified Tertiary Matriculation Examination opens across accredited CBT centres.",
        ),
        item(
            "sample-2",
            "University of Lagos publishes Post-UTME screening guidelines",
            NewsCategory::Federal,
            "2026-01-08",
            "Candidates who chose UNILAG as first choice should check the screening portal for eligibility requirements.",
        ),
        item(
            "sample-3",
            "Lagos State University extends acceptance fee deadline",
            NewsCategory::State,
            "2026-01-10",
            "Admitted candidates have an additional two weeks to complete acceptance and clearance.",
        ),
        item(
            "sample-4",
            "Covenant University opens scholarship applications",
            NewsCategory::Private,
            "2026-01-12",
            "Merit scholarships are available for new students with outstanding UTME and O-level results.",
        ),
    ]
}

/// Append live items whose titles are not already in `local`.
pub fn merge_with_live(local: Vec<NewsItem>, live: &[NewsItem]) -> Vec<NewsItem> {
    let mut merged = local;
    let fresh: Vec<NewsItem> = live
        .iter()
        .filter(|item| !merged.iter().any(|existing| existing.title == item.title))
        .cloned()
        .collect();
    merged.extend(fresh);
    merged
}

/// Where "read more" should point: the item's own link, the JAMB portal for
/// JAMB news, or the portal of an institution named in the title.
pub fn source_link(item: &NewsItem) -> String {
    if let Some(url) = item.source_url.as_deref().filter(|u| !u.trim().is_empty()) {
        return url.to_string();
    }
    if item.category == NewsCategory::Jamb {
        return JAMB_PORTAL_URL.to_string();
    }
    let title = item.title.to_lowercase();
    let mentions_slug = |slug: &str| {
        title
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .any(|word| word == slug)
    };
    institutions::all()
        .iter()
        .find(|u| title.contains(&u.name.to_lowercase()) || mentions_slug(u.slug))
        .map(|u| u.url.to_string())
        .unwrap_or_else(|| JAMB_PORTAL_URL.to_string())
}

/// Published and live news, persisted through a [`Storage`] port.
pub struct NewsDesk<S> {
    storage: S,
}

impl<S: Storage> NewsDesk<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Locally published news. Falls back to sample items until the first
    /// publish or delete.
    pub fn published(&self) -> Result<Vec<NewsItem>> {
        Ok(get_json(&self.storage, PUBLISHED_NEWS_KEY)?.unwrap_or_else(sample_news))
    }

    pub fn publish(&self, draft: NewsDraft) -> Result<NewsItem> {
        let mut items = self.published()?;
        let millis = Utc::now().timestamp_millis();
        let mut id = millis.to_string();
        let mut bump = 0;
        while items.iter().any(|i| i.id == id) {
            bump += 1;
            id = format!("{}-{}", millis, bump);
        }

        let item = NewsItem {
            id,
            title: draft.title,
            category: draft.category,
            date: draft.date,
            excerpt: draft.excerpt,
            source_url: draft.source_url,
            is_live: true,
        };
        items.insert(0, item.clone());
        set_json(&self.storage, PUBLISHED_NEWS_KEY, &items)?;

        tracing::info!(id = %item.id, "news published");
        Ok(item)
    }

    /// Returns true if an item with `id` existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut items = self.published()?;
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Ok(false);
        }
        set_json(&self.storage, PUBLISHED_NEWS_KEY, &items)?;
        Ok(true)
    }

    /// Remember the last successful live sync. Empty results are not stored.
    pub fn store_live(&self, items: &[NewsItem], synced_at: DateTime<Utc>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        set_json(&self.storage, LIVE_NEWS_KEY, items)?;
        self.storage.set(LAST_SYNC_KEY, &synced_at.to_rfc3339())?;
        Ok(())
    }

    pub fn cached_live(&self) -> Result<Vec<NewsItem>> {
        Ok(get_json(&self.storage, LIVE_NEWS_KEY)?.unwrap_or_default())
    }

    pub fn last_sync(&self) -> Result<Option<DateTime<Utc>>> {
        let raw = self.storage.get(LAST_SYNC_KEY)?;
        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Published news followed by cached live news, optionally narrowed to a category.
    pub fn feed(&self, category: Option<NewsCategory>) -> Result<Vec<NewsItem>> {
        let merged = merge_with_live(self.published()?, &self.cached_live()?);
        Ok(match category {
            Some(c) => merged.into_iter().filter(|i| i.category == c).collect(),
            None => merged,
        })
    }
}
