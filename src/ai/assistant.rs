use anyhow::Result;
use chrono::{Datelike, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::backend::ModelBackend;
use super::cache::CourseCache;
use super::courses::{CourseList, CourseSource};
use super::error::AiError;
use super::request::{RequestOutcome, RequestSlot};
use super::types::{
    ChatMessage, ChatReply, Content, CutoffEstimate, GenerateRequest, GenerateResponse,
    InlineImage, Part, UniversityProfile,
};
use crate::config::AiConfig;
use crate::news::{NewsCategory, NewsItem};

pub const CHAT_FALLBACK_REPLY: &str = "I'm processing that information right now.";
pub const VISION_FALLBACK_REPLY: &str =
    "I've analyzed the content but couldn't generate a text response.";
pub const LIVE_NEWS_LIMIT: usize = 6;

const CHAT_INSTRUCTION: &str = "You are CampusAI, a friendly assistant for Nigerian higher education. \
You know JAMB, Post-UTME screening and university cut-off marks. \
Use Google Search for current session dates and announcements.";

const VISION_INSTRUCTION: &str = "You are CampusAI Pro, a friendly academic assistant for Nigerian students. \
You read documents such as JAMB result slips and admission letters, \
summarise the key details and advise on next steps under Nigerian admission rules.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantSettings {
    pub chat_model: String,
    pub vision_model: String,
    pub timeout: Duration,
}

impl AssistantSettings {
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        Ok(Self {
            chat_model: config.chat_model.clone(),
            vision_model: config.vision_model.clone(),
            timeout: config.timeout_duration()?,
        })
    }
}

impl Default for AssistantSettings {
    fn default() -> Self {
        let config = AiConfig::default();
        Self {
            chat_model: config.chat_model,
            vision_model: config.vision_model,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Admissions assistant over a generative model.
///
/// Every lookup except chat degrades to an empty or fallback value when the
/// model is unreachable, slow or returns something unusable.
pub struct Assistant<B> {
    backend: B,
    settings: AssistantSettings,
    cache: Option<CourseCache>,
    courses_slot: RequestSlot,
    cutoff_slot: RequestSlot,
    profile_slot: RequestSlot,
    news_slot: RequestSlot,
    chat_slot: RequestSlot,
    vision_slot: RequestSlot,
}

impl<B: ModelBackend> Assistant<B> {
    pub fn new(backend: B, settings: AssistantSettings) -> Self {
        Self {
            backend,
            settings,
            cache: None,
            courses_slot: RequestSlot::new("courses"),
            cutoff_slot: RequestSlot::new("cutoff"),
            profile_slot: RequestSlot::new("profile"),
            news_slot: RequestSlot::new("news"),
            chat_slot: RequestSlot::new("chat"),
            vision_slot: RequestSlot::new("vision"),
        }
    }

    pub fn with_cache(mut self, cache: CourseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    async fn call(
        &self,
        slot: &RequestSlot,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, AiError> {
        tracing::debug!(slot = slot.name(), model = %request.model, "sending model request");
        let handle = slot.begin();
        match handle
            .run(slot, self.settings.timeout, self.backend.generate(request))
            .await
        {
            RequestOutcome::Ready(result) => result,
            RequestOutcome::TimedOut(after) => Err(AiError::TimedOut(after)),
            RequestOutcome::Cancelled => Err(AiError::Cancelled),
            RequestOutcome::Stale => Err(AiError::Stale),
        }
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        slot: &RequestSlot,
        request: GenerateRequest,
    ) -> Result<T, AiError> {
        let response = self.call(slot, request).await?;
        let text = response.text.ok_or(AiError::EmptyResponse)?;
        parse_json_text(&text)
    }

    /// Course catalogue for a university: cached, from the model, or the
    /// fixed popular-course list.
    pub async fn courses(&self, university: &str) -> CourseList {
        let university = university.trim();
        if university.is_empty() {
            return CourseList::fallback();
        }
        if let Some(courses) = self.cache.as_ref().and_then(|c| c.get(university)) {
            tracing::debug!(university, count = courses.len(), "course list served from cache");
            return CourseList {
                courses,
                source: CourseSource::Cache,
            };
        }

        let request = GenerateRequest::prompt(
            &self.settings.chat_model,
            format!("List the undergraduate courses offered at {} in Nigeria.", university),
        )
        .with_schema(json!({ "type": "ARRAY", "items": { "type": "STRING" } }));

        let courses = match self.call_json::<Vec<String>>(&self.courses_slot, request).await {
            Ok(courses) => clean_courses(courses),
            Err(e) => {
                tracing::warn!(university, error = %e, "course lookup failed");
                Vec::new()
            }
        };
        if courses.is_empty() {
            return CourseList::fallback();
        }

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(university, &courses) {
                tracing::warn!(error = %e, "failed to cache course list");
            }
        }
        CourseList {
            courses,
            source: CourseSource::Ai,
        }
    }

    /// Merit cut-off estimate for a course. Display only; never feeds the
    /// aggregate calculation.
    pub async fn cutoff(&self, university: &str, course: &str) -> Option<CutoffEstimate> {
        let (university, course) = (university.trim(), course.trim());
        if university.is_empty() || course.is_empty() {
            return None;
        }

        let request = GenerateRequest::prompt(
            &self.settings.chat_model,
            format!(
                "Search for the merit cut-off mark and JAMB subject combination for {} at {} for the {} admission session.",
                course,
                university,
                Utc::now().year()
            ),
        )
        .with_search()
        .with_schema(json!({
            "type": "OBJECT",
            "properties": {
                "cutoff": { "type": "STRING" },
                "subjectCombination": { "type": "STRING" },
                "recommendation": { "type": "STRING" },
                "reliability": { "type": "STRING" }
            },
            "required": ["cutoff", "subjectCombination", "recommendation", "reliability"]
        }));

        self.call_json(&self.cutoff_slot, request)
            .await
            .inspect_err(|e| tracing::warn!(university, course, error = %e, "cutoff lookup failed"))
            .ok()
    }

    pub async fn university_profile(&self, name: &str) -> Option<UniversityProfile> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let request = GenerateRequest::prompt(
            &self.settings.chat_model,
            format!("Provide a short profile of {} in Nigeria.", name),
        )
        .with_schema(json!({
            "type": "OBJECT",
            "properties": {
                "bio": { "type": "STRING" },
                "founded": { "type": "STRING" },
                "motto": { "type": "STRING" },
                "bestKnownFor": { "type": "STRING" },
                "campusVibe": { "type": "STRING" }
            },
            "required": ["bio", "founded", "motto", "bestKnownFor", "campusVibe"]
        }));

        self.call_json(&self.profile_slot, request)
            .await
            .inspect_err(|e| tracing::warn!(name, error = %e, "profile lookup failed"))
            .ok()
    }

    /// Recent admission news found by the model, marked live.
    pub async fn live_news(&self) -> Vec<NewsItem> {
        let now = Utc::now();
        let request = GenerateRequest::prompt(
            &self.settings.chat_model,
            format!(
                "Search for {} recent JAMB and Nigerian university admission news updates for {}.",
                LIVE_NEWS_LIMIT,
                now.format("%B %Y")
            ),
        )
        .with_search()
        .with_schema(json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "id": { "type": "STRING" },
                    "title": { "type": "STRING" },
                    "category": { "type": "STRING" },
                    "date": { "type": "STRING" },
                    "excerpt": { "type": "STRING" },
                    "sourceUrl": { "type": "STRING" }
                },
                "required": ["id", "title", "category", "date", "excerpt", "sourceUrl"]
            }
        }));

        match self.call_json::<Vec<LiveNews>>(&self.news_slot, request).await {
            Ok(items) => items
                .into_iter()
                .filter(|item| !item.title.trim().is_empty())
                .take(LIVE_NEWS_LIMIT)
                .enumerate()
                .map(|(i, item)| item.into_news_item(i))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "live news lookup failed");
                Vec::new()
            }
        }
    }

    /// One chat turn. Unlike the lookups, failures are returned to the caller.
    pub async fn chat(&self, message: &str, history: &[ChatMessage]) -> Result<ChatReply, AiError> {
        let mut request = GenerateRequest::prompt(&self.settings.chat_model, message)
            .with_system(CHAT_INSTRUCTION)
            .with_search();
        request.contents = with_history(history, request.contents);

        let response = self.call(&self.chat_slot, request).await?;
        Ok(reply_or(response, CHAT_FALLBACK_REPLY))
    }

    /// Ask the vision model about a message and an optional document image.
    pub async fn analyze(
        &self,
        message: &str,
        image: Option<InlineImage>,
        history: &[ChatMessage],
    ) -> Result<ChatReply, AiError> {
        let mut request = GenerateRequest::prompt(&self.settings.vision_model, message)
            .with_system(VISION_INSTRUCTION);
        if let (Some(image), Some(turn)) = (image, request.contents.last_mut()) {
            turn.parts.push(Part::Image(image));
        }
        request.contents = with_history(history, request.contents);

        let response = self.call(&self.vision_slot, request).await?;
        Ok(reply_or(response, VISION_FALLBACK_REPLY))
    }

    /// Cancel every request in flight; each resolves with [`AiError::Cancelled`].
    pub fn cancel_all(&self) {
        for slot in [
            &self.courses_slot,
            &self.cutoff_slot,
            &self.profile_slot,
            &self.news_slot,
            &self.chat_slot,
            &self.vision_slot,
        ] {
            slot.cancel();
        }
    }
}

fn with_history(history: &[ChatMessage], turn: Vec<Content>) -> Vec<Content> {
    history.iter().map(Content::from).chain(turn).collect()
}

fn reply_or(response: GenerateResponse, fallback: &str) -> ChatReply {
    let text = response
        .text
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    ChatReply {
        text,
        sources: response.sources,
    }
}

fn clean_courses(courses: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    courses
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && seen.insert(c.to_lowercase()))
        .collect()
}

/// Models sometimes wrap JSON answers in a markdown code fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn parse_json_text<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    Ok(serde_json::from_str(strip_code_fence(text))?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveNews {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    source_url: Option<String>,
}

impl LiveNews {
    fn into_news_item(self, index: usize) -> NewsItem {
        NewsItem {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("live-{}", index + 1)),
            title: self.title.trim().to_string(),
            category: self.category.parse().unwrap_or(NewsCategory::Jamb),
            date: self.date,
            excerpt: self.excerpt,
            source_url: self.source_url.filter(|u| u.starts_with("http")),
            is_live: true,
        }
    }
}
