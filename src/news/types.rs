use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewsCategory {
    Federal,
    State,
    Private,
    #[serde(rename = "JAMB")]
    Jamb,
}

impl NewsCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            NewsCategory::Federal => "Federal",
            NewsCategory::State => "State",
            NewsCategory::Private => "Private",
            NewsCategory::Jamb => "JAMB",
        }
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "federal" => Ok(NewsCategory::Federal),
            "state" => Ok(NewsCategory::State),
            "private" => Ok(NewsCategory::Private),
            "jamb" => Ok(NewsCategory::Jamb),
            other => Err(format!(
                "unknown news category '{}' (expected federal, state, private or jamb)",
                other
            )),
        }
    }
}

/// Field names follow the JSON the AI returns and the portal stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub category: NewsCategory,
    pub date: String,
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default)]
    pub is_live: bool,
}

/// A news post before it has been given an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsDraft {
    pub title: String,
    pub category: NewsCategory,
    pub date: String,
    pub excerpt: String,
    pub source_url: Option<String>,
}
