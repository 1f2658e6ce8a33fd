use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const CACHE_TTL_SECONDS: u64 = 86400; // 24 hours

/// Get the platform-appropriate cache directory for AI answers
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("campus-ai/ai-cache"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/campus-ai/ai-cache",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn course_key(university: &str) -> String {
    format!("courses:{}", university.trim().to_lowercase())
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedCourses {
    courses: Vec<String>,
    fetched_at: u64, // Unix timestamp
}

/// Disk cache for AI course catalogues, keyed by university name.
#[derive(Debug, Clone)]
pub struct CourseCache {
    path: PathBuf,
}

impl CourseCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Courses cached within the last 24 hours, if any.
    pub fn get(&self, university: &str) -> Option<Vec<String>> {
        let bytes = cacache::read_sync(&self.path, course_key(university)).ok()?;
        let cached: CachedCourses = serde_json::from_slice(&bytes).ok()?;
        let fresh = now_secs().saturating_sub(cached.fetched_at) < CACHE_TTL_SECONDS;
        (fresh && !cached.courses.is_empty()).then_some(cached.courses)
    }

    pub fn put(&self, university: &str, courses: &[String]) -> Result<()> {
        self.put_at(university, courses, now_secs())
    }

    fn put_at(&self, university: &str, courses: &[String], fetched_at: u64) -> Result<()> {
        let entry = CachedCourses {
            courses: courses.to_vec(),
            fetched_at,
        };
        let json = serde_json::to_vec(&entry)?;
        cacache::write_sync(&self.path, course_key(university), json)?;
        Ok(())
    }

    /// Remove every cached answer.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
