/// Shown when the AI catalogue is unavailable or empty.
pub const FALLBACK_COURSES: [&str; 12] = [
    "Medicine and Surgery",
    "Nursing Science",
    "Pharmacy",
    "Law",
    "Computer Science",
    "Metallurgical and Materials Engineering",
    "Mechanical Engineering",
    "Civil Engineering",
    "Accounting",
    "Business Administration",
    "Economics",
    "Mass Communication",
];

pub const COURSE_SUGGESTION_LIMIT: usize = 15;

pub fn fallback_courses() -> Vec<String> {
    FALLBACK_COURSES.iter().map(|c| c.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseSource {
    Ai,
    Cache,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseList {
    pub courses: Vec<String>,
    pub source: CourseSource,
}

impl CourseList {
    pub fn fallback() -> Self {
        Self {
            courses: fallback_courses(),
            source: CourseSource::Fallback,
        }
    }
}

/// Suggestions for a course picker: the catalogue followed by the popular
/// fallback courses, de-duplicated, narrowed by a case-insensitive term.
pub fn suggest_courses(available: &[String], term: &str, limit: usize) -> Vec<String> {
    let term = term.trim().to_lowercase();
    let mut seen = std::collections::HashSet::new();
    available
        .iter()
        .map(String::as_str)
        .chain(FALLBACK_COURSES)
        .filter(|c| seen.insert(c.to_lowercase()))
        .filter(|c| term.is_empty() || c.to_lowercase().contains(&term))
        .take(limit)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_merges_and_dedupes() {
        let available = vec!["Law".to_string(), "Anatomy".to_string()];
        let suggestions = suggest_courses(&available, "", usize::MAX);
        assert_eq!(suggestions[0], "Law");
        assert_eq!(suggestions[1], "Anatomy");
        assert_eq!(suggestions.iter().filter(|c| *c == "Law").count(), 1);
        assert_eq!(suggestions.len(), 2 + FALLBACK_COURSES.len() - 1);
    }

    #[test]
    fn test_suggest_filters_by_term() {
        let suggestions = suggest_courses(&[], "engineering", COURSE_SUGGESTION_LIMIT);
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions.iter().all(|c| c.contains("Engineering")));
    }

    #[test]
    fn test_suggest_limit() {
        let available: Vec<String> = (0..30).map(|i| format!("Course {}", i)).collect();
        assert_eq!(
            suggest_courses(&available, "", COURSE_SUGGESTION_LIMIT).len(),
            COURSE_SUGGESTION_LIMIT
        );
    }
}
