use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How many institutions a picker shows at once.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Federal,
    State,
    Private,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Federal => "Federal",
            Category::State => "State",
            Category::Private => "Private",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "federal" => Ok(Category::Federal),
            "state" => Ok(Category::State),
            "private" => Ok(Category::Private),
            other => Err(format!(
                "unknown category '{}' (expected federal, state or private)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Institution {
    pub name: &'static str,
    pub slug: &'static str,
    pub category: Category,
    pub url: &'static str,
}

const fn uni(
    name: &'static str,
    slug: &'static str,
    category: Category,
    url: &'static str,
) -> Institution {
    Institution {
        name,
        slug,
        category,
        url,
    }
}

static INSTITUTIONS: &[Institution] = &[
    uni("University of Lagos", "unilag", Category::Federal, "https://unilag.edu.ng"),
    uni("University of Ibadan", "ui", Category::Federal, "https://www.ui.edu.ng"),
    uni("Obafemi Awolowo University", "oau", Category::Federal, "https://oauife.edu.ng"),
    uni("University of Benin", "uniben", Category::Federal, "https://uniben.edu"),
    uni("Federal University of Technology, Akure", "futa", Category::Federal, "https://www.futa.edu.ng"),
    uni("Ahmadu Bello University", "abu-zaria", Category::Federal, "https://abu.edu.ng"),
    uni("University of Nigeria, Nsukka", "unn", Category::Federal, "https://www.unn.edu.ng"),
    uni("University of Ilorin", "unilorin", Category::Federal, "https://www.unilorin.edu.ng"),
    uni("University of Port Harcourt", "uniport", Category::Federal, "https://www.uniport.edu.ng"),
    uni("University of Calabar", "unical", Category::Federal, "https://www.unical.edu.ng"),
    uni("Bayero University Kano", "buk", Category::Federal, "https://buk.edu.ng"),
    uni("Federal University of Technology, Minna", "futminna", Category::Federal, "https://futminna.edu.ng"),
    uni("Lagos State University", "lasu", Category::State, "https://lasu.edu.ng"),
    uni("Ekiti State University", "eksu", Category::State, "https://eksu.edu.ng"),
    uni("Rivers State University", "rsu", Category::State, "https://www.rsu.edu.ng"),
    uni("Adekunle Ajasin University", "aaua", Category::State, "https://aaua.edu.ng"),
    uni("Covenant University", "covenant", Category::Private, "https://covenantuniversity.edu.ng"),
    uni("Babcock University", "babcock", Category::Private, "https://www.babcock.edu.ng"),
    uni("Pan-Atlantic University", "pau", Category::Private, "https://pau.edu.ng"),
    uni("American University of Nigeria", "aun", Category::Private, "https://www.aun.edu.ng"),
];

pub fn all() -> &'static [Institution] {
    INSTITUTIONS
}

pub fn find_by_slug(slug: &str) -> Option<&'static Institution> {
    INSTITUTIONS
        .iter()
        .find(|u| u.slug.eq_ignore_ascii_case(slug.trim()))
}

/// Resolve either a slug or an exact (case-insensitive) name.
pub fn find(key: &str) -> Option<&'static Institution> {
    find_by_slug(key).or_else(|| {
        INSTITUTIONS
            .iter()
            .find(|u| u.name.eq_ignore_ascii_case(key.trim()))
    })
}

/// Filter by category, then by a case-insensitive match on name or slug.
/// An empty term keeps everything.
pub fn search(term: &str, category: Option<Category>, limit: usize) -> Vec<&'static Institution> {
    let term = term.trim().to_lowercase();
    INSTITUTIONS
        .iter()
        .filter(|u| category.map_or(true, |c| u.category == c))
        .filter(|u| {
            term.is_empty()
                || u.name.to_lowercase().contains(&term)
                || u.slug.to_lowercase().contains(&term)
        })
        .take(limit)
        .collect()
}

/// A search that narrows to exactly one institution is spotlighted
/// automatically, as long as the term is longer than two characters.
pub fn auto_spotlight(term: &str, category: Option<Category>) -> Option<&'static Institution> {
    if term.trim().chars().count() <= 2 {
        return None;
    }
    match search(term, category, usize::MAX).as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slugs_unique() {
        let mut seen = HashSet::new();
        for u in all() {
            assert!(seen.insert(u.slug), "duplicate slug {}", u.slug);
        }
    }

    #[test]
    fn test_find_by_slug_and_name() {
        assert_eq!(find("UNILAG").unwrap().name, "University of Lagos");
        assert_eq!(find("university of ibadan").unwrap().slug, "ui");
        assert!(find("hogwarts").is_none());
    }

    #[test]
    fn test_search_by_term_matches_name_or_slug() {
        let results = search("lag", None, DEFAULT_SEARCH_LIMIT);
        let slugs: Vec<_> = results.iter().map(|u| u.slug).collect();
        assert!(slugs.contains(&"unilag"));
        assert!(slugs.contains(&"lasu"));

        let results = search("futa", None, DEFAULT_SEARCH_LIMIT);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_search_category_filter() {
        let results = search("", Some(Category::Private), usize::MAX);
        assert!(!results.is_empty());
        assert!(results.iter().all(|u| u.category == Category::Private));
    }

    #[test]
    fn test_search_respects_limit() {
        assert_eq!(search("", None, 5).len(), 5);
    }

    #[test]
    fn test_auto_spotlight() {
        assert_eq!(auto_spotlight("covenant", None).unwrap().slug, "covenant");
        // Too short
        assert!(auto_spotlight("ui", None).is_none());
        // Ambiguous
        assert!(auto_spotlight("university", None).is_none());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("FEDERAL".parse::<Category>().unwrap(), Category::Federal);
        assert!("jamb".parse::<Category>().is_err());
    }
}
