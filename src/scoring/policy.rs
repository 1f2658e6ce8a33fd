use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How an institution weighs the entrance exam, O-level results and its own
/// screening exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// 50% entrance exam, raw O-level points, no screening exam.
    #[default]
    ExamOlevel,
    /// 50% entrance exam, 20% O-level, 30% screening exam.
    ExamOlevelSecondary,
    /// 50% entrance exam, 50% screening exam. O-level ignored.
    ExamSecondaryHeavy,
}

/// Maximum contribution of each component, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub entrance_exam: f64,
    pub olevel: f64,
    pub secondary_exam: f64,
}

impl Policy {
    pub const ALL: [Policy; 3] = [
        Policy::ExamOlevel,
        Policy::ExamOlevelSecondary,
        Policy::ExamSecondaryHeavy,
    ];

    pub fn weights(self) -> Weights {
        match self {
            Policy::ExamOlevel => Weights {
                entrance_exam: 50.0,
                olevel: 50.0,
                secondary_exam: 0.0,
            },
            Policy::ExamOlevelSecondary => Weights {
                entrance_exam: 50.0,
                olevel: 20.0,
                secondary_exam: 30.0,
            },
            Policy::ExamSecondaryHeavy => Weights {
                entrance_exam: 50.0,
                olevel: 0.0,
                secondary_exam: 50.0,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Policy::ExamOlevel => "Standard Model (50:50)",
            Policy::ExamOlevelSecondary => "UNILAG/FUTA Model (50:20:30)",
            Policy::ExamSecondaryHeavy => "UI/OAU Model (50:50)",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Policy::ExamOlevel => "exam-olevel",
            Policy::ExamOlevelSecondary => "exam-olevel-secondary",
            Policy::ExamSecondaryHeavy => "exam-secondary-heavy",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown policy '{}' (expected exam-olevel, exam-olevel-secondary or exam-secondary-heavy)",
                    s
                )
            })
    }
}

const BUILTIN_POLICIES: &[(&str, Policy)] = &[
    ("unilag", Policy::ExamOlevelSecondary),
    ("futa", Policy::ExamOlevelSecondary),
    ("ui", Policy::ExamSecondaryHeavy),
    ("oau", Policy::ExamSecondaryHeavy),
    ("uniben", Policy::ExamSecondaryHeavy),
    ("lasu", Policy::ExamOlevel),
];

/// Institution slug to policy lookup.
///
/// Resolution never fails: no institution, or one missing from the table,
/// resolves to [`Policy::default`].
#[derive(Debug, Clone)]
pub struct PolicyTable {
    entries: HashMap<String, Policy>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            entries: BUILTIN_POLICIES
                .iter()
                .map(|(slug, policy)| (slug.to_string(), *policy))
                .collect(),
        }
    }
}

impl PolicyTable {
    /// Built-in table with `overrides` layered on top.
    pub fn with_overrides(overrides: &HashMap<String, Policy>) -> Self {
        let mut table = Self::default();
        for (slug, policy) in overrides {
            table.entries.insert(slug.to_ascii_lowercase(), *policy);
        }
        table
    }

    pub fn resolve(&self, slug: Option<&str>) -> Policy {
        slug.and_then(|s| self.entries.get(&s.to_ascii_lowercase()).copied())
            .unwrap_or_default()
    }

    pub fn is_explicit(&self, slug: &str) -> bool {
        self.entries.contains_key(&slug.to_ascii_lowercase())
    }
}
