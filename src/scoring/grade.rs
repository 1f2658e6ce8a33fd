use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of O-level results that count towards an aggregate.
pub const SUBJECT_COUNT: usize = 5;

/// Highest O-level point total a candidate can reach (five A1 results).
pub const MAX_OLEVEL_POINTS: u32 = 50;

/// WAEC/NECO letter grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Grade {
    A1,
    B2,
    B3,
    C4,
    C5,
    C6,
    D7,
    E8,
    F9,
}

impl Grade {
    pub const ALL: [Grade; 9] = [
        Grade::A1,
        Grade::B2,
        Grade::B3,
        Grade::C4,
        Grade::C5,
        Grade::C6,
        Grade::D7,
        Grade::E8,
        Grade::F9,
    ];

    /// Points awarded for this grade. Anything below a credit earns nothing.
    pub fn points(self) -> u32 {
        match self {
            Grade::A1 => 10,
            Grade::B2 => 9,
            Grade::B3 => 8,
            Grade::C4 => 7,
            Grade::C5 => 6,
            Grade::C6 => 5,
            Grade::D7 | Grade::E8 | Grade::F9 => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A1 => "A1",
            Grade::B2 => "B2",
            Grade::B3 => "B3",
            Grade::C4 => "C4",
            Grade::C5 => "C5",
            Grade::C6 => "C6",
            Grade::D7 => "D7",
            Grade::E8 => "E8",
            Grade::F9 => "F9",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Grade::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown grade '{}' (expected one of A1..F9)", wanted))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectGrade {
    pub subject: String,
    pub grade: Grade,
}

impl SubjectGrade {
    pub fn new(subject: impl Into<String>, grade: Grade) -> Self {
        Self {
            subject: subject.into(),
            grade,
        }
    }
}

/// Parses `"Physics=B2"`.
impl FromStr for SubjectGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (subject, grade) = s
            .split_once('=')
            .ok_or_else(|| format!("expected SUBJECT=GRADE, got '{}'", s))?;
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(format!("missing subject name in '{}'", s));
        }
        Ok(SubjectGrade::new(subject, grade.parse()?))
    }
}

/// A candidate's best five O-level results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectGrades([SubjectGrade; SUBJECT_COUNT]);

impl SubjectGrades {
    /// Build from exactly five results.
    pub fn new(grades: Vec<SubjectGrade>) -> Result<Self, String> {
        let count = grades.len();
        let array: [SubjectGrade; SUBJECT_COUNT] = grades.try_into().map_err(|_| {
            format!(
                "exactly {} subject grades are required, got {}",
                SUBJECT_COUNT, count
            )
        })?;
        Ok(Self(array))
    }

    /// Apply bare grades to the default subject names, in order.
    pub fn from_grades(grades: &[Grade]) -> Result<Self, String> {
        let mut set = Self::default();
        if grades.len() != SUBJECT_COUNT {
            return Err(format!(
                "exactly {} grades are required, got {}",
                SUBJECT_COUNT,
                grades.len()
            ));
        }
        for (slot, grade) in set.0.iter_mut().zip(grades) {
            slot.grade = *grade;
        }
        Ok(set)
    }

    pub fn set_grade(&mut self, index: usize, grade: Grade) -> bool {
        match self.0.get_mut(index) {
            Some(slot) => {
                slot.grade = grade;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubjectGrade> {
        self.0.iter()
    }

    /// Sum of grade points, always within `0..=MAX_OLEVEL_POINTS`.
    pub fn total_points(&self) -> u32 {
        self.0.iter().map(|s| s.grade.points()).sum()
    }
}

impl Default for SubjectGrades {
    fn default() -> Self {
        Self([
            SubjectGrade::new("English Language", Grade::C6),
            SubjectGrade::new("Mathematics", Grade::C6),
            SubjectGrade::new("Core Subject 1", Grade::C6),
            SubjectGrade::new("Core Subject 2", Grade::C6),
            SubjectGrade::new("Core Subject 3", Grade::C6),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_points_table() {
        let points: Vec<u32> = Grade::ALL.iter().map(|g| g.points()).collect();
        assert_eq!(points, vec![10, 9, 8, 7, 6, 5, 0, 0, 0]);
    }

    #[test]
    fn test_grade_parse_case_insensitive() {
        assert_eq!("a1".parse::<Grade>().unwrap(), Grade::A1);
        assert_eq!(" C6 ".parse::<Grade>().unwrap(), Grade::C6);
        assert!("Z1".parse::<Grade>().is_err());
    }

    #[test]
    fn test_subject_grade_parse() {
        let sg: SubjectGrade = "Physics=b2".parse().unwrap();
        assert_eq!(sg.subject, "Physics");
        assert_eq!(sg.grade, Grade::B2);

        assert!("Physics".parse::<SubjectGrade>().is_err());
        assert!("=A1".parse::<SubjectGrade>().is_err());
        assert!("Physics=Q7".parse::<SubjectGrade>().is_err());
    }

    #[test]
    fn test_default_set_is_all_c6() {
        let set = SubjectGrades::default();
        assert_eq!(set.iter().count(), SUBJECT_COUNT);
        assert_eq!(set.total_points(), 25);
    }

    #[test]
    fn test_new_requires_exactly_five() {
        let four = vec![SubjectGrade::new("English Language", Grade::A1); 4];
        assert!(SubjectGrades::new(four).is_err());

        let five = vec![SubjectGrade::new("English Language", Grade::A1); 5];
        assert_eq!(SubjectGrades::new(five).unwrap().total_points(), 50);
    }

    #[test]
    fn test_total_points_bounds_for_every_grade() {
        for grade in Grade::ALL {
            let set = SubjectGrades::from_grades(&[grade; SUBJECT_COUNT]).unwrap();
            let total = set.total_points();
            assert!(total <= MAX_OLEVEL_POINTS, "{} gave {}", grade, total);
        }
    }

    #[test]
    fn test_set_grade_out_of_range() {
        let mut set = SubjectGrades::default();
        assert!(set.set_grade(0, Grade::A1));
        assert!(!set.set_grade(5, Grade::A1));
        assert_eq!(set.total_points(), 30);
    }
}
