use serde::{Deserialize, Serialize};
use std::fmt;

use super::grade::{SubjectGrades, MAX_OLEVEL_POINTS};
use super::policy::Policy;

pub const MAX_ENTRANCE_EXAM: f64 = 400.0;
pub const MAX_SECONDARY_EXAM: f64 = 100.0;

/// Parse a form value the forgiving way: the longest leading decimal number
/// wins (an exponent counts only when digits follow it) and anything
/// unparseable is zero.
pub fn parse_score(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let bytes = trimmed.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = match bytes.first() {
        Some(b'+' | b'-') => 1,
        _ => 0,
    };
    let int_end = digits_from(end);
    let mut seen_digit = int_end > end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        seen_digit |= frac_end > end + 1;
        end = frac_end;
    }
    if !seen_digit {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    match trimmed[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Raw exam scores as entered by the candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExamScores {
    pub entrance_exam: f64,
    pub secondary_exam: f64,
}

impl ExamScores {
    pub fn new(entrance_exam: f64, secondary_exam: f64) -> Self {
        Self {
            entrance_exam,
            secondary_exam,
        }
    }

    /// Build from unvalidated text input.
    pub fn parse(entrance_exam: &str, secondary_exam: &str) -> Self {
        Self::new(parse_score(entrance_exam), parse_score(secondary_exam))
    }

    fn clamped(self) -> Self {
        let clamp = |v: f64, max: f64| if v.is_finite() { v.clamp(0.0, max) } else { 0.0 };
        Self {
            entrance_exam: clamp(self.entrance_exam, MAX_ENTRANCE_EXAM),
            secondary_exam: clamp(self.secondary_exam, MAX_SECONDARY_EXAM),
        }
    }
}

/// Qualitative standing derived from the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "Exceptional")]
    Exceptional,
    #[serde(rename = "Highly Competitive")]
    HighlyCompetitive,
    #[serde(rename = "Good Standing")]
    GoodStanding,
    #[serde(rename = "Average")]
    Average,
    #[serde(rename = "Not Eligible")]
    NotEligible,
}

impl Band {
    /// Lower bounds are inclusive.
    pub fn from_composite(composite: f64) -> Self {
        if composite >= 80.0 {
            Band::Exceptional
        } else if composite >= 70.0 {
            Band::HighlyCompetitive
        } else if composite >= 60.0 {
            Band::GoodStanding
        } else if composite >= 50.0 {
            Band::Average
        } else {
            Band::NotEligible
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Band::Exceptional => "Exceptional",
            Band::HighlyCompetitive => "Highly Competitive",
            Band::GoodStanding => "Good Standing",
            Band::Average => "Average",
            Band::NotEligible => "Not Eligible",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Components {
    pub entrance_exam: f64,
    pub olevel: f64,
    pub secondary_exam: f64,
}

impl Components {
    pub fn total(&self) -> f64 {
        self.entrance_exam + self.olevel + self.secondary_exam
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub policy: Policy,
    pub components: Components,
    /// Rounded to two decimal places.
    pub composite: f64,
    pub band: Band,
}

impl Calculation {
    pub fn composite_display(&self) -> String {
        format!("{:.2}", self.composite)
    }

    pub fn is_zero(&self) -> bool {
        self.composite == 0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute the weighted aggregate for one candidate under `policy`.
pub fn calculate(policy: Policy, scores: ExamScores, grades: &SubjectGrades) -> Calculation {
    let scores = scores.clamped();
    let olevel_points = grades.total_points() as f64;

    let entrance_exam = (scores.entrance_exam / MAX_ENTRANCE_EXAM) * 50.0;
    let components = match policy {
        // Raw points are added as percentage points; five A1s land on 50.
        Policy::ExamOlevel => Components {
            entrance_exam,
            olevel: olevel_points,
            secondary_exam: 0.0,
        },
        Policy::ExamOlevelSecondary => Components {
            entrance_exam,
            olevel: (olevel_points / MAX_OLEVEL_POINTS as f64) * 20.0,
            secondary_exam: (scores.secondary_exam / MAX_SECONDARY_EXAM) * 30.0,
        },
        Policy::ExamSecondaryHeavy => Components {
            entrance_exam,
            olevel: 0.0,
            secondary_exam: (scores.secondary_exam / MAX_SECONDARY_EXAM) * 50.0,
        },
    };

    let total = components.total();
    let calculation = Calculation {
        policy,
        components,
        composite: round2(total),
        band: Band::from_composite(total),
    };
    tracing::trace!(
        policy = %policy,
        composite = calculation.composite,
        band = %calculation.band,
        "calculated aggregate"
    );
    calculation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::grade::{Grade, SUBJECT_COUNT};

    fn grades(grade: Grade) -> SubjectGrades {
        SubjectGrades::from_grades(&[grade; SUBJECT_COUNT]).unwrap()
    }

    #[test]
    fn test_standard_perfect_score() {
        let result = calculate(
            Policy::ExamOlevel,
            ExamScores::new(400.0, 0.0),
            &grades(Grade::A1),
        );
        assert_eq!(result.composite, 100.0);
        assert_eq!(result.composite_display(), "100.00");
        assert_eq!(result.band, Band::Exceptional);
    }

    #[test]
    fn test_secondary_heavy_ignores_grades() {
        for grade in [Grade::A1, Grade::C6, Grade::F9] {
            let result = calculate(
                Policy::ExamSecondaryHeavy,
                ExamScores::new(0.0, 0.0),
                &grades(grade),
            );
            assert_eq!(result.composite_display(), "0.00");
            assert_eq!(result.band, Band::NotEligible);
            assert!(result.is_zero());
        }
    }

    #[test]
    fn test_three_way_split() {
        let result = calculate(
            Policy::ExamOlevelSecondary,
            ExamScores::new(200.0, 50.0),
            &grades(Grade::C6),
        );
        assert_eq!(result.components.entrance_exam, 25.0);
        assert_eq!(result.components.olevel, 10.0);
        assert_eq!(result.components.secondary_exam, 15.0);
        assert_eq!(result.composite_display(), "50.00");
        assert_eq!(result.band, Band::Average);
    }

    #[test]
    fn test_standard_ignores_secondary_exam() {
        let result = calculate(
            Policy::ExamOlevel,
            ExamScores::new(200.0, 100.0),
            &grades(Grade::C6),
        );
        assert_eq!(result.components.secondary_exam, 0.0);
        assert_eq!(result.composite, 50.0);
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(Band::from_composite(80.0), Band::Exceptional);
        assert_eq!(Band::from_composite(79.99), Band::HighlyCompetitive);
        assert_eq!(Band::from_composite(70.0), Band::HighlyCompetitive);
        assert_eq!(Band::from_composite(69.99), Band::GoodStanding);
        assert_eq!(Band::from_composite(60.0), Band::GoodStanding);
        assert_eq!(Band::from_composite(50.0), Band::Average);
        assert_eq!(Band::from_composite(49.99), Band::NotEligible);
        assert_eq!(Band::from_composite(0.0), Band::NotEligible);
    }

    #[test]
    fn test_band_uses_unrounded_composite() {
        // 319.968 / 400 * 50 = 39.996, plus 40 O-level points
        let result = calculate(
            Policy::ExamOlevel,
            ExamScores::new(319.968, 0.0),
            &SubjectGrades::from_grades(&[Grade::A1, Grade::A1, Grade::A1, Grade::A1, Grade::F9])
                .unwrap(),
        );
        assert_eq!(result.composite_display(), "80.00");
        assert_eq!(result.band, Band::HighlyCompetitive);

        // 37.5 + 42.4975 = 79.9975
        let result = calculate(
            Policy::ExamSecondaryHeavy,
            ExamScores::new(300.0, 84.995),
            &grades(Grade::F9),
        );
        assert_eq!(result.composite_display(), "80.00");
        assert_eq!(result.band, Band::HighlyCompetitive);
    }

    #[test]
    fn test_components_bounded_by_weights() {
        let extremes = [
            ExamScores::new(-50.0, -10.0),
            ExamScores::new(0.0, 0.0),
            ExamScores::new(400.0, 100.0),
            ExamScores::new(9_999.0, 500.0),
            ExamScores::new(f64::NAN, f64::INFINITY),
        ];
        for policy in Policy::ALL {
            let weights = policy.weights();
            for scores in extremes {
                for grade in [Grade::A1, Grade::F9] {
                    let c = calculate(policy, scores, &grades(grade)).components;
                    assert!((0.0..=weights.entrance_exam).contains(&c.entrance_exam));
                    assert!((0.0..=weights.olevel).contains(&c.olevel));
                    assert!((0.0..=weights.secondary_exam).contains(&c.secondary_exam));
                }
            }
        }
    }

    #[test]
    fn test_parse_score_lenient() {
        assert_eq!(parse_score("250"), 250.0);
        assert_eq!(parse_score("  72.5 "), 72.5);
        assert_eq!(parse_score("250abc"), 250.0);
        assert_eq!(parse_score("1.2.3"), 1.2);
        assert_eq!(parse_score(""), 0.0);
        assert_eq!(parse_score("abc"), 0.0);
        assert_eq!(parse_score("-"), 0.0);
        assert_eq!(parse_score("."), 0.0);
        assert_eq!(parse_score("-20"), -20.0);
    }

    #[test]
    fn test_parse_score_exponent() {
        assert_eq!(parse_score("1e3"), 1000.0);
        assert_eq!(parse_score("2.5E+1"), 25.0);
        assert_eq!(parse_score("5e-1x"), 0.5);
        assert_eq!(parse_score("7e"), 7.0);
        assert_eq!(parse_score("7e+"), 7.0);

        let scores = ExamScores::parse("1e3", "");
        let result = calculate(Policy::ExamSecondaryHeavy, scores, &SubjectGrades::default());
        assert_eq!(result.components.entrance_exam, 50.0);
    }

    #[test]
    fn test_exam_scores_parse_feeds_calculation() {
        let scores = ExamScores::parse("oops", "");
        let result = calculate(Policy::ExamSecondaryHeavy, scores, &SubjectGrades::default());
        assert!(result.is_zero());
    }

    #[test]
    fn test_band_serde_uses_display_names() {
        let json = serde_json::to_string(&Band::HighlyCompetitive).unwrap();
        assert_eq!(json, "\"Highly Competitive\"");
        let back: Band = serde_json::from_str("\"Not Eligible\"").unwrap();
        assert_eq!(back, Band::NotEligible);
    }
}
