pub mod engine;
pub mod grade;
pub mod policy;

pub use engine::{calculate, parse_score, Band, Calculation, Components, ExamScores};
pub use grade::{Grade, SubjectGrade, SubjectGrades, MAX_OLEVEL_POINTS, SUBJECT_COUNT};
pub use policy::{Policy, PolicyTable, Weights};
