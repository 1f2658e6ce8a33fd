use anyhow::Result;
use chrono::Utc;

use super::types::{HistoryEntry, HistoryState};
use crate::institutions::Institution;
use crate::scoring::Calculation;
use crate::storage::{get_json, set_json, Storage};

pub const HISTORY_KEY: &str = "campusai_calc_history";

/// Why a save request left the history untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoInstitution,
    NoCourse,
    ZeroComposite,
}

impl SkipReason {
    pub fn message(self) -> &'static str {
        match self {
            SkipReason::NoInstitution => "select a target university before saving",
            SkipReason::NoCourse => "specify a course before saving",
            SkipReason::ZeroComposite => "nothing to save: the aggregate is 0.00",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(HistoryEntry),
    Skipped(SkipReason),
}

/// What the calculator hands over when the user asks to save.
#[derive(Debug, Clone, Copy)]
pub struct SaveRequest<'a> {
    pub institution: Option<&'a Institution>,
    pub course: Option<&'a str>,
    pub calculation: &'a Calculation,
}

impl SaveRequest<'_> {
    /// Saving is only allowed with an institution, a course and a non-zero composite.
    pub fn check(&self) -> Result<(&Institution, &str), SkipReason> {
        let institution = self.institution.ok_or(SkipReason::NoInstitution)?;
        let course = self
            .course
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(SkipReason::NoCourse)?;
        if self.calculation.is_zero() {
            return Err(SkipReason::ZeroComposite);
        }
        Ok((institution, course))
    }
}

/// Saved calculations, read and written through a [`Storage`] port.
pub struct HistoryStore<S> {
    storage: S,
}

impl<S: Storage> HistoryStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    fn load(&self) -> Result<HistoryState> {
        Ok(get_json(&self.storage, HISTORY_KEY)?.unwrap_or_default())
    }

    fn store(&self, state: &HistoryState) -> Result<()> {
        set_json(&self.storage, HISTORY_KEY, state)
    }

    /// Saved entries, newest first.
    pub fn list(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.load()?.entries)
    }

    pub fn save(&self, request: SaveRequest<'_>) -> Result<SaveOutcome> {
        let (institution, course) = match request.check() {
            Ok(parts) => parts,
            Err(reason) => {
                tracing::debug!(?reason, "history save skipped");
                return Ok(SaveOutcome::Skipped(reason));
            }
        };

        let mut state = self.load()?;
        let now = Utc::now();
        let entry = HistoryEntry {
            id: state.next_id(now),
            university: institution.name.to_string(),
            course: course.to_string(),
            composite: request.calculation.composite,
            band: request.calculation.band,
            saved_at: now,
        };
        state.push_front(entry.clone());
        self.store(&state)?;

        tracing::info!(id = entry.id, university = %entry.university, "calculation saved");
        Ok(SaveOutcome::Saved(entry))
    }

    /// Returns true if an entry with `id` existed.
    pub fn delete(&self, id: u64) -> Result<bool> {
        let mut state = self.load()?;
        if !state.remove(id) {
            return Ok(false);
        }
        self.store(&state)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.delete(HISTORY_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HISTORY_CAP;
    use crate::institutions::find_by_slug;
    use crate::scoring::{calculate, ExamScores, Policy, SubjectGrades};
    use crate::storage::MemoryStorage;

    fn calc(exam: f64) -> Calculation {
        calculate(
            Policy::ExamOlevel,
            ExamScores::new(exam, 0.0),
            &SubjectGrades::default(),
        )
    }

    fn save(store: &HistoryStore<&MemoryStorage>, course: &str, exam: f64) -> SaveOutcome {
        let calculation = calc(exam);
        store
            .save(SaveRequest {
                institution: find_by_slug("unilag"),
                course: Some(course),
                calculation: &calculation,
            })
            .unwrap()
    }

    #[test]
    fn test_empty_history() {
        let storage = MemoryStorage::new();
        let store = HistoryStore::new(&storage);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_save_puts_newest_first() {
        let storage = MemoryStorage::new();
        let store = HistoryStore::new(&storage);

        save(&store, "Law", 200.0);
        save(&store, "Medicine and Surgery", 300.0);

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].course, "Medicine and Surgery");
        assert_eq!(entries[1].course, "Law");
        assert_eq!(entries[1].university, "University of Lagos");
        assert_eq!(entries[1].composite, 50.0);
    }

    #[test]
    fn test_history_capped_oldest_evicted() {
        let storage = MemoryStorage::new();
        let store = HistoryStore::new(&storage);

        for i in 0..=HISTORY_CAP {
            save(&store, &format!("Course {}", i), 100.0 + i as f64);
        }

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), HISTORY_CAP);
        assert_eq!(entries[0].course, format!("Course {}", HISTORY_CAP));
        assert!(entries.iter().all(|e| e.course != "Course 0"));
        assert_eq!(entries.last().unwrap().course, "Course 1");
    }

    #[test]
    fn test_save_without_institution_is_noop() {
        let storage = MemoryStorage::new();
        let store = HistoryStore::new(&storage);
        let calculation = calc(300.0);

        let outcome = store
            .save(SaveRequest {
                institution: None,
                course: Some("Law"),
                calculation: &calculation,
            })
            .unwrap();

        assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::NoInstitution));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_save_without_course_is_noop() {
        let storage = MemoryStorage::new();
        let store = HistoryStore::new(&storage);
        let calculation = calc(300.0);

        for course in [None, Some(""), Some("   ")] {
            let outcome = store
                .save(SaveRequest {
                    institution: find_by_slug("oau"),
                    course,
                    calculation: &calculation,
                })
                .unwrap();
            assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::NoCourse));
        }
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_save_zero_composite_is_noop() {
        let storage = MemoryStorage::new();
        let store = HistoryStore::new(&storage);
        let calculation = calculate(
            Policy::ExamSecondaryHeavy,
            ExamScores::new(0.0, 0.0),
            &SubjectGrades::default(),
        );

        let outcome = store
            .save(SaveRequest {
                institution: find_by_slug("ui"),
                course: Some("Law"),
                calculation: &calculation,
            })
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::ZeroComposite));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_by_id() {
        let storage = MemoryStorage::new();
        let store = HistoryStore::new(&storage);

        let SaveOutcome::Saved(first) = save(&store, "Law", 200.0) else {
            panic!("expected save");
        };
        save(&store, "Pharmacy", 250.0);

        assert!(store.delete(first.id).unwrap());
        assert!(!store.delete(first.id).unwrap());

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].course, "Pharmacy");
    }

    #[test]
    fn test_clear() {
        let storage = MemoryStorage::new();
        let store = HistoryStore::new(&storage);
        save(&store, "Law", 200.0);
        store.clear().unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_history_stored_as_array() {
        let storage = MemoryStorage::new();
        let store = HistoryStore::new(&storage);
        save(&store, "Law", 200.0);

        let raw = storage.get(HISTORY_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["course"], "Law");
    }

    #[test]
    fn test_reads_existing_array() {
        let storage = MemoryStorage::new();
        storage
            .set(
                HISTORY_KEY,
                r#"[{"id": 7, "university": "University of Ibadan", "course": "Law",
                    "composite": 61.5, "band": "Good Standing",
                    "saved_at": "2026-01-02T10:00:00Z"}]"#,
            )
            .unwrap();
        let store = HistoryStore::new(&storage);

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 7);
        assert!(store.delete(7).unwrap());
        assert!(store.list().unwrap().is_empty());
    }
}
