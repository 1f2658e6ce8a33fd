pub mod store;
pub mod types;

pub use store::{HistoryStore, SaveOutcome, SaveRequest, SkipReason, HISTORY_KEY};
pub use types::{HistoryEntry, HistoryState, HISTORY_CAP};
