pub mod directory;

pub use directory::{
    all, auto_spotlight, find, find_by_slug, search, Category, Institution, DEFAULT_SEARCH_LIMIT,
};
