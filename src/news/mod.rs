pub mod desk;
pub mod types;

pub use desk::{
    merge_with_live, source_link, NewsDesk, JAMB_PORTAL_URL, LAST_SYNC_KEY, LIVE_NEWS_KEY,
    PUBLISHED_NEWS_KEY,
};
pub use types::{NewsCategory, NewsDraft, NewsItem};
