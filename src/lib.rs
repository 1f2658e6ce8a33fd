pub mod ai;
pub mod browser;
pub mod chat;
pub mod config;
pub mod credentials;
pub mod history;
pub mod institutions;
pub mod logging;
pub mod news;
pub mod output;
pub mod scoring;
pub mod storage;
