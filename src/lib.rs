pub mod config;
pub mod dashboard;
pub mod directory;
pub mod logging;
pub mod news_client;
pub mod rating;
pub mod sentiment;
