pub mod config;
pub mod db;
pub mod error;
pub mod keywords;
pub mod logging;
pub mod notes;
pub mod pipeline;
pub mod region;
pub mod tiles;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_DB: &str = "db_query";
