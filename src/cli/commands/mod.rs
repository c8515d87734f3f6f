//! CLI command implementations

pub mod add;
pub mod attach;
pub mod completions;
pub mod config;
pub mod delete;
pub mod edit;
pub mod export;
pub mod import;
pub mod init;
pub mod list;
pub mod search;
pub mod values;
