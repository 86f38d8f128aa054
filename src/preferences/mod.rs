pub mod commands;
pub mod export;
pub mod submitter;

pub use submitter::{build_preferences, PreferenceSubmitter, PriorityPolicy, DEFAULT_PRIORITY_CAP};
