pub mod assignments;
pub mod grades;
pub mod preferences;
pub mod sessions;
pub mod teachers;
