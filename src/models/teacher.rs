use serde::{Deserialize, Serialize};

pub type TeacherId = i64;

/// Weekly cap used when a backend record does not carry one.
pub const DEFAULT_MAX_SESSIONS_PER_WEEK: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeacherRole {
    Professor,
    AssistantProfessor,
    Assistant,
    Admin,
}

impl TeacherRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeacherRole::Professor => "PROFESSOR",
            TeacherRole::AssistantProfessor => "ASSISTANT_PROFESSOR",
            TeacherRole::Assistant => "ASSISTANT",
            TeacherRole::Admin => "ADMIN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PROFESSOR" => Some(TeacherRole::Professor),
            "ASSISTANT_PROFESSOR" => Some(TeacherRole::AssistantProfessor),
            "ASSISTANT" => Some(TeacherRole::Assistant),
            "ADMIN" => Some(TeacherRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub role: TeacherRole,
    pub max_sessions_per_week: u32,
}

impl Teacher {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRecord {
    pub id: TeacherId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub role: Option<TeacherRole>,
    pub max_sessions_per_week: Option<u32>,
}

impl From<TeacherRecord> for Teacher {
    fn from(record: TeacherRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email.unwrap_or_default(),
            department: record.department.unwrap_or_default(),
            role: record.role.unwrap_or(TeacherRole::Assistant),
            max_sessions_per_week: record
                .max_sessions_per_week
                .filter(|max| *max > 0)
                .unwrap_or(DEFAULT_MAX_SESSIONS_PER_WEEK),
        }
    }
}
