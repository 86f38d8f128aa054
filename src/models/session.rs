use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type SessionId = i64;
pub type GradeId = i64;

const DEFAULT_SUBJECT: &str = "Untitled session";
const DEFAULT_REQUIRED_SUPERVISORS: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Available,
    Saturated,
    Full,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Available => "AVAILABLE",
            SessionStatus::Saturated => "SATURATED",
            SessionStatus::Full => "FULL",
            SessionStatus::Cancelled => "CANCELLED",
        }
    }

    /// Case-insensitive; accepts the lowercase tags used in class names too.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Some(SessionStatus::Available),
            "SATURATED" => Some(SessionStatus::Saturated),
            "FULL" => Some(SessionStatus::Full),
            "CANCELLED" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }

    /// Status implied by supervisor counts. Cancelled sessions never come out of this.
    pub fn from_counts(current: u32, required: u32, max: u32) -> Self {
        if current >= max {
            SessionStatus::Full
        } else if current >= required {
            SessionStatus::Saturated
        } else {
            SessionStatus::Available
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: GradeId,
    pub name: String,
    pub level: String,
    pub department: String,
}

/// A supervision session as the engine sees it: every field resolved, nothing optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub date: NaiveDate,
    /// Wall-clock `HH:MM`. Kept verbatim so malformed backend data surfaces at projection.
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    pub grade: Grade,
    pub required_supervisors: u32,
    pub current_supervisors: u32,
    pub max_supervisors: u32,
    pub location: String,
    pub status: SessionStatus,
    pub available: bool,
}

impl Session {
    pub fn is_selectable(&self) -> bool {
        self.available && self.status != SessionStatus::Full
    }

    pub fn has_enough_supervisors(&self) -> bool {
        self.current_supervisors >= self.required_supervisors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    pub id: GradeId,
    pub name: String,
    pub level: Option<String>,
    pub department: Option<String>,
}

impl From<GradeRecord> for Grade {
    fn from(record: GradeRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            level: record.level.unwrap_or_default(),
            department: record.department.unwrap_or_default(),
        }
    }
}

/// Session as delivered by a backend or fixture, with the gaps the backend is allowed to leave.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionId,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub subject: Option<String>,
    pub grade: Option<GradeRecord>,
    pub required_supervisors: Option<u32>,
    pub current_supervisors: Option<u32>,
    pub max_supervisors: Option<u32>,
    pub location: Option<String>,
    pub status: Option<SessionStatus>,
    pub available: Option<bool>,
}

impl SessionRecord {
    /// Fill defaults once so nothing downstream branches on missing fields.
    pub fn resolve(self) -> Result<Session> {
        let required = self
            .required_supervisors
            .unwrap_or(DEFAULT_REQUIRED_SUPERVISORS);
        let current = self.current_supervisors.unwrap_or(0);
        let max = self.max_supervisors.unwrap_or_else(|| required.max(current));

        if current > max {
            bail!(
                "session {} has {current} supervisors but a maximum of {max}",
                self.id
            );
        }

        let status = self
            .status
            .unwrap_or_else(|| SessionStatus::from_counts(current, required, max));

        if status == SessionStatus::Full && current < required {
            bail!(
                "session {} is FULL with only {current}/{required} supervisors",
                self.id
            );
        }

        let available = self.available.unwrap_or(matches!(
            status,
            SessionStatus::Available | SessionStatus::Saturated
        ));

        let grade = match self.grade {
            Some(record) => Grade::from(record),
            None => Grade {
                id: 0,
                name: "Unassigned".into(),
                level: String::new(),
                department: String::new(),
            },
        };

        Ok(Session {
            id: self.id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            subject: self
                .subject
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUBJECT.into()),
            grade,
            required_supervisors: required,
            current_supervisors: current,
            max_supervisors: max,
            location: self.location.unwrap_or_default(),
            status,
            available,
        })
    }
}
