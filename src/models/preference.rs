use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{SessionId, TeacherId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferenceStatus {
    Pending,
    Approved,
    Rejected,
}

impl PreferenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceStatus::Pending => "PENDING",
            PreferenceStatus::Approved => "APPROVED",
            PreferenceStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(PreferenceStatus::Pending),
            "APPROVED" => Some(PreferenceStatus::Approved),
            "REJECTED" => Some(PreferenceStatus::Rejected),
            _ => None,
        }
    }
}

/// One entry of a submission: what the teacher asks for and how badly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRequest {
    pub session_id: SessionId,
    /// 1 is the highest priority.
    pub priority: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionPreference {
    pub session_id: SessionId,
    pub priority: u32,
    pub status: PreferenceStatus,
}

/// Returned to the caller after the preference API accepted a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub teacher_id: TeacherId,
    pub preferences: Vec<PreferenceRequest>,
    pub submitted_at: DateTime<Utc>,
}
