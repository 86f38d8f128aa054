use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{PlannerResult, ValidationError},
    log_error, log_info,
    models::{PreferenceRequest, SessionId, SubmissionReceipt, TeacherId},
    repository::PreferenceApi,
};

const ENABLE_LOGS: bool = true;

pub const DEFAULT_PRIORITY_CAP: u32 = 5;

/// What to do with selections ranked past the priority cap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriorityPolicy {
    /// Refuse the whole submission.
    #[default]
    Reject,
    /// Everything past the cap shares the lowest priority.
    Clamp,
    /// No cap at all.
    Extend,
}

/// Ranks `ordered_ids` by position: the first pick gets priority 1.
pub fn build_preferences(
    ordered_ids: &[SessionId],
    policy: PriorityPolicy,
    cap: u32,
) -> Result<Vec<PreferenceRequest>, ValidationError> {
    if ordered_ids.is_empty() {
        return Err(ValidationError::EmptySelection);
    }

    if policy == PriorityPolicy::Reject && ordered_ids.len() > cap as usize {
        return Err(ValidationError::PriorityOutOfRange {
            selected: ordered_ids.len(),
            cap,
        });
    }

    Ok(ordered_ids
        .iter()
        .enumerate()
        .map(|(index, session_id)| {
            let rank = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let priority = match policy {
                PriorityPolicy::Clamp => rank.min(cap.max(1)),
                PriorityPolicy::Reject | PriorityPolicy::Extend => rank,
            };
            PreferenceRequest {
                session_id: *session_id,
                priority,
            }
        })
        .collect())
}

/// Releases the teacher's in-flight slot when dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<TeacherId>>,
    teacher_id: TeacherId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.in_flight.lock() {
            guard.remove(&self.teacher_id);
        }
    }
}

#[derive(Clone)]
pub struct PreferenceSubmitter {
    api: Arc<dyn PreferenceApi>,
    policy: PriorityPolicy,
    cap: u32,
    in_flight: Arc<Mutex<HashSet<TeacherId>>>,
}

impl PreferenceSubmitter {
    pub fn new(api: Arc<dyn PreferenceApi>, policy: PriorityPolicy, cap: u32) -> Self {
        Self {
            api,
            policy,
            cap,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn policy(&self) -> PriorityPolicy {
        self.policy
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Whether a selection of `count` sessions would pass validation.
    pub fn accepts(&self, count: usize) -> bool {
        count > 0 && (self.policy != PriorityPolicy::Reject || count <= self.cap as usize)
    }

    pub fn is_in_flight(&self, teacher_id: TeacherId) -> bool {
        self.in_flight
            .lock()
            .map(|guard| guard.contains(&teacher_id))
            .unwrap_or(false)
    }

    /// Sends one ranked submission. At most one submission per teacher runs at a time,
    /// and nothing is retried.
    pub async fn submit(
        &self,
        teacher_id: TeacherId,
        ordered_ids: &[SessionId],
    ) -> PlannerResult<SubmissionReceipt> {
        let preferences = build_preferences(ordered_ids, self.policy, self.cap)?;
        let _guard = self.acquire(teacher_id)?;

        if let Err(err) = self.api.submit(teacher_id, &preferences).await {
            log_error!(
                "Preference submission for teacher {} failed: {}",
                teacher_id,
                err
            );
            return Err(err.into());
        }

        log_info!(
            "Submitted {} preference(s) for teacher {}",
            preferences.len(),
            teacher_id
        );

        Ok(SubmissionReceipt {
            id: Uuid::new_v4(),
            teacher_id,
            preferences,
            submitted_at: Utc::now(),
        })
    }

    fn acquire(&self, teacher_id: TeacherId) -> Result<InFlightGuard<'_>, ValidationError> {
        let mut guard = self
            .in_flight
            .lock()
            .map_err(|_| ValidationError::SubmissionInProgress { teacher_id })?;
        if !guard.insert(teacher_id) {
            return Err(ValidationError::SubmissionInProgress { teacher_id });
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            teacher_id,
        })
    }
}
