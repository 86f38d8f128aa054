//! Administrator views over teachers and sessions.

pub mod commands;

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{
    db::Database,
    models::{Session, SessionStatus, Teacher, TeacherId},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadBucket {
    /// Below half of the weekly cap.
    Available,
    Assigned,
    /// At or above the weekly cap.
    Busy,
}

impl WorkloadBucket {
    pub fn classify(assigned: usize, max_per_week: u32) -> Self {
        let max = max_per_week as usize;
        if assigned >= max {
            WorkloadBucket::Busy
        } else if assigned * 2 >= max {
            WorkloadBucket::Assigned
        } else {
            WorkloadBucket::Available
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkloadFilter {
    pub search: Option<String>,
    pub department: Option<String>,
    pub bucket: Option<WorkloadBucket>,
}

impl WorkloadFilter {
    fn matches(&self, teacher: &Teacher, bucket: WorkloadBucket) -> bool {
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = [&teacher.first_name, &teacher.last_name, &teacher.department]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        if let Some(department) = &self.department {
            if &teacher.department != department {
                return false;
            }
        }
        self.bucket.map_or(true, |wanted| wanted == bucket)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeacherWorkload {
    pub teacher: Teacher,
    pub assigned_sessions: usize,
    /// Percent of the weekly cap, capped at 100.
    pub utilisation: f64,
    pub bucket: WorkloadBucket,
}

pub fn utilisation(assigned: usize, max_per_week: u32) -> f64 {
    let max = f64::from(max_per_week.max(1));
    (assigned as f64 / max * 100.0).min(100.0)
}

pub fn build_workloads(
    teachers: &[Teacher],
    counts: &HashMap<TeacherId, usize>,
    filter: &WorkloadFilter,
) -> Vec<TeacherWorkload> {
    teachers
        .iter()
        .filter_map(|teacher| {
            let assigned = counts.get(&teacher.id).copied().unwrap_or(0);
            let bucket = WorkloadBucket::classify(assigned, teacher.max_sessions_per_week);
            filter.matches(teacher, bucket).then(|| TeacherWorkload {
                teacher: teacher.clone(),
                assigned_sessions: assigned,
                utilisation: utilisation(assigned, teacher.max_sessions_per_week),
                bucket,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusCounts {
    pub available: usize,
    pub saturated: usize,
    pub full: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_sessions: usize,
    pub sessions_by_status: SessionStatusCounts,
    pub total_teachers: usize,
    pub assigned_sessions: usize,
    pub pending_preferences: usize,
}

pub fn count_statuses(sessions: &[Session]) -> SessionStatusCounts {
    let mut counts = SessionStatusCounts::default();
    for session in sessions {
        match session.status {
            SessionStatus::Available => counts.available += 1,
            SessionStatus::Saturated => counts.saturated += 1,
            SessionStatus::Full => counts.full += 1,
            SessionStatus::Cancelled => counts.cancelled += 1,
        }
    }
    counts
}

impl Database {
    pub async fn teacher_workloads(&self, filter: &WorkloadFilter) -> Result<Vec<TeacherWorkload>> {
        let teachers = self.list_teachers().await?;
        let counts = self.assignment_counts().await?;
        Ok(build_workloads(&teachers, &counts, filter))
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let sessions = self.list_all_sessions().await?;
        let teachers = self.list_teachers().await?;
        let assignments = self.assignment_counts().await?;
        let pending_preferences = self.pending_preference_count().await?;

        Ok(DashboardStats {
            total_sessions: sessions.len(),
            sessions_by_status: count_statuses(&sessions),
            total_teachers: teachers.len(),
            assigned_sessions: assignments.values().sum(),
            pending_preferences,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TeacherRole;

    fn teacher(id: TeacherId, first: &str, department: &str, max: u32) -> Teacher {
        Teacher {
            id,
            first_name: first.into(),
            last_name: "Test".into(),
            email: String::new(),
            department: department.into(),
            role: TeacherRole::Professor,
            max_sessions_per_week: max,
        }
    }

    #[test]
    fn buckets_follow_half_and_full_cap() {
        assert_eq!(WorkloadBucket::classify(4, 10), WorkloadBucket::Available);
        assert_eq!(WorkloadBucket::classify(5, 10), WorkloadBucket::Assigned);
        assert_eq!(WorkloadBucket::classify(9, 10), WorkloadBucket::Assigned);
        assert_eq!(WorkloadBucket::classify(10, 10), WorkloadBucket::Busy);
        assert_eq!(WorkloadBucket::classify(12, 10), WorkloadBucket::Busy);
    }

    #[test]
    fn utilisation_is_capped() {
        assert_eq!(utilisation(3, 10), 30.0);
        assert_eq!(utilisation(12, 8), 100.0);
    }

    #[test]
    fn filters_combine() {
        let teachers = vec![
            teacher(1, "Ahmed", "Économie", 10),
            teacher(2, "Fatma", "Gestion", 8),
            teacher(3, "Salma", "Gestion", 10),
        ];
        let counts = HashMap::from([(1, 3), (2, 8), (3, 6)]);

        let all = build_workloads(&teachers, &counts, &WorkloadFilter::default());
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].bucket, WorkloadBucket::Busy);

        let gestion_busy = build_workloads(
            &teachers,
            &counts,
            &WorkloadFilter {
                department: Some("Gestion".into()),
                bucket: Some(WorkloadBucket::Busy),
                ..Default::default()
            },
        );
        assert_eq!(gestion_busy.len(), 1);
        assert_eq!(gestion_busy[0].teacher.id, 2);

        let search = build_workloads(
            &teachers,
            &counts,
            &WorkloadFilter {
                search: Some("  écon ".into()),
                ..Default::default()
            },
        );
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].teacher.id, 1);
    }
}
