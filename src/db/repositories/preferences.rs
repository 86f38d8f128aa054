use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        helpers::parse_preference_status,
        repositories::{
            assignments::insert_assignment,
            sessions::{load_session, session_exists, write_session_occupancy},
            teachers::teacher_exists,
        },
        Database,
    },
    errors::NetworkError,
    log_info,
    models::{
        PreferenceRequest, PreferenceStatus, SessionId, SessionPreference, SessionStatus,
        TeacherId,
    },
    repository::PreferenceApi,
};

const ENABLE_LOGS: bool = true;

/// An administrator's answer to a pending preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferenceDecision {
    Approved,
    Rejected,
}

impl From<PreferenceDecision> for PreferenceStatus {
    fn from(decision: PreferenceDecision) -> Self {
        match decision {
            PreferenceDecision::Approved => PreferenceStatus::Approved,
            PreferenceDecision::Rejected => PreferenceStatus::Rejected,
        }
    }
}

enum StoreOutcome {
    Stored,
    UnknownTeacher,
    UnknownSessions(Vec<SessionId>),
    AlreadyDecided(Vec<SessionId>),
}

fn row_to_preference(row: &Row) -> Result<SessionPreference> {
    let status: String = row.get("status")?;
    Ok(SessionPreference {
        session_id: row.get("session_id")?,
        priority: row.get("priority")?,
        status: parse_preference_status(&status)?,
    })
}

fn join_ids(ids: &[SessionId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Database {
    async fn store_preferences(
        &self,
        teacher_id: TeacherId,
        preferences: Vec<PreferenceRequest>,
    ) -> Result<StoreOutcome> {
        self.execute(move |conn| {
            if !teacher_exists(conn, teacher_id)? {
                return Ok(StoreOutcome::UnknownTeacher);
            }

            let mut unknown = Vec::new();
            let mut decided = Vec::new();
            for preference in &preferences {
                if !session_exists(conn, preference.session_id)? {
                    unknown.push(preference.session_id);
                    continue;
                }
                let status: Option<String> = conn
                    .query_row(
                        "SELECT status FROM preferences WHERE teacher_id = ?1 AND session_id = ?2",
                        params![teacher_id, preference.session_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(status) = status {
                    if parse_preference_status(&status)? != PreferenceStatus::Pending {
                        decided.push(preference.session_id);
                    }
                }
            }
            if !unknown.is_empty() {
                return Ok(StoreOutcome::UnknownSessions(unknown));
            }
            if !decided.is_empty() {
                return Ok(StoreOutcome::AlreadyDecided(decided));
            }

            let submitted_at = Utc::now().to_rfc3339();
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM preferences WHERE teacher_id = ?1 AND status = 'PENDING'",
                params![teacher_id],
            )?;
            for preference in &preferences {
                tx.execute(
                    "INSERT INTO preferences (teacher_id, session_id, priority, status, submitted_at)
                     VALUES (?1, ?2, ?3, 'PENDING', ?4)",
                    params![
                        teacher_id,
                        preference.session_id,
                        preference.priority,
                        submitted_at
                    ],
                )
                .with_context(|| {
                    format!("failed to store preference for session {}", preference.session_id)
                })?;
            }
            tx.commit()?;
            Ok(StoreOutcome::Stored)
        })
        .await
    }

    pub async fn list_preferences(&self, teacher_id: TeacherId) -> Result<Vec<SessionPreference>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, priority, status FROM preferences
                 WHERE teacher_id = ?1
                 ORDER BY CASE status WHEN 'PENDING' THEN 0 WHEN 'APPROVED' THEN 1 ELSE 2 END,
                          priority ASC, session_id ASC",
            )?;
            let mut rows = stmt.query(params![teacher_id])?;
            let mut preferences = Vec::new();
            while let Some(row) = rows.next()? {
                preferences.push(row_to_preference(row)?);
            }
            Ok(preferences)
        })
        .await
    }

    /// Removes a pending preference. Decided preferences stay; returns whether a row went away.
    pub async fn withdraw_preference(
        &self,
        teacher_id: TeacherId,
        session_id: SessionId,
    ) -> Result<bool> {
        self.execute(move |conn| {
            let removed = conn.execute(
                "DELETE FROM preferences
                 WHERE teacher_id = ?1 AND session_id = ?2 AND status = 'PENDING'",
                params![teacher_id, session_id],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    pub async fn pending_preference_count(&self) -> Result<usize> {
        self.execute(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM preferences WHERE status = 'PENDING'",
                [],
                |row| row.get(0),
            )?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
    }

    /// Settles a pending preference.
    ///
    /// Approving assigns the teacher, takes one supervisor slot and re-derives the session
    /// status from the new counts. Cancelled sessions keep their status, and a session that
    /// reaches its maximum stops being available.
    pub async fn decide_preference(
        &self,
        teacher_id: TeacherId,
        session_id: SessionId,
        decision: PreferenceDecision,
    ) -> Result<SessionPreference> {
        let preference = self
            .execute(move |conn| {
                let tx = conn.transaction()?;

                let existing = tx
                    .query_row(
                        "SELECT session_id, priority, status FROM preferences
                         WHERE teacher_id = ?1 AND session_id = ?2",
                        params![teacher_id, session_id],
                        |row| Ok(row_to_preference(row)),
                    )
                    .optional()?
                    .transpose()?
                    .ok_or_else(|| {
                        anyhow!("teacher {teacher_id} has no preference for session {session_id}")
                    })?;

                if existing.status != PreferenceStatus::Pending {
                    bail!(
                        "preference of teacher {teacher_id} for session {session_id} is already {}",
                        existing.status.as_str()
                    );
                }

                if decision == PreferenceDecision::Approved {
                    let mut session = load_session(&tx, session_id)?
                        .ok_or_else(|| anyhow!("session {session_id} not found"))?;
                    if session.current_supervisors >= session.max_supervisors {
                        bail!("session {session_id} already has its maximum of supervisors");
                    }

                    session.current_supervisors += 1;
                    if session.status != SessionStatus::Cancelled {
                        session.status = SessionStatus::from_counts(
                            session.current_supervisors,
                            session.required_supervisors,
                            session.max_supervisors,
                        );
                    }
                    if session.current_supervisors >= session.max_supervisors {
                        session.available = false;
                    }

                    write_session_occupancy(&tx, &session)?;
                    insert_assignment(&tx, teacher_id, session_id)?;
                }

                let status = PreferenceStatus::from(decision);
                tx.execute(
                    "UPDATE preferences SET status = ?1, decided_at = ?2
                     WHERE teacher_id = ?3 AND session_id = ?4",
                    params![status.as_str(), Utc::now().to_rfc3339(), teacher_id, session_id],
                )?;
                tx.commit()?;

                Ok(SessionPreference {
                    status,
                    ..existing
                })
            })
            .await?;

        log_info!(
            "Preference of teacher {} for session {} marked {}",
            teacher_id,
            session_id,
            preference.status.as_str()
        );
        Ok(preference)
    }
}

#[async_trait]
impl PreferenceApi for Database {
    async fn submit(
        &self,
        teacher_id: TeacherId,
        preferences: &[PreferenceRequest],
    ) -> Result<(), NetworkError> {
        match self
            .store_preferences(teacher_id, preferences.to_vec())
            .await?
        {
            StoreOutcome::Stored => Ok(()),
            StoreOutcome::UnknownTeacher => Err(NetworkError::Rejected(format!(
                "teacher {teacher_id} not found"
            ))),
            StoreOutcome::UnknownSessions(ids) => Err(NetworkError::Rejected(format!(
                "unknown session(s): {}",
                join_ids(&ids)
            ))),
            StoreOutcome::AlreadyDecided(ids) => Err(NetworkError::Rejected(format!(
                "preference already decided for session(s): {}",
                join_ids(&ids)
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Teacher, TeacherRole},
        test_support::session,
    };

    fn request(session_id: SessionId, priority: u32) -> PreferenceRequest {
        PreferenceRequest {
            session_id,
            priority,
        }
    }

    async fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.upsert_teachers(vec![Teacher {
            id: 1,
            first_name: "Fatma".into(),
            last_name: "Khelil".into(),
            email: String::new(),
            department: "Gestion".into(),
            role: TeacherRole::AssistantProfessor,
            max_sessions_per_week: 8,
        }])
        .await
        .unwrap();

        // required 2, current 1, max 3
        db.upsert_sessions(vec![
            session(1, SessionStatus::Available, true),
            session(2, SessionStatus::Available, true),
            session(3, SessionStatus::Cancelled, true),
        ])
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn submission_replaces_pending_preferences() {
        let db = seeded().await;
        db.submit(1, &[request(1, 1), request(2, 2)]).await.unwrap();
        db.submit(1, &[request(2, 1)]).await.unwrap();

        let stored = db.list_preferences(1).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].session_id, 2);
        assert_eq!(stored[0].priority, 1);
        assert_eq!(stored[0].status, PreferenceStatus::Pending);
        assert_eq!(db.pending_preference_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_sessions_reject_the_whole_submission() {
        let db = seeded().await;
        db.submit(1, &[request(1, 1)]).await.unwrap();

        let err = db.submit(1, &[request(2, 1), request(77, 2)]).await.unwrap_err();
        assert!(matches!(err, NetworkError::Rejected(ref msg) if msg.contains("77")));

        let stored = db.list_preferences(1).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].session_id, 1);
    }

    #[tokio::test]
    async fn unknown_teacher_is_rejected() {
        let db = seeded().await;
        let err = db.submit(9, &[request(1, 1)]).await.unwrap_err();
        assert_eq!(err.code(), "network.rejected");
    }

    #[tokio::test]
    async fn approval_takes_a_slot_and_updates_status() {
        let db = seeded().await;
        db.submit(1, &[request(1, 1)]).await.unwrap();

        let decided = db
            .decide_preference(1, 1, PreferenceDecision::Approved)
            .await
            .unwrap();
        assert_eq!(decided.status, PreferenceStatus::Approved);

        let session = db.get_session(1).await.unwrap().unwrap();
        assert_eq!(session.current_supervisors, 2);
        assert_eq!(session.status, SessionStatus::Saturated);
        assert!(session.available);
        assert_eq!(db.assigned_session_ids(1).await.unwrap(), vec![1]);

        assert!(db
            .decide_preference(1, 1, PreferenceDecision::Rejected)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn reaching_the_maximum_closes_the_session() {
        let db = seeded().await;
        db.execute(|conn| {
            conn.execute(
                "UPDATE sessions SET current_supervisors = 2, status = 'SATURATED' WHERE id = 2",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();
        db.submit(1, &[request(2, 1)]).await.unwrap();
        db.decide_preference(1, 2, PreferenceDecision::Approved)
            .await
            .unwrap();

        let session = db.get_session(2).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Full);
        assert!(!session.available);
    }

    #[tokio::test]
    async fn cancelled_status_survives_approval() {
        let db = seeded().await;
        db.submit(1, &[request(3, 1)]).await.unwrap();
        db.decide_preference(1, 3, PreferenceDecision::Approved)
            .await
            .unwrap();
        let session = db.get_session(3).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Cancelled);
        assert_eq!(session.current_supervisors, 2);
    }

    #[tokio::test]
    async fn decided_preferences_cannot_be_resubmitted_or_withdrawn() {
        let db = seeded().await;
        db.submit(1, &[request(1, 1), request(2, 2)]).await.unwrap();
        db.decide_preference(1, 1, PreferenceDecision::Rejected)
            .await
            .unwrap();

        assert!(!db.withdraw_preference(1, 1).await.unwrap());
        assert!(db.withdraw_preference(1, 2).await.unwrap());

        let err = db.submit(1, &[request(1, 1)]).await.unwrap_err();
        assert!(matches!(err, NetworkError::Rejected(_)));

        let stored = db.list_preferences(1).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, PreferenceStatus::Rejected);
    }
}
