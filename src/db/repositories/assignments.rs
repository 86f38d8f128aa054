use std::collections::HashMap;

use anyhow::{bail, Result};
use chrono::Utc;
use rusqlite::{params, Connection};

use crate::{
    db::{repositories::teachers::teacher_exists, Database},
    models::{SessionId, TeacherId},
};

pub(crate) fn insert_assignment(
    conn: &Connection,
    teacher_id: TeacherId,
    session_id: SessionId,
) -> Result<bool> {
    // Unknown sessions select no row and are skipped.
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO assignments (teacher_id, session_id, assigned_at)
         SELECT ?1, id, ?2 FROM sessions WHERE id = ?3",
        params![teacher_id, Utc::now().to_rfc3339(), session_id],
    )?;
    Ok(inserted > 0)
}

impl Database {
    /// Links the teacher to each known session. Returns how many links are new.
    pub async fn assign_sessions(
        &self,
        teacher_id: TeacherId,
        session_ids: Vec<SessionId>,
    ) -> Result<usize> {
        self.execute(move |conn| {
            if !teacher_exists(conn, teacher_id)? {
                bail!("teacher {teacher_id} not found");
            }
            let tx = conn.transaction()?;
            let mut added = 0;
            for session_id in &session_ids {
                if insert_assignment(&tx, teacher_id, *session_id)? {
                    added += 1;
                }
            }
            tx.commit()?;
            Ok(added)
        })
        .await
    }

    pub async fn unassign_sessions(
        &self,
        teacher_id: TeacherId,
        session_ids: Vec<SessionId>,
    ) -> Result<usize> {
        self.execute(move |conn| {
            if !teacher_exists(conn, teacher_id)? {
                bail!("teacher {teacher_id} not found");
            }
            let tx = conn.transaction()?;
            let mut removed = 0;
            for session_id in &session_ids {
                removed += tx.execute(
                    "DELETE FROM assignments WHERE teacher_id = ?1 AND session_id = ?2",
                    params![teacher_id, session_id],
                )?;
            }
            tx.commit()?;
            Ok(removed)
        })
        .await
    }

    pub async fn assigned_session_ids(&self, teacher_id: TeacherId) -> Result<Vec<SessionId>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT a.session_id FROM assignments a
                 JOIN sessions s ON s.id = a.session_id
                 WHERE a.teacher_id = ?1
                 ORDER BY s.date ASC, s.start_time ASC, s.id ASC",
            )?;
            let ids = stmt
                .query_map(params![teacher_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<SessionId>>>()?;
            Ok(ids)
        })
        .await
    }

    pub async fn assignment_counts(&self) -> Result<HashMap<TeacherId, usize>> {
        self.execute(|conn| {
            let mut stmt = conn
                .prepare("SELECT teacher_id, COUNT(*) FROM assignments GROUP BY teacher_id")?;
            let mut rows = stmt.query([])?;
            let mut counts = HashMap::new();
            while let Some(row) = rows.next()? {
                let teacher_id: TeacherId = row.get(0)?;
                let count: i64 = row.get(1)?;
                counts.insert(teacher_id, usize::try_from(count).unwrap_or(0));
            }
            Ok(counts)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{SessionStatus, Teacher, TeacherRole},
        test_support::session,
    };

    async fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.upsert_teachers(vec![Teacher {
            id: 1,
            first_name: "Karim".into(),
            last_name: "Jebali".into(),
            email: String::new(),
            department: "Finance".into(),
            role: TeacherRole::Assistant,
            max_sessions_per_week: 8,
        }])
        .await
        .unwrap();
        db.upsert_sessions(vec![
            session(1, SessionStatus::Available, true),
            session(2, SessionStatus::Available, true),
        ])
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn assignment_is_idempotent_and_skips_unknown_sessions() {
        let db = seeded().await;
        assert_eq!(db.assign_sessions(1, vec![1, 2, 99]).await.unwrap(), 2);
        assert_eq!(db.assign_sessions(1, vec![1]).await.unwrap(), 0);
        assert_eq!(db.assigned_session_ids(1).await.unwrap(), vec![1, 2]);
        assert_eq!(db.assignment_counts().await.unwrap().get(&1), Some(&2));

        assert_eq!(db.unassign_sessions(1, vec![2, 99]).await.unwrap(), 1);
        assert_eq!(db.assigned_session_ids(1).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn unknown_teacher_is_an_error() {
        let db = seeded().await;
        assert!(db.assign_sessions(42, vec![1]).await.is_err());
    }
}
