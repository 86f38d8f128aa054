use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::{
    db::{
        helpers::{format_date, parse_date, parse_session_status, to_optional_u32},
        repositories::grades::write_grade,
        Database,
    },
    errors::NetworkError,
    models::{GradeRecord, Session, SessionId, SessionRecord},
    repository::SessionRepository,
    viewport::{DateRange, SessionFilter},
};

const SELECT_SESSIONS: &str = "SELECT s.id AS id, s.date AS date, s.start_time AS start_time,
        s.end_time AS end_time, s.subject AS subject,
        s.required_supervisors AS required_supervisors,
        s.current_supervisors AS current_supervisors,
        s.max_supervisors AS max_supervisors, s.location AS location,
        s.status AS status, s.available AS available,
        g.id AS grade_id, g.name AS grade_name, g.level AS grade_level,
        g.department AS grade_department
     FROM sessions s
     LEFT JOIN grades g ON g.id = s.grade_id";

fn row_to_record(row: &Row) -> Result<SessionRecord> {
    let date: String = row.get("date")?;
    let status: Option<String> = row.get("status")?;
    let grade_id: Option<i64> = row.get("grade_id")?;

    let grade = match grade_id {
        Some(id) => Some(GradeRecord {
            id,
            name: row.get("grade_name")?,
            level: row.get("grade_level")?,
            department: row.get("grade_department")?,
        }),
        None => None,
    };

    Ok(SessionRecord {
        id: row.get("id")?,
        date: parse_date(&date, "date")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        subject: row.get("subject")?,
        grade,
        required_supervisors: to_optional_u32(
            row.get("required_supervisors")?,
            "required_supervisors",
        )?,
        current_supervisors: to_optional_u32(
            row.get("current_supervisors")?,
            "current_supervisors",
        )?,
        max_supervisors: to_optional_u32(row.get("max_supervisors")?, "max_supervisors")?,
        location: row.get("location")?,
        status: status.as_deref().map(parse_session_status).transpose()?,
        available: row.get("available")?,
    })
}

fn row_to_session(row: &Row) -> Result<Session> {
    row_to_record(row)?.resolve()
}

fn collect_sessions(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Session>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(args)?;
    let mut sessions = Vec::new();
    while let Some(row) = rows.next()? {
        sessions.push(row_to_session(row)?);
    }
    Ok(sessions)
}

pub(crate) fn load_session(conn: &Connection, session_id: SessionId) -> Result<Option<Session>> {
    let sql = format!("{SELECT_SESSIONS} WHERE s.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![session_id])?;
    match rows.next()? {
        Some(row) => row_to_session(row).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn session_exists(conn: &Connection, session_id: SessionId) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM sessions WHERE id = ?1",
            params![session_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Writes the supervisor counters and derived state back after an assignment changed them.
pub(crate) fn write_session_occupancy(conn: &Connection, session: &Session) -> Result<()> {
    conn.execute(
        "UPDATE sessions
         SET required_supervisors = ?1,
             current_supervisors = ?2,
             max_supervisors = ?3,
             status = ?4,
             available = ?5
         WHERE id = ?6",
        params![
            session.required_supervisors,
            session.current_supervisors,
            session.max_supervisors,
            session.status.as_str(),
            session.available,
            session.id,
        ],
    )
    .with_context(|| format!("failed to update occupancy of session {}", session.id))?;
    Ok(())
}

fn write_session(conn: &Connection, session: &Session) -> Result<()> {
    let grade_id = if session.grade.id > 0 {
        write_grade(conn, &session.grade)?;
        Some(session.grade.id)
    } else {
        None
    };

    conn.execute(
        "INSERT INTO sessions (id, date, start_time, end_time, subject, grade_id,
             required_supervisors, current_supervisors, max_supervisors, location, status, available)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET
             date = excluded.date,
             start_time = excluded.start_time,
             end_time = excluded.end_time,
             subject = excluded.subject,
             grade_id = excluded.grade_id,
             required_supervisors = excluded.required_supervisors,
             current_supervisors = excluded.current_supervisors,
             max_supervisors = excluded.max_supervisors,
             location = excluded.location,
             status = excluded.status,
             available = excluded.available",
        params![
            session.id,
            format_date(session.date),
            session.start_time,
            session.end_time,
            session.subject,
            grade_id,
            session.required_supervisors,
            session.current_supervisors,
            session.max_supervisors,
            session.location,
            session.status.as_str(),
            session.available,
        ],
    )
    .with_context(|| format!("failed to write session {}", session.id))?;
    Ok(())
}

impl Database {
    pub async fn upsert_sessions(&self, sessions: Vec<Session>) -> Result<usize> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            for session in &sessions {
                write_session(&tx, session)?;
            }
            tx.commit()?;
            Ok(sessions.len())
        })
        .await
    }

    pub async fn get_session(&self, session_id: SessionId) -> Result<Option<Session>> {
        self.execute(move |conn| load_session(conn, session_id)).await
    }

    /// Sessions dated inside `range`, ordered by date, start time, then id.
    pub async fn list_sessions_between(&self, range: DateRange) -> Result<Vec<Session>> {
        self.execute(move |conn| {
            let sql = format!(
                "{SELECT_SESSIONS}
                 WHERE s.date BETWEEN ?1 AND ?2
                 ORDER BY s.date ASC, s.start_time ASC, s.id ASC"
            );
            collect_sessions(
                conn,
                &sql,
                params![format_date(range.start), format_date(range.end)],
            )
        })
        .await
    }

    pub async fn list_all_sessions(&self) -> Result<Vec<Session>> {
        self.execute(|conn| {
            let sql = format!("{SELECT_SESSIONS} ORDER BY s.date ASC, s.start_time ASC, s.id ASC");
            collect_sessions(conn, &sql, [])
        })
        .await
    }

    pub async fn count_sessions(&self) -> Result<usize> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
    }
}

#[async_trait]
impl SessionRepository for Database {
    async fn fetch(
        &self,
        range: DateRange,
        filter: &SessionFilter,
    ) -> Result<Vec<Session>, NetworkError> {
        let sessions = self.list_sessions_between(range).await?;
        Ok(sessions
            .into_iter()
            .filter(|session| filter.matches(session))
            .collect())
    }
}
