//! Collaborator ports the calendar engine talks to.
//!
//! The engine only depends on these traits; the SQLite backend in [`crate::db`]
//! and the in-memory fakes used by tests both implement them.

use async_trait::async_trait;

use crate::{
    errors::NetworkError,
    models::{PreferenceRequest, Session, TeacherId},
    viewport::{DateRange, SessionFilter},
};

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Sessions whose date falls inside `range` (inclusive) and that match `filter`.
    async fn fetch(
        &self,
        range: DateRange,
        filter: &SessionFilter,
    ) -> Result<Vec<Session>, NetworkError>;
}

#[async_trait]
pub trait PreferenceApi: Send + Sync {
    async fn submit(
        &self,
        teacher_id: TeacherId,
        preferences: &[PreferenceRequest],
    ) -> Result<(), NetworkError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub teacher_id: TeacherId,
    pub token: Option<String>,
}

/// Where the command layer finds out who is signed in.
pub trait CredentialStore: Send + Sync {
    fn current(&self) -> Option<Credentials>;
}

/// Fixed credentials, for a process started on behalf of one teacher.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Option<Credentials>);

impl StaticCredentials {
    pub fn for_teacher(teacher_id: TeacherId) -> Self {
        Self(Some(Credentials {
            teacher_id,
            token: None,
        }))
    }
}

impl CredentialStore for StaticCredentials {
    fn current(&self) -> Option<Credentials> {
        self.0.clone()
    }
}
