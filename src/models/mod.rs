pub mod preference;
pub mod session;
pub mod teacher;

pub use preference::{PreferenceRequest, PreferenceStatus, SessionPreference, SubmissionReceipt};
pub use session::{Grade, GradeId, GradeRecord, Session, SessionId, SessionRecord, SessionStatus};
pub use teacher::{Teacher, TeacherId, TeacherRecord, TeacherRole, DEFAULT_MAX_SESSIONS_PER_WEEK};
