use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::{
    errors::{ErrorReport, PlannerError, PlannerResult, ValidationError},
    log_info, log_warn,
    models::{Session, SessionId, SessionStatus, SubmissionReceipt, TeacherId},
    preferences::PreferenceSubmitter,
    repository::SessionRepository,
    selection::{SelectionSet, ToggleOutcome},
    viewport::{DateRange, Direction, SessionFilter, ViewKind, ViewportState, WeekStart},
};

use super::{
    counts::{DayLoad, SessionCountIndex},
    interaction::{CalendarInteraction, InteractionOutcome},
    projector::{project_all, CalendarEvent},
};

const ENABLE_LOGS: bool = true;

pub type Clock = fn() -> NaiveDate;

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone, Copy)]
pub struct CalendarOptions {
    pub anchor: NaiveDate,
    pub view: ViewKind,
    pub week_start: WeekStart,
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self {
            anchor: local_today(),
            view: ViewKind::default(),
            week_start: WeekStart::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FetchOutcome {
    Applied { sessions: usize },
    /// A newer fetch was issued while this one was in flight; its result was dropped.
    Superseded,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CalendarStats {
    pub total_sessions: usize,
    pub available_sessions: usize,
    pub selected_count: usize,
    pub can_submit: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSnapshot {
    pub revision: u64,
    pub anchor: NaiveDate,
    pub view: ViewKind,
    pub view_name: &'static str,
    pub first_day: u8,
    pub filter: SessionFilter,
    pub visible_range: DateRange,
    pub loading: bool,
    pub events: Vec<CalendarEvent>,
    pub selected_ids: Vec<SessionId>,
    pub stats: CalendarStats,
    pub day_loads: Vec<DayLoad>,
    pub last_error: Option<ErrorReport>,
    pub last_submission: Option<SubmissionReceipt>,
}

struct CalendarState {
    viewport: ViewportState,
    selection: SelectionSet,
    sessions: Vec<Session>,
    events: Vec<CalendarEvent>,
    counts: SessionCountIndex,
    fetch_generation: u64,
    loading: bool,
    last_error: Option<ErrorReport>,
    last_submission: Option<SubmissionReceipt>,
    revision: u64,
}

impl CalendarState {
    fn new(options: CalendarOptions) -> Self {
        Self {
            viewport: ViewportState::new(options.anchor, options.view, options.week_start),
            selection: SelectionSet::new(),
            sessions: Vec::new(),
            events: Vec::new(),
            counts: SessionCountIndex::default(),
            fetch_generation: 0,
            loading: false,
            last_error: None,
            last_submission: None,
            revision: 0,
        }
    }

    fn session(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id == session_id)
    }

    fn reproject(&mut self) -> PlannerResult<()> {
        let selection = &self.selection;
        self.events = project_all(&self.sessions, |session| selection.is_selected(session))?;
        Ok(())
    }

    /// Starts a new fetch; any fetch still in flight becomes stale.
    fn begin_fetch(&mut self) -> (u64, DateRange, SessionFilter) {
        self.fetch_generation += 1;
        self.loading = true;
        (
            self.fetch_generation,
            self.viewport.visible_range(),
            self.viewport.filter().clone(),
        )
    }
}

/// One viewing session of the supervision calendar.
///
/// Cloning is cheap and every clone drives the same calendar. Each mutation publishes
/// exactly one [`CalendarSnapshot`] with a higher revision than the previous one.
#[derive(Clone)]
pub struct CalendarController {
    state: Arc<Mutex<CalendarState>>,
    repository: Arc<dyn SessionRepository>,
    submitter: PreferenceSubmitter,
    updates: Arc<watch::Sender<CalendarSnapshot>>,
    clock: Clock,
}

impl CalendarController {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        submitter: PreferenceSubmitter,
        options: CalendarOptions,
    ) -> Self {
        Self::with_clock(repository, submitter, options, local_today)
    }

    pub fn with_clock(
        repository: Arc<dyn SessionRepository>,
        submitter: PreferenceSubmitter,
        options: CalendarOptions,
        clock: Clock,
    ) -> Self {
        let state = CalendarState::new(options);
        let initial = build_snapshot(&state, &submitter, clock());
        let (updates, _) = watch::channel(initial);

        Self {
            state: Arc::new(Mutex::new(state)),
            repository,
            submitter,
            updates: Arc::new(updates),
            clock,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CalendarSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> CalendarSnapshot {
        self.updates.borrow().clone()
    }

    pub async fn visible_events(&self) -> Vec<CalendarEvent> {
        self.state.lock().await.events.clone()
    }

    pub async fn sessions(&self) -> Vec<Session> {
        self.state.lock().await.sessions.clone()
    }

    pub async fn selected_ids(&self) -> Vec<SessionId> {
        self.state.lock().await.selection.ordered_ids().to_vec()
    }

    /// Re-fetches the visible range with the current filter.
    pub async fn refresh(&self) -> PlannerResult<FetchOutcome> {
        self.mutate_viewport(|_| {}).await
    }

    pub async fn navigate(&self, direction: Direction) -> PlannerResult<FetchOutcome> {
        self.mutate_viewport(|viewport| viewport.navigate(direction))
            .await
    }

    pub async fn set_view(&self, view: ViewKind) -> PlannerResult<FetchOutcome> {
        self.mutate_viewport(|viewport| viewport.set_view(view)).await
    }

    pub async fn set_filter(&self, filter: SessionFilter) -> PlannerResult<FetchOutcome> {
        self.mutate_viewport(|viewport| viewport.set_filter(filter))
            .await
    }

    pub async fn set_anchor(&self, anchor: NaiveDate) -> PlannerResult<FetchOutcome> {
        self.mutate_viewport(|viewport| viewport.set_anchor(anchor))
            .await
    }

    pub async fn go_to_today(&self) -> PlannerResult<FetchOutcome> {
        let today = (self.clock)();
        self.set_anchor(today).await
    }

    pub async fn toggle_session(&self, session_id: SessionId) -> PlannerResult<ToggleOutcome> {
        let mut state = self.state.lock().await;
        let session = state
            .session(session_id)
            .cloned()
            .ok_or(ValidationError::UnknownSession { session_id })?;

        let outcome = state.selection.toggle(&session)?;
        state.reproject()?;
        state.last_error = None;
        self.publish(&mut state);
        Ok(outcome)
    }

    pub async fn clear_selection(&self) {
        let mut state = self.state.lock().await;
        state.selection.clear();
        if let Err(err) = state.reproject() {
            log_warn!("Re-projecting after clearing the selection failed: {}", err);
        }
        self.publish(&mut state);
    }

    pub async fn handle_interaction(
        &self,
        interaction: CalendarInteraction,
    ) -> PlannerResult<InteractionOutcome> {
        match interaction {
            CalendarInteraction::EventClick { session_id } => {
                let outcome = self.toggle_session(session_id).await?;
                Ok(InteractionOutcome::Toggled { outcome })
            }
            CalendarInteraction::DateClick { date } => {
                self.set_anchor(date).await?;
                Ok(InteractionOutcome::AnchorMoved { anchor: date })
            }
            other => {
                log_info!("Ignoring calendar interaction {}", other.name());
                Ok(InteractionOutcome::Ignored)
            }
        }
    }

    /// Submits the current selection ranked by selection order.
    ///
    /// On success the submitted sessions leave the selection and the receipt is kept in the
    /// snapshot.
    /// On failure the selection stays exactly as it was.
    pub async fn submit_preferences(
        &self,
        teacher_id: TeacherId,
    ) -> PlannerResult<SubmissionReceipt> {
        let ordered_ids = self.selected_ids().await;

        match self.submitter.submit(teacher_id, &ordered_ids).await {
            Ok(receipt) => {
                let mut state = self.state.lock().await;
                // Sessions toggled in while the request was in flight stay selected.
                state.selection.remove_all(&ordered_ids);
                if let Err(err) = state.reproject() {
                    log_warn!("Re-projecting after submission failed: {}", err);
                }
                state.last_submission = Some(receipt.clone());
                state.last_error = None;
                self.publish(&mut state);
                Ok(receipt)
            }
            Err(err) => {
                let mut state = self.state.lock().await;
                state.last_error = Some(ErrorReport::from(&err));
                self.publish(&mut state);
                Err(err)
            }
        }
    }

    async fn mutate_viewport<F>(&self, change: F) -> PlannerResult<FetchOutcome>
    where
        F: FnOnce(&mut ViewportState),
    {
        let (generation, range, filter) = {
            let mut state = self.state.lock().await;
            change(&mut state.viewport);
            let request = state.begin_fetch();
            self.publish(&mut state);
            request
        };

        let result = self.repository.fetch(range, &filter).await;
        self.apply_fetch(generation, result.map_err(PlannerError::from))
            .await
    }

    async fn apply_fetch(
        &self,
        generation: u64,
        result: PlannerResult<Vec<Session>>,
    ) -> PlannerResult<FetchOutcome> {
        let mut state = self.state.lock().await;

        if state.fetch_generation != generation {
            log_info!(
                "Discarding fetch {} superseded by fetch {}",
                generation,
                state.fetch_generation
            );
            return Ok(FetchOutcome::Superseded);
        }

        state.loading = false;

        let applied = result.and_then(|sessions| {
            let selection = &state.selection;
            let events = project_all(&sessions, |session| selection.is_selected(session))?;
            Ok((sessions, events))
        });

        match applied {
            Ok((sessions, events)) => {
                let count = sessions.len();
                state.counts.rebuild(&sessions);
                state.sessions = sessions;
                state.events = events;
                state.last_error = None;
                self.publish(&mut state);
                Ok(FetchOutcome::Applied { sessions: count })
            }
            Err(err) => {
                log_warn!(
                    "Fetch {} failed, keeping {} previously loaded session(s): {}",
                    generation,
                    state.sessions.len(),
                    err
                );
                state.last_error = Some(ErrorReport::from(&err));
                self.publish(&mut state);
                Err(err)
            }
        }
    }

    fn publish(&self, state: &mut CalendarState) {
        state.revision += 1;
        let snapshot = build_snapshot(state, &self.submitter, (self.clock)());
        self.updates.send_replace(snapshot);
    }
}

fn build_snapshot(
    state: &CalendarState,
    submitter: &PreferenceSubmitter,
    today: NaiveDate,
) -> CalendarSnapshot {
    let range = state.viewport.visible_range();
    let selected_count = state.selection.len();

    CalendarSnapshot {
        revision: state.revision,
        anchor: state.viewport.anchor(),
        view: state.viewport.view(),
        view_name: state.viewport.view().widget_name(),
        first_day: state.viewport.week_start().first_day_index(),
        filter: state.viewport.filter().clone(),
        visible_range: range,
        loading: state.loading,
        events: state.events.clone(),
        selected_ids: state.selection.ordered_ids().to_vec(),
        stats: CalendarStats {
            total_sessions: state.sessions.len(),
            available_sessions: state
                .sessions
                .iter()
                .filter(|session| session.status == SessionStatus::Available)
                .count(),
            selected_count,
            can_submit: submitter.accepts(selected_count),
        },
        day_loads: state.counts.day_loads(range, today),
        last_error: state.last_error.clone(),
        last_submission: state.last_submission.clone(),
    }
}
