use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{GradeId, Session, SessionStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum ViewKind {
    #[default]
    Month,
    Week,
    Day,
    List,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [ViewKind::Month, ViewKind::Week, ViewKind::Day, ViewKind::List];

    /// Accepts short names as well as the calendar widget's view identifiers.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "month" | "Month" | "dayGridMonth" => Some(ViewKind::Month),
            "week" | "Week" | "timeGridWeek" => Some(ViewKind::Week),
            "day" | "Day" | "timeGridDay" => Some(ViewKind::Day),
            "list" | "List" | "listWeek" => Some(ViewKind::List),
            _ => None,
        }
    }

    pub fn widget_name(&self) -> &'static str {
        match self {
            ViewKind::Month => "dayGridMonth",
            ViewKind::Week => "timeGridWeek",
            ViewKind::Day => "timeGridDay",
            ViewKind::List => "listWeek",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ViewKind::Month => "Month",
            ViewKind::Week => "Week",
            ViewKind::Day => "Day",
            ViewKind::List => "List",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "prev" | "Prev" | "previous" => Some(Direction::Prev),
            "next" | "Next" => Some(Direction::Next),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    fn days_into_week(&self, date: NaiveDate) -> u64 {
        let weekday = date.weekday();
        u64::from(match self {
            WeekStart::Sunday => weekday.num_days_from_sunday(),
            WeekStart::Monday => weekday.num_days_from_monday(),
        })
    }

    /// Index of the first day as calendar widgets expect it (Sunday = 0).
    pub fn first_day_index(&self) -> u8 {
        match self {
            WeekStart::Sunday => 0,
            WeekStart::Monday => 1,
        }
    }
}

/// The subset of sessions a viewport asks the repository for.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionFilter {
    pub status: Option<SessionStatus>,
    pub department: Option<String>,
    pub grade_id: Option<GradeId>,
    pub available_only: bool,
}

impl SessionFilter {
    pub fn matches(&self, session: &Session) -> bool {
        if let Some(status) = self.status {
            if session.status != status {
                return false;
            }
        }
        if let Some(department) = &self.department {
            if &session.grade.department != department {
                return false;
            }
        }
        if let Some(grade_id) = self.grade_id {
            if session.grade.id != grade_id {
                return false;
            }
        }
        !self.available_only || session.available
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The day after `end`, for consumers that want a half-open interval.
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end.succ_opt().unwrap_or(self.end)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

fn add_days(date: NaiveDate, direction: Direction, days: u64) -> NaiveDate {
    let step = Days::new(days);
    match direction {
        Direction::Next => date.checked_add_days(step),
        Direction::Prev => date.checked_sub_days(step),
    }
    .unwrap_or(date)
}

/// Moves `date` by one unit of `view`. Month steps clamp the day of month (Jan 31 → Feb 29).
pub fn navigate_date(date: NaiveDate, direction: Direction, view: ViewKind) -> NaiveDate {
    match view {
        ViewKind::Month => match direction {
            Direction::Next => date.checked_add_months(Months::new(1)),
            Direction::Prev => date.checked_sub_months(Months::new(1)),
        }
        .unwrap_or(date),
        ViewKind::Day => add_days(date, direction, 1),
        ViewKind::Week | ViewKind::List => add_days(date, direction, 7),
    }
}

/// Same as [`navigate_date`] for a granularity given by name; unknown names step by a week.
pub fn navigate_by_name(date: NaiveDate, direction: Direction, granularity: &str) -> NaiveDate {
    navigate_date(
        date,
        direction,
        ViewKind::parse(granularity).unwrap_or(ViewKind::Week),
    )
}

pub fn compute_visible_range(date: NaiveDate, view: ViewKind) -> DateRange {
    compute_visible_range_with(date, view, WeekStart::Sunday)
}

pub fn compute_visible_range_with(
    date: NaiveDate,
    view: ViewKind,
    week_start: WeekStart,
) -> DateRange {
    match view {
        ViewKind::Month => {
            let start = date - Days::new(u64::from(date.day0()));
            let end = start
                .checked_add_months(Months::new(1))
                .and_then(|next| next.pred_opt())
                .unwrap_or(NaiveDate::MAX);
            DateRange { start, end }
        }
        ViewKind::Week | ViewKind::List => {
            let start = date
                .checked_sub_days(Days::new(week_start.days_into_week(date)))
                .unwrap_or(NaiveDate::MIN);
            let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
            DateRange { start, end }
        }
        ViewKind::Day => DateRange {
            start: date,
            end: date,
        },
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    anchor: NaiveDate,
    view: ViewKind,
    filter: SessionFilter,
    week_start: WeekStart,
}

impl ViewportState {
    pub fn new(anchor: NaiveDate, view: ViewKind, week_start: WeekStart) -> Self {
        Self {
            anchor,
            view,
            filter: SessionFilter::default(),
            week_start,
        }
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn view(&self) -> ViewKind {
        self.view
    }

    pub fn filter(&self) -> &SessionFilter {
        &self.filter
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    pub fn navigate(&mut self, direction: Direction) {
        self.anchor = navigate_date(self.anchor, direction, self.view);
    }

    pub fn set_view(&mut self, view: ViewKind) {
        self.view = view;
    }

    pub fn set_filter(&mut self, filter: SessionFilter) {
        self.filter = filter;
    }

    pub fn set_anchor(&mut self, anchor: NaiveDate) {
        self.anchor = anchor;
    }

    pub fn visible_range(&self) -> DateRange {
        compute_visible_range_with(self.anchor, self.view, self.week_start)
    }
}
