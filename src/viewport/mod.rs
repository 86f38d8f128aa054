pub mod state;

pub use state::{
    compute_visible_range, compute_visible_range_with, navigate_by_name, navigate_date, DateRange,
    Direction, SessionFilter, ViewKind, ViewportState, WeekStart,
};
