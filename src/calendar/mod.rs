pub mod commands;
pub mod controller;
pub mod counts;
pub mod interaction;
pub mod projector;

pub use controller::{
    CalendarController, CalendarOptions, CalendarSnapshot, CalendarStats, FetchOutcome,
};
pub use counts::{DayLoad, LoadBucket, SessionCountIndex};
pub use interaction::{CalendarInteraction, InteractionOutcome};
pub use projector::{project, project_all, CalendarEvent, ColorTriple, EventDetails};
