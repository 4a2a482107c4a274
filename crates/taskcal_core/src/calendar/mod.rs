pub mod classify;
pub mod interaction;
pub mod month;

pub use classify::{
    Classification, DayEntry, UrgencyLevel, classify, day_detail, display_priority,
    should_display_on, sort_for_day_detail, tasks_for_date,
};
pub use interaction::{CalendarAction, CalendarEvent, CalendarState, Position, Transition};
pub use month::{DayCell, MonthGrid, WeekStart, month_grid, parse_month};

use time::{Date, OffsetDateTime, UtcOffset};

/// The wall-clock date in the local timezone, falling back to UTC when the
/// offset cannot be determined.
pub fn local_today() -> Date {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset).date()
}
