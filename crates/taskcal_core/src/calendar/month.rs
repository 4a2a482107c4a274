use crate::calendar::classify::{DayEntry, classify, sort_for_day_detail};
use crate::error::AppError;
use crate::model::Task;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use time::{Date, Duration, Month, Weekday};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    fn offset_of(self, weekday: Weekday) -> i64 {
        match self {
            Self::Monday => i64::from(weekday.number_days_from_monday()),
            Self::Sunday => i64::from(weekday.number_days_from_sunday()),
        }
    }

    pub fn weekdays(self) -> [Weekday; 7] {
        let first = match self {
            Self::Monday => Weekday::Monday,
            Self::Sunday => Weekday::Sunday,
        };
        std::array::from_fn(|index| first.nth_next(index as u8))
    }
}

impl FromStr for WeekStart {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(Self::Monday),
            "sunday" | "sun" => Ok(Self::Sunday),
            other => Err(AppError::invalid_input(format!(
                "unknown week start '{other}', expected monday or sunday"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DayCell<'a> {
    pub date: Date,
    pub in_month: bool,
    pub is_today: bool,
    pub entries: Vec<DayEntry<'a>>,
}

#[derive(Debug, Clone)]
pub struct MonthGrid<'a> {
    pub year: i32,
    pub month: Month,
    pub week_start: WeekStart,
    pub weeks: Vec<Vec<DayCell<'a>>>,
}

impl MonthGrid<'_> {
    pub fn cell(&self, date: Date) -> Option<&DayCell<'_>> {
        self.weeks
            .iter()
            .flat_map(|week| week.iter())
            .find(|cell| cell.date == date)
    }
}

/// Parses `YYYY-MM` into a year and month.
pub fn parse_month(raw: &str) -> Result<(i32, Month), AppError> {
    let trimmed = raw.trim();
    let invalid = || AppError::invalid_input(format!("invalid month '{trimmed}', use YYYY-MM"));
    let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;
    Date::from_calendar_date(year, month, 1).map_err(|_| invalid())?;
    Ok((year, month))
}

/// Lays out the weeks covering `month`, each cell holding the tasks that
/// render on that day in day-detail order.
pub fn month_grid(
    year: i32,
    month: Month,
    week_start: WeekStart,
    tasks: &[Task],
    today: Date,
) -> Result<MonthGrid<'_>, AppError> {
    let first = Date::from_calendar_date(year, month, 1)
        .map_err(|err| AppError::invalid_input(err.to_string()))?;
    let last = last_day_of_month(year, month)?;
    let grid_start = first - Duration::days(week_start.offset_of(first.weekday()));

    let mut by_date: HashMap<Date, Vec<DayEntry<'_>>> = HashMap::new();
    for task in tasks {
        if let Some(classification) = classify(task, today) {
            by_date
                .entry(classification.display_date)
                .or_default()
                .push(DayEntry {
                    task,
                    is_overdue: classification.is_overdue,
                    urgency_level: classification.urgency_level,
                    is_urgent: classification.is_urgent,
                });
        }
    }

    let mut weeks = Vec::new();
    let mut week_first = grid_start;
    while week_first <= last {
        let mut week = Vec::with_capacity(7);
        for offset in 0..7 {
            let date = week_first + Duration::days(offset);
            let mut entries = by_date.remove(&date).unwrap_or_default();
            sort_for_day_detail(&mut entries);
            week.push(DayCell {
                date,
                in_month: date.month() == month && date.year() == year,
                is_today: date == today,
                entries,
            });
        }
        weeks.push(week);
        week_first += Duration::days(7);
    }

    Ok(MonthGrid {
        year,
        month,
        week_start,
        weeks,
    })
}

fn last_day_of_month(year: i32, month: Month) -> Result<Date, AppError> {
    let (next_year, next_month) = match month {
        Month::December => (year + 1, Month::January),
        other => (year, other.next()),
    };
    let next_first = Date::from_calendar_date(next_year, next_month, 1)
        .map_err(|err| AppError::invalid_input(err.to_string()))?;
    Ok(next_first - Duration::days(1))
}
