//! Decides on which calendar day a task renders and how urgent it looks.
//!
//! Everything here is pure: `today` is always passed in by the caller, and
//! dates are compared at day granularity.

use crate::model::{Priority, Task};
use serde::Serialize;
use std::cmp::Reverse;
use time::Date;

/// Urgency tier derived from date proximity, independent of stored priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Normal,
    Urgent,
    Critical,
}

impl UrgencyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Urgent => "urgent",
            Self::Critical => "critical",
        }
    }
}

/// Where and how a single task renders relative to `today`.
///
/// `urgency_level` drives colour and icon. `is_urgent` drives the alert glyph;
/// the two disagree for the soft-urgent band, where the tier is already
/// `Urgent` but no alert is shown yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub display_date: Date,
    pub is_overdue: bool,
    pub urgency_level: UrgencyLevel,
    pub is_urgent: bool,
}

impl Classification {
    fn calm(display_date: Date) -> Self {
        Self {
            display_date,
            is_overdue: false,
            urgency_level: UrgencyLevel::Normal,
            is_urgent: false,
        }
    }

    fn overdue(due: Date) -> Self {
        Self {
            display_date: due,
            is_overdue: true,
            urgency_level: UrgencyLevel::Critical,
            is_urgent: true,
        }
    }

    pub fn displays_on(&self, candidate: Date) -> bool {
        self.display_date == candidate
    }
}

/// Classifies `task` against `today`. Returns `None` when the task never
/// renders on the calendar (completed, or no dates at all).
pub fn classify(task: &Task, today: Date) -> Option<Classification> {
    if task.is_completed() {
        return None;
    }

    match (task.start_date, task.due_date) {
        (None, None) => None,
        (None, Some(due)) => Some(classify_deadline(due, today)),
        (Some(start), due) => Some(classify_window(start, due, today)),
    }
}

pub fn should_display_on(task: &Task, candidate: Date, today: Date) -> bool {
    classify(task, today).is_some_and(|classification| classification.displays_on(candidate))
}

fn classify_deadline(due: Date, today: Date) -> Classification {
    if due < today {
        Classification::overdue(due)
    } else {
        Classification::calm(due)
    }
}

fn classify_window(start: Date, due: Option<Date>, today: Date) -> Classification {
    // A due date before the start collapses the window onto the due date.
    let start = match due {
        Some(due) if due < start => due,
        _ => start,
    };

    if today < start {
        return Classification::calm(start);
    }

    match due {
        Some(due) if today > due => Classification::overdue(due),
        Some(due) => classify_active(start, due, today),
        None => Classification::calm(today),
    }
}

fn classify_active(start: Date, due: Date, today: Date) -> Classification {
    let total_days = (due - start).whole_days().max(1);
    let remaining_days = (due - today).whole_days();
    let progress = (total_days - remaining_days) as f64 / total_days as f64;

    let (urgency_level, is_urgent) = if remaining_days <= 1 {
        (UrgencyLevel::Critical, true)
    } else if remaining_days <= 3 || progress >= 0.8 {
        (UrgencyLevel::Urgent, true)
    } else if progress >= 0.6 {
        (UrgencyLevel::Urgent, false)
    } else {
        (UrgencyLevel::Normal, false)
    };

    Classification {
        display_date: today,
        is_overdue: false,
        urgency_level,
        is_urgent,
    }
}

/// Priority used for the coloured dot once urgency is taken into account.
pub fn display_priority(priority: Priority, urgency_level: UrgencyLevel) -> Priority {
    match urgency_level {
        UrgencyLevel::Critical => Priority::Urgent,
        UrgencyLevel::Urgent if priority != Priority::Urgent => Priority::High,
        _ => priority,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayEntry<'a> {
    pub task: &'a Task,
    pub is_overdue: bool,
    pub urgency_level: UrgencyLevel,
    pub is_urgent: bool,
}

impl DayEntry<'_> {
    pub fn display_priority(&self) -> Priority {
        display_priority(self.task.priority, self.urgency_level)
    }
}

/// Tasks that render on `date`, in input order.
pub fn tasks_for_date(tasks: &[Task], date: Date, today: Date) -> Vec<DayEntry<'_>> {
    tasks
        .iter()
        .filter_map(|task| {
            let classification = classify(task, today)?;
            classification.displays_on(date).then_some(DayEntry {
                task,
                is_overdue: classification.is_overdue,
                urgency_level: classification.urgency_level,
                is_urgent: classification.is_urgent,
            })
        })
        .collect()
}

/// Orders entries for the day detail view: urgency first, then stored priority.
pub fn sort_for_day_detail(entries: &mut [DayEntry<'_>]) {
    entries.sort_by_key(|entry| (Reverse(entry.urgency_level), Reverse(entry.task.priority)));
}

pub fn day_detail(tasks: &[Task], date: Date, today: Date) -> Vec<DayEntry<'_>> {
    let mut entries = tasks_for_date(tasks, date, today);
    sort_for_day_detail(&mut entries);
    entries
}
