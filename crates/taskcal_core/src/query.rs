use crate::error::AppError;
use crate::model::{Priority, Task};
use std::cmp::{Ordering, Reverse};
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" | "pending" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(AppError::invalid_input(format!(
                "unknown status filter '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    #[default]
    Created,
    DueDate,
    Priority,
    Title,
}

impl FromStr for TaskSort {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "created" => Ok(Self::Created),
            "due" | "due_date" => Ok(Self::DueDate),
            "priority" => Ok(Self::Priority),
            "title" => Ok(Self::Title),
            other => Err(AppError::invalid_input(format!("unknown sort '{other}'"))),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub group_id: Option<String>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Active => !task.is_completed(),
            StatusFilter::Completed => task.is_completed(),
        };
        if !status_ok {
            return false;
        }

        if let Some(group_id) = self.group_id.as_deref()
            && task.group_id.as_deref() != Some(group_id)
        {
            return false;
        }

        if let Some(priority) = self.priority
            && task.priority != priority
        {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task
                        .description
                        .as_deref()
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

/// Filters and sorts a snapshot of tasks. Ties keep their stored order.
pub fn apply(tasks: &[Task], filter: &TaskFilter, sort: TaskSort) -> Vec<Task> {
    let mut selected: Vec<Task> = tasks
        .iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect();

    match sort {
        // Unparsable timestamps sort last, in stored order.
        TaskSort::Created => selected.sort_by_key(|task| Reverse(created_instant(task))),
        TaskSort::DueDate => selected.sort_by(|a, b| compare_due(a, b)),
        TaskSort::Priority => selected.sort_by_key(|task| Reverse(task.priority)),
        TaskSort::Title => selected.sort_by_key(|task| task.title.to_lowercase()),
    }

    selected
}

fn created_instant(task: &Task) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(task.created_at.trim(), &Rfc3339).ok()
}

fn compare_due(a: &Task, b: &Task) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
