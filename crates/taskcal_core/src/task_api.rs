use crate::calendar::{self, Classification, UrgencyLevel};
use crate::error::AppError;
use crate::model::{Priority, Task, TaskStatus, now_rfc3339};
use crate::notify::{Notifier, activation_argument, notifier_from_env};
use crate::query::{self, TaskFilter, TaskSort};
use crate::storage::json_store::{self, TaskState};
use std::path::Path;
use time::{Date, OffsetDateTime};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub due_date: Option<Date>,
    pub priority: Priority,
    pub group_id: Option<String>,
}

/// Field updates for `edit_task`. The outer `Option` says whether to touch the
/// field; the inner one (where present) allows clearing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<Option<Date>>,
    pub due_date: Option<Option<Date>>,
    pub priority: Option<Priority>,
    pub group_id: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A task as it renders on a calendar day, detached from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayItem {
    pub task: Task,
    pub display_date: Date,
    pub is_overdue: bool,
    pub urgency_level: UrgencyLevel,
    pub is_urgent: bool,
    pub display_priority: Priority,
}

impl DayItem {
    fn new(task: &Task, classification: Classification) -> Self {
        Self {
            task: task.clone(),
            display_date: classification.display_date,
            is_overdue: classification.is_overdue,
            urgency_level: classification.urgency_level,
            is_urgent: classification.is_urgent,
            display_priority: calendar::display_priority(
                task.priority,
                classification.urgency_level,
            ),
        }
    }

    pub fn needs_attention(&self) -> bool {
        self.is_overdue || self.is_urgent
    }
}

#[derive(Debug)]
pub struct NotificationOutcome {
    pub items: Vec<DayItem>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub task_id: String,
    pub error: AppError,
}

pub fn add_task(new_task: NewTask) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    add_task_with_path(&path, new_task)
}

pub fn get_task_by_id(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    get_task_by_id_with_path(&path, id)
}

pub fn edit_task(id: &str, patch: TaskPatch) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    edit_task_with_path(&path, id, patch)
}

pub fn delete_task(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    delete_task_with_path(&path, id)
}

pub fn complete_task(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    set_status_with_path(&path, id, TaskStatus::Completed)
}

pub fn reopen_task(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    set_status_with_path(&path, id, TaskStatus::Pending)
}

pub fn list_tasks(filter: &TaskFilter, sort: TaskSort) -> Result<Vec<Task>, AppError> {
    let path = json_store::store_path()?;
    list_tasks_with_path(&path, filter, sort)
}

pub fn move_task_to_date(id: &str, date: Date) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    move_task_to_date_with_path(&path, id, date)
}

pub fn tasks_for_day(date: Date, today: Date) -> Result<Vec<DayItem>, AppError> {
    let path = json_store::store_path()?;
    tasks_for_day_with_path(&path, date, today)
}

/// Current tasks and groups, for views that classify the whole set at once.
pub fn snapshot() -> Result<TaskState, AppError> {
    let path = json_store::store_path()?;
    json_store::load_state(&path)
}

/// Notifies every overdue or urgent task. With `with_actions` each
/// notification carries an "Open" button; the button only works while this
/// process keeps running, so one-shot callers should pass `false`.
pub fn notify_attention_tasks(
    today: Date,
    with_actions: bool,
) -> Result<NotificationOutcome, AppError> {
    let path = json_store::store_path()?;
    let notifier = notifier_from_env()?;
    notify_attention_tasks_with_path(&path, today, with_actions, notifier.as_ref())
}

pub(crate) fn required_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed)
}

pub(crate) fn next_id(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = format!("{prefix}-{}", OffsetDateTime::now_utc().unix_timestamp_nanos());
    let mut candidate = base.clone();
    let mut suffix = 1;
    while taken(&candidate) {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    candidate
}

fn required_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn validate_window(start: Option<Date>, due: Option<Date>) -> Result<(), AppError> {
    if let (Some(start), Some(due)) = (start, due)
        && due < start
    {
        return Err(AppError::invalid_input(
            "due date must not be before start date",
        ));
    }
    Ok(())
}

fn validate_group(state: &TaskState, group_id: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(group_id) = group_id else {
        return Ok(None);
    };
    let trimmed = required_id(group_id)?;
    if !state.groups.iter().any(|group| group.id == trimmed) {
        return Err(AppError::not_found(format!("group {trimmed} not found")));
    }
    Ok(Some(trimmed.to_string()))
}

fn find_task_mut<'a>(state: &'a mut TaskState, id: &str) -> Result<&'a mut Task, AppError> {
    state
        .tasks
        .iter_mut()
        .find(|task| task.id == id)
        .ok_or_else(|| AppError::not_found("task not found"))
}

fn add_task_with_path(path: &Path, new_task: NewTask) -> Result<Task, AppError> {
    let title = required_title(&new_task.title)?;
    validate_window(new_task.start_date, new_task.due_date)?;

    let mut state = json_store::load_state(path)?;
    let group_id = validate_group(&state, new_task.group_id.as_deref())?;
    let id = next_id("task", |candidate| {
        state.tasks.iter().any(|task| task.id == candidate)
    });

    let task = Task {
        id,
        title,
        description: normalize_description(new_task.description),
        start_date: new_task.start_date,
        due_date: new_task.due_date,
        priority: new_task.priority,
        status: TaskStatus::Pending,
        group_id,
        created_at: now_rfc3339()?,
        completed_at: None,
    };

    state.tasks.push(task.clone());
    json_store::save_state(path, &state)?;
    info!(task_id = %task.id, "added task");

    Ok(task)
}

fn get_task_by_id_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    let trimmed_id = required_id(id)?;
    let state = json_store::load_state(path)?;
    state
        .tasks
        .into_iter()
        .find(|task| task.id == trimmed_id)
        .ok_or_else(|| AppError::not_found("task not found"))
}

fn edit_task_with_path(path: &Path, id: &str, patch: TaskPatch) -> Result<Task, AppError> {
    let trimmed_id = required_id(id)?;
    if patch.is_empty() {
        return Err(AppError::invalid_input("nothing to update"));
    }

    let title = patch.title.as_deref().map(required_title).transpose()?;
    let mut state = json_store::load_state(path)?;
    let group_id = match patch.group_id.as_ref() {
        Some(group_id) => Some(validate_group(&state, group_id.as_deref())?),
        None => None,
    };

    let task = find_task_mut(&mut state, trimmed_id)?;
    let start_date = patch.start_date.unwrap_or(task.start_date);
    let due_date = patch.due_date.unwrap_or(task.due_date);
    validate_window(start_date, due_date)?;

    if let Some(title) = title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = normalize_description(description);
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(group_id) = group_id {
        task.group_id = group_id;
    }
    task.start_date = start_date;
    task.due_date = due_date;

    let updated = task.clone();
    json_store::save_state(path, &state)?;
    info!(task_id = %updated.id, "updated task");

    Ok(updated)
}

fn delete_task_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    let trimmed_id = required_id(id)?;
    let mut state = json_store::load_state(path)?;
    let index = state
        .tasks
        .iter()
        .position(|task| task.id == trimmed_id)
        .ok_or_else(|| AppError::not_found("task not found"))?;

    let removed = state.tasks.remove(index);
    json_store::save_state(path, &state)?;
    info!(task_id = %removed.id, "deleted task");

    Ok(removed)
}

fn set_status_with_path(path: &Path, id: &str, status: TaskStatus) -> Result<Task, AppError> {
    let trimmed_id = required_id(id)?;
    let mut state = json_store::load_state(path)?;
    let task = find_task_mut(&mut state, trimmed_id)?;

    if task.status == status {
        let message = match status {
            TaskStatus::Completed => "task already completed",
            TaskStatus::Pending => "task is not completed",
        };
        return Err(AppError::invalid_input(message));
    }

    task.status = status;
    task.completed_at = match status {
        TaskStatus::Completed => Some(now_rfc3339()?),
        TaskStatus::Pending => None,
    };

    let updated = task.clone();
    json_store::save_state(path, &state)?;
    info!(task_id = %updated.id, status = ?updated.status, "changed task status");

    Ok(updated)
}

fn list_tasks_with_path(
    path: &Path,
    filter: &TaskFilter,
    sort: TaskSort,
) -> Result<Vec<Task>, AppError> {
    let state = json_store::load_state(path)?;
    if let Some(group_id) = filter.group_id.as_deref() {
        validate_group(&state, Some(group_id))?;
    }
    Ok(query::apply(&state.tasks, filter, sort))
}

/// Moves a task so that it lands on `date`, keeping the length of its window.
fn move_task_to_date_with_path(path: &Path, id: &str, date: Date) -> Result<Task, AppError> {
    let trimmed_id = required_id(id)?;
    let mut state = json_store::load_state(path)?;
    let task = find_task_mut(&mut state, trimmed_id)?;

    if task.is_completed() {
        return Err(AppError::invalid_input("completed tasks cannot be moved"));
    }

    match (task.start_date, task.due_date) {
        (start, Some(due)) => {
            let shift = date - due;
            task.due_date = Some(date);
            task.start_date = start
                .map(|start| {
                    start
                        .checked_add(shift)
                        .ok_or_else(|| AppError::invalid_input("date out of range"))
                })
                .transpose()?;
        }
        (Some(_), None) => task.start_date = Some(date),
        (None, None) => task.due_date = Some(date),
    }

    let updated = task.clone();
    json_store::save_state(path, &state)?;
    info!(task_id = %updated.id, date = %date, "moved task");

    Ok(updated)
}

fn tasks_for_day_with_path(path: &Path, date: Date, today: Date) -> Result<Vec<DayItem>, AppError> {
    let state = json_store::load_state(path)?;
    Ok(calendar::day_detail(&state.tasks, date, today)
        .into_iter()
        .map(|entry| {
            DayItem::new(
                entry.task,
                Classification {
                    display_date: date,
                    is_overdue: entry.is_overdue,
                    urgency_level: entry.urgency_level,
                    is_urgent: entry.is_urgent,
                },
            )
        })
        .collect())
}

fn notify_attention_tasks_with_path(
    path: &Path,
    today: Date,
    with_actions: bool,
    notifier: &dyn Notifier,
) -> Result<NotificationOutcome, AppError> {
    let state = json_store::load_state(path)?;
    let mut items = Vec::new();
    let mut failures = Vec::new();

    for task in &state.tasks {
        let Some(classification) = calendar::classify(task, today) else {
            continue;
        };
        let item = DayItem::new(task, classification);
        if !item.needs_attention() {
            continue;
        }

        let sent = if with_actions {
            notifier.notify_with_action(&item, &activation_argument(&task.id))
        } else {
            notifier.notify(&item)
        };
        match sent {
            Ok(()) => items.push(item),
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "notification failed");
                failures.push(NotificationFailure {
                    task_id: task.id.clone(),
                    error: err,
                });
            }
        }
    }

    Ok(NotificationOutcome { items, failures })
}

#[cfg(test)]
mod tests {
    use super::{
        DayItem, NewTask, TaskPatch, add_task_with_path, delete_task_with_path,
        edit_task_with_path, get_task_by_id_with_path, list_tasks_with_path,
        move_task_to_date_with_path, notify_attention_tasks_with_path, set_status_with_path,
        tasks_for_day_with_path,
    };
    use crate::calendar::UrgencyLevel;
    use crate::error::AppError;
    use crate::model::{Priority, TaskStatus};
    use crate::notify::Notifier;
    use crate::query::{StatusFilter, TaskFilter, TaskSort};
    use crate::storage::json_store::{self, DEFAULT_GROUP_ID};
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use time::macros::date;

    fn store() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        (dir, path)
    }

    fn add(path: &Path, title: &str, start: Option<time::Date>, due: Option<time::Date>) -> String {
        add_task_with_path(
            path,
            NewTask {
                title: title.to_string(),
                start_date: start,
                due_date: due,
                ..NewTask::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn add_task_rejects_blank_title() {
        let (_dir, path) = store();
        let err = add_task_with_path(
            &path,
            NewTask {
                title: "   ".to_string(),
                ..NewTask::default()
            },
        )
        .unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert!(!path.exists());
    }

    #[test]
    fn add_task_rejects_due_before_start() {
        let (_dir, path) = store();
        let err = add_task_with_path(
            &path,
            NewTask {
                title: "inverted".to_string(),
                start_date: Some(date!(2024 - 01 - 10)),
                due_date: Some(date!(2024 - 01 - 05)),
                ..NewTask::default()
            },
        )
        .unwrap_err();

        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn add_task_writes_to_store() {
        let (_dir, path) = store();
        let task = add_task_with_path(
            &path,
            NewTask {
                title: "  plan trip ".to_string(),
                description: Some("   ".to_string()),
                due_date: Some(date!(2024 - 05 - 01)),
                priority: Priority::High,
                group_id: Some(DEFAULT_GROUP_ID.to_string()),
                ..NewTask::default()
            },
        )
        .unwrap();
        let loaded = json_store::load_tasks(&path).unwrap();

        assert_eq!(loaded, vec![task.clone()]);
        assert_eq!(task.title, "plan trip");
        assert_eq!(task.description, None);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.group_id.as_deref(), Some(DEFAULT_GROUP_ID));
    }

    #[test]
    fn add_task_rejects_unknown_group() {
        let (_dir, path) = store();
        let err = add_task_with_path(
            &path,
            NewTask {
                title: "orphan".to_string(),
                group_id: Some("group-nope".to_string()),
                ..NewTask::default()
            },
        )
        .unwrap_err();

        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn added_tasks_get_distinct_ids() {
        let (_dir, path) = store();
        let first = add(&path, "one", None, None);
        let second = add(&path, "two", None, None);

        assert_ne!(first, second);
        assert!(first.starts_with("task-"));
    }

    #[test]
    fn get_task_by_id_rejects_missing_task() {
        let (_dir, path) = store();
        add(&path, "one", None, None);

        assert_eq!(
            get_task_by_id_with_path(&path, "task-x").unwrap_err().code(),
            "not_found"
        );
        assert_eq!(
            get_task_by_id_with_path(&path, " ").unwrap_err().code(),
            "invalid_input"
        );
    }

    #[test]
    fn edit_task_applies_patch() {
        let (_dir, path) = store();
        let id = add(&path, "draft", Some(date!(2024 - 01 - 01)), None);

        let updated = edit_task_with_path(
            &path,
            &id,
            TaskPatch {
                title: Some("final".to_string()),
                description: Some(Some("ship it".to_string())),
                start_date: Some(None),
                due_date: Some(Some(date!(2024 - 01 - 20))),
                priority: Some(Priority::Urgent),
                ..TaskPatch::default()
            },
        )
        .unwrap();

        assert_eq!(updated.title, "final");
        assert_eq!(updated.description.as_deref(), Some("ship it"));
        assert_eq!(updated.start_date, None);
        assert_eq!(updated.due_date, Some(date!(2024 - 01 - 20)));
        assert_eq!(updated.priority, Priority::Urgent);
        assert_eq!(get_task_by_id_with_path(&path, &id).unwrap(), updated);
    }

    #[test]
    fn edit_task_checks_window_against_stored_dates() {
        let (_dir, path) = store();
        let id = add(&path, "window", Some(date!(2024 - 01 - 10)), None);

        let err = edit_task_with_path(
            &path,
            &id,
            TaskPatch {
                due_date: Some(Some(date!(2024 - 01 - 01))),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert_eq!(get_task_by_id_with_path(&path, &id).unwrap().due_date, None);
    }

    #[test]
    fn edit_task_rejects_empty_patch_and_blank_title() {
        let (_dir, path) = store();
        let id = add(&path, "keep", None, None);

        let empty = edit_task_with_path(&path, &id, TaskPatch::default()).unwrap_err();
        assert_eq!(empty.code(), "invalid_input");

        let blank = edit_task_with_path(
            &path,
            &id,
            TaskPatch {
                title: Some("  ".to_string()),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();
        assert_eq!(blank.code(), "invalid_input");
    }

    #[test]
    fn delete_task_removes_task() {
        let (_dir, path) = store();
        let keep = add(&path, "keep", None, None);
        let drop = add(&path, "drop", None, None);

        let removed = delete_task_with_path(&path, &drop).unwrap();
        let loaded = json_store::load_tasks(&path).unwrap();

        assert_eq!(removed.id, drop);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, keep);
        assert_eq!(
            delete_task_with_path(&path, &drop).unwrap_err().code(),
            "not_found"
        );
    }

    #[test]
    fn complete_and_reopen_toggle_status() {
        let (_dir, path) = store();
        let id = add(&path, "toggle", None, None);

        let done = set_status_with_path(&path, &id, TaskStatus::Completed).unwrap();
        assert!(done.is_completed());
        assert!(done.completed_at.is_some());

        let again = set_status_with_path(&path, &id, TaskStatus::Completed).unwrap_err();
        assert_eq!(again.code(), "invalid_input");

        let reopened = set_status_with_path(&path, &id, TaskStatus::Pending).unwrap();
        assert!(!reopened.is_completed());
        assert_eq!(reopened.completed_at, None);
    }

    #[test]
    fn list_tasks_filters_by_status() {
        let (_dir, path) = store();
        let open = add(&path, "open", None, None);
        let closed = add(&path, "closed", None, None);
        set_status_with_path(&path, &closed, TaskStatus::Completed).unwrap();

        let filter = TaskFilter {
            status: StatusFilter::Active,
            ..TaskFilter::default()
        };
        let listed = list_tasks_with_path(&path, &filter, TaskSort::Title).unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, open);
    }

    #[test]
    fn list_tasks_rejects_unknown_group_filter() {
        let (_dir, path) = store();
        let filter = TaskFilter {
            group_id: Some("group-nope".to_string()),
            ..TaskFilter::default()
        };

        let err = list_tasks_with_path(&path, &filter, TaskSort::Created).unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn move_task_shifts_window() {
        let (_dir, path) = store();
        let windowed = add(
            &path,
            "windowed",
            Some(date!(2024 - 01 - 01)),
            Some(date!(2024 - 01 - 10)),
        );
        let start_only = add(&path, "start only", Some(date!(2024 - 01 - 01)), None);
        let undated = add(&path, "undated", None, None);

        let moved = move_task_to_date_with_path(&path, &windowed, date!(2024 - 01 - 15)).unwrap();
        assert_eq!(moved.start_date, Some(date!(2024 - 01 - 06)));
        assert_eq!(moved.due_date, Some(date!(2024 - 01 - 15)));

        let moved = move_task_to_date_with_path(&path, &start_only, date!(2024 - 02 - 01)).unwrap();
        assert_eq!(moved.start_date, Some(date!(2024 - 02 - 01)));
        assert_eq!(moved.due_date, None);

        let moved = move_task_to_date_with_path(&path, &undated, date!(2024 - 03 - 01)).unwrap();
        assert_eq!(moved.due_date, Some(date!(2024 - 03 - 01)));
    }

    #[test]
    fn move_task_rejects_completed_task() {
        let (_dir, path) = store();
        let id = add(&path, "done", None, Some(date!(2024 - 01 - 10)));
        set_status_with_path(&path, &id, TaskStatus::Completed).unwrap();

        let err = move_task_to_date_with_path(&path, &id, date!(2024 - 01 - 12)).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn tasks_for_day_returns_sorted_items() {
        let (_dir, path) = store();
        let today = date!(2024 - 01 - 09);
        add(&path, "calm", Some(date!(2024 - 01 - 01)), None);
        add(
            &path,
            "pressing",
            Some(date!(2024 - 01 - 01)),
            Some(date!(2024 - 01 - 10)),
        );
        add(&path, "elsewhere", None, Some(date!(2024 - 01 - 20)));

        let items = tasks_for_day_with_path(&path, today, today).unwrap();
        let titles: Vec<_> = items.iter().map(|item| item.task.title.as_str()).collect();

        assert_eq!(titles, ["pressing", "calm"]);
        assert_eq!(items[0].urgency_level, UrgencyLevel::Critical);
        assert_eq!(items[0].display_priority, Priority::Urgent);
        assert_eq!(items[1].display_priority, Priority::Medium);
        assert_eq!(items[0].display_date, today);
    }

    struct RecordingNotifier {
        seen: RefCell<Vec<String>>,
        actions: RefCell<Vec<String>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                actions: RefCell::new(Vec::new()),
            }
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, item: &DayItem) -> Result<(), AppError> {
            self.seen.borrow_mut().push(item.task.id.clone());
            Ok(())
        }

        fn notify_with_action(&self, item: &DayItem, action: &str) -> Result<(), AppError> {
            self.actions.borrow_mut().push(action.to_string());
            self.notify(item)
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _item: &DayItem) -> Result<(), AppError> {
            Err(AppError::io("bus unavailable"))
        }
    }

    #[test]
    fn notify_selects_overdue_and_urgent_tasks() {
        let (_dir, path) = store();
        let today = date!(2024 - 01 - 09);
        let overdue = add(&path, "overdue", None, Some(date!(2024 - 01 - 02)));
        let urgent = add(
            &path,
            "urgent",
            Some(date!(2024 - 01 - 01)),
            Some(date!(2024 - 01 - 11)),
        );
        add(&path, "calm", None, Some(date!(2024 - 02 - 01)));
        let finished = add(&path, "finished", None, Some(date!(2024 - 01 - 01)));
        set_status_with_path(&path, &finished, TaskStatus::Completed).unwrap();

        let notifier = RecordingNotifier::new();
        let outcome = notify_attention_tasks_with_path(&path, today, false, &notifier).unwrap();

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.items.len(), 2);
        assert_eq!(*notifier.seen.borrow(), vec![overdue, urgent]);
        assert!(notifier.actions.borrow().is_empty());
    }

    #[test]
    fn notify_attaches_open_action_only_when_requested() {
        let (_dir, path) = store();
        let overdue = add(&path, "overdue", None, Some(date!(2024 - 01 - 02)));

        let one_shot = RecordingNotifier::new();
        notify_attention_tasks_with_path(&path, date!(2024 - 01 - 09), false, &one_shot).unwrap();
        assert_eq!(*one_shot.seen.borrow(), vec![overdue.clone()]);
        assert!(one_shot.actions.borrow().is_empty());

        let resident = RecordingNotifier::new();
        notify_attention_tasks_with_path(&path, date!(2024 - 01 - 09), true, &resident).unwrap();
        assert_eq!(*resident.actions.borrow(), vec![format!("show:{overdue}")]);
    }

    #[test]
    fn notify_collects_failures() {
        let (_dir, path) = store();
        let overdue = add(&path, "overdue", None, Some(date!(2024 - 01 - 02)));

        let outcome =
            notify_attention_tasks_with_path(&path, date!(2024 - 01 - 09), true, &FailingNotifier)
                .unwrap();

        assert!(outcome.items.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].task_id, overdue);
        assert_eq!(outcome.failures[0].error.code(), "io_error");
    }
}
