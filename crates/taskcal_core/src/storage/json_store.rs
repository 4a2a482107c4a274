use crate::error::AppError;
use crate::model::{Group, LEGACY_DEFAULT_GROUP_NAMES, Task, now_rfc3339};
use crate::task_api::next_id;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SCHEMA_VERSION: u32 = 2;
pub const DEFAULT_GROUP_ID: &str = "group-default";
pub const DEFAULT_GROUP_NAME: &str = "Default";
const STORE_FILE_NAME: &str = "tasks.json";
const STORE_ENV_VAR: &str = "TASKCAL_STORE_PATH";

#[derive(Debug, Serialize, Deserialize)]
struct StoredState {
    schema_version: u32,
    #[serde(default)]
    groups: Vec<Group>,
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub tasks: Vec<Task>,
    pub groups: Vec<Group>,
}

impl TaskState {
    pub fn empty() -> Result<Self, AppError> {
        Ok(Self {
            tasks: Vec::new(),
            groups: vec![default_group()?],
        })
    }

    pub fn default_group(&self) -> Result<&Group, AppError> {
        self.groups
            .iter()
            .find(|group| group.is_default)
            .ok_or_else(|| AppError::invalid_data("store has no default group"))
    }
}

fn default_group() -> Result<Group, AppError> {
    Ok(Group {
        id: DEFAULT_GROUP_ID.to_string(),
        name: DEFAULT_GROUP_NAME.to_string(),
        color: None,
        is_default: true,
        created_at: now_rfc3339()?,
    })
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("taskcal").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskcal")
            .join(STORE_FILE_NAME))
    }
}

#[cfg(test)]
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    Ok(load_state(path)?.tasks)
}

pub fn load_state(path: &Path) -> Result<TaskState, AppError> {
    if !path.exists() {
        debug!(path = %path.display(), "store missing, starting empty");
        return TaskState::empty();
    }

    let content = std::fs::read_to_string(path)?;
    let stored: StoredState = serde_json::from_str(&content)?;

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    let mut state = TaskState {
        tasks: stored.tasks,
        groups: stored.groups,
    };
    resolve_default_group(&mut state)?;
    validate_state(&state)?;

    debug!(
        path = %path.display(),
        tasks = state.tasks.len(),
        groups = state.groups.len(),
        "loaded store"
    );
    Ok(state)
}

/// Ensures exactly one group is flagged default. Stores written before the
/// flag existed get it resolved here once, by legacy name or by creating one.
fn resolve_default_group(state: &mut TaskState) -> Result<(), AppError> {
    if state.groups.iter().any(|group| group.is_default) {
        return Ok(());
    }

    let legacy = state.groups.iter_mut().find(|group| {
        LEGACY_DEFAULT_GROUP_NAMES
            .iter()
            .any(|name| group.matches_name(name))
    });

    match legacy {
        Some(group) => {
            warn!(group_id = %group.id, name = %group.name, "marking legacy default group");
            group.is_default = true;
        }
        None => {
            warn!("store has no default group, creating one");
            let mut created = default_group()?;
            if state.groups.iter().any(|group| group.id == created.id) {
                created.id = next_id("group", |candidate| {
                    state.groups.iter().any(|group| group.id == candidate)
                });
            }
            state.groups.insert(0, created);
        }
    }

    Ok(())
}

fn validate_state(state: &TaskState) -> Result<(), AppError> {
    let defaults = state.groups.iter().filter(|group| group.is_default).count();
    if defaults != 1 {
        return Err(AppError::invalid_data(format!(
            "expected one default group, found {defaults}"
        )));
    }

    let mut group_ids = HashSet::new();
    for group in &state.groups {
        if !group_ids.insert(group.id.as_str()) {
            return Err(AppError::invalid_data(format!(
                "duplicate group id {}",
                group.id
            )));
        }
    }

    let mut task_ids = HashSet::new();
    for task in &state.tasks {
        if !task_ids.insert(task.id.as_str()) {
            return Err(AppError::invalid_data(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        if let Some(group_id) = task.group_id.as_deref()
            && !group_ids.contains(group_id)
        {
            return Err(AppError::invalid_data(format!(
                "task {} references unknown group {group_id}",
                task.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    let mut state = load_state(path)?;
    state.tasks = tasks.to_vec();
    save_state(path, &state)
}

pub fn save_state(path: &Path, state: &TaskState) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let stored = StoredState {
        schema_version: SCHEMA_VERSION,
        groups: state.groups.to_vec(),
        tasks: state.tasks.to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)?;
    std::fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)?;
    }

    debug!(path = %path.display(), tasks = state.tasks.len(), "saved store");
    Ok(())
}
