use crate::error::AppError;
use crate::model::{Group, now_rfc3339};
use crate::storage::json_store::{self, TaskState};
use crate::task_api::{next_id, required_id};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedGroup {
    pub group: Group,
    /// Tasks moved into the default group.
    pub reassigned: usize,
}

pub fn add_group(name: &str, color: Option<&str>) -> Result<Group, AppError> {
    let path = json_store::store_path()?;
    add_group_with_path(&path, name, color)
}

pub fn rename_group(id: &str, name: &str) -> Result<Group, AppError> {
    let path = json_store::store_path()?;
    rename_group_with_path(&path, id, name)
}

pub fn delete_group(id: &str) -> Result<DeletedGroup, AppError> {
    let path = json_store::store_path()?;
    delete_group_with_path(&path, id)
}

pub fn list_groups() -> Result<Vec<Group>, AppError> {
    let path = json_store::store_path()?;
    list_groups_with_path(&path)
}

pub fn default_group() -> Result<Group, AppError> {
    let path = json_store::store_path()?;
    default_group_with_path(&path)
}

fn unique_name(state: &TaskState, name: &str, except_id: Option<&str>) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("name is required"));
    }
    let clash = state
        .groups
        .iter()
        .any(|group| Some(group.id.as_str()) != except_id && group.matches_name(trimmed));
    if clash {
        return Err(AppError::invalid_input(format!(
            "group '{trimmed}' already exists"
        )));
    }
    Ok(trimmed.to_string())
}

fn add_group_with_path(path: &Path, name: &str, color: Option<&str>) -> Result<Group, AppError> {
    let mut state = json_store::load_state(path)?;
    let name = unique_name(&state, name, None)?;
    let id = next_id("group", |candidate| {
        state.groups.iter().any(|group| group.id == candidate)
    });

    let group = Group {
        id,
        name,
        color: color
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string),
        is_default: false,
        created_at: now_rfc3339()?,
    };

    state.groups.push(group.clone());
    json_store::save_state(path, &state)?;
    info!(group_id = %group.id, "added group");

    Ok(group)
}

fn rename_group_with_path(path: &Path, id: &str, name: &str) -> Result<Group, AppError> {
    let trimmed_id = required_id(id)?;
    let mut state = json_store::load_state(path)?;
    let name = unique_name(&state, name, Some(trimmed_id))?;

    let group = state
        .groups
        .iter_mut()
        .find(|group| group.id == trimmed_id)
        .ok_or_else(|| AppError::not_found("group not found"))?;
    group.name = name;

    let renamed = group.clone();
    json_store::save_state(path, &state)?;
    info!(group_id = %renamed.id, "renamed group");

    Ok(renamed)
}

fn delete_group_with_path(path: &Path, id: &str) -> Result<DeletedGroup, AppError> {
    let trimmed_id = required_id(id)?;
    let mut state = json_store::load_state(path)?;
    let index = state
        .groups
        .iter()
        .position(|group| group.id == trimmed_id)
        .ok_or_else(|| AppError::not_found("group not found"))?;

    if state.groups[index].is_default {
        return Err(AppError::invalid_input("the default group cannot be deleted"));
    }

    let group = state.groups.remove(index);
    let default_id = state.default_group()?.id.clone();
    let mut reassigned = 0;
    for task in &mut state.tasks {
        if task.group_id.as_deref() == Some(group.id.as_str()) {
            task.group_id = Some(default_id.clone());
            reassigned += 1;
        }
    }

    json_store::save_state(path, &state)?;
    info!(group_id = %group.id, reassigned, "deleted group");

    Ok(DeletedGroup { group, reassigned })
}

fn default_group_with_path(path: &Path) -> Result<Group, AppError> {
    let state = json_store::load_state(path)?;
    state.default_group().cloned()
}

fn list_groups_with_path(path: &Path) -> Result<Vec<Group>, AppError> {
    let mut groups = json_store::load_state(path)?.groups;
    groups.sort_by_key(|group| !group.is_default);
    Ok(groups)
}
