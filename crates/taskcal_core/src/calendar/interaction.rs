//! Calendar interaction state.
//!
//! Drag, context menu, mobile menu and task modal are mutually exclusive, so
//! they live in a single enum instead of independent flags.

use crate::error::AppError;
use serde::Serialize;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum CalendarState {
    #[default]
    Idle,
    Dragging {
        task_id: String,
    },
    ContextMenuOpen {
        task_id: String,
        position: Position,
    },
    MobileMenuOpen {
        date: Date,
    },
    /// `task_id` is `None` while creating a new task.
    TaskModalOpen {
        task_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarEvent {
    DragStart { task_id: String },
    Drop { date: Date },
    DragCancel,
    OpenContextMenu { task_id: String, position: Position },
    OpenMobileMenu { date: Date },
    OpenTaskModal { task_id: Option<String> },
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarAction {
    MoveTask { task_id: String, date: Date },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: CalendarState,
    pub action: Option<CalendarAction>,
}

impl Transition {
    fn to(state: CalendarState) -> Self {
        Self {
            state,
            action: None,
        }
    }
}

impl CalendarState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dragging { .. } => "dragging",
            Self::ContextMenuOpen { .. } => "context_menu_open",
            Self::MobileMenuOpen { .. } => "mobile_menu_open",
            Self::TaskModalOpen { .. } => "task_modal_open",
        }
    }

    pub fn dragged_task_id(&self) -> Option<&str> {
        match self {
            Self::Dragging { task_id } => Some(task_id),
            _ => None,
        }
    }

    /// Computes the next state. Rejected events leave `self` as it was.
    pub fn transition(&self, event: CalendarEvent) -> Result<Transition, AppError> {
        match (self, event) {
            (_, CalendarEvent::Close) => Ok(Transition::to(Self::Idle)),

            (Self::Dragging { task_id }, CalendarEvent::Drop { date }) => Ok(Transition {
                state: Self::Idle,
                action: Some(CalendarAction::MoveTask {
                    task_id: task_id.clone(),
                    date,
                }),
            }),
            (Self::Dragging { .. }, CalendarEvent::DragCancel) => Ok(Transition::to(Self::Idle)),
            (Self::Dragging { .. }, event) => Err(rejected(self, &event)),

            (Self::TaskModalOpen { .. }, event) => Err(rejected(self, &event)),

            (_, CalendarEvent::DragStart { task_id }) => Ok(Transition::to(Self::Dragging {
                task_id: required_id(task_id)?,
            })),
            (_, CalendarEvent::OpenContextMenu { task_id, position }) => {
                Ok(Transition::to(Self::ContextMenuOpen {
                    task_id: required_id(task_id)?,
                    position,
                }))
            }
            (_, CalendarEvent::OpenMobileMenu { date }) => {
                Ok(Transition::to(Self::MobileMenuOpen { date }))
            }
            (_, CalendarEvent::OpenTaskModal { task_id }) => {
                let task_id = task_id.map(required_id).transpose()?;
                Ok(Transition::to(Self::TaskModalOpen { task_id }))
            }
            (_, event @ (CalendarEvent::Drop { .. } | CalendarEvent::DragCancel)) => {
                Err(rejected(self, &event))
            }
        }
    }
}

fn required_id(task_id: String) -> Result<String, AppError> {
    let trimmed = task_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed.to_string())
}

fn rejected(state: &CalendarState, event: &CalendarEvent) -> AppError {
    AppError::invalid_input(format!("cannot handle {event:?} while {}", state.name()))
}
