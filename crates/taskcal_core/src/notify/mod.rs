use crate::error::AppError;
use crate::model::format_date;
use crate::task_api::DayItem;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

pub trait Notifier {
    fn notify(&self, item: &DayItem) -> Result<(), AppError>;

    fn notify_with_action(&self, item: &DayItem, action: &str) -> Result<(), AppError> {
        let _ = action;
        self.notify(item)
    }
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _item: &DayItem) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var("TASKCAL_DISABLE_NOTIFICATIONS").is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(err) => match err {
            AppError::InvalidData(_) => Ok(Box::new(NoopNotifier)),
            other => Err(other),
        },
    }
}

const ACTION_PREFIX: &str = "show:";

pub fn activation_argument(task_id: &str) -> String {
    format!("{ACTION_PREFIX}{task_id}")
}

pub fn parse_activation_argument(argument: &str) -> Option<String> {
    argument
        .strip_prefix(ACTION_PREFIX)
        .map(|id| id.to_string())
}

/// One-line notification body, e.g. `Pay rent - overdue since 2024-01-10`.
pub fn notification_body(item: &DayItem) -> String {
    let when = format_date(item.display_date);
    let status = if item.is_overdue {
        format!("overdue since {when}")
    } else {
        match item.task.due_date {
            Some(due) => format!("{} - due {}", item.urgency_level.as_str(), format_date(due)),
            None => format!("{} - {when}", item.urgency_level.as_str()),
        }
    };
    format!("{} - {status}", item.task.title)
}

pub fn launch_show(task_id: &str) -> Result<(), AppError> {
    let exe = std::env::current_exe()?;
    std::process::Command::new(exe)
        .arg("show")
        .arg(task_id)
        .spawn()?;
    Ok(())
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
