use crate::error::AppError;
use crate::notify::{Notifier, launch_show, notification_body};
use crate::task_api::DayItem;
use notify_rust::{Notification, Urgency};

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, item: &DayItem) -> Result<(), AppError> {
        self.notify_with_action(item, "")
    }

    fn notify_with_action(&self, item: &DayItem, action: &str) -> Result<(), AppError> {
        let mut notification = Notification::new();
        notification.summary("taskcal");
        notification.body(&notification_body(item));
        if item.is_overdue {
            notification.urgency(Urgency::Critical);
        }
        if !action.trim().is_empty() {
            notification.action(action, "Open");
        }

        let handle = notification
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;

        // The waiter dies with the process, so the button only works for
        // callers that stay alive (the interactive shell).
        if !action.trim().is_empty() {
            let action_key = action.to_string();
            let task_id = item.task.id.clone();
            std::thread::spawn(move || {
                let _ = handle.wait_for_action(|selected| {
                    if selected == action_key || selected == "default" {
                        let _ = launch_show(&task_id);
                    }
                });
            });
        }

        Ok(())
    }
}
