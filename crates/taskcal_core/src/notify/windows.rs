use crate::error::AppError;
use crate::notify::{Notifier, launch_show, notification_body, parse_activation_argument};
use crate::task_api::DayItem;
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, item: &DayItem) -> Result<(), AppError> {
        self.notify_with_action(item, "")
    }

    fn notify_with_action(&self, item: &DayItem, action: &str) -> Result<(), AppError> {
        let task_id = item.task.id.clone();
        let action_value = action.to_string();
        let mut toast = Toast::new(Toast::POWERSHELL_APP_ID)
            .title("taskcal")
            .text1(&notification_body(item))
            .text2(&item.task.id);

        if !action_value.trim().is_empty() {
            toast = toast.add_button("Open", &action_value);
        }

        let action_match = action_value.clone();
        toast
            .on_activated(move |args| {
                match args {
                    Some(args) if !action_match.is_empty() && args == action_match => {
                        let _ = launch_show(&task_id);
                    }
                    Some(args) => {
                        if let Some(id) = parse_activation_argument(&args) {
                            let _ = launch_show(&id);
                        } else if args.trim().is_empty() {
                            let _ = launch_show(&task_id);
                        }
                    }
                    None => {
                        let _ = launch_show(&task_id);
                    }
                }
                Ok(())
            })
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
