use synctray_core::{NotificationRequest, Notifier, NotifyError};

/// Desktop-native implementation of the notify capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        notify_rust::Notification::new()
            .appname("SyncTray")
            .summary(&request.title)
            .body(&request.body)
            .show()
            .map(|_| ())
            .map_err(|err| NotifyError::Unavailable(err.to_string()))
    }
}
