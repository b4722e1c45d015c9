use thiserror::Error;
use tracing::warn;

/// An ephemeral native notification request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier unavailable: {0}")]
    Unavailable(String),
    #[error("notification denied by the platform: {0}")]
    Denied(String),
}

/// Native notification capability. The shell provides a desktop-backed
/// implementation; tests inject recording or failing fakes.
pub trait Notifier {
    fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError>;
}

/// Turns message events into notification requests.
///
/// A failed dispatch is logged and swallowed: one broken notification must
/// not interrupt the event subscription. No deduplication — every message
/// event yields exactly one `notify` call.
#[derive(Debug)]
pub struct NotificationDispatcher<N> {
    notifier: N,
}

impl<N: Notifier> NotificationDispatcher<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    pub fn dispatch(&self, kind: &str, text: &str) {
        let request = NotificationRequest {
            title: kind.to_owned(),
            body: text.to_owned(),
        };
        if let Err(err) = self.notifier.notify(&request) {
            warn!(kind, "notification dispatch failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct RecordingNotifier {
        sent: RefCell<Vec<NotificationRequest>>,
    }

    impl Notifier for &RecordingNotifier {
        fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
            self.sent.borrow_mut().push(request.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _request: &NotificationRequest) -> Result<(), NotifyError> {
            Err(NotifyError::Unavailable("no session bus".to_owned()))
        }
    }

    #[test]
    fn dispatch_forwards_kind_and_text() {
        let recorder = RecordingNotifier {
            sent: RefCell::new(Vec::new()),
        };
        let dispatcher = NotificationDispatcher::new(&recorder);
        dispatcher.dispatch("ERROR", "upload failed");

        let sent = recorder.sent.borrow();
        assert_eq!(
            *sent,
            vec![NotificationRequest {
                title: "ERROR".to_owned(),
                body: "upload failed".to_owned(),
            }]
        );
    }

    #[test]
    fn repeated_messages_are_not_deduplicated() {
        let recorder = RecordingNotifier {
            sent: RefCell::new(Vec::new()),
        };
        let dispatcher = NotificationDispatcher::new(&recorder);
        dispatcher.dispatch("INFO", "same");
        dispatcher.dispatch("INFO", "same");
        assert_eq!(recorder.sent.borrow().len(), 2);
    }

    #[test]
    fn notifier_failure_is_swallowed() {
        let dispatcher = NotificationDispatcher::new(FailingNotifier);
        // Must not panic or propagate.
        dispatcher.dispatch("CRITICAL", "disk full");
    }
}
