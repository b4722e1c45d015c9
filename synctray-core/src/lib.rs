pub mod event;
pub mod notify;
pub mod reconcile;
pub mod slot;
pub mod sse;

pub use event::{Channel, Event, decode_event};
pub use notify::{NotificationDispatcher, NotificationRequest, Notifier, NotifyError};
pub use reconcile::{ProgressReconciler, RenderCommand};
pub use slot::{Slot, SlotPool};
pub use sse::{SseFrame, SseParser};

use thiserror::Error;

/// Upper bound on a single SSE `data` payload. Anything larger is a
/// misbehaving backend, not a progress event.
pub const MAX_EVENT_DATA_BYTES: usize = 64 * 1024;

/// Number of visible list rows, and therefore the slot pool capacity.
/// Matches the backend's in-flight upload bound.
pub const DEFAULT_VISIBLE_ROWS: usize = 5;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown stream channel {0:?}")]
    UnknownChannel(String),
    #[error("event payload on {channel} is not valid JSON: {cause}")]
    MalformedPayload { channel: Channel, cause: String },
    #[error("progress percent {0} is not a finite non-negative number")]
    InvalidPercent(f64),
    #[error("event payload exceeds {MAX_EVENT_DATA_BYTES} bytes")]
    PayloadTooLarge,
}
