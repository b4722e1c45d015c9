use tracing::debug;

use crate::{Event, SlotPool};

/// A UI mutation produced by the reconciler. Rendering is the shell's
/// concern; these carry everything the view needs.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Rewrite one file-list row.
    SlotUpdate {
        slot_index: usize,
        title: String,
        status_text: String,
        done: bool,
    },
    /// Rewrite the aggregate status bar.
    StatusBar {
        done: u64,
        total: u64,
        label: String,
        percent: f64,
    },
}

/// Maps progress/status events onto display slots.
///
/// Per-id lifecycle: unseen, uploading at 0%, uploading at p%, synced.
/// Updates are last-write-wins by arrival order — no buffering, no
/// reordering, no monotonic filter. A stale lower percent arriving after
/// completion rewrites the row text, but the slot's `done` flag stays set
/// until the slot is recycled for another id.
#[derive(Debug)]
pub struct ProgressReconciler {
    pool: SlotPool,
}

impl ProgressReconciler {
    #[must_use]
    pub fn new(pool: SlotPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &SlotPool {
        &self.pool
    }

    /// Apply one event in arrival order. Returns the render command it
    /// produces, or `None` when the event has no visible effect (message
    /// events, or a progress event dropped on pool exhaustion).
    pub fn apply(&mut self, event: &Event) -> Option<RenderCommand> {
        match event {
            Event::Progress { id, file, percent } => self.apply_progress(id, file, *percent),
            Event::Status {
                done,
                total,
                status,
            } => Some(Self::status_bar(*done, *total, status)),
            Event::Message { .. } => None,
        }
    }

    fn apply_progress(&mut self, id: &str, file: &str, percent: f64) -> Option<RenderCommand> {
        let slot_index = match self.pool.claim(id) {
            Some(index) => index,
            None => {
                debug!(id, file, "no slot available, progress event dropped");
                return None;
            }
        };

        let status_text = if percent >= 100.0 {
            self.pool.mark_done(slot_index);
            "Synced".to_owned()
        } else if percent > 0.0 {
            format!("Uploading ... {:.0}%", percent)
        } else {
            "Uploading ...".to_owned()
        };

        let done = self
            .pool
            .get(slot_index)
            .is_some_and(|slot| slot.done);

        Some(RenderCommand::SlotUpdate {
            slot_index,
            title: file.to_owned(),
            status_text,
            done,
        })
    }

    fn status_bar(done: u64, total: u64, label: &str) -> RenderCommand {
        let percent = if total == 0 {
            0.0
        } else {
            done as f64 * 100.0 / total as f64
        };
        RenderCommand::StatusBar {
            done,
            total,
            label: label.to_owned(),
            percent,
        }
    }
}
