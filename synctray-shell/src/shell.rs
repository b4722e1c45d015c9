use bytes::Bytes;
use synctray_core::{
    Channel, Event, NotificationDispatcher, Notifier, ProgressReconciler, RenderCommand, SlotPool,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::{ConfigRelayChannel, EventStreamClient};

/// A request arriving over the local bridge from the UI layer.
#[derive(Debug)]
pub enum BridgeRequest {
    /// `get-config-action`: stream the backend config back to the caller.
    GetConfig { reply: mpsc::UnboundedSender<Bytes> },
    /// `set-config-action`: forward an opaque config mutation.
    SetConfig { payload: Bytes },
    /// `fixHeight`: the popup content resized itself.
    FixHeight(u32),
    /// Tray icon clicked.
    ToggleWindow,
}

/// Explicitly owned window/tray visibility state. Passed to handlers, not
/// a module-level global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellState {
    pub window_visible: bool,
    pub window_height: u32,
}

impl ShellState {
    #[must_use]
    pub fn new() -> Self {
        // The popup starts hidden; the tray click shows it.
        Self {
            window_visible: false,
            window_height: 0,
        }
    }

    pub fn toggle_window(&mut self) -> bool {
        self.window_visible = !self.window_visible;
        self.window_visible
    }

    pub fn fix_height(&mut self, height: u32) {
        self.window_height = height;
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new()
    }
}

/// Composes the event pipeline at startup and runs the single update
/// loop.
///
/// Every slot mutation and every dispatcher call happens inside this
/// loop, so two events can never interleave their effects on the same
/// slot. Config relay calls are spawned off so the loop never blocks on
/// the backend.
pub struct ShellController<N> {
    reconciler: ProgressReconciler,
    dispatcher: NotificationDispatcher<N>,
    relay: ConfigRelayChannel,
    state: ShellState,
    render_tx: mpsc::UnboundedSender<RenderCommand>,
}

impl<N: Notifier> ShellController<N> {
    pub fn new(
        rows: usize,
        relay: ConfigRelayChannel,
        notifier: N,
    ) -> (Self, mpsc::UnboundedReceiver<RenderCommand>) {
        let (render_tx, render_rx) = mpsc::unbounded_channel();
        let controller = Self {
            reconciler: ProgressReconciler::new(SlotPool::new(rows)),
            dispatcher: NotificationDispatcher::new(notifier),
            relay,
            state: ShellState::new(),
            render_tx,
        };
        (controller, render_rx)
    }

    #[must_use]
    pub fn state(&self) -> ShellState {
        self.state
    }

    /// Open all three channels and serve events and bridge requests until
    /// every input closes.
    pub async fn run(
        mut self,
        streams: &EventStreamClient,
        mut bridge_rx: mpsc::UnboundedReceiver<BridgeRequest>,
    ) {
        let mut files_rx = streams.open(Channel::Files);
        let mut status_rx = streams.open(Channel::Status);
        let mut messages_rx = streams.open(Channel::Messages);

        loop {
            tokio::select! {
                Some(event) = files_rx.recv() => self.handle_event(&event),
                Some(event) = status_rx.recv() => self.handle_event(&event),
                Some(event) = messages_rx.recv() => self.handle_event(&event),
                request = bridge_rx.recv() => match request {
                    Some(request) => self.handle_bridge(request),
                    None => break,
                },
                else => break,
            }
        }
    }

    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Message { kind, text } => self.dispatcher.dispatch(kind, text),
            _ => {
                if let Some(command) = self.reconciler.apply(event) {
                    let _ = self.render_tx.send(command);
                }
            }
        }
    }

    pub fn handle_bridge(&mut self, request: BridgeRequest) {
        match request {
            BridgeRequest::GetConfig { reply } => {
                let relay = self.relay.clone();
                tokio::spawn(async move {
                    relay.fetch_config(reply).await;
                });
            }
            BridgeRequest::SetConfig { payload } => {
                let relay = self.relay.clone();
                tokio::spawn(async move {
                    relay.push_config_change(payload).await;
                });
            }
            BridgeRequest::FixHeight(height) => self.state.fix_height(height),
            BridgeRequest::ToggleWindow => {
                let visible = self.state.toggle_window();
                debug!(visible, "popup window toggled");
            }
        }
    }
}
