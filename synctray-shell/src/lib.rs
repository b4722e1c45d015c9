pub mod notifier;
pub mod relay;
pub mod shell;
pub mod stream;

pub use notifier::DesktopNotifier;
pub use relay::ConfigRelayChannel;
pub use shell::{BridgeRequest, ShellController, ShellState};
pub use stream::{ConnectionState, EventStreamClient, StreamConfig};
