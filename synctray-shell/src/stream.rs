use std::time::Duration;

use futures::StreamExt;
use synctray_core::{Channel, Event, SseParser, decode_event};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// One subscription attempt. Reconnect constructs a fresh value with a
/// bumped generation; a stale subscription's connection is owned by its
/// own loop iteration and can never deliver into a newer one.
#[derive(Debug)]
struct Subscription {
    channel: Channel,
    generation: u64,
    state: ConnectionState,
    last_event_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub base_url: Url,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl StreamConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Maintains a persistent subscription to one named event channel,
/// exposing decoded events as an unbounded receiver.
///
/// The sequence is infinite until the receiver is dropped: transport
/// errors, bad HTTP statuses, and clean server EOFs all lead to a
/// backed-off reconnect, never to termination. Events missed during a
/// disconnect window are simply absent.
#[derive(Debug, Clone)]
pub struct EventStreamClient {
    http: reqwest::Client,
    config: StreamConfig,
}

impl EventStreamClient {
    #[must_use]
    pub fn new(config: StreamConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Open the channel and start its subscription task. Dropping the
    /// returned receiver closes the subscription.
    pub fn open(&self, channel: Channel) -> mpsc::UnboundedReceiver<Event> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let client = self.clone();
        tokio::spawn(async move {
            client.run_subscription(channel, event_tx).await;
        });
        event_rx
    }

    async fn run_subscription(self, channel: Channel, event_tx: mpsc::UnboundedSender<Event>) {
        let endpoint = match self.config.base_url.join("events") {
            Ok(mut url) => {
                url.set_query(Some(&format!("stream={}", channel.stream_name())));
                url
            }
            Err(err) => {
                warn!(%channel, "cannot build events endpoint from base url: {err}");
                return;
            }
        };

        let mut generation: u64 = 0;
        let mut last_event_id: Option<String> = None;
        let mut backoff = self.config.initial_backoff;

        loop {
            generation += 1;
            let mut subscription = Subscription {
                channel,
                generation,
                state: ConnectionState::Connecting,
                last_event_id: last_event_id.take(),
            };

            debug!(%channel, generation, "connecting event stream");

            let mut request = self
                .http
                .get(endpoint.clone())
                .header(reqwest::header::ACCEPT, "text/event-stream");
            if let Some(id) = subscription.last_event_id.as_deref() {
                request = request.header("Last-Event-ID", id);
            }

            let response = match request.send().await {
                Ok(response) if response.status().is_success() => response,
                Ok(response) => {
                    warn!(%channel, generation, status = %response.status(), "event stream refused");
                    subscription.state = ConnectionState::Closed;
                    last_event_id = subscription.last_event_id;
                    backoff = sleep_backoff(backoff, self.config.max_backoff).await;
                    continue;
                }
                Err(err) => {
                    warn!(%channel, generation, "event stream connect failed: {err}");
                    subscription.state = ConnectionState::Closed;
                    last_event_id = subscription.last_event_id;
                    backoff = sleep_backoff(backoff, self.config.max_backoff).await;
                    continue;
                }
            };

            subscription.state = ConnectionState::Open;
            backoff = self.config.initial_backoff;
            info!(%channel, generation, state = ?subscription.state, "event stream open");

            let mut parser = SseParser::new();
            let mut body = response.bytes_stream();

            loop {
                let chunk = match body.next().await {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(err)) => {
                        info!(%channel, generation, "event stream read failed: {err}");
                        break;
                    }
                    None => {
                        info!(%channel, generation, "event stream ended by server");
                        break;
                    }
                };

                for frame in parser.push(&chunk) {
                    if let Some(id) = frame.id {
                        subscription.last_event_id = Some(id);
                    }

                    match decode_event(subscription.channel, &frame.data) {
                        Ok(event) => {
                            if event_tx.send(event).is_err() {
                                debug!(%channel, "receiver dropped, closing subscription");
                                return;
                            }
                        }
                        Err(err) => {
                            warn!(%channel, generation, "dropping undecodable event: {err}");
                        }
                    }
                }
            }

            subscription.state = ConnectionState::Closed;
            debug!(%channel, generation, state = ?subscription.state, "subscription retired");
            last_event_id = subscription.last_event_id;

            if event_tx.is_closed() {
                return;
            }
            backoff = sleep_backoff(backoff, self.config.max_backoff).await;
        }
    }
}

async fn sleep_backoff(current: Duration, max: Duration) -> Duration {
    tokio::time::sleep(current).await;
    (current * 2).min(max)
}
