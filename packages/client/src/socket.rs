//! One live channel: connect, dispatch frames, reconnect within a budget.

use std::sync::Arc;
use std::time::Duration;

use common::{ClientMessage, LiveChannel, ReconnectDecision, ReconnectPolicy, ReconnectTracker};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio::time::{Instant, Interval, interval_at, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::dispatch::{LiveHandler, handle_frame};
use crate::error::ClientError;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Why [`ConnectionManager::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The shutdown token fired.
    Cancelled,
    /// The reconnect budget ran out; no further attempts are made.
    GaveUp { attempts: u32 },
}

enum Closed {
    Cancelled,
    Lost,
}

/// Owns the socket for one [`LiveChannel`].
///
/// Every close, including a connection attempt that never opened, consumes
/// one reconnect attempt. A successful open resets the count.
pub struct ConnectionManager {
    channel: LiveChannel,
    url: Url,
    tracker: ReconnectTracker,
    handler: Arc<dyn LiveHandler>,
    connect_timeout: Duration,
    keepalive: Option<Duration>,
    subscribe_event: Option<i64>,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    pub fn new(
        channel: LiveChannel,
        url: Url,
        policy: ReconnectPolicy,
        handler: Arc<dyn LiveHandler>,
    ) -> Self {
        Self {
            channel,
            url,
            tracker: ReconnectTracker::new(policy),
            handler,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            keepalive: None,
            subscribe_event: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Bound on TCP connect plus WebSocket handshake. An attempt that runs
    /// over counts as an error followed by a close.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Send `ping` every `interval` while connected.
    pub fn with_keepalive(mut self, interval: Duration) -> Self {
        self.keepalive = (!interval.is_zero()).then_some(interval);
        self
    }

    /// Subscribe to one event's first-blood group on every open.
    pub fn with_event_subscription(mut self, event_id: i64) -> Self {
        self.subscribe_event = Some(event_id);
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn channel(&self) -> LiveChannel {
        self.channel
    }

    #[instrument(skip(self), fields(channel = %self.channel))]
    pub async fn run(mut self) -> SessionEnd {
        loop {
            if self.shutdown.is_cancelled() {
                return SessionEnd::Cancelled;
            }

            if let Closed::Cancelled = self.connect_once().await {
                info!("Live channel shut down");
                return SessionEnd::Cancelled;
            }

            match self.tracker.record_close() {
                ReconnectDecision::Retry { attempt, delay } => {
                    info!(
                        attempt,
                        max_attempts = self.tracker.policy().max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Reconnecting"
                    );
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return SessionEnd::Cancelled,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                ReconnectDecision::Exhausted { attempts } => {
                    error!(attempts, "Max reconnection attempts reached, giving up");
                    self.handler.on_gave_up(self.channel, attempts).await;
                    return SessionEnd::GaveUp { attempts };
                }
            }
        }
    }

    async fn connect_once(&mut self) -> Closed {
        let connected = tokio::select! {
            _ = self.shutdown.cancelled() => return Closed::Cancelled,
            result = timeout(self.connect_timeout, connect_async(self.url.as_str())) => result,
        };
        let stream = match connected {
            Ok(Ok((stream, _))) => stream,
            Ok(Err(e)) => {
                self.report_error(e.into()).await;
                return Closed::Lost;
            }
            Err(_) => {
                let timeout_ms = u64::try_from(self.connect_timeout.as_millis()).unwrap_or(u64::MAX);
                self.report_error(ClientError::HandshakeTimeout { timeout_ms }).await;
                return Closed::Lost;
            }
        };

        self.tracker.reset();
        info!(url = %redacted(&self.url), "Live channel connected");
        self.handler.on_connected(self.channel).await;

        let (mut sink, mut source) = stream.split();

        if let Some(event_id) = self.subscribe_event {
            if let Err(e) = send(&mut sink, &ClientMessage::Subscribe { event_id }).await {
                self.report_error(e).await;
                return Closed::Lost;
            }
            debug!(event_id, "Subscribed to event");
        }

        let mut keepalive = self
            .keepalive
            .map(|period| interval_at(Instant::now() + period, period));
        let shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    let _ = sink.close().await;
                    return Closed::Cancelled;
                }
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(self.handler.as_ref(), self.channel, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(frame = ?frame, "Live channel closed by server");
                        return Closed::Lost;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        self.report_error(e.into()).await;
                        return Closed::Lost;
                    }
                    None => {
                        info!("Live channel closed");
                        return Closed::Lost;
                    }
                },
                _ = tick(&mut keepalive) => {
                    if let Err(e) = send(&mut sink, &ClientMessage::Ping).await {
                        self.report_error(e).await;
                        return Closed::Lost;
                    }
                }
            }
        }
    }

    async fn report_error(&self, error: ClientError) {
        warn!(error = %error, "Live channel error");
        self.handler.on_connection_error(self.channel, &error).await;
    }
}

async fn send(sink: &mut WsSink, message: &ClientMessage) -> Result<(), ClientError> {
    sink.send(Message::Text(message.encode()?.into())).await?;
    Ok(())
}

async fn tick(keepalive: &mut Option<Interval>) {
    match keepalive {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// URL for logs, without the token query.
fn redacted(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_query(None);
    url
}
