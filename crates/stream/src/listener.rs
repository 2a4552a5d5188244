// crates/stream/src/listener.rs
// The connect/receive/reconnect loop. One tokio task owns the socket;
// frames are processed strictly in receipt order on that task.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{error, info, warn};

use plexpulse_core::NotifyAction;

use crate::dispatch::{classify_frame, dispatch, ActivityHandler, TimelineHandler};
use crate::state::ListenerState;
use crate::{StreamConfig, StreamResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outcome of one connected session.
enum Drive {
    /// Peer closed or socket errored; retry with the bounded cycle.
    Dropped,
    /// A reconnect was requested; close cleanly and start a fresh cycle.
    Restart,
    /// Cancellation fired; exit the loop.
    Shutdown,
}

/// Persistent client for the Plex notification feed.
pub struct ActivityListener {
    config: StreamConfig,
    state: Arc<ListenerState>,
    activity: Arc<dyn ActivityHandler>,
    timeline: Arc<dyn TimelineHandler>,
    notify_tx: mpsc::UnboundedSender<NotifyAction>,
}

impl ActivityListener {
    pub fn new(
        config: StreamConfig,
        state: Arc<ListenerState>,
        activity: Arc<dyn ActivityHandler>,
        timeline: Arc<dyn TimelineHandler>,
        notify_tx: mpsc::UnboundedSender<NotifyAction>,
    ) -> Self {
        Self {
            config,
            state,
            activity,
            timeline,
            notify_tx,
        }
    }

    /// Run the listener as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// The whole lifecycle: connect, stream, reconnect with a bounded
    /// retry cycle, park after a terminal cycle until a reconnect is
    /// requested, exit on cancellation.
    pub async fn run(self) {
        info!(uri = %self.config.ws_uri(), "activity listener starting");

        loop {
            if self.state.is_cancelled() {
                break;
            }

            match self.connect().await {
                Ok(ws) => {
                    self.state.reset_attempts();
                    self.state.set_connected(true);
                    if !self.state.server_up() {
                        self.state.set_server_up(true);
                        self.notify(NotifyAction::IntUp);
                    }
                    info!("connected to notification feed");

                    let outcome = self.drive(ws).await;
                    self.state.set_connected(false);
                    match outcome {
                        Drive::Shutdown => break,
                        Drive::Restart => {
                            info!("reconnect requested, restarting");
                        }
                        Drive::Dropped => {
                            warn!("notification feed dropped, reconnecting");
                        }
                    }
                }
                Err(e) => {
                    let attempts = self.state.record_failure();
                    warn!(
                        attempt = attempts,
                        max = self.config.max_attempts,
                        error = %e,
                        "connect failed"
                    );

                    if attempts >= self.config.max_attempts {
                        error!(attempts, "giving up on the notification feed");
                        if self.state.server_up() {
                            self.state.set_server_up(false);
                            self.notify(NotifyAction::IntDown);
                        }
                        if !self.park_until_reconnect().await {
                            break;
                        }
                        self.state.reset_attempts();
                        continue;
                    }

                    tokio::select! {
                        _ = self.state.cancelled() => break,
                        _ = tokio::time::sleep(self.config.retry_interval) => {}
                    }
                }
            }
        }

        self.state.set_connected(false);
        info!("activity listener stopped");
    }

    async fn connect(&self) -> StreamResult<WsStream> {
        let request = self.config.client_request()?;
        let (ws, _response) = connect_async(request).await?;
        Ok(ws)
    }

    /// Stream frames from one open socket until it drops, a reconnect is
    /// requested, or cancellation fires.
    async fn drive(&self, mut ws: WsStream) -> Drive {
        loop {
            let msg = tokio::select! {
                _ = self.state.cancelled() => {
                    let _ = ws.close(None).await;
                    return Drive::Shutdown;
                }
                msg = ws.next() => msg,
            };

            match msg {
                Some(Ok(Message::Text(text))) => {
                    dispatch(
                        classify_frame(text.as_str()),
                        self.activity.as_ref(),
                        self.timeline.as_ref(),
                    );
                }
                Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                    Ok(text) => dispatch(
                        classify_frame(text),
                        self.activity.as_ref(),
                        self.timeline.as_ref(),
                    ),
                    Err(_) => warn!("dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Ping(payload))) => {
                    if ws.send(Message::Pong(payload)).await.is_err() {
                        return Drive::Dropped;
                    }
                }
                Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(_))) | None => return Drive::Dropped,
                Some(Err(e)) => {
                    warn!(error = %e, "notification socket error");
                    return Drive::Dropped;
                }
            }

            // Checked after each processed frame.
            if self.state.take_reconnect_request() {
                let _ = ws.close(None).await;
                return Drive::Restart;
            }
        }
    }

    /// After a terminal retry cycle, wait for an external reconnect
    /// request. Returns false when cancellation fires instead.
    async fn park_until_reconnect(&self) -> bool {
        loop {
            if self.state.take_reconnect_request() {
                return true;
            }
            tokio::select! {
                _ = self.state.cancelled() => return false,
                _ = tokio::time::sleep(self.config.retry_interval) => {}
            }
        }
    }

    fn notify(&self, action: NotifyAction) {
        if self.notify_tx.send(action).is_err() {
            warn!(action = action.as_str(), "notify queue closed");
        }
    }
}
