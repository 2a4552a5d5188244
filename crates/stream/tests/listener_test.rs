// crates/stream/tests/listener_test.rs
// Lifecycle tests against an in-process tungstenite server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use plexpulse_core::NotifyAction;
use plexpulse_stream::{
    ActivityHandler, ActivityListener, HandlerError, ListenerState, StreamConfig, TimelineHandler,
};

#[derive(Default)]
struct Recorder {
    playing: Mutex<Vec<Value>>,
    timeline: Mutex<Vec<Value>>,
}

impl ActivityHandler for Recorder {
    fn on_playing(&self, payload: Value) -> Result<(), HandlerError> {
        self.playing.lock().unwrap().push(payload);
        Ok(())
    }
}

impl TimelineHandler for Recorder {
    fn on_timeline(&self, payload: Value) -> Result<(), HandlerError> {
        self.timeline.lock().unwrap().push(payload);
        Ok(())
    }
}

struct Harness {
    state: Arc<ListenerState>,
    recorder: Arc<Recorder>,
    rx: mpsc::UnboundedReceiver<NotifyAction>,
    task: tokio::task::JoinHandle<()>,
}

fn start_listener(port: u16, max_attempts: u32) -> Harness {
    let config = StreamConfig {
        host: "127.0.0.1".to_string(),
        port,
        max_attempts,
        retry_interval: Duration::from_millis(40),
        ..StreamConfig::default()
    };
    let state = ListenerState::new();
    let recorder = Arc::new(Recorder::default());
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = ActivityListener::new(
        config,
        state.clone(),
        recorder.clone(),
        recorder.clone(),
        tx,
    );
    let task = listener.spawn();
    Harness {
        state,
        recorder,
        rx,
        task,
    }
}

/// Reserve a port that nothing is listening on.
async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_until(mut cond: impl FnMut() -> bool, what: &str) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

fn playing_frame(session_key: &str) -> Message {
    Message::text(
        json!({
            "NotificationContainer": {
                "type": "playing",
                "PlaySessionStateNotification": [{"sessionKey": session_key}],
            }
        })
        .to_string(),
    )
}

#[tokio::test]
async fn connects_after_failures_and_emits_one_intup() {
    let port = free_port().await;
    let mut harness = start_listener(port, 50);

    // Let a few attempts fail against the unbound port.
    wait_until(|| harness.state.reconnect_attempts() >= 2, "failed attempts").await;
    assert!(!harness.state.is_connected());
    assert!(!harness.state.server_up());

    // Now bring the server up on the same port.
    let server = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    let accept = tokio::spawn(async move {
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let action = tokio::time::timeout(Duration::from_secs(5), harness.rx.recv())
        .await
        .expect("IntUp should arrive")
        .unwrap();
    assert_eq!(action, NotifyAction::IntUp);

    wait_until(|| harness.state.is_connected(), "connected flag").await;
    assert_eq!(harness.state.reconnect_attempts(), 0);
    assert!(harness.state.server_up());
    assert!(harness.rx.try_recv().is_err(), "exactly one IntUp");

    harness.state.shutdown();
    harness.task.await.unwrap();
    accept.abort();
}

#[tokio::test]
async fn playing_frame_reaches_the_session_handler() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();

    let accept = tokio::spawn(async move {
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        // Noise the listener must drop, then the real frame.
        ws.send(Message::text("not json")).await.unwrap();
        ws.send(Message::text(r#"{"type":"status","_children":[{}]}"#))
            .await
            .unwrap();
        ws.send(playing_frame("1")).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let harness = start_listener(port, 3);
    wait_until(
        || !harness.recorder.playing.lock().unwrap().is_empty(),
        "playing payload",
    )
    .await;

    let playing = harness.recorder.playing.lock().unwrap().clone();
    assert_eq!(playing, vec![json!({"sessionKey": "1"})]);
    assert!(harness.recorder.timeline.lock().unwrap().is_empty());

    harness.state.shutdown();
    harness.task.await.unwrap();
    accept.abort();
}

#[tokio::test]
async fn ping_is_answered_with_matching_pong() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();

    let accept = tokio::spawn(async move {
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Ping(b"keepalive".to_vec().into()))
            .await
            .unwrap();
        loop {
            match ws.next().await {
                Some(Ok(Message::Pong(payload))) => return payload,
                Some(Ok(_)) => {}
                _ => panic!("socket closed before pong"),
            }
        }
    });

    let harness = start_listener(port, 3);
    let payload = tokio::time::timeout(Duration::from_secs(5), accept)
        .await
        .expect("pong should arrive")
        .unwrap();
    assert_eq!(payload, b"keepalive".as_slice());

    harness.state.shutdown();
    harness.task.await.unwrap();
}

#[tokio::test]
async fn terminal_cycle_emits_one_intdown_when_server_was_up() {
    let port = free_port().await;
    let state_probe;
    let mut harness = {
        let h = start_listener(port, 2);
        // Simulate a previously healthy server.
        h.state.set_server_up(true);
        state_probe = h.state.clone();
        h
    };

    let action = tokio::time::timeout(Duration::from_secs(5), harness.rx.recv())
        .await
        .expect("IntDown should arrive")
        .unwrap();
    assert_eq!(action, NotifyAction::IntDown);
    assert!(!state_probe.server_up());
    assert!(state_probe.reconnect_attempts() >= 2);
    assert!(harness.rx.try_recv().is_err(), "exactly one IntDown");

    harness.state.shutdown();
    harness.task.await.unwrap();
}

#[tokio::test]
async fn terminal_cycle_is_silent_when_server_was_already_down() {
    let port = free_port().await;
    let mut harness = start_listener(port, 2);

    wait_until(|| harness.state.reconnect_attempts() >= 2, "terminal cycle").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(harness.rx.try_recv().is_err());

    harness.state.shutdown();
    harness.task.await.unwrap();
}

#[tokio::test]
async fn server_close_is_treated_as_a_drop_and_reconnected() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();

    let (conn_tx, mut conn_rx) = mpsc::unbounded_channel::<()>();
    let accept = tokio::spawn(async move {
        // First connection: the server hangs up.
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        conn_tx.send(()).unwrap();
        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}

        // Second connection: hold open until the client closes.
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        conn_tx.send(()).unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut harness = start_listener(port, 5);
    tokio::time::timeout(Duration::from_secs(5), conn_rx.recv())
        .await
        .expect("first connection")
        .unwrap();
    assert_eq!(harness.rx.recv().await, Some(NotifyAction::IntUp));

    tokio::time::timeout(Duration::from_secs(5), conn_rx.recv())
        .await
        .expect("second connection after server close")
        .unwrap();
    wait_until(|| harness.state.is_connected(), "reconnected after close").await;

    // server_up never flipped across the drop, so no second IntUp.
    assert!(harness.state.server_up());
    assert_eq!(harness.state.reconnect_attempts(), 0);
    assert!(harness.rx.try_recv().is_err());

    harness.state.shutdown();
    harness.task.await.unwrap();
    accept.abort();
}

#[tokio::test]
async fn reconnect_request_restarts_the_connection() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();

    let (conn_tx, mut conn_rx) = mpsc::unbounded_channel::<()>();
    let accept = tokio::spawn(async move {
        loop {
            let (stream, _) = server.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            conn_tx.send(()).unwrap();
            // Keep frames flowing so the reconnect flag gets checked.
            loop {
                tokio::select! {
                    msg = ws.next() => match msg {
                        Some(Ok(_)) => {}
                        _ => break,
                    },
                    _ = tokio::time::sleep(Duration::from_millis(25)) => {
                        if ws.send(playing_frame("x")).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    let mut harness = start_listener(port, 3);
    tokio::time::timeout(Duration::from_secs(5), conn_rx.recv())
        .await
        .expect("first connection")
        .unwrap();
    assert_eq!(harness.rx.recv().await, Some(NotifyAction::IntUp));

    harness.state.request_reconnect();
    tokio::time::timeout(Duration::from_secs(5), conn_rx.recv())
        .await
        .expect("second connection after reconnect request")
        .unwrap();

    wait_until(|| harness.state.is_connected(), "reconnected").await;
    // server_up never flipped, so no second IntUp.
    assert!(harness.rx.try_recv().is_err());

    harness.state.shutdown();
    harness.task.await.unwrap();
    accept.abort();
}
