//! Unlock countdown: a one-shot verdict and a WebSocket stream of verdicts.
//!
//! The WebSocket owns one countdown task per connection. The task is
//! cancelled and awaited when the client disconnects, when the will becomes
//! unlockable, or when the server shuts down.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::Serialize;

use legacychain_core::unlock::countdown::CountdownHandle;
use legacychain_types::unlock::UnlockState;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// One gate verdict for a will, e.g.
/// `{"owner":"G...","state":"locked","remaining":{...}}`.
#[derive(Debug, Serialize)]
pub struct CountdownView {
    pub owner: String,
    #[serde(flatten)]
    pub gate: UnlockState,
}

/// GET /api/will/{owner}/countdown - Current unlock verdict.
pub async fn get_countdown(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<ApiResponse<CountdownView>, AppError> {
    let owner = owner.trim().to_string();
    let gate = state.will_service.unlock_state(&owner).await?;
    Ok(ApiResponse::ok(CountdownView { owner, gate }))
}

/// GET /api/will/{owner}/countdown/ws - Stream verdicts at the configured cadence.
///
/// The will is looked up before upgrading, so an unknown owner gets a
/// regular 404 rather than a socket that closes immediately.
pub async fn countdown_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Response, AppError> {
    let owner = owner.trim().to_string();
    let handle = state
        .will_service
        .watch_unlock(&owner, state.countdown_interval, &state.shutdown)
        .await?;

    Ok(ws.on_upgrade(move |socket| stream_countdown(socket, owner, handle)))
}

async fn stream_countdown(socket: WebSocket, owner: String, handle: CountdownHandle) {
    let (ws_sender, ws_receiver) = socket.split();
    pump_countdown(ws_sender, ws_receiver, owner, handle).await;
}

/// Forward verdicts to `sender` until the client goes away, the will becomes
/// unlockable, or shutdown. Returns only after the countdown task has exited.
async fn pump_countdown<S, R, E>(
    mut sender: S,
    mut receiver: R,
    owner: String,
    mut handle: CountdownHandle,
) where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    let mut verdicts = handle.subscribe();
    let token = handle.cancellation_token();
    let mut pending = true;

    tracing::debug!(owner = %owner, "countdown socket opened");

    loop {
        if pending {
            let gate = *verdicts.borrow_and_update();
            let frame = CountdownView {
                owner: owner.clone(),
                gate,
            };
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("failed to serialize countdown frame: {e}");
                    break;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            if gate.is_unlockable() {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            pending = false;
        }

        tokio::select! {
            biased;
            // Shutdown wins over the task's own exit so the client sees a close frame.
            _ = token.cancelled() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            changed = verdicts.changed() => {
                if changed.is_err() {
                    break;
                }
                pending = true;
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    handle.cancel();
    handle.stopped().await;
    tracing::debug!(owner = %owner, "countdown socket closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use chrono::{Duration, Utc};
    use futures_util::{sink, stream};
    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use legacychain_core::clock::SystemClock;
    use legacychain_core::unlock::countdown::spawn_countdown;
    use legacychain_types::unlock::Remaining;
    use legacychain_types::will::{Beneficiary, WillDraft};

    use crate::http::router::build_router;
    use crate::state::test_support::memory_state;

    const WAIT: std::time::Duration = std::time::Duration::from_secs(5);

    fn addr(c: char) -> String {
        format!("G{}", c.to_string().repeat(55))
    }

    fn locked_countdown(shutdown: &CancellationToken) -> CountdownHandle {
        spawn_countdown(
            Utc::now() + Duration::hours(2),
            SystemClock,
            std::time::Duration::from_secs(1),
            shutdown,
        )
    }

    /// Run the pump over in-memory channels standing in for the socket halves.
    /// Returns the frames the server sent, the client's outbound queue, and
    /// the pump task.
    fn run_pump(
        handle: CountdownHandle,
    ) -> (
        mpsc::UnboundedReceiver<Message>,
        mpsc::UnboundedSender<Result<Message, Infallible>>,
        tokio::task::JoinHandle<()>,
    ) {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel::<Message>();
        let (client_tx, mut client_rx) = mpsc::unbounded_channel::<Result<Message, Infallible>>();

        let sender = Box::pin(sink::unfold(frames_tx, |tx, msg: Message| async move {
            match tx.send(msg) {
                Ok(()) => Ok(tx),
                Err(_) => Err(()),
            }
        }));
        let receiver = stream::poll_fn(move |cx| client_rx.poll_recv(cx));

        let pump = tokio::spawn(pump_countdown(sender, receiver, addr('O'), handle));
        (frames_rx, client_tx, pump)
    }

    fn frame_json(msg: Message) -> Value {
        match msg {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_disconnect_stops_countdown_task() {
        let shutdown = CancellationToken::new();
        let handle = locked_countdown(&shutdown);
        let task_token = handle.cancellation_token();
        let (mut frames, client, pump) = run_pump(handle);

        let first = frame_json(frames.recv().await.unwrap());
        assert_eq!(first["state"], "locked");
        assert_eq!(first["owner"], addr('O'));

        drop(client);
        tokio::time::timeout(WAIT, pump).await.unwrap().unwrap();
        assert!(task_token.is_cancelled());
        assert!(!shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn test_close_frame_stops_countdown_task() {
        let shutdown = CancellationToken::new();
        let handle = locked_countdown(&shutdown);
        let task_token = handle.cancellation_token();
        let (mut frames, client, pump) = run_pump(handle);

        frames.recv().await.unwrap();
        client.send(Ok(Message::Ping(Vec::new().into()))).unwrap();
        client.send(Ok(Message::Close(None))).unwrap();

        tokio::time::timeout(WAIT, pump).await.unwrap().unwrap();
        assert!(task_token.is_cancelled());
    }

    #[tokio::test]
    async fn test_shutdown_sends_close_frame() {
        let shutdown = CancellationToken::new();
        let handle = locked_countdown(&shutdown);
        let (mut frames, _client, pump) = run_pump(handle);

        frames.recv().await.unwrap();
        shutdown.cancel();
        tokio::time::timeout(WAIT, pump).await.unwrap().unwrap();
        assert!(matches!(frames.recv().await, Some(Message::Close(None))));
    }

    #[tokio::test]
    async fn test_unlockable_will_gets_one_frame_then_close() {
        let shutdown = CancellationToken::new();
        let handle = spawn_countdown(
            Utc::now() - Duration::seconds(1),
            SystemClock,
            std::time::Duration::from_secs(1),
            &shutdown,
        );
        let (mut frames, _client, pump) = run_pump(handle);

        assert_eq!(frame_json(frames.recv().await.unwrap())["state"], "unlockable");
        assert!(matches!(frames.recv().await, Some(Message::Close(None))));
        tokio::time::timeout(WAIT, pump).await.unwrap().unwrap();
    }

    /// Read from `stream` until `buf` holds at least `len` bytes.
    async fn fill(stream: &mut tokio::net::TcpStream, buf: &mut Vec<u8>, len: usize) {
        let mut chunk = [0u8; 1024];
        while buf.len() < len {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed early");
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    #[tokio::test]
    async fn test_websocket_close_ends_server_stream() {
        let (state, _dir) = memory_state().await;
        let owner = addr('O');
        state
            .will_service
            .register_will(WillDraft {
                owner: owner.clone(),
                beneficiaries: vec![Beneficiary::new(addr('A'), 1)],
                amount: 10,
                payload_reference: "bafyref".to_string(),
                unlock_timestamp: Utc::now() + Duration::days(1),
            })
            .await
            .unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let local = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        let mut socket = tokio::net::TcpStream::connect(local).await.unwrap();
        let request = format!(
            "GET /api/will/{owner}/countdown/ws HTTP/1.1\r\n\
             Host: {local}\r\n\
             Connection: Upgrade\r\n\
             Upgrade: websocket\r\n\
             Sec-WebSocket-Version: 13\r\n\
             Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n"
        );
        socket.write_all(request.as_bytes()).await.unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed during handshake");
            buf.extend_from_slice(&chunk[..n]);
        };
        assert!(
            buf.starts_with(b"HTTP/1.1 101"),
            "{}",
            String::from_utf8_lossy(&buf[..head_end])
        );

        // First server frame: unmasked text, 7-bit or 16-bit length.
        let mut frame = buf.split_off(head_end);
        fill(&mut socket, &mut frame, 2).await;
        assert_eq!(frame[0], 0x81);
        let (len, offset) = match frame[1] & 0x7f {
            126 => {
                fill(&mut socket, &mut frame, 4).await;
                (u16::from_be_bytes([frame[2], frame[3]]) as usize, 4)
            }
            n => (n as usize, 2),
        };
        fill(&mut socket, &mut frame, offset + len).await;
        let first: Value = serde_json::from_slice(&frame[offset..offset + len]).unwrap();
        assert_eq!(first["state"], "locked");
        assert_eq!(first["owner"], owner);

        // Masked close frame with an empty payload.
        socket.write_all(&[0x88, 0x80, 0, 0, 0, 0]).await.unwrap();

        let drained = tokio::time::timeout(WAIT, async {
            loop {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .await;
        assert!(drained.is_ok(), "server kept the socket open after close");
    }

    #[test]
    fn test_frame_flattens_gate() {
        let frame = CountdownView {
            owner: "GOWNER".to_string(),
            gate: UnlockState::Locked {
                remaining: Remaining::from_duration(Duration::hours(25)),
            },
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["owner"], "GOWNER");
        assert_eq!(json["state"], "locked");
        assert_eq!(json["remaining"]["days"], 1);
        assert_eq!(json["remaining"]["hours"], 1);

        let unlocked = CountdownView {
            owner: "GOWNER".to_string(),
            gate: UnlockState::Unlockable,
        };
        let json = serde_json::to_value(&unlocked).unwrap();
        assert_eq!(json["state"], "unlockable");
        assert!(json.get("remaining").is_none());
    }
}
