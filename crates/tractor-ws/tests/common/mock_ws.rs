//! Mock `/ws` server for integration tests.
//!
//! Every accepted connection gets the same [`ConnectionScript`]: push the
//! scripted frames, then either close or idle until the client leaves.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

/// Behavior applied to every accepted connection.
#[derive(Clone, Default)]
pub struct ConnectionScript {
    /// Frames pushed right after the handshake.
    pub frames: Vec<String>,
    /// Close the connection after pushing the frames.
    pub close_after_push: bool,
}

pub struct MockWsServer {
    addr: SocketAddr,
    stop: CancellationToken,
    handshakes: Arc<AtomicU32>,
}

impl MockWsServer {
    /// Bind an ephemeral port and start accepting.
    pub async fn start(script: ConnectionScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stop = CancellationToken::new();
        let handshakes = Arc::new(AtomicU32::new(0));

        let (accept_stop, accept_count) = (stop.clone(), handshakes.clone());
        tokio::spawn(async move {
            loop {
                let socket = tokio::select! {
                    () = accept_stop.cancelled() => break,
                    accepted = listener.accept() => match accepted {
                        Ok((socket, _)) => socket,
                        Err(_) => continue,
                    },
                };
                tokio::spawn(play_script(
                    socket,
                    script.clone(),
                    accept_count.clone(),
                    accept_stop.child_token(),
                ));
            }
        });

        Self {
            addr,
            stop,
            handshakes,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Completed WebSocket handshakes so far.
    pub async fn connection_count(&self) -> u32 {
        self.handshakes.load(Ordering::SeqCst)
    }

    /// Stop accepting and drop open connections.
    pub async fn shutdown(self) {
        self.stop.cancel();
    }
}

async fn play_script(
    socket: TcpStream,
    script: ConnectionScript,
    handshakes: Arc<AtomicU32>,
    stop: CancellationToken,
) {
    let Ok(mut ws) = accept_async(socket).await else {
        return;
    };
    handshakes.fetch_add(1, Ordering::SeqCst);

    for frame in script.frames {
        if ws.send(Message::Text(frame)).await.is_err() {
            return;
        }
    }
    if script.close_after_push {
        let _ = ws.close(None).await;
        return;
    }

    // Idle until the client leaves; tungstenite answers pings on read
    loop {
        tokio::select! {
            () = stop.cancelled() => return,
            msg = ws.next() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => {}
            },
        }
    }
}
