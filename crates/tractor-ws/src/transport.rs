//! Transport seam between the stream client and the socket library.
//!
//! `StreamClient` only needs "connect" and "next text frame"; keeping those
//! behind traits lets the reconnect policy run against scripted transports.

use crate::error::{WsError, WsResult};
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

/// An open full-duplex text channel.
pub trait Transport: Send {
    /// Next inbound text frame.
    ///
    /// Returns `None` once the stream has ended, or `Some(Err(_))` when the
    /// peer closed or the socket failed. Control frames are handled here.
    fn next_text(&mut self) -> impl Future<Output = Option<WsResult<String>>> + Send;

    /// Close the channel, best-effort.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Opens transports to a URL.
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport + 'static;

    fn connect(&self, url: &str) -> impl Future<Output = WsResult<Self::Transport>> + Send;
}

/// Production connector built on `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl Connector for TungsteniteConnector {
    type Transport = TungsteniteTransport;

    fn connect(&self, url: &str) -> impl Future<Output = WsResult<Self::Transport>> + Send {
        async move {
            info!(url = %url, "Connecting to stream");
            // TCP_NODELAY: frames are small and latency-sensitive
            let (stream, _response) = connect_async_tls_with_config(url, None, true, None)
                .await
                .map_err(|e| WsError::ConnectionFailed(format!("{url}: {e}")))?;
            Ok(TungsteniteTransport { stream })
        }
    }
}

/// A live `tokio-tungstenite` socket.
pub struct TungsteniteTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Transport for TungsteniteTransport {
    fn next_text(&mut self) -> impl Future<Output = Option<WsResult<String>>> + Send {
        async move {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                    Some(Ok(Message::Ping(data))) => {
                        debug!("Received ping, sending pong");
                        if let Err(e) = self.stream.send(Message::Pong(data)).await {
                            return Some(Err(e.into()));
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (f.code.into(), f.reason.to_string()))
                            .unwrap_or((1000, "Normal close".to_string()));
                        warn!(code, %reason, "Stream closed by server");
                        return Some(Err(WsError::ConnectionClosed { code, reason }));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!(len = data.len(), "Ignoring binary frame");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Some(Err(e.into())),
                    None => return None,
                }
            }
        }
    }

    fn close(&mut self) -> impl Future<Output = ()> + Send {
        async move {
            if let Err(e) = self.stream.close(None).await {
                debug!(?e, "Close frame not delivered");
            }
        }
    }
}
