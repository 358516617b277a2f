//! Bridges `RetryExecutor`'s byte-oriented `ClientConnection` trait to an
//! axum response body (§4.3, §7). Bytes flow through an mpsc channel; the
//! HTTP handler races the first recv against the executor's `JoinHandle`
//! to decide whether to answer with a streaming 200 or an error body.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use polyroute_dispatch::ClientConnection;

/// One per in-flight proxy request. `disconnected` flips when the axum
/// body stream's receiver is dropped, which `send` observes as a failed
/// channel send.
pub struct ChannelConnection {
    tx: mpsc::Sender<Bytes>,
    disconnected: AtomicBool,
}

impl ChannelConnection {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                disconnected: AtomicBool::new(false),
            },
            rx,
        )
    }
}

#[async_trait]
impl ClientConnection for ChannelConnection {
    async fn send(&self, chunk: Bytes) -> bool {
        if self.tx.send(chunk).await.is_err() {
            self.disconnected.store(true, Ordering::Relaxed);
            return false;
        }
        true
    }

    fn is_cancelled(&self) -> bool {
        self.disconnected.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_succeeds_while_receiver_is_alive() {
        let (conn, mut rx) = ChannelConnection::new(4);
        assert!(conn.send(Bytes::from_static(b"chunk")).await);
        assert_eq!(rx.recv().await, Some(Bytes::from_static(b"chunk")));
        assert!(!conn.is_cancelled());
    }

    #[tokio::test]
    async fn send_reports_disconnect_once_receiver_drops() {
        let (conn, rx) = ChannelConnection::new(4);
        drop(rx);
        assert!(!conn.send(Bytes::from_static(b"chunk")).await);
        assert!(conn.is_cancelled());
    }
}
