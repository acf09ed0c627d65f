//! Live delivery targets.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Delivery failure. The hub recovers by falling back to queuing.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,

    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Something that can carry a text message to the observer of a task.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, text: String) -> Result<(), TransportError>;
}

/// Transport backed by a bounded channel drained by a connection task.
///
/// Sends never wait: a full buffer means the connection is not keeping up
/// and is reported as a failure, like a dropped receiver.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<String>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Create a transport and the receiver the connection task reads from.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send_text(&self, text: String) -> Result<(), TransportError> {
        self.tx.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                TransportError::SendFailed("buffer full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_transport_delivers() {
        let (transport, mut rx) = ChannelTransport::channel(4);
        transport.send_text("hello".to_string()).await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_channel_transport_closed_receiver() {
        let (transport, rx) = ChannelTransport::channel(4);
        drop(rx);
        let result = transport.send_text("hello".to_string()).await;
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_channel_transport_full_buffer_fails() {
        let (transport, _rx) = ChannelTransport::channel(1);
        transport.send_text("first".to_string()).await.unwrap();
        let result = transport.send_text("second".to_string()).await;
        assert!(matches!(result, Err(TransportError::SendFailed(_))));
    }
}
