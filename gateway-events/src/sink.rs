//! Push sinks
//!
//! A sink is the write half of one push channel. The transport owns the read
//! half and turns frames into its own wire format.

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::types::PushFrame;

/// Sink error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The channel is closed
    #[error("Sink closed")]
    Closed,

    /// The reader has fallen too far behind
    #[error("Sink full")]
    Full,
}

/// Write side of a push channel.
pub trait EventSink: Send + Sync {
    /// Write one frame. Fails once the channel is closed.
    fn write(&self, frame: PushFrame) -> Result<(), SinkError>;

    /// Close the channel. Closing twice is a no-op.
    fn close(&self);

    /// Check if the channel is closed.
    fn is_closed(&self) -> bool;
}

/// Frames buffered for a reader before writes start failing.
pub const DEFAULT_SINK_CAPACITY: usize = 64;

/// Sink backed by a bounded tokio channel.
///
/// Writes never wait. A reader that stops draining fills the buffer and
/// later writes fail with [`SinkError::Full`].
#[derive(Debug)]
pub struct ChannelSink {
    sender: Mutex<Option<mpsc::Sender<PushFrame>>>,
}

impl ChannelSink {
    /// Create a sink and the receiver the transport reads frames from.
    pub fn channel() -> (Self, mpsc::Receiver<PushFrame>) {
        Self::with_capacity(DEFAULT_SINK_CAPACITY)
    }

    /// Create a sink buffering at most `capacity` unread frames.
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<PushFrame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }
}

impl EventSink for ChannelSink {
    fn write(&self, frame: PushFrame) -> Result<(), SinkError> {
        match self.sender.lock().as_ref() {
            Some(tx) => tx.try_send(frame).map_err(|e| match e {
                TrySendError::Full(_) => SinkError::Full,
                TrySendError::Closed(_) => SinkError::Closed,
            }),
            None => Err(SinkError::Closed),
        }
    }

    fn close(&self) {
        self.sender.lock().take();
    }

    fn is_closed(&self) -> bool {
        self.sender.lock().as_ref().map_or(true, |tx| tx.is_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PushMessage;

    fn frame() -> PushFrame {
        PushFrame::encode(&PushMessage::heartbeat()).unwrap()
    }

    #[tokio::test]
    async fn test_write_then_receive() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.write(frame()).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event.as_str(), "heartbeat");
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.close();
        sink.close();

        assert!(sink.is_closed());
        assert_eq!(sink.write(frame()), Err(SinkError::Closed));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_undrained_reader_fills_up() {
        let (sink, mut rx) = ChannelSink::with_capacity(2);
        sink.write(frame()).unwrap();
        sink.write(frame()).unwrap();
        assert_eq!(sink.write(frame()), Err(SinkError::Full));
        assert!(!sink.is_closed());

        rx.recv().await.unwrap();
        assert_eq!(sink.write(frame()), Ok(()));
    }

    #[test]
    fn test_dropped_receiver_fails_write() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);

        assert!(sink.is_closed());
        assert_eq!(sink.write(frame()), Err(SinkError::Closed));
    }
}
