//! Outbound half of the process boundary.

use shared::protocol::{BoundaryMessage, OutboundMessage};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::BridgeError;

/// Fire-and-forget sender towards the far process. Sending never waits for
/// the far side; answers, if any, come back as separate inbound messages.
pub trait Boundary: Send + Sync {
    fn send(&self, message: OutboundMessage) -> Result<(), BridgeError>;
}

/// Boundary backed by an in-process channel. The receiving end is drained by
/// whatever transport actually crosses the process edge.
#[derive(Debug, Clone)]
pub struct ChannelBoundary {
    tx: mpsc::UnboundedSender<BoundaryMessage>,
}

impl ChannelBoundary {
    pub fn new(tx: mpsc::UnboundedSender<BoundaryMessage>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BoundaryMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Boundary for ChannelBoundary {
    fn send(&self, message: OutboundMessage) -> Result<(), BridgeError> {
        let message = BoundaryMessage::from(message);
        debug!(topic = %message.topic, args = message.args.len(), "boundary: send");
        self.tx.send(message).map_err(|_| BridgeError::BoundaryClosed)
    }
}
