//! # tb-notify-mpsc
//!
//! Channel-backed implementation of `UpdatePublisher`. Bridges the engine's
//! fire-and-forget notifications onto an unbounded tokio mpsc channel that a
//! delivery task (websocket fan-out, logging, tests) drains at its own pace.
//! The engine side never awaits: per-chunk ordering comes from the single
//! writer and is preserved by the channel's FIFO guarantee.

use tb_core::models::ChunkUpdate;
use tb_core::traits::UpdatePublisher;
use tokio::sync::mpsc;

pub struct MpscUpdatePublisher {
    tx: mpsc::UnboundedSender<ChunkUpdate>,
}

impl MpscUpdatePublisher {
    /// Build a publisher plus the receiving half for the delivery task.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ChunkUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl UpdatePublisher for MpscUpdatePublisher {
    fn publish(&self, update: ChunkUpdate) {
        // A closed receiver means the delivery layer is shutting down; the
        // update is dropped, never retried.
        if let Err(err) = self.tx.send(update) {
            tracing::debug!(chunk = ?err.0.chunk, "chunk update dropped, delivery channel closed");
        }
    }
}
