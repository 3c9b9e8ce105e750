//! # Core Ports
//!
//! Boundary contracts between the engine and its hosting service. The engine
//! owns the board state; collaborators implement these traits to receive what
//! it emits. Protocol and framing are the collaborator's concern.

use crate::models::ChunkUpdate;

/// Outbound delivery contract for chunk membership snapshots.
///
/// Called by the board after every mutation that changed a chunk, at most
/// once per affected chunk per operation. Implementations must not block:
/// delivery is fire-and-forget from the engine's perspective, and per-chunk
/// ordering is the single writer's responsibility, observable through
/// [`ChunkUpdate::seq`].
pub trait UpdatePublisher: Send + Sync {
    fn publish(&self, update: ChunkUpdate);
}

/// Publisher that drops every update. For headless runs and tests that do
/// not observe notifications.
#[derive(Debug, Default)]
pub struct NullPublisher;

impl UpdatePublisher for NullPublisher {
    fn publish(&self, _update: ChunkUpdate) {}
}
