//! # BoardError
//!
//! Centralized error handling for the Tileboard engine. Every failure path
//! returns a distinguishable variant; nothing is reported as a bare boolean,
//! and nothing is retried internally. Retry policy belongs to callers.

use thiserror::Error;
use uuid::Uuid;

/// The primary error type for all tb-core operations.
#[derive(Error, Debug)]
pub enum BoardError {
    /// No user registered under this identifier.
    #[error("unknown user {0}")]
    UnknownUser(Uuid),

    /// No post registered under this identifier.
    #[error("unknown post {0}")]
    UnknownPost(Uuid),

    /// The user's fixed spawn anchor is already held by another entity.
    #[error("anchor tile ({x}, {y}) is occupied")]
    AnchorOccupied { x: i32, y: i32 },

    /// Random placement exhausted its attempt budget without finding a free
    /// tile. The user stays registered but unplaced.
    #[error("no free tile found in {tries} placement attempts")]
    NoFreeTile { tries: u32 },

    /// The clamped move destination is held by another entity; the move is
    /// all-or-nothing and the user has not moved.
    #[error("target tile ({x}, {y}) is occupied")]
    TargetOccupied { x: i32, y: i32 },

    /// The registry is at its configured maximum user count.
    #[error("user capacity exceeded ({max} users)")]
    CapacityExceeded { max: usize },

    /// Invalid board/chunk configuration, or a post footprint with no
    /// presence on the board.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),
}

/// A specialized Result type for Tileboard logic.
pub type Result<T> = std::result::Result<T, BoardError>;
