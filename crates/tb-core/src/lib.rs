//! # tb-core
//!
//! The chunked spatial index and occupancy engine behind Tileboard: a
//! bounded 2D grid shared by many connected users and placed posts. The
//! board answers point-occupancy and viewport queries without scanning the
//! whole grid, and tells the hosting service which chunks changed after
//! every mutation. Transport, authentication, persistence, and rendering are
//! external collaborators reached through the ports in [`traits`].

pub mod board;
pub mod chunks;
pub mod config;
pub mod error;
pub mod models;
pub mod occupancy;
pub mod registry;
pub mod traits;

// Re-exporting for easier access in other crates
pub use board::Board;
pub use config::BoardConfig;
pub use error::{BoardError, Result};
pub use models::*;
pub use traits::{NullPublisher, UpdatePublisher};
