//! # Board Configuration
//!
//! Construction-time knobs for the engine. The assembly binary layers an
//! optional `tileboard.toml` and `TILEBOARD_`-prefixed environment variables
//! over these defaults before handing the result to [`crate::Board::new`].

use serde::Deserialize;

use crate::error::{BoardError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Board width in tiles.
    pub width: u32,
    /// Board height in tiles.
    pub height: u32,
    /// Edge length of the square chunks used for subscription and querying.
    pub chunk_size: u32,
    /// Posts with `width * height` strictly below this mark their tiles in
    /// the occupancy grid; larger posts are tracked at chunk granularity
    /// only. Documented tradeoff: exact occupancy for index size.
    pub small_post_threshold: u32,
    /// Attempt budget for random placement before `NoFreeTile`.
    pub max_placement_tries: u32,
    /// Maximum concurrently registered users.
    pub max_users: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            chunk_size: 100,
            small_post_threshold: 1000,
            max_placement_tries: 10,
            max_users: 10_000,
        }
    }
}

impl BoardConfig {
    /// Validate before a board is built from this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BoardError::OutOfBounds(format!(
                "board dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.chunk_size == 0 {
            return Err(BoardError::OutOfBounds(
                "chunk size must be positive".into(),
            ));
        }
        if self.max_users == 0 {
            return Err(BoardError::OutOfBounds(
                "max_users must be positive".into(),
            ));
        }
        if self.width % self.chunk_size != 0 || self.height % self.chunk_size != 0 {
            // Legal, but partial edge chunks make capacity reasoning harder.
            tracing::warn!(
                width = self.width,
                height = self.height,
                chunk_size = self.chunk_size,
                "chunk size does not evenly divide the board dimensions"
            );
        }
        Ok(())
    }
}
