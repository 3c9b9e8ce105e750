//! # Occupancy Grid
//!
//! Per-tile blocking state. A tile is held by at most one occupant at a
//! time; point queries are O(1) map lookups. Entries are tagged with their
//! holder so releasing one entity's footprint can never free a tile that a
//! different entity is standing on.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::TileCoord;

/// The entity holding a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    User(Uuid),
    Post(Uuid),
}

/// The set of currently blocked tiles.
#[derive(Debug, Default)]
pub struct OccupancyGrid {
    tiles: HashMap<TileCoord, Occupant>,
}

impl OccupancyGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_free(&self, tile: TileCoord) -> bool {
        !self.tiles.contains_key(&tile)
    }

    /// Mark a tile as held. The caller must have checked `is_free` first;
    /// claiming a held tile breaks the caller-engine contract.
    pub fn occupy(&mut self, tile: TileCoord, occupant: Occupant) {
        let prev = self.tiles.insert(tile, occupant);
        debug_assert!(prev.is_none(), "occupy on held tile {tile:?}");
    }

    /// Release a tile if `occupant` is its holder. A mismatched holder is
    /// left untouched.
    pub fn release(&mut self, tile: TileCoord, occupant: Occupant) {
        if self.tiles.get(&tile) == Some(&occupant) {
            self.tiles.remove(&tile);
        }
    }

    pub fn occupant(&self, tile: TileCoord) -> Option<Occupant> {
        self.tiles.get(&tile).copied()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Tiles of the rectangle `origin .. origin + (w, h)` that lie on a board of
/// `board_w x board_h` tiles. Out-of-board portions are silently dropped.
pub fn clipped_tiles(
    origin: TileCoord,
    w: u32,
    h: u32,
    board_w: u32,
    board_h: u32,
) -> impl Iterator<Item = TileCoord> {
    let x0 = origin.x.max(0);
    let y0 = origin.y.max(0);
    let x1 = origin.x.saturating_add(w as i32).min(board_w as i32);
    let y1 = origin.y.saturating_add(h as i32).min(board_h as i32);
    (x0..x1).flat_map(move |x| (y0..y1).map(move |y| TileCoord::new(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(n: u128) -> Occupant {
        Occupant::User(Uuid::from_u128(n))
    }

    #[test]
    fn occupy_then_release_frees_the_tile() {
        let mut grid = OccupancyGrid::new();
        let tile = TileCoord::new(3, 4);
        assert!(grid.is_free(tile));

        grid.occupy(tile, user(1));
        assert!(!grid.is_free(tile));
        assert_eq!(grid.occupant(tile), Some(user(1)));

        grid.release(tile, user(1));
        assert!(grid.is_free(tile));
        assert!(grid.is_empty());
    }

    #[test]
    fn release_by_non_holder_is_ignored() {
        let mut grid = OccupancyGrid::new();
        let tile = TileCoord::new(0, 0);
        grid.occupy(tile, user(1));

        grid.release(tile, user(2));
        assert_eq!(grid.occupant(tile), Some(user(1)));

        grid.release(tile, Occupant::Post(Uuid::from_u128(1)));
        assert!(!grid.is_free(tile));
    }

    #[test]
    fn clipped_tiles_covers_the_full_rect_inside_bounds() {
        let tiles: Vec<_> = clipped_tiles(TileCoord::new(2, 3), 3, 2, 100, 100).collect();
        assert_eq!(tiles.len(), 6);
        assert!(tiles.contains(&TileCoord::new(2, 3)));
        assert!(tiles.contains(&TileCoord::new(4, 4)));
        assert!(!tiles.contains(&TileCoord::new(5, 3)));
    }

    #[test]
    fn clipped_tiles_drops_out_of_board_portions() {
        // 4x4 rect with origin at (-2, -2): only the (0,0)..(2,2) quadrant
        // lies on the board.
        let tiles: Vec<_> = clipped_tiles(TileCoord::new(-2, -2), 4, 4, 100, 100).collect();
        assert_eq!(tiles.len(), 4);

        // Rect hanging over the far edge.
        let tiles: Vec<_> = clipped_tiles(TileCoord::new(98, 0), 5, 1, 100, 100).collect();
        assert_eq!(tiles.len(), 2);

        // Fully outside: nothing.
        assert_eq!(clipped_tiles(TileCoord::new(200, 200), 3, 3, 100, 100).count(), 0);
    }
}
