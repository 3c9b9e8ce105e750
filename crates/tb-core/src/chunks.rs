//! # Chunk Index
//!
//! Fixed-size square partitioning of the board. Chunks bound the fan-out of
//! subscription notifications and the candidate set of viewport queries
//! independently of total entity count: a query touches only the chunks its
//! rectangle overlaps, never the whole board.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::{ChunkCoord, TileCoord};

/// Maps each chunk to the users located inside it and the posts whose
/// bounding box overlaps it. Chunks with no members have no entry.
#[derive(Debug)]
pub struct ChunkIndex {
    chunk_size: u32,
    users: HashMap<ChunkCoord, HashSet<Uuid>>,
    posts: HashMap<ChunkCoord, HashSet<Uuid>>,
}

impl ChunkIndex {
    pub fn new(chunk_size: u32) -> Self {
        Self {
            chunk_size,
            users: HashMap::new(),
            posts: HashMap::new(),
        }
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn chunk_of(&self, tile: TileCoord) -> ChunkCoord {
        ChunkCoord::containing(tile, self.chunk_size)
    }

    /// Inclusive chunk range covered by a rectangle:
    /// `[floor(x/cs), floor((x+w-1)/cs)]`, same for y.
    ///
    /// The single source of truth for chunk spans. Post registration, post
    /// removal, and viewport queries all go through here, so a footprint's
    /// span at insertion always matches its span at removal.
    pub fn chunks_for_rect(&self, origin: TileCoord, w: u32, h: u32) -> Vec<ChunkCoord> {
        if w == 0 || h == 0 {
            return Vec::new();
        }
        let lo = self.chunk_of(origin);
        let hi = self.chunk_of(TileCoord::new(
            origin.x.saturating_add((w - 1).min(i32::MAX as u32) as i32),
            origin.y.saturating_add((h - 1).min(i32::MAX as u32) as i32),
        ));
        let span = (hi.cx - lo.cx + 1) as i64 * (hi.cy - lo.cy + 1) as i64;
        let mut chunks = Vec::with_capacity(span as usize);
        for cx in lo.cx..=hi.cx {
            for cy in lo.cy..=hi.cy {
                chunks.push(ChunkCoord::new(cx, cy));
            }
        }
        chunks
    }

    pub fn subscribe_user(&mut self, user_id: Uuid, chunk: ChunkCoord) {
        self.users.entry(chunk).or_default().insert(user_id);
    }

    /// Removing the last member deletes the chunk entry; empty sets never
    /// accumulate.
    pub fn unsubscribe_user(&mut self, user_id: Uuid, chunk: ChunkCoord) {
        if let Some(members) = self.users.get_mut(&chunk) {
            members.remove(&user_id);
            if members.is_empty() {
                self.users.remove(&chunk);
            }
        }
    }

    pub fn register_post_footprint(&mut self, post_id: Uuid, origin: TileCoord, w: u32, h: u32) {
        for chunk in self.chunks_for_rect(origin, w, h) {
            self.posts.entry(chunk).or_default().insert(post_id);
        }
    }

    pub fn unregister_post_footprint(&mut self, post_id: Uuid, origin: TileCoord, w: u32, h: u32) {
        for chunk in self.chunks_for_rect(origin, w, h) {
            if let Some(ids) = self.posts.get_mut(&chunk) {
                ids.remove(&post_id);
                if ids.is_empty() {
                    self.posts.remove(&chunk);
                }
            }
        }
    }

    /// Posts whose bounding box overlaps the chunk. Empty for unknown chunks.
    pub fn posts_touching(&self, chunk: ChunkCoord) -> impl Iterator<Item = Uuid> + '_ {
        self.posts.get(&chunk).into_iter().flatten().copied()
    }

    /// Users currently located inside the chunk. Empty for unknown chunks.
    pub fn users_in(&self, chunk: ChunkCoord) -> impl Iterator<Item = Uuid> + '_ {
        self.users.get(&chunk).into_iter().flatten().copied()
    }

    /// Number of chunks with at least one member, users or posts.
    pub fn populated_chunks(&self) -> usize {
        let keys: HashSet<&ChunkCoord> = self.users.keys().chain(self.posts.keys()).collect();
        keys.len()
    }
}
