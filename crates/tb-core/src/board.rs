//! # Board
//!
//! Orchestration over the registry, occupancy grid, and chunk index. The
//! board is the only component collaborators talk to; one instance owns all
//! spatial state for one board and is driven by a single writer. Every
//! mutating operation updates the registry first, then the occupancy grid,
//! then the chunk index, then notifies every chunk whose membership changed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chunks::ChunkIndex;
use crate::config::BoardConfig;
use crate::error::{BoardError, Result};
use crate::models::{
    ChunkCoord, ChunkUpdate, NewPost, NewUser, Post, PostState, TileCoord, User, UserStatus,
};
use crate::occupancy::{clipped_tiles, Occupant, OccupancyGrid};
use crate::registry::EntityRegistry;
use crate::traits::UpdatePublisher;

pub struct Board {
    config: BoardConfig,
    registry: EntityRegistry,
    occupancy: OccupancyGrid,
    chunks: ChunkIndex,
    publisher: Arc<dyn UpdatePublisher>,
    rng: StdRng,
    /// Last sequence number handed out per chunk. Payload ordering within a
    /// chunk is monotonic; ordering across chunks is unspecified.
    chunk_seq: HashMap<ChunkCoord, u64>,
}

impl Board {
    /// Build a board from validated configuration.
    pub fn new(config: BoardConfig, publisher: Arc<dyn UpdatePublisher>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: EntityRegistry::new(config.max_users, config.chunk_size),
            occupancy: OccupancyGrid::new(),
            chunks: ChunkIndex::new(config.chunk_size),
            publisher,
            rng: StdRng::from_os_rng(),
            chunk_seq: HashMap::new(),
            config,
        })
    }

    /// Deterministic placement sampling, for tests and reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // --- User operations ---

    /// Register and place a user.
    ///
    /// With an anchor, exactly that tile (clamped to the board) is
    /// attempted; without one, up to `max_tries` uniformly random tiles are
    /// sampled and the first free one wins. On failure the user stays
    /// registered but unplaced; whether to retry with a larger budget or a
    /// different anchor is the caller's decision. Calling this for an
    /// already-placed identifier is a no-op returning the current position.
    pub fn add_user(&mut self, descriptor: NewUser, max_tries: u32) -> Result<TileCoord> {
        let id = descriptor.id;
        if let Some(existing) = self.registry.user(&id) {
            if let Some(position) = existing.position {
                return Ok(position);
            }
        }

        // 1. Registration: idempotent, capacity-checked.
        let anchor = descriptor.anchor.map(|tile| self.clamp_tile(tile));
        let slot = self.registry.register_user(User {
            id,
            username: descriptor.username,
            status: UserStatus::Active,
            last_seen: Utc::now(),
            client_w: descriptor.client_w,
            client_h: descriptor.client_h,
            anchor,
            position: None,
            chunk: None,
        })?;

        // 2. Spawn search: exact anchor, or bounded rejection sampling.
        let position = match anchor {
            Some(tile) => {
                if !self.occupancy.is_free(tile) {
                    return Err(BoardError::AnchorOccupied {
                        x: tile.x,
                        y: tile.y,
                    });
                }
                tile
            }
            None => self.sample_free_tile(max_tries)?,
        };

        // 3. Commit: registry, occupancy, chunk subscription, notification.
        let chunk = self.registry.place_user(id, position)?;
        self.occupancy.occupy(position, Occupant::User(id));
        self.chunks.subscribe_user(id, chunk);
        info!(user = %id, slot, x = position.x, y = position.y, "user placed");
        self.notify_chunk(chunk);
        Ok(position)
    }

    /// Move a placed user by a relative offset, each axis clamped
    /// independently to the board. A clamped destination equal to the
    /// current position is a no-op. The move is all-or-nothing: on
    /// `TargetOccupied` the user has not moved.
    pub fn move_user(&mut self, id: Uuid, dx: i32, dy: i32) -> Result<TileCoord> {
        let old_pos = self
            .registry
            .user(&id)
            .and_then(|user| user.position)
            .ok_or(BoardError::UnknownUser(id))?;

        let new_pos = self.clamp_tile(TileCoord::new(
            old_pos.x.saturating_add(dx),
            old_pos.y.saturating_add(dy),
        ));
        if new_pos == old_pos {
            return Ok(old_pos);
        }
        if !self.occupancy.is_free(new_pos) {
            return Err(BoardError::TargetOccupied {
                x: new_pos.x,
                y: new_pos.y,
            });
        }

        let old_chunk = self.chunks.chunk_of(old_pos);
        self.occupancy.release(old_pos, Occupant::User(id));
        self.occupancy.occupy(new_pos, Occupant::User(id));
        let new_chunk = self.registry.place_user(id, new_pos)?;

        if new_chunk != old_chunk {
            self.chunks.unsubscribe_user(id, old_chunk);
            self.chunks.subscribe_user(id, new_chunk);
            debug!(user = %id, ?old_chunk, ?new_chunk, "user crossed chunk boundary");
            // Both sides get a snapshot so watchers of either reconcile.
            self.notify_chunk(old_chunk);
            self.notify_chunk(new_chunk);
        }
        Ok(new_pos)
    }

    /// Remove a user and purge every entry referencing it. The slot returns
    /// to the registry free list for reuse.
    pub fn remove_user(&mut self, id: Uuid) -> Result<()> {
        let user = self.registry.remove_user(id)?;
        if let (Some(position), Some(chunk)) = (user.position, user.chunk) {
            self.occupancy.release(position, Occupant::User(id));
            self.chunks.unsubscribe_user(id, chunk);
            self.notify_chunk(chunk);
        }
        info!(user = %id, username = %user.username, "user removed");
        Ok(())
    }

    /// Update a user's presence status and last-seen timestamp. Chunk
    /// payloads carry identifiers, not status, so nothing is notified.
    pub fn set_user_status(&mut self, id: Uuid, status: UserStatus) -> Result<()> {
        self.registry.set_user_status(id, status)
    }

    // --- Post operations ---

    /// Place a post. The footprint is clipped to the board before any index
    /// is touched and is stored clipped; a footprint wholly outside the
    /// board is rejected. Tile-level blocking applies only to posts whose
    /// nominal area is below the small-object threshold; larger posts are
    /// discoverable through chunk queries without inflating the grid.
    pub fn add_post(&mut self, descriptor: NewPost) -> Result<Post> {
        let author_chunk = self
            .registry
            .user(&descriptor.author)
            .map(|author| author.chunk)
            .ok_or(BoardError::UnknownUser(descriptor.author))?;
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(BoardError::OutOfBounds(format!(
                "post size must be at least 1x1, got {}x{}",
                descriptor.width, descriptor.height
            )));
        }
        let (origin, width, height) = self
            .clip_rect(descriptor.origin, descriptor.width, descriptor.height)
            .ok_or_else(|| {
                BoardError::OutOfBounds(format!(
                    "post footprint at ({}, {}) lies outside the board",
                    descriptor.origin.x, descriptor.origin.y
                ))
            })?;

        let post = Post {
            id: Uuid::now_v7(),
            kind: descriptor.kind,
            media_id: descriptor.media_id,
            created_at: Utc::now(),
            author: descriptor.author,
            origin,
            width,
            height,
            state: PostState::Active,
        };
        let id = post.id;

        // 1. Registry, then chunk registration on the clipped rectangle.
        self.registry.add_post(post.clone());
        self.chunks.register_post_footprint(id, origin, width, height);

        // 2. Tile-level blocking for small footprints only. Tiles already
        //    held (a user standing inside the footprint) keep their holder.
        if descriptor.width * descriptor.height < self.config.small_post_threshold {
            for tile in clipped_tiles(origin, width, height, self.config.width, self.config.height)
            {
                if self.occupancy.is_free(tile) {
                    self.occupancy.occupy(tile, Occupant::Post(id));
                }
            }
        }

        // 3. Notify the chunk containing the placing user, if placed.
        info!(post = %id, author = %post.author, x = origin.x, y = origin.y, "post placed");
        if let Some(chunk) = author_chunk {
            self.notify_chunk(chunk);
        }
        Ok(post)
    }

    /// Archive a post: transition its lifecycle state and purge it from the
    /// chunk index and occupancy grid. The removal walks the same clipped
    /// rectangle that registered the footprint, so the spans match exactly.
    pub fn archive_post(&mut self, id: Uuid) -> Result<Post> {
        let mut post = self.registry.remove_post(id)?;
        post.state = PostState::Archived;

        let touched = self.chunks.chunks_for_rect(post.origin, post.width, post.height);
        self.chunks
            .unregister_post_footprint(id, post.origin, post.width, post.height);
        if post.width * post.height < self.config.small_post_threshold {
            for tile in clipped_tiles(
                post.origin,
                post.width,
                post.height,
                self.config.width,
                self.config.height,
            ) {
                self.occupancy.release(tile, Occupant::Post(id));
            }
        }

        info!(post = %id, chunks = touched.len(), "post archived");
        for chunk in touched {
            self.notify_chunk(chunk);
        }
        Ok(post)
    }

    // --- Queries ---

    /// All active posts whose footprint truly overlaps the query rectangle.
    ///
    /// Two phases: the chunk index bounds a coarse candidate set (possibly
    /// over-inclusive, since a post can touch a chunk without touching the
    /// rectangle), then an exact axis-aligned intersection test removes
    /// every false positive. No duplicates, no false negatives.
    pub fn posts_in_viewport(&self, x: i32, y: i32, w: u32, h: u32) -> Vec<Post> {
        let mut candidates: HashSet<Uuid> = HashSet::new();
        for chunk in self.chunks.chunks_for_rect(TileCoord::new(x, y), w, h) {
            candidates.extend(self.chunks.posts_touching(chunk));
        }

        let x1 = x.saturating_add(w as i32);
        let y1 = y.saturating_add(h as i32);
        candidates
            .into_iter()
            .filter_map(|id| {
                let post = self.registry.post(&id);
                debug_assert!(post.is_some(), "chunk index references missing post {id}");
                post
            })
            .filter(|post| {
                let right = post.origin.x + post.width as i32;
                let top = post.origin.y + post.height as i32;
                !(right <= x || post.origin.x >= x1 || top <= y || post.origin.y >= y1)
            })
            .cloned()
            .collect()
    }

    pub fn user(&self, id: &Uuid) -> Option<&User> {
        self.registry.user(id)
    }

    pub fn post(&self, id: &Uuid) -> Option<&Post> {
        self.registry.post(id)
    }

    pub fn user_count(&self) -> usize {
        self.registry.user_count()
    }

    pub fn post_count(&self) -> usize {
        self.registry.post_count()
    }

    pub fn is_tile_free(&self, tile: TileCoord) -> bool {
        self.occupancy.is_free(tile)
    }

    pub fn chunk_of(&self, tile: TileCoord) -> ChunkCoord {
        self.chunks.chunk_of(tile)
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    // --- Internals ---

    fn clamp_tile(&self, tile: TileCoord) -> TileCoord {
        TileCoord::new(
            tile.x.clamp(0, self.config.width as i32 - 1),
            tile.y.clamp(0, self.config.height as i32 - 1),
        )
    }

    /// Intersect a footprint with the board; `None` when nothing remains.
    fn clip_rect(&self, origin: TileCoord, w: u32, h: u32) -> Option<(TileCoord, u32, u32)> {
        let x0 = origin.x.max(0);
        let y0 = origin.y.max(0);
        let x1 = origin.x.saturating_add(w as i32).min(self.config.width as i32);
        let y1 = origin.y.saturating_add(h as i32).min(self.config.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((TileCoord::new(x0, y0), (x1 - x0) as u32, (y1 - y0) as u32))
    }

    fn sample_free_tile(&mut self, max_tries: u32) -> Result<TileCoord> {
        for _ in 0..max_tries {
            let tile = TileCoord::new(
                self.rng.random_range(0..self.config.width as i32),
                self.rng.random_range(0..self.config.height as i32),
            );
            if self.occupancy.is_free(tile) {
                return Ok(tile);
            }
        }
        Err(BoardError::NoFreeTile { tries: max_tries })
    }

    /// Assemble and publish the full membership snapshot for one chunk,
    /// stamped with that chunk's next sequence number.
    fn notify_chunk(&mut self, chunk: ChunkCoord) {
        let seq = self.chunk_seq.entry(chunk).or_insert(0);
        *seq += 1;
        let update = ChunkUpdate {
            chunk,
            seq: *seq,
            users: self.chunks.users_in(chunk).collect(),
            posts: self
                .chunks
                .posts_touching(chunk)
                .filter_map(|id| self.registry.post(&id).cloned())
                .collect(),
        };
        debug!(
            ?chunk,
            seq = update.seq,
            users = update.users.len(),
            posts = update.posts.len(),
            "chunk update"
        );
        self.publisher.publish(update);
    }
}
