//! # Entity Registry
//!
//! Canonical ownership of user and post records. User positions are dense
//! and slot-indexed; slots released by removed users go onto a free list and
//! are handed out again before the dense array grows, so memory is bounded
//! by peak concurrent users rather than by every user ever seen.

use chrono::Utc;
use uuid::Uuid;

use std::collections::HashMap;

use crate::error::{BoardError, Result};
use crate::models::{ChunkCoord, Post, TileCoord, User, UserStatus};

#[derive(Debug)]
pub struct EntityRegistry {
    max_users: usize,
    chunk_size: u32,
    users: HashMap<Uuid, User>,
    /// User id -> stable slot into `positions`.
    slots: HashMap<Uuid, usize>,
    /// Dense slot-indexed positions; `None` while the slot's user is
    /// unplaced.
    positions: Vec<Option<TileCoord>>,
    /// Slots surrendered by removed users, reused before growing.
    free_slots: Vec<usize>,
    posts: HashMap<Uuid, Post>,
}

impl EntityRegistry {
    pub fn new(max_users: usize, chunk_size: u32) -> Self {
        Self {
            max_users,
            chunk_size,
            users: HashMap::new(),
            slots: HashMap::new(),
            positions: Vec::new(),
            free_slots: Vec::new(),
            posts: HashMap::new(),
        }
    }

    // --- Users ---

    /// Assign a stable slot to a new identifier. Re-registering a known
    /// identifier is idempotent: the existing slot is returned and the
    /// stored record is left untouched.
    pub fn register_user(&mut self, user: User) -> Result<usize> {
        if let Some(&slot) = self.slots.get(&user.id) {
            return Ok(slot);
        }
        if self.users.len() >= self.max_users {
            return Err(BoardError::CapacityExceeded {
                max: self.max_users,
            });
        }
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.positions[slot] = None;
                slot
            }
            None => {
                self.positions.push(None);
                self.positions.len() - 1
            }
        };
        self.slots.insert(user.id, slot);
        self.users.insert(user.id, user);
        Ok(slot)
    }

    /// Set a user's position and its derived chunk coordinate. Occupancy is
    /// not checked here; that is the board's job.
    pub fn place_user(&mut self, id: Uuid, position: TileCoord) -> Result<ChunkCoord> {
        let user = self.users.get_mut(&id).ok_or(BoardError::UnknownUser(id))?;
        let chunk = ChunkCoord::containing(position, self.chunk_size);
        user.position = Some(position);
        user.chunk = Some(chunk);
        user.last_seen = Utc::now();
        let slot = *self.slots.get(&id).expect("registered user without slot");
        self.positions[slot] = Some(position);
        Ok(chunk)
    }

    /// Clear a user's position and chunk.
    pub fn unplace_user(&mut self, id: Uuid) -> Result<()> {
        let user = self.users.get_mut(&id).ok_or(BoardError::UnknownUser(id))?;
        user.position = None;
        user.chunk = None;
        let slot = *self.slots.get(&id).expect("registered user without slot");
        self.positions[slot] = None;
        Ok(())
    }

    /// Delete the identifier and return its slot to the free list. The
    /// removed record is handed back so the caller can clean up indices.
    pub fn remove_user(&mut self, id: Uuid) -> Result<User> {
        let user = self.users.remove(&id).ok_or(BoardError::UnknownUser(id))?;
        let slot = self.slots.remove(&id).expect("registered user without slot");
        self.positions[slot] = None;
        self.free_slots.push(slot);
        Ok(user)
    }

    pub fn set_user_status(&mut self, id: Uuid, status: UserStatus) -> Result<()> {
        let user = self.users.get_mut(&id).ok_or(BoardError::UnknownUser(id))?;
        user.status = status;
        user.last_seen = Utc::now();
        Ok(())
    }

    pub fn user(&self, id: &Uuid) -> Option<&User> {
        self.users.get(id)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn slot_of(&self, id: &Uuid) -> Option<usize> {
        self.slots.get(id).copied()
    }

    // --- Posts ---

    pub fn add_post(&mut self, post: Post) {
        let prev = self.posts.insert(post.id, post);
        debug_assert!(prev.is_none(), "duplicate post id");
    }

    pub fn remove_post(&mut self, id: Uuid) -> Result<Post> {
        self.posts.remove(&id).ok_or(BoardError::UnknownPost(id))
    }

    pub fn post(&self, id: &Uuid) -> Option<&Post> {
        self.posts.get(id)
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EntityRegistry {
        EntityRegistry::new(4, 100)
    }

    fn test_user(n: u128) -> User {
        User {
            id: Uuid::from_u128(n),
            username: format!("user{n}"),
            status: UserStatus::Active,
            last_seen: Utc::now(),
            client_w: 64,
            client_h: 36,
            anchor: None,
            position: None,
            chunk: None,
        }
    }

    #[test]
    fn re_registration_returns_the_same_slot() {
        let mut reg = registry();
        let slot = reg.register_user(test_user(1)).unwrap();
        let again = reg.register_user(test_user(1)).unwrap();
        assert_eq!(slot, again);
        assert_eq!(reg.user_count(), 1);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut reg = EntityRegistry::new(2, 100);
        reg.register_user(test_user(1)).unwrap();
        reg.register_user(test_user(2)).unwrap();
        let err = reg.register_user(test_user(3)).unwrap_err();
        assert!(matches!(err, BoardError::CapacityExceeded { max: 2 }));
    }

    #[test]
    fn removed_slots_are_reused() {
        let mut reg = registry();
        let slot1 = reg.register_user(test_user(1)).unwrap();
        reg.register_user(test_user(2)).unwrap();

        reg.remove_user(Uuid::from_u128(1)).unwrap();
        let slot3 = reg.register_user(test_user(3)).unwrap();
        assert_eq!(slot1, slot3);

        // The dense array did not grow past peak usage.
        let slot4 = reg.register_user(test_user(4)).unwrap();
        assert_eq!(slot4, 2);
    }

    #[test]
    fn place_derives_the_chunk_coordinate() {
        let mut reg = registry();
        reg.register_user(test_user(1)).unwrap();
        let chunk = reg
            .place_user(Uuid::from_u128(1), TileCoord::new(250, 99))
            .unwrap();
        assert_eq!(chunk, ChunkCoord::new(2, 0));

        let user = reg.user(&Uuid::from_u128(1)).unwrap();
        assert_eq!(user.position, Some(TileCoord::new(250, 99)));
        assert_eq!(user.chunk, Some(chunk));
    }

    #[test]
    fn unplace_clears_position_and_chunk_together() {
        let mut reg = registry();
        reg.register_user(test_user(1)).unwrap();
        reg.place_user(Uuid::from_u128(1), TileCoord::new(5, 5)).unwrap();
        reg.unplace_user(Uuid::from_u128(1)).unwrap();

        let user = reg.user(&Uuid::from_u128(1)).unwrap();
        assert!(user.position.is_none());
        assert!(user.chunk.is_none());
    }

    #[test]
    fn operations_on_unknown_users_fail() {
        let mut reg = registry();
        let ghost = Uuid::from_u128(9);
        assert!(matches!(
            reg.place_user(ghost, TileCoord::new(0, 0)),
            Err(BoardError::UnknownUser(_))
        ));
        assert!(matches!(reg.remove_user(ghost), Err(BoardError::UnknownUser(_))));
        assert!(matches!(
            reg.set_user_status(ghost, UserStatus::Idle),
            Err(BoardError::UnknownUser(_))
        ));
    }

    #[test]
    fn post_map_inserts_and_removes() {
        let mut reg = registry();
        let post = Post {
            id: Uuid::now_v7(),
            kind: crate::models::PostKind::Text,
            media_id: None,
            created_at: Utc::now(),
            author: Uuid::from_u128(1),
            origin: TileCoord::new(0, 0),
            width: 2,
            height: 2,
            state: crate::models::PostState::Active,
        };
        let id = post.id;
        reg.add_post(post);
        assert_eq!(reg.post_count(), 1);

        let removed = reg.remove_post(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(matches!(reg.remove_post(id), Err(BoardError::UnknownPost(_))));
    }
}
