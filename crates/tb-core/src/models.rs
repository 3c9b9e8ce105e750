//! # Domain Models
//!
//! These structs represent the core entities of the Tileboard grid: users
//! wandering the board, posts pinned onto it, and the chunk snapshot pushed
//! to subscribers. Posts use UUID v7 for time-ordered, globally unique
//! identification; user identifiers arrive pre-validated from the identity
//! collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single tile on the board, addressed by its lower-left corner.
/// Valid coordinates lie in `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Coordinate of one fixed-size square chunk of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
}

impl ChunkCoord {
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    /// The chunk containing a tile: componentwise `floor(coord / chunk_size)`.
    pub fn containing(tile: TileCoord, chunk_size: u32) -> Self {
        let cs = chunk_size as i32;
        Self {
            cx: tile.x.div_euclid(cs),
            cy: tile.y.div_euclid(cs),
        }
    }
}

/// Presence state of a connected user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Idle,
    Disconnected,
}

/// A participant currently known to the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier issued upstream by the identity collaborator.
    pub id: Uuid,
    pub username: String,
    pub status: UserStatus,
    pub last_seen: DateTime<Utc>,
    /// Viewport dimensions declared by the client, in tiles.
    pub client_w: u32,
    pub client_h: u32,
    /// Fixed preferred spawn tile; placement attempts exactly this tile.
    pub anchor: Option<TileCoord>,
    /// Current tile, unset while the user is not placed.
    pub position: Option<TileCoord>,
    /// Chunk containing `position`. Derived, never set directly.
    pub chunk: Option<ChunkCoord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Text,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostState {
    Active,
    Archived,
}

/// A rectangular artifact pinned to the board. The footprint is immutable
/// after placement and stored already clipped to the board bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub kind: PostKind,
    /// Opaque handle resolved by the media collaborator, if any.
    pub media_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Identifier of the placing user.
    pub author: Uuid,
    /// Lower-left tile of the footprint.
    pub origin: TileCoord,
    pub width: u32,
    pub height: u32,
    pub state: PostState,
}

/// Inbound descriptor for [`crate::Board::add_user`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub client_w: u32,
    pub client_h: u32,
    pub anchor: Option<TileCoord>,
}

/// Inbound descriptor for [`crate::Board::add_post`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub kind: PostKind,
    pub media_id: Option<String>,
    pub author: Uuid,
    pub origin: TileCoord,
    pub width: u32,
    pub height: u32,
}

/// Full snapshot of one chunk's membership, pushed to subscribers after any
/// mutation that changed it. Never a diff: receivers replace local state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkUpdate {
    pub chunk: ChunkCoord,
    /// Monotonic per chunk; a subscriber seeing it decrease has observed a
    /// delivery-layer reordering.
    pub seq: u64,
    pub users: Vec<Uuid>,
    pub posts: Vec<Post>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_containing_floors_componentwise() {
        assert_eq!(
            ChunkCoord::containing(TileCoord::new(5, 5), 100),
            ChunkCoord::new(0, 0)
        );
        assert_eq!(
            ChunkCoord::containing(TileCoord::new(99, 100), 100),
            ChunkCoord::new(0, 1)
        );
        assert_eq!(
            ChunkCoord::containing(TileCoord::new(250, 99), 100),
            ChunkCoord::new(2, 0)
        );
    }

    #[test]
    fn post_creation_v7() {
        let id = Uuid::now_v7();
        let post = Post {
            id,
            kind: PostKind::Text,
            media_id: None,
            created_at: Utc::now(),
            author: Uuid::new_v4(),
            origin: TileCoord::new(3, 4),
            width: 2,
            height: 2,
            state: PostState::Active,
        };
        assert_eq!(post.id, id);
        assert_eq!(post.state, PostState::Active);
    }

    #[test]
    fn chunk_update_serializes_with_lowercase_enums() {
        let update = ChunkUpdate {
            chunk: ChunkCoord::new(1, 2),
            seq: 3,
            users: vec![],
            posts: vec![Post {
                id: Uuid::now_v7(),
                kind: PostKind::Image,
                media_id: Some("abc123".into()),
                created_at: Utc::now(),
                author: Uuid::new_v4(),
                origin: TileCoord::new(0, 0),
                width: 1,
                height: 1,
                state: PostState::Active,
            }],
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["chunk"]["cx"], 1);
        assert_eq!(json["posts"][0]["kind"], "image");
        assert_eq!(json["posts"][0]["state"], "active");
    }
}
