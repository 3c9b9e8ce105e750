//! # Tileboard Binary
//!
//! Assembles the engine for a live session: configuration, logging, the
//! update delivery channel, and a short scripted session driving the board.
//! A real deployment replaces the logging consumer with the transport layer
//! fanning chunk updates out to subscribed clients.

use std::sync::Arc;

use anyhow::Context;
use tb_core::models::{NewPost, NewUser, PostKind, TileCoord};
use tb_core::{Board, BoardConfig};
use tb_notify_mpsc::MpscUpdatePublisher;
use tracing::info;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // 1. Configuration: defaults, optional tileboard.toml, then environment.
    let config = load_config().context("loading board configuration")?;
    info!(
        width = config.width,
        height = config.height,
        chunk_size = config.chunk_size,
        "tileboard starting"
    );

    // 2. Update delivery: unbounded channel drained by a logging task.
    let (publisher, mut updates) = MpscUpdatePublisher::channel();
    let delivery = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            info!(
                chunk = ?update.chunk,
                seq = update.seq,
                users = update.users.len(),
                posts = update.posts.len(),
                "chunk update"
            );
        }
    });

    // 3. Board: a single writer owns all spatial state.
    let max_tries = config.max_placement_tries;
    let mut board = Board::new(config, Arc::new(publisher))?;

    // 4. Demo session: two users, a post, a viewport query.
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    board.add_user(
        NewUser {
            id: alice,
            username: "alice".into(),
            client_w: 64,
            client_h: 36,
            anchor: Some(TileCoord::new(5, 5)),
        },
        max_tries,
    )?;
    board.add_user(
        NewUser {
            id: bob,
            username: "bob".into(),
            client_w: 64,
            client_h: 36,
            anchor: None,
        },
        max_tries,
    )?;
    board.move_user(alice, 3, 0)?;

    let post = board.add_post(NewPost {
        kind: PostKind::Text,
        media_id: None,
        author: alice,
        origin: TileCoord::new(10, 5),
        width: 4,
        height: 3,
    })?;
    let visible = board.posts_in_viewport(0, 0, 64, 36);
    info!(post = %post.id, visible = visible.len(), "demo session complete");

    // Dropping the board closes the publisher and ends the delivery task.
    drop(board);
    delivery.await?;
    Ok(())
}

fn load_config() -> anyhow::Result<BoardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("tileboard").required(false))
        .add_source(config::Environment::with_prefix("TILEBOARD"))
        .build()?;
    Ok(settings.try_deserialize()?)
}
