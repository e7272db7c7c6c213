//! Core of the territory tile board.
//!
//! Fetches the tile map, decodes it through [`territory_proto`] and derives
//! the filtered and grouped views the inspector renders.

pub mod board;
pub mod config;
pub mod fetch;
pub mod projection;

pub use board::{load_tiles, spawn_load, LoadApplied, LoadOutcome, LoadTicket, TileBoard};
pub use config::{
    load_feed_config, load_feed_config_from_env, FeedConfig, FeedConfigError, FeedConfigMetadata,
};
pub use fetch::{FetchError, HttpTileFetcher, StatusCode, TileFetcher};
pub use projection::{
    filter_by_player, filter_by_status, group_by_status, normalize_player_route, project,
    StatusBuckets, StatusCounts, StatusFilter, TileProjection, UnknownStatusFilter, ViewFilter,
};
pub use territory_proto::{KnownStatus, RawTileMap, TileRecord, TileStatus};
