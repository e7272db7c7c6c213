//! Derived views over a decoded tile list.
//!
//! Everything here is a pure function of its inputs and keeps the order the
//! tiles arrived in.

use std::fmt;
use std::str::FromStr;

use territory_proto::{KnownStatus, TileRecord};
use thiserror::Error;

/// Status selection for the visible list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(KnownStatus),
}

impl StatusFilter {
    pub fn matches(self, tile: &TileRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => tile.known_status() == Some(status),
        }
    }

    /// All → reserved → in progress → complete → All.
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Only(KnownStatus::Reserved),
            StatusFilter::Only(KnownStatus::Reserved) => {
                StatusFilter::Only(KnownStatus::InProgress)
            }
            StatusFilter::Only(KnownStatus::InProgress) => {
                StatusFilter::Only(KnownStatus::Complete)
            }
            StatusFilter::Only(KnownStatus::Complete) => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.label(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status filter '{0}'")]
pub struct UnknownStatusFilter(pub String);

impl FromStr for StatusFilter {
    type Err = UnknownStatusFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        for status in KnownStatus::ALL {
            if trimmed == status.label() {
                return Ok(StatusFilter::Only(status));
            }
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "all" | "" => Ok(StatusFilter::All),
            "reserved" => Ok(StatusFilter::Only(KnownStatus::Reserved)),
            "in-progress" | "in_progress" | "started" => {
                Ok(StatusFilter::Only(KnownStatus::InProgress))
            }
            "complete" | "completed" | "done" => Ok(StatusFilter::Only(KnownStatus::Complete)),
            _ => Err(UnknownStatusFilter(value.to_string())),
        }
    }
}

/// Player route plus status selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    pub player: Option<String>,
    pub status: StatusFilter,
}

impl ViewFilter {
    pub fn new(player: Option<&str>, status: StatusFilter) -> Self {
        Self {
            player: normalize_player_route(player),
            status,
        }
    }
}

/// Empty or blank route segments mean "no player selected". Any other id is
/// kept verbatim and compared with exact string equality.
pub fn normalize_player_route(player: Option<&str>) -> Option<String> {
    player_id(player).map(str::to_string)
}

fn player_id(player: Option<&str>) -> Option<&str> {
    player.filter(|id| !id.trim().is_empty())
}

pub fn filter_by_player<'a, I>(tiles: I, player: Option<&str>) -> Vec<&'a TileRecord>
where
    I: IntoIterator<Item = &'a TileRecord>,
{
    match player_id(player) {
        Some(id) => tiles
            .into_iter()
            .filter(|tile| tile.player.as_deref() == Some(id))
            .collect(),
        None => tiles.into_iter().collect(),
    }
}

pub fn filter_by_status<'a, I>(tiles: I, filter: StatusFilter) -> Vec<&'a TileRecord>
where
    I: IntoIterator<Item = &'a TileRecord>,
{
    tiles
        .into_iter()
        .filter(|tile| filter.matches(tile))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBuckets<'a> {
    pub reserved: Vec<&'a TileRecord>,
    pub in_progress: Vec<&'a TileRecord>,
    pub complete: Vec<&'a TileRecord>,
    /// Unknown status, format errors and tiles without a status.
    pub unrecognized: Vec<&'a TileRecord>,
}

impl<'a> StatusBuckets<'a> {
    pub fn bucket(&self, status: KnownStatus) -> &[&'a TileRecord] {
        match status {
            KnownStatus::Reserved => &self.reserved,
            KnownStatus::InProgress => &self.in_progress,
            KnownStatus::Complete => &self.complete,
        }
    }

    pub fn total(&self) -> usize {
        self.reserved.len() + self.in_progress.len() + self.complete.len() + self.unrecognized.len()
    }
}

pub fn group_by_status<'a, I>(tiles: I) -> StatusBuckets<'a>
where
    I: IntoIterator<Item = &'a TileRecord>,
{
    let mut buckets = StatusBuckets::default();
    for tile in tiles {
        match tile.known_status() {
            Some(KnownStatus::Reserved) => buckets.reserved.push(tile),
            Some(KnownStatus::InProgress) => buckets.in_progress.push(tile),
            Some(KnownStatus::Complete) => buckets.complete.push(tile),
            None => buckets.unrecognized.push(tile),
        }
    }
    buckets
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub reserved: usize,
    pub in_progress: usize,
    pub complete: usize,
    pub unrecognized: usize,
    pub total: usize,
}

impl StatusCounts {
    pub fn from_buckets(buckets: &StatusBuckets<'_>) -> Self {
        Self {
            reserved: buckets.reserved.len(),
            in_progress: buckets.in_progress.len(),
            complete: buckets.complete.len(),
            unrecognized: buckets.unrecognized.len(),
            total: buckets.total(),
        }
    }

    pub fn count(&self, status: KnownStatus) -> usize {
        match status {
            KnownStatus::Reserved => self.reserved,
            KnownStatus::InProgress => self.in_progress,
            KnownStatus::Complete => self.complete,
        }
    }
}

/// Everything a board view renders for one filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileProjection<'a> {
    /// Tiles for the selected player (all tiles without a route).
    pub for_player: Vec<&'a TileRecord>,
    pub buckets: StatusBuckets<'a>,
    pub counts: StatusCounts,
    /// `for_player` narrowed by the status filter.
    pub visible: Vec<&'a TileRecord>,
}

pub fn project<'a>(tiles: &'a [TileRecord], filter: &ViewFilter) -> TileProjection<'a> {
    let for_player = filter_by_player(tiles, filter.player.as_deref());
    let buckets = group_by_status(for_player.iter().copied());
    let counts = StatusCounts::from_buckets(&buckets);
    let visible = filter_by_status(for_player.iter().copied(), filter.status);
    TileProjection {
        for_player,
        buckets,
        counts,
        visible,
    }
}
