//! View-load state for the tile board.
//!
//! Each route change starts a load identified by a generation number. Loads
//! are never cancelled; an outcome whose generation is no longer current is
//! dropped so the board always shows the newest request.

use std::sync::Arc;

use territory_proto::{decode_tile_map, TileRecord};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::fetch::{FetchError, TileFetcher};
use crate::projection::{normalize_player_route, project, StatusFilter, TileProjection, ViewFilter};

/// Identifies one load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub route: Option<String>,
}

/// Result of a finished load task, carried back to the board.
#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: LoadTicket,
    pub result: Result<Vec<TileRecord>, FetchError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadApplied {
    Loaded { tiles: usize },
    Failed,
    Stale,
}

#[derive(Debug, Default)]
pub struct TileBoard {
    tiles: Vec<TileRecord>,
    loading: bool,
    error: Option<String>,
    route: Option<String>,
    generation: u64,
}

impl TileBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tiles(&self) -> &[TileRecord] {
        &self.tiles
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Route change: the board enters the loading state for `route`.
    pub fn navigate(&mut self, route: Option<&str>) -> LoadTicket {
        self.route = normalize_player_route(route);
        self.generation += 1;
        self.loading = true;
        self.error = None;
        debug!(
            target: "territory::board",
            generation = self.generation,
            route = ?self.route,
            "board.load.requested"
        );
        LoadTicket {
            generation: self.generation,
            route: self.route.clone(),
        }
    }

    pub fn refresh(&mut self) -> LoadTicket {
        let route = self.route.clone();
        self.navigate(route.as_deref())
    }

    /// Apply a finished load. Tiles, loading flag and error change together.
    pub fn apply(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Vec<TileRecord>, FetchError>,
    ) -> LoadApplied {
        if ticket.generation != self.generation {
            debug!(
                target: "territory::board",
                stale = ticket.generation,
                current = self.generation,
                "board.load.discarded"
            );
            return LoadApplied::Stale;
        }

        self.loading = false;
        match result {
            Ok(tiles) => {
                let count = tiles.len();
                self.tiles = tiles;
                self.error = None;
                info!(target: "territory::board", tiles = count, "board.load.applied");
                LoadApplied::Loaded { tiles: count }
            }
            Err(err) => {
                self.tiles.clear();
                self.error = Some(err.to_string());
                warn!(target: "territory::board", error = %err, "board.load.failed");
                LoadApplied::Failed
            }
        }
    }

    pub fn apply_outcome(&mut self, outcome: LoadOutcome) -> LoadApplied {
        self.apply(&outcome.ticket, outcome.result)
    }

    pub fn projection(&self, status: StatusFilter) -> TileProjection<'_> {
        let filter = ViewFilter {
            player: self.route.clone(),
            status,
        };
        project(&self.tiles, &filter)
    }
}

/// One fetch attempt followed by decoding.
pub async fn load_tiles<F: TileFetcher>(fetcher: &F) -> Result<Vec<TileRecord>, FetchError> {
    let raw = fetcher.fetch().await?;
    Ok(decode_tile_map(&raw))
}

/// Start the load task for `ticket` on the current tokio runtime.
pub fn spawn_load<F: TileFetcher>(
    fetcher: Arc<F>,
    ticket: LoadTicket,
    sender: UnboundedSender<LoadOutcome>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = load_tiles(fetcher.as_ref()).await;
        if sender.send(LoadOutcome { ticket, result }).is_err() {
            debug!(target: "territory::board", "board.load.receiver_closed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use territory_proto::{RawTileMap, TileStatus};
    use tokio::sync::mpsc::unbounded_channel;

    fn raw_map(body: &str) -> RawTileMap {
        serde_json::from_str(body).expect("test body parses")
    }

    struct CannedFetcher {
        body: &'static str,
        delay: Duration,
    }

    impl TileFetcher for CannedFetcher {
        async fn fetch(&self) -> Result<RawTileMap, FetchError> {
            tokio::time::sleep(self.delay).await;
            Ok(raw_map(self.body))
        }
    }

    struct FailingFetcher;

    impl TileFetcher for FailingFetcher {
        async fn fetch(&self) -> Result<RawTileMap, FetchError> {
            Err(FetchError::Status(reqwest::StatusCode::BAD_GATEWAY))
        }
    }

    struct CountingFetcher {
        calls: Mutex<u32>,
    }

    impl TileFetcher for CountingFetcher {
        async fn fetch(&self) -> Result<RawTileMap, FetchError> {
            *self.calls.lock().expect("calls mutex poisoned") += 1;
            Ok(RawTileMap::new())
        }
    }

    #[test]
    fn navigate_enters_loading_and_bumps_generation() {
        let mut board = TileBoard::new();
        assert!(!board.is_loading());
        let first = board.navigate(Some("7"));
        assert!(board.is_loading());
        assert_eq!(first.generation, 1);
        assert_eq!(first.route.as_deref(), Some("7"));
        let second = board.refresh();
        assert_eq!(second.generation, 2);
        assert_eq!(second.route.as_deref(), Some("7"));
    }

    #[test]
    fn failure_clears_tiles_and_sets_error() {
        let mut board = TileBoard::new();
        let ticket = board.navigate(None);
        board.apply(
            &ticket,
            Ok(vec![TileRecord::new("A1", TileStatus::Complete, "7")]),
        );
        assert_eq!(board.tiles().len(), 1);

        let ticket = board.refresh();
        let applied = board.apply(
            &ticket,
            Err(FetchError::Status(reqwest::StatusCode::NOT_FOUND)),
        );
        assert_eq!(applied, LoadApplied::Failed);
        assert!(!board.is_loading());
        assert!(board.tiles().is_empty());
        assert!(!board.error().unwrap_or_default().is_empty());
    }

    #[test]
    fn stale_outcome_is_discarded() {
        let mut board = TileBoard::new();
        let old = board.navigate(Some("3"));
        let new = board.navigate(Some("7"));

        let applied = board.apply(&new, Ok(vec![TileRecord::new("A1", TileStatus::Complete, "7")]));
        assert_eq!(applied, LoadApplied::Loaded { tiles: 1 });

        let applied = board.apply(
            &old,
            Ok(vec![TileRecord::new("Z9", TileStatus::Reserved, "3")]),
        );
        assert_eq!(applied, LoadApplied::Stale);
        assert_eq!(board.tiles()[0].name, "A1");
        assert_eq!(board.route(), Some("7"));
    }

    #[test]
    fn stale_outcome_does_not_end_loading() {
        let mut board = TileBoard::new();
        let old = board.navigate(None);
        let _new = board.navigate(Some("7"));
        board.apply(&old, Ok(Vec::new()));
        assert!(board.is_loading());
    }

    #[test]
    fn route_is_kept_verbatim_unless_blank() {
        let mut board = TileBoard::new();
        assert_eq!(board.navigate(Some(" 7 ")).route.as_deref(), Some(" 7 "));
        assert_eq!(board.navigate(Some("   ")).route, None);
        assert_eq!(board.route(), None);
    }

    #[test]
    fn projection_follows_route() {
        let mut board = TileBoard::new();
        let ticket = board.navigate(Some("7"));
        board.apply(
            &ticket,
            Ok(vec![
                TileRecord::new("A1", TileStatus::Complete, "7"),
                TileRecord::new("A2", TileStatus::Reserved, "3"),
            ]),
        );
        let projection = board.projection(StatusFilter::All);
        assert_eq!(projection.visible.len(), 1);
        assert_eq!(projection.visible[0].name, "A1");
    }

    #[tokio::test]
    async fn spawned_loads_resolve_to_newest_request() {
        let slow = Arc::new(CannedFetcher {
            body: r#"{"OLD": "{\"status\":\"예약중\",\"player\":1}"}"#,
            delay: Duration::from_millis(80),
        });
        let fast = Arc::new(CannedFetcher {
            body: r#"{"NEW": "{\"status\":\"완료\",\"player\":7}"}"#,
            delay: Duration::from_millis(1),
        });
        let (sender, mut receiver) = unbounded_channel();
        let mut board = TileBoard::new();

        let first = board.navigate(None);
        spawn_load(slow, first, sender.clone());
        let second = board.navigate(Some("7"));
        spawn_load(fast, second, sender);

        let mut outcomes = Vec::new();
        while let Some(outcome) = receiver.recv().await {
            outcomes.push(board.apply_outcome(outcome));
        }

        assert_eq!(
            outcomes,
            vec![LoadApplied::Loaded { tiles: 1 }, LoadApplied::Stale]
        );
        assert_eq!(board.tiles()[0].name, "NEW");
        assert_eq!(board.tiles()[0].player.as_deref(), Some("7"));
        assert!(!board.is_loading());
    }

    #[tokio::test]
    async fn failed_load_reports_error() {
        let (sender, mut receiver) = unbounded_channel();
        let mut board = TileBoard::new();
        let ticket = board.navigate(None);
        spawn_load(Arc::new(FailingFetcher), ticket, sender);

        let outcome = receiver.recv().await.expect("outcome delivered");
        assert_eq!(board.apply_outcome(outcome), LoadApplied::Failed);
        assert_eq!(board.error(), Some("request failed with status code 502"));
        assert!(board.tiles().is_empty());
    }

    #[tokio::test]
    async fn each_load_fetches_exactly_once() {
        let fetcher = CountingFetcher {
            calls: Mutex::new(0),
        };
        let tiles = load_tiles(&fetcher).await.expect("empty map loads");
        assert!(tiles.is_empty());
        assert_eq!(*fetcher.calls.lock().expect("calls mutex poisoned"), 1);
    }
}
