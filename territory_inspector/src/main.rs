use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use territory_core::config::{CONFIG_PATH_ENV, ENDPOINT_ENV};
use territory_core::{load_feed_config, spawn_load, HttpTileFetcher, LoadOutcome, LoadTicket};
use tokio::sync::mpsc::unbounded_channel;
use tracing::info;

mod app;
mod ui;

use app::InspectorApp;
use ui::UiState;

/// Routes tracing output into the in-app log pane instead of the terminal.
#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Territory tile occupation board", long_about = None)]
struct Cli {
    /// Only show tiles held by this player id.
    player: Option<String>,
    /// Tile feed URL answering GET with the tile map.
    #[arg(long, env = ENDPOINT_ENV)]
    endpoint: Option<String>,
    /// JSON feed configuration file.
    #[arg(long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (log_tx, log_rx) = mpsc::channel::<String>();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_writer(move || ChannelWriter {
            sender: log_tx.clone(),
        })
        .init();

    let cli = Cli::parse();
    let (config, _metadata) = load_feed_config(cli.config.as_deref(), cli.endpoint.clone());
    let fetcher = Arc::new(HttpTileFetcher::new(&config.endpoint)?);
    info!(
        target: "territory::inspector",
        endpoint = %fetcher.endpoint(),
        "inspector.ready"
    );

    let (outcome_tx, outcome_rx) = unbounded_channel::<LoadOutcome>();
    let (load_tx, mut load_rx) = unbounded_channel::<LoadTicket>();

    let ui_state = UiState::new(config.title.clone(), config.endpoint.clone());
    let initial_route = cli.player.clone();
    let ui_handle = std::thread::spawn(move || -> Result<()> {
        let app = InspectorApp::new(ui_state, initial_route, outcome_rx, load_tx, log_rx)?;
        app.run()
    });

    // Closes once the UI thread drops its sender.
    while let Some(ticket) = load_rx.recv().await {
        spawn_load(Arc::clone(&fetcher), ticket, outcome_tx.clone());
    }

    ui_handle
        .join()
        .map_err(|_| eyre!("inspector UI thread panicked"))?
}
