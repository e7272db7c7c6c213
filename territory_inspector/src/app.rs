use std::io::Stdout;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use territory_core::{KnownStatus, LoadApplied, LoadOutcome, LoadTicket, StatusFilter};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info};

use crate::ui::{draw_ui, UiState};

/// What a key press asks the app loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Quit,
    Load(LoadTicket),
}

pub struct InspectorApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    ui_state: UiState,
    outcome_receiver: UnboundedReceiver<LoadOutcome>,
    load_sender: UnboundedSender<LoadTicket>,
    log_receiver: Receiver<String>,
    initial_route: Option<String>,
}

impl InspectorApp {
    pub fn new(
        ui_state: UiState,
        initial_route: Option<String>,
        outcome_receiver: UnboundedReceiver<LoadOutcome>,
        load_sender: UnboundedSender<LoadTicket>,
        log_receiver: Receiver<String>,
    ) -> Result<Self> {
        let mut stdout = std::io::stdout();
        crossterm::terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            ui_state,
            outcome_receiver,
            load_sender,
            log_receiver,
            initial_route,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let ticket = self.ui_state.board.navigate(self.initial_route.as_deref());
        self.request_load(ticket);

        let result = self.event_loop();

        self.terminal.show_cursor()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        crossterm::terminal::disable_raw_mode()?;
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut last_draw = Instant::now() - Duration::from_secs(1);

        loop {
            while let Ok(outcome) = self.outcome_receiver.try_recv() {
                match self.ui_state.board.apply_outcome(outcome) {
                    LoadApplied::Loaded { tiles } => {
                        self.ui_state.scroll = 0;
                        self.ui_state.push_log(format!("Loaded {} tiles", tiles));
                    }
                    LoadApplied::Failed => {
                        self.ui_state.push_log("Load failed");
                    }
                    LoadApplied::Stale => {}
                }
            }

            while let Ok(line) = self.log_receiver.try_recv() {
                self.ui_state.push_log(line);
            }

            if last_draw.elapsed() >= Duration::from_millis(100) {
                let viewport = self.terminal.size()?;
                self.ui_state.set_viewport(viewport);
                self.terminal
                    .draw(|frame| draw_ui(frame, &self.ui_state))?;
                last_draw = Instant::now();
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match handle_key(&mut self.ui_state, key.code) {
                        Some(UiCommand::Quit) => break,
                        Some(UiCommand::Load(ticket)) => self.request_load(ticket),
                        None => {}
                    }
                }
            }
        }

        info!(target: "territory::inspector", "inspector.shutdown");
        Ok(())
    }

    fn request_load(&self, ticket: LoadTicket) {
        send_load_request(&self.load_sender, ticket);
    }
}

/// Hand `ticket` to the load pump; false once the pump has shut down.
pub fn send_load_request(sender: &UnboundedSender<LoadTicket>, ticket: LoadTicket) -> bool {
    let generation = ticket.generation;
    match sender.send(ticket) {
        Ok(()) => {
            debug!(target: "territory::inspector", generation, "load.requested");
            true
        }
        Err(err) => {
            error!(
                target: "territory::inspector",
                generation,
                error = %err,
                "load.request_failed"
            );
            false
        }
    }
}

/// Apply a key press to the UI state.
pub fn handle_key(state: &mut UiState, code: KeyCode) -> Option<UiCommand> {
    if let Some(input) = state.route_input.as_mut() {
        match code {
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Esc => state.route_input = None,
            KeyCode::Enter => {
                let route = state.route_input.take().unwrap_or_default();
                state.scroll = 0;
                let ticket = state.board.navigate(Some(&route));
                return Some(UiCommand::Load(ticket));
            }
            _ => {}
        }
        return None;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Some(UiCommand::Quit),
        KeyCode::Char('r') => return Some(UiCommand::Load(state.board.refresh())),
        KeyCode::Char('a') | KeyCode::Char('0') => state.set_status_filter(StatusFilter::All),
        KeyCode::Char('1') => {
            state.set_status_filter(StatusFilter::Only(KnownStatus::Reserved));
        }
        KeyCode::Char('2') => {
            state.set_status_filter(StatusFilter::Only(KnownStatus::InProgress));
        }
        KeyCode::Char('3') => {
            state.set_status_filter(StatusFilter::Only(KnownStatus::Complete));
        }
        KeyCode::Tab => state.set_status_filter(state.status_filter.next()),
        KeyCode::Char('/') => {
            state.route_input = Some(state.board.route().unwrap_or_default().to_string());
        }
        KeyCode::Char('c') => {
            if state.board.route().is_some() {
                state.scroll = 0;
                return Some(UiCommand::Load(state.board.navigate(None)));
            }
        }
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(),
        _ => {}
    }
    None
}
