use std::collections::VecDeque;
use std::rc::Rc;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use territory_core::{KnownStatus, StatusFilter, TileBoard, TileRecord, TileStatus};

pub const CARD_WIDTH: u16 = 24;
pub const CARD_HEIGHT: u16 = 5;

const LOADING_TEXT: &str = "불러오는 중...";
const EMPTY_TEXT: &str = "표시할 타일이 없습니다";

pub struct UiState {
    pub board: TileBoard,
    pub status_filter: StatusFilter,
    pub title: String,
    pub endpoint: String,
    /// Player route being typed; `Some` while the route editor is open.
    pub route_input: Option<String>,
    /// First visible card row.
    pub scroll: usize,
    pub logs: VecDeque<String>,
    pub max_logs: usize,
    /// Terminal area of the last frame; sizes the card grid for scrolling.
    pub viewport: Rect,
}

impl UiState {
    pub fn new(title: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            board: TileBoard::new(),
            status_filter: StatusFilter::All,
            title: title.into(),
            endpoint: endpoint.into(),
            route_input: None,
            scroll: 0,
            logs: VecDeque::new(),
            max_logs: 4,
            viewport: Rect::default(),
        }
    }

    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
        self.scroll = 0;
    }

    pub fn set_viewport(&mut self, area: Rect) {
        self.viewport = area;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Last card row that can sit at the top of the board.
    pub fn max_scroll(&self) -> usize {
        let (columns, rows) = grid_size(screen_chunks(self.viewport)[2]);
        let visible = self.board.projection(self.status_filter).visible.len();
        visible.div_ceil(columns).saturating_sub(rows)
    }

    pub fn scroll_down(&mut self) {
        if self.scroll < self.max_scroll() {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

pub fn status_color(status: Option<&TileStatus>) -> Color {
    match status {
        Some(TileStatus::Reserved) => Color::Yellow,
        Some(TileStatus::InProgress) => Color::Blue,
        Some(TileStatus::Complete) => Color::Green,
        Some(TileStatus::FormatError) => Color::Red,
        Some(TileStatus::Unknown(_)) | None => Color::Gray,
    }
}

fn badge_style(status: Option<&TileStatus>) -> Style {
    let foreground = match status {
        Some(TileStatus::InProgress) | Some(TileStatus::FormatError) => Color::White,
        _ => Color::Black,
    };
    Style::default()
        .bg(status_color(status))
        .fg(foreground)
        .add_modifier(Modifier::BOLD)
}

fn screen_chunks(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(CARD_HEIGHT),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(area)
}

/// Card columns and rows that fit in the board area.
fn grid_size(board: Rect) -> (usize, usize) {
    let columns = (board.width / CARD_WIDTH).max(1) as usize;
    let rows = (board.height / CARD_HEIGHT).max(1) as usize;
    (columns, rows)
}

pub fn draw_ui(frame: &mut Frame, state: &UiState) {
    let chunks = screen_chunks(frame.size());

    draw_header(frame, chunks[0], state);
    draw_summary(frame, chunks[1], state);
    draw_board(frame, chunks[2], state);
    draw_logs(frame, chunks[3], state);
    draw_key_help(frame, chunks[4], state);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(state.title.as_str());
    let route = match state.board.route() {
        Some(player) => Span::styled(
            format!("player {}", player),
            Style::default().fg(Color::Cyan),
        ),
        None => Span::styled("all players", Style::default().fg(Color::Cyan)),
    };
    let line = Line::from(vec![
        route,
        Span::raw(" | "),
        Span::styled(state.endpoint.as_str(), Style::default().fg(Color::DarkGray)),
    ]);
    let text = Paragraph::new(line).wrap(Wrap { trim: true });
    frame.render_widget(block, area);
    frame.render_widget(
        text,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_summary(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Status");
    frame.render_widget(block, area);
    let inner = area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });

    // Counts belong to the previous load until the new one lands.
    if state.board.is_loading() {
        let line = Line::from(vec![
            Span::styled("loading", Style::default().fg(Color::DarkGray)),
            Span::raw(format!(" | filter {}", state.status_filter)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
        return;
    }

    let projection = state.board.projection(state.status_filter);
    let counts = projection.counts;
    let mut spans = Vec::new();
    for status in KnownStatus::ALL {
        let selected = state.status_filter == StatusFilter::Only(status);
        let mut style = badge_style(Some(&TileStatus::from(status)));
        if selected {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        spans.push(Span::styled(
            format!(" {} {} ", status.label(), counts.count(status)),
            style,
        ));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        format!(" other {} ", counts.unrecognized),
        badge_style(None),
    ));
    spans.push(Span::raw(format!(
        " | total {} | filter {}",
        counts.total, state.status_filter
    )));

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn draw_board(frame: &mut Frame, area: Rect, state: &UiState) {
    if state.board.is_loading() {
        draw_centered(
            frame,
            area,
            LOADING_TEXT,
            Style::default().add_modifier(Modifier::BOLD),
        );
        return;
    }

    if let Some(error) = state.board.error() {
        draw_centered(
            frame,
            area,
            error,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        );
        return;
    }

    let projection = state.board.projection(state.status_filter);
    if projection.visible.is_empty() {
        draw_centered(frame, area, EMPTY_TEXT, Style::default().fg(Color::DarkGray));
        return;
    }

    let (columns, rows) = grid_size(area);
    let total_rows = projection.visible.len().div_ceil(columns);
    let first_row = state.scroll.min(total_rows.saturating_sub(rows));

    let cards = projection
        .visible
        .iter()
        .skip(first_row * columns)
        .take(rows * columns);
    for (index, tile) in cards.enumerate() {
        let column = (index % columns) as u16;
        let row = (index / columns) as u16;
        let card = Rect::new(
            area.x + column * CARD_WIDTH,
            area.y + row * CARD_HEIGHT,
            CARD_WIDTH.min(area.width),
            CARD_HEIGHT.min(area.height),
        );
        draw_card(frame, card, tile);
    }
}

fn draw_card(frame: &mut Frame, area: Rect, tile: &TileRecord) {
    let status = tile.status.as_ref();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(status_color(status)));
    let lines = vec![
        Line::from(Span::styled(
            tile.name.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(" {} ", tile.status_label()),
            badge_style(status),
        )),
        Line::from(Span::styled(
            format!("플레이어: {}", tile.player_label()),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

fn draw_centered(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let vertical_pad = area.height.saturating_sub(1) / 2;
    let target = Rect::new(area.x, area.y + vertical_pad, area.width, 1.min(area.height));
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(text, style))).alignment(Alignment::Center),
        target,
    );
}

fn draw_logs(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Logs");
    let lines: Vec<Line> = state
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry)))
        .collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_key_help(frame: &mut Frame, area: Rect, state: &UiState) {
    let key = Style::default().fg(Color::Yellow);
    let line = match &state.route_input {
        Some(input) => Line::from(vec![
            Span::styled("player> ", key),
            Span::raw(format!("{}_", input)),
            Span::raw("  enter apply | esc cancel"),
        ]),
        None => Line::from(vec![
            Span::styled("q", key),
            Span::raw(" quit  "),
            Span::styled("r", key),
            Span::raw(" reload  "),
            Span::styled("a 1 2 3 tab", key),
            Span::raw(" status  "),
            Span::styled("/", key),
            Span::raw(" player  "),
            Span::styled("c", key),
            Span::raw(" all players  "),
            Span::styled("j k", key),
            Span::raw(" scroll"),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}
