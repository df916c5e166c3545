use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tablebank_core::{
    models::{Player, PlayerId},
    Action, AppConfig, Outcome, Session, TransactionKind,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::block_font;

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_NAME_LEN: usize = 32;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    source: Color,
    target: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            source: Color::Blue,
            target: Color::Green,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

/// Parse `#rgb`, `#rrggbb` or the same without `#` into RGB components.
fn parse_hex_color(input: &str) -> Option<(u8, u8, u8)> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some((
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        3 => Some((
            u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?,
            u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?,
            u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?,
        )),
        _ => None,
    }
}

/// Canonical `#rrggbb` form of a user-entered color.
fn normalize_hex_color(input: &str) -> Option<String> {
    parse_hex_color(input).map(|(r, g, b)| format!("#{r:02x}{g:02x}{b:02x}"))
}

fn player_color(player: &Player, fallback: Color) -> Color {
    parse_hex_color(&player.color)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(fallback)
}

fn contrast_color(color: Color) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let luminance = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
            if luminance > 186.0 {
                Color::Black
            } else {
                Color::White
            }
        }
        _ => Color::White,
    }
}

fn format_currency(value: i64) -> String {
    format!("${value}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Rename,
    Recolor,
}

#[derive(Debug, Clone)]
struct PlayerPrompt {
    kind: PromptKind,
    player_id: PlayerId,
    input: String,
    cursor: usize,
    default: String,
}

impl PlayerPrompt {
    fn new(kind: PromptKind, player: &Player) -> Self {
        let default = match kind {
            PromptKind::Rename => player.name.clone(),
            PromptKind::Recolor => player.color.clone(),
        };
        Self {
            kind,
            player_id: player.id,
            input: default.clone(),
            cursor: default.chars().count(),
            default,
        }
    }

    fn title(&self) -> &'static str {
        match self.kind {
            PromptKind::Rename => "Rename Player",
            PromptKind::Recolor => "Player Color",
        }
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map(|(index, _)| index)
            .unwrap_or(self.input.len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.chars().count() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn insert(&mut self, ch: char) {
        if ch.is_control() || self.input.chars().count() >= MAX_NAME_LEN {
            return;
        }
        let index = self.byte_index();
        self.input.insert(index, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let index = self.byte_index();
        self.input.remove(index);
    }

    fn value(&self) -> String {
        let trimmed = self.input.trim();
        if trimmed.is_empty() {
            self.default.clone()
        } else {
            trimmed.to_string()
        }
    }
}

/// What a key press asks the UI to do.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Session(Action),
    MoveCursor(isize),
    OpenPrompt(PromptKind),
    Quit,
}

/// Map a key press on the main screen to a command.
///
/// `amount` and `kind` are the session's current values, needed to build
/// the replacement amount and the next kind.
fn command_for_key(
    key: &KeyEvent,
    amount: &str,
    kind: TransactionKind,
    hovered: Option<PlayerId>,
) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command::Quit),
            _ => None,
        };
    }
    let command = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Command::Quit,
        KeyCode::Char('j') | KeyCode::Down => Command::MoveCursor(1),
        KeyCode::Char('k') | KeyCode::Up => Command::MoveCursor(-1),
        KeyCode::Char(' ') => Command::Session(Action::PlayerClicked { id: hovered? }),
        KeyCode::Enter => Command::Session(Action::Submit),
        KeyCode::Char('u') => Command::Session(Action::Undo),
        KeyCode::Char('a') => Command::Session(Action::AddPlayer),
        KeyCode::Char('m') => Command::Session(Action::ToggleMulti),
        KeyCode::Tab => Command::Session(Action::SetKind { kind: kind.next() }),
        KeyCode::Char('r') => Command::OpenPrompt(PromptKind::Rename),
        KeyCode::Char('c') => Command::OpenPrompt(PromptKind::Recolor),
        KeyCode::Char(ch) if ch.is_ascii_digit() => Command::Session(Action::SetAmount {
            value: format!("{amount}{ch}"),
        }),
        KeyCode::Char('-') if amount.is_empty() => Command::Session(Action::SetAmount {
            value: "-".to_string(),
        }),
        KeyCode::Backspace if !amount.is_empty() => {
            let mut value = amount.to_string();
            value.pop();
            Command::Session(Action::SetAmount { value })
        }
        _ => return None,
    };
    Some(command)
}

/// One-line status message for a dispatched action.
fn describe_outcome(action: &Action, outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Recorded { description } => Some(description.clone()),
        Outcome::Undone { description } => Some(format!("Undid: {description}")),
        Outcome::NotReady(reason) => Some(format!("Cannot submit: {reason}")),
        Outcome::NoOp if matches!(action, Action::Undo) => Some("Nothing to undo".to_string()),
        Outcome::NoOp if matches!(action, Action::ToggleMulti) => {
            Some("Multi-select is unavailable while transferring".to_string())
        }
        Outcome::Updated | Outcome::NoOp => None,
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal front end for a bank session.
pub struct BankApp {
    session: Session,
    config: AppConfig,
    cursor: usize,
    status: String,
    prompt: Option<PlayerPrompt>,
    should_quit: bool,
    theme: Theme,
}

impl BankApp {
    pub fn new(session: Session, config: AppConfig) -> Self {
        Self {
            session,
            config,
            cursor: 0,
            status: "Ready".to_string(),
            prompt: None,
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let result = loop {
            if let Err(err) = terminal.draw(|frame| self.draw(frame)) {
                break Err(err).context("failed to draw frame");
            }
            if self.should_quit {
                break Ok(());
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => self.handle_input(event),
                Some(AppEvent::Tick) => {}
                None => break Ok(()),
            }
        };

        restore_terminal(&mut terminal)?;
        info!("Bank closed");
        result
    }

    fn hovered(&self) -> Option<&Player> {
        self.session.registry().players().get(self.cursor)
    }

    fn move_cursor(&mut self, delta: isize) {
        let total = self.session.registry().len();
        if total == 0 {
            self.cursor = 0;
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, total as isize - 1);
        self.cursor = next as usize;
    }

    fn clamp_cursor(&mut self) {
        let total = self.session.registry().len();
        self.cursor = cmp::min(self.cursor, total.saturating_sub(1));
    }

    fn handle_input(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        let hovered = self.hovered().map(|player| player.id);
        let Some(command) =
            command_for_key(&key, self.session.amount(), self.session.kind(), hovered)
        else {
            return;
        };
        match command {
            Command::Quit => self.should_quit = true,
            Command::MoveCursor(delta) => self.move_cursor(delta),
            Command::OpenPrompt(kind) => {
                let prompt = self
                    .hovered()
                    .map(|player| PlayerPrompt::new(kind, player));
                match prompt {
                    Some(prompt) => self.prompt = Some(prompt),
                    None => self.status = "No player selected".to_string(),
                }
            }
            Command::Session(action) => self.apply(action),
        }
    }

    fn apply(&mut self, action: Action) {
        debug!(?action, "dispatching");
        let outcome = self.session.dispatch(action.clone());
        if matches!(action, Action::AddPlayer) {
            self.cursor = self.session.registry().len().saturating_sub(1);
        }
        self.clamp_cursor();
        if let Some(message) = describe_outcome(&action, &outcome) {
            self.status = message;
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                self.status = "Edit cancelled".to_string();
            }
            KeyCode::Enter => {
                let Some(prompt) = self.prompt.take() else {
                    return;
                };
                let value = prompt.value();
                match prompt.kind {
                    PromptKind::Rename => self.apply(Action::RenamePlayer {
                        id: prompt.player_id,
                        name: value,
                    }),
                    PromptKind::Recolor => match normalize_hex_color(&value) {
                        Some(color) => self.apply(Action::RecolorPlayer {
                            id: prompt.player_id,
                            color,
                        }),
                        None => {
                            self.status = format!("Invalid color \"{value}\"");
                            self.prompt = Some(prompt);
                        }
                    },
                }
            }
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.cursor = 0,
            KeyCode::End => prompt.cursor = prompt.input.chars().count(),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Char(ch) => prompt.insert(ch),
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),
                Constraint::Length(7),
                Constraint::Length(3),
            ])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[0]);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(3)])
            .split(top[1]);

        self.render_players(frame, top[0]);
        self.render_balance_banner(frame, side[0]);
        self.render_history(frame, side[1]);
        self.render_controls(frame, rows[1]);
        self.render_status(frame, rows[2]);

        if let Some(prompt) = &self.prompt {
            self.render_prompt(frame, prompt);
        }
    }

    fn render_players(&self, frame: &mut Frame, area: Rect) {
        let selection = self.session.selection();
        let items: Vec<ListItem> = self
            .session
            .registry()
            .players()
            .iter()
            .map(|player| {
                let (marker, marker_color) = if selection.source() == Some(player.id) {
                    ("S", self.theme.source)
                } else if selection.is_target(player.id) {
                    ("T", self.theme.target)
                } else {
                    (" ", self.theme.muted)
                };
                let balance_style = if player.balance < 0 {
                    Style::default().fg(self.theme.danger)
                } else {
                    Style::default().fg(self.theme.primary_fg)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("[{marker}] "),
                        Style::default()
                            .fg(marker_color)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled("██ ", Style::default().fg(player_color(player, self.theme.muted))),
                    Span::styled(
                        format!("{:<20}", player.name),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("{:>10}", format_currency(player.balance)), balance_style),
                ]))
            })
            .collect();

        let title = format!(
            "Players ({} mode)",
            self.session.selection().mode().label()
        );
        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(self.cursor.min(items.len() - 1)));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_balance_banner(&self, frame: &mut Frame, area: Rect) {
        let Some(player) = self.hovered() else {
            let block = Block::default().borders(Borders::ALL).title("Balance");
            frame.render_widget(block, area);
            return;
        };
        let color = player_color(player, self.theme.accent);
        let lines: Vec<Line> = block_font::render(&format_currency(player.balance))
            .into_iter()
            .map(|line| {
                Line::from(Span::styled(
                    line,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        let title = Span::styled(
            format!(" {} ", player.name),
            Style::default().fg(contrast_color(color)).bg(color),
        );
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_history(&self, frame: &mut Frame, area: Rect) {
        let history = self.session.history();
        let items: Vec<ListItem> = history
            .iter()
            .take(self.config.history_limit)
            .map(|record| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{}: ", record.timestamp()),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::raw(record.description().to_string()),
                ]))
            })
            .collect();
        let title = format!("Transaction History ({})", history.len());
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(list, area);
    }

    fn render_controls(&self, frame: &mut Frame, area: Rect) {
        let kind = self.session.kind();
        let kinds: Vec<Span> = TransactionKind::ALL
            .iter()
            .flat_map(|candidate| {
                let style = if *candidate == kind {
                    Style::default()
                        .fg(Color::Black)
                        .bg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                [Span::styled(format!(" {} ", candidate.label()), style), Span::raw(" ")]
            })
            .collect();

        let multi = if self.session.is_multi() { "on" } else { "off" };
        let amount = if self.session.amount().is_empty() {
            Span::styled("Amount", Style::default().fg(self.theme.muted))
        } else {
            Span::raw(self.session.amount().to_string())
        };
        let submit = if self.session.can_submit() {
            Span::styled("ready", Style::default().fg(self.theme.success))
        } else {
            Span::styled("incomplete", Style::default().fg(self.theme.warning))
        };

        let mut lines = vec![
            Line::from(kinds),
            Line::from(vec![
                Span::raw("Multi-select: "),
                Span::styled(multi, Style::default().fg(self.theme.accent)),
                Span::raw("    $ "),
                amount,
                Span::raw("    Submit: "),
                submit,
            ]),
        ];
        if let Some(hint) = self.session.transfer_hint() {
            lines.push(Line::from(Span::styled(
                hint,
                Style::default().fg(self.theme.primary_fg),
            )));
        }
        lines.push(Line::from(Span::styled(
            "space select  enter submit  tab kind  m multi  a add  r rename  c color  u undo  q quit",
            Style::default().fg(self.theme.muted),
        )));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Transaction"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(Line::from(self.status.clone()))
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_prompt(&self, frame: &mut Frame, prompt: &PlayerPrompt) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(50_u16, frame_area.width.saturating_sub(4)), 24_u16);
        let height = 6_u16.min(frame_area.height.saturating_sub(2)).max(5_u16);
        let x = frame_area.x + frame_area.width.saturating_sub(width) / 2;
        let y = frame_area.y + frame_area.height.saturating_sub(height) / 2;
        let area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, area);

        let instruction = match prompt.kind {
            PromptKind::Rename => format!("New name for {}", prompt.default),
            PromptKind::Recolor => "Hex color (#rrggbb)".to_string(),
        };
        let paragraph = Paragraph::new(vec![
            Line::from(instruction),
            Line::from(vec![
                Span::styled("> ", Style::default().fg(self.theme.accent)),
                Span::raw(prompt.input.clone()),
            ]),
            Line::from(vec![
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" save  "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" cancel"),
            ]),
        ])
        .block(Block::default().borders(Borders::ALL).title(prompt.title()));
        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
        frame.set_cursor(cursor_x, area.y + 2);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}
