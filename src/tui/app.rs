use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use signal_hook::consts::signal::{SIGHUP, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::info;

use crate::board::{self, Board, Outcome};
use crate::input::InputSession;
use crate::input::gamepad::GamepadSettings;
use crate::input::joystick::GamepadDevice;
use crate::parser::config::Config;
use crate::tui::render::{self, Areas, RenderData};

/// About 60 frames per second.
const FRAME: Duration = Duration::from_millis(16);
const FOCUS_PAGE: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub file: Option<PathBuf>,
    pub demo: bool,
    pub gamepad: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingTextKind {
    Title(u32),
    Content(u32),
}

#[derive(Debug, Clone)]
struct PendingText {
    title: String,
    buffer: String,
    cursor: usize,
    kind: PendingTextKind,
}

impl PendingText {
    fn new(title: impl Into<String>, initial: String, kind: PendingTextKind) -> Self {
        let cursor = initial.chars().count();
        Self {
            title: title.into(),
            buffer: initial,
            cursor,
            kind,
        }
    }

    fn insert(&mut self, c: char) {
        let at = byte_index_for_cursor(&self.buffer, self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let from = byte_index_for_cursor(&self.buffer, self.cursor - 1);
        let to = byte_index_for_cursor(&self.buffer, self.cursor);
        self.buffer.replace_range(from..to, "");
        self.cursor -= 1;
    }

    fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
    }
}

#[derive(Debug)]
struct App {
    board: Board,
    input: InputSession,
    gamepad: Option<GamepadDevice>,
    pending_text: Option<PendingText>,
    areas: Areas,
}

impl App {
    fn new(config: Config, options: ViewOptions) -> Result<Self> {
        let settings = GamepadSettings {
            pan_speed: config.pan_speed,
            deadzone: config.gamepad_deadzone,
            settle_frames: config.gamepad_settle_frames,
        };
        let input = InputSession::new(config.pan_step, settings);
        let gamepad = options
            .gamepad
            .then(|| GamepadDevice::new(&config.gamepad_device));

        let mut board = if options.demo {
            let mut board = Board::new(config, options.file);
            board.canvas = board::demo_canvas(&board.config);
            board.set_status("demo canvas");
            board
        } else {
            Board::open(config, options.file)?
        };
        let areas = render::areas(Rect::new(0, 0, 80, 24), board.canvas.sidebar);
        board.viewport.resize(areas.canvas.width, areas.canvas.height);

        Ok(Self {
            board,
            input,
            gamepad,
            pending_text: None,
            areas,
        })
    }

    /// Recomputes the layout; the viewport always matches the board area.
    fn relayout(&mut self, area: Rect) {
        self.areas = render::areas(area, self.board.canvas.sidebar);
        self.board
            .viewport
            .resize(self.areas.canvas.width, self.areas.canvas.height);
    }

    fn draw(&mut self, frame: &mut Frame) {
        self.relayout(frame.area());
        let file_name = self.board.file_path.display().to_string();
        let pad_mode = self
            .gamepad
            .as_ref()
            .filter(|d| d.is_connected())
            .map(|_| self.input.gamepad.mode);
        let data = RenderData {
            canvas: &self.board.canvas,
            viewport: &self.board.viewport,
            file_name: &file_name,
            pad_mode,
            status: &self.board.status,
            undo: self.board.history.undo_len(),
            redo: self.board.history.redo_len(),
            show_help: self.board.show_help,
        };
        render::draw(frame, &data);

        if let Some(prompt) = &self.pending_text {
            draw_text_prompt(frame, prompt);
        }
    }

    /// Returns true when the app should quit.
    fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) => {
                if matches!(key.kind, KeyEventKind::Release | KeyEventKind::Repeat) {
                    return false;
                }
                self.handle_key(key)
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => {
                self.relayout(Rect::new(0, 0, width, height));
                false
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.pending_text.is_some() {
            self.handle_text_key(key);
            return false;
        }
        if self.board.canvas.focus.box_id.is_some() && self.scroll_focus(key.code) {
            return false;
        }
        let Some(event) = self
            .input
            .process_key(key, &self.board.canvas, &self.board.viewport)
        else {
            return false;
        };
        let outcome = self.board.execute(event);
        self.handle_outcome(outcome)
    }

    fn scroll_focus(&mut self, code: KeyCode) -> bool {
        let focus = &mut self.board.canvas.focus;
        match code {
            KeyCode::Up => focus.scroll = focus.scroll.saturating_sub(1),
            KeyCode::Down => focus.scroll += 1,
            KeyCode::PageUp => focus.scroll = focus.scroll.saturating_sub(FOCUS_PAGE),
            KeyCode::PageDown => focus.scroll += FOCUS_PAGE,
            KeyCode::Home => focus.scroll = 0,
            _ => return false,
        }
        true
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let canvas = self.areas.canvas;
        let inside = mouse.column < canvas.x + canvas.width && mouse.row < canvas.y + canvas.height;
        let starts_gesture = matches!(
            mouse.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if self.pending_text.is_some() || (starts_gesture && !inside) {
            return false;
        }
        let Some(event) = self.input.process_mouse(
            &mouse,
            &self.board.canvas,
            &self.board.viewport,
            (canvas.x, canvas.y),
        ) else {
            return false;
        };
        let outcome = self.board.execute(event);
        self.handle_outcome(outcome)
    }

    /// Polls the pad once. Returns whether it produced a continuous move,
    /// and whether the app should quit.
    fn tick_gamepad(&mut self) -> (bool, bool) {
        let Some(device) = &mut self.gamepad else {
            return (false, false);
        };
        device.poll(&mut self.input.gamepad);
        if !device.is_connected() || self.pending_text.is_some() {
            return (false, false);
        }
        let Some(event) = self
            .input
            .process_gamepad(&self.board.canvas, &self.board.viewport)
        else {
            return (false, false);
        };
        let moved = event.action.is_continuous_move();
        let outcome = self.board.execute(event);
        (moved, self.handle_outcome(outcome))
    }

    fn handle_outcome(&mut self, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Continue => false,
            Outcome::Quit => true,
            Outcome::PromptTitle(id) => {
                let current = self
                    .board
                    .canvas
                    .get_box(id)
                    .and_then(|b| b.title.clone())
                    .unwrap_or_default();
                self.pending_text = Some(PendingText::new(
                    format!("Title of box {}", id),
                    current,
                    PendingTextKind::Title(id),
                ));
                false
            }
            Outcome::PromptContent(id) => {
                let current = self
                    .board
                    .canvas
                    .get_box(id)
                    .map(|b| match (&b.file_path, &b.command) {
                        (Some(path), _) => format!("@{}", path),
                        (_, Some(cmd)) => format!("!{}", cmd),
                        _ => b.content.join(" | "),
                    })
                    .unwrap_or_default();
                self.pending_text = Some(PendingText::new(
                    format!("Content of box {}  (text | lines, @file, !command)", id),
                    current,
                    PendingTextKind::Content(id),
                ));
                false
            }
        }
    }

    fn handle_text_key(&mut self, key: KeyEvent) {
        let Some(prompt) = &mut self.pending_text else {
            return;
        };
        match key.code {
            KeyCode::Enter => {
                if let Some(prompt) = self.pending_text.take() {
                    self.apply_text_prompt(prompt);
                }
            }
            KeyCode::Esc => self.pending_text = None,
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Left => prompt.left(),
            KeyCode::Right => prompt.right(),
            KeyCode::Home => prompt.cursor = 0,
            KeyCode::End => prompt.cursor = prompt.buffer.chars().count(),
            KeyCode::Char(c) => prompt.insert(c),
            _ => {}
        }
    }

    fn apply_text_prompt(&mut self, prompt: PendingText) {
        match prompt.kind {
            PendingTextKind::Title(id) => self.board.apply_title(id, &prompt.buffer),
            PendingTextKind::Content(id) => {
                if let Err(err) = self.board.apply_content(id, &prompt.buffer) {
                    self.board.set_status(format!("{:#}", err));
                }
            }
        }
    }
}

pub fn run(config: Config, options: ViewOptions) -> Result<()> {
    let mut app = App::new(config, options)?;
    let mut signals =
        Signals::new([SIGHUP, SIGTERM]).context("failed to install signal handlers")?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    info!(file = %app.board.file_path.display(), "board opened");

    'main: loop {
        for signal in signals.pending() {
            match signal {
                SIGHUP => {
                    info!("SIGHUP: reloading");
                    app.board.reload();
                }
                SIGTERM => {
                    info!("SIGTERM: quitting");
                    break 'main;
                }
                _ => {}
            }
        }

        terminal.draw(|f| app.draw(f))?;

        if event::poll(FRAME)? && app.handle_event(event::read()?) {
            break;
        }
        let (pad_moved, quit) = app.tick_gamepad();
        if quit {
            break;
        }
        if !pad_moved && !app.input.mouse.is_dragging() {
            app.board.history.end_gesture();
        }
    }

    info!("board closed");
    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableMouseCapture, LeaveAlternateScreen);
    }
}

fn draw_text_prompt(frame: &mut Frame, prompt: &PendingText) {
    let area = render::centered_rect(frame.area(), 70, 28);
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            &prompt.title,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        line_with_cursor(
            &prompt.buffer,
            prompt.cursor,
            Style::default().fg(Color::White),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        ),
        Line::from(""),
        Line::from(Span::styled(
            "Enter applies, Esc cancels.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(
        Block::default()
            .title("Input")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    frame.render_widget(paragraph, area);
}

fn line_with_cursor(
    text: &str,
    cursor: usize,
    text_style: Style,
    caret_style: Style,
) -> Line<'static> {
    let split = byte_index_for_cursor(text, cursor);
    let (left, right) = text.split_at(split);
    let mut spans = Vec::new();
    if !left.is_empty() {
        spans.push(Span::styled(left.to_string(), text_style));
    }
    spans.push(Span::styled("▌", caret_style));
    if !right.is_empty() {
        spans.push(Span::styled(right.to_string(), text_style));
    }
    Line::from(spans)
}

fn byte_index_for_cursor(text: &str, cursor: usize) -> usize {
    text.char_indices()
        .nth(cursor)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyModifiers, MouseButton};

    fn app() -> App {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            proportional_sizing: false,
            ..Config::default()
        };
        App::new(
            config,
            ViewOptions {
                file: Some(dir.path().join("board.txt")),
                ..ViewOptions::default()
            },
        )
        .unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn prompt_edits_at_the_cursor() {
        let mut p = PendingText::new("t", "héllo".to_string(), PendingTextKind::Title(1));
        assert_eq!(p.cursor, 5);
        p.left();
        p.left();
        p.backspace();
        assert_eq!(p.buffer, "hélo");
        p.insert('L');
        assert_eq!(p.buffer, "héLlo");
        p.right();
        p.right();
        p.right();
        assert_eq!(p.cursor, 5);
    }

    #[test]
    fn title_prompt_round_trip() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        let id = app.board.canvas.selected_id().unwrap();

        press(&mut app, KeyCode::Char('T'));
        assert!(app.pending_text.is_some());
        type_text(&mut app, "Plan");
        press(&mut app, KeyCode::Enter);

        assert!(app.pending_text.is_none());
        assert_eq!(
            app.board.canvas.get_box(id).unwrap().title.as_deref(),
            Some("Plan")
        );
    }

    #[test]
    fn escape_cancels_prompt_without_changes() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        let undo_before = app.board.history.undo_len();
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "a|b");
        press(&mut app, KeyCode::Esc);
        assert!(app.pending_text.is_none());
        assert_eq!(app.board.history.undo_len(), undo_before);
    }

    #[test]
    fn content_prompt_prefills_existing_lines() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        let id = app.board.canvas.selected_id().unwrap();
        app.board.apply_content(id, "one | two").unwrap();
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.pending_text.as_ref().unwrap().buffer, "one | two");
    }

    #[test]
    fn focus_mode_arrows_scroll() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        assert!(app.board.canvas.focus.box_id.is_some());
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.board.canvas.focus.scroll, 2);
        press(&mut app, KeyCode::Esc);
        assert!(app.board.canvas.focus.box_id.is_none());
    }

    #[test]
    fn clicks_outside_the_board_are_ignored() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'));
        app.relayout(Rect::new(0, 0, 80, 24));
        let side = app.areas.sidebar.unwrap();
        press(&mut app, KeyCode::Char('n'));
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: side.x + 1,
            row: 1,
            modifiers: KeyModifiers::NONE,
        };
        app.handle_event(Event::Mouse(click));
        assert!(app.board.canvas.selected_id().is_some());
    }

    #[test]
    fn resize_updates_viewport() {
        let mut app = app();
        app.handle_event(Event::Resize(120, 40));
        assert_eq!(app.board.viewport.width, 120);
        assert_eq!(app.board.viewport.height, 39);
    }

    #[test]
    fn quit_key_ends_the_loop() {
        let mut app = app();
        assert!(press(&mut app, KeyCode::Char('q')));
    }
}
