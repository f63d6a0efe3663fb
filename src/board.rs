//! The board: executes [`CanvasAction`]s against the canvas.
//!
//! Every mutating action is bracketed by the matching `record_*` call so it
//! can be undone. Failures never abort the session; they end up in
//! [`Board::status`] and the log.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::canvas::history::{ContentSnapshot, History};
use crate::canvas::model::{
    BoxTemplate, ContentType, MAX_BOX_HEIGHT, MAX_BOX_WIDTH, MIN_BOX_HEIGHT, MIN_BOX_WIDTH,
    PALETTE_SIZE,
};
use crate::canvas::store::{Canvas, ConnectionMode, SizingParams};
use crate::canvas::viewport::Viewport;
use crate::content;
use crate::export;
use crate::input::action::{BoxMove, BoxResize, CanvasAction, CreateBox, InputEvent};
use crate::parser::canvas_file;
use crate::parser::config::Config;

const SIDEBAR_STEP: i32 = 5;

/// What the main loop has to do after an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
    /// Ask the user for a new title of the box.
    PromptTitle(u32),
    /// Ask the user for new content of the box.
    PromptContent(u32),
}

#[derive(Debug)]
pub struct Board {
    pub canvas: Canvas,
    pub history: History,
    pub viewport: Viewport,
    pub config: Config,
    pub file_path: PathBuf,
    pub export_path: PathBuf,
    pub show_help: bool,
    pub status: String,
}

impl Board {
    pub fn new(config: Config, file_path: Option<PathBuf>) -> Self {
        let canvas = fresh_canvas(&config);
        let history = History::new(config.undo_limit);
        let file_path = file_path.unwrap_or_else(|| PathBuf::from(&config.save_path));
        let export_path = PathBuf::from(&config.export_path);
        Self {
            canvas,
            history,
            viewport: Viewport::default(),
            config,
            file_path,
            export_path,
            show_help: false,
            status: String::new(),
        }
    }

    /// Builds a board for `file_path`, loading it when it exists.
    pub fn open(config: Config, file_path: Option<PathBuf>) -> Result<Self> {
        let mut board = Self::new(config, file_path);
        if board.file_path.exists() {
            let path = board.file_path.clone();
            board.load_from(&path)?;
        } else {
            board.status = format!("new canvas: {}", board.file_path.display());
        }
        Ok(board)
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    /// Runs one action. Errors are reported in the status line.
    pub fn execute(&mut self, event: InputEvent) -> Outcome {
        let action = event.action;
        debug!(?action, source = ?event.source, "execute");
        if !action.is_continuous_move() {
            self.history.end_gesture();
        }
        match self.apply(action) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(?action, error = %format!("{:#}", err), "action failed");
                self.status = format!("{:#}", err);
                Outcome::Continue
            }
        }
    }

    fn apply(&mut self, action: CanvasAction) -> Result<Outcome> {
        match action {
            CanvasAction::Pan(delta) => self.viewport.pan(delta.dx, delta.dy),
            CanvasAction::ZoomIn => self.viewport.zoom(self.config.zoom_step),
            CanvasAction::ZoomOut => self.viewport.zoom(1.0 / self.config.zoom_step),
            CanvasAction::SelectBox(id) => self.canvas.select_box(id),
            CanvasAction::Deselect => self.canvas.deselect(),
            CanvasAction::CycleBox => {
                self.canvas.cycle_selection();
            }
            CanvasAction::CreateBox(create) => self.create_box(create)?,
            CanvasAction::DeleteBox => self.delete_selected()?,
            CanvasAction::MoveBox(mv) => self.move_box(mv),
            CanvasAction::ResizeBox(resize) => self.resize_selected(resize),
            CanvasAction::ColorBox(color) => self.color_selected(color),
            CanvasAction::CycleBoxType => {
                if let Some(b) = self
                    .canvas
                    .selected_index
                    .and_then(|i| self.canvas.boxes.get_mut(i))
                {
                    b.box_type = b.box_type.next();
                    self.status = format!("box type: {}", b.box_type.label());
                }
            }
            CanvasAction::ResetView => self.viewport.reset(),
            CanvasAction::ToggleGrid => self.canvas.toggle_grid(),
            CanvasAction::ToggleSnap => {
                self.canvas.toggle_snap();
                self.status = format!("snap {}", on_off(self.canvas.grid.snap));
            }
            CanvasAction::CycleDisplayMode => {
                self.canvas.cycle_display_mode();
                self.status = format!("display: {}", self.canvas.display_mode.label());
            }
            CanvasAction::EnterFocus => {
                let id = self.canvas.enter_focus()?;
                if let Some(b) = self.canvas.get_box(id) {
                    let (cx, cy) = b.center();
                    self.viewport.center_on(cx, cy);
                }
            }
            CanvasAction::ExitFocus => self.canvas.exit_focus(),
            CanvasAction::StartConnection(id) => {
                let id = self.target(id)?;
                self.canvas.start_connection(id)?;
                self.status = format!("connecting from box {}", id);
            }
            CanvasAction::FinishConnection(id) => self.finish_connection(id)?,
            CanvasAction::CancelConnection => {
                if self.canvas.is_connecting() {
                    self.canvas.cancel_connection();
                    self.status = "connection cancelled".to_string();
                }
            }
            CanvasAction::DeleteConnection => self.delete_connections()?,
            CanvasAction::ToggleSidebar => {
                self.canvas.sidebar.visible = !self.canvas.sidebar.visible;
            }
            CanvasAction::WidenSidebar => self.canvas.resize_sidebar(SIDEBAR_STEP),
            CanvasAction::NarrowSidebar => self.canvas.resize_sidebar(-SIDEBAR_STEP),
            CanvasAction::EditSidebar => {
                let id = self.target(None)?;
                self.canvas.sidebar.visible = true;
                return Ok(Outcome::PromptContent(id));
            }
            CanvasAction::EditTitle => return Ok(Outcome::PromptTitle(self.target(None)?)),
            CanvasAction::SaveCanvas => {
                let path = self.file_path.clone();
                self.save_to(&path)?;
            }
            CanvasAction::LoadCanvas => {
                let path = self.file_path.clone();
                self.load_from(&path)?;
            }
            CanvasAction::ExportCanvas => {
                export::export_to_file(&self.canvas, &self.export_path)?;
                self.status = format!("exported to {}", self.export_path.display());
            }
            CanvasAction::EnterEditMode => self.status = "edit mode".to_string(),
            CanvasAction::EnterParamMode => self.status = "param mode".to_string(),
            CanvasAction::EnterNavMode => self.status = "nav mode".to_string(),
            CanvasAction::Undo => {
                let label = self.history.peek_undo().map(|op| op.kind().label());
                self.status = if self.history.undo(&mut self.canvas) {
                    format!("undo {}", label.unwrap_or_default())
                } else {
                    "nothing to undo".to_string()
                };
            }
            CanvasAction::Redo => {
                let label = self.history.peek_redo().map(|op| op.kind().label());
                self.status = if self.history.redo(&mut self.canvas) {
                    format!("redo {}", label.unwrap_or_default())
                } else {
                    "nothing to redo".to_string()
                };
            }
            CanvasAction::ToggleHelp => self.show_help = !self.show_help,
            CanvasAction::Quit => return Ok(Outcome::Quit),
        }
        Ok(Outcome::Continue)
    }

    /// `id`, or the selected box when `None`.
    fn target(&self, id: Option<u32>) -> Result<u32> {
        id.or_else(|| self.canvas.selected_id())
            .ok_or_else(|| anyhow!("no box selected"))
    }

    fn create_box(&mut self, create: CreateBox) -> Result<()> {
        let (width, height) = self.creation_size(create.x, create.y, create.template);
        let x = create.x - f64::from(width) / 2.0;
        let y = create.y - f64::from(height) / 2.0;
        let id = self.canvas.add_box(x, y, width, height, None)?;
        self.history.record_box_create(&self.canvas, id);
        self.canvas.select_box(id);
        info!(id, width, height, template = create.template.label(), "box created");
        self.status = format!("created box {}", id);
        Ok(())
    }

    fn creation_size(&self, x: f64, y: f64, template: BoxTemplate) -> (i32, i32) {
        let size = self.config.template(template);
        if !self.config.proportional_sizing {
            return (size.width, size.height);
        }
        let fit = self.canvas.calc_proportional_size(
            x,
            y,
            SizingParams {
                radius: self.config.proportional_radius,
                use_nearest: self.config.proportional_use_nearest,
                min_neighbors: self.config.proportional_min_neighbors,
                default_width: size.width,
                default_height: size.height,
            },
        );
        (fit.width, fit.height)
    }

    fn delete_selected(&mut self) -> Result<()> {
        let id = self.target(None)?;
        self.history.record_box_delete(&self.canvas, id);
        self.canvas.remove_box(id)?;
        info!(id, "box deleted");
        self.status = format!("deleted box {}", id);
        Ok(())
    }

    fn move_box(&mut self, mv: BoxMove) {
        let (id, to, continuous) = match mv {
            BoxMove::To {
                id,
                x,
                y,
                offset_x,
                offset_y,
            } => (Some(id), Some((x - offset_x, y - offset_y)), true),
            BoxMove::By {
                id,
                dx,
                dy,
                continuous,
            } => {
                let id = id.or_else(|| self.canvas.selected_id());
                let to = id
                    .and_then(|id| self.canvas.get_box(id))
                    .map(|b| (b.x + dx, b.y + dy));
                (id, to, continuous)
            }
        };
        let (Some(id), Some(to)) = (id, to) else {
            return;
        };
        if continuous {
            self.history.record_box_move_continuous(&self.canvas, id, to);
        } else {
            self.history.record_box_move(&self.canvas, id, to);
        }
        if let Some(b) = self.canvas.get_box_mut(id) {
            (b.x, b.y) = to;
        }
    }

    fn resize_selected(&mut self, resize: BoxResize) {
        let Some(b) = self.canvas.selected() else {
            return;
        };
        let (id, before) = (b.id, (b.width, b.height));
        let after = (
            (b.width + resize.dw).clamp(MIN_BOX_WIDTH, MAX_BOX_WIDTH),
            (b.height + resize.dh).clamp(MIN_BOX_HEIGHT, MAX_BOX_HEIGHT),
        );
        if after == before {
            return;
        }
        self.history.record_box_resize(&self.canvas, id, after);
        if let Some(b) = self.canvas.get_box_mut(id) {
            (b.width, b.height) = after;
        }
    }

    fn color_selected(&mut self, color: u8) {
        let color = color % PALETTE_SIZE;
        let Some(id) = self.canvas.selected_id() else {
            return;
        };
        if self.canvas.get_box(id).is_some_and(|b| b.color == color) {
            return;
        }
        self.history.record_box_color(&self.canvas, id, color);
        if let Some(b) = self.canvas.get_box_mut(id) {
            b.color = color;
        }
    }

    fn finish_connection(&mut self, id: Option<u32>) -> Result<()> {
        let Some(dest) = id.or_else(|| self.canvas.selected_id()) else {
            self.canvas.cancel_connection();
            self.status = "connection cancelled".to_string();
            return Ok(());
        };
        let color = match self.canvas.connection_mode {
            ConnectionMode::Armed { source_box_id } => self
                .canvas
                .get_box(source_box_id)
                .map(|b| b.color)
                .unwrap_or_default(),
            ConnectionMode::Idle => {
                return Err(anyhow!("no connection in progress"));
            }
        };
        let conn = self.canvas.finish_connection(dest, color)?;
        self.history.record_connection_create(&self.canvas, conn);
        info!(id = conn, dest, "connection created");
        self.status = format!("connected to box {}", dest);
        Ok(())
    }

    /// Removes every connection touching the selected box.
    fn delete_connections(&mut self) -> Result<()> {
        let id = self.target(None)?;
        let ids = self.canvas.get_box_connections(id);
        for conn in &ids {
            self.history.record_connection_delete(&self.canvas, *conn);
            self.canvas.remove_connection(*conn)?;
        }
        self.status = format!("removed {} connection(s)", ids.len());
        Ok(())
    }

    /// Sets or clears (empty input) a box title.
    pub fn apply_title(&mut self, id: u32, input: &str) {
        let title = input.trim();
        let title = (!title.is_empty()).then_some(title);
        let Some(b) = self.canvas.get_box(id) else {
            return;
        };
        if b.title.as_deref() == title {
            return;
        }
        self.history.end_gesture();
        self.history.record_box_title(&self.canvas, id, title);
        if let Some(b) = self.canvas.get_box_mut(id) {
            b.title = title.map(str::to_string);
        }
    }

    /// Replaces box content from prompt input: `@path` reads a file,
    /// `!command` captures command output, anything else is text with `|`
    /// separating lines.
    pub fn apply_content(&mut self, id: u32, input: &str) -> Result<()> {
        if self.canvas.get_box(id).is_none() {
            return Err(anyhow!("box {} no longer exists", id));
        }
        let snapshot = parse_content_input(input)?;
        self.history.end_gesture();
        self.history.record_box_content(&self.canvas, id, snapshot.clone());
        if let Some(b) = self.canvas.get_box_mut(id) {
            b.content = snapshot.lines;
            b.content_type = snapshot.content_type;
            b.file_path = snapshot.file_path;
            b.command = snapshot.command;
        }
        Ok(())
    }

    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        canvas_file::save(&self.canvas, path)?;
        info!(path = %path.display(), boxes = self.canvas.boxes.len(), "canvas saved");
        self.status = format!("saved {}", path.display());
        Ok(())
    }

    /// Replaces the canvas with the file's contents. On failure the current
    /// canvas and history are untouched.
    pub fn load_from(&mut self, path: &Path) -> Result<()> {
        let mut loaded = canvas_file::load(path)?;
        loaded.grid = self.canvas.grid;
        loaded.sidebar = self.canvas.sidebar;
        loaded.display_mode = self.canvas.display_mode;
        self.canvas = loaded;
        self.history.clear();
        info!(path = %path.display(), boxes = self.canvas.boxes.len(), "canvas loaded");
        self.status = format!("loaded {}", path.display());
        Ok(())
    }

    /// Re-reads the current file, if any. Used on SIGHUP.
    pub fn reload(&mut self) {
        if !self.file_path.exists() {
            return;
        }
        let path = self.file_path.clone();
        if let Err(err) = self.load_from(&path) {
            warn!(error = %format!("{:#}", err), "reload failed");
            self.status = format!("{:#}", err);
        }
    }
}

fn fresh_canvas(config: &Config) -> Canvas {
    let mut canvas = Canvas::new(config.world_width, config.world_height);
    canvas.grid.spacing = config.grid_spacing;
    canvas.grid.visible = config.show_grid;
    canvas.grid.snap = config.snap_to_grid;
    canvas.sidebar.width = config.sidebar_width;
    canvas.resize_sidebar(0);
    canvas
}

fn parse_content_input(input: &str) -> Result<ContentSnapshot> {
    let input = input.trim();
    if let Some(path) = input.strip_prefix('@') {
        let path = path.trim();
        let lines = content::load_file_lines(Path::new(path))?;
        return Ok(ContentSnapshot {
            lines,
            content_type: ContentType::File,
            file_path: Some(path.to_string()),
            command: None,
        });
    }
    if let Some(command) = input.strip_prefix('!') {
        let command = command.trim();
        if content::validate_command(command).is_err() {
            warn!(command, "running command with shell metacharacters");
        }
        let lines = content::run_command(command, false)?;
        return Ok(ContentSnapshot {
            lines,
            content_type: ContentType::Command,
            file_path: None,
            command: Some(command.to_string()),
        });
    }
    if input.is_empty() {
        return Ok(ContentSnapshot::text(Vec::new()));
    }
    Ok(ContentSnapshot::text(
        input.split('|').map(|s| s.trim().to_string()).collect(),
    ))
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

/// A small populated canvas for `view --demo`.
pub fn demo_canvas(config: &Config) -> Canvas {
    let mut canvas = fresh_canvas(config);
    let notes: [(f64, f64, i32, i32, &str, &[&str], u8); 4] = [
        (4.0, 2.0, 28, 7, "Welcome", &["Drag boxes with the mouse", "Press ? for help"], 0),
        (42.0, 3.0, 24, 6, "Ideas", &["n: new box", "c: connect"], 3),
        (10.0, 14.0, 30, 6, "Tasks", &["[ ] sketch layout", "[x] install"], 2),
        (50.0, 15.0, 20, 5, "Undo", &["u / Ctrl+Z"], 5),
    ];
    for (x, y, w, h, title, lines, color) in notes {
        if let Ok(id) = canvas.add_box(x, y, w, h, Some(title))
            && let Some(b) = canvas.get_box_mut(id)
        {
            b.content = lines.iter().map(|s| s.to_string()).collect();
            b.color = color;
        }
    }
    for (src, dst) in [(1, 2), (1, 3), (3, 4)] {
        if let Err(err) = canvas.add_connection(src, dst, 0) {
            warn!(src, dst, %err, "demo connection rejected");
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::action::{InputSource, PanDelta};
    use std::fs;
    use tempfile::TempDir;

    fn board() -> Board {
        let config = Config {
            proportional_sizing: false,
            ..Config::default()
        };
        Board::new(config, None)
    }

    fn run(board: &mut Board, action: CanvasAction) -> Outcome {
        board.execute(InputEvent::new(InputSource::Keyboard, action))
    }

    fn create(board: &mut Board, x: f64, y: f64) -> u32 {
        run(
            board,
            CanvasAction::CreateBox(CreateBox {
                x,
                y,
                template: BoxTemplate::Square,
            }),
        );
        board.canvas.selected_id().unwrap()
    }

    #[test]
    fn create_centers_template_box_and_is_undoable() {
        let mut b = board();
        let id = create(&mut b, 50.0, 20.0);
        let bx = b.canvas.get_box(id).unwrap();
        assert_eq!((bx.x, bx.y, bx.width, bx.height), (40.0, 16.0, 20, 8));

        run(&mut b, CanvasAction::Undo);
        assert!(b.canvas.boxes.is_empty());
        run(&mut b, CanvasAction::Redo);
        assert!(b.canvas.get_box(id).is_some());
    }

    #[test]
    fn create_uses_neighbor_size_when_proportional() {
        let mut b = Board::new(Config::default(), None);
        b.canvas.add_box(0.0, 0.0, 40, 10, None).unwrap();
        let id = create(&mut b, 30.0, 5.0);
        let bx = b.canvas.get_box(id).unwrap();
        assert_eq!((bx.width, bx.height), (40, 10));
    }

    #[test]
    fn delete_restores_connections_on_undo() {
        let mut b = board();
        let a = create(&mut b, 10.0, 10.0);
        let c = create(&mut b, 60.0, 10.0);
        run(&mut b, CanvasAction::StartConnection(Some(a)));
        run(&mut b, CanvasAction::FinishConnection(Some(c)));
        assert_eq!(b.canvas.connections.len(), 1);

        run(&mut b, CanvasAction::SelectBox(a));
        run(&mut b, CanvasAction::DeleteBox);
        assert!(b.canvas.connections.is_empty());

        run(&mut b, CanvasAction::Undo);
        assert_eq!(b.canvas.connections.len(), 1);
        assert_eq!(b.canvas.box_index(a), Some(0));
    }

    #[test]
    fn drag_is_one_undo_step() {
        let mut b = board();
        let id = create(&mut b, 10.0, 10.0);
        for x in [5.0, 6.0, 7.0, 8.0] {
            run(
                &mut b,
                CanvasAction::MoveBox(BoxMove::To {
                    id,
                    x,
                    y: 3.0,
                    offset_x: 1.0,
                    offset_y: 1.0,
                }),
            );
        }
        let bx = b.canvas.get_box(id).unwrap();
        assert_eq!((bx.x, bx.y), (7.0, 2.0));
        assert_eq!(b.history.undo_len(), 2);

        run(&mut b, CanvasAction::Undo);
        let bx = b.canvas.get_box(id).unwrap();
        assert_eq!((bx.x, bx.y), (0.0, 6.0));
    }

    #[test]
    fn other_actions_close_the_drag_gesture() {
        let mut b = board();
        let id = create(&mut b, 10.0, 10.0);
        let drag = |x| {
            CanvasAction::MoveBox(BoxMove::To {
                id,
                x,
                y: 0.0,
                offset_x: 0.0,
                offset_y: 0.0,
            })
        };
        run(&mut b, drag(1.0));
        run(&mut b, CanvasAction::Pan(PanDelta::step(crate::input::action::Direction::Up, 1.0)));
        run(&mut b, drag(2.0));
        assert_eq!(b.history.undo_len(), 3);
    }

    #[test]
    fn key_moves_are_separate_steps() {
        let mut b = board();
        create(&mut b, 10.0, 10.0);
        let nudge = CanvasAction::MoveBox(BoxMove::By {
            id: None,
            dx: 1.0,
            dy: 0.0,
            continuous: false,
        });
        run(&mut b, nudge);
        run(&mut b, nudge);
        assert_eq!(b.history.undo_len(), 3);
    }

    #[test]
    fn resize_is_clamped_and_recorded() {
        let mut b = board();
        let id = create(&mut b, 10.0, 10.0);
        run(&mut b, CanvasAction::ResizeBox(BoxResize { dw: -100, dh: 500 }));
        let bx = b.canvas.get_box(id).unwrap();
        assert_eq!((bx.width, bx.height), (MIN_BOX_WIDTH, MAX_BOX_HEIGHT));
        run(&mut b, CanvasAction::Undo);
        let bx = b.canvas.get_box(id).unwrap();
        assert_eq!((bx.width, bx.height), (20, 8));
    }

    #[test]
    fn color_without_change_records_nothing() {
        let mut b = board();
        create(&mut b, 10.0, 10.0);
        run(&mut b, CanvasAction::ColorBox(0));
        assert_eq!(b.history.undo_len(), 1);
        run(&mut b, CanvasAction::ColorBox(4));
        assert_eq!(b.canvas.selected().unwrap().color, 4);
        assert_eq!(b.history.undo_len(), 2);
    }

    #[test]
    fn self_connection_is_reported_not_fatal() {
        let mut b = board();
        let a = create(&mut b, 10.0, 10.0);
        run(&mut b, CanvasAction::StartConnection(None));
        let outcome = run(&mut b, CanvasAction::FinishConnection(Some(a)));
        assert_eq!(outcome, Outcome::Continue);
        assert!(b.canvas.connections.is_empty());
        assert!(!b.canvas.is_connecting());
        assert!(!b.status.is_empty());
    }

    #[test]
    fn delete_connection_removes_all_edges_of_selected() {
        let mut b = board();
        let a = create(&mut b, 10.0, 10.0);
        let c = create(&mut b, 60.0, 10.0);
        let d = create(&mut b, 60.0, 40.0);
        b.canvas.add_connection(a, c, 0).unwrap();
        b.canvas.add_connection(d, a, 0).unwrap();
        run(&mut b, CanvasAction::SelectBox(a));
        run(&mut b, CanvasAction::DeleteConnection);
        assert!(b.canvas.connections.is_empty());
        run(&mut b, CanvasAction::Undo);
        assert_eq!(b.canvas.connections.len(), 1);
    }

    #[test]
    fn prompts_need_a_selection() {
        let mut b = board();
        assert_eq!(run(&mut b, CanvasAction::EditTitle), Outcome::Continue);
        let id = create(&mut b, 10.0, 10.0);
        assert_eq!(run(&mut b, CanvasAction::EditTitle), Outcome::PromptTitle(id));
        assert_eq!(run(&mut b, CanvasAction::EditSidebar), Outcome::PromptContent(id));
        assert!(b.canvas.sidebar.visible);
    }

    #[test]
    fn title_edit_is_undoable() {
        let mut b = board();
        let id = create(&mut b, 10.0, 10.0);
        b.apply_title(id, "  Plan ");
        assert_eq!(b.canvas.get_box(id).unwrap().title.as_deref(), Some("Plan"));
        b.apply_title(id, "");
        assert_eq!(b.canvas.get_box(id).unwrap().title, None);
        run(&mut b, CanvasAction::Undo);
        assert_eq!(b.canvas.get_box(id).unwrap().title.as_deref(), Some("Plan"));
    }

    #[test]
    fn content_input_forms() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "alpha\nbeta\n").unwrap();

        let mut b = board();
        let id = create(&mut b, 10.0, 10.0);

        b.apply_content(id, "one | two").unwrap();
        assert_eq!(b.canvas.get_box(id).unwrap().content, vec!["one", "two"]);

        b.apply_content(id, &format!("@{}", file.display())).unwrap();
        let bx = b.canvas.get_box(id).unwrap();
        assert_eq!(bx.content, vec!["alpha", "beta"]);
        assert_eq!(bx.content_type, ContentType::File);

        b.apply_content(id, "!echo hi").unwrap();
        let bx = b.canvas.get_box(id).unwrap();
        assert_eq!(bx.content, vec!["hi"]);
        assert_eq!(bx.command.as_deref(), Some("echo hi"));

        run(&mut b, CanvasAction::Undo);
        assert_eq!(b.canvas.get_box(id).unwrap().content_type, ContentType::File);

        assert!(b.apply_content(id, "@/definitely/not/here").is_err());
        assert_eq!(b.canvas.get_box(id).unwrap().content, vec!["alpha", "beta"]);
    }

    #[test]
    fn save_load_round_trip_clears_history() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.txt");
        let mut b = Board::new(
            Config {
                proportional_sizing: false,
                ..Config::default()
            },
            Some(path.clone()),
        );
        let a = create(&mut b, 10.0, 10.0);
        b.apply_title(a, "kept");
        run(&mut b, CanvasAction::SaveCanvas);
        create(&mut b, 80.0, 10.0);

        run(&mut b, CanvasAction::LoadCanvas);
        assert_eq!(b.canvas.boxes.len(), 1);
        assert_eq!(b.canvas.get_box(a).unwrap().title.as_deref(), Some("kept"));
        assert!(!b.history.can_undo());
    }

    #[test]
    fn failed_load_keeps_current_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, "garbage\n").unwrap();
        let mut b = Board::new(Config::default(), Some(path));
        create(&mut b, 10.0, 10.0);

        run(&mut b, CanvasAction::LoadCanvas);
        assert_eq!(b.canvas.boxes.len(), 1);
        assert!(b.history.can_undo());
        assert!(!b.status.is_empty());
    }

    #[test]
    fn open_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let b = Board::open(Config::default(), Some(dir.path().join("new.txt"))).unwrap();
        assert!(b.canvas.boxes.is_empty());
        assert!(b.status.starts_with("new canvas"));
    }

    #[test]
    fn focus_centers_viewport_on_selection() {
        let mut b = board();
        let id = create(&mut b, 100.0, 50.0);
        run(&mut b, CanvasAction::EnterFocus);
        assert_eq!(b.canvas.focus.box_id, Some(id));
        assert_eq!(b.viewport.center_world(), (100.0, 50.0));
        run(&mut b, CanvasAction::ExitFocus);
        assert_eq!(b.canvas.focus.box_id, None);
    }

    #[test]
    fn zoom_uses_configured_step() {
        let mut b = board();
        run(&mut b, CanvasAction::ZoomIn);
        assert!((b.viewport.zoom - 1.2).abs() < 1e-9);
        run(&mut b, CanvasAction::ZoomOut);
        assert!((b.viewport.zoom - 1.0).abs() < 1e-9);
    }

    #[test]
    fn quit_and_help() {
        let mut b = board();
        assert_eq!(run(&mut b, CanvasAction::ToggleHelp), Outcome::Continue);
        assert!(b.show_help);
        assert_eq!(run(&mut b, CanvasAction::Quit), Outcome::Quit);
    }

    #[test]
    fn demo_canvas_is_connected() {
        let c = demo_canvas(&Config::default());
        assert_eq!(c.boxes.len(), 4);
        assert_eq!(c.connections.len(), 3);
    }
}
