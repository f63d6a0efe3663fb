//! The device-agnostic action vocabulary.
//!
//! Keyboard, mouse and gamepad decoders all produce [`InputEvent`]s; the
//! board executes them without knowing which device they came from.

use crate::canvas::model::BoxTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A camera movement in screen cells; the viewport divides it by zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanDelta {
    pub dx: f64,
    pub dy: f64,
    /// Produced every frame while a stick is held, as opposed to a key press.
    pub continuous: bool,
}

impl PanDelta {
    pub fn step(direction: Direction, amount: f64) -> Self {
        let (dx, dy) = match direction {
            Direction::Up => (0.0, -amount),
            Direction::Down => (0.0, amount),
            Direction::Left => (-amount, 0.0),
            Direction::Right => (amount, 0.0),
        };
        Self {
            dx,
            dy,
            continuous: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateBox {
    pub x: f64,
    pub y: f64,
    pub template: BoxTemplate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxMove {
    /// Place the box so that the grab point `(offset_x, offset_y)` inside
    /// it sits at world `(x, y)`.
    To {
        id: u32,
        x: f64,
        y: f64,
        offset_x: f64,
        offset_y: f64,
    },
    /// Shift a box (the selected one when `id` is `None`) by a world delta.
    By {
        id: Option<u32>,
        dx: f64,
        dy: f64,
        continuous: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxResize {
    pub dw: i32,
    pub dh: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasAction {
    Pan(PanDelta),
    ZoomIn,
    ZoomOut,
    SelectBox(u32),
    Deselect,
    CycleBox,
    CreateBox(CreateBox),
    DeleteBox,
    MoveBox(BoxMove),
    ResizeBox(BoxResize),
    ColorBox(u8),
    CycleBoxType,
    ResetView,
    ToggleGrid,
    ToggleSnap,
    CycleDisplayMode,
    EnterFocus,
    ExitFocus,
    /// `None` uses the selected box.
    StartConnection(Option<u32>),
    /// `None` uses the selected box.
    FinishConnection(Option<u32>),
    CancelConnection,
    DeleteConnection,
    ToggleSidebar,
    WidenSidebar,
    NarrowSidebar,
    EditSidebar,
    EditTitle,
    SaveCanvas,
    LoadCanvas,
    ExportCanvas,
    EnterEditMode,
    EnterParamMode,
    EnterNavMode,
    Undo,
    Redo,
    ToggleHelp,
    Quit,
}

impl CanvasAction {
    /// Actions that only nudge an in-progress drag; they keep a move
    /// gesture open in history.
    pub fn is_continuous_move(&self) -> bool {
        matches!(
            self,
            Self::MoveBox(BoxMove::To { .. })
                | Self::MoveBox(BoxMove::By {
                    continuous: true,
                    ..
                })
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Mouse,
    Gamepad,
}

/// An action together with the device that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub action: CanvasAction,
    pub source: InputSource,
}

impl InputEvent {
    pub fn new(source: InputSource, action: CanvasAction) -> Self {
        Self { action, source }
    }
}
