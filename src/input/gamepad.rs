//! Gamepad decoding: a small mode machine on top of raw axis/button state.
//!
//! Modes cycle `Nav → Selection → Edit → Nav` on the left bumper. Edit is
//! skipped when nothing is selected. Connect and Param are entered from
//! Edit with dedicated buttons.
//!
//! The bumpers double as template modifiers while creating boxes. A bumper
//! that was used as a modifier during its hold does not fire its own action
//! on release.

use crate::canvas::model::{BoxTemplate, PALETTE_SIZE};
use crate::canvas::store::Canvas;
use crate::canvas::viewport::Viewport;
use crate::input::action::{BoxMove, BoxResize, CanvasAction, CreateBox, Direction, PanDelta};

pub const MAX_AXES: usize = 8;
pub const MAX_BUTTONS: usize = 16;
pub const AXIS_MAX: f64 = 32767.0;

pub const BUTTON_A: usize = 0;
pub const BUTTON_B: usize = 1;
pub const BUTTON_X: usize = 2;
pub const BUTTON_Y: usize = 3;
pub const BUTTON_LB: usize = 4;
pub const BUTTON_RB: usize = 5;
pub const BUTTON_BACK: usize = 6;
pub const BUTTON_START: usize = 7;
pub const BUTTON_RSTICK: usize = 10;

pub const AXIS_LX: usize = 0;
pub const AXIS_LY: usize = 1;
pub const AXIS_LT: usize = 2;
pub const AXIS_RT: usize = 5;
pub const AXIS_DPAD_X: usize = 6;
pub const AXIS_DPAD_Y: usize = 7;

/// Triggers rest at -32767 and read +32767 fully pulled.
const TRIGGER_THRESHOLD: i16 = 0;
const DPAD_THRESHOLD: i16 = 16384;
const DPAD_PAN_STEP: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamepadMode {
    #[default]
    Nav,
    Selection,
    Edit,
    Param,
    Connect,
}

impl GamepadMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Nav => "NAV",
            Self::Selection => "SELECT",
            Self::Edit => "EDIT",
            Self::Param => "PARAM",
            Self::Connect => "CONNECT",
        }
    }
}

/// Raw device state as last reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamepadState {
    pub axes: [i16; MAX_AXES],
    pub buttons: [bool; MAX_BUTTONS],
}

impl Default for GamepadState {
    fn default() -> Self {
        let mut axes = [0; MAX_AXES];
        axes[AXIS_LT] = -32767;
        axes[AXIS_RT] = -32767;
        Self {
            axes,
            buttons: [false; MAX_BUTTONS],
        }
    }
}

impl GamepadState {
    pub fn set_axis(&mut self, number: usize, value: i16) {
        if let Some(slot) = self.axes.get_mut(number) {
            *slot = value;
        }
    }

    pub fn set_button(&mut self, number: usize, pressed: bool) {
        if let Some(slot) = self.buttons.get_mut(number) {
            *slot = pressed;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GamepadSettings {
    pub pan_speed: f64,
    pub deadzone: i16,
    pub settle_frames: u32,
}

impl Default for GamepadSettings {
    fn default() -> Self {
        Self {
            pan_speed: 2.0,
            deadzone: 8000,
            settle_frames: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GamepadSession {
    pub mode: GamepadMode,
    pub current: GamepadState,
    previous: GamepadState,
    settings: GamepadSettings,
    settle_remaining: u32,
    lb_used_as_modifier: bool,
    rb_used_as_modifier: bool,
}

impl GamepadSession {
    pub fn new(settings: GamepadSettings) -> Self {
        Self {
            mode: GamepadMode::Nav,
            current: GamepadState::default(),
            previous: GamepadState::default(),
            settings,
            settle_remaining: settings.settle_frames,
            lb_used_as_modifier: false,
            rb_used_as_modifier: false,
        }
    }

    /// Restarts the settling period, e.g. after a reconnect.
    pub fn reset(&mut self) {
        *self = Self::new(self.settings);
    }

    pub fn is_settling(&self) -> bool {
        self.settle_remaining > 0
    }

    /// Decodes one frame. Call exactly once per loop tick, after feeding all
    /// pending device events into `current`.
    pub fn process(&mut self, canvas: &Canvas, viewport: &Viewport) -> Option<CanvasAction> {
        let action = self.decide(canvas, viewport);
        self.previous = self.current;
        self.settle_remaining = self.settle_remaining.saturating_sub(1);
        action
    }

    fn pressed(&self, button: usize) -> bool {
        self.current.buttons[button] && !self.previous.buttons[button]
    }

    fn released(&self, button: usize) -> bool {
        !self.current.buttons[button] && self.previous.buttons[button]
    }

    fn held(&self, button: usize) -> bool {
        self.current.buttons[button]
    }

    fn trigger_pulled(&self, axis: usize) -> bool {
        self.current.axes[axis] > TRIGGER_THRESHOLD && self.previous.axes[axis] <= TRIGGER_THRESHOLD
    }

    fn dpad_edge(&self) -> Option<Direction> {
        let edge = |axis: usize, positive: bool| {
            let (cur, prev) = (self.current.axes[axis], self.previous.axes[axis]);
            if positive {
                cur > DPAD_THRESHOLD && prev <= DPAD_THRESHOLD
            } else {
                cur < -DPAD_THRESHOLD && prev >= -DPAD_THRESHOLD
            }
        };
        if edge(AXIS_DPAD_X, false) {
            Some(Direction::Left)
        } else if edge(AXIS_DPAD_X, true) {
            Some(Direction::Right)
        } else if edge(AXIS_DPAD_Y, false) {
            Some(Direction::Up)
        } else if edge(AXIS_DPAD_Y, true) {
            Some(Direction::Down)
        } else {
            None
        }
    }

    /// Left stick deflection in `[-1, 1]`, zero inside the deadzone or while
    /// settling.
    fn stick(&self) -> Option<(f64, f64)> {
        if self.is_settling() {
            return None;
        }
        let norm = |v: i16| {
            if v.unsigned_abs() <= self.settings.deadzone.unsigned_abs() {
                0.0
            } else {
                f64::from(v) / AXIS_MAX
            }
        };
        let (x, y) = (norm(self.current.axes[AXIS_LX]), norm(self.current.axes[AXIS_LY]));
        (x != 0.0 || y != 0.0).then_some((x, y))
    }

    fn decide(&mut self, canvas: &Canvas, viewport: &Viewport) -> Option<CanvasAction> {
        if self.held(BUTTON_LB) && self.pressed(BUTTON_A) && self.mode == GamepadMode::Nav {
            self.lb_used_as_modifier = true;
            return Some(self.create_at_center(viewport, BoxTemplate::Horizontal));
        }
        if self.held(BUTTON_RB) && self.pressed(BUTTON_A) && self.mode == GamepadMode::Nav {
            self.rb_used_as_modifier = true;
            return Some(self.create_at_center(viewport, BoxTemplate::Vertical));
        }
        if self.held(BUTTON_RB) && self.pressed(BUTTON_Y) {
            self.rb_used_as_modifier = true;
            return Some(CanvasAction::Redo);
        }

        if self.released(BUTTON_LB) {
            let used = std::mem::take(&mut self.lb_used_as_modifier);
            if !used {
                return Some(self.cycle_mode(canvas));
            }
        }
        if self.released(BUTTON_RB) {
            let used = std::mem::take(&mut self.rb_used_as_modifier);
            if !used {
                return Some(CanvasAction::ToggleSidebar);
            }
        }

        if self.pressed(BUTTON_START) {
            return Some(CanvasAction::ToggleHelp);
        }
        if self.pressed(BUTTON_BACK) {
            return Some(CanvasAction::ResetView);
        }

        if matches!(
            self.mode,
            GamepadMode::Edit | GamepadMode::Param | GamepadMode::Connect
        ) && canvas.selected_id().is_none()
        {
            let leaving = std::mem::replace(&mut self.mode, GamepadMode::Nav);
            if leaving == GamepadMode::Connect && canvas.is_connecting() {
                return Some(CanvasAction::CancelConnection);
            }
            return Some(CanvasAction::EnterNavMode);
        }

        match self.mode {
            GamepadMode::Nav => self.decide_nav(viewport),
            GamepadMode::Selection => self.decide_selection(),
            GamepadMode::Edit => self.decide_edit(canvas, viewport),
            GamepadMode::Param => self.decide_param(),
            GamepadMode::Connect => self.decide_connect(),
        }
    }

    fn cycle_mode(&mut self, canvas: &Canvas) -> CanvasAction {
        match self.mode {
            GamepadMode::Nav => {
                self.mode = GamepadMode::Selection;
                CanvasAction::CycleBox
            }
            GamepadMode::Selection if canvas.selected_id().is_some() => {
                self.mode = GamepadMode::Edit;
                CanvasAction::EnterEditMode
            }
            GamepadMode::Connect => {
                self.mode = GamepadMode::Nav;
                CanvasAction::CancelConnection
            }
            GamepadMode::Selection | GamepadMode::Edit | GamepadMode::Param => {
                self.mode = GamepadMode::Nav;
                CanvasAction::EnterNavMode
            }
        }
    }

    fn create_at_center(&self, viewport: &Viewport, template: BoxTemplate) -> CanvasAction {
        let (x, y) = viewport.center_world();
        CanvasAction::CreateBox(CreateBox { x, y, template })
    }

    fn stick_pan(&self) -> Option<CanvasAction> {
        let (x, y) = self.stick()?;
        Some(CanvasAction::Pan(PanDelta {
            dx: x * self.settings.pan_speed,
            dy: y * self.settings.pan_speed,
            continuous: true,
        }))
    }

    fn decide_nav(&mut self, viewport: &Viewport) -> Option<CanvasAction> {
        if self.pressed(BUTTON_A) && !self.held(BUTTON_LB) && !self.held(BUTTON_RB) {
            return Some(self.create_at_center(viewport, BoxTemplate::Square));
        }
        if self.pressed(BUTTON_X) {
            return Some(CanvasAction::ToggleGrid);
        }
        if self.pressed(BUTTON_Y) {
            return Some(CanvasAction::Undo);
        }
        if self.trigger_pulled(AXIS_RT) {
            return Some(CanvasAction::ZoomIn);
        }
        if self.trigger_pulled(AXIS_LT) {
            return Some(CanvasAction::ZoomOut);
        }
        if let Some(direction) = self.dpad_edge() {
            return Some(CanvasAction::Pan(PanDelta::step(direction, DPAD_PAN_STEP)));
        }
        self.stick_pan()
    }

    fn decide_selection(&mut self) -> Option<CanvasAction> {
        if self.pressed(BUTTON_A) || matches!(self.dpad_edge(), Some(Direction::Right)) {
            return Some(CanvasAction::CycleBox);
        }
        if self.pressed(BUTTON_B) {
            self.mode = GamepadMode::Nav;
            return Some(CanvasAction::Deselect);
        }
        self.stick_pan()
    }

    fn decide_edit(&mut self, canvas: &Canvas, viewport: &Viewport) -> Option<CanvasAction> {
        if self.pressed(BUTTON_A) {
            self.mode = GamepadMode::Connect;
            return Some(CanvasAction::StartConnection(None));
        }
        if self.pressed(BUTTON_B) {
            self.mode = GamepadMode::Nav;
            return Some(CanvasAction::EnterNavMode);
        }
        if self.pressed(BUTTON_X) {
            self.mode = GamepadMode::Nav;
            return Some(CanvasAction::DeleteBox);
        }
        if self.pressed(BUTTON_Y) {
            let color = canvas.selected().map(|b| b.color).unwrap_or(0);
            return Some(CanvasAction::ColorBox((color % PALETTE_SIZE + 1) % PALETTE_SIZE));
        }
        if self.pressed(BUTTON_RSTICK) {
            self.mode = GamepadMode::Param;
            return Some(CanvasAction::EnterParamMode);
        }
        let (x, y) = self.stick()?;
        let scale = self.settings.pan_speed / viewport.zoom.max(f64::EPSILON);
        Some(CanvasAction::MoveBox(BoxMove::By {
            id: None,
            dx: x * scale,
            dy: y * scale,
            continuous: true,
        }))
    }

    fn decide_param(&mut self) -> Option<CanvasAction> {
        if self.pressed(BUTTON_B) || self.pressed(BUTTON_RSTICK) {
            self.mode = GamepadMode::Edit;
            return Some(CanvasAction::EnterEditMode);
        }
        if self.pressed(BUTTON_Y) {
            return Some(CanvasAction::CycleBoxType);
        }
        if self.pressed(BUTTON_X) {
            return Some(CanvasAction::CycleDisplayMode);
        }
        let (dw, dh) = match self.dpad_edge()? {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        };
        Some(CanvasAction::ResizeBox(BoxResize { dw, dh }))
    }

    fn decide_connect(&mut self) -> Option<CanvasAction> {
        if self.pressed(BUTTON_A) {
            self.mode = GamepadMode::Nav;
            return Some(CanvasAction::FinishConnection(None));
        }
        if self.pressed(BUTTON_B) {
            self.mode = GamepadMode::Nav;
            return Some(CanvasAction::CancelConnection);
        }
        if self.pressed(BUTTON_X) || matches!(self.dpad_edge(), Some(Direction::Right)) {
            return Some(CanvasAction::CycleBox);
        }
        None
    }
}
