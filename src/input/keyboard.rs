use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::canvas::model::BoxTemplate;
use crate::input::action::{BoxMove, BoxResize, CanvasAction, CreateBox, Direction, PanDelta};

/// Board state the key table needs to pick between a few context actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyContext {
    /// World point at the middle of the view; new boxes spawn here.
    pub center: (f64, f64),
    pub zoom: f64,
    pub pan_step: f64,
    pub connecting: bool,
    pub focused: bool,
}

pub fn action_for_key(key: KeyEvent, ctx: KeyContext) -> Option<CanvasAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('z') => Some(CanvasAction::Undo),
            KeyCode::Char('y') | KeyCode::Char('Z') => Some(CanvasAction::Redo),
            KeyCode::Char('s') => Some(CanvasAction::SaveCanvas),
            KeyCode::Char('o') => Some(CanvasAction::LoadCanvas),
            KeyCode::Char('e') => Some(CanvasAction::ExportCanvas),
            KeyCode::Char('c') | KeyCode::Char('q') => Some(CanvasAction::Quit),
            KeyCode::Up => Some(resize(0, -1)),
            KeyCode::Down => Some(resize(0, 1)),
            KeyCode::Left => Some(resize(-1, 0)),
            KeyCode::Right => Some(resize(1, 0)),
            _ => None,
        };
    }

    if key.modifiers.contains(KeyModifiers::SHIFT)
        && let Some(direction) = arrow(key.code)
    {
        return Some(move_selected(direction, ctx.zoom));
    }

    let action = match key.code {
        KeyCode::Up | KeyCode::Char('w') => pan(Direction::Up, ctx),
        KeyCode::Down | KeyCode::Char('s') => pan(Direction::Down, ctx),
        KeyCode::Left | KeyCode::Char('a') => pan(Direction::Left, ctx),
        KeyCode::Right | KeyCode::Char('d') => pan(Direction::Right, ctx),
        KeyCode::Char('W') => move_selected(Direction::Up, ctx.zoom),
        KeyCode::Char('S') => move_selected(Direction::Down, ctx.zoom),
        KeyCode::Char('A') => move_selected(Direction::Left, ctx.zoom),
        KeyCode::Char('D') => move_selected(Direction::Right, ctx.zoom),
        KeyCode::Char('+') | KeyCode::Char('=') => CanvasAction::ZoomIn,
        KeyCode::Char('-') | KeyCode::Char('_') => CanvasAction::ZoomOut,
        KeyCode::Char('n') => create(BoxTemplate::Square, ctx),
        KeyCode::Char('b') => create(BoxTemplate::Horizontal, ctx),
        KeyCode::Char('v') => create(BoxTemplate::Vertical, ctx),
        KeyCode::Tab => CanvasAction::CycleBox,
        KeyCode::Delete | KeyCode::Char('x') => CanvasAction::DeleteBox,
        KeyCode::Char(c @ '0'..='7') => CanvasAction::ColorBox(c as u8 - b'0'),
        KeyCode::Char('t') => CanvasAction::CycleBoxType,
        KeyCode::Char('r') => CanvasAction::ResetView,
        KeyCode::Char('g') => CanvasAction::ToggleGrid,
        KeyCode::Char('G') => CanvasAction::ToggleSnap,
        KeyCode::Char('m') => CanvasAction::CycleDisplayMode,
        KeyCode::Char('c') if ctx.connecting => CanvasAction::FinishConnection(None),
        KeyCode::Char('c') => CanvasAction::StartConnection(None),
        KeyCode::Char('X') => CanvasAction::DeleteConnection,
        KeyCode::Char('p') => CanvasAction::ToggleSidebar,
        KeyCode::Char('[') => CanvasAction::NarrowSidebar,
        KeyCode::Char(']') => CanvasAction::WidenSidebar,
        KeyCode::Char('e') => CanvasAction::EditSidebar,
        KeyCode::Char('T') => CanvasAction::EditTitle,
        KeyCode::Char('u') => CanvasAction::Undo,
        KeyCode::Char('U') => CanvasAction::Redo,
        KeyCode::F(1) | KeyCode::Char('?') => CanvasAction::ToggleHelp,
        KeyCode::F(2) => CanvasAction::SaveCanvas,
        KeyCode::F(3) => CanvasAction::LoadCanvas,
        KeyCode::F(4) => CanvasAction::ExportCanvas,
        KeyCode::Enter if ctx.connecting => CanvasAction::FinishConnection(None),
        KeyCode::Enter if ctx.focused => CanvasAction::ExitFocus,
        KeyCode::Enter => CanvasAction::EnterFocus,
        KeyCode::Esc if ctx.connecting => CanvasAction::CancelConnection,
        KeyCode::Esc if ctx.focused => CanvasAction::ExitFocus,
        KeyCode::Esc => CanvasAction::Deselect,
        KeyCode::Char('q') => CanvasAction::Quit,
        _ => return None,
    };
    Some(action)
}

fn arrow(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up => Some(Direction::Up),
        KeyCode::Down => Some(Direction::Down),
        KeyCode::Left => Some(Direction::Left),
        KeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

fn pan(direction: Direction, ctx: KeyContext) -> CanvasAction {
    CanvasAction::Pan(PanDelta::step(direction, ctx.pan_step))
}

/// One screen cell, whatever the zoom.
fn move_selected(direction: Direction, zoom: f64) -> CanvasAction {
    let step = PanDelta::step(direction, 1.0 / zoom.max(f64::EPSILON));
    CanvasAction::MoveBox(BoxMove::By {
        id: None,
        dx: step.dx,
        dy: step.dy,
        continuous: false,
    })
}

fn resize(dw: i32, dh: i32) -> CanvasAction {
    CanvasAction::ResizeBox(BoxResize { dw, dh })
}

fn create(template: BoxTemplate, ctx: KeyContext) -> CanvasAction {
    CanvasAction::CreateBox(CreateBox {
        x: ctx.center.0,
        y: ctx.center.1,
        template,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> KeyContext {
        KeyContext {
            center: (40.0, 12.0),
            zoom: 2.0,
            pan_step: 5.0,
            connecting: false,
            focused: false,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_pan_by_configured_step() {
        assert_eq!(
            action_for_key(key(KeyCode::Left), ctx()),
            Some(CanvasAction::Pan(PanDelta {
                dx: -5.0,
                dy: 0.0,
                continuous: false
            }))
        );
    }

    #[test]
    fn digits_carry_color_index() {
        assert_eq!(
            action_for_key(key(KeyCode::Char('5')), ctx()),
            Some(CanvasAction::ColorBox(5))
        );
        assert_eq!(action_for_key(key(KeyCode::Char('9')), ctx()), None);
    }

    #[test]
    fn creation_spawns_at_view_center() {
        assert_eq!(
            action_for_key(key(KeyCode::Char('b')), ctx()),
            Some(CanvasAction::CreateBox(CreateBox {
                x: 40.0,
                y: 12.0,
                template: BoxTemplate::Horizontal
            }))
        );
    }

    #[test]
    fn shift_arrow_moves_one_screen_cell() {
        let ev = KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT);
        assert_eq!(
            action_for_key(ev, ctx()),
            Some(CanvasAction::MoveBox(BoxMove::By {
                id: None,
                dx: 0.5,
                dy: 0.0,
                continuous: false
            }))
        );
    }

    #[test]
    fn control_keys_map_to_history_and_files() {
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(action_for_key(ctrl('z'), ctx()), Some(CanvasAction::Undo));
        assert_eq!(action_for_key(ctrl('y'), ctx()), Some(CanvasAction::Redo));
        assert_eq!(action_for_key(ctrl('s'), ctx()), Some(CanvasAction::SaveCanvas));
        assert_eq!(action_for_key(ctrl('x'), ctx()), None);
    }

    #[test]
    fn escape_and_enter_follow_context() {
        let mut c = ctx();
        assert_eq!(action_for_key(key(KeyCode::Esc), c), Some(CanvasAction::Deselect));
        assert_eq!(action_for_key(key(KeyCode::Enter), c), Some(CanvasAction::EnterFocus));
        c.connecting = true;
        assert_eq!(
            action_for_key(key(KeyCode::Esc), c),
            Some(CanvasAction::CancelConnection)
        );
        assert_eq!(
            action_for_key(key(KeyCode::Char('c')), c),
            Some(CanvasAction::FinishConnection(None))
        );
        c.connecting = false;
        c.focused = true;
        assert_eq!(action_for_key(key(KeyCode::Esc), c), Some(CanvasAction::ExitFocus));
    }
}
