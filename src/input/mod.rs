//! Raw device input → [`action::InputEvent`].
//!
//! All per-device state lives in [`InputSession`], owned by the main loop.

pub mod action;
pub mod gamepad;
pub mod joystick;
pub mod keyboard;
pub mod mouse;

use crossterm::event::{KeyEvent, MouseEvent};

use crate::canvas::store::Canvas;
use crate::canvas::viewport::Viewport;
use action::{InputEvent, InputSource};
use gamepad::{GamepadSession, GamepadSettings};
use keyboard::KeyContext;
use mouse::MouseSession;

#[derive(Debug, Clone)]
pub struct InputSession {
    pub mouse: MouseSession,
    pub gamepad: GamepadSession,
    pub pan_step: f64,
}

impl InputSession {
    pub fn new(pan_step: f64, gamepad: GamepadSettings) -> Self {
        Self {
            mouse: MouseSession::default(),
            gamepad: GamepadSession::new(gamepad),
            pan_step,
        }
    }

    pub fn process_key(
        &mut self,
        key: KeyEvent,
        canvas: &Canvas,
        viewport: &Viewport,
    ) -> Option<InputEvent> {
        let ctx = KeyContext {
            center: viewport.center_world(),
            zoom: viewport.zoom,
            pan_step: self.pan_step,
            connecting: canvas.is_connecting(),
            focused: canvas.focus.box_id.is_some(),
        };
        keyboard::action_for_key(key, ctx).map(|a| InputEvent::new(InputSource::Keyboard, a))
    }

    pub fn process_mouse(
        &mut self,
        event: &MouseEvent,
        canvas: &Canvas,
        viewport: &Viewport,
        origin: (u16, u16),
    ) -> Option<InputEvent> {
        self.mouse
            .process(event, canvas, viewport, origin)
            .map(|a| InputEvent::new(InputSource::Mouse, a))
    }

    pub fn process_gamepad(&mut self, canvas: &Canvas, viewport: &Viewport) -> Option<InputEvent> {
        self.gamepad
            .process(canvas, viewport)
            .map(|a| InputEvent::new(InputSource::Gamepad, a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::action::CanvasAction;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn key_events_are_tagged_with_their_source() {
        let mut session = InputSession::new(5.0, GamepadSettings::default());
        let canvas = Canvas::new(200.0, 100.0);
        let vp = Viewport::new(80, 24);
        let ev = session
            .process_key(KeyEvent::new(KeyCode::Char('g'), KeyModifiers::NONE), &canvas, &vp)
            .unwrap();
        assert_eq!(ev.source, InputSource::Keyboard);
        assert_eq!(ev.action, CanvasAction::ToggleGrid);
    }

    #[test]
    fn unmapped_key_yields_no_event() {
        let mut session = InputSession::new(5.0, GamepadSettings::default());
        let canvas = Canvas::new(200.0, 100.0);
        let vp = Viewport::new(80, 24);
        assert!(
            session
                .process_key(KeyEvent::new(KeyCode::Char('z'), KeyModifiers::NONE), &canvas, &vp)
                .is_none()
        );
    }
}
