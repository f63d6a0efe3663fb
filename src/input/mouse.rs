use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::canvas::store::Canvas;
use crate::canvas::viewport::Viewport;
use crate::input::action::{BoxMove, CanvasAction};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    box_id: u32,
    /// Grab point relative to the box's top-left corner, in world units.
    offset_x: f64,
    offset_y: f64,
}

/// Drag state carried between mouse events.
#[derive(Debug, Clone, Default)]
pub struct MouseSession {
    drag: Option<Drag>,
}

impl MouseSession {
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[allow(dead_code)] // used by tests
    pub fn dragged_box(&self) -> Option<u32> {
        self.drag.map(|d| d.box_id)
    }

    /// Decodes one mouse event. `origin` is the terminal cell where the
    /// canvas area starts; events left of or above it are ignored.
    pub fn process(
        &mut self,
        event: &MouseEvent,
        canvas: &Canvas,
        viewport: &Viewport,
        origin: (u16, u16),
    ) -> Option<CanvasAction> {
        if event.column < origin.0 || event.row < origin.1 {
            return None;
        }
        let sx = i32::from(event.column - origin.0);
        let sy = i32::from(event.row - origin.1);
        let (wx, wy) = viewport.screen_to_world(sx, sy);

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => match canvas.find_box_at(wx, wy) {
                Some(id) => {
                    let b = canvas.get_box(id)?;
                    self.drag = Some(Drag {
                        box_id: id,
                        offset_x: wx - b.x,
                        offset_y: wy - b.y,
                    });
                    Some(CanvasAction::SelectBox(id))
                }
                None => {
                    self.drag = None;
                    Some(CanvasAction::Deselect)
                }
            },
            MouseEventKind::Drag(MouseButton::Left) => {
                let drag = self.drag?;
                Some(CanvasAction::MoveBox(BoxMove::To {
                    id: drag.box_id,
                    x: wx,
                    y: wy,
                    offset_x: drag.offset_x,
                    offset_y: drag.offset_y,
                }))
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.drag = None;
                None
            }
            MouseEventKind::Down(MouseButton::Right) => match canvas.find_box_at(wx, wy) {
                Some(id) if canvas.is_connecting() => Some(CanvasAction::FinishConnection(Some(id))),
                Some(id) => Some(CanvasAction::StartConnection(Some(id))),
                None if canvas.is_connecting() => Some(CanvasAction::CancelConnection),
                None => None,
            },
            MouseEventKind::ScrollUp => Some(CanvasAction::ZoomIn),
            MouseEventKind::ScrollDown => Some(CanvasAction::ZoomOut),
            _ => None,
        }
    }
}
