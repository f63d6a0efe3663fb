//! Linear undo/redo history over the entity store.
//!
//! Each [`Operation`] carries only the before/after state its type needs.
//! Snapshots own their strings, so later edits or deletes of the live box
//! never reach into history.
//!
//! The undo chain runs oldest → newest (`current` is the back); the redo
//! chain holds undone operations with the most recently undone on top.
//! Recording anything new drops the whole redo chain.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::canvas::model::{CanvasBox, Connection, ContentType};
use crate::canvas::store::{Canvas, CanvasError, CanvasResult};

pub const DEFAULT_MAX_SIZE: usize = 50;

/// Everything that makes up a box's content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentSnapshot {
    pub lines: Vec<String>,
    pub content_type: ContentType,
    pub file_path: Option<String>,
    pub command: Option<String>,
}

impl ContentSnapshot {
    pub fn of(b: &CanvasBox) -> Self {
        Self {
            lines: b.content.clone(),
            content_type: b.content_type,
            file_path: b.file_path.clone(),
            command: b.command.clone(),
        }
    }

    pub fn text(lines: Vec<String>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    fn apply_to(&self, b: &mut CanvasBox) {
        b.content = self.lines.clone();
        b.content_type = self.content_type;
        b.file_path = self.file_path.clone();
        b.command = self.command.clone();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    BoxCreate,
    BoxDelete,
    BoxMove,
    BoxResize,
    BoxContent,
    BoxTitle,
    BoxColor,
    ConnectionCreate,
    ConnectionDelete,
}

impl OperationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::BoxCreate => "create box",
            Self::BoxDelete => "delete box",
            Self::BoxMove => "move box",
            Self::BoxResize => "resize box",
            Self::BoxContent => "edit content",
            Self::BoxTitle => "edit title",
            Self::BoxColor => "recolor box",
            Self::ConnectionCreate => "connect",
            Self::ConnectionDelete => "disconnect",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    BoxCreate {
        snapshot: CanvasBox,
        index: usize,
    },
    /// Also keeps the connections the delete cascaded through, so undo can
    /// put them back.
    BoxDelete {
        snapshot: CanvasBox,
        index: usize,
        connections: Vec<Connection>,
    },
    BoxMove {
        id: u32,
        before: (f64, f64),
        after: (f64, f64),
    },
    BoxResize {
        id: u32,
        before: (i32, i32),
        after: (i32, i32),
    },
    BoxContent {
        id: u32,
        before: ContentSnapshot,
        after: ContentSnapshot,
    },
    BoxTitle {
        id: u32,
        before: Option<String>,
        after: Option<String>,
    },
    BoxColor {
        id: u32,
        before: u8,
        after: u8,
    },
    ConnectionCreate(Connection),
    ConnectionDelete(Connection),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::BoxCreate { .. } => OperationKind::BoxCreate,
            Self::BoxDelete { .. } => OperationKind::BoxDelete,
            Self::BoxMove { .. } => OperationKind::BoxMove,
            Self::BoxResize { .. } => OperationKind::BoxResize,
            Self::BoxContent { .. } => OperationKind::BoxContent,
            Self::BoxTitle { .. } => OperationKind::BoxTitle,
            Self::BoxColor { .. } => OperationKind::BoxColor,
            Self::ConnectionCreate(_) => OperationKind::ConnectionCreate,
            Self::ConnectionDelete(_) => OperationKind::ConnectionDelete,
        }
    }

    fn apply_inverse(&self, canvas: &mut Canvas) -> CanvasResult<()> {
        match self {
            Self::BoxCreate { snapshot, .. } => canvas.remove_box(snapshot.id).map(|_| ()),
            Self::BoxDelete {
                snapshot,
                index,
                connections,
            } => {
                canvas.restore_box_at(*index, snapshot.clone())?;
                for conn in connections {
                    canvas.restore_connection(*conn)?;
                }
                Ok(())
            }
            Self::BoxMove { id, before, .. } => with_box(canvas, *id, |b| (b.x, b.y) = *before),
            Self::BoxResize { id, before, .. } => {
                with_box(canvas, *id, |b| (b.width, b.height) = *before)
            }
            Self::BoxContent { id, before, .. } => with_box(canvas, *id, |b| before.apply_to(b)),
            Self::BoxTitle { id, before, .. } => with_box(canvas, *id, |b| b.title = before.clone()),
            Self::BoxColor { id, before, .. } => with_box(canvas, *id, |b| b.color = *before),
            Self::ConnectionCreate(conn) => canvas.remove_connection(conn.id).map(|_| ()),
            Self::ConnectionDelete(conn) => canvas.restore_connection(*conn),
        }
    }

    fn apply_forward(&self, canvas: &mut Canvas) -> CanvasResult<()> {
        match self {
            Self::BoxCreate { snapshot, index } => canvas.restore_box_at(*index, snapshot.clone()),
            Self::BoxDelete { snapshot, .. } => canvas.remove_box(snapshot.id).map(|_| ()),
            Self::BoxMove { id, after, .. } => with_box(canvas, *id, |b| (b.x, b.y) = *after),
            Self::BoxResize { id, after, .. } => {
                with_box(canvas, *id, |b| (b.width, b.height) = *after)
            }
            Self::BoxContent { id, after, .. } => with_box(canvas, *id, |b| after.apply_to(b)),
            Self::BoxTitle { id, after, .. } => with_box(canvas, *id, |b| b.title = after.clone()),
            Self::BoxColor { id, after, .. } => with_box(canvas, *id, |b| b.color = *after),
            Self::ConnectionCreate(conn) => canvas.restore_connection(*conn),
            Self::ConnectionDelete(conn) => canvas.remove_connection(conn.id).map(|_| ()),
        }
    }
}

fn with_box(canvas: &mut Canvas, id: u32, f: impl FnOnce(&mut CanvasBox)) -> CanvasResult<()> {
    let b = canvas.get_box_mut(id).ok_or(CanvasError::NotFound(id))?;
    f(b);
    Ok(())
}

#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Operation>,
    redo: Vec<Operation>,
    max_size: usize,
    /// Box whose continuous move is still merging into the newest operation.
    gesture: Option<u32>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_size: max_size.max(1),
            gesture: None,
        }
    }

    #[allow(dead_code)] // used by tests
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[allow(dead_code)] // used by tests
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[allow(dead_code)] // used by tests
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Total operations held across both chains.
    #[allow(dead_code)] // used by tests
    pub fn len(&self) -> usize {
        self.undo.len() + self.redo.len()
    }

    #[allow(dead_code)] // used by tests
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The operation the next undo would revert.
    pub fn peek_undo(&self) -> Option<&Operation> {
        self.undo.back()
    }

    pub fn peek_redo(&self) -> Option<&Operation> {
        self.redo.last()
    }

    /// Drops both chains, e.g. when the canvas is replaced by a load.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.gesture = None;
    }

    /// Stops merging continuous moves into the newest operation.
    pub fn end_gesture(&mut self) {
        self.gesture = None;
    }

    fn push(&mut self, op: Operation) {
        self.gesture = None;
        if self.undo.try_reserve(1).is_err() {
            warn!(kind = op.kind().label(), "out of memory; operation not recorded");
            return;
        }
        self.redo.clear();
        self.undo.push_back(op);
        if self.undo.len() > self.max_size {
            self.undo.pop_front();
        }
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Call right after the box was added.
    pub fn record_box_create(&mut self, canvas: &Canvas, id: u32) {
        let Some(index) = canvas.box_index(id) else {
            return;
        };
        self.push(Operation::BoxCreate {
            snapshot: canvas.boxes[index].clone(),
            index,
        });
    }

    /// Call right before the box is removed.
    pub fn record_box_delete(&mut self, canvas: &Canvas, id: u32) {
        let Some(index) = canvas.box_index(id) else {
            return;
        };
        let connections = canvas
            .connections
            .iter()
            .filter(|c| c.touches(id))
            .copied()
            .collect();
        self.push(Operation::BoxDelete {
            snapshot: canvas.boxes[index].clone(),
            index,
            connections,
        });
    }

    /// Call right before moving the box to `to`.
    pub fn record_box_move(&mut self, canvas: &Canvas, id: u32, to: (f64, f64)) {
        let Some(b) = canvas.get_box(id) else {
            return;
        };
        self.push(Operation::BoxMove {
            id,
            before: (b.x, b.y),
            after: to,
        });
    }

    /// Like [`record_box_move`](Self::record_box_move), but consecutive calls
    /// for the same box fold into one operation until the gesture ends.
    pub fn record_box_move_continuous(&mut self, canvas: &Canvas, id: u32, to: (f64, f64)) {
        if self.gesture == Some(id)
            && self.redo.is_empty()
            && let Some(Operation::BoxMove {
                id: last_id, after, ..
            }) = self.undo.back_mut()
            && *last_id == id
        {
            *after = to;
            return;
        }
        if canvas.get_box(id).is_none() {
            return;
        }
        self.record_box_move(canvas, id, to);
        self.gesture = Some(id);
    }

    /// Call right before resizing the box to `to`.
    pub fn record_box_resize(&mut self, canvas: &Canvas, id: u32, to: (i32, i32)) {
        let Some(b) = canvas.get_box(id) else {
            return;
        };
        self.push(Operation::BoxResize {
            id,
            before: (b.width, b.height),
            after: to,
        });
    }

    pub fn record_box_content(&mut self, canvas: &Canvas, id: u32, to: ContentSnapshot) {
        let Some(b) = canvas.get_box(id) else {
            return;
        };
        self.push(Operation::BoxContent {
            id,
            before: ContentSnapshot::of(b),
            after: to,
        });
    }

    pub fn record_box_title(&mut self, canvas: &Canvas, id: u32, to: Option<&str>) {
        let Some(b) = canvas.get_box(id) else {
            return;
        };
        self.push(Operation::BoxTitle {
            id,
            before: b.title.clone(),
            after: to.map(str::to_string),
        });
    }

    pub fn record_box_color(&mut self, canvas: &Canvas, id: u32, to: u8) {
        let Some(b) = canvas.get_box(id) else {
            return;
        };
        self.push(Operation::BoxColor {
            id,
            before: b.color,
            after: to,
        });
    }

    /// Call right after the connection was added.
    pub fn record_connection_create(&mut self, canvas: &Canvas, id: u32) {
        if let Some(conn) = canvas.get_connection(id) {
            self.push(Operation::ConnectionCreate(*conn));
        }
    }

    /// Call right before the connection is removed.
    pub fn record_connection_delete(&mut self, canvas: &Canvas, id: u32) {
        if let Some(conn) = canvas.get_connection(id) {
            self.push(Operation::ConnectionDelete(*conn));
        }
    }

    // -----------------------------------------------------------------------
    // Replay
    // -----------------------------------------------------------------------

    /// Reverts the newest operation. Returns false when there is nothing to undo.
    pub fn undo(&mut self, canvas: &mut Canvas) -> bool {
        self.gesture = None;
        let Some(op) = self.undo.pop_back() else {
            return false;
        };
        if let Err(err) = op.apply_inverse(canvas) {
            warn!(kind = op.kind().label(), %err, "undo applied partially");
        } else {
            debug!(kind = op.kind().label(), "undo");
        }
        self.redo.push(op);
        true
    }

    /// Re-applies the most recently undone operation.
    pub fn redo(&mut self, canvas: &mut Canvas) -> bool {
        self.gesture = None;
        let Some(op) = self.redo.pop() else {
            return false;
        };
        if let Err(err) = op.apply_forward(canvas) {
            warn!(kind = op.kind().label(), %err, "redo applied partially");
        } else {
            debug!(kind = op.kind().label(), "redo");
        }
        self.undo.push_back(op);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::model::BoxType;
    use proptest::prelude::*;

    /// Boxes and connections as a user would observe them; selection is
    /// not part of history.
    fn observable(c: &Canvas) -> (Vec<CanvasBox>, Vec<Connection>) {
        let boxes = c
            .boxes
            .iter()
            .cloned()
            .map(|mut b| {
                b.selected = false;
                b
            })
            .collect();
        let mut conns = c.connections.clone();
        conns.sort_by_key(|c| c.id);
        (boxes, conns)
    }

    fn create(c: &mut Canvas, h: &mut History, x: f64, y: f64) -> u32 {
        let id = c.add_box(x, y, 20, 6, Some("box")).unwrap();
        h.record_box_create(c, id);
        id
    }

    fn delete(c: &mut Canvas, h: &mut History, id: u32) {
        h.record_box_delete(c, id);
        c.remove_box(id).unwrap();
    }

    fn connect(c: &mut Canvas, h: &mut History, a: u32, b: u32) -> u32 {
        let id = c.add_connection(a, b, 0).unwrap();
        h.record_connection_create(c, id);
        id
    }

    fn move_to(c: &mut Canvas, h: &mut History, id: u32, to: (f64, f64)) {
        h.record_box_move(c, id, to);
        let b = c.get_box_mut(id).unwrap();
        (b.x, b.y) = to;
    }

    #[test]
    fn undo_and_redo_on_empty_history_are_noops() {
        let mut c = Canvas::new(200.0, 100.0);
        let mut h = History::default();
        assert!(!h.undo(&mut c));
        assert!(!h.redo(&mut c));
    }

    #[test]
    fn create_is_undone_and_redone_with_same_id() {
        let mut c = Canvas::new(200.0, 100.0);
        let mut h = History::default();
        let id = create(&mut c, &mut h, 5.0, 5.0);
        assert!(h.undo(&mut c));
        assert!(c.get_box(id).is_none());
        assert!(h.redo(&mut c));
        assert_eq!(c.get_box(id).unwrap().title.as_deref(), Some("box"));
        // Ids are not reused after undo.
        assert_eq!(c.add_box(0.0, 0.0, 1, 1, None).unwrap(), id + 1);
    }

    #[test]
    fn delete_undo_restores_fields_position_and_connections() {
        let mut c = Canvas::new(200.0, 100.0);
        let mut h = History::default();
        let a = create(&mut c, &mut h, 0.0, 0.0);
        let b = create(&mut c, &mut h, 40.0, 0.0);
        let d = create(&mut c, &mut h, 80.0, 0.0);
        connect(&mut c, &mut h, a, b);
        connect(&mut c, &mut h, b, d);
        {
            let bx = c.get_box_mut(b).unwrap();
            bx.content = vec!["one".into(), "two".into()];
            bx.color = 4;
            bx.box_type = BoxType::Code;
            bx.content_type = ContentType::Command;
            bx.command = Some("date".into());
        }
        let before = observable(&c);

        delete(&mut c, &mut h, b);
        assert!(c.connections.is_empty());
        assert!(h.undo(&mut c));
        assert_eq!(observable(&c), before);
        assert_eq!(c.box_index(b), Some(1));
    }

    #[test]
    fn snapshot_is_independent_of_live_box() {
        let mut c = Canvas::new(200.0, 100.0);
        let mut h = History::default();
        let id = create(&mut c, &mut h, 0.0, 0.0);
        h.record_box_title(&c, id, Some("new"));
        c.get_box_mut(id).unwrap().title = Some("new".into());
        c.get_box_mut(id).unwrap().title.as_mut().unwrap().push_str(" edited");
        assert!(h.undo(&mut c));
        assert_eq!(c.get_box(id).unwrap().title.as_deref(), Some("box"));
        assert!(h.redo(&mut c));
        assert_eq!(c.get_box(id).unwrap().title.as_deref(), Some("new"));
    }

    #[test]
    fn new_record_invalidates_redo() {
        let mut c = Canvas::new(200.0, 100.0);
        let mut h = History::default();
        let id = create(&mut c, &mut h, 0.0, 0.0);
        move_to(&mut c, &mut h, id, (10.0, 10.0));
        assert!(h.undo(&mut c));
        assert!(h.can_redo());
        h.record_box_color(&c, id, 3);
        c.get_box_mut(id).unwrap().color = 3;
        assert!(!h.can_redo());
        assert!(!h.redo(&mut c));
    }

    #[test]
    fn history_is_bounded() {
        let mut c = Canvas::new(200.0, 100.0);
        let mut h = History::new(5);
        let id = create(&mut c, &mut h, 0.0, 0.0);
        for i in 1..=7 {
            move_to(&mut c, &mut h, id, (f64::from(i), 0.0));
        }
        assert_eq!(h.undo_len(), 5);
        let mut undone = 0;
        while h.undo(&mut c) {
            undone += 1;
        }
        assert_eq!(undone, 5);
        // The create and the first two moves fell off the tail.
        assert_eq!(c.get_box(id).unwrap().x, 2.0);
    }

    #[test]
    fn recording_unknown_ids_pushes_nothing() {
        let c = Canvas::new(200.0, 100.0);
        let mut h = History::default();
        h.record_box_create(&c, 1);
        h.record_box_delete(&c, 1);
        h.record_box_move(&c, 1, (0.0, 0.0));
        h.record_box_move_continuous(&c, 1, (0.0, 0.0));
        h.record_box_resize(&c, 1, (1, 1));
        h.record_box_title(&c, 1, None);
        h.record_box_color(&c, 1, 1);
        h.record_box_content(&c, 1, ContentSnapshot::default());
        h.record_connection_create(&c, 1);
        h.record_connection_delete(&c, 1);
        assert!(h.is_empty());
    }

    #[test]
    fn continuous_moves_fold_until_gesture_ends() {
        let mut c = Canvas::new(200.0, 100.0);
        let mut h = History::default();
        let id = create(&mut c, &mut h, 0.0, 0.0);
        for step in 1..=4 {
            let to = (f64::from(step), 0.0);
            h.record_box_move_continuous(&c, id, to);
            c.get_box_mut(id).unwrap().x = to.0;
        }
        assert_eq!(h.undo_len(), 2);
        h.end_gesture();
        h.record_box_move_continuous(&c, id, (9.0, 0.0));
        c.get_box_mut(id).unwrap().x = 9.0;
        assert_eq!(h.undo_len(), 3);

        assert!(h.undo(&mut c));
        assert_eq!(c.get_box(id).unwrap().x, 4.0);
        assert!(h.undo(&mut c));
        assert_eq!(c.get_box(id).unwrap().x, 0.0);
    }

    #[test]
    fn connection_create_and_delete_round_trip() {
        let mut c = Canvas::new(200.0, 100.0);
        let mut h = History::default();
        let a = create(&mut c, &mut h, 0.0, 0.0);
        let b = create(&mut c, &mut h, 40.0, 0.0);
        let conn = connect(&mut c, &mut h, a, b);
        h.record_connection_delete(&c, conn);
        c.remove_connection(conn).unwrap();

        assert!(h.undo(&mut c));
        assert_eq!(c.find_connection(a, b), Some(conn));
        assert!(h.undo(&mut c));
        assert!(c.connections.is_empty());
        assert!(h.redo(&mut c));
        assert_eq!(c.find_connection(a, b), Some(conn));
    }

    #[derive(Debug, Clone)]
    enum Step {
        Create(i16, i16),
        Delete(usize),
        Move(usize, i16, i16),
        Resize(usize, i32, i32),
        Title(usize, Option<String>),
        Color(usize, u8),
        Content(usize, Vec<String>),
        Connect(usize, usize),
        Disconnect(usize),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (any::<i16>(), any::<i16>()).prop_map(|(x, y)| Step::Create(x, y)),
            any::<usize>().prop_map(Step::Delete),
            (any::<usize>(), any::<i16>(), any::<i16>()).prop_map(|(i, x, y)| Step::Move(i, x, y)),
            (any::<usize>(), 3i32..100, 3i32..50).prop_map(|(i, w, h)| Step::Resize(i, w, h)),
            (any::<usize>(), proptest::option::of("[a-z]{0,8}"))
                .prop_map(|(i, t)| Step::Title(i, t)),
            (any::<usize>(), 0u8..8).prop_map(|(i, col)| Step::Color(i, col)),
            (any::<usize>(), proptest::collection::vec("[a-z ]{0,12}", 0..4))
                .prop_map(|(i, l)| Step::Content(i, l)),
            (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Step::Connect(a, b)),
            any::<usize>().prop_map(Step::Disconnect),
        ]
    }

    /// Applies a step the way the action executor would. Returns whether an
    /// operation was recorded.
    fn apply(c: &mut Canvas, h: &mut History, s: &Step) -> bool {
        let pick = |c: &Canvas, i: usize| (!c.boxes.is_empty()).then(|| c.boxes[i % c.boxes.len()].id);
        match s {
            Step::Create(x, y) => {
                create(c, h, f64::from(*x), f64::from(*y));
                true
            }
            Step::Delete(i) => pick(c, *i).map(|id| delete(c, h, id)).is_some(),
            Step::Move(i, x, y) => pick(c, *i)
                .map(|id| move_to(c, h, id, (f64::from(*x), f64::from(*y))))
                .is_some(),
            Step::Resize(i, w, hh) => pick(c, *i)
                .map(|id| {
                    h.record_box_resize(c, id, (*w, *hh));
                    let b = c.get_box_mut(id).unwrap();
                    (b.width, b.height) = (*w, *hh);
                })
                .is_some(),
            Step::Title(i, t) => pick(c, *i)
                .map(|id| {
                    h.record_box_title(c, id, t.as_deref());
                    c.get_box_mut(id).unwrap().title = t.clone();
                })
                .is_some(),
            Step::Color(i, col) => pick(c, *i)
                .map(|id| {
                    h.record_box_color(c, id, *col);
                    c.get_box_mut(id).unwrap().color = *col;
                })
                .is_some(),
            Step::Content(i, lines) => pick(c, *i)
                .map(|id| {
                    h.record_box_content(c, id, ContentSnapshot::text(lines.clone()));
                    let b = c.get_box_mut(id).unwrap();
                    b.content = lines.clone();
                    b.content_type = ContentType::Text;
                    b.file_path = None;
                    b.command = None;
                })
                .is_some(),
            Step::Connect(a, b) => {
                let (Some(a), Some(b)) = (pick(c, *a), pick(c, *b)) else {
                    return false;
                };
                match c.add_connection(a, b, 0) {
                    Ok(id) => {
                        h.record_connection_create(c, id);
                        true
                    }
                    Err(_) => false,
                }
            }
            Step::Disconnect(i) => {
                if c.connections.is_empty() {
                    return false;
                }
                let id = c.connections[i % c.connections.len()].id;
                h.record_connection_delete(c, id);
                c.remove_connection(id).unwrap();
                true
            }
        }
    }

    proptest! {
        #[test]
        fn undo_all_then_redo_all_round_trips(
            setup in proptest::collection::vec(step(), 0..8),
            steps in proptest::collection::vec(step(), 1..30),
        ) {
            let mut c = Canvas::new(200.0, 100.0);
            let mut h = History::new(1000);
            for s in &setup {
                apply(&mut c, &mut h, s);
            }
            h.clear();
            let start = observable(&c);

            let mut recorded = 0;
            for s in &steps {
                if apply(&mut c, &mut h, s) {
                    recorded += 1;
                }
            }
            let end = observable(&c);

            for _ in 0..recorded {
                prop_assert!(h.undo(&mut c));
            }
            prop_assert!(!h.can_undo());
            prop_assert_eq!(observable(&c), start);

            for _ in 0..recorded {
                prop_assert!(h.redo(&mut c));
            }
            prop_assert!(!h.can_redo());
            prop_assert_eq!(observable(&c), end);
        }
    }
}
