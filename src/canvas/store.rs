//! The entity store: boxes, connections, selection and board-level flags.
//!
//! Boxes and connections reference each other by id only. Storage order of
//! `boxes` doubles as z-order: later boxes are drawn on top and win hit tests.

use thiserror::Error;

use crate::canvas::model::{CanvasBox, Connection, DisplayMode};

pub const MIN_PROPORTIONAL_WIDTH: i32 = 10;
pub const MAX_PROPORTIONAL_WIDTH: i32 = 80;
pub const MIN_PROPORTIONAL_HEIGHT: i32 = 3;
pub const MAX_PROPORTIONAL_HEIGHT: i32 = 30;

pub const MIN_SIDEBAR_WIDTH: u16 = 20;
pub const MAX_SIDEBAR_WIDTH: u16 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanvasError {
    #[error("no entity with id {0}")]
    NotFound(u32),
    #[error("a connection cannot join a box to itself")]
    SelfConnection,
    #[error("those boxes are already connected")]
    DuplicateConnection,
    #[error("out of memory while growing the canvas")]
    Allocation,
    #[error("no ids left to assign")]
    IdsExhausted,
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

pub type CanvasResult<T> = std::result::Result<T, CanvasError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub visible: bool,
    pub snap: bool,
    pub spacing: u32,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            visible: false,
            snap: false,
            spacing: 10,
        }
    }
}

impl Grid {
    /// Rounds a coordinate to the nearest grid line.
    pub fn snap_value(&self, v: f64) -> f64 {
        if self.spacing == 0 {
            return v;
        }
        let s = f64::from(self.spacing);
        (v / s).round() * s
    }
}

/// Connection mode: idle, or armed with a source box waiting for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionMode {
    #[default]
    Idle,
    Armed { source_box_id: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Focus {
    pub box_id: Option<u32>,
    pub scroll: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sidebar {
    pub visible: bool,
    pub width: u16,
}

impl Default for Sidebar {
    fn default() -> Self {
        Self {
            visible: false,
            width: 30,
        }
    }
}

/// Inputs to [`Canvas::calc_proportional_size`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingParams {
    pub radius: f64,
    pub use_nearest: bool,
    pub min_neighbors: usize,
    pub default_width: i32,
    pub default_height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProportionalSize {
    pub width: i32,
    pub height: i32,
    pub neighbors: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Canvas {
    pub world_width: f64,
    pub world_height: f64,
    pub boxes: Vec<CanvasBox>,
    pub connections: Vec<Connection>,
    pub next_id: u32,
    pub next_connection_id: u32,
    pub selected_index: Option<usize>,
    pub grid: Grid,
    pub focus: Focus,
    pub sidebar: Sidebar,
    pub connection_mode: ConnectionMode,
    pub display_mode: DisplayMode,
}

impl Canvas {
    pub fn new(world_width: f64, world_height: f64) -> Self {
        Self {
            world_width,
            world_height,
            next_id: 1,
            next_connection_id: 1,
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Boxes
    // -----------------------------------------------------------------------

    /// Creates a box with the next id. Applies grid snapping when enabled.
    pub fn add_box(
        &mut self,
        x: f64,
        y: f64,
        width: i32,
        height: i32,
        title: Option<&str>,
    ) -> CanvasResult<u32> {
        let (x, y) = if self.grid.snap {
            (self.grid.snap_value(x), self.grid.snap_value(y))
        } else {
            (x, y)
        };
        let id = self.next_id;
        let next_id = id.checked_add(1).ok_or(CanvasError::IdsExhausted)?;
        self.boxes
            .try_reserve(1)
            .map_err(|_| CanvasError::Allocation)?;
        let mut b = CanvasBox::new(id, x, y, width, height);
        b.title = title.map(str::to_string);
        self.boxes.push(b);
        self.next_id = next_id;
        Ok(id)
    }

    /// Inserts a fully-formed box keeping its id; used by undo/redo and
    /// file loading. No snapping. Fails if the id is already taken.
    pub fn restore_box(&mut self, b: CanvasBox) -> CanvasResult<()> {
        let index = self.boxes.len();
        self.restore_box_at(index, b)
    }

    /// Like [`restore_box`](Self::restore_box) but at a storage index
    /// (clamped), which preserves z-order on undo.
    pub fn restore_box_at(&mut self, index: usize, mut b: CanvasBox) -> CanvasResult<()> {
        if self.get_box(b.id).is_some() {
            return Err(CanvasError::InvalidOperation("box id already in use"));
        }
        let after = b.id.checked_add(1).ok_or(CanvasError::IdsExhausted)?;
        self.boxes
            .try_reserve(1)
            .map_err(|_| CanvasError::Allocation)?;
        let index = index.min(self.boxes.len());
        b.selected = false;
        self.next_id = self.next_id.max(after);
        self.boxes.insert(index, b);
        if let Some(sel) = self.selected_index
            && sel >= index
        {
            self.selected_index = Some(sel + 1);
        }
        Ok(())
    }

    /// Removes a box and every connection touching it. Remaining boxes keep
    /// their relative order.
    pub fn remove_box(&mut self, id: u32) -> CanvasResult<CanvasBox> {
        let index = self.box_index(id).ok_or(CanvasError::NotFound(id))?;
        self.connections.retain(|c| !c.touches(id));
        let removed = self.boxes.remove(index);
        self.selected_index = match self.selected_index {
            Some(sel) if sel == index => None,
            Some(sel) if sel > index => Some(sel - 1),
            other => other,
        };
        if let ConnectionMode::Armed { source_box_id } = self.connection_mode
            && source_box_id == id
        {
            self.connection_mode = ConnectionMode::Idle;
        }
        if self.focus.box_id == Some(id) {
            self.focus = Focus::default();
        }
        Ok(removed)
    }

    pub fn get_box(&self, id: u32) -> Option<&CanvasBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn get_box_mut(&mut self, id: u32) -> Option<&mut CanvasBox> {
        self.boxes.iter_mut().find(|b| b.id == id)
    }

    pub fn box_index(&self, id: u32) -> Option<usize> {
        self.boxes.iter().position(|b| b.id == id)
    }

    /// Topmost box containing the world point.
    pub fn find_box_at(&self, x: f64, y: f64) -> Option<u32> {
        self.boxes.iter().rev().find(|b| b.contains(x, y)).map(|b| b.id)
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Selects `id`; an unknown id clears the selection instead.
    pub fn select_box(&mut self, id: u32) {
        self.deselect();
        if let Some(index) = self.box_index(id) {
            self.boxes[index].selected = true;
            self.selected_index = Some(index);
        }
    }

    pub fn deselect(&mut self) {
        for b in &mut self.boxes {
            b.selected = false;
        }
        self.selected_index = None;
    }

    pub fn selected(&self) -> Option<&CanvasBox> {
        self.selected_index.and_then(|i| self.boxes.get(i))
    }

    pub fn selected_id(&self) -> Option<u32> {
        self.selected().map(|b| b.id)
    }

    /// Selects the box after the current one in storage order, wrapping.
    pub fn cycle_selection(&mut self) -> Option<u32> {
        if self.boxes.is_empty() {
            return None;
        }
        let next = match self.selected_index {
            Some(i) => (i + 1) % self.boxes.len(),
            None => 0,
        };
        let id = self.boxes[next].id;
        self.select_box(id);
        Some(id)
    }

    // -----------------------------------------------------------------------
    // Sizing
    // -----------------------------------------------------------------------

    /// Picks a size for a new box at `(x, y)` from the boxes around it.
    ///
    /// Returns the template defaults with zero neighbors when fewer than
    /// `min_neighbors` box centers lie within `radius`.
    pub fn calc_proportional_size(&self, x: f64, y: f64, params: SizingParams) -> ProportionalSize {
        let fallback = ProportionalSize {
            width: params.default_width,
            height: params.default_height,
            neighbors: 0,
        };

        let mut near: Vec<(f64, &CanvasBox)> = self
            .boxes
            .iter()
            .filter_map(|b| {
                let (cx, cy) = b.center();
                let dist = ((cx - x).powi(2) + (cy - y).powi(2)).sqrt();
                (dist <= params.radius).then_some((dist, b))
            })
            .collect();

        if near.is_empty() || near.len() < params.min_neighbors {
            return fallback;
        }

        let count = near.len();
        let (width, height) = if params.use_nearest {
            near.sort_by(|a, b| a.0.total_cmp(&b.0));
            (near[0].1.width, near[0].1.height)
        } else {
            let n = count as i64;
            let sum_w: i64 = near.iter().map(|(_, b)| i64::from(b.width)).sum();
            let sum_h: i64 = near.iter().map(|(_, b)| i64::from(b.height)).sum();
            (((sum_w + n / 2) / n) as i32, ((sum_h + n / 2) / n) as i32)
        };

        ProportionalSize {
            width: width.clamp(MIN_PROPORTIONAL_WIDTH, MAX_PROPORTIONAL_WIDTH),
            height: height.clamp(MIN_PROPORTIONAL_HEIGHT, MAX_PROPORTIONAL_HEIGHT),
            neighbors: count,
        }
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    pub fn add_connection(&mut self, source_id: u32, dest_id: u32, color: u8) -> CanvasResult<u32> {
        if source_id == dest_id {
            return Err(CanvasError::SelfConnection);
        }
        for id in [source_id, dest_id] {
            if self.get_box(id).is_none() {
                return Err(CanvasError::NotFound(id));
            }
        }
        if self.connections.iter().any(|c| c.joins(source_id, dest_id)) {
            return Err(CanvasError::DuplicateConnection);
        }
        let id = self.next_connection_id;
        let next_id = id.checked_add(1).ok_or(CanvasError::IdsExhausted)?;
        self.connections
            .try_reserve(1)
            .map_err(|_| CanvasError::Allocation)?;
        self.connections.push(Connection {
            id,
            source_id,
            dest_id,
            color,
        });
        self.next_connection_id = next_id;
        Ok(id)
    }

    /// Re-inserts a connection with its original id. Endpoints must exist.
    pub fn restore_connection(&mut self, conn: Connection) -> CanvasResult<()> {
        if conn.source_id == conn.dest_id {
            return Err(CanvasError::SelfConnection);
        }
        for id in [conn.source_id, conn.dest_id] {
            if self.get_box(id).is_none() {
                return Err(CanvasError::NotFound(id));
            }
        }
        if self.get_connection(conn.id).is_some()
            || self
                .connections
                .iter()
                .any(|c| c.joins(conn.source_id, conn.dest_id))
        {
            return Err(CanvasError::DuplicateConnection);
        }
        let after = conn.id.checked_add(1).ok_or(CanvasError::IdsExhausted)?;
        self.connections
            .try_reserve(1)
            .map_err(|_| CanvasError::Allocation)?;
        self.next_connection_id = self.next_connection_id.max(after);
        self.connections.push(conn);
        Ok(())
    }

    pub fn remove_connection(&mut self, id: u32) -> CanvasResult<Connection> {
        let index = self
            .connections
            .iter()
            .position(|c| c.id == id)
            .ok_or(CanvasError::NotFound(id))?;
        Ok(self.connections.remove(index))
    }

    pub fn get_connection(&self, id: u32) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Direction-sensitive lookup.
    #[allow(dead_code)] // used by tests
    pub fn find_connection(&self, source_id: u32, dest_id: u32) -> Option<u32> {
        self.connections
            .iter()
            .find(|c| c.source_id == source_id && c.dest_id == dest_id)
            .map(|c| c.id)
    }

    /// Ids of every connection with `box_id` at either end.
    pub fn get_box_connections(&self, box_id: u32) -> Vec<u32> {
        self.connections
            .iter()
            .filter(|c| c.touches(box_id))
            .map(|c| c.id)
            .collect()
    }

    pub fn start_connection(&mut self, source_box_id: u32) -> CanvasResult<()> {
        if self.get_box(source_box_id).is_none() {
            return Err(CanvasError::NotFound(source_box_id));
        }
        self.connection_mode = ConnectionMode::Armed { source_box_id };
        Ok(())
    }

    /// Completes an armed connection. Any outcome returns the mode to idle;
    /// an invalid target behaves like [`cancel_connection`](Self::cancel_connection).
    pub fn finish_connection(&mut self, dest_id: u32, color: u8) -> CanvasResult<u32> {
        let ConnectionMode::Armed { source_box_id } = self.connection_mode else {
            return Err(CanvasError::InvalidOperation("no connection in progress"));
        };
        self.cancel_connection();
        self.add_connection(source_box_id, dest_id, color)
    }

    pub fn cancel_connection(&mut self) {
        self.connection_mode = ConnectionMode::Idle;
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self.connection_mode, ConnectionMode::Armed { .. })
    }

    // -----------------------------------------------------------------------
    // Board flags
    // -----------------------------------------------------------------------

    pub fn toggle_grid(&mut self) {
        self.grid.visible = !self.grid.visible;
    }

    pub fn toggle_snap(&mut self) {
        self.grid.snap = !self.grid.snap;
    }

    pub fn cycle_display_mode(&mut self) {
        self.display_mode = self.display_mode.next();
    }

    pub fn enter_focus(&mut self) -> CanvasResult<u32> {
        let id = self
            .selected_id()
            .ok_or(CanvasError::InvalidOperation("no box selected"))?;
        self.focus = Focus {
            box_id: Some(id),
            scroll: 0,
        };
        Ok(id)
    }

    pub fn exit_focus(&mut self) {
        self.focus = Focus::default();
    }

    pub fn resize_sidebar(&mut self, delta: i32) {
        let width = (i32::from(self.sidebar.width) + delta).clamp(
            i32::from(MIN_SIDEBAR_WIDTH),
            i32::from(MAX_SIDEBAR_WIDTH),
        );
        self.sidebar.width = width as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas_with_two() -> Canvas {
        let mut c = Canvas::new(200.0, 100.0);
        c.add_box(10.0, 20.0, 30, 5, Some("A")).unwrap();
        c.add_box(50.0, 60.0, 25, 8, Some("B")).unwrap();
        c
    }

    fn sizing(min_neighbors: usize, use_nearest: bool) -> SizingParams {
        SizingParams {
            radius: 50.0,
            use_nearest,
            min_neighbors,
            default_width: 20,
            default_height: 8,
        }
    }

    #[test]
    fn concrete_scenario_from_empty_canvas() {
        let mut c = Canvas::new(200.0, 100.0);
        assert_eq!(c.add_box(10.0, 20.0, 30, 5, Some("A")).unwrap(), 1);
        assert_eq!(c.add_box(50.0, 60.0, 25, 8, Some("B")).unwrap(), 2);
        let conn = c.add_connection(1, 2, 0).unwrap();
        assert!(conn > 0);
        assert_eq!(c.find_connection(1, 2), Some(conn));
        assert_eq!(c.find_connection(2, 1), None);
        c.remove_box(1).unwrap();
        assert_eq!(c.connections.len(), 0);
        assert!(c.get_box(1).is_none());
        assert!(c.get_box(2).is_some());
    }

    #[test]
    fn exhausted_ids_fail_without_changing_the_canvas() {
        let mut c = canvas_with_two();
        c.next_id = u32::MAX;
        assert_eq!(
            c.add_box(0.0, 0.0, 10, 3, None),
            Err(CanvasError::IdsExhausted)
        );
        assert_eq!(c.boxes.len(), 2);
        assert_eq!(c.next_id, u32::MAX);

        c.next_connection_id = u32::MAX;
        assert_eq!(c.add_connection(1, 2, 0), Err(CanvasError::IdsExhausted));
        assert!(c.connections.is_empty());
    }

    #[test]
    fn restoring_the_largest_id_is_an_error() {
        let mut c = canvas_with_two();
        let b = CanvasBox::new(u32::MAX, 0.0, 0.0, 10, 3);
        assert_eq!(c.restore_box(b), Err(CanvasError::IdsExhausted));
        assert_eq!(c.boxes.len(), 2);

        let conn = Connection {
            id: u32::MAX,
            source_id: 1,
            dest_id: 2,
            color: 0,
        };
        assert_eq!(c.restore_connection(conn), Err(CanvasError::IdsExhausted));
        assert!(c.connections.is_empty());
    }

    #[test]
    fn ids_are_never_reused() {
        let mut c = canvas_with_two();
        c.remove_box(2).unwrap();
        assert_eq!(c.add_box(0.0, 0.0, 10, 3, None).unwrap(), 3);
    }

    #[test]
    fn add_box_snaps_when_enabled() {
        let mut c = Canvas::new(200.0, 100.0);
        c.grid.snap = true;
        c.grid.spacing = 10;
        let id = c.add_box(14.0, 26.0, 10, 3, None).unwrap();
        let b = c.get_box(id).unwrap();
        assert_eq!((b.x, b.y), (10.0, 30.0));
    }

    #[test]
    fn restore_box_bypasses_snap_and_keeps_id() {
        let mut c = Canvas::new(200.0, 100.0);
        c.grid.snap = true;
        c.restore_box(CanvasBox::new(7, 14.0, 26.0, 10, 3)).unwrap();
        let b = c.get_box(7).unwrap();
        assert_eq!((b.x, b.y), (14.0, 26.0));
        assert_eq!(c.next_id, 8);
        assert!(c.restore_box(CanvasBox::new(7, 0.0, 0.0, 1, 1)).is_err());
    }

    #[test]
    fn remove_box_keeps_order_and_adjusts_selection() {
        let mut c = canvas_with_two();
        c.add_box(0.0, 0.0, 5, 5, Some("C")).unwrap();
        c.select_box(3);
        c.remove_box(1).unwrap();
        let ids: Vec<u32> = c.boxes.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(c.selected_id(), Some(3));
        c.remove_box(3).unwrap();
        assert_eq!(c.selected_index, None);
        assert_eq!(c.remove_box(42), Err(CanvasError::NotFound(42)));
    }

    #[test]
    fn find_box_at_prefers_topmost() {
        let mut c = Canvas::new(200.0, 100.0);
        c.add_box(0.0, 0.0, 20, 10, None).unwrap();
        c.add_box(5.0, 5.0, 20, 10, None).unwrap();
        assert_eq!(c.find_box_at(6.0, 6.0), Some(2));
        assert_eq!(c.find_box_at(1.0, 1.0), Some(1));
        assert_eq!(c.find_box_at(25.0, 15.0), Some(2));
        assert_eq!(c.find_box_at(100.0, 100.0), None);
    }

    #[test]
    fn selection_is_exclusive() {
        let mut c = canvas_with_two();
        c.select_box(1);
        c.select_box(2);
        assert_eq!(c.boxes.iter().filter(|b| b.selected).count(), 1);
        assert_eq!(c.selected_id(), Some(2));
        c.select_box(99);
        assert_eq!(c.selected_index, None);
        assert!(c.boxes.iter().all(|b| !b.selected));
    }

    #[test]
    fn self_and_duplicate_connections_are_rejected() {
        let mut c = canvas_with_two();
        assert_eq!(c.add_connection(1, 1, 0), Err(CanvasError::SelfConnection));
        c.add_connection(1, 2, 0).unwrap();
        assert_eq!(c.add_connection(1, 2, 0), Err(CanvasError::DuplicateConnection));
        assert_eq!(c.add_connection(2, 1, 0), Err(CanvasError::DuplicateConnection));
        assert_eq!(c.connections.len(), 1);
        assert_eq!(c.add_connection(1, 9, 0), Err(CanvasError::NotFound(9)));
    }

    #[test]
    fn removing_middle_box_cascades_both_connections() {
        let mut c = canvas_with_two();
        c.add_box(90.0, 10.0, 10, 4, Some("C")).unwrap();
        let ab = c.add_connection(1, 2, 0).unwrap();
        let bc = c.add_connection(2, 3, 0).unwrap();
        c.remove_box(2).unwrap();
        assert!(c.connections.is_empty());
        assert!(c.get_connection(ab).is_none());
        assert!(c.get_connection(bc).is_none());
        assert!(c.get_box(1).is_some() && c.get_box(3).is_some());
    }

    #[test]
    fn box_connections_match_either_end() {
        let mut c = canvas_with_two();
        c.add_box(90.0, 10.0, 10, 4, None).unwrap();
        let a = c.add_connection(1, 2, 0).unwrap();
        let b = c.add_connection(3, 2, 0).unwrap();
        assert_eq!(c.get_box_connections(2), vec![a, b]);
        assert_eq!(c.get_box_connections(1), vec![a]);
    }

    #[test]
    fn connection_mode_state_machine() {
        let mut c = canvas_with_two();
        assert!(c.start_connection(9).is_err());
        assert_eq!(c.connection_mode, ConnectionMode::Idle);

        c.start_connection(1).unwrap();
        assert!(c.is_connecting());
        assert!(c.finish_connection(1, 0).is_err());
        assert_eq!(c.connection_mode, ConnectionMode::Idle);
        assert!(c.connections.is_empty());

        c.start_connection(1).unwrap();
        let id = c.finish_connection(2, 3).unwrap();
        assert_eq!(c.connection_mode, ConnectionMode::Idle);
        assert_eq!(c.get_connection(id).unwrap().color, 3);

        c.start_connection(2).unwrap();
        c.cancel_connection();
        assert!(!c.is_connecting());
    }

    #[test]
    fn proportional_size_falls_back_without_neighbors() {
        let c = Canvas::new(200.0, 100.0);
        let size = c.calc_proportional_size(0.0, 0.0, sizing(1, true));
        assert_eq!(
            size,
            ProportionalSize {
                width: 20,
                height: 8,
                neighbors: 0
            }
        );
    }

    #[test]
    fn proportional_size_uses_nearest_box() {
        let mut c = Canvas::new(200.0, 100.0);
        c.add_box(0.0, 0.0, 40, 12, None).unwrap();
        let size = c.calc_proportional_size(25.0, 10.0, sizing(1, true));
        assert_eq!((size.width, size.height, size.neighbors), (40, 12, 1));
    }

    #[test]
    fn proportional_size_averages_with_half_up_rounding() {
        let mut c = Canvas::new(200.0, 100.0);
        c.add_box(0.0, 0.0, 20, 4, None).unwrap();
        c.add_box(10.0, 0.0, 25, 5, None).unwrap();
        let size = c.calc_proportional_size(15.0, 2.0, sizing(2, false));
        // (20 + 25 + 1) / 2 = 23, (4 + 5 + 1) / 2 = 5
        assert_eq!((size.width, size.height, size.neighbors), (23, 5, 2));
    }

    #[test]
    fn proportional_size_clamps_and_respects_min_neighbors() {
        let mut c = Canvas::new(200.0, 100.0);
        c.add_box(0.0, 0.0, 200, 1, None).unwrap();
        let size = c.calc_proportional_size(100.0, 0.0, sizing(1, true));
        assert_eq!((size.width, size.height), (80, 3));
        let size = c.calc_proportional_size(100.0, 0.0, sizing(2, true));
        assert_eq!(size.neighbors, 0);
    }

    #[test]
    fn sidebar_width_is_clamped() {
        let mut c = Canvas::new(200.0, 100.0);
        c.resize_sidebar(100);
        assert_eq!(c.sidebar.width, MAX_SIDEBAR_WIDTH);
        c.resize_sidebar(-100);
        assert_eq!(c.sidebar.width, MIN_SIDEBAR_WIDTH);
    }
}
