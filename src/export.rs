//! Plain-text rendering of the whole board.
//!
//! One character cell per world unit. Connections are drawn first as dotted
//! straight lines between box centers, then boxes in storage order so the
//! later ones cover the earlier ones.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::canvas::model::CanvasBox;
use crate::canvas::store::Canvas;

/// Largest grid the exporter will allocate, per axis.
pub const MAX_EXPORT_CELLS: i64 = 2000;

struct CharGrid {
    origin_x: i32,
    origin_y: i32,
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl CharGrid {
    fn new(origin_x: i32, origin_y: i32, width: usize, height: usize) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
            cells: vec![' '; width * height],
        }
    }

    fn put(&mut self, x: i32, y: i32, ch: char) {
        let gx = i64::from(x) - i64::from(self.origin_x);
        let gy = i64::from(y) - i64::from(self.origin_y);
        let (Ok(gx), Ok(gy)) = (usize::try_from(gx), usize::try_from(gy)) else {
            return;
        };
        if gx < self.width && gy < self.height {
            self.cells[gy * self.width + gx] = ch;
        }
    }

    /// Last world column and row covered by the grid.
    fn max_corner(&self) -> (i32, i32) {
        (
            self.origin_x.saturating_add(self.width as i32 - 1),
            self.origin_y.saturating_add(self.height as i32 - 1),
        )
    }

    fn text(&mut self, x: i32, y: i32, text: &str, max: usize) {
        let room = usize::try_from(i64::from(self.max_corner().0) - i64::from(x) + 1).unwrap_or(0);
        for (i, ch) in text.chars().take(max.min(room)).enumerate() {
            self.put(x.saturating_add(i as i32), y, ch);
        }
    }

    /// Draws the part of the segment that lies on the grid.
    fn clipped_line(&mut self, from: (f64, f64), to: (f64, f64), ch: char) {
        let (max_x, max_y) = self.max_corner();
        let bounds = (
            f64::from(self.origin_x),
            f64::from(self.origin_y),
            f64::from(max_x),
            f64::from(max_y),
        );
        if let Some(((x0, y0), (x1, y1))) = clip_segment(from, to, bounds) {
            self.line(
                x0.round() as i32,
                y0.round() as i32,
                x1.round() as i32,
                y1.round() as i32,
                ch,
            );
        }
    }

    fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, ch: char) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut cx, mut cy) = (x0, y0);
        loop {
            self.put(cx, cy, ch);
            if cx == x1 && cy == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                cx += sx;
            }
            if e2 <= dx {
                err += dx;
                cy += sy;
            }
        }
    }

    fn draw_box(&mut self, b: &CanvasBox) {
        let x0 = b.x.round() as i32;
        let y0 = b.y.round() as i32;
        let (w, h) = (b.width.max(2), b.height.max(2));
        let (x1, y1) = (x0.saturating_add(w - 1), y0.saturating_add(h - 1));

        let (max_x, max_y) = self.max_corner();
        for y in y0.max(self.origin_y)..=y1.min(max_y) {
            for x in x0.max(self.origin_x)..=x1.min(max_x) {
                let edge_x = x == x0 || x == x1;
                let edge_y = y == y0 || y == y1;
                let ch = match (edge_x, edge_y) {
                    (true, true) => '+',
                    (false, true) => '-',
                    (true, false) => '|',
                    (false, false) => ' ',
                };
                self.put(x, y, ch);
            }
        }

        let inner = (w - 2).max(0) as usize;
        if let Some(title) = &b.title
            && inner > 2
        {
            self.text(x0.saturating_add(2), y0, title, inner - 2);
        }
        for (row, line) in b.content.iter().take((h - 2).max(0) as usize).enumerate() {
            self.text(
                x0.saturating_add(1),
                y0.saturating_add(1 + row as i32),
                line,
                inner,
            );
        }
    }

    fn into_string(self) -> String {
        let mut rows: Vec<String> = self
            .cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect();
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        let mut out = rows.join("\n");
        out.push('\n');
        out
    }
}

/// Liang-Barsky clipping of a segment against `(min_x, min_y, max_x, max_y)`.
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-dx, from.0 - min_x),
        (dx, max_x - from.0),
        (-dy, from.1 - min_y),
        (dy, max_y - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f64| (from.0 + t * dx, from.1 + t * dy);
    Some((at(t0), at(t1)))
}

/// Rasterises every box and connection, covering at least the world area.
pub fn render_ascii(canvas: &Canvas) -> String {
    let mut min_x = 0i32;
    let mut min_y = 0i32;
    let mut max_x = canvas.world_width.ceil() as i32;
    let mut max_y = canvas.world_height.ceil() as i32;
    for b in &canvas.boxes {
        let (x, y) = (b.x.round() as i32, b.y.round() as i32);
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x.saturating_add(b.width));
        max_y = max_y.max(y.saturating_add(b.height));
    }
    let span = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo)).clamp(1, MAX_EXPORT_CELLS) as usize;
    let width = span(min_x, max_x);
    let height = span(min_y, max_y);
    let mut grid = CharGrid::new(min_x, min_y, width, height);

    for conn in &canvas.connections {
        let (Some(src), Some(dst)) = (canvas.get_box(conn.source_id), canvas.get_box(conn.dest_id))
        else {
            continue;
        };
        grid.clipped_line(src.center(), dst.center(), '.');
    }
    for b in &canvas.boxes {
        grid.draw_box(b);
    }
    grid.into_string()
}

pub fn export_to_file(canvas: &Canvas, path: &Path) -> Result<()> {
    std::fs::write(path, render_ascii(canvas))
        .with_context(|| format!("failed to export to {}", path.display()))?;
    info!(path = %path.display(), boxes = canvas.boxes.len(), "exported canvas");
    Ok(())
}
