//! Reader and writer for the line-oriented `BOXES_CANVAS_V1` save file.
//!
//! ```text
//! BOXES_CANVAS_V1
//! <world_width> <world_height>
//! <box_count>
//! <id> <x> <y> <width> <height> <selected 0|1> <color>   ┐
//! <title | NULL>                                          │ per box
//! <content_line_count>                                    │
//! <content lines...>                                      ┘
//! <next_id> <selected_index | -1>
//! CONNECTIONS <count>                                     ┐ optional
//! <id> <source_id> <dest_id> <color>                      ┘
//! ```
//!
//! Files written before the connection block existed still load.

use std::fmt::Write as _;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};

use crate::canvas::model::{
    CanvasBox, Connection, MAX_BOX_HEIGHT, MAX_BOX_WIDTH, MIN_BOX_HEIGHT, MIN_BOX_WIDTH,
    PALETTE_SIZE,
};
use crate::canvas::store::Canvas;

pub const MAGIC: &str = "BOXES_CANVAS_V1";
const NULL_TITLE: &str = "NULL";
const CONNECTIONS_TAG: &str = "CONNECTIONS";

pub fn serialize(canvas: &Canvas) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", MAGIC);
    let _ = writeln!(out, "{} {}", canvas.world_width, canvas.world_height);
    let _ = writeln!(out, "{}", canvas.boxes.len());
    for b in &canvas.boxes {
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} {}",
            b.id,
            b.x,
            b.y,
            b.width,
            b.height,
            u8::from(b.selected),
            b.color
        );
        let _ = writeln!(out, "{}", b.title.as_deref().map(single_line).unwrap_or_else(|| NULL_TITLE.to_string()));
        let _ = writeln!(out, "{}", b.content.len());
        for line in &b.content {
            let _ = writeln!(out, "{}", single_line(line));
        }
    }
    let selected = canvas
        .selected_index
        .map(|i| i as i64)
        .unwrap_or(-1);
    let _ = writeln!(out, "{} {}", canvas.next_id, selected);
    let _ = writeln!(out, "{} {}", CONNECTIONS_TAG, canvas.connections.len());
    for c in &canvas.connections {
        let _ = writeln!(out, "{} {} {} {}", c.id, c.source_id, c.dest_id, c.color);
    }
    out
}

fn single_line(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}

struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last: usize,
}

impl<'a> Lines<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            inner: input.lines().enumerate(),
            last: 0,
        }
    }

    fn next_line(&mut self, what: &str) -> Result<&'a str> {
        let (idx, line) = self
            .inner
            .next()
            .ok_or_else(|| anyhow!("unexpected end of file, expected {}", what))?;
        self.last = idx + 1;
        Ok(line)
    }

    fn next_optional(&mut self) -> Option<&'a str> {
        let (idx, line) = self.inner.next()?;
        self.last = idx + 1;
        Some(line)
    }

    fn fields<const N: usize>(&mut self, what: &str) -> Result<[&'a str; N]> {
        let line = self.next_line(what)?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        parts
            .try_into()
            .map_err(|parts: Vec<&str>| anyhow!("line {}: expected {} fields for {}, found {}", self.last, N, what, parts.len()))
    }
}

fn num<T: std::str::FromStr>(text: &str, line: usize, what: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.parse::<T>()
        .with_context(|| format!("line {}: invalid {} {:?}", line, what, text))
}

fn in_range<T>(value: T, range: RangeInclusive<T>, line: usize, what: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display,
{
    if !range.contains(&value) {
        bail!(
            "line {}: {} {} outside {}..={}",
            line,
            what,
            value,
            range.start(),
            range.end()
        );
    }
    Ok(value)
}

fn finite(value: f64, line: usize, what: &str) -> Result<f64> {
    if !value.is_finite() {
        bail!("line {}: {} must be a finite number", line, what);
    }
    Ok(value)
}

fn parse_color(text: &str, line: usize) -> Result<u8> {
    in_range(num(text, line, "color")?, 0..=PALETTE_SIZE - 1, line, "color")
}

pub fn parse(input: &str) -> Result<Canvas> {
    let mut lines = Lines::new(input);
    if lines.next_line("header")?.trim() != MAGIC {
        bail!("not a canvas file (missing {} header)", MAGIC);
    }

    let [w, h] = lines.fields::<2>("world size")?;
    let mut canvas = Canvas::new(
        finite(num(w, lines.last, "world width")?, lines.last, "world width")?,
        finite(num(h, lines.last, "world height")?, lines.last, "world height")?,
    );

    let count: usize = num(lines.next_line("box count")?.trim(), lines.last, "box count")?;
    let mut flagged = None;
    for _ in 0..count {
        let [id, x, y, width, height, selected, color] = lines.fields::<7>("box")?;
        let at = lines.last;
        let mut b = CanvasBox::new(
            num(id, at, "id")?,
            finite(num(x, at, "x")?, at, "x")?,
            finite(num(y, at, "y")?, at, "y")?,
            in_range(num(width, at, "width")?, MIN_BOX_WIDTH..=MAX_BOX_WIDTH, at, "width")?,
            in_range(num(height, at, "height")?, MIN_BOX_HEIGHT..=MAX_BOX_HEIGHT, at, "height")?,
        );
        b.color = parse_color(color, at)?;
        if num::<u8>(selected, at, "selected flag")? != 0 {
            flagged = Some(b.id);
        }

        let title = lines.next_line("title")?;
        b.title = (title != NULL_TITLE).then(|| title.to_string());

        let n: usize = num(lines.next_line("content count")?.trim(), lines.last, "content count")?;
        for _ in 0..n {
            b.content.push(lines.next_line("content line")?.to_string());
        }

        let id = b.id;
        canvas
            .restore_box(b)
            .with_context(|| format!("line {}: box {}", at, id))?;
    }

    let [next_id, selected] = lines.fields::<2>("trailer")?;
    let next_id: u32 = num(next_id, lines.last, "next id")?;
    canvas.next_id = canvas.next_id.max(next_id);
    let selected: i64 = num(selected, lines.last, "selected index")?;
    let selected_id = usize::try_from(selected)
        .ok()
        .and_then(|i| canvas.boxes.get(i))
        .map(|b| b.id)
        .or(flagged);
    if let Some(id) = selected_id {
        canvas.select_box(id);
    }

    while let Some(line) = lines.next_optional() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(rest) = line.strip_prefix(CONNECTIONS_TAG) else {
            bail!("line {}: unexpected trailing content", lines.last);
        };
        let n: usize = num(rest.trim(), lines.last, "connection count")?;
        for _ in 0..n {
            let [id, src, dst, color] = lines.fields::<4>("connection")?;
            let at = lines.last;
            let conn = Connection {
                id: num(id, at, "connection id")?,
                source_id: num(src, at, "source id")?,
                dest_id: num(dst, at, "dest id")?,
                color: parse_color(color, at)?,
            };
            // Edges to boxes that no longer exist are dropped.
            if let Err(err) = canvas.restore_connection(conn) {
                tracing::warn!(line = at, %err, "skipping connection");
            }
        }
        break;
    }

    Ok(canvas)
}

pub fn save(canvas: &Canvas, path: &Path) -> Result<()> {
    fs::write(path, serialize(canvas))
        .with_context(|| format!("failed to write {}", path.display()))
}

pub fn load(path: &Path) -> Result<Canvas> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse(&text).with_context(|| format!("failed to parse {}", path.display()))
}
