use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::border;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};

use crate::canvas::model::{BoxType, CanvasBox, ContentType, DisplayMode};
use crate::canvas::store::{Canvas, ConnectionMode, Sidebar};
use crate::canvas::viewport::Viewport;
use crate::input::gamepad::GamepadMode;

const PALETTE: [Color; 8] = [
    Color::Gray,
    Color::LightRed,
    Color::Green,
    Color::Yellow,
    Color::LightBlue,
    Color::Magenta,
    Color::Cyan,
    Color::White,
];

pub fn palette_color(index: u8) -> Color {
    PALETTE[usize::from(index) % PALETTE.len()]
}

#[derive(Debug, Clone)]
pub struct RenderData<'a> {
    pub canvas: &'a Canvas,
    pub viewport: &'a Viewport,
    pub file_name: &'a str,
    /// `None` while no gamepad is attached.
    pub pad_mode: Option<GamepadMode>,
    pub status: &'a str,
    pub undo: usize,
    pub redo: usize,
    pub show_help: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub canvas: Rect,
    pub sidebar: Option<Rect>,
    pub status: Rect,
}

/// Splits the terminal into board, optional sidebar and a one-line status bar.
pub fn areas(area: Rect, sidebar: Sidebar) -> Areas {
    let [main, status] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
    if !sidebar.visible {
        return Areas {
            canvas: main,
            sidebar: None,
            status,
        };
    }
    let width = sidebar.width.min(main.width / 2);
    let [canvas, side] =
        Layout::horizontal([Constraint::Min(1), Constraint::Length(width)]).areas(main);
    Areas {
        canvas,
        sidebar: Some(side),
        status,
    }
}

pub fn draw(frame: &mut Frame, data: &RenderData<'_>) {
    let areas = areas(frame.area(), data.canvas.sidebar);

    let focused = data
        .canvas
        .focus
        .box_id
        .and_then(|id| data.canvas.get_box(id));
    if let Some(b) = focused {
        draw_focus(frame, areas.canvas, b, data.canvas.focus.scroll);
    } else {
        let buf = frame.buffer_mut();
        let mut painter = Painter {
            buf,
            area: areas.canvas,
        };
        draw_grid(&mut painter, data.canvas, data.viewport);
        draw_connections(&mut painter, data.canvas, data.viewport);
        for b in &data.canvas.boxes {
            draw_box(&mut painter, data.canvas, data.viewport, b);
        }
    }

    if let Some(side) = areas.sidebar {
        draw_sidebar(frame, side, data.canvas);
    }
    draw_status(frame, areas.status, data);

    if data.show_help {
        render_help_overlay(frame);
    }
}

/// Writes single cells clipped to `area`, in coordinates relative to it.
struct Painter<'b> {
    buf: &'b mut Buffer,
    area: Rect,
}

impl Painter<'_> {
    fn put(&mut self, sx: i32, sy: i32, symbol: &str, style: Style) {
        if sx < 0 || sy < 0 || sx >= i32::from(self.area.width) || sy >= i32::from(self.area.height)
        {
            return;
        }
        let pos = (self.area.x + sx as u16, self.area.y + sy as u16);
        if let Some(cell) = self.buf.cell_mut(pos) {
            cell.set_symbol(symbol).set_style(style);
        }
    }

    fn text(&mut self, sx: i32, sy: i32, text: &str, max: i32, style: Style) {
        let mut tmp = [0u8; 4];
        for (i, ch) in text.chars().take(max.max(0) as usize).enumerate() {
            self.put(sx + i as i32, sy, ch.encode_utf8(&mut tmp), style);
        }
    }
}

fn draw_grid(p: &mut Painter<'_>, canvas: &Canvas, vp: &Viewport) {
    let spacing = f64::from(canvas.grid.spacing);
    if !canvas.grid.visible || spacing <= 0.0 || spacing * vp.zoom < 2.0 {
        return;
    }
    let (x0, y0) = vp.screen_to_world(0, 0);
    let (x1, y1) = vp.screen_to_world(i32::from(p.area.width), i32::from(p.area.height));
    let style = Style::default().fg(Color::DarkGray);
    let mut gy = (y0 / spacing).floor() * spacing;
    while gy <= y1 {
        let mut gx = (x0 / spacing).floor() * spacing;
        while gx <= x1 {
            let (sx, sy) = vp.world_to_screen(gx, gy);
            p.put(sx, sy, "·", style);
            gx += spacing;
        }
        gy += spacing;
    }
}

fn draw_connections(p: &mut Painter<'_>, canvas: &Canvas, vp: &Viewport) {
    for conn in &canvas.connections {
        let (Some(src), Some(dst)) = (canvas.get_box(conn.source_id), canvas.get_box(conn.dest_id))
        else {
            continue;
        };
        let (ax, ay) = src.center();
        let (bx, by) = dst.center();
        let (x0, y0) = vp.world_to_screen(ax, ay);
        let (x1, y1) = vp.world_to_screen(bx, by);
        let style = Style::default().fg(palette_color(conn.color));
        let symbol = if (y1 - y0).abs() * 2 < (x1 - x0).abs() {
            "─"
        } else if (x1 - x0).abs() * 2 < (y1 - y0).abs() {
            "│"
        } else {
            "·"
        };
        line(p, (x0, y0), (x1, y1), symbol, style);
    }
}

fn line(p: &mut Painter<'_>, from: (i32, i32), to: (i32, i32), symbol: &str, style: Style) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    // Bounded so far-away endpoints cannot stall a frame.
    for _ in 0..=(dx - dy).min(4096) {
        p.put(x, y, symbol, style);
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn border_set(box_type: BoxType) -> border::Set {
    match box_type {
        BoxType::Note => border::PLAIN,
        BoxType::Task => border::DOUBLE,
        BoxType::Code => border::THICK,
        BoxType::Sticky => border::ROUNDED,
    }
}

fn draw_box(p: &mut Painter<'_>, canvas: &Canvas, vp: &Viewport, b: &CanvasBox) {
    let (sx, sy) = vp.world_to_screen(b.x, b.y);
    let w = vp.scale_len(b.width);
    let h = vp.scale_len(b.height);
    if sx + w < 0 || sy + h < 0 || sx >= i32::from(p.area.width) || sy >= i32::from(p.area.height) {
        return;
    }

    let armed = matches!(canvas.connection_mode, ConnectionMode::Armed { source_box_id } if source_box_id == b.id);
    let mut style = Style::default().fg(palette_color(b.color));
    if armed {
        style = Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD);
    } else if b.selected {
        style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    }

    if w < 2 || h < 2 {
        p.put(sx, sy, "■", style);
        return;
    }

    let set = border_set(b.box_type);
    let (right, bottom) = (sx + w - 1, sy + h - 1);
    let (max_x, max_y) = (i32::from(p.area.width) - 1, i32::from(p.area.height) - 1);
    for y in sy.max(0)..=bottom.min(max_y) {
        for x in sx.max(0)..=right.min(max_x) {
            let symbol = match (x == sx, x == right, y == sy, y == bottom) {
                (true, _, true, _) => set.top_left,
                (_, true, true, _) => set.top_right,
                (true, _, _, true) => set.bottom_left,
                (_, true, _, true) => set.bottom_right,
                (_, _, true, _) => set.horizontal_top,
                (_, _, _, true) => set.horizontal_bottom,
                (true, _, _, _) => set.vertical_left,
                (_, true, _, _) => set.vertical_right,
                _ => " ",
            };
            p.put(x, y, symbol, style);
        }
    }

    if canvas.display_mode == DisplayMode::Minimal {
        return;
    }
    if let Some(title) = &b.title {
        p.text(sx + 2, sy, title, w - 4, style.add_modifier(Modifier::BOLD));
    }
    if canvas.display_mode == DisplayMode::Compact {
        return;
    }

    let text_style = Style::default().fg(Color::White);
    for (row, content) in b.content.iter().take((h - 2) as usize).enumerate() {
        p.text(sx + 1, sy + 1 + row as i32, content, w - 2, text_style);
    }
    if b.content_type != ContentType::Text {
        let tag = format!("[{}]", b.content_type.label());
        let len = tag.chars().count() as i32;
        p.text(right - len - 1, bottom, &tag, len, Style::default().fg(Color::DarkGray));
    }
}

fn draw_focus(frame: &mut Frame, area: Rect, b: &CanvasBox, scroll: usize) {
    frame.render_widget(Clear, area);
    let title = b.title.as_deref().unwrap_or("untitled");
    let lines: Vec<Line> = if b.content.is_empty() {
        vec![Line::from(Span::styled(
            "(empty)",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        b.content.iter().map(|l| Line::from(l.as_str())).collect()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(palette_color(b.color)))
        .padding(Padding::new(2, 2, 1, 1))
        .title(Line::from(vec![
            Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled("[Esc] back", Style::default().fg(Color::DarkGray)),
        ]));
    let scroll = u16::try_from(scroll).unwrap_or(u16::MAX);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn draw_sidebar(frame: &mut Frame, area: Rect, canvas: &Canvas) {
    let label = Style::default().fg(Color::DarkGray);
    let lines = match canvas.selected() {
        None => vec![Line::from(Span::styled("no box selected", label))],
        Some(b) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    b.title.clone().unwrap_or_else(|| "untitled".to_string()),
                    Style::default()
                        .fg(palette_color(b.color))
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(vec![
                    Span::styled("id ", label),
                    Span::raw(b.id.to_string()),
                    Span::styled("  type ", label),
                    Span::raw(b.box_type.label()),
                ]),
                Line::from(vec![
                    Span::styled("at ", label),
                    Span::raw(format!("{:.1},{:.1}", b.x, b.y)),
                    Span::styled("  size ", label),
                    Span::raw(format!("{}x{}", b.width, b.height)),
                ]),
                Line::from(vec![
                    Span::styled("links ", label),
                    Span::raw(canvas.get_box_connections(b.id).len().to_string()),
                    Span::styled("  content ", label),
                    Span::raw(b.content_type.label()),
                ]),
            ];
            if let Some(source) = b.file_path.as_deref().or(b.command.as_deref()) {
                lines.push(Line::from(Span::styled(source.to_string(), label)));
            }
            lines.push(Line::from(""));
            lines.extend(b.content.iter().map(|l| Line::from(l.as_str())));
            lines
        }
    };
    let sidebar = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled("BOX", Style::default().add_modifier(Modifier::BOLD)))
            .padding(Padding::new(1, 1, 0, 0)),
    );
    frame.render_widget(sidebar, area);
}

fn status_spans<'a>(data: &RenderData<'a>) -> Vec<Span<'a>> {
    let dim = Style::default().fg(Color::DarkGray);
    let canvas = data.canvas;
    let mut spans = vec![
        Span::styled(" boxes-live ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(data.file_name, dim),
        Span::raw(format!(
            "  {} boxes {} links  zoom {:.2}x",
            canvas.boxes.len(),
            canvas.connections.len(),
            data.viewport.zoom
        )),
    ];
    if let Some(id) = canvas.selected_id() {
        spans.push(Span::styled(
            format!("  #{}", id),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let ConnectionMode::Armed { source_box_id } = canvas.connection_mode {
        spans.push(Span::styled(
            format!("  CONNECT from #{}", source_box_id),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(mode) = data.pad_mode {
        spans.push(Span::styled(
            format!("  pad {}", mode.label()),
            Style::default().fg(Color::Cyan),
        ));
    }
    let mut flags = Vec::new();
    if canvas.grid.visible {
        flags.push("grid");
    }
    if canvas.grid.snap {
        flags.push("snap");
    }
    if canvas.display_mode != DisplayMode::Full {
        flags.push(canvas.display_mode.label());
    }
    if !flags.is_empty() {
        spans.push(Span::styled(format!("  [{}]", flags.join(" ")), dim));
    }
    spans.push(Span::styled(
        format!("  undo {} redo {}", data.undo, data.redo),
        dim,
    ));
    if !data.status.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(data.status, Style::default().fg(Color::White)));
    }
    spans
}

fn draw_status(frame: &mut Frame, area: Rect, data: &RenderData<'_>) {
    let status = Paragraph::new(Line::from(status_spans(data)))
        .style(Style::default().bg(Color::Black));
    frame.render_widget(status, area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(frame.area(), 84, 80);
    frame.render_widget(Clear, area);
    let help = Paragraph::new(vec![
        Line::from("NAVIGATE"),
        Line::from("  arrows / wasd pan   + - zoom   r reset view   Tab next box"),
        Line::from("  mouse: click select, drag move, wheel zoom, right-click connect"),
        Line::from(""),
        Line::from("BOXES"),
        Line::from("  n / b / v new square / wide / tall box   x or Del delete"),
        Line::from("  Shift+arrows or WASD move   Ctrl+arrows resize   0-7 color"),
        Line::from("  t box type   T edit title   e edit content   Enter focus"),
        Line::from("  content: text|more lines   @path reads a file   !cmd runs a command"),
        Line::from(""),
        Line::from("CONNECTIONS"),
        Line::from("  c start, c again to finish on the selected box   Esc cancel"),
        Line::from("  X remove every connection of the selected box"),
        Line::from(""),
        Line::from("BOARD"),
        Line::from("  g grid   G snap   m display mode   p sidebar   [ ] sidebar width"),
        Line::from("  u / Ctrl+Z undo   U / Ctrl+Y redo"),
        Line::from("  F2 / Ctrl+S save   F3 / Ctrl+O load   F4 / Ctrl+E export"),
        Line::from("  ? help   q quit"),
        Line::from(""),
        Line::from("GAMEPAD"),
        Line::from("  LB cycles NAV → SELECT → EDIT; Start help, Back reset view"),
        Line::from("  NAV: A box (LB+A wide, RB+A tall), X grid, Y undo, RB+Y redo"),
        Line::from("  EDIT: stick moves, A connect, X delete, Y color, R3 params"),
    ])
    .block(
        Block::default()
            .title("Help")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    frame.render_widget(help, area);
}

pub fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - height_percent) / 2),
        Constraint::Percentage(height_percent),
        Constraint::Percentage((100 - height_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(area);
    Layout::horizontal([
        Constraint::Percentage((100 - width_percent) / 2),
        Constraint::Percentage(width_percent),
        Constraint::Percentage((100 - width_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(vertical[1])[1]
}
