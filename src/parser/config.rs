//! `key: value` configuration file.
//!
//! Blank lines and `#` comments are ignored. Unknown keys are ignored so
//! older binaries can read newer files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};

use crate::canvas::model::BoxTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateSize {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub world_width: f64,
    pub world_height: f64,
    pub grid_spacing: u32,
    pub show_grid: bool,
    pub snap_to_grid: bool,
    pub undo_limit: usize,
    pub pan_step: f64,
    pub pan_speed: f64,
    pub zoom_step: f64,
    pub proportional_sizing: bool,
    pub proportional_radius: f64,
    pub proportional_min_neighbors: usize,
    pub proportional_use_nearest: bool,
    pub template_square: TemplateSize,
    pub template_horizontal: TemplateSize,
    pub template_vertical: TemplateSize,
    pub sidebar_width: u16,
    pub gamepad_device: String,
    pub gamepad_deadzone: i16,
    pub gamepad_settle_frames: u32,
    pub save_path: String,
    pub export_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world_width: 200.0,
            world_height: 100.0,
            grid_spacing: 10,
            show_grid: false,
            snap_to_grid: false,
            undo_limit: 50,
            pan_step: 5.0,
            pan_speed: 2.0,
            zoom_step: 1.2,
            proportional_sizing: true,
            proportional_radius: 50.0,
            proportional_min_neighbors: 1,
            proportional_use_nearest: true,
            template_square: TemplateSize {
                width: 20,
                height: 8,
            },
            template_horizontal: TemplateSize {
                width: 30,
                height: 6,
            },
            template_vertical: TemplateSize {
                width: 16,
                height: 12,
            },
            sidebar_width: 30,
            gamepad_device: "/dev/input/js0".to_string(),
            gamepad_deadzone: 8000,
            gamepad_settle_frames: 30,
            save_path: "canvas.txt".to_string(),
            export_path: "canvas_export.txt".to_string(),
        }
    }
}

impl Config {
    pub fn template(&self, template: BoxTemplate) -> TemplateSize {
        match template {
            BoxTemplate::Square => self.template_square,
            BoxTemplate::Horizontal => self.template_horizontal,
            BoxTemplate::Vertical => self.template_vertical,
        }
    }
}

/// `--config` if given, else `$XDG_CONFIG_HOME/boxes-live/config`, else
/// `$HOME/.config/boxes-live/config`.
pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir).join("boxes-live").join("config"));
    }
    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".config").join("boxes-live").join("config"))
}

/// Reads the file at `path`; a missing file means defaults.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse(&content).with_context(|| format!("invalid config {}", path.display()))
}

pub fn parse(input: &str) -> Result<Config> {
    let mut cfg = Config::default();
    for (line_num, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| anyhow!("line {}: expected `key: value`", line_num + 1))?;
        let key = key.trim();
        let value = value.trim();
        apply(&mut cfg, key, value)
            .with_context(|| format!("line {}: bad value for `{}`", line_num + 1, key))?;
    }
    Ok(cfg)
}

fn apply(cfg: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "world_width" => cfg.world_width = positive_f64(value)?,
        "world_height" => cfg.world_height = positive_f64(value)?,
        "grid_spacing" => cfg.grid_spacing = value.parse()?,
        "show_grid" => cfg.show_grid = parse_bool(value)?,
        "snap_to_grid" => cfg.snap_to_grid = parse_bool(value)?,
        "undo_limit" => cfg.undo_limit = value.parse::<usize>()?.max(1),
        "pan_step" => cfg.pan_step = positive_f64(value)?,
        "pan_speed" => cfg.pan_speed = positive_f64(value)?,
        "zoom_step" => {
            let step = positive_f64(value)?;
            if step <= 1.0 {
                bail!("zoom_step must be greater than 1");
            }
            cfg.zoom_step = step;
        }
        "proportional_sizing" => cfg.proportional_sizing = parse_bool(value)?,
        "proportional_radius" => cfg.proportional_radius = positive_f64(value)?,
        "proportional_min_neighbors" => cfg.proportional_min_neighbors = value.parse()?,
        "proportional_use_nearest" => cfg.proportional_use_nearest = parse_bool(value)?,
        "template_square" => cfg.template_square = parse_size(value)?,
        "template_horizontal" => cfg.template_horizontal = parse_size(value)?,
        "template_vertical" => cfg.template_vertical = parse_size(value)?,
        "sidebar_width" => cfg.sidebar_width = value.parse()?,
        "gamepad_device" => cfg.gamepad_device = value.to_string(),
        "gamepad_deadzone" => cfg.gamepad_deadzone = value.parse()?,
        "gamepad_settle_frames" => cfg.gamepad_settle_frames = value.parse()?,
        "save_path" => cfg.save_path = value.to_string(),
        "export_path" => cfg.export_path = value.to_string(),
        _ => {}
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        other => bail!("expected true/false, got {:?}", other),
    }
}

fn positive_f64(value: &str) -> Result<f64> {
    let v: f64 = value.parse()?;
    if !v.is_finite() || v <= 0.0 {
        bail!("expected a positive number, got {}", value);
    }
    Ok(v)
}

fn parse_size(value: &str) -> Result<TemplateSize> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got {:?}", value))?;
    let width: i32 = w.trim().parse()?;
    let height: i32 = h.trim().parse()?;
    if width < 3 || height < 3 {
        bail!("template sizes must be at least 3x3");
    }
    Ok(TemplateSize { width, height })
}

pub fn serialize(cfg: &Config) -> String {
    let size = |t: TemplateSize| format!("{}x{}", t.width, t.height);
    format!(
        "\
# boxes-live configuration

# Size of a new canvas, in world units
world_width: {}
world_height: {}

# Grid
grid_spacing: {}
show_grid: {}
snap_to_grid: {}

# Number of undoable operations kept
undo_limit: {}

# Navigation: keyboard pan step (cells), gamepad stick speed, zoom factor
pan_step: {}
pan_speed: {}
zoom_step: {}

# Size new boxes after their neighbors
proportional_sizing: {}
proportional_radius: {}
proportional_min_neighbors: {}
proportional_use_nearest: {}

# Box templates (WIDTHxHEIGHT)
template_square: {}
template_horizontal: {}
template_vertical: {}

sidebar_width: {}

# Gamepad
gamepad_device: {}
gamepad_deadzone: {}
gamepad_settle_frames: {}

# Files
save_path: {}
export_path: {}
",
        cfg.world_width,
        cfg.world_height,
        cfg.grid_spacing,
        cfg.show_grid,
        cfg.snap_to_grid,
        cfg.undo_limit,
        cfg.pan_step,
        cfg.pan_speed,
        cfg.zoom_step,
        cfg.proportional_sizing,
        cfg.proportional_radius,
        cfg.proportional_min_neighbors,
        cfg.proportional_use_nearest,
        size(cfg.template_square),
        size(cfg.template_horizontal),
        size(cfg.template_vertical),
        cfg.sidebar_width,
        cfg.gamepad_device,
        cfg.gamepad_deadzone,
        cfg.gamepad_settle_frames,
        cfg.save_path,
        cfg.export_path,
    )
}
