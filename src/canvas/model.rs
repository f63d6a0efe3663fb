/// How the `content` lines of a box were populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    /// Lines typed by the user.
    #[default]
    Text,
    /// Lines read from `file_path`.
    File,
    /// Captured output of `command`.
    Command,
}

impl ContentType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Command => "command",
        }
    }
}

/// Cosmetic box flavour. Only affects the border drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxType {
    #[default]
    Note,
    Task,
    Code,
    Sticky,
}

impl BoxType {
    pub fn next(self) -> Self {
        match self {
            Self::Note => Self::Task,
            Self::Task => Self::Code,
            Self::Code => Self::Sticky,
            Self::Sticky => Self::Note,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Task => "task",
            Self::Code => "code",
            Self::Sticky => "sticky",
        }
    }
}

/// Shape preset used when creating a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxTemplate {
    #[default]
    Square,
    Horizontal,
    Vertical,
}

impl BoxTemplate {
    pub fn label(self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

/// How much of each box the renderer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Full,
    Compact,
    Minimal,
}

impl DisplayMode {
    pub fn next(self) -> Self {
        match self {
            Self::Full => Self::Compact,
            Self::Compact => Self::Minimal,
            Self::Minimal => Self::Full,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Compact => "compact",
            Self::Minimal => "minimal",
        }
    }
}

/// Default colour index; 1..=7 are palette slots.
pub const COLOR_DEFAULT: u8 = 0;
pub const PALETTE_SIZE: u8 = 8;

pub const MIN_BOX_WIDTH: i32 = 3;
pub const MAX_BOX_WIDTH: i32 = 200;
pub const MIN_BOX_HEIGHT: i32 = 3;
pub const MAX_BOX_HEIGHT: i32 = 100;

/// A rectangle on the board.
///
/// Positions are world units (floating point); sizes are whole cells.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasBox {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub width: i32,
    pub height: i32,
    pub title: Option<String>,
    /// Lines of text, however they were produced (see `content_type`).
    pub content: Vec<String>,
    pub content_type: ContentType,
    /// Only meaningful when `content_type == File`.
    pub file_path: Option<String>,
    /// Only meaningful when `content_type == Command`.
    pub command: Option<String>,
    pub color: u8,
    pub box_type: BoxType,
    pub selected: bool,
}

impl CanvasBox {
    pub fn new(id: u32, x: f64, y: f64, width: i32, height: i32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            title: None,
            content: Vec::new(),
            content_type: ContentType::Text,
            file_path: None,
            command: None,
            color: COLOR_DEFAULT,
            box_type: BoxType::Note,
            selected: false,
        }
    }

    /// Inclusive bounds: the right and bottom edges count as inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x
            && x <= self.x + f64::from(self.width)
            && y >= self.y
            && y <= self.y + f64::from(self.height)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x + f64::from(self.width) / 2.0,
            self.y + f64::from(self.height) / 2.0,
        )
    }
}

/// A directed edge between two boxes, referenced by id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub id: u32,
    pub source_id: u32,
    pub dest_id: u32,
    pub color: u8,
}

impl Connection {
    pub fn touches(&self, box_id: u32) -> bool {
        self.source_id == box_id || self.dest_id == box_id
    }

    /// True when this edge joins `a` and `b` in either direction.
    pub fn joins(&self, a: u32, b: u32) -> bool {
        (self.source_id == a && self.dest_id == b) || (self.source_id == b && self.dest_id == a)
    }
}
