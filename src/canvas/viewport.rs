//! World ↔ screen mapping under pan and zoom.

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

/// The camera: `cam_x`/`cam_y` is the world point at the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub cam_x: f64,
    pub cam_y: f64,
    pub zoom: f64,
    pub width: u16,
    pub height: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            cam_x: 0.0,
            cam_y: 0.0,
            zoom: 1.0,
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn world_to_screen(&self, x: f64, y: f64) -> (i32, i32) {
        let sx = ((x - self.cam_x) * self.zoom).round();
        let sy = ((y - self.cam_y) * self.zoom).round();
        (sx as i32, sy as i32)
    }

    pub fn screen_to_world(&self, sx: i32, sy: i32) -> (f64, f64) {
        let zoom = self.safe_zoom();
        (
            self.cam_x + f64::from(sx) / zoom,
            self.cam_y + f64::from(sy) / zoom,
        )
    }

    /// Scales a world length to cells, never below one cell.
    pub fn scale_len(&self, len: i32) -> i32 {
        ((f64::from(len) * self.zoom).round() as i32).max(1)
    }

    /// Moves the camera by a screen-space delta, so the visual speed is the
    /// same at every zoom level.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let zoom = self.safe_zoom();
        self.cam_x += dx / zoom;
        self.cam_y += dy / zoom;
    }

    /// Multiplies the zoom by `factor` while keeping the world point under
    /// the screen center fixed.
    pub fn zoom(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let half_w = f64::from(self.width) / 2.0;
        let half_h = f64::from(self.height) / 2.0;
        let old_zoom = self.safe_zoom();
        let center_x = self.cam_x + half_w / old_zoom;
        let center_y = self.cam_y + half_h / old_zoom;

        self.zoom = (old_zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.cam_x = center_x - half_w / self.zoom;
        self.cam_y = center_y - half_h / self.zoom;
    }

    #[allow(dead_code)] // used by tests
    pub fn is_visible(&self, x: f64, y: f64) -> bool {
        let (sx, sy) = self.world_to_screen(x, y);
        sx >= 0 && sy >= 0 && sx < i32::from(self.width) && sy < i32::from(self.height)
    }

    /// World coordinates of the screen center.
    pub fn center_world(&self) -> (f64, f64) {
        let zoom = self.safe_zoom();
        (
            self.cam_x + f64::from(self.width) / 2.0 / zoom,
            self.cam_y + f64::from(self.height) / 2.0 / zoom,
        )
    }

    /// Positions the camera so that `(x, y)` sits at the screen center.
    pub fn center_on(&mut self, x: f64, y: f64) {
        let zoom = self.safe_zoom();
        self.cam_x = x - f64::from(self.width) / 2.0 / zoom;
        self.cam_y = y - f64::from(self.height) / 2.0 / zoom;
    }

    pub fn reset(&mut self) {
        self.cam_x = 0.0;
        self.cam_y = 0.0;
        self.zoom = 1.0;
    }

    fn safe_zoom(&self) -> f64 {
        if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            MIN_ZOOM
        }
    }
}
