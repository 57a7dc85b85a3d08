//! Animation frame collision data
//!
//! The physics core does not render anything, but an actor's current
//! animation frame decides its collision footprint: the solid body rect,
//! the optional per-pixel opacity mask, the optional ride-able platform
//! region, the attack area, and the events bound to specific ticks.

use glam::IVec2;

use lode_core::Rect;

/// Per-pixel opacity mask for image-shaped bodies. A set bit is opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    width: i32,
    height: i32,
    words: Vec<u32>,
}

impl AlphaMask {
    /// Fully transparent mask.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0);
        let bits = (width * height) as usize;
        Self {
            width,
            height,
            words: vec![0; bits.div_ceil(32)],
        }
    }

    /// Build from rows of `#` (opaque) and anything else (transparent);
    /// the main way tests and tools describe shapes.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as i32;
        let mut mask = Self::new(width.max(1), height.max(1));
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    mask.set_opaque(x as i32, y as i32);
                }
            }
        }
        mask
    }

    pub fn set_opaque(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let index = (y * self.width + x) as usize;
        self.words[index / 32] |= 1 << (index % 32);
    }

    /// Opacity at frame-local coordinates; out of range is transparent.
    pub fn opaque_at(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return false;
        }
        let index = (y * self.width + x) as usize;
        self.words[index / 32] & (1 << (index % 32)) != 0
    }
}

/// Ride-able one-way surface declared by a frame, relative to its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformRegion {
    pub x: i32,
    pub y: i32,
    pub w: i32,
}

/// Collision-relevant description of one animation frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: i32,
    pub height: i32,
    /// Ticks before the animation ends.
    pub duration: i32,
    /// Solid body relative to the frame origin.
    pub body: Rect,
    /// Foot anchor relative to the frame origin; mirrored when facing left.
    pub feet: IVec2,
    /// Per-pixel opacity for `use_image_for_collisions` actors.
    pub mask: Option<AlphaMask>,
    pub platform: Option<PlatformRegion>,
    /// Attack area relative to the frame origin, if this frame attacks.
    pub hit_area: Option<Rect>,
    /// Events bound to specific ticks (hit frames, sound cues).
    pub events: Vec<(i32, String)>,
    /// Velocity/acceleration overrides applied on entering the frame.
    pub velocity_x: Option<i32>,
    pub velocity_y: Option<i32>,
    pub accel_x: Option<i32>,
    pub accel_y: Option<i32>,
}

impl Frame {
    pub fn new(width: i32, height: i32, duration: i32) -> Self {
        Self {
            width,
            height,
            duration,
            body: Rect::new(0, 0, width, height),
            feet: IVec2::new(width / 2, height),
            mask: None,
            platform: None,
            hit_area: None,
            events: Vec::new(),
            velocity_x: None,
            velocity_y: None,
            accel_x: None,
            accel_y: None,
        }
    }

    pub fn event_at(&self, tick: i32) -> Option<&str> {
        self.events
            .iter()
            .find(|(t, _)| *t == tick)
            .map(|(_, name)| name.as_str())
    }

    /// Opacity at frame-local coordinates, honoring horizontal mirroring
    /// and vertical flip. Without a mask the whole frame area is opaque.
    pub fn opaque(&self, mut x: i32, mut y: i32, face_right: bool, upside_down: bool) -> bool {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return false;
        }
        if !face_right {
            x = self.width - 1 - x;
        }
        if upside_down {
            y = self.height - 1 - y;
        }
        match &self.mask {
            Some(mask) => mask.opaque_at(x, y),
            None => true,
        }
    }
}
