//! Per-image view state

use crate::config::TransformConfig;

/// Quarter-turn rotation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn rotate_cw(self) -> Self {
        match self {
            Rotation::None => Rotation::Cw90,
            Rotation::Cw90 => Rotation::Cw180,
            Rotation::Cw180 => Rotation::Cw270,
            Rotation::Cw270 => Rotation::None,
        }
    }

    pub fn rotate_ccw(self) -> Self {
        match self {
            Rotation::None => Rotation::Cw270,
            Rotation::Cw90 => Rotation::None,
            Rotation::Cw180 => Rotation::Cw90,
            Rotation::Cw270 => Rotation::Cw180,
        }
    }

    /// Get rotation angle in degrees
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    /// Sum of two rotations, modulo a full turn
    pub fn compose(self, other: Rotation) -> Rotation {
        let quarters = (self.degrees() + other.degrees()) / 90;
        match quarters % 4 {
            0 => Rotation::None,
            1 => Rotation::Cw90,
            2 => Rotation::Cw180,
            _ => Rotation::Cw270,
        }
    }
}

/// Mutable view state of one image. The path never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    path: String,
    bookmarked: bool,
    local_rotation: Rotation,
    scale_percent: u32,
    translate_x: f32,
    translate_y: f32,
}

impl ImageEntry {
    pub const DEFAULT_SCALE: u32 = 100;

    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bookmarked: false,
            local_rotation: Rotation::None,
            scale_percent: Self::DEFAULT_SCALE,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    // --- Bookmark ---

    pub fn toggle_bookmark(&mut self) {
        self.bookmarked = !self.bookmarked;
    }

    pub fn is_bookmarked(&self) -> bool {
        self.bookmarked
    }

    // --- Rotation ---

    pub fn rotate_local_right(&mut self) {
        self.local_rotation = self.local_rotation.rotate_cw();
    }

    pub fn rotate_local_left(&mut self) {
        self.local_rotation = self.local_rotation.rotate_ccw();
    }

    pub fn local_rotation(&self) -> Rotation {
        self.local_rotation
    }

    // --- Scale & translation ---

    pub fn scale_up(&mut self, limits: &TransformConfig) {
        self.scale_percent = (self.scale_percent + limits.scale_step).min(limits.max_scale);
    }

    pub fn scale_down(&mut self, limits: &TransformConfig) {
        self.scale_percent = self
            .scale_percent
            .saturating_sub(limits.scale_step)
            .max(limits.min_scale);
    }

    pub fn scale_percent(&self) -> u32 {
        self.scale_percent
    }

    /// Move by a screen-space delta; rotation is deliberately not compensated
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.translate_x += dx;
        self.translate_y += dy;
    }

    pub fn translation(&self) -> (f32, f32) {
        (self.translate_x, self.translate_y)
    }

    /// Restore scale, translation and rotation; bookmark is kept
    pub fn reset_transform(&mut self) {
        self.scale_percent = Self::DEFAULT_SCALE;
        self.translate_x = 0.0;
        self.translate_y = 0.0;
        self.local_rotation = Rotation::None;
    }
}
