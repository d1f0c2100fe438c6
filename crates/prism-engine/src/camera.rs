//! Transform providers for the render loop.
//!
//! The loop calls [`Camera::update`] once per frame and then reads
//! [`Camera::transform`] once. Matrices are column-major throughout, the same
//! order `glam` stores and WGSL `mat4x4<f32>` consumes, so nothing transposes.

use glam::{Mat4, Vec2};

/// Per-frame source of the world-to-clip transform.
pub trait Camera {
    /// Advances time-based state by `dt` seconds.
    fn update(&mut self, dt: f32);

    /// Current transform, column-major.
    fn transform(&self) -> Mat4;
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn update(&mut self, dt: f32) {
        (**self).update(dt);
    }

    fn transform(&self) -> Mat4 {
        (**self).transform()
    }
}

/// Orthographic pixel-space camera.
///
/// Positions are in surface pixels: origin top-left, +Y down, depth `[0, 1]`.
/// An optional pan velocity (pixels per second) scrolls the scene.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenCamera {
    width: f32,
    height: f32,
    offset: Vec2,
    velocity: Vec2,
}

impl ScreenCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            offset: Vec2::ZERO,
            velocity: Vec2::ZERO,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Accumulated pan in pixels.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }
}

impl Camera for ScreenCamera {
    fn update(&mut self, dt: f32) {
        self.offset += self.velocity * dt;
    }

    fn transform(&self) -> Mat4 {
        let projection = Mat4::orthographic_rh(0.0, self.width, self.height, 0.0, 0.0, 1.0);
        projection * Mat4::from_translation(self.offset.extend(0.0))
    }
}

/// Camera returning the same matrix every frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedCamera(pub Mat4);

impl FixedCamera {
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);
}

impl Camera for FixedCamera {
    fn update(&mut self, _dt: f32) {}

    fn transform(&self) -> Mat4 {
        self.0
    }
}
