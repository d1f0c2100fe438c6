/// Rasterizer viewport in physical pixels with a depth range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering a whole `width x height` surface at depth `[0, 1]`.
    #[inline]
    pub const fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.width.is_finite()
            && self.height.is_finite()
            && (0.0..=1.0).contains(&self.min_depth)
            && (0.0..=1.0).contains(&self.max_depth)
            && self.min_depth <= self.max_depth
    }

    /// Maps a normalized device coordinate to a pixel position in this viewport.
    ///
    /// NDC has +Y up; pixel space has its origin at the top-left with +Y down.
    #[inline]
    pub fn ndc_to_pixel(self, ndc_x: f32, ndc_y: f32) -> (f32, f32) {
        (
            self.x + (ndc_x + 1.0) * 0.5 * self.width,
            self.y + (1.0 - ndc_y) * 0.5 * self.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_covers_surface_with_unit_depth() {
        let v = Viewport::full(800, 600);
        assert_eq!((v.x, v.y, v.width, v.height), (0.0, 0.0, 800.0, 600.0));
        assert_eq!((v.min_depth, v.max_depth), (0.0, 1.0));
        assert!(v.is_valid());
    }

    #[test]
    fn zero_sized_viewport_is_invalid() {
        assert!(!Viewport::full(0, 600).is_valid());
    }

    #[test]
    fn ndc_corners_map_to_pixel_corners() {
        let v = Viewport::full(800, 600);
        assert_eq!(v.ndc_to_pixel(-1.0, 1.0), (0.0, 0.0));
        assert_eq!(v.ndc_to_pixel(1.0, -1.0), (800.0, 600.0));
    }
}
