//! Color and viewport types shared by the frame target and the demo scenes.
//!
//! Pixel space has its origin at the top-left with +Y down, like the surface.

mod color;
mod viewport;

pub use color::Color;
pub use viewport::Viewport;
