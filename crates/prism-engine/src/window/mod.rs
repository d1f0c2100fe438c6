//! Window + runtime loop.
//!
//! Owns the `winit` event loop and the single fixed-size window, and drives
//! the render loop from redraw requests.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
