//! Frame timing.
//!
//! The runtime ticks one [`FrameClock`] per redraw and passes the clamped
//! delta to the camera.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
