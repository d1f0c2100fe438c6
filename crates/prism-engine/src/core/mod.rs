//! Contract between the runtime and the application.
//!
//! The runtime owns the window, the device and the render loop; the
//! application describes the scene and adjusts it between frames.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
