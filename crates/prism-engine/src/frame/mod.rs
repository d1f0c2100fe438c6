//! Per-frame driving: the presentation target and the render loop.

mod render_loop;
mod target;

pub use render_loop::{FrameState, RenderLoop, SceneDesc};
pub use target::{FrameTarget, FrameTargetDesc};
