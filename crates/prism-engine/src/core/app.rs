use winit::event::WindowEvent;

use super::ctx::FrameCtx;
use crate::frame::SceneDesc;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the binary.
pub trait App {
    /// Describes the scene once the surface exists. Called exactly once,
    /// with the fixed surface size in physical pixels.
    fn scene(&mut self, width: u32, height: u32) -> SceneDesc;

    /// Called for every window event before the runtime handles it.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called before each frame's update step. Geometry edits, policy and
    /// clear color changes made here show up in the same frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }
}
