use winit::window::Window;

use crate::device::WgpuDevice;
use crate::frame::RenderLoop;
use crate::time::FrameTime;

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window borrow carried by the device
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub time: FrameTime,
    pub scene: &'a mut RenderLoop<WgpuDevice<'w>>,
}

impl FrameCtx<'_, '_> {
    /// Surface size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.scene.target().size()
    }
}
