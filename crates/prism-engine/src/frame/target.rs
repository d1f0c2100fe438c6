use crate::coords::{Color, Viewport};
use crate::device::{GpuDevice, RasterState};
use crate::error::{RenderError, Result};

/// Presentation and rasterizer settings, fixed at startup.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameTargetDesc {
    /// Vertical blanks to wait per present. `0` presents immediately.
    pub sync_interval: u32,
    pub raster: RasterState,
}

/// The surface's back buffer plus the fixed viewport and rasterizer state.
///
/// Surface dimensions never change after construction. The color attachment
/// view is created per frame when the back buffer is acquired in [`clear`].
///
/// [`clear`]: FrameTarget::clear
#[derive(Debug)]
pub struct FrameTarget {
    width: u32,
    height: u32,
    viewport: Viewport,
    desc: FrameTargetDesc,
    presented: u64,
}

impl FrameTarget {
    /// Reads the surface size and sets a full-surface viewport at depth
    /// `[0, 1]`, the sync interval, and the rasterizer state.
    pub fn new<D: GpuDevice>(device: &mut D, desc: FrameTargetDesc) -> Result<Self> {
        let (width, height) = device.surface_size();
        let viewport = Viewport::full(width, height);
        if !viewport.is_valid() {
            return Err(RenderError::resource(
                "frame target",
                format!("surface is {width}x{height}"),
            ));
        }

        device.set_sync_interval(desc.sync_interval);
        device.set_raster_state(desc.raster);
        device.set_viewport(viewport);

        log::info!(
            "frame target {width}x{height}, sync interval {}",
            desc.sync_interval
        );
        Ok(Self {
            width,
            height,
            viewport,
            desc,
            presented: 0,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn desc(&self) -> FrameTargetDesc {
        self.desc
    }

    /// Frames presented so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Acquires the back buffer if needed and clears it. Must precede every
    /// draw of the frame.
    pub fn clear<D: GpuDevice>(&self, device: &mut D, color: Color) -> Result<()> {
        device.begin_frame()?;
        device.clear(color)
    }

    /// Presents the back buffer. Blocks only when the sync interval is nonzero.
    pub fn present<D: GpuDevice>(&mut self, device: &mut D) -> Result<()> {
        device.present()?;
        self.presented += 1;
        Ok(())
    }
}
