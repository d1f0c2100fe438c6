//! GPU device + surface management.
//!
//! This module is responsible for:
//! - the [`GpuDevice`] contract every rendering component is written against
//! - bootstrapping wgpu (instance, adapter, device, queue, surface) in [`Gpu`]
//! - the wgpu implementation of the contract in [`WgpuDevice`]
//!
//! Components never store a device. They receive it by reference on each
//! call, so tests can run them against a recording device instead.

mod gpu;
mod init;
mod types;
mod wgpu_device;

#[cfg(test)]
pub(crate) mod mock;

pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use types::{
    BufferDesc, BufferKind, BufferUsage, CullMode, FrontFace, IndexFormat, MapMode, RasterState,
    ShaderStage, Topology,
};
pub use wgpu_device::{WgpuBuffer, WgpuDevice, WgpuProgram};

use crate::coords::{Color, Viewport};
use crate::error::Result;
use crate::shader::{CompiledShader, InputLayout};

/// Device handle plus immediate execution context.
///
/// Resource creation and buffer writes take `&self`. Operations that change
/// pipeline state or record commands take `&mut self`. All of them run on
/// the render thread.
///
/// Handle types release their GPU allocation when dropped. Replacing a handle
/// is therefore a plain assignment: the old value is released first.
pub trait GpuDevice {
    /// Owned GPU buffer. Dropping it releases the allocation.
    type Buffer;

    /// Compiled vertex + fragment stages together with their input layout.
    type Program;

    /// Allocates a buffer, optionally initialized with `desc.contents`.
    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<Self::Buffer>;

    /// Maps `buffer` for writing, copies `bytes` to offset 0 once, and unmaps.
    ///
    /// Fails with `Mapping` if the buffer is not host writable or `bytes` does
    /// not fit.
    fn write_buffer(&self, buffer: &Self::Buffer, mode: MapMode, bytes: &[u8]) -> Result<()>;

    /// Creates the stage objects for a validated shader and input layout.
    fn create_program(&self, shader: &CompiledShader, layout: &InputLayout)
        -> Result<Self::Program>;

    /// Surface size in physical pixels, fixed for the process lifetime.
    fn surface_size(&self) -> (u32, u32);

    /// Sets the presentation sync interval (0 = present immediately).
    fn set_sync_interval(&mut self, interval: u32);

    /// Acquires the next back buffer and creates its color attachment view.
    ///
    /// A no-op if a back buffer is already held.
    fn begin_frame(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport);

    fn set_raster_state(&mut self, state: RasterState);

    /// Clears the held back buffer's color attachment.
    fn clear(&mut self, color: Color) -> Result<()>;

    fn bind_vertex_buffer(&mut self, slot: u32, buffer: &Self::Buffer, stride: u32, offset: u64);

    fn bind_index_buffer(&mut self, buffer: &Self::Buffer, format: IndexFormat, offset: u64);

    fn bind_constant_buffer(&mut self, stage: ShaderStage, slot: u32, buffer: &Self::Buffer);

    /// Binds the program's vertex stage, fragment stage and input layout.
    fn bind_program(&mut self, program: &Self::Program);

    fn set_topology(&mut self, topology: Topology);

    /// Issues an indexed draw with the currently bound state.
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32)
        -> Result<()>;

    /// Submits recorded work and presents the held back buffer.
    fn present(&mut self) -> Result<()>;
}
