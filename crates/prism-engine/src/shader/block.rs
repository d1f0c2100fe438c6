use bytemuck::Pod;

use crate::device::{BufferDesc, BufferKind, BufferUsage, GpuDevice, MapMode, ShaderStage};
use crate::error::{RenderError, Result};

/// A fixed-size constant buffer written once per draw.
///
/// Writes go through a write-discard mapping: the previous contents are
/// abandoned, so the host never waits for draws still reading them. Each
/// write replaces the whole buffer in one copy; a draw sees either the
/// previous record or the new one, never a mix.
///
/// Constant buffers are not cleared between frames. Binding without a new
/// write re-exposes the last written record.
pub struct ShaderParameterBlock<D: GpuDevice> {
    label: String,
    buffer: D::Buffer,
    size: u64,
    writes: u64,
}

impl<D: GpuDevice> ShaderParameterBlock<D> {
    /// Creates a block sized for the record type `P`.
    pub fn new<P: Pod>(device: &D, label: &str) -> Result<Self> {
        Self::with_size(device, label, std::mem::size_of::<P>() as u64)
    }

    /// Creates a block with an explicit byte size.
    pub fn with_size(device: &D, label: &str, size: u64) -> Result<Self> {
        let buffer = device.create_buffer(&BufferDesc {
            label,
            kind: BufferKind::Constant,
            usage: BufferUsage::Dynamic,
            size,
            contents: None,
        })?;
        log::debug!("parameter block '{label}' created ({size} bytes)");

        Ok(Self {
            label: label.to_owned(),
            buffer,
            size,
            writes: 0,
        })
    }

    /// Declared size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Copies `params` into the buffer.
    ///
    /// Fails with `LayoutMismatch` before touching the buffer if the record
    /// size differs from the declared size.
    pub fn write<P: Pod>(&mut self, device: &D, params: &P) -> Result<()> {
        let bytes = bytemuck::bytes_of(params);
        if bytes.len() as u64 != self.size {
            return Err(RenderError::LayoutMismatch(format!(
                "parameter record is {} bytes but block '{}' holds {}",
                bytes.len(),
                self.label,
                self.size
            )));
        }

        device.write_buffer(&self.buffer, MapMode::WriteDiscard, bytes)?;
        self.writes += 1;
        Ok(())
    }

    /// Attaches the buffer to `slot` of `stage`.
    pub fn bind(&self, device: &mut D, stage: ShaderStage, slot: u32) {
        device.bind_constant_buffer(stage, slot, &self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::{Call, MockDevice};
    use crate::shader::ShaderParameters;
    use glam::Mat4;

    fn block(device: &MockDevice) -> ShaderParameterBlock<MockDevice> {
        ShaderParameterBlock::new::<ShaderParameters>(device, "params").unwrap()
    }

    #[test]
    fn created_as_a_host_writable_constant_buffer() {
        let device = MockDevice::new(800, 600);
        let block = block(&device);
        assert_eq!(block.size(), 64);
        assert!(device.calls().contains(&Call::CreateBuffer {
            id: 1,
            kind: BufferKind::Constant,
            usage: BufferUsage::Dynamic,
            size: 64,
        }));
    }

    #[test]
    fn write_uses_one_discard_mapping() {
        let device = MockDevice::new(800, 600);
        let mut block = block(&device);
        let params = ShaderParameters::new(Mat4::from_scale(glam::vec3(2.0, 2.0, 1.0)));

        block.write(&device, &params).unwrap();

        let writes: Vec<_> = device
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::WriteBuffer { .. }))
            .collect();
        assert_eq!(writes, [Call::WriteBuffer { id: 1, mode: MapMode::WriteDiscard, len: 64 }]);
        assert_eq!(device.buffer_contents(1).unwrap(), bytemuck::bytes_of(&params));
        assert_eq!(block.writes(), 1);
    }

    #[test]
    fn wrong_record_size_is_a_layout_mismatch() {
        use bytemuck::Zeroable;

        #[repr(C)]
        #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
        struct Oversized {
            transformation: [[f32; 4]; 4],
            extra: [f32; 4],
        }

        let device = MockDevice::new(800, 600);
        let mut block = block(&device);
        let before = device.buffer_contents(1).unwrap();

        let err = block.write(&device, &Oversized::zeroed()).unwrap_err();

        assert!(matches!(err, RenderError::LayoutMismatch(_)));
        assert_eq!(device.buffer_contents(1).unwrap(), before);
        assert!(!device.calls().iter().any(|c| matches!(c, Call::WriteBuffer { .. })));
    }

    #[test]
    fn refused_mapping_surfaces_as_mapping_error() {
        let device = MockDevice::new(800, 600);
        let mut block = block(&device);
        device.refuse_mappings(true);

        let err = block.write(&device, &ShaderParameters::default()).unwrap_err();
        assert!(matches!(err, RenderError::Mapping { .. }));
        assert_eq!(block.writes(), 0);
    }

    #[test]
    fn bind_attaches_to_the_requested_stage_slot() {
        let mut device = MockDevice::new(800, 600);
        let block = block(&device);
        block.bind(&mut device, ShaderStage::Vertex, 0);
        assert!(device.calls().contains(&Call::BindConstant {
            stage: ShaderStage::Vertex,
            slot: 0,
            id: 1,
        }));
    }
}
