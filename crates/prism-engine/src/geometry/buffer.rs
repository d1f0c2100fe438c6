use crate::device::{BufferDesc, BufferKind, BufferUsage, GpuDevice, IndexFormat, MapMode};
use crate::error::Result;

use super::{GeometrySet, Vertex};

/// How [`GeometryBuffer::update`] brings GPU buffers in line with the CPU arrays.
///
/// `Recreate` releases and reallocates an immutable buffer on every update:
/// no mapping, but one allocation and one release per buffer per frame.
/// `Refresh` allocates a host-writable buffer once and afterwards copies
/// through a write mapping, reallocating only when the byte size changes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum UpdatePolicy {
    Recreate,
    #[default]
    Refresh,
}

impl UpdatePolicy {
    fn usage(self) -> BufferUsage {
        match self {
            UpdatePolicy::Recreate => BufferUsage::Immutable,
            UpdatePolicy::Refresh => BufferUsage::Dynamic,
        }
    }
}

struct Slot<B> {
    buffer: B,
    size: u64,
    usage: BufferUsage,
}

/// GPU copy of a [`GeometrySet`], bound for the next indexed draw.
///
/// Each buffer handle has exactly one owner, this struct. Replacing one drops
/// the old handle (releasing it) before the new allocation is made.
pub struct GeometryBuffer<D: GpuDevice> {
    label: String,
    policy: UpdatePolicy,
    vertices: Option<Slot<D::Buffer>>,
    indices: Option<Slot<D::Buffer>>,
    index_count: u32,
}

impl<D: GpuDevice> GeometryBuffer<D> {
    pub fn new(label: &str, policy: UpdatePolicy) -> Self {
        Self {
            label: label.to_owned(),
            policy,
            vertices: None,
            indices: None,
            index_count: 0,
        }
    }

    pub fn policy(&self) -> UpdatePolicy {
        self.policy
    }

    /// Switches policy. Takes effect on the next update, which reallocates
    /// since existing buffers were created for the old policy.
    pub fn set_policy(&mut self, policy: UpdatePolicy) {
        if policy != self.policy {
            log::debug!("geometry '{}': policy {:?} -> {policy:?}", self.label, self.policy);
            self.policy = policy;
        }
    }

    /// Number of indices uploaded by the last successful update.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Uploads `geometry` and binds both buffers.
    ///
    /// Indices are validated before any device call. Handles bound by a
    /// previous update may be released here and must not be used again.
    pub fn update(&mut self, device: &mut D, geometry: &GeometrySet) -> Result<()> {
        geometry.validate()?;

        let vertex_label = format!("{} vertices", self.label);
        let index_label = format!("{} indices", self.label);
        upload(
            &*device,
            &mut self.vertices,
            self.policy,
            BufferKind::Vertex,
            &vertex_label,
            geometry.vertex_bytes(),
        )?;
        upload(
            &*device,
            &mut self.indices,
            self.policy,
            BufferKind::Index,
            &index_label,
            geometry.index_bytes(),
        )?;
        self.index_count = geometry.index_count();

        self.bind(device);
        Ok(())
    }

    /// Binds the current buffers: vertices at slot 0 with the vertex stride,
    /// indices as 16-bit values, both at offset 0.
    pub fn bind(&self, device: &mut D) {
        if let Some(slot) = &self.vertices {
            device.bind_vertex_buffer(0, &slot.buffer, Vertex::STRIDE, 0);
        }
        if let Some(slot) = &self.indices {
            device.bind_index_buffer(&slot.buffer, IndexFormat::Uint16, 0);
        }
    }
}

fn upload<D: GpuDevice>(
    device: &D,
    slot: &mut Option<Slot<D::Buffer>>,
    policy: UpdatePolicy,
    kind: BufferKind,
    label: &str,
    bytes: &[u8],
) -> Result<()> {
    let size = bytes.len() as u64;
    let usage = policy.usage();

    if let Some(existing) = slot.as_ref() {
        if usage == BufferUsage::Dynamic && existing.usage == usage && existing.size == size {
            return device.write_buffer(&existing.buffer, MapMode::WriteDiscard, bytes);
        }
        if usage == BufferUsage::Dynamic {
            log::debug!("'{label}': size {} -> {size}, reallocating", existing.size);
        }
    }

    // Release before allocating; two live handles never coexist.
    *slot = None;

    let buffer = device.create_buffer(&BufferDesc {
        label,
        kind,
        usage,
        size,
        contents: Some(bytes),
    })?;
    *slot = Some(Slot {
        buffer,
        size,
        usage,
    });
    Ok(())
}
