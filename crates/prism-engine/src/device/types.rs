//! Backend-neutral descriptors for buffers and pipeline state.

/// Which pipeline stage input a buffer feeds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Constant,
}

/// Host access policy of a buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    /// Contents are fixed at creation; the host cannot map it.
    Immutable,
    /// Host writable through a write mapping, never readable.
    Dynamic,
}

/// Parameters for [`GpuDevice::create_buffer`](super::GpuDevice::create_buffer).
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub kind: BufferKind,
    pub usage: BufferUsage,
    /// Size in bytes. Must be non-zero.
    pub size: u64,
    /// Initial contents. Required for immutable buffers; when present its
    /// length must equal `size`.
    pub contents: Option<&'a [u8]>,
}

/// Host mapping mode for buffer writes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MapMode {
    /// Previous contents are abandoned instead of waited on. The host never
    /// blocks on draws still reading the old data.
    WriteDiscard,
}

/// Element format of a bound index buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum IndexFormat {
    Uint16,
}

impl IndexFormat {
    pub const fn size(self) -> u64 {
        match self {
            IndexFormat::Uint16 => 2,
        }
    }
}

impl From<IndexFormat> for wgpu::IndexFormat {
    fn from(f: IndexFormat) -> Self {
        match f {
            IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
        }
    }
}

/// Programmable pipeline stage a constant buffer is attached to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Primitive assembly mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
    LineList,
}

impl From<Topology> for wgpu::PrimitiveTopology {
    fn from(t: Topology) -> Self {
        match t {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            Topology::LineList => wgpu::PrimitiveTopology::LineList,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum CullMode {
    #[default]
    None,
    Front,
    Back,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum FrontFace {
    #[default]
    Ccw,
    Cw,
}

/// Fixed-function rasterizer configuration.
///
/// The default disables culling, so geometry shows regardless of winding.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct RasterState {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
}

impl RasterState {
    pub(crate) fn to_wgpu(self) -> (Option<wgpu::Face>, wgpu::FrontFace) {
        let cull = match self.cull_mode {
            CullMode::None => None,
            CullMode::Front => Some(wgpu::Face::Front),
            CullMode::Back => Some(wgpu::Face::Back),
        };
        let front = match self.front_face {
            FrontFace::Ccw => wgpu::FrontFace::Ccw,
            FrontFace::Cw => wgpu::FrontFace::Cw,
        };
        (cull, front)
    }
}
