use bytemuck::{Pod, Zeroable};

use crate::coords::Color;
use crate::shader::{InputElement, VertexFormat};

/// One vertex: homogeneous position followed by an RGBA color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<Vertex>() == 32);

impl Vertex {
    /// Byte size of one record, and the stride every vertex buffer is bound with.
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;

    /// Input layout contract for this record.
    pub const INPUT_ELEMENTS: [InputElement; 2] = [
        InputElement {
            name: "POSITION",
            format: VertexFormat::Float32x4,
            offset: 0,
            location: 0,
        },
        InputElement {
            name: "COLOR",
            format: VertexFormat::Float32x4,
            offset: 16,
            location: 1,
        },
    ];

    #[inline]
    pub const fn new(position: [f32; 4], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    /// A point at `(x, y, 0, 1)` with `color`.
    #[inline]
    pub const fn at(x: f32, y: f32, color: Color) -> Self {
        Self::new([x, y, 0.0, 1.0], color.to_array())
    }
}
