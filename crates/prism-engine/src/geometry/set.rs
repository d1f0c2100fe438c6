use crate::error::{RenderError, Result};

use super::Vertex;

/// Vertices plus the 16-bit indices that connect them into primitives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometrySet {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl GeometrySet {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }

    /// Checks that every index refers to an existing vertex.
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertices.len();
        match self
            .indices
            .iter()
            .enumerate()
            .find(|(_, i)| **i as usize >= vertex_count)
        {
            Some((position, &index)) => Err(RenderError::InvalidGeometry {
                index: index as u32,
                position,
                vertex_count,
            }),
            None => Ok(()),
        }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}
