//! Vertex input layout: declared elements checked against the vertex stage.

use crate::error::{RenderError, Result};

/// Format of one vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    Uint32,
    Sint32,
}

impl VertexFormat {
    /// Size in bytes.
    pub const fn size(self) -> u32 {
        match self {
            VertexFormat::Float32 | VertexFormat::Uint32 | VertexFormat::Sint32 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

impl From<VertexFormat> for wgpu::VertexFormat {
    fn from(f: VertexFormat) -> Self {
        match f {
            VertexFormat::Float32 => wgpu::VertexFormat::Float32,
            VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
            VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
            VertexFormat::Uint32 => wgpu::VertexFormat::Uint32,
            VertexFormat::Sint32 => wgpu::VertexFormat::Sint32,
        }
    }
}

/// A caller-declared vertex attribute.
///
/// `name` is compared case-insensitively with the shader's input name, so
/// `POSITION` matches a WGSL member called `position`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InputElement {
    pub name: &'static str,
    pub format: VertexFormat,
    /// Byte offset inside the vertex record.
    pub offset: u32,
    /// `@location` of the matching vertex-stage input.
    pub location: u32,
}

/// One input the vertex stage expects, as reflected from the shader.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignatureElement {
    pub name: String,
    pub location: u32,
    pub format: VertexFormat,
}

/// Everything the vertex stage reads from vertex buffers.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct InputSignature {
    pub elements: Vec<SignatureElement>,
}

impl InputSignature {
    pub fn find(&self, location: u32) -> Option<&SignatureElement> {
        self.elements.iter().find(|e| e.location == location)
    }
}

/// A validated input layout: declared elements that exactly cover the
/// vertex stage's signature and fit inside a record of `stride` bytes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InputLayout {
    elements: Vec<InputElement>,
    stride: u32,
}

impl InputLayout {
    pub fn new(elements: &[InputElement], stride: u32, signature: &InputSignature) -> Result<Self> {
        if elements.is_empty() {
            return Err(mismatch("no input elements declared".to_owned()));
        }

        let mut by_offset = elements.to_vec();
        by_offset.sort_by_key(|e| e.offset);
        let mut end = 0;
        for e in &by_offset {
            if e.offset < end {
                return Err(mismatch(format!("element '{}' overlaps the previous element", e.name)));
            }
            end = e.offset + e.format.size();
            if end > stride {
                return Err(mismatch(format!(
                    "element '{}' ends at byte {end}, past the {stride}-byte vertex record",
                    e.name
                )));
            }
        }

        for (i, e) in elements.iter().enumerate() {
            if elements[..i].iter().any(|prev| prev.location == e.location) {
                return Err(mismatch(format!("location {} declared twice", e.location)));
            }

            let Some(input) = signature.find(e.location) else {
                return Err(mismatch(format!(
                    "element '{}' at location {} is not read by the vertex stage",
                    e.name, e.location
                )));
            };
            if !input.name.eq_ignore_ascii_case(e.name) {
                return Err(mismatch(format!(
                    "location {} is '{}' in the shader but declared as '{}'",
                    e.location, input.name, e.name
                )));
            }
            if input.format != e.format {
                return Err(mismatch(format!(
                    "element '{}' declared as {:?} but the shader expects {:?}",
                    e.name, e.format, input.format
                )));
            }
        }

        if let Some(missing) = signature
            .elements
            .iter()
            .find(|s| !elements.iter().any(|e| e.location == s.location))
        {
            return Err(mismatch(format!(
                "vertex stage input '{}' at location {} has no declared element",
                missing.name, missing.location
            )));
        }

        Ok(Self {
            elements: elements.to_vec(),
            stride,
        })
    }

    pub fn elements(&self) -> &[InputElement] {
        &self.elements
    }

    /// Size of one vertex record in bytes.
    pub fn stride(&self) -> u32 {
        self.stride
    }
}

fn mismatch(msg: String) -> RenderError {
    RenderError::LayoutMismatch(msg)
}
