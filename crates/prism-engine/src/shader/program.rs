use glam::Mat4;

use super::compile::{ShaderSource, compile};
use super::layout::{InputElement, InputLayout};
use super::{ShaderParameterBlock, ShaderParameters};
use crate::device::{GpuDevice, ShaderStage, Topology};
use crate::error::{RenderError, Result};
use crate::geometry::Vertex;

/// Vertex-stage constant slot (`@group(0) @binding(N)`) holding [`ShaderParameters`].
pub const PARAMETER_SLOT: u32 = 0;

/// Compiled vertex + fragment stages, their input layout, and the parameter
/// block feeding them.
///
/// `draw` only pushes parameters and pipeline state. Vertex and index
/// buffers must already be bound, see [`GeometryBuffer`](crate::geometry::GeometryBuffer).
pub struct ShaderProgram<D: GpuDevice> {
    label: String,
    program: D::Program,
    layout: InputLayout,
    parameters: ShaderParameterBlock<D>,
}

impl<D: GpuDevice> ShaderProgram<D> {
    /// Compiles `source` and builds its input layout from `elements`.
    ///
    /// Fails with `ShaderCompilation` on compiler errors and with
    /// `LayoutMismatch` when `elements` or the shader's parameter block
    /// disagree with the vertex record and [`ShaderParameters`].
    pub fn load(device: &D, source: &ShaderSource, elements: &[InputElement]) -> Result<Self> {
        let compiled = compile(source)?;
        let layout = InputLayout::new(elements, Vertex::STRIDE, &compiled.signature)?;

        let expected = std::mem::size_of::<ShaderParameters>() as u32;
        match compiled.uniform(PARAMETER_SLOT) {
            Some(u) if u.size == expected => {}
            Some(u) => {
                return Err(RenderError::LayoutMismatch(format!(
                    "shader parameter block is {} bytes, host record is {expected}",
                    u.size
                )));
            }
            None => {
                return Err(RenderError::LayoutMismatch(format!(
                    "shader '{}' has no uniform at @group(0) @binding({PARAMETER_SLOT})",
                    source.label
                )));
            }
        }

        let program = device.create_program(&compiled, &layout)?;
        let parameters = ShaderParameterBlock::new::<ShaderParameters>(
            device,
            &format!("{} parameters", source.label),
        )?;

        log::info!("shader program '{}' loaded", source.label);
        Ok(Self {
            label: source.label.clone(),
            program,
            layout,
            parameters,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn input_layout(&self) -> &InputLayout {
        &self.layout
    }

    pub fn parameters(&self) -> &ShaderParameterBlock<D> {
        &self.parameters
    }

    /// Binds the parameter block, both stages, the input layout and the
    /// triangle-list topology.
    pub fn bind(&self, device: &mut D) {
        self.parameters.bind(device, ShaderStage::Vertex, PARAMETER_SLOT);
        device.bind_program(&self.program);
        device.set_topology(Topology::TriangleList);
    }

    /// Writes `transform` to the parameter block, binds the pipeline and
    /// draws `index_count` indices from the bound index buffer.
    ///
    /// `transform` must be column-major.
    pub fn draw(&mut self, device: &mut D, transform: Mat4, index_count: u32) -> Result<()> {
        self.parameters.write(device, &ShaderParameters::new(transform))?;
        self.bind(device);
        device.draw_indexed(index_count, 0, 0)
    }
}
