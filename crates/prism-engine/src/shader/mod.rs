//! Shader compilation, input layouts, and per-draw parameters.

mod block;
mod compile;
mod layout;
mod params;
mod program;

pub use block::ShaderParameterBlock;
pub use compile::{CompiledShader, ShaderSource, UniformBinding, compile};
pub use layout::{InputElement, InputLayout, InputSignature, SignatureElement, VertexFormat};
pub use params::ShaderParameters;
pub use program::{PARAMETER_SLOT, ShaderProgram};
