//! CPU geometry and its GPU-side copy.

mod buffer;
mod set;
mod vertex;

pub use buffer::{GeometryBuffer, UpdatePolicy};
pub use set::GeometrySet;
pub use vertex::Vertex;
