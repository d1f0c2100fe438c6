//! Error types for the rendering core.
//!
//! Every variant is fatal for the render loop: none of them describe a
//! transient condition, so nothing in the core retries.

use thiserror::Error;

/// Failure raised by the rendering core.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The device refused a buffer, view, or back-buffer allocation.
    #[error("failed to create {resource}: {reason}")]
    ResourceCreation {
        /// What was being allocated (buffer label, "back buffer", ...).
        resource: String,
        /// Why the device refused it.
        reason: String,
    },

    /// WGSL parsing/validation failed or an entry point is missing.
    #[error("shader compilation failed for '{label}':\n{diagnostics}")]
    ShaderCompilation {
        label: String,
        /// Compiler output, formatted against the source text.
        diagnostics: String,
    },

    /// A write mapping of a buffer was refused.
    #[error("mapping refused for buffer '{label}': {reason}")]
    Mapping { label: String, reason: String },

    /// A declared record or input layout disagrees with the shader or buffer.
    #[error("layout mismatch: {0}")]
    LayoutMismatch(String),

    /// An index references a vertex that does not exist.
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    InvalidGeometry {
        index: u32,
        position: usize,
        vertex_count: usize,
    },

    /// A draw or present was issued with required pipeline state missing.
    #[error("missing pipeline state: {0}")]
    IncompleteBinding(&'static str),

    /// The render loop already stopped on a fatal error.
    #[error("render loop halted after a fatal error")]
    Halted,
}

impl RenderError {
    pub(crate) fn resource(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResourceCreation {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mapping(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Mapping {
            label: label.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, RenderError>;
