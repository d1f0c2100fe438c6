//! WGSL compilation and reflection.
//!
//! Sources are parsed and validated with naga before they reach the device,
//! so a broken shader surfaces as `ShaderCompilation` with the compiler's
//! diagnostics instead of a device-level validation failure.

use std::borrow::Cow;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::layout::{InputSignature, SignatureElement, VertexFormat};
use crate::error::{RenderError, Result};

/// WGSL shader text plus the entry points to compile.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub label: String,
    pub code: Cow<'static, str>,
    pub vertex_entry: String,
    pub fragment_entry: String,
}

impl ShaderSource {
    /// WGSL source with the conventional `vs_main` / `fs_main` entry points.
    pub fn wgsl(label: impl Into<String>, code: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            code: code.into(),
            vertex_entry: "vs_main".to_owned(),
            fragment_entry: "fs_main".to_owned(),
        }
    }

    /// The bundled colored-primitive shader.
    pub fn primitive() -> Self {
        Self::wgsl("primitive", include_str!("primitive.wgsl"))
    }

    pub fn with_entry_points(mut self, vertex: &str, fragment: &str) -> Self {
        self.vertex_entry = vertex.to_owned();
        self.fragment_entry = fragment.to_owned();
        self
    }
}

/// A uniform buffer binding declared by the shader.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformBinding {
    pub name: Option<String>,
    pub group: u32,
    pub binding: u32,
    /// Size of the bound type in bytes.
    pub size: u32,
}

/// A validated shader with its reflected interface.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    pub label: String,
    pub source: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Inputs of the vertex entry point.
    pub signature: InputSignature,
    /// Uniform buffers declared in bind group 0.
    pub uniforms: Vec<UniformBinding>,
}

impl CompiledShader {
    pub fn uniform(&self, binding: u32) -> Option<&UniformBinding> {
        self.uniforms.iter().find(|u| u.binding == binding)
    }
}

/// Parses, validates and reflects `source`.
pub fn compile(source: &ShaderSource) -> Result<CompiledShader> {
    let failed = |diagnostics: String| RenderError::ShaderCompilation {
        label: source.label.clone(),
        diagnostics,
    };

    let module = naga::front::wgsl::parse_str(&source.code)
        .map_err(|e| failed(e.emit_to_string(&source.code)))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| failed(e.emit_to_string(&source.code)))?;

    let vertex = find_entry(&module, &source.vertex_entry, naga::ShaderStage::Vertex)
        .ok_or_else(|| failed(format!("vertex entry point '{}' not found", source.vertex_entry)))?;
    find_entry(&module, &source.fragment_entry, naga::ShaderStage::Fragment).ok_or_else(|| {
        failed(format!("fragment entry point '{}' not found", source.fragment_entry))
    })?;

    let signature = reflect_inputs(&module, &vertex.function)?;
    let uniforms = reflect_uniforms(&module)?;

    log::debug!(
        "compiled shader '{}': {} vertex inputs, {} uniform bindings",
        source.label,
        signature.elements.len(),
        uniforms.len()
    );

    Ok(CompiledShader {
        label: source.label.clone(),
        source: source.code.to_string(),
        vertex_entry: source.vertex_entry.clone(),
        fragment_entry: source.fragment_entry.clone(),
        signature,
        uniforms,
    })
}

fn find_entry<'m>(
    module: &'m naga::Module,
    name: &str,
    stage: naga::ShaderStage,
) -> Option<&'m naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == name && ep.stage == stage)
}

fn reflect_inputs(module: &naga::Module, function: &naga::Function) -> Result<InputSignature> {
    let mut signature = InputSignature::default();

    for arg in &function.arguments {
        match &arg.binding {
            Some(binding) => {
                push_input(module, &mut signature, arg.name.as_deref(), arg.ty, binding)?
            }
            // Unbound arguments are structs whose members carry the bindings.
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    for member in members {
                        if let Some(binding) = &member.binding {
                            let name = member.name.as_deref();
                            push_input(module, &mut signature, name, member.ty, binding)?;
                        }
                    }
                }
            }
        }
    }

    signature.elements.sort_by_key(|e| e.location);
    Ok(signature)
}

fn push_input(
    module: &naga::Module,
    signature: &mut InputSignature,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: &naga::Binding,
) -> Result<()> {
    // Builtins such as vertex_index are not fed from vertex buffers.
    let naga::Binding::Location { location, .. } = binding else {
        return Ok(());
    };
    let name = name.unwrap_or_default();
    let format = vertex_format(&module.types[ty].inner).ok_or_else(|| {
        RenderError::LayoutMismatch(format!(
            "vertex input '{name}' at location {location} has a type vertex buffers cannot feed"
        ))
    })?;

    signature.elements.push(SignatureElement {
        name: name.to_owned(),
        location: *location,
        format,
    });
    Ok(())
}

fn vertex_format(inner: &naga::TypeInner) -> Option<VertexFormat> {
    use naga::{ScalarKind, TypeInner, VectorSize};

    match *inner {
        TypeInner::Scalar(scalar) if scalar.width == 4 => match scalar.kind {
            ScalarKind::Float => Some(VertexFormat::Float32),
            ScalarKind::Uint => Some(VertexFormat::Uint32),
            ScalarKind::Sint => Some(VertexFormat::Sint32),
            _ => None,
        },
        TypeInner::Vector { size, scalar }
            if scalar.kind == ScalarKind::Float && scalar.width == 4 =>
        {
            Some(match size {
                VectorSize::Bi => VertexFormat::Float32x2,
                VectorSize::Tri => VertexFormat::Float32x3,
                VectorSize::Quad => VertexFormat::Float32x4,
            })
        }
        _ => None,
    }
}

fn reflect_uniforms(module: &naga::Module) -> Result<Vec<UniformBinding>> {
    let mut uniforms = Vec::new();

    for (_, global) in module.global_variables.iter() {
        if global.space != naga::AddressSpace::Uniform {
            continue;
        }
        let Some(binding) = &global.binding else { continue };
        if binding.group != 0 {
            return Err(RenderError::LayoutMismatch(format!(
                "uniform '{}' is in bind group {}; only group 0 is supported",
                global.name.as_deref().unwrap_or_default(),
                binding.group
            )));
        }
        uniforms.push(UniformBinding {
            name: global.name.clone(),
            group: binding.group,
            binding: binding.binding,
            size: module.types[global.ty].inner.size(module.to_ctx()),
        });
    }

    uniforms.sort_by_key(|u| u.binding);
    Ok(uniforms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_shader_reflects_position_and_color() {
        let compiled = compile(&ShaderSource::primitive()).unwrap();
        let names: Vec<_> = compiled
            .signature
            .elements
            .iter()
            .map(|e| (e.name.as_str(), e.location, e.format))
            .collect();
        assert_eq!(
            names,
            [
                ("position", 0, VertexFormat::Float32x4),
                ("color", 1, VertexFormat::Float32x4),
            ]
        );
    }

    #[test]
    fn primitive_shader_declares_a_64_byte_parameter_block() {
        let compiled = compile(&ShaderSource::primitive()).unwrap();
        let params = compiled.uniform(0).unwrap();
        assert_eq!(params.size, 64);
        assert_eq!(params.name.as_deref(), Some("params"));
    }

    #[test]
    fn syntax_error_carries_diagnostics() {
        let source = ShaderSource::wgsl("broken", "@vertex fn vs_main( -> {");
        match compile(&source) {
            Err(RenderError::ShaderCompilation { label, diagnostics }) => {
                assert_eq!(label, "broken");
                assert!(!diagnostics.is_empty());
            }
            other => panic!("expected ShaderCompilation, got {other:?}"),
        }
    }

    #[test]
    fn missing_entry_point_is_a_compilation_error() {
        let source = ShaderSource::primitive().with_entry_points("VS", "fs_main");
        match compile(&source) {
            Err(RenderError::ShaderCompilation { diagnostics, .. }) => {
                assert!(diagnostics.contains("'VS'"));
            }
            other => panic!("expected ShaderCompilation, got {other:?}"),
        }
    }

    #[test]
    fn uniform_outside_group_zero_is_rejected() {
        let code = include_str!("primitive.wgsl").replace("@group(0)", "@group(1)");
        let source = ShaderSource::wgsl("group1", code);
        assert!(matches!(compile(&source), Err(RenderError::LayoutMismatch(_))));
    }
}
