use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use wgpu::util::DeviceExt;

use super::{
    BufferDesc, BufferKind, BufferUsage, Gpu, GpuDevice, GpuFrame, IndexFormat, MapMode,
    RasterState, ShaderStage, Topology,
};
use crate::coords::{Color, Viewport};
use crate::error::{RenderError, Result};
use crate::shader::{CompiledShader, InputLayout};

/// GPU buffer owned by a single component.
///
/// Dropping it drops the last host reference; wgpu frees the allocation once
/// in-flight submissions stop using it.
pub struct WgpuBuffer {
    raw: wgpu::Buffer,
    /// Requested size, before copy alignment padding.
    size: u64,
    label: String,
    usage: BufferUsage,
}

impl Drop for WgpuBuffer {
    fn drop(&mut self) {
        log::trace!("released buffer '{}' ({} bytes)", self.label, self.size);
    }
}

/// Shader module plus everything needed to build pipelines from it.
#[derive(Clone)]
pub struct WgpuProgram {
    id: u64,
    label: String,
    module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    attributes: Vec<wgpu::VertexAttribute>,
    stride: u32,
    /// `@binding` numbers of the group 0 uniforms.
    uniform_bindings: Vec<u32>,
}

/// Render pipelines differ only in the state folded into them.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    program: u64,
    topology: Topology,
    raster: RasterState,
    strip_index_format: Option<IndexFormat>,
}

#[derive(Default)]
struct Bound {
    program: Option<WgpuProgram>,
    vertex: BTreeMap<u32, (wgpu::Buffer, u32, u64)>,
    index: Option<(wgpu::Buffer, IndexFormat, u64)>,
    constants: HashMap<(ShaderStage, u32), wgpu::Buffer>,
    topology: Option<Topology>,
}

impl Bound {
    /// wgpu shares bindings between stages, so either stage's buffer serves.
    fn constant(&self, binding: u32) -> Option<&wgpu::Buffer> {
        self.constants
            .get(&(ShaderStage::Vertex, binding))
            .or_else(|| self.constants.get(&(ShaderStage::Fragment, binding)))
    }
}

/// Immediate-style execution context over wgpu.
///
/// Binds only record state. Each draw resolves the recorded state into a
/// cached render pipeline plus a fresh bind group and records one render
/// pass that loads the current attachment contents.
///
/// Host writes made while a frame is open are recorded into the frame
/// encoder, so each pass reads the bytes written before it.
pub struct WgpuDevice<'w> {
    gpu: Gpu<'w>,
    frame: RefCell<Option<GpuFrame>>,
    cleared: bool,
    viewport: Option<Viewport>,
    raster: RasterState,
    bound: Bound,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    next_program: Cell<u64>,
}

impl<'w> WgpuDevice<'w> {
    pub fn new(gpu: Gpu<'w>) -> Self {
        Self {
            gpu,
            frame: RefCell::new(None),
            cleared: false,
            viewport: None,
            raster: RasterState::default(),
            bound: Bound::default(),
            pipelines: HashMap::new(),
            next_program: Cell::new(0),
        }
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    fn pipeline(&mut self, program: &WgpuProgram, topology: Topology) -> wgpu::RenderPipeline {
        let strip_index_format = match topology {
            Topology::TriangleStrip => self.bound.index.as_ref().map(|(_, f, _)| *f),
            _ => None,
        };
        let key = PipelineKey {
            program: program.id,
            topology,
            raster: self.raster,
            strip_index_format,
        };
        if let Some(p) = self.pipelines.get(&key) {
            return p.clone();
        }

        let (cull_mode, front_face) = self.raster.to_wgpu();
        let buffers = [wgpu::VertexBufferLayout {
            array_stride: u64::from(program.stride),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &program.attributes,
        }];

        let pipeline = self
            .gpu
            .device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(program.label.as_str()),
                // Derived from the module; group 0 holds the uniforms.
                layout: None,
                vertex: wgpu::VertexState {
                    module: &program.module,
                    entry_point: Some(program.vertex_entry.as_str()),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.module,
                    entry_point: Some(program.fragment_entry.as_str()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.gpu.surface_format(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: topology.into(),
                    strip_index_format: strip_index_format.map(Into::into),
                    front_face,
                    cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!("built pipeline for {key:?}");
        self.pipelines.insert(key, pipeline.clone());
        pipeline
    }
}

fn buffer_usages(kind: BufferKind, usage: BufferUsage) -> wgpu::BufferUsages {
    let base = match kind {
        BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
        BufferKind::Index => wgpu::BufferUsages::INDEX,
        BufferKind::Constant => wgpu::BufferUsages::UNIFORM,
    };
    match usage {
        BufferUsage::Immutable => base,
        BufferUsage::Dynamic => base | wgpu::BufferUsages::COPY_DST,
    }
}

fn padded(size: u64) -> u64 {
    size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

/// Copies `bytes` to offset 0 of `dst`.
///
/// With an encoder the copy goes through a staging buffer and lands after
/// the commands already recorded in it. Without one, the queue applies the
/// write before its next submission.
fn record_write(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    encoder: Option<&mut wgpu::CommandEncoder>,
    dst: &wgpu::Buffer,
    bytes: &[u8],
) {
    let mut staged = bytes.to_vec();
    staged.resize(padded(bytes.len() as u64) as usize, 0);

    match encoder {
        Some(encoder) => {
            let staging = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("prism staging"),
                contents: &staged,
                usage: wgpu::BufferUsages::COPY_SRC,
            });
            encoder.copy_buffer_to_buffer(&staging, 0, dst, 0, staged.len() as u64);
        }
        None => queue.write_buffer(dst, 0, &staged),
    }
}

impl GpuDevice for WgpuDevice<'_> {
    type Buffer = WgpuBuffer;
    type Program = WgpuProgram;

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<WgpuBuffer> {
        if desc.size == 0 {
            return Err(RenderError::resource(desc.label, "zero-sized buffer"));
        }
        let limit = self.gpu.device().limits().max_buffer_size;
        if padded(desc.size) > limit {
            return Err(RenderError::resource(
                desc.label,
                format!("{} bytes exceeds the device limit of {limit}", desc.size),
            ));
        }

        let usage = buffer_usages(desc.kind, desc.usage);
        let device = self.gpu.device();
        let raw = match desc.contents {
            Some(c) if c.len() as u64 != desc.size => {
                return Err(RenderError::resource(
                    desc.label,
                    format!("{} bytes of contents for a {} byte buffer", c.len(), desc.size),
                ));
            }
            Some(c) => device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(desc.label),
                contents: c,
                usage,
            }),
            None if desc.usage == BufferUsage::Immutable => {
                return Err(RenderError::resource(
                    desc.label,
                    "immutable buffer created without contents",
                ));
            }
            None => device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(desc.label),
                size: padded(desc.size),
                usage,
                mapped_at_creation: false,
            }),
        };

        log::trace!("created buffer '{}' ({} bytes, {:?})", desc.label, desc.size, desc.usage);
        Ok(WgpuBuffer {
            raw,
            size: desc.size,
            label: desc.label.to_owned(),
            usage: desc.usage,
        })
    }

    fn write_buffer(&self, buffer: &WgpuBuffer, mode: MapMode, bytes: &[u8]) -> Result<()> {
        if buffer.usage != BufferUsage::Dynamic {
            return Err(RenderError::mapping(&buffer.label, "buffer is not host writable"));
        }
        if bytes.len() as u64 > buffer.size {
            return Err(RenderError::mapping(
                &buffer.label,
                format!("{} byte write into a {} byte buffer", bytes.len(), buffer.size),
            ));
        }

        match mode {
            // Staged, so the host never waits on draws still reading the
            // previous contents.
            MapMode::WriteDiscard => {
                let mut frame = self.frame.borrow_mut();
                record_write(
                    self.gpu.device(),
                    self.gpu.queue(),
                    frame.as_mut().map(|f| &mut f.encoder),
                    &buffer.raw,
                    bytes,
                );
            }
        }
        Ok(())
    }

    fn create_program(&self, shader: &CompiledShader, layout: &InputLayout) -> Result<WgpuProgram> {
        let module = self
            .gpu
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(shader.label.as_str()),
                source: wgpu::ShaderSource::Wgsl(shader.source.clone().into()),
            });

        let attributes = layout
            .elements()
            .iter()
            .map(|e| wgpu::VertexAttribute {
                format: e.format.into(),
                offset: u64::from(e.offset),
                shader_location: e.location,
            })
            .collect();

        let id = self.next_program.get() + 1;
        self.next_program.set(id);

        Ok(WgpuProgram {
            id,
            label: shader.label.clone(),
            module,
            vertex_entry: shader.vertex_entry.clone(),
            fragment_entry: shader.fragment_entry.clone(),
            attributes,
            stride: layout.stride(),
            uniform_bindings: shader.uniforms.iter().map(|u| u.binding).collect(),
        })
    }

    fn surface_size(&self) -> (u32, u32) {
        self.gpu.size()
    }

    fn set_sync_interval(&mut self, interval: u32) {
        self.gpu.set_sync_interval(interval);
    }

    fn begin_frame(&mut self) -> Result<()> {
        if self.frame.get_mut().is_some() {
            return Ok(());
        }
        let frame = self
            .gpu
            .begin_frame()
            .map_err(|e| RenderError::resource("back buffer", e.to_string()))?;
        *self.frame.get_mut() = Some(frame);
        self.cleared = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    fn set_raster_state(&mut self, state: RasterState) {
        self.raster = state;
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        let frame = self
            .frame
            .get_mut()
            .as_mut()
            .ok_or(RenderError::IncompleteBinding("an acquired back buffer"))?;

        let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prism clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color.into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        self.cleared = true;
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, slot: u32, buffer: &WgpuBuffer, stride: u32, offset: u64) {
        self.bound.vertex.insert(slot, (buffer.raw.clone(), stride, offset));
    }

    fn bind_index_buffer(&mut self, buffer: &WgpuBuffer, format: IndexFormat, offset: u64) {
        self.bound.index = Some((buffer.raw.clone(), format, offset));
    }

    fn bind_constant_buffer(&mut self, stage: ShaderStage, slot: u32, buffer: &WgpuBuffer) {
        self.bound.constants.insert((stage, slot), buffer.raw.clone());
    }

    fn bind_program(&mut self, program: &WgpuProgram) {
        self.bound.program = Some(program.clone());
    }

    fn set_topology(&mut self, topology: Topology) {
        self.bound.topology = Some(topology);
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) -> Result<()> {
        let missing = RenderError::IncompleteBinding;
        if self.frame.get_mut().is_none() || !self.cleared {
            return Err(missing("a cleared color attachment"));
        }
        let program = self.bound.program.clone().ok_or(missing("a shader program"))?;
        let topology = self.bound.topology.ok_or(missing("a primitive topology"))?;
        let (vertex, stride, vertex_offset) =
            self.bound.vertex.get(&0).cloned().ok_or(missing("a vertex buffer"))?;
        let (index, format, index_offset) =
            self.bound.index.clone().ok_or(missing("an index buffer"))?;

        if stride != program.stride {
            return Err(RenderError::LayoutMismatch(format!(
                "vertex buffer stride {stride} does not match program '{}' stride {}",
                program.label, program.stride
            )));
        }

        let pipeline = self.pipeline(&program, topology);

        let bind_group = if program.uniform_bindings.is_empty() {
            None
        } else {
            let entries = program
                .uniform_bindings
                .iter()
                .map(|&binding| {
                    let buffer = self.bound.constant(binding).ok_or(missing("a constant buffer"))?;
                    Ok(wgpu::BindGroupEntry {
                        binding,
                        resource: buffer.as_entire_binding(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Some(self.gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("prism constants"),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &entries,
            }))
        };

        let Some(frame) = self.frame.get_mut().as_mut() else {
            return Err(missing("an acquired back buffer"));
        };
        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prism draw pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if let Some(v) = self.viewport.filter(|v| v.is_valid()) {
            pass.set_viewport(v.x, v.y, v.width, v.height, v.min_depth, v.max_depth);
        }
        pass.set_pipeline(&pipeline);
        if let Some(bind_group) = &bind_group {
            pass.set_bind_group(0, bind_group, &[]);
        }
        pass.set_vertex_buffer(0, vertex.slice(vertex_offset..));
        pass.set_index_buffer(index.slice(index_offset..), format.into());
        pass.draw_indexed(first_index..first_index + index_count, base_vertex, 0..1);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        let frame = self
            .frame
            .get_mut()
            .take()
            .ok_or(RenderError::IncompleteBinding("an acquired back buffer"))?;
        self.gpu.present(frame);
        self.cleared = false;
        Ok(())
    }
}
