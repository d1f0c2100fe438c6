//! Recording device for tests.
//!
//! Keeps buffer contents on the CPU, logs every call, and snapshots the bound
//! vertex, index and constant bytes at each draw so tests can check what a
//! real GPU would have read.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::{
    BufferDesc, BufferKind, BufferUsage, GpuDevice, IndexFormat, MapMode, RasterState,
    ShaderStage, Topology,
};
use crate::coords::{Color, Viewport};
use crate::error::{RenderError, Result};
use crate::geometry::Vertex;
use crate::shader::{CompiledShader, InputLayout, ShaderParameters};

const MAX_BUFFER_SIZE: u64 = 1 << 28;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateBuffer {
        id: u64,
        kind: BufferKind,
        usage: BufferUsage,
        size: u64,
    },
    ReleaseBuffer(u64),
    WriteBuffer {
        id: u64,
        mode: MapMode,
        len: usize,
    },
    CreateProgram(u64),
    SetSyncInterval(u32),
    BeginFrame,
    SetViewport(Viewport),
    SetRasterState(RasterState),
    Clear(Color),
    BindVertex {
        slot: u32,
        id: u64,
        stride: u32,
        offset: u64,
    },
    BindIndex {
        id: u64,
        format: IndexFormat,
        offset: u64,
    },
    BindConstant {
        stage: ShaderStage,
        slot: u32,
        id: u64,
    },
    BindProgram(u64),
    SetTopology(Topology),
    DrawIndexed {
        count: u32,
        first: u32,
        base: i32,
    },
    Present,
}

/// What one indexed draw read from the bound state.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawSnapshot {
    pub program: u64,
    pub topology: Topology,
    pub stride: u32,
    pub clear: Color,
    pub viewport: Option<Viewport>,
    pub vertex_bytes: Vec<u8>,
    /// Only the indices covered by the draw.
    pub indices: Vec<u16>,
    /// Contents of the vertex-stage constant buffer at slot 0.
    pub constants: Vec<u8>,
}

impl DrawSnapshot {
    pub fn vertices(&self) -> Vec<Vertex> {
        bytemuck::pod_collect_to_vec(&self.vertex_bytes)
    }

    pub fn parameters(&self) -> ShaderParameters {
        bytemuck::pod_read_unaligned(&self.constants)
    }
}

struct BufferData {
    label: String,
    usage: BufferUsage,
    bytes: Vec<u8>,
}

#[derive(Clone)]
pub(crate) struct MockProgram {
    id: u64,
    uniform_slots: Vec<u32>,
}

#[derive(Default)]
struct Bound {
    program: Option<MockProgram>,
    vertex: BTreeMap<u32, (u64, u32, u64)>,
    index: Option<(u64, IndexFormat, u64)>,
    constants: HashMap<(ShaderStage, u32), u64>,
    topology: Option<Topology>,
    viewport: Option<Viewport>,
}

#[derive(Default)]
struct State {
    next_buffer: u64,
    next_program: u64,
    buffers: HashMap<u64, BufferData>,
    calls: Vec<Call>,
    released: Vec<u64>,
    draws: Vec<DrawSnapshot>,
    presented: u64,
    fail_allocations: bool,
    refuse_mappings: bool,
    /// `Some` while a back buffer is held; inner value is its clear color.
    frame: Option<Option<Color>>,
    bound: Bound,
}

pub(crate) struct MockDevice {
    state: Rc<RefCell<State>>,
    size: (u32, u32),
}

pub(crate) struct MockBuffer {
    id: u64,
    state: Rc<RefCell<State>>,
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        let mut s = self.state.borrow_mut();
        s.buffers.remove(&self.id);
        s.released.push(self.id);
        s.calls.push(Call::ReleaseBuffer(self.id));
    }
}

impl MockDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Rc::default(),
            size: (width, height),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Buffer ids released so far, in release order.
    pub fn released(&self) -> Vec<u64> {
        self.state.borrow().released.clone()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn buffer_contents(&self, id: u64) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&id).map(|b| b.bytes.clone())
    }

    pub fn draws(&self) -> Vec<DrawSnapshot> {
        self.state.borrow().draws.clone()
    }

    pub fn last_draw(&self) -> Option<DrawSnapshot> {
        self.state.borrow().draws.last().cloned()
    }

    pub fn presented(&self) -> u64 {
        self.state.borrow().presented
    }

    pub fn fail_allocations(&self, fail: bool) {
        self.state.borrow_mut().fail_allocations = fail;
    }

    pub fn refuse_mappings(&self, refuse: bool) {
        self.state.borrow_mut().refuse_mappings = refuse;
    }

    fn record(&mut self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl GpuDevice for MockDevice {
    type Buffer = MockBuffer;
    type Program = MockProgram;

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<MockBuffer> {
        let mut s = self.state.borrow_mut();
        let refuse = |reason: &str| Err(RenderError::resource(desc.label, reason));

        if desc.size == 0 {
            return refuse("zero-sized buffer");
        }
        if desc.size > MAX_BUFFER_SIZE {
            return refuse("size exceeds the device limit");
        }
        if s.fail_allocations {
            return refuse("allocation refused by device");
        }
        let bytes = match desc.contents {
            Some(c) if c.len() as u64 != desc.size => {
                return refuse("contents length differs from size");
            }
            Some(c) => c.to_vec(),
            None if desc.usage == BufferUsage::Immutable => {
                return refuse("immutable buffer created without contents");
            }
            None => vec![0; desc.size as usize],
        };

        s.next_buffer += 1;
        let id = s.next_buffer;
        s.buffers.insert(
            id,
            BufferData {
                label: desc.label.to_owned(),
                usage: desc.usage,
                bytes,
            },
        );
        s.calls.push(Call::CreateBuffer {
            id,
            kind: desc.kind,
            usage: desc.usage,
            size: desc.size,
        });

        Ok(MockBuffer {
            id,
            state: Rc::clone(&self.state),
        })
    }

    fn write_buffer(&self, buffer: &MockBuffer, mode: MapMode, bytes: &[u8]) -> Result<()> {
        let mut s = self.state.borrow_mut();
        let refuse_mappings = s.refuse_mappings;
        let Some(data) = s.buffers.get_mut(&buffer.id) else {
            return Err(RenderError::mapping(buffer.id.to_string(), "buffer was released"));
        };

        if refuse_mappings {
            return Err(RenderError::mapping(&data.label, "mapping refused by device"));
        }
        if data.usage != BufferUsage::Dynamic {
            return Err(RenderError::mapping(&data.label, "buffer is not host writable"));
        }
        if bytes.len() > data.bytes.len() {
            return Err(RenderError::mapping(&data.label, "write larger than buffer"));
        }

        match mode {
            MapMode::WriteDiscard => {
                data.bytes.fill(0);
                data.bytes[..bytes.len()].copy_from_slice(bytes);
            }
        }
        s.calls.push(Call::WriteBuffer {
            id: buffer.id,
            mode,
            len: bytes.len(),
        });
        Ok(())
    }

    fn create_program(
        &self,
        shader: &CompiledShader,
        _layout: &InputLayout,
    ) -> Result<MockProgram> {
        let mut s = self.state.borrow_mut();
        s.next_program += 1;
        let id = s.next_program;
        s.calls.push(Call::CreateProgram(id));
        Ok(MockProgram {
            id,
            uniform_slots: shader.uniforms.iter().map(|u| u.binding).collect(),
        })
    }

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn set_sync_interval(&mut self, interval: u32) {
        self.record(Call::SetSyncInterval(interval));
    }

    fn begin_frame(&mut self) -> Result<()> {
        let mut s = self.state.borrow_mut();
        if s.frame.is_none() {
            s.frame = Some(None);
            s.calls.push(Call::BeginFrame);
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        let mut s = self.state.borrow_mut();
        s.bound.viewport = Some(viewport);
        s.calls.push(Call::SetViewport(viewport));
    }

    fn set_raster_state(&mut self, state: RasterState) {
        self.record(Call::SetRasterState(state));
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        let mut s = self.state.borrow_mut();
        let Some(frame) = s.frame.as_mut() else {
            return Err(RenderError::IncompleteBinding("an acquired back buffer"));
        };
        *frame = Some(color);
        s.calls.push(Call::Clear(color));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, slot: u32, buffer: &MockBuffer, stride: u32, offset: u64) {
        let mut s = self.state.borrow_mut();
        s.bound.vertex.insert(slot, (buffer.id, stride, offset));
        s.calls.push(Call::BindVertex {
            slot,
            id: buffer.id,
            stride,
            offset,
        });
    }

    fn bind_index_buffer(&mut self, buffer: &MockBuffer, format: IndexFormat, offset: u64) {
        let mut s = self.state.borrow_mut();
        s.bound.index = Some((buffer.id, format, offset));
        s.calls.push(Call::BindIndex {
            id: buffer.id,
            format,
            offset,
        });
    }

    fn bind_constant_buffer(&mut self, stage: ShaderStage, slot: u32, buffer: &MockBuffer) {
        let mut s = self.state.borrow_mut();
        s.bound.constants.insert((stage, slot), buffer.id);
        s.calls.push(Call::BindConstant {
            stage,
            slot,
            id: buffer.id,
        });
    }

    fn bind_program(&mut self, program: &MockProgram) {
        let mut s = self.state.borrow_mut();
        s.bound.program = Some(program.clone());
        s.calls.push(Call::BindProgram(program.id));
    }

    fn set_topology(&mut self, topology: Topology) {
        let mut s = self.state.borrow_mut();
        s.bound.topology = Some(topology);
        s.calls.push(Call::SetTopology(topology));
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) -> Result<()> {
        let mut s = self.state.borrow_mut();
        let missing = RenderError::IncompleteBinding;

        let clear = s.frame.flatten().ok_or(missing("a cleared color attachment"))?;
        let program = s.bound.program.clone().ok_or(missing("a shader program"))?;
        let topology = s.bound.topology.ok_or(missing("a primitive topology"))?;
        let &(vertex_id, stride, vertex_offset) =
            s.bound.vertex.get(&0).ok_or(missing("a vertex buffer"))?;
        let (index_id, format, index_offset) = s.bound.index.ok_or(missing("an index buffer"))?;
        if program
            .uniform_slots
            .iter()
            .any(|slot| !s.bound.constants.contains_key(&(ShaderStage::Vertex, *slot)))
        {
            return Err(missing("a constant buffer"));
        }

        let vertex_bytes = match s.buffers.get(&vertex_id) {
            Some(b) => b.bytes[vertex_offset as usize..].to_vec(),
            None => return Err(missing("a live vertex buffer")),
        };
        let index_bytes = match s.buffers.get(&index_id) {
            Some(b) => b.bytes[index_offset as usize..].to_vec(),
            None => return Err(missing("a live index buffer")),
        };
        let constants = s
            .bound
            .constants
            .get(&(ShaderStage::Vertex, 0))
            .and_then(|id| s.buffers.get(id))
            .map(|b| b.bytes.clone())
            .unwrap_or_default();

        let width = format.size() as usize;
        let start = first_index as usize * width;
        let end = start + index_count as usize * width;
        if end > index_bytes.len() {
            return Err(missing("enough indices in the index buffer"));
        }
        let indices = index_bytes[start..end]
            .chunks_exact(width)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect();

        let snapshot = DrawSnapshot {
            program: program.id,
            topology,
            stride,
            clear,
            viewport: s.bound.viewport,
            vertex_bytes,
            indices,
            constants,
        };
        s.draws.push(snapshot);
        s.calls.push(Call::DrawIndexed {
            count: index_count,
            first: first_index,
            base: base_vertex,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        let mut s = self.state.borrow_mut();
        if s.frame.take().is_none() {
            return Err(RenderError::IncompleteBinding("an acquired back buffer"));
        }
        s.presented += 1;
        s.calls.push(Call::Present);
        Ok(())
    }
}
