use crate::camera::Camera;
use crate::coords::Color;
use crate::device::GpuDevice;
use crate::error::{RenderError, Result};
use crate::geometry::{GeometryBuffer, GeometrySet, UpdatePolicy, Vertex};
use crate::shader::{ShaderProgram, ShaderSource};

use super::{FrameTarget, FrameTargetDesc};

/// Where the loop is inside the current frame.
///
/// A frame walks `Idle -> Updating -> Drawing -> Presented -> Idle`. The
/// first error moves the loop to `Halted`, which is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameState {
    Idle,
    Updating,
    Drawing,
    Presented,
    Halted,
}

impl FrameState {
    /// State reached when the current step succeeds.
    pub const fn next(self) -> Self {
        match self {
            FrameState::Idle => FrameState::Updating,
            FrameState::Updating => FrameState::Drawing,
            FrameState::Drawing => FrameState::Presented,
            FrameState::Presented => FrameState::Idle,
            FrameState::Halted => FrameState::Halted,
        }
    }
}

/// Everything an application supplies to build a [`RenderLoop`].
pub struct SceneDesc {
    pub shader: ShaderSource,
    pub geometry: GeometrySet,
    pub policy: UpdatePolicy,
    pub camera: Box<dyn Camera>,
    pub clear_color: Color,
    pub target: FrameTargetDesc,
}

impl SceneDesc {
    /// Scene drawn with the bundled shader, refreshed in place, on green.
    pub fn new(geometry: GeometrySet, camera: impl Camera + 'static) -> Self {
        Self {
            shader: ShaderSource::primitive(),
            geometry,
            policy: UpdatePolicy::default(),
            camera: Box::new(camera),
            clear_color: Color::GREEN,
            target: FrameTargetDesc::default(),
        }
    }

    pub fn with_shader(mut self, shader: ShaderSource) -> Self {
        self.shader = shader;
        self
    }

    pub fn with_policy(mut self, policy: UpdatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_target(mut self, target: FrameTargetDesc) -> Self {
        self.target = target;
        self
    }
}

/// Per-frame driver: camera, geometry upload, clear, draw, present.
pub struct RenderLoop<D: GpuDevice> {
    geometry: GeometrySet,
    buffer: GeometryBuffer<D>,
    program: ShaderProgram<D>,
    target: FrameTarget,
    camera: Box<dyn Camera>,
    clear_color: Color,
    state: FrameState,
    frames: u64,
}

impl<D: GpuDevice> RenderLoop<D> {
    /// Sets up the frame target, loads the shader program and checks the
    /// initial geometry. Nothing is uploaded until the first frame.
    pub fn new(device: &mut D, scene: SceneDesc) -> Result<Self> {
        let target = FrameTarget::new(device, scene.target)?;
        let program = ShaderProgram::load(device, &scene.shader, &Vertex::INPUT_ELEMENTS)?;
        scene.geometry.validate()?;

        Ok(Self {
            geometry: scene.geometry,
            buffer: GeometryBuffer::new("scene", scene.policy),
            program,
            target,
            camera: scene.camera,
            clear_color: scene.clear_color,
            state: FrameState::Idle,
            frames: 0,
        })
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Frames completed and presented.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn geometry(&self) -> &GeometrySet {
        &self.geometry
    }

    /// In-place edits are picked up by the next frame's update.
    pub fn geometry_mut(&mut self) -> &mut GeometrySet {
        &mut self.geometry
    }

    pub fn set_geometry(&mut self, geometry: GeometrySet) {
        self.geometry = geometry;
    }

    pub fn policy(&self) -> UpdatePolicy {
        self.buffer.policy()
    }

    pub fn set_policy(&mut self, policy: UpdatePolicy) {
        self.buffer.set_policy(policy);
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    pub fn camera_mut(&mut self) -> &mut dyn Camera {
        self.camera.as_mut()
    }

    pub fn target(&self) -> &FrameTarget {
        &self.target
    }

    pub fn program(&self) -> &ShaderProgram<D> {
        &self.program
    }

    /// Runs one full frame. `dt` is the elapsed time in seconds handed to
    /// the camera.
    ///
    /// Any error halts the loop; later calls fail with [`RenderError::Halted`].
    pub fn run_frame(&mut self, device: &mut D, dt: f32) -> Result<()> {
        if self.state == FrameState::Halted {
            return Err(RenderError::Halted);
        }

        match self.step(device, dt) {
            Ok(()) => Ok(()),
            Err(err) => {
                log::error!(
                    "render loop for '{}' halted in {:?}: {err}",
                    self.program.label(),
                    self.state
                );
                self.state = FrameState::Halted;
                Err(err)
            }
        }
    }

    fn step(&mut self, device: &mut D, dt: f32) -> Result<()> {
        self.advance(FrameState::Updating);
        self.camera.update(dt);
        let transform = self.camera.transform();
        self.buffer.update(device, &self.geometry)?;

        self.advance(FrameState::Drawing);
        self.target.clear(device, self.clear_color)?;
        self.program
            .draw(device, transform, self.buffer.index_count())?;

        self.advance(FrameState::Presented);
        self.target.present(device)?;
        self.frames += 1;

        self.advance(FrameState::Idle);
        Ok(())
    }

    fn advance(&mut self, to: FrameState) {
        debug_assert_eq!(self.state.next(), to, "invalid frame transition");
        log::trace!("frame {}: {:?} -> {to:?}", self.frames, self.state);
        self.state = to;
    }
}
