use anyhow::Result;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use prism_engine::camera::ScreenCamera;
use prism_engine::coords::Color;
use prism_engine::core::{App, AppControl, FrameCtx};
use prism_engine::device::GpuInit;
use prism_engine::frame::SceneDesc;
use prism_engine::geometry::{GeometrySet, UpdatePolicy, Vertex};
use prism_engine::logging::{LoggingConfig, init_logging};
use prism_engine::window::{Runtime, RuntimeConfig};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Shape {
    Triangle,
    Quad,
}

impl Shape {
    /// Red shapes with a 150 px side, anchored at the top-left corner.
    fn geometry(self) -> GeometrySet {
        let mut vertices = vec![
            Vertex::at(0.0, 0.0, Color::RED),
            Vertex::at(150.0, 0.0, Color::RED),
            Vertex::at(150.0, 150.0, Color::RED),
        ];
        match self {
            Shape::Triangle => GeometrySet::new(vertices, vec![0, 1, 2]),
            Shape::Quad => {
                vertices.push(Vertex::at(0.0, 150.0, Color::RED));
                GeometrySet::new(vertices, vec![0, 1, 2, 0, 2, 3])
            }
        }
    }

    fn toggled(self) -> Self {
        match self {
            Shape::Triangle => Shape::Quad,
            Shape::Quad => Shape::Triangle,
        }
    }
}

fn toggled_policy(policy: UpdatePolicy) -> UpdatePolicy {
    match policy {
        UpdatePolicy::Recreate => UpdatePolicy::Refresh,
        UpdatePolicy::Refresh => UpdatePolicy::Recreate,
    }
}

/// Space toggles triangle/quad, P toggles the update policy, Escape quits.
struct Studio {
    shape: Shape,
    policy: UpdatePolicy,
    dirty: bool,
}

impl Studio {
    fn new() -> Self {
        Self {
            shape: Shape::Quad,
            policy: UpdatePolicy::Refresh,
            dirty: false,
        }
    }
}

impl App for Studio {
    fn scene(&mut self, width: u32, height: u32) -> SceneDesc {
        SceneDesc::new(self.shape.geometry(), ScreenCamera::new(width, height))
            .with_policy(self.policy)
            .with_clear_color(Color::GREEN)
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }

        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => return AppControl::Exit,
            PhysicalKey::Code(KeyCode::Space) => {
                self.shape = self.shape.toggled();
                self.dirty = true;
            }
            PhysicalKey::Code(KeyCode::KeyP) => {
                self.policy = toggled_policy(self.policy);
                self.dirty = true;
            }
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if std::mem::take(&mut self.dirty) {
            ctx.scene.set_geometry(self.shape.geometry());
            ctx.scene.set_policy(self.policy);
            log::info!(
                "frame {}: {:?} with {:?} policy",
                ctx.time.frame_index,
                self.shape,
                self.policy
            );
        }
        AppControl::Continue
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "prism".to_string(),
        width: 800,
        height: 600,
    };
    Runtime::run(config, GpuInit::default(), Studio::new())
}
