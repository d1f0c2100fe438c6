use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, GpuDevice, GpuInit, WgpuDevice};
use crate::frame::RenderLoop;
use crate::time::FrameClock;

/// Window configuration. The size is in physical pixels and never changes.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "prism".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, builds the device and the app's scene, and renders
    /// until the window closes, the app exits, or a frame fails.
    ///
    /// A failed frame is logged and returned here after the loop has exited.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Device and render loop, both borrowing the window through the surface.
struct Host<'w> {
    device: WgpuDevice<'w>,
    scene: RenderLoop<WgpuDevice<'w>>,
}

impl<'w> Host<'w> {
    fn new<A: App>(window: &'w Window, gpu_init: GpuInit, app: &mut A) -> Result<Self> {
        let gpu = pollster::block_on(Gpu::new(window, gpu_init))?;
        let mut device = WgpuDevice::new(gpu);
        let (width, height) = device.surface_size();
        let scene = RenderLoop::new(&mut device, app.scene(width, height))
            .context("failed to set up the scene")?;
        Ok(Self { device, scene })
    }
}

#[self_referencing]
struct Session {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[not_covariant]
    host: Host<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    session: Option<Session>,
    error: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            session: None,
            error: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    /// Records a fatal error and stops the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        self.session = None;
        self.request_exit(event_loop);
    }

    fn create_session(&mut self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let app = &mut self.app;

        SessionTryBuilder {
            clock: FrameClock::new(),
            window,
            host_builder: |w| Host::new(w, gpu_init, app),
        }
        .try_build()
    }

    fn redraw(&mut self) -> Result<AppControl> {
        let Some(session) = self.session.as_mut() else {
            return Ok(AppControl::Continue);
        };
        let app = &mut self.app;

        session.with_mut(|fields| {
            let time = fields.clock.tick();
            let host = fields.host;

            let control = {
                let mut ctx = FrameCtx {
                    window: fields.window,
                    time,
                    scene: &mut host.scene,
                };
                app.on_frame(&mut ctx)
            };
            if control == AppControl::Exit {
                return Ok(AppControl::Exit);
            }

            fields.window.pre_present_notify();
            host.scene
                .run_frame(&mut host.device, time.dt)
                .with_context(|| format!("frame {} failed", time.frame_index))?;
            Ok(AppControl::Continue)
        })
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() || self.exit_requested {
            return;
        }

        match self.create_session(event_loop) {
            Ok(session) => {
                session.with_window(|w| w.request_redraw());
                self.session = Some(session);
            }
            Err(e) => self.fail(event_loop, e.context("failed to start the renderer")),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(session) = &self.session {
            session.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                // GPU work in flight is not awaited.
                self.session = None;
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(size) => {
                log::debug!(
                    "ignoring resize to {}x{}; surface size is fixed",
                    size.width,
                    size.height
                );
            }

            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(AppControl::Continue) => {}
                Ok(AppControl::Exit) => self.request_exit(event_loop),
                Err(e) => self.fail(event_loop, e),
            },

            _ => {}
        }
    }
}
