//! Window and main loop
//!
//! [`LifeApp::run`] drives a winit event loop through three phases:
//! `Initializing` until the first `resumed` builds every GPU resource,
//! `Running` while frames are drawn, and `ShuttingDown` once the window
//! closes or anything fails. Failures are never retried; the first one is
//! returned from `run`.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::LifeConfig;
use crate::error::{LifeError, Result};
use crate::gfx::{context::SurfaceContext, presenter::Presenter};
use crate::grid::PixelGrid;
use crate::simulation::{LifeSimulation, TickCounter};

pub struct LifeApp {
    config: LifeConfig,
}

impl LifeApp {
    pub fn new(config: LifeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LifeConfig {
        &self.config
    }

    /// Opens the window and runs until it is closed
    pub fn run(self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = AppState {
            config: self.config,
            phase: Phase::Initializing,
            error: None,
        };
        event_loop.run_app(&mut state)?;

        match state.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

enum Phase {
    Initializing,
    Running(Box<Running>),
    ShuttingDown,
}

/// Everything that exists while frames are being drawn
struct Running {
    window: Arc<Window>,
    context: SurfaceContext,
    simulation: LifeSimulation,
    presenter: Presenter,
    ticks: TickCounter,
}

impl Running {
    fn new(config: &LifeConfig, event_loop: &ActiveEventLoop) -> Result<Self> {
        let window = Arc::new(
            event_loop.create_window(
                WindowAttributes::default()
                    .with_title(config.title.clone())
                    .with_inner_size(LogicalSize::new(config.window_width, config.window_height))
                    .with_resizable(false),
            )?,
        );

        let (width, height) = window.inner_size().into();
        let context = pollster::block_on(SurfaceContext::new(
            window.clone(),
            width,
            height,
            config.vsync,
        ))?;

        let grid = PixelGrid::load(&config.seed_image)?;

        let (simulation, presenter) = build_stages(
            context.device(),
            context.queue(),
            context.format(),
            config,
            &grid,
        )?;

        log::info!(
            "Running: one generation every {} frame(s), vsync {}",
            config.tick_rate,
            if config.vsync { "on" } else { "off" }
        );

        Ok(Self {
            window,
            context,
            simulation,
            presenter,
            ticks: TickCounter::new(config.tick_rate),
        })
    }

    /// One loop iteration: maybe a generation, always a redraw
    fn frame(&mut self) -> Result<()> {
        let frame = self.context.acquire()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.context
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                });

        if self.ticks.advance() {
            self.simulation.encode_step(&mut encoder)?;
        }
        self.presenter
            .encode(&mut encoder, &view, self.simulation.current_index())?;

        self.context
            .queue()
            .submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.context.resize(size.width, size.height);
    }

    fn destroy(self) {
        log::info!(
            "Shutting down after {} tick(s), {} generation(s)",
            self.ticks.tick(),
            self.simulation.generation()
        );
        self.simulation.destroy();
        self.presenter.destroy();
    }
}

/// Builds the compute and presentation stages. A stage built before a
/// later failure is destroyed before the error is returned.
fn build_stages(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    color_format: wgpu::TextureFormat,
    config: &LifeConfig,
    grid: &PixelGrid,
) -> Result<(LifeSimulation, Presenter)> {
    let simulation = LifeSimulation::new(device, queue, grid, &config.compute_shader)?;

    match Presenter::new(
        device,
        color_format,
        &config.vertex_shader,
        &config.fragment_shader,
        simulation.textures(),
    ) {
        Ok(presenter) => Ok((simulation, presenter)),
        Err(error) => {
            simulation.destroy();
            Err(error)
        }
    }
}

struct AppState {
    config: LifeConfig,
    phase: Phase,
    error: Option<LifeError>,
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: LifeError) {
        log::error!("{error}");
        if self.error.is_none() {
            self.error = Some(error);
        }
        self.shut_down(event_loop);
    }

    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        if let Phase::Running(running) = std::mem::replace(&mut self.phase, Phase::ShuttingDown) {
            running.destroy();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self.phase, Phase::Initializing) {
            return;
        }

        match Running::new(&self.config, event_loop) {
            Ok(running) => self.phase = Phase::Running(Box::new(running)),
            Err(error) => self.fail(event_loop, error),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Phase::Running(running) = &mut self.phase else {
            return;
        };

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                self.shut_down(event_loop);
            }
            WindowEvent::Resized(size) => {
                running.resize(size);
            }
            WindowEvent::RedrawRequested => {
                if let Err(error) = running.frame() {
                    self.fail(event_loop, error);
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Phase::Running(running) = &self.phase {
            running.window.request_redraw();
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.shut_down(event_loop);
    }
}
