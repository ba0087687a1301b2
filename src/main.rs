//! Loopstage - an interactive multi-track loop player
//!
//! Each panel on the stage owns one looping track. Click a panel to fade its
//! loop in or out; the panels pulse and show an equalizer from the live mix.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use loopstage::audio::CpalEngine;
use loopstage::bounce::{bounce, offline_engine};
use loopstage::cli::Args;
use loopstage::input::{command_for_key, InputRouter};
use loopstage::params::{EngineConfig, RenderConfig};
use loopstage::rendering::{build_scene, RenderSystem};
use loopstage::stage::Stage;

const HELP: &str =
    "click a panel to toggle it | Space: toggle all | R: reset | M: mute | Esc: quit";

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Audio and section state
    stage: Stage<CpalEngine>,
    input: InputRouter,

    // Configuration
    render_config: RenderConfig,

    // Frame counter (drives ambient animation)
    frame: u64,
}

impl App {
    fn new(stage: Stage<CpalEngine>, render_config: RenderConfig) -> Self {
        Self {
            window: None,
            render_system: None,
            stage,
            input: InputRouter::new(),
            render_config,
            frame: 0,
        }
    }

    fn quit(&mut self, event_loop: &ActiveEventLoop) {
        self.stage.shutdown();
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title(format!("Loopstage - {}", HELP))
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!(%err, "failed to create window");
                event_loop.exit();
                return;
            }
        };

        // Initialize rendering system
        match pollster::block_on(RenderSystem::new(Arc::clone(&window), &self.render_config)) {
            Ok(render_system) => self.render_system = Some(render_system),
            Err(err) => {
                tracing::error!(%err, "failed to initialize renderer");
                event_loop.exit();
                return;
            }
        }

        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.quit(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        logical_key,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if logical_key == Key::Named(NamedKey::Escape) {
                    self.quit(event_loop);
                } else if let Some(command) = command_for_key(&logical_key) {
                    self.stage.apply(command);
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.input.cursor_moved(position),
            WindowEvent::CursorLeft { .. } => self.input.cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => {
                let scale_factor = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
                if let Some(command) = self.input.mouse_input(state, button, scale_factor) {
                    self.stage.apply(command);
                }
            }
            WindowEvent::Resized(size) => {
                if let (Some(window), Some(render_system)) =
                    (&self.window, &mut self.render_system)
                {
                    render_system.resize(size, window.scale_factor());
                }
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

impl App {
    /// Advance the stage and render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        self.stage.tick();

        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };

        let quads = build_scene(self.stage.views(), self.frame, &self.render_config);
        match render_system.render(&quads) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_system.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory");
                self.quit(event_loop);
                return;
            }
            Err(err) => tracing::warn!(?err, "render error"),
        }

        self.frame += 1;
    }
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let stage_config = args.load_stage_config().context("loading stage config")?;
    let engine_config = EngineConfig::default();

    if let Some(recording) = args.create_recording_config() {
        tracing::info!(
            path = %recording.output_path.display(),
            duration_secs = recording.duration_secs,
            "bouncing stage"
        );
        let engine = offline_engine(&recording, &engine_config)?;
        let mut stage = Stage::build(engine, &stage_config, &args.asset_root)?;
        bounce(&mut stage, &recording)?;
        return Ok(());
    }

    let engine = CpalEngine::new(&engine_config).context("opening audio output")?;
    let stage = Stage::build(engine, &stage_config, &args.asset_root)?;

    tracing::info!("Loopstage is running");
    tracing::info!("{}", HELP);

    let mut app = App::new(stage, RenderConfig::default());
    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
