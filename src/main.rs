use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use pixel_view::cli::Cli;
use pixel_view::config::ViewConfig;
use pixel_view::core::{Bounds, DisplaySurface, WgpuBackend};
use pixel_view::source::{FramePacer, TestPatternSource};
use pixel_view::PixelBufferView;

// === Constants ===

const STATS_INTERVAL: Duration = Duration::from_secs(1);
const INITIAL_WINDOW_WIDTH: u32 = 960;
const INITIAL_WINDOW_HEIGHT: u32 = 540;

struct Viewer {
    window: Arc<Window>,
    surface: DisplaySurface<WgpuBackend>,
}

struct App {
    config: ViewConfig,
    source: TestPatternSource,
    pacer: FramePacer,
    viewer: Option<Viewer>,
    last_stats: Instant,
}

impl App {
    fn new(cli: &Cli, config: ViewConfig) -> Self {
        Self {
            source: TestPatternSource::new(cli.width, cli.height, cli.format),
            pacer: FramePacer::new(cli.fps),
            viewer: None,
            last_stats: Instant::now(),
            config,
        }
    }

    fn handle_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyC => {
                let (width, height) = self.source.cycle_resolution();
                log::info!("camera resolution {}x{}", width, height);
            }
            KeyCode::KeyP => {
                let format = self.source.cycle_format();
                log::info!("camera format {}", format);
            }
            KeyCode::KeyA => {
                let mode = viewer.surface.options().aspect_mode.next();
                viewer.surface.set_aspect_mode(mode);
                log::info!("aspect mode {}", mode);
            }
            KeyCode::KeyF => {
                viewer.surface.flush_pixel_buffer_cache();
                log::info!("texture cache flushed");
            }
            KeyCode::KeyR => {
                viewer.surface.reset();
                log::info!("surface reset");
            }
            _ => {}
        }
    }

    fn redraw(&mut self) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        if self.pacer.poll() {
            let frame = self.source.next_frame();
            // Failures are logged by the surface; the next frame retries
            let _ = viewer.surface.display_pixel_buffer(&frame.as_pixel_buffer());
        }

        if self.last_stats.elapsed() >= STATS_INTERVAL {
            self.last_stats = Instant::now();
            let stats = viewer.surface.stats();
            log::info!(
                "presented {} dropped {} textures {} (created {}, evicted {}, released {}) contexts {}",
                stats.frames_presented,
                stats.frames_dropped,
                viewer.surface.cached_textures(),
                stats.textures_created,
                stats.textures_evicted,
                stats.textures_released,
                stats.contexts_created
            );
        }

        viewer.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Pixel View")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    INITIAL_WINDOW_WIDTH,
                    INITIAL_WINDOW_HEIGHT,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let backend = WgpuBackend::new(window.clone(), self.config.backend_settings());
        let surface = DisplaySurface::with_options(
            backend,
            Bounds::new(size.width, size.height),
            self.config.surface_options(),
        );

        window.request_redraw();
        self.viewer = Some(Viewer { window, surface });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.surface.set_bounds(Bounds::new(size.width, size.height));
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(code, event_loop),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        // The window surface is invalid while suspended
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.surface.reset();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut viewer) = self.viewer.take() {
            viewer.surface.reset();
            log::info!("final stats {:?}", viewer.surface.stats());
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = ViewConfig::resolve(&cli)?;
    log::info!("view config {:?}", config);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(&cli, config);

    println!("Pixel View - Controls: C resolution, P format, A aspect, F flush, R reset, Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
