use std::any::Any;
use std::env;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use glam::{Vec2, Vec3};
use log::{error, info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

use shadow_viewer::{
    CameraMode, ControlEffect, FrameOrchestrator, FrameRecorder, InputState, Key, LoadedMesh,
    PanelOverlay, Renderer, SceneDescription, SceneState, ViewerError, ViewerOptions,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = ViewerOptions::parse(env::args().skip(1))?;
    let description = match &options.scene {
        Some(path) => SceneDescription::load(path)?,
        None => SceneDescription::default(),
    };
    let meshes = description.load_meshes();
    let from_file = meshes.iter().filter(|mesh| mesh.from_file).count();
    println!(
        "Loaded scene with {} meshes ({from_file} from file)",
        meshes.len()
    );
    for mesh in &meshes {
        println!(
            " - {} ({} triangles)",
            mesh.role.name(),
            mesh.data.triangle_count()
        );
    }

    let mut state = SceneState::new(&description, options.size.dimensions());
    if options.start_in_ride {
        state.cameras.set_mode(CameraMode::Ride);
    }

    if options.headless {
        return run_headless(state, &options);
    }

    run_interactive(state, meshes, &options)
}

/// Drives the frame pipeline against a recording backend and prints where
/// everything ended up.
fn run_headless(mut state: SceneState, options: &ViewerOptions) -> Result<()> {
    let mut input = InputState::new();
    for key in &options.hold {
        input.key_down(*key);
    }
    let mut orchestrator = FrameOrchestrator::new();
    let mut recorder = FrameRecorder::new();
    for tick in 0..options.ticks {
        let effects = orchestrator.tick(&mut state, &mut input, &mut recorder);
        if effects.contains(&ControlEffect::Quit) {
            info!("quit requested after {} ticks", tick + 1);
            break;
        }
    }
    print_summary(&state, &orchestrator, &recorder);
    Ok(())
}

fn print_summary(state: &SceneState, orchestrator: &FrameOrchestrator, recorder: &FrameRecorder) {
    println!(
        "Frames: {} (depth {}, shaded {}, depth debug {})",
        recorder.frames, recorder.depth_passes, recorder.shaded_passes, recorder.debug_passes
    );
    println!(
        "Mode: {} (render {})",
        state.mode().name(),
        orchestrator.mode().name()
    );
    print_state(state);
}

fn print_state(state: &SceneState) {
    let ship = &state.ship;
    println!(
        "Ship pos={} rot={} scale={:.2} lift={:.3}",
        fmt_vec3(ship.position),
        fmt_vec3(ship.euler_deg),
        ship.scale,
        state.levitation.offset()
    );
    let directional = &state.directional;
    println!(
        "Directional light dir={} rot={:.2} color={}",
        fmt_vec3(directional.direction),
        directional.rotation_deg,
        fmt_vec3(directional.color)
    );
    println!(
        "Point light pos={} color={}",
        fmt_vec3(state.point.position),
        fmt_vec3(state.point.color)
    );
    println!(
        "Camera pos={} (adjusting {} light)",
        fmt_vec3(state.cameras.active().position),
        state.selection.name()
    );
}

fn fmt_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

fn run_interactive(state: SceneState, meshes: Vec<LoadedMesh>, options: &ViewerOptions) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| ViewerError::window_init("event loop", panic_message(panic)))?
        .map_err(|err| ViewerError::window_init("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp {
        options: options.clone(),
        meshes,
        state,
        input: InputState::new(),
        orchestrator: FrameOrchestrator::new(),
        graphics: None,
        failure: None,
    };
    event_loop
        .run_app(&mut app)
        .map_err(|err| anyhow!("event loop terminated abnormally: {err}"))?;

    match app.failure {
        Some(err) => Err(err),
        None => {
            print_state(&app.state);
            Ok(())
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct Graphics {
    window: Arc<Window>,
    renderer: Renderer,
    panel: PanelOverlay,
}

struct ViewerApp {
    options: ViewerOptions,
    meshes: Vec<LoadedMesh>,
    state: SceneState,
    input: InputState,
    orchestrator: FrameOrchestrator,
    graphics: Option<Graphics>,
    failure: Option<anyhow::Error>,
}

impl ViewerApp {
    fn create_graphics(&self, event_loop: &ActiveEventLoop) -> Result<Graphics> {
        let (width, height) = self.options.size.dimensions();
        let attributes = Window::default_attributes()
            .with_title("Shadow Viewer")
            .with_inner_size(LogicalSize::new(width, height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| ViewerError::window_init("window", err))?,
        );
        let renderer = block_on(Renderer::new(
            Arc::clone(&window),
            &self.meshes,
            self.options.shadow_size,
        ))
        .map_err(|err| ViewerError::window_init("GPU context", format!("{err:#}")))?;
        let panel = PanelOverlay::new(&window, renderer.device(), renderer.surface_format());
        Ok(Graphics {
            window,
            renderer,
            panel,
        })
    }

    fn apply_effect(&mut self, event_loop: &ActiveEventLoop, effect: ControlEffect) {
        match effect {
            ControlEffect::Quit => event_loop.exit(),
            ControlEffect::CursorCapture(captured) => {
                if let Some(graphics) = &self.graphics {
                    capture_cursor(&graphics.window, captured);
                }
            }
            ControlEffect::Wireframe(enabled) => {
                if let Some(graphics) = self.graphics.as_mut() {
                    graphics.renderer.set_wireframe(enabled);
                }
            }
            // Consumed by the orchestrator before it gets here.
            ControlEffect::ToggleRenderMode => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let effects = self.orchestrator.update(&mut self.state, &mut self.input);
        for effect in effects {
            self.apply_effect(event_loop, effect);
        }
        let snapshot = self.state.snapshot();

        let Some(graphics) = self.graphics.as_mut() else {
            return;
        };
        if let Err(err) = graphics.renderer.begin_frame() {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    graphics.renderer.resize(graphics.window.inner_size());
                }
                wgpu::SurfaceError::OutOfMemory => {
                    error!("GPU is out of memory");
                    self.failure = Some(anyhow!("GPU is out of memory"));
                    event_loop.exit();
                }
                wgpu::SurfaceError::Timeout => {
                    info!("Surface timeout; retrying next frame");
                }
                other => warn!("failed to acquire surface texture: {other}"),
            }
            return;
        }

        self.orchestrator.render(&snapshot, &mut graphics.renderer);
        if self.state.edit_mode() {
            if let Some(target) = graphics.renderer.overlay_target() {
                graphics
                    .panel
                    .paint(&graphics.window, &mut self.state, target);
            }
        }
        graphics.renderer.present();
    }
}

fn capture_cursor(window: &Window, captured: bool) {
    let result = if captured {
        window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
    } else {
        window.set_cursor_grab(CursorGrabMode::None)
    };
    if let Err(err) = result {
        warn!("cursor grab not available: {err}");
    }
    window.set_cursor_visible(!captured);
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        match self.create_graphics(event_loop) {
            Ok(graphics) => {
                if !self.state.edit_mode() {
                    capture_cursor(&graphics.window, true);
                }
                let size = graphics.window.inner_size();
                self.state.resize(size.width, size.height);
                self.graphics = Some(graphics);
            }
            Err(err) => {
                self.failure = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(graphics) = self.graphics.as_mut() else {
            return;
        };
        if window_id != graphics.renderer.window_id() {
            return;
        }
        let edit_mode = self.state.edit_mode();
        let consumed = edit_mode && graphics.panel.on_window_event(&graphics.window, &event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                graphics.renderer.resize(size);
                self.state.resize(size.width, size.height);
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::KeyboardInput { event, .. }
                if !consumed || event.state == ElementState::Released =>
            {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let Some(key) = Key::from_winit(code) else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => self.input.key_down(key),
                    ElementState::Released => self.input.key_up(key),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if edit_mode && !consumed && !graphics.panel.wants_pointer() {
                    self.input
                        .push_cursor(Vec2::new(position.x as f32, position.y as f32));
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if !self.state.edit_mode() {
                self.input
                    .push_motion(Vec2::new(delta.0 as f32, delta.1 as f32));
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(graphics) = &self.graphics {
            graphics.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(graphics) = self.graphics.as_mut() {
            graphics.renderer.shutdown();
        }
    }
}
