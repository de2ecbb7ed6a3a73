use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use treecrown_common::{DemoConfig, FillMode};
use treecrown_input::{Action, Control, InputState};
use treecrown_render_wgpu::WgpuRenderer;
use treecrown_scene::Scene;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "treecrown-desktop", about = "Tree crown fly-through demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config file (.yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn control_for(key: KeyCode) -> Option<Control> {
    Some(match key {
        KeyCode::KeyW => Control::Forward,
        KeyCode::KeyS => Control::Back,
        KeyCode::KeyA => Control::Left,
        KeyCode::KeyD => Control::Right,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Control::Sprint,
        KeyCode::Digit1 => Control::Wireframe,
        KeyCode::Digit2 => Control::Solid,
        KeyCode::KeyG => Control::Grow,
        KeyCode::KeyR => Control::Reset,
        KeyCode::F1 => Control::ToggleInspector,
        _ => return None,
    })
}

/// Application state.
struct AppState {
    scene: Scene,
    input: InputState,
    show_inspector: bool,
    wireframe_supported: bool,
    last_frame: Instant,
}

impl AppState {
    fn new(scene: Scene) -> Self {
        Self {
            scene,
            input: InputState::new(),
            show_inspector: true,
            wireframe_supported: false,
            last_frame: Instant::now(),
        }
    }

    fn update(&mut self, dt: f32) {
        let actions = self.input.movement(dt, &self.scene.config().controls);
        for action in actions {
            self.dispatch(action);
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        let Some(control) = control_for(key) else {
            return;
        };
        if let Some(action) = self.input.key(control, pressed) {
            self.dispatch(action);
        }
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        let actions = self.input.look(dx, dy, &self.scene.config().controls);
        for action in actions {
            self.dispatch(action);
        }
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::ToggleInspector => self.show_inspector = !self.show_inspector,
            Action::SetFillMode(FillMode::Wireframe) if !self.wireframe_supported => {
                tracing::warn!("wireframe not supported by this GPU, staying solid");
            }
            action => {
                self.scene.apply(action);
            }
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_inspector {
            return;
        }

        egui::SidePanel::left("inspector")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Tree Crown");
                ui.separator();

                let camera = self.scene.camera();
                let p = camera.position();
                ui.label(format!("Position: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
                for (name, v) in [
                    ("Right", camera.right()),
                    ("Up", camera.up()),
                    ("Look", camera.look()),
                ] {
                    ui.label(format!("{name}: ({:.3}, {:.3}, {:.3})", v.x, v.y, v.z));
                }
                ui.label(format!(
                    "Orthonormality error: {:.2e}",
                    camera.orthonormality_error()
                ));
                if let Some(lens) = camera.lens() {
                    ui.label(format!(
                        "Lens: fov {:.1}° x {:.1}°, aspect {:.2}",
                        lens.fov_y().to_degrees(),
                        lens.fov_x().to_degrees(),
                        lens.aspect()
                    ));
                }
                ui.separator();

                ui.heading("Growth");
                let grower = self.scene.grower();
                ui.label(format!("Attraction points: {}", self.scene.points().len()));
                ui.label(format!("Branches: {}", grower.branches().len()));
                ui.label(format!("Iteration: {}", grower.iteration()));
                match grower.finished() {
                    Some(reason) => ui.label(format!("Finished: {reason}")),
                    None => ui.label("Growing"),
                };
                ui.horizontal(|ui| {
                    if ui.button("Grow (G)").clicked() {
                        self.dispatch(Action::GrowStep);
                    }
                    if ui.button("Reset (R)").clicked() {
                        self.dispatch(Action::ResetGrowth);
                    }
                });
                ui.separator();

                ui.heading("Display");
                let mut fill_mode = self.scene.fill_mode();
                ui.horizontal(|ui| {
                    ui.radio_value(&mut fill_mode, FillMode::Solid, "Solid (2)");
                    ui.add_enabled_ui(self.wireframe_supported, |ui| {
                        ui.radio_value(&mut fill_mode, FillMode::Wireframe, "Wireframe (1)");
                    });
                });
                if fill_mode != self.scene.fill_mode() {
                    self.dispatch(Action::SetFillMode(fill_mode));
                }

                ui.separator();
                ui.small("F1: Inspector | LMB drag: Look | WASD: Move | Shift: Fast");
            });
    }
}

/// Window, GPU and egui resources, created on first resume.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(scene: Scene) -> Self {
        Self {
            state: AppState::new(scene),
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let window_config = &self.state.scene.config().window;
        let attrs = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let wireframe = adapter
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        let required_features = if wireframe {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("treecrown_device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface has no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        if let Err(e) = self.state.scene.resize(config.width, config.height) {
            tracing::warn!("failed to apply window aspect: {e}");
        }

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);
        self.state.wireframe_supported = renderer.supports_wireframe();
        if self.state.scene.fill_mode() == FillMode::Wireframe && !renderer.supports_wireframe() {
            self.state.scene.set_fill_mode(FillMode::Solid);
        }

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            wireframe,
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
        self.state.last_frame = now;
        self.state.update(dt);

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        match self.state.scene.frame() {
            Some(frame) => gpu.renderer.render(&gpu.device, &gpu.queue, &view, frame),
            None => tracing::warn!("no valid camera matrices yet, skipping scene"),
        }

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    gpu.renderer
                        .resize(&gpu.device, gpu.config.width, gpu.config.height);
                }
                if let Err(e) = self.state.scene.resize(new_size.width, new_size.height) {
                    tracing::warn!("resize ignored: {e}");
                }
            }
            WindowEvent::Focused(false) => {
                self.state.input.release_all();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape && key_state == ElementState::Pressed {
                    event_loop.exit();
                    return;
                }
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state
                    .input
                    .set_looking(btn_state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.handle_mouse_motion(delta.0, delta.1);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("treecrown-desktop starting");

    let config = match &cli.config {
        Some(path) => DemoConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DemoConfig::default(),
    };
    let scene = Scene::new(config).context("building scene")?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(scene);
    event_loop.run_app(&mut app)?;

    Ok(())
}
