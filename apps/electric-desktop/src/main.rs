use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use electric_input::{Action, DragState, Key, action_for_key, action_for_scroll};
use electric_kernel::{ElectricScene, SceneConfig};
use electric_render::{BloomSettings, StarfieldConfig, generate_starfield};
use electric_render_wgpu::{OrbitCamera, WgpuRenderer};
use electric_tools::{FrameTimer, SceneInspector};
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "electric-desktop", about = "Electric cubes desktop viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML). Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn key_from_code(code: KeyCode) -> Key {
    match code {
        KeyCode::KeyR => Key::R,
        KeyCode::F1 => Key::F1,
        KeyCode::Space => Key::Space,
        KeyCode::Backspace => Key::Backspace,
        _ => Key::Other,
    }
}

/// Application state.
struct AppState {
    scene: ElectricScene,
    camera: OrbitCamera,
    bloom: BloomSettings,
    drag: DragState,
    timer: FrameTimer,
    show_panel: bool,
    last_frame: Instant,
}

impl AppState {
    fn new(scene: ElectricScene) -> Self {
        Self {
            scene,
            camera: OrbitCamera::default(),
            bloom: BloomSettings::default(),
            drag: DragState::default(),
            timer: FrameTimer::default(),
            show_panel: true,
            last_frame: Instant::now(),
        }
    }

    /// One frame of simulation: the scene clock clamps long stalls.
    fn update(&mut self) {
        let now = Instant::now();
        let elapsed = now - self.last_frame;
        self.last_frame = now;
        self.timer.record(elapsed);
        self.scene.tick(elapsed.as_secs_f64());
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Orbit(delta) => self.camera.orbit(delta.x, delta.y),
            Action::Zoom(lines) => self.camera.zoom(lines),
            Action::ResetCamera => {
                self.camera.reset();
                tracing::info!("camera reset");
            }
            Action::TogglePanel => self.show_panel = !self.show_panel,
            Action::TogglePause => {
                let paused = !self.scene.is_paused();
                self.scene.set_paused(paused);
                tracing::info!(paused, "pause toggled");
            }
            Action::ResetScene => self.scene.reset(),
            Action::Noop => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        let summary = SceneInspector::summary(&self.scene);

        egui::SidePanel::left("settings")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Electric Cubes");
                ui.separator();
                ui.label(format!(
                    "Time: {:.2}s  Frames: {}",
                    summary.time, summary.frames
                ));
                ui.label(format!(
                    "FPS: {:.0}  ({:.2} ms avg, {:.2} max)",
                    self.timer.fps(),
                    self.timer.average().as_secs_f64() * 1000.0,
                    self.timer.max().as_secs_f64() * 1000.0
                ));
                ui.label(format!("Instances: {}", summary.instance_count));
                for ring in &summary.rings {
                    ui.label(format!("  {}: {}", ring.name, ring.instances));
                }

                ui.separator();
                ui.heading("Bloom");
                ui.checkbox(&mut self.bloom.enabled, "Enabled");
                ui.add(
                    egui::Slider::new(&mut self.bloom.intensity, BloomSettings::INTENSITY_RANGE)
                        .text("Intensity"),
                );
                ui.add(
                    egui::Slider::new(&mut self.bloom.threshold, BloomSettings::THRESHOLD_RANGE)
                        .text("Threshold"),
                );
                ui.add(
                    egui::Slider::new(&mut self.bloom.radius, BloomSettings::RADIUS_RANGE)
                        .text("Radius"),
                );

                ui.separator();
                ui.heading("Simulation");
                let mut paused = self.scene.is_paused();
                if ui.checkbox(&mut paused, "Paused (Space)").changed() {
                    self.scene.set_paused(paused);
                }
                let mut time_scale = self.scene.time_scale();
                if ui
                    .add(egui::Slider::new(&mut time_scale, 0.0..=4.0).text("Time scale"))
                    .changed()
                {
                    self.scene.set_time_scale(time_scale);
                }
                ui.horizontal(|ui| {
                    if ui.button("Reset camera (R)").clicked() {
                        self.apply(Action::ResetCamera);
                    }
                    if ui.button("Restart").clicked() {
                        self.apply(Action::ResetScene);
                    }
                });
                ui.label(if self.camera.is_manual() {
                    format!("Camera: manual, distance {:.0}", self.camera.distance())
                } else {
                    "Camera: fly-around".to_string()
                });

                ui.separator();
                ui.small("F1: Toggle panel | Drag: Orbit | Wheel: Zoom");
            });
    }
}

/// GPU handles created once the window exists.
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
    fn new(scene: ElectricScene) -> Self {
        Self {
            state: AppState::new(scene),
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Electric Cubes")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
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
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("electric_device"),
                required_features: wgpu::Features::empty(),
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
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let stars = generate_starfield(&StarfieldConfig::default());
        let renderer =
            WgpuRenderer::new(&device, surface_format, config.width, config.height, &stars);
        self.state.camera.aspect = renderer.aspect();

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
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.gpu = Some(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        });
        Ok(())
    }

    fn redraw(&mut self) {
        self.state.update();

        let Some(gpu) = &mut self.gpu else {
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

        let render_view = self.state.camera.view(self.state.scene.time());
        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            &self.state.scene,
            &render_view,
            &self.state.bloom,
        );

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
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("failed to initialize graphics: {e:#}");
            event_loop.exit();
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
                    self.state.camera.aspect = gpu.renderer.aspect();
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
            } => {
                self.state.apply(action_for_key(key_from_code(code)));
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => match state {
                ElementState::Pressed => self.state.drag.press(),
                ElementState::Released => self.state.drag.release(),
            },
            WindowEvent::CursorMoved { position, .. } => {
                let action = self
                    .state
                    .drag
                    .moved(Vec2::new(position.x as f32, position.y as f32));
                self.state.apply(action);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                self.state.apply(action_for_scroll(lines));
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
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

    tracing::info!("electric-desktop starting");

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    let scene = ElectricScene::new(config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(scene);
    event_loop.run_app(&mut app)?;

    Ok(())
}
