use anyhow::Context;
use cfg_if::cfg_if;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use wgpu::util::{DeviceExt, StagingBelt};

mod camera;
use camera::{Camera, CameraController, CameraUniform};

pub mod config;
use config::{Tessellation, ViewerConfig};

pub mod draw;
use draw::SolidPipelines;

pub mod mesh;
use mesh::GpuSphere;

/// First entry of a surface capability list, or an error naming the empty list
fn first_supported<T: Copy>(values: &[T], what: &str) -> anyhow::Result<T> {
    values
        .first()
        .copied()
        .with_context(|| format!("surface reports no supported {what}"))
}

struct State<'a> {
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    pipelines: SolidPipelines,
    sphere: GpuSphere,
    radius: f32,
    textured: bool,
    camera: Camera,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    camera_controller: CameraController,
    staging_belt: StagingBelt,
}

impl<'a> State<'a> {
    async fn new(window: Arc<Window>, viewer: &ViewerConfig) -> anyhow::Result<State<'a>> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::all(),
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        log::info!("Creating surface for window");

        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible graphics adapter")?;

        log::info!("Got adapter {:?}, requesting device", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    label: None,
                },
                None,
            )
            .await
            .context("failed to request device")?;

        let surface_caps = surface.get_capabilities(&adapter);

        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .map_or_else(|| first_supported(&surface_caps.formats, "formats"), Ok)?;
        let present_mode = first_supported(&surface_caps.present_modes, "present modes")?;
        let alpha_mode = first_supported(&surface_caps.alpha_modes, "alpha modes")?;

        // Ensure we don't configure with zero dimensions and respect texture size limits
        let max_texture_size = device.limits().max_texture_dimension_2d;
        let width = size.width.max(1).min(max_texture_size);
        let height = size.height.max(1).min(max_texture_size);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        log::info!(
            "Surface configured: {}x{}, format: {:?}",
            width,
            height,
            surface_format
        );

        let radius = viewer.radius;
        let sphere = GpuSphere::new(&device, radius, viewer.tessellation())?;

        let camera = Camera::new(
            (0.0, -4.0 * radius, 0.0),
            (0.0, 0.0, 0.0),
            cgmath::Vector3::unit_z(),
            width as f32 / height as f32,
            45.0,
            0.01 * radius,
            100.0 * radius,
        );
        let camera_controller = CameraController::new(radius);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Solid Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("solid.wgsl").into()),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Solid Pipeline Layout"),
                bind_group_layouts: &[&camera_bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipelines = SolidPipelines::new(&device, &render_pipeline_layout, &shader, config.format);

        log::info!("Render pipelines created");

        let staging_belt = StagingBelt::new(1024);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            pipelines,
            sphere,
            radius,
            textured: viewer.textured,
            camera,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            camera_controller,
            staging_belt,
        })
    }

    /// Regenerate the sphere with a new slice/stack count
    fn retessellate(&mut self, tessellation: Tessellation) {
        if tessellation == self.sphere.tessellation() {
            return;
        }
        match GpuSphere::new(&self.device, self.radius, tessellation) {
            Ok(sphere) => self.sphere = sphere,
            Err(err) => log::error!("{err:#}"),
        }
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                if *state == winit::event::ElementState::Pressed {
                    let current = self.sphere.tessellation();
                    let next = match key {
                        KeyCode::BracketRight => Some(current.with_slices_delta(1)),
                        KeyCode::BracketLeft => Some(current.with_slices_delta(-1)),
                        KeyCode::Equal => Some(current.with_stacks_delta(1)),
                        KeyCode::Minus => Some(current.with_stacks_delta(-1)),
                        _ => None,
                    };
                    if let Some(next) = next {
                        self.retessellate(next);
                        return true;
                    }
                    if *key == KeyCode::KeyT {
                        self.textured = !self.textured;
                        return true;
                    }
                }

                self.camera_controller.process_keyboard(*key, *state)
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if *button == winit::event::MouseButton::Left {
                    self.camera_controller.process_mouse_button(*state);
                    true
                } else {
                    false
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.camera_controller.process_cursor_move(*position);
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.camera_controller.process_scroll(*delta);
                true
            }
            _ => false,
        }
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            let max_texture_size = self.device.limits().max_texture_dimension_2d;
            let width = new_size.width.max(1).min(max_texture_size);
            let height = new_size.height.max(1).min(max_texture_size);

            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);

            self.camera
                .update_aspect_ratio(width as f32 / height as f32);
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.camera_controller.update_camera(&mut self.camera);
        self.camera_uniform.update_view_proj(&self.camera);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let camera_uniform_array = [self.camera_uniform];
            let camera_data: &[u8] = bytemuck::cast_slice(&camera_uniform_array);
            if let Some(size) = wgpu::BufferSize::new(camera_data.len() as u64) {
                let mut camera_view = self.staging_belt.write_buffer(
                    &mut encoder,
                    &self.camera_buffer,
                    0,
                    size,
                    &self.device,
                );
                camera_view.copy_from_slice(camera_data);
            }
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sphere Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.06,
                            b: 0.08,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            let geometry = self.sphere.solid_geometry(self.textured);
            draw::draw_solid(&mut render_pass, &self.pipelines, &geometry);
        }

        // Finish staging belt before submitting commands
        self.staging_belt.finish();

        self.queue.submit(std::iter::once(encoder.finish()));

        // Recall staging belt after submission to reuse buffers
        self.staging_belt.recall();

        output.present();

        Ok(())
    }
}

struct App {
    viewer: ViewerConfig,
    state: Rc<RefCell<Option<State<'static>>>>,
    window: Option<Arc<Window>>,
}

impl App {
    fn new(viewer: ViewerConfig) -> Self {
        Self {
            viewer,
            state: Rc::new(RefCell::new(None)),
            window: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.borrow().is_some() {
            return;
        }

        let mut window_attributes = Window::default_attributes();
        window_attributes = window_attributes.with_title(self.viewer.title.clone());

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = web_sys::window()
                .and_then(|win| win.document())
                .and_then(|doc| doc.get_element_by_id("wasm-canvas"))
                .and_then(|canvas| canvas.dyn_into::<web_sys::HtmlCanvasElement>().ok());
            if canvas.is_none() {
                log::warn!("No #wasm-canvas element found, letting winit create one");
            }

            window_attributes = window_attributes.with_canvas(canvas);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        cfg_if! {
            if #[cfg(target_arch = "wasm32")] {
                // For WASM, use shared reference to store state
                let state_ref = Rc::clone(&self.state);
                let viewer = self.viewer.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match State::new(window, &viewer).await {
                        Ok(new_state) => {
                            *state_ref.borrow_mut() = Some(new_state);
                            log::info!("Successfully created and stored WASM state");
                        }
                        Err(err) => log::error!("Failed to initialise renderer: {err:#}"),
                    }
                });
            } else {
                match pollster::block_on(State::new(window, &self.viewer)) {
                    Ok(new_state) => *self.state.borrow_mut() = Some(new_state),
                    Err(err) => {
                        log::error!("Failed to initialise renderer: {err:#}");
                        event_loop.exit();
                    }
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(window) = &self.window else {
            return;
        };
        if window.id() != id {
            return;
        }

        // Process input first
        if let Some(state) = self.state.borrow_mut().as_mut() {
            if state.input(&event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(physical_size) => {
                if let Some(state) = self.state.borrow_mut().as_mut() {
                    state.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(state) = self.state.borrow_mut().as_mut() {
                    match state.render() {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            state.resize(state.size)
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("OutOfMemory");
                            event_loop.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            log::warn!("Surface timeout")
                        }
                    }
                } else {
                    log::debug!("Renderer state not ready yet");
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn start(viewer: ViewerConfig) -> anyhow::Result<()> {
    viewer.validate()?;
    log::info!(
        "Starting viewer: radius {}, {} slices, {} stacks",
        viewer.radius,
        viewer.slices,
        viewer.stacks
    );

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = App::new(viewer);
    event_loop.run_app(&mut app).context("event loop terminated with an error")?;
    Ok(())
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn run() {
    cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            // A logger may already be installed by the host page
            let _ = console_log::init_with_level(log::Level::Warn);
        } else {
            env_logger::init();
        }
    }

    #[cfg(target_arch = "wasm32")]
    let viewer = ViewerConfig::default();
    #[cfg(not(target_arch = "wasm32"))]
    let viewer = <ViewerConfig as clap::Parser>::parse();

    if let Err(err) = start(viewer) {
        log::error!("{err:#}");
        #[cfg(not(target_arch = "wasm32"))]
        std::process::exit(1);
    }
}
