use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::bytes_of;
use glam::{Mat3, Vec3};
use log::{info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use super::diagnostics::checked;
use super::mesh::MeshLibrary;
use super::pipelines::{choose_sample_count, BindLayouts, Pipelines, MAIN_DEPTH_FORMAT};
use super::shadow::ShadowMap;
use super::uniforms::{DepthGlobals, LitGlobals, ObjectConstants};
use crate::config::CLEAR_COLOR;
use crate::frame::{DepthPassPlan, LitPassPlan, RenderBackend};
use crate::scene::LoadedMesh;

/// wgpu implementation of [`RenderBackend`] drawing into a window surface.
///
/// A frame is bracketed by [`Renderer::begin_frame`] and
/// [`Renderer::present`]; pass calls outside that bracket are ignored.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    depth: ScreenTexture,
    /// Multisampled color target resolved into the surface; `None` when
    /// the adapter only renders single-sampled.
    msaa: Option<ScreenTexture>,
    shadow: ShadowMap,
    layouts: BindLayouts,
    pipelines: Pipelines,
    depth_globals: wgpu::Buffer,
    depth_globals_group: wgpu::BindGroup,
    lit_globals: wgpu::Buffer,
    lit_globals_group: wgpu::BindGroup,
    depth_debug_group: wgpu::BindGroup,
    meshes: MeshLibrary,
    wireframe: bool,
    frame: Option<InFlightFrame>,
}

struct InFlightFrame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// What the overlay needs to record its own pass into the current frame.
pub struct OverlayTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    pub size_in_pixels: [u32; 2],
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        meshes: &[LoadedMesh],
        shadow_size: u32,
    ) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        let adapter_info = adapter.get_info();
        info!("using adapter {} ({:?})", adapter_info.name, adapter_info.backend);

        let line_mode = adapter
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("viewer-device"),
                required_features: if line_mode {
                    wgpu::Features::POLYGON_MODE_LINE
                } else {
                    wgpu::Features::empty()
                },
                required_limits: wgpu::Limits::default(),
                experimental_features: Default::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;
        info!("surface format {surface_format:?}");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let sample_count = choose_sample_count(|count| {
            [surface_format, MAIN_DEPTH_FORMAT].iter().all(|format| {
                adapter
                    .get_texture_format_features(*format)
                    .flags
                    .sample_count_supported(count)
            })
        });
        info!("screen passes use {sample_count}x multisampling");

        let (depth, msaa) = screen_targets(&device, &config, sample_count);
        let shadow = ShadowMap::create(&device, shadow_size);
        let layouts = BindLayouts::new(&device);
        let pipelines = checked(&device, "pipeline creation", || {
            Pipelines::new(&device, &layouts, surface_format, sample_count, line_mode)
        });

        let depth_globals = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("depth-globals"),
            size: std::mem::size_of::<DepthGlobals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let depth_globals_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("depth-globals-group"),
            layout: &layouts.depth_globals,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: depth_globals.as_entire_binding(),
            }],
        });
        let lit_globals = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lit-globals"),
            size: std::mem::size_of::<LitGlobals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lit_globals_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lit-globals-group"),
            layout: &layouts.lit_globals,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: lit_globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shadow.sampler),
                },
            ],
        });
        let depth_debug_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("depth-debug-group"),
            layout: &layouts.depth_debug,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&shadow.view),
            }],
        });

        let meshes = MeshLibrary::upload(&device, meshes);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            sample_count,
            depth,
            msaa,
            shadow,
            layouts,
            pipelines,
            depth_globals,
            depth_globals_group,
            lit_globals,
            lit_globals_group,
            depth_debug_group,
            meshes,
            wireframe: false,
            frame: None,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Reconfigures the swap chain and the screen-sized targets.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        (self.depth, self.msaa) = screen_targets(&self.device, &self.config, self.sample_count);
    }

    pub fn set_wireframe(&mut self, enabled: bool) {
        if enabled && self.pipelines.lit_wireframe.is_none() {
            warn!("wireframe mode requested but not supported by this GPU");
            return;
        }
        self.wireframe = enabled;
    }

    /// Acquires the next surface texture and opens a command encoder.
    pub fn begin_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        self.frame = Some(InFlightFrame {
            output,
            view,
            encoder,
        });
        Ok(())
    }

    pub fn overlay_target(&mut self) -> Option<OverlayTarget<'_>> {
        let frame = self.frame.as_mut()?;
        Some(OverlayTarget {
            device: &self.device,
            queue: &self.queue,
            encoder: &mut frame.encoder,
            view: &frame.view,
            size_in_pixels: [self.config.width, self.config.height],
        })
    }

    /// Submits the recorded passes and shows the frame.
    pub fn present(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.output.present();
    }

    /// Drops any unfinished frame and frees the shadow map.
    pub fn shutdown(&mut self) {
        self.frame = None;
        self.shadow.destroy();
        info!("released shadow map ({0}x{0})", self.shadow.size);
    }

    fn object_group(&self, constants: &ObjectConstants) -> wgpu::BindGroup {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("object-uniform"),
                contents: bytes_of(constants),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object-group"),
            layout: &self.layouts.object,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }
}

impl RenderBackend for Renderer {
    fn depth_pass(&mut self, plan: &DepthPassPlan) {
        if self.frame.is_none() {
            warn!("depth pass requested outside a frame");
            return;
        }
        self.queue.write_buffer(
            &self.depth_globals,
            0,
            bytes_of(&DepthGlobals::from(&plan.uniforms)),
        );
        let groups: Vec<_> = plan
            .draws
            .iter()
            .map(|draw| {
                self.object_group(&ObjectConstants::new(draw.model, Mat3::IDENTITY, Vec3::ONE))
            })
            .collect();

        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let size = self.shadow.size as f32;
        checked(&self.device, "shadow depth pass", || {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow-depth-pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_viewport(0.0, 0.0, size, size, 0.0, 1.0);
            pass.set_pipeline(&self.pipelines.depth);
            pass.set_bind_group(0, &self.depth_globals_group, &[]);
            for (draw, group) in plan.draws.iter().zip(&groups) {
                pass.set_bind_group(1, group, &[]);
                self.meshes.get(draw.mesh).draw(&mut pass);
            }
        });
    }

    fn depth_debug_pass(&mut self) {
        let Some(frame) = self.frame.as_mut() else {
            warn!("depth debug pass requested outside a frame");
            return;
        };
        checked(&self.device, "depth debug pass", || {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("depth-debug-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipelines.depth_debug);
            pass.set_bind_group(0, &self.depth_debug_group, &[]);
            pass.draw(0..3, 0..1);
        });
    }

    fn shaded_pass(&mut self, plan: &LitPassPlan) {
        if self.frame.is_none() {
            warn!("shaded pass requested outside a frame");
            return;
        }
        self.queue.write_buffer(
            &self.lit_globals,
            0,
            bytes_of(&LitGlobals::from(&plan.uniforms)),
        );
        let draw_groups: Vec<_> = plan
            .draws
            .iter()
            .map(|draw| {
                let color = self.meshes.get(draw.mesh).color;
                self.object_group(&ObjectConstants::new(draw.model, draw.normal_matrix, color))
            })
            .collect();
        let marker_groups: Vec<_> = plan
            .markers
            .iter()
            .map(|marker| {
                self.object_group(&ObjectConstants::new(marker.model, Mat3::IDENTITY, marker.color))
            })
            .collect();
        let lit_pipeline = match (&self.pipelines.lit_wireframe, self.wireframe) {
            (Some(wireframe), true) => wireframe,
            _ => &self.pipelines.lit,
        };

        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let [r, g, b] = CLEAR_COLOR;
        let (view, resolve_target) = match &self.msaa {
            Some(msaa) => (&msaa.view, Some(&frame.view)),
            None => (&frame.view, None),
        };
        checked(&self.device, "shaded pass", || {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shaded-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(lit_pipeline);
            pass.set_bind_group(0, &self.lit_globals_group, &[]);
            for (draw, group) in plan.draws.iter().zip(&draw_groups) {
                pass.set_bind_group(1, group, &[]);
                self.meshes.get(draw.mesh).draw(&mut pass);
            }

            if !plan.markers.is_empty() {
                pass.set_pipeline(&self.pipelines.marker);
                for (marker, group) in plan.markers.iter().zip(&marker_groups) {
                    pass.set_bind_group(1, group, &[]);
                    self.meshes.get(marker.mesh).draw(&mut pass);
                }
            }

            pass.set_pipeline(&self.pipelines.sky);
            pass.draw(0..3, 0..1);
        });
    }
}

fn screen_targets(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> (ScreenTexture, Option<ScreenTexture>) {
    let (width, height) = (config.width, config.height);
    let depth = ScreenTexture::create(
        device,
        "screen-depth",
        MAIN_DEPTH_FORMAT,
        width,
        height,
        sample_count,
    );
    let msaa = (sample_count > 1).then(|| {
        ScreenTexture::create(device, "screen-msaa", config.format, width, height, sample_count)
    });
    (depth, msaa)
}

struct ScreenTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl ScreenTexture {
    fn create(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}
