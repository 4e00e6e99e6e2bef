use std::num::NonZeroU64;

use log::warn;

use super::mesh::vertex_layout;
use super::shaders;
use super::shadow::ShadowMap;
use super::uniforms::{DepthGlobals, LitGlobals, ObjectConstants};

/// Format of the on-screen depth buffer.
pub const MAIN_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Multisample count the shaded pass asks for.
pub const MSAA_SAMPLES: u32 = 4;

/// Picks [`MSAA_SAMPLES`] when `supported` allows it, otherwise single-sampled.
pub fn choose_sample_count(supported: impl Fn(u32) -> bool) -> u32 {
    if supported(MSAA_SAMPLES) {
        MSAA_SAMPLES
    } else {
        1
    }
}

pub struct BindLayouts {
    pub depth_globals: wgpu::BindGroupLayout,
    pub lit_globals: wgpu::BindGroupLayout,
    pub object: wgpu::BindGroupLayout,
    pub depth_debug: wgpu::BindGroupLayout,
}

impl BindLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let depth_texture = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Depth,
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        Self {
            depth_globals: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("depth-globals-layout"),
                entries: &[uniform_entry::<DepthGlobals>(0, wgpu::ShaderStages::VERTEX)],
            }),
            lit_globals: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("lit-globals-layout"),
                entries: &[
                    uniform_entry::<LitGlobals>(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                    depth_texture(1),
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                        count: None,
                    },
                ],
            }),
            object: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("object-layout"),
                entries: &[uniform_entry::<ObjectConstants>(
                    0,
                    wgpu::ShaderStages::VERTEX_FRAGMENT,
                )],
            }),
            depth_debug: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("depth-debug-layout"),
                entries: &[depth_texture(0)],
            }),
        }
    }
}

fn uniform_entry<T>(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

/// Every pipeline the renderer uses, one per shader role.
pub struct Pipelines {
    pub depth: wgpu::RenderPipeline,
    pub lit: wgpu::RenderPipeline,
    /// Present only when the device supports line polygon mode. The lit,
    /// wireframe, marker and sky pipelines share the screen sample count.
    pub lit_wireframe: Option<wgpu::RenderPipeline>,
    pub marker: wgpu::RenderPipeline,
    pub sky: wgpu::RenderPipeline,
    pub depth_debug: wgpu::RenderPipeline,
}

struct PipelineDesc<'a> {
    label: &'a str,
    source: &'a str,
    layouts: &'a [&'a wgpu::BindGroupLayout],
    vertex: Option<wgpu::VertexBufferLayout<'static>>,
    color_format: Option<wgpu::TextureFormat>,
    depth: Option<wgpu::DepthStencilState>,
    polygon_mode: wgpu::PolygonMode,
    sample_count: u32,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindLayouts,
        color_format: wgpu::TextureFormat,
        sample_count: u32,
        line_mode: bool,
    ) -> Self {
        let scene_depth = |compare, write| wgpu::DepthStencilState {
            format: MAIN_DEPTH_FORMAT,
            depth_write_enabled: write,
            depth_compare: compare,
            stencil: Default::default(),
            bias: Default::default(),
        };
        let lit_layouts = [&layouts.lit_globals, &layouts.object];
        let lit = |label, polygon_mode| PipelineDesc {
            label,
            source: shaders::LIT,
            layouts: &lit_layouts,
            vertex: Some(vertex_layout(true)),
            color_format: Some(color_format),
            depth: Some(scene_depth(wgpu::CompareFunction::Less, true)),
            polygon_mode,
            sample_count,
        };

        let lit_wireframe = if line_mode {
            Some(build(device, lit("lit-wireframe", wgpu::PolygonMode::Line)))
        } else {
            warn!("GPU lacks POLYGON_MODE_LINE; wireframe toggle disabled");
            None
        };

        Self {
            depth: build(
                device,
                PipelineDesc {
                    label: "shadow-depth",
                    source: shaders::DEPTH,
                    layouts: &[&layouts.depth_globals, &layouts.object],
                    vertex: Some(vertex_layout(false)),
                    color_format: None,
                    depth: Some(wgpu::DepthStencilState {
                        format: ShadowMap::FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: Default::default(),
                        bias: wgpu::DepthBiasState {
                            constant: 2,
                            slope_scale: 2.0,
                            clamp: 0.0,
                        },
                    }),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    sample_count: 1,
                },
            ),
            lit: build(device, lit("lit", wgpu::PolygonMode::Fill)),
            lit_wireframe,
            marker: build(
                device,
                PipelineDesc {
                    label: "light-marker",
                    source: shaders::MARKER,
                    layouts: &lit_layouts,
                    vertex: Some(vertex_layout(false)),
                    color_format: Some(color_format),
                    depth: Some(scene_depth(wgpu::CompareFunction::Less, true)),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    sample_count,
                },
            ),
            sky: build(
                device,
                PipelineDesc {
                    label: "sky",
                    source: shaders::SKY,
                    layouts: &[&layouts.lit_globals],
                    vertex: None,
                    color_format: Some(color_format),
                    depth: Some(scene_depth(wgpu::CompareFunction::LessEqual, false)),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    sample_count,
                },
            ),
            depth_debug: build(
                device,
                PipelineDesc {
                    label: "depth-debug",
                    source: shaders::DEPTH_DEBUG,
                    layouts: &[&layouts.depth_debug],
                    vertex: None,
                    color_format: Some(color_format),
                    depth: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    // draws straight into the swap chain image
                    sample_count: 1,
                },
            ),
        }
    }
}

fn build(device: &wgpu::Device, desc: PipelineDesc<'_>) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(desc.source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.layouts,
        push_constant_ranges: &[],
    });
    let buffers: Vec<wgpu::VertexBufferLayout<'static>> = desc.vertex.into_iter().collect();
    let targets = [desc.color_format.map(|format| wgpu::ColorTargetState {
        format,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    })];
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: desc.polygon_mode,
            ..Default::default()
        },
        depth_stencil: desc.depth,
        multisample: wgpu::MultisampleState {
            count: desc.sample_count,
            ..Default::default()
        },
        fragment: desc.color_format.map(|_| wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &targets,
        }),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_four_samples_when_available() {
        assert_eq!(choose_sample_count(|count| count <= 8), 4);
        assert_eq!(choose_sample_count(|count| count == 1), 1);
    }
}
