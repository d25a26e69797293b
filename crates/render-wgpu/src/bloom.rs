use crate::gpu::HDR_FORMAT;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use electric_render::BloomSettings;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct BloomUniforms {
    threshold: f32,
    intensity: f32,
    radius: f32,
    exposure: f32,
    texel: [f32; 4],
}

impl BloomUniforms {
    pub(crate) fn new(settings: &BloomSettings, half: (u32, u32), direction: [f32; 2]) -> Self {
        Self {
            threshold: settings.threshold,
            intensity: settings.effective_intensity(),
            radius: settings.radius,
            exposure: settings.exposure,
            texel: [
                1.0 / half.0 as f32,
                1.0 / half.1 as f32,
                direction[0],
                direction[1],
            ],
        }
    }
}

pub(crate) fn half_extent(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

struct BloomTargets {
    ping: wgpu::TextureView,
    pong: wgpu::TextureView,
    bright_group: wgpu::BindGroup,
    blur_h_group: wgpu::BindGroup,
    blur_v_group: wgpu::BindGroup,
    composite_group: wgpu::BindGroup,
    half: (u32, u32),
}

/// Bright pass, separable blur at half resolution, then additive composite
/// with ACES tone mapping into the output surface.
pub struct BloomPass {
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    stage_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_h: wgpu::Buffer,
    uniform_v: wgpu::Buffer,
    targets: BloomTargets,
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    source: String,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_fullscreen"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn color_target(device: &wgpu::Device, label: &str, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

impl BloomPass {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        scene_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> Self {
        let stage_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom_stage_layout"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2)],
        });
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom_composite_layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(2),
                texture_entry(3),
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let settings = BloomSettings::default();
        let half = half_extent(width, height);
        let uniform_h = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom_uniform_h"),
            contents: bytemuck::bytes_of(&BloomUniforms::new(&settings, half, [1.0, 0.0])),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_v = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom_uniform_v"),
            contents: bytemuck::bytes_of(&BloomUniforms::new(&settings, half, [0.0, 1.0])),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bright_pipeline = fullscreen_pipeline(
            device,
            "bloom_bright_pipeline",
            &stage_layout,
            shaders::bright_shader(),
            HDR_FORMAT,
        );
        let blur_pipeline = fullscreen_pipeline(
            device,
            "bloom_blur_pipeline",
            &stage_layout,
            shaders::blur_shader(),
            HDR_FORMAT,
        );
        let composite_pipeline = fullscreen_pipeline(
            device,
            "bloom_composite_pipeline",
            &composite_layout,
            shaders::composite_shader(),
            output_format,
        );

        let targets = Self::create_targets(
            device,
            &stage_layout,
            &composite_layout,
            &sampler,
            &uniform_h,
            &uniform_v,
            scene_view,
            width,
            height,
        );

        Self {
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            stage_layout,
            composite_layout,
            sampler,
            uniform_h,
            uniform_v,
            targets,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create_targets(
        device: &wgpu::Device,
        stage_layout: &wgpu::BindGroupLayout,
        composite_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        uniform_h: &wgpu::Buffer,
        uniform_v: &wgpu::Buffer,
        scene_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> BloomTargets {
        let half = half_extent(width, height);
        let ping = color_target(device, "bloom_ping", half.0, half.1);
        let pong = color_target(device, "bloom_pong", half.0, half.1);

        let stage_group = |label: &str, source: &wgpu::TextureView, uniform: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: stage_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniform.as_entire_binding(),
                    },
                ],
            })
        };

        let bright_group = stage_group("bloom_bright_group", scene_view, uniform_h);
        let blur_h_group = stage_group("bloom_blur_h_group", &ping, uniform_h);
        let blur_v_group = stage_group("bloom_blur_v_group", &pong, uniform_v);

        let composite_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom_composite_group"),
            layout: composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_h.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&ping),
                },
            ],
        });

        BloomTargets {
            ping,
            pong,
            bright_group,
            blur_h_group,
            blur_v_group,
            composite_group,
            half,
        }
    }

    /// Rebuild the half-resolution targets after the scene target changed.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        scene_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        self.targets = Self::create_targets(
            device,
            &self.stage_layout,
            &self.composite_layout,
            &self.sampler,
            &self.uniform_h,
            &self.uniform_v,
            scene_view,
            width,
            height,
        );
        tracing::debug!(half = ?self.targets.half, "bloom targets resized");
    }

    /// Record the bloom chain into `encoder`, writing the final image to `output`.
    pub fn encode(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        settings: &BloomSettings,
    ) {
        let settings = settings.sanitized();
        let half = self.targets.half;
        queue.write_buffer(
            &self.uniform_h,
            0,
            bytemuck::bytes_of(&BloomUniforms::new(&settings, half, [1.0, 0.0])),
        );
        queue.write_buffer(
            &self.uniform_v,
            0,
            bytemuck::bytes_of(&BloomUniforms::new(&settings, half, [0.0, 1.0])),
        );

        if settings.enabled {
            self.fullscreen(
                encoder,
                "bloom_bright_pass",
                &self.bright_pipeline,
                &self.targets.bright_group,
                &self.targets.ping,
            );
            self.fullscreen(
                encoder,
                "bloom_blur_h_pass",
                &self.blur_pipeline,
                &self.targets.blur_h_group,
                &self.targets.pong,
            );
            self.fullscreen(
                encoder,
                "bloom_blur_v_pass",
                &self.blur_pipeline,
                &self.targets.blur_v_group,
                &self.targets.ping,
            );
        }

        self.fullscreen(
            encoder,
            "bloom_composite_pass",
            &self.composite_pipeline,
            &self.targets.composite_group,
            output,
        );
    }

    fn fullscreen(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        group: &wgpu::BindGroup,
        target: &wgpu::TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layout_matches_wgsl() {
        assert_eq!(std::mem::size_of::<BloomUniforms>(), 32);
    }

    #[test]
    fn half_extent_never_zero() {
        assert_eq!(half_extent(1280, 720), (640, 360));
        assert_eq!(half_extent(1, 1), (1, 1));
        assert_eq!(half_extent(0, 0), (1, 1));
    }

    #[test]
    fn disabled_bloom_zeroes_intensity() {
        let settings = BloomSettings {
            enabled: false,
            ..Default::default()
        };
        let u = BloomUniforms::new(&settings, (640, 360), [1.0, 0.0]);
        assert_eq!(u.intensity, 0.0);
        assert_eq!(u.texel[2], 1.0);
        assert!((u.texel[0] - 1.0 / 640.0).abs() < 1e-9);
    }
}
