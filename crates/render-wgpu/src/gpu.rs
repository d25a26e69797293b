use crate::bloom::BloomPass;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use electric_common::{InstanceTransform, Rgb, SurfaceStyle};
use electric_kernel::ElectricScene;
use electric_render::{BloomSettings, RenderView, Star};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

/// Offscreen scene color format. Emissive cubes exceed 1.0 before tone mapping.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct SceneUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    ambient: [f32; 4],
    sun_dir: [f32; 4],
    sun_color: [f32; 4],
    point_light: [f32; 4],
}

fn radiance(hex: u32, intensity: f32) -> [f32; 4] {
    let c = Rgb::from_hex(hex).to_linear().scaled(intensity);
    [c.r, c.g, c.b, 1.0]
}

impl SceneUniforms {
    /// Ambient fill, a cool key light from (50, 30, 20) and a glow at the origin.
    pub(crate) fn new(view_proj: Mat4, eye: Vec3) -> Self {
        let sun = Vec3::new(50.0, 30.0, 20.0).normalize();
        let mut point_light = radiance(0xaaccff, 2.0);
        point_light[3] = 200.0;
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: eye.extend(1.0).to_array(),
            ambient: radiance(0x2a2a4e, 0.2),
            sun_dir: sun.extend(0.0).to_array(),
            sun_color: radiance(0x8bb8ff, 0.6),
            point_light,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
    emissive: [f32; 4],
}

impl InstanceData {
    fn new(transform: &InstanceTransform, tint: Rgb, style: &SurfaceStyle) -> Self {
        let cols = transform.to_matrix().to_cols_array_2d();
        let base = style.base.to_linear();
        let tint = tint.to_linear();
        let glow = style.radiance();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color: [base.r * tint.r, base.g * tint.g, base.b * tint.b, 1.0],
            emissive: [glow.r, glow.g, glow.b, 1.0],
        }
    }
}

/// Core cube first, then every ring in scene order.
pub(crate) fn pack_instances(scene: &ElectricScene, out: &mut Vec<InstanceData>) {
    out.clear();
    out.push(InstanceData::new(
        &scene.core_cube(),
        Rgb::WHITE,
        scene.core_style(),
    ));
    for ring in scene.rings() {
        let style = ring.style();
        out.extend(
            ring.states()
                .iter()
                .map(|state| InstanceData::new(&state.transform, state.color, style)),
        );
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct StarVertex {
    position: [f32; 3],
    color: [f32; 3],
}

impl From<&Star> for StarVertex {
    fn from(star: &Star) -> Self {
        Self {
            position: star.position.to_array(),
            color: star.color.to_linear().to_array(),
        }
    }
}

/// Generate unit cube vertices and indices.
fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex { position: [-p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [-p,  p,  p], normal: [0.0, 0.0, 1.0] },
        // -Z face
        Vertex { position: [ p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 0.0, -1.0] },
        // +X face
        Vertex { position: [ p, -p,  p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [1.0, 0.0, 0.0] },
        // -X face
        Vertex { position: [-p, -p, -p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [-1.0, 0.0, 0.0] },
        // +Y face
        Vertex { position: [-p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 1.0, 0.0] },
        // -Y face
        Vertex { position: [-p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [0.0, -1.0, 0.0] },
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        8,9,10, 10,11,8,    // +X
        12,13,14, 14,15,12, // -X
        16,17,18, 18,19,16, // +Y
        20,21,22, 22,23,20, // -Y
    ];
    (vertices, indices)
}

fn instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: (capacity.max(1) * std::mem::size_of::<InstanceData>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// wgpu-based scene renderer.
pub struct WgpuRenderer {
    cube_pipeline: wgpu::RenderPipeline,
    star_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cube_vertex_buffer: wgpu::Buffer,
    cube_index_buffer: wgpu::Buffer,
    cube_index_count: u32,
    star_vertex_buffer: wgpu::Buffer,
    star_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instances: Vec<InstanceData>,
    hdr_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    bloom: BloomPass,
    surface_format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        stars: &[Star],
    ) -> Self {
        let (width, height) = (width.max(1), height.max(1));

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene_uniform_buffer"),
            contents: bytemuck::bytes_of(&SceneUniforms::new(Mat4::IDENTITY, Vec3::ZERO)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let cube_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cube_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::CUBE_SHADER.into()),
        });

        let cube_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cube_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &cube_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                            7 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &cube_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let star_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("star_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::STAR_SHADER.into()),
        });

        let star_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("star_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &star_shader,
                entry_point: Some("vs_star"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<StarVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &star_shader,
                entry_point: Some("fs_star"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let (cube_verts, cube_indices) = cube_mesh();
        let cube_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertex_buffer"),
            contents: bytemuck::cast_slice(&cube_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_index_buffer"),
            contents: bytemuck::cast_slice(&cube_indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let cube_index_count = cube_indices.len() as u32;

        let mut star_verts: Vec<StarVertex> = stars.iter().map(StarVertex::from).collect();
        if star_verts.is_empty() {
            // Zero-sized vertex buffers are rejected; keep one point behind the camera's far plane.
            star_verts.push(StarVertex {
                position: [0.0, 0.0, 1.0e6],
                color: [0.0; 3],
            });
        }
        let star_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("star_vertex_buffer"),
            contents: bytemuck::cast_slice(&star_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let star_count = stars.len() as u32;

        let instance_capacity = 1024;
        let instance_buffer = instance_buffer(device, instance_capacity);

        let hdr_view = Self::create_target(device, "hdr_target", HDR_FORMAT, width, height, true);
        let depth_view =
            Self::create_target(device, "depth_texture", DEPTH_FORMAT, width, height, false);
        let bloom = BloomPass::new(device, surface_format, &hdr_view, width, height);

        tracing::info!(
            stars = star_count,
            width,
            height,
            format = ?surface_format,
            "wgpu renderer ready"
        );

        Self {
            cube_pipeline,
            star_pipeline,
            uniform_buffer,
            uniform_bind_group,
            cube_vertex_buffer,
            cube_index_buffer,
            cube_index_count,
            star_vertex_buffer,
            star_count,
            instance_buffer,
            instance_capacity,
            instances: Vec::with_capacity(instance_capacity),
            hdr_view,
            depth_view,
            bloom,
            surface_format,
            width,
            height,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.width = width;
        self.height = height;
        self.hdr_view = Self::create_target(device, "hdr_target", HDR_FORMAT, width, height, true);
        self.depth_view =
            Self::create_target(device, "depth_texture", DEPTH_FORMAT, width, height, false);
        self.bloom.resize(device, &self.hdr_view, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Render one frame: starfield, core cube and ring cubes, then bloom into `output`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output: &wgpu::TextureView,
        scene: &ElectricScene,
        view: &RenderView,
        bloom: &BloomSettings,
    ) {
        let vp = view.view_projection(self.aspect());
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&SceneUniforms::new(vp, view.eye)),
        );

        pack_instances(scene, &mut self.instances);
        if self.instances.len() > self.instance_capacity {
            self.instance_capacity = self.instances.len().next_power_of_two();
            self.instance_buffer = instance_buffer(device, self.instance_capacity);
            tracing::debug!(capacity = self.instance_capacity, "grew instance buffer");
        }
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&self.instances),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.hdr_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            pass.set_pipeline(&self.cube_pipeline);
            pass.set_vertex_buffer(0, self.cube_vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            pass.set_index_buffer(self.cube_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..self.cube_index_count, 0, 0..self.instances.len() as u32);

            // Stars after cubes so the depth test hides the ones behind geometry.
            if self.star_count > 0 {
                pass.set_pipeline(&self.star_pipeline);
                pass.set_vertex_buffer(0, self.star_vertex_buffer.slice(..));
                pass.draw(0..self.star_count, 0..1);
            }
        }

        self.bloom.encode(queue, &mut encoder, output, bloom);
        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_target(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sampled: bool,
    ) -> wgpu::TextureView {
        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if sampled {
            usage |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
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
            format,
            usage,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use electric_kernel::SceneConfig;

    #[test]
    fn gpu_struct_sizes() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 96);
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 144);
        assert_eq!(std::mem::size_of::<StarVertex>(), 24);
    }

    #[test]
    fn packs_core_then_rings() {
        let scene = ElectricScene::new(SceneConfig::default()).unwrap();
        let mut out = Vec::new();
        pack_instances(&scene, &mut out);
        assert_eq!(out.len(), scene.instance_count());

        // Core cube scale lives on the matrix diagonal at t = 0.
        assert!((out[0].model_0[0] - 45.0).abs() < 1e-3);

        let first_ring = scene.rings()[0].states()[0].transform.position;
        assert_eq!(out[1].model_3[..3], first_ring.to_array());
    }

    #[test]
    fn pack_reuses_buffer() {
        let mut scene = ElectricScene::new(SceneConfig::default()).unwrap();
        let mut out = Vec::new();
        pack_instances(&scene, &mut out);
        let ptr = out.as_ptr();
        scene.tick(0.016);
        pack_instances(&scene, &mut out);
        assert_eq!(ptr, out.as_ptr());
    }

    #[test]
    fn emissive_carries_intensity() {
        let style = SurfaceStyle::default();
        let data = InstanceData::new(&InstanceTransform::default(), Rgb::WHITE, &style);
        let glow = style.emissive.to_linear().scaled(style.emissive_intensity);
        assert_eq!(data.emissive, [glow.r, glow.g, glow.b, 1.0]);
        assert!(data.emissive[2] > 1.0);
    }

    #[test]
    fn lights_are_linear_and_normalized() {
        let u = SceneUniforms::new(Mat4::IDENTITY, Vec3::ZERO);
        let sun = Vec3::new(u.sun_dir[0], u.sun_dir[1], u.sun_dir[2]);
        assert!((sun.length() - 1.0).abs() < 1e-6);
        assert_eq!(u.point_light[3], 200.0);
        assert!(u.ambient[0] < 0.2 * 0.2);
    }
}
