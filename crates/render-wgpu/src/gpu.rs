use crate::mesh::{Mesh, Vertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use treecrown_common::{FillMode, LightingConfig, Rgba};
use treecrown_render::FrameSnapshot;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SPHERE_SLICES: u32 = 20;
const SPHERE_STACKS: u32 = 20;
const TUBE_SLICES: u32 = 8;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    to_light: [f32; 4],
    diffuse: [f32; 4],
    ambient: [f32; 4],
    specular: [f32; 4],
}

impl Uniforms {
    fn new(view_proj: Mat4, eye: Vec3, lighting: &LightingConfig) -> Self {
        let to_light = lighting.light_direction.normalize_or(Vec3::Y);
        let mut specular = modulate(lighting.specular_light, lighting.specular_material);
        specular[3] = lighting.specular_power;
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
            to_light: to_light.extend(0.0).to_array(),
            diffuse: modulate(lighting.diffuse_light, lighting.diffuse_material),
            ambient: modulate(lighting.ambient_light, lighting.ambient_material),
            specular,
        }
    }
}

fn modulate(light: Rgba, material: Rgba) -> [f32; 4] {
    [0, 1, 2, 3].map(|i| light[i] * material[i])
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

impl InstanceData {
    fn new(model: &Mat4, color: Rgba) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color,
        }
    }
}

/// Crown first, then one instance per marker, truncated to `max`.
fn sphere_instances(frame: &FrameSnapshot, max: usize) -> Vec<InstanceData> {
    let lighting = &frame.lighting;
    frame
        .crown
        .iter()
        .map(|m| InstanceData::new(m, lighting.crown_color))
        .chain(
            frame
                .markers
                .iter()
                .map(|m| InstanceData::new(m, lighting.marker_color)),
        )
        .take(max)
        .collect()
}

fn tube_instances(frame: &FrameSnapshot, max: usize) -> Vec<InstanceData> {
    let color = frame.lighting.branch_color;
    frame
        .branches
        .iter()
        .take(max)
        .map(|m| InstanceData::new(m, color))
        .collect()
}

fn mesh_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    polygon_mode: wgpu::PolygonMode,
) -> wgpu::RenderPipeline {
    let (label, cull_mode) = match polygon_mode {
        wgpu::PolygonMode::Fill => ("mesh_pipeline", Some(wgpu::Face::Back)),
        _ => ("mesh_wireframe_pipeline", None),
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
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
                    ],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Cw,
            cull_mode,
            polygon_mode,
            ..Default::default()
        },
        depth_stencil: Some(depth_state()),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

/// Vertex and index buffers for one mesh.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, name: &str, mesh: &Mesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name}_vertex_buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name}_index_buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        }
    }

    /// Draw `instances` of this mesh. The caller binds the pipeline and the
    /// instance buffer at slot 1.
    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instances: std::ops::Range<u32>) {
        if instances.is_empty() {
            return;
        }
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, instances);
    }
}

/// wgpu-based frame renderer.
pub struct WgpuRenderer {
    solid_pipeline: wgpu::RenderPipeline,
    /// Present only when the device supports line polygon mode.
    wireframe_pipeline: Option<wgpu::RenderPipeline>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    sphere: GpuMesh,
    tube: GpuMesh,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms::new(
                Mat4::IDENTITY,
                Vec3::ZERO,
                &LightingConfig::default(),
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });
        let solid_pipeline = mesh_pipeline(
            device,
            &pipeline_layout,
            &mesh_shader,
            surface_format,
            wgpu::PolygonMode::Fill,
        );
        let wireframe_pipeline = if device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE)
        {
            Some(mesh_pipeline(
                device,
                &pipeline_layout,
                &mesh_shader,
                surface_format,
                wgpu::PolygonMode::Line,
            ))
        } else {
            tracing::warn!("device lacks POLYGON_MODE_LINE; wireframe mode will draw solid");
            None
        };

        let sphere = GpuMesh::upload(
            device,
            "sphere",
            &Mesh::uv_sphere(SPHERE_SLICES, SPHERE_STACKS),
        );
        let tube = GpuMesh::upload(device, "tube", &Mesh::tube(TUBE_SLICES));

        // Per-frame buffers (pre-allocated)
        let max_instances = 10_000u32;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (max_instances as u64) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            solid_pipeline,
            wireframe_pipeline,
            uniform_buffer,
            uniform_bind_group,
            sphere,
            tube,
            instance_buffer,
            max_instances,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn supports_wireframe(&self) -> bool {
        self.wireframe_pipeline.is_some()
    }

    /// Render one frame: crown and markers as lit spheres, branches as lit
    /// tubes. Spheres and tubes share one instance buffer, spheres first.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        frame: &FrameSnapshot,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms::new(frame.view_proj(), frame.eye, &frame.lighting)),
        );

        let max = self.max_instances as usize;
        let mut instances = sphere_instances(frame, max);
        let spheres = instances.len() as u32;
        let room = max - instances.len();
        instances.extend(tube_instances(frame, room));
        let total = instances.len() as u32;
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let pipeline = match (frame.fill_mode, &self.wireframe_pipeline) {
            (FillMode::Wireframe, Some(wireframe)) => wireframe,
            _ => &self.solid_pipeline,
        };
        let [r, g, b, a] = frame.lighting.clear_color.map(f64::from);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_pipeline(pipeline);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            self.sphere.draw(&mut pass, 0..spheres);
            self.tube.draw(&mut pass, spheres..total);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treecrown_camera::FlyCamera;

    fn frame() -> FrameSnapshot {
        let cam = FlyCamera::with_lens(1.0, 1.0, 0.1, 10.0).unwrap();
        FrameSnapshot::capture(&cam).unwrap()
    }

    #[test]
    fn uniforms_match_shader_layout() {
        // mat4 + five vec4s, 16-byte aligned for WGSL uniform rules.
        assert_eq!(std::mem::size_of::<Uniforms>(), 64 + 5 * 16);
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
    }

    #[test]
    fn uniforms_combine_light_and_material() {
        let u = Uniforms::new(Mat4::IDENTITY, Vec3::new(0.0, 0.0, -3.0), &LightingConfig::default());
        assert!((u.diffuse[0] - 0.64).abs() < 1e-6);
        assert!((u.ambient[1] - 0.04).abs() < 1e-6);
        assert_eq!(u.specular, [1.0, 1.0, 1.0, 10.0]);
        let to_light = Vec3::new(u.to_light[0], u.to_light[1], u.to_light[2]);
        assert!((to_light.length() - 1.0).abs() < 1e-6);
        assert_eq!(u.eye, [0.0, 0.0, -3.0, 1.0]);
    }

    #[test]
    fn crown_instance_comes_first() {
        let mut frame = frame();
        frame.crown = Some(Mat4::IDENTITY);
        frame.markers = vec![Mat4::from_translation(Vec3::X); 3];
        let instances = sphere_instances(&frame, 100);
        assert_eq!(instances.len(), 4);
        assert_eq!(instances[0].color, frame.lighting.crown_color);
        assert_eq!(instances[1].color, frame.lighting.marker_color);
        assert_eq!(instances[1].model_3, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn instances_are_capped() {
        let mut frame = frame();
        frame.markers = vec![Mat4::IDENTITY; 10];
        frame.branches = vec![Mat4::from_translation(Vec3::Y); 10];
        assert_eq!(sphere_instances(&frame, 4).len(), 4);
        let tubes = tube_instances(&frame, 7);
        assert_eq!(tubes.len(), 7);
        assert_eq!(tubes[0].model_3, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(tubes[0].color, frame.lighting.branch_color);
    }
}
