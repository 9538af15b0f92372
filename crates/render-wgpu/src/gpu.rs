use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use landing_common::{NodeId, SurfaceSize};
use landing_render::{PerspectiveCamera, RenderError, Renderer, SurfaceSettings};
use landing_scene::{Mesh, NodeContent, Scene};
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;

const MODEL_COLOR: [f32; 4] = [0.82, 0.82, 0.85, 1.0];
const PLACEHOLDER_COLOR: [f32; 4] = [0.9, 0.9, 0.9, 1.0];
const LIGHT_DIR: Vec3 = Vec3::new(0.3, 1.0, 0.5);
const MSAA_SAMPLES: u32 = 4;
const INITIAL_INSTANCES: u32 = 1024;
const MAX_PLACEHOLDERS: u32 = 16;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    light: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
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
    fn new(model: Mat4, color: [f32; 4]) -> Self {
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

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct LineVertex {
    position: [f32; 3],
    color: [f32; 4],
}

/// Unit UV sphere. Normals equal positions.
fn sphere_mesh(segments: u32, rings: u32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
    for ring in 0..=rings {
        let phi = std::f32::consts::PI * ring as f32 / rings as f32;
        let (sp, cp) = phi.sin_cos();
        for seg in 0..=segments {
            let theta = std::f32::consts::TAU * seg as f32 / segments as f32;
            let (st, ct) = theta.sin_cos();
            let p = [sp * ct, cp, sp * st];
            vertices.push(Vertex {
                position: p,
                normal: p,
            });
        }
    }

    let stride = segments + 1;
    let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }
    (vertices, indices)
}

/// Twelve edges of a unit cube, transformed to world space.
fn wire_cube_lines(model: Mat4, color: [f32; 4]) -> Vec<LineVertex> {
    let h = 0.5_f32;
    let corner = |i: usize| {
        let x = if i & 1 == 0 { -h } else { h };
        let y = if i & 2 == 0 { -h } else { h };
        let z = if i & 4 == 0 { -h } else { h };
        model.transform_point3(Vec3::new(x, y, z)).to_array()
    };
    #[rustfmt::skip]
    const EDGES: [(usize, usize); 12] = [
        (0, 1), (2, 3), (4, 5), (6, 7), // along X
        (0, 2), (1, 3), (4, 6), (5, 7), // along Y
        (0, 4), (1, 5), (2, 6), (3, 7), // along Z
    ];
    EDGES
        .iter()
        .flat_map(|&(a, b)| {
            [
                LineVertex {
                    position: corner(a),
                    color,
                },
                LineVertex {
                    position: corner(b),
                    color,
                },
            ]
        })
        .collect()
}

fn mesh_vertices(mesh: &Mesh) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .zip(mesh.normals.iter().chain(std::iter::repeat(&Vec3::Y)))
        .map(|(p, n)| Vertex {
            position: p.to_array(),
            normal: n.to_array(),
        })
        .collect()
}

/// Uploaded geometry for one scene node.
struct GpuMesh {
    source: Arc<Mesh>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    mesh_pipeline: wgpu::RenderPipeline,
    sphere_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    sphere_vertex_buffer: wgpu::Buffer,
    sphere_index_buffer: wgpu::Buffer,
    sphere_index_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u32,
    line_buffer: wgpu::Buffer,
    meshes: HashMap<NodeId, GpuMesh>,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
}

/// wgpu-based scene renderer. Owns its surface and device.
pub struct WgpuRenderer {
    gpu: Option<Gpu>,
    size: SurfaceSize,
    backend: String,
}

impl WgpuRenderer {
    /// Create a surface for `target` and set up device and pipelines.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: SurfaceSize,
        settings: &SurfaceSettings,
    ) -> Result<Self, RenderError> {
        let backend_err = |e: &dyn std::fmt::Display| RenderError::Backend(e.to_string());

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(target)
            .map_err(|e| backend_err(&e))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RenderError::Backend("no compatible GPU adapter".into()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("landing_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| backend_err(&e))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| RenderError::Backend("surface reports no formats".into()))?;

        let msaa_supported = adapter
            .get_texture_format_features(surface_format)
            .flags
            .sample_count_supported(MSAA_SAMPLES);
        let sample_count = if settings.antialias && msaa_supported {
            MSAA_SAMPLES
        } else {
            if settings.antialias {
                tracing::warn!(?surface_format, "MSAA unsupported; rendering without antialiasing");
            }
            1
        };

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

        let backend = adapter.get_info().backend.to_str().to_string();
        tracing::info!(%backend, ?surface_format, sample_count, "GPU initialized");

        let gpu = Gpu::new(surface, device, queue, config, sample_count);
        Ok(Self {
            gpu: Some(gpu),
            size,
            backend,
        })
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn sample_count(&self) -> Option<u32> {
        self.gpu.as_ref().map(|g| g.sample_count)
    }
}

impl Renderer for WgpuRenderer {
    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(size);
        }
    }

    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        clear_color: [f32; 4],
    ) -> Result<(), RenderError> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(RenderError::Disposed);
        };
        gpu.sync_meshes(scene);
        gpu.reserve_instances(instance_demand(scene));

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Err(RenderError::SurfaceLost);
            }
            Err(e) => return Err(RenderError::Backend(e.to_string())),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        gpu.draw(&view, scene, camera, clear_color);
        frame.present();
        Ok(())
    }

    fn release(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            tracing::debug!(meshes = gpu.meshes.len(), "releasing GPU resources");
            for mesh in gpu.meshes.values() {
                mesh.vertex_buffer.destroy();
                mesh.index_buffer.destroy();
            }
        }
    }
}

impl Gpu {
    fn new(
        surface: wgpu::Surface<'static>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                light: [LIGHT_DIR.x, LIGHT_DIR.y, LIGHT_DIR.z, 0.3],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
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
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LINE_SHADER.into()),
        });

        let mesh_buffers = [
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
        ];
        let line_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![
                0 => Float32x3,
                1 => Float32x4,
            ],
        }];

        let builder = PipelineBuilder {
            device: &device,
            layout: &pipeline_layout,
            format: config.format,
            sample_count,
        };
        let mesh_pipeline = builder.build(PipelineDesc {
            label: "mesh_pipeline",
            shader: &mesh_shader,
            vs: "vs_main",
            fs: "fs_main",
            buffers: &mesh_buffers,
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            blend: wgpu::BlendState::REPLACE,
            depth_write: true,
        });
        let sphere_pipeline = builder.build(PipelineDesc {
            label: "sphere_pipeline",
            shader: &mesh_shader,
            vs: "vs_main",
            fs: "fs_translucent",
            buffers: &mesh_buffers,
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            blend: wgpu::BlendState::ALPHA_BLENDING,
            depth_write: false,
        });
        let line_pipeline = builder.build(PipelineDesc {
            label: "line_pipeline",
            shader: &line_shader,
            vs: "vs_line",
            fs: "fs_line",
            buffers: &line_buffers,
            topology: wgpu::PrimitiveTopology::LineList,
            cull_mode: None,
            blend: wgpu::BlendState::REPLACE,
            depth_write: true,
        });

        let (sphere_verts, sphere_indices) = sphere_mesh(32, 16);
        let sphere_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere_vertex_buffer"),
            contents: bytemuck::cast_slice(&sphere_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let sphere_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere_index_buffer"),
            contents: bytemuck::cast_slice(&sphere_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance_buffer = create_instance_buffer(&device, INITIAL_INSTANCES);
        let line_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("line_buffer"),
            size: (MAX_PLACEHOLDERS * 24) as u64 * std::mem::size_of::<LineVertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_view = create_depth_texture(&device, config.width, config.height, sample_count);
        let msaa_view = create_msaa_texture(&device, &config, sample_count);

        Self {
            surface,
            device,
            queue,
            config,
            sample_count,
            mesh_pipeline,
            sphere_pipeline,
            line_pipeline,
            uniform_buffer,
            uniform_bind_group,
            sphere_vertex_buffer,
            sphere_index_buffer,
            sphere_index_count: sphere_indices.len() as u32,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCES,
            line_buffer,
            meshes: HashMap::new(),
            depth_view,
            msaa_view,
        }
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_texture(
            &self.device,
            self.config.width,
            self.config.height,
            self.sample_count,
        );
        self.msaa_view = create_msaa_texture(&self.device, &self.config, self.sample_count);
    }

    /// Upload meshes for new model nodes and drop those of detached nodes.
    /// Replace the instance buffer with a larger one when a frame needs
    /// more slots than it holds.
    fn reserve_instances(&mut self, needed: usize) {
        let Some(capacity) = grown_capacity(self.instance_capacity, needed) else {
            return;
        };
        tracing::info!(
            from = self.instance_capacity,
            to = capacity,
            "growing instance buffer"
        );
        self.instance_buffer.destroy();
        self.instance_buffer = create_instance_buffer(&self.device, capacity);
        self.instance_capacity = capacity;
    }

    fn sync_meshes(&mut self, scene: &Scene) {
        let nodes = scene.nodes();
        self.meshes.retain(|id, _| nodes.contains_key(id));

        for (id, node) in nodes {
            let NodeContent::Model { mesh, .. } = &node.content else {
                continue;
            };
            if self
                .meshes
                .get(id)
                .is_some_and(|cached| Arc::ptr_eq(&cached.source, mesh))
            {
                continue;
            }
            let vertices = mesh_vertices(mesh);
            let vertex_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("model_vertex_buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let index_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("model_index_buffer"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
            tracing::debug!(
                node = %id.short(),
                vertices = vertices.len(),
                "uploaded model mesh"
            );
            self.meshes.insert(
                *id,
                GpuMesh {
                    source: Arc::clone(mesh),
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                },
            );
        }
    }

    fn draw(
        &self,
        view: &wgpu::TextureView,
        scene: &Scene,
        camera: &PerspectiveCamera,
        clear: [f32; 4],
    ) {
        let ambient = scene.environment().ambient;
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
                light: [LIGHT_DIR.x, LIGHT_DIR.y, LIGHT_DIR.z, ambient],
            }),
        );

        // Models first, then spheres, in one instance buffer.
        let mut instances: Vec<InstanceData> = Vec::new();
        let mut models: Vec<(&GpuMesh, u32)> = Vec::new();
        let mut lines: Vec<LineVertex> = Vec::new();
        for (id, node) in scene.nodes() {
            match &node.content {
                NodeContent::Model { .. } => {
                    if let Some(mesh) = self.meshes.get(id) {
                        models.push((mesh, instances.len() as u32));
                        instances.push(InstanceData::new(node.geometry_matrix(), MODEL_COLOR));
                    }
                }
                NodeContent::Placeholder { .. } => {
                    if lines.len() < (MAX_PLACEHOLDERS * 24) as usize {
                        lines.extend(wire_cube_lines(node.geometry_matrix(), PLACEHOLDER_COLOR));
                    }
                }
            }
        }
        let spheres_start = instances.len() as u32;
        for node in scene.nodes().values() {
            let (Some(matrix), NodeContent::Model { decoration, .. }) =
                (node.containment_matrix(), &node.content)
            else {
                continue;
            };
            if let Some(sphere) = decoration.sphere() {
                instances.push(InstanceData::new(matrix, sphere.color));
            }
        }
        let instance_count = instances.len() as u32;

        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        if !lines.is_empty() {
            self.queue
                .write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(&lines));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let (target, resolve_target) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(view)),
                None => (view, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0] as f64,
                            g: clear[1] as f64,
                            b: clear[2] as f64,
                            a: clear[3] as f64,
                        }),
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

            // Opaque models
            pass.set_pipeline(&self.mesh_pipeline);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (mesh, instance) in &models {
                if *instance >= instance_count {
                    break;
                }
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, *instance..*instance + 1);
            }

            // Placeholder wireframe
            if !lines.is_empty() {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_vertex_buffer(0, self.line_buffer.slice(..));
                pass.draw(0..lines.len() as u32, 0..1);
            }

            // Translucent spheres last, without depth writes
            if instance_count > spheres_start {
                pass.set_pipeline(&self.sphere_pipeline);
                pass.set_vertex_buffer(0, self.sphere_vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(
                    self.sphere_index_buffer.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                pass.draw_indexed(
                    0..self.sphere_index_count,
                    0,
                    spheres_start..instance_count,
                );
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    layout: &'a wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    sample_count: u32,
}

struct PipelineDesc<'a> {
    label: &'a str,
    shader: &'a wgpu::ShaderModule,
    vs: &'a str,
    fs: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    blend: wgpu::BlendState,
    depth_write: bool,
}

impl PipelineBuilder<'_> {
    fn build(&self, desc: PipelineDesc<'_>) -> wgpu::RenderPipeline {
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(self.layout),
                vertex: wgpu::VertexState {
                    module: desc.shader,
                    entry_point: Some(desc.vs),
                    compilation_options: Default::default(),
                    buffers: desc.buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: desc.shader,
                    entry_point: Some(desc.fs),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(desc.blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: desc.topology,
                    cull_mode: desc.cull_mode,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth32Float,
                    depth_write_enabled: desc.depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: self.sample_count,
                    ..Default::default()
                },
                multiview: None,
                cache: None,
            })
    }
}

/// Instance slots one frame of `scene` uses: one per model plus one per
/// containment sphere.
fn instance_demand(scene: &Scene) -> usize {
    scene
        .nodes()
        .values()
        .map(|node| match &node.content {
            NodeContent::Model { decoration, .. } => 1 + decoration.sphere().is_some() as usize,
            NodeContent::Placeholder { .. } => 0,
        })
        .sum()
}

/// New capacity when `needed` does not fit, rounded up to a power of two.
fn grown_capacity(current: u32, needed: usize) -> Option<u32> {
    if needed <= current as usize {
        return None;
    }
    let needed = u32::try_from(needed).unwrap_or(u32::MAX);
    Some(needed.checked_next_power_of_two().unwrap_or(u32::MAX))
}

fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: capacity as u64 * std::mem::size_of::<InstanceData>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    sample_count: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn create_msaa_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("msaa_texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&Default::default()))
}
