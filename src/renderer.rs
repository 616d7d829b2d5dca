// renderer.rs — wgpu renderer: base sphere, instanced dots, route line strips, egui overlay

use crate::animation::UniformSet;
use crate::camera::OrbitCamera;
use crate::error::{GlobeError, Result};
use crate::mesh::{self, BASE_SPHERE_RADIUS, BASE_SPHERE_SEGMENTS, DOT_RADIUS, DOT_SEGMENTS};
use crate::scene::GlobeScene;
use std::ops::Range;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// Static per-dot placement; the animated half lives in the uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct DotInstance {
    offset: [f32; 3],
    rotation: [f32; 4],
}

impl DotInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![1 => Float32x3, 2 => Float32x4];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<DotInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

const UNIFORM_ATTRIBS: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![3 => Float32, 4 => Float32];

fn uniform_set_desc() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<UniformSet>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &UNIFORM_ATTRIBS,
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct RouteVertex {
    position: [f32; 3],
    color: [f32; 4],
}

impl RouteVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<RouteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

const POSITION_ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

fn position_desc() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &POSITION_ATTRIBS,
    }
}

struct MeshBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn new(device: &wgpu::Device, mesh: &mesh::Mesh, label: &str) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
        }
    }
}

struct DotBuffers {
    instances: wgpu::Buffer,
    uniforms: wgpu::Buffer,
    count: u32,
}

struct RouteBuffers {
    vertices: wgpu::Buffer,
    ranges: Vec<Range<u32>>,
}

struct PipelineSpec<'a> {
    label: &'a str,
    shader: &'a wgpu::ShaderModule,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    depth_write: bool,
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    depth_view: wgpu::TextureView,

    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    globe_pipeline: wgpu::RenderPipeline,
    dot_pipeline: wgpu::RenderPipeline,
    route_pipeline: wgpu::RenderPipeline,

    globe_mesh: MeshBuffers,
    disc_mesh: MeshBuffers,
    dots: Option<DotBuffers>,
    routes: Option<RouteBuffers>,
    uploaded_generation: Option<u64>,

    // UI
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    spec: PipelineSpec,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: spec.shader,
            entry_point: "vs_main",
            buffers: spec.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: spec.shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None, // dots and the translucent sphere are double sided
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(window.as_ref()) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GlobeError::NoAdapter)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: if cfg!(target_arch = "wasm32") {
                        wgpu::Limits::downlevel_webgl2_defaults()
                    } else {
                        wgpu::Limits::default().using_resolution(adapter.limits())
                    },
                    label: None,
                },
                None,
            )
            .await?;

        // shader colors are authored as display values, so skip sRGB encoding
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, &config);

        // --- Camera ---
        let camera_uniform = CameraUniform {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
        };
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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

        // --- Pipelines ---
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Globe Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let globe_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/globe.wgsl"));
        let dot_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/dots.wgsl"));
        let route_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/routes.wgsl"));

        let globe_pipeline = create_pipeline(
            &device,
            &layout,
            config.format,
            PipelineSpec {
                label: "Globe Pipeline",
                shader: &globe_shader,
                buffers: &[position_desc()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                depth_write: true,
            },
        );
        let dot_pipeline = create_pipeline(
            &device,
            &layout,
            config.format,
            PipelineSpec {
                label: "Dot Pipeline",
                shader: &dot_shader,
                buffers: &[position_desc(), DotInstance::desc(), uniform_set_desc()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                depth_write: true,
            },
        );
        let route_pipeline = create_pipeline(
            &device,
            &layout,
            config.format,
            PipelineSpec {
                label: "Route Pipeline",
                shader: &route_shader,
                buffers: &[RouteVertex::desc()],
                topology: wgpu::PrimitiveTopology::LineStrip,
                depth_write: false,
            },
        );

        let globe_mesh = MeshBuffers::new(
            &device,
            &mesh::build_sphere(BASE_SPHERE_RADIUS, BASE_SPHERE_SEGMENTS, BASE_SPHERE_SEGMENTS),
            "globe_mesh",
        );
        let disc_mesh = MeshBuffers::new(&device, &mesh::build_disc(DOT_RADIUS, DOT_SEGMENTS), "dot_disc");

        // --- Egui ---
        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            depth_view,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            globe_pipeline,
            dot_pipeline,
            route_pipeline,
            globe_mesh,
            disc_mesh,
            dots: None,
            routes: None,
            uploaded_generation: None,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
        }
    }

    pub fn update_camera(&mut self, camera: &OrbitCamera) {
        self.camera_uniform.view_proj = camera.view_proj().to_cols_array_2d();
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[self.camera_uniform]));
    }

    /// Uploads geometry after a rebuild and the per-dot uniforms every frame.
    pub fn sync_scene(&mut self, scene: &GlobeScene) {
        if self.uploaded_generation != Some(scene.generation()) {
            self.upload_geometry(scene);
            self.uploaded_generation = Some(scene.generation());
        }

        if let Some(dots) = &self.dots {
            self.queue
                .write_buffer(&dots.uniforms, 0, bytemuck::cast_slice(scene.uniforms.sets()));
        }
    }

    fn upload_geometry(&mut self, scene: &GlobeScene) {
        self.dots = if scene.dots.is_empty() {
            None
        } else {
            let instances: Vec<DotInstance> = scene
                .dots
                .dots
                .iter()
                .map(|d| DotInstance {
                    offset: d.position.to_array(),
                    rotation: d.rotation.to_array(),
                })
                .collect();

            Some(DotBuffers {
                instances: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("dot_instances"),
                    contents: bytemuck::cast_slice(&instances),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                uniforms: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("dot_uniforms"),
                    contents: bytemuck::cast_slice(scene.uniforms.sets()),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                }),
                count: instances.len() as u32,
            })
        };

        let mut vertices = Vec::new();
        let mut ranges = Vec::with_capacity(scene.routes.len());
        for route in &scene.routes {
            let start = vertices.len() as u32;
            vertices.extend(route.points.iter().map(|p| RouteVertex {
                position: p.to_array(),
                color: route.color,
            }));
            ranges.push(start..vertices.len() as u32);
        }

        self.routes = if vertices.is_empty() {
            None
        } else {
            Some(RouteBuffers {
                vertices: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("route_vertices"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                ranges,
            })
        };

        log::debug!(
            "uploaded {} dots and {} routes",
            self.dots.as_ref().map_or(0, |d| d.count),
            scene.routes.len()
        );
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        run_ui: impl FnOnce(&egui::Context),
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        // 1. Globe, dots, routes
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Globe Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r: 0.01, g: 0.02, b: 0.04, a: 1.0 }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            render_pass.set_pipeline(&self.globe_pipeline);
            render_pass.set_vertex_buffer(0, self.globe_mesh.vertices.slice(..));
            render_pass.set_index_buffer(self.globe_mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.globe_mesh.index_count, 0, 0..1);

            if let Some(dots) = &self.dots {
                render_pass.set_pipeline(&self.dot_pipeline);
                render_pass.set_vertex_buffer(0, self.disc_mesh.vertices.slice(..));
                render_pass.set_vertex_buffer(1, dots.instances.slice(..));
                render_pass.set_vertex_buffer(2, dots.uniforms.slice(..));
                render_pass.set_index_buffer(self.disc_mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.disc_mesh.index_count, 0, 0..dots.count);
            }

            if let Some(routes) = &self.routes {
                render_pass.set_pipeline(&self.route_pipeline);
                render_pass.set_vertex_buffer(0, routes.vertices.slice(..));
                for range in &routes.ranges {
                    render_pass.draw(range.clone(), 0..1);
                }
            }
        }

        // 2. UI
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state.handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, delta);
        }

        let ui_commands = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: true },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer.render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue
            .submit(ui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_layouts_match_structs() {
        assert_eq!(std::mem::size_of::<DotInstance>(), 28);
        assert_eq!(std::mem::size_of::<UniformSet>(), 8);
        assert_eq!(std::mem::size_of::<RouteVertex>(), 28);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(UNIFORM_ATTRIBS[1].offset, 4);
        assert_eq!(DotInstance::ATTRIBS[1].offset, 12);
    }
}
