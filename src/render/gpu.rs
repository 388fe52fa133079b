use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::backend::RenderBackend;
use crate::camera::Camera;
use crate::core::session::LoadState;
use crate::scene::{Geometry, NodeId, Scene};

/// Background color behind the model (0xFEFEFA).
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 254.0 / 255.0,
    g: 254.0 / 255.0,
    b: 250.0 / 255.0,
    a: 1.0,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-frame view-projection uniform.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GlobalUniform {
    view_proj: [[f32; 4]; 4],
}

/// Per-mesh uniform: world transform plus flat color.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ModelUniform {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PipelineKind {
    Fill,
    Wireframe,
    Points,
}

/// GPU residency for one scene node's mesh. The node id ties the buffers
/// back to the live transform at draw time.
struct GpuMesh {
    node: NodeId,
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    draw_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    kind: PipelineKind,
}

/// wgpu renderer bound to the winit window, with an egui overlay for FPS
/// and load-state diagnostics.
pub struct Renderer {
    window: Arc<Window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    mesh_layout: wgpu::BindGroupLayout,
    fill_pipeline: wgpu::RenderPipeline,
    wire_pipeline: Option<wgpu::RenderPipeline>,
    point_pipeline: wgpu::RenderPipeline,
    meshes: Vec<GpuMesh>,
    egui_renderer: egui_wgpu::Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
    show_ui: bool,
    fps: f32,
    status_line: Option<String>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, show_ui: bool) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| anyhow!("failed to find a compatible adapter"))?;

        // Wireframe rasterization is optional hardware support; fall back
        // to filled triangles where it is missing.
        let mut required_features = wgpu::Features::empty();
        let wireframe_supported = adapter
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        if wireframe_supported {
            required_features |= wgpu::Features::POLYGON_MODE_LINE;
        } else {
            log::warn!("POLYGON_MODE_LINE unsupported; wireframe materials render filled");
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("failed to acquire device")?;

        let surface_config = Self::create_surface_config(&surface, &adapter, size);
        surface.configure(&device, &surface_config);
        let depth_view = Self::create_depth_view(&device, &surface_config);

        let global_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals"),
            contents: bytemuck::cast_slice(&[GlobalUniform {
                view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
            label: Some("global_bind_group_layout"),
        });

        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
            label: Some("global_bind_group"),
        });

        let mesh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
            label: Some("mesh_bind_group_layout"),
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&global_layout, &mesh_layout],
            push_constant_ranges: &[],
        });

        let fill_pipeline = Self::create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            surface_config.format,
            wgpu::PrimitiveTopology::TriangleList,
            wgpu::PolygonMode::Fill,
        );
        let wire_pipeline = wireframe_supported.then(|| {
            Self::create_pipeline(
                &device,
                &pipeline_layout,
                &shader,
                surface_config.format,
                wgpu::PrimitiveTopology::TriangleList,
                wgpu::PolygonMode::Line,
            )
        });
        let point_pipeline = Self::create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            surface_config.format,
            wgpu::PrimitiveTopology::PointList,
            wgpu::PolygonMode::Fill,
        );

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            surface_config.format,
            egui_wgpu::RendererOptions::default(),
        );

        Ok(Self {
            window,
            device,
            queue,
            surface,
            surface_config,
            depth_view,
            global_buffer,
            global_bind_group,
            mesh_layout,
            fill_pipeline,
            wire_pipeline,
            point_pipeline,
            meshes: Vec::new(),
            egui_renderer,
            egui_state,
            egui_ctx,
            show_ui,
            fps: 0.0,
            status_line: None,
        })
    }

    fn create_surface_config(
        surface: &wgpu::Surface,
        adapter: &wgpu::Adapter,
        size: winit::dpi::PhysicalSize<u32>,
    ) -> wgpu::SurfaceConfiguration {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    fn create_depth_view(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
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
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        topology: wgpu::PrimitiveTopology,
        polygon_mode: wgpu::PolygonMode,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    }],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
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
            cache: None,
        })
    }

    /// Uploads every mesh-bearing node to the GPU. Called once after the
    /// load-completion handler has populated the scene.
    pub fn upload_scene(&mut self, scene: &Scene) {
        self.meshes.clear();

        for node_id in scene.descendants(scene.root()) {
            let Some(mesh) = &scene.node(node_id).mesh else {
                continue;
            };

            let positions: Vec<[f32; 3]> = mesh
                .geometry
                .positions()
                .iter()
                .map(|p| p.to_array())
                .collect();
            if positions.is_empty() {
                continue;
            }

            let vertex_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Vertices"),
                    contents: bytemuck::cast_slice(&positions),
                    usage: wgpu::BufferUsages::VERTEX,
                });

            let (index_buffer, draw_count, kind) = match &mesh.geometry {
                Geometry::Triangles { indices, .. } => {
                    let buffer =
                        self.device
                            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                                label: Some("Mesh Indices"),
                                contents: bytemuck::cast_slice(indices),
                                usage: wgpu::BufferUsages::INDEX,
                            });
                    let kind = if mesh.material.wireframe && self.wire_pipeline.is_some() {
                        PipelineKind::Wireframe
                    } else {
                        PipelineKind::Fill
                    };
                    (Some(buffer), indices.len() as u32, kind)
                }
                Geometry::Points { positions } => {
                    (None, positions.len() as u32, PipelineKind::Points)
                }
            };

            let uniform_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Uniform"),
                    contents: bytemuck::cast_slice(&[ModelUniform {
                        model: glam::Mat4::IDENTITY.to_cols_array_2d(),
                        color: [1.0, 1.0, 1.0, 1.0],
                    }]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.mesh_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
                label: Some("mesh_bind_group"),
            });

            self.meshes.push(GpuMesh {
                node: node_id,
                vertex_buffer,
                index_buffer,
                draw_count,
                uniform_buffer,
                bind_group,
                kind,
            });
        }

        log::info!("uploaded {} meshes", self.meshes.len());
    }

    /// Overlay inputs for this frame.
    pub fn set_status(&mut self, fps: f32, state: &LoadState) {
        self.fps = fps;
        self.status_line = match state {
            LoadState::Loading => Some("loading model...".to_string()),
            LoadState::Failed(message) => Some(format!("load failed: {}", message)),
            LoadState::Ready => None,
        };
    }

    /// Lets egui consume window events first.
    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        self.egui_state.on_window_event(&self.window, event).consumed
    }

    fn pipeline_for(&self, kind: PipelineKind) -> &wgpu::RenderPipeline {
        match kind {
            PipelineKind::Fill => &self.fill_pipeline,
            PipelineKind::Wireframe => self.wire_pipeline.as_ref().unwrap_or(&self.fill_pipeline),
            PipelineKind::Points => &self.point_pipeline,
        }
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<()> {
        self.queue.write_buffer(
            &self.global_buffer,
            0,
            bytemuck::cast_slice(&[GlobalUniform {
                view_proj: camera.view_projection().to_cols_array_2d(),
            }]),
        );

        for gpu_mesh in &self.meshes {
            let world = scene.world_transform(gpu_mesh.node);
            let color = scene
                .node(gpu_mesh.node)
                .mesh
                .as_ref()
                .map(|mesh| mesh.material.color)
                .unwrap_or([1.0, 1.0, 1.0]);
            self.queue.write_buffer(
                &gpu_mesh.uniform_buffer,
                0,
                bytemuck::cast_slice(&[ModelUniform {
                    model: world.to_cols_array_2d(),
                    color: [color[0], color[1], color[2], 1.0],
                }]),
            );
        }

        let output = self
            .surface
            .get_current_texture()
            .context("failed to acquire surface frame")?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.global_bind_group, &[]);
            for gpu_mesh in &self.meshes {
                render_pass.set_pipeline(self.pipeline_for(gpu_mesh.kind));
                render_pass.set_bind_group(1, &gpu_mesh.bind_group, &[]);
                render_pass.set_vertex_buffer(0, gpu_mesh.vertex_buffer.slice(..));
                match &gpu_mesh.index_buffer {
                    Some(indices) => {
                        render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..gpu_mesh.draw_count, 0, 0..1);
                    }
                    None => render_pass.draw(0..gpu_mesh.draw_count, 0..1),
                }
            }
        }

        if self.show_ui {
            self.render_overlay(&mut encoder, &view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn render_overlay(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let fps = self.fps;
        let status_line = self.status_line.clone();

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::Window::new("HUD")
                .title_bar(false)
                .resizable(false)
                .fixed_pos(egui::pos2(10.0, 10.0))
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| {
                    ui.label(
                        egui::RichText::new(format!("{:.0}", fps))
                            .size(32.0)
                            .color(egui::Color32::from_rgb(0, 185, 232)),
                    );
                    ui.label(
                        egui::RichText::new("FPS")
                            .size(12.0)
                            .color(egui::Color32::GRAY),
                    );
                    if let Some(line) = &status_line {
                        ui.label(
                            egui::RichText::new(line)
                                .size(14.0)
                                .color(egui::Color32::from_rgb(200, 40, 40)),
                        );
                    }
                });
        });

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, self.egui_ctx.pixels_per_point());
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.surface_config.width, self.surface_config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &tris,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Overlay Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();

            self.egui_renderer
                .render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

impl RenderBackend for Renderer {
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = Self::create_depth_view(&self.device, &self.surface_config);
    }

    fn draw(&mut self, scene: &Scene, camera: &Camera) -> Result<()> {
        self.render(scene, camera)
    }
}
