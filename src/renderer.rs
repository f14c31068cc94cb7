use crate::compute::ComputeEngine;
use crate::graphics::GraphicsContext;
use crate::utils::{rgba_to_f32, srgb_to_linear, to_wgpu_color};
use bytemuck::{Pod, Zeroable};
use glam::{UVec2, Vec2};
use wgpu::util::DeviceExt;

// --- Pixel <-> Cell Mapping ---
// Same arithmetic as fs_main in shaders/grid.wgsl.

/// Cell drawn at `pixel`, or `None` if the pixel falls in the gap between cells.
pub fn shade_pixel(
    pixel: UVec2,
    viewport: UVec2,
    grid: (usize, usize),
    gap_ratio: f32,
) -> Option<(usize, usize)> {
    let dims = Vec2::new(grid.0 as f32, grid.1 as f32);
    let coord = (pixel.as_vec2() + 0.5) * dims / viewport.as_vec2();
    let cell = coord.floor().min(dims - 1.0);
    let local = coord - coord.floor();
    let half_gap = gap_ratio * 0.5;
    if local.min_element() < half_gap || local.max_element() > 1.0 - half_gap {
        return None;
    }
    Some((cell.x as usize, cell.y as usize))
}

/// Cell under a cursor position in physical pixels. Gaps count as part of the cell.
pub fn cell_at_pixel(position: Vec2, viewport: UVec2, grid: (usize, usize)) -> Option<(usize, usize)> {
    let size = viewport.as_vec2();
    if position.x < 0.0 || position.y < 0.0 || position.x >= size.x || position.y >= size.y {
        return None;
    }
    let dims = Vec2::new(grid.0 as f32, grid.1 as f32);
    let cell = (position * dims / size).floor().min(dims - 1.0);
    Some((cell.x as usize, cell.y as usize))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Palette {
    pub background: [u8; 4],
    pub alive: [u8; 4],
}

// --- GPU Data Structures ---

// Must match GridUniforms in shaders/grid.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct GridUniforms {
    resolution: [f32; 2],
    grid_size: [u32; 2],
    gap_ratio: f32,
    _padding: [f32; 3],
    background_color: [f32; 4],
    alive_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct FullscreenVertex {
    position: [f32; 2], // @location(0)
}

impl FullscreenVertex {
    fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<FullscreenVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x2],
        }
    }
}

const FULLSCREEN_VERTICES: [FullscreenVertex; 6] = [
    FullscreenVertex { position: [-1.0, -1.0] },
    FullscreenVertex { position: [1.0, -1.0] },
    FullscreenVertex { position: [-1.0, 1.0] },
    FullscreenVertex { position: [-1.0, 1.0] },
    FullscreenVertex { position: [1.0, -1.0] },
    FullscreenVertex { position: [1.0, 1.0] },
];

// --- Renderer ---
/// Draws the current cell buffer over the whole surface. Never writes cell state.
pub struct Renderer {
    render_pipeline: wgpu::RenderPipeline,
    fullscreen_vertex_buffer: wgpu::Buffer,
    uniforms: GridUniforms,
    global_uniform_buffer: wgpu::Buffer,
    bind_group_layout_cells: wgpu::BindGroupLayout,
    bind_group_globals: wgpu::BindGroup,
    // One per compute buffer; indexed by ComputeEngine::current_index
    bind_groups_cells: [wgpu::BindGroup; 2],
    clear_color: wgpu::Color,
}

impl Renderer {
    pub fn new(
        context: &GraphicsContext,
        compute: &ComputeEngine,
        palette: Palette,
        gap_ratio: f32,
    ) -> Self {
        let device = &context.device;
        let size = context.size();

        // The surface encodes to sRGB on write, so hand it linear colours
        let convert = |c: [u8; 4]| {
            let c = rgba_to_f32(c);
            if context.config.format.is_srgb() {
                srgb_to_linear(c)
            } else {
                c
            }
        };
        let background_color = convert(palette.background);
        let (cols, rows) = compute.dimensions();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Grid Shader Module"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/grid.wgsl").into()),
        });

        // --- Create Buffers ---
        let fullscreen_vertex_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Fullscreen Quad Vertex Buffer"),
                contents: bytemuck::cast_slice(&FULLSCREEN_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let uniforms = GridUniforms {
            resolution: [size.width as f32, size.height as f32],
            grid_size: [cols as u32, rows as u32],
            gap_ratio,
            _padding: [0.0; 3],
            background_color,
            alive_color: convert(palette.alive),
        };
        let global_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // --- Bind Group Layouts ---
        let bind_group_layout_globals =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Grid Globals Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<GridUniforms>() as _,
                        ),
                    },
                    count: None,
                }],
            });

        let bind_group_layout_cells =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Render Cells Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<u32>() as _),
                    },
                    count: None,
                }],
            });

        let bind_group_globals = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Grid Globals Bind Group"),
            layout: &bind_group_layout_globals,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_uniform_buffer.as_entire_binding(),
            }],
        });

        let bind_groups_cells = Self::create_cell_bind_groups(device, &bind_group_layout_cells, compute);

        // --- Render Pipeline ---
        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Grid Render Pipeline Layout"),
                bind_group_layouts: &[
                    &bind_group_layout_globals, // Group 0
                    &bind_group_layout_cells,   // Group 1
                ],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Grid Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[FullscreenVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: context.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // No culling for a fullscreen quad
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            render_pipeline,
            fullscreen_vertex_buffer,
            uniforms,
            global_uniform_buffer,
            bind_group_layout_cells,
            bind_group_globals,
            bind_groups_cells,
            clear_color: to_wgpu_color(background_color),
        }
    }

    fn create_cell_bind_groups(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        compute: &ComputeEngine,
    ) -> [wgpu::BindGroup; 2] {
        [0, 1].map(|i| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(if i == 0 {
                    "Render Cells Bind Group A"
                } else {
                    "Render Cells Bind Group B"
                }),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: compute.buffer(i).as_entire_binding(),
                }],
            })
        })
    }

    /// Call after the compute engine reallocated its buffers for a new grid size.
    pub fn rebind_cells(&mut self, context: &GraphicsContext, compute: &ComputeEngine) {
        let (cols, rows) = compute.dimensions();
        self.bind_groups_cells =
            Self::create_cell_bind_groups(&context.device, &self.bind_group_layout_cells, compute);
        self.uniforms.grid_size = [cols as u32, rows as u32];
        context
            .queue
            .write_buffer(&self.global_uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }

    pub fn resize(&mut self, context: &GraphicsContext) {
        let size = context.size();
        self.uniforms.resolution = [size.width as f32, size.height as f32];
        // Only the resolution field, at offset 0
        context.queue.write_buffer(
            &self.global_uniform_buffer,
            0,
            bytemuck::cast_slice(&self.uniforms.resolution),
        );
    }

    /// Draws the buffer selected by `compute.current_index()` and presents it.
    pub fn render(
        &self,
        context: &GraphicsContext,
        compute: &ComputeEngine,
    ) -> Result<(), wgpu::SurfaceError> {
        let output_texture = context.surface.get_current_texture()?;
        let view = output_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Grid Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Grid Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_vertex_buffer(0, self.fullscreen_vertex_buffer.slice(..));
            render_pass.set_bind_group(0, &self.bind_group_globals, &[]);
            render_pass.set_bind_group(1, &self.bind_groups_cells[compute.current_index()], &[]);
            render_pass.draw(0..6, 0..1);
        }

        context.queue.submit(std::iter::once(encoder.finish()));
        output_texture.present();

        Ok(())
    }
}
