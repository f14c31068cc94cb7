// --- File: compute.rs ---
// GPU side of the transition engine: two storage buffers ping-ponged by
// shaders/life.wgsl. `current` is an index into `buffers`, flipped after each step.
use crate::constants::COMPUTE_WORKGROUP_SIZE;
use crate::error::{SimError, SimResult};
use crate::graphics::GraphicsContext;
use crate::grid::{CellState, Grid, checked_cell_count, wrap_index};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

// Must match GridSize in shaders/life.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct GridSizeUniform {
    cols: u32,
    rows: u32,
    _padding: [u32; 2],
}

pub struct ComputeEngine {
    width: usize,
    height: usize,
    buffers: [wgpu::Buffer; 2],
    // [read 0 / write 1, read 1 / write 0]
    state_bind_groups: [wgpu::BindGroup; 2],
    size_uniform_buffer: wgpu::Buffer,
    size_bind_group: wgpu::BindGroup,
    state_bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
    current: usize,
}

impl ComputeEngine {
    pub fn new(context: &GraphicsContext, grid: &Grid) -> SimResult<Self> {
        let device = &context.device;
        let (width, height) = grid.dimensions();
        check_device_limits(width, height, &device.limits())?;

        let size_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Compute Grid Size Buffer"),
            contents: bytemuck::bytes_of(&GridSizeUniform::new(width, height)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let size_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Compute Grid Size Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<GridSizeUniform>() as _,
                        ),
                    },
                    count: None,
                }],
            });

        let state_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Compute State Bind Group Layout"),
                entries: &[
                    // Current generation (read)
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // Next generation (write)
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let size_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Compute Grid Size Bind Group"),
            layout: &size_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: size_uniform_buffer.as_entire_binding(),
            }],
        });

        let buffers = Self::create_state_buffers(device, grid);
        let state_bind_groups = Self::create_state_bind_groups(device, &state_bind_group_layout, &buffers);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Life Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/life.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Life Compute Pipeline Layout"),
            bind_group_layouts: &[
                &size_bind_group_layout,  // Group 0
                &state_bind_group_layout, // Group 1
            ],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Life Compute Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        log::info!("Compute engine ready for {width}x{height} grid");

        Ok(Self {
            width,
            height,
            buffers,
            state_bind_groups,
            size_uniform_buffer,
            size_bind_group,
            state_bind_group_layout,
            pipeline,
            current: 0,
        })
    }

    fn create_state_buffers(device: &wgpu::Device, grid: &Grid) -> [wgpu::Buffer; 2] {
        let usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;
        let current = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cell State Buffer A"),
            contents: bytemuck::cast_slice(grid.cells()),
            usage,
        });
        let next = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cell State Buffer B"),
            size: std::mem::size_of_val(grid.cells()) as wgpu::BufferAddress,
            usage,
            mapped_at_creation: false,
        });
        [current, next]
    }

    fn create_state_bind_groups(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffers: &[wgpu::Buffer; 2],
    ) -> [wgpu::BindGroup; 2] {
        [(0, 1), (1, 0)].map(|(read, write)| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(if read == 0 {
                    "Compute State Bind Group A->B"
                } else {
                    "Compute State Bind Group B->A"
                }),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffers[read].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: buffers[write].as_entire_binding(),
                    },
                ],
            })
        })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn buffer(&self, index: usize) -> &wgpu::Buffer {
        &self.buffers[index]
    }

    /// Replaces the current generation. Returns `true` if the buffers were
    /// reallocated, in which case dependent bind groups must be rebuilt.
    /// A grid the device cannot hold leaves the engine untouched.
    pub fn load(&mut self, context: &GraphicsContext, grid: &Grid) -> SimResult<bool> {
        if grid.dimensions() == self.dimensions() {
            context.queue.write_buffer(
                &self.buffers[self.current],
                0,
                bytemuck::cast_slice(grid.cells()),
            );
            return Ok(false);
        }

        let (width, height) = grid.dimensions();
        check_device_limits(width, height, &context.device.limits())?;
        log::info!(
            "Reallocating cell buffers: {}x{} -> {width}x{height}",
            self.width,
            self.height
        );
        let device = &context.device;
        self.buffers = Self::create_state_buffers(device, grid);
        self.state_bind_groups =
            Self::create_state_bind_groups(device, &self.state_bind_group_layout, &self.buffers);
        self.width = width;
        self.height = height;
        self.current = 0;
        context.queue.write_buffer(
            &self.size_uniform_buffer,
            0,
            bytemuck::bytes_of(&GridSizeUniform::new(width, height)),
        );
        Ok(true)
    }

    pub fn set_cell(&self, context: &GraphicsContext, x: isize, y: isize, state: CellState) {
        let index = wrap_index(self.width, self.height, x, y);
        let offset = (index * std::mem::size_of::<u32>()) as wgpu::BufferAddress;
        context.queue.write_buffer(
            &self.buffers[self.current],
            offset,
            bytemuck::bytes_of(&state.to_word()),
        );
    }

    /// Runs one generation and blocks until the GPU has finished it.
    pub fn step(&mut self, context: &GraphicsContext) {
        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Life Compute Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Life Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &self.size_bind_group, &[]);
            compute_pass.set_bind_group(1, &self.state_bind_groups[self.current], &[]);
            let (x, y) = workgroup_count(self.width, self.height);
            compute_pass.dispatch_workgroups(x, y, 1);
        }

        let submission = context.queue.submit(std::iter::once(encoder.finish()));
        // Barrier: the next reader of this buffer must see the finished generation
        let _ = context.device.poll(wgpu::Maintain::wait_for(submission));

        self.current ^= 1;
    }
}

impl GridSizeUniform {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols: cols as u32,
            rows: rows as u32,
            _padding: [0; 2],
        }
    }
}

/// Workgroups needed to cover the grid with `COMPUTE_WORKGROUP_SIZE`² tiles.
pub fn workgroup_count(width: usize, height: usize) -> (u32, u32) {
    (
        (width as u32).div_ceil(COMPUTE_WORKGROUP_SIZE),
        (height as u32).div_ceil(COMPUTE_WORKGROUP_SIZE),
    )
}
/// Rejects grids whose cell buffer or dispatch exceeds what the device allows.
pub fn check_device_limits(width: usize, height: usize, limits: &wgpu::Limits) -> SimResult<()> {
    let cells = checked_cell_count(width, height)?;
    let bytes = (cells * std::mem::size_of::<u32>()) as u64;
    let max_bytes = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
    let (groups_x, groups_y) = workgroup_count(width, height);
    let max_groups = limits.max_compute_workgroups_per_dimension;
    if bytes > max_bytes || groups_x > max_groups || groups_y > max_groups {
        log::warn!(
            "{width}x{height} grid needs {bytes} bytes and {groups_x}x{groups_y} workgroups, \
             device allows {max_bytes} bytes and {max_groups} per dimension"
        );
        return Err(SimError::InvalidDimensions { width, height });
    }
    Ok(())
}
// --- End of File: compute.rs ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_count_rounds_up() {
        assert_eq!(workgroup_count(16, 16), (1, 1));
        assert_eq!(workgroup_count(17, 1), (2, 1));
        assert_eq!(workgroup_count(100, 33), (7, 3));
    }

    #[test]
    fn test_device_limits_bound_grid_size() {
        let limits = wgpu::Limits::default();
        let max_bytes = limits.max_storage_buffer_binding_size as usize;
        let rows = max_bytes / 4 / 4096;
        assert!(check_device_limits(4096, rows, &limits).is_ok());
        assert_eq!(
            check_device_limits(4096, rows + 1, &limits),
            Err(SimError::InvalidDimensions {
                width: 4096,
                height: rows + 1
            })
        );
        assert!(check_device_limits(0, 4, &limits).is_err());
    }

    #[test]
    fn test_device_limits_bound_dispatch() {
        let limits = wgpu::Limits::default();
        let widest = limits.max_compute_workgroups_per_dimension as usize * COMPUTE_WORKGROUP_SIZE as usize;
        assert!(check_device_limits(widest, 1, &limits).is_ok());
        assert!(check_device_limits(widest + 1, 1, &limits).is_err());
    }

    #[test]
    fn test_size_uniform_is_16_bytes() {
        assert_eq!(std::mem::size_of::<GridSizeUniform>(), 16);
    }
}
