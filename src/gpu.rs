// --- File: gpu.rs ---
// Compute and render share one wgpu device.

use crate::compute::ComputeEngine;
use crate::error::{SimError, SimResult};
use crate::graphics::GraphicsContext;
use crate::grid::{CellState, Grid};
use crate::renderer::{Palette, Renderer};
use crate::substrate::Substrate;
use std::sync::Arc;
use winit::{dpi::PhysicalSize, window::Window};

pub struct GpuSubstrate {
    context: GraphicsContext,
    compute: ComputeEngine,
    renderer: Renderer,
}

impl GpuSubstrate {
    pub async fn new(
        window: Arc<Window>,
        grid: &Grid,
        palette: Palette,
        gap_ratio: f32,
    ) -> SimResult<Self> {
        let context = GraphicsContext::new(window).await?;
        let compute = ComputeEngine::new(&context, grid)?;
        let renderer = Renderer::new(&context, &compute, palette, gap_ratio);
        Ok(Self {
            context,
            compute,
            renderer,
        })
    }

    pub fn viewport(&self) -> PhysicalSize<u32> {
        self.context.size()
    }

    fn ensure_device(&self) -> SimResult<()> {
        if self.context.is_device_lost() {
            return Err(SimError::DeviceUnavailable("GPU device was lost".into()));
        }
        Ok(())
    }
}

impl Substrate for GpuSubstrate {
    fn dimensions(&self) -> (usize, usize) {
        self.compute.dimensions()
    }

    fn load(&mut self, grid: &Grid) -> SimResult<()> {
        self.ensure_device()?;
        if self.compute.load(&self.context, grid)? {
            self.renderer.rebind_cells(&self.context, &self.compute);
        }
        Ok(())
    }

    fn set_cell(&mut self, x: isize, y: isize, state: CellState) -> SimResult<()> {
        self.ensure_device()?;
        self.compute.set_cell(&self.context, x, y, state);
        Ok(())
    }

    fn step(&mut self) -> SimResult<()> {
        self.ensure_device()?;
        self.compute.step(&self.context);
        Ok(())
    }

    fn render(&mut self) -> SimResult<()> {
        self.ensure_device()?;
        match self.renderer.render(&self.context, &self.compute) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.context.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(SimError::DeviceUnavailable(
                "out of memory while acquiring frame".into(),
            )),
            Err(e) => {
                // Timeouts drop this frame only
                log::warn!("Skipping frame: {e:?}");
                Ok(())
            }
        }
    }

    fn resize_viewport(&mut self, width: u32, height: u32) {
        if self.context.resize(PhysicalSize::new(width, height)) {
            self.renderer.resize(&self.context);
        }
    }
}
// --- End of File: gpu.rs ---
