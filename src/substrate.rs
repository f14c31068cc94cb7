// --- File: substrate.rs ---
// GpuSubstrate (gpu.rs) runs in the window; CpuSubstrate runs the same rule
// with rayon and draws into memory.

use crate::error::SimResult;
use crate::grid::{CellState, DoubleBuffer, Grid};
use crate::renderer::{Palette, shade_pixel};
use crate::transition;
use glam::UVec2;

/// Compute and render substrate driven by the playback controller.
///
/// Every call completes before it returns: `step` waits for its dispatch,
/// so a following `render` always observes the new generation.
pub trait Substrate {
    fn dimensions(&self) -> (usize, usize);

    /// Replaces the current generation, reallocating if the size changed.
    fn load(&mut self, grid: &Grid) -> SimResult<()>;

    /// Overwrites one cell of the current generation (wrapped coordinates).
    fn set_cell(&mut self, x: isize, y: isize, state: CellState) -> SimResult<()>;

    fn step(&mut self) -> SimResult<()>;

    /// Draws the current generation into the render target.
    fn render(&mut self) -> SimResult<()>;

    fn resize_viewport(&mut self, width: u32, height: u32);
}

// RGBA8, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }
}

pub struct CpuSubstrate {
    buffers: DoubleBuffer,
    viewport: UVec2,
    target: Option<Framebuffer>,
    palette: Palette,
    gap_ratio: f32,
    steps_taken: u64,
    frames_rendered: u64,
}

impl CpuSubstrate {
    pub fn new(grid: Grid, viewport: (u32, u32), palette: Palette, gap_ratio: f32) -> Self {
        Self {
            buffers: DoubleBuffer::new(grid),
            viewport: UVec2::new(viewport.0.max(1), viewport.1.max(1)),
            target: None,
            palette,
            gap_ratio,
            steps_taken: 0,
            frames_rendered: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        self.buffers.current()
    }

    pub fn buffer_index(&self) -> usize {
        self.buffers.current_index()
    }

    pub fn target(&self) -> Option<&Framebuffer> {
        self.target.as_ref()
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl Substrate for CpuSubstrate {
    fn dimensions(&self) -> (usize, usize) {
        self.buffers.dimensions()
    }

    fn load(&mut self, grid: &Grid) -> SimResult<()> {
        if grid.dimensions() != self.dimensions() {
            let (w, h) = grid.dimensions();
            log::info!("Reallocating cell buffers for {w}x{h} grid");
        }
        self.buffers = DoubleBuffer::new(grid.clone());
        Ok(())
    }

    fn set_cell(&mut self, x: isize, y: isize, state: CellState) -> SimResult<()> {
        self.buffers.current_mut().set(x, y, state);
        Ok(())
    }

    fn step(&mut self) -> SimResult<()> {
        transition::advance(&mut self.buffers);
        self.steps_taken += 1;
        Ok(())
    }

    fn render(&mut self) -> SimResult<()> {
        let viewport = self.viewport;
        let stale = self
            .target
            .as_ref()
            .is_none_or(|t| t.width != viewport.x || t.height != viewport.y);
        if stale {
            self.target = Some(Framebuffer::new(viewport.x, viewport.y));
        }
        let Some(target) = self.target.as_mut() else {
            return Ok(());
        };

        let grid = self.buffers.current();
        let dims = grid.dimensions();
        for py in 0..viewport.y {
            for px in 0..viewport.x {
                let color = match shade_pixel(UVec2::new(px, py), viewport, dims, self.gap_ratio) {
                    Some((cx, cy)) if grid.get(cx as isize, cy as isize).is_alive() => {
                        self.palette.alive
                    }
                    _ => self.palette.background,
                };
                target.pixels[(py * viewport.x + px) as usize] = color;
            }
        }
        self.frames_rendered += 1;
        Ok(())
    }

    fn resize_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport = UVec2::new(width, height);
        }
    }
}

// --- End of File: substrate.rs ---
