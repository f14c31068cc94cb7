// --- Global Simulation Constants ---
pub const BACKGROUND_COLOR: [u8; 4] = [26, 26, 26, 255];
pub const ALIVE_COLOR: [u8; 4] = [230, 230, 230, 255];

pub const WINDOW_WIDTH: u32 = 1024;
pub const WINDOW_HEIGHT: u32 = 1024;

pub const DEFAULT_COLS: usize = 128;
pub const DEFAULT_ROWS: usize = 128;
pub const DEFAULT_ALIVE_PROBABILITY: f64 = 0.3;
pub const DEFAULT_GAP_RATIO: f32 = 0.1;
// Cell buffers hold one u32 per cell and are addressed with u32 byte offsets
pub const MAX_GRID_CELLS: usize = (u32::MAX / 4) as usize;

pub const INITIAL_FPS: f64 = 10.0;
pub const MIN_FPS: f64 = 0.25;
pub const MAX_FPS: f64 = 240.0;
pub const FPS_ADJUST_FACTOR: f64 = 2.0;

// Upper bound on generations run inside one tick. Backlog past this is dropped.
pub const MAX_CATCH_UP_STEPS: u32 = 5;

pub const FPS_UPDATE_INTERVAL_SECS: f64 = 0.5;

// Must match @workgroup_size in shaders/life.wgsl
pub const COMPUTE_WORKGROUP_SIZE: u32 = 16;

pub const CONFIG_ENV_VAR: &str = "GPU_LIFE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "life.toml";
