// --- File: config.rs ---
use crate::constants::*;
use crate::error::{SimError, SimResult};
use crate::grid::checked_cell_count;
use crate::playback::validate_rate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub cols: usize,
    pub rows: usize,
    pub fps: f64,
    // Chance a cell starts alive when the grid is randomised
    pub alive_probability: f64,
    // Gap between cells as a fraction of one cell
    pub gap_ratio: f32,
    pub window_width: u32,
    pub window_height: u32,
    pub background_color: [u8; 4],
    pub alive_color: [u8; 4],
    pub seed: Option<u64>,
    pub start_paused: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            fps: INITIAL_FPS,
            alive_probability: DEFAULT_ALIVE_PROBABILITY,
            gap_ratio: DEFAULT_GAP_RATIO,
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            background_color: BACKGROUND_COLOR,
            alive_color: ALIVE_COLOR,
            seed: None,
            start_paused: false,
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> SimResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Loads from `$GPU_LIFE_CONFIG`, then `./life.toml`, falling back to defaults.
    pub fn load() -> SimResult<Self> {
        match Self::locate() {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            None => {
                log::info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn locate() -> Option<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(explicit));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    }

    pub fn validate(&self) -> SimResult<()> {
        checked_cell_count(self.cols, self.rows)?;
        validate_rate(self.fps)?;
        if !(0.0..=1.0).contains(&self.alive_probability) {
            return Err(SimError::Config(format!(
                "alive_probability must be within [0, 1], got {}",
                self.alive_probability
            )));
        }
        if !(0.0..1.0).contains(&self.gap_ratio) {
            return Err(SimError::Config(format!(
                "gap_ratio must be within [0, 1), got {}",
                self.gap_ratio
            )));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(SimError::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.window_width, self.window_height
            )));
        }
        Ok(())
    }
}
// --- End of File: config.rs ---
