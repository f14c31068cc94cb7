// --- File: error.rs ---
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid step rate: {0} (must be > 0)")]
    InvalidRate(f64),

    // Substrate failed to initialise or was lost mid-session; terminal for the host
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type SimResult<T> = Result<T, SimError>;
// --- End of File: error.rs ---
