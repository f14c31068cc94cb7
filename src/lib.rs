pub mod compute;
pub mod config;
pub mod constants;
pub mod controls;
pub mod error;
pub mod gpu;
pub mod graphics;
pub mod grid;
pub mod playback;
pub mod renderer;
pub mod substrate;
pub mod transition;
pub mod utils;
