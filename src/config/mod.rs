// src/config/mod.rs
pub mod settings;

pub use settings::{parse_flag, Config};
