//! # Cachebench Config
//!
//! Configuration management for cachebench.
//! Supports layered configuration from TOML files and environment variables.

mod app_config;
mod loader;
mod redis_mode;

pub use app_config::*;
pub use loader::*;
pub use redis_mode::*;
