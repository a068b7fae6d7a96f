//! # Cachebench Core
//!
//! Core types shared by every cachebench crate: the unified error type,
//! result aliases and logging initialisation.

pub mod error;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use result::*;
pub use telemetry::*;

// Re-export shaku for dependency injection
pub use shaku::{module, HasComponent, Interface};
