//! # Cachebench
//!
//! Benchmark harness for the distributed cache gateway.
//!
//! Reads a JSON fixture, turns every item into a [`RealtimeOnline`] record
//! and times single and batch cache operations against the configured store.

pub mod di;
pub mod domain;
pub mod fixture;
pub mod runner;
pub mod startup;

pub use domain::{RealtimeOnline, SpecialtyCategory};
pub use fixture::{Fixture, FixtureItem};
pub use runner::{BenchReport, BenchStep, BenchmarkRunner, StepTiming};
