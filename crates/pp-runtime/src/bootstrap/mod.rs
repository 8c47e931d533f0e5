pub mod config;
pub mod tracing;
pub mod wiring;
