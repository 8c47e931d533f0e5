//! # pp-runtime
//!
//! Bootstrap for the PawPoint session core: configuration loading, tracing
//! setup, dependency wiring and the [`AppRuntime`] lifecycle.

pub mod bootstrap;
pub mod runtime;

pub use bootstrap::config::{load_config, resolve_config};
pub use bootstrap::tracing::init_tracing_subscriber;
pub use bootstrap::wiring::{build_runtime, build_runtime_with_provider_flow};
pub use runtime::AppRuntime;
