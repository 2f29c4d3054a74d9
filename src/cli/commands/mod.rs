//! CLI command implementations.

mod analyze;
mod config;
mod serve;

pub use analyze::run_analyze;
pub use config::run_config;
pub use serve::run_serve;
