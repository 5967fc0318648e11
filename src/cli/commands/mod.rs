//! CLI command implementations.

mod config;
mod doctor;
mod research;
mod serve;

pub use config::run_config;
pub use doctor::run_doctor;
pub use research::run_research;
pub use serve::run_serve;
