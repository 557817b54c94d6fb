//! CLI command implementations.

mod config;
mod doctor;
mod download;
mod interactive;

pub use config::run_config;
pub use doctor::run_doctor;
pub use download::run_download;
pub use interactive::{parse_command, run_interactive, InteractiveCommand};
