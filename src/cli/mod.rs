//! CLI command handling module
//!
//! Handles all CLI subcommands and logging bootstrap.

mod commands;
mod logging;
mod version;

pub use commands::{ConfigSubcommand, crd_manifests, handle_config_command, run_operator};
pub use logging::init_logging;
pub use version::display_version;
