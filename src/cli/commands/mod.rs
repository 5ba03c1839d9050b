//! CLI command implementations.

mod clean;
mod config;
mod doctor;
mod generate;
mod init;

pub use clean::run_clean;
pub use config::run_config;
pub use doctor::run_doctor;
pub use generate::run_generate;
pub use init::run_init;
