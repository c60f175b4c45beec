//! Fake transceiver configuration management
//!
//! This crate provides configuration loading and parsing for the transceiver simulator:
//! - TOML configuration file parsing
//! - Stack configuration structures with validation
//! - RF impairment simulation defaults
//! - Command line style `REMOTE_ADDR:BASE_PORT[/CHILD_IDX]` transceiver definitions

pub mod stack_config;
pub mod stack_config_sim;
pub mod toml_config;
pub mod trx_def;

pub use stack_config::*;
pub use stack_config_sim::CfgSim;
pub use trx_def::TrxDef;
