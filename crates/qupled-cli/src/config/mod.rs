//! Layered configuration for the `solve` command: CLI flags and `-S` overrides first,
//! then the TOML config file, then compiled-in defaults.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;
