//! Infrastructure adapters for configuration and the external generator.

pub mod config;
pub mod generator;
