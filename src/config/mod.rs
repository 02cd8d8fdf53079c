//! Configuration Module
//!
//! Client settings and the loader that layers them from files and the environment.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{ClientConfig, RetryConfig};
