//! Configuration module — project settings from `.cfe.toml`.

pub mod settings;

pub use settings::Settings;
