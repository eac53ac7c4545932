pub mod settings;

pub use settings::{AppSettings, SettingsError, CONFIG_ENV};
