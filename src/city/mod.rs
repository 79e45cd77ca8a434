//! Bevy host adapter: manifest loading, commands, timed growth and scene sync.

pub mod manifest;
pub mod plugin;
pub mod scene;

pub use plugin::{CityPlugin, CitySettings, CityState, ClearCity, GenerateCity};
