//! Procedural neon city: a Stock / Roof / Row shape grammar expanded into a node arena,
//! fed by stochastic block layouts and mirrored into a Bevy scene.

pub mod city;
pub mod config;
pub mod grammar;
pub mod layout;

pub use city::CityPlugin;
pub use config::CityManifest;
pub use grammar::ShapeTree;
