// src/city/manifest.rs
//! Asset loader for `.city.ron` manifests.

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;

use crate::config::{CityManifest, ConfigError};

pub struct CityManifestAssetPlugin;

impl Plugin for CityManifestAssetPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<CityManifest>()
            .register_asset_loader(CityManifestLoader);
    }
}

#[derive(Default)]
pub struct CityManifestLoader;

impl AssetLoader for CityManifestLoader {
    type Asset = CityManifest;
    type Settings = ();
    type Error = ConfigError;

    fn extensions(&self) -> &[&str] {
        &["city.ron"]
    }

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let manifest = CityManifest::from_ron_bytes(&bytes)?;
        manifest.validate()?;
        Ok(manifest)
    }
}
