//! City plugin wiring (glue).
//! - Manifest asset/loader
//! - Generate / clear commands
//! - Deferred expansion driven by `Time`
//! - Tree -> entity sync

use bevy::prelude::*;

use super::manifest::CityManifestAssetPlugin;
use super::scene::{CitySceneMap, SceneWriter};
use crate::config::CityManifest;
use crate::grammar::palette::PaletteLibrary;
use crate::grammar::rng::{seeded, SharedRandom};
use crate::grammar::tree::{NodeId, ShapeTree};
use crate::layout::runner::generate_city;

/// Where the manifest lives and how expansion is paced.
#[derive(Resource, Clone)]
pub struct CitySettings {
    pub manifest_path: String,
    /// Honour build delays (timed growth). `false` expands synchronously.
    pub interactive: bool,
    /// Generate as soon as the manifest is loaded (and again on hot reload).
    pub auto_generate: bool,
}

impl Default for CitySettings {
    fn default() -> Self {
        Self {
            manifest_path: "city/neon.city.ron".to_string(),
            interactive: true,
            auto_generate: true,
        }
    }
}

/// Handle to the loaded manifest asset.
#[derive(Resource, Default)]
pub struct CityManifestHandle(pub Handle<CityManifest>);

/// The shape tree plus what the current city was generated from.
#[derive(Resource)]
pub struct CityState {
    pub tree: ShapeTree,
    pub library: PaletteLibrary,
    pub roots: Vec<NodeId>,
    /// Completed generation passes.
    pub generation: u32,
}

impl CityState {
    pub fn new(interactive: bool) -> Self {
        let mut tree = if interactive { ShapeTree::interactive() } else { ShapeTree::new() };
        tree.set_record_events(true);
        Self { tree, library: PaletteLibrary::default(), roots: Vec::new(), generation: 0 }
    }

    #[inline] pub fn element_count(&self) -> usize { self.tree.total_element_count() }
    #[inline] pub fn pending(&self) -> usize { self.tree.pending() }
}

impl FromWorld for CityState {
    fn from_world(world: &mut World) -> Self {
        let interactive = world.get_resource::<CitySettings>().is_none_or(|s| s.interactive);
        Self::new(interactive)
    }
}

/// Regenerate the whole city (clears the previous one first).
#[derive(Event, Clone, Copy, Debug, Default)]
pub struct GenerateCity;

/// Remove every generated building.
#[derive(Event, Clone, Copy, Debug, Default)]
pub struct ClearCity;

pub struct CityPlugin;
impl Plugin for CityPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(CityManifestAssetPlugin)
            .init_resource::<CitySettings>()
            .init_resource::<CityManifestHandle>()
            .init_resource::<CityState>()
            .init_resource::<CitySceneMap>()
            .add_event::<GenerateCity>()
            .add_event::<ClearCity>()
            .add_systems(Startup, (spawn_city_root, load_manifest))
            .add_systems(Update, monitor_manifest_ready)
            .add_systems(Update, handle_city_commands.after(monitor_manifest_ready))
            .add_systems(Update, advance_city.after(handle_city_commands))
            .add_systems(Update, sync_city_scene.after(advance_city));
    }
}

/// Startup: parent entity for every building.
fn spawn_city_root(mut commands: Commands, mut map: ResMut<CitySceneMap>) {
    let root = commands
        .spawn((Name::new("city"), Transform::IDENTITY, GlobalTransform::IDENTITY, Visibility::Visible))
        .id();
    map.city_root = Some(root);
}

/// Startup: request loading the manifest, store handle.
fn load_manifest(
    mut handle_res: ResMut<CityManifestHandle>,
    settings: Res<CitySettings>,
    assets: Res<AssetServer>,
) {
    if handle_res.0.is_strong() { return; }
    handle_res.0 = assets.load(settings.manifest_path.as_str());
    info!(
        "City: loading manifest from '{}' (interactive={})",
        settings.manifest_path, settings.interactive
    );
}

/// Update: rebuild the palette library whenever the manifest (re)loads.
fn monitor_manifest_ready(
    handle_res: Res<CityManifestHandle>,
    manifests: Res<Assets<CityManifest>>,
    settings: Res<CitySettings>,
    mut asset_events: EventReader<AssetEvent<CityManifest>>,
    mut state: ResMut<CityState>,
    mut generate: EventWriter<GenerateCity>,
) {
    for ev in asset_events.read() {
        let (AssetEvent::LoadedWithDependencies { id } | AssetEvent::Modified { id }) = ev else { continue };
        if *id != handle_res.0.id() { continue; }
        let Some(manifest) = manifests.get(*id) else { continue };

        let (library, rejected) = PaletteLibrary::new(manifest.palettes.iter().cloned());
        for e in &rejected {
            warn!("City: {e}");
        }
        info!("City: manifest ready ({} palettes)", library.len());
        state.library = library;
        if settings.auto_generate {
            generate.write(GenerateCity);
        }
    }
}

/// Update: apply generate / clear commands.
fn handle_city_commands(
    mut generate: EventReader<GenerateCity>,
    mut clear: EventReader<ClearCity>,
    handle_res: Res<CityManifestHandle>,
    manifests: Res<Assets<CityManifest>>,
    mut state: ResMut<CityState>,
) {
    let wants_clear = clear.read().count() > 0;
    let wants_generate = generate.read().count() > 0;
    if !(wants_clear || wants_generate) { return; }

    let state = &mut *state;
    state.tree.remove_all();
    state.roots.clear();
    if !wants_generate {
        info!("City: cleared");
        return;
    }

    let Some(manifest) = manifests.get(&handle_res.0) else {
        warn!("City: generate requested before the manifest loaded");
        return;
    };
    state.roots = match manifest.seed {
        Some(seed) => generate_city(&mut state.tree, manifest, &state.library, &mut seeded(seed)),
        None => generate_city(&mut state.tree, manifest, &state.library, &mut SharedRandom),
    };
    state.generation += 1;
    info!(
        "City: generation {} started with {} buildings ({} pending)",
        state.generation, state.roots.len(), state.pending()
    );
}

/// Update: fire deferred expansions whose delay elapsed.
fn advance_city(time: Res<Time>, mut state: ResMut<CityState>) {
    if state.pending() == 0 { return; }
    let fired = state.tree.advance(time.delta());
    if fired > 0 {
        debug!("City: {} deferred expansions fired, {} pending", fired, state.pending());
    }
}

/// Update: mirror tree changes into the scene.
fn sync_city_scene(
    mut commands: Commands,
    assets: Res<AssetServer>,
    mut state: ResMut<CityState>,
    mut map: ResMut<CitySceneMap>,
) {
    let mut writer = SceneWriter { commands: &mut commands, assets: &*assets, map: &mut *map };
    state.tree.flush_into(&mut writer);
}
