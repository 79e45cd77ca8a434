// src/layout/runner.rs
//! Runs a layout strategy over a whole city and hands each building to the shape tree.

use bevy::prelude::*;

use super::bias::BiasParams;
use super::core::{Block, LayoutArea, PlacementParams};
use super::make_strategy;
use crate::config::{CityManifest, GrammarConfig, LayoutConfig};
use crate::grammar::core::{BuildingContext, Footprint, Rule, StockState};
use crate::grammar::palette::PaletteLibrary;
use crate::grammar::rng::{mix_seed, RandomSource};
use crate::grammar::tree::{NodeId, ShapeTree};

/// One building ready to be configured as a root stock.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildingPlan {
    pub block: u32,
    pub slot: u32,
    pub transform: Transform,
    pub footprint: Footprint,
    pub stories: i32,
    pub continue_roof: bool,
    pub palette_index: usize,
    pub center_factor: f32,
}

#[derive(Clone, Debug, Default)]
pub struct CityPlan {
    pub blocks: Vec<Block>,
    pub buildings: Vec<BuildingPlan>,
}

/// Blocks and accepted buildings for one city. Per accepted building: one draw for `continue_roof`.
pub fn plan_city(layout: &LayoutConfig, palette_count: usize, rng: &mut dyn RandomSource) -> CityPlan {
    let strategy = make_strategy(&layout.strategy);
    let extent = Vec2::new(layout.extent.0, layout.extent.1);
    let mut blocks = strategy.compute_blocks(extent, layout.packing_attempt_budget, rng);
    let Some(area) = LayoutArea::around(&blocks) else {
        warn!("layout '{}' produced no blocks", strategy.name());
        return CityPlan::default();
    };
    for b in &mut blocks {
        b.center_factor = area.center_factor(b.center);
    }

    let params = PlacementParams {
        area,
        bias: BiasParams {
            edge_scale: layout.edge_scale,
            center_scale: layout.center_scale,
            height_range: layout.height_multiplier_range,
            size_variance: layout.size_variance,
        },
        base_footprint: layout.base_footprint,
        base_stories: layout.base_stories,
        min_spacing: layout.min_spacing,
        attempt_budget: layout.packing_attempt_budget,
        buildings_per_block: layout.buildings_per_block,
        palette_count,
    };

    let mut buildings = Vec::new();
    for block in &blocks {
        let placed = strategy.place_buildings(block, &params, rng);
        debug!(
            "block {} at ({:.0}, {:.0}) cf={:.2}: {} buildings",
            block.index, block.center.x, block.center.y, block.center_factor, placed.len()
        );
        for (slot, c) in placed.into_iter().enumerate() {
            let continue_roof = rng.chance(layout.continue_roof_chance);
            let world = block.center + c.local_position;
            buildings.push(BuildingPlan {
                block: block.index,
                slot: slot as u32,
                transform: Transform::from_xyz(world.x, 0.0, world.y)
                    .with_rotation(Quat::from_rotation_y(c.rotation)),
                footprint: c.footprint,
                stories: c.stories,
                continue_roof,
                palette_index: c.palette_index,
                center_factor: c.center_factor,
            });
        }
    }

    info!("layout '{}': {} blocks, {} buildings", strategy.name(), blocks.len(), buildings.len());
    CityPlan { blocks, buildings }
}

/// Add one configured root per planned building. A building that fails to configure is
/// logged and skipped; its siblings are unaffected.
pub fn populate(
    tree: &mut ShapeTree,
    plan: &CityPlan,
    library: &PaletteLibrary,
    grammar: &GrammarConfig,
    seed: Option<u64>,
) -> Vec<NodeId> {
    let mut roots = Vec::with_capacity(plan.buildings.len());
    for b in &plan.buildings {
        let Some(palette) = library.get(b.palette_index) else {
            warn!("building {}/{}: palette index {} out of range", b.block, b.slot, b.palette_index);
            continue;
        };
        let ctx = BuildingContext { palette: palette.clone(), params: grammar.params(b.continue_roof) };
        let rule = Rule::Stock(StockState::root(b.footprint, b.stories, ctx));

        let root = tree.add_root(format!("building_{}_{}", b.block, b.slot), b.transform);
        let configured = tree
            .configure(root, rule)
            .and_then(|_| tree.set_build_delay(root, grammar.build_delay))
            .and_then(|_| tree.set_rng_seed(root, seed.map(|s| mix_seed(s, b.block, b.slot))));
        match configured {
            Ok(()) => roots.push(root),
            Err(e) => {
                warn!("building {}/{}: {e}", b.block, b.slot);
                let _ = tree.remove(root);
            }
        }
    }
    roots
}

/// Plan, configure and generate a whole city. Returns the generated roots.
pub fn generate_city(
    tree: &mut ShapeTree,
    manifest: &CityManifest,
    library: &PaletteLibrary,
    rng: &mut dyn RandomSource,
) -> Vec<NodeId> {
    if library.is_empty() {
        error!("city generation skipped: no usable palettes");
        return Vec::new();
    }
    let plan = plan_city(&manifest.layout, library.len(), rng);
    let roots = populate(tree, &plan, library, &manifest.grammar, manifest.seed);
    for &root in &roots {
        if let Err(e) = tree.generate(root, manifest.grammar.build_delay) {
            warn!("generate {root:?}: {e}");
        }
    }
    roots
}
