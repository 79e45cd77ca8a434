// src/layout/mod.rs
//! Layout strategies: blocks first, then packed building slots per block.

use std::sync::Arc;

use bevy::prelude::*; // Vec2

use crate::config::LayoutDef;
use crate::grammar::rng::RandomSource;

pub mod bias;
pub mod core;
pub mod packing;
pub mod runner;

mod cluster;
mod grid;
mod organic;
mod perimeter;

pub use self::core::{Block, BlockShape, LayoutArea, PlacementCandidate, PlacementParams};
pub use cluster::ClusterLayout;
pub use grid::GridLayout;
pub use organic::{organic_blocks, OrganicLayout};
pub use packing::Packer;
pub use perimeter::PerimeterLayout;

/// One layout algorithm. `compute_blocks` runs once per city, `place_buildings` once per block.
pub trait LayoutStrategy: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Regions to fill. Center factors are assigned by the caller.
    fn compute_blocks(&self, extent: Vec2, attempt_budget: u32, rng: &mut dyn RandomSource) -> Vec<Block>;

    /// Accepted slots for one block, block-local, in request order.
    fn place_buildings(&self, block: &Block, params: &PlacementParams, rng: &mut dyn RandomSource) -> Vec<PlacementCandidate>;
}

/// Factory: build a shared strategy from a manifest `LayoutDef`.
pub fn make_strategy(def: &LayoutDef) -> Arc<dyn LayoutStrategy> {
    match def {
        LayoutDef::UniformGrid(p) => Arc::new(GridLayout::uniform(*p)),
        LayoutDef::RadialGrid(p) => Arc::new(GridLayout::radial(*p)),
        LayoutDef::Clusters(p) => Arc::new(ClusterLayout::new(*p)),
        LayoutDef::OrganicBlocks(p) => Arc::new(OrganicLayout::new(*p)),
        LayoutDef::Perimeter(p) => Arc::new(PerimeterLayout::new(*p)),
    }
}

/// Pack `count` uniformly sampled buildings into a rectangular block.
pub(crate) fn fill_block(
    block: &Block,
    params: &PlacementParams,
    count: usize,
    rng: &mut dyn RandomSource,
) -> Vec<PlacementCandidate> {
    let bounds = block.local_rect();
    let mut packer = Packer::new(Some(bounds), params.min_spacing, params.attempt_budget);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let placed = packer.propose(rng, |rng| {
            let p = Vec2::new(
                rng.range_f32(bounds.min.x, bounds.max.x),
                rng.range_f32(bounds.min.y, bounds.max.y),
            );
            params.candidate_placed(block, p, 0.0, rng, |at, half| packing::clamp_into(at, half, bounds))
        });
        out.extend(placed);
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::grammar::core::Footprint;
    use crate::grammar::rng::seeded;
    use crate::layout::bias::BiasParams;

    pub(crate) fn params(area: LayoutArea) -> PlacementParams {
        PlacementParams {
            area,
            bias: BiasParams { size_variance: 0.2, ..default() },
            base_footprint: Footprint::new(4, 3),
            base_stories: 2,
            min_spacing: 0.5,
            attempt_budget: 20,
            buildings_per_block: (4, 8),
            palette_count: 3,
        }
    }

    /// Accepted slots stay inside their block and clear each other by the spacing.
    pub(crate) fn assert_packed(block: &Block, placed: &[PlacementCandidate], spacing: f32) {
        let bounds = block.local_rect().inflate(1e-3);
        for (i, a) in placed.iter().enumerate() {
            assert!(bounds.contains(a.rect.min) && bounds.contains(a.rect.max), "{:?} outside {:?}", a.rect, bounds);
            assert!(a.palette_index < 3);
            for b in &placed[i + 1..] {
                assert!(a.rect.inflate(spacing - 1e-3).intersect(b.rect).is_empty(), "{:?} vs {:?}", a.rect, b.rect);
            }
        }
    }

    #[test]
    fn every_strategy_packs_without_overlap() {
        let defs = [
            LayoutDef::UniformGrid(default()),
            LayoutDef::RadialGrid(default()),
            LayoutDef::Clusters(default()),
            LayoutDef::OrganicBlocks(default()),
            LayoutDef::Perimeter(default()),
        ];
        for def in defs {
            let strategy = make_strategy(&def);
            let mut rng = seeded(4);
            let mut blocks = strategy.compute_blocks(Vec2::new(240.0, 240.0), 32, &mut rng);
            assert!(!blocks.is_empty(), "{}", strategy.name());
            let area = LayoutArea::around(&blocks).unwrap();
            for b in blocks.iter_mut() {
                b.center_factor = area.center_factor(b.center);
            }
            let p = params(area);
            let mut total = 0;
            for b in &blocks {
                let placed = strategy.place_buildings(b, &p, &mut rng);
                assert_packed(b, &placed, p.min_spacing);
                total += placed.len();
            }
            assert!(total > 0, "{} placed nothing", strategy.name());
        }
    }
}
