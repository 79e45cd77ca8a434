// src/layout/grid.rs
//! Regular block grid. Uniform: random building count per block.
//! Radial: count interpolated by the block's center factor.

use bevy::prelude::*;

use super::core::{Block, PlacementCandidate, PlacementParams};
use super::{fill_block, LayoutStrategy};
use crate::config::GridParams;
use crate::grammar::rng::RandomSource;

pub struct GridLayout {
    params: GridParams,
    radial: bool,
}

impl GridLayout {
    pub fn uniform(params: GridParams) -> Self { Self { params, radial: false } }
    pub fn radial(params: GridParams) -> Self { Self { params, radial: true } }

    /// Count for a radial block: `lerp(min, max, cf)`, rounded.
    #[inline]
    fn radial_count(&self, block: &Block, params: &PlacementParams) -> usize {
        let (lo, hi) = params.buildings_per_block;
        let t = block.center_factor.clamp(0.0, 1.0);
        (lo as f32 + (hi as f32 - lo as f32) * t).round().max(0.0) as usize
    }
}

impl LayoutStrategy for GridLayout {
    fn name(&self) -> &'static str {
        if self.radial { "radial_grid" } else { "uniform_grid" }
    }

    fn compute_blocks(&self, _extent: Vec2, _attempt_budget: u32, _rng: &mut dyn RandomSource) -> Vec<Block> {
        let n = self.params.blocks;
        let size = self.params.block_size.max(0.0);
        let street = self.params.street_width.max(0.0);
        let pitch = size + street;
        let total = n as f32 * size + n.saturating_sub(1) as f32 * street;
        let origin = -total * 0.5 + size * 0.5;

        let mut out = Vec::with_capacity((n as usize).saturating_mul(n as usize));
        for bx in 0..n {
            for bz in 0..n {
                let center = Vec2::new(origin + bx as f32 * pitch, origin + bz as f32 * pitch);
                out.push(Block::rect_block(bx * n + bz, center, Vec2::splat(size)));
            }
        }
        out
    }

    fn place_buildings(&self, block: &Block, params: &PlacementParams, rng: &mut dyn RandomSource) -> Vec<PlacementCandidate> {
        let count = if self.radial { self.radial_count(block, params) } else { params.draw_count(rng) };
        fill_block(block, params, count, rng)
    }
}
