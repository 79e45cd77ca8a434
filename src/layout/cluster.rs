// src/layout/cluster.rs
//! Circular building clusters, themselves packed into the city extent.

use std::f32::consts::{FRAC_PI_2, TAU};

use bevy::prelude::*;

use super::core::{Block, BlockShape, PlacementCandidate, PlacementParams};
use super::packing::Packer;
use super::LayoutStrategy;
use crate::config::ClusterParams;
use crate::grammar::rng::RandomSource;

pub struct ClusterLayout {
    params: ClusterParams,
}

impl ClusterLayout {
    pub fn new(params: ClusterParams) -> Self { Self { params } }
}

impl LayoutStrategy for ClusterLayout {
    fn name(&self) -> &'static str { "clusters" }

    fn compute_blocks(&self, extent: Vec2, attempt_budget: u32, rng: &mut dyn RandomSource) -> Vec<Block> {
        let bounds = Rect::from_center_size(Vec2::ZERO, extent.abs());
        let (r_lo, r_hi) = self.params.radius_range;
        let mut packer = Packer::new(Some(bounds), 0.0, attempt_budget);
        let mut out = Vec::new();

        for _ in 0..self.params.cluster_count {
            let index = out.len() as u32;
            let placed = packer.propose(rng, |rng| {
                let radius = rng.range_f32(r_lo, r_hi);
                let center = Vec2::new(
                    rng.range_f32(bounds.min.x + radius, bounds.max.x - radius),
                    rng.range_f32(bounds.min.y + radius, bounds.max.y - radius),
                );
                Some(Block::disc_block(index, center, radius))
            });
            out.extend(placed);
        }
        if out.len() < self.params.cluster_count as usize {
            debug!("clusters: placed {}/{} clusters", out.len(), self.params.cluster_count);
        }
        out
    }

    fn place_buildings(&self, block: &Block, params: &PlacementParams, rng: &mut dyn RandomSource) -> Vec<PlacementCandidate> {
        let BlockShape::Disc { radius } = block.shape else {
            return super::fill_block(block, params, params.draw_count(rng), rng);
        };
        let count = params.draw_count(rng);
        let mut packer = Packer::new(Some(block.local_rect()), params.min_spacing, params.attempt_budget);
        let mut out = Vec::with_capacity(count);

        for _ in 0..count {
            let placed = packer.propose(rng, |rng| {
                let r = radius * rng.next_float().sqrt();
                let a = rng.next_float() * TAU;
                let local = Vec2::new(r * a.cos(), r * a.sin());
                let yaw = rng.next_int(4) as f32 * FRAC_PI_2;
                let c = params.candidate(block, local, yaw, rng);
                // Whole footprint inside the disc.
                let far = c.rect.half_size().length() + local.length();
                (far <= radius).then_some(c)
            });
            out.extend(placed);
        }
        out
    }
}
