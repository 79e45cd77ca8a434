// src/layout/perimeter.rs
//! Buildings lined up along each block's inset perimeter, facing outward.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use super::core::{Block, PlacementCandidate, PlacementParams};
use super::organic::organic_blocks;
use super::packing::{clamp_into, Packer};
use super::LayoutStrategy;
use crate::config::PerimeterParams;
use crate::grammar::rng::RandomSource;

/// A point on the building line with its quarter-turn index (0..4) and inward normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerimeterSlot {
    pub point: Vec2,
    pub quarter: u32,
    pub inward: Vec2,
}

/// Evenly spaced slots around a `width x depth` rectangle, starting at its (-x, -z) corner.
pub fn perimeter_slots(width: f32, depth: f32, count: usize) -> Vec<PerimeterSlot> {
    if count == 0 || width <= 0.0 || depth <= 0.0 { return Vec::new(); }
    let (hw, hd) = (width * 0.5, depth * 0.5);
    let spacing = 2.0 * (width + depth) / count as f32;

    (0..count)
        .map(|i| {
            let d = i as f32 * spacing;
            if d < width {
                PerimeterSlot { point: Vec2::new(d - hw, -hd), quarter: 0, inward: Vec2::Y }
            } else if d < width + depth {
                PerimeterSlot { point: Vec2::new(hw, d - width - hd), quarter: 1, inward: Vec2::NEG_X }
            } else if d < 2.0 * width + depth {
                PerimeterSlot { point: Vec2::new(hw - (d - width - depth), hd), quarter: 2, inward: Vec2::NEG_Y }
            } else {
                PerimeterSlot { point: Vec2::new(-hw, hd - (d - 2.0 * width - depth)), quarter: 3, inward: Vec2::X }
            }
        })
        .collect()
}

pub struct PerimeterLayout {
    params: PerimeterParams,
}

impl PerimeterLayout {
    pub fn new(params: PerimeterParams) -> Self { Self { params } }
}

impl LayoutStrategy for PerimeterLayout {
    fn name(&self) -> &'static str { "perimeter" }

    fn compute_blocks(&self, _extent: Vec2, _attempt_budget: u32, rng: &mut dyn RandomSource) -> Vec<Block> {
        organic_blocks(&self.params.blocks, rng)
    }

    fn place_buildings(&self, block: &Block, params: &PlacementParams, rng: &mut dyn RandomSource) -> Vec<PlacementCandidate> {
        let count = params.draw_count(rng);
        let margin = self.params.block_margin.max(0.0);
        let usable = block.size - Vec2::splat(margin * 2.0);
        let bounds = block.local_rect();
        let mut packer = Packer::new(Some(bounds), params.min_spacing, params.attempt_budget);

        let mut out = Vec::with_capacity(count);
        for slot in perimeter_slots(usable.x, usable.y, count) {
            let yaw = slot.quarter as f32 * FRAC_PI_2;
            let placed = packer.propose(rng, |rng| {
                // Outer face on the building line.
                params.candidate_placed(block, slot.point, yaw, rng, |point, half| {
                    let at = point + slot.inward * (half * slot.inward.abs()).length();
                    clamp_into(at, half, bounds)
                })
            });
            out.extend(placed);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_walk_the_perimeter_in_order() {
        let slots = perimeter_slots(4.0, 2.0, 6);
        let quarters: Vec<u32> = slots.iter().map(|s| s.quarter).collect();
        assert_eq!(quarters, vec![0, 0, 1, 2, 2, 3]);
        assert_eq!(slots[0].point, Vec2::new(-2.0, -1.0));
        assert_eq!(slots[2].point, Vec2::new(2.0, -1.0));
        assert_eq!(slots[3].point, Vec2::new(2.0, 1.0));
        assert_eq!(slots[5].point, Vec2::new(-2.0, 1.0));
    }

    #[test]
    fn degenerate_blocks_have_no_slots() {
        assert!(perimeter_slots(0.0, 3.0, 4).is_empty());
        assert!(perimeter_slots(3.0, 3.0, 0).is_empty());
    }
}
