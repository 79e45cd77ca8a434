// src/layout/organic.rs
//! Irregular block grid: random block sizes, random street widths with a main street
//! every n-th street, each block nudged by a small jitter. Recentered on the origin.

use bevy::prelude::*;

use super::core::{Block, LayoutArea, PlacementCandidate, PlacementParams};
use super::{fill_block, LayoutStrategy};
use crate::config::OrganicParams;
use crate::grammar::rng::RandomSource;

#[inline]
fn street_width(p: &OrganicParams, index: u32, rng: &mut dyn RandomSource) -> f32 {
    if p.main_street_frequency > 0 && index % p.main_street_frequency == 0 {
        return p.main_street_width;
    }
    rng.range_f32(p.street_width_range.0, p.street_width_range.1)
}

/// Block enumeration shared with the perimeter layout.
/// Draws per column: width, then per block depth, jitter x, jitter z, street; then the column street.
pub fn organic_blocks(p: &OrganicParams, rng: &mut dyn RandomSource) -> Vec<Block> {
    let (lo, hi) = p.block_size_range;
    let j = p.offset_jitter.max(0.0);
    let mut out = Vec::with_capacity((p.blocks as usize).saturating_mul(p.blocks as usize));

    let mut x = 0.0;
    for bx in 0..p.blocks {
        let width = rng.range_f32(lo, hi);
        let mut z = 0.0;
        for bz in 0..p.blocks {
            let depth = rng.range_f32(lo, hi);
            let jitter = Vec2::new(rng.range_f32(-j, j), rng.range_f32(-j, j));
            let center = Vec2::new(x + width * 0.5, z + depth * 0.5) + jitter;
            out.push(Block::rect_block(bx * p.blocks + bz, center, Vec2::new(width, depth)));
            z += depth + street_width(p, bz, rng);
        }
        x += width + street_width(p, bx, rng);
    }

    if let Some(area) = LayoutArea::around(&out) {
        for b in &mut out {
            b.center -= area.center;
        }
    }
    out
}

pub struct OrganicLayout {
    params: OrganicParams,
}

impl OrganicLayout {
    pub fn new(params: OrganicParams) -> Self { Self { params } }
}

impl LayoutStrategy for OrganicLayout {
    fn name(&self) -> &'static str { "organic_blocks" }

    fn compute_blocks(&self, _extent: Vec2, _attempt_budget: u32, rng: &mut dyn RandomSource) -> Vec<Block> {
        organic_blocks(&self.params, rng)
    }

    fn place_buildings(&self, block: &Block, params: &PlacementParams, rng: &mut dyn RandomSource) -> Vec<PlacementCandidate> {
        let count = params.draw_count(rng);
        fill_block(block, params, count, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::rng::seeded;

    #[test]
    fn blocks_never_overlap_without_jitter() {
        let p = OrganicParams { offset_jitter: 0.0, ..default() };
        let blocks = organic_blocks(&p, &mut seeded(5));
        assert_eq!(blocks.len(), (p.blocks * p.blocks) as usize);
        for (i, a) in blocks.iter().enumerate() {
            assert!(a.size.x >= 40.0 && a.size.x <= 60.0);
            for b in &blocks[i + 1..] {
                assert!(a.rect().intersect(b.rect()).is_empty());
            }
        }
        let area = LayoutArea::around(&blocks).unwrap();
        assert!(area.center.length() < 1e-3);
    }

    #[test]
    fn main_streets_follow_the_frequency() {
        let p = OrganicParams { main_street_frequency: 3, main_street_width: 9.0, street_width_range: (3.0, 5.0), ..default() };
        let mut rng = seeded(1);
        assert_eq!(street_width(&p, 0, &mut rng), 9.0);
        assert_eq!(street_width(&p, 3, &mut rng), 9.0);
        let w = street_width(&p, 1, &mut rng);
        assert!((3.0..5.0).contains(&w));

        let never = OrganicParams { main_street_frequency: 0, ..p };
        assert!(street_width(&never, 0, &mut rng) < 9.0);
    }

    #[test]
    fn same_seed_same_blocks() {
        let p = OrganicParams::default();
        assert_eq!(organic_blocks(&p, &mut seeded(8)), organic_blocks(&p, &mut seeded(8)));
    }
}
