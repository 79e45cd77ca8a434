// src/layout/core.rs
//! Core types for city layout: the layout area, blocks, placement candidates.

use bevy::prelude::*; // Vec2, Rect

use crate::grammar::core::Footprint;
use crate::grammar::rng::RandomSource;

use super::bias::{BiasDraw, BiasParams};
use super::packing::{footprint_rect, Packable};

// ---------- Area ----------

/// Axis-aligned XZ bounds of a layout; the center-factor reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutArea {
    pub center: Vec2,
    pub half: Vec2,
}

impl LayoutArea {
    /// Area of `extent` centered on the origin.
    pub fn from_extent(extent: Vec2) -> Self {
        Self { center: Vec2::ZERO, half: extent.abs() * 0.5 }
    }

    /// Tight bounds around every block; `None` for an empty layout.
    pub fn around(blocks: &[Block]) -> Option<Self> {
        let mut it = blocks.iter().map(Block::rect);
        let first = it.next()?;
        let r = it.fold(first, |acc, r| acc.union(r));
        Some(Self { center: r.center(), half: r.half_size() })
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_center_half_size(self.center, self.half)
    }

    /// Center-to-corner distance.
    #[inline]
    pub fn max_dist(&self) -> f32 { self.half.length() }

    /// `1 - clamp01(dist / max_dist)`: 1 at the center, 0 at the corners.
    pub fn center_factor(&self, p: Vec2) -> f32 {
        let max = self.max_dist();
        if max <= f32::EPSILON { return 1.0; }
        1.0 - (p.distance(self.center) / max).clamp(0.0, 1.0)
    }
}

// ---------- Blocks ----------

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlockShape {
    Rect,
    /// Circular cluster; `size` is its bounding square.
    Disc { radius: f32 },
}

/// One region buildings are packed into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Block {
    pub index: u32,
    pub center: Vec2,
    pub size: Vec2,
    pub center_factor: f32,
    pub shape: BlockShape,
}

impl Block {
    pub fn rect_block(index: u32, center: Vec2, size: Vec2) -> Self {
        Self { index, center, size, center_factor: 0.0, shape: BlockShape::Rect }
    }

    pub fn disc_block(index: u32, center: Vec2, radius: f32) -> Self {
        Self {
            index,
            center,
            size: Vec2::splat(radius * 2.0),
            center_factor: 0.0,
            shape: BlockShape::Disc { radius },
        }
    }

    /// World-space bounds.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_center_size(self.center, self.size)
    }

    /// Block-local bounds (centered on the origin).
    #[inline]
    pub fn local_rect(&self) -> Rect {
        Rect::from_center_size(Vec2::ZERO, self.size)
    }
}

impl Packable for Block {
    fn rect(&self) -> Rect { Block::rect(self) }
}

// ---------- Candidates ----------

/// An accepted (or proposed) building slot inside a block. Positions are block-local.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementCandidate {
    pub local_position: Vec2,
    /// Footprint extent in world units (one unit per grid cell).
    pub footprint_size: Vec2,
    /// Block-local axis-aligned bounds of the rotated footprint.
    pub rect: Rect,
    /// Yaw around +Y (radians).
    pub rotation: f32,
    pub palette_index: usize,
    pub center_factor: f32,
    pub footprint: Footprint,
    pub stories: i32,
}

impl Packable for PlacementCandidate {
    fn rect(&self) -> Rect { self.rect }
}

/// Random part of a building's sizing, position independent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateDraw {
    pub bias: BiasDraw,
    pub palette_index: usize,
}

/// Everything a strategy needs to size and pack the buildings of one block.
#[derive(Clone, Copy, Debug)]
pub struct PlacementParams {
    pub area: LayoutArea,
    pub bias: BiasParams,
    pub base_footprint: Footprint,
    pub base_stories: i32,
    pub min_spacing: f32,
    pub attempt_budget: u32,
    pub buildings_per_block: (u32, u32),
    pub palette_count: usize,
}

impl PlacementParams {
    /// Variances and palette for one building. Draw order: size variance, height variance, palette.
    pub fn draw(&self, rng: &mut dyn RandomSource) -> CandidateDraw {
        let bias = self.bias.draw(rng);
        let palette_index = rng.next_int(self.palette_count);
        CandidateDraw { bias, palette_index }
    }

    /// Size a building at `local` in `block` from an existing draw.
    pub fn candidate_with(&self, block: &Block, local: Vec2, rotation: f32, draw: CandidateDraw) -> PlacementCandidate {
        let cf = self.area.center_factor(block.center + local);
        let (footprint, stories) = self.bias.dims(self.base_footprint, self.base_stories, cf, draw.bias);
        let size = Vec2::new(footprint.width as f32, footprint.depth as f32);
        PlacementCandidate {
            local_position: local,
            footprint_size: size,
            rect: footprint_rect(local, size, rotation),
            rotation,
            palette_index: draw.palette_index,
            center_factor: cf,
            footprint,
            stories,
        }
    }

    /// Size a building at `local` in `block`.
    pub fn candidate(&self, block: &Block, local: Vec2, rotation: f32, rng: &mut dyn RandomSource) -> PlacementCandidate {
        let draw = self.draw(rng);
        self.candidate_with(block, local, rotation, draw)
    }

    /// Size a building requested at `local`, let `place(local, half_extent)` move it,
    /// and size it again where it lands. `None` when `place` rejects it or the
    /// re-sized building would have to move again.
    pub fn candidate_placed(
        &self,
        block: &Block,
        local: Vec2,
        rotation: f32,
        rng: &mut dyn RandomSource,
        place: impl Fn(Vec2, Vec2) -> Option<Vec2>,
    ) -> Option<PlacementCandidate> {
        let draw = self.draw(rng);
        let first = self.candidate_with(block, local, rotation, draw);
        let at = place(local, first.rect.half_size())?;
        let c = self.candidate_with(block, at, rotation, draw);
        let settled = place(local, c.rect.half_size())?;
        (settled.distance_squared(at) <= 1e-8).then_some(c)
    }

    /// Building count for one block request, drawn from the configured range.
    #[inline]
    pub fn draw_count(&self, rng: &mut dyn RandomSource) -> usize {
        let (lo, hi) = self.buildings_per_block;
        rng.range_inclusive(lo as usize, hi as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::rng::seeded;
    use crate::layout::packing::clamp_into;

    #[test]
    fn center_factor_decays_to_corners() {
        let area = LayoutArea::from_extent(Vec2::new(100.0, 100.0));
        assert_eq!(area.center_factor(Vec2::ZERO), 1.0);
        assert!(area.center_factor(Vec2::new(50.0, 50.0)).abs() < 1e-6);
        assert_eq!(area.center_factor(Vec2::new(500.0, 0.0)), 0.0);
        let mid = area.center_factor(Vec2::new(25.0, 25.0));
        assert!((mid - 0.5).abs() < 1e-5);
    }

    #[test]
    fn area_wraps_all_blocks() {
        let blocks = [
            Block::rect_block(0, Vec2::new(-10.0, 0.0), Vec2::splat(4.0)),
            Block::rect_block(1, Vec2::new(20.0, 6.0), Vec2::splat(4.0)),
        ];
        let area = LayoutArea::around(&blocks).unwrap();
        assert_eq!(area.rect().min, Vec2::new(-12.0, -2.0));
        assert_eq!(area.rect().max, Vec2::new(22.0, 8.0));
        assert!(LayoutArea::around(&[]).is_none());
    }

    #[test]
    fn placed_candidates_are_sized_where_they_land() {
        let block = Block::rect_block(0, Vec2::new(30.0, 0.0), Vec2::splat(12.0));
        let area = LayoutArea::from_extent(Vec2::new(100.0, 100.0));
        let params = crate::layout::tests::params(area);
        let bounds = block.local_rect();
        let outside = bounds.max + Vec2::splat(3.0);
        let mut rng = seeded(5);
        let mut settled = 0;
        for _ in 0..50 {
            let Some(c) = params.candidate_placed(&block, outside, 0.0, &mut rng, |at, half| clamp_into(at, half, bounds))
            else {
                continue;
            };
            settled += 1;
            assert_ne!(c.local_position, outside);
            assert_eq!(c.center_factor, area.center_factor(block.center + c.local_position));
            assert_eq!(c.rect, footprint_rect(c.local_position, c.footprint_size, 0.0));
            assert!(bounds.inflate(1e-3).contains(c.rect.min) && bounds.inflate(1e-3).contains(c.rect.max));
        }
        assert!(settled > 0);
    }
}
