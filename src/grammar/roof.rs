// src/grammar/roof.rs
//! Roof rule: a flat cap, or a pass that strips two edges, shrinks one axis by 2
//! and continues into another roof pass or a setback stock.

use bevy::prelude::*;

use super::core::{Expansion, Footprint, RoofState, RowState, Rule, ShapeRule, StockState, StyleRole};
use super::rng::RandomSource;

impl RoofState {
    fn flat_cap(&self, rng: &mut dyn RandomSource, out: &mut Expansion) {
        let palette = &self.ctx.palette;
        if palette.roof.is_empty() { return; }
        let Footprint { width, depth } = self.footprint;
        let x_off = (width - 1) as f32 * 0.5;
        let z_off = (depth - 1) as f32 * 0.5;
        for i in 0..width {
            for j in 0..depth {
                let variant = rng.next_int(palette.roof.len());
                let at = Vec3::new(i as f32 - x_off, 0.0, j as f32 - z_off);
                out.spawn(palette, StyleRole::Roof, variant, at, Quat::IDENTITY);
            }
        }
    }

    fn setback(&self, footprint: Footprint, roof_passes: u32, out: &mut Expansion) {
        let dims = self.ctx.palette.dims;
        let stock = StockState {
            footprint,
            building_height: 0,
            floor_level: 0,
            roof_passes,
            ctx: self.ctx.clone(),
        };
        let up = dims.wall_height() * 0.5 - dims.roof_thickness * 0.5;
        out.child(Rule::Stock(stock), Vec3::new(0.0, up, 0.0), true);
    }
}

impl ShapeRule for RoofState {
    fn expand(&self, rng: &mut dyn RandomSource) -> Expansion {
        let mut out = Expansion::default();
        if self.footprint.is_empty() { return out; }

        let params = &self.ctx.params;
        if !params.continue_roof || self.roof_passes <= 1 {
            self.flat_cap(rng, &mut out);
            return out;
        }

        let Footprint { width, depth } = self.footprint;
        let strip = self.ctx.palette.strip_role();
        let mut next = self.footprint;

        // 1) Two strips along the edges of the reduced axis
        let axis = rng.next_int(2);
        for i in 0..2 {
            let side = i as f32 - 0.5;
            let (count, direction, at) = if axis == 0 {
                (depth, Vec3::Z, Vec3::new((width - 1) as f32 * side, 0.0, 0.0))
            } else {
                (width, Vec3::X, Vec3::new(0.0, 0.0, (depth - 1) as f32 * side))
            };
            let row = RowState { count, role: strip, direction, ctx: self.ctx.clone() };
            out.child(Rule::Row(row), at, false);
        }
        if axis == 0 { next.width -= 2 } else { next.depth -= 2 }

        // 2) Nothing left to cover
        if next.is_empty() { return out; }

        // 3) Continue, possibly widening the other axis
        let passes = self.roof_passes - 1;
        if rng.chance(params.roof_continue_chance) {
            if rng.chance(params.roof_expand_chance) {
                if axis == 0 { next.depth = depth + 2 } else { next.width = width + 2 }
            }
            if rng.chance(params.roof_stock_chance) {
                self.setback(next, passes, &mut out);
            } else {
                let roof = RoofState { footprint: next, roof_passes: passes, ctx: self.ctx.clone() };
                out.child(Rule::Roof(roof), Vec3::ZERO, true);
            }
        } else {
            self.setback(next, passes, &mut out);
        }

        debug!(
            "roof {}x{} -> {}x{} ({} passes left)",
            width, depth, next.width, next.depth, passes
        );
        out
    }
}
