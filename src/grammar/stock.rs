// src/grammar/stock.rs
//! Stock rule: one ring of wall/door/window cells per floor, neon signs on walls,
//! then the next floor or the roof.

use bevy::prelude::*;

use super::core::{
    CornerPolicy, Expansion, Footprint, RoofState, Rule, ShapeRule, StockState, StyleRole,
};
use super::rng::RandomSource;

/// Cells carried by `side` (0..4). Sides 1 and 3 run along the width.
#[inline]
pub fn side_cells(footprint: Footprint, side: usize, policy: CornerPolicy) -> usize {
    let along_width = side % 2 == 1;
    let n = if along_width { footprint.width } else { footprint.depth };
    let n = match policy {
        CornerPolicy::Shared if !along_width => n - 2,
        _ => n,
    };
    n.max(0) as usize
}

/// Local position of the wall plane for `side`.
#[inline]
fn side_plane(footprint: Footprint, side: usize, half_thickness: f32) -> Vec3 {
    let hw = footprint.width as f32 * 0.5;
    let hd = footprint.depth as f32 * 0.5;
    match side {
        0 => Vec3::new(-hw + half_thickness, 0.0, 0.0),
        1 => Vec3::new(0.0, 0.0, hd - half_thickness),
        2 => Vec3::new(hw - half_thickness, 0.0, 0.0),
        _ => Vec3::new(0.0, 0.0, -hd + half_thickness),
    }
}

#[inline]
fn side_rotation(side: usize) -> Quat {
    Quat::from_rotation_y((side as f32 * 90.0).to_radians())
}

/// Distinct door slots for a side of `cells` cells, in draw order.
pub fn pick_door_slots(rng: &mut dyn RandomSource, cells: usize) -> Vec<usize> {
    let count = (rng.next_int(2) + 1).min(cells.min(2));
    let mut slots = Vec::with_capacity(count);
    while slots.len() < count {
        let d = rng.next_int(cells);
        if !slots.contains(&d) {
            slots.push(d);
        }
    }
    slots
}

impl StockState {
    #[inline]
    fn has_doors(&self) -> bool {
        self.floor_level == 0 && self.building_height > 0 && !self.ctx.palette.door.is_empty()
    }

    /// Neon signs on the collected wall cells.
    fn place_neon_signs(&self, walls: &[(Vec3, Quat)], rng: &mut dyn RandomSource, out: &mut Expansion) {
        let palette = &self.ctx.palette;
        if palette.neon.is_empty() { return; }

        let dims = palette.dims;
        let wall_h = dims.wall_height();
        let (sign_h, sign_t) = dims.neon;
        let full_h = self.building_height.max(1) as f32 * wall_h;
        let lo = full_h * 0.5 + sign_h * 0.5;
        let hi = full_h - sign_h * 0.5;
        // Building space starts at the bottom of floor 0; node origins sit mid-floor.
        let floor_origin = self.floor_level as f32 * wall_h + wall_h * 0.5;
        let out_offset = dims.wall_thickness() + sign_t * 0.5;

        for &(pos, rot) in walls {
            if !rng.chance(self.ctx.params.neon_sign_chance) { continue; }
            let u = rng.next_float();
            let y = if hi >= lo { lo + u * (hi - lo) } else { full_h * 0.75 };
            let mut at = pos + rot * Vec3::NEG_X * out_offset;
            at.y = y - floor_origin;
            let variant = rng.next_int(palette.neon.len());
            out.spawn(palette, StyleRole::NeonSign, variant, at, rot);
        }
    }
}

impl ShapeRule for StockState {
    fn expand(&self, rng: &mut dyn RandomSource) -> Expansion {
        let mut out = Expansion::default();
        if self.footprint.is_empty() { return out; }

        let palette = &self.ctx.palette;
        let params = &self.ctx.params;
        let dims = palette.dims;
        let half_t = dims.wall_thickness() * 0.5;
        let wall_h = dims.wall_height();
        let doors = self.has_doors();

        let mut walls: Vec<(Vec3, Quat)> = Vec::new();

        for side in 0..4 {
            let plane = side_plane(self.footprint, side, half_t);
            let rot = side_rotation(side);
            let cells = side_cells(self.footprint, side, params.corner_policy);
            let door_slots = if doors { pick_door_slots(rng, cells) } else { Vec::new() };

            for i in 0..cells {
                let role = if doors {
                    if door_slots.contains(&i) { StyleRole::Door } else { StyleRole::Wall }
                } else if !palette.window.is_empty() && rng.chance(params.window_chance) {
                    StyleRole::Window
                } else {
                    StyleRole::Wall
                };

                let offset = i as f32 - (cells as f32 - 1.0) * 0.5;
                let pos = plane + rot * Vec3::new(0.0, 0.0, offset);
                let variant = rng.next_int(palette.role(role).len());
                out.spawn(palette, role, variant, pos, rot);
                if role == StyleRole::Wall {
                    walls.push((pos, rot));
                }
            }
        }

        self.place_neon_signs(&walls, rng, &mut out);

        if self.floor_level < self.building_height - 1 {
            let next = StockState { floor_level: self.floor_level + 1, ctx: self.ctx.clone(), ..*self };
            out.child(Rule::Stock(next), Vec3::new(0.0, wall_h, 0.0), true);
        } else {
            let roof = RoofState {
                footprint: self.footprint,
                roof_passes: self.roof_passes,
                ctx: self.ctx.clone(),
            };
            out.child(Rule::Roof(roof), Vec3::new(0.0, wall_h * 0.5 + dims.roof_thickness * 0.5, 0.0), true);
        }

        debug!(
            "stock {}x{} floor {}/{}: {} elements",
            self.footprint.width, self.footprint.depth, self.floor_level, self.building_height, out.elements.len()
        );
        out
    }
}
