// src/grammar/row.rs
//! Row rule: `count` elements one unit apart, centered on the node origin.

use bevy::prelude::*;

use super::core::{Expansion, RowState, ShapeRule};
use super::rng::RandomSource;

impl ShapeRule for RowState {
    fn expand(&self, rng: &mut dyn RandomSource) -> Expansion {
        let mut out = Expansion::default();
        let palette = &self.ctx.palette;
        let styles = palette.role(self.role);
        if self.count <= 0 || styles.is_empty() { return out; }

        let dir = if self.direction.length_squared() == 0.0 { Vec3::Z } else { self.direction };
        let center = (self.count - 1) as f32 * 0.5;
        for i in 0..self.count {
            let variant = rng.next_int(styles.len());
            out.spawn(palette, self.role, variant, dir * (i as f32 - center), Quat::IDENTITY);
        }
        out
    }
}
