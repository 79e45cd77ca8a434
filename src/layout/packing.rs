// src/layout/packing.rs
//! Rejection-sampling rectangle packer shared by every layout strategy.
//!
//! Each `propose` call is one placement request: sample up to `budget` candidates,
//! accept the first that stays inside the bounds and clears every accepted rectangle
//! by `margin`. An exhausted budget means "skip this building".

use bevy::prelude::*; // Vec2, Rect

use crate::grammar::rng::RandomSource;

/// Anything the packer can place.
pub trait Packable {
    fn rect(&self) -> Rect;
}

/// Axis-aligned bounds of a `size` rectangle at `center` rotated by `yaw` radians.
#[inline]
pub fn footprint_rect(center: Vec2, size: Vec2, yaw: f32) -> Rect {
    let (s, c) = yaw.sin_cos();
    let (s, c) = (s.abs(), c.abs());
    let half = size * 0.5;
    let ext = Vec2::new(c * half.x + s * half.y, s * half.x + c * half.y);
    Rect::from_center_half_size(center, ext)
}

/// Clamp `center` so that a rectangle of half extent `half` fits inside `bounds`.
/// `None` when it cannot fit at all.
#[inline]
pub fn clamp_into(center: Vec2, half: Vec2, bounds: Rect) -> Option<Vec2> {
    let lo = bounds.min + half;
    let hi = bounds.max - half;
    if lo.x > hi.x + 1e-4 || lo.y > hi.y + 1e-4 { return None; }
    Some(center.clamp(lo, hi.max(lo)))
}

#[inline]
fn contains_rect(outer: Rect, inner: Rect) -> bool {
    const EPS: f32 = 1e-4;
    inner.min.x >= outer.min.x - EPS
        && inner.min.y >= outer.min.y - EPS
        && inner.max.x <= outer.max.x + EPS
        && inner.max.y <= outer.max.y + EPS
}

#[derive(Clone, Debug)]
pub struct Packer {
    bounds: Option<Rect>,
    margin: f32,
    budget: u32,
    accepted: Vec<Rect>,
    attempts: u32,
}

impl Packer {
    pub fn new(bounds: Option<Rect>, margin: f32, budget: u32) -> Self {
        Self { bounds, margin: margin.max(0.0), budget, accepted: Vec::new(), attempts: 0 }
    }

    /// Inside the bounds and at least `margin` away from every accepted rectangle.
    pub fn fits(&self, rect: Rect) -> bool {
        if let Some(b) = self.bounds {
            if !contains_rect(b, rect) { return false; }
        }
        let grown = rect.inflate(self.margin);
        self.accepted.iter().all(|a| a.intersect(grown).is_empty())
    }

    /// One placement request. `sample` may return `None` to burn an attempt.
    pub fn propose<T: Packable>(
        &mut self,
        rng: &mut dyn RandomSource,
        mut sample: impl FnMut(&mut dyn RandomSource) -> Option<T>,
    ) -> Option<T> {
        for _ in 0..self.budget {
            self.attempts += 1;
            let Some(candidate) = sample(rng) else { continue };
            let rect = candidate.rect();
            if self.fits(rect) {
                self.accepted.push(rect);
                return Some(candidate);
            }
        }
        None
    }

    #[inline] pub fn accepted(&self) -> &[Rect] { &self.accepted }
    #[inline] pub fn attempts(&self) -> u32 { self.attempts }
}
