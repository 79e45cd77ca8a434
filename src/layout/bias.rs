// src/layout/bias.rs
//! Center-distance bias: footprint scale (linear) and story multiplier (quadratic).

use crate::grammar::core::Footprint;
use crate::grammar::rng::RandomSource;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiasParams {
    pub edge_scale: f32,
    pub center_scale: f32,
    /// Story multiplier at the edge and at the center.
    pub height_range: (f32, f32),
    pub size_variance: f32,
}

impl Default for BiasParams {
    fn default() -> Self {
        Self { edge_scale: 0.8, center_scale: 1.5, height_range: (1.0, 6.0), size_variance: 0.3 }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl BiasParams {
    #[inline]
    pub fn size_bias(&self, cf: f32) -> f32 {
        lerp(self.edge_scale, self.center_scale, cf.clamp(0.0, 1.0))
    }

    #[inline]
    pub fn height_bias(&self, cf: f32) -> f32 {
        let cf = cf.clamp(0.0, 1.0);
        lerp(self.height_range.0, self.height_range.1, cf * cf)
    }

    /// Uniform factor in `[1 - v, 1 + v]`. No draw when the variance is zero.
    #[inline]
    fn variance(&self, rng: &mut dyn RandomSource) -> f32 {
        let v = self.size_variance.max(0.0);
        rng.range_f32(1.0 - v, 1.0 + v)
    }

    /// Both variance factors, size first.
    pub fn draw(&self, rng: &mut dyn RandomSource) -> BiasDraw {
        let size_var = self.variance(rng);
        let height_var = self.variance(rng);
        BiasDraw { size_var, height_var }
    }

    /// Footprint and story count at center factor `cf` for already drawn variances.
    pub fn dims(&self, base: Footprint, base_stories: i32, cf: f32, draw: BiasDraw) -> (Footprint, i32) {
        let s = self.size_bias(cf) * draw.size_var;
        let fp = Footprint::new(
            ((base.width as f32 * s).round() as i32).max(1),
            ((base.depth as f32 * s).round() as i32).max(1),
        );
        let stories = ((base_stories as f32 * self.height_bias(cf) * draw.height_var).round() as i32).max(1);
        (fp, stories)
    }

    /// Biased footprint and story count for a base building at center factor `cf`.
    pub fn sample_dims(&self, base: Footprint, base_stories: i32, cf: f32, rng: &mut dyn RandomSource) -> (Footprint, i32) {
        let draw = self.draw(rng);
        self.dims(base, base_stories, cf, draw)
    }
}

/// Per-building variance factors, kept so a building can be re-sized where it lands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiasDraw {
    pub size_var: f32,
    pub height_var: f32,
}
