// src/config.rs
//! Data-driven city manifest (`*.city.ron`): seed, grammar probabilities, layout, palettes.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grammar::core::{BuildingParams, CornerPolicy, Footprint, StylePalette};

// ---------- Grammar ----------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    pub window_chance: f32,
    pub neon_sign_chance: f32,
    pub roof_continue_chance: f32,
    pub roof_expand_chance: f32,
    pub roof_stock_chance: f32,
    /// Seconds between a node and its deferred child (interactive hosts only).
    pub build_delay: f32,
    pub corner_policy: CornerPolicy,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            window_chance: 0.2,
            neon_sign_chance: 0.5,
            roof_continue_chance: 0.6,
            roof_expand_chance: 0.2,
            roof_stock_chance: 0.3,
            build_delay: 0.1,
            corner_policy: CornerPolicy::Overlap,
        }
    }
}

impl GrammarConfig {
    pub fn params(&self, continue_roof: bool) -> BuildingParams {
        BuildingParams {
            window_chance: self.window_chance,
            neon_sign_chance: self.neon_sign_chance,
            roof_continue_chance: self.roof_continue_chance,
            roof_expand_chance: self.roof_expand_chance,
            roof_stock_chance: self.roof_stock_chance,
            continue_roof,
            corner_policy: self.corner_policy,
        }
    }
}

// ---------- Layout strategies (data form) ----------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Blocks per side.
    pub blocks: u32,
    pub block_size: f32,
    pub street_width: f32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self { blocks: 4, block_size: 40.0, street_width: 6.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    pub cluster_count: u32,
    pub radius_range: (f32, f32),
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self { cluster_count: 6, radius_range: (15.0, 30.0) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganicParams {
    /// Blocks per side.
    pub blocks: u32,
    pub block_size_range: (f32, f32),
    pub street_width_range: (f32, f32),
    pub main_street_width: f32,
    /// Every n-th street is a main street (0 disables them).
    pub main_street_frequency: u32,
    /// Max per-axis displacement of each block center.
    pub offset_jitter: f32,
}

impl Default for OrganicParams {
    fn default() -> Self {
        Self {
            blocks: 6,
            block_size_range: (40.0, 60.0),
            street_width_range: (3.0, 5.0),
            main_street_width: 6.0,
            main_street_frequency: 3,
            offset_jitter: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerimeterParams {
    pub blocks: OrganicParams,
    /// Inset of the building line from the block edge.
    pub block_margin: f32,
}

impl Default for PerimeterParams {
    fn default() -> Self {
        Self { blocks: OrganicParams { offset_jitter: 0.0, ..default() }, block_margin: 0.1 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LayoutDef {
    UniformGrid(GridParams),
    RadialGrid(GridParams),
    Clusters(ClusterParams),
    OrganicBlocks(OrganicParams),
    Perimeter(PerimeterParams),
}

impl Default for LayoutDef {
    fn default() -> Self { LayoutDef::OrganicBlocks(OrganicParams::default()) }
}

// ---------- Layout (shared) ----------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Size of the city area (x, z) for strategies that sample inside it.
    pub extent: (f32, f32),
    pub base_footprint: Footprint,
    pub base_stories: i32,
    /// Multiplicative variance: factors are drawn from [1 - v, 1 + v].
    pub size_variance: f32,
    /// Story multiplier at the edge / at the center (quadratic falloff).
    pub height_multiplier_range: (f32, f32),
    pub edge_scale: f32,
    pub center_scale: f32,
    pub min_spacing: f32,
    pub packing_attempt_budget: u32,
    pub continue_roof_chance: f32,
    pub buildings_per_block: (u32, u32),
    pub strategy: LayoutDef,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            extent: (240.0, 240.0),
            base_footprint: Footprint::new(4, 4),
            base_stories: 2,
            size_variance: 0.3,
            height_multiplier_range: (1.0, 6.0),
            edge_scale: 0.8,
            center_scale: 1.5,
            min_spacing: 0.5,
            packing_attempt_budget: 16,
            continue_roof_chance: 0.6,
            buildings_per_block: (6, 12),
            strategy: LayoutDef::default(),
        }
    }
}

// ---------- Manifest ----------

#[derive(Asset, TypePath, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CityManifest {
    /// `Some` derives a per-building RNG override from (seed, block, slot).
    pub seed: Option<u64>,
    pub grammar: GrammarConfig,
    pub layout: LayoutConfig,
    pub palettes: Vec<StylePalette>,
}

impl CityManifest {
    pub fn from_ron_str(src: &str) -> Result<Self, ConfigError> {
        ron::from_str(src).map_err(|e| ConfigError::Ron(e.to_string()))
    }

    pub fn from_ron_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        ron::de::from_bytes(bytes).map_err(|e| ConfigError::Ron(e.to_string()))
    }

    /// Reject values no generation pass can use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.grammar;
        probability("grammar.window_chance", g.window_chance)?;
        probability("grammar.neon_sign_chance", g.neon_sign_chance)?;
        probability("grammar.roof_continue_chance", g.roof_continue_chance)?;
        probability("grammar.roof_expand_chance", g.roof_expand_chance)?;
        probability("grammar.roof_stock_chance", g.roof_stock_chance)?;
        non_negative("grammar.build_delay", g.build_delay)?;

        let l = &self.layout;
        probability("layout.size_variance", l.size_variance)?;
        probability("layout.continue_roof_chance", l.continue_roof_chance)?;
        positive("layout.extent.x", l.extent.0)?;
        positive("layout.extent.y", l.extent.1)?;
        if l.base_footprint.is_empty() {
            return Err(invalid("layout.base_footprint", "both axes must be positive"));
        }
        if l.base_stories < 1 {
            return Err(invalid("layout.base_stories", "must be at least 1"));
        }
        ordered("layout.height_multiplier_range", l.height_multiplier_range)?;
        positive("layout.height_multiplier_range.0", l.height_multiplier_range.0)?;
        positive("layout.edge_scale", l.edge_scale)?;
        positive("layout.center_scale", l.center_scale)?;
        non_negative("layout.min_spacing", l.min_spacing)?;
        if l.packing_attempt_budget == 0 {
            return Err(invalid("layout.packing_attempt_budget", "must be at least 1"));
        }
        if l.buildings_per_block.0 > l.buildings_per_block.1 {
            return Err(invalid("layout.buildings_per_block", "min exceeds max"));
        }
        validate_strategy(&l.strategy)?;

        if !self.palettes.iter().any(|p| !p.wall.is_empty()) {
            return Err(ConfigError::NoPalettes);
        }
        Ok(())
    }
}

fn validate_strategy(def: &LayoutDef) -> Result<(), ConfigError> {
    match def {
        LayoutDef::UniformGrid(p) | LayoutDef::RadialGrid(p) => {
            blocks_per_axis(p.blocks)?;
            positive("strategy.block_size", p.block_size)?;
            non_negative("strategy.street_width", p.street_width)
        }
        LayoutDef::Clusters(p) => {
            ordered("strategy.radius_range", p.radius_range)?;
            positive("strategy.radius_range.0", p.radius_range.0)
        }
        LayoutDef::OrganicBlocks(p) => validate_organic(p),
        LayoutDef::Perimeter(p) => {
            validate_organic(&p.blocks)?;
            non_negative("strategy.block_margin", p.block_margin)?;
            if p.block_margin * 2.0 >= p.blocks.block_size_range.0 {
                return Err(invalid("strategy.block_margin", "leaves no usable block area"));
            }
            Ok(())
        }
    }
}

fn validate_organic(p: &OrganicParams) -> Result<(), ConfigError> {
    blocks_per_axis(p.blocks)?;
    ordered("strategy.block_size_range", p.block_size_range)?;
    positive("strategy.block_size_range.0", p.block_size_range.0)?;
    ordered("strategy.street_width_range", p.street_width_range)?;
    non_negative("strategy.street_width_range.0", p.street_width_range.0)?;
    non_negative("strategy.main_street_width", p.main_street_width)?;
    non_negative("strategy.offset_jitter", p.offset_jitter)
}

/// Upper bound on blocks along one axis of a grid or organic layout.
pub const MAX_BLOCKS_PER_AXIS: u32 = 1024;

fn blocks_per_axis(n: u32) -> Result<(), ConfigError> {
    if n <= MAX_BLOCKS_PER_AXIS {
        Ok(())
    } else {
        Err(invalid("strategy.blocks", format!("{n} exceeds {MAX_BLOCKS_PER_AXIS}")))
    }
}

#[inline]
fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

fn probability(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&v) { Ok(()) } else { Err(invalid(field, format!("{v} is outside [0, 1]"))) }
}

fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v > 0.0 { Ok(()) } else { Err(invalid(field, format!("{v} must be positive"))) }
}

fn non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v >= 0.0 { Ok(()) } else { Err(invalid(field, format!("{v} must not be negative"))) }
}

fn ordered(field: &'static str, (lo, hi): (f32, f32)) -> Result<(), ConfigError> {
    if lo <= hi { Ok(()) } else { Err(invalid(field, format!("min {lo} exceeds max {hi}"))) }
}

// ---------- Errors ----------

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("I/O while reading city manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("manifest defines no palette with wall templates")]
    NoPalettes,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"(
        seed: Some(7),
        grammar: (window_chance: 0.35, corner_policy: Shared),
        layout: (
            extent: (120.0, 80.0),
            buildings_per_block: (2, 4),
            strategy: Perimeter((block_margin: 0.5)),
        ),
        palettes: [
            (
                name: "neon",
                wall: [(path: "buildings/wall_a.glb#Scene0")],
                roof: [(path: "buildings/roof_a.glb#Scene0")],
            ),
        ],
    )"#;

    #[test]
    fn parses_partial_manifest_with_defaults() {
        let m = CityManifest::from_ron_str(MANIFEST).unwrap();
        assert_eq!(m.seed, Some(7));
        assert_eq!(m.grammar.window_chance, 0.35);
        assert_eq!(m.grammar.corner_policy, CornerPolicy::Shared);
        assert_eq!(m.grammar.neon_sign_chance, GrammarConfig::default().neon_sign_chance);
        assert_eq!(m.layout.extent, (120.0, 80.0));
        match m.layout.strategy {
            LayoutDef::Perimeter(p) => {
                assert_eq!(p.block_margin, 0.5);
                assert_eq!(p.blocks.blocks, OrganicParams::default().blocks);
            }
            other => panic!("unexpected strategy {other:?}"),
        }
        assert_eq!(m.palettes[0].author_yaw_deg, -90.0);
        m.validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let mut m = CityManifest::from_ron_str(MANIFEST).unwrap();
        m.grammar.neon_sign_chance = 1.5;
        assert!(matches!(m.validate(), Err(ConfigError::Invalid { field: "grammar.neon_sign_chance", .. })));
    }

    #[test]
    fn rejects_manifest_without_walls() {
        let m = CityManifest::default();
        assert!(matches!(m.validate(), Err(ConfigError::NoPalettes)));
    }

    #[test]
    fn rejects_oversized_block_grids() {
        let mut m = CityManifest::from_ron_str(MANIFEST).unwrap();
        m.layout.strategy = LayoutDef::UniformGrid(GridParams { blocks: MAX_BLOCKS_PER_AXIS + 1, ..default() });
        assert!(matches!(m.validate(), Err(ConfigError::Invalid { field: "strategy.blocks", .. })));
        m.layout.strategy = LayoutDef::UniformGrid(GridParams { blocks: MAX_BLOCKS_PER_AXIS, ..default() });
        m.validate().unwrap();
    }

    #[test]
    fn reports_parse_errors() {
        assert!(matches!(CityManifest::from_ron_str("(seed: oops)"), Err(ConfigError::Ron(_))));
    }
}
