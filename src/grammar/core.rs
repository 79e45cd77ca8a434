// src/grammar/core.rs
//! Core types for the building grammar: footprints, style palettes, leaf elements, rule state.
//! Keep this file dependency-light; rules and the tree build on top of it.

use std::sync::Arc;

use bevy::prelude::*; // Vec3, Quat, Transform
use serde::{Deserialize, Serialize};

// ---------- Footprints ----------

/// Grid-cell extent of a building volume. Non-positive axes make every rule a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Footprint {
    pub width: i32,
    pub depth: i32,
}

impl Footprint {
    pub const fn new(width: i32, depth: i32) -> Self { Self { width, depth } }

    #[inline]
    pub fn is_empty(&self) -> bool { self.width <= 0 || self.depth <= 0 }

    #[inline]
    pub fn min_axis(&self) -> i32 { self.width.min(self.depth) }
}

// ---------- Styles ----------

/// Role a visual element plays on a building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleRole {
    Wall,
    Door,
    Window,
    Roof,
    Row,
    NeonSign,
}

/// Opaque handle to a visual template. The host resolves `path` (e.g. a scene asset).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleRef {
    pub path: String,
}

impl StyleRef {
    pub fn new(path: impl Into<String>) -> Self { Self { path: path.into() } }
}

/// Physical sizes of the palette's templates (meters).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementDims {
    /// (width, height, thickness) of one wall cell.
    pub wall: (f32, f32, f32),
    /// Vertical thickness of a roof tile.
    pub roof_thickness: f32,
    /// (height, thickness) of a neon sign.
    pub neon: (f32, f32),
}

impl Default for ElementDims {
    fn default() -> Self {
        Self { wall: (1.0, 3.0, 0.2), roof_thickness: 0.2, neon: (2.0, 0.1) }
    }
}

impl ElementDims {
    #[inline] pub fn wall_height(&self) -> f32 { self.wall.1 }
    #[inline] pub fn wall_thickness(&self) -> f32 { self.wall.2 }
}

fn default_author_yaw() -> f32 {
    -90.0
}

/// Role-keyed template collections for one building theme. Empty roles disable a feature.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StylePalette {
    pub name: String,
    #[serde(default)]
    pub wall: Vec<StyleRef>,
    #[serde(default)]
    pub door: Vec<StyleRef>,
    #[serde(default)]
    pub window: Vec<StyleRef>,
    #[serde(default)]
    pub roof: Vec<StyleRef>,
    #[serde(default)]
    pub row: Vec<StyleRef>,
    #[serde(default)]
    pub neon: Vec<StyleRef>,
    #[serde(default)]
    pub dims: ElementDims,
    /// Yaw (degrees) the templates were authored with; applied to every leaf.
    #[serde(default = "default_author_yaw")]
    pub author_yaw_deg: f32,
}

impl Default for StylePalette {
    fn default() -> Self {
        Self {
            name: String::new(),
            wall: Vec::new(),
            door: Vec::new(),
            window: Vec::new(),
            roof: Vec::new(),
            row: Vec::new(),
            neon: Vec::new(),
            dims: ElementDims::default(),
            author_yaw_deg: default_author_yaw(),
        }
    }
}

impl StylePalette {
    pub fn role(&self, role: StyleRole) -> &[StyleRef] {
        match role {
            StyleRole::Wall => &self.wall,
            StyleRole::Door => &self.door,
            StyleRole::Window => &self.window,
            StyleRole::Roof => &self.roof,
            StyleRole::Row => &self.row,
            StyleRole::NeonSign => &self.neon,
        }
    }

    /// Role used for roof strips: `row` when present, `roof` otherwise.
    pub fn strip_role(&self) -> StyleRole {
        if self.row.is_empty() { StyleRole::Roof } else { StyleRole::Row }
    }

    #[inline]
    pub fn author_offset(&self) -> Quat {
        Quat::from_rotation_y(self.author_yaw_deg.to_radians())
    }
}

// ---------- Leaves ----------

/// One generated visual element, positioned relative to its owning node.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub role: StyleRole,
    /// Index into the palette's collection for `role`.
    pub variant: usize,
    pub style: StyleRef,
    pub transform: Transform,
}

// ---------- Rule parameters ----------

/// How adjacent sides share corner cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CornerPolicy {
    /// Every side carries its full cell count (2 * (w + d) cells per floor).
    #[default]
    Overlap,
    /// Depth-carrying sides drop their corner cells (2 * (w + d) - 4 cells per floor).
    Shared,
}

/// Probabilities and flags shared by every node of one building.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingParams {
    pub window_chance: f32,
    pub neon_sign_chance: f32,
    pub roof_continue_chance: f32,
    pub roof_expand_chance: f32,
    pub roof_stock_chance: f32,
    pub continue_roof: bool,
    pub corner_policy: CornerPolicy,
}

impl Default for BuildingParams {
    fn default() -> Self {
        Self {
            window_chance: 0.2,
            neon_sign_chance: 0.5,
            roof_continue_chance: 0.6,
            roof_expand_chance: 0.2,
            roof_stock_chance: 0.3,
            continue_roof: true,
            corner_policy: CornerPolicy::Overlap,
        }
    }
}

/// Configuration shared down a building's subtree (set once at the root).
#[derive(Clone, Debug)]
pub struct BuildingContext {
    pub palette: Arc<StylePalette>,
    pub params: BuildingParams,
}

impl BuildingContext {
    pub fn new(palette: StylePalette, params: BuildingParams) -> Self {
        Self { palette: Arc::new(palette), params }
    }
}

/// Number of roof passes a footprint may use: `ceil(min(w, d) / 2) + 1`.
#[inline]
pub fn roof_pass_budget(footprint: Footprint) -> u32 {
    let m = footprint.min_axis().max(0) as u32;
    m.div_ceil(2) + 1
}

#[derive(Clone, Debug)]
pub struct StockState {
    pub footprint: Footprint,
    pub building_height: i32,
    pub floor_level: i32,
    /// Roof passes left for this building's roof chain.
    pub roof_passes: u32,
    pub ctx: BuildingContext,
}

impl StockState {
    /// State for a building's ground floor.
    pub fn root(footprint: Footprint, building_height: i32, ctx: BuildingContext) -> Self {
        Self {
            footprint,
            building_height,
            floor_level: 0,
            roof_passes: roof_pass_budget(footprint),
            ctx,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RoofState {
    pub footprint: Footprint,
    pub roof_passes: u32,
    pub ctx: BuildingContext,
}

#[derive(Clone, Debug)]
pub struct RowState {
    pub count: i32,
    pub role: StyleRole,
    /// Spacing direction; zero falls back to +Z.
    pub direction: Vec3,
    pub ctx: BuildingContext,
}

/// Rule attached to a node.
#[derive(Clone, Debug)]
pub enum Rule {
    Stock(StockState),
    Roof(RoofState),
    Row(RowState),
}

impl Rule {
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Stock(_) => "stock",
            Rule::Roof(_) => "roof",
            Rule::Row(_) => "row",
        }
    }

    pub fn context(&self) -> &BuildingContext {
        match self {
            Rule::Stock(s) => &s.ctx,
            Rule::Roof(r) => &r.ctx,
            Rule::Row(r) => &r.ctx,
        }
    }

    /// Reject configurations no rule can expand: a non-empty stock without walls.
    pub fn validate(&self) -> Result<(), GrammarError> {
        if let Rule::Stock(s) = self {
            if !s.footprint.is_empty() && s.ctx.palette.wall.is_empty() {
                return Err(GrammarError::MissingRole {
                    role: StyleRole::Wall,
                    palette: s.ctx.palette.name.clone(),
                });
            }
        }
        Ok(())
    }
}

// ---------- Expansion output ----------

/// Child node requested by a rule.
#[derive(Clone, Debug)]
pub struct ChildSpec {
    pub rule: Rule,
    pub local: Transform,
    /// Apply the node's build delay when generating this child.
    pub deferred: bool,
}

/// Everything one `expand` call emits, in emission order.
#[derive(Clone, Debug, Default)]
pub struct Expansion {
    pub elements: Vec<Element>,
    pub children: Vec<ChildSpec>,
}

impl Expansion {
    pub fn spawn(&mut self, palette: &StylePalette, role: StyleRole, variant: usize, translation: Vec3, rotation: Quat) {
        let Some(style) = palette.role(role).get(variant) else { return };
        self.elements.push(Element {
            role,
            variant,
            style: style.clone(),
            transform: Transform::from_translation(translation)
                .with_rotation(palette.author_offset() * rotation),
        });
    }

    pub fn child(&mut self, rule: Rule, translation: Vec3, deferred: bool) {
        self.children.push(ChildSpec { rule, local: Transform::from_translation(translation), deferred });
    }

    pub fn count(&self, role: StyleRole) -> usize {
        self.elements.iter().filter(|e| e.role == role).count()
    }
}

/// Expansion behaviour of one rule.
pub trait ShapeRule {
    /// Emit this node's elements and children. Must not depend on earlier calls.
    fn expand(&self, rng: &mut dyn crate::grammar::rng::RandomSource) -> Expansion;
}

impl ShapeRule for Rule {
    fn expand(&self, rng: &mut dyn crate::grammar::rng::RandomSource) -> Expansion {
        match self {
            Rule::Stock(s) => s.expand(rng),
            Rule::Roof(r) => r.expand(rng),
            Rule::Row(r) => r.expand(rng),
        }
    }
}

// ---------- Errors ----------

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GrammarError {
    #[error("node {0:?} does not exist (cleared or never created)")]
    UnknownNode(crate::grammar::tree::NodeId),
    #[error("node {0:?} has no rule configured")]
    NotConfigured(crate::grammar::tree::NodeId),
    #[error("palette '{palette}' has no {role:?} templates")]
    MissingRole { role: StyleRole, palette: String },
}
