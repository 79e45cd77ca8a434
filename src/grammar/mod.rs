//! Building shape grammar: Stock / Roof / Row rules expanded into a node arena.

pub mod core;
pub mod palette;
pub mod rng;
pub mod roof;
pub mod row;
pub mod schedule;
pub mod stock;
pub mod tree;

pub use self::core::{
    BuildingContext, BuildingParams, CornerPolicy, Element, Footprint, GrammarError, Rule,
    StockState, StylePalette, StyleRef, StyleRole,
};
pub use palette::PaletteLibrary;
pub use rng::{RandomSource, SharedRandom};
pub use tree::{NodeId, NodeState, SceneSink, ShapeTree, TreeEvent};

#[cfg(test)]
pub(crate) mod fixtures {
    use super::core::{StylePalette, StyleRef};

    fn refs(prefix: &str, n: usize) -> Vec<StyleRef> {
        (0..n).map(|i| StyleRef::new(format!("{prefix}_{i}.glb#Scene0"))).collect()
    }

    /// Walls and roof tiles always; doors, windows and neon on request. No row strips.
    pub fn palette(doors: bool, windows: bool, neon: bool) -> StylePalette {
        StylePalette {
            name: "test".into(),
            wall: refs("wall", 3),
            door: if doors { refs("door", 2) } else { Vec::new() },
            window: if windows { refs("window", 2) } else { Vec::new() },
            roof: refs("roof", 2),
            row: Vec::new(),
            neon: if neon { refs("neon", 4) } else { Vec::new() },
            ..StylePalette::default()
        }
    }
}
