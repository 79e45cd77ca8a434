// src/grammar/palette.rs
//! Named building themes. Each placement draws one theme uniformly.

use std::sync::Arc;

use bevy::prelude::*; // warn!

use super::core::{GrammarError, StylePalette, StyleRole};

/// Ordered, validated set of palettes. Index in `themes` is the palette choice index.
#[derive(Clone, Debug, Default)]
pub struct PaletteLibrary {
    themes: Vec<Arc<StylePalette>>,
}

impl PaletteLibrary {
    /// Keep every palette that can build a wall ring; report the rest.
    pub fn new(palettes: impl IntoIterator<Item = StylePalette>) -> (Self, Vec<GrammarError>) {
        let mut lib = Self::default();
        let mut rejected = Vec::new();
        for p in palettes {
            if p.wall.is_empty() {
                warn!("palette '{}' has no wall templates; skipped", p.name);
                rejected.push(GrammarError::MissingRole { role: StyleRole::Wall, palette: p.name });
                continue;
            }
            if lib.themes.iter().any(|t| t.name == p.name) {
                warn!("duplicate palette name '{}'", p.name);
            }
            lib.themes.push(Arc::new(p));
        }
        (lib, rejected)
    }

    #[inline] pub fn len(&self) -> usize { self.themes.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.themes.is_empty() }

    pub fn get(&self, index: usize) -> Option<&Arc<StylePalette>> { self.themes.get(index) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::fixtures::palette;

    fn named(name: &str) -> StylePalette {
        StylePalette { name: name.into(), ..palette(false, true, true) }
    }

    #[test]
    fn wallless_palettes_are_rejected() {
        let bare = StylePalette { name: "bare".into(), ..default() };
        let (lib, rejected) = PaletteLibrary::new([named("a"), bare, named("b")]);
        assert_eq!(lib.len(), 2);
        assert_eq!(rejected.len(), 1);
        assert!(matches!(&rejected[0], GrammarError::MissingRole { role: StyleRole::Wall, palette } if palette == "bare"));
        assert_eq!(lib.get(1).map(|p| p.name.as_str()), Some("b"));
        assert!(lib.get(2).is_none());
    }

    #[test]
    fn duplicate_names_keep_both_themes() {
        let (lib, rejected) = PaletteLibrary::new([named("a"), named("a")]);
        assert!(rejected.is_empty());
        assert_eq!(lib.len(), 2);
    }

    #[test]
    fn empty_input_gives_an_empty_library() {
        let (lib, rejected) = PaletteLibrary::new(Vec::new());
        assert!(lib.is_empty());
        assert!(rejected.is_empty());
    }
}
