use bevy::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    /// Edge-triggered: true only on the frame the key went down.
    GenerateCity,
    ClearCity,
}

#[derive(Default, Resource)]
pub struct ActionState {
    pressed: HashMap<PlayerAction, bool>,
}

impl ActionState {
    pub fn set(&mut self, action: PlayerAction, is_pressed: bool) {
        self.pressed.insert(action, is_pressed);
    }

    pub fn pressed(&self, action: PlayerAction) -> bool {
        self.pressed.get(&action).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_actions_read_as_released() {
        let mut state = ActionState::default();
        assert!(!state.pressed(PlayerAction::GenerateCity));
        state.set(PlayerAction::GenerateCity, true);
        assert!(state.pressed(PlayerAction::GenerateCity));
        state.set(PlayerAction::GenerateCity, false);
        assert!(!state.pressed(PlayerAction::GenerateCity));
    }
}
