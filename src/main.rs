use bevy::prelude::*;

mod setup;
mod input;
mod actions;
mod state;
mod ui;

use actions::ActionState;
use input::{camera_controller, city_command_system, input_mapping_system, pause_toggle_system};
use neon_city::city::CityPlugin;
use state::GameState;
use ui::{despawn_pause_overlay, spawn_pause_overlay, spawn_status_line, update_status_line};

fn main() {
    let mut app = App::new();
    app.add_plugins(DefaultPlugins)
        // generator: manifest, commands, timed growth, scene sync
        .add_plugins(CityPlugin)
        .init_resource::<ActionState>()
        .init_state::<GameState>()
        // camera, lights, street plane
        .add_systems(Startup, (setup::setup, spawn_status_line))
        // pause-menu UI
        .add_systems(OnEnter(GameState::Paused), spawn_pause_overlay)
        .add_systems(OnExit(GameState::Paused), despawn_pause_overlay)
        .add_systems(Update, (pause_toggle_system, update_status_line));
    add_control_systems(&mut app);
    app.run();
}

/// Input mapping, camera and city commands; frozen while paused.
fn add_control_systems(app: &mut App) {
    app.add_systems(
        Update,
        (
            input_mapping_system,
            (camera_controller, city_command_system).after(input_mapping_system),
        )
            .run_if(in_state(GameState::Running)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::input::mouse::{MouseMotion, MouseWheel};
    use bevy::state::app::StatesPlugin;
    use neon_city::city::{ClearCity, GenerateCity};

    use crate::actions::PlayerAction;
    use crate::input::CameraOrbit;
    use crate::setup::MainCamera;

    fn app_in(state: GameState) -> (App, Entity) {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin))
            .init_resource::<ActionState>()
            .init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<ButtonInput<MouseButton>>()
            .add_event::<MouseMotion>()
            .add_event::<MouseWheel>()
            .add_event::<GenerateCity>()
            .add_event::<ClearCity>()
            .insert_state(state);
        add_control_systems(&mut app);
        let camera = app
            .world_mut()
            .spawn((
                Transform::IDENTITY,
                MainCamera,
                CameraOrbit { focus: Vec3::ZERO, radius: 100.0, yaw: 0.5, pitch: 0.7 },
            ))
            .id();
        (app, camera)
    }

    fn camera_translation(app: &App, camera: Entity) -> Vec3 {
        app.world().get::<Transform>(camera).map(|t| t.translation).unwrap_or(Vec3::NAN)
    }

    #[test]
    fn camera_follows_its_orbit_while_running() {
        let (mut app, camera) = app_in(GameState::Running);
        app.update();
        assert!(camera_translation(&app, camera).y > 50.0);
    }

    #[test]
    fn camera_holds_still_while_paused() {
        let (mut app, camera) = app_in(GameState::Paused);
        app.world_mut().resource_mut::<ActionState>().set(PlayerAction::MoveForward, true);
        app.update();
        app.update();
        assert_eq!(camera_translation(&app, camera), Vec3::ZERO);
        assert_eq!(app.world().get::<CameraOrbit>(camera).map(|o| o.focus), Some(Vec3::ZERO));
    }
}
