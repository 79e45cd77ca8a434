use bevy::prelude::*;
use bevy::ui::BackgroundColor;

use neon_city::city::CityState;

#[derive(Component)]
pub struct PauseOverlay;

/// Bottom-left status line.
#[derive(Component)]
pub struct CityStatusText;

pub fn spawn_pause_overlay(mut commands: Commands, asset_server: Res<AssetServer>) {
    commands.spawn((
        // Fullscreen transparent overlay node
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        BackgroundColor(Color::linear_rgba(0.0, 0.0, 0.0, 0.7)),
        PauseOverlay,
    ))
    .with_children(|parent| {
        parent.spawn((
            Text::new("Paused"),
            TextFont {
                font: asset_server.load("fonts/FiraSans-Bold.ttf"),
                font_size: 64.0,
                ..default()
            },
            TextLayout::new_with_justify(JustifyText::Center),
            TextColor(Color::WHITE),
        ));
    });
}

pub fn despawn_pause_overlay(
    mut commands: Commands,
    query: Query<Entity, With<PauseOverlay>>,
) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

pub fn spawn_status_line(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        TextFont { font_size: 16.0, ..default() },
        TextColor(Color::srgb(0.6, 1.0, 0.9)),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(12.0),
            bottom: Val::Px(10.0),
            ..default()
        },
        CityStatusText,
    ));
}

pub fn update_status_line(
    state: Res<CityState>,
    mut query: Query<&mut Text, With<CityStatusText>>,
) {
    let Ok(mut text) = query.single_mut() else { return; };
    text.0 = format!(
        "pass {} | buildings {} | elements {} | pending {}    [G] generate  [C] clear  [Esc] pause",
        state.generation,
        state.roots.len(),
        state.element_count(),
        state.pending(),
    );
}
