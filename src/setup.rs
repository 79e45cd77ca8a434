use bevy::prelude::*;
use crate::input::CameraOrbit;

#[derive(Component)]
pub struct MainCamera;

/// Half the side of the street plane under the city.
const GROUND_HALF: f32 = 600.0;

pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // 1) Light (dim moon + ambient so neon carries the scene)
    commands.spawn((
        DirectionalLight {
            illuminance: 2_500.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(80.0, 160.0, 40.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.45, 0.4, 0.8),
        brightness: 120.0,
        ..default()
    });

    // 2) Streets
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(GROUND_HALF * 2.0, GROUND_HALF * 2.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.06, 0.06, 0.08),
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::IDENTITY,
    ));

    // 3) Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-160.0, 140.0, 160.0).looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
        CameraOrbit {
            focus: Vec3::ZERO,
            radius: 260.0,
            yaw: 2.4,
            pitch: 0.7,
        },
    ));
}
