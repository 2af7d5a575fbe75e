use bevy::prelude::*;

use crate::utils::camera::orbit_transform;
use crate::utils::constants::camera_3d_constants::CAMERA_3D_INITIAL_RADIUS;
use crate::utils::crosshair::load_crosshair_assets;
use crate::utils::cube::{load_cube_models, track_cube_models};
use crate::utils::objects::DeviceCamera;

/// Plugin for handling setup
pub struct SetupPlugin;

impl Plugin for SetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Startup,
            (setup, load_cube_models, load_crosshair_assets),
        )
        .add_systems(Update, track_cube_models);
    }
}

/// The room the device is pointed at, plus camera and lights
pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Device camera
    commands.spawn((
        Name::new("device camera"),
        Camera3d::default(),
        orbit_transform(0.0, CAMERA_3D_INITIAL_RADIUS),
        DeviceCamera,
    ));

    // Light
    commands.spawn((
        PointLight {
            intensity: 1_500_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(1.5, 2.5, 1.0),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 200.0,
        affects_lightmapped_meshes: true,
    });

    // Floor of the room, what the camera feed would show
    commands.spawn((
        Name::new("floor"),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(6.0, 6.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.55, 0.5, 0.45),
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::default(),
    ));

    info!("Scene ready, press Start to begin scanning");
}
