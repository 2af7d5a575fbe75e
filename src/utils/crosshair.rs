//! Crosshair reticle showing where the cubes would land.
use bevy::prelude::*;

use crate::utils::config::ArConfig;
use crate::utils::constants::crosshair_constants::CROSSHAIR_TEXTURE;
use crate::utils::objects::SceneAnchored;

/// Marks the reticle entity
#[derive(Component, Debug)]
pub struct CrosshairEntity;

/// Mesh and textured material shared by every crosshair spawn
#[derive(Resource, Debug)]
pub struct CrosshairAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

/// Interpolated move toward the latest raycast hit
#[derive(Component, Debug)]
pub struct CrosshairMotion {
    pub from: Vec3,
    pub to: Vec3,
    pub timer: Timer,
}

impl CrosshairMotion {
    pub fn new(from: Vec3, to: Vec3, duration: f32) -> Self {
        Self {
            from,
            to,
            timer: Timer::from_seconds(duration, TimerMode::Once),
        }
    }
}

/// Reticle position for a raycast hit: the hit pulled `offset` toward the camera.
pub fn aim_position(hit: Vec3, camera_position: Vec3, offset: f32) -> Vec3 {
    let ray_direction = (hit - camera_position).normalize_or_zero();
    hit - ray_direction * offset
}

pub fn load_crosshair_assets(
    mut commands: Commands,
    config: Res<ArConfig>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let size = config.crosshair.size;
    commands.insert_resource(CrosshairAssets {
        mesh: meshes.add(Plane3d::default().mesh().size(size, size)),
        material: materials.add(StandardMaterial {
            base_color: Color::srgba(1.0, 1.0, 1.0, 0.999),
            base_color_texture: Some(asset_server.load(CROSSHAIR_TEXTURE)),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        }),
    });
}

/// Spawn an enabled crosshair at the origin
pub fn spawn_crosshair(commands: &mut Commands, assets: Option<&CrosshairAssets>) -> Entity {
    let mut crosshair = commands.spawn((
        Name::new("crosshair"),
        CrosshairEntity,
        Transform::default(),
        Visibility::Inherited,
        SceneAnchored,
    ));
    if let Some(assets) = assets {
        crosshair.insert((
            Mesh3d(assets.mesh.clone()),
            MeshMaterial3d(assets.material.clone()),
        ));
    }
    crosshair.id()
}

pub fn animate_crosshair(
    mut commands: Commands,
    time: Res<Time>,
    mut crosshairs: Query<(Entity, &mut Transform, &mut CrosshairMotion), With<CrosshairEntity>>,
) {
    for (entity, mut transform, mut motion) in &mut crosshairs {
        motion.timer.tick(time.delta());
        transform.translation = motion.from.lerp(motion.to, motion.timer.fraction());
        if motion.timer.just_finished() {
            commands.entity(entity).remove::<CrosshairMotion>();
        }
    }
}
