//! Debug visualisation of what the session understood about the scene.
use bevy::prelude::*;
use bevy_rapier3d::render::{DebugRenderContext, RapierDebugRenderPlugin};

use crate::utils::ar_session::{ArDebugOptions, DebugOption, TrackedPlanes};
use crate::utils::surface::SurfaceSamples;

pub struct DebugFunctionsPlugin;

impl Plugin for DebugFunctionsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RapierDebugRenderPlugin {
            enabled: false,
            ..default()
        })
        .add_systems(Update, (draw_scene_understanding, toggle_physics_debug));
    }
}

/// Surface samples as small spheres, tracked planes as outlines
fn draw_scene_understanding(
    mut gizmos: Gizmos,
    options: Res<ArDebugOptions>,
    samples: Res<SurfaceSamples>,
    planes: Res<TrackedPlanes>,
) {
    if !options.contains(DebugOption::ShowSceneUnderstanding) {
        return;
    }
    for sample in samples.iter() {
        gizmos.sphere(sample.position, 0.02, Color::srgb(0.2, 0.9, 1.0));
    }
    for (transform, extent) in planes.outlines() {
        // Rects are drawn in the XY plane, planes lie in XZ
        let rotation = transform.rotation * Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2);
        gizmos.rect(
            Isometry3d::new(transform.translation, rotation),
            extent * 2.0,
            Color::srgb(1.0, 0.8, 0.1),
        );
    }
}

/// Rapier's collider wireframes follow the physics debug option
fn toggle_physics_debug(options: Res<ArDebugOptions>, mut render: ResMut<DebugRenderContext>) {
    let enabled = options.contains(DebugOption::ShowPhysics);
    if render.enabled != enabled {
        render.enabled = enabled;
    }
}
