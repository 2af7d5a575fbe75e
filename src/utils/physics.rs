//! Rigid-body physics for the cubes, backed by Rapier.
//!
//! Tracked planes become fixed colliders once the session enables physics
//! scene understanding, so dynamic cubes come to rest on the real surfaces.
use std::collections::HashMap;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::utils::ar_session::{AnchorEvent, AnchorId, AnchorKind, ArHostSet, ArSession};
use crate::utils::config::{ArConfig, PhysicsConfig};
use crate::utils::constants::physics_constants::{PHYSICS_RATE_HZ, PLANE_COLLIDER_THICKNESS};
use crate::utils::objects::SceneAnchored;

/// Fixed collider standing in for a tracked plane
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneCollider(pub AnchorId);

/// Plugin running the Rapier step at a fixed rate
pub struct BlockPhysicsPlugin;

impl Plugin for BlockPhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(PHYSICS_RATE_HZ))
            .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
            .add_systems(
                PreUpdate,
                (apply_gravity, sync_plane_colliders).in_set(ArHostSet::Bookkeeping),
            );
    }
}

/// Impulse equivalent to applying `force` during a single physics step, at
/// world point `at` or at `center` of mass when `None`.
pub fn one_step_impulse(force: Vec3, at: Option<Vec3>, center: Vec3) -> ExternalImpulse {
    let impulse = force * (1.0 / PHYSICS_RATE_HZ as f32);
    match at {
        Some(point) => ExternalImpulse::at_point(impulse, point, center),
        None => ExternalImpulse {
            impulse,
            torque_impulse: Vec3::ZERO,
        },
    }
}

/// Surface material shared by cubes and plane colliders
pub fn surface_material(physics: &PhysicsConfig) -> (Friction, Damping) {
    (
        Friction::coefficient(physics.friction),
        Damping {
            linear_damping: physics.linear_damping,
            angular_damping: physics.angular_damping,
        },
    )
}

fn apply_gravity(config: Res<ArConfig>, mut contexts: Query<&mut RapierConfiguration>) {
    let gravity = Vec3::Y * config.physics.gravity;
    for mut rapier in &mut contexts {
        if rapier.gravity != gravity {
            rapier.gravity = gravity;
        }
    }
}

/// Pose of the collider slab whose top face lies on the plane
fn plane_collider_transform(anchor_transform: &Transform) -> Transform {
    let normal = anchor_transform.rotation * Vec3::Y;
    Transform::from_translation(
        anchor_transform.translation - normal * PLANE_COLLIDER_THICKNESS * 0.5,
    )
    .with_rotation(anchor_transform.rotation)
}

/// Mirror tracked planes as fixed colliders while physics scene understanding is on
fn sync_plane_colliders(
    mut commands: Commands,
    config: Res<ArConfig>,
    session: Res<ArSession>,
    mut anchor_events: MessageReader<AnchorEvent>,
    mut colliders: Query<(&PlaneCollider, &mut Transform, &mut Collider)>,
) {
    if !session.scene_understanding.physics {
        anchor_events.clear();
        return;
    }

    // Last pose per anchor, so an anchor added and updated in one frame spawns once
    let mut latest: HashMap<AnchorId, (Transform, Vec2)> = HashMap::new();
    for event in anchor_events.read() {
        let (AnchorEvent::Added(anchors) | AnchorEvent::Updated(anchors)) = event;
        for anchor in anchors {
            if let AnchorKind::Plane { extent, .. } = anchor.kind {
                latest.insert(anchor.id, (anchor.transform, extent));
            }
        }
    }

    for (plane, mut transform, mut collider) in &mut colliders {
        if let Some((anchor_transform, extent)) = latest.remove(&plane.0) {
            *transform = plane_collider_transform(&anchor_transform);
            *collider = Collider::cuboid(extent.x, PLANE_COLLIDER_THICKNESS * 0.5, extent.y);
        }
    }

    for (id, (anchor_transform, extent)) in latest {
        debug!("Plane {:?} joins the physics scene", id);
        commands.spawn((
            Name::new("plane collider"),
            PlaneCollider(id),
            RigidBody::Fixed,
            Collider::cuboid(extent.x, PLANE_COLLIDER_THICKNESS * 0.5, extent.y),
            surface_material(&config.physics).0,
            plane_collider_transform(&anchor_transform),
            SceneAnchored,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bevy::time::TimeUpdateStrategy;
    use bevy::transform::TransformPlugin;

    use crate::utils::ar_session::{ArAnchor, ArConfiguration, ArSessionPlugin, PlaneClassification};

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, TransformPlugin))
            .init_resource::<ArConfig>()
            .add_plugins((ArSessionPlugin, BlockPhysicsPlugin))
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)));
        {
            let mut session = app.world_mut().resource_mut::<ArSession>();
            session.scene_understanding.physics = true;
            session.run(ArConfiguration::default(), false);
        }
        app.update();
        app
    }

    fn add_floor(app: &mut App, height: f32) {
        let floor = ArAnchor::horizontal_plane(
            AnchorId(1),
            Vec3::Y * height,
            Vec2::splat(2.0),
            PlaneClassification::Floor,
        );
        app.world_mut().write_message(AnchorEvent::Added(vec![floor]));
        app.update();
    }

    fn cube(app: &mut App, body: RigidBody, position: Vec3) -> Entity {
        let physics = app.world().resource::<ArConfig>().physics.clone();
        app.world_mut()
            .spawn((
                body,
                Collider::cuboid(0.1, 0.1, 0.1),
                ColliderMassProperties::Mass(1.0),
                Velocity::zero(),
                ExternalImpulse::default(),
                surface_material(&physics),
                Transform::from_translation(position),
            ))
            .id()
    }

    fn plane_colliders(app: &mut App) -> Vec<(AnchorId, Vec3)> {
        let mut query = app.world_mut().query::<(&PlaneCollider, &Transform)>();
        query
            .iter(app.world())
            .map(|(plane, transform)| (plane.0, transform.translation))
            .collect()
    }

    #[test]
    fn impulse_at_point_adds_torque() {
        let impulse = one_step_impulse(Vec3::X * 60.0, Some(Vec3::Y), Vec3::ZERO);
        assert!((impulse.impulse - Vec3::X).length() < 1e-5);
        assert!((impulse.torque_impulse - Vec3::Y.cross(Vec3::X)).length() < 1e-5);

        let centered = one_step_impulse(Vec3::X * 60.0, None, Vec3::ZERO);
        assert_eq!(centered.torque_impulse, Vec3::ZERO);
    }

    #[test]
    fn planes_become_colliders_once() {
        let mut app = app();
        add_floor(&mut app, 0.0);
        add_floor(&mut app, 0.2);
        let colliders = plane_colliders(&mut app);
        assert_eq!(colliders.len(), 1);
        let (id, translation) = colliders[0];
        assert_eq!(id, AnchorId(1));
        assert!((translation.y - (0.2 - PLANE_COLLIDER_THICKNESS * 0.5)).abs() < 1e-5);
    }

    #[test]
    fn planes_are_ignored_without_physics_understanding() {
        let mut app = app();
        app.world_mut()
            .resource_mut::<ArSession>()
            .scene_understanding
            .physics = false;
        add_floor(&mut app, 0.0);
        assert!(plane_colliders(&mut app).is_empty());
    }

    #[test]
    fn fixed_bodies_ignore_impulses() {
        let mut app = app();
        let start = Vec3::new(0.0, 1.0, 0.0);
        let entity = cube(&mut app, RigidBody::Fixed, start);
        app.update();
        app.world_mut()
            .entity_mut(entity)
            .insert(one_step_impulse(Vec3::X * 100.0, None, start));

        for _ in 0..5 {
            app.update();
        }
        let transform = app.world().get::<Transform>(entity).unwrap();
        assert!((transform.translation - start).length() < 1e-6);
    }

    #[test]
    fn dynamic_body_falls_and_rests_on_tracked_floor() {
        let mut app = app();
        add_floor(&mut app, 0.0);
        let entity = cube(&mut app, RigidBody::Dynamic, Vec3::new(0.0, 0.5, 0.0));

        for _ in 0..40 {
            app.update();
        }
        let transform = app.world().get::<Transform>(entity).unwrap();
        assert!((transform.translation.y - 0.1).abs() < 0.01);
    }

    #[test]
    fn impulse_moves_body_in_its_direction() {
        let mut app = app();
        app.world_mut().resource_mut::<ArConfig>().physics.gravity = 0.0;
        app.update();
        let entity = cube(&mut app, RigidBody::Dynamic, Vec3::ZERO);
        app.update();
        app.world_mut()
            .entity_mut(entity)
            .insert(one_step_impulse(Vec3::new(0.0, 0.0, -60.0), None, Vec3::ZERO));

        for _ in 0..5 {
            app.update();
        }
        let transform = app.world().get::<Transform>(entity).unwrap();
        assert!(transform.translation.z < -0.1);
        assert!(transform.translation.x.abs() < 1e-4);
        assert!(transform.translation.y.abs() < 1e-4);
    }
}
