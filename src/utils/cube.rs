//! The cube entities: model loading, placement data, push/pull forces and the
//! delayed return to dynamic physics after a position reset.
use std::collections::HashMap;

use bevy::asset::LoadState;
use bevy::mesh::VertexAttributeValues;
use bevy::prelude::*;
use bevy_rapier3d::prelude::{
    Collider, ColliderMassProperties, ExternalImpulse, RigidBody, Velocity,
};

use crate::utils::config::{CubeConfig, PhysicsConfig};
use crate::utils::errors::ArError;
use crate::utils::objects::{CubeIdentity, SceneAnchored};
use crate::utils::physics::{one_step_impulse, surface_material};

/// Axis-aligned bounds of a model in its own space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl ModelBounds {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn from_mesh(mesh: &Mesh) -> Option<Self> {
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION)? {
            VertexAttributeValues::Float32x3(positions) => {
                Self::from_points(positions.iter().map(|p| Vec3::from_array(*p)))
            }
            _ => None,
        }
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// A loaded cube model
#[derive(Clone, Debug)]
pub struct CubeModel {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub bounds: Option<ModelBounds>,
}

#[derive(Debug)]
enum ModelSlot {
    Loading {
        mesh: Handle<Mesh>,
        material: Handle<StandardMaterial>,
    },
    Ready(CubeModel),
    Failed,
}

/// Model assets of both cube identities
#[derive(Resource, Default, Debug)]
pub struct CubeModels {
    slots: HashMap<CubeIdentity, ModelSlot>,
}

impl CubeModels {
    pub fn start_loading(
        &mut self,
        identity: CubeIdentity,
        mesh: Handle<Mesh>,
        material: Handle<StandardMaterial>,
    ) {
        self.slots
            .insert(identity, ModelSlot::Loading { mesh, material });
    }

    pub fn insert_ready(&mut self, identity: CubeIdentity, model: CubeModel) {
        self.slots.insert(identity, ModelSlot::Ready(model));
    }

    pub fn is_ready(&self, identity: CubeIdentity) -> bool {
        matches!(self.slots.get(&identity), Some(ModelSlot::Ready(_)))
    }

    pub fn get(&self, identity: CubeIdentity) -> Result<&CubeModel, ArError> {
        match self.slots.get(&identity) {
            Some(ModelSlot::Ready(model)) => Ok(model),
            _ => Err(ArError::AssetLoadFailure(identity)),
        }
    }
}

/// A cube standing on the scanned surface
#[derive(Component, Debug, Clone)]
pub struct CubeEntity {
    identity: CubeIdentity,
    starting_position: Option<Vec3>,
    max_force: f32,
    height: Option<f32>,
    half_extents: Vec3,
}

/// Counts down to switching a restarted cube back to dynamic physics
#[derive(Component, Debug)]
pub struct SettleTimer(pub Timer);

/// A cube whose model resolved, ready to be spawned at a position
#[derive(Debug, Clone)]
pub struct PreparedCube {
    pub cube: CubeEntity,
    pub model: CubeModel,
    pub body: RigidBody,
    /// Collider half size in model space, the transform scale applies on top
    pub collider_half_extents: Vec3,
    pub mass: f32,
    pub scale: f32,
}

impl PreparedCube {
    /// Spawn the cube with its starting position applied
    pub fn spawn(
        mut self,
        commands: &mut Commands,
        position: Vec3,
        physics: &PhysicsConfig,
    ) -> Entity {
        let mut transform = Transform::from_scale(Vec3::splat(self.scale));
        self.cube.set_starting_position(position, &mut transform);
        let half = self.collider_half_extents;
        commands
            .spawn((
                Name::new(self.cube.identity.name()),
                self.cube,
                self.body,
                Collider::cuboid(half.x, half.y, half.z),
                ColliderMassProperties::Mass(self.mass),
                Velocity::zero(),
                ExternalImpulse::default(),
                surface_material(physics),
                Mesh3d(self.model.mesh),
                MeshMaterial3d(self.model.material),
                transform,
                SceneAnchored,
            ))
            .id()
    }
}

impl CubeEntity {
    /// Resolve the model of `identity` and attach a fixed body with a box
    /// collider generated from the model bounds.
    pub fn create(
        identity: CubeIdentity,
        models: &CubeModels,
        config: &CubeConfig,
    ) -> Result<PreparedCube, ArError> {
        let model = models.get(identity)?.clone();
        let collider_half_extents = model
            .bounds
            .map(|bounds| bounds.half_extents())
            .unwrap_or(Vec3::splat(0.5));
        Ok(PreparedCube {
            cube: CubeEntity {
                identity,
                starting_position: None,
                max_force: config.max_force,
                height: model.bounds.map(|bounds| bounds.height()),
                half_extents: collider_half_extents * config.scale,
            },
            body: RigidBody::Fixed,
            collider_half_extents,
            mass: config.mass,
            model,
            scale: config.scale,
        })
    }

    pub fn identity(&self) -> CubeIdentity {
        self.identity
    }

    pub fn starting_position(&self) -> Option<Vec3> {
        self.starting_position
    }

    /// Model height, used to lift the cube above the surface
    pub fn height(&self) -> Option<f32> {
        self.height
    }

    /// Half size of the scaled collider, in world units
    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    pub fn set_starting_position(&mut self, position: Vec3, transform: &mut Transform) {
        self.starting_position = Some(position);
        transform.translation = position;
    }

    /// Make the body fixed and snap it back to its starting position.
    /// Returns false when the cube was never placed. The caller schedules the
    /// switch back to dynamic.
    pub fn restart_position(
        &self,
        transform: &mut Transform,
        body: &mut RigidBody,
        velocity: &mut Velocity,
    ) -> bool {
        let Some(position) = self.starting_position else {
            return false;
        };
        *body = RigidBody::Fixed;
        *velocity = Velocity::zero();
        transform.translation = position;
        true
    }

    /// World delta from `target` to `own` on the horizontal plane
    pub fn distance_to(own: Vec3, target: Vec3) -> Vec3 {
        (own - target).with_y(0.0)
    }

    /// Force pushing a cube at `own` away from `other`
    pub fn away_force(&self, own: Vec3, other: Vec3) -> Vec3 {
        Self::distance_to(own, other) * self.max_force
    }

    /// Force pulling a cube at `own` toward `other`
    pub fn closer_force(&self, own: Vec3, other: Vec3) -> Vec3 {
        -self.away_force(own, other)
    }

    /// Push away from `other` during the next step, applied at the contact point `at`
    pub fn move_away_from(
        &self,
        own: Vec3,
        other: Vec3,
        at: Option<Vec3>,
        impulse: &mut ExternalImpulse,
    ) {
        add_impulse(impulse, one_step_impulse(self.away_force(own, other), at, own));
    }

    /// Pull toward `other` during the next step, applied at the centre
    pub fn move_closer_to(&self, own: Vec3, other: Vec3, impulse: &mut ExternalImpulse) {
        add_impulse(impulse, one_step_impulse(self.closer_force(own, other), None, own));
    }
}

fn add_impulse(impulse: &mut ExternalImpulse, added: ExternalImpulse) {
    impulse.impulse += added.impulse;
    impulse.torque_impulse += added.torque_impulse;
}

/// Start loading both cube models
pub fn load_cube_models(
    asset_server: Res<AssetServer>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut models: ResMut<CubeModels>,
) {
    for identity in CubeIdentity::ALL {
        let mesh = asset_server.load(
            GltfAssetLabel::Primitive {
                mesh: 0,
                primitive: 0,
            }
            .from_asset(identity.asset_path()),
        );
        let base_color = match identity {
            CubeIdentity::CubeOne => Color::srgb(0.9, 0.35, 0.2),
            CubeIdentity::CubeTwo => Color::srgb(0.2, 0.5, 0.95),
        };
        let material = materials.add(StandardMaterial {
            base_color,
            perceptual_roughness: 0.6,
            ..default()
        });
        models.start_loading(identity, mesh, material);
    }
}

/// Resolve loading models into ready or failed slots
pub fn track_cube_models(
    asset_server: Res<AssetServer>,
    meshes: Res<Assets<Mesh>>,
    mut models: ResMut<CubeModels>,
) {
    for (identity, slot) in models.slots.iter_mut() {
        let ModelSlot::Loading { mesh, material } = slot else {
            continue;
        };
        if let Some(loaded) = meshes.get(mesh.id()) {
            let bounds = ModelBounds::from_mesh(loaded);
            if bounds.is_none() {
                warn!("Model {} has no position data", identity.asset_path());
            }
            info!("Model {} loaded, bounds {:?}", identity.asset_path(), bounds);
            *slot = ModelSlot::Ready(CubeModel {
                mesh: mesh.clone(),
                material: material.clone(),
                bounds,
            });
        } else if let Some(LoadState::Failed(e)) = asset_server.get_load_state(mesh.id()) {
            error!("Failed to load {}: {}", identity.asset_path(), e);
            *slot = ModelSlot::Failed;
        }
    }
}

/// Switch restarted cubes back to dynamic once their timer ran out
pub fn settle_restarted_cubes(
    mut commands: Commands,
    time: Res<Time>,
    mut cubes: Query<(Entity, &mut SettleTimer, &mut RigidBody)>,
) {
    for (entity, mut settle, mut body) in &mut cubes {
        settle.0.tick(time.delta());
        if settle.0.just_finished() {
            *body = RigidBody::Dynamic;
            commands.entity(entity).remove::<SettleTimer>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_models() -> CubeModels {
        let mut models = CubeModels::default();
        for identity in CubeIdentity::ALL {
            models.insert_ready(
                identity,
                CubeModel {
                    mesh: Handle::default(),
                    material: Handle::default(),
                    bounds: ModelBounds::from_points([Vec3::splat(-0.25), Vec3::splat(0.25)]),
                },
            );
        }
        models
    }

    fn cube_at_origin() -> CubeEntity {
        CubeEntity::create(CubeIdentity::CubeOne, &ready_models(), &CubeConfig::default())
            .unwrap()
            .cube
    }

    #[test]
    fn create_fails_without_model() {
        let models = CubeModels::default();
        let err = CubeEntity::create(CubeIdentity::CubeTwo, &models, &CubeConfig::default())
            .unwrap_err();
        assert!(matches!(err, ArError::AssetLoadFailure(CubeIdentity::CubeTwo)));
    }

    #[test]
    fn create_scales_collider_and_keeps_model_height() {
        let prepared =
            CubeEntity::create(CubeIdentity::CubeOne, &ready_models(), &CubeConfig::default())
                .unwrap();
        assert_eq!(prepared.cube.height(), Some(0.5));
        assert!((prepared.cube.half_extents() - Vec3::splat(0.1)).length() < 1e-6);
        assert_eq!(prepared.collider_half_extents, Vec3::splat(0.25));
        assert_eq!(prepared.body, RigidBody::Fixed);
        assert_eq!(prepared.mass, 1.0);
    }

    #[test]
    fn distance_ignores_height() {
        let distance = CubeEntity::distance_to(Vec3::new(1.0, 3.0, 2.0), Vec3::new(0.0, -1.0, 1.0));
        assert_eq!(distance, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn closer_is_the_negated_away_force() {
        let cube = cube_at_origin();
        let a = Vec3::new(0.3, 0.1, -0.2);
        let b = Vec3::new(-0.5, 0.4, 0.7);
        assert_eq!(cube.closer_force(a, b), -cube.away_force(a, b));
        assert!((cube.away_force(a, b) - Vec3::new(4.0, 0.0, -4.5)).length() < 1e-5);
        // Pulling A toward B points the same way as pushing B away from A
        assert_eq!(cube.closer_force(a, b), cube.away_force(b, a));
    }

    #[test]
    fn move_away_applies_at_contact_point() {
        let cube = cube_at_origin();
        let step = 1.0 / 60.0;
        let mut impulse = ExternalImpulse::default();
        cube.move_away_from(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 1.0),
            Some(Vec3::new(0.1, 0.1, 0.0)),
            &mut impulse,
        );
        assert!((impulse.impulse - Vec3::new(0.0, 0.0, -5.0 * step)).length() < 1e-6);
        assert_ne!(impulse.torque_impulse, Vec3::ZERO);

        let mut centered = ExternalImpulse::default();
        cube.move_closer_to(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), &mut centered);
        assert!((centered.impulse - Vec3::new(0.0, 0.0, 5.0 * step)).length() < 1e-6);
        assert_eq!(centered.torque_impulse, Vec3::ZERO);

        // Two taps in one frame add up
        cube.move_closer_to(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), &mut centered);
        assert!((centered.impulse - Vec3::new(0.0, 0.0, 10.0 * step)).length() < 1e-6);
    }

    #[test]
    fn restart_needs_a_starting_position() {
        let mut cube = cube_at_origin();
        let mut transform = Transform::from_xyz(4.0, 0.0, 4.0);
        let mut body = RigidBody::Dynamic;
        let mut velocity = Velocity {
            linvel: Vec3::X,
            angvel: Vec3::Y,
        };

        assert!(!cube.restart_position(&mut transform, &mut body, &mut velocity));
        assert_eq!(body, RigidBody::Dynamic);

        let start = Vec3::new(0.0, 0.5, -1.0);
        cube.set_starting_position(start, &mut Transform::default());
        assert!(cube.restart_position(&mut transform, &mut body, &mut velocity));
        assert_eq!(transform.translation, start);
        assert_eq!(body, RigidBody::Fixed);
        assert_eq!(velocity, Velocity::zero());
    }

    #[test]
    fn bounds_from_points() {
        let bounds = ModelBounds::from_points([
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(1.0, 3.0, -2.0),
            Vec3::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, -2.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 3.0, 2.0));
        assert_eq!(bounds.height(), 3.0);
        assert!(ModelBounds::from_points(std::iter::empty()).is_none());
    }
}
