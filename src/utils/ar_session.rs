//! Host side of the AR view: session lifecycle, anchors, coaching overlay,
//! debug visualisation flags and the raycast / hit-test queries.
//!
//! The session view only talks to the types in this module. On desktop the
//! anchors are produced by the simulated tracker in `tracker.rs`.
use bevy::prelude::*;

/// Identifier of an anchor, unique within a session run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneAlignment {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneClassification {
    None,
    Floor,
    Table,
    Ceiling,
    Wall,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnchorKind {
    /// A chunk of reconstructed scene mesh
    Mesh,
    /// A detected plane. `extent` is the half size along the anchor's local X and Z.
    Plane {
        alignment: PlaneAlignment,
        classification: PlaneClassification,
        extent: Vec2,
    },
}

/// A tracked reference frame in the real world
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArAnchor {
    pub id: AnchorId,
    pub transform: Transform,
    pub kind: AnchorKind,
}

impl ArAnchor {
    pub fn mesh(id: AnchorId, position: Vec3) -> Self {
        Self {
            id,
            transform: Transform::from_translation(position),
            kind: AnchorKind::Mesh,
        }
    }

    pub fn horizontal_plane(
        id: AnchorId,
        center: Vec3,
        extent: Vec2,
        classification: PlaneClassification,
    ) -> Self {
        Self {
            id,
            transform: Transform::from_translation(center),
            kind: AnchorKind::Plane {
                alignment: PlaneAlignment::Horizontal,
                classification,
                extent,
            },
        }
    }

    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    /// True for horizontal planes that are not a ceiling
    pub fn is_horizontal_surface(&self) -> bool {
        matches!(
            self.kind,
            AnchorKind::Plane {
                alignment: PlaneAlignment::Horizontal,
                classification,
                ..
            } if classification != PlaneClassification::Ceiling
        )
    }
}

/// Session delegate callbacks
#[derive(Message, Clone, Debug, PartialEq)]
pub enum AnchorEvent {
    Added(Vec<ArAnchor>),
    Updated(Vec<ArAnchor>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SceneReconstruction {
    None,
    Mesh,
    #[default]
    MeshWithClassification,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WorldAlignment {
    #[default]
    Gravity,
    Camera,
}

/// World tracking configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArConfiguration {
    pub scene_reconstruction: SceneReconstruction,
    pub automatic_environment_texturing: bool,
    pub horizontal_plane_detection: bool,
    pub world_alignment: WorldAlignment,
}

impl Default for ArConfiguration {
    fn default() -> Self {
        Self {
            scene_reconstruction: SceneReconstruction::MeshWithClassification,
            automatic_environment_texturing: true,
            horizontal_plane_detection: true,
            world_alignment: WorldAlignment::Gravity,
        }
    }
}

/// Scene understanding features of the environment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SceneUnderstanding {
    pub occlusion: bool,
    pub physics: bool,
}

#[derive(Resource, Debug, Default)]
pub struct ArSession {
    configuration: Option<ArConfiguration>,
    pub scene_understanding: SceneUnderstanding,
    /// Bumped every time the scene reconstruction is reset
    generation: u32,
    runs: u32,
}

impl ArSession {
    pub fn run(&mut self, configuration: ArConfiguration, reset_scene_reconstruction: bool) {
        self.configuration = Some(configuration);
        self.runs += 1;
        if reset_scene_reconstruction {
            self.generation += 1;
        }
        info!(
            "AR session run #{} (reset reconstruction: {}) with {:?}",
            self.runs, reset_scene_reconstruction, configuration
        );
    }

    pub fn is_running(&self) -> bool {
        self.configuration.is_some()
    }

    pub fn configuration(&self) -> Option<&ArConfiguration> {
        self.configuration.as_ref()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CoachingGoal {
    #[default]
    HorizontalPlane,
    AnyPlane,
}

/// Scan coaching overlay shown until a plane is found
#[derive(Resource, Debug, Default)]
pub struct CoachingOverlay {
    pub active: bool,
    pub goal: CoachingGoal,
}

/// Coaching overlay delegate callbacks
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoachingEvent {
    WillActivate,
    DidDeactivate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugOption {
    ShowSceneUnderstanding,
    ShowPhysics,
}

/// Debug visualisation flags of the view
#[derive(Resource, Debug, Default)]
pub struct ArDebugOptions {
    show_scene_understanding: bool,
    show_physics: bool,
}

impl ArDebugOptions {
    fn flag(&mut self, option: DebugOption) -> &mut bool {
        match option {
            DebugOption::ShowSceneUnderstanding => &mut self.show_scene_understanding,
            DebugOption::ShowPhysics => &mut self.show_physics,
        }
    }

    pub fn insert(&mut self, option: DebugOption) {
        *self.flag(option) = true;
    }

    pub fn remove(&mut self, option: DebugOption) {
        *self.flag(option) = false;
    }

    pub fn contains(&self, option: DebugOption) -> bool {
        match option {
            DebugOption::ShowSceneUnderstanding => self.show_scene_understanding,
            DebugOption::ShowPhysics => self.show_physics,
        }
    }
}

/// Per-frame camera data
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct ArFrame {
    pub camera_position: Vec3,
    /// Ray through the centre of the screen, if the camera viewport is known
    pub center_ray: Option<Ray3d>,
}

/// A tap on the view, already turned into a world-space ray
#[derive(Message, Clone, Copy, Debug)]
pub struct ScreenTap {
    pub ray: Ray3d,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
    Started,
    Moved,
    Ended,
}

/// A one-finger drag on the view. `Started` carries the ray of the initial
/// press, the others the current pointer ray.
#[derive(Message, Clone, Copy, Debug)]
pub struct ScreenDrag {
    pub phase: DragPhase,
    pub ray: Ray3d,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldHit {
    pub anchor: AnchorId,
    pub position: Vec3,
    pub distance: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityHit {
    pub entity: Entity,
    pub position: Vec3,
    pub distance: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TrackedPlane {
    transform: Transform,
    alignment: PlaneAlignment,
    extent: Vec2,
}

/// Planes currently estimated by the session
#[derive(Resource, Debug, Default)]
pub struct TrackedPlanes {
    planes: Vec<(AnchorId, TrackedPlane)>,
    generation: u32,
}

impl TrackedPlanes {
    pub fn upsert(&mut self, anchor: &ArAnchor) {
        let AnchorKind::Plane {
            alignment, extent, ..
        } = anchor.kind
        else {
            return;
        };
        let plane = TrackedPlane {
            transform: anchor.transform,
            alignment,
            extent,
        };
        match self.planes.iter_mut().find(|(id, _)| *id == anchor.id) {
            Some((_, existing)) => *existing = plane,
            None => self.planes.push((anchor.id, plane)),
        }
    }

    pub fn clear(&mut self) {
        self.planes.clear();
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Pose and half extent of every tracked plane
    pub fn outlines(&self) -> impl Iterator<Item = (&Transform, Vec2)> {
        self.planes
            .iter()
            .map(|(_, plane)| (&plane.transform, plane.extent))
    }

    /// Nearest hit of `ray` on a tracked plane with the given alignment.
    pub fn raycast(&self, ray: Ray3d, alignment: PlaneAlignment) -> Option<WorldHit> {
        let direction = *ray.direction;
        self.planes
            .iter()
            .filter(|(_, plane)| plane.alignment == alignment)
            .filter_map(|(id, plane)| {
                let normal = plane.transform.rotation * Vec3::Y;
                let denom = normal.dot(direction);
                if denom.abs() < f32::EPSILON {
                    return None;
                }
                let distance = normal.dot(plane.transform.translation - ray.origin) / denom;
                if distance < 0.0 {
                    return None;
                }
                let position = ray.origin + direction * distance;
                let local =
                    plane.transform.rotation.inverse() * (position - plane.transform.translation);
                let inside = local.x.abs() <= plane.extent.x && local.z.abs() <= plane.extent.y;
                inside.then_some(WorldHit {
                    anchor: *id,
                    position,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Distance along `ray` to an oriented box, if it is hit in front of the origin.
pub fn ray_box_distance(ray: Ray3d, transform: &Transform, half_extents: Vec3) -> Option<f32> {
    let inverse = transform.rotation.inverse();
    let origin = inverse * (ray.origin - transform.translation);
    let direction = inverse * *ray.direction;

    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let (o, d, h) = (origin[axis], direction[axis], half_extents[axis]);
        if d.abs() < f32::EPSILON {
            if o.abs() > h {
                return None;
            }
            continue;
        }
        let t1 = (-h - o) / d;
        let t2 = (h - o) / d;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
        if t_min > t_max {
            return None;
        }
    }
    if t_max < 0.0 {
        return None;
    }
    Some(t_min.max(0.0))
}

/// Hit test of `ray` against boxes, nearest first.
pub fn hit_test<'a>(
    ray: Ray3d,
    targets: impl IntoIterator<Item = (Entity, &'a Transform, Vec3)>,
) -> Vec<EntityHit> {
    let mut hits: Vec<EntityHit> = targets
        .into_iter()
        .filter_map(|(entity, transform, half_extents)| {
            let distance = ray_box_distance(ray, transform, half_extents)?;
            Some(EntityHit {
                entity,
                position: ray.get_point(distance),
                distance,
            })
        })
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Host systems run in `PreUpdate`, before the session view reacts in `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArHostSet {
    /// Camera frame and pointer rays
    Frame,
    /// Anchor production
    Tracking,
    /// Host bookkeeping of what was tracked
    Bookkeeping,
}

/// Plugin holding the host resources, callback streams and bookkeeping
pub struct ArSessionPlugin;

impl Plugin for ArSessionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ArSession>()
            .init_resource::<CoachingOverlay>()
            .init_resource::<ArDebugOptions>()
            .init_resource::<ArFrame>()
            .init_resource::<TrackedPlanes>()
            .add_message::<AnchorEvent>()
            .add_message::<CoachingEvent>()
            .add_message::<ScreenTap>()
            .add_message::<ScreenDrag>()
            .configure_sets(
                PreUpdate,
                (ArHostSet::Frame, ArHostSet::Tracking, ArHostSet::Bookkeeping).chain(),
            )
            .add_systems(
                PreUpdate,
                (track_planes, drive_coaching_overlay)
                    .chain()
                    .in_set(ArHostSet::Bookkeeping),
            );
    }
}

/// Keep the estimated planes in sync with the anchor stream
fn track_planes(
    session: Res<ArSession>,
    mut planes: ResMut<TrackedPlanes>,
    mut anchor_events: MessageReader<AnchorEvent>,
) {
    if planes.generation != session.generation() {
        planes.clear();
        planes.generation = session.generation();
    }
    for event in anchor_events.read() {
        let (AnchorEvent::Added(anchors) | AnchorEvent::Updated(anchors)) = event;
        for anchor in anchors {
            planes.upsert(anchor);
        }
    }
}

/// Report overlay activation changes as delegate callbacks
fn drive_coaching_overlay(
    overlay: Res<CoachingOverlay>,
    mut was_active: Local<bool>,
    mut coaching_events: MessageWriter<CoachingEvent>,
) {
    if overlay.active == *was_active {
        return;
    }
    *was_active = overlay.active;
    if overlay.active {
        coaching_events.write(CoachingEvent::WillActivate);
    } else {
        info!("Coaching overlay deactivated, goal {:?} reached", overlay.goal);
        coaching_events.write(CoachingEvent::DidDeactivate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_ray(x: f32, z: f32) -> Ray3d {
        Ray3d::new(Vec3::new(x, 2.0, z), Dir3::NEG_Y)
    }

    fn floor(height: f32) -> ArAnchor {
        ArAnchor::horizontal_plane(
            AnchorId(1),
            Vec3::new(0.0, height, 0.0),
            Vec2::splat(1.0),
            PlaneClassification::Floor,
        )
    }

    #[test]
    fn raycast_hits_plane_inside_extent() {
        let mut planes = TrackedPlanes::default();
        planes.upsert(&floor(0.5));

        let hit = planes
            .raycast(down_ray(0.3, -0.2), PlaneAlignment::Horizontal)
            .unwrap();
        assert_eq!(hit.anchor, AnchorId(1));
        assert!((hit.position - Vec3::new(0.3, 0.5, -0.2)).length() < 1e-5);
        assert!((hit.distance - 1.5).abs() < 1e-5);

        assert!(planes.raycast(down_ray(3.0, 0.0), PlaneAlignment::Horizontal).is_none());
        assert!(planes.raycast(down_ray(0.0, 0.0), PlaneAlignment::Vertical).is_none());
    }

    #[test]
    fn raycast_ignores_planes_behind_the_ray() {
        let mut planes = TrackedPlanes::default();
        planes.upsert(&floor(3.0));
        assert!(planes.raycast(down_ray(0.0, 0.0), PlaneAlignment::Horizontal).is_none());
    }

    #[test]
    fn upsert_replaces_same_anchor() {
        let mut planes = TrackedPlanes::default();
        planes.upsert(&floor(0.0));
        planes.upsert(&floor(1.0));
        assert_eq!(planes.len(), 1);
        let hit = planes
            .raycast(down_ray(0.0, 0.0), PlaneAlignment::Horizontal)
            .unwrap();
        assert!((hit.position.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ceiling_is_not_a_horizontal_surface() {
        let ceiling = ArAnchor::horizontal_plane(
            AnchorId(2),
            Vec3::Y * 2.5,
            Vec2::ONE,
            PlaneClassification::Ceiling,
        );
        assert!(!ceiling.is_horizontal_surface());
        assert!(floor(0.0).is_horizontal_surface());
        assert!(!ArAnchor::mesh(AnchorId(3), Vec3::ZERO).is_horizontal_surface());
    }

    #[test]
    fn hit_test_returns_nearest_box_first() {
        let mut world = World::new();
        let near = world.spawn_empty().id();
        let far = world.spawn_empty().id();
        let near_transform = Transform::from_xyz(0.0, 0.0, 1.0);
        let far_transform = Transform::from_xyz(0.0, 0.0, -1.0);
        let ray = Ray3d::new(Vec3::new(0.0, 0.0, 5.0), Dir3::NEG_Z);

        let hits = hit_test(
            ray,
            [
                (far, &far_transform, Vec3::splat(0.25)),
                (near, &near_transform, Vec3::splat(0.25)),
            ],
        );
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entity, near);
        assert!((hits[0].position.z - 1.25).abs() < 1e-5);
        assert_eq!(hits[1].entity, far);
    }

    #[test]
    fn hit_test_misses_offset_box() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let transform = Transform::from_xyz(2.0, 0.0, 0.0);
        let ray = Ray3d::new(Vec3::new(0.0, 0.0, 5.0), Dir3::NEG_Z);
        assert!(hit_test(ray, [(entity, &transform, Vec3::splat(0.25))]).is_empty());
    }

    #[test]
    fn rotated_box_uses_its_local_frame() {
        let transform =
            Transform::from_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4));
        let ray = Ray3d::new(Vec3::new(0.0, 0.0, 5.0), Dir3::NEG_Z);
        let distance = ray_box_distance(ray, &transform, Vec3::splat(0.5)).unwrap();
        // Corner of a 45 degree rotated box faces the ray
        assert!((distance - (5.0 - 0.5 * std::f32::consts::SQRT_2)).abs() < 1e-4);
    }

    #[test]
    fn debug_options_round_trip_flags() {
        let mut options = ArDebugOptions::default();
        options.insert(DebugOption::ShowSceneUnderstanding);
        assert!(options.contains(DebugOption::ShowSceneUnderstanding));
        assert!(!options.contains(DebugOption::ShowPhysics));
        options.remove(DebugOption::ShowSceneUnderstanding);
        assert!(!options.contains(DebugOption::ShowSceneUnderstanding));
    }

    #[test]
    fn session_generation_only_moves_on_reset() {
        let mut session = ArSession::default();
        assert!(!session.is_running());
        session.run(ArConfiguration::default(), false);
        assert!(session.is_running());
        assert_eq!(session.generation(), 0);
        session.run(ArConfiguration::default(), true);
        assert_eq!(session.generation(), 1);
        assert_eq!(session.runs(), 2);
    }
}
