//! The AR session view: reacts to UI actions and session callbacks, owns the
//! crosshair and the two cubes, and writes the results back into `UiState`.
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::{ExternalImpulse, RigidBody, Velocity};

use crate::utils::ar_session::{
    AnchorEvent, AnchorKind, ArConfiguration, ArDebugOptions, ArFrame, ArSession,
    ArSessionPlugin, CoachingEvent, CoachingGoal, CoachingOverlay, DebugOption, DragPhase,
    PlaneAlignment, ScreenDrag, ScreenTap, TrackedPlanes, hit_test,
};
use crate::utils::config::ArConfig;
use crate::utils::crosshair::{
    CrosshairAssets, CrosshairEntity, CrosshairMotion, aim_position, animate_crosshair,
    spawn_crosshair,
};
use crate::utils::cube::{
    CubeEntity, CubeModels, PreparedCube, SettleTimer, settle_restarted_cubes,
};
use crate::utils::errors::ArError;
use crate::utils::objects::{ArAction, CubeIdentity, PlacedCubes, SceneAnchored, UiState};
use crate::utils::physics::BlockPhysicsPlugin;
use crate::utils::surface::{SurfaceSample, SurfaceSamples};
use crate::utils::view_model::{NoSurfaceWarning, clear_no_surface_warning, show_no_surface_warning};

/// Whether taps on the view are routed to the cubes
#[derive(Resource, Debug, Default)]
pub struct TapGesture {
    pub installed: bool,
}

/// The cube held by an ongoing drag
#[derive(Resource, Debug, Default)]
pub struct CubeDrag {
    grabbed: Option<GrabbedCube>,
}

#[derive(Debug, Clone, Copy)]
struct GrabbedCube {
    entity: Entity,
    previous_body: RigidBody,
    /// Cube position minus the grab point, on the horizontal plane
    offset: Vec3,
}

impl CubeDrag {
    pub fn entity(&self) -> Option<Entity> {
        self.grabbed.map(|grabbed| grabbed.entity)
    }
}

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionViewSet;

/// Plugin wiring the session view on top of the AR host and the physics step
pub struct ArBlocksPlugin;

impl Plugin for ArBlocksPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ArConfig>()
            .init_resource::<UiState>()
            .init_resource::<NoSurfaceWarning>()
            .init_resource::<SurfaceSamples>()
            .init_resource::<PlacedCubes>()
            .init_resource::<CubeModels>()
            .init_resource::<TapGesture>()
            .init_resource::<CubeDrag>()
            .add_message::<ArAction>()
            .add_plugins((ArSessionPlugin, BlockPhysicsPlugin))
            .add_systems(
                Update,
                (
                    handle_coaching_events,
                    handle_anchor_events,
                    handle_taps,
                    handle_drags,
                    dispatch_actions,
                    animate_crosshair,
                    settle_restarted_cubes,
                    clear_no_surface_warning,
                )
                    .chain()
                    .in_set(SessionViewSet),
            );
    }
}

/// Everything an action can touch
#[derive(SystemParam)]
pub struct SessionView<'w, 's> {
    commands: Commands<'w, 's>,
    config: Res<'w, ArConfig>,
    ui: ResMut<'w, UiState>,
    warning: ResMut<'w, NoSurfaceWarning>,
    session: ResMut<'w, ArSession>,
    coaching: ResMut<'w, CoachingOverlay>,
    debug_options: ResMut<'w, ArDebugOptions>,
    tap_gesture: ResMut<'w, TapGesture>,
    drag: ResMut<'w, CubeDrag>,
    samples: ResMut<'w, SurfaceSamples>,
    placed: ResMut<'w, PlacedCubes>,
    models: Res<'w, CubeModels>,
    crosshair_assets: Option<Res<'w, CrosshairAssets>>,
    crosshairs: Query<'w, 's, (&'static Transform, &'static mut Visibility), With<CrosshairEntity>>,
    cubes: Query<
        'w,
        's,
        (
            &'static CubeEntity,
            &'static mut Transform,
            &'static mut RigidBody,
            &'static mut Velocity,
        ),
        Without<CrosshairEntity>,
    >,
    anchored: Query<'w, 's, Entity, With<SceneAnchored>>,
}

impl SessionView<'_, '_> {
    pub fn dispatch(&mut self, action: ArAction) {
        match action {
            ArAction::Start => {
                if self.session.is_running() {
                    warn!("Session already running, ignoring start");
                    return;
                }
                self.setup_ar(false);
                self.ui.session_started = true;
            }
            ArAction::Reset => self.restart_scan(),
            ArAction::SetDebug { enabled } => self.modify_debug_options(enabled),
            ArAction::PlaceBlocks => self.init_cubes(),
            ArAction::RestartBlocks => self.restart_cubes(),
        }
    }

    fn setup_ar(&mut self, restart: bool) {
        self.setup_scan_overlay();
        self.session.scene_understanding.occlusion = true;
        self.session.scene_understanding.physics = true;
        self.session.run(ArConfiguration::default(), restart);
        self.tap_gesture.installed = true;
        self.init_crosshair();
    }

    fn setup_scan_overlay(&mut self) {
        self.coaching.goal = CoachingGoal::HorizontalPlane;
        self.coaching.active = true;
    }

    fn init_crosshair(&mut self) {
        spawn_crosshair(&mut self.commands, self.crosshair_assets.as_deref());
    }

    fn restart_scan(&mut self) {
        for entity in &self.anchored {
            self.commands.entity(entity).try_despawn();
        }
        self.placed.clear();
        self.drag.grabbed = None;

        self.setup_ar(true);

        self.samples.clear();
        self.ui.blocks_placed = false;
        self.ui.enough_surface_scanned = false;
        info!("Scan restarted");
    }

    fn modify_debug_options(&mut self, enabled: bool) {
        for option in [DebugOption::ShowSceneUnderstanding, DebugOption::ShowPhysics] {
            if enabled {
                self.debug_options.insert(option);
            } else {
                self.debug_options.remove(option);
            }
        }
        self.ui.debug_enabled = self
            .debug_options
            .contains(DebugOption::ShowSceneUnderstanding);
    }

    fn crosshair_position(&self) -> Option<Vec3> {
        self.crosshairs
            .iter()
            .next()
            .map(|(transform, _)| transform.translation)
    }

    fn hide_crosshair(&mut self) {
        for (_, mut visibility) in &mut self.crosshairs {
            *visibility = Visibility::Hidden;
        }
    }

    /// Resolve the cube and check that its candidate position is backed by a surface sample
    fn place_cube(
        &self,
        identity: CubeIdentity,
        offset: bool,
    ) -> Result<(PreparedCube, Vec3), ArError> {
        let prepared = CubeEntity::create(identity, &self.models, &self.config.cube)?;
        let crosshair = self.crosshair_position().ok_or(ArError::NoRaycastHit)?;

        let z = if offset {
            self.config.placement.second_cube_z_offset
        } else {
            0.0
        };
        let position = crosshair + Vec3::new(0.0, prepared.cube.height().unwrap_or(0.0), z);

        if !self
            .samples
            .is_valid_position(position, self.config.placement.cutoff_distance)
        {
            return Err(ArError::NoValidSurfaceNearby);
        }
        Ok((prepared, position))
    }

    fn init_cubes(&mut self) {
        if self.placed.any() {
            warn!("Cubes are already placed, ignoring placement");
            return;
        }

        let first = self.place_cube(CubeIdentity::CubeOne, false);
        let second = self.place_cube(CubeIdentity::CubeTwo, true);

        match (first, second) {
            (Ok((mut cube_one, one_position)), Ok((mut cube_two, two_position))) => {
                cube_one.body = RigidBody::Dynamic;
                cube_two.body = RigidBody::Dynamic;
                let physics = &self.config.physics;
                self.placed.cube_one =
                    Some(cube_one.spawn(&mut self.commands, one_position, physics));
                self.placed.cube_two =
                    Some(cube_two.spawn(&mut self.commands, two_position, physics));
                self.ui.blocks_placed = true;
                self.hide_crosshair();
                info!("Cubes placed at {} and {}", one_position, two_position);
            }
            (first, second) => {
                // Nothing was spawned, so there is no partial state to tear down
                for error in [first.err(), second.err()].into_iter().flatten() {
                    warn!("Cube placement failed: {}", error);
                }
                let duration = self.config.timing.no_surface_warning;
                show_no_surface_warning(&mut self.ui, &mut self.warning, duration);
            }
        }
    }

    fn restart_cubes(&mut self) {
        // The settle timer decides when the body turns dynamic again
        self.drag.grabbed = None;
        let delay = self.config.timing.cube_settle_delay;
        for entity in [self.placed.cube_one, self.placed.cube_two]
            .into_iter()
            .flatten()
        {
            let Ok((cube, mut transform, mut body, mut velocity)) = self.cubes.get_mut(entity)
            else {
                continue;
            };
            if cube.restart_position(&mut transform, &mut body, &mut velocity) {
                self.commands
                    .entity(entity)
                    .insert(SettleTimer(Timer::from_seconds(delay, TimerMode::Once)));
            }
        }
    }
}

pub fn dispatch_actions(mut actions: MessageReader<ArAction>, mut view: SessionView) {
    for action in actions.read() {
        info!("Action: {:?}", action);
        view.dispatch(*action);
    }
}

pub fn handle_coaching_events(
    mut coaching_events: MessageReader<CoachingEvent>,
    mut ui: ResMut<UiState>,
) {
    for event in coaching_events.read() {
        ui.plane_found = match event {
            CoachingEvent::WillActivate => false,
            CoachingEvent::DidDeactivate => true,
        };
    }
}

/// Record mesh anchors and re-aim the crosshair on horizontal plane updates
pub fn handle_anchor_events(
    mut commands: Commands,
    mut anchor_events: MessageReader<AnchorEvent>,
    mut samples: ResMut<SurfaceSamples>,
    mut ui: ResMut<UiState>,
    config: Res<ArConfig>,
    frame: Res<ArFrame>,
    planes: Res<TrackedPlanes>,
    crosshairs: Query<(Entity, &Transform), With<CrosshairEntity>>,
) {
    for event in anchor_events.read() {
        match event {
            AnchorEvent::Added(anchors) => {
                for anchor in anchors.iter().filter(|a| a.kind == AnchorKind::Mesh) {
                    samples.push(SurfaceSample {
                        anchor: anchor.id,
                        position: anchor.position(),
                    });
                }
                if !samples.is_empty() && !ui.enough_surface_scanned {
                    info!("Enough surface scanned ({} samples)", samples.len());
                    ui.enough_surface_scanned = true;
                }
            }
            AnchorEvent::Updated(anchors) => {
                if anchors.iter().any(|anchor| anchor.is_horizontal_surface()) {
                    if let Err(e) =
                        update_crosshair(&mut commands, &config, &frame, &planes, &crosshairs)
                    {
                        debug!("Crosshair not updated: {}", e);
                    }
                }
            }
        }
    }
}

fn update_crosshair(
    commands: &mut Commands,
    config: &ArConfig,
    frame: &ArFrame,
    planes: &TrackedPlanes,
    crosshairs: &Query<(Entity, &Transform), With<CrosshairEntity>>,
) -> Result<(), ArError> {
    let hit = frame
        .center_ray
        .and_then(|ray| planes.raycast(ray, PlaneAlignment::Horizontal))
        .ok_or(ArError::NoRaycastHit)?;
    let target = aim_position(
        hit.position,
        frame.camera_position,
        config.crosshair.camera_offset,
    );
    for (entity, transform) in crosshairs {
        commands.entity(entity).insert(CrosshairMotion::new(
            transform.translation,
            target,
            config.crosshair.move_duration,
        ));
    }
    Ok(())
}

/// Tapping cube one pulls it toward cube two, tapping cube two pushes it away from cube one
pub fn handle_taps(
    mut taps: MessageReader<ScreenTap>,
    tap_gesture: Res<TapGesture>,
    placed: Res<PlacedCubes>,
    mut cubes: Query<(Entity, &CubeEntity, &Transform, &mut ExternalImpulse)>,
) {
    for tap in taps.read() {
        if !tap_gesture.installed {
            continue;
        }
        let hits = hit_test(
            tap.ray,
            cubes
                .iter()
                .map(|(entity, cube, transform, _)| (entity, transform, cube.half_extents())),
        );
        let Some(hit) = hits.first() else {
            continue;
        };
        let Some((cube_one, cube_two)) = placed.both() else {
            continue;
        };

        let (tapped, other) = if hit.entity == cube_one {
            (cube_one, cube_two)
        } else if hit.entity == cube_two {
            (cube_two, cube_one)
        } else {
            continue;
        };
        let Ok((_, _, other_transform, _)) = cubes.get(other) else {
            continue;
        };
        let other_position = other_transform.translation;
        let Ok((_, cube, transform, mut impulse)) = cubes.get_mut(tapped) else {
            continue;
        };
        let own_position = transform.translation;

        if tapped == cube_one {
            debug!("Pulling {:?} toward {:?}", cube.identity(), other);
            cube.move_closer_to(own_position, other_position, &mut impulse);
        } else {
            debug!("Pushing {:?} away at {}", cube.identity(), hit.position);
            cube.move_away_from(
                own_position,
                other_position,
                Some(hit.position),
                &mut impulse,
            );
        }
    }
}

/// Point under `ray` on a tracked horizontal surface, or on the horizontal
/// plane at `height` when no surface is hit.
fn drag_point(ray: Ray3d, planes: &TrackedPlanes, height: f32) -> Option<Vec3> {
    planes
        .raycast(ray, PlaneAlignment::Horizontal)
        .map(|hit| hit.position)
        .or_else(|| {
            ray.intersect_plane(Vec3::Y * height, InfinitePlane3d { normal: Dir3::Y })
                .map(|distance| ray.get_point(distance))
        })
}

/// Dragging a cube slides it over the surface under the pointer. The body is
/// fixed while held and gets its previous mode back on release. A cube grabbed
/// while settling after a restart is released as dynamic.
pub fn handle_drags(
    mut commands: Commands,
    mut drags: MessageReader<ScreenDrag>,
    mut drag: ResMut<CubeDrag>,
    planes: Res<TrackedPlanes>,
    settling: Query<(), With<SettleTimer>>,
    mut cubes: Query<(Entity, &CubeEntity, &mut Transform, &mut RigidBody, &mut Velocity)>,
) {
    for event in drags.read() {
        match event.phase {
            DragPhase::Started => {
                if let Some(previous) = drag.grabbed.take() {
                    if let Ok((_, _, _, mut body, _)) = cubes.get_mut(previous.entity) {
                        *body = previous.previous_body;
                    }
                }
                let hits = hit_test(
                    event.ray,
                    cubes.iter().map(|(entity, cube, transform, _, _)| {
                        (entity, transform, cube.half_extents())
                    }),
                );
                let Some(hit) = hits.first() else {
                    continue;
                };
                let Ok((entity, cube, transform, mut body, mut velocity)) =
                    cubes.get_mut(hit.entity)
                else {
                    continue;
                };
                let Some(point) = drag_point(event.ray, &planes, transform.translation.y) else {
                    continue;
                };
                debug!("Dragging {:?}", cube.identity());
                let previous_body = if settling.contains(entity) {
                    commands.entity(entity).remove::<SettleTimer>();
                    RigidBody::Dynamic
                } else {
                    *body
                };
                drag.grabbed = Some(GrabbedCube {
                    entity,
                    previous_body,
                    offset: (transform.translation - point).with_y(0.0),
                });
                *body = RigidBody::Fixed;
                *velocity = Velocity::zero();
            }
            DragPhase::Moved => {
                let Some(grabbed) = drag.grabbed else {
                    continue;
                };
                let Ok((_, _, mut transform, _, _)) = cubes.get_mut(grabbed.entity) else {
                    drag.grabbed = None;
                    continue;
                };
                let height = transform.translation.y;
                if let Some(point) = drag_point(event.ray, &planes, height) {
                    transform.translation = (point + grabbed.offset).with_y(height);
                }
            }
            DragPhase::Ended => {
                let Some(grabbed) = drag.grabbed.take() else {
                    continue;
                };
                if let Ok((_, _, _, mut body, _)) = cubes.get_mut(grabbed.entity) {
                    *body = grabbed.previous_body;
                }
            }
        }
    }
}
