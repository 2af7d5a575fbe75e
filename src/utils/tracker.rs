//! Simulated world tracking for desktop runs.
//!
//! While the session runs it reports a floor and a ceiling plane, then keeps
//! adding mesh anchors around the point the camera looks at, as a device would
//! while the user sweeps it over a surface.
use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use crate::utils::ar_session::{
    AnchorEvent, AnchorId, ArAnchor, ArFrame, ArHostSet, ArSession, CoachingOverlay,
    PlaneAlignment, PlaneClassification, TrackedPlanes,
};
use crate::utils::config::{ArConfig, TrackerConfig};

/// State of the simulated tracker
#[derive(Resource)]
pub struct SimulatedTracker {
    pub random_gen: ChaCha8Rng,
    scan_timer: Timer,
    next_id: u64,
    floor: Option<AnchorId>,
    ceiling: Option<AnchorId>,
    mesh_anchors: usize,
    generation: u32,
}

impl SimulatedTracker {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            random_gen: ChaCha8Rng::seed_from_u64(config.seed),
            scan_timer: Timer::from_seconds(config.scan_interval, TimerMode::Repeating),
            next_id: 0,
            floor: None,
            ceiling: None,
            mesh_anchors: 0,
            generation: 0,
        }
    }

    fn next_anchor_id(&mut self) -> AnchorId {
        self.next_id += 1;
        AnchorId(self.next_id)
    }

    /// Forget everything reported so far
    pub fn reset(&mut self) {
        self.floor = None;
        self.ceiling = None;
        self.mesh_anchors = 0;
        self.scan_timer.reset();
    }

    pub fn mesh_anchors(&self) -> usize {
        self.mesh_anchors
    }

    /// One scan step: the anchors to report as added and as updated.
    pub fn scan(
        &mut self,
        config: &TrackerConfig,
        look_at: Option<Vec3>,
    ) -> (Vec<ArAnchor>, Vec<ArAnchor>) {
        let mut added = Vec::new();
        let mut updated = Vec::new();
        let extent = Vec2::splat(config.plane_half_extent);

        let floor_center = Vec3::new(0.0, config.floor_height, 0.0);
        match self.floor {
            Some(id) => updated.push(ArAnchor::horizontal_plane(
                id,
                floor_center,
                extent,
                PlaneClassification::Floor,
            )),
            None => {
                let id = self.next_anchor_id();
                self.floor = Some(id);
                added.push(ArAnchor::horizontal_plane(
                    id,
                    floor_center,
                    extent,
                    PlaneClassification::Floor,
                ));
            }
        }

        let ceiling_center = Vec3::new(0.0, config.ceiling_height, 0.0);
        match self.ceiling {
            Some(id) => updated.push(ArAnchor::horizontal_plane(
                id,
                ceiling_center,
                extent,
                PlaneClassification::Ceiling,
            )),
            None => {
                let id = self.next_anchor_id();
                self.ceiling = Some(id);
                added.push(ArAnchor::horizontal_plane(
                    id,
                    ceiling_center,
                    extent,
                    PlaneClassification::Ceiling,
                ));
            }
        }

        // Mesh chunks only appear where the camera is looking at the floor
        if let Some(look_at) = look_at {
            if self.mesh_anchors < config.max_mesh_anchors {
                let angle = self.random_gen.random_range(0.0..std::f32::consts::TAU);
                let radius = self.random_gen.random_range(0.0..config.scan_radius);
                let position = Vec3::new(
                    look_at.x + radius * angle.cos(),
                    config.floor_height,
                    look_at.z + radius * angle.sin(),
                );
                let id = self.next_anchor_id();
                self.mesh_anchors += 1;
                added.push(ArAnchor::mesh(id, position));
            }
        }

        (added, updated)
    }
}

/// Plugin producing anchors on desktop
pub struct SimulatedTrackerPlugin;

impl Plugin for SimulatedTrackerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, init_tracker)
            .add_systems(PreUpdate, simulate_tracking.in_set(ArHostSet::Tracking));
    }
}

fn init_tracker(mut commands: Commands, config: Option<Res<ArConfig>>) {
    let tracker = match config {
        Some(config) => SimulatedTracker::from_config(&config.tracker),
        None => SimulatedTracker::from_config(&TrackerConfig::default()),
    };
    commands.insert_resource(tracker);
}

/// Emit anchor callbacks while the session runs
fn simulate_tracking(
    time: Res<Time>,
    config: Res<ArConfig>,
    session: Res<ArSession>,
    frame: Res<ArFrame>,
    planes: Res<TrackedPlanes>,
    tracker: Option<ResMut<SimulatedTracker>>,
    mut coaching: ResMut<CoachingOverlay>,
    mut anchor_events: MessageWriter<AnchorEvent>,
) {
    let Some(mut tracker) = tracker else { return };
    if !session.is_running() {
        return;
    }
    if tracker.generation != session.generation() {
        info!("Scene reconstruction reset, dropping simulated anchors");
        tracker.reset();
        tracker.generation = session.generation();
    }

    tracker.scan_timer.tick(time.delta());
    if !tracker.scan_timer.just_finished() {
        return;
    }

    let look_at = frame
        .center_ray
        .and_then(|ray| planes.raycast(ray, PlaneAlignment::Horizontal))
        .map(|hit| hit.position);
    let (added, updated) = tracker.scan(&config.tracker, look_at);

    if !added.is_empty() {
        debug!("Tracker added {} anchors", added.len());
        anchor_events.write(AnchorEvent::Added(added));
    }
    if !updated.is_empty() {
        // A plane is being tracked, the coaching overlay has done its job
        if coaching.active {
            coaching.active = false;
        }
        anchor_events.write(AnchorEvent::Updated(updated));
    }
}
