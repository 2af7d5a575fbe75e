// Constants used in the app, structured into modules.

/// Cube entities
pub mod cube_constants {
    // Uniform scale applied to the loaded cube models.
    pub const CUBE_SCALE: f32 = 0.4;
    // Mass of a cube physics body.
    pub const CUBE_MASS: f32 = 1.0;
    // Multiplier applied to the X/Z distance when pushing or pulling a cube.
    pub const CUBE_MAX_FORCE: f32 = 5.0;

    pub const CUBE_ONE_ASSET: &str = "models/cube1.gltf";
    pub const CUBE_TWO_ASSET: &str = "models/cube2.gltf";
}

/// Cube placement
pub mod placement_constants {
    // A candidate position needs a surface sample at most this far away.
    pub const PLACEMENT_CUTOFF_DISTANCE: f32 = 1.0;
    // Z offset of the second cube so both cubes are not coincident.
    pub const SECOND_CUBE_Z_OFFSET: f32 = -1.0;
}

/// Crosshair reticle
pub mod crosshair_constants {
    pub const CROSSHAIR_SIZE: f32 = 0.2;
    pub const CROSSHAIR_TEXTURE: &str = "textures/crosshair.png";
    // Distance the reticle is pulled toward the camera from the raycast hit.
    pub const CROSSHAIR_CAMERA_OFFSET: f32 = 0.1;
    // Duration of the move to a new hit position (seconds).
    pub const CROSSHAIR_MOVE_DURATION: f32 = 0.1;
}

/// Delayed callbacks
pub mod timing_constants {
    // Delay before a restarted cube goes back to dynamic physics (seconds).
    pub const CUBE_SETTLE_DELAY: f32 = 0.1;
    // How long the "surface too small" message stays on screen (seconds).
    pub const NO_SURFACE_WARNING_DURATION: f32 = 1.0;
}

/// 3D camera (the handheld device)
pub mod camera_3d_constants {
    pub const CAMERA_3D_INITIAL_Y: f32 = 1.4;
    pub const CAMERA_3D_INITIAL_RADIUS: f32 = 1.6;

    pub const CAMERA_3D_SPEED_ROTATE: f32 = 1.2; // rad/s
    pub const CAMERA_3D_SPEED_ZOOM: f32 = 1.0; // units/s

    // Radius range for the camera's orbit.
    pub const CAMERA_3D_MIN_RADIUS: f32 = 0.6;
    pub const CAMERA_3D_MAX_RADIUS: f32 = 4.0;
}

/// Simulated tracker of the desktop AR host
pub mod tracker_constants {
    // Seed for the random number generator.
    pub const TRACKER_SEED: u64 = 69;
    // Seconds between two tracking updates.
    pub const TRACKER_SCAN_INTERVAL: f32 = 0.25;
    // Number of mesh anchors reported before the scan saturates.
    pub const TRACKER_MAX_MESH_ANCHORS: usize = 64;
    // Mesh anchors are scattered within this radius around the looked-at point.
    pub const TRACKER_SCAN_RADIUS: f32 = 0.8;
    // Height of the simulated floor and ceiling.
    pub const FLOOR_HEIGHT: f32 = 0.0;
    pub const CEILING_HEIGHT: f32 = 2.6;
    // Half size of the reported planes.
    pub const PLANE_HALF_EXTENT: f32 = 3.0;
}

/// Rigid-body step
pub mod physics_constants {
    pub const PHYSICS_RATE_HZ: f64 = 60.0; // Hz
    pub const GRAVITY: f32 = -9.81;
    // Friction coefficient of cubes and tracked surfaces.
    pub const FRICTION: f32 = 0.8;
    pub const LINEAR_DAMPING: f32 = 0.1;
    pub const ANGULAR_DAMPING: f32 = 1.0;
    // Thickness of the slab collider placed under a tracked plane.
    pub const PLANE_COLLIDER_THICKNESS: f32 = 0.05;
}

/// Pointer gestures on the view
pub mod gesture_constants {
    // A press that moves further than this (logical pixels) becomes a drag.
    pub const TAP_MAX_DISTANCE: f32 = 8.0;
}
