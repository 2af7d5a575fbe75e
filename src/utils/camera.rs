//! The device camera: a keyboard orbit standing in for a handheld device, and
//! the per-frame data the AR host derives from it (centre ray, taps, drags).
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::utils::ar_session::{ArFrame, ArHostSet, DragPhase, ScreenDrag, ScreenTap};
use crate::utils::constants::camera_3d_constants::{
    CAMERA_3D_INITIAL_Y, CAMERA_3D_MAX_RADIUS, CAMERA_3D_MIN_RADIUS, CAMERA_3D_SPEED_ROTATE,
    CAMERA_3D_SPEED_ZOOM,
};
use crate::utils::constants::gesture_constants::TAP_MAX_DISTANCE;
use crate::utils::objects::DeviceCamera;

pub struct DeviceCameraPlugin;

impl Plugin for DeviceCameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerState>()
            .add_systems(
                PreUpdate,
                (update_ar_frame, detect_pointer_gestures).in_set(ArHostSet::Frame),
            )
            .add_systems(Update, orbit_device_camera);
    }
}

/// Orbiting device camera
/// Walks around the origin with A/D and steps closer/further with W/S
pub fn orbit_device_camera(
    keyboard: Res<ButtonInput<KeyCode>>,
    timer: Res<Time>,
    mut camera_query: Query<&mut Transform, With<DeviceCamera>>,
) {
    let Ok(mut transform) = camera_query.single_mut() else {
        return;
    };

    let speed = CAMERA_3D_SPEED_ROTATE * timer.delta_secs();
    let zoom_speed = CAMERA_3D_SPEED_ZOOM * timer.delta_secs();

    let offset = transform.translation.xz();
    let mut yaw = offset.x.atan2(offset.y);
    let mut radius = offset.length();

    let left = keyboard.pressed(KeyCode::ArrowLeft) || keyboard.pressed(KeyCode::KeyA);
    let right = keyboard.pressed(KeyCode::ArrowRight) || keyboard.pressed(KeyCode::KeyD);
    let up = keyboard.pressed(KeyCode::ArrowUp) || keyboard.pressed(KeyCode::KeyW);
    let down = keyboard.pressed(KeyCode::ArrowDown) || keyboard.pressed(KeyCode::KeyS);

    if !(left || right || up || down) {
        return;
    }

    if left {
        yaw -= speed;
    }
    if right {
        yaw += speed;
    }
    if up {
        radius -= zoom_speed;
    }
    if down {
        radius += zoom_speed;
    }
    radius = radius.clamp(CAMERA_3D_MIN_RADIUS, CAMERA_3D_MAX_RADIUS);

    *transform = orbit_transform(yaw, radius);
}

/// Camera transform on the orbit, held at device height and looking at the origin
pub fn orbit_transform(yaw: f32, radius: f32) -> Transform {
    Transform::from_xyz(radius * yaw.sin(), CAMERA_3D_INITIAL_Y, radius * yaw.cos())
        .looking_at(Vec3::ZERO, Vec3::Y)
}

/// Publish the camera position and the ray through the viewport centre
fn update_ar_frame(
    mut frame: ResMut<ArFrame>,
    camera_query: Query<(&Camera, &GlobalTransform), With<DeviceCamera>>,
) {
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    frame.camera_position = camera_transform.translation();
    frame.center_ray = camera.logical_viewport_size().and_then(|size| {
        camera
            .viewport_to_world(camera_transform, size * 0.5)
            .ok()
    });
}

/// What the primary pointer did, in logical screen coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerGesture {
    Tap(Vec2),
    Drag(DragPhase, Vec2),
}

/// Tracks the primary mouse button or touch to tell taps from drags
#[derive(Resource, Debug, Default)]
pub struct PointerState {
    start_position: Option<Vec2>,
    current_position: Option<Vec2>,
    active_touch: Option<u64>,
    is_dragging: bool,
}

impl PointerState {
    pub fn is_pressed(&self) -> bool {
        self.start_position.is_some()
    }

    pub fn press(&mut self, position: Vec2, touch: Option<u64>) {
        self.start_position = Some(position);
        self.current_position = Some(position);
        self.active_touch = touch;
        self.is_dragging = false;
    }

    /// Follow the pointer. Leaving the tap radius starts a drag at the press position.
    pub fn move_to(&mut self, position: Vec2) -> Vec<PointerGesture> {
        let mut gestures = Vec::new();
        let Some(start) = self.start_position else {
            return gestures;
        };
        if self.current_position == Some(position) {
            return gestures;
        }
        self.current_position = Some(position);

        if !self.is_dragging {
            if position.distance(start) <= TAP_MAX_DISTANCE {
                return gestures;
            }
            self.is_dragging = true;
            gestures.push(PointerGesture::Drag(DragPhase::Started, start));
        }
        gestures.push(PointerGesture::Drag(DragPhase::Moved, position));
        gestures
    }

    /// A press that never left the tap radius is a tap, anything else ends the drag
    pub fn release(&mut self) -> Option<PointerGesture> {
        let start = self.start_position.take()?;
        let current = self.current_position.take().unwrap_or(start);
        self.active_touch = None;
        if std::mem::take(&mut self.is_dragging) {
            Some(PointerGesture::Drag(DragPhase::Ended, current))
        } else {
            Some(PointerGesture::Tap(start))
        }
    }
}

/// Turn clicks, touches and drags on the scene into world rays. Presses over
/// a button belong to the UI.
fn detect_pointer_gestures(
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<DeviceCamera>>,
    interactions: Query<&Interaction>,
    mut pointer: ResMut<PointerState>,
    mut taps: MessageWriter<ScreenTap>,
    mut drags: MessageWriter<ScreenDrag>,
) {
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let cursor = windows.single().ok().and_then(|w| w.cursor_position());

    if !pointer.is_pressed() && !interactions.iter().any(|i| *i != Interaction::None) {
        if let Some(touch) = touches.iter_just_pressed().next() {
            pointer.press(touch.position(), Some(touch.id()));
        } else if mouse.just_pressed(MouseButton::Left) {
            if let Some(cursor) = cursor {
                pointer.press(cursor, None);
            }
        }
    }
    if !pointer.is_pressed() {
        return;
    }

    let (still_pressed, current) = match pointer.active_touch {
        Some(id) => {
            let touch = touches.get_pressed(id);
            (touch.is_some(), touch.map(|touch| touch.position()))
        }
        None => {
            let pressed = mouse.pressed(MouseButton::Left);
            (pressed, cursor.filter(|_| pressed))
        }
    };

    let mut gestures = current
        .map(|position| pointer.move_to(position))
        .unwrap_or_default();
    if !still_pressed {
        gestures.extend(pointer.release());
    }

    for gesture in gestures {
        let position = match gesture {
            PointerGesture::Tap(position) | PointerGesture::Drag(_, position) => position,
        };
        let ray = match camera.viewport_to_world(camera_transform, position) {
            Ok(ray) => ray,
            Err(e) => {
                debug!("Pointer at {} has no world ray: {:?}", position, e);
                continue;
            }
        };
        match gesture {
            PointerGesture::Tap(_) => {
                taps.write(ScreenTap { ray });
            }
            PointerGesture::Drag(phase, _) => {
                drags.write(ScreenDrag { phase, ray });
            }
        }
    }
}
