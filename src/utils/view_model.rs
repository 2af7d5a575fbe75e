//! View-model: the published UI flags plus the self-clearing warning.
use bevy::prelude::*;

use crate::utils::objects::UiState;

/// Timer hiding the "surface too small" message
#[derive(Resource, Debug, Default)]
pub struct NoSurfaceWarning {
    timer: Option<Timer>,
}

impl NoSurfaceWarning {
    pub fn is_pending(&self) -> bool {
        self.timer.is_some()
    }
}

/// Show the message for `duration` seconds. Showing it again restarts the countdown.
pub fn show_no_surface_warning(ui: &mut UiState, warning: &mut NoSurfaceWarning, duration: f32) {
    ui.show_no_surface_warning = true;
    warning.timer = Some(Timer::from_seconds(duration, TimerMode::Once));
}

pub fn clear_no_surface_warning(
    time: Res<Time>,
    mut ui: ResMut<UiState>,
    mut warning: ResMut<NoSurfaceWarning>,
) {
    let Some(timer) = warning.timer.as_mut() else {
        return;
    };
    timer.tick(time.delta());
    if timer.just_finished() {
        warning.timer = None;
        ui.show_no_surface_warning = false;
    }
}
