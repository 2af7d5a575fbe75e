//! Start-up for ar_blocks, with window, plugins and configuration.
use bevy::{
    diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin},
    prelude::*,
    window::*,
};

use ar_blocks::plugins::app_plugin::ArAppPlugin;

/// Entry point for the application
fn main() {
    let window = Some(Window {
        title: "AR Blocks".into(),
        fit_canvas_to_parent: true,
        prevent_default_event_handling: true,
        present_mode: PresentMode::AutoVsync,
        ..default()
    });

    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: window,
                ..default()
            }),
            LogDiagnosticsPlugin::default(),
            FrameTimeDiagnosticsPlugin::default(),
            ArAppPlugin,
        ))
        .run();
}
