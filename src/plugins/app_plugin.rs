use std::path::Path;

use bevy::prelude::*;

use crate::utils::camera::DeviceCameraPlugin;
use crate::utils::config::{ArConfig, CONFIG_FILE_NAME};
use crate::utils::debug_functions::DebugFunctionsPlugin;
use crate::utils::session_view::ArBlocksPlugin;
use crate::utils::setup::SetupPlugin;
use crate::utils::tracker::SimulatedTrackerPlugin;
use crate::utils::ui::UiPlugin;

/// Session logic plus the desktop host: simulated tracking, device camera,
/// scene, overlay UI and debug drawing. Reads `ar_blocks.toml` unless a
/// configuration was inserted beforehand.
pub struct ArAppPlugin;

impl Plugin for ArAppPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<ArConfig>() {
            app.insert_resource(ArConfig::load_or_default(Path::new(CONFIG_FILE_NAME)));
        }
        app.add_plugins((
            ArBlocksPlugin,
            SimulatedTrackerPlugin,
            DeviceCameraPlugin,
            SetupPlugin,
            UiPlugin,
            DebugFunctionsPlugin,
        ));
    }
}
