//! Declaration of the modules of ar_blocks.

/// Plugin bundles used by the binary
pub mod plugins {
    pub mod app_plugin;
}

/// AR host layer, entities, session view and views
pub mod utils {
    pub mod ar_session;
    pub mod camera;
    pub mod config;
    pub mod constants;
    pub mod crosshair;
    pub mod cube;
    pub mod debug_functions;
    pub mod errors;
    pub mod objects;
    pub mod physics;
    pub mod session_view;
    pub mod setup;
    pub mod surface;
    pub mod tracker;
    pub mod ui;
    pub mod view_model;
}
