//! This file defines the various objects, resources, and components used in the app.
use bevy::prelude::*;

use crate::utils::constants::cube_constants::{CUBE_ONE_ASSET, CUBE_TWO_ASSET};

/// User actions emitted by the UI and consumed by the session view, in emission order.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArAction {
    Start,
    Reset,
    SetDebug { enabled: bool },
    PlaceBlocks,
    RestartBlocks,
}

/// The two cubes, each backed by its own model asset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeIdentity {
    CubeOne,
    CubeTwo,
}

impl CubeIdentity {
    pub const ALL: [CubeIdentity; 2] = [CubeIdentity::CubeOne, CubeIdentity::CubeTwo];

    pub fn asset_path(self) -> &'static str {
        match self {
            CubeIdentity::CubeOne => CUBE_ONE_ASSET,
            CubeIdentity::CubeTwo => CUBE_TWO_ASSET,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CubeIdentity::CubeOne => "cube1",
            CubeIdentity::CubeTwo => "cube2",
        }
    }
}

/// Flags published to the UI. Written by the session view, read by the views.
#[derive(Resource, Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    pub debug_enabled: bool,
    pub session_started: bool,
    pub plane_found: bool,
    pub enough_surface_scanned: bool,
    pub blocks_placed: bool,
    pub show_no_surface_warning: bool,
}

/// Session phase as seen by the UI
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Scanning,
    AwaitingEnoughSurface,
    ReadyToPlace,
    BlocksPlaced,
}

impl UiState {
    pub fn phase(&self) -> SessionPhase {
        if !self.session_started {
            SessionPhase::NotStarted
        } else if !self.plane_found {
            SessionPhase::Scanning
        } else if !self.enough_surface_scanned {
            SessionPhase::AwaitingEnoughSurface
        } else if !self.blocks_placed {
            SessionPhase::ReadyToPlace
        } else {
            SessionPhase::BlocksPlaced
        }
    }
}

/// Handles to the cubes owned by the session view
#[derive(Resource, Default, Debug)]
pub struct PlacedCubes {
    pub cube_one: Option<Entity>,
    pub cube_two: Option<Entity>,
}

impl PlacedCubes {
    pub fn both(&self) -> Option<(Entity, Entity)> {
        Some((self.cube_one?, self.cube_two?))
    }

    pub fn any(&self) -> bool {
        self.cube_one.is_some() || self.cube_two.is_some()
    }

    pub fn clear(&mut self) {
        self.cube_one = None;
        self.cube_two = None;
    }
}

/// A component that marks an entity as attached to the AR scene, which is cleared on reset
#[derive(Component)]
pub struct SceneAnchored;

/// A component that marks an entity as a UI entity
#[derive(Component)]
pub struct UIEntity;

/// A component that marks the device camera
#[derive(Component)]
pub struct DeviceCamera;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_follows_flag_order() {
        let mut ui = UiState::default();
        assert_eq!(ui.phase(), SessionPhase::NotStarted);

        ui.session_started = true;
        assert_eq!(ui.phase(), SessionPhase::Scanning);

        ui.plane_found = true;
        assert_eq!(ui.phase(), SessionPhase::AwaitingEnoughSurface);

        ui.enough_surface_scanned = true;
        assert_eq!(ui.phase(), SessionPhase::ReadyToPlace);

        ui.blocks_placed = true;
        assert_eq!(ui.phase(), SessionPhase::BlocksPlaced);
    }

    #[test]
    fn placed_cubes_needs_both() {
        let mut cubes = PlacedCubes::default();
        assert!(cubes.both().is_none());
        let mut world = World::new();
        cubes.cube_one = Some(world.spawn_empty().id());
        assert!(cubes.any());
        assert!(cubes.both().is_none());
        cubes.clear();
        assert!(!cubes.any());
    }
}
