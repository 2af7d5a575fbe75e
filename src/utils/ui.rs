//! Views: overlay controls rendered from `UiState`, buttons emit `ArAction`.
use bevy::prelude::*;

use crate::utils::objects::{ArAction, SessionPhase, UIEntity, UiState};

/// Every control of the overlay
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiControl {
    Start,
    Debug,
    Reset,
    PlaceCubes,
    RestartCubes,
    ScanMoreHint,
    NoSurfaceWarning,
}

/// Text child of a control
#[derive(Component, Clone, Copy, Debug)]
pub struct UiLabel(pub UiControl);

impl UiControl {
    pub fn is_visible(self, ui: &UiState) -> bool {
        let phase = ui.phase();
        match self {
            UiControl::Start => phase == SessionPhase::NotStarted,
            UiControl::Debug | UiControl::Reset => phase != SessionPhase::NotStarted,
            UiControl::PlaceCubes => phase == SessionPhase::ReadyToPlace,
            UiControl::RestartCubes => phase == SessionPhase::BlocksPlaced,
            UiControl::ScanMoreHint => phase == SessionPhase::AwaitingEnoughSurface,
            UiControl::NoSurfaceWarning => ui.show_no_surface_warning,
        }
    }

    /// Action sent when the control is pressed, `None` for plain messages
    pub fn action(self, ui: &UiState) -> Option<ArAction> {
        match self {
            UiControl::Start => Some(ArAction::Start),
            UiControl::Debug => Some(ArAction::SetDebug {
                enabled: !ui.debug_enabled,
            }),
            UiControl::Reset => Some(ArAction::Reset),
            UiControl::PlaceCubes => Some(ArAction::PlaceBlocks),
            UiControl::RestartCubes => Some(ArAction::RestartBlocks),
            UiControl::ScanMoreHint | UiControl::NoSurfaceWarning => None,
        }
    }

    pub fn label(self, ui: &UiState) -> &'static str {
        match self {
            UiControl::Start => "Start",
            UiControl::Debug if ui.debug_enabled => "Hide debug",
            UiControl::Debug => "Show debug",
            UiControl::Reset => "Reset",
            UiControl::PlaceCubes => "Place Cubes",
            UiControl::RestartCubes => "Restart Cubes",
            UiControl::ScanMoreHint => "Scan more to get the surface.",
            UiControl::NoSurfaceWarning => "Surface too small to place cubes.",
        }
    }
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_ui)
            .add_systems(Update, (handle_ui_buttons, refresh_ui).chain());
    }
}

const BUTTON_COLOR: Color = Color::srgba(0.1, 0.1, 0.1, 0.6);
const BUTTON_HOVER_COLOR: Color = Color::srgba(0.25, 0.25, 0.25, 0.8);
const MESSAGE_COLOR: Color = Color::srgba(0.0, 0.0, 0.0, 0.5);

fn overlay_row(justify_content: JustifyContent, align_self: AlignSelf) -> Node {
    Node {
        width: Val::Percent(100.0),
        flex_direction: FlexDirection::Row,
        justify_content,
        align_items: AlignItems::Center,
        align_self,
        padding: UiRect::all(Val::Px(16.0)),
        column_gap: Val::Px(12.0),
        ..default()
    }
}

fn spawn_control(parent: &mut ChildSpawnerCommands, control: UiControl, ui: &UiState) {
    let node = Node {
        padding: UiRect::all(Val::Px(8.0)),
        display: if control.is_visible(ui) {
            Display::Flex
        } else {
            Display::None
        },
        ..default()
    };
    let label = (
        Text::new(control.label(ui)),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        UiLabel(control),
    );

    if control.action(ui).is_some() {
        parent
            .spawn((
                Button,
                node,
                BackgroundColor(BUTTON_COLOR),
                control,
            ))
            .with_children(|button| {
                button.spawn(label);
            });
    } else {
        parent
            .spawn((node, BackgroundColor(MESSAGE_COLOR), control))
            .with_children(|message| {
                message.spawn(label);
            });
    }
}

/// Top bar (debug, reset), centre (start, warning), bottom (placement)
pub fn spawn_ui(mut commands: Commands, ui: Res<UiState>) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::SpaceBetween,
                ..default()
            },
            UIEntity,
        ))
        .with_children(|root| {
            root.spawn(overlay_row(JustifyContent::SpaceBetween, AlignSelf::FlexStart))
                .with_children(|top| {
                    spawn_control(top, UiControl::Debug, &ui);
                    spawn_control(top, UiControl::Reset, &ui);
                });
            root.spawn(overlay_row(JustifyContent::Center, AlignSelf::Center))
                .with_children(|center| {
                    spawn_control(center, UiControl::Start, &ui);
                    spawn_control(center, UiControl::NoSurfaceWarning, &ui);
                });
            root.spawn(overlay_row(JustifyContent::Center, AlignSelf::FlexEnd))
                .with_children(|bottom| {
                    spawn_control(bottom, UiControl::PlaceCubes, &ui);
                    spawn_control(bottom, UiControl::RestartCubes, &ui);
                    spawn_control(bottom, UiControl::ScanMoreHint, &ui);
                });
        });
}

pub fn handle_ui_buttons(
    ui: Res<UiState>,
    mut buttons: Query<
        (&Interaction, &UiControl, &mut BackgroundColor),
        (Changed<Interaction>, With<Button>),
    >,
    mut actions: MessageWriter<ArAction>,
) {
    for (interaction, control, mut background) in &mut buttons {
        match interaction {
            Interaction::Pressed => {
                if let Some(action) = control.action(&ui) {
                    actions.write(action);
                }
            }
            Interaction::Hovered => background.0 = BUTTON_HOVER_COLOR,
            Interaction::None => background.0 = BUTTON_COLOR,
        }
    }
}

/// Re-render controls when the flags change
pub fn refresh_ui(
    ui: Res<UiState>,
    mut controls: Query<(&UiControl, &mut Node)>,
    mut labels: Query<(&UiLabel, &mut Text)>,
) {
    if !ui.is_changed() {
        return;
    }
    for (control, mut node) in &mut controls {
        node.display = if control.is_visible(&ui) {
            Display::Flex
        } else {
            Display::None
        };
    }
    for (label, mut text) in &mut labels {
        let value = label.0.label(&ui);
        if text.0 != value {
            text.0 = value.to_string();
        }
    }
}
