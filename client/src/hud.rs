//! Live score readout, the game-over banner and restart.

use bevy::prelude::*;
use leafwing_input_manager::prelude::ActionState;
use runner::RunEvent;

use crate::{Run, RunMessage, input::RunnerAction};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_hud);
    app.add_systems(
        Update,
        (on_run_messages, update_distance, restart_on_request).run_if(resource_exists::<Run>),
    );
}

#[derive(Component)]
struct ScoreText;

#[derive(Component)]
struct DistanceText;

#[derive(Component)]
struct GameOverBanner;

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            flex_direction: FlexDirection::Column,
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                ScoreText,
                Text::new("Score: 0"),
                TextFont {
                    font_size: 28.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
            parent.spawn((
                DistanceText,
                Text::new("0 m"),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::srgb(0.85, 0.85, 0.85)),
            ));
        });

    commands.spawn((
        GameOverBanner,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            top: Val::Percent(40.0),
            justify_content: JustifyContent::Center,
            ..default()
        },
        Text::new(""),
        TextFont {
            font_size: 40.0,
            ..default()
        },
        TextColor(Color::srgb(1.0, 0.4, 0.3)),
        TextLayout::new_with_justify(Justify::Center),
        Visibility::Hidden,
    ));
}

fn on_run_messages(
    mut messages: MessageReader<RunMessage>,
    mut score: Single<&mut Text, (With<ScoreText>, Without<GameOverBanner>)>,
    mut banner: Single<(&mut Text, &mut Visibility), With<GameOverBanner>>,
) {
    for RunMessage(event) in messages.read() {
        match event {
            RunEvent::ScoreChanged { score: value } => {
                score.0 = format!("Score: {value}");
                if *value == 0 {
                    *banner.1 = Visibility::Hidden;
                }
            }
            RunEvent::GameOver { final_score, cause } => {
                banner.0.0 = format!("Game over ({cause:?})\nScore: {final_score}\nPress R to restart");
                *banner.1 = Visibility::Visible;
            }
            RunEvent::TurnCommitted { heading } => debug!("now heading {heading:?}"),
            RunEvent::ModeEntered(mode) => debug!("avatar entered {mode:?}"),
        }
    }
}

fn update_distance(run: Res<Run>, mut text: Single<&mut Text, With<DistanceText>>) {
    text.0 = format!("{:.0} m", run.0.distance());
}

fn restart_on_request(actions: Res<ActionState<RunnerAction>>, mut run: ResMut<Run>) {
    if !actions.just_pressed(&RunnerAction::Restart) || !run.0.is_game_over() {
        return;
    }
    if let Err(err) = run.0.restart() {
        error!("restart failed: {err}");
    }
}
