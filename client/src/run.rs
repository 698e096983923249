//! Drives the simulation from Bevy's fixed timestep and forwards its events as messages.

use bevy::prelude::*;
use runner::{RunCoordinator, RunEvent, RunnerConfig, RunnerError, SegmentCatalog};

use crate::input::PendingInput;

/// Optional overrides read from the working directory at startup.
const CONFIG_PATH: &str = "runner.json";
const CATALOG_PATH: &str = "catalog.json";

#[derive(Resource)]
pub struct Run(pub RunCoordinator);

/// One simulation event, re-emitted for presentation systems.
#[derive(Message, Clone, Copy, Debug)]
pub struct RunMessage(pub RunEvent);

pub(super) fn plugin(app: &mut App) {
    app.add_message::<RunMessage>();

    match start_run() {
        Ok(run) => {
            app.insert_resource(Run(run));
        }
        Err(err) => {
            error!("cannot start run: {err}");
            app.add_systems(Startup, |mut exit: MessageWriter<AppExit>| {
                exit.write(AppExit::error());
            });
        }
    }

    app.add_systems(
        FixedUpdate,
        (tick_run, collect_touching)
            .chain()
            .run_if(resource_exists::<Run>),
    );
}

fn start_run() -> Result<RunCoordinator, RunnerError> {
    let config = match std::fs::read_to_string(CONFIG_PATH) {
        Ok(text) => RunnerConfig::from_json(&text)?,
        Err(_) => RunnerConfig::default(),
    };
    let catalog = match std::fs::read_to_string(CATALOG_PATH) {
        Ok(text) => SegmentCatalog::from_json(&text)?,
        Err(_) => SegmentCatalog::default(),
    };
    RunCoordinator::new(config, catalog)
}

fn tick_run(
    time: Res<Time>,
    mut run: ResMut<Run>,
    mut pending: ResMut<PendingInput>,
    mut messages: MessageWriter<RunMessage>,
) {
    let frame = pending.take();
    for event in run.0.tick(time.delta_secs(), &frame) {
        messages.write(RunMessage(event));
    }
}

/// Pickup collaborator: whatever coin the avatar overlaps is collected.
fn collect_touching(mut run: ResMut<Run>) {
    for id in run.0.collectibles_touching_avatar() {
        run.0.collect(id);
    }
}
