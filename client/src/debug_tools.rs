//! Debug/performance tooling for native dev builds.
//!
//! This plugin is compiled/used only when the caller gates it behind `dev_native`
//! (recommended: `#[cfg(feature = "dev_native")] mod debug_tools;` in `main.rs`).

use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin, SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;
use bevy::render::diagnostic::RenderDiagnosticsPlugin;
use iyes_perf_ui::prelude::*;

use crate::{Run, convert};

/// Add debug/perf tooling (intended for `dev_native` builds only).
pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        SystemInformationDiagnosticsPlugin::default(),
        RenderDiagnosticsPlugin,
        PerfUiPlugin,
    ));

    app.add_systems(Startup, spawn_perf_ui);
    app.add_systems(Update, draw_probes.run_if(resource_exists::<Run>));
}

fn spawn_perf_ui(mut commands: Commands) {
    commands.spawn(PerfUiAllEntries::default());
}

/// Ground probes, the turn query ball and the pivot of the closing turn.
fn draw_probes(mut gizmos: Gizmos, run: Res<Run>) {
    let avatar = run.0.avatar();
    let config = avatar.config();
    let state = avatar.state();

    let forward = convert::vec3(&state.heading.vector()) * config.probe_offset;
    let lift = Vec3::Y * config.probe_lift;
    let base = convert::vec3(&state.position);
    let color = if state.grounded {
        Color::srgb(0.2, 1.0, 0.3)
    } else {
        Color::srgb(1.0, 0.3, 0.2)
    };
    for origin in [base + lift + forward, base + lift - forward] {
        gizmos.line(origin, origin - Vec3::Y * config.ground_probe_length, color);
    }

    gizmos.sphere(
        convert::vec3(&avatar.envelope_center()),
        config.turn_query_radius,
        Color::srgb(0.9, 0.9, 0.2),
    );

    if let Some(turn) = run.0.track().newest_segment() {
        gizmos.sphere(convert::vec3(&turn.pivot()), 0.25, Color::srgb(0.3, 0.5, 1.0));
    }
}
