use bevy::prelude::*;
use runner::Mode;

use crate::{Run, convert};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_avatar.run_if(resource_exists::<Run>));
    app.add_systems(Update, follow_simulation.run_if(resource_exists::<Run>));
}

/// Rendered stand-in for the simulated avatar.
#[derive(Component)]
pub struct AvatarView;

/// Beyond this gap the view snaps instead of smoothing (turns, restarts).
const SNAP_DISTANCE: f32 = 2.0;

fn spawn_avatar(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    run: Res<Run>,
) {
    let config = run.0.avatar().config();
    let radius = config.envelope_width * 0.5;
    let half_length = (config.height * 0.5 - radius).max(0.0);

    commands
        .spawn((
            Name::new("Avatar"),
            AvatarView,
            Mesh3d(meshes.add(Mesh::from(Capsule3d {
                radius,
                half_length,
            }))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::linear_rgb(0.2, 0.9, 0.8),
                ..default()
            })),
            Transform::from_translation(Vec3::Y * config.height * 0.5),
        ))
        .with_children(|parent| {
            let eye_mesh = meshes.add(Mesh::from(Sphere { radius: 0.12 }));
            let eye_mat = materials.add(StandardMaterial {
                base_color: Color::srgb(1.0, 1.0, 1.0),
                ..default()
            });

            // The simulation faces +Z at zero yaw.
            let x = 0.18;
            let y = half_length;
            let z = radius;

            parent.spawn((
                Name::new("LeftEye"),
                Mesh3d(eye_mesh.clone()),
                MeshMaterial3d(eye_mat.clone()),
                Transform::from_translation(Vec3::new(x, y, z)),
            ));
            parent.spawn((
                Name::new("RightEye"),
                Mesh3d(eye_mesh),
                MeshMaterial3d(eye_mat),
                Transform::from_translation(Vec3::new(-x, y, z)),
            ));
        });
}

/// Ease the rendered avatar toward the latest fixed-step state.
fn follow_simulation(
    time: Res<Time>,
    run: Res<Run>,
    mut avatar: Single<&mut Transform, With<AvatarView>>,
) {
    let dt = time.delta_secs();
    let sim = run.0.avatar();
    let state = sim.state();

    let target = convert::vec3(&sim.envelope_center());
    let rotation = convert::heading_rotation(state.heading);

    if avatar.translation.distance(target) > SNAP_DISTANCE {
        avatar.translation = target;
        avatar.rotation = rotation;
    } else {
        avatar.translation.smooth_nudge(&target, 12.0, dt);
        avatar.rotation = avatar.rotation.slerp(rotation, 1.0 - (-24.0 * dt).exp());
    }

    let squash = if state.mode == Mode::Sliding { 0.5 } else { 1.0 };
    avatar.scale = Vec3::new(1.0, squash, 1.0);
}
