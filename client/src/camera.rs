use bevy::{
    camera::Exposure,
    pbr::{AtmosphereMode, AtmosphereSettings},
    prelude::*,
};

use crate::{Run, avatar_view::AvatarView, convert};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
    app.add_systems(PostUpdate, follow_avatar.run_if(resource_exists::<Run>));
}

/// Offset in the avatar's heading frame: above and behind.
const CAMERA_OFFSET_LOCAL: Vec3 = Vec3::new(0.0, 6.0, -9.0);
/// Point the camera looks at, ahead of the avatar.
const LOOK_AHEAD: Vec3 = Vec3::new(0.0, 1.0, 6.0);
const CAMERA_DECAY_RATE: f32 = 6.0;

fn add_camera(mut commands: Commands) {
    commands.spawn((
        Exposure { ev100: 16.0 },
        bevy::core_pipeline::tonemapping::Tonemapping::AcesFitted,
        Camera3d::default(),
        Transform::from_translation(CAMERA_OFFSET_LOCAL).looking_at(LOOK_AHEAD, Vec3::Y),
        DistanceFog {
            color: Color::srgba(0.35, 0.48, 0.66, 1.0),
            directional_light_color: Color::srgba(1.0, 0.95, 0.85, 0.5),
            directional_light_exponent: 30.0,
            falloff: FogFalloff::from_visibility_colors(
                120.0, // Fog distance
                Color::srgb(0.35, 0.5, 0.66),
                Color::srgb(0.8, 0.8, 0.7),
            ),
        },
        AtmosphereSettings {
            rendering_method: AtmosphereMode::Raymarched,
            ..default()
        },
    ));
}

fn follow_avatar(
    mut camera: Single<&mut Transform, With<Camera3d>>,
    avatar: Single<&Transform, (With<AvatarView>, Without<Camera3d>)>,
    run: Res<Run>,
    time: Res<Time>,
) {
    let facing = convert::heading_rotation(run.0.avatar().state().heading);
    let target = avatar.translation + facing * CAMERA_OFFSET_LOCAL;
    let dt = time.delta_secs();

    camera.translation.smooth_nudge(&target, CAMERA_DECAY_RATE, dt);
    let look = camera.looking_at(avatar.translation + facing * LOOK_AHEAD, Vec3::Y);
    camera.rotation = camera.rotation.slerp(look.rotation, 1.0 - (-CAMERA_DECAY_RATE * dt).exp());
}
