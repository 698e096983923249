//! Mirrors the live track ledger as meshes.
//!
//! Entities are keyed by ledger id. Ids restart with every run, so the whole view is
//! dropped whenever the run's seed changes.

use bevy::{
    platform::collections::{HashMap, HashSet},
    prelude::*,
};
use runner::SegmentClass;
use shared::LedgerId;

use crate::{Run, convert};

/// Coins turn a quarter revolution per second.
const COIN_SPIN_RATE: f32 = std::f32::consts::FRAC_PI_2;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<TrackView>();
    app.add_systems(Startup, load_materials);
    app.add_systems(
        Update,
        (sync_track, spin_coins).run_if(resource_exists::<Run>),
    );
}

#[derive(Resource, Default)]
struct TrackView {
    seed: Option<u64>,
    entities: HashMap<LedgerId, Entity>,
}

#[derive(Resource)]
struct TrackMaterials {
    straight: Handle<StandardMaterial>,
    turn: Handle<StandardMaterial>,
    obstacle: Handle<StandardMaterial>,
    coin: Handle<StandardMaterial>,
}

#[derive(Component)]
pub struct Coin;

fn load_materials(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    commands.insert_resource(TrackMaterials {
        straight: materials.add(StandardMaterial {
            base_color: Color::linear_rgb(0.2, 0.3, 0.25),
            perceptual_roughness: 1.0,
            metallic: 0.0,
            ..default()
        }),
        turn: materials.add(Color::srgb_u8(124, 144, 255)),
        obstacle: materials.add(Color::srgb(0.85, 0.25, 0.2)),
        coin: materials.add(StandardMaterial {
            base_color: Color::srgb(1.0, 0.8, 0.2),
            metallic: 0.9,
            perceptual_roughness: 0.3,
            ..default()
        }),
    });
}

fn sync_track(
    mut commands: Commands,
    mut view: ResMut<TrackView>,
    mut meshes: ResMut<Assets<Mesh>>,
    materials: Option<Res<TrackMaterials>>,
    run: Res<Run>,
) {
    let Some(materials) = materials else {
        return;
    };
    let run = &run.0;

    if view.seed != Some(run.seed()) {
        for (_, entity) in view.entities.drain() {
            commands.entity(entity).despawn();
        }
        view.seed = Some(run.seed());
    }

    let track = run.track();
    let live: HashSet<LedgerId> = track
        .segments()
        .map(|s| s.id)
        .chain(track.obstacles().iter().map(|o| o.id))
        .chain(track.collectibles().iter().map(|c| c.id))
        .collect();

    view.entities.retain(|id, entity| {
        let keep = live.contains(id);
        if !keep {
            commands.entity(*entity).despawn();
        }
        keep
    });

    for segment in track.segments() {
        if view.entities.contains_key(&segment.id) {
            continue;
        }
        let extent = convert::vec3(&segment.template.extent());
        let material = if segment.class() == SegmentClass::Straight {
            materials.straight.clone()
        } else {
            materials.turn.clone()
        };
        let entity = commands
            .spawn((
                Name::new(format!("Segment {}", segment.id)),
                Mesh3d(meshes.add(Cuboid::new(extent.x, extent.y, extent.z))),
                MeshMaterial3d(material),
                Transform {
                    translation: convert::vec3(&segment.position) - Vec3::Y * extent.y * 0.5,
                    rotation: convert::quat(&segment.orientation),
                    scale: Vec3::ONE,
                },
            ))
            .id();
        view.entities.insert(segment.id, entity);
    }

    for obstacle in track.obstacles() {
        if view.entities.contains_key(&obstacle.id) {
            continue;
        }
        let extent = convert::vec3(&obstacle.template.extent());
        let lift = obstacle.template.elevation + extent.y * 0.5;
        let entity = commands
            .spawn((
                Name::new(format!("Obstacle {}", obstacle.id)),
                Mesh3d(meshes.add(Cuboid::new(extent.x, extent.y, extent.z))),
                MeshMaterial3d(materials.obstacle.clone()),
                Transform {
                    translation: convert::vec3(&obstacle.position) + Vec3::Y * lift,
                    rotation: convert::quat(&obstacle.orientation),
                    scale: Vec3::ONE,
                },
            ))
            .id();
        view.entities.insert(obstacle.id, entity);
    }

    for collectible in track.collectibles() {
        if view.entities.contains_key(&collectible.id) {
            continue;
        }
        let radius = collectible.template.radius;
        let entity = commands
            .spawn((
                Name::new(format!("Coin {}", collectible.id)),
                Coin,
                Mesh3d(meshes.add(Cylinder::new(radius, radius * 0.2))),
                MeshMaterial3d(materials.coin.clone()),
                Transform::from_translation(convert::vec3(&collectible.position))
                    .with_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)),
            ))
            .id();
        view.entities.insert(collectible.id, entity);
    }
}

fn spin_coins(time: Res<Time>, mut coins: Query<&mut Transform, With<Coin>>) {
    let angle = COIN_SPIN_RATE * time.delta_secs();
    for mut transform in &mut coins {
        transform.rotate_y(angle);
    }
}
