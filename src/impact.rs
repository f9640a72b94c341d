//! This module contains the logic to break voxels off a sphere when it is hit

use crate::{debris::spawn_debris, Chunk, ChunkMesh, VoxelSphereConfig};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// The kinds of bodies that can hit a voxel sphere
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    /// A thrown or fired object
    Projectile,
    /// A player or NPC
    Character,
    /// A debris cube knocked off a sphere
    Debris,
    /// Any other object
    Prop,
}

/// Whether a body is moved by the physics engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mobility {
    /// The body never moves
    Static,
    /// The body can be moved
    Movable,
}

/// Tags a body that can hit a voxel sphere
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImpactBody {
    /// What the body is
    pub kind: BodyKind,
    /// Whether the body can move
    pub mobility: Mobility,
}

impl ImpactBody {
    /// A body of the given kind that can move
    pub fn movable(kind: BodyKind) -> Self {
        Self {
            kind,
            mobility: Mobility::Movable,
        }
    }

    /// Whether this body breaks voxels off a sphere configured with `config`
    pub fn damages(&self, config: &VoxelSphereConfig) -> bool {
        self.mobility == Mobility::Movable && self.kind == config.damaged_by
    }
}

/// Sent by the host when a body hits a voxel sphere
#[derive(Event, Clone, Copy, Debug)]
pub struct ImpactEvent {
    /// The voxel sphere that was hit
    pub target: Entity,
    /// The body that hit the sphere
    pub other: Entity,
    /// The contact point, in world space
    pub point: Vec3,
    /// The contact normal, in world space
    pub normal: Vec3,
}

/// Sent after a voxel has been broken off a sphere
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelRemoved {
    /// The voxel sphere
    pub target: Entity,
    /// The coordinates of the removed voxel
    pub voxel: UVec3,
}

/// What a hit does to a sphere
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImpactOutcome {
    /// The body is not allowed to damage the sphere
    Rejected,
    /// The hit is outside of the chunk
    OutOfBounds(IVec3),
    /// The hit point has no finite position in the chunk, from a non-finite contact or a
    /// transform that cannot be inverted
    NonFinite,
    /// The hit voxel is occupied and is removed
    Hit(UVec3),
    /// The voxel was hit but was already empty
    AlreadyEmpty(UVec3),
}

/// Convert a world space point to the voxel it falls in, using the inverse of the sphere's
/// transform. The result may be outside of the chunk. Returns None when the local position is
/// not finite
pub fn voxel_at(transform: &GlobalTransform, point: Vec3, voxel_size: f32) -> Option<IVec3> {
    let local = transform.affine().inverse().transform_point3(point) / voxel_size;
    if !local.is_finite() {
        return None;
    }
    Some(local.floor().as_ivec3())
}

/// Decide what a hit does to the chunk, without changing it
pub fn classify_impact(
    chunk: &Chunk,
    transform: &GlobalTransform,
    config: &VoxelSphereConfig,
    body: Option<&ImpactBody>,
    point: Vec3,
) -> ImpactOutcome {
    if !body.is_some_and(|body| body.damages(config)) {
        return ImpactOutcome::Rejected;
    }
    let Some(pos) = voxel_at(transform, point, config.voxel_size) else {
        return ImpactOutcome::NonFinite;
    };
    let Some(voxel) = Chunk::contains(pos) else {
        return ImpactOutcome::OutOfBounds(pos);
    };
    if chunk.get_voxel(voxel).is_occupied() {
        ImpactOutcome::Hit(voxel)
    } else {
        ImpactOutcome::AlreadyEmpty(voxel)
    }
}

/// Apply a hit to the chunk. This removes the hit voxel when the body may damage the sphere, and
/// leaves the chunk untouched otherwise
pub fn resolve_impact(
    chunk: &mut Chunk,
    transform: &GlobalTransform,
    config: &VoxelSphereConfig,
    body: Option<&ImpactBody>,
    point: Vec3,
) -> ImpactOutcome {
    let outcome = classify_impact(chunk, transform, config, body, point);
    if let ImpactOutcome::Hit(voxel) = outcome {
        chunk.clear(voxel.as_ivec3());
    }
    outcome
}

/// Handle all [ImpactEvent]s, removing voxels, meshing the sphere again after every removal and
/// spawning debris at the contact points
pub fn handle_impacts(
    mut commands: Commands,
    mut impacts: EventReader<ImpactEvent>,
    mut removed: EventWriter<VoxelRemoved>,
    mut spheres: Query<(
        &mut Chunk,
        &mut ChunkMesh,
        &GlobalTransform,
        &VoxelSphereConfig,
    )>,
    bodies: Query<&ImpactBody>,
) {
    for impact in impacts.read() {
        debug!("Hit {:?} at {}", impact.target, impact.point);
        let Ok((mut chunk, mut mesh, transform, config)) = spheres.get_mut(impact.target) else {
            continue;
        };

        // The chunk is only borrowed mutably once a voxel is removed, so change detection stays
        // quiet for every other hit
        let outcome = classify_impact(
            &chunk,
            transform,
            config,
            bodies.get(impact.other).ok(),
            impact.point,
        );

        let spawn = match outcome {
            ImpactOutcome::Rejected => {
                debug!("Not removing, {:?} cannot damage the sphere", impact.other);
                false
            }
            ImpactOutcome::OutOfBounds(pos) => {
                debug!("Not removing, voxel {pos} is outside of the chunk");
                false
            }
            ImpactOutcome::NonFinite => {
                debug!("Not removing, {} has no position in the chunk", impact.point);
                false
            }
            ImpactOutcome::Hit(voxel) => {
                chunk.clear(voxel.as_ivec3());
                info!("Removed voxel {voxel} from {:?}", impact.target);
                mesh.rebuild(&chunk, config.voxel_size);
                removed.send(VoxelRemoved {
                    target: impact.target,
                    voxel,
                });
                true
            }
            ImpactOutcome::AlreadyEmpty(voxel) => {
                debug!("Voxel {voxel} is already empty");
                config.debris_on_empty_hit
            }
        };

        if spawn {
            spawn_debris(&mut commands, config, impact.point);
        }
    }
}

#[test]
fn test_voxel_at_floors_local_position() {
    let transform = GlobalTransform::IDENTITY;
    assert_eq!(
        Some(IVec3::new(8, 8, 8)),
        voxel_at(&transform, Vec3::splat(425.), 50.)
    );
    assert_eq!(
        Some(IVec3::new(0, 0, 0)),
        voxel_at(&transform, Vec3::splat(49.9), 50.)
    );
    assert_eq!(
        Some(IVec3::new(-1, 0, 15)),
        voxel_at(&transform, Vec3::new(-0.1, 0., 799.), 50.)
    );

    let transform =
        GlobalTransform::from(Transform::from_xyz(100., 0., 0.).with_scale(Vec3::splat(2.)));
    assert_eq!(
        Some(IVec3::new(1, 0, 0)),
        voxel_at(&transform, Vec3::new(210., 1., 1.), 50.)
    );
}

#[test]
fn test_non_finite_hits_leave_chunk_alone() {
    use crate::Voxel;

    let config = VoxelSphereConfig::default();
    let projectile = ImpactBody::movable(BodyKind::Projectile);
    let mut chunk = Chunk::filled(Voxel::STONE);

    // NaN would otherwise floor to voxel (0, 0, 0)
    let outcome = resolve_impact(
        &mut chunk,
        &GlobalTransform::IDENTITY,
        &config,
        Some(&projectile),
        Vec3::new(f32::NAN, 425., 425.),
    );
    assert_eq!(ImpactOutcome::NonFinite, outcome);

    let outcome = resolve_impact(
        &mut chunk,
        &GlobalTransform::IDENTITY,
        &config,
        Some(&projectile),
        Vec3::new(425., f32::INFINITY, 425.),
    );
    assert_eq!(ImpactOutcome::NonFinite, outcome);

    // A flattened sphere has no inverse transform
    let flat = GlobalTransform::from(Transform::from_scale(Vec3::new(0., 1., 1.)));
    assert_eq!(None, voxel_at(&flat, Vec3::splat(10.), 50.));
    let outcome = resolve_impact(
        &mut chunk,
        &flat,
        &config,
        Some(&projectile),
        Vec3::splat(10.),
    );
    assert_eq!(ImpactOutcome::NonFinite, outcome);

    assert_eq!(crate::CHUNK_VOXELS, chunk.occupied_count());
}

#[test]
fn test_resolve_impact() {
    let config = VoxelSphereConfig::default();
    let transform = GlobalTransform::IDENTITY;
    let projectile = ImpactBody::movable(BodyKind::Projectile);
    let mut chunk = Chunk::from_shape(&config.shape());
    let count = chunk.occupied_count();

    let outcome = resolve_impact(
        &mut chunk,
        &transform,
        &config,
        Some(&projectile),
        Vec3::splat(425.),
    );
    assert_eq!(ImpactOutcome::Hit(UVec3::splat(8)), outcome);
    assert_eq!(count - 1, chunk.occupied_count());

    // Voxels never come back, a second hit finds the cell empty
    let outcome = resolve_impact(
        &mut chunk,
        &transform,
        &config,
        Some(&projectile),
        Vec3::splat(425.),
    );
    assert_eq!(ImpactOutcome::AlreadyEmpty(UVec3::splat(8)), outcome);
    assert_eq!(count - 1, chunk.occupied_count());

    let outcome = resolve_impact(
        &mut chunk,
        &transform,
        &config,
        Some(&projectile),
        Vec3::new(425., 425., 800.),
    );
    assert_eq!(ImpactOutcome::OutOfBounds(IVec3::new(8, 8, 16)), outcome);

    let outcome = resolve_impact(&mut chunk, &transform, &config, None, Vec3::splat(375.));
    assert_eq!(ImpactOutcome::Rejected, outcome);
    assert_eq!(count - 1, chunk.occupied_count());
}

#[test]
fn test_damage_filter() {
    let config = VoxelSphereConfig {
        damaged_by: BodyKind::Prop,
        ..Default::default()
    };
    assert!(ImpactBody::movable(BodyKind::Prop).damages(&config));
    assert!(!ImpactBody::movable(BodyKind::Projectile).damages(&config));
    assert!(!ImpactBody::movable(BodyKind::Debris).damages(&config));
    assert!(!ImpactBody {
        kind: BodyKind::Prop,
        mobility: Mobility::Static
    }
    .damages(&config));
}
