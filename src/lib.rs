//! This crate holds a single destructible voxel sphere.
//! The sphere is one chunk of voxels, meshed as blocky cubes where only the faces that border
//! empty space are emitted. Bodies that hit the sphere break the hit voxel off, after which the
//! chunk is meshed again and a small physics cube is spawned where the hit landed
//!
//! The host sends an [ImpactEvent] for every hit and reads the surface from [ChunkMesh]

#![warn(missing_docs)]

mod voxel;
pub use voxel::Voxel;

mod chunk;
pub use chunk::Chunk;

mod config;
pub use config::{DebrisAssets, VoxelSphereConfig};

pub mod debris;
pub mod face;
pub mod impact;
pub use impact::{BodyKind, ImpactBody, ImpactEvent, Mobility, VoxelRemoved};

pub mod mesh;
pub use mesh::{ChunkMesh, MeshBuffers};

pub mod shape;

use bevy::prelude::*;

/// The number of voxels per side of a chunk
pub const CHUNK_SIDES: usize = 16;
pub(crate) const CHUNK_BOUNDS: u32 = CHUNK_SIDES as u32;
/// The number of voxels per chunk, since every chunk is a cube of voxels this is
/// just CHUNK_SIDES^3
pub const CHUNK_VOXELS: usize = CHUNK_SIDES * CHUNK_SIDES * CHUNK_SIDES;

/// Everything a voxel sphere is spawned with. The chunk is filled and meshed once here
#[derive(Bundle)]
pub struct VoxelSphereBundle {
    /// The settings of the sphere
    pub config: VoxelSphereConfig,
    /// The voxels of the sphere
    pub chunk: Chunk,
    /// The surface of the sphere
    pub mesh: ChunkMesh,
    /// The placement of the sphere
    pub transform: Transform,
    /// The world placement of the sphere
    pub global_transform: GlobalTransform,
}

impl VoxelSphereBundle {
    /// Fill a chunk with a sphere of `config.sphere_radius` and mesh it
    pub fn new(config: VoxelSphereConfig, transform: Transform) -> Self {
        debug_assert!(
            config.has_valid_voxel_size(),
            "voxel size must be finite and positive, got {}",
            config.voxel_size
        );
        let chunk = Chunk::from_shape(&config.shape());
        let mesh = ChunkMesh::new(mesh::build_mesh(&chunk, config.voxel_size));
        info!(
            "Voxel sphere with {} voxels, {} triangles",
            chunk.occupied_count(),
            mesh.section().triangle_count()
        );
        Self {
            config,
            chunk,
            mesh,
            transform,
            global_transform: GlobalTransform::from(transform),
        }
    }
}

/// Registers the impact events and the system that breaks voxels off spheres
pub struct VoxelSpherePlugin;

impl Plugin for VoxelSpherePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ImpactEvent>()
            .add_event::<VoxelRemoved>()
            .add_systems(Update, impact::handle_impacts);
    }
}

#[cfg(test)]
fn test_app(config: VoxelSphereConfig, transform: Transform) -> (App, Entity) {
    let mut app = App::new();
    app.add_plugins(VoxelSpherePlugin);
    let sphere = app
        .world
        .spawn(VoxelSphereBundle::new(config, transform))
        .id();
    (app, sphere)
}

#[cfg(test)]
fn hit(app: &mut App, target: Entity, other: Entity, point: Vec3) {
    app.world
        .resource_mut::<Events<ImpactEvent>>()
        .send(ImpactEvent {
            target,
            other,
            point,
            normal: Vec3::Y,
        });
    app.update();
}

#[cfg(test)]
fn debris_count(app: &mut App) -> usize {
    app.world
        .query::<&debris::Debris>()
        .iter(&app.world)
        .count()
}

#[test]
fn test_break_center_voxel() {
    let config = VoxelSphereConfig {
        debris: DebrisAssets::new("meshes/cube.glb", "materials/blue.mat"),
        ..Default::default()
    };
    let (mut app, sphere) = test_app(config, Transform::IDENTITY);
    let projectile = app
        .world
        .spawn(ImpactBody::movable(BodyKind::Projectile))
        .id();

    let before = app.world.get::<Chunk>(sphere).unwrap().occupied_count();
    assert!(app
        .world
        .get::<Chunk>(sphere)
        .unwrap()
        .is_occupied(IVec3::splat(8)));

    // Voxel (8, 8, 8) covers 400..450 on every axis
    let point = Vec3::splat(425.);
    hit(&mut app, sphere, projectile, point);

    let chunk = app.world.get::<Chunk>(sphere).unwrap();
    assert_eq!(before - 1, chunk.occupied_count());
    assert!(!chunk.is_occupied(IVec3::splat(8)));
    assert_eq!(2, app.world.get::<ChunkMesh>(sphere).unwrap().revision());

    let removed: Vec<_> = app
        .world
        .resource_mut::<Events<VoxelRemoved>>()
        .drain()
        .collect();
    assert_eq!(
        vec![VoxelRemoved {
            target: sphere,
            voxel: UVec3::splat(8)
        }],
        removed
    );

    let mut debris = app.world.query::<(&debris::Debris, &Transform)>();
    let (_, transform) = debris.single(&app.world);
    assert_eq!(point, transform.translation);
}

#[test]
fn test_ignore_out_of_bounds_hits() {
    let (mut app, sphere) = test_app(VoxelSphereConfig::default(), Transform::IDENTITY);
    let projectile = app
        .world
        .spawn(ImpactBody::movable(BodyKind::Projectile))
        .id();
    let before = app.world.get::<Chunk>(sphere).unwrap().clone();

    hit(&mut app, sphere, projectile, Vec3::new(-1., 425., 425.));
    hit(&mut app, sphere, projectile, Vec3::new(425., 800., 425.));
    hit(&mut app, sphere, projectile, Vec3::new(425., 425., 10_000.));

    assert_eq!(&before, app.world.get::<Chunk>(sphere).unwrap());
    assert_eq!(1, app.world.get::<ChunkMesh>(sphere).unwrap().revision());
    assert_eq!(0, debris_count(&mut app));
}

#[test]
fn test_ignore_bodies_that_cannot_damage() {
    let config = VoxelSphereConfig {
        debris: DebrisAssets::new("meshes/cube.glb", "materials/blue.mat"),
        ..Default::default()
    };
    let (mut app, sphere) = test_app(config, Transform::IDENTITY);
    let character = app
        .world
        .spawn(ImpactBody::movable(BodyKind::Character))
        .id();
    let wall = app
        .world
        .spawn(ImpactBody {
            kind: BodyKind::Projectile,
            mobility: Mobility::Static,
        })
        .id();
    let untagged = app.world.spawn_empty().id();

    for other in [character, wall, untagged] {
        hit(&mut app, sphere, other, Vec3::splat(425.));
    }

    assert!(app
        .world
        .get::<Chunk>(sphere)
        .unwrap()
        .is_occupied(IVec3::splat(8)));
    assert_eq!(1, app.world.get::<ChunkMesh>(sphere).unwrap().revision());
    assert_eq!(0, debris_count(&mut app));
}

#[test]
fn test_hit_on_empty_voxel() {
    let config = VoxelSphereConfig {
        debris: DebrisAssets::new("meshes/cube.glb", "materials/blue.mat"),
        ..Default::default()
    };
    let (mut app, sphere) = test_app(config, Transform::IDENTITY);
    let projectile = app
        .world
        .spawn(ImpactBody::movable(BodyKind::Projectile))
        .id();

    // Voxel (0, 0, 0) is far outside of the sphere
    assert!(!app
        .world
        .get::<Chunk>(sphere)
        .unwrap()
        .is_occupied(IVec3::ZERO));
    hit(&mut app, sphere, projectile, Vec3::splat(10.));
    assert_eq!(1, app.world.get::<ChunkMesh>(sphere).unwrap().revision());
    assert_eq!(1, debris_count(&mut app));

    app.world
        .get_mut::<VoxelSphereConfig>(sphere)
        .unwrap()
        .debris_on_empty_hit = false;
    hit(&mut app, sphere, projectile, Vec3::splat(10.));
    assert_eq!(1, debris_count(&mut app));
}

#[test]
fn test_hit_on_moved_sphere() {
    let config = VoxelSphereConfig {
        debris: DebrisAssets::new("meshes/cube.glb", "materials/blue.mat"),
        ..Default::default()
    };
    let transform = Transform::from_xyz(1000., 0., -400.);
    let (mut app, sphere) = test_app(config, transform);
    let projectile = app
        .world
        .spawn(ImpactBody::movable(BodyKind::Projectile))
        .id();

    // Local (425, 425, 425), the center voxel
    let point = Vec3::new(1425., 425., 25.);
    hit(&mut app, sphere, projectile, point);

    assert!(!app
        .world
        .get::<Chunk>(sphere)
        .unwrap()
        .is_occupied(IVec3::splat(8)));
    assert_eq!(2, app.world.get::<ChunkMesh>(sphere).unwrap().revision());

    // Debris lands on the world space contact, not the local point or the voxel center
    let mut debris = app.world.query::<(&debris::Debris, &Transform)>();
    let (_, debris_transform) = debris.single(&app.world);
    assert_eq!(point, debris_transform.translation);
}

#[test]
fn test_sphere_without_debris_assets() {
    let (mut app, sphere) = test_app(VoxelSphereConfig::default(), Transform::IDENTITY);
    let projectile = app
        .world
        .spawn(ImpactBody::movable(BodyKind::Projectile))
        .id();

    hit(&mut app, sphere, projectile, Vec3::splat(425.));

    assert_eq!(2, app.world.get::<ChunkMesh>(sphere).unwrap().revision());
    assert_eq!(0, debris_count(&mut app));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "voxel size")]
fn test_zero_voxel_size_panics() {
    VoxelSphereBundle::new(
        VoxelSphereConfig {
            voxel_size: 0.,
            ..Default::default()
        },
        Transform::IDENTITY,
    );
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "voxel size")]
fn test_negative_voxel_size_panics() {
    VoxelSphereBundle::new(
        VoxelSphereConfig {
            voxel_size: -50.,
            ..Default::default()
        },
        Transform::IDENTITY,
    );
}

#[test]
fn test_bundle_with_fill_shape() {
    use shape::{CuboidShape, EmptyShape, SolidShape};

    let solid = VoxelSphereBundle::new(
        VoxelSphereConfig {
            fill_shape: Some(SolidShape.into()),
            ..Default::default()
        },
        Transform::IDENTITY,
    );
    assert_eq!(CHUNK_VOXELS, solid.chunk.occupied_count());
    assert_eq!(6 * CHUNK_SIDES * CHUNK_SIDES, solid.mesh.section().face_count());

    let empty = VoxelSphereBundle::new(
        VoxelSphereConfig {
            fill_shape: Some(EmptyShape.into()),
            ..Default::default()
        },
        Transform::IDENTITY,
    );
    assert_eq!(0, empty.chunk.occupied_count());
    assert!(empty.mesh.section().is_empty());

    let cuboid = VoxelSphereBundle::new(
        VoxelSphereConfig {
            fill_shape: Some(
                CuboidShape {
                    min: UVec3::new(2, 2, 2),
                    max: UVec3::new(4, 5, 6),
                }
                .into(),
            ),
            ..Default::default()
        },
        Transform::IDENTITY,
    );
    assert_eq!(2 * 3 * 4, cuboid.chunk.occupied_count());
    assert_eq!(2 * (2 * 3 + 2 * 4 + 3 * 4), cuboid.mesh.section().face_count());
}
