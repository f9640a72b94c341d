//! Debris cubes that are knocked off the sphere when a voxel is hit

use crate::{
    impact::{BodyKind, ImpactBody},
    VoxelSphereConfig,
};

use bevy::prelude::*;

/// The width of the debris cube mesh, in world units
pub const DEBRIS_MESH_EXTENT: f32 = 100.;

/// A debris cube. The host renders it with the referenced assets
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct Debris {
    /// The path of the cube mesh
    pub mesh: String,
    /// The path of the cube material
    pub material: String,
}

/// Marks an entity as simulated by the physics engine. The body collides with other bodies and
/// is hit by scene queries
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimulatePhysics;

/// Everything a debris cube is spawned with
#[derive(Bundle)]
pub struct DebrisBundle {
    /// The debris assets
    pub debris: Debris,
    /// Lets the debris itself be filtered by impact handling
    pub body: ImpactBody,
    /// Turns physics on for the cube
    pub physics: SimulatePhysics,
    /// The placement of the cube
    pub transform: Transform,
    /// The world placement of the cube
    pub global_transform: GlobalTransform,
}

impl DebrisBundle {
    /// Create debris at the world position, scaled so the cube is one voxel wide. Returns None if
    /// the debris assets are not set
    pub fn new(config: &VoxelSphereConfig, position: Vec3) -> Option<Self> {
        let (Some(mesh), Some(material)) = (&config.debris.mesh, &config.debris.material) else {
            return None;
        };
        let transform = Transform::from_translation(position)
            .with_scale(Vec3::splat(config.voxel_size / DEBRIS_MESH_EXTENT));
        Some(Self {
            debris: Debris {
                mesh: mesh.clone(),
                material: material.clone(),
            },
            body: ImpactBody::movable(BodyKind::Debris),
            physics: SimulatePhysics,
            transform,
            global_transform: GlobalTransform::from(transform),
        })
    }
}

/// Spawn a debris cube at the world position through [Commands]
pub fn spawn_debris(
    commands: &mut Commands,
    config: &VoxelSphereConfig,
    position: Vec3,
) -> Option<Entity> {
    let Some(bundle) = DebrisBundle::new(config, position) else {
        debug!("Debris assets not set, not spawning debris at {position}");
        return None;
    };
    Some(commands.spawn(bundle).id())
}

#[test]
fn test_debris_needs_assets() {
    let mut config = VoxelSphereConfig::default();
    assert!(DebrisBundle::new(&config, Vec3::ZERO).is_none());

    config.debris.mesh = Some("meshes/cube.glb".into());
    assert!(DebrisBundle::new(&config, Vec3::ZERO).is_none());

    config.debris.material = Some("materials/blue.mat".into());
    assert!(DebrisBundle::new(&config, Vec3::ZERO).is_some());
}

#[test]
fn test_spawn_debris() {
    use crate::DebrisAssets;
    use bevy::ecs::system::CommandQueue;

    let config = VoxelSphereConfig {
        debris: DebrisAssets::new("meshes/cube.glb", "materials/blue.mat"),
        ..Default::default()
    };
    let mut world = World::default();
    let mut queue = CommandQueue::default();
    let position = Vec3::new(425., 10., -3.);
    let entity = {
        let mut commands = Commands::new(&mut queue, &world);
        spawn_debris(&mut commands, &config, position).unwrap()
    };
    queue.apply(&mut world);

    let transform = world.get::<Transform>(entity).unwrap();
    assert_eq!(position, transform.translation);
    assert_eq!(Vec3::splat(0.5), transform.scale);
    assert!(world.get::<SimulatePhysics>(entity).is_some());
    assert_eq!(BodyKind::Debris, world.get::<ImpactBody>(entity).unwrap().kind);
    assert_eq!("meshes/cube.glb", world.get::<Debris>(entity).unwrap().mesh);
}
