use crate::{
    impact::BodyKind,
    shape::{Shape, SphereShape},
};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// The settings of a voxel sphere. They are decided once when the sphere is spawned and are not
/// changed afterwards
#[derive(Component, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelSphereConfig {
    /// The radius of the sphere, in world units
    pub sphere_radius: f32,
    /// The size of each voxel, in world units
    pub voxel_size: f32,
    /// Fills the chunk with this shape instead of a sphere of `sphere_radius`
    pub fill_shape: Option<Shape>,
    /// The kind of body that breaks voxels off the sphere
    pub damaged_by: BodyKind,
    /// The assets used for debris cubes
    pub debris: DebrisAssets,
    /// Whether a hit on an already empty voxel still spawns debris
    pub debris_on_empty_hit: bool,
}

impl Default for VoxelSphereConfig {
    fn default() -> Self {
        Self {
            sphere_radius: 500.,
            voxel_size: 50.,
            fill_shape: None,
            damaged_by: BodyKind::Projectile,
            debris: DebrisAssets::default(),
            debris_on_empty_hit: true,
        }
    }
}

impl VoxelSphereConfig {
    /// Whether the voxel size is finite and larger than zero
    pub fn has_valid_voxel_size(&self) -> bool {
        self.voxel_size.is_finite() && self.voxel_size > 0.
    }

    /// The radius of the sphere, in voxels
    pub fn radius_in_voxels(&self) -> f32 {
        self.sphere_radius / self.voxel_size
    }

    /// The shape the chunk is filled with
    pub fn shape(&self) -> Shape {
        self.fill_shape
            .unwrap_or_else(|| SphereShape::centered(self.radius_in_voxels()).into())
    }
}

/// References to the mesh and material assets of debris cubes. Debris is only spawned when both
/// are set
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebrisAssets {
    /// The path of the cube mesh, authored [DEBRIS_MESH_EXTENT](crate::debris::DEBRIS_MESH_EXTENT)
    /// units wide
    pub mesh: Option<String>,
    /// The path of the material applied to the cube
    pub material: Option<String>,
}

impl DebrisAssets {
    /// Create debris assets from a mesh and material path
    pub fn new(mesh: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            mesh: Some(mesh.into()),
            material: Some(material.into()),
        }
    }
}

#[test]
fn test_default_radius_in_voxels() {
    let config = VoxelSphereConfig::default();
    assert_eq!(10., config.radius_in_voxels());
    assert_eq!(
        Shape::Sphere(SphereShape {
            center: Vec3::splat(8.),
            radius: 10.
        }),
        config.shape()
    );
    assert!(config.debris.mesh.is_none());
    assert!(config.has_valid_voxel_size());
}

#[test]
fn test_fill_shape_overrides_sphere() {
    use crate::shape::SolidShape;

    let config = VoxelSphereConfig {
        fill_shape: Some(SolidShape.into()),
        ..Default::default()
    };
    assert_eq!(Shape::Solid(SolidShape), config.shape());
}

#[test]
fn test_invalid_voxel_sizes() {
    for voxel_size in [0., -50., f32::NAN, f32::INFINITY] {
        let config = VoxelSphereConfig {
            voxel_size,
            ..Default::default()
        };
        assert!(!config.has_valid_voxel_size());
    }
}
