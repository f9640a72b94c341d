//! Shapes used to fill a [Chunk](crate::Chunk) when it is created

use crate::{CHUNK_BOUNDS, CHUNK_SIDES};

use bevy::prelude::*;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

/// A trait for a shape that decides which voxels of a chunk are occupied
#[enum_dispatch]
pub trait FillShape {
    /// Whether the voxel at the provided chunk coordinates is inside the shape
    fn contains(&self, pos: UVec3) -> bool;
}

/// An enum with shape variants, used to pass the FillShape trait around without Box or dynamic
/// dispatch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[enum_dispatch(FillShape)]
pub enum Shape {
    /// A sphere
    Sphere(SphereShape),
    /// An axis aligned box
    Cuboid(CuboidShape),
    /// Every voxel
    Solid(SolidShape),
    /// No voxel at all
    Empty(EmptyShape),
}

/// A sphere in voxel units. A voxel is inside when the distance between its coordinates and the
/// center is at most the radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereShape {
    /// The center of the sphere, in voxel coordinates
    pub center: Vec3,
    /// The radius of the sphere, in voxels
    pub radius: f32,
}

impl SphereShape {
    /// A sphere centered on the middle voxel of the chunk
    pub fn centered(radius: f32) -> Self {
        Self {
            center: Vec3::splat((CHUNK_SIDES / 2) as f32),
            radius,
        }
    }
}

impl FillShape for SphereShape {
    fn contains(&self, pos: UVec3) -> bool {
        // Squared to keep the boundary exact for integer distances
        (pos.as_vec3() - self.center).length_squared() <= self.radius * self.radius
    }
}

/// A box covering `min..max` on every axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuboidShape {
    /// The first voxel inside the box
    pub min: UVec3,
    /// The first voxel past the box
    pub max: UVec3,
}

impl FillShape for CuboidShape {
    fn contains(&self, pos: UVec3) -> bool {
        pos.cmpge(self.min).all() && pos.cmplt(self.max).all()
    }
}

/// A shape holding the whole chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SolidShape;

impl FillShape for SolidShape {
    fn contains(&self, pos: UVec3) -> bool {
        pos.cmplt(UVec3::splat(CHUNK_BOUNDS)).all()
    }
}

/// A shape holding nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmptyShape;

impl FillShape for EmptyShape {
    fn contains(&self, _pos: UVec3) -> bool {
        false
    }
}

#[test]
fn test_sphere_boundary_is_inclusive() {
    let sphere = SphereShape::centered(10.);
    assert_eq!(Vec3::splat(8.), sphere.center);
    assert!(sphere.contains(UVec3::new(8, 8, 8)));
    // 6² + 8² = 10²
    assert!(sphere.contains(UVec3::new(14, 0, 8)));
    assert!(sphere.contains(UVec3::new(0, 2, 8)));
    // 8² + 6² + 1² = 101
    assert!(!sphere.contains(UVec3::new(0, 2, 9)));
    assert!(!sphere.contains(UVec3::new(0, 0, 0)));
}

#[test]
fn test_sphere_epsilon_outside() {
    let sphere = SphereShape {
        center: Vec3::ZERO,
        radius: 3.,
    };
    assert!(sphere.contains(UVec3::new(3, 0, 0)));
    let sphere = SphereShape {
        center: Vec3::new(-0.001, 0., 0.),
        radius: 3.,
    };
    assert!(!sphere.contains(UVec3::new(3, 0, 0)));
}

#[test]
fn test_shape_dispatch() {
    let shapes = [
        Shape::from(SolidShape),
        Shape::from(EmptyShape),
        Shape::from(CuboidShape {
            min: UVec3::new(2, 2, 2),
            max: UVec3::new(4, 4, 4),
        }),
    ];
    let pos = UVec3::new(3, 3, 3);
    assert_eq!(
        [true, false, true],
        shapes.map(|shape| shape.contains(pos))
    );
    assert!(!shapes[2].contains(UVec3::new(4, 3, 3)));
}
