use serde::{Deserialize, Serialize};

/// A Voxel is the data for a single voxel. It holds a material, where material 0 is empty air.
/// Only the difference between air and any other material matters for meshing and impacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Voxel(u8);

impl Voxel {
    /// An empty air voxel
    pub const AIR: Voxel = Voxel(0);
    /// The solid voxel used when a chunk is filled from a shape
    pub const STONE: Voxel = Voxel(1);

    /// Construct a Voxel with the specified material
    pub const fn new(material: u8) -> Self {
        Self(material)
    }

    /// Get the material for this voxel
    pub fn material(&self) -> u8 {
        self.0
    }

    /// Whether this voxel is air
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Whether this voxel occupies its cell
    pub fn is_occupied(&self) -> bool {
        !self.is_empty()
    }
}

#[test]
fn test_air_is_empty() {
    assert!(Voxel::AIR.is_empty());
    assert!(Voxel::default().is_empty());
    assert!(Voxel::STONE.is_occupied());
    assert!(Voxel::new(42).is_occupied());
    assert_eq!(42, Voxel::new(42).material());
}
