//! Emits the quads of a single cube into a [MeshBuffers]

use crate::MeshBuffers;

use bevy::prelude::*;

/// One of the six axis aligned faces of a voxel. The discriminant is the bit used in a [FaceMask]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Face {
    /// The face pointing towards -X
    NegX = 0,
    /// The face pointing towards +X
    PosX = 1,
    /// The face pointing towards -Y
    NegY = 2,
    /// The face pointing towards +Y
    PosY = 3,
    /// The face pointing towards -Z
    NegZ = 4,
    /// The face pointing towards +Z
    PosZ = 5,
}

impl Face {
    /// All faces, in mask bit order
    pub const ALL: [Face; 6] = [
        Face::NegX,
        Face::PosX,
        Face::NegY,
        Face::PosY,
        Face::NegZ,
        Face::PosZ,
    ];

    /// The offset to the neighboring voxel this face looks at
    pub fn offset(self) -> IVec3 {
        self.normal().as_ivec3()
    }

    /// The outward unit normal of the face
    pub fn normal(self) -> Vec3 {
        let i = self as usize;
        let mut normal = Vec3::ZERO;
        normal[i / 2] = if i % 2 == 0 { -1. } else { 1. };
        normal
    }

    /// The four corners of the face on a unit cube, counter-clockwise when looking at the face
    /// from outside
    fn corners(self) -> [Vec3; 4] {
        let c = |x: u8, y: u8, z: u8| Vec3::new(x as f32, y as f32, z as f32);
        match self {
            Face::NegX => [c(0, 0, 0), c(0, 0, 1), c(0, 1, 1), c(0, 1, 0)],
            Face::PosX => [c(1, 0, 0), c(1, 1, 0), c(1, 1, 1), c(1, 0, 1)],
            Face::NegY => [c(0, 0, 0), c(1, 0, 0), c(1, 0, 1), c(0, 0, 1)],
            Face::PosY => [c(0, 1, 0), c(0, 1, 1), c(1, 1, 1), c(1, 1, 0)],
            Face::NegZ => [c(0, 0, 0), c(0, 1, 0), c(1, 1, 0), c(1, 0, 0)],
            Face::PosZ => [c(0, 0, 1), c(1, 0, 1), c(1, 1, 1), c(0, 1, 1)],
        }
    }
}

const QUAD_UVS: [[f32; 2]; 4] = [[0., 0.], [1., 0.], [1., 1.], [0., 1.]];

/// The set of visible faces of a voxel, one bit per [Face]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FaceMask(u8);

impl FaceMask {
    /// No visible faces
    pub const NONE: FaceMask = FaceMask(0);
    /// All six faces visible
    pub const ALL: FaceMask = FaceMask(0b11_1111);

    /// Build a mask by asking for each face whether it is visible
    pub fn from_fn(mut visible: impl FnMut(Face) -> bool) -> Self {
        Face::ALL
            .into_iter()
            .filter(|face| visible(*face))
            .fold(Self::NONE, Self::with)
    }

    /// Get this mask with the face made visible
    pub fn with(self, face: Face) -> Self {
        Self(self.0 | 1 << face as u8)
    }

    /// Whether the face is visible
    pub fn contains(&self, face: Face) -> bool {
        self.0 & 1 << face as u8 != 0
    }

    /// The number of visible faces
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Whether no face is visible
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Append the visible faces of a cube with its minimum corner at `position` to the buffers.
/// Every face gets 4 vertices and 2 triangles that wind counter-clockwise seen from outside
pub fn emit_cube(position: Vec3, size: f32, mask: FaceMask, out: &mut MeshBuffers) {
    for face in Face::ALL {
        if !mask.contains(face) {
            continue;
        }
        let base = out.positions.len() as u32;
        let normal = face.normal().to_array();
        for (corner, uv) in face.corners().into_iter().zip(QUAD_UVS) {
            out.positions.push((position + corner * size).to_array());
            out.normals.push(normal);
            out.uvs.push(uv);
        }
        out.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

#[test]
fn test_face_mask() {
    let mask = FaceMask::from_fn(|face| matches!(face, Face::NegX | Face::PosZ));
    assert!(mask.contains(Face::NegX));
    assert!(mask.contains(Face::PosZ));
    assert!(!mask.contains(Face::PosX));
    assert_eq!(2, mask.count());
    assert_eq!(6, FaceMask::ALL.count());
    assert!(FaceMask::NONE.is_empty());
}

#[test]
fn test_normals_and_offsets() {
    assert_eq!(Vec3::NEG_X, Face::NegX.normal());
    assert_eq!(Vec3::X, Face::PosX.normal());
    assert_eq!(Vec3::NEG_Y, Face::NegY.normal());
    assert_eq!(Vec3::Y, Face::PosY.normal());
    assert_eq!(Vec3::NEG_Z, Face::NegZ.normal());
    assert_eq!(IVec3::Z, Face::PosZ.offset());
}

#[test]
fn test_winding_matches_normals() {
    let mut buffers = MeshBuffers::default();
    emit_cube(Vec3::new(10., -5., 3.), 2., FaceMask::ALL, &mut buffers);
    assert_eq!(24, buffers.positions.len());
    assert_eq!(36, buffers.indices.len());
    assert!(buffers.is_consistent());

    for triangle in buffers.indices.chunks_exact(3) {
        let [a, b, c] = [0, 1, 2].map(|i| Vec3::from_array(buffers.positions[triangle[i] as usize]));
        let winding = (b - a).cross(c - a).normalize();
        let normal = Vec3::from_array(buffers.normals[triangle[0] as usize]);
        assert_eq!(normal, winding);
    }
}

#[test]
fn test_emit_only_masked_faces() {
    let mut buffers = MeshBuffers::default();
    emit_cube(Vec3::ZERO, 1., FaceMask::NONE, &mut buffers);
    assert!(buffers.is_empty());

    emit_cube(Vec3::ZERO, 1., FaceMask::NONE.with(Face::PosY), &mut buffers);
    assert_eq!(4, buffers.positions.len());
    assert_eq!(vec![0, 1, 2, 0, 2, 3], buffers.indices);
    assert!(buffers.normals.iter().all(|n| *n == [0., 1., 0.]));
    assert_eq!(QUAD_UVS.to_vec(), buffers.uvs);
    assert!(buffers.positions.iter().all(|p| p[1] == 1.));

    // Appending keeps the earlier face and offsets the new indices
    emit_cube(Vec3::ZERO, 1., FaceMask::NONE.with(Face::NegY), &mut buffers);
    assert_eq!(&[4, 5, 6, 4, 6, 7], &buffers.indices[6..]);
}
