//! This module is responsible for creating the blocky surface mesh of a chunk.
//! Every occupied voxel emits the faces that look at an empty neighbor, voxels outside of the
//! chunk count as empty so the outer shell is always closed

use crate::{
    face::{emit_cube, FaceMask},
    Chunk,
};

use bevy::prelude::*;

/// The vertex and index buffers of a mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    /// The vertex positions, in chunk local space
    pub positions: Vec<[f32; 3]>,
    /// Triangle list indices into the vertex buffers
    pub indices: Vec<u32>,
    /// One normal per position
    pub normals: Vec<[f32; 3]>,
    /// One texture coordinate per position
    pub uvs: Vec<[f32; 2]>,
}

impl MeshBuffers {
    /// Remove all data while keeping the allocations
    pub fn reset(&mut self) {
        self.positions.clear();
        self.indices.clear();
        self.normals.clear();
        self.uvs.clear();
    }

    /// Whether the mesh has no triangles
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The number of triangles in the mesh
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The number of quads in the mesh, every emitted face is one quad
    pub fn face_count(&self) -> usize {
        self.positions.len() / 4
    }

    /// Check the buffers describe a valid triangle list
    pub fn is_consistent(&self) -> bool {
        let len = self.positions.len();
        self.indices.len() % 3 == 0
            && self.normals.len() == len
            && self.uvs.len() == len
            && self.indices.iter().all(|i| (*i as usize) < len)
    }
}

/// Compute which faces of the voxel at `pos` border empty space
pub fn visible_faces(chunk: &Chunk, pos: UVec3) -> FaceMask {
    let pos = pos.as_ivec3();
    FaceMask::from_fn(|face| !chunk.is_occupied(pos + face.offset()))
}

/// Generate the mesh for a chunk into a reusable buffer. The buffer is cleared first, positions
/// are scaled by `voxel_size`
pub fn generate_mesh(chunk: &Chunk, voxel_size: f32, buffer: &mut MeshBuffers) {
    buffer.reset();
    for pos in chunk.occupied() {
        let mask = visible_faces(chunk, pos);
        if mask.is_empty() {
            continue;
        }
        emit_cube(pos.as_vec3() * voxel_size, voxel_size, mask, buffer);
    }
}

/// Generate the mesh for a chunk into a new buffer
pub fn build_mesh(chunk: &Chunk, voxel_size: f32) -> MeshBuffers {
    let mut buffer = MeshBuffers::default();
    generate_mesh(chunk, voxel_size, &mut buffer);
    buffer
}

/// The surface of a voxel sphere. It holds a single mesh section that is replaced as a whole
/// every time the chunk is meshed again. Rendering and collision read the section from here
#[derive(Component, Debug, Default)]
pub struct ChunkMesh {
    section: MeshBuffers,
    revision: u64,
}

impl ChunkMesh {
    /// The name of the one section of the surface
    pub const SECTION_NAME: &'static str = "voxel_sphere";

    /// Create a surface with the given mesh as its first section
    pub fn new(section: MeshBuffers) -> Self {
        let mut mesh = Self::default();
        mesh.submit(section);
        mesh
    }

    /// The current section
    pub fn section(&self) -> &MeshBuffers {
        &self.section
    }

    /// How many times a section has been submitted
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the section with a new mesh
    pub fn submit(&mut self, section: MeshBuffers) {
        debug_assert!(section.is_consistent(), "inconsistent mesh section");
        self.section = section;
        self.revision += 1;
    }

    /// Mesh the chunk again and replace the section with the result, reusing the allocations of
    /// the old section
    pub fn rebuild(&mut self, chunk: &Chunk, voxel_size: f32) {
        let mut section = std::mem::take(&mut self.section);
        generate_mesh(chunk, voxel_size, &mut section);
        self.submit(section);
    }
}

#[cfg(test)]
fn count_interior_pairs(chunk: &Chunk) -> usize {
    use crate::face::Face;

    chunk
        .occupied()
        .map(|pos| {
            [Face::PosX, Face::PosY, Face::PosZ]
                .into_iter()
                .filter(|face| chunk.is_occupied(pos.as_ivec3() + face.offset()))
                .count()
        })
        .sum()
}

#[test]
fn test_empty_chunk_has_no_triangles() {
    let mesh = build_mesh(&Chunk::air(), 1.);
    assert!(mesh.is_empty());
    assert!(mesh.positions.is_empty());
    assert!(mesh.is_consistent());
}

#[test]
fn test_full_chunk_only_has_boundary_faces() {
    use crate::{Voxel, CHUNK_SIDES, CHUNK_VOXELS};

    let chunk = Chunk::filled(Voxel::STONE);
    let mesh = build_mesh(&chunk, 1.);
    let interior_pairs = count_interior_pairs(&chunk);
    assert_eq!(3 * CHUNK_SIDES * CHUNK_SIDES * (CHUNK_SIDES - 1), interior_pairs);
    assert_eq!(6 * CHUNK_VOXELS - 2 * interior_pairs, mesh.face_count());
    assert_eq!(6 * CHUNK_SIDES * CHUNK_SIDES, mesh.face_count());
    assert_eq!(2 * mesh.face_count(), mesh.triangle_count());
    assert!(mesh.is_consistent());
}

#[test]
fn test_sphere_face_count() {
    use crate::shape::SphereShape;

    let chunk = Chunk::from_shape(&SphereShape::centered(5.));
    let mesh = build_mesh(&chunk, 50.);
    assert_eq!(
        6 * chunk.occupied_count() - 2 * count_interior_pairs(&chunk),
        mesh.face_count()
    );
    assert!(mesh.is_consistent());
}

#[test]
fn test_mesh_is_idempotent() {
    use crate::shape::SphereShape;

    let chunk = Chunk::from_shape(&SphereShape::centered(6.5));
    let first = build_mesh(&chunk, 50.);
    let second = build_mesh(&chunk, 50.);
    assert_eq!(first, second);

    let mut reused = build_mesh(&Chunk::air(), 3.);
    generate_mesh(&chunk, 50., &mut reused);
    assert_eq!(first, reused);
}

#[test]
fn test_removed_voxel_exposes_neighbors() {
    use crate::{Voxel, CHUNK_SIDES};

    let mut chunk = Chunk::filled(Voxel::STONE);
    let before = build_mesh(&chunk, 1.);

    // A voxel in the middle has six hidden faces. Removing it shows the six neighbor faces
    // around the hole
    let center = IVec3::splat(CHUNK_SIDES as i32 / 2);
    assert!(chunk.clear(center));
    let after = build_mesh(&chunk, 1.);
    assert_eq!(before.face_count() + 6, after.face_count());

    let hole = center.as_vec3();
    let hole_quads = after
        .positions
        .chunks_exact(4)
        .filter(|quad| {
            quad.iter().all(|p| {
                let local = Vec3::from_array(*p) - hole;
                local.cmpge(Vec3::ZERO).all() && local.cmple(Vec3::ONE).all()
            })
        })
        .count();
    assert_eq!(6, hole_quads);
}

#[test]
fn test_removed_boundary_voxel_faces_vanish() {
    use crate::Voxel;

    let mut chunk = Chunk::air();
    chunk.set_voxel(UVec3::new(0, 0, 0), Voxel::STONE);
    chunk.set_voxel(UVec3::new(1, 0, 0), Voxel::STONE);
    let mesh = build_mesh(&chunk, 1.);
    assert_eq!(10, mesh.face_count());

    assert!(chunk.clear(IVec3::new(0, 0, 0)));
    let mesh = build_mesh(&chunk, 1.);
    assert_eq!(6, mesh.face_count());
    assert!(mesh.positions.iter().all(|p| p[0] >= 1.));
}

#[test]
fn test_positions_scale_with_voxel_size() {
    use crate::Voxel;

    let mut chunk = Chunk::air();
    chunk.set_voxel(UVec3::new(2, 3, 4), Voxel::STONE);
    let mesh = build_mesh(&chunk, 50.);
    assert_eq!(6, mesh.face_count());
    for p in &mesh.positions {
        assert!([100., 150.].contains(&p[0]));
        assert!([150., 200.].contains(&p[1]));
        assert!([200., 250.].contains(&p[2]));
    }
}

#[test]
fn test_chunk_mesh_revision() {
    use crate::shape::SphereShape;

    let chunk = Chunk::from_shape(&SphereShape::centered(4.));
    let mut surface = ChunkMesh::new(build_mesh(&chunk, 1.));
    assert_eq!(1, surface.revision());
    let expected = surface.section().clone();

    surface.rebuild(&chunk, 1.);
    assert_eq!(2, surface.revision());
    assert_eq!(&expected, surface.section());
}
