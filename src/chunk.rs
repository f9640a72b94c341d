use fast_surface_nets::ndshape::{ConstShape3u32, Shape};

use crate::{shape::FillShape, Voxel, CHUNK_BOUNDS, CHUNK_SIDES, CHUNK_VOXELS};

use bevy::prelude::*;

const CHUNK_SHAPE: ConstShape3u32<CHUNK_BOUNDS, CHUNK_BOUNDS, CHUNK_BOUNDS> =
    ConstShape3u32::<CHUNK_BOUNDS, CHUNK_BOUNDS, CHUNK_BOUNDS>;

/// Chunk is the voxel grid of the sphere. The grid always holds exactly [CHUNK_VOXELS] voxels,
/// stored flat and indexed by `x + CHUNK_SIDES * (y + CHUNK_SIDES * z)`
#[derive(Component, Clone, PartialEq, Eq)]
pub struct Chunk(Box<[Voxel; CHUNK_VOXELS]>);

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("occupied", &self.occupied_count())
            .finish()
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::air()
    }
}

impl Chunk {
    /// Get a Chunk made from only empty air voxels
    pub fn air() -> Self {
        Self::filled(Voxel::AIR)
    }

    /// Get a Chunk where every cell holds the given voxel
    pub fn filled(voxel: Voxel) -> Self {
        Self(Box::new([voxel; CHUNK_VOXELS]))
    }

    /// Get a Chunk filled with [Voxel::STONE] wherever the shape contains the coordinate
    pub fn from_shape(shape: &impl FillShape) -> Self {
        let mut chunk = Self::air();
        chunk.fill_shape(shape);
        chunk
    }

    /// Returns the coordinate as an in-grid coordinate, or None if any axis is outside of
    /// `0..CHUNK_SIDES`
    pub fn contains(pos: IVec3) -> Option<UVec3> {
        let range = 0..CHUNK_SIDES as i32;
        if !range.contains(&pos.x) || !range.contains(&pos.y) || !range.contains(&pos.z) {
            return None;
        }
        Some(pos.as_uvec3())
    }

    /// Set every cell to stone if the predicate holds for its coordinate, and to air otherwise
    pub fn fill(&mut self, mut predicate: impl FnMut(UVec3) -> bool) {
        for (i, voxel) in self.0.iter_mut().enumerate() {
            let pos = UVec3::from_array(CHUNK_SHAPE.delinearize(i as u32));
            *voxel = if predicate(pos) {
                Voxel::STONE
            } else {
                Voxel::AIR
            };
        }
    }

    /// Fill the chunk with the given [FillShape]
    pub fn fill_shape(&mut self, shape: &impl FillShape) {
        self.fill(|pos| shape.contains(pos));
    }

    /// Get the voxel at the specified coordinates. Panics when the coordinates are outside of the
    /// grid
    pub fn get_voxel(&self, pos: UVec3) -> Voxel {
        self.0[Self::index(pos)]
    }

    /// Set the voxel at the specified coordinates. Panics when the coordinates are outside of the
    /// grid
    pub fn set_voxel(&mut self, pos: UVec3, voxel: Voxel) {
        self.0[Self::index(pos)] = voxel;
    }

    /// Whether the voxel at the coordinates is occupied. Coordinates outside of the grid are
    /// never occupied
    pub fn is_occupied(&self, pos: IVec3) -> bool {
        Self::contains(pos).is_some_and(|pos| self.get_voxel(pos).is_occupied())
    }

    /// Clear the voxel at the coordinates, returning whether a voxel was removed. Out of range
    /// and already empty coordinates are left untouched
    pub fn clear(&mut self, pos: IVec3) -> bool {
        let Some(pos) = Self::contains(pos) else {
            return false;
        };
        if self.get_voxel(pos).is_empty() {
            return false;
        }
        self.set_voxel(pos, Voxel::AIR);
        true
    }

    /// The number of occupied voxels in the chunk
    pub fn occupied_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_occupied()).count()
    }

    /// Iterate over the coordinates of all occupied voxels, in storage order
    pub fn occupied(&self) -> impl Iterator<Item = UVec3> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_occupied())
            .map(|(i, _)| UVec3::from_array(CHUNK_SHAPE.delinearize(i as u32)))
    }

    fn index(pos: UVec3) -> usize {
        assert!(
            pos.cmplt(UVec3::splat(CHUNK_BOUNDS)).all(),
            "voxel {pos} outside of chunk"
        );
        CHUNK_SHAPE.linearize(pos.to_array()) as usize
    }
}

#[test]
fn test_flat_index_layout() {
    assert_eq!(0, Chunk::index(UVec3::new(0, 0, 0)));
    assert_eq!(1, Chunk::index(UVec3::new(1, 0, 0)));
    assert_eq!(CHUNK_SIDES, Chunk::index(UVec3::new(0, 1, 0)));
    assert_eq!(CHUNK_SIDES * CHUNK_SIDES, Chunk::index(UVec3::new(0, 0, 1)));
    assert_eq!(CHUNK_VOXELS - 1, Chunk::index(UVec3::splat(CHUNK_BOUNDS - 1)));
}

#[test]
fn test_out_of_range_is_empty() {
    let chunk = Chunk::filled(Voxel::STONE);
    assert!(chunk.is_occupied(IVec3::new(0, 0, 0)));
    assert!(chunk.is_occupied(IVec3::splat(CHUNK_SIDES as i32 - 1)));
    assert!(!chunk.is_occupied(IVec3::new(-1, 0, 0)));
    assert!(!chunk.is_occupied(IVec3::new(0, CHUNK_SIDES as i32, 0)));
    assert!(!chunk.is_occupied(IVec3::new(0, 0, 200)));
}

#[test]
fn test_clear() {
    let mut chunk = Chunk::filled(Voxel::STONE);
    assert!(chunk.clear(IVec3::new(3, 4, 5)));
    assert!(!chunk.is_occupied(IVec3::new(3, 4, 5)));
    assert_eq!(CHUNK_VOXELS - 1, chunk.occupied_count());

    // Clearing again, or outside the grid, changes nothing
    assert!(!chunk.clear(IVec3::new(3, 4, 5)));
    assert!(!chunk.clear(IVec3::new(-1, 4, 5)));
    assert!(!chunk.clear(IVec3::new(3, 16, 5)));
    assert_eq!(CHUNK_VOXELS - 1, chunk.occupied_count());
}

#[test]
fn test_fill_predicate() {
    let mut chunk = Chunk::filled(Voxel::new(7));
    chunk.fill(|pos| pos.y < 4);
    assert_eq!(4 * CHUNK_SIDES * CHUNK_SIDES, chunk.occupied_count());
    assert!(chunk.is_occupied(IVec3::new(15, 3, 15)));
    assert!(!chunk.is_occupied(IVec3::new(0, 4, 0)));
    assert!(chunk.occupied().all(|pos| pos.y < 4));
}

#[test]
fn test_contains() {
    assert_eq!(Some(UVec3::new(1, 2, 3)), Chunk::contains(IVec3::new(1, 2, 3)));
    assert_eq!(None, Chunk::contains(IVec3::new(16, 0, 0)));
    assert_eq!(None, Chunk::contains(IVec3::new(0, -1, 0)));
    assert_eq!(None, Chunk::contains(IVec3::new(0, 0, -16)));
}
