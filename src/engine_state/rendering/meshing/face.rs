//! Quad geometry and ambient occlusion for a single voxel face.

use crate::engine_state::rendering::vertex::VoxelVertex;
use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::LightLevel;
use crate::engine_state::voxels::chunk::padded::PaddedChunk;

/// Unit-cube corners of each face, in counter-clockwise order seen from
/// outside: lower-left, lower-right, upper-right, upper-left. The corner
/// index doubles as the UV corner selector.
const FACE_CORNERS: [[[i32; 3]; 4]; 6] = [
    // FRONT (+Z)
    [[0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1]],
    // BACK (-Z)
    [[0, 0, 0], [0, 1, 0], [1, 1, 0], [1, 0, 0]],
    // BOTTOM (-Y)
    [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]],
    // TOP (+Y)
    [[0, 1, 0], [0, 1, 1], [1, 1, 1], [1, 1, 0]],
    // LEFT (-X)
    [[0, 0, 0], [0, 0, 1], [0, 1, 1], [0, 1, 0]],
    // RIGHT (+X)
    [[1, 0, 0], [1, 1, 0], [1, 1, 1], [1, 0, 1]],
];

/// Triangles sharing the ll-ur diagonal.
const TRIANGLES: [usize; 6] = [0, 1, 2, 2, 3, 0];
/// Triangles sharing the lr-ul diagonal.
const TRIANGLES_FLIPPED: [usize; 6] = [1, 2, 3, 3, 0, 1];

/// Full brightness, no occlusion.
pub const AO_UNOCCLUDED: u8 = 3;

/// Corner offsets of `side` on the unit cube.
pub fn face_corners(side: BlockSide) -> &'static [[i32; 3]; 4] {
    &FACE_CORNERS[side as usize]
}

/// Occlusion level from the two side neighbors and the corner neighbor of a vertex.
///
/// Both sides occluded is fully dark regardless of the corner.
pub fn ao_level(side1: bool, side2: bool, corner: bool) -> u8 {
    if side1 && side2 {
        0
    } else {
        AO_UNOCCLUDED - (side1 as u8 + side2 as u8 + corner as u8)
    }
}

/// Computes the occlusion level of each corner of a unit face.
///
/// The neighbors are sampled in the layer the face looks into: for each
/// corner, one step along each of the face's two tangent axes toward the
/// corner, and one diagonal step along both.
///
/// # Arguments
/// * `snapshot` - Padded chunk the face belongs to
/// * `origin` - Local position of the voxel owning the face
/// * `side` - Face being emitted
pub fn corner_ao(snapshot: &PaddedChunk, origin: [i32; 3], side: BlockSide) -> [u8; 4] {
    let normal = side.normal();
    let plane = [origin[0] + normal.x, origin[1] + normal.y, origin[2] + normal.z];
    let axis = side.axis();
    let (a, b) = ((axis + 1) % 3, (axis + 2) % 3);

    let occludes = |p: [i32; 3]| snapshot.block(p[0], p[1], p[2]).class().occludes();

    let mut levels = [AO_UNOCCLUDED; 4];
    for (level, corner) in levels.iter_mut().zip(face_corners(side)) {
        let da = corner[a] * 2 - 1;
        let db = corner[b] * 2 - 1;

        let mut s1 = plane;
        s1[a] += da;
        let mut s2 = plane;
        s2[b] += db;
        let mut c = s1;
        c[b] += db;

        *level = ao_level(occludes(s1), occludes(s2), occludes(c));
    }
    levels
}

/// One visible quad, ready to be split into two triangles.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// Local position of the owning cell's minimum corner
    pub origin: [i32; 3],
    /// Edge length of the quad in voxels
    pub size: i32,
    /// Which side of the block this face represents
    pub side: BlockSide,
    /// Texture-atlas layer
    pub layer: u32,
    /// Whether the texture is animated
    pub animated: bool,
    /// Occlusion level per corner (ll, lr, ur, ul)
    pub ao: [u8; 4],
    /// Light of the voxel the face looks into
    pub light: LightLevel,
}

impl Face {
    /// Appends the 6 vertices of this face to `out`.
    ///
    /// When occlusion differs across the two diagonals the quad is split
    /// along the brighter one so the darkening interpolates symmetrically.
    pub fn emit(&self, out: &mut Vec<VoxelVertex>) {
        let corners = face_corners(self.side);
        let order = if self.ao[0] + self.ao[2] < self.ao[1] + self.ao[3] {
            &TRIANGLES_FLIPPED
        } else {
            &TRIANGLES
        };

        for &corner in order {
            let offset = corners[corner];
            let pos = [
                (self.origin[0] + offset[0] * self.size) as u32,
                (self.origin[1] + offset[1] * self.size) as u32,
                (self.origin[2] + offset[2] * self.size) as u32,
            ];
            out.push(VoxelVertex::new(
                pos,
                corner as u8,
                self.layer,
                self.animated,
                self.ao[corner],
                self.light,
                self.side,
            ));
        }
    }
}
