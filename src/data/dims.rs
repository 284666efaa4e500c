//! Block dimensions of a domain's local index space.

use serde::{Deserialize, Serialize};

/// Extent of a domain's local index space; `index = x + y·nx + z·nx·ny`.
///
/// Node-centered fields use `size + 1` per axis ([`BlockDims::nodal`]),
/// element-centered fields use `size` ([`BlockDims::elemental`]).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockDims {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl BlockDims {
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Node dimensions of a block of `sx × sy × sz` elements.
    pub const fn nodal(sx: usize, sy: usize, sz: usize) -> Self {
        Self::new(sx + 1, sy + 1, sz + 1)
    }

    pub const fn elemental(sx: usize, sy: usize, sz: usize) -> Self {
        Self::new(sx, sy, sz)
    }

    /// Number of local indices.
    #[inline]
    pub const fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub const fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.nx + z * self.nx * self.ny
    }

    /// Largest face: `max(nx·ny, nx·nz, ny·nz)`.
    pub fn max_face(&self) -> usize {
        (self.nx * self.ny).max(self.nx * self.nz).max(self.ny * self.nz)
    }

    /// Longest edge: `max(nx, ny, nz)`.
    pub fn max_edge(&self) -> usize {
        self.nx.max(self.ny).max(self.nz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodal_adds_one_per_axis() {
        let d = BlockDims::nodal(2, 3, 4);
        assert_eq!((d.nx, d.ny, d.nz), (3, 4, 5));
        assert_eq!(d.len(), 60);
        assert_eq!(d.max_face(), 20);
        assert_eq!(d.max_edge(), 5);
    }

    #[test]
    fn index_is_col_fastest() {
        let d = BlockDims::new(3, 4, 5);
        assert_eq!(d.index(1, 0, 0), 1);
        assert_eq!(d.index(0, 1, 0), 3);
        assert_eq!(d.index(0, 0, 1), 12);
        assert_eq!(d.index(2, 3, 4), d.len() - 1);
    }
}
