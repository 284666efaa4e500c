//! Neighbor directions of a block in the 3D domain grid.
//!
//! A [`Direction`] is a vector in {−1,0,1}³ without the zero vector, stored as
//! `(dx, dy, dz)` = (col, row, plane) offsets. The 26 directions are listed
//! once, in canonical order, in [`DIRECTIONS`]; every exchange loop walks that
//! table instead of spelling out the cases.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use std::fmt;

/// Grid/mesh axis. `Col` is the fastest varying mesh index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Col,
    Row,
    Plane,
}

/// Neighbor class by number of nonzero components.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NeighborClass {
    /// Shares a 2D face (one nonzero component).
    Face,
    /// Shares a 1D edge (two nonzero components).
    Edge,
    /// Shares a single point (three nonzero components).
    Corner,
}

/// Memory-access shape of the boundary region a direction selects.
///
/// The shape follows from which axes are pinned: a plane-normal face is one
/// contiguous run, a row-normal face is a stack of col-pencils, a col-normal
/// face touches every `nx`-th value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionShape {
    Contiguous,
    Pencils,
    Strided,
    /// Edge running along the given axis.
    Line(Axis),
    Point,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Direction {
    dx: i8,
    dy: i8,
    dz: i8,
}

impl Direction {
    /// Build a direction from col/row/plane offsets.
    ///
    /// # Panics
    /// Panics if a component is outside {−1,0,1} or all are zero.
    pub const fn new(dx: i8, dy: i8, dz: i8) -> Self {
        match Self::try_new(dx, dy, dz) {
            Some(d) => d,
            None => panic!("direction components must be in {{-1,0,1}} and not all zero"),
        }
    }

    pub const fn try_new(dx: i8, dy: i8, dz: i8) -> Option<Self> {
        let in_range = dx >= -1 && dx <= 1 && dy >= -1 && dy <= 1 && dz >= -1 && dz <= 1;
        if !in_range || (dx == 0 && dy == 0 && dz == 0) {
            return None;
        }
        Some(Self { dx, dy, dz })
    }

    #[inline]
    pub const fn dx(self) -> i8 {
        self.dx
    }

    #[inline]
    pub const fn dy(self) -> i8 {
        self.dy
    }

    #[inline]
    pub const fn dz(self) -> i8 {
        self.dz
    }

    /// Component along `axis`.
    #[inline]
    pub const fn along(self, axis: Axis) -> i8 {
        match axis {
            Axis::Col => self.dx,
            Axis::Row => self.dy,
            Axis::Plane => self.dz,
        }
    }

    pub const fn nonzero_count(self) -> usize {
        (self.dx != 0) as usize + (self.dy != 0) as usize + (self.dz != 0) as usize
    }

    pub const fn class(self) -> NeighborClass {
        match self.nonzero_count() {
            1 => NeighborClass::Face,
            2 => NeighborClass::Edge,
            _ => NeighborClass::Corner,
        }
    }

    pub const fn shape(self) -> RegionShape {
        match self.class() {
            NeighborClass::Face if self.dz != 0 => RegionShape::Contiguous,
            NeighborClass::Face if self.dy != 0 => RegionShape::Pencils,
            NeighborClass::Face => RegionShape::Strided,
            NeighborClass::Edge if self.dx == 0 => RegionShape::Line(Axis::Col),
            NeighborClass::Edge if self.dy == 0 => RegionShape::Line(Axis::Row),
            NeighborClass::Edge => RegionShape::Line(Axis::Plane),
            NeighborClass::Corner => RegionShape::Point,
        }
    }

    pub const fn opposite(self) -> Self {
        Self {
            dx: -self.dx,
            dy: -self.dy,
            dz: -self.dz,
        }
    }

    /// True when the neighbor in this direction has the higher rank: the
    /// first nonzero component in (plane, row, col) order is positive.
    pub const fn is_upward(self) -> bool {
        if self.dz != 0 {
            self.dz > 0
        } else if self.dy != 0 {
            self.dy > 0
        } else {
            self.dx > 0
        }
    }

    /// Rank distance to the neighbor in a `tp³` grid: `dz·tp² + dy·tp + dx`.
    pub const fn rank_offset(self, tp: usize) -> isize {
        let tp = tp as isize;
        self.dz as isize * tp * tp + self.dy as isize * tp + self.dx as isize
    }

    /// Position of this direction in [`DIRECTIONS`].
    #[inline]
    pub const fn canonical_index(self) -> usize {
        CANONICAL_INDEX[lattice_key(self.dx, self.dy, self.dz)] as usize
    }
}

impl fmt::Debug for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Direction({:+}, {:+}, {:+})", self.dx, self.dy, self.dz)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 3] = ["-", "", "+"];
        let mut first = true;
        for (sign, name) in [(self.dz, "plane"), (self.dy, "row"), (self.dx, "col")] {
            if sign != 0 {
                if !first {
                    f.write_str(",")?;
                }
                write!(f, "{}{}", NAMES[(sign + 1) as usize], name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// One row of the canonical direction table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DirectionDescriptor {
    pub direction: Direction,
    pub class: NeighborClass,
    pub shape: RegionShape,
}

impl DirectionDescriptor {
    const fn of(dx: i8, dy: i8, dz: i8) -> Self {
        let direction = Direction::new(dx, dy, dz);
        Self {
            direction,
            class: direction.class(),
            shape: direction.shape(),
        }
    }
}

/// All 26 directions in canonical order: the six faces (−plane, +plane,
/// −row, +row, −col, +col), then the twelve edges, then the eight corners.
pub static DIRECTIONS: [DirectionDescriptor; 26] = TABLE;

const TABLE: [DirectionDescriptor; 26] = [
    // faces
    DirectionDescriptor::of(0, 0, -1),
    DirectionDescriptor::of(0, 0, 1),
    DirectionDescriptor::of(0, -1, 0),
    DirectionDescriptor::of(0, 1, 0),
    DirectionDescriptor::of(-1, 0, 0),
    DirectionDescriptor::of(1, 0, 0),
    // edges
    DirectionDescriptor::of(-1, -1, 0),
    DirectionDescriptor::of(0, -1, -1),
    DirectionDescriptor::of(-1, 0, -1),
    DirectionDescriptor::of(1, 1, 0),
    DirectionDescriptor::of(0, 1, 1),
    DirectionDescriptor::of(1, 0, 1),
    DirectionDescriptor::of(-1, 1, 0),
    DirectionDescriptor::of(0, -1, 1),
    DirectionDescriptor::of(-1, 0, 1),
    DirectionDescriptor::of(1, -1, 0),
    DirectionDescriptor::of(0, 1, -1),
    DirectionDescriptor::of(1, 0, -1),
    // corners
    DirectionDescriptor::of(-1, -1, -1),
    DirectionDescriptor::of(-1, -1, 1),
    DirectionDescriptor::of(1, -1, -1),
    DirectionDescriptor::of(1, -1, 1),
    DirectionDescriptor::of(-1, 1, -1),
    DirectionDescriptor::of(-1, 1, 1),
    DirectionDescriptor::of(1, 1, -1),
    DirectionDescriptor::of(1, 1, 1),
];

const fn lattice_key(dx: i8, dy: i8, dz: i8) -> usize {
    ((dx + 1) + (dy + 1) * 3 + (dz + 1) * 9) as usize
}

const CANONICAL_INDEX: [u8; 27] = {
    let mut out = [u8::MAX; 27];
    let mut i = 0;
    while i < TABLE.len() {
        let d = TABLE[i].direction;
        out[lattice_key(d.dx, d.dy, d.dz)] = i as u8;
        i += 1;
    }
    out
};

const fn count_class(class: NeighborClass) -> usize {
    let mut n = 0;
    let mut i = 0;
    while i < TABLE.len() {
        if TABLE[i].class as u8 == class as u8 {
            n += 1;
        }
        i += 1;
    }
    n
}

const fn table_is_classed_in_order() -> bool {
    let mut i = 1;
    while i < TABLE.len() {
        if (TABLE[i - 1].class as u8) > (TABLE[i].class as u8) {
            return false;
        }
        i += 1;
    }
    true
}

const fn table_is_complete() -> bool {
    // every non-center lattice point appears exactly once
    let mut key = 0;
    while key < 27 {
        if key != 13 && CANONICAL_INDEX[key] == u8::MAX {
            return false;
        }
        key += 1;
    }
    CANONICAL_INDEX[13] == u8::MAX
}

const_assert!(count_class(NeighborClass::Face) == 6);
const_assert!(count_class(NeighborClass::Edge) == 12);
const_assert!(count_class(NeighborClass::Corner) == 8);
const_assert!(table_is_classed_in_order());
const_assert!(table_is_complete());
