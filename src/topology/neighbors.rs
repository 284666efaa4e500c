//! Active neighbor sets: the directions a domain actually talks to.

use crate::topology::direction::{DIRECTIONS, Direction, DirectionDescriptor, NeighborClass};
use crate::topology::grid::{DomainGrid, LogicalPosition};

/// Directions that do not cross the grid boundary, in canonical order.
///
/// Cheap to build (a 26-bit mask); recomputed on every exchange call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct ActiveNeighborSet {
    mask: u32,
}

impl ActiveNeighborSet {
    #[inline]
    pub fn contains(&self, dir: Direction) -> bool {
        self.mask & (1 << dir.canonical_index()) != 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mask.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// Descriptors of the active directions, canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &'static DirectionDescriptor> + use<> {
        let mask = self.mask;
        DIRECTIONS
            .iter()
            .enumerate()
            .filter(move |(i, _)| mask & (1 << i) != 0)
            .map(|(_, d)| d)
    }

    pub fn directions(&self) -> impl Iterator<Item = Direction> + use<> {
        self.iter().map(|d| d.direction)
    }

    pub fn count_class(&self, class: NeighborClass) -> usize {
        self.iter().filter(|d| d.class == class).count()
    }
}

/// Directions active for a domain at `position` in a `tp³` grid.
pub fn active_directions(position: LogicalPosition, tp: usize) -> ActiveNeighborSet {
    let mask = DIRECTIONS
        .iter()
        .enumerate()
        .filter(|(_, d)| position.can_step(d.direction, tp))
        .fold(0u32, |m, (i, _)| m | (1 << i));
    ActiveNeighborSet { mask }
}

impl DomainGrid {
    pub fn active_directions(&self) -> ActiveNeighborSet {
        active_directions(self.position(), self.tp())
    }
}
