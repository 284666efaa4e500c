//! Domain-grid topology: positions, the canonical direction table and
//! per-domain active neighbor sets.

pub mod direction;
pub mod grid;
pub mod neighbors;

pub use direction::{Axis, DIRECTIONS, Direction, DirectionDescriptor, NeighborClass, RegionShape};
pub use grid::{DomainGrid, LogicalPosition};
pub use neighbors::{ActiveNeighborSet, active_directions};
