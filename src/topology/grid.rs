//! Rank ↔ logical position mapping for a `tp × tp × tp` domain grid.
//!
//! One domain per rank; ranks are laid out col-fastest, then row, then plane.

use crate::halo_error::HaloError;
use crate::topology::direction::Direction;
use serde::{Deserialize, Serialize};

/// Coordinates of a domain in the logical grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalPosition {
    pub col: usize,
    pub row: usize,
    pub plane: usize,
}

impl LogicalPosition {
    #[inline]
    pub fn from_rank(rank: usize, tp: usize) -> Self {
        Self {
            col: rank % tp,
            row: (rank / tp) % tp,
            plane: rank / (tp * tp),
        }
    }

    #[inline]
    pub fn to_rank(self, tp: usize) -> usize {
        self.plane * tp * tp + self.row * tp + self.col
    }

    /// True if stepping in `dir` stays inside a `tp³` grid.
    pub fn can_step(self, dir: Direction, tp: usize) -> bool {
        let ok = |coord: usize, delta: i8| match delta {
            -1 => coord > 0,
            1 => coord + 1 < tp,
            _ => true,
        };
        ok(self.col, dir.dx()) && ok(self.row, dir.dy()) && ok(self.plane, dir.dz())
    }
}

/// A rank's place in the domain grid. Immutable for a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainGrid {
    rank: usize,
    world_size: usize,
    tp: usize,
    position: LogicalPosition,
}

impl DomainGrid {
    /// Validate `(rank, world_size, tp)` and compute the position.
    pub fn new(rank: usize, world_size: usize, tp: usize) -> Result<Self, HaloError> {
        if tp == 0 || tp.checked_pow(3) != Some(world_size) {
            return Err(HaloError::InvalidGrid { tp, world_size });
        }
        if rank >= world_size {
            return Err(HaloError::RankOutOfRange { rank, world_size });
        }
        Ok(Self {
            rank,
            world_size,
            tp,
            position: LogicalPosition::from_rank(rank, tp),
        })
    }

    /// Like [`DomainGrid::new`], deriving `tp` as the cube root of `world_size`.
    pub fn from_world(rank: usize, world_size: usize) -> Result<Self, HaloError> {
        let tp = integer_cbrt(world_size);
        Self::new(rank, world_size, tp)
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn world_size(&self) -> usize {
        self.world_size
    }

    #[inline]
    pub fn tp(&self) -> usize {
        self.tp
    }

    #[inline]
    pub fn position(&self) -> LogicalPosition {
        self.position
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        self.world_size == 1
    }

    /// Rank of the neighbor in `dir`, or `None` if `dir` leaves the grid.
    pub fn neighbor_rank(&self, dir: Direction) -> Option<usize> {
        if !self.position.can_step(dir, self.tp) {
            return None;
        }
        let r = self.rank as isize + dir.rank_offset(self.tp);
        debug_assert!(
            (0..self.world_size as isize).contains(&r),
            "neighbor rank {r} out of range for {dir:?} from rank {}",
            self.rank
        );
        Some(r as usize)
    }
}

/// Largest `t` with `t³ <= n`.
fn integer_cbrt(n: usize) -> usize {
    let mut t = (n as f64).cbrt().round() as usize;
    while t > 0 && t.saturating_pow(3) > n {
        t -= 1;
    }
    while (t + 1).saturating_pow(3) <= n {
        t += 1;
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_round_trips_rank() {
        for tp in 1..5 {
            for rank in 0..tp * tp * tp {
                let p = LogicalPosition::from_rank(rank, tp);
                assert!(p.col < tp && p.row < tp && p.plane < tp);
                assert_eq!(p.to_rank(tp), rank);
            }
        }
    }

    #[test]
    fn lulesh_layout_is_col_fastest() {
        let p = LogicalPosition::from_rank(5, 2);
        assert_eq!((p.col, p.row, p.plane), (1, 0, 1));
    }

    #[test]
    fn rejects_non_cubic_world() {
        assert!(matches!(
            DomainGrid::from_world(0, 7),
            Err(HaloError::InvalidGrid { world_size: 7, .. })
        ));
        assert!(matches!(
            DomainGrid::new(0, 8, 0),
            Err(HaloError::InvalidGrid { tp: 0, .. })
        ));
        assert!(matches!(
            DomainGrid::new(8, 8, 2),
            Err(HaloError::RankOutOfRange { rank: 8, .. })
        ));
    }

    #[test]
    fn cube_roots() {
        assert_eq!(integer_cbrt(1), 1);
        assert_eq!(integer_cbrt(8), 2);
        assert_eq!(integer_cbrt(27), 3);
        assert_eq!(integer_cbrt(64), 4);
        assert_eq!(integer_cbrt(1000), 10);
        assert_eq!(integer_cbrt(26), 2);
    }

    #[test]
    fn neighbor_rank_uses_signed_offsets() {
        let g = DomainGrid::new(13, 27, 3).unwrap();
        assert_eq!(g.position(), LogicalPosition { col: 1, row: 1, plane: 1 });
        assert_eq!(g.neighbor_rank(Direction::new(0, 0, -1)), Some(4));
        assert_eq!(g.neighbor_rank(Direction::new(1, 1, 1)), Some(26));
        assert_eq!(g.neighbor_rank(Direction::new(-1, -1, -1)), Some(0));
        let corner = DomainGrid::new(0, 27, 3).unwrap();
        assert_eq!(corner.neighbor_rank(Direction::new(-1, 0, 0)), None);
    }
}
