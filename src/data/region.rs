//! Boundary regions: which local indices a neighbor direction shares.
//!
//! Every region is a (possibly degenerate) two-level strided loop
//! `base + o·outer.stride + i·inner.stride`, plane outermost and col
//! innermost. That single form covers contiguous faces, pencil faces,
//! strided faces, edges and corners.

use crate::data::dims::BlockDims;
use crate::topology::direction::{Direction, RegionShape};
use itertools::iproduct;

/// One loop level of a region.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub count: usize,
    pub stride: usize,
}

impl Span {
    const UNIT: Span = Span { count: 1, stride: 0 };
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Region {
    base: usize,
    outer: Span,
    inner: Span,
    shape: RegionShape,
}

impl Region {
    /// Region of `dims` shared with the neighbor in `dir`.
    ///
    /// Axes with a nonzero component are pinned to 0 (for −1) or `n − 1`
    /// (for +1); the others run over their full extent.
    pub fn boundary(dir: Direction, dims: BlockDims) -> Self {
        let pin = |delta: i8, n: usize| if delta > 0 { n.saturating_sub(1) } else { 0 };
        let base = dims.index(
            pin(dir.dx(), dims.nx),
            pin(dir.dy(), dims.ny),
            pin(dir.dz(), dims.nz),
        );
        let axes = [
            (dir.dz(), Span { count: dims.nz, stride: dims.nx * dims.ny }),
            (dir.dy(), Span { count: dims.ny, stride: dims.nx }),
            (dir.dx(), Span { count: dims.nx, stride: 1 }),
        ];
        let mut free = axes.iter().filter(|(d, _)| *d == 0).map(|(_, s)| *s);
        let (outer, inner) = match (free.next(), free.next()) {
            (Some(o), Some(i)) => (o, i),
            (Some(i), None) => (Span::UNIT, i),
            _ => (Span::UNIT, Span::UNIT),
        };
        let empty = dims.is_empty();
        Self {
            base,
            outer: if empty { Span { count: 0, stride: 0 } } else { outer },
            inner,
            shape: dir.shape(),
        }
    }

    /// Contiguous run `start..start + len`, used for ghost strips.
    pub fn strip(start: usize, len: usize) -> Self {
        Self {
            base: start,
            outer: Span::UNIT,
            inner: Span { count: len, stride: 1 },
            shape: RegionShape::Contiguous,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.outer.count * self.inner.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn shape(&self) -> RegionShape {
        self.shape
    }

    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    /// Largest index touched, if any.
    pub fn last(&self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        Some(
            self.base
                + (self.outer.count - 1) * self.outer.stride
                + (self.inner.count - 1) * self.inner.stride,
        )
    }

    /// Local indices in enumeration order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + use<> {
        let Region { base, outer, inner, .. } = *self;
        iproduct!(0..outer.count, 0..inner.count)
            .map(move |(o, i)| base + o * outer.stride + i * inner.stride)
    }
}
