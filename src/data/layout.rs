//! Communication buffer layout: per-class strides and cache padding.
//!
//! A domain reserves one slot per possible neighbor: six plane slots, twelve
//! edge slots and eight corner slots. Plane and edge sizes are rounded up to
//! the cache padding unit, and corner slots (a handful of values each) get a
//! whole padding unit so independent slots never share a cache line.

use crate::data::dims::BlockDims;
use crate::halo_error::HaloError;
use crate::topology::direction::NeighborClass;
use serde::{Deserialize, Serialize};

/// Cache line size assumed when none is configured.
pub const DEFAULT_CACHE_LINE_BYTES: usize = 128;

/// Per-call element strides of each slot class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStrides {
    pub plane: usize,
    pub edge: usize,
    pub corner: usize,
}

impl SlotStrides {
    #[inline]
    pub fn of(&self, class: NeighborClass) -> usize {
        match class {
            NeighborClass::Face => self.plane,
            NeighborClass::Edge => self.edge,
            NeighborClass::Corner => self.corner,
        }
    }

    /// Elements needed if all 26 slots are used.
    pub fn total(&self) -> usize {
        6 * self.plane + 12 * self.edge + 8 * self.corner
    }
}

/// Fixed per-domain layout, sized for the largest exchange the domain runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferLayout {
    max_fields: usize,
    plane_size: usize,
    edge_size: usize,
    pad: usize,
}

impl BufferLayout {
    /// Layout for up to `max_fields` fields of `value_size` bytes on blocks no
    /// larger than `max_dims`.
    pub fn new(
        max_fields: usize,
        max_dims: BlockDims,
        value_size: usize,
        cache_line_bytes: usize,
    ) -> Result<Self, HaloError> {
        if max_fields == 0 {
            return Err(HaloError::InvalidLayout("max_fields must be positive"));
        }
        if value_size == 0 {
            return Err(HaloError::InvalidLayout("value type must not be zero-sized"));
        }
        let pad = (cache_line_bytes / value_size).max(1);
        Ok(Self {
            max_fields,
            plane_size: align_up(max_dims.max_face(), pad),
            edge_size: align_up(max_dims.max_edge(), pad),
            pad,
        })
    }

    /// Layout for value type `V`.
    pub fn for_type<V>(
        max_fields: usize,
        max_dims: BlockDims,
        cache_line_bytes: usize,
    ) -> Result<Self, HaloError> {
        Self::new(max_fields, max_dims, size_of::<V>(), cache_line_bytes)
    }

    #[inline]
    pub fn max_fields(&self) -> usize {
        self.max_fields
    }

    /// Elements per padding unit.
    #[inline]
    pub fn pad(&self) -> usize {
        self.pad
    }

    /// Reserved (aligned) face size per field.
    #[inline]
    pub fn plane_size(&self) -> usize {
        self.plane_size
    }

    #[inline]
    pub fn edge_size(&self) -> usize {
        self.edge_size
    }

    pub fn strides(&self, field_count: usize) -> SlotStrides {
        debug_assert!(
            field_count <= self.max_fields,
            "{field_count} fields exceed the layout maximum of {}",
            self.max_fields
        );
        SlotStrides {
            plane: field_count * self.plane_size,
            edge: field_count * self.edge_size,
            corner: align_up(field_count, self.pad),
        }
    }

    /// Buffer length in elements.
    pub fn capacity(&self) -> usize {
        self.strides(self.max_fields).total()
    }

    /// True if a block of `dims` fits the reserved slot sizes.
    pub fn fits(&self, dims: &BlockDims) -> bool {
        dims.max_face() <= self.plane_size && dims.max_edge() <= self.edge_size
    }
}

#[inline]
fn align_up(n: usize, unit: usize) -> usize {
    n.div_ceil(unit) * unit
}
