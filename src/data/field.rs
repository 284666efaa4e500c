//! Field accessors: how the exchange engine reads and writes mesh storage.
//!
//! Callers hand the protocols an ordered list of accessors
//! (`&mut [&mut dyn FieldAccess<V>]`), one per transferred field. The list
//! order is the order fields appear inside every message.

use bytemuck::Pod;
use num_traits::NumAssign;
use std::fmt::Debug;

/// Numeric cell type that can travel through a halo exchange.
pub trait HaloValue: Pod + NumAssign + Debug + Send + Sync + 'static {}

impl<T> HaloValue for T where T: Pod + NumAssign + Debug + Send + Sync + 'static {}

/// Index → mutable numeric cell capability over one field.
pub trait FieldAccess<V: HaloValue> {
    /// Number of addressable cells.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, idx: usize) -> V;

    fn cell_mut(&mut self, idx: usize) -> &mut V;
}

impl<V: HaloValue> FieldAccess<V> for Vec<V> {
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }
    #[inline]
    fn get(&self, idx: usize) -> V {
        self[idx]
    }
    #[inline]
    fn cell_mut(&mut self, idx: usize) -> &mut V {
        &mut self[idx]
    }
}

impl<V: HaloValue> FieldAccess<V> for Box<[V]> {
    #[inline]
    fn len(&self) -> usize {
        <[V]>::len(self)
    }
    #[inline]
    fn get(&self, idx: usize) -> V {
        self[idx]
    }
    #[inline]
    fn cell_mut(&mut self, idx: usize) -> &mut V {
        &mut self[idx]
    }
}

impl<V: HaloValue> FieldAccess<V> for &mut [V] {
    #[inline]
    fn len(&self) -> usize {
        <[V]>::len(self)
    }
    #[inline]
    fn get(&self, idx: usize) -> V {
        self[idx]
    }
    #[inline]
    fn cell_mut(&mut self, idx: usize) -> &mut V {
        &mut self[idx]
    }
}
