//! CommBuffer: contiguous send/receive storage owned by one domain.

use crate::algs::wire::{cast_slice, cast_slice_mut};
use crate::data::field::HaloValue;
use crate::data::layout::BufferLayout;
use crate::data::slot::MessageSlot;

/// Flat message storage addressed through [`MessageSlot`]s.
///
/// Reused across exchange rounds. A slot must not be written while a
/// transport operation on it is still in flight.
#[derive(Clone, Debug)]
pub struct CommBuffer<V> {
    data: Vec<V>,
}

impl<V: HaloValue> CommBuffer<V> {
    pub fn new(layout: &BufferLayout) -> Self {
        Self::with_len(layout.capacity())
    }

    pub fn with_len(len: usize) -> Self {
        Self {
            data: vec![V::zero(); len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[V] {
        &self.data
    }

    #[inline]
    pub fn slot(&self, slot: &MessageSlot) -> &[V] {
        &self.data[slot.range()]
    }

    #[inline]
    pub fn slot_mut(&mut self, slot: &MessageSlot) -> &mut [V] {
        &mut self.data[slot.range()]
    }

    /// Message bytes of `slot`, as handed to the transport.
    #[inline]
    pub fn slot_bytes(&self, slot: &MessageSlot) -> &[u8] {
        cast_slice(self.slot(slot))
    }

    #[inline]
    pub fn slot_bytes_mut(&mut self, slot: &MessageSlot) -> &mut [u8] {
        cast_slice_mut(self.slot_mut(slot))
    }
}
