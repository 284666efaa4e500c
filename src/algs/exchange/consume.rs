//! Consuming half of a round: wait per slot in canonical order and unpack.

use super::{ExchangeMask, ExchangeState, HaloExchange, PendingReceives};
use crate::algs::communicator::{Communicator, Wait};
use crate::algs::wire::copy_payload;
use crate::data::dims::BlockDims;
use crate::data::field::{FieldAccess, HaloValue};
use crate::data::region::Region;
use crate::data::slot::MessageSlot;
use crate::debug_invariants::DebugInvariants;
use crate::halo_error::HaloError;
use crate::pack::delta::{AddDelta, CopyDelta, Delta};
use crate::pack::packer::unpack;
use crate::topology::direction::NeighborClass;

impl<V: HaloValue, C: Communicator> HaloExchange<V, C> {
    /// Add every received boundary into the matching local boundary.
    ///
    /// Each shared node ends up with the sum over all domains that own it.
    /// Contributions are added in canonical receive order.
    pub fn combine_boundary(
        &mut self,
        pending: &mut PendingReceives<C::RecvHandle>,
        fields: &mut [&mut dyn FieldAccess<V>],
        dims: BlockDims,
    ) -> Result<(), HaloError> {
        self.consume::<AddDelta, _>("combine boundary", pending, fields, dims, |slot| {
            Some(Region::boundary(slot.direction, dims))
        })
    }

    /// Overwrite the local boundary with the copies received from the
    /// directions `mask` receives from. When several neighbors share a
    /// node, the last one in canonical order wins.
    pub fn sync_boundary(
        &mut self,
        pending: &mut PendingReceives<C::RecvHandle>,
        fields: &mut [&mut dyn FieldAccess<V>],
        dims: BlockDims,
        mask: ExchangeMask,
    ) -> Result<(), HaloError> {
        self.consume::<CopyDelta, _>("sync boundary", pending, fields, dims, |slot| {
            mask.receives_from(slot.direction)
                .then(|| Region::boundary(slot.direction, dims))
        })
    }

    /// Copy each received face into the ghost strip of every field.
    ///
    /// Faces land back to back starting at `ghost_start`, in canonical face
    /// order, skipping faces on the grid boundary.
    pub fn face_only_exchange(
        &mut self,
        pending: &mut PendingReceives<C::RecvHandle>,
        fields: &mut [&mut dyn FieldAccess<V>],
        element_dims: BlockDims,
        ghost_start: usize,
    ) -> Result<(), HaloError> {
        let mut cursor = ghost_start;
        self.consume::<CopyDelta, _>("exchange faces", pending, fields, element_dims, |slot| {
            debug_assert_eq!(slot.class, NeighborClass::Face, "{slot:?} is not a face");
            let n = Region::boundary(slot.direction, element_dims).len();
            let strip = Region::strip(cursor, n);
            cursor += n;
            Some(strip)
        })
    }

    /// Shared consume loop. `target` maps a slot to the region its payload is
    /// unpacked into, or `None` to drop it.
    ///
    /// The state and epoch checks run before any handle is taken, so a
    /// rejected token keeps its receives.
    fn consume<D, T>(
        &mut self,
        op: &'static str,
        pending: &mut PendingReceives<C::RecvHandle>,
        fields: &mut [&mut dyn FieldAccess<V>],
        dims: BlockDims,
        mut target: T,
    ) -> Result<(), HaloError>
    where
        D: Delta<V>,
        T: FnMut(&MessageSlot) -> Option<Region>,
    {
        self.expect_state(op, ExchangeState::AwaitingCompletion)?;
        if pending.epoch != self.epoch {
            return Err(HaloError::EpochMismatch {
                expected: self.epoch,
                got: pending.epoch,
            });
        }
        if cfg!(debug_assertions) && !pending.plan.is_empty() {
            pending.plan.debug_assert_invariants();
            let replanned = self.plan(fields.len(), dims, false, |d| pending.plan.find(d).is_some());
            debug_assert_eq!(
                replanned, pending.plan,
                "{op}: {} fields of {dims:?} do not match the posted receives",
                fields.len()
            );
        }
        self.state = ExchangeState::Consuming;

        let handles = std::mem::take(&mut pending.handles);
        let plan = &pending.plan;
        log::debug!(
            "[rank {}] epoch {}: {op}, {} slots",
            self.grid.rank(),
            self.epoch,
            plan.len()
        );

        let mut maybe_err = None;
        for (slot, (peer, h)) in plan.iter().zip(handles) {
            let data = h.wait();
            if maybe_err.is_some() {
                continue; // already failed; just drain
            }
            let Some(raw) = data else {
                log::warn!(
                    "[rank {}] receive from rank {peer} ({}) completed without data",
                    self.grid.rank(),
                    slot.direction
                );
                maybe_err = Some(HaloError::CommError {
                    neighbor: peer,
                    source: format!("failed to receive {} from rank {peer}", slot.direction).into(),
                });
                continue;
            };
            if let Err(e) = copy_payload(peer, &raw, self.recv_buf.slot_bytes_mut(slot)) {
                log::warn!("[rank {}] {e}", self.grid.rank());
                maybe_err = Some(e);
                continue;
            }
            if let Some(region) = target(slot) {
                log::trace!(
                    "[rank {}] unpack {} from rank {peer} into {} cells",
                    self.grid.rank(),
                    slot.direction,
                    region.len()
                );
                unpack::<V, D>(&region, fields, self.recv_buf.slot(slot));
            }
        }

        self.state = ExchangeState::Idle;
        match maybe_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
