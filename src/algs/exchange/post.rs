//! Posting half of a round: receives first, then packed sends.

use super::{ExchangeMask, ExchangeState, HaloExchange, PendingReceives};
use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::data::dims::BlockDims;
use crate::data::field::{FieldAccess, HaloValue};
use crate::data::region::Region;
use crate::data::slot::SlotPlan;
use crate::halo_error::HaloError;
use crate::pack::packer::pack;

impl<V: HaloValue, C: Communicator> HaloExchange<V, C> {
    /// Post one non-blocking receive per selected neighbor. Does not block.
    ///
    /// Receives are planned over the active directions the mask receives
    /// from, faces only when `faces_only` is set. The returned token must be
    /// handed to exactly one consume call of this round.
    pub fn post_receives(
        &mut self,
        tag: CommTag,
        field_count: usize,
        dims: BlockDims,
        mask: ExchangeMask,
        faces_only: bool,
    ) -> Result<PendingReceives<C::RecvHandle>, HaloError> {
        self.expect_state("post receives", ExchangeState::Idle)?;
        self.epoch += 1;

        if self.grid.is_single() {
            self.state = ExchangeState::Posting;
            return Ok(PendingReceives {
                epoch: self.epoch,
                tag,
                plan: SlotPlan::empty(field_count, dims),
                handles: Vec::new(),
            });
        }

        let plan = self.plan(field_count, dims, faces_only, |d| mask.receives_from(d));
        let peers = plan
            .iter()
            .map(|slot| self.peer(slot.direction))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "[rank {}] epoch {}: posting {} receives, tag {}",
            self.grid.rank(),
            self.epoch,
            plan.len(),
            tag.as_u16()
        );
        let mut handles = Vec::with_capacity(plan.len());
        for (slot, peer) in plan.iter().zip(peers) {
            log::trace!(
                "[rank {}] irecv {} from rank {peer}: {} values at {}",
                self.grid.rank(),
                slot.direction,
                slot.len,
                slot.offset
            );
            let h = self
                .comm
                .irecv(peer, tag.as_u16(), self.recv_buf.slot_bytes_mut(slot));
            handles.push((peer, h));
        }

        self.state = ExchangeState::Posting;
        Ok(PendingReceives {
            epoch: self.epoch,
            tag,
            plan,
            handles,
        })
    }

    /// Pack every selected boundary region into the send buffer, send it and
    /// wait until all sends have completed.
    ///
    /// `fields` is packed field-major; its length is the field count and
    /// must match the preceding [`HaloExchange::post_receives`] on the peers.
    pub fn post_sends_and_wait(
        &mut self,
        tag: CommTag,
        fields: &[&mut dyn FieldAccess<V>],
        dims: BlockDims,
        mask: ExchangeMask,
        faces_only: bool,
    ) -> Result<(), HaloError> {
        self.expect_state("post sends", ExchangeState::Posting)?;
        if self.grid.is_single() {
            self.state = ExchangeState::AwaitingCompletion;
            return Ok(());
        }

        let plan = self.plan(fields.len(), dims, faces_only, |d| mask.sends_to(d));
        let peers = plan
            .iter()
            .map(|slot| self.peer(slot.direction))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "[rank {}] epoch {}: sending {} messages, tag {}",
            self.grid.rank(),
            self.epoch,
            plan.len(),
            tag.as_u16()
        );
        let mut pending_sends = Vec::with_capacity(plan.len());
        for (slot, peer) in plan.iter().zip(peers) {
            let region = Region::boundary(slot.direction, dims);
            pack(&region, fields, self.send_buf.slot_mut(slot));
            log::trace!(
                "[rank {}] isend {} to rank {peer}: {} values at {}",
                self.grid.rank(),
                slot.direction,
                slot.len,
                slot.offset
            );
            pending_sends.push(
                self.comm
                    .isend(peer, tag.as_u16(), self.send_buf.slot_bytes(slot)),
            );
        }

        // the send slots are reused by the next round
        for send in pending_sends {
            send.wait();
        }

        self.state = ExchangeState::AwaitingCompletion;
        Ok(())
    }
}
