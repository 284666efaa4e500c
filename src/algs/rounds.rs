//! The three exchange rounds of a Lagrangian hydro step.
//!
//! Each helper runs post/send/consume back to back. Callers that want to
//! overlap computation with communication use the split entry points on
//! [`HaloExchange`] directly.

use crate::algs::communicator::Communicator;
use crate::algs::exchange::{ExchangeMask, HaloExchange};
use crate::data::dims::BlockDims;
use crate::data::field::{FieldAccess, HaloValue};
use crate::halo_error::HaloError;

/// Sum nodal quantities (masses, forces) over every domain sharing a node.
pub fn sum_boundary_nodal<V, C>(
    ex: &mut HaloExchange<V, C>,
    fields: &mut [&mut dyn FieldAccess<V>],
    nodal_dims: BlockDims,
) -> Result<(), HaloError>
where
    V: HaloValue,
    C: Communicator,
{
    let tag = ex.config().tags.sum_boundary;
    let mask = ExchangeMask::SYMMETRIC;
    let mut pending = ex.post_receives(tag, fields.len(), nodal_dims, mask, false)?;
    ex.post_sends_and_wait(tag, &*fields, nodal_dims, mask, false)?;
    ex.combine_boundary(&mut pending, fields, nodal_dims)
}

/// Make shared nodes agree on position and velocity
/// (`x, y, z, xd, yd, zd`). The higher-ranked owner wins.
pub fn sync_pos_vel<V, C>(
    ex: &mut HaloExchange<V, C>,
    fields: &mut [&mut dyn FieldAccess<V>; 6],
    nodal_dims: BlockDims,
) -> Result<(), HaloError>
where
    V: HaloValue,
    C: Communicator,
{
    let tag = ex.config().tags.pos_vel;
    let mask = ExchangeMask::DOWNWARD;
    let mut pending = ex.post_receives(tag, fields.len(), nodal_dims, mask, false)?;
    ex.post_sends_and_wait(tag, &fields[..], nodal_dims, mask, false)?;
    ex.sync_boundary(&mut pending, &mut fields[..], nodal_dims, mask)
}

/// Exchange the velocity gradients (`delv_xi, delv_eta, delv_zeta`) across
/// faces into the ghost elements starting at `ghost_start`.
pub fn exchange_mono_q<V, C>(
    ex: &mut HaloExchange<V, C>,
    fields: &mut [&mut dyn FieldAccess<V>; 3],
    element_dims: BlockDims,
    ghost_start: usize,
) -> Result<(), HaloError>
where
    V: HaloValue,
    C: Communicator,
{
    let tag = ex.config().tags.mono_q;
    let mask = ExchangeMask::SYMMETRIC;
    let mut pending = ex.post_receives(tag, fields.len(), element_dims, mask, true)?;
    ex.post_sends_and_wait(tag, &fields[..], element_dims, mask, true)?;
    ex.face_only_exchange(&mut pending, &mut fields[..], element_dims, ghost_start)
}
