//! Halo exchange between neighboring domains of a `tp × tp × tp` grid.
//!
//! A round is split into three calls so the caller can overlap computation
//! with communication:
//!
//! 1. [`HaloExchange::post_receives`] plans the receive slots and posts one
//!    non-blocking receive per slot. Returns a [`PendingReceives`] token.
//! 2. [`HaloExchange::post_sends_and_wait`] packs the boundary of every field
//!    into the send slots, posts the sends and waits for all of them.
//! 3. One of [`HaloExchange::combine_boundary`],
//!    [`HaloExchange::sync_boundary`] or [`HaloExchange::face_only_exchange`]
//!    drains the token: it waits for each receive in canonical direction
//!    order and unpacks it. A call rejected for state or epoch leaves the
//!    token untouched, so the round can still be completed with it.
//!
//! All three are no-ops on a world of one rank. A failed receive does not
//! abort the consume loop early: every outstanding handle is drained and the
//! exchange returns to [`ExchangeState::Idle`] before the first error is
//! reported.

mod consume;
mod post;

use crate::algs::communicator::{CommTag, Communicator};
use crate::config::HaloConfig;
use crate::data::buffer::CommBuffer;
use crate::data::dims::BlockDims;
use crate::data::field::HaloValue;
use crate::data::layout::BufferLayout;
use crate::data::slot::SlotPlan;
use crate::halo_error::HaloError;
use crate::topology::direction::{Direction, DirectionDescriptor, NeighborClass};
use crate::topology::grid::DomainGrid;
use crate::topology::neighbors::ActiveNeighborSet;

/// Where a domain is in its exchange round.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ExchangeState {
    /// No round in flight.
    #[default]
    Idle,
    /// Receives posted, sends not yet issued.
    Posting,
    /// Sends complete, receives not yet consumed.
    AwaitingCompletion,
    /// Inside a consume call.
    Consuming,
}

/// Which directions take part in a round.
///
/// Upward directions lead to a higher-ranked neighbor. `send_upward` allows
/// sends toward them, `recv_downward` allows receives from the opposite side.
/// Downward sends and upward receives are always active.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExchangeMask {
    pub send_upward: bool,
    pub recv_downward: bool,
}

impl ExchangeMask {
    /// Every active direction sends and receives.
    pub const SYMMETRIC: Self = Self {
        send_upward: true,
        recv_downward: true,
    };
    /// Data flows from the higher-ranked owner to the lower-ranked neighbor.
    pub const DOWNWARD: Self = Self {
        send_upward: false,
        recv_downward: false,
    };

    #[inline]
    pub fn sends_to(&self, dir: Direction) -> bool {
        self.send_upward || !dir.is_upward()
    }

    #[inline]
    pub fn receives_from(&self, dir: Direction) -> bool {
        self.recv_downward || dir.is_upward()
    }
}

/// Receives posted by [`HaloExchange::post_receives`], consumed exactly once.
///
/// Consuming empties the token. Dropping a token that still holds handles
/// abandons its receives.
pub struct PendingReceives<H> {
    epoch: u64,
    tag: CommTag,
    plan: SlotPlan,
    /// `(neighbor rank, handle)` per slot of `plan`.
    handles: Vec<(usize, H)>,
}

impl<H> PendingReceives<H> {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn tag(&self) -> CommTag {
        self.tag
    }

    pub fn plan(&self) -> &SlotPlan {
        &self.plan
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Neighbor ranks in posting order.
    pub fn peers(&self) -> impl Iterator<Item = usize> + '_ {
        self.handles.iter().map(|(peer, _)| *peer)
    }
}

impl<H> std::fmt::Debug for PendingReceives<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReceives")
            .field("epoch", &self.epoch)
            .field("tag", &self.tag)
            .field("slots", &self.plan.len())
            .finish()
    }
}

/// Per-domain exchange engine: owns the transport, the grid position and the
/// send/receive buffers reused by every round.
pub struct HaloExchange<V: HaloValue, C: Communicator> {
    comm: C,
    grid: DomainGrid,
    layout: BufferLayout,
    config: HaloConfig,
    send_buf: CommBuffer<V>,
    recv_buf: CommBuffer<V>,
    state: ExchangeState,
    epoch: u64,
}

impl<V: HaloValue, C: Communicator> HaloExchange<V, C> {
    /// Engine with the default configuration.
    ///
    /// `max_fields` and `max_dims` bound every later call: they fix the slot
    /// strides for the lifetime of the engine.
    pub fn new(comm: C, max_fields: usize, max_dims: BlockDims) -> Result<Self, HaloError> {
        Self::with_config(comm, max_fields, max_dims, HaloConfig::default())
    }

    pub fn with_config(
        comm: C,
        max_fields: usize,
        max_dims: BlockDims,
        config: HaloConfig,
    ) -> Result<Self, HaloError> {
        let grid = DomainGrid::from_world(comm.rank(), comm.size())?;
        let layout = BufferLayout::for_type::<V>(max_fields, max_dims, config.cache_line_bytes)?;
        let active = grid.active_directions();
        log::debug!(
            "[rank {}] halo exchange at {:?} of {}³: {} neighbors, {} elements per buffer",
            grid.rank(),
            grid.position(),
            grid.tp(),
            active.len(),
            layout.capacity()
        );
        Ok(Self {
            send_buf: CommBuffer::new(&layout),
            recv_buf: CommBuffer::new(&layout),
            comm,
            grid,
            layout,
            config,
            state: ExchangeState::Idle,
            epoch: 0,
        })
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn grid(&self) -> &DomainGrid {
        &self.grid
    }

    /// Neighbors present on the grid, derived from the position on demand.
    pub fn active(&self) -> ActiveNeighborSet {
        self.grid.active_directions()
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    pub fn config(&self) -> &HaloConfig {
        &self.config
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Rounds posted so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn send_buffer(&self) -> &CommBuffer<V> {
        &self.send_buf
    }

    pub fn recv_buffer(&self) -> &CommBuffer<V> {
        &self.recv_buf
    }

    fn expect_state(&self, op: &'static str, want: ExchangeState) -> Result<(), HaloError> {
        if self.state == want {
            Ok(())
        } else {
            Err(HaloError::InvalidState {
                op,
                state: self.state,
            })
        }
    }

    /// Slots of this domain for one call, in canonical order.
    fn plan<F>(&self, field_count: usize, dims: BlockDims, faces_only: bool, keep: F) -> SlotPlan
    where
        F: Fn(Direction) -> bool,
    {
        debug_assert!(
            field_count <= self.layout.max_fields(),
            "{field_count} fields exceed the buffer's {}",
            self.layout.max_fields()
        );
        debug_assert!(
            self.layout.fits(&dims),
            "{dims:?} exceeds the buffer's block size"
        );
        let select = |d: &DirectionDescriptor| {
            (!faces_only || d.class == NeighborClass::Face) && keep(d.direction)
        };
        let plan = SlotPlan::build(
            self.layout.strides(field_count),
            field_count,
            dims,
            &self.grid.active_directions(),
            select,
        );
        debug_assert!(
            plan.end() <= self.send_buf.len(),
            "slot plan ends at {} past the buffer capacity {}",
            plan.end(),
            self.send_buf.len()
        );
        plan
    }

    fn peer(&self, dir: Direction) -> Result<usize, HaloError> {
        self.grid.neighbor_rank(dir).ok_or_else(|| {
            HaloError::PlanInvariant(format!(
                "rank {} has no neighbor toward {dir}",
                self.grid.rank()
            ))
        })
    }
}
