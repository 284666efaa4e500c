//! Exchange algorithms and the transport they run on.

pub mod communicator;
pub mod exchange;
pub mod rounds;
pub mod wire;

pub use communicator::{CommTag, Communicator, ExchangeTags, LocalComm, NoComm, Wait};
pub use exchange::{ExchangeMask, ExchangeState, HaloExchange, PendingReceives};
pub use rounds::{exchange_mono_q, sum_boundary_nodal, sync_pos_vel};
