#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-halo
//!
//! mesh-halo exchanges the boundary data of structured hexahedral blocks
//! between neighboring domains of a `tp × tp × tp` domain grid, one domain per
//! worker. Each domain shares faces, edges and corners with up to 26
//! neighbors; the library plans where every message lives in a reusable
//! buffer, packs field values into it, moves it over a pluggable transport and
//! unpacks it on arrival.
//!
//! ## Features
//! - One static table of the 26 neighbor directions drives planning, packing
//!   and unpacking
//! - Three exchange protocols: additive boundary summation, one-directional
//!   boundary synchronisation and face-only ghost exchange
//! - Pluggable communication backends (serial, in-process, MPI)
//! - Split post/send/consume entry points for compute overlap
//!
//! ## Usage
//! Add `mesh-halo` as a dependency in your `Cargo.toml` and enable features as needed:
//!
//! ```toml
//! [dependencies]
//! mesh-halo = "0.3"
//! # Optional features:
//! # features = ["mpi-support", "check-invariants"]
//! ```
//!
//! ```
//! use mesh_halo::prelude::*;
//!
//! let dims = BlockDims::nodal(4, 4, 4);
//! let mut ex = HaloExchange::<f64, _>::new(NoComm, 3, dims)?;
//! let mut mass = vec![1.0; dims.len()];
//! sum_boundary_nodal(&mut ex, &mut [&mut mass as &mut dyn FieldAccess<f64>], dims)?;
//! assert!(mass.iter().all(|&m| m == 1.0));
//! # Ok::<(), mesh_halo::halo_error::HaloError>(())
//! ```

pub mod algs;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod halo_error;
pub mod pack;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{
        CommTag, Communicator, ExchangeTags, LocalComm, NoComm, Wait,
    };
    pub use crate::algs::exchange::{ExchangeMask, ExchangeState, HaloExchange, PendingReceives};
    pub use crate::algs::rounds::{exchange_mono_q, sum_boundary_nodal, sync_pos_vel};
    pub use crate::config::HaloConfig;
    pub use crate::data::{BlockDims, BufferLayout, CommBuffer, FieldAccess, HaloValue, Region};
    pub use crate::halo_error::HaloError;
    pub use crate::pack::{AddDelta, CopyDelta, Delta, pack, unpack};
    pub use crate::topology::{Direction, DomainGrid, NeighborClass};
}
