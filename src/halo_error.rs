//! HaloError: Unified error type for mesh-halo public APIs
//!
//! Precondition failures are reported by constructors, transport failures by
//! the exchange protocols. None of them is retried: a failed exchange leaves
//! the mesh in an inconsistent state and the caller is expected to abort the
//! run.

use crate::algs::exchange::ExchangeState;
use thiserror::Error;

/// Unified error type for mesh-halo operations.
#[derive(Debug, Error)]
pub enum HaloError {
    /// The world size is not `tp³` or `tp` is zero.
    #[error("invalid domain grid: {world_size} ranks cannot form a {tp}x{tp}x{tp} grid")]
    InvalidGrid { tp: usize, world_size: usize },
    /// A rank outside `[0, world_size)`.
    #[error("rank {rank} out of range for a world of {world_size} ranks")]
    RankOutOfRange { rank: usize, world_size: usize },
    /// Buffer layout parameters that cannot describe any exchange.
    #[error("invalid buffer layout: {0}")]
    InvalidLayout(&'static str),
    /// The transport failed to deliver a message from/to `neighbor`.
    #[error("communication with rank {neighbor} failed: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A receive completed with a payload of the wrong size.
    #[error("message from rank {neighbor} has {got} bytes, expected {expected}")]
    MessageLength {
        neighbor: usize,
        expected: usize,
        got: usize,
    },
    /// A protocol entry point was called out of order.
    #[error("cannot {op} while the exchange is {state:?}")]
    InvalidState {
        op: &'static str,
        state: ExchangeState,
    },
    /// Pending receives handed back to an exchange round that did not post them.
    #[error("pending receives belong to epoch {got}, current epoch is {expected}")]
    EpochMismatch { expected: u64, got: u64 },
    /// A slot plan violated its layout invariants.
    #[error("slot plan invariant violated: {0}")]
    PlanInvariant(String),
    /// MPI could not be initialized (already initialized or unavailable).
    #[error("MPI initialization failed")]
    MpiInit,
}
