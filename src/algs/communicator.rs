//! Thin façade over intra-process or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable** but non-blocking: the exchange protocols call
//! `.wait()` before they trust that a slot is ready. Receive handles hand the
//! payload back from `wait`; the protocol copies it into its slot.

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

/// Message tag of one exchange round.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

/// Tags of the three exchange rounds of a hydro step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeTags {
    /// Nodal boundary summation.
    pub sum_boundary: CommTag,
    /// Position/velocity synchronisation.
    pub pos_vel: CommTag,
    /// Monotonic-Q gradient exchange.
    pub mono_q: CommTag,
}

impl Default for ExchangeTags {
    fn default() -> Self {
        Self {
            sum_boundary: CommTag(1024),
            pos_vel: CommTag(2048),
            mono_q: CommTag(3072),
        }
    }
}

/// Non-blocking communication interface (minimal by design).
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;

    /// This worker's rank.
    fn rank(&self) -> usize;
    /// Number of workers.
    fn size(&self) -> usize;

    /// Block until every worker reached the barrier.
    fn barrier(&self) {}
}

/// Anything that can be waited on.
///
/// Send handles complete with `None`. A receive handle completes with `None`
/// only when its message never arrived.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Single-worker comm: rank 0 of a world of one. Nothing ever leaves.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }
}

// --- LocalComm: intra-process, one thread per rank ---
type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Debug, Default)]
struct Mailbox {
    messages: DashMap<(Key, u64), Bytes>,
    sent: DashMap<Key, u64>,
    posted: DashMap<Key, u64>,
    lock: Mutex<()>,
    arrived: Condvar,
}

impl Mailbox {
    fn next_seq(counter: &DashMap<Key, u64>, key: Key) -> u64 {
        let mut seq = counter.entry(key).or_insert(0);
        let cur = *seq;
        *seq += 1;
        cur
    }

    fn deliver(&self, key: Key, data: Bytes) {
        let seq = Self::next_seq(&self.sent, key);
        self.messages.insert((key, seq), data);
        let _guard = self.lock.lock();
        self.arrived.notify_all();
    }

    fn take(&self, key: Key, seq: u64, timeout: Option<Duration>) -> Option<Bytes> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut guard = self.lock.lock();
        loop {
            if let Some((_, data)) = self.messages.remove(&(key, seq)) {
                return Some(data);
            }
            match deadline {
                Some(d) if Instant::now() >= d => return None,
                Some(d) => {
                    self.arrived.wait_until(&mut guard, d);
                }
                None => self.arrived.wait(&mut guard),
            }
        }
    }
}

/// Receive handle of [`LocalComm`]: resolved at `wait`.
pub struct LocalRecv {
    mailbox: Arc<Mailbox>,
    key: Key,
    seq: u64,
    timeout: Option<Duration>,
}

impl Wait for LocalRecv {
    fn wait(self) -> Option<Vec<u8>> {
        self.mailbox
            .take(self.key, self.seq, self.timeout)
            .map(|b| b.to_vec())
    }
}

/// In-process communicator: every rank of a world shares one mailbox.
///
/// Sends are buffered and complete immediately. Receives on the same
/// `(source, tag)` match sends in posting order.
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
    barrier: Arc<Barrier>,
    timeout: Option<Duration>,
}

impl LocalComm {
    /// One communicator per rank of a world of `size`.
    pub fn world(size: usize) -> Vec<LocalComm> {
        let mailbox = Arc::new(Mailbox::default());
        let barrier = Arc::new(Barrier::new(size));
        (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
                barrier: Arc::clone(&barrier),
                timeout: None,
            })
            .collect()
    }

    /// Fail receives that see no message within `timeout`.
    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Messages sent but not yet received, across the whole world.
    pub fn undelivered(&self) -> usize {
        self.mailbox.messages.len()
    }
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalRecv;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        self.mailbox
            .deliver((self.rank, peer, tag), Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> Self::RecvHandle {
        let key = (peer, self.rank, tag);
        let seq = Mailbox::next_seq(&self.mailbox.posted, key);
        LocalRecv {
            mailbox: Arc::clone(&self.mailbox),
            key,
            seq,
            timeout: self.timeout,
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) {
        self.barrier.wait();
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, Wait};
    use crate::halo_error::HaloError;
    use mpi::datatype::Equivalence as _;
    use mpi::environment::Universe;
    use mpi::request::{Request, StaticScope};
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{Communicator as _, Destination as _, Source as _};

    pub struct MpiComm {
        _universe: Universe,
        pub world: SimpleCommunicator,
        pub rank: usize,
        size: usize,
    }

    impl MpiComm {
        /// Initialise MPI. Fails if MPI was already initialised.
        pub fn new() -> Result<Self, HaloError> {
            let universe = mpi::initialize().ok_or(HaloError::MpiInit)?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                _universe: universe,
                world,
                rank,
                size,
            })
        }
    }

    /// Send handle: owns a copy of the message until MPI is done with it.
    pub struct MpiSend {
        req: Request<'static, [u8], StaticScope>,
        buf: *mut [u8],
    }

    impl Wait for MpiSend {
        fn wait(self) -> Option<Vec<u8>> {
            self.req.wait();
            // SAFETY: `buf` came from `Box::into_raw` in `isend` and the
            // request borrowing it has completed.
            drop(unsafe { Box::from_raw(self.buf) });
            None
        }
    }

    /// Receive handle: MPI writes into an owned staging buffer.
    pub struct MpiRecv {
        req: Request<'static, [u8], StaticScope>,
        buf: *mut [u8],
    }

    impl Wait for MpiRecv {
        fn wait(self) -> Option<Vec<u8>> {
            let status = self.req.wait();
            // SAFETY: as for `MpiSend`; the request is complete.
            let data = unsafe { Box::from_raw(self.buf) };
            let got = status.count(u8::equivalent_datatype()) as usize;
            let mut data = data.into_vec();
            data.truncate(got);
            Some(data)
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSend;
        type RecvHandle = MpiRecv;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiSend {
            let raw = Box::into_raw(buf.to_vec().into_boxed_slice());
            // SAFETY: the allocation lives until `MpiSend::wait` frees it.
            let staged: &'static [u8] = unsafe { &*raw };
            let req = self.world.process_at_rank(peer as i32).immediate_send_with_tag(
                StaticScope,
                staged,
                i32::from(tag),
            );
            MpiSend { req, buf: raw }
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiRecv {
            let raw = Box::into_raw(vec![0u8; buf.len()].into_boxed_slice());
            // SAFETY: the allocation lives until `MpiRecv::wait` reclaims it.
            let staged: &'static mut [u8] = unsafe { &mut *raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_receive_into_with_tag(StaticScope, staged, i32::from(tag));
            MpiRecv { req, buf: raw }
        }

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn barrier(&self) {
            self.world.barrier();
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::{MpiComm, MpiRecv, MpiSend};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_roundtrip_two_ranks() {
        let mut world = LocalComm::world(2);
        let comm1 = world.pop().unwrap();
        let comm0 = world.pop().unwrap();

        let mut recv_buf = [0u8; 4];
        let recv_handle = comm1.irecv(0, 7, &mut recv_buf);
        let send_handle = comm0.isend(1, 7, &[1, 2, 3, 4]);
        send_handle.wait();

        let data = recv_handle
            .wait()
            .expect("Expected to receive data from rank 0");
        recv_buf.copy_from_slice(&data);
        assert_eq!(&recv_buf, &[1, 2, 3, 4]);
        assert_eq!(comm0.undelivered(), 0);
    }

    #[test]
    fn send_handles_complete_without_data() {
        let world = LocalComm::world(2);
        assert_eq!(world[0].isend(1, 4, &[1, 2]).wait(), None);
        assert_eq!(NoComm.isend(0, 4, &[1]).wait(), None);
        assert_eq!(world[0].undelivered(), 1);
    }

    #[test]
    fn receives_match_sends_in_posting_order() {
        let world = LocalComm::world(2);
        let mut b = [0u8; 1];
        let first = world[1].irecv(0, 3, &mut b);
        let second = world[1].irecv(0, 3, &mut b);
        world[0].isend(1, 3, &[10]);
        world[0].isend(1, 3, &[20]);
        assert_eq!(second.wait(), Some(vec![20]));
        assert_eq!(first.wait(), Some(vec![10]));
    }

    #[test]
    fn tags_do_not_mix() {
        let world = LocalComm::world(2);
        let mut b = [0u8; 1];
        world[0].isend(1, 1, &[1]);
        world[0].isend(1, 2, &[2]);
        assert_eq!(world[1].irecv(0, 2, &mut b).wait(), Some(vec![2]));
        assert_eq!(world[1].irecv(0, 1, &mut b).wait(), Some(vec![1]));
    }

    #[test]
    fn missing_message_times_out() {
        let world = LocalComm::world(2);
        let comm = world[1].clone().with_recv_timeout(Duration::from_millis(20));
        let mut b = [0u8; 8];
        assert_eq!(comm.irecv(0, 5, &mut b).wait(), None);
    }

    #[test]
    fn blocked_receive_wakes_on_send() {
        let mut world = LocalComm::world(2);
        let comm1 = world.pop().unwrap();
        let comm0 = world.pop().unwrap();
        let t = std::thread::spawn(move || {
            let mut b = [0u8; 2];
            comm1.irecv(0, 9, &mut b).wait()
        });
        std::thread::sleep(Duration::from_millis(10));
        comm0.isend(1, 9, &[4, 2]);
        assert_eq!(t.join().unwrap(), Some(vec![4, 2]));
    }

    #[test]
    fn default_tags() {
        let t = ExchangeTags::default();
        assert_eq!(t.sum_boundary.as_u16(), 1024);
        assert_eq!(t.pos_vel.as_u16(), 2048);
        assert_eq!(t.mono_q.as_u16(), 3072);
    }
}
