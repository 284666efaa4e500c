#![allow(dead_code)]
use mesh_halo::algs::communicator::{Communicator, LocalComm, LocalRecv, Wait};
use mesh_halo::data::dims::BlockDims;
use mesh_halo::data::field::FieldAccess;
use std::cell::Cell;

/// Run `f` once per rank of an in-process world of `size`, one thread each.
/// Results come back in rank order.
pub fn run_world<F, R>(size: usize, f: F) -> Vec<R>
where
    F: Fn(LocalComm) -> R + Sync,
    R: Send,
{
    let comms = LocalComm::world(size);
    std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let f = &f;
                s.spawn(move || f(comm))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank thread panicked"))
            .collect()
    })
}

/// `n` owned fields of `dims`, filled by `init(field, index)`.
pub fn fields_with(n: usize, dims: BlockDims, init: impl Fn(usize, usize) -> f64) -> Vec<Vec<f64>> {
    (0..n)
        .map(|f| (0..dims.len()).map(|i| init(f, i)).collect())
        .collect()
}

/// Borrow owned fields as the accessor list the protocols take.
pub fn accessors(fields: &mut [Vec<f64>]) -> Vec<&mut dyn FieldAccess<f64>> {
    fields
        .iter_mut()
        .map(|f| f as &mut dyn FieldAccess<f64>)
        .collect()
}

/// Wraps a communicator and counts the transport calls made through it.
#[derive(Debug, Default)]
pub struct Counting<C> {
    pub inner: C,
    pub sends: Cell<usize>,
    pub recvs: Cell<usize>,
}

impl<C> Counting<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            sends: Cell::new(0),
            recvs: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.sends.get() + self.recvs.get()
    }
}

impl<C: Communicator> Communicator for Counting<C> {
    type SendHandle = C::SendHandle;
    type RecvHandle = C::RecvHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> C::SendHandle {
        self.sends.set(self.sends.get() + 1);
        self.inner.isend(peer, tag, buf)
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> C::RecvHandle {
        self.recvs.set(self.recvs.get() + 1);
        self.inner.irecv(peer, tag, buf)
    }

    fn rank(&self) -> usize {
        self.inner.rank()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn barrier(&self) {
        self.inner.barrier()
    }
}

/// What goes wrong with messages from the faulty peer.
#[derive(Copy, Clone, Debug)]
pub enum Fault {
    /// The receive completes without data.
    Lost,
    /// The payload arrives `n` bytes short.
    Short(usize),
}

/// [`LocalComm`] whose receives from `peer` complete with `fault`.
#[derive(Debug)]
pub struct FaultyComm {
    pub inner: LocalComm,
    pub peer: usize,
    pub fault: Fault,
}

pub struct FaultyRecv {
    inner: LocalRecv,
    fault: Option<Fault>,
}

impl Wait for FaultyRecv {
    fn wait(self) -> Option<Vec<u8>> {
        let data = self.inner.wait();
        match self.fault {
            None => data,
            Some(Fault::Lost) => None,
            Some(Fault::Short(n)) => data.map(|mut d| {
                d.truncate(d.len().saturating_sub(n));
                d
            }),
        }
    }
}

impl Communicator for FaultyComm {
    type SendHandle = ();
    type RecvHandle = FaultyRecv;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        self.inner.isend(peer, tag, buf)
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> FaultyRecv {
        FaultyRecv {
            inner: self.inner.irecv(peer, tag, buf),
            fault: (peer == self.peer).then_some(self.fault),
        }
    }

    fn rank(&self) -> usize {
        self.inner.rank()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn barrier(&self) {
        self.inner.barrier()
    }
}
