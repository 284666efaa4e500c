mod util;
use util::*;

use bytemuck::{Pod, Zeroable, cast_slice};
use mesh_halo::algs::communicator::{CommTag, Communicator, LocalComm, NoComm, Wait};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable, Debug, PartialEq, Eq)]
struct WireU64 {
    x: u64,
}

#[test]
fn no_comm_is_nop() {
    let comm = NoComm;
    assert_eq!((comm.rank(), comm.size()), (0, 1));
    let mut buf = [0u8; 8];
    let h = comm.irecv(0, 123, &mut buf);
    assert!(h.wait().is_none());
    let s = comm.isend(0, 123, &[]);
    assert!(s.wait().is_none());
    comm.barrier();
}

#[test]
fn local_round_trip_and_tag_isolation() {
    let world = LocalComm::world(2);
    let (c0, c1) = (&world[0], &world[1]);
    let tag_a = CommTag(0xA100);
    let tag_b = CommTag(0xB200);

    let mut buf = [0u8; size_of::<WireU64>()];
    let rxa = c1.irecv(0, tag_a.as_u16(), &mut buf);
    let rxb = c1.irecv(0, tag_b.as_u16(), &mut buf);

    let wa = [WireU64 { x: 0xDEAD_BEEF_F00D_F00D }];
    let wb = [WireU64 { x: 0x0123_4567_89AB_CDEF }];
    c0.isend(1, tag_b.as_u16(), cast_slice(&wb));
    c0.isend(1, tag_a.as_u16(), cast_slice(&wa));

    assert_eq!(&rxa.wait().expect("rxa")[..], cast_slice(&wa));
    assert_eq!(&rxb.wait().expect("rxb")[..], cast_slice(&wb));
    assert_eq!(c0.undelivered(), 0);
}

#[test]
fn local_fifo_order() {
    let world = LocalComm::world(2);
    for i in 0..10u8 {
        world[0].isend(1, 7, &[i]);
    }
    let mut out = Vec::new();
    for _ in 0..10 {
        let mut b = [0u8; 1];
        out.push(world[1].irecv(0, 7, &mut b).wait().unwrap()[0]);
    }
    assert_eq!(out, (0u8..10u8).collect::<Vec<_>>());
}

#[test]
fn payload_length_is_not_truncated() {
    let world = LocalComm::world(2);
    world[0].isend(1, 3, &[1, 2, 3, 4, 5, 6]);
    let mut b = [0u8; 4];
    assert_eq!(world[1].irecv(0, 3, &mut b).wait(), Some(vec![1, 2, 3, 4, 5, 6]));
}

#[test]
fn ring_across_threads_with_barrier() {
    let got = run_world(8, |comm| {
        let me = comm.rank();
        let n = comm.size();
        let mut b = [0u8; 1];
        let r = comm.irecv((me + n - 1) % n, 11, &mut b);
        comm.isend((me + 1) % n, 11, &[me as u8]);
        let v = r.wait().unwrap()[0];
        comm.barrier();
        (v, comm.undelivered())
    });
    for (me, (v, undelivered)) in got.into_iter().enumerate() {
        assert_eq!(v as usize, (me + 7) % 8);
        assert_eq!(undelivered, 0);
    }
}
