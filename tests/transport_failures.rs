mod util;
use util::*;

use mesh_halo::prelude::*;
use std::time::Duration;

const NODAL: BlockDims = BlockDims::nodal(2, 2, 2);

/// Rank 0 sees every message from rank 1 go wrong; everyone else is healthy.
fn sum_with_fault(fault: Fault) -> Vec<(Result<(), HaloError>, ExchangeState, usize)> {
    run_world(8, |comm| {
        let rank = comm.rank();
        let comm = FaultyComm {
            inner: comm.with_recv_timeout(Duration::from_secs(5)),
            peer: if rank == 0 { 1 } else { usize::MAX },
            fault,
        };
        let mut ex = HaloExchange::<f64, _>::new(comm, 1, NODAL).unwrap();
        let mut f = fields_with(1, NODAL, |_, _| 1.0);
        let res = {
            let mut acc = accessors(&mut f);
            sum_boundary_nodal(&mut ex, &mut acc, NODAL)
        };
        ex.comm().barrier();
        (res, ex.state(), ex.comm().inner.undelivered())
    })
}

#[test]
fn lost_message_is_a_comm_error_after_draining() {
    let results = sum_with_fault(Fault::Lost);
    for (rank, (res, state, undelivered)) in results.into_iter().enumerate() {
        assert_eq!(state, ExchangeState::Idle, "rank {rank}");
        assert_eq!(undelivered, 0, "rank {rank}: handles left undrained");
        if rank == 0 {
            match res {
                Err(HaloError::CommError { neighbor, .. }) => assert_eq!(neighbor, 1),
                other => panic!("expected CommError, got {other:?}"),
            }
        } else {
            assert!(res.is_ok(), "rank {rank}: {res:?}");
        }
    }
}

#[test]
fn short_message_reports_lengths() {
    let results = sum_with_fault(Fault::Short(8));
    let (res, state, undelivered) = &results[0];
    assert_eq!(*state, ExchangeState::Idle);
    assert_eq!(*undelivered, 0);
    // +col face of a 3×3×3 nodal block: 9 values of 8 bytes
    match res {
        Err(HaloError::MessageLength {
            neighbor,
            expected,
            got,
        }) => {
            assert_eq!(*neighbor, 1);
            assert_eq!(*expected, 72);
            assert_eq!(*got, 64);
        }
        other => panic!("expected MessageLength, got {other:?}"),
    }
    assert!(results[1..].iter().all(|(r, ..)| r.is_ok()));
}

#[test]
fn engine_is_reusable_after_a_failure() {
    let results = run_world(8, |comm| {
        let rank = comm.rank();
        let comm = FaultyComm {
            inner: comm.with_recv_timeout(Duration::from_secs(5)),
            peer: if rank == 0 { 1 } else { usize::MAX },
            fault: Fault::Lost,
        };
        let mut ex = HaloExchange::<f64, _>::new(comm, 1, NODAL).unwrap();
        let mut f = fields_with(1, NODAL, |_, _| 1.0);
        let mut acc = accessors(&mut f);
        let first = sum_boundary_nodal(&mut ex, &mut acc, NODAL).is_err();
        // a second round runs the full protocol again
        let pending = ex.post_receives(CommTag::new(9), 1, NODAL, ExchangeMask::DOWNWARD, false);
        (first, pending.is_ok())
    });
    assert_eq!(results[0], (true, true));
    assert!(results[1..].iter().all(|&r| r == (false, true)));
}
