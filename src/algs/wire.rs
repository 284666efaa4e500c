//! Wire helpers: messages are the native in-memory bytes of `Pod` values.
//!
//! Every rank of a run is the same binary on the same architecture, so halo
//! payloads travel unconverted; only lengths are checked on arrival.

use crate::halo_error::HaloError;
use bytemuck::Pod;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// Check a received payload against the slot it is destined for.
pub fn expect_exact_len(neighbor: usize, actual: usize, expected: usize) -> Result<(), HaloError> {
    if actual == expected {
        Ok(())
    } else {
        Err(HaloError::MessageLength {
            neighbor,
            expected,
            got: actual,
        })
    }
}

/// Copy a received payload into its slot bytes.
pub fn copy_payload(neighbor: usize, raw: &[u8], dst: &mut [u8]) -> Result<(), HaloError> {
    expect_exact_len(neighbor, raw.len(), dst.len())?;
    dst.copy_from_slice(raw);
    Ok(())
}
