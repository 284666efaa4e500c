//! Gather/scatter between field accessors and linear message segments.
//!
//! A message holds all values of the first field in region order, then all
//! values of the second field, and so on.

use crate::data::field::{FieldAccess, HaloValue};
use crate::data::region::Region;
use crate::pack::delta::Delta;

/// Gather `region` of every field into `out`, field-major.
pub fn pack<V: HaloValue>(region: &Region, fields: &[&mut dyn FieldAccess<V>], out: &mut [V]) {
    let n = region.len();
    debug_assert_eq!(
        out.len(),
        fields.len() * n,
        "pack: segment holds {} values, region needs {} × {n}",
        out.len(),
        fields.len()
    );
    if n == 0 {
        return;
    }
    for (field, segment) in fields.iter().zip(out.chunks_exact_mut(n)) {
        for (dst, idx) in segment.iter_mut().zip(region.indices()) {
            *dst = field.get(idx);
        }
    }
}

/// Scatter `src` back into `region` of every field, combining with `D`.
pub fn unpack<V, D>(region: &Region, fields: &mut [&mut dyn FieldAccess<V>], src: &[V])
where
    V: HaloValue,
    D: Delta<V>,
{
    let n = region.len();
    debug_assert_eq!(
        src.len(),
        fields.len() * n,
        "unpack: segment holds {} values, region needs {} × {n}",
        src.len(),
        fields.len()
    );
    if n == 0 {
        return;
    }
    for (field, segment) in fields.iter_mut().zip(src.chunks_exact(n)) {
        for (&value, idx) in segment.iter().zip(region.indices()) {
            D::fuse(field.cell_mut(idx), value);
        }
    }
}
