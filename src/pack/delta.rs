//! Delta trait: how an incoming boundary value combines with the local cell.

/// *Delta* encapsulates the fusion rule of an unpack.
pub trait Delta<V> {
    /// Merge an incoming value into the local value.
    fn fuse(local: &mut V, incoming: V);
}

/// Copy-overwrites-local: the sender is authoritative.
#[derive(Copy, Clone, Debug)]
pub struct CopyDelta;

impl<V> Delta<V> for CopyDelta {
    #[inline]
    fn fuse(local: &mut V, incoming: V) {
        *local = incoming;
    }
}

/// Additive delta for partial sums shared between domains.
#[derive(Copy, Clone, Debug)]
pub struct AddDelta;

impl<V> Delta<V> for AddDelta
where
    V: std::ops::AddAssign,
{
    #[inline]
    fn fuse(local: &mut V, incoming: V) {
        *local += incoming;
    }
}
