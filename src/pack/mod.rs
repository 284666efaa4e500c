//! Packing boundary regions of field arrays into message segments and back.

pub mod delta;
pub mod packer;

pub use delta::{AddDelta, CopyDelta, Delta};
pub use packer::{pack, unpack};
