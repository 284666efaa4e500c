//! Data module: block dimensions, boundary regions, field access and the
//! message buffer with its slot layout.

pub mod buffer;
pub mod dims;
pub mod field;
pub mod layout;
pub mod region;
pub mod slot;

pub use buffer::CommBuffer;
pub use dims::BlockDims;
pub use field::{FieldAccess, HaloValue};
pub use layout::{BufferLayout, DEFAULT_CACHE_LINE_BYTES, SlotStrides};
pub use region::{Region, Span};
pub use slot::{MessageSlot, SlotPlan};
