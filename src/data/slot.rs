//! Message slots: where each neighbor's message lives inside a CommBuffer.
//!
//! [`SlotPlan::build`] is a pure function of the selected directions. A domain
//! calls it once when posting receives and again when consuming them; both
//! calls must see the same inputs. Matching across domains happens by
//! rank + tag in the transport, never by slot position.

use crate::data::dims::BlockDims;
use crate::data::layout::SlotStrides;
use crate::data::region::Region;
use crate::debug_invariants::DebugInvariants;
use crate::halo_error::HaloError;
use crate::topology::direction::{Direction, DirectionDescriptor, NeighborClass};
use crate::topology::neighbors::ActiveNeighborSet;
use std::ops::Range;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MessageSlot {
    pub direction: Direction,
    pub class: NeighborClass,
    /// Start of the slot in the buffer, in elements.
    pub offset: usize,
    /// Reserved elements.
    pub stride: usize,
    /// Elements actually transferred: `field_count × region length`.
    pub len: usize,
}

impl MessageSlot {
    /// Buffer range holding the message.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Ordered slots of one exchange call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotPlan {
    slots: Vec<MessageSlot>,
    field_count: usize,
    dims: BlockDims,
}

impl SlotPlan {
    /// Walk `active` in canonical order, keep what `select` accepts and assign
    /// cumulative offsets: `planes·plane + edges·edge + corners·corner`, where
    /// each counter only counts slots already placed.
    pub fn build<F>(
        strides: SlotStrides,
        field_count: usize,
        dims: BlockDims,
        active: &ActiveNeighborSet,
        select: F,
    ) -> Self
    where
        F: Fn(&DirectionDescriptor) -> bool,
    {
        let mut placed = [0usize; 3];
        let mut slots = Vec::with_capacity(active.len());
        for desc in active.iter().filter(|d| select(d)) {
            let offset = placed[0] * strides.plane
                + placed[1] * strides.edge
                + placed[2] * strides.corner;
            let len = field_count * Region::boundary(desc.direction, dims).len();
            slots.push(MessageSlot {
                direction: desc.direction,
                class: desc.class,
                offset,
                stride: strides.of(desc.class),
                len,
            });
            placed[desc.class as usize] += 1;
        }
        let plan = Self {
            slots,
            field_count,
            dims,
        };
        crate::debug_invariants!(plan.validate_invariants(), "SlotPlan::build");
        plan
    }

    pub fn empty(field_count: usize, dims: BlockDims) -> Self {
        Self {
            slots: Vec::new(),
            field_count,
            dims,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn slots(&self) -> &[MessageSlot] {
        &self.slots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MessageSlot> {
        self.slots.iter()
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    #[inline]
    pub fn dims(&self) -> BlockDims {
        self.dims
    }

    /// One past the last reserved element.
    pub fn end(&self) -> usize {
        self.slots.last().map_or(0, |s| s.offset + s.stride)
    }

    /// Total elements transferred.
    pub fn payload(&self) -> usize {
        self.slots.iter().map(|s| s.len).sum()
    }

    pub fn find(&self, dir: Direction) -> Option<&MessageSlot> {
        self.slots.iter().find(|s| s.direction == dir)
    }
}

impl<'a> IntoIterator for &'a SlotPlan {
    type Item = &'a MessageSlot;
    type IntoIter = std::slice::Iter<'a, MessageSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

impl DebugInvariants for SlotPlan {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "SlotPlan");
    }

    fn validate_invariants(&self) -> Result<(), HaloError> {
        for s in &self.slots {
            if s.len > s.stride {
                return Err(HaloError::PlanInvariant(format!(
                    "slot {:?} carries {} elements but reserves {}",
                    s.direction, s.len, s.stride
                )));
            }
        }
        for w in self.slots.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            if a.direction.canonical_index() >= b.direction.canonical_index() {
                return Err(HaloError::PlanInvariant(format!(
                    "slots {:?} and {:?} out of canonical order",
                    a.direction, b.direction
                )));
            }
            if a.offset + a.stride > b.offset {
                return Err(HaloError::PlanInvariant(format!(
                    "slots {:?} and {:?} overlap",
                    a.direction, b.direction
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::layout::BufferLayout;
    use crate::topology::grid::LogicalPosition;
    use crate::topology::neighbors::active_directions;

    fn layout() -> BufferLayout {
        BufferLayout::new(3, BlockDims::new(4, 4, 4), 8, 128).unwrap()
    }

    #[test]
    fn offsets_accumulate_per_class() {
        let l = layout();
        let st = l.strides(2);
        let active = active_directions(LogicalPosition { col: 1, row: 1, plane: 1 }, 3);
        let plan = SlotPlan::build(st, 2, BlockDims::new(4, 4, 4), &active, |_| true);
        assert_eq!(plan.len(), 26);
        assert_eq!(plan.slots()[5].offset, 5 * st.plane);
        assert_eq!(plan.slots()[6].offset, 6 * st.plane);
        assert_eq!(plan.slots()[7].offset, 6 * st.plane + st.edge);
        assert_eq!(plan.slots()[18].offset, 6 * st.plane + 12 * st.edge);
        assert_eq!(plan.slots()[25].offset, 6 * st.plane + 12 * st.edge + 7 * st.corner);
        assert_eq!(plan.end(), st.total());
        assert!(plan.end() <= l.capacity());
        assert!(plan.validate_invariants().is_ok());
    }

    #[test]
    fn skipped_directions_do_not_consume_space() {
        let l = layout();
        let st = l.strides(1);
        let active = active_directions(LogicalPosition { col: 1, row: 1, plane: 1 }, 3);
        let plan = SlotPlan::build(st, 1, BlockDims::new(4, 4, 4), &active, |d| {
            d.direction.is_upward()
        });
        assert_eq!(plan.len(), 13);
        // +plane, +row, +col are the only upward faces
        assert_eq!(plan.slots()[0].direction, Direction::new(0, 0, 1));
        assert_eq!(plan.slots()[1].offset, st.plane);
        assert_eq!(plan.slots()[3].class, NeighborClass::Edge);
        assert_eq!(plan.slots()[3].offset, 3 * st.plane);
    }

    #[test]
    fn lengths_follow_region_size() {
        let l = layout();
        let dims = BlockDims::new(4, 3, 2);
        let active = active_directions(LogicalPosition { col: 1, row: 1, plane: 1 }, 3);
        let plan = SlotPlan::build(l.strides(3), 3, dims, &active, |_| true);
        let len_of = |d| plan.find(d).unwrap().len;
        assert_eq!(len_of(Direction::new(0, 0, 1)), 3 * 12);
        assert_eq!(len_of(Direction::new(0, 1, 0)), 3 * 8);
        assert_eq!(len_of(Direction::new(1, 0, 0)), 3 * 6);
        assert_eq!(len_of(Direction::new(1, 1, 0)), 3 * 2);
        assert_eq!(len_of(Direction::new(0, 1, 1)), 3 * 4);
        assert_eq!(len_of(Direction::new(1, 0, 1)), 3 * 3);
        assert_eq!(len_of(Direction::new(1, 1, 1)), 3);
        assert_eq!(plan.payload(), plan.iter().map(|s| s.len).sum::<usize>());
    }

    #[test]
    fn overlapping_plan_is_rejected() {
        let mut plan = SlotPlan::empty(1, BlockDims::new(2, 2, 2));
        plan.slots.push(MessageSlot {
            direction: Direction::new(0, 0, -1),
            class: NeighborClass::Face,
            offset: 0,
            stride: 8,
            len: 4,
        });
        plan.slots.push(MessageSlot {
            direction: Direction::new(0, 0, 1),
            class: NeighborClass::Face,
            offset: 4,
            stride: 8,
            len: 4,
        });
        assert!(matches!(
            plan.validate_invariants(),
            Err(HaloError::PlanInvariant(_))
        ));
    }
}
