use crate::heap::ObjectRef;
use fixedbitset::FixedBitSet;

/// One mark bit per object, scoped to a single traversal.
pub struct VisitedSet {
    marks: FixedBitSet,
}

impl VisitedSet {
    pub fn new(object_count: usize) -> Self {
        VisitedSet {
            marks: FixedBitSet::with_capacity(object_count),
        }
    }

    /// Returns true the first time `o` is marked in this set.
    #[inline(always)]
    pub fn mark_and_test_if_new(&mut self, o: ObjectRef) -> bool {
        debug_assert!(o.index() < self.marks.len());
        !self.marks.put(o.index())
    }

    pub fn contains(&self, o: ObjectRef) -> bool {
        self.marks.contains(o.index())
    }

    pub(crate) fn into_bitset(self) -> FixedBitSet {
        self.marks
    }

    pub(crate) fn as_bitset(&self) -> &FixedBitSet {
        &self.marks
    }
}
