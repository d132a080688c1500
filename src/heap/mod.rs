use std::fmt;

/// Identity of one heap object.
///
/// Handles are dense indices handed out by the heap, so a traversal can keep
/// per-object state in a bitmap. A handle is only meaningful while the heap
/// that produced it is held in a [`NoAllocationScope`].
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
#[repr(transparent)]
pub struct ObjectRef(usize);

impl ObjectRef {
    pub const fn from_index(index: usize) -> Self {
        ObjectRef(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// The klass word shared by all instances of one class.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
#[repr(transparent)]
pub struct ClassId(pub u64);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// A read-only view of the object graph owned by the memory manager.
///
/// Implementations must return identical answers for as long as a
/// [`NoAllocationScope`] is held on them.
pub trait HeapGraph {
    /// The root set, in a stable order.
    fn roots(&self) -> &[ObjectRef];
    /// Upper bound (exclusive) of every handle this heap hands out.
    fn object_count(&self) -> usize;
    fn contains(&self, o: ObjectRef) -> bool {
        o.index() < self.object_count()
    }
    /// Number of reference slots of `o`, including empty ones.
    fn num_slots(&self, o: ObjectRef) -> usize;
    /// Loads slot `index` of `o`. Returns `None` for an empty slot.
    fn load_slot(&self, o: ObjectRef, index: usize) -> Option<ObjectRef>;
    /// Shallow size of `o` in bytes.
    fn size_of(&self, o: ObjectRef) -> u64;
    fn class_id_of(&self, o: ObjectRef) -> ClassId;
    /// Calls `f` on every instance of `class_id`, in a fixed order. Unknown
    /// classes have no instances.
    fn for_each_instance<F>(&self, class_id: ClassId, f: F)
    where
        F: FnMut(ObjectRef);
    fn enter_no_allocation_scope(&self);
    fn exit_no_allocation_scope(&self);

    /// Calls `callback` on every non-empty slot of `o`, in slot order.
    fn scan_object<F>(&self, o: ObjectRef, mut callback: F)
    where
        F: FnMut(ObjectRef),
    {
        for i in 0..self.num_slots(o) {
            if let Some(child) = self.load_slot(o, i) {
                callback(child);
            }
        }
    }
}

/// Keeps the heap from allocating or moving objects until dropped.
pub struct NoAllocationScope<'h, H: HeapGraph> {
    heap: &'h H,
}

impl<'h, H: HeapGraph> NoAllocationScope<'h, H> {
    pub fn acquire(heap: &'h H) -> Self {
        heap.enter_no_allocation_scope();
        NoAllocationScope { heap }
    }
}

impl<H: HeapGraph> Drop for NoAllocationScope<'_, H> {
    fn drop(&mut self) {
        self.heap.exit_no_allocation_scope();
    }
}

mod snapshot;
pub use snapshot::HeapSnapshot;
