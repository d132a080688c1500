//! Ordered traversal of the object graph.
//!
//! Example uses:
//! - find a retaining path from the roots to a particular object, or
//! - determine how much memory is retained by some particular object(s).
//!
//! Every traversal holds a [`NoAllocationScope`](crate::heap::NoAllocationScope)
//! on the heap for its whole duration. Visitors run inside that scope and
//! must not allocate from the managed heap or trigger a collection in any
//! way; the walker cannot detect a violation.

use crate::heap::{ClassId, HeapGraph, ObjectRef};

mod census;
mod path;
mod retained;
mod stack;
mod visited;
mod walker;

pub use census::{ClassRetention, ClassUsage};
pub use retained::{RetainedSizeAnalyzer, Retention};
pub use stack::{AncestorCursor, PathStack};
pub use visited::VisitedSet;
pub use walker::{GraphWalker, StartSet};

/// Directs how the search should continue after visiting an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Recurse on this object's references.
    Proceed,
    /// Ignore this object's references.
    Backtrack,
    /// Terminate the entire search immediately.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    #[default]
    Completed,
    Aborted,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TraversalStats {
    pub termination: Termination,
    /// Number of visitor calls made
    pub visited_objects: u64,
    pub slots: u64,
    pub non_empty_slots: u64,
    /// Longest path seen, counted in objects
    pub max_depth: usize,
}

pub trait Visitor {
    /// Visits the object pointed to by `it`. The cursor is only valid during
    /// this call.
    fn visit_object(&mut self, it: &mut AncestorCursor<'_>) -> Direction;
}

impl<F> Visitor for F
where
    F: FnMut(&mut AncestorCursor<'_>) -> Direction,
{
    fn visit_object(&mut self, it: &mut AncestorCursor<'_>) -> Direction {
        self(it)
    }
}

/// Entry point for the traversals and analyses over one heap.
pub struct ObjectGraph<'h, H: HeapGraph> {
    heap: &'h H,
}

impl<'h, H: HeapGraph> ObjectGraph<'h, H> {
    pub fn new(heap: &'h H) -> Self {
        ObjectGraph { heap }
    }

    pub fn heap(&self) -> &'h H {
        self.heap
    }

    /// Visits all strongly reachable objects in the heap, in a pre-order,
    /// depth first traversal.
    pub fn iterate_objects<V>(&self, visitor: &mut V) -> TraversalStats
    where
        V: Visitor + ?Sized,
    {
        GraphWalker::new(self.heap).traverse(StartSet::Roots, visitor)
    }

    /// Like [`Self::iterate_objects`], but restricted to objects reachable
    /// from `root` (including `root` itself).
    pub fn iterate_objects_from<V>(&self, root: ObjectRef, visitor: &mut V) -> TraversalStats
    where
        V: Visitor + ?Sized,
    {
        GraphWalker::new(self.heap).traverse(StartSet::Object(root), visitor)
    }

    pub fn iterate_objects_with<F>(&self, mut f: F) -> TraversalStats
    where
        F: FnMut(&mut AncestorCursor<'_>) -> Direction,
    {
        self.iterate_objects(&mut f)
    }

    pub fn iterate_objects_from_with<F>(&self, root: ObjectRef, mut f: F) -> TraversalStats
    where
        F: FnMut(&mut AncestorCursor<'_>) -> Direction,
    {
        self.iterate_objects_from(root, &mut f)
    }

    /// The number of bytes retained by `o`.
    pub fn size_retained_by_instance(&self, o: ObjectRef) -> u64 {
        RetainedSizeAnalyzer::new(self.heap).retained_by_instance(o)
    }

    /// The number of bytes retained by the set of all objects of the given
    /// class.
    pub fn size_retained_by_class(&self, class_id: ClassId) -> u64 {
        RetainedSizeAnalyzer::new(self.heap).retained_by_class(class_id)
    }

    /// Number and total shallow size of the objects reachable from the roots.
    pub fn reachable_size(&self) -> Retention {
        let mut reachable = Retention::default();
        self.iterate_objects_with(|it| {
            reachable.objects += 1;
            reachable.bytes += self.heap.size_of(it.get());
            Direction::Proceed
        });
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::DumpBuilder;

    #[test]
    fn test_reachable_size_ignores_garbage() {
        let heap = DumpBuilder::new()
            .object(0x10, 1, 32, &[0x20])
            .object(0x20, 1, 24, &[])
            .object(0x30, 1, 100, &[0x10])
            .root(0x10)
            .snapshot();
        let graph = ObjectGraph::new(&heap);
        assert_eq!(
            graph.reachable_size(),
            Retention {
                objects: 2,
                bytes: 56
            }
        );
    }

    #[test]
    fn test_iterate_objects_from() {
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[0x20])
            .object(0x20, 1, 16, &[])
            .object(0x30, 1, 16, &[0x10])
            .root(0x30)
            .snapshot();
        let graph = ObjectGraph::new(&heap);
        let mut seen = vec![];
        let stats = graph.iterate_objects_from_with(heap.lookup(0x10).unwrap(), |it| {
            seen.push(heap.address_of(it.get()));
            Direction::Proceed
        });
        assert_eq!(seen, vec![0x10, 0x20]);
        assert_eq!(stats.slots, 1);
        assert_eq!(stats.non_empty_slots, 1);
    }

    #[test]
    fn test_empty_slots_are_counted() {
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[0, 0x20, 0])
            .object(0x20, 1, 16, &[0x10])
            .root(0x10)
            .snapshot();
        let stats = ObjectGraph::new(&heap).iterate_objects_with(|_| Direction::Proceed);
        assert_eq!(stats.visited_objects, 2);
        assert_eq!(stats.slots, 4);
        assert_eq!(stats.non_empty_slots, 2);
    }
}
