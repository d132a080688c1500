use super::stack::PathStack;
use super::visited::VisitedSet;
use super::{Direction, Termination, TraversalStats, Visitor};
use crate::heap::{HeapGraph, NoAllocationScope, ObjectRef};

/// Where a traversal starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartSet {
    /// Every root of the heap, in root order.
    Roots,
    /// A single object, which becomes the bottom of the path.
    Object(ObjectRef),
}

/// Pre-order depth first search over a heap graph.
///
/// The search keeps its own explicit stack, so the depth of the graph is
/// bounded by memory rather than by the native call stack.
pub struct GraphWalker<'h, H: HeapGraph> {
    heap: &'h H,
}

impl<'h, H: HeapGraph> GraphWalker<'h, H> {
    pub fn new(heap: &'h H) -> Self {
        GraphWalker { heap }
    }

    pub fn traverse<V>(&self, start: StartSet, visitor: &mut V) -> TraversalStats
    where
        V: Visitor + ?Sized,
    {
        let _scope = NoAllocationScope::acquire(self.heap);
        let mut session = Session::new(self.heap);
        match start {
            StartSet::Roots => {
                for &root in self.heap.roots() {
                    if session.walk_from(root, visitor) == Termination::Aborted {
                        break;
                    }
                }
            }
            StartSet::Object(o) => {
                if self.heap.contains(o) {
                    session.walk_from(o, visitor);
                } else {
                    debug!("{:?} is not in the heap, nothing to traverse", o);
                }
            }
        }
        trace!("{:?}", session.stats);
        session.stats
    }
}

/// Traversal-local state, dropped when `traverse` returns.
struct Session<'h, H: HeapGraph> {
    heap: &'h H,
    visited: VisitedSet,
    stack: PathStack,
    stats: TraversalStats,
}

impl<'h, H: HeapGraph> Session<'h, H> {
    fn new(heap: &'h H) -> Self {
        Session {
            heap,
            visited: VisitedSet::new(heap.object_count()),
            stack: PathStack::new(),
            stats: TraversalStats::default(),
        }
    }

    fn walk_from<V>(&mut self, start: ObjectRef, visitor: &mut V) -> Termination
    where
        V: Visitor + ?Sized,
    {
        debug_assert!(self.stack.is_empty());
        if !self.visit(start, visitor) {
            return Termination::Aborted;
        }
        while let Some(frame) = self.stack.top_mut() {
            let o = frame.object;
            let slot = frame.next_slot;
            if slot >= self.heap.num_slots(o) {
                self.stack.pop();
                continue;
            }
            frame.next_slot += 1;
            self.stats.slots += 1;
            let Some(child) = self.heap.load_slot(o, slot) else {
                continue;
            };
            self.stats.non_empty_slots += 1;
            if !self.visit(child, visitor) {
                return Termination::Aborted;
            }
        }
        Termination::Completed
    }

    /// Marks `o` and hands it to the visitor. Returns false if the visitor
    /// aborted the traversal.
    fn visit<V>(&mut self, o: ObjectRef, visitor: &mut V) -> bool
    where
        V: Visitor + ?Sized,
    {
        if !self.visited.mark_and_test_if_new(o) {
            return true;
        }
        self.stack.push(o);
        self.stats.visited_objects += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.stack.len());
        match visitor.visit_object(&mut self.stack.cursor()) {
            Direction::Proceed => true,
            Direction::Backtrack => {
                self.stack.pop();
                true
            }
            Direction::Abort => {
                self.stack.clear();
                self.stats.termination = Termination::Aborted;
                false
            }
        }
    }
}
