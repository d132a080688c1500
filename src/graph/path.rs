use super::{Direction, ObjectGraph};
use crate::heap::{HeapGraph, ObjectRef};

impl<H: HeapGraph> ObjectGraph<'_, H> {
    /// The path the walker took from a root to `target`, root first.
    ///
    /// This is the first path found in visit order, not necessarily the
    /// shortest one. Returns `None` if `target` is unreachable.
    pub fn retaining_path(&self, target: ObjectRef) -> Option<Vec<ObjectRef>> {
        if !self.heap.contains(target) {
            return None;
        }
        let mut path = None;
        self.iterate_objects_with(|it| {
            if it.get() != target {
                return Direction::Proceed;
            }
            let mut p = Vec::with_capacity(it.depth() + 1);
            p.push(it.get());
            while it.move_to_parent() {
                p.push(it.get());
            }
            p.reverse();
            path = Some(p);
            Direction::Abort
        });
        path
    }

    /// Every reachable object with a slot referring to `target`, in visit
    /// order. An object with several such slots is listed once.
    pub fn inbound_references(&self, target: ObjectRef) -> Vec<ObjectRef> {
        let mut referrers = vec![];
        if !self.heap.contains(target) {
            return referrers;
        }
        self.iterate_objects_with(|it| {
            let o = it.get();
            let refers =
                (0..self.heap.num_slots(o)).any(|i| self.heap.load_slot(o, i) == Some(target));
            if refers {
                referrers.push(o);
            }
            Direction::Proceed
        });
        referrers
    }
}
