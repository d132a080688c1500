use crate::heap::{HeapGraph, ObjectRef};
use std::collections::HashSet;

/// Counts the objects reachable from the roots with a plain work list,
/// independently of [`GraphWalker`](crate::GraphWalker).
pub fn sanity_trace<H: HeapGraph>(heap: &H) -> usize {
    let mut reachable_objects: HashSet<ObjectRef> = HashSet::new();
    let mut mark_stack: Vec<ObjectRef> = vec![];
    for root in heap.roots() {
        debug_assert!(heap.contains(*root));
        mark_stack.push(*root);
    }
    while let Some(o) = mark_stack.pop() {
        if !reachable_objects.insert(o) {
            continue;
        }
        heap.scan_object(o, |child| mark_stack.push(child));
    }
    reachable_objects.len()
}
