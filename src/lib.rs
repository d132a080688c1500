#[macro_use]
extern crate log;

pub mod graph;
pub mod heap;
mod heapdump;
mod sanity;
#[cfg(test)]
mod test_util;

pub use crate::graph::{
    AncestorCursor, ClassRetention, ClassUsage, Direction, GraphWalker, ObjectGraph,
    RetainedSizeAnalyzer, Retention, StartSet, Termination, TraversalStats, Visitor,
};
pub use crate::heap::{ClassId, HeapGraph, HeapSnapshot, NoAllocationScope, ObjectRef};
pub use crate::heapdump::{HeapDump, HeapObject, NormalEdge, RootEdge, Space};
pub use crate::sanity::sanity_trace;
