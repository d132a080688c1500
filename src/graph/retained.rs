use super::stack::AncestorCursor;
use super::visited::VisitedSet;
use super::walker::{GraphWalker, StartSet};
use super::{Direction, Visitor};
use crate::heap::{ClassId, HeapGraph, ObjectRef};
use fixedbitset::FixedBitSet;

/// Objects and bytes kept alive by a set of objects.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    pub objects: usize,
    pub bytes: u64,
}

/// Computes retained sizes by differencing two reachability passes.
///
/// Pass A walks from the roots normally. Pass B walks from the roots again
/// but treats every member of the cut set as a leaf. The retained set is
/// everything pass A reached and pass B did not, plus the cut set itself.
pub struct RetainedSizeAnalyzer<'h, H: HeapGraph> {
    heap: &'h H,
}

/// Records every object it visits. Members of `cut` are recorded but not
/// scanned.
struct Recorder<'c, 'h, H: HeapGraph> {
    heap: &'h H,
    cut: Option<&'c FixedBitSet>,
    visited: VisitedSet,
    bytes: u64,
}

impl<H: HeapGraph> Visitor for Recorder<'_, '_, H> {
    fn visit_object(&mut self, it: &mut AncestorCursor<'_>) -> Direction {
        let o = it.get();
        self.visited.mark_and_test_if_new(o);
        self.bytes += self.heap.size_of(o);
        match self.cut {
            Some(cut) if cut.contains(o.index()) => Direction::Backtrack,
            _ => Direction::Proceed,
        }
    }
}

impl<'h, H: HeapGraph> RetainedSizeAnalyzer<'h, H> {
    pub fn new(heap: &'h H) -> Self {
        RetainedSizeAnalyzer { heap }
    }

    pub fn retained_by_instance(&self, target: ObjectRef) -> u64 {
        self.retention_by_instance(target).bytes
    }

    /// Bytes retained by all instances of `class_id` taken together.
    ///
    /// See [`Self::retention_by_class`].
    pub fn retained_by_class(&self, class_id: ClassId) -> u64 {
        self.retention_by_class(class_id).bytes
    }

    pub fn retention_by_instance(&self, target: ObjectRef) -> Retention {
        if !self.heap.contains(target) {
            return Retention::default();
        }
        let full = self.reach(None);
        if !full.contains(target) {
            // Nothing else can depend on an object that is already garbage
            debug!("{:?} is unreachable, only its own size is retained", target);
            return Retention {
                objects: 1,
                bytes: self.heap.size_of(target),
            };
        }
        let mut cut = FixedBitSet::with_capacity(self.heap.object_count());
        cut.insert(target.index());
        self.retention(full, cut)
    }

    /// Objects and bytes retained by all instances of `class_id` taken
    /// together.
    ///
    /// Instances are collected in heap dump order, the order of
    /// [`HeapGraph::for_each_instance`]. The retained set does not depend on
    /// that order. Instances that are already unreachable count their own
    /// shallow size. A class with no instances retains nothing.
    pub fn retention_by_class(&self, class_id: ClassId) -> Retention {
        let mut cut = FixedBitSet::with_capacity(self.heap.object_count());
        let mut instances = 0;
        self.heap.for_each_instance(class_id, |o| {
            cut.insert(o.index());
            instances += 1;
        });
        if instances == 0 {
            debug!("Class {} has no instances", class_id);
            return Retention::default();
        }
        let full = self.reach(None);
        self.retention(full, cut)
    }

    fn reach(&self, cut: Option<&FixedBitSet>) -> VisitedSet {
        let mut recorder = Recorder {
            heap: self.heap,
            cut,
            visited: VisitedSet::new(self.heap.object_count()),
            bytes: 0,
        };
        let stats = GraphWalker::new(self.heap).traverse(StartSet::Roots, &mut recorder);
        debug!(
            "{} pass reached {} objects ({} bytes)",
            if cut.is_some() { "Cut" } else { "Full" },
            stats.visited_objects,
            recorder.bytes
        );
        recorder.visited
    }

    fn retention(&self, full: VisitedSet, cut: FixedBitSet) -> Retention {
        let survivors = self.reach(Some(&cut));
        let mut retained = full.into_bitset();
        retained.difference_with(survivors.as_bitset());
        retained.union_with(&cut);
        let mut retention = Retention::default();
        for i in retained.ones() {
            retention.objects += 1;
            retention.bytes += self.heap.size_of(ObjectRef::from_index(i));
        }
        retention
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::DumpBuilder;
    use crate::HeapSnapshot;

    fn retained(heap: &HeapSnapshot, address: u64) -> u64 {
        RetainedSizeAnalyzer::new(heap).retained_by_instance(heap.lookup(address).unwrap())
    }

    #[test]
    fn test_shared_child_is_not_retained() {
        // root -> A -> B, root -> B
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[0x20, 0x30])
            .object(0x20, 2, 40, &[0x30])
            .object(0x30, 3, 64, &[])
            .root(0x10)
            .snapshot();
        assert_eq!(retained(&heap, 0x20), 40);
    }

    #[test]
    fn test_exclusive_child_is_retained() {
        // root -> A -> B
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[0x20])
            .object(0x20, 2, 40, &[0x30])
            .object(0x30, 3, 64, &[])
            .root(0x10)
            .snapshot();
        assert_eq!(retained(&heap, 0x20), 104);
        assert_eq!(retained(&heap, 0x10), 120);
    }

    #[test]
    fn test_child_reached_before_target_is_not_retained() {
        // The walker reaches B through C before it ever visits A
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[0x40, 0x20])
            .object(0x20, 2, 40, &[0x30])
            .object(0x30, 3, 64, &[])
            .object(0x40, 4, 8, &[0x30])
            .root(0x10)
            .snapshot();
        assert_eq!(retained(&heap, 0x20), 40);
        assert_eq!(retained(&heap, 0x40), 8);
    }

    #[test]
    fn test_cycle_through_target() {
        // root -> A -> B -> C -> A
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[0x20])
            .object(0x20, 2, 10, &[0x30])
            .object(0x30, 2, 20, &[0x40])
            .object(0x40, 2, 30, &[0x20])
            .root(0x10)
            .snapshot();
        assert_eq!(retained(&heap, 0x20), 60);
        assert_eq!(retained(&heap, 0x30), 50);
    }

    #[test]
    fn test_unreachable_target() {
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[])
            .object(0x20, 2, 40, &[0x30])
            .object(0x30, 3, 64, &[])
            .root(0x10)
            .snapshot();
        let analyzer = RetainedSizeAnalyzer::new(&heap);
        assert_eq!(
            analyzer.retention_by_instance(heap.lookup(0x20).unwrap()),
            Retention {
                objects: 1,
                bytes: 40
            }
        );
        assert_eq!(
            analyzer.retention_by_instance(ObjectRef::from_index(1000)),
            Retention::default()
        );
    }

    #[test]
    fn test_unknown_class() {
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[])
            .root(0x10)
            .snapshot();
        assert_eq!(RetainedSizeAnalyzer::new(&heap).retained_by_class(ClassId(99)), 0);
    }

    #[test]
    fn test_class_retention() {
        // Two instances of class 5 share a child; only together do they
        // retain it.
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[0x20, 0x30, 0x50])
            .object(0x20, 5, 32, &[0x40])
            .object(0x30, 5, 32, &[0x40])
            .object(0x40, 6, 100, &[])
            .object(0x50, 7, 8, &[0x60])
            .object(0x60, 8, 8, &[])
            .root(0x10)
            .snapshot();
        assert_eq!(retained(&heap, 0x20), 32);
        assert_eq!(retained(&heap, 0x30), 32);
        let analyzer = RetainedSizeAnalyzer::new(&heap);
        assert_eq!(
            analyzer.retention_by_class(ClassId(5)),
            Retention {
                objects: 3,
                bytes: 164
            }
        );
        assert_eq!(analyzer.retained_by_class(ClassId(7)), 16);
        assert!(!heap.allocation_paused());
    }

    #[test]
    fn test_instance_of_class_reachable_through_another() {
        // A and B are both of class 5, B only reachable through A
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[0x20])
            .object(0x20, 5, 32, &[0x30])
            .object(0x30, 5, 32, &[0x40])
            .object(0x40, 6, 100, &[])
            .root(0x10)
            .snapshot();
        assert_eq!(
            RetainedSizeAnalyzer::new(&heap).retained_by_class(ClassId(5)),
            164
        );
    }

    #[test]
    fn test_class_retention_ignores_instance_order() {
        // Same graph, instances of class 5 listed in opposite dump order
        let forward = DumpBuilder::new()
            .object(0x10, 1, 16, &[0x20, 0x30])
            .object(0x20, 5, 32, &[0x40])
            .object(0x30, 5, 24, &[0x40])
            .object(0x40, 6, 100, &[])
            .object(0x50, 5, 8, &[])
            .root(0x10)
            .snapshot();
        let backward = DumpBuilder::new()
            .object(0x50, 5, 8, &[])
            .object(0x40, 6, 100, &[])
            .object(0x30, 5, 24, &[0x40])
            .object(0x20, 5, 32, &[0x40])
            .object(0x10, 1, 16, &[0x20, 0x30])
            .root(0x10)
            .snapshot();
        let mut order = vec![];
        forward.for_each_instance(ClassId(5), |o| order.push(forward.address_of(o)));
        assert_eq!(order, vec![0x20, 0x30, 0x50]);
        let expected = Retention {
            objects: 4,
            bytes: 164,
        };
        assert_eq!(
            RetainedSizeAnalyzer::new(&forward).retention_by_class(ClassId(5)),
            expected
        );
        assert_eq!(
            RetainedSizeAnalyzer::new(&backward).retention_by_class(ClassId(5)),
            expected
        );
    }

    #[test]
    fn test_root_as_target() {
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[0x20])
            .object(0x20, 2, 16, &[])
            .object(0x30, 3, 16, &[0x20])
            .root(0x10)
            .root(0x30)
            .snapshot();
        assert_eq!(retained(&heap, 0x10), 16);
        assert_eq!(retained(&heap, 0x30), 16);
    }

    #[test]
    fn test_deterministic() {
        let heap = DumpBuilder::new()
            .object(0x10, 1, 16, &[0x20, 0x30])
            .object(0x20, 2, 40, &[0x30, 0x40])
            .object(0x30, 3, 64, &[0x20])
            .object(0x40, 2, 8, &[])
            .root(0x10)
            .snapshot();
        let analyzer = RetainedSizeAnalyzer::new(&heap);
        let first: Vec<u64> = (0..4)
            .map(|i| analyzer.retained_by_instance(ObjectRef::from_index(i)))
            .collect();
        let second: Vec<u64> = (0..4)
            .map(|i| analyzer.retained_by_instance(ObjectRef::from_index(i)))
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![128, 48, 64, 8]);
    }
}
