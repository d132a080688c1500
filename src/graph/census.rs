use super::retained::{RetainedSizeAnalyzer, Retention};
use super::{Direction, ObjectGraph};
use crate::heap::{ClassId, HeapGraph};
use std::collections::HashMap;

/// Reachable instances of one class and their shallow size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassUsage {
    pub class_id: ClassId,
    pub instances: u64,
    pub shallow_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRetention {
    pub usage: ClassUsage,
    pub retained: Retention,
}

impl<H: HeapGraph> ObjectGraph<'_, H> {
    /// Per-class totals over the reachable objects, largest shallow size
    /// first. Ties are broken by class id.
    pub fn class_histogram(&self) -> Vec<ClassUsage> {
        let mut usage: HashMap<ClassId, ClassUsage> = HashMap::new();
        self.iterate_objects_with(|it| {
            let o = it.get();
            let class_id = self.heap.class_id_of(o);
            let entry = usage.entry(class_id).or_insert(ClassUsage {
                class_id,
                instances: 0,
                shallow_bytes: 0,
            });
            entry.instances += 1;
            entry.shallow_bytes += self.heap.size_of(o);
            Direction::Proceed
        });
        let mut histogram: Vec<ClassUsage> = usage.into_values().collect();
        histogram.sort_by(|a, b| {
            b.shallow_bytes
                .cmp(&a.shallow_bytes)
                .then(a.class_id.cmp(&b.class_id))
        });
        histogram
    }

    /// Retained sizes of the `n` classes with the largest shallow size.
    pub fn top_retainers(&self, n: usize) -> Vec<ClassRetention> {
        let analyzer = RetainedSizeAnalyzer::new(self.heap);
        self.class_histogram()
            .into_iter()
            .take(n)
            .map(|usage| ClassRetention {
                usage,
                retained: analyzer.retention_by_class(usage.class_id),
            })
            .collect()
    }
}
