use crate::{HeapDump, HeapObject, HeapSnapshot, NormalEdge, RootEdge};

/// Builds small heap dumps by hand. Reference slots are laid out one word
/// apart after a two-word header.
pub(crate) struct DumpBuilder {
    dump: HeapDump,
}

impl DumpBuilder {
    pub(crate) fn new() -> Self {
        DumpBuilder {
            dump: HeapDump::default(),
        }
    }

    pub(crate) fn object(mut self, start: u64, klass: u64, size: u64, refs: &[u64]) -> Self {
        let edges = refs
            .iter()
            .enumerate()
            .map(|(i, &objref)| NormalEdge {
                slot: start + 16 + 8 * i as u64,
                objref,
            })
            .collect();
        self.dump.objects.push(HeapObject {
            start,
            klass,
            size,
            objarray_length: None,
            edges,
        });
        self
    }

    pub(crate) fn root(mut self, objref: u64) -> Self {
        self.dump.roots.push(RootEdge { objref });
        self
    }

    pub(crate) fn build(self) -> HeapDump {
        self.dump
    }

    pub(crate) fn snapshot(self) -> HeapSnapshot {
        HeapSnapshot::from_heapdump(&self.dump).unwrap()
    }
}
