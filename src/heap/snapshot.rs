use super::{ClassId, HeapGraph, ObjectRef};
use crate::HeapDump;
use anyhow::{bail, Result};
use std::cell::Cell;
use std::collections::HashMap;

/// An immutable object graph restored from a [`HeapDump`].
///
/// Handles are assigned in dump order. Reference slots are stored
/// contiguously: the slots of object `i` are
/// `slots[slot_starts[i]..slot_starts[i + 1]]`.
pub struct HeapSnapshot {
    addresses: Vec<u64>,
    sizes: Vec<u64>,
    classes: Vec<ClassId>,
    slot_starts: Vec<usize>,
    slots: Vec<Option<ObjectRef>>,
    roots: Vec<ObjectRef>,
    object_map: HashMap<u64, ObjectRef>,
    instances: HashMap<ClassId, Vec<ObjectRef>>,
    no_allocation_depth: Cell<usize>,
}

impl HeapSnapshot {
    pub fn from_heapdump(heapdump: &HeapDump) -> Result<HeapSnapshot> {
        let num_objects = heapdump.objects.len();
        let mut object_map = HashMap::with_capacity(num_objects);
        let mut addresses = Vec::with_capacity(num_objects);
        let mut sizes = Vec::with_capacity(num_objects);
        let mut classes = Vec::with_capacity(num_objects);
        let mut instances: HashMap<ClassId, Vec<ObjectRef>> = HashMap::new();
        for (i, object) in heapdump.objects.iter().enumerate() {
            let o = ObjectRef::from_index(i);
            if object_map.insert(object.start, o).is_some() {
                bail!("Object 0x{:x} appears twice in the heap dump", object.start);
            }
            addresses.push(object.start);
            sizes.push(object.size);
            let class_id = ClassId(object.klass);
            classes.push(class_id);
            instances.entry(class_id).or_default().push(o);
        }

        let num_edges = heapdump.objects.iter().map(|o| o.edges.len()).sum();
        let mut slot_starts = Vec::with_capacity(num_objects + 1);
        let mut slots = Vec::with_capacity(num_edges);
        let mut dangling_edges = 0;
        for object in &heapdump.objects {
            slot_starts.push(slots.len());
            for e in &object.edges {
                if e.objref == 0 {
                    slots.push(None);
                    continue;
                }
                let child = object_map.get(&e.objref).copied();
                if child.is_none() {
                    warn!(
                        "Slot 0x{:x} of 0x{:x} refers to 0x{:x}, which is not in the heap dump",
                        e.slot, object.start, e.objref
                    );
                    dangling_edges += 1;
                }
                slots.push(child);
            }
        }
        slot_starts.push(slots.len());

        let mut roots = Vec::with_capacity(heapdump.roots.len());
        for root in &heapdump.roots {
            if root.objref == 0 {
                continue;
            }
            match object_map.get(&root.objref) {
                Some(o) => roots.push(*o),
                None => warn!("Root 0x{:x} is not in the heap dump", root.objref),
            }
        }

        info!(
            "Restored {} objects, {} slots ({} dangling), {} roots, {} classes",
            num_objects,
            slots.len(),
            dangling_edges,
            roots.len(),
            instances.len()
        );
        Ok(HeapSnapshot {
            addresses,
            sizes,
            classes,
            slot_starts,
            slots,
            roots,
            object_map,
            instances,
            no_allocation_depth: Cell::new(0),
        })
    }

    /// The handle of the object starting at `address`.
    pub fn lookup(&self, address: u64) -> Option<ObjectRef> {
        self.object_map.get(&address).copied()
    }

    pub fn address_of(&self, o: ObjectRef) -> u64 {
        self.addresses[o.index()]
    }

    /// All classes with at least one instance, in ascending order.
    pub fn classes(&self) -> Vec<ClassId> {
        let mut classes: Vec<ClassId> = self.instances.keys().copied().collect();
        classes.sort_unstable();
        classes
    }

    /// Whether some traversal currently holds a no-allocation scope.
    pub fn allocation_paused(&self) -> bool {
        self.no_allocation_depth.get() > 0
    }

    fn slots_of(&self, o: ObjectRef) -> &[Option<ObjectRef>] {
        let i = o.index();
        &self.slots[self.slot_starts[i]..self.slot_starts[i + 1]]
    }
}

impl HeapGraph for HeapSnapshot {
    fn roots(&self) -> &[ObjectRef] {
        &self.roots
    }

    fn object_count(&self) -> usize {
        self.addresses.len()
    }

    fn num_slots(&self, o: ObjectRef) -> usize {
        self.slots_of(o).len()
    }

    fn load_slot(&self, o: ObjectRef, index: usize) -> Option<ObjectRef> {
        self.slots_of(o).get(index).copied().flatten()
    }

    fn size_of(&self, o: ObjectRef) -> u64 {
        self.sizes[o.index()]
    }

    fn class_id_of(&self, o: ObjectRef) -> ClassId {
        self.classes[o.index()]
    }

    fn for_each_instance<F>(&self, class_id: ClassId, f: F)
    where
        F: FnMut(ObjectRef),
    {
        if let Some(objects) = self.instances.get(&class_id) {
            objects.iter().copied().for_each(f);
        }
    }

    fn enter_no_allocation_scope(&self) {
        self.no_allocation_depth
            .set(self.no_allocation_depth.get() + 1);
    }

    fn exit_no_allocation_scope(&self) {
        let depth = self.no_allocation_depth.get();
        debug_assert!(depth > 0, "Unbalanced no-allocation scope");
        self.no_allocation_depth.set(depth.saturating_sub(1));
    }
}
