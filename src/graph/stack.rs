use crate::heap::ObjectRef;
use frame_stack::Stack;

/// One step of the current path: an object and the next slot to scan.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub(crate) object: ObjectRef,
    pub(crate) next_slot: usize,
}

/// The path from a start object to the object being visited.
///
/// `frames[i + 1].object` was loaded from a slot of `frames[i].object`.
pub struct PathStack {
    frames: Stack<Frame>,
}

impl Default for PathStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PathStack {
    pub fn new() -> Self {
        PathStack {
            frames: Stack::new(),
        }
    }

    pub fn push(&mut self, object: ObjectRef) {
        self.frames.push(Frame {
            object,
            next_slot: 0,
        });
    }

    pub fn pop(&mut self) -> Option<ObjectRef> {
        self.frames.pop().map(|f| f.object)
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// A cursor positioned at the top of the stack.
    pub fn cursor(&self) -> AncestorCursor<'_> {
        debug_assert!(!self.is_empty(), "No object is being visited");
        AncestorCursor {
            stack: self,
            index: self.len().saturating_sub(1),
        }
    }
}

/// Allows climbing the search tree all the way to the start object.
///
/// Borrowed from the walker for the duration of one visit only.
pub struct AncestorCursor<'s> {
    stack: &'s PathStack,
    index: usize,
}

impl AncestorCursor<'_> {
    /// The object this cursor currently points to.
    pub fn get(&self) -> ObjectRef {
        self.stack.frames[self.index].object
    }

    /// Returns false if there is no parent.
    pub fn move_to_parent(&mut self) -> bool {
        if self.index == 0 {
            false
        } else {
            self.index -= 1;
            true
        }
    }

    /// Distance from the start object; the start object itself is at 0.
    pub fn depth(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn o(i: usize) -> ObjectRef {
        ObjectRef::from_index(i)
    }

    #[test]
    fn test_cursor_climbs_to_root() {
        let mut stack = PathStack::new();
        for i in [3, 1, 4] {
            stack.push(o(i));
        }
        let mut it = stack.cursor();
        assert_eq!(it.get(), o(4));
        assert_eq!(it.depth(), 2);
        assert!(it.move_to_parent());
        assert_eq!(it.get(), o(1));
        assert!(it.move_to_parent());
        assert_eq!(it.get(), o(3));
        assert!(!it.move_to_parent());
        assert_eq!(it.get(), o(3));
        assert_eq!(it.depth(), 0);
    }

    #[test]
    fn test_frames_track_next_slot() {
        let mut stack = PathStack::new();
        stack.push(o(0));
        stack.top_mut().unwrap().next_slot += 2;
        stack.push(o(1));
        assert_eq!(stack.top_mut().unwrap().next_slot, 0);
        assert_eq!(stack.pop(), Some(o(1)));
        assert_eq!(stack.top_mut().unwrap().next_slot, 2);
        assert_eq!(stack.cursor().get(), o(0));
        stack.clear();
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
    }
}
