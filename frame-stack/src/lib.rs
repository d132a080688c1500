//! A segmented LIFO stack.
//!
//! Items live in fixed-size segments of roughly one page each, so growing
//! the stack never moves items that are already pushed. Every segment except
//! the last one is full, which keeps indexed access O(1).

use std::ops::Index;

const SEGMENT_BYTES: usize = 4096;

pub struct Stack<T> {
    segments: Vec<Vec<T>>,
    cache: Vec<Vec<T>>,
    max_cache: usize,
    len: usize,
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            cache: Vec::new(),
            max_cache: 4,
            len: 0,
        }
    }

    fn alloc(&mut self) -> Vec<T> {
        if let Some(cache) = self.cache.pop() {
            cache
        } else {
            Vec::with_capacity(Self::segment_size())
        }
    }

    fn recycle(&mut self, buf: Vec<T>) {
        debug_assert!(buf.is_empty());
        if self.cache.len() < self.max_cache {
            self.cache.push(buf);
        }
    }

    pub const fn segment_size() -> usize {
        let size = std::mem::size_of::<T>();
        if size == 0 || size >= SEGMENT_BYTES {
            1
        } else {
            SEGMENT_BYTES / size
        }
    }

    #[inline(always)]
    pub fn push(&mut self, item: T) {
        let needs_segment = match self.segments.last() {
            Some(segment) => segment.len() == Self::segment_size(),
            None => true,
        };
        if needs_segment {
            let new_buf = self.alloc();
            self.segments.push(new_buf);
        }
        if let Some(segment) = self.segments.last_mut() {
            segment.push(item);
            self.len += 1;
        }
    }

    #[inline(always)]
    pub fn pop(&mut self) -> Option<T> {
        let segment = self.segments.last_mut()?;
        let item = segment.pop();
        if segment.is_empty() {
            if let Some(buf) = self.segments.pop() {
                self.recycle(buf);
            }
        }
        if item.is_some() {
            self.len -= 1;
        }
        item
    }

    #[inline(always)]
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.segments.last_mut().and_then(|s| s.last_mut())
    }

    /// The item at `index`, counting from the bottom of the stack.
    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let segment_size = Self::segment_size();
        self.segments
            .get(index / segment_size)
            .and_then(|s| s.get(index % segment_size))
    }

    /// Drops every item, keeping up to `max_cache` segments for reuse.
    pub fn clear(&mut self) {
        while let Some(mut buf) = self.segments.pop() {
            buf.clear();
            self.recycle(buf);
        }
        self.len = 0;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Index<usize> for Stack<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(item) => item,
            None => panic!("index {} out of bounds for stack of {}", index, self.len),
        }
    }
}
