//! Bounded LIFO stack backing the frame's deferred capabilities and children.

use smallvec::SmallVec;

use crate::error::StackFull;

/// Capacity of every frame stack.
pub const STACK_CAPACITY: usize = 10;

/// A LIFO stack holding at most [`STACK_CAPACITY`] entries.
pub struct BoundedStack<T> {
    name: &'static str,
    items: SmallVec<[T; STACK_CAPACITY]>,
}

impl<T> BoundedStack<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            items: SmallVec::new(),
        }
    }

    /// Push an entry. When the stack is full the entry is handed back.
    pub fn push(&mut self, item: T) -> Result<(), StackFull<T>> {
        if self.items.len() >= STACK_CAPACITY {
            return Err(StackFull {
                item,
                stack: self.name,
                capacity: STACK_CAPACITY,
            });
        }
        self.items.push(item);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= STACK_CAPACITY
    }
}
