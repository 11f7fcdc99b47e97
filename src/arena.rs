//! Fast, but limited allocator backing the tree's node storage.

use std::mem;
use std::ops::{Index, IndexMut};

/// A stable reference to a slot in an `Arena<T>`.
///
/// Handles remain valid across further allocations because chunks are never reallocated, and a
/// handle is only invalidated when its slot is freed. A handle is only meaningful for the arena
/// that produced it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Handle {
    chunk_index: usize,
    block_index: usize,
}

#[derive(Serialize, Deserialize)]
enum Slot<T> {
    Occupied(T),
    Vacant(Option<Handle>),
}

/// A fast, but limited allocator that only allocates a single type of object.
///
/// Objects are stored in fixed-size chunks so that growing the arena never moves existing slots.
/// Freed slots are threaded into a vacancy list and recycled by later allocations. All remaining
/// objects are destroyed when the arena is destroyed.
///
/// # Examples
///
/// ```
/// use arena_rbtree::arena::Arena;
///
/// let mut arena = Arena::new(1024);
///
/// let x = arena.allocate(1);
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena.free(&x), 2);
/// ```
#[derive(Serialize, Deserialize)]
pub struct Arena<T> {
    vacant_head: Option<Handle>,
    chunks: Vec<Vec<Slot<T>>>,
    chunk_size: usize,
    len: usize,
    capacity: usize,
}

impl<T> Arena<T> {
    /// Constructs a new, empty `Arena<T>` with a specific number of objects per chunk.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::arena::Arena;
    ///
    /// let arena: Arena<u32> = Arena::new(1024);
    /// assert_eq!(arena.len(), 0);
    /// ```
    pub fn new(chunk_size: usize) -> Self {
        Arena {
            vacant_head: None,
            chunks: Vec::new(),
            chunk_size,
            len: 0,
            capacity: 0,
        }
    }

    fn is_valid_handle(&self, handle: &Handle) -> bool {
        handle.chunk_index < self.chunks.len()
            && handle.block_index < self.chunks[handle.chunk_index].len()
    }

    /// Allocates an object in the arena and returns a handle to its slot, reusing a vacant slot
    /// when one is available.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::arena::Arena;
    ///
    /// let mut arena = Arena::new(1024);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.get(&x), Some(&0));
    /// ```
    pub fn allocate(&mut self, value: T) -> Handle {
        self.len += 1;
        match self.vacant_head.take() {
            None => {
                if self.len > self.capacity {
                    self.chunks.push(Vec::with_capacity(self.chunk_size));
                    self.capacity += self.chunk_size;
                }
                let chunk_count = self.chunks.len();
                let last_chunk = &mut self.chunks[chunk_count - 1];
                last_chunk.push(Slot::Occupied(value));
                Handle {
                    chunk_index: chunk_count - 1,
                    block_index: last_chunk.len() - 1,
                }
            }
            Some(handle) => {
                let vacant_slot = mem::replace(
                    &mut self.chunks[handle.chunk_index][handle.block_index],
                    Slot::Occupied(value),
                );
                match vacant_slot {
                    Slot::Vacant(next_handle) => {
                        self.vacant_head = next_handle;
                        handle
                    }
                    Slot::Occupied(_) => panic!("Expected a vacant slot."),
                }
            }
        }
    }

    /// Frees the slot behind a handle and returns the object it held.
    ///
    /// # Panics
    ///
    /// Panics if the handle refers to an invalid or vacant slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::arena::Arena;
    ///
    /// let mut arena = Arena::new(1024);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.free(&x), 0);
    /// ```
    pub fn free(&mut self, handle: &Handle) -> T {
        if !self.is_valid_handle(handle) {
            panic!("Error: attempting to free invalid slot.");
        }
        let old_slot = mem::replace(
            &mut self.chunks[handle.chunk_index][handle.block_index],
            Slot::Vacant(self.vacant_head.take()),
        );
        match old_slot {
            Slot::Vacant(_) => panic!("Error: attempting to free vacant slot."),
            Slot::Occupied(value) => {
                self.len -= 1;
                self.vacant_head = Some(*handle);
                value
            }
        }
    }

    /// Returns an immutable reference to the object behind a handle, or `None` if the handle does
    /// not refer to an occupied slot.
    pub fn get(&self, handle: &Handle) -> Option<&T> {
        if !self.is_valid_handle(handle) {
            return None;
        }
        match self.chunks[handle.chunk_index][handle.block_index] {
            Slot::Occupied(ref value) => Some(value),
            Slot::Vacant(_) => None,
        }
    }

    /// Returns a mutable reference to the object behind a handle, or `None` if the handle does
    /// not refer to an occupied slot.
    pub fn get_mut(&mut self, handle: &Handle) -> Option<&mut T> {
        if !self.is_valid_handle(handle) {
            return None;
        }
        match self.chunks[handle.chunk_index][handle.block_index] {
            Slot::Occupied(ref mut value) => Some(value),
            Slot::Vacant(_) => None,
        }
    }

    /// Returns the number of occupied slots in the arena.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Index<Handle> for Arena<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &Self::Output {
        self.get(&handle).expect("Error: handle out of bounds.")
    }
}

impl<T> IndexMut<Handle> for Arena<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut Self::Output {
        self.get_mut(&handle).expect("Error: handle out of bounds.")
    }
}
