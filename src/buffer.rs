use std::alloc::Layout;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use log::trace;

use crate::memory::PlatformMemory;

/// A block of memory handed out by an [`Allocator`](crate::Allocator).
///
/// The buffer owns its block: it is released exactly once, when
/// the buffer is dropped (or passed to
/// [`Allocator::release`](crate::Allocator::release)), and the
/// borrow on the memory manager keeps it from outliving the
/// manager it came from.
pub struct Buffer<'a, M: PlatformMemory> {
    /// Start of the block.
    ptr: NonNull<u8>,
    /// Size and alignment the block was requested with; needed
    /// again to release it.
    layout: Layout,
    /// The memory manager the block goes back to.
    memory: &'a M,
}

impl<'a, M: PlatformMemory> Buffer<'a, M> {
    /// # Safety
    ///
    /// `ptr` must have been returned by `memory` for `layout`,
    /// must point to initialized bytes, and must not be owned by
    /// anything else.
    pub(crate) unsafe fn from_raw_parts(ptr: NonNull<u8>, layout: Layout, memory: &'a M) -> Self {
        Self { ptr, layout, memory }
    }

    /// Size of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Give up ownership of the block without releasing it.
    ///
    /// The returned pointer must eventually be handed back to
    /// [`Allocator::release_raw`](crate::Allocator::release_raw)
    /// on an allocator with the same memory manager and config,
    /// or the block leaks.
    pub fn into_raw(self) -> *mut u8 {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }
}

impl<M: PlatformMemory> Deref for Buffer<'_, M> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: the block is valid for `len` initialized bytes
        // for as long as the buffer lives.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }
}

impl<M: PlatformMemory> DerefMut for Buffer<'_, M> {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` makes the access
        // exclusive.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len()) }
    }
}

impl<M: PlatformMemory> Drop for Buffer<'_, M> {
    fn drop(&mut self) {
        // SAFETY: the block came from this memory manager with
        // this layout, and owning it means nobody released it.
        unsafe { self.memory.release(self.ptr, self.layout) };
        trace!("Released buffer of {} bytes.", self.layout.size());
    }
}

impl<M: PlatformMemory> fmt::Debug for Buffer<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len())
            .finish()
    }
}

// SAFETY: a buffer is an exclusively owned block of bytes, like a
// `Box<[u8]>`; sending it only needs the memory manager to be
// shareable, which `PlatformMemory: Sync` guarantees.
unsafe impl<M: PlatformMemory> Send for Buffer<'_, M> {}
unsafe impl<M: PlatformMemory> Sync for Buffer<'_, M> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Counting, System};

    fn buffer_of(memory: &Counting, size: usize) -> Buffer<'_, Counting> {
        let layout = Layout::from_size_align(size, 16).unwrap();
        let ptr = memory.allocate_zeroed(layout).unwrap();
        unsafe { Buffer::from_raw_parts(ptr, layout, memory) }
    }

    #[test]
    fn drop_releases_the_block() {
        let memory = Counting::new(System);
        let buffer = buffer_of(&memory, 32);
        assert_eq!(memory.stats().live_blocks, 1);

        drop(buffer);
        assert_eq!(memory.stats().live_blocks, 0);
        assert_eq!(memory.stats().releases, 1);
    }

    #[test]
    fn whole_extent_is_writable() {
        let memory = Counting::new(System);
        let mut buffer = buffer_of(&memory, 100);
        buffer.fill(0xAB);
        assert_eq!(buffer.len(), 100);
        assert!(buffer.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn into_raw_skips_the_release() {
        let memory = Counting::new(System);
        let buffer = buffer_of(&memory, 32);
        let layout = buffer.layout();
        let raw = buffer.into_raw();
        assert_eq!(memory.stats().releases, 0);

        unsafe { memory.release(NonNull::new(raw).unwrap(), layout) };
        assert_eq!(memory.stats().live_bytes, 0);
    }

    #[test]
    fn buffer_can_move_to_another_thread() {
        let memory = Counting::new(System);
        let mut buffer = buffer_of(&memory, 16);
        std::thread::scope(|scope| {
            scope.spawn(move || {
                buffer[15] = 7;
                assert_eq!(buffer[15], 7);
            });
        });
        assert_eq!(memory.stats().live_blocks, 0);
    }
}
