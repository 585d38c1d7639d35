use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicUsize, Ordering};

/// The platform memory manager buffers are requested from.
///
/// # Safety
///
/// A pointer returned by `allocate` or `allocate_zeroed` must
/// point to a block of at least `layout.size()` bytes aligned to
/// `layout.align()`, valid until it is handed back to `release`
/// with the same layout.
pub unsafe trait PlatformMemory: Send + Sync {
    /// Request an uninitialized block. `None` means the request
    /// could not be satisfied.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Request a block whose bytes are all zero.
    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>> {
        let block = self.allocate(layout)?;
        // SAFETY: the block was just allocated with this layout,
        // so it is valid for `layout.size()` bytes of writes.
        unsafe { ptr::write_bytes(block.as_ptr(), 0, layout.size()) };
        Some(block)
    }

    /// Give a block back.
    ///
    /// # Safety
    ///
    /// `block` must come from `allocate` or `allocate_zeroed` on
    /// this same memory manager with the same `layout`, and must
    /// not have been released already.
    unsafe fn release(&self, block: NonNull<u8>, layout: Layout);
}

/// The global Rust allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct System;

unsafe impl PlatformMemory for System {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return Some(dangling(layout));
        }
        // SAFETY: the layout has a non-zero size.
        NonNull::new(unsafe { alloc::alloc(layout) })
    }

    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return Some(dangling(layout));
        }
        // SAFETY: the layout has a non-zero size.
        NonNull::new(unsafe { alloc::alloc_zeroed(layout) })
    }

    unsafe fn release(&self, block: NonNull<u8>, layout: Layout) {
        // Zero-sized blocks never touched the global allocator.
        if layout.size() != 0 {
            alloc::dealloc(block.as_ptr(), layout);
        }
    }
}

fn dangling(layout: Layout) -> NonNull<u8> {
    // A non-null pointer that is suitably aligned but owns no
    // memory, as `Layout::dangling` does on nightly.
    NonNull::new(layout.align() as *mut u8).unwrap_or(NonNull::dangling())
}

/// A memory manager that never satisfies a request, to exercise
/// the allocation failure path.
#[derive(Debug, Default, Clone, Copy)]
pub struct Failing;

unsafe impl PlatformMemory for Failing {
    fn allocate(&self, _layout: Layout) -> Option<NonNull<u8>> {
        None
    }

    fn allocate_zeroed(&self, _layout: Layout) -> Option<NonNull<u8>> {
        None
    }

    // No block is ever handed out, so there is nothing to give
    // back.
    unsafe fn release(&self, _block: NonNull<u8>, _layout: Layout) {}
}

/// Counters reported by [`Counting`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    /// Bytes currently handed out and not yet released.
    pub live_bytes: usize,
    /// Blocks currently handed out and not yet released.
    pub live_blocks: usize,
    /// Successful requests since creation.
    pub allocations: usize,
    /// Releases since creation.
    pub releases: usize,
    /// Requests the inner memory manager refused.
    pub failures: usize,
}

/// Instrumentation wrapper that keeps track of what goes through
/// another memory manager.
#[derive(Debug, Default)]
pub struct Counting<M = System> {
    inner: M,
    live_bytes: AtomicUsize,
    live_blocks: AtomicUsize,
    allocations: AtomicUsize,
    releases: AtomicUsize,
    failures: AtomicUsize,
}

impl<M: PlatformMemory> Counting<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            live_bytes: AtomicUsize::new(0),
            live_blocks: AtomicUsize::new(0),
            allocations: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    /// Snapshot of the counters. Each counter is read on its own,
    /// so the snapshot is only consistent while no other thread
    /// is allocating.
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            live_bytes: self.live_bytes.load(Ordering::Acquire),
            live_blocks: self.live_blocks.load(Ordering::Acquire),
            allocations: self.allocations.load(Ordering::Acquire),
            releases: self.releases.load(Ordering::Acquire),
            failures: self.failures.load(Ordering::Acquire),
        }
    }

    fn record(&self, block: Option<NonNull<u8>>, layout: Layout) -> Option<NonNull<u8>> {
        match block {
            Some(_) => {
                self.live_bytes.fetch_add(layout.size(), Ordering::AcqRel);
                self.live_blocks.fetch_add(1, Ordering::AcqRel);
                self.allocations.fetch_add(1, Ordering::AcqRel);
            }
            None => {
                self.failures.fetch_add(1, Ordering::AcqRel);
            }
        }
        block
    }
}

unsafe impl<M: PlatformMemory> PlatformMemory for Counting<M> {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        self.record(self.inner.allocate(layout), layout)
    }

    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>> {
        self.record(self.inner.allocate_zeroed(layout), layout)
    }

    unsafe fn release(&self, block: NonNull<u8>, layout: Layout) {
        self.inner.release(block, layout);
        self.live_bytes.fetch_sub(layout.size(), Ordering::AcqRel);
        self.live_blocks.fetch_sub(1, Ordering::AcqRel);
        self.releases.fetch_add(1, Ordering::AcqRel);
    }
}

unsafe impl<M: PlatformMemory + ?Sized> PlatformMemory for &M {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate(layout)
    }

    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate_zeroed(layout)
    }

    unsafe fn release(&self, block: NonNull<u8>, layout: Layout) {
        (**self).release(block, layout)
    }
}
