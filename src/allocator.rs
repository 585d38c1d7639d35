use std::ptr::{self, NonNull};

use log::{debug, warn};

use crate::buffer::Buffer;
use crate::config::AllocatorConfig;
use crate::diagnostic::{Diagnostic, Stdout};
use crate::error::AllocError;
use crate::memory::{PlatformMemory, System};
use crate::DIAGNOSTIC;

/// Hands out fixed-size buffers from a platform memory manager.
///
/// Each call to [`allocate`](Allocator::allocate) is a single
/// request of the configured size, passed straight through to
/// the memory manager, and emits [`DIAGNOSTIC`] once. The
/// allocator keeps no record of the buffers it has handed out.
#[derive(Debug, Default)]
pub struct Allocator<M = System, D = Stdout> {
    /// Where blocks come from and go back to.
    memory: M,
    /// Receives the message emitted on every allocation.
    diagnostic: D,
    config: AllocatorConfig,
}

impl Allocator {
    /// Allocator over the global Rust allocator that prints its
    /// diagnostic to standard output.
    pub fn new() -> Self {
        Self::from_parts(System, Stdout)
    }
}

impl<M: PlatformMemory, D: Diagnostic> Allocator<M, D> {
    pub fn from_parts(memory: M, diagnostic: D) -> Self {
        Self {
            memory,
            diagnostic,
            config: AllocatorConfig::default(),
        }
    }

    /// Replace the memory manager, keeping everything else.
    pub fn with_memory<N: PlatformMemory>(self, memory: N) -> Allocator<N, D> {
        Allocator {
            memory,
            diagnostic: self.diagnostic,
            config: self.config,
        }
    }

    /// Replace the diagnostic sink, keeping everything else.
    pub fn with_diagnostic<E: Diagnostic>(self, diagnostic: E) -> Allocator<M, E> {
        Allocator {
            memory: self.memory,
            diagnostic,
            config: self.config,
        }
    }

    /// Replace the block shape. The config is only checked when
    /// a block is requested.
    pub fn with_config(self, config: AllocatorConfig) -> Self {
        Self { config, ..self }
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn diagnostic(&self) -> &D {
        &self.diagnostic
    }

    pub fn config(&self) -> AllocatorConfig {
        self.config
    }

    /// Request one buffer.
    ///
    /// The diagnostic is emitted exactly once whether or not the
    /// request succeeds. A refused request is reported as
    /// [`AllocError::OutOfMemory`]; it is neither retried nor
    /// downsized.
    pub fn allocate(&self) -> Result<Buffer<'_, M>, AllocError> {
        let block = self.request(|memory, layout| memory.allocate_zeroed(layout));

        let (ptr, layout) = match block {
            Ok(block) => block,
            Err(error) => {
                warn!("{error}");
                return Err(error);
            }
        };

        debug!("Allocated buffer of {} bytes.", layout.size());
        // SAFETY: the block is fresh from `allocate_zeroed` with
        // this layout, so it is initialized and owned by nobody.
        Ok(unsafe { Buffer::from_raw_parts(ptr, layout, &self.memory) })
    }

    /// Give a buffer back. `None` is accepted and does nothing,
    /// matching what the platform allocator does with null.
    pub fn release(&self, buffer: Option<Buffer<'_, M>>) {
        // Dropping the buffer is what returns its block; this
        // method only exists to make the hand-back explicit.
        drop(buffer);
    }

    /// Request one buffer as a raw pointer, null on failure.
    ///
    /// The contents are uninitialized. The diagnostic is emitted
    /// exactly once, as with [`allocate`](Allocator::allocate).
    pub fn allocate_raw(&self) -> *mut u8 {
        match self.request(|memory, layout| memory.allocate(layout)) {
            Ok((ptr, layout)) => {
                debug!("Allocated raw buffer of {} bytes.", layout.size());
                ptr.as_ptr()
            }
            Err(error) => {
                warn!("{error}");
                ptr::null_mut()
            }
        }
    }

    /// Give back a pointer from [`allocate_raw`](Allocator::allocate_raw)
    /// or [`Buffer::into_raw`]. Null is accepted and does nothing.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must come from an allocator with the same
    /// memory manager and config, and must not have been released
    /// already. It must not be used afterwards.
    pub unsafe fn release_raw(&self, ptr: *mut u8) {
        let Some(block) = NonNull::new(ptr) else {
            return;
        };
        // A config without a valid layout cannot have produced
        // the block in the first place.
        if let Ok(layout) = self.config.layout() {
            self.memory.release(block, layout);
            debug!("Released raw buffer of {} bytes.", layout.size());
        }
    }

    fn request<F>(&self, allocate: F) -> Result<(NonNull<u8>, std::alloc::Layout), AllocError>
    where
        F: FnOnce(&M, std::alloc::Layout) -> Option<NonNull<u8>>,
    {
        // The request goes through first and the message comes
        // right after, before the caller sees the outcome.
        let result = self.config.layout().and_then(|layout| {
            allocate(&self.memory, layout)
                .map(|ptr| (ptr, layout))
                .ok_or(AllocError::OutOfMemory {
                    size: layout.size(),
                    align: layout.align(),
                })
        });
        self.diagnostic.emit(DIAGNOSTIC);
        result
    }
}
