//! Fixed-size buffer allocation.
//!
//! An [`Allocator`] requests blocks of [`BUFFER_SIZE`] bytes from
//! a [`PlatformMemory`] and emits [`DIAGNOSTIC`] through a
//! [`Diagnostic`] sink on every request. Blocks come back as
//! owning [`Buffer`]s that release themselves on drop; the raw
//! pointer pair in [`ffi`] covers callers that manage the
//! lifetime by hand.
//!
//! ```
//! use bufalloc::{Allocator, BUFFER_SIZE, diagnostic::Silent};
//!
//! let allocator = Allocator::new().with_diagnostic(Silent);
//! let mut buffer = allocator.allocate().unwrap();
//! buffer.fill(0xFF);
//! assert_eq!(buffer.len(), BUFFER_SIZE);
//! allocator.release(Some(buffer));
//! ```

pub mod allocator;
pub mod buffer;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod ffi;
pub mod memory;

pub use allocator::Allocator;
pub use buffer::Buffer;
pub use config::AllocatorConfig;
pub use diagnostic::Diagnostic;
pub use error::AllocError;
pub use ffi::{allocate_buffer, free_buffer};
pub use memory::PlatformMemory;

/// Size of every buffer, in bytes.
pub const BUFFER_SIZE: usize = 12_400;

/// Alignment of every buffer. Matches what `malloc` guarantees on
/// 64-bit platforms.
pub const BUFFER_ALIGN: usize = 16;

/// Message emitted on every allocation request.
pub const DIAGNOSTIC: &str = "garbage compiler";
