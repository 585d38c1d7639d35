//! Plain allocate/free entry points over a process-wide
//! allocator, for callers that link against this crate rather
//! than own an [`Allocator`].

use std::ffi::c_void;

use lazy_static::lazy_static;

use crate::allocator::Allocator;

lazy_static! {
    // The global Rust allocator with the diagnostic on standard
    // output. It holds no state of its own, so sharing one
    // instance between threads is the same as each having one.
    static ref DEFAULT_ALLOCATOR: Allocator = Allocator::new();
}

/// Allocate one buffer of [`BUFFER_SIZE`](crate::BUFFER_SIZE)
/// bytes and print the diagnostic. Returns null on failure.
///
/// The contents are uninitialized.
pub fn allocate_buffer() -> *mut u8 {
    DEFAULT_ALLOCATOR.allocate_raw()
}

/// Free a buffer from [`allocate_buffer`]. Null is ignored.
///
/// # Safety
///
/// A non-null `ptr` must come from [`allocate_buffer`] and must
/// not have been freed already.
pub unsafe fn free_buffer(ptr: *mut u8) {
    DEFAULT_ALLOCATOR.release_raw(ptr)
}

#[no_mangle]
pub extern "C" fn bufalloc_allocate() -> *mut c_void {
    allocate_buffer().cast()
}

/// # Safety
///
/// See [`free_buffer`].
#[no_mangle]
pub unsafe extern "C" fn bufalloc_free(ptr: *mut c_void) {
    free_buffer(ptr.cast())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BUFFER_SIZE;

    #[test]
    fn allocate_and_free_through_the_default_allocator() {
        let ptr = allocate_buffer();
        assert!(!ptr.is_null());
        unsafe {
            // Touch both ends of the block.
            ptr.write(1);
            ptr.add(BUFFER_SIZE - 1).write(2);
            free_buffer(ptr);
        }
    }

    #[test]
    fn free_null_is_ignored() {
        unsafe {
            free_buffer(std::ptr::null_mut());
            bufalloc_free(std::ptr::null_mut());
        }
    }

    #[test]
    fn c_entry_points_have_c_signatures() {
        let allocate: unsafe extern "C" fn() -> *mut c_void = bufalloc_allocate;
        let free: unsafe extern "C" fn(*mut c_void) = bufalloc_free;
        unsafe {
            let ptr = allocate();
            assert!(!ptr.is_null());
            free(ptr);
        }
    }

    #[test]
    fn c_entry_points_pair_up() {
        let ptr = bufalloc_allocate();
        assert!(!ptr.is_null());
        unsafe { bufalloc_free(ptr) };
    }
}
