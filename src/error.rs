use thiserror::Error;

/// Errors reported by the buffer allocator.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The platform memory manager could not satisfy the
    /// request. Nothing is retried and no smaller size is
    /// attempted.
    #[error("Failed to allocate {size} bytes (alignment {align}).")]
    OutOfMemory { size: usize, align: usize },
    /// The configured size and alignment do not form a valid
    /// layout (the alignment is not a power of two, or the size
    /// overflows once rounded up to it).
    #[error("Invalid buffer layout: {size} bytes with alignment {align}.")]
    InvalidLayout { size: usize, align: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_memory_message_names_the_size() {
        let error = AllocError::OutOfMemory { size: 12_400, align: 16 };
        assert_eq!(error.to_string(), "Failed to allocate 12400 bytes (alignment 16).");
    }

    #[test]
    fn invalid_layout_message() {
        let error = AllocError::InvalidLayout { size: 8, align: 3 };
        assert!(error.to_string().contains("alignment 3"));
    }
}
