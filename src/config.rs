use std::alloc::Layout;

use crate::error::AllocError;
use crate::{BUFFER_ALIGN, BUFFER_SIZE};

/// Shape of the blocks an allocator requests.
///
/// Every allocator built without a config requests
/// [`BUFFER_SIZE`] bytes aligned to [`BUFFER_ALIGN`]; the size is
/// only a parameter here so that it is spelled out in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// Size of every block, in bytes.
    pub size: usize,
    /// Alignment of every block. Must be a power of two.
    pub align: usize,
}

impl AllocatorConfig {
    /// Config for blocks of `size` bytes with the default
    /// alignment.
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn layout(&self) -> Result<Layout, AllocError> {
        Layout::from_size_align(self.size, self.align).map_err(|_| AllocError::InvalidLayout {
            size: self.size,
            align: self.align,
        })
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            size: BUFFER_SIZE,
            align: BUFFER_ALIGN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_fixed_buffer_size() {
        let layout = AllocatorConfig::default().layout().unwrap();
        assert_eq!(layout.size(), 12_400);
        assert_eq!(layout.align(), 16);
    }

    #[test]
    fn with_size_keeps_default_alignment() {
        let config = AllocatorConfig::with_size(64);
        assert_eq!(config.size, 64);
        assert_eq!(config.align, BUFFER_ALIGN);
    }

    #[test]
    fn non_power_of_two_alignment_is_rejected() {
        let config = AllocatorConfig { size: 64, align: 12 };
        assert_eq!(
            config.layout(),
            Err(AllocError::InvalidLayout { size: 64, align: 12 })
        );
    }

    #[test]
    fn overflowing_size_is_rejected() {
        let config = AllocatorConfig { size: usize::MAX, align: 16 };
        assert!(config.layout().is_err());
    }
}
