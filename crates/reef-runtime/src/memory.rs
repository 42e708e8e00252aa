//! Linear memory as seen by the arena.
//!
//! On wasm32 this is the module's own memory 0, grown with `memory.grow`. With the
//! `emulation` feature a `Vec`-backed memory stands in for it so jobs can run
//! outside a wasm instance.

#[cfg(any(test, feature = "emulation"))]
use alloc::vec::Vec;

#[cfg(any(test, feature = "emulation"))]
use reef_contracts::PAGE_SIZE;

pub trait LinearMemory {
    /// First address the arena may hand out.
    fn heap_base(&self) -> usize;

    /// Current size in bytes; always a whole number of pages.
    fn size(&self) -> usize;

    /// Grows the memory by `pages`. Returns the previous size in pages, or `None` if
    /// the environment refused.
    fn grow(&mut self, pages: usize) -> Option<usize>;

    /// View of `len` bytes at `offset`. Empty views still start at `offset`, so
    /// the address handed to the host is the region's own.
    fn bytes(&self, offset: usize, len: usize) -> &[u8];

    fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8];
}

impl<M: LinearMemory + ?Sized> LinearMemory for &mut M {
    fn heap_base(&self) -> usize {
        (**self).heap_base()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn grow(&mut self, pages: usize) -> Option<usize> {
        (**self).grow(pages)
    }

    fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        (**self).bytes(offset, len)
    }

    fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        (**self).bytes_mut(offset, len)
    }
}

#[cfg(target_arch = "wasm32")]
pub use self::wasm::ModuleMemory;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use core::arch::wasm32;

    use reef_contracts::PAGE_SIZE;

    use super::LinearMemory;

    extern "C" {
        // Provided by the linker: end of static data and the shadow stack.
        static __heap_base: u8;
    }

    /// Memory 0 of the running module.
    pub struct ModuleMemory {
        _private: (),
    }

    impl ModuleMemory {
        /// # Safety
        ///
        /// At most one `ModuleMemory` may exist per module instance, and nothing else
        /// may hand out the region between `__heap_base` and the memory size at the
        /// time of the call.
        pub unsafe fn take() -> Self {
            ModuleMemory { _private: () }
        }
    }

    impl LinearMemory for ModuleMemory {
        fn heap_base(&self) -> usize {
            core::ptr::addr_of!(__heap_base) as usize
        }

        fn size(&self) -> usize {
            wasm32::memory_size(0) * PAGE_SIZE
        }

        fn grow(&mut self, pages: usize) -> Option<usize> {
            match wasm32::memory_grow(0, pages) {
                usize::MAX => None,
                prev => Some(prev),
            }
        }

        fn bytes(&self, offset: usize, len: usize) -> &[u8] {
            if offset == 0 && len == 0 {
                return &[];
            }
            debug_assert!(offset + len <= self.size());
            // SAFETY: the arena only asks for ranges inside memory it owns, and
            // `offset` is non-null.
            unsafe { core::slice::from_raw_parts(offset as *const u8, len) }
        }

        fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
            if offset == 0 && len == 0 {
                return &mut [];
            }
            debug_assert!(offset + len <= self.size());
            // SAFETY: as above; `&mut self` rules out a second live view.
            unsafe { core::slice::from_raw_parts_mut(offset as *mut u8, len) }
        }
    }
}

/// Growable `Vec`-backed stand-in for a module's linear memory.
#[cfg(any(test, feature = "emulation"))]
#[derive(Debug, Clone)]
pub struct VecMemory {
    data: Vec<u8>,
    heap_base: usize,
    max_pages: usize,
    grow_calls: usize,
}

#[cfg(any(test, feature = "emulation"))]
impl VecMemory {
    pub const DEFAULT_HEAP_BASE: usize = 1024;
    pub const DEFAULT_MAX_PAGES: usize = 256;

    /// `heap_base` may lie past the initial memory, as it does for modules with
    /// large static data and a small initial memory.
    pub fn new(initial_pages: usize, max_pages: usize, heap_base: usize) -> Self {
        let initial_pages = initial_pages.min(max_pages);
        let data = alloc::vec![0u8; initial_pages * PAGE_SIZE];
        VecMemory {
            data,
            heap_base,
            max_pages,
            grow_calls: 0,
        }
    }

    pub fn pages(&self) -> usize {
        self.data.len() / PAGE_SIZE
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Number of `grow` calls made so far, refused ones included.
    pub fn grow_calls(&self) -> usize {
        self.grow_calls
    }
}

#[cfg(any(test, feature = "emulation"))]
impl Default for VecMemory {
    fn default() -> Self {
        VecMemory::new(1, Self::DEFAULT_MAX_PAGES, Self::DEFAULT_HEAP_BASE)
    }
}

#[cfg(any(test, feature = "emulation"))]
impl LinearMemory for VecMemory {
    fn heap_base(&self) -> usize {
        self.heap_base
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn grow(&mut self, pages: usize) -> Option<usize> {
        self.grow_calls += 1;
        let prev = self.pages();
        let next = prev.checked_add(pages)?;
        if next > self.max_pages {
            return None;
        }
        self.data.resize(next * PAGE_SIZE, 0);
        Some(prev)
    }

    fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.data[offset..offset + len]
    }
}
