//! Bump allocator over linear memory.
//!
//! The arena owns everything from the memory's heap base up to its size at
//! construction, plus every page it grows afterwards. It never frees: the
//! high-water mark only moves forward, and it lives as long as the module instance.

use reef_contracts::PAGE_SIZE;

use crate::error::AllocError;
use crate::memory::LinearMemory;

/// A span of arena memory. Only the arena that produced it can resolve it to bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    offset: usize,
    len: usize,
}

impl Region {
    pub fn offset(self) -> usize {
        self.offset
    }

    pub fn len(self) -> usize {
        self.len
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    pub fn end(self) -> usize {
        self.offset + self.len
    }

    /// The first `len` bytes of the region.
    pub(crate) fn prefix(self, len: usize) -> Region {
        debug_assert!(len <= self.len);
        Region {
            offset: self.offset,
            len: len.min(self.len),
        }
    }
}

pub struct Arena<M> {
    memory: M,
    mark: usize,
    limit: usize,
}

impl<M: LinearMemory> Arena<M> {
    /// The heap base may lie past the current memory size; the first allocation
    /// then grows memory up to it.
    pub fn new(memory: M) -> Self {
        let mark = memory.heap_base();
        let limit = memory.size();
        Arena {
            memory,
            mark,
            limit,
        }
    }

    /// Address the next allocation starts from (before alignment).
    pub fn high_water_mark(&self) -> usize {
        self.mark
    }

    /// Bytes that can be handed out without growing memory.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.mark)
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn into_memory(self) -> M {
        self.memory
    }

    /// Carves `size` bytes aligned to `align` (a power of two) off the top of the
    /// arena, growing memory by whole pages when the current size is not enough.
    ///
    /// Zero-size requests return an empty region at the mark and never touch memory.
    pub fn allocate(&mut self, size: usize, align: usize) -> Result<Region, AllocError> {
        debug_assert!(align.is_power_of_two());
        if size == 0 {
            return Ok(Region {
                offset: self.mark,
                len: 0,
            });
        }

        let overflow = AllocError::AddressOverflow {
            mark: self.mark,
            size,
        };
        loop {
            let start = align_up(self.mark, align).ok_or(overflow)?;
            let end = start.checked_add(size).ok_or(overflow)?;
            if end <= self.limit {
                self.mark = end;
                return Ok(Region { offset: start, len: size });
            }

            let pages = (end - self.limit).div_ceil(PAGE_SIZE);
            let prev_pages = self
                .memory
                .grow(pages)
                .ok_or(AllocError::OutOfMemory { size, pages })?;
            let granted_start = prev_pages.checked_mul(PAGE_SIZE).ok_or(overflow)?;
            let granted_end = pages
                .checked_mul(PAGE_SIZE)
                .and_then(|n| granted_start.checked_add(n))
                .ok_or(overflow)?;

            if granted_start > self.limit {
                // Someone else in the module grew memory since our last growth. The
                // pages in between are theirs; continue from the fresh grant.
                self.mark = self.mark.max(granted_start);
            }
            // The grant ends at the new memory size, whatever the old limit was.
            self.limit = granted_end;
        }
    }

    pub fn bytes(&self, region: Region) -> &[u8] {
        self.memory.bytes(region.offset, region.len)
    }

    pub fn bytes_mut(&mut self, region: Region) -> &mut [u8] {
        self.memory.bytes_mut(region.offset, region.len)
    }
}

fn align_up(addr: usize, align: usize) -> Option<usize> {
    let mask = align - 1;
    Some(addr.checked_add(mask)? & !mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::VecMemory;

    #[test]
    fn allocations_are_monotonic_and_disjoint() {
        let mut arena = Arena::new(VecMemory::default());
        let sizes = [0usize, 1, 7, 8, 100, 0, 4096, 3];
        let mut prev: Option<Region> = None;
        for &size in &sizes {
            let mark_before = arena.high_water_mark();
            let r = arena.allocate(size, 8).unwrap();
            assert_eq!(r.len(), size);
            assert!(r.offset() >= mark_before);
            assert!(arena.high_water_mark() >= mark_before);
            if let Some(p) = prev {
                assert!(r.offset() >= p.offset() + p.len());
            }
            prev = Some(r);
        }
    }

    #[test]
    fn allocation_respects_alignment() {
        let mut arena = Arena::new(VecMemory::new(1, 8, 3));
        let r = arena.allocate(5, 8).unwrap();
        assert_eq!(r.offset(), 8);
        let p = arena.allocate(1, PAGE_SIZE).unwrap();
        assert_eq!(p.offset() % PAGE_SIZE, 0);
    }

    #[test]
    fn zero_size_does_not_grow() {
        let mut arena = Arena::new(VecMemory::new(1, 1, 0));
        let r = arena.allocate(0, PAGE_SIZE).unwrap();
        assert!(r.is_empty());
        assert_eq!(arena.memory().grow_calls(), 0);
    }

    #[test]
    fn grows_by_whole_pages_when_exhausted() {
        let mut arena = Arena::new(VecMemory::new(1, 4, 1024));
        let r = arena.allocate(PAGE_SIZE + 10, 8).unwrap();
        assert_eq!(r.offset(), 1024);
        assert_eq!(arena.memory().pages(), 2);
        assert_eq!(arena.memory().grow_calls(), 1);
        assert_eq!(arena.bytes(r).len(), PAGE_SIZE + 10);
    }

    #[test]
    fn refused_growth_is_out_of_memory() {
        let mut arena = Arena::new(VecMemory::new(1, 2, 0));
        let err = arena.allocate(3 * PAGE_SIZE, 8).unwrap_err();
        assert_eq!(
            err,
            AllocError::OutOfMemory {
                size: 3 * PAGE_SIZE,
                pages: 2
            }
        );
        // The mark is untouched by a failed request.
        assert_eq!(arena.high_water_mark(), 0);
    }

    #[test]
    fn address_space_overflow_fails_fast() {
        let mut arena = Arena::new(VecMemory::new(1, 2, 16));
        let err = arena.allocate(usize::MAX - 8, 8).unwrap_err();
        assert!(matches!(err, AllocError::AddressOverflow { .. }));
        assert_eq!(arena.memory().grow_calls(), 0);
    }

    #[test]
    fn skips_pages_grown_by_someone_else() {
        let mut memory = VecMemory::new(1, 8, 0);
        let mut arena = Arena::new(&mut memory);
        arena.allocate(PAGE_SIZE - 16, 8).unwrap();

        // Another allocator in the module takes page 1.
        arena.memory.grow(1).unwrap();

        let r = arena.allocate(64, 8).unwrap();
        assert_eq!(r.offset(), 2 * PAGE_SIZE);
        assert!(arena.high_water_mark() >= 2 * PAGE_SIZE + 64);
    }

    #[test]
    fn heap_base_past_memory_end_grows_up_to_it() {
        let mut arena = Arena::new(VecMemory::new(1, 4, PAGE_SIZE + 100));
        assert_eq!(arena.remaining(), 0);
        let r = arena.allocate(10, 8).unwrap();
        assert_eq!(r.offset(), PAGE_SIZE + 104);
        assert_eq!(arena.memory().pages(), 2);
        assert_eq!(arena.remaining(), 2 * PAGE_SIZE - (PAGE_SIZE + 114));

        let big = arena.allocate(PAGE_SIZE, 8).unwrap();
        assert_eq!(big.offset(), PAGE_SIZE + 120);
        assert_eq!(arena.memory().pages(), 3);
        assert_eq!(arena.bytes(big).len(), PAGE_SIZE);
    }

    #[test]
    fn bytes_round_trip_through_region() {
        let mut arena = Arena::new(VecMemory::default());
        let r = arena.allocate(4, 4).unwrap();
        arena.bytes_mut(r).copy_from_slice(b"reef");
        assert_eq!(arena.bytes(r), b"reef");
    }
}
