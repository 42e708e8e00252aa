//! Dataset ingestion: size the buffer, let the host fill it, expose the true length.

use reef_policy::Granularity;

use crate::arena::{Arena, Region};
use crate::error::AllocError;
use crate::host::HostEnvironment;
use crate::memory::LinearMemory;

/// The job input as it sits in the arena.
///
/// `region` spans the rounded-up allocation; only the first `len` bytes were written
/// by the host and only those are ever handed to the job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dataset {
    region: Region,
    len: usize,
}

impl Dataset {
    /// True byte length as reported by the host.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Rounded length that was carved from the arena.
    pub fn allocated_len(&self) -> usize {
        self.region.len()
    }

    pub fn offset(&self) -> usize {
        self.region.offset()
    }

    pub fn bytes<'a, M: LinearMemory>(&self, arena: &'a Arena<M>) -> &'a [u8] {
        arena.bytes(self.region.prefix(self.len))
    }
}

/// Queries the dataset length, allocates a buffer rounded to `granularity` and asks
/// the host to write into it.
///
/// An empty dataset allocates nothing; `dataset_write` is still called with an empty
/// destination so the host sees the same call sequence for every input.
pub fn ingest<H, M>(
    host: &mut H,
    arena: &mut Arena<M>,
    granularity: Granularity,
) -> Result<Dataset, AllocError>
where
    H: HostEnvironment + ?Sized,
    M: LinearMemory,
{
    let len = host.dataset_len();
    let rounded = granularity
        .round_up(len)
        .ok_or(AllocError::AddressOverflow {
            mark: arena.high_water_mark(),
            size: len,
        })?;
    let region = arena.allocate(rounded, granularity.bytes())?;
    let dataset = Dataset { region, len };
    host.dataset_write(arena.bytes_mut(region.prefix(len)));
    Ok(dataset)
}
