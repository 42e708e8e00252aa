use core::fmt;

use reef_contracts::{
    REEF_ERR_INVALID_BASE, REEF_ERR_INVALID_LENGTH, REEF_ERR_OUT_OF_BOUNDS,
    REEF_TRAP_ADDRESS_OVERFLOW, REEF_TRAP_INVALID_ARGUMENT, REEF_TRAP_OUT_OF_MEMORY,
};

/// Invalid input to one of the pure primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveError {
    InvalidBase { base: u32 },
    InvalidLength { len: usize, multiple_of: usize },
    OutOfBounds { requested: usize, available: usize },
}

impl PrimitiveError {
    pub fn code(self) -> u32 {
        match self {
            PrimitiveError::InvalidBase { .. } => REEF_ERR_INVALID_BASE,
            PrimitiveError::InvalidLength { .. } => REEF_ERR_INVALID_LENGTH,
            PrimitiveError::OutOfBounds { .. } => REEF_ERR_OUT_OF_BOUNDS,
        }
    }
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveError::InvalidBase { base } => {
                write!(f, "invalid base {base} (expected 2..=36)")
            }
            PrimitiveError::InvalidLength { len, multiple_of } => {
                write!(f, "invalid length {len} (must be a multiple of {multiple_of})")
            }
            PrimitiveError::OutOfBounds {
                requested,
                available,
            } => write!(
                f,
                "out of bounds: {requested} bytes requested, {available} available"
            ),
        }
    }
}

/// The arena could not satisfy a request. Always fatal to the job run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The request would move the high-water mark past the end of the address space.
    AddressOverflow { mark: usize, size: usize },
    /// The environment refused to grow linear memory.
    OutOfMemory { size: usize, pages: usize },
}

impl AllocError {
    pub fn trap_code(self) -> i32 {
        match self {
            AllocError::AddressOverflow { .. } => REEF_TRAP_ADDRESS_OVERFLOW,
            AllocError::OutOfMemory { .. } => REEF_TRAP_OUT_OF_MEMORY,
        }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::AddressOverflow { mark, size } => write!(
                f,
                "allocation of {size} bytes at {mark:#x} overflows the address space"
            ),
            AllocError::OutOfMemory { size, pages } => write!(
                f,
                "out of memory: allocation of {size} bytes needed {pages} more page(s)"
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeError {
    Alloc(AllocError),
    Primitive(PrimitiveError),
}

impl RuntimeError {
    pub fn trap_code(self) -> i32 {
        match self {
            RuntimeError::Alloc(err) => err.trap_code(),
            RuntimeError::Primitive(_) => REEF_TRAP_INVALID_ARGUMENT,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Alloc(err) => err.fmt(f),
            RuntimeError::Primitive(err) => err.fmt(f),
        }
    }
}

impl From<AllocError> for RuntimeError {
    fn from(err: AllocError) -> Self {
        RuntimeError::Alloc(err)
    }
}

impl From<PrimitiveError> for RuntimeError {
    fn from(err: PrimitiveError) -> Self {
        RuntimeError::Primitive(err)
    }
}
