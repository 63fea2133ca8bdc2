//! The binary results file: append-only during simulation, random
//! access afterward. Layout is exactly `spec.md` §6's header / object
//! property block / per-period result stream / epilogue, implemented
//! with `byteorder`'s little-endian read/write extension traits.

mod reader;
mod writer;

pub use reader::OutputReader;
pub use writer::{OutputHeader, OutputWriter};

/// Magic number written at both the start and the end of the file.
/// A mismatch between the two is the cheapest possible corruption
/// check and is the first thing `OutputReader::open` verifies.
pub(crate) const MAGIC_NUMBER: i32 = 0x5357_4D4D; // "SWMM" packed into an i32
pub(crate) const ENGINE_VERSION: i32 = 1;
pub(crate) const RECORD_SIZE: i64 = 4;
pub(crate) const DATE_SIZE: i64 = 8;
