//! Cache directories for rotated output files.
//!
//! Output files live in one of two cache roots and always carry a fixed
//! name prefix. The prefix is the only thing the sweep relies on to find
//! them again, so unrelated files in the same directories are never touched.

mod space;
mod sweep;
mod temp_file;

pub use space::{DiskSpaceProbe, SpaceProbe};
pub use sweep::{sweep_directories, SweepReport};
pub use temp_file::{create_temp_file, CacheDirectories, StorageError};
