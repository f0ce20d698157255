//! Free-space queries for cache roots.

use std::path::Path;

use sysinfo::Disks;

/// Reports how many bytes are available to the filesystem holding a path.
pub trait SpaceProbe: Send + Sync {
    /// Available bytes, or `None` if the filesystem cannot be determined.
    fn available_space(&self, path: &Path) -> Option<u64>;
}

/// Looks up the mounted disk whose mount point is the longest prefix of the path.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskSpaceProbe;

impl SpaceProbe for DiskSpaceProbe {
    fn available_space(&self, path: &Path) -> Option<u64> {
        let path = path.canonicalize().ok()?;
        let disks = Disks::new_with_refreshed_list();

        disks
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(|disk| disk.available_space())
    }
}
