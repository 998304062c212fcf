use std::path::{Path, PathBuf};

use serde::Serialize;
use sysinfo::Disks;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskInfo {
    pub total: u64,
    pub available: u64,
    pub used: u64,
}

impl DiskInfo {
    pub fn usage_percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.used as f32 / self.total as f32 * 100.0
    }
}

/// Free/used space of one fixed volume.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeSpace {
    pub mount_point: PathBuf,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub used_percent: f32,
}

/// Mount points of every non-removable volume, freshly listed.
pub fn fixed_volumes() -> Vec<PathBuf> {
    let disks = Disks::new_with_refreshed_list();
    let mut roots: Vec<PathBuf> = disks
        .iter()
        .filter(|d| !d.is_removable())
        .map(|d| d.mount_point().to_path_buf())
        .collect();
    roots.sort();
    roots.dedup();
    roots
}

#[cfg(unix)]
pub fn get_disk_info(path: &Path) -> Option<DiskInfo> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).ok()?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if ret != 0 {
        return None;
    }
    let stat = unsafe { stat.assume_init() };
    let block_size = stat.f_frsize as u64;
    let total = stat.f_blocks as u64 * block_size;
    let available = stat.f_bavail as u64 * block_size;
    let used = total.saturating_sub(available);
    Some(DiskInfo {
        total,
        available,
        used,
    })
}

#[cfg(not(unix))]
pub fn get_disk_info(path: &Path) -> Option<DiskInfo> {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks.iter().find(|d| d.mount_point() == path)?;
    let total = disk.total_space();
    let available = disk.available_space();
    Some(DiskInfo {
        total,
        available,
        used: total.saturating_sub(available),
    })
}

/// Space on every fixed volume. Volumes that cannot be queried are skipped.
pub fn volume_report() -> Vec<VolumeSpace> {
    fixed_volumes()
        .into_iter()
        .filter_map(|mount_point| {
            let info = get_disk_info(&mount_point)?;
            if info.total == 0 {
                return None;
            }
            Some(VolumeSpace {
                used_percent: info.usage_percent(),
                total_bytes: info.total,
                used_bytes: info.used,
                free_bytes: info.available,
                mount_point,
            })
        })
        .collect()
}
