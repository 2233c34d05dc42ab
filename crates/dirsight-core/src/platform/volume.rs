/// Volume statistics — one OS call per query.
///
/// `statvfs(3)` on Unix, `GetDiskFreeSpaceExW` on Windows. Free space is the
/// amount available to the caller (not the superuser reserve), matching what
/// `df` reports as "Avail".
use crate::model::VolumeInfo;
use std::io;
use std::path::Path;

#[cfg(unix)]
#[allow(clippy::unnecessary_cast)]
pub fn volume_stats(path: &Path) -> io::Result<VolumeInfo> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    let stat = unsafe { stat.assume_init() };

    let block_size = stat.f_frsize as u64;
    let total = (stat.f_blocks as u64).saturating_mul(block_size);
    let available = (stat.f_bavail as u64).saturating_mul(block_size);
    Ok(VolumeInfo::new(total, available))
}

#[cfg(windows)]
pub fn volume_stats(path: &Path) -> io::Result<VolumeInfo> {
    use std::os::windows::ffi::OsStrExt;
    use windows::Win32::Storage::FileSystem::GetDiskFreeSpaceExW;

    let wide: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();
    let path_pcwstr = windows::core::PCWSTR(wide.as_ptr());

    let mut free_caller: u64 = 0;
    let mut total: u64 = 0;
    let mut free_total: u64 = 0;
    unsafe {
        GetDiskFreeSpaceExW(
            path_pcwstr,
            Some(&mut free_caller as *mut u64),
            Some(&mut total as *mut u64),
            Some(&mut free_total as *mut u64),
        )
    }
    .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(VolumeInfo::new(total, free_caller))
}
