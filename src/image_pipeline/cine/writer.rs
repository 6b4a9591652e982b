//! In-place header rewriting.
//!
//! Only the container header, bitmap header and setup record are written;
//! the offset table, tagged blocks and frame data are never touched.

use std::fs::{File, OpenOptions, Permissions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, instrument, warn};

use crate::image_pipeline::cine::header::{BitmapInfo, ContainerHeader};
use crate::image_pipeline::cine::parser::read_header;
use crate::image_pipeline::cine::setup::Setup;
use crate::image_pipeline::cine::types::Header;
use crate::image_pipeline::common::error::Result;

/// Rewrites the header structures of `path` from `header`.
///
/// With `backup`, the unedited structures are first saved to a sibling file.
/// The file length never changes.
#[instrument(skip(header), fields(path = %path.as_ref().display()))]
pub fn write_header<P: AsRef<Path>>(path: P, header: &Header, backup: bool) -> Result<()> {
    let path = path.as_ref();
    if backup {
        backup_header(path)?;
    }

    let guard = WritableGuard::acquire(path)?;
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    write_structures(&mut file, &header.container, &header.bitmap, &header.setup)?;
    file.flush()?;
    drop(file);
    guard.restore();

    info!("header written");
    Ok(())
}

/// Saves the header structures currently on disk to
/// `<path>_metadata_backup_<YYYYMMDD_HHMMSS>`, at their real offsets.
pub fn backup_header<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let current = read_header(path)?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut name = path.as_os_str().to_owned();
    name.push(format!("_metadata_backup_{stamp}"));
    let backup_path = PathBuf::from(name);

    let mut file = OpenOptions::new().write(true).create_new(true).open(&backup_path)?;
    write_structures(&mut file, &current.container, &current.bitmap, &current.setup)?;
    file.flush()?;

    info!(backup = %backup_path.display(), "header backup written");
    Ok(backup_path)
}

fn write_structures(
    file: &mut File,
    container: &ContainerHeader,
    bitmap: &BitmapInfo,
    setup: &Setup,
) -> Result<()> {
    let mut fixed = Vec::with_capacity(ContainerHeader::SIZE + BitmapInfo::SIZE);
    container.write_to(&mut fixed)?;
    bitmap.write_to(&mut fixed)?;

    file.seek(SeekFrom::Start(0))?;
    file.write_all(&fixed)?;
    file.seek(SeekFrom::Start(container.off_setup as u64))?;
    file.write_all(setup.as_bytes())?;
    Ok(())
}

/// Makes a file owner-writable for the guard's lifetime and restores the
/// original permissions when dropped.
struct WritableGuard {
    path: PathBuf,
    original: Option<Permissions>,
}

impl WritableGuard {
    fn acquire(path: &Path) -> Result<Self> {
        let original = std::fs::metadata(path)?.permissions();
        if !original.readonly() {
            return Ok(Self { path: path.to_path_buf(), original: None });
        }
        std::fs::set_permissions(path, writable(&original))?;
        Ok(Self { path: path.to_path_buf(), original: Some(original) })
    }

    fn restore(mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(e) = std::fs::set_permissions(&self.path, original) {
                warn!(path = %self.path.display(), error = %e, "could not restore file permissions");
            }
        }
    }
}

impl Drop for WritableGuard {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(unix)]
fn writable(original: &Permissions) -> Permissions {
    use std::os::unix::fs::PermissionsExt;
    Permissions::from_mode(original.mode() | 0o600)
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn writable(original: &Permissions) -> Permissions {
    let mut perms = original.clone();
    perms.set_readonly(false);
    perms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::cine::tone::ToneCurve;
    use crate::image_pipeline::testing::SyntheticCine;

    fn clip(dir: &Path) -> PathBuf {
        let frames: Vec<Vec<u16>> = (0..2).map(|i| vec![i * 7; 16]).collect();
        SyntheticCine::gray16(4, 4, &frames).write_to(dir, "clip.cine")
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = clip(dir.path());
        let before = std::fs::read(&path).unwrap();

        let header = read_header(&path).unwrap();
        write_header(&path, &header, false).unwrap();

        let after = std::fs::read(&path).unwrap();
        assert_eq!(before, after);
        assert_eq!(read_header(&path).unwrap(), header);
    }

    #[test]
    fn test_edit_touches_only_setup() {
        let dir = tempfile::tempdir().unwrap();
        let path = clip(dir.path());
        let before = std::fs::read(&path).unwrap();

        let mut header = read_header(&path).unwrap();
        header.setup.set_tone_curve(&ToneCurve::parse("EDIT 0 0 1 0.8").unwrap()).unwrap();
        write_header(&path, &header, false).unwrap();

        let after = std::fs::read(&path).unwrap();
        assert_eq!(before.len(), after.len());
        let table = header.container.off_image_offsets as usize;
        assert_eq!(before[table..], after[table..]);
        assert_eq!(read_header(&path).unwrap().setup.tone_label(), "EDIT");
    }

    #[test]
    fn test_backup_holds_unedited_structures() {
        let dir = tempfile::tempdir().unwrap();
        let path = clip(dir.path());
        let original = read_header(&path).unwrap();

        let mut edited = original.clone();
        edited.setup.set_wb_temp(3000.0).unwrap();
        write_header(&path, &edited, true).unwrap();

        let backups: Vec<PathBuf> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().contains("_metadata_backup_"))
            .collect();
        assert_eq!(backups.len(), 1);

        let bytes = std::fs::read(&backups[0]).unwrap();
        let setup_start = original.container.off_setup as usize;
        assert_eq!(bytes.len(), setup_start + original.setup.as_bytes().len());
        assert_eq!(&bytes[setup_start..], original.setup.as_bytes());
        assert_eq!(read_header(&path).unwrap().setup.wb_temp(), 3000.0);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_file_is_restored() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = clip(dir.path());
        std::fs::set_permissions(&path, Permissions::from_mode(0o444)).unwrap();

        let header = read_header(&path).unwrap();
        write_header(&path, &header, false).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o444);
    }
}
