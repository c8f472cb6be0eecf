//! Durable artifact writes.
//!
//! Output is staged in a temporary file next to the target, flushed and
//! synced, checked, and only then renamed over the target path. A failed
//! write drops the staged file, so nothing is left at the target.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// A temporary file that becomes the artifact on [`commit`](Self::commit).
pub(crate) struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
    dir: PathBuf,
}

impl StagedFile {
    /// Stage a write for `target`, creating its directory if needed.
    pub(crate) fn create(target: &Path) -> Result<Self> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .map_err(|e| Error::encoding(&format!("cannot create {}", dir.display()), e))?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(".unscan-").suffix(".part");
        // Same mode as a plain create: 0666 filtered by the process umask.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let temp = builder
            .tempfile_in(&dir)
            .map_err(|e| Error::encoding(&format!("cannot stage {}", target.display()), e))?;

        Ok(Self {
            temp,
            target: target.to_path_buf(),
            dir,
        })
    }

    pub(crate) fn file(&mut self) -> &mut File {
        self.temp.as_file_mut()
    }

    /// Discard anything written so far.
    pub(crate) fn truncate(&mut self) -> Result<()> {
        let file = self.temp.as_file_mut();
        file.set_len(0)
            .and_then(|_| file.seek(SeekFrom::Start(0)).map(|_| ()))
            .map_err(|e| Error::encoding("cannot reset staged file", e))
    }

    /// Flush, force to stable storage, and return the on-disk size.
    pub(crate) fn sync(&mut self) -> Result<u64> {
        let file = self.temp.as_file_mut();
        file.flush()
            .and_then(|_| file.sync_all())
            .map_err(|e| Error::encoding("cannot sync staged file", e))?;
        let len = fs::metadata(self.temp.path())
            .map_err(|e| Error::encoding("cannot stat staged file", e))?
            .len();
        Ok(len)
    }

    /// Move the staged file onto the target path.
    ///
    /// An existing target keeps its permissions. On unix the directory is
    /// synced after the rename.
    pub(crate) fn commit(self) -> Result<PathBuf> {
        let Self { temp, target, dir } = self;

        if let Ok(existing) = fs::metadata(&target) {
            fs::set_permissions(temp.path(), existing.permissions())
                .map_err(|e| Error::encoding(&format!("cannot stage {}", target.display()), e))?;
        }

        temp.persist(&target)
            .map_err(|e| Error::encoding(&format!("cannot persist {}", target.display()), e.error))?;

        sync_dir(&dir)?;
        Ok(target)
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| Error::encoding(&format!("cannot sync {}", dir.display()), e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

/// Write `bytes` to `target` durably and return the verified size.
pub(crate) fn write_artifact(target: &Path, bytes: &[u8]) -> Result<u64> {
    let mut staged = StagedFile::create(target)?;
    staged
        .file()
        .write_all(bytes)
        .map_err(|e| Error::encoding(&format!("cannot write {}", target.display()), e))?;

    let size = staged.sync()?;
    if size != bytes.len() as u64 {
        return Err(Error::EncodingFailure(format!(
            "{}: wrote {} bytes but {} are on disk",
            target.display(),
            bytes.len(),
            size
        )));
    }

    staged.commit()?;
    Ok(size)
}
