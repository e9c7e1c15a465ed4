use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;

/// A freshly created, uniquely named session directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirectory {
    path: PathBuf,
}

impl OutputDirectory {
    /// Creates `<root>/<prefix>_<YYYYMMDDhhmmss>` using local time (UTC if the
    /// local offset cannot be determined).
    pub fn create<P: AsRef<Path>>(root: P, prefix: &str) -> std::io::Result<OutputDirectory> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let stamp = now
            .format(format_description!(
                "[year][month][day][hour][minute][second]"
            ))
            .map_err(std::io::Error::other)?;
        Self::create_with_stamp(root, prefix, &stamp)
    }

    /// Same as [`OutputDirectory::create`] with an explicit stamp. An existing
    /// directory of that name gets a `_1`, `_2`, ... suffix instead.
    pub fn create_with_stamp<P: AsRef<Path>>(
        root: P,
        prefix: &str,
        stamp: &str,
    ) -> std::io::Result<OutputDirectory> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let base = format!("{}_{}", prefix, stamp);
        let mut suffix = 0u32;
        loop {
            let name = if suffix == 0 {
                base.clone()
            } else {
                format!("{}_{}", base, suffix)
            };
            let path = root.join(name);
            match std::fs::create_dir(&path) {
                Ok(()) => {
                    log::info!("created output directory {}", path.display());
                    return Ok(OutputDirectory { path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Deletes the directory and everything already written into it.
    pub fn remove(self) -> std::io::Result<()> {
        std::fs::remove_dir_all(&self.path)?;
        log::info!("removed output directory {}", self.path.display());
        Ok(())
    }
}
