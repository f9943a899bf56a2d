use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{IoResultExt, PortError, Result};

/// Copies the contents of `src` into `dest`, creating `dest` if needed.
/// The source's `.git` directory is left behind.
pub fn mirror(src: &Path, dest: &Path) -> Result<usize> {
    if !src.is_dir() {
        return Err(PortError::io(
            src,
            std::io::Error::new(std::io::ErrorKind::NotFound, "mirror source is not a directory"),
        ));
    }
    info!("Mirroring {:?} -> {:?}", src, dest);
    fs::create_dir_all(dest).at(dest)?;

    let mut copied = 0;
    let walker = WalkDir::new(src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && e.file_name() == ".git"));

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| PortError::io(entry.path(), std::io::Error::other(e)))?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).at(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
            copied += 1;
        } else {
            debug!("Copying {:?}", relative);
            fs::copy(entry.path(), &target).at(&target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, target: &Path) -> Result<()> {
    let link = fs::read_link(src).at(src)?;
    std::os::unix::fs::symlink(link, target).at(target)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, target: &Path) -> Result<()> {
    fs::copy(src, target).at(target).map(|_| ())
}

/// Deletes a file or directory tree. A missing path is fine.
pub fn remove_all(path: &Path) -> Result<()> {
    let metadata = match path.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Nothing to remove at {:?}", path);
            return Ok(());
        }
        Err(e) => return Err(PortError::io(path, e)),
    };
    info!("Removing {:?}", path);
    if metadata.is_dir() {
        fs::remove_dir_all(path).at(path)
    } else {
        fs::remove_file(path).at(path)
    }
}

pub fn remove_entries(root: &Path, names: &[String]) -> Result<()> {
    for name in names {
        remove_all(&root.join(name))?;
    }
    Ok(())
}
