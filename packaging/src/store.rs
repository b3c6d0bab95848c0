use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::uri::UriError;
use crate::uri::get_archive_path_from_uri;
use crate::uri::get_local_dir_from_uri;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error(transparent)]
    Uri(#[from] UriError),
    #[error("io error while {action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PackageError {
    fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Removes the local copy of the package addressed by `uri` under `base_dir`:
/// the unpacked directory and the downloaded archive next to it.
///
/// Returns `true` iff something was removed. A URI that was never
/// materialized, or was already deleted, yields `false`.
pub fn delete_package(uri: &str, base_dir: &Path) -> Result<bool, PackageError> {
    let local_dir = get_local_dir_from_uri(uri, base_dir)?;
    let archive = get_archive_path_from_uri(uri, base_dir)?;

    let mut removed = remove_path(&local_dir)?;
    if archive != local_dir {
        removed |= remove_path(&archive)?;
    }
    Ok(removed)
}

fn remove_path(path: &Path) -> Result<bool, PackageError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(PackageError::io("inspecting", path, err)),
    };

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match removed {
        Ok(()) => Ok(true),
        // Lost a race with another deleter of the same URI.
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(PackageError::io("removing", path, err)),
    }
}

/// Resolves and deletes URI-addressed packages. The plugin only talks to the
/// packaging layer through this trait.
pub trait PackageStore: Send + Sync {
    fn local_dir(&self, uri: &str, base_dir: &Path) -> Result<PathBuf, PackageError>;

    fn delete(&self, uri: &str, base_dir: &Path) -> Result<bool, PackageError>;
}

/// Packages unpacked directly on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPackageStore;

impl PackageStore for LocalPackageStore {
    fn local_dir(&self, uri: &str, base_dir: &Path) -> Result<PathBuf, PackageError> {
        Ok(get_local_dir_from_uri(uri, base_dir)?)
    }

    fn delete(&self, uri: &str, base_dir: &Path) -> Result<bool, PackageError> {
        delete_package(uri, base_dir)
    }
}
