use std::path::Path;
use walkdir::WalkDir;

/// Returns the total size in bytes of every regular file under `path`.
///
/// Symlinks are not followed, so a package that links into a shared location
/// is only charged for the link itself. A missing `path` has size zero.
/// Entries that disappear or cannot be read mid-walk are skipped.
pub fn get_directory_size_bytes(path: &Path) -> u64 {
    if !path.exists() {
        return 0;
    }

    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

/// Creates `path` and any missing parents. An existing directory is not an
/// error.
pub fn try_to_create_directory(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}
