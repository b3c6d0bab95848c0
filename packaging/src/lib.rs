//! URI addressing for runtime-environment packages that are materialized
//! under a plugin's resources directory.

mod store;
mod uri;

pub use store::LocalPackageStore;
pub use store::PackageError;
pub use store::PackageStore;
pub use store::delete_package;
pub use uri::Protocol;
pub use uri::UriError;
pub use uri::get_archive_path_from_uri;
pub use uri::get_local_dir_from_uri;
pub use uri::parse_uri;
