use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Characters that are not safe in a package directory name and are replaced
/// by `_` when a remote URI is flattened.
const DISALLOWED_NAME_CHARS: &[char] = &['/', ':', '@', '+', ' ', '(', ')'];

const TAR_GZ_SUFFIX: &str = ".tar.gz";

/// Where a package lives before it is materialized under a resources dir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Uploaded to the cluster's internal object store. The URI host is the
    /// package file name.
    Gcs,
    Https,
    S3,
    Gs,
    File,
}

impl Protocol {
    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "gcs" => Some(Self::Gcs),
            "https" => Some(Self::Https),
            "s3" => Some(Self::S3),
            "gs" => Some(Self::Gs),
            "file" => Some(Self::File),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gcs => "gcs",
            Self::Https => "https",
            Self::S3 => "s3",
            Self::Gs => "gs",
            Self::File => "file",
        }
    }

    /// Remote packages have their whole location folded into the local name
    /// so that two buckets with the same file name do not collide.
    pub fn is_remote(self) -> bool {
        !matches!(self, Self::Gcs)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum UriError {
    #[error("invalid package URI {uri:?}: {source}")]
    Malformed {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported protocol {scheme:?} in package URI {uri:?}")]
    UnsupportedProtocol { uri: String, scheme: String },
    #[error("package URI {uri:?} does not name a package")]
    MissingPackageName { uri: String },
}

/// Splits a package URI into its protocol and the file name it is stored
/// under locally.
pub fn parse_uri(uri: &str) -> Result<(Protocol, String), UriError> {
    let parsed = Url::parse(uri).map_err(|source| UriError::Malformed {
        uri: uri.to_string(),
        source,
    })?;
    let protocol =
        Protocol::from_scheme(parsed.scheme()).ok_or_else(|| UriError::UnsupportedProtocol {
            uri: uri.to_string(),
            scheme: parsed.scheme().to_string(),
        })?;

    let netloc = match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    let package_name = if protocol.is_remote() {
        remote_package_name(protocol, &netloc, parsed.path())
    } else {
        netloc
    };

    if package_name.is_empty() {
        return Err(UriError::MissingPackageName {
            uri: uri.to_string(),
        });
    }
    Ok((protocol, package_name))
}

fn remote_package_name(protocol: Protocol, netloc: &str, path: &str) -> String {
    // Wheels must keep their file name, pip parses it.
    if path.ends_with(".whl") {
        return path.rsplit('/').next().unwrap_or_default().to_string();
    }

    let mut name = format!("{protocol}_{netloc}{path}");
    name = name.replace(DISALLOWED_NAME_CHARS, "_");
    // Only the final period belongs to the extension.
    let periods = name.matches('.').count();
    if periods > 1 {
        name = name.replacen('.', "_", periods - 1);
    }
    name
}

/// Returns the directory a package URI is unpacked into under `base_dir`.
///
/// This is the package file name with its archive suffix removed, so
/// `gcs://_ray_pkg_abc.zip` maps to `base_dir/_ray_pkg_abc`.
pub fn get_local_dir_from_uri(uri: &str, base_dir: &Path) -> Result<PathBuf, UriError> {
    let (_, package_name) = parse_uri(uri)?;
    Ok(base_dir.join(strip_archive_suffix(&package_name)))
}

/// Returns where the downloaded archive for `uri` sits under `base_dir`.
pub fn get_archive_path_from_uri(uri: &str, base_dir: &Path) -> Result<PathBuf, UriError> {
    let (_, package_name) = parse_uri(uri)?;
    Ok(base_dir.join(package_name))
}

fn strip_archive_suffix(package_name: &str) -> &str {
    if let Some(stem) = package_name.strip_suffix(TAR_GZ_SUFFIX)
        && !stem.is_empty()
    {
        return stem;
    }
    match package_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => package_name,
    }
}
