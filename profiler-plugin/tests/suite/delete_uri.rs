use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;
use pretty_assertions::assert_eq;
use rtenv_packaging::PackageError;
use rtenv_packaging::PackageStore;
use rtenv_profiler_plugin::NoopLogger;
use rtenv_profiler_plugin::ProfilerPlugin;
use rtenv_profiler_plugin::ProfilerSettings;
use rtenv_profiler_plugin::RuntimeEnvPlugin;

fn write_package(dir: &Path, files: &[(&str, usize)]) -> Result<()> {
    for (name, len) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, vec![0u8; *len])?;
    }
    Ok(())
}

#[test]
fn concurrent_deletes_of_distinct_uris_each_report_their_size() -> Result<()> {
    let session = tempfile::tempdir()?;
    let plugin = ProfilerPlugin::new(
        &session.path().join("runtime_resources"),
        ProfilerSettings::default(),
    )?;
    let sizes = [10usize, 200, 3_000, 40];
    for (i, size) in sizes.iter().enumerate() {
        write_package(
            &plugin.resources_dir().join(format!("_ray_pkg_{i}")),
            &[("data.bin", *size), ("nested/more.bin", 1)],
        )?;
    }

    let results: Vec<u64> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..sizes.len())
            .map(|i| {
                let plugin = &plugin;
                scope.spawn(move || {
                    plugin
                        .delete_uri(&format!("gcs://_ray_pkg_{i}.zip"), &NoopLogger)
                        .unwrap_or_default()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_default())
            .collect()
    });

    assert_eq!(results, vec![11, 201, 3_001, 41]);
    for i in 0..sizes.len() {
        assert!(!plugin.resources_dir().join(format!("_ray_pkg_{i}")).exists());
    }
    Ok(())
}

/// Records the order of calls so the test can check that the size is taken
/// before the package is removed.
#[derive(Default)]
struct RecordingStore {
    calls: Mutex<Vec<&'static str>>,
    local_dir: PathBuf,
}

impl PackageStore for RecordingStore {
    fn local_dir(&self, _uri: &str, _base_dir: &Path) -> Result<PathBuf, PackageError> {
        self.calls.lock().expect("calls lock").push("local_dir");
        Ok(self.local_dir.clone())
    }

    fn delete(&self, _uri: &str, _base_dir: &Path) -> Result<bool, PackageError> {
        self.calls.lock().expect("calls lock").push("delete");
        fs::remove_dir_all(&self.local_dir).map_err(|source| PackageError::Io {
            action: "removing",
            path: self.local_dir.clone(),
            source,
        })?;
        Ok(true)
    }
}

#[test]
fn size_is_measured_before_the_store_deletes() -> Result<()> {
    let session = tempfile::tempdir()?;
    let package = session.path().join("elsewhere/pkg");
    write_package(&package, &[("a", 5), ("b", 6)])?;
    let store = Arc::new(RecordingStore {
        local_dir: package.clone(),
        ..RecordingStore::default()
    });
    let plugin = ProfilerPlugin::with_store(
        &session.path().join("runtime_resources"),
        ProfilerSettings::default(),
        store.clone(),
    )?;

    let bytes = plugin.delete_uri("s3://bucket/pkg.zip", &NoopLogger)?;

    assert_eq!(bytes, 11);
    assert_eq!(
        *store.calls.lock().expect("calls lock"),
        vec!["local_dir", "delete"]
    );
    assert!(!package.exists());
    Ok(())
}
