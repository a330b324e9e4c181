//! Provider discovery
//!
//! Walks a providers directory, reads the descriptor of every subdirectory
//! that has one, builds a loader for each single provider, and descends into
//! bundles. Resolution is all-or-nothing: the first error aborts the walk.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::descriptor::{Descriptor, ProviderKind};
use super::loader::{new_loader, LoaderHandle, LoaderOptions};
use super::ProviderError;
use crate::config::Config;

/// Discovers providers and builds their loaders
#[derive(Debug, Clone)]
pub struct Resolver {
    options: LoaderOptions,
}

#[derive(Default)]
struct Walk {
    /// Canonical directories already resolved, to survive symlink cycles
    /// and links that share a target
    visited: HashSet<PathBuf>,
    /// Declared provider names seen so far and where
    names: HashMap<String, PathBuf>,
}

fn canonical(dir: &Path) -> Result<PathBuf, ProviderError> {
    fs::canonicalize(dir).map_err(|source| ProviderError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

impl Resolver {
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Builds a resolver from configuration
    ///
    /// Fails if the provider cache TTL does not parse; callers should treat
    /// this as fatal rather than fall back to a default.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        Ok(Self::new(LoaderOptions {
            cache_dir: config.cache_dir()?,
            http_ttl: config.provider_cache_ttl()?,
        }))
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Loaders for every provider under `dir`, bundles flattened
    ///
    /// Subdirectories are visited in name order. Directories without a
    /// descriptor and plain files are skipped.
    pub fn loaders(&self, dir: &Path) -> Result<Vec<LoaderHandle>, ProviderError> {
        let mut state = Walk::default();
        state.visited.insert(canonical(dir)?);
        self.walk(dir, &mut state)
    }

    fn walk(&self, dir: &Path, state: &mut Walk) -> Result<Vec<LoaderHandle>, ProviderError> {
        let mut subdirs = Vec::new();
        let entries = fs::read_dir(dir).map_err(|source| ProviderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| ProviderError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                subdirs.push(path);
            }
        }
        subdirs.sort();

        let mut loaders = Vec::new();
        for subdir in subdirs {
            if !Descriptor::exists_in(&subdir) {
                debug!(dir = %subdir.display(), "no descriptor, skipping");
                continue;
            }

            // Each directory yields at most one loader or one bundle walk,
            // however many links lead to it
            if !state.visited.insert(canonical(&subdir)?) {
                warn!(dir = %subdir.display(), "skipping already visited directory");
                continue;
            }

            let descriptor = Descriptor::read(&subdir)?;
            debug!(dir = %subdir.display(), kind = %descriptor.kind, "found descriptor");
            loaders.extend(self.resolve(&subdir, descriptor, state)?);
        }

        Ok(loaders)
    }

    fn resolve(
        &self,
        dir: &Path,
        descriptor: Descriptor,
        state: &mut Walk,
    ) -> Result<Vec<LoaderHandle>, ProviderError> {
        match descriptor.kind {
            ProviderKind::Single => {
                if let Some(previous) = state
                    .names
                    .insert(descriptor.info.name.clone(), dir.to_path_buf())
                {
                    warn!(
                        provider = %descriptor.info.name,
                        first = %previous.display(),
                        second = %dir.display(),
                        "two providers declare the same name"
                    );
                }
                let loader = new_loader(descriptor.info, dir, &self.options)?;
                Ok(vec![loader])
            }
            ProviderKind::Bundle => self.walk(dir, state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::descriptor::{DESCRIPTOR_FILE, ENTRY_SCRIPT};
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_single(dir: &Path, name: &str) {
        fs::create_dir_all(dir).expect("Should create provider dir");
        fs::write(
            dir.join(DESCRIPTOR_FILE),
            format!("name = \"{}\"\ntype = \"single\"\n", name),
        )
        .expect("Should write descriptor");
        fs::write(dir.join(ENTRY_SCRIPT), "return {}").expect("Should write script");
    }

    fn write_bundle(dir: &Path, name: &str) {
        fs::create_dir_all(dir).expect("Should create bundle dir");
        fs::write(
            dir.join(DESCRIPTOR_FILE),
            format!("name = \"{}\"\ntype = \"bundle\"\n", name),
        )
        .expect("Should write descriptor");
    }

    fn create_test_resolver(temp_dir: &TempDir) -> Resolver {
        Resolver::new(LoaderOptions {
            cache_dir: temp_dir.path().join("cache"),
            http_ttl: Duration::from_secs(3600),
        })
    }

    fn names(loaders: &[LoaderHandle]) -> Vec<&str> {
        loaders.iter().map(|l| l.info().name.as_str()).collect()
    }

    #[test]
    fn test_bundles_are_flattened() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("providers");
        write_single(&root.join("A"), "a");
        write_bundle(&root.join("B"), "b");
        write_single(&root.join("B").join("C"), "c");
        write_single(&root.join("B").join("D"), "d");

        let loaders = create_test_resolver(&temp_dir)
            .loaders(&root)
            .expect("Resolution should succeed");

        assert_eq!(names(&loaders), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_directories_without_descriptor_and_files_are_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("providers");
        write_single(&root.join("real"), "real");
        fs::create_dir_all(root.join("scratch")).expect("Should create dir");
        fs::write(root.join("README.md"), "notes").expect("Should write file");

        let loaders = create_test_resolver(&temp_dir)
            .loaders(&root)
            .expect("Resolution should succeed");

        assert_eq!(names(&loaders), vec!["real"]);
    }

    #[test]
    fn test_empty_directory_yields_no_loaders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("providers");
        fs::create_dir_all(&root).expect("Should create dir");

        let loaders = create_test_resolver(&temp_dir)
            .loaders(&root)
            .expect("Resolution should succeed");

        assert!(loaders.is_empty());
    }

    #[test]
    fn test_unknown_type_aborts_whole_resolution() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("providers");
        write_single(&root.join("a_good"), "good");
        fs::create_dir_all(root.join("b_weird")).expect("Should create dir");
        fs::write(
            root.join("b_weird").join(DESCRIPTOR_FILE),
            "name = \"weird\"\ntype = \"plugin\"\n",
        )
        .expect("Should write descriptor");

        let err = create_test_resolver(&temp_dir)
            .loaders(&root)
            .expect_err("Resolution should fail");

        assert!(matches!(err, ProviderError::UnknownType { .. }));
    }

    #[test]
    fn test_missing_script_inside_bundle_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("providers");
        write_bundle(&root.join("bundle"), "bundle");
        let broken = root.join("bundle").join("broken");
        write_single(&broken, "broken");
        fs::remove_file(broken.join(ENTRY_SCRIPT)).expect("Should remove script");

        let err = create_test_resolver(&temp_dir)
            .loaders(&root)
            .expect_err("Resolution should fail");

        assert!(err.to_string().contains(ENTRY_SCRIPT));
        assert!(matches!(err, ProviderError::MissingScript { ref path } if *path == broken.join(ENTRY_SCRIPT)));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let err = create_test_resolver(&temp_dir)
            .loaders(&temp_dir.path().join("nope"))
            .expect_err("Resolution should fail");

        assert!(matches!(err, ProviderError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("providers");
        write_bundle(&root.join("loop"), "loop");
        write_single(&root.join("loop").join("inner"), "inner");
        std::os::unix::fs::symlink(root.join("loop"), root.join("loop").join("again"))
            .expect("Should create symlink");

        let loaders = create_test_resolver(&temp_dir)
            .loaders(&root)
            .expect("Resolution should succeed");

        assert_eq!(names(&loaders), vec!["inner"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_two_links_to_one_provider_yield_one_loader() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("providers");
        let real = temp_dir.path().join("real");
        fs::create_dir_all(&root).expect("Should create dir");
        write_single(&real, "x");
        std::os::unix::fs::symlink(&real, root.join("a")).expect("Should create symlink");
        std::os::unix::fs::symlink(&real, root.join("b")).expect("Should create symlink");

        let loaders = create_test_resolver(&temp_dir)
            .loaders(&root)
            .expect("Resolution should succeed");

        assert_eq!(names(&loaders), vec!["x"]);
        assert_eq!(loaders[0].dir(), root.join("a"));
    }

    #[cfg(unix)]
    #[test]
    fn test_provider_linked_into_bundle_is_loaded_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("providers");
        write_single(&root.join("a_direct"), "direct");
        write_bundle(&root.join("b_group"), "group");
        std::os::unix::fs::symlink(root.join("a_direct"), root.join("b_group").join("linked"))
            .expect("Should create symlink");

        let loaders = create_test_resolver(&temp_dir)
            .loaders(&root)
            .expect("Resolution should succeed");

        assert_eq!(names(&loaders), vec!["direct"]);
    }

    #[test]
    fn test_from_config_rejects_bad_ttl() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = Config::default();
        config.paths.cache_dir = Some(temp_dir.path().to_path_buf());
        config.providers.cache.ttl = "a while".to_string();

        let err = Resolver::from_config(&config).expect_err("Resolver should not build");

        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn test_from_config_uses_configured_values() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = Config::default();
        config.paths.cache_dir = Some(temp_dir.path().to_path_buf());
        config.providers.cache.ttl = "30m".to_string();

        let resolver = Resolver::from_config(&config).expect("Resolver should build");

        assert_eq!(resolver.options().http_ttl, Duration::from_secs(1800));
        assert_eq!(resolver.options().cache_dir, temp_dir.path());
    }
}
