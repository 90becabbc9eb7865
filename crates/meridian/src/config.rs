//! Indexer configuration.
//!
//! Configuration is optional: a project without `.meridian/config.yaml` gets
//! convention-based defaults. Every field may be omitted from the file.
//!
//! ```yaml
//! exclude_dirs: [target, node_modules, dist]
//! include_hidden: false
//! max_file_size: 2097152
//! batch_size: 256
//! workers: 8
//! cache_capacity: 100000
//! cache_path: .meridian/cache.db
//! ```

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Directory (relative to the project root) holding Meridian's own files.
pub const META_DIR: &str = ".meridian";

/// Name of the optional configuration file inside [`META_DIR`].
pub const CONFIG_FILE: &str = "config.yaml";

/// Default location of the persisted content cache, relative to the root.
pub const DEFAULT_CACHE_FILE: &str = "cache.db";

/// Settings that shape enumeration, batching and caching.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexerConfig {
    /// Directory names skipped anywhere in the tree
    pub exclude_dirs: Vec<String>,
    /// Whether dot-files and dot-directories are indexed
    pub include_hidden: bool,
    /// Files larger than this many bytes are skipped with a diagnostic
    pub max_file_size: u64,
    /// Files merged per batch; cancellation is observed between batches
    pub batch_size: usize,
    /// Analysis worker threads; `None` means one per available core
    pub workers: Option<usize>,
    /// Maximum number of entries in the content cache
    pub cache_capacity: usize,
    /// Where the content cache is persisted; relative paths resolve under the root
    pub cache_path: Option<PathBuf>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: [
                "target",
                "node_modules",
                "vendor",
                "bin",
                "obj",
                "build",
                "dist",
                "__pycache__",
                "coverage",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            include_hidden: false,
            max_file_size: 2 * 1024 * 1024,
            batch_size: 256,
            workers: None,
            cache_capacity: 100_000,
            cache_path: None,
        }
    }
}

impl IndexerConfig {
    /// Load `<root>/.meridian/config.yaml`, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file exists but is malformed or invalid,
    /// and `Error::Io` if it exists but cannot be read.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(META_DIR).join(CONFIG_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the numeric limits are usable.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.workers == Some(0) {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(Error::Config(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of analysis threads to run.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        })
    }

    /// Resolve the cache database location for a project.
    #[must_use]
    pub fn cache_location(&self, root: &Path) -> PathBuf {
        match &self.cache_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join(META_DIR).join(DEFAULT_CACHE_FILE),
        }
    }

    /// Whether a directory name is skipped during enumeration.
    ///
    /// [`META_DIR`] is always skipped.
    #[must_use]
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        name == META_DIR
            || (!self.include_hidden && name.starts_with('.'))
            || self.exclude_dirs.iter().any(|d| d == name)
    }

    /// Whether a project-relative path passes the directory rules.
    ///
    /// Extension filtering is the analyzer registry's job.
    #[must_use]
    pub fn admits(&self, relative: &Path) -> bool {
        let components: Vec<_> = relative.components().collect();
        let Some((file, dirs)) = components.split_last() else {
            return false;
        };
        let hidden_file = file
            .as_os_str()
            .to_str()
            .is_some_and(|n| n.starts_with('.'));
        if hidden_file && !self.include_hidden {
            return false;
        }
        dirs.iter().all(|c| match c {
            Component::Normal(name) => name.to_str().is_none_or(|n| !self.is_excluded_dir(n)),
            _ => false,
        })
    }
}
