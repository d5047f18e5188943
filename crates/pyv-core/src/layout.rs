use std::path::{Path, PathBuf};

use crate::config::{Config, EXECUTABLE_NAME};
use crate::version::PythonVersion;

/// Path after the prefix where versions are stored.
const VERSIONS_PATH: &str = "p/versions/python";
/// Path after the prefix where the active version links live.
const ACTIVE_PATH: &str = "p/versions";
/// Scratch directory for downloaded artifacts, inside the versions dir so
/// the inventory scan learns to skip it.
const CACHE_DIR_NAME: &str = "temp";
const LOCK_FILE_NAME: &str = ".pyv.lock";

/// The managed subdirectory kinds linked into the active directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Bin,
    Lib,
    Include,
    Share,
}

impl LinkKind {
    pub const ALL: [LinkKind; 4] = [
        LinkKind::Bin,
        LinkKind::Lib,
        LinkKind::Include,
        LinkKind::Share,
    ];

    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            LinkKind::Bin => "bin",
            LinkKind::Lib => "lib",
            LinkKind::Include => "include",
            LinkKind::Share => "share",
        }
    }
}

/// Derived filesystem layout under the managed prefix. The paths may or
/// may not exist; they are always absolute when the prefix is.
#[derive(Debug, Clone)]
pub struct PrefixLayout {
    versions_dir: PathBuf,
    active_dir: PathBuf,
}

impl PrefixLayout {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            versions_dir: config.prefix.join(VERSIONS_PATH),
            active_dir: config.prefix.join(ACTIVE_PATH),
        }
    }

    #[must_use]
    pub fn versions_dir(&self) -> &Path {
        &self.versions_dir
    }

    #[must_use]
    pub fn active_dir(&self) -> &Path {
        &self.active_dir
    }

    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.versions_dir.join(CACHE_DIR_NAME)
    }

    #[must_use]
    pub fn lock_file(&self) -> PathBuf {
        self.versions_dir.join(LOCK_FILE_NAME)
    }

    #[must_use]
    pub fn version_dir(&self, version: &PythonVersion) -> PathBuf {
        self.versions_dir.join(version.to_string())
    }

    #[must_use]
    pub fn version_subdir(&self, version: &PythonVersion, kind: LinkKind) -> PathBuf {
        self.version_dir(version).join(kind.dir_name())
    }

    #[must_use]
    pub fn version_executable(&self, version: &PythonVersion) -> PathBuf {
        self.version_subdir(version, LinkKind::Bin)
            .join(EXECUTABLE_NAME)
    }

    #[must_use]
    pub fn active_subdir(&self, kind: LinkKind) -> PathBuf {
        self.active_dir.join(kind.dir_name())
    }

    #[must_use]
    pub fn active_executable(&self) -> PathBuf {
        self.active_subdir(LinkKind::Bin).join(EXECUTABLE_NAME)
    }

    /// Ensure the versions and cache directories exist.
    ///
    /// # Errors
    /// Returns an error if a directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.versions_dir)?;
        std::fs::create_dir_all(self.cache_dir())?;
        Ok(())
    }
}
