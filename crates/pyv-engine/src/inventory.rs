use log::debug;
use std::fs;

use pyv_core::{EngineError, EXECUTABLE_NAME, PrefixLayout, PythonVersion};

/// Enumerates installed versions by scanning the managed versions
/// directory. The filesystem is the source of truth; nothing is cached
/// across calls.
#[derive(Debug, Clone)]
pub struct LocalInventory {
    layout: PrefixLayout,
}

impl LocalInventory {
    #[must_use]
    pub fn new(layout: PrefixLayout) -> Self {
        Self { layout }
    }

    /// List installed versions, ascending.
    ///
    /// A subdirectory counts as installed only if its name cleans to a
    /// version identifier and it contains `bin/python`. Anything else
    /// (the download cache, stray build leftovers) is skipped.
    ///
    /// # Errors
    /// Returns an error if the versions directory exists but cannot be
    /// read.
    pub fn list(&self) -> Result<Vec<PythonVersion>, EngineError> {
        let versions_dir = self.layout.versions_dir();
        if !versions_dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(versions_dir)
            .map_err(|error| EngineError::io("failed to read versions directory", error))?;

        let mut installed = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|error| EngineError::io("failed to read versions directory", error))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let name = entry.file_name();
            let Ok(version) = name.to_string_lossy().parse::<PythonVersion>() else {
                debug!("skipping non-version directory {}", path.display());
                continue;
            };
            if !path.join("bin").join(EXECUTABLE_NAME).is_file() {
                debug!("skipping {} (no managed executable)", path.display());
                continue;
            }

            installed.push(version);
        }

        installed.sort_unstable();
        installed.dedup();
        Ok(installed)
    }

    /// # Errors
    /// Returns an error if the versions directory cannot be read.
    pub fn is_installed(&self, version: &PythonVersion) -> Result<bool, EngineError> {
        Ok(self.list()?.contains(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyv_core::Config;
    use std::path::Path;

    fn seed_version(versions_dir: &Path, name: &str, with_executable: bool) {
        let dir = versions_dir.join(name);
        if with_executable {
            fs::create_dir_all(dir.join("bin")).unwrap();
            fs::write(dir.join("bin").join(EXECUTABLE_NAME), b"").unwrap();
        } else {
            fs::create_dir_all(dir).unwrap();
        }
    }

    fn inventory_in(temp: &tempfile::TempDir) -> LocalInventory {
        LocalInventory::new(PrefixLayout::new(&Config {
            prefix: temp.path().to_path_buf(),
            mirror: String::new(),
        }))
    }

    #[test]
    fn missing_versions_directory_yields_empty_list() {
        let temp = tempfile::tempdir().unwrap();
        assert!(inventory_in(&temp).list().unwrap().is_empty());
    }

    #[test]
    fn lists_only_qualifying_directories_ascending() {
        let temp = tempfile::tempdir().unwrap();
        let inventory = inventory_in(&temp);
        let versions_dir = temp.path().join("p/versions/python");

        seed_version(&versions_dir, "3.6.8", true);
        seed_version(&versions_dir, "2.7.16", true);
        seed_version(&versions_dir, "temp", true);
        seed_version(&versions_dir, "3.x", true);
        seed_version(&versions_dir, "3.5.0", false);
        fs::write(versions_dir.join("notes.txt"), b"").unwrap();

        let installed = inventory.list().unwrap();
        assert_eq!(
            installed,
            [PythonVersion::new(2, 7, 16), PythonVersion::new(3, 6, 8)]
        );
    }

    #[test]
    fn is_installed_reflects_fresh_scan() {
        let temp = tempfile::tempdir().unwrap();
        let inventory = inventory_in(&temp);
        let versions_dir = temp.path().join("p/versions/python");
        let version = PythonVersion::new(3, 6, 8);

        assert!(!inventory.is_installed(&version).unwrap());
        seed_version(&versions_dir, "3.6.8", true);
        assert!(inventory.is_installed(&version).unwrap());
    }
}
