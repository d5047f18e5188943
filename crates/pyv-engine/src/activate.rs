use log::info;
use std::fs;

use pyv_core::{EngineError, LinkKind, PrefixLayout, PythonVersion};

use crate::installer::symlink;
use crate::inventory::LocalInventory;

/// Swaps the stable symlink set in the active directory between installed
/// versions. At most one version is active; activation always starts from
/// a clean slate.
pub struct ActivationEngine {
    layout: PrefixLayout,
    inventory: LocalInventory,
}

impl ActivationEngine {
    #[must_use]
    pub fn new(layout: PrefixLayout) -> Self {
        Self {
            inventory: LocalInventory::new(layout.clone()),
            layout,
        }
    }

    /// Link `version`'s subdirectories into the active directory.
    ///
    /// Subdirectories absent on the source version (older builds without
    /// `include` or `share`) are simply not linked.
    ///
    /// # Errors
    /// Returns `NotInstalled` when the version is not on disk, or an
    /// error when a stale link cannot be removed or a new one created.
    pub fn activate(&self, version: &PythonVersion) -> Result<(), EngineError> {
        if !self.inventory.is_installed(version)? {
            return Err(EngineError::NotInstalled { version: *version });
        }

        self.deactivate()?;

        for kind in LinkKind::ALL {
            let source = self.layout.version_subdir(version, kind);
            if !source.is_dir() {
                continue;
            }
            let target = self.layout.active_subdir(kind);
            symlink(&source, &target)?;
            info!("created link {} -> {}", target.display(), source.display());
        }
        Ok(())
    }

    /// Remove the active link set. A no-op when nothing is active.
    ///
    /// # Errors
    /// Returns an error only when an existing entry cannot be removed.
    pub fn deactivate(&self) -> Result<(), EngineError> {
        for kind in LinkKind::ALL {
            let target = self.layout.active_subdir(kind);
            let Ok(metadata) = fs::symlink_metadata(&target) else {
                continue;
            };
            // A stray real directory at the active path is removed just
            // like a link, so activation never layers on top of one.
            let removal = if metadata.is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };
            removal.map_err(|error| EngineError::io("failed to remove active link", error))?;
            info!("removed {}", target.display());
        }
        Ok(())
    }
}
