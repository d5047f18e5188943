use log::{info, warn};
use std::path::PathBuf;
use tokio::process::Command;

use pyv_core::{Config, EngineError, EXECUTABLE_NAME, LinkKind, PrefixLayout, PythonVersion};

use crate::activate::ActivationEngine;
use crate::installer::{PlatformInstaller, platform_installer};
use crate::inventory::LocalInventory;
use crate::lock::PrefixLock;
use crate::mirror::RemoteIndex;
use crate::pipeline::InstallPipeline;

/// Composes the lifecycle components into the public operations. Owns no
/// long-lived state beyond its collaborators; everything of record lives
/// in the managed prefix.
pub struct Engine {
    layout: PrefixLayout,
    index: RemoteIndex,
    inventory: LocalInventory,
    pipeline: InstallPipeline,
    activation: ActivationEngine,
}

impl Engine {
    /// Build an engine with the installer for the current platform.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(config: Config) -> Result<Self, EngineError> {
        Self::with_installer(config, platform_installer())
    }

    /// Build an engine around a specific installer strategy.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn with_installer(
        config: Config,
        installer: Box<dyn PlatformInstaller>,
    ) -> Result<Self, EngineError> {
        let layout = PrefixLayout::new(&config);
        let client = reqwest::Client::builder()
            .user_agent(concat!("pyv/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| EngineError::network_from("http client construction", error))?;

        Ok(Self {
            index: RemoteIndex::new(client.clone(), config.mirror.clone()),
            inventory: LocalInventory::new(layout.clone()),
            pipeline: InstallPipeline::new(layout.clone(), config.mirror, client, installer),
            activation: ActivationEngine::new(layout.clone()),
            layout,
        })
    }

    /// # Errors
    /// Returns an error when the versions directory cannot be read.
    pub fn list_installed(&self) -> Result<Vec<PythonVersion>, EngineError> {
        self.inventory.list()
    }

    /// # Errors
    /// Returns an error when the versions directory cannot be read.
    pub fn is_installed(&self, version: &PythonVersion) -> Result<bool, EngineError> {
        self.inventory.is_installed(version)
    }

    /// # Errors
    /// Returns an error when the mirror listing cannot be fetched.
    pub async fn list_available(&self) -> Result<Vec<PythonVersion>, EngineError> {
        self.index.fetch().await
    }

    /// # Errors
    /// Returns an error when the mirror listing fails or is empty.
    pub async fn latest(&self) -> Result<PythonVersion, EngineError> {
        self.index.latest().await
    }

    /// # Errors
    /// Returns an error when the mirror listing fails or holds no
    /// pre-cutover version.
    pub async fn stable(&self) -> Result<PythonVersion, EngineError> {
        self.index.stable().await
    }

    /// Install `version`. With `force`, an existing installation is fully
    /// removed (deactivating it if needed) before the pipeline runs.
    ///
    /// # Errors
    /// Returns `AlreadyInstalled` without `force`, or any pipeline
    /// failure.
    pub async fn install(&self, version: &PythonVersion, force: bool) -> Result<(), EngineError> {
        let _lock = PrefixLock::acquire(&self.layout)?;
        self.install_locked(version, force).await
    }

    async fn install_locked(&self, version: &PythonVersion, force: bool) -> Result<(), EngineError> {
        if self.inventory.is_installed(version)? {
            if !force {
                return Err(EngineError::AlreadyInstalled { version: *version });
            }
            self.uninstall_locked(version).await?;
        }
        self.pipeline.run(version).await
    }

    /// # Errors
    /// Returns `NotInstalled` when the version is not on disk.
    pub async fn uninstall(&self, version: &PythonVersion) -> Result<(), EngineError> {
        let _lock = PrefixLock::acquire(&self.layout)?;
        self.uninstall_locked(version).await
    }

    async fn uninstall_locked(&self, version: &PythonVersion) -> Result<(), EngineError> {
        if !self.inventory.is_installed(version)? {
            return Err(EngineError::NotInstalled { version: *version });
        }

        if self.current_version().await.ok().as_ref() == Some(version) {
            warn!("version {version} is active, deactivating");
            self.activation.deactivate()?;
        }

        let version_dir = self.layout.version_dir(version);
        info!("deleting {}", version_dir.display());
        tokio::fs::remove_dir_all(&version_dir)
            .await
            .map_err(|error| EngineError::io("failed to remove version directory", error))?;
        Ok(())
    }

    /// # Errors
    /// Returns `NotInstalled` or a symlink failure.
    pub fn activate(&self, version: &PythonVersion) -> Result<(), EngineError> {
        let _lock = PrefixLock::acquire(&self.layout)?;
        self.activation.activate(version)
    }

    /// # Errors
    /// Returns an error only when an existing link cannot be removed.
    pub fn deactivate(&self) -> Result<(), EngineError> {
        let _lock = PrefixLock::acquire(&self.layout)?;
        self.activation.deactivate()
    }

    /// Clean `raw`, install the version if absent, then activate it.
    ///
    /// # Errors
    /// Returns `MalformedVersion` for unparsable input, or any install or
    /// activation failure.
    pub async fn resolve_and_activate(&self, raw: &str) -> Result<PythonVersion, EngineError> {
        let version: PythonVersion = raw.parse()?;
        let _lock = PrefixLock::acquire(&self.layout)?;

        if !self.inventory.is_installed(&version)? {
            info!("version {version} not installed, installing");
            self.install_locked(&version, false).await?;
        }
        self.activation.activate(&version)?;
        Ok(version)
    }

    /// # Errors
    /// Returns an error when resolution, install, or activation fails.
    pub async fn activate_latest(&self) -> Result<PythonVersion, EngineError> {
        let version = self.index.latest().await?;
        self.install_if_absent_and_activate(version).await
    }

    /// # Errors
    /// Returns an error when resolution, install, or activation fails.
    pub async fn activate_stable(&self) -> Result<PythonVersion, EngineError> {
        let version = self.index.stable().await?;
        self.install_if_absent_and_activate(version).await
    }

    async fn install_if_absent_and_activate(
        &self,
        version: PythonVersion,
    ) -> Result<PythonVersion, EngineError> {
        let _lock = PrefixLock::acquire(&self.layout)?;
        if !self.inventory.is_installed(&version)? {
            self.install_locked(&version, false).await?;
        }
        self.activation.activate(&version)?;
        Ok(version)
    }

    /// Version reported by the `python` on PATH: the active symlink when
    /// the prefix is configured, otherwise whatever the system provides.
    /// There is no separate record of the active version.
    ///
    /// # Errors
    /// Returns `NoInterpreter` when no working `python` can be found, or
    /// `MalformedVersion` when its banner does not clean to a version.
    pub async fn current_version(&self) -> Result<PythonVersion, EngineError> {
        let executable = which::which(EXECUTABLE_NAME).map_err(|_| EngineError::NoInterpreter)?;
        let output = Command::new(&executable)
            .arg("--version")
            .output()
            .await
            .map_err(|_| EngineError::NoInterpreter)?;
        if !output.status.success() {
            return Err(EngineError::NoInterpreter);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let banner = if stdout.trim().is_empty() {
            String::from_utf8_lossy(&output.stderr)
        } else {
            stdout
        };
        Ok(banner.trim().parse()?)
    }

    /// # Errors
    /// Returns `NotInstalled` when the version is not on disk.
    pub fn bin_path(&self, version: &PythonVersion) -> Result<PathBuf, EngineError> {
        if !self.inventory.is_installed(version)? {
            return Err(EngineError::NotInstalled { version: *version });
        }
        Ok(self.layout.version_executable(version))
    }

    /// Run `version`'s interpreter with `-c` and the given arguments,
    /// without activating it. Returns the combined output.
    ///
    /// # Errors
    /// Returns `NotInstalled`, an IO failure, or `CommandFailed` carrying
    /// the combined output when the interpreter exits non-zero.
    pub async fn run_with_version(
        &self,
        version: &PythonVersion,
        args: &[String],
    ) -> Result<String, EngineError> {
        let executable = self.bin_path(version)?;
        info!("cmd: {} -c {}", executable.display(), args.join(" "));
        let output = Command::new(&executable)
            .arg("-c")
            .args(args)
            .output()
            .await
            .map_err(|error| EngineError::io("failed to run interpreter", error))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        if output.status.success() {
            Ok(combined)
        } else {
            Err(EngineError::CommandFailed { output: combined })
        }
    }

    /// Warn when the active bin directory is not on PATH; the symlink
    /// swap is useless until the user's shell can see it.
    pub fn check_path_configuration(&self) {
        let active_bin = self.layout.active_subdir(LinkKind::Bin);
        let on_path = std::env::var_os("PATH")
            .is_some_and(|path| std::env::split_paths(&path).any(|entry| entry == active_bin));
        if !on_path {
            warn!("bin directory `{}` is not on PATH", active_bin.display());
        }
    }
}
