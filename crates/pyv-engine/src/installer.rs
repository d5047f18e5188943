use async_trait::async_trait;
use flate2::read::GzDecoder;
use log::{debug, info};
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::Archive;
use tokio::process::Command;

use pyv_core::{EngineError, PythonVersion};

/// Platform-specific artifact resolution and installation, selected once
/// at startup. New platforms are additive implementations of this trait.
#[async_trait]
pub trait PlatformInstaller: Send + Sync {
    /// URL of the downloadable artifact for `version` under `mirror`.
    fn artifact_url(&self, mirror: &str, version: &PythonVersion) -> String;

    /// Install the downloaded artifact into `version_dir`.
    async fn install(&self, artifact: &Path, version_dir: &Path) -> Result<(), EngineError>;
}

#[must_use]
pub fn platform_installer() -> Box<dyn PlatformInstaller> {
    if cfg!(windows) {
        Box::new(WindowsMsiInstaller)
    } else {
        Box::new(UnixSourceInstaller)
    }
}

/// Builds from the source tarball: extract, configure with the version
/// directory as prefix, make, make install.
pub struct UnixSourceInstaller;

#[async_trait]
impl PlatformInstaller for UnixSourceInstaller {
    fn artifact_url(&self, mirror: &str, version: &PythonVersion) -> String {
        format!("{mirror}{version}/Python-{version}.tgz")
    }

    async fn install(&self, artifact: &Path, version_dir: &Path) -> Result<(), EngineError> {
        let src_dir = extract_source(artifact, version_dir)?;

        let prefix_flag = format!("--prefix={}", version_dir.display());
        run_build_step("configure", "./configure", &[&prefix_flag], &src_dir).await?;
        run_build_step("make", "make", &[], &src_dir).await?;
        run_build_step("make install", "make", &["install"], &src_dir).await?;

        link_unversioned_aliases(version_dir)?;

        std::fs::remove_dir_all(&src_dir)
            .map_err(|error| EngineError::io("failed to remove build tree", error))?;
        Ok(())
    }
}

/// Resolves the platform installer package. Invoking it is not supported
/// yet; the resolver exists so the artifact cache stays platform-correct.
pub struct WindowsMsiInstaller;

#[async_trait]
impl PlatformInstaller for WindowsMsiInstaller {
    fn artifact_url(&self, mirror: &str, version: &PythonVersion) -> String {
        format!("{mirror}{version}/python-{version}.amd64.msi")
    }

    async fn install(&self, _artifact: &Path, _version_dir: &Path) -> Result<(), EngineError> {
        Err(EngineError::Unsupported {
            operation: "windows installer invocation",
        })
    }
}

/// Unpack the tarball into the version directory and rename its top-level
/// folder (named after the artifact stem) to a fixed `src` subdirectory.
fn extract_source(artifact: &Path, version_dir: &Path) -> Result<PathBuf, EngineError> {
    let file =
        File::open(artifact).map_err(|error| EngineError::io("failed to open artifact", error))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive
        .unpack(version_dir)
        .map_err(|error| EngineError::io("failed to extract artifact", error))?;

    let extracted = version_dir.join(artifact.file_stem().unwrap_or_default());
    let src_dir = version_dir.join("src");
    std::fs::rename(&extracted, &src_dir)
        .map_err(|error| EngineError::io("failed to relocate extracted source", error))?;
    debug!("extracted to {}", src_dir.display());
    Ok(src_dir)
}

async fn run_build_step(
    step: &'static str,
    program: &str,
    args: &[&str],
    dir: &Path,
) -> Result<(), EngineError> {
    info!("running `{step}` in {}", dir.display());
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .map_err(|error| EngineError::io("failed to spawn build step", error))?;

    if output.status.success() {
        return Ok(());
    }

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Err(EngineError::build(step, combined))
}

/// Create `python3`→`python` and `pip3`→`pip` links where the versioned
/// name exists and the unversioned alias does not.
fn link_unversioned_aliases(version_dir: &Path) -> Result<(), EngineError> {
    for (versioned, alias) in [("python3", "python"), ("pip3", "pip")] {
        let source = version_dir.join("bin").join(versioned);
        let target = version_dir.join("bin").join(alias);
        if source.exists() && !target.exists() {
            symlink(&source, &target)?;
            debug!("created alias {} -> {}", target.display(), source.display());
        }
    }
    Ok(())
}

pub(crate) fn symlink(source: &Path, target: &Path) -> Result<(), EngineError> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(source, target)
            .map_err(|error| EngineError::io("failed to create symlink", error))
    }
    #[cfg(not(unix))]
    {
        let _ = (source, target);
        Err(EngineError::Unsupported {
            operation: "symlink creation",
        })
    }
}
