use futures_util::StreamExt;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use pyv_core::{EngineError, PrefixLayout, PythonVersion};

use crate::installer::PlatformInstaller;

/// Drives a single install: fetch the artifact (reusing the cache),
/// hand it to the platform installer, verify the result, and clean up.
///
/// Failures after the version directory was created remove it again, so
/// the inventory never discovers a partially-installed version.
pub struct InstallPipeline {
    layout: PrefixLayout,
    mirror: String,
    client: reqwest::Client,
    installer: Box<dyn PlatformInstaller>,
}

impl InstallPipeline {
    #[must_use]
    pub fn new(
        layout: PrefixLayout,
        mirror: String,
        client: reqwest::Client,
        installer: Box<dyn PlatformInstaller>,
    ) -> Self {
        Self {
            layout,
            mirror,
            client,
            installer,
        }
    }

    /// Run the pipeline for `version`. The caller has already established
    /// that the version is not installed.
    ///
    /// # Errors
    /// Returns the first pipeline failure; the half-built version
    /// directory is removed before the error surfaces.
    pub async fn run(&self, version: &PythonVersion) -> Result<(), EngineError> {
        let cache_dir = self.layout.cache_dir();
        tokio::fs::create_dir_all(&cache_dir)
            .await
            .map_err(|error| EngineError::io("failed to create cache directory", error))?;

        let artifact = self.fetch_artifact(version, &cache_dir).await?;

        let version_dir = self.layout.version_dir(version);
        tokio::fs::create_dir_all(&version_dir)
            .await
            .map_err(|error| EngineError::io("failed to create version directory", error))?;

        if let Err(error) = self
            .install_and_verify(&artifact, &version_dir, version)
            .await
        {
            warn!(
                "install of {version} failed, removing {}",
                version_dir.display()
            );
            let _ = tokio::fs::remove_dir_all(&version_dir).await;
            return Err(error);
        }

        // The cached artifact is only consumed by a successful install;
        // failed attempts keep it around for the retry.
        tokio::fs::remove_file(&artifact)
            .await
            .map_err(|error| EngineError::io("failed to remove cached artifact", error))?;
        Ok(())
    }

    async fn install_and_verify(
        &self,
        artifact: &Path,
        version_dir: &Path,
        version: &PythonVersion,
    ) -> Result<(), EngineError> {
        self.installer.install(artifact, version_dir).await?;
        self.verify(version).await
    }

    /// Download the artifact into the cache, or reuse a same-named file
    /// already present there.
    async fn fetch_artifact(
        &self,
        version: &PythonVersion,
        cache_dir: &Path,
    ) -> Result<PathBuf, EngineError> {
        let url = self.installer.artifact_url(&self.mirror, version);
        let filename = url.rsplit('/').next().unwrap_or("artifact");
        let target = cache_dir.join(filename);

        if target.is_file() {
            info!("artifact already cached at {}, using it", target.display());
            return Ok(target);
        }

        info!("downloading {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| EngineError::network_from("artifact download", error))?;
        if !response.status().is_success() {
            return Err(EngineError::network(
                "artifact download",
                format!("HTTP {} for {url}", response.status()),
            ));
        }

        let staging = target.with_extension("tmp");
        let mut file = tokio::fs::File::create(&staging)
            .await
            .map_err(|error| EngineError::io("failed to create download file", error))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|error| EngineError::network_from("artifact download", error))?;
            file.write_all(&chunk)
                .await
                .map_err(|error| EngineError::io("failed to write download data", error))?;
        }
        file.flush()
            .await
            .map_err(|error| EngineError::io("failed to flush download data", error))?;
        drop(file);

        tokio::fs::rename(&staging, &target)
            .await
            .map_err(|error| EngineError::io("failed to finalize download", error))?;
        debug!("artifact saved at {}", target.display());
        Ok(target)
    }

    /// Ask the freshly installed interpreter for its version and compare
    /// it against the target directory's version. CPython 2.x prints the
    /// banner to stderr, 3.4+ to stdout, so both channels are checked.
    async fn verify(&self, version: &PythonVersion) -> Result<(), EngineError> {
        let executable = self.layout.version_executable(version);
        let output = Command::new(&executable)
            .arg("--version")
            .output()
            .await
            .map_err(|error| EngineError::io("failed to run installed interpreter", error))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let banner = if stdout.trim().is_empty() {
            String::from_utf8_lossy(&output.stderr)
        } else {
            stdout
        };
        let reported = banner.trim();

        if reported.parse::<PythonVersion>().ok() != Some(*version) {
            return Err(EngineError::Verification {
                expected: *version,
                reported: reported.to_string(),
            });
        }
        debug!("verified {} reports {version}", executable.display());
        Ok(())
    }
}
