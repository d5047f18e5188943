use log::{debug, info};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::version::PythonVersion;

/// Name of the executable being managed.
pub const EXECUTABLE_NAME: &str = "python";

/// Versions below this are never offered for installation.
pub const MIN_LEGAL_VERSION: PythonVersion = PythonVersion::new(2, 7, 0);

/// First version of the feature channel; `stable` resolves strictly below it.
pub const STABLE_CUTOVER: PythonVersion = PythonVersion::new(3, 7, 0);

const DEFAULT_MIRROR: &str = "https://www.python.org/ftp/python/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("could not determine home directory; set P_PREFIX")]
    HomeDirUnavailable,
}

/// User-configurable parameters, read once per process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the managed tree. Overridable via `P_PREFIX`, defaults to
    /// the home directory.
    pub prefix: PathBuf,
    /// Base URL for version discovery and artifact download. Overridable
    /// via `P_MIRROR`.
    pub mirror: String,
}

impl Config {
    /// Read the configuration from the environment.
    ///
    /// # Errors
    /// Returns an error when no `P_PREFIX` is set and the home directory
    /// cannot be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        let prefix = match env::var_os("P_PREFIX").filter(|value| !value.is_empty()) {
            Some(value) => {
                let prefix = PathBuf::from(value);
                debug!("P_PREFIX: {}", prefix.display());
                prefix
            }
            None => {
                let prefix = dirs::home_dir().ok_or(ConfigError::HomeDirUnavailable)?;
                info!("no P_PREFIX defined, using default: {}", prefix.display());
                prefix
            }
        };

        let mirror = match env::var("P_MIRROR").ok().filter(|value| !value.is_empty()) {
            Some(mirror) => {
                debug!("P_MIRROR: {mirror}");
                mirror
            }
            None => {
                debug!("no P_MIRROR defined, using default: {DEFAULT_MIRROR}");
                DEFAULT_MIRROR.to_string()
            }
        };

        Ok(Self { prefix, mirror })
    }
}
