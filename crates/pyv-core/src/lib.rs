mod config;
mod error;
mod layout;
mod version;

pub use config::{Config, ConfigError, EXECUTABLE_NAME, MIN_LEGAL_VERSION, STABLE_CUTOVER};
pub use error::EngineError;
pub use layout::{LinkKind, PrefixLayout};
pub use version::{PythonVersion, VersionParseError};
