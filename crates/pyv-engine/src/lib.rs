//! Version lifecycle engine for the managed interpreter tree:
//! - Remote index scraping and latest/stable resolution.
//! - Local inventory derived from the filesystem on every query.
//! - Install pipeline (fetch, extract, build, verify, clean up).
//! - Activation via the stable symlink set.
//! - A façade composing these into the public operations.

mod activate;
mod engine;
mod installer;
mod inventory;
mod lock;
mod mirror;
mod pipeline;

pub use activate::ActivationEngine;
pub use engine::Engine;
pub use installer::{PlatformInstaller, UnixSourceInstaller, WindowsMsiInstaller, platform_installer};
pub use inventory::LocalInventory;
pub use lock::PrefixLock;
pub use mirror::RemoteIndex;
pub use pipeline::InstallPipeline;
