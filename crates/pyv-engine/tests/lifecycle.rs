#![cfg(unix)]

use async_trait::async_trait;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use pyv_core::{Config, EngineError, PythonVersion};
use pyv_engine::{ActivationEngine, Engine, PlatformInstaller};

fn config_in(temp: &tempfile::TempDir) -> Config {
    Config {
        prefix: temp.path().to_path_buf(),
        mirror: "https://mirror.invalid/python/".to_string(),
    }
}

fn versions_dir(temp: &tempfile::TempDir) -> PathBuf {
    temp.path().join("p/versions/python")
}

fn active_dir(temp: &tempfile::TempDir) -> PathBuf {
    temp.path().join("p/versions")
}

/// Drop a same-named artifact into the cache so the pipeline reuses it
/// instead of downloading.
fn seed_artifact(temp: &tempfile::TempDir, version: &str) {
    let cache_dir = versions_dir(temp).join("temp");
    fs::create_dir_all(&cache_dir).unwrap();
    fs::write(cache_dir.join(format!("Python-{version}.tgz")), b"").unwrap();
}

fn cached_artifact(temp: &tempfile::TempDir, version: &str) -> PathBuf {
    versions_dir(temp)
        .join("temp")
        .join(format!("Python-{version}.tgz"))
}

/// Seed a fake installed version directly on disk, the way a finished
/// pipeline run leaves it.
fn seed_installed(temp: &tempfile::TempDir, version: &str) {
    let dir = versions_dir(temp).join(version);
    fs::create_dir_all(dir.join("bin")).unwrap();
    fs::write(dir.join("bin/python"), b"").unwrap();
    fs::create_dir_all(dir.join("lib")).unwrap();
}

/// Installer that fabricates a `bin/python` reporting a fixed banner.
struct ScriptedInstaller {
    banner: String,
}

impl ScriptedInstaller {
    fn reporting(banner: &str) -> Box<Self> {
        Box::new(Self {
            banner: banner.to_string(),
        })
    }
}

#[async_trait]
impl PlatformInstaller for ScriptedInstaller {
    fn artifact_url(&self, mirror: &str, version: &PythonVersion) -> String {
        format!("{mirror}{version}/Python-{version}.tgz")
    }

    async fn install(&self, _artifact: &Path, version_dir: &Path) -> Result<(), EngineError> {
        let bin = version_dir.join("bin");
        fs::create_dir_all(&bin).unwrap();
        let executable = bin.join("python");
        fs::write(&executable, format!("#!/bin/sh\necho '{}'\n", self.banner)).unwrap();
        let mut permissions = fs::metadata(&executable).unwrap().permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&executable, permissions).unwrap();
        fs::create_dir_all(version_dir.join("lib")).unwrap();
        Ok(())
    }
}

/// Installer whose build step always fails.
struct BrokenInstaller;

#[async_trait]
impl PlatformInstaller for BrokenInstaller {
    fn artifact_url(&self, mirror: &str, version: &PythonVersion) -> String {
        format!("{mirror}{version}/Python-{version}.tgz")
    }

    async fn install(&self, _artifact: &Path, _version_dir: &Path) -> Result<(), EngineError> {
        Err(EngineError::build("configure", "configure: error: no acceptable C compiler"))
    }
}

#[tokio::test]
async fn install_then_uninstall_round_trip() {
    let temp = tempfile::tempdir().unwrap();
    let version = PythonVersion::new(9, 9, 1);
    seed_artifact(&temp, "9.9.1");
    let engine =
        Engine::with_installer(config_in(&temp), ScriptedInstaller::reporting("Python 9.9.1"))
            .unwrap();

    engine.install(&version, false).await.unwrap();
    assert!(engine.is_installed(&version).unwrap());
    assert!(
        !cached_artifact(&temp, "9.9.1").exists(),
        "artifact should be consumed after a successful install"
    );

    engine.uninstall(&version).await.unwrap();
    assert!(!engine.is_installed(&version).unwrap());
}

#[tokio::test]
async fn install_verifies_reported_version() {
    let temp = tempfile::tempdir().unwrap();
    let version = PythonVersion::new(9, 9, 1);
    seed_artifact(&temp, "9.9.1");
    let engine =
        Engine::with_installer(config_in(&temp), ScriptedInstaller::reporting("Python 9.9.2"))
            .unwrap();

    let result = engine.install(&version, false).await;

    assert!(matches!(result, Err(EngineError::Verification { .. })));
    assert!(
        !versions_dir(&temp).join("9.9.1").exists(),
        "mismatching install should be cleaned up"
    );
}

#[tokio::test]
async fn install_without_force_preserves_existing_version() {
    let temp = tempfile::tempdir().unwrap();
    let version = PythonVersion::new(9, 9, 1);
    seed_artifact(&temp, "9.9.1");
    let engine =
        Engine::with_installer(config_in(&temp), ScriptedInstaller::reporting("Python 9.9.1"))
            .unwrap();
    engine.install(&version, false).await.unwrap();

    let marker = versions_dir(&temp).join("9.9.1/lib/marker");
    fs::write(&marker, b"").unwrap();

    let result = engine.install(&version, false).await;

    assert!(matches!(result, Err(EngineError::AlreadyInstalled { .. })));
    assert!(marker.exists(), "existing installation must not be touched");
}

#[tokio::test]
async fn force_install_fully_replaces_existing_version() {
    let temp = tempfile::tempdir().unwrap();
    let version = PythonVersion::new(9, 9, 1);
    seed_artifact(&temp, "9.9.1");
    let engine =
        Engine::with_installer(config_in(&temp), ScriptedInstaller::reporting("Python 9.9.1"))
            .unwrap();
    engine.install(&version, false).await.unwrap();

    let marker = versions_dir(&temp).join("9.9.1/lib/marker");
    fs::write(&marker, b"").unwrap();

    seed_artifact(&temp, "9.9.1");
    engine.install(&version, true).await.unwrap();

    assert!(engine.is_installed(&version).unwrap());
    assert!(!marker.exists(), "force install should start from scratch");
}

#[tokio::test]
async fn failed_build_cleans_up_but_keeps_artifact() {
    let temp = tempfile::tempdir().unwrap();
    let version = PythonVersion::new(9, 9, 1);
    seed_artifact(&temp, "9.9.1");
    let engine = Engine::with_installer(config_in(&temp), Box::new(BrokenInstaller)).unwrap();

    let result = engine.install(&version, false).await;

    assert!(matches!(result, Err(EngineError::Build { step: "configure", .. })));
    assert!(
        !versions_dir(&temp).join("9.9.1").exists(),
        "failed install must leave no version directory behind"
    );
    assert!(
        cached_artifact(&temp, "9.9.1").exists(),
        "artifact stays cached for the retry"
    );
    assert!(!engine.is_installed(&version).unwrap());
}

#[tokio::test]
async fn uninstalling_an_absent_version_fails() {
    let temp = tempfile::tempdir().unwrap();
    let engine =
        Engine::with_installer(config_in(&temp), ScriptedInstaller::reporting("Python 9.9.1"))
            .unwrap();

    let result = engine.uninstall(&PythonVersion::new(9, 9, 1)).await;

    assert!(matches!(result, Err(EngineError::NotInstalled { .. })));
}

#[test]
fn activation_swap_leaves_no_residual_links() {
    let temp = tempfile::tempdir().unwrap();
    seed_installed(&temp, "3.6.8");
    seed_installed(&temp, "3.8.1");
    let layout = pyv_core::PrefixLayout::new(&config_in(&temp));
    let activation = ActivationEngine::new(layout);

    activation.activate(&PythonVersion::new(3, 6, 8)).unwrap();
    let bin_link = active_dir(&temp).join("bin");
    assert_eq!(
        fs::read_link(&bin_link).unwrap(),
        versions_dir(&temp).join("3.6.8/bin")
    );

    activation.activate(&PythonVersion::new(3, 8, 1)).unwrap();
    for kind in ["bin", "lib", "include", "share"] {
        let link = active_dir(&temp).join(kind);
        if let Ok(target) = fs::read_link(&link) {
            assert!(
                target.starts_with(versions_dir(&temp).join("3.8.1")),
                "{kind} still points at the previous version: {}",
                target.display()
            );
        }
    }
}

#[test]
fn activation_skips_absent_optional_subdirectories() {
    let temp = tempfile::tempdir().unwrap();
    seed_installed(&temp, "3.6.8");
    let layout = pyv_core::PrefixLayout::new(&config_in(&temp));
    let activation = ActivationEngine::new(layout);

    activation.activate(&PythonVersion::new(3, 6, 8)).unwrap();

    assert!(active_dir(&temp).join("bin").is_symlink());
    assert!(active_dir(&temp).join("lib").is_symlink());
    assert!(!active_dir(&temp).join("include").exists());
    assert!(!active_dir(&temp).join("share").exists());
}

#[test]
fn deactivate_without_active_version_is_a_noop() {
    let temp = tempfile::tempdir().unwrap();
    let layout = pyv_core::PrefixLayout::new(&config_in(&temp));
    let activation = ActivationEngine::new(layout);

    activation.deactivate().unwrap();
    activation.deactivate().unwrap();
}

#[test]
fn activating_an_absent_version_fails() {
    let temp = tempfile::tempdir().unwrap();
    let layout = pyv_core::PrefixLayout::new(&config_in(&temp));
    let activation = ActivationEngine::new(layout);

    let result = activation.activate(&PythonVersion::new(3, 6, 8));

    assert!(matches!(result, Err(EngineError::NotInstalled { .. })));
}

#[tokio::test]
async fn run_with_version_surfaces_combined_output() {
    let temp = tempfile::tempdir().unwrap();
    let version = PythonVersion::new(9, 9, 1);
    seed_artifact(&temp, "9.9.1");
    let engine =
        Engine::with_installer(config_in(&temp), ScriptedInstaller::reporting("Python 9.9.1"))
            .unwrap();
    engine.install(&version, false).await.unwrap();

    // The scripted interpreter ignores its arguments and echoes its banner.
    let output = engine
        .run_with_version(&version, &["print('hello')".to_string()])
        .await
        .unwrap();

    assert_eq!(output.trim(), "Python 9.9.1");
}

#[tokio::test]
async fn bin_path_requires_an_installed_version() {
    let temp = tempfile::tempdir().unwrap();
    let engine =
        Engine::with_installer(config_in(&temp), ScriptedInstaller::reporting("Python 9.9.1"))
            .unwrap();
    let version = PythonVersion::new(9, 9, 1);

    assert!(matches!(
        engine.bin_path(&version),
        Err(EngineError::NotInstalled { .. })
    ));

    seed_installed(&temp, "9.9.1");
    assert_eq!(
        engine.bin_path(&version).unwrap(),
        versions_dir(&temp).join("9.9.1/bin/python")
    );
}
