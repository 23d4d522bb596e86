//! Configuration management for buildenv.
//!
//! Reads configuration from a .env file and environment variables;
//! environment variables take precedence (the .env file is loaded by main
//! via `dotenvy`, which never overrides existing variables).
//!
//! The defaults mirror the deployment layout of the package-build pipeline:
//! chroot trees and their archives live side by side under one state
//! directory, next to the shared keyring and its lock file.

use std::env;
use std::path::PathBuf;

/// Default state directory holding chroots, keyring and lock file.
pub const DEFAULT_STATE_DIR: &str = "/var/lib/buildenv";

/// Buildenv configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding chroot working trees and their archives.
    pub chroot_dir: PathBuf,
    /// Shared keyring receiving imported repository keys. Owned by the
    /// host and shared across concurrent builds; never deleted here.
    pub keyring: PathBuf,
    /// Lock file serializing keyring imports across concurrent builds.
    pub lock_file: PathBuf,
    /// Directory holding qemu user-mode emulator binaries.
    pub emulator_dir: PathBuf,
    /// Fallback repository base URL when the invocation omits one.
    pub repo_url: Option<String>,
    /// Fallback key descriptor when the invocation omits one.
    pub keys: Option<String>,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Self {
        let state_dir = path_var("BUILDENV_STATE_DIR")
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));

        Self {
            chroot_dir: path_var("BUILDENV_CHROOT_DIR")
                .unwrap_or_else(|| state_dir.join("chroots")),
            keyring: path_var("BUILDENV_KEYRING")
                .unwrap_or_else(|| state_dir.join("trustedkeys.gpg")),
            lock_file: path_var("BUILDENV_LOCK_FILE")
                .unwrap_or_else(|| state_dir.join("keyring.lock")),
            emulator_dir: path_var("BUILDENV_EMULATOR_DIR")
                .unwrap_or_else(|| PathBuf::from("/usr/bin")),
            repo_url: env::var("BUILDENV_REPO_URL").ok(),
            keys: env::var("BUILDENV_REPO_KEYS").ok(),
        }
    }

    /// Working directory for a chroot identity.
    pub fn target_dir(&self, identity: &str) -> PathBuf {
        self.chroot_dir.join(identity)
    }

    /// Archive path for a chroot identity, sibling of the working directory.
    pub fn archive_path(&self, identity: &str) -> PathBuf {
        self.chroot_dir.join(format!("{identity}.tar.xz"))
    }
}

fn path_var(key: &str) -> Option<PathBuf> {
    env::var(key).ok().filter(|v| !v.is_empty()).map(PathBuf::from)
}
