//! Repository key import into the shared trusted keyring.
//!
//! The keyring is shared by every build running on the host, so the whole
//! import runs under an exclusive file lock. All gpg calls are scoped to
//! the trusted keyring with `--no-default-keyring`; the builder's default
//! keyring is never touched.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::process::{argv, CommandResult, Runner};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use tempfile::NamedTempFile;

/// Parsed form of the key descriptor argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDescriptor {
    /// "keyserver#keyid[,keyid...]": fetch the keys from a keyserver.
    Keyserver {
        server: String,
        key_ids: Vec<String>,
    },
    /// Bare URL of an armored key file to download and import.
    Url(String),
}

impl KeyDescriptor {
    /// Parse a raw descriptor, disambiguated by the '#' separator.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::KeyImport("empty key descriptor".into()));
        }

        match raw.split_once('#') {
            Some((server, ids)) => {
                let server = server.trim();
                let key_ids: Vec<String> = ids
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect();
                if server.is_empty() || key_ids.is_empty() {
                    return Err(Error::KeyImport(format!(
                        "malformed keyserver descriptor '{raw}'"
                    )));
                }
                Ok(Self::Keyserver {
                    server: server.to_string(),
                    key_ids,
                })
            }
            None => Ok(Self::Url(raw.to_string())),
        }
    }
}

/// Exclusive lock on the shared keyring, released on drop.
struct KeyringLock {
    file: File,
}

impl KeyringLock {
    /// Block until the lock is ours. Concurrent builds wait here rather
    /// than fail; the import itself is short.
    fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::KeyImport(format!("cannot create {}: {e}", parent.display())))?;
        }

        // Never unlink a "stale" lock file: a second process could then
        // lock a fresh file at the same path and both would proceed.
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                Error::KeyImport(format!("cannot open lock file {}: {e}", path.display()))
            })?;

        file.lock_exclusive()
            .map_err(|e| Error::KeyImport(format!("cannot lock {}: {e}", path.display())))?;

        Ok(Self { file })
    }
}

impl Drop for KeyringLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Import the repository key(s) into the shared trusted keyring.
///
/// Fatal on any failure; there are no retries. The target tree has not
/// been touched yet when this runs.
pub fn establish_trust(
    runner: &impl Runner,
    config: &Config,
    descriptor: &KeyDescriptor,
) -> Result<()> {
    println!(" * importing repository key");
    let _lock = KeyringLock::acquire(&config.lock_file)?;

    match descriptor {
        KeyDescriptor::Keyserver { server, key_ids } => {
            let mut args = scoped_gpg_args(&config.keyring);
            args.push(format!("--keyserver={server}"));
            args.push("--recv-keys".to_string());
            args.extend(key_ids.iter().cloned());
            run_gpg(runner, &args)
        }
        KeyDescriptor::Url(url) => {
            // Unique scratch file per invocation, removed on drop whether
            // the import succeeds or not.
            let tmp = NamedTempFile::new()
                .map_err(|e| Error::KeyImport(format!("cannot create temp file: {e}")))?;
            download(runner, url, tmp.path())?;

            let mut args = scoped_gpg_args(&config.keyring);
            args.push("--import".to_string());
            args.push(tmp.path().display().to_string());
            run_gpg(runner, &args)
        }
    }
}

fn scoped_gpg_args(keyring: &Path) -> Vec<String> {
    let mut args = argv(["--no-default-keyring", "--batch"]);
    args.push(format!("--keyring={}", keyring.display()));
    args
}

fn download(runner: &impl Runner, url: &str, dest: &Path) -> Result<()> {
    let dest_arg = dest.display().to_string();
    let args = argv(["-sSL", "-o", dest_arg.as_str(), url]);
    let result = runner
        .run("curl", &args)
        .map_err(|e| Error::KeyImport(format!("{e:#}")))?;
    if !result.success() {
        return Err(Error::KeyImport(format!(
            "key download failed for {url} (exit code {})",
            result.code
        )));
    }
    Ok(())
}

fn run_gpg(runner: &impl Runner, args: &[String]) -> Result<()> {
    let result = runner
        .run("gpg", args)
        .map_err(|e| Error::KeyImport(format!("{e:#}")))?;
    if result.success() {
        return Ok(());
    }
    Err(Error::KeyImport(gpg_failure_message(&result)))
}

fn gpg_failure_message(result: &CommandResult) -> String {
    let stderr = result.stderr_trimmed();
    if stderr.is_empty() {
        format!("gpg exited with code {}", result.code)
    } else {
        format!("gpg exited with code {}: {stderr}", result.code)
    }
}
