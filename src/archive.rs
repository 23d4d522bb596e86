//! Chroot tree packaging and retirement.
//!
//! Publishing tars the whole tree into a sibling `.tar.xz` and discards the
//! working directory; removal deletes both, idempotently.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::process::{argv, Runner};
use std::fs;

/// xz releases before this cannot multi-thread; fall back to the pixz
/// wrapper on older hosts.
const XZ_THREADS_MIN: (u32, u32, u32) = (5, 2, 0);

/// Archive a built chroot tree and delete the working directory.
///
/// On tar failure the working directory is preserved so the operator can
/// inspect it and retry.
pub fn publish(runner: &impl Runner, config: &Config, identity: &str) -> Result<()> {
    let target = config.target_dir(identity);
    let archive = config.archive_path(identity);

    if !target.is_dir() {
        return Err(Error::Publish(format!(
            "no chroot tree at {}",
            target.display()
        )));
    }

    println!(" * publishing {identity}");
    let _ = fs::remove_file(&archive);

    // Archive from inside the tree so entries are relative, written one
    // level above the working directory.
    let archive_arg = archive.display().to_string();
    let args = if xz_supports_threads(runner) {
        argv(["-cJf", archive_arg.as_str(), "."])
    } else {
        argv(["-c", "-I", "pixz", "-f", archive_arg.as_str(), "."])
    };

    let result = runner
        .run_in("tar", &args, Some(&target))
        .map_err(|e| Error::Publish(format!("{e:#}")))?;
    if !result.success() {
        return Err(Error::Publish(format!(
            "tar exited with code {}",
            result.code
        )));
    }

    fs::remove_dir_all(&target)
        .map_err(|e| Error::Publish(format!("cannot remove {}: {e}", target.display())))?;
    println!("   archived to {}", archive.display());
    Ok(())
}

/// Delete the working directory and archive for an identity.
///
/// Idempotent; missing paths are not an error.
pub fn remove_chroot(config: &Config, identity: &str) {
    println!(" * removing {identity}");
    let _ = fs::remove_dir_all(config.target_dir(identity));
    let _ = fs::remove_file(config.archive_path(identity));
}

/// One-time capability probe of the installed xz. Unknown versions are
/// assumed modern.
fn xz_supports_threads(runner: &impl Runner) -> bool {
    let Ok(result) = runner.run("xz", &argv(["--version"])) else {
        return true;
    };
    if !result.success() {
        return true;
    }
    match parse_xz_version(&result.stdout) {
        Some(version) => version >= XZ_THREADS_MIN,
        None => true,
    }
}

/// Parse the version triple out of `xz --version` output, e.g.
/// `xz (XZ Utils) 5.4.1`.
pub fn parse_xz_version(output: &str) -> Option<(u32, u32, u32)> {
    let line = output.lines().next()?;
    let token = line.split_whitespace().last()?;

    let mut parts = token.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    // Patch may carry a suffix like "0alpha"; digits only.
    let patch = parts
        .next()
        .map(|p| p.chars().take_while(char::is_ascii_digit).collect::<String>())
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    Some((major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xz_version_release() {
        let output = "xz (XZ Utils) 5.4.1\nliblzma 5.4.1\n";
        assert_eq!(parse_xz_version(output), Some((5, 4, 1)));
    }

    #[test]
    fn test_parse_xz_version_suffixed_patch() {
        assert_eq!(parse_xz_version("xz (XZ Utils) 5.1.0alpha"), Some((5, 1, 0)));
    }

    #[test]
    fn test_parse_xz_version_two_part() {
        assert_eq!(parse_xz_version("xz (XZ Utils) 5.2"), Some((5, 2, 0)));
    }

    #[test]
    fn test_parse_xz_version_garbage() {
        assert_eq!(parse_xz_version(""), None);
        assert_eq!(parse_xz_version("not a version line"), None);
    }

    #[test]
    fn test_threshold_comparison() {
        assert!(Some((5, 2, 0)) >= Some(XZ_THREADS_MIN));
        assert!(Some((5, 4, 1)) >= Some(XZ_THREADS_MIN));
        assert!(Some((5, 1, 9)) < Some(XZ_THREADS_MIN));
    }
}
