//! Host tool availability checks run before a build.

use anyhow::{bail, Result};

/// Required tools with package hints.
const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("debootstrap", "debootstrap"),
    ("gpg", "gnupg"),
    ("chroot", "coreutils"),
    ("curl", "curl"),
    ("tar", "tar"),
    ("xz", "xz-utils"),
];

/// Fail early if any tool the build will shell out to is missing.
pub fn check_host_tools() -> Result<()> {
    let missing: Vec<String> = REQUIRED_TOOLS
        .iter()
        .filter(|(tool, _)| which::which(tool).is_err())
        .map(|(tool, package)| format!("{tool} (install '{package}')"))
        .collect();

    if !missing.is_empty() {
        bail!("missing host tools: {}", missing.join(", "));
    }
    Ok(())
}
