//! Build specification parsed from the command line.

/// Chroot identity string shared by the working directory and the archive.
pub fn identity(name: &str, version: &str, arch: &str) -> String {
    format!("{name}_{version}_{arch}")
}

/// Split a comma-separated component list, dropping empty entries.
pub fn parse_components(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

/// Validated input for one build, immutable once parsed.
#[derive(Debug, Clone)]
pub struct BuildSpec {
    /// Distribution release to bootstrap (e.g. "bookworm").
    pub release: String,
    /// Distribution name, first part of the chroot identity.
    pub name: String,
    /// Distribution version, second part of the chroot identity.
    pub version: String,
    /// Target architecture (e.g. "amd64", "armhf", "arm64").
    pub arch: String,
    /// Extra repository components; "main" is always implied.
    pub components: Vec<String>,
    /// Repository base URL handed to debootstrap.
    pub repo_url: String,
    /// Key descriptor, either "keyserver#keyid[,keyid...]" or a key file URL.
    pub keys: String,
}

impl BuildSpec {
    pub fn identity(&self) -> String {
        identity(&self.name, &self.version, &self.arch)
    }

    /// ARM-family targets cannot execute their own binaries on the build
    /// host and take the two-phase bootstrap path.
    pub fn is_foreign(&self) -> bool {
        self.arch.contains("arm")
    }

    /// User-mode emulator binary injected before the second stage.
    pub fn emulator_binary(&self) -> &'static str {
        if self.arch == "armhf" {
            "qemu-arm-static"
        } else {
            "qemu-aarch64-static"
        }
    }

    /// `--components` argument for debootstrap, or None when only the
    /// default component set was requested.
    pub fn components_arg(&self) -> Option<String> {
        if self.components.is_empty() {
            None
        } else {
            Some(format!("--components=main,{}", self.components.join(",")))
        }
    }
}
