//! Post-bootstrap cleanup inside the new tree.
//!
//! Removes state that conflicts with later provisioning and shrinks the
//! tree before archiving. Everything here is best-effort: a missed cleanup
//! step never fails the build, it only costs archive size.

use crate::process::{argv, CommandResult, Runner};
use anyhow::Result;
use std::fs;
use std::path::Path;

/// Clean the freshly bootstrapped tree.
///
/// Order matters: package purges need the package database, cache and
/// index cleanup run last and unconditionally.
pub fn sanitize(runner: &impl Runner, target: &Path) {
    println!(" * cleaning chroot");
    let target_arg = target.display().to_string();

    // A tree that never completed its second stage has no usable package
    // database; skip the purges, the cleanup below still applies.
    match runner.run("chroot", &argv([target_arg.as_str(), "dpkg", "-l"])) {
        Ok(probe) if probe.success() => {
            // tzdata cannot be excluded at bootstrap time and must not be
            // configured here; provisioning preseeds it later.
            best_effort(
                runner.run(
                    "chroot",
                    &argv([target_arg.as_str(), "apt-get", "purge", "--yes", "tzdata"]),
                ),
                "tzdata purge",
            );
            let _ = fs::remove_file(target.join("etc/localtime"));
        }
        Ok(_) => println!("   no package database, skipping package cleanup"),
        Err(err) => println!("   package database probe failed: {err:#}"),
    }

    best_effort(
        runner.run("chroot", &argv([target_arg.as_str(), "apt-get", "clean"])),
        "apt cache clean",
    );
    remove_apt_lists(target);
}

fn best_effort(result: Result<CommandResult>, what: &str) {
    match result {
        Ok(r) if r.success() => {}
        Ok(r) => println!("   {what} exited with code {} (ignored)", r.code),
        Err(err) => println!("   {what} failed: {err:#} (ignored)"),
    }
}

/// Delete package lists and release metadata under the apt state directory.
fn remove_apt_lists(target: &Path) {
    let lists = target.join("var/lib/apt/lists");
    let Ok(entries) = fs::read_dir(&lists) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let _ = fs::remove_dir_all(&path);
        } else {
            let _ = fs::remove_file(&path);
        }
    }
}
