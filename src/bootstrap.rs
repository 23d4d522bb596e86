//! Native and two-phase foreign debootstrap drivers.
//!
//! Native architectures bootstrap in a single debootstrap run. ARM-family
//! targets cannot execute their own binaries on the host, so they unpack
//! with `--foreign`, get a user-mode emulator copied into the tree, and
//! then finish with the chrooted second stage.

use crate::config::Config;
use crate::error::{Error, Result, Stage};
use crate::process::{argv, Runner};
use crate::spec::BuildSpec;
use std::fs;
use std::path::Path;

/// Bootstrap a chroot tree for the given spec.
///
/// Any pre-existing tree for the same identity is destroyed first; there is
/// no incremental rebuild. On failure the partially built tree is left in
/// place for inspection.
pub fn build_chroot(runner: &impl Runner, config: &Config, spec: &BuildSpec) -> Result<()> {
    let target = config.target_dir(&spec.identity());

    if spec.is_foreign() {
        prepare_target(&target, Stage::ForeignUnpack)?;
        println!(" * creating {} chroot (two-phase)", spec.arch);
        run_debootstrap(runner, config, spec, &target, Stage::ForeignUnpack)?;
        inject_emulator(config, spec, &target)?;
        second_stage(runner, &target)?;
    } else {
        prepare_target(&target, Stage::Native)?;
        println!(" * creating {} chroot", spec.arch);
        run_debootstrap(runner, config, spec, &target, Stage::Native)?;
    }

    Ok(())
}

/// Argument list for the debootstrap invocation.
///
/// The include list is fixed: gnupg1 stays because trust operations on the
/// finished tree still expect the v1 tool.
pub fn debootstrap_args(
    config: &Config,
    spec: &BuildSpec,
    target: &Path,
    foreign: bool,
) -> Vec<String> {
    let mut args = Vec::new();
    if foreign {
        args.push("--foreign".to_string());
    }
    args.push(format!("--arch={}", spec.arch));
    args.push(format!("--keyring={}", config.keyring.display()));
    args.push("--variant=minbase".to_string());
    args.push("--include=gnupg1".to_string());
    if let Some(components) = spec.components_arg() {
        args.push(components);
    }
    args.push(spec.release.clone());
    args.push(target.display().to_string());
    args.push(spec.repo_url.clone());
    args
}

fn prepare_target(target: &Path, stage: Stage) -> Result<()> {
    let fail = |e: std::io::Error| Error::Bootstrap {
        stage,
        message: format!("cannot prepare {}: {e}", target.display()),
    };
    if target.exists() {
        fs::remove_dir_all(target).map_err(fail)?;
    }
    fs::create_dir_all(target).map_err(fail)?;
    Ok(())
}

fn run_debootstrap(
    runner: &impl Runner,
    config: &Config,
    spec: &BuildSpec,
    target: &Path,
    stage: Stage,
) -> Result<()> {
    let foreign = stage == Stage::ForeignUnpack;
    let args = debootstrap_args(config, spec, target, foreign);
    let result = runner
        .run("debootstrap", &args)
        .map_err(|e| Error::Bootstrap {
            stage,
            message: format!("{e:#}"),
        })?;
    if !result.success() {
        return Err(Error::Bootstrap {
            stage,
            message: format!("debootstrap exited with code {}", result.code),
        });
    }
    Ok(())
}

/// Copy the architecture-matched emulator into the tree so the second
/// stage can execute target binaries.
fn inject_emulator(config: &Config, spec: &BuildSpec, target: &Path) -> Result<()> {
    let binary = spec.emulator_binary();
    println!(" * injecting {binary}");

    let src = config.emulator_dir.join(binary);
    let bin_dir = target.join("usr/bin");
    let dest = bin_dir.join(binary);

    let fail = |message: String| Error::Bootstrap {
        stage: Stage::SecondStage,
        message,
    };
    fs::create_dir_all(&bin_dir)
        .map_err(|e| fail(format!("cannot create {}: {e}", bin_dir.display())))?;
    fs::copy(&src, &dest).map_err(|e| {
        fail(format!(
            "cannot copy {} to {}: {e}",
            src.display(),
            dest.display()
        ))
    })?;
    Ok(())
}

fn second_stage(runner: &impl Runner, target: &Path) -> Result<()> {
    println!(" * running second stage");

    // Trust was already established against the host keyring; the copied
    // tree has no keyring of its own, so GPG checks are off here.
    let target_arg = target.display().to_string();
    let args = argv([
        target_arg.as_str(),
        "/debootstrap/debootstrap",
        "--second-stage",
        "--no-check-gpg",
    ]);
    let result = runner.run("chroot", &args).map_err(|e| Error::Bootstrap {
        stage: Stage::SecondStage,
        message: format!("{e:#}"),
    })?;
    if !result.success() {
        return Err(Error::Bootstrap {
            stage: Stage::SecondStage,
            message: format!("second stage exited with code {}", result.code),
        });
    }
    Ok(())
}
