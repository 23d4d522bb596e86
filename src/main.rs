//! buildenv - debootstrap chroot lifecycle for a package-build pipeline.
//!
//! Builds minimal root filesystem trees, archives them for use as isolated
//! build chroots, and retires them:
//! - `build`: import the repository key, bootstrap the tree (two-phase for
//!   ARM-family targets), clean it up
//! - `publish`: tar the tree into a `.tar.xz` and drop the working copy
//! - `remove`: delete working copy and archive
//! - `info`: describe what this backend provides

use anyhow::Result as AnyResult;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use buildenv::config::Config;
use buildenv::error::{Error, Result};
use buildenv::keyring::KeyDescriptor;
use buildenv::process::SystemRunner;
use buildenv::spec::{self, BuildSpec};
use buildenv::{archive, bootstrap, keyring, preflight, sanitize};

#[derive(Parser)]
#[command(name = "buildenv")]
#[command(about = "Manages debootstrap build environments for package builds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe the build environments this backend provides
    Info,

    /// Create a chroot tree for a distribution release and architecture
    Build {
        dist_release: String,
        dist_name: String,
        dist_version: String,
        arch: String,
        /// Extra repository components, comma separated ("main" is implied)
        components: Option<String>,
        /// Repository base URL (falls back to configuration)
        repo_url: Option<String>,
        /// Key descriptor: "keyserver#keyid[,keyid...]" or a key file URL
        keys: Option<String>,
    },

    /// Archive a built chroot tree and discard the working directory
    Publish {
        dist_release: String,
        dist_name: String,
        dist_version: String,
        arch: String,
    },

    /// Delete the working directory and archive for an identity
    Remove {
        dist_release: String,
        dist_name: String,
        dist_version: String,
        arch: String,
    },
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            ErrorKind::InvalidSubcommand => {
                let action = std::env::args().nth(1).unwrap_or_default();
                fail(Error::UnknownAction(action))
            }
            _ => fail(Error::Usage(err.to_string())),
        },
    };

    let config = Config::load();
    let runner = SystemRunner;

    let result = match cli.command {
        Commands::Info => {
            println!("schroot build environments for sbuild");
            Ok(())
        }
        Commands::Build {
            dist_release,
            dist_name,
            dist_version,
            arch,
            components,
            repo_url,
            keys,
        } => build(
            &runner,
            &config,
            dist_release,
            dist_name,
            dist_version,
            arch,
            components,
            repo_url,
            keys,
        ),
        Commands::Publish {
            dist_name,
            dist_version,
            arch,
            ..
        } => archive::publish(&runner, &config, &spec::identity(&dist_name, &dist_version, &arch)),
        Commands::Remove {
            dist_name,
            dist_version,
            arch,
            ..
        } => {
            archive::remove_chroot(&config, &spec::identity(&dist_name, &dist_version, &arch));
            Ok(())
        }
    };

    if let Err(err) = result {
        fail(err);
    }
}

#[allow(clippy::too_many_arguments)]
fn build(
    runner: &SystemRunner,
    config: &Config,
    release: String,
    name: String,
    version: String,
    arch: String,
    components: Option<String>,
    repo_url: Option<String>,
    keys: Option<String>,
) -> Result<()> {
    // Positional arguments win; the deployment config fills the gaps.
    let repo_url = repo_url
        .or_else(|| config.repo_url.clone())
        .ok_or_else(|| Error::Usage("no repository URL given and none configured".into()))?;
    let keys = keys
        .or_else(|| config.keys.clone())
        .ok_or_else(|| Error::Usage("no repository key given and none configured".into()))?;

    let spec = BuildSpec {
        release,
        name,
        version,
        arch,
        components: spec::parse_components(components.as_deref().unwrap_or("")),
        repo_url,
        keys,
    };

    check_preflight(preflight::check_host_tools())?;

    let descriptor = KeyDescriptor::parse(&spec.keys)?;
    keyring::establish_trust(runner, config, &descriptor)?;
    bootstrap::build_chroot(runner, config, &spec)?;
    sanitize::sanitize(runner, &config.target_dir(&spec.identity()));

    println!("done: {}", spec.identity());
    Ok(())
}

fn check_preflight(result: AnyResult<()>) -> Result<()> {
    result.map_err(|e| Error::Usage(format!("{e:#}")))
}

fn fail(err: Error) -> ! {
    eprintln!("{err}");
    std::process::exit(err.exit_code());
}
