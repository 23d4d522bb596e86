//! Shared test utilities for buildenv tests.
#![allow(dead_code)]

use anyhow::Result;
use buildenv::config::Config;
use buildenv::process::{CommandResult, Runner};
use buildenv::spec::BuildSpec;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// A recorded subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
}

impl RecordedCall {
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    pub fn has_arg_containing(&self, fragment: &str) -> bool {
        self.args.iter().any(|a| a.contains(fragment))
    }
}

struct ExitRule {
    program: String,
    arg_contains: Option<String>,
    code: i32,
}

/// Fake runner that records invocations and returns programmed exit codes.
///
/// Clones share state, so one runner can be handed to multiple threads and
/// inspected afterwards.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    rules: Arc<Mutex<Vec<ExitRule>>>,
    stdout: Arc<Mutex<Vec<(String, String)>>>,
    events: Arc<Mutex<Vec<String>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `program` exit with `code`.
    pub fn set_exit_code(&self, program: &str, code: i32) {
        self.rules.lock().unwrap().push(ExitRule {
            program: program.to_string(),
            arg_contains: None,
            code,
        });
    }

    /// Make calls to `program` whose arguments contain `fragment` exit
    /// with `code`. More specific than [`set_exit_code`]; first matching
    /// rule wins.
    pub fn set_exit_code_when(&self, program: &str, fragment: &str, code: i32) {
        self.rules.lock().unwrap().push(ExitRule {
            program: program.to_string(),
            arg_contains: Some(fragment.to_string()),
            code,
        });
    }

    /// Program stdout returned for calls to `program`.
    pub fn set_stdout(&self, program: &str, stdout: &str) {
        self.stdout
            .lock()
            .unwrap()
            .push((program.to_string(), stdout.to_string()));
    }

    /// Sleep inside every call, bracketing it with start/end events. Used
    /// to expose interleaving across threads.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn exit_code_for(&self, program: &str, args: &[String]) -> i32 {
        let rules = self.rules.lock().unwrap();
        rules
            .iter()
            .find(|rule| {
                rule.program == program
                    && rule
                        .arg_contains
                        .as_ref()
                        .map_or(true, |fragment| args.iter().any(|a| a.contains(fragment)))
            })
            .map_or(0, |rule| rule.code)
    }

    fn stdout_for(&self, program: &str) -> String {
        self.stdout
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == program)
            .map(|(_, out)| out.clone())
            .unwrap_or_default()
    }
}

impl Runner for RecordingRunner {
    fn run_in(&self, program: &str, args: &[String], dir: Option<&Path>) -> Result<CommandResult> {
        self.calls.lock().unwrap().push(RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            dir: dir.map(Path::to_path_buf),
        });

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            self.events.lock().unwrap().push(format!("{program}:start"));
            std::thread::sleep(delay);
            self.events.lock().unwrap().push(format!("{program}:end"));
        }

        Ok(CommandResult {
            code: self.exit_code_for(program, args),
            stdout: self.stdout_for(program),
            stderr: String::new(),
        })
    }
}

/// Test environment with a temporary state directory layout.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let config = Config {
            chroot_dir: base.join("chroots"),
            keyring: base.join("trustedkeys.gpg"),
            lock_file: base.join("keyring.lock"),
            emulator_dir: base.join("emulators"),
            repo_url: None,
            keys: None,
        };

        fs::create_dir_all(&config.chroot_dir).expect("Failed to create chroot dir");
        fs::create_dir_all(&config.emulator_dir).expect("Failed to create emulator dir");
        for binary in ["qemu-arm-static", "qemu-aarch64-static"] {
            fs::write(config.emulator_dir.join(binary), b"#!fake emulator")
                .expect("Failed to create fake emulator");
        }

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }
}

/// A build spec against a fake repository.
pub fn build_spec(arch: &str, components: &[&str]) -> BuildSpec {
    BuildSpec {
        release: "bookworm".into(),
        name: "testdist".into(),
        version: "1".into(),
        arch: arch.into(),
        components: components.iter().map(|c| c.to_string()).collect(),
        repo_url: "http://repo.example/debian".into(),
        keys: "hkp://keys.example#DEADBEEF".into(),
    }
}
