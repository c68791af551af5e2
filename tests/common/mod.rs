// Shared helpers for integration tests.
//
// The crate's mocks are only compiled for unit tests, so integration tests
// get small hand-written fakes for every seam: a scripted executor, an
// in-memory storage backend, a recording package installer, a dotfile tool
// that is never installed, and a prompt that replays fixed answers.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tuxsync::config::Settings;
use tuxsync::dotfiles::{DotfileTool, PushOutcome};
use tuxsync::error::{ExecutorError, StorageError};
use tuxsync::exec::{ExecResult, Executor};
use tuxsync::installer::{InstallOutcome, PackageInstaller};
use tuxsync::logging::Logger;
use tuxsync::prompt::Prompt;
use tuxsync::storage::{BackupId, BackupSummary, Payload, Storage};
use tuxsync::tasks::Context;

/// Executor that knows which programs exist and what each prints.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    programs: HashSet<String>,
    outputs: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeExecutor {
    /// A machine with the given package manager program on `PATH` whose
    /// listing command prints `listing`.
    pub fn with_manager(marker: &str, list_program: &str, listing: &str) -> Self {
        let mut exec = Self::default();
        exec.programs.insert(marker.to_string());
        exec.outputs
            .insert(list_program.to_string(), listing.to_string());
        exec
    }

    /// Every invocation so far as `"program arg1 arg2"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, program: &str, args: &[&str]) -> ExecResult {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().expect("calls lock").push(line);
        self.outputs.get(program).map_or_else(
            || ExecResult {
                stderr: format!("{program}: not scripted"),
                code: Some(127),
                ..ExecResult::default()
            },
            |out| ExecResult {
                stdout: out.clone(),
                success: true,
                code: Some(0),
                ..ExecResult::default()
            },
        )
    }
}

impl Executor for FakeExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let result = self.record(program, args);
        if !result.success {
            anyhow::bail!("{program} failed: {}", result.stderr);
        }
        Ok(result)
    }

    fn run_in(&self, _dir: &Path, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.run(program, args)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        Ok(self.record(program, args))
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        Ok(self.record(program, args))
    }

    fn which(&self, program: &str) -> bool {
        self.programs.contains(program)
    }
}

/// Storage backend holding backups in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    backups: Mutex<HashMap<String, Payload>>,
    next: Mutex<u32>,
    fail_store: bool,
}

impl MemoryStorage {
    /// Storage whose `store` always fails and keeps nothing.
    pub fn failing() -> Self {
        Self {
            fail_store: true,
            ..Self::default()
        }
    }

    /// Number of stored backups.
    pub fn len(&self) -> usize {
        self.backups.lock().expect("backups lock").len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Put a payload under `id` directly.
    pub fn insert(&self, id: &str, payload: Payload) {
        self.backups
            .lock()
            .expect("backups lock")
            .insert(id.to_string(), payload);
    }
}

impl Storage for MemoryStorage {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn store(&self, payload: &Payload) -> Result<BackupId, StorageError> {
        if self.fail_store {
            return Err(StorageError::Transport("connection reset".to_string()));
        }
        let mut next = self.next.lock().expect("counter lock");
        *next += 1;
        let id = format!("memory{next:04}");
        self.insert(&id, payload.clone());
        Ok(BackupId::parse(&id).expect("generated id is valid"))
    }

    fn retrieve(&self, id: &BackupId) -> Result<Payload, StorageError> {
        self.backups
            .lock()
            .expect("backups lock")
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })
    }

    fn list(&self) -> Result<Vec<BackupSummary>, StorageError> {
        let mut ids: Vec<String> = self
            .backups
            .lock()
            .expect("backups lock")
            .keys()
            .cloned()
            .collect();
        ids.sort();
        Ok(ids
            .into_iter()
            .map(|id| BackupSummary {
                id,
                description: "TuxSync Backup".to_string(),
            })
            .collect())
    }
}

/// Package installer that records what it was asked to install.
#[derive(Debug, Default)]
pub struct RecordingInstaller {
    installed: Mutex<Vec<Vec<String>>>,
    /// Exit code to report; `None` means success.
    pub exit_code: Option<i32>,
}

impl RecordingInstaller {
    /// An installer whose single run exits with `code`.
    pub fn failing(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    /// Every package list passed to `install`.
    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.installed.lock().expect("installed lock").clone()
    }
}

impl PackageInstaller for RecordingInstaller {
    fn name(&self) -> String {
        "tuxmate".to_string()
    }

    fn install(&self, packages: &[String]) -> Result<InstallOutcome, ExecutorError> {
        self.installed
            .lock()
            .expect("installed lock")
            .push(packages.to_vec());
        Ok(self
            .exit_code
            .map_or(InstallOutcome::Installed, |code| InstallOutcome::Failed {
                code: Some(code),
            }))
    }
}

/// Dotfile tool that is not installed.
#[derive(Debug, Default)]
pub struct NoDotfiles;

impl DotfileTool for NoDotfiles {
    fn name(&self) -> String {
        "chezmoi".to_string()
    }

    fn is_available(&self) -> bool {
        false
    }

    fn init(&self, _repo: &str) -> anyhow::Result<()> {
        anyhow::bail!("chezmoi is not installed")
    }

    fn apply(&self) -> anyhow::Result<()> {
        anyhow::bail!("chezmoi is not installed")
    }

    fn source_dir(&self) -> Option<PathBuf> {
        None
    }

    fn push(&self) -> anyhow::Result<PushOutcome> {
        anyhow::bail!("chezmoi is not installed")
    }
}

/// Prompt that answers confirmations from a queue and records questions.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    /// Answer confirmations with `answers` in order, then with the default.
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            asked: Mutex::default(),
        }
    }

    /// Questions asked so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().expect("asked lock").clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, question: &str, default: bool) -> bool {
        self.asked
            .lock()
            .expect("asked lock")
            .push(question.to_string());
        self.answers
            .lock()
            .expect("answers lock")
            .pop_front()
            .unwrap_or(default)
    }

    fn choose(&self, question: &str, _options: &[String], _default: usize) -> Option<usize> {
        self.asked
            .lock()
            .expect("asked lock")
            .push(question.to_string());
        None
    }

    fn input(&self, question: &str) -> Option<String> {
        self.asked
            .lock()
            .expect("asked lock")
            .push(question.to_string());
        None
    }
}

/// Everything a command needs, rooted in a temporary home directory.
pub struct TestHome {
    /// Temporary home directory.
    pub home: tempfile::TempDir,
    /// Logger without a log file.
    pub log: Logger,
    /// Default settings.
    pub settings: Settings,
}

impl TestHome {
    /// A fresh, empty home directory.
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temp dir"),
            log: Logger::with_log_file(None),
            settings: Settings::default(),
        }
    }

    /// Path to the home directory.
    pub fn path(&self) -> &Path {
        self.home.path()
    }

    /// Path to `~/.bashrc`.
    pub fn bashrc(&self) -> PathBuf {
        self.home.path().join(".bashrc")
    }

    /// Write `~/.bashrc`.
    pub fn write_bashrc(&self, content: &str) {
        std::fs::write(self.bashrc(), content).expect("write bashrc");
    }

    /// Names of every entry in the home directory, sorted.
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.home.path())
            .expect("read home")
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Build a command context over this home.
    pub fn context<'a>(
        &'a self,
        executor: &'a dyn Executor,
        prompt: &'a dyn Prompt,
        dry_run: bool,
    ) -> Context<'a> {
        Context::with_home(
            &self.log,
            executor,
            prompt,
            &self.settings,
            self.home.path().to_path_buf(),
            dry_run,
        )
    }
}
