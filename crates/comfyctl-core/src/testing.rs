use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use camino::Utf8Path;
use comfyctl_domain::{Account, CommandSpec, Identity};

use crate::effects::{AccountDatabase, Effects, FileSystem, ProcessRunner, SystemFileSystem};
use crate::issues::LifecycleIssue;
use crate::process::RunOutput;

type Journal = Arc<Mutex<Vec<String>>>;

/// Effects double that records every call as a shell-like line.
pub(crate) struct RecordingEffects {
    process: RecordingRunner,
    fs: Box<dyn FileSystem>,
    accounts: FakeAccounts,
    journal: Journal,
}

impl RecordingEffects {
    pub(crate) fn new() -> Self {
        let journal: Journal = Arc::default();
        Self {
            process: RecordingRunner {
                journal: journal.clone(),
                outcomes: HashMap::new(),
            },
            fs: Box::new(RecordingFileSystem {
                journal: journal.clone(),
            }),
            accounts: FakeAccounts {
                current: Identity::new(0, 0),
                accounts: HashMap::new(),
            },
            journal,
        }
    }

    /// Filesystem steps hit the real disk; commands are still only recorded.
    pub(crate) fn with_real_fs(mut self) -> Self {
        self.fs = Box::new(SystemFileSystem);
        self
    }

    /// Any command whose program is `program` exits with `code`; an exec of
    /// it fails outright.
    pub(crate) fn failing(mut self, program: &str, code: i32) -> Self {
        self.process
            .outcomes
            .insert(program.to_string(), RunOutput::exited(code));
        self
    }

    pub(crate) fn killed(mut self, program: &str, signal: i32) -> Self {
        self.process
            .outcomes
            .insert(program.to_string(), RunOutput::killed(signal));
        self
    }

    pub(crate) fn running_as(mut self, current: Identity) -> Self {
        self.accounts.current = current;
        self
    }

    pub(crate) fn with_account(mut self, name: &str, identity: Identity) -> Self {
        self.accounts
            .accounts
            .insert(name.to_string(), Account::new(name, identity));
        self
    }

    pub(crate) fn journal(&self) -> Vec<String> {
        self.journal.lock().expect("journal lock").clone()
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter_map(|line| {
                line.strip_prefix("run ")
                    .or_else(|| line.strip_prefix("exec "))
                    .map(ToString::to_string)
            })
            .collect()
    }
}

impl Effects for RecordingEffects {
    fn process(&self) -> &dyn ProcessRunner {
        &self.process
    }

    fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    fn accounts(&self) -> &dyn AccountDatabase {
        &self.accounts
    }
}

struct RecordingRunner {
    journal: Journal,
    outcomes: HashMap<String, RunOutput>,
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, command: &CommandSpec) -> Result<RunOutput> {
        record(&self.journal, format!("run {command}"));
        Ok(self
            .outcomes
            .get(&command.program)
            .copied()
            .unwrap_or(RunOutput::exited(0)))
    }

    fn exec(&self, command: &CommandSpec) -> Result<()> {
        record(&self.journal, format!("exec {command}"));
        if self.outcomes.contains_key(&command.program) {
            bail!("failed to exec {}", command.program);
        }
        Ok(())
    }
}

struct RecordingFileSystem {
    journal: Journal,
}

impl FileSystem for RecordingFileSystem {
    fn create_dir_all(&self, path: &Utf8Path) -> Result<()> {
        record(&self.journal, format!("mkdir {path}"));
        Ok(())
    }

    fn remove_all(&self, path: &Utf8Path) -> Result<()> {
        record(&self.journal, format!("rm {path}"));
        Ok(())
    }

    fn symlink(&self, target: &Utf8Path, link: &Utf8Path) -> Result<()> {
        record(&self.journal, format!("ln {target} {link}"));
        Ok(())
    }

    fn sha256(&self, path: &Utf8Path) -> Result<String> {
        record(&self.journal, format!("sha256 {path}"));
        Ok("0".repeat(64))
    }
}

struct FakeAccounts {
    current: Identity,
    accounts: HashMap<String, Account>,
}

impl AccountDatabase for FakeAccounts {
    fn current(&self) -> Identity {
        self.current
    }

    fn lookup(&self, name: &str) -> Result<Account> {
        self.accounts.get(name).cloned().ok_or_else(|| {
            LifecycleIssue::AccountNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }
}

fn record(journal: &Journal, line: String) {
    journal.lock().expect("journal lock").push(line);
}
