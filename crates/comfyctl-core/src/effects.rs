use std::fs::File;
use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use camino::Utf8Path;
use comfyctl_domain::{Account, CommandSpec, Identity};
use sha2::{Digest, Sha256};

use crate::issues::LifecycleIssue;
use crate::process::{exec_command, run_command_passthrough, RunOutput};

pub trait ProcessRunner: Send + Sync {
    /// Runs `command` to completion with inherited stdio.
    fn run(&self, command: &CommandSpec) -> Result<RunOutput>;
    /// Replaces this process with `command`. Returning at all means the
    /// exec did not happen.
    fn exec(&self, command: &CommandSpec) -> Result<()>;
}

pub trait FileSystem: Send + Sync {
    fn create_dir_all(&self, path: &Utf8Path) -> Result<()>;
    /// Removes a file, symlink, or directory tree; a missing path is not an error.
    fn remove_all(&self, path: &Utf8Path) -> Result<()>;
    fn symlink(&self, target: &Utf8Path, link: &Utf8Path) -> Result<()>;
    /// Lowercase hex sha256 of the file contents.
    fn sha256(&self, path: &Utf8Path) -> Result<String>;
}

pub trait AccountDatabase: Send + Sync {
    /// Real uid/gid of this process.
    fn current(&self) -> Identity;
    fn lookup(&self, name: &str) -> Result<Account>;
}

pub trait Effects: Send + Sync {
    fn process(&self) -> &dyn ProcessRunner;
    fn fs(&self) -> &dyn FileSystem;
    fn accounts(&self) -> &dyn AccountDatabase;
}

pub struct SystemEffects {
    process: Arc<SystemProcessRunner>,
    fs: Arc<SystemFileSystem>,
    accounts: Arc<SystemAccountDatabase>,
}

impl SystemEffects {
    #[must_use]
    pub fn new() -> Self {
        Self {
            process: Arc::new(SystemProcessRunner),
            fs: Arc::new(SystemFileSystem),
            accounts: Arc::new(SystemAccountDatabase),
        }
    }
}

impl Default for SystemEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl Effects for SystemEffects {
    fn process(&self) -> &dyn ProcessRunner {
        self.process.as_ref()
    }

    fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    fn accounts(&self) -> &dyn AccountDatabase {
        self.accounts.as_ref()
    }
}

struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &CommandSpec) -> Result<RunOutput> {
        run_command_passthrough(&command.program, &command.args)
    }

    fn exec(&self, command: &CommandSpec) -> Result<()> {
        exec_command(&command.program, &command.args)
    }
}

pub(crate) struct SystemFileSystem;

impl FileSystem for SystemFileSystem {
    fn create_dir_all(&self, path: &Utf8Path) -> Result<()> {
        std::fs::create_dir_all(path).with_context(|| format!("creating {path}"))
    }

    fn remove_all(&self, path: &Utf8Path) -> Result<()> {
        let metadata = match std::fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err).with_context(|| format!("inspecting {path}")),
        };
        if metadata.is_dir() {
            std::fs::remove_dir_all(path).with_context(|| format!("removing dir {path}"))
        } else {
            std::fs::remove_file(path).with_context(|| format!("removing file {path}"))
        }
    }

    fn symlink(&self, target: &Utf8Path, link: &Utf8Path) -> Result<()> {
        std::os::unix::fs::symlink(target, link)
            .with_context(|| format!("linking {link} to {target}"))
    }

    fn sha256(&self, path: &Utf8Path) -> Result<String> {
        let mut file = File::open(path).with_context(|| format!("opening {path}"))?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher).with_context(|| format!("hashing {path}"))?;
        Ok(hex::encode(hasher.finalize()))
    }
}

struct SystemAccountDatabase;

impl AccountDatabase for SystemAccountDatabase {
    fn current(&self) -> Identity {
        Identity::new(
            nix::unistd::getuid().as_raw(),
            nix::unistd::getgid().as_raw(),
        )
    }

    fn lookup(&self, name: &str) -> Result<Account> {
        let user = nix::unistd::User::from_name(name)
            .with_context(|| format!("looking up account {name}"))?
            .ok_or_else(|| LifecycleIssue::AccountNotFound {
                name: name.to_string(),
            })?;
        Ok(Account::new(
            user.name,
            Identity::new(user.uid.as_raw(), user.gid.as_raw()),
        ))
    }
}

pub type SharedEffects = Arc<dyn Effects>;
