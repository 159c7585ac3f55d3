use std::fmt;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// A program and its argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Returns a copy of `self` run through `program args...` first.
    #[must_use]
    pub fn prefixed<I, S>(&self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut prefixed = Self::new(program, args);
        prefixed.args.extend(self.argv());
        prefixed
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv().join(" "))
    }
}

/// One unit of work in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Spawn a program with inherited stdio; a non-zero exit fails the plan.
    Run { command: CommandSpec },
    /// `mkdir -p` every path.
    CreateDirs { paths: Vec<Utf8PathBuf> },
    /// Recursive delete that tolerates a missing path and never follows symlinks.
    RemovePath { path: Utf8PathBuf },
    Symlink {
        target: Utf8PathBuf,
        link: Utf8PathBuf,
    },
    VerifySha256 {
        path: Utf8PathBuf,
        expected: String,
    },
    /// The workload itself. Replaces the current process instead of spawning.
    Launch { command: CommandSpec },
}

impl Step {
    pub fn run<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Run {
            command: CommandSpec::new(program, args),
        }
    }

}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run { command } | Self::Launch { command } => write!(f, "{command}"),
            Self::CreateDirs { paths } => {
                let joined = paths
                    .iter()
                    .map(|path| path.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "mkdir -p {joined}")
            }
            Self::RemovePath { path } => write!(f, "rm -rf {path}"),
            Self::Symlink { target, link } => write!(f, "ln -s {target} {link}"),
            Self::VerifySha256 { path, expected } => write!(f, "sha256 {path} == {expected}"),
        }
    }
}

/// Ordered steps; execution stops at the first failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Rendered command line of every step.
    #[must_use]
    pub fn rendered(&self) -> Vec<String> {
        self.steps.iter().map(ToString::to_string).collect()
    }
}

impl FromIterator<Step> for Plan {
    fn from_iter<T: IntoIterator<Item = Step>>(iter: T) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}
