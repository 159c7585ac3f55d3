use std::fmt;

use anyhow::Result;
use comfyctl_domain::Layout;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use crate::config::EnvSnapshot;
use crate::config::{Config, GlobalOptions};
use crate::effects::{Effects, SharedEffects};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandGroup {
    Setup,
    InstallNodes,
    Entrypoint,
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Setup => "setup",
            Self::InstallNodes => "install-nodes",
            Self::Entrypoint => "entrypoint",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup) -> Self {
        Self { group }
    }
}

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
    effects: SharedEffects,
}

impl<'a> CommandContext<'a> {
    /// Creates a new command context with the provided global options.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be read from the environment.
    pub fn new(global: &'a GlobalOptions, effects: SharedEffects) -> Result<Self> {
        Ok(Self {
            global,
            config: Config::from_env()?,
            effects,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_testing(
        global: &'a GlobalOptions,
        pairs: &[(&str, &str)],
        effects: SharedEffects,
    ) -> Self {
        Self {
            global,
            config: Config::from_snapshot(&EnvSnapshot::testing(pairs))
                .expect("test configuration"),
            effects,
        }
    }

    pub fn effects(&self) -> &dyn Effects {
        self.effects.as_ref()
    }

    pub fn layout(&self) -> &Layout {
        self.config.layout()
    }

    pub fn dry_run(&self) -> bool {
        self.global.dry_run
    }
}
