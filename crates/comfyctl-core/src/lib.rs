#![deny(clippy::all, warnings)]

mod config;
mod context;
mod effects;
mod entrypoint;
mod executor;
mod issues;
mod nodes;
mod outcome;
mod process;
mod setup;

#[cfg(test)]
mod testing;

pub use comfyctl_domain as domain;

pub use crate::config::{Config, GlobalOptions};
pub use crate::context::{CommandContext, CommandGroup, CommandInfo};
pub use crate::effects::{
    AccountDatabase, Effects, FileSystem, ProcessRunner, SharedEffects, SystemEffects,
};
pub use crate::entrypoint::{
    entrypoint, entrypoint_plan, unprivileged_launch_allowed, EntrypointRequest, Privilege,
};
pub use crate::executor::{execute_plan, run_or_preview};
pub use crate::issues::{issue_outcome, LifecycleIssue};
pub use crate::nodes::{install_nodes, install_nodes_plan, InstallNodesRequest};
pub use crate::outcome::{to_json_response, CommandStatus, ExecutionOutcome};
pub use crate::process::RunOutput;
pub use crate::setup::{setup, setup_plan, SetupRequest};
