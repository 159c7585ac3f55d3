use comfyctl_core::domain::positional_or_split;
use comfyctl_core::{
    entrypoint, install_nodes, issue_outcome, setup, CommandContext, CommandGroup, CommandInfo,
    EntrypointRequest, ExecutionOutcome, InstallNodesRequest, LifecycleIssue, SetupRequest,
};

use crate::cli::{CommandCli, EntrypointArgs, InstallNodesArgs, SetupArgs};

pub fn dispatch_command(
    ctx: &CommandContext,
    command: &CommandCli,
) -> (CommandInfo, ExecutionOutcome) {
    match command {
        CommandCli::Setup(args) => {
            let info = CommandInfo::new(CommandGroup::Setup);
            let request = setup_request_from_args(args);
            core_call(info, || setup(ctx, &request))
        }
        CommandCli::InstallNodes(args) => {
            let info = CommandInfo::new(CommandGroup::InstallNodes);
            core_call(info, || {
                let request = install_nodes_request_from_args(args)?;
                install_nodes(ctx, &request)
            })
        }
        CommandCli::Entrypoint(args) => {
            let info = CommandInfo::new(CommandGroup::Entrypoint);
            core_call(info, || {
                let request = entrypoint_request_from_args(args)?;
                entrypoint(ctx, &request)
            })
        }
    }
}

fn core_call<F>(info: CommandInfo, action: F) -> (CommandInfo, ExecutionOutcome)
where
    F: FnOnce() -> anyhow::Result<ExecutionOutcome>,
{
    match action() {
        Ok(outcome) => {
            tracing::debug!(command = %info.group, "{}", outcome.message);
            (info, outcome)
        }
        Err(err) => {
            tracing::error!(command = %info.group, error = %format!("{err:#}"), "command failed");
            (info, issue_outcome(&err))
        }
    }
}

fn setup_request_from_args(args: &SetupArgs) -> SetupRequest {
    SetupRequest {
        comfyui_version: args.comfyui_version.clone(),
        torch_index_url: args.torch_index_url.clone(),
        torch_version: args.torch_version.clone(),
        torchaudio_version: args.torchaudio_version.clone(),
        torchvision_version: args.torchvision_version.clone(),
        comfyui_sha256: args
            .comfyui_sha256
            .clone()
            .filter(|value| !value.trim().is_empty()),
    }
}

fn install_nodes_request_from_args(
    args: &InstallNodesArgs,
) -> anyhow::Result<InstallNodesRequest> {
    let references = positional_or_split(&args.references, args.nodes.as_deref())
        .map_err(LifecycleIssue::from)?;
    Ok(InstallNodesRequest { references })
}

fn entrypoint_request_from_args(args: &EntrypointArgs) -> anyhow::Result<EntrypointRequest> {
    let arguments = positional_or_split(&args.launch_args, args.arguments.as_deref())
        .map_err(LifecycleIssue::from)?;
    Ok(EntrypointRequest {
        arguments,
        uid: args.uid,
        gid: args.gid,
    })
}
