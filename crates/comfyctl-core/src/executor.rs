use anyhow::Result;
use comfyctl_domain::{Plan, Step};
use serde_json::json;

use crate::context::CommandContext;
use crate::effects::Effects;
use crate::issues::LifecycleIssue;
use crate::outcome::ExecutionOutcome;

/// Runs every step in order and stops at the first failure, returning that
/// failure unchanged. Nothing already done is undone.
///
/// # Errors
/// Returns the error of the first step that fails.
pub fn execute_plan(effects: &dyn Effects, plan: &Plan) -> Result<()> {
    let total = plan.len();
    for (index, step) in plan.steps().iter().enumerate() {
        tracing::info!(step = index + 1, total, command = %step, "running command");
        execute_step(effects, step)?;
    }
    Ok(())
}

fn execute_step(effects: &dyn Effects, step: &Step) -> Result<()> {
    match step {
        Step::Run { command } => {
            let output = effects.process().run(command)?;
            if output.success() {
                return Ok(());
            }
            let issue = match output.signal {
                Some(signal) => LifecycleIssue::CommandKilled {
                    command: command.to_string(),
                    signal,
                },
                None => LifecycleIssue::CommandFailed {
                    command: command.to_string(),
                    code: output.code.unwrap_or(-1),
                },
            };
            Err(issue.into())
        }
        // The workload takes over this pid, so it receives the container's
        // signals directly.
        Step::Launch { command } => effects.process().exec(command),
        Step::CreateDirs { paths } => {
            for path in paths {
                effects.fs().create_dir_all(path)?;
            }
            Ok(())
        }
        Step::RemovePath { path } => effects.fs().remove_all(path),
        Step::Symlink { target, link } => effects.fs().symlink(target, link),
        Step::VerifySha256 { path, expected } => {
            let actual = effects.fs().sha256(path)?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LifecycleIssue::ChecksumMismatch {
                    path: path.clone(),
                    expected: expected.clone(),
                    actual,
                }
                .into());
            }
            tracing::debug!(%path, "checksum verified");
            Ok(())
        }
    }
}

/// Executes `plan`, or only describes it when the context is a dry run.
///
/// # Errors
/// Returns the first step failure when executing.
pub fn run_or_preview(ctx: &CommandContext, label: &str, plan: &Plan) -> Result<ExecutionOutcome> {
    let details = json!({
        "dry_run": ctx.dry_run(),
        "steps": plan,
        "commands": plan.rendered(),
    });
    if ctx.dry_run() {
        return Ok(ExecutionOutcome::success(
            format!("{label}: {} planned steps", plan.len()),
            details,
        ));
    }
    execute_plan(ctx.effects(), plan)?;
    Ok(ExecutionOutcome::success(
        format!("{label}: {} steps completed", plan.len()),
        details,
    ))
}
