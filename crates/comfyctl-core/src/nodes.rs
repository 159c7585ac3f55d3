use std::collections::HashMap;

use anyhow::Result;
use comfyctl_domain::{node_dir_name, Layout, NodeReferenceError, Plan, Step};

use crate::context::CommandContext;
use crate::executor::run_or_preview;
use crate::issues::LifecycleIssue;
use crate::outcome::ExecutionOutcome;

#[derive(Clone, Debug, Default)]
pub struct InstallNodesRequest {
    pub references: Vec<String>,
}

/// Clone + requirements install for every reference, in input order.
///
/// All clone directories are derived up front, so a bad or colliding
/// reference fails the whole request before anything is cloned.
///
/// # Errors
/// Returns [`LifecycleIssue::InvalidNodeReference`] for unusable or colliding references.
pub fn install_nodes_plan(layout: &Layout, references: &[String]) -> Result<Plan> {
    let mut claimed: HashMap<String, &str> = HashMap::new();
    let mut plan = Plan::new();
    for reference in references {
        let name = node_dir_name(reference).map_err(LifecycleIssue::from)?;
        if let Some(first) = claimed.insert(name.clone(), reference.as_str()) {
            return Err(LifecycleIssue::from(NodeReferenceError::Collision {
                name,
                first: first.to_string(),
                second: reference.clone(),
            })
            .into());
        }
        let node_dir = layout.node_dir(&name);
        let requirements = node_dir.join("requirements.txt");
        plan.push(Step::run("git", ["clone", reference.as_str(), node_dir.as_str()]));
        plan.push(Step::run("pip", ["install", "-r", requirements.as_str()]));
    }
    Ok(plan)
}

/// Installs custom nodes into the application's plugin directory.
///
/// # Errors
/// Returns the first invalid reference or failing step.
pub fn install_nodes(
    ctx: &CommandContext,
    request: &InstallNodesRequest,
) -> Result<ExecutionOutcome> {
    let plan = install_nodes_plan(ctx.layout(), &request.references)?;
    if request.references.is_empty() {
        tracing::info!("no custom nodes requested");
    }
    for reference in &request.references {
        tracing::info!(node = %reference, "installing node");
    }
    run_or_preview(ctx, "install-nodes", &plan)
}
